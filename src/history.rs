//! Bounded history rotation for the training-data log.
//!
//! The persisted counter at `ML_Training_Meta/record_count` names the
//! next slot, `1..=max_records`. When the increment would exceed the
//! maximum, the rotation wipes the *entire* history subtree and restarts
//! numbering at 1 — a destructive full-wipe strategy, not a ring buffer
//! with per-slot eviction.
//!
//! The counter persist is not atomic with the read that precedes it: a
//! crash in between can hand out the same slot index twice after restart.
//! Accepted — a duplicated training record is staleness, not corruption.

use log::{info, warn};

use crate::error::BackendError;
use crate::paths;
use crate::ports::BackendPort;

pub struct HistoryRotator {
    max_records: u32,
}

impl HistoryRotator {
    pub fn new(max_records: u32) -> Self {
        Self { max_records }
    }

    /// Advance the rotation and return the slot index to write next.
    ///
    /// Counter absent or unreadable counts as 0, so a fresh datastore
    /// starts at slot 1. On wraparound the whole history subtree is
    /// deleted before the reset counter is persisted.
    pub fn next_slot(
        &self,
        backend: &mut impl BackendPort,
        user: &str,
    ) -> Result<u32, BackendError> {
        let counter_path = paths::record_count(user);

        let current = match backend.get_int(&counter_path) {
            Ok(n) if n >= 0 => n as u32,
            Ok(n) => {
                warn!("history: negative counter {n}, treating as 0");
                0
            }
            Err(e) => {
                warn!("history: counter read failed ({e}), treating as 0");
                0
            }
        };

        // Saturating: a corrupt counter near u32::MAX still wraps to 1
        // instead of overflowing.
        let next = current.saturating_add(1);
        let slot = if next > self.max_records {
            info!(
                "history: wrapping at {} records, wiping {}",
                self.max_records,
                paths::training_data_root(user)
            );
            backend.delete_subtree(&paths::training_data_root(user))?;
            1
        } else {
            next
        };

        backend.set_record(&counter_path, &serde_json::json!(slot))?;
        Ok(slot)
    }
}
