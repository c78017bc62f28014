//! Command mailbox — the remotely-writable action flags.
//!
//! Five named string slots (`action_1..action_5`) fetched from the
//! backend each dispatch cycle. Values are free-form; only the literal
//! `"ON"` carries meaning (see [`crate::alert`]). A failed fetch keeps
//! the slot's previous value — stale-but-available beats empty.
//!
//! Owned and mutated by the dispatch loop only; never shared.

use heapless::String;
use log::warn;

use crate::paths;
use crate::ports::BackendPort;

/// Number of action slots the backend exposes.
pub const ACTION_COUNT: usize = 5;

/// Longest action value the mailbox retains; longer backend strings are
/// truncated (anything over this can't match a trigger literal anyway).
const VALUE_CAP: usize = 32;

#[derive(Debug, Clone, Default)]
pub struct CommandMailbox {
    slots: [String<VALUE_CAP>; ACTION_COUNT],
}

impl CommandMailbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current value of a slot, 1-based (matching the backend path
    /// names). `None` for an index outside `1..=ACTION_COUNT`.
    pub fn value(&self, index: usize) -> Option<&str> {
        let slot = self.slots.get(index.checked_sub(1)?)?;
        Some(slot.as_str())
    }

    /// Overwrite one slot, truncating to capacity. Returns `false` (and
    /// stores nothing) for an index outside `1..=ACTION_COUNT`.
    pub fn set(&mut self, index: usize, value: &str) -> bool {
        let Some(slot) = index
            .checked_sub(1)
            .and_then(|i| self.slots.get_mut(i))
        else {
            return false;
        };
        slot.clear();
        let take = value.len().min(VALUE_CAP);
        // Cut on a char boundary so push_str cannot fail halfway.
        let mut end = take;
        while !value.is_char_boundary(end) {
            end -= 1;
        }
        let _ = slot.push_str(&value[..end]);
        true
    }

    /// Fetch every slot from the backend. Each fetch is independent: a
    /// failure is logged and that slot keeps its stale value.
    pub fn refresh(&mut self, backend: &mut impl BackendPort, user: &str) {
        for index in 1..=ACTION_COUNT {
            match backend.get_string(&paths::action(user, index)) {
                Ok(value) => {
                    self.set(index, &value);
                }
                Err(e) => {
                    warn!("mailbox: action_{index} fetch failed: {e}");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BackendError;
    use serde_json::Value;

    struct FlakyBackend;

    impl BackendPort for FlakyBackend {
        fn set_record(&mut self, _path: &str, _value: &Value) -> Result<(), BackendError> {
            Ok(())
        }
        fn get_string(&mut self, path: &str) -> Result<std::string::String, BackendError> {
            if path.ends_with("action_2") {
                Err(BackendError::Unreachable)
            } else {
                Ok("OFF".into())
            }
        }
        fn get_int(&mut self, _path: &str) -> Result<i64, BackendError> {
            Err(BackendError::NotFound)
        }
        fn delete_subtree(&mut self, _path: &str) -> Result<(), BackendError> {
            Ok(())
        }
    }

    #[test]
    fn fetch_failure_keeps_stale_value() {
        let mut mailbox = CommandMailbox::new();
        mailbox.set(2, "ON");

        mailbox.refresh(&mut FlakyBackend, "alice");
        assert_eq!(mailbox.value(1), Some("OFF"));
        assert_eq!(mailbox.value(2), Some("ON")); // stale, fetch failed
        assert_eq!(mailbox.value(5), Some("OFF"));
    }

    #[test]
    fn overlong_values_truncate_on_char_boundary() {
        let mut mailbox = CommandMailbox::new();
        mailbox.set(1, &"é".repeat(40));
        let stored = mailbox.value(1).unwrap();
        assert!(stored.len() <= 32);
        assert!(stored.chars().all(|c| c == 'é'));
    }

    #[test]
    fn out_of_range_index_is_rejected_not_panicking() {
        let mut mailbox = CommandMailbox::new();
        assert!(!mailbox.set(0, "ON"));
        assert!(!mailbox.set(ACTION_COUNT + 1, "ON"));
        assert_eq!(mailbox.value(0), None);
        assert_eq!(mailbox.value(ACTION_COUNT + 1), None);

        assert!(mailbox.set(1, "ON"));
        assert_eq!(mailbox.value(1), Some("ON"));
    }
}
