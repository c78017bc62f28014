//! Port traits — the boundary between loop logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ Dispatch / Acquisition loops
//! ```
//!
//! Driven adapters (backend datastore, SMS modem, config storage) implement
//! these traits. The dispatch loop consumes them via generics, so the loop
//! logic never touches the network or UART directly and the whole pipeline
//! runs against mocks on the host.

use serde_json::Value;

use crate::config::SystemConfig;
use crate::error::{BackendError, ModemError};

// ───────────────────────────────────────────────────────────────
// Backend port (driven adapter: domain → key-path datastore)
// ───────────────────────────────────────────────────────────────

/// Key-path "set value / get value" datastore, Firebase-RTDB-shaped.
///
/// Paths are `/`-separated and scoped under the configured user prefix by
/// the caller (see [`crate::paths`]). Every call is synchronous and may
/// fail; no call failure is ever treated as fatal by the loops.
pub trait BackendPort {
    /// Overwrite the record at `path` with a structured value.
    fn set_record(&mut self, path: &str, value: &Value) -> Result<(), BackendError>;

    /// Fetch the string stored at `path`.
    fn get_string(&mut self, path: &str) -> Result<String, BackendError>;

    /// Fetch the integer stored at `path`.
    fn get_int(&mut self, path: &str) -> Result<i64, BackendError>;

    /// Delete `path` and everything below it.
    fn delete_subtree(&mut self, path: &str) -> Result<(), BackendError>;
}

// ───────────────────────────────────────────────────────────────
// Modem port (driven adapter: domain → AT-command SMS link)
// ───────────────────────────────────────────────────────────────

/// Synchronous SMS transaction over the serial modem.
///
/// Blocks the dispatch loop for the transaction duration, bounded by the
/// per-phase timeouts configured on the adapter. The caller does not
/// distinguish which phase failed beyond logging the [`ModemError`].
pub trait ModemPort {
    fn send_sms(&mut self, number: &str, message: &str) -> Result<(), ModemError>;
}

// ───────────────────────────────────────────────────────────────
// Configuration port (driven adapter: domain ↔ persistent config)
// ───────────────────────────────────────────────────────────────

/// Loads and persists system configuration.
///
/// Implementations MUST validate config values before persisting.
/// Invalid ranges are rejected with [`ConfigError::ValidationFailed`],
/// not silently clamped.
pub trait ConfigPort {
    /// Load configuration from persistent storage.
    /// Returns [`ConfigError::NotFound`] on first boot.
    fn load(&self) -> Result<SystemConfig, ConfigError>;

    /// Validate and persist configuration.
    fn save(&self, config: &SystemConfig) -> Result<(), ConfigError>;
}

/// Errors from [`ConfigPort`] operations.
#[derive(Debug)]
pub enum ConfigError {
    /// No config found in storage (first boot).
    NotFound,
    /// Stored config failed integrity / deserialization check.
    Corrupted,
    /// A config field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
    /// Generic I/O error from the storage backend.
    IoError,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "config not found"),
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}
