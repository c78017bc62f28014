//! Unified error types for the EnvNode firmware.
//!
//! A single `Error` enum that every subsystem can convert into, keeping the
//! two loop tasks' error handling uniform. All variants are `Copy` so they
//! can be passed through the acquisition and dispatch paths without
//! allocation.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A sensor could not be probed or read.
    Sensor(SensorError),
    /// A backend (datastore) call failed.
    Backend(BackendError),
    /// An SMS modem transaction failed.
    Modem(ModemError),
    /// Peripheral initialisation failed.
    Init(&'static str),
    /// Configuration is invalid or could not be loaded.
    Config(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sensor(e) => write!(f, "sensor: {e}"),
            Self::Backend(e) => write!(f, "backend: {e}"),
            Self::Modem(e) => write!(f, "modem: {e}"),
            Self::Init(msg) => write!(f, "init: {msg}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Sensor errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// Device did not acknowledge on the I2C bus.
    NotDetected,
    /// I2C transaction failed mid-read.
    BusError,
    /// Device answered but the measurement is invalid (NaN, bad CRC,
    /// stale conversion).
    BadMeasurement,
    /// Device needs more warm-up time before readings are valid.
    WarmingUp,
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotDetected => write!(f, "device not detected"),
            Self::BusError => write!(f, "I2C bus error"),
            Self::BadMeasurement => write!(f, "invalid measurement"),
            Self::WarmingUp => write!(f, "sensor warming up"),
        }
    }
}

impl From<SensorError> for Error {
    fn from(e: SensorError) -> Self {
        Self::Sensor(e)
    }
}

// ---------------------------------------------------------------------------
// Backend errors
// ---------------------------------------------------------------------------

/// Failure reasons from the key-path datastore.
///
/// Every backend call is fire-and-forget from the dispatch loop's point of
/// view: a failure is logged and superseded by the next cycle's attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendError {
    /// Transport-level failure (no network, connect refused, timed out).
    Unreachable,
    /// The backend answered but rejected the write.
    Rejected,
    /// The requested path holds no value.
    NotFound,
    /// The stored value could not be parsed as the requested type.
    InvalidValue,
    /// The record could not be serialized.
    Serialize,
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unreachable => write!(f, "backend unreachable"),
            Self::Rejected => write!(f, "write rejected"),
            Self::NotFound => write!(f, "path not found"),
            Self::InvalidValue => write!(f, "value has wrong type"),
            Self::Serialize => write!(f, "record serialization failed"),
        }
    }
}

impl From<BackendError> for Error {
    fn from(e: BackendError) -> Self {
        Self::Backend(e)
    }
}

// ---------------------------------------------------------------------------
// Modem errors
// ---------------------------------------------------------------------------

/// Failure reasons from the AT-command SMS transaction, one per protocol
/// phase. No phase is retried; the alert is simply considered undelivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModemError {
    /// `AT` handshake got no `OK` within its timeout.
    Handshake,
    /// `AT+CMGF=1` (text mode) got no `OK`.
    TextMode,
    /// `AT+CMGS="…"` got no `>` prompt.
    Prompt,
    /// Message body + Ctrl-Z got no `+CMGS:` confirmation.
    Delivery,
    /// Raw serial read/write failure.
    Io,
}

impl fmt::Display for ModemError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Handshake => write!(f, "no response to AT handshake"),
            Self::TextMode => write!(f, "text mode set rejected"),
            Self::Prompt => write!(f, "no message prompt"),
            Self::Delivery => write!(f, "no delivery confirmation"),
            Self::Io => write!(f, "serial I/O error"),
        }
    }
}

impl From<ModemError> for Error {
    fn from(e: ModemError) -> Self {
        Self::Modem(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
