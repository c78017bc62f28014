//! System configuration parameters
//!
//! All tunable parameters for the EnvNode agent. Everything the C++-era
//! firmware hard-coded at compile time (identity, credentials, cadences,
//! history depth, transaction timeouts) is runtime configuration here.
//! Values can be overridden via NVS.

use serde::{Deserialize, Serialize};

/// What to do when a sensor fails its one-time init probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InitFailurePolicy {
    /// Mark the sensor NotWorking and continue with the rest (default).
    Degrade,
    /// Refuse to start if any sensor fails its probe.
    Halt,
}

/// Retry discipline for backend and modem transactions.
///
/// `None` is deliberate: a failed push/fetch is logged and superseded by
/// the next dispatch cycle, so the dispatch loop never blocks on retries.
/// A backoff variant can be added here without touching the loop contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RetryPolicy {
    None,
}

/// Core system configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemConfig {
    // --- Identity ---
    /// User/device name. All backend paths are scoped under this prefix.
    pub user_name: String,

    // --- Connectivity ---
    /// Wi-Fi station SSID.
    pub wifi_ssid: String,
    /// Wi-Fi station password (empty = open network).
    pub wifi_password: String,
    /// Backend datastore host, e.g. `envnode-test.firebaseio.com`.
    pub backend_host: String,
    /// Backend auth token appended to every request.
    pub backend_auth: String,

    // --- Alerting ---
    /// Destination number for SMS alerts (international format).
    pub alert_number: String,

    // --- Timing ---
    /// Acquisition loop cadence (milliseconds).
    pub acquisition_interval_ms: u32,
    /// Dispatch loop cadence (milliseconds).
    pub dispatch_interval_ms: u32,
    /// Yield between dispatch sub-steps so the TWDT sees progress
    /// during long cycles (milliseconds).
    pub dispatch_yield_ms: u32,
    /// Round-trip timeout for a single backend call (milliseconds).
    pub backend_timeout_ms: u32,
    /// Per-phase timeout for a modem AT transaction (milliseconds).
    pub modem_phase_timeout_ms: u32,

    // --- History ---
    /// Training-data log depth. The rotation counter wraps to 1 (and the
    /// whole history subtree is wiped) once it would exceed this.
    pub max_records: u32,

    // --- Policies ---
    pub init_failure_policy: InitFailurePolicy,
    pub retry_policy: RetryPolicy,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            user_name: "envnode".into(),

            wifi_ssid: String::new(),
            wifi_password: String::new(),
            backend_host: String::new(),
            backend_auth: String::new(),

            alert_number: String::new(),

            acquisition_interval_ms: 2_000,
            dispatch_interval_ms: 5_000,
            dispatch_yield_ms: 50,
            backend_timeout_ms: 4_000,
            modem_phase_timeout_ms: 5_000,

            max_records: 100,

            init_failure_policy: InitFailurePolicy::Degrade,
            retry_policy: RetryPolicy::None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_sane() {
        let c = SystemConfig::default();
        assert!(c.acquisition_interval_ms > 0);
        assert!(c.dispatch_interval_ms > 0);
        assert!(c.max_records > 0);
        assert!(c.backend_timeout_ms > 0);
        assert!(c.modem_phase_timeout_ms > 0);
        assert_eq!(c.init_failure_policy, InitFailurePolicy::Degrade);
        assert_eq!(c.retry_policy, RetryPolicy::None);
    }

    #[test]
    fn acquisition_faster_than_dispatch() {
        let c = SystemConfig::default();
        assert!(
            c.acquisition_interval_ms < c.dispatch_interval_ms,
            "sensor freshness must outpace the upload cadence"
        );
    }

    #[test]
    fn yield_fits_inside_cycle_budget() {
        let c = SystemConfig::default();
        // Five sub-steps yield between them; the total must leave most of
        // the dispatch budget for actual work.
        assert!(c.dispatch_yield_ms * 5 < c.dispatch_interval_ms);
    }

    #[test]
    fn serde_roundtrip() {
        let c = SystemConfig::default();
        let json = serde_json::to_string(&c).unwrap();
        let c2: SystemConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(c.user_name, c2.user_name);
        assert_eq!(c.max_records, c2.max_records);
        assert_eq!(c.dispatch_interval_ms, c2.dispatch_interval_ms);
    }

    #[test]
    fn postcard_roundtrip() {
        let c = SystemConfig::default();
        let bytes = postcard::to_allocvec(&c).unwrap();
        let c2: SystemConfig = postcard::from_bytes(&bytes).unwrap();
        assert_eq!(c.acquisition_interval_ms, c2.acquisition_interval_ms);
        assert_eq!(c.init_failure_policy, c2.init_failure_policy);
    }
}
