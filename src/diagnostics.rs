//! Coarse runtime health reporting.
//!
//! The main task (lowest priority, after both loop tasks are spawned)
//! logs free heap and uptime every [`HEALTH_INTERVAL_SECS`]. This is
//! observability only — nothing reads these values back.

use log::info;

/// Cadence of the main-task health report.
pub const HEALTH_INTERVAL_SECS: u64 = 10;

/// Free internal heap in bytes. On the host this reports 0 — the
/// simulation has no meaningful heap ceiling.
#[cfg(target_os = "espidf")]
pub fn free_heap_bytes() -> u32 {
    unsafe { esp_idf_svc::sys::esp_get_free_heap_size() }
}

#[cfg(not(target_os = "espidf"))]
pub fn free_heap_bytes() -> u32 {
    0
}

/// Emit one health line.
pub fn log_health(uptime_secs: u64) {
    info!(
        "health: uptime={}s free_heap={}B",
        uptime_secs,
        free_heap_bytes()
    );
}
