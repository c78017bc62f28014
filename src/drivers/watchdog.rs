//! Task Watchdog Timer (TWDT) driver.
//!
//! Wraps the ESP-IDF TWDT API to reset the device if the health loop
//! stalls. Only the main (health) task is subscribed; the timeout must
//! cover a full health-loop iteration — the sleep cadence plus a
//! worst-case blocking Wi-Fi reconnect attempt — with slack, or the
//! loop trips its own watchdog during every AP outage.
//!
//! The main task must call `feed()` on every health-loop iteration.

use crate::diagnostics;

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

#[cfg(target_os = "espidf")]
use log::info;

/// TWDT timeout. Health cadence (10 s) + `WifiAdapter::poll()` blocking
/// through start/connect/netif-up while the AP is down still fits.
pub const TIMEOUT_MS: u32 = 30_000;

pub struct Watchdog {
    #[cfg(target_os = "espidf")]
    subscribed: bool,
}

impl Default for Watchdog {
    fn default() -> Self {
        Self::new()
    }
}

impl Watchdog {
    /// Initialise and subscribe the current task to the TWDT.
    pub fn new() -> Self {
        debug_assert!(u64::from(TIMEOUT_MS) > diagnostics::HEALTH_INTERVAL_SECS * 1_000);

        #[cfg(target_os = "espidf")]
        {
            unsafe {
                let cfg = esp_task_wdt_config_t {
                    timeout_ms: TIMEOUT_MS,
                    idle_core_mask: 0,
                    trigger_panic: true,
                };
                let ret = esp_task_wdt_reconfigure(&cfg);
                if ret != ESP_OK {
                    log::warn!(
                        "TWDT reconfigure returned {} (may already be configured)",
                        ret
                    );
                }

                let ret = esp_task_wdt_add(core::ptr::null_mut());
                let subscribed = ret == ESP_OK;
                if subscribed {
                    info!(
                        "Watchdog: subscribed ({} ms timeout, panic on trigger)",
                        TIMEOUT_MS
                    );
                } else {
                    log::warn!("Watchdog: failed to subscribe ({})", ret);
                }

                Self { subscribed }
            }
        }

        #[cfg(not(target_os = "espidf"))]
        {
            log::info!("Watchdog(sim): no-op");
            Self {}
        }
    }

    /// Feed the watchdog. Must be called on every health-loop iteration.
    pub fn feed(&self) {
        #[cfg(target_os = "espidf")]
        {
            if self.subscribed {
                unsafe {
                    esp_task_wdt_reset();
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_outlasts_health_cadence_with_reconnect_slack() {
        // One feed per iteration: the window must absorb the 10 s sleep
        // plus several seconds of blocking Wi-Fi reconnect in poll().
        let cadence_ms = diagnostics::HEALTH_INTERVAL_SECS * 1_000;
        assert!(u64::from(TIMEOUT_MS) >= cadence_ms * 2);
    }
}
