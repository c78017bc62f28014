//! Dispatch loop — the consumer side of the pipeline (core 0).
//!
//! Periodically materialises the shared aggregate into backend records
//! and reconciles remote commands. Every cycle runs the same fixed step
//! order:
//!
//! 1. first iteration only: one-time sensor-status snapshot push
//! 2. per-kind latest-reading push (each push independent)
//! 3. history rotation + full-snapshot record push
//! 4. command-mailbox refresh (stale-on-failure)
//! 5. alert dispatch against the refreshed mailbox
//! 6. sleep out the rest of the cycle budget
//!
//! Every backend and modem transaction is fire-and-forget
//! ([`RetryPolicy::None`]): a failure is logged and superseded by the
//! next cycle's attempt. Short yields between sub-steps keep the idle
//! task fed under the hardware watchdog during long cycles.

use std::time::Duration;

use log::{debug, info, warn};

use crate::adapters::time::Esp32TimeAdapter;
use crate::aggregate::SharedAggregate;
use crate::alert::AlertDispatcher;
use crate::config::{RetryPolicy, SystemConfig};
use crate::history::HistoryRotator;
use crate::mailbox::CommandMailbox;
use crate::paths;
use crate::ports::{BackendPort, ModemPort};
use crate::records::{HistoryRecord, StatusRecord};
use crate::sensors::{SensorKind, SensorStatus};

pub struct DispatchLoop {
    shared: SharedAggregate,
    mailbox: CommandMailbox,
    alerts: AlertDispatcher,
    rotator: HistoryRotator,
    user: String,
    cycle_interval: Duration,
    step_yield: Duration,
    status_pushed: bool,
}

impl DispatchLoop {
    pub fn new(shared: SharedAggregate, config: &SystemConfig) -> Self {
        // The only policy implemented; the match is here so adding a
        // backoff variant forces a decision at this seam.
        match config.retry_policy {
            RetryPolicy::None => {}
        }
        Self {
            shared,
            mailbox: CommandMailbox::new(),
            alerts: AlertDispatcher::new(&config.alert_number),
            rotator: HistoryRotator::new(config.max_records),
            user: config.user_name.clone(),
            cycle_interval: Duration::from_millis(u64::from(config.dispatch_interval_ms)),
            step_yield: Duration::from_millis(u64::from(config.dispatch_yield_ms)),
            status_pushed: false,
        }
    }

    /// Mailbox contents (read-only), mainly for tests and diagnostics.
    pub fn mailbox(&self) -> &CommandMailbox {
        &self.mailbox
    }

    /// One full dispatch cycle in the fixed step order.
    ///
    /// `statuses` is the status set latched at probe time; `datetime` is
    /// the wall-clock stamp for any records written this cycle.
    pub fn run_cycle(
        &mut self,
        backend: &mut impl BackendPort,
        modem: &mut impl ModemPort,
        statuses: &[(SensorKind, SensorStatus)],
        datetime: &str,
    ) {
        // 1. One-time status snapshot. Never repeated, even if the push
        // fails — status is latched at probe time and cannot change.
        if !self.status_pushed {
            self.status_pushed = true;
            self.push_status(backend, statuses, datetime);
        }
        self.yield_briefly();

        // 2. Latest reading per Working kind. Each push independent.
        self.push_readings(backend, statuses);
        self.yield_briefly();

        // 3. Rotating history snapshot.
        self.push_history(backend, statuses, datetime);
        self.yield_briefly();

        // 4. Refresh remote commands.
        self.mailbox.refresh(backend, &self.user);
        self.yield_briefly();

        // 5. Alerts against the refreshed mailbox.
        self.alerts.dispatch(&self.mailbox, modem);
    }

    fn push_status(
        &self,
        backend: &mut impl BackendPort,
        statuses: &[(SensorKind, SensorStatus)],
        datetime: &str,
    ) {
        let record = StatusRecord::new(statuses, datetime);
        match serde_json::to_value(&record) {
            Ok(value) => {
                let path = paths::sensor_status(&self.user);
                match backend.set_record(&path, &value) {
                    Ok(()) => info!("dispatch: status snapshot pushed"),
                    Err(e) => warn!("dispatch: status push failed: {e}"),
                }
            }
            Err(e) => warn!("dispatch: status serialize failed: {e}"),
        }
    }

    fn push_readings(
        &self,
        backend: &mut impl BackendPort,
        statuses: &[(SensorKind, SensorStatus)],
    ) {
        let snapshot = self.shared.snapshot();
        if !snapshot.scan_success {
            debug!("dispatch: last acquisition cycle was degraded");
        }

        for kind in SensorKind::ALL {
            let working = statuses
                .iter()
                .any(|(k, s)| *k == kind && *s == SensorStatus::Working);
            let Some(reading) = snapshot.reading(kind) else {
                continue;
            };
            if !working {
                // Stale value from before the sensor died — not pushed.
                continue;
            }
            let value = match serde_json::to_value(reading) {
                Ok(v) => v,
                Err(e) => {
                    warn!("dispatch: {} serialize failed: {e}", kind.name());
                    continue;
                }
            };
            let path = paths::sensor_data(&self.user, kind);
            if let Err(e) = backend.set_record(&path, &value) {
                warn!("dispatch: {} push failed: {e}", kind.name());
            }
        }
    }

    fn push_history(
        &self,
        backend: &mut impl BackendPort,
        statuses: &[(SensorKind, SensorStatus)],
        datetime: &str,
    ) {
        let slot = match self.rotator.next_slot(backend, &self.user) {
            Ok(slot) => slot,
            Err(e) => {
                warn!("dispatch: history rotation failed: {e}");
                return;
            }
        };

        let snapshot = self.shared.snapshot();
        let record = HistoryRecord::from_snapshot(&snapshot, statuses, &self.mailbox, datetime);
        match serde_json::to_value(&record) {
            Ok(value) => {
                let path = paths::training_record(&self.user, slot);
                if let Err(e) = backend.set_record(&path, &value) {
                    warn!("dispatch: history record {slot} push failed: {e}");
                }
            }
            Err(e) => warn!("dispatch: history serialize failed: {e}"),
        }
    }

    fn yield_briefly(&self) {
        if !self.step_yield.is_zero() {
            std::thread::sleep(self.step_yield);
        }
    }

    /// Run forever at the configured cadence. Task entry point.
    pub fn run(
        mut self,
        mut backend: impl BackendPort,
        mut modem: impl ModemPort,
        statuses: Vec<(SensorKind, SensorStatus)>,
    ) -> ! {
        let clock = Esp32TimeAdapter::new();
        loop {
            let started_us = clock.uptime_us();
            let datetime = clock.datetime_string();
            self.run_cycle(&mut backend, &mut modem, &statuses, &datetime);

            let elapsed = Duration::from_micros(clock.uptime_us() - started_us);
            std::thread::sleep(self.cycle_interval.saturating_sub(elapsed));
        }
    }
}
