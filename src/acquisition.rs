//! Acquisition loop — the producer side of the pipeline (core 1).
//!
//! Polls every Working sensor on a fixed cadence and keeps the shared
//! aggregate fresh. A single sensor failure is purely local: the prior
//! value stays, the other sensors are still read, and the cycle is only
//! marked unsuccessful via `scan_success`.
//!
//! There is no shutdown path — the loop ends only with the process.

use std::time::Duration;

use log::{debug, warn};

use crate::adapters::time::Esp32TimeAdapter;
use crate::aggregate::SharedAggregate;
use crate::sensors::SensorHub;

pub struct AcquisitionLoop {
    shared: SharedAggregate,
    interval: Duration,
}

impl AcquisitionLoop {
    pub fn new(shared: SharedAggregate, interval_ms: u32) -> Self {
        Self {
            shared,
            interval: Duration::from_millis(u64::from(interval_ms)),
        }
    }

    /// One acquisition cycle: read every Working sensor, store each
    /// successful reading, then close the cycle with the AND of the
    /// per-kind outcomes. Returns that flag.
    pub fn run_cycle(&self, hub: &mut SensorHub, now_ms: u64) -> bool {
        let mut all_ok = true;

        hub.poll_working(|kind, outcome| match outcome {
            Ok(reading) => self.shared.store(reading),
            Err(e) => {
                warn!("acquisition: {} read failed: {e}", kind.name());
                all_ok = false;
            }
        });

        self.shared.finish_cycle(all_ok, now_ms);
        if all_ok {
            debug!("acquisition: cycle complete at {now_ms} ms");
        }
        all_ok
    }

    /// Run forever at the configured cadence. Task entry point.
    pub fn run(self, mut hub: SensorHub) -> ! {
        let clock = Esp32TimeAdapter::new();
        loop {
            let now_ms = clock.uptime_us() / 1_000;
            self.run_cycle(&mut hub, now_ms);
            std::thread::sleep(self.interval);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::{HumidityReading, KindReading};
    use crate::error::SensorError;
    use crate::sensors::{Sensor, SensorKind};

    struct FlakySensor {
        kind: SensorKind,
        fail: bool,
    }

    impl Sensor for FlakySensor {
        fn kind(&self) -> SensorKind {
            self.kind
        }
        fn init(&mut self) -> Result<(), SensorError> {
            Ok(())
        }
        fn read(&mut self) -> Result<KindReading, SensorError> {
            if self.fail {
                Err(SensorError::BusError)
            } else {
                Ok(KindReading::HumidityTemp(HumidityReading {
                    humidity_pct: 55.0,
                    temp_c: 21.0,
                }))
            }
        }
    }

    #[test]
    fn failed_read_keeps_prior_value_and_flips_success() {
        let shared = SharedAggregate::new();
        let acq = AcquisitionLoop::new(shared.clone(), 2_000);

        let mut hub = SensorHub::new(vec![Box::new(FlakySensor {
            kind: SensorKind::HumidityTemp,
            fail: false,
        })]);
        hub.probe_all();
        assert!(acq.run_cycle(&mut hub, 1_000));
        assert!(shared.snapshot().scan_success);

        let mut flaky_hub = SensorHub::new(vec![Box::new(FlakySensor {
            kind: SensorKind::HumidityTemp,
            fail: true,
        })]);
        flaky_hub.probe_all();
        assert!(!acq.run_cycle(&mut flaky_hub, 2_000));

        let snap = shared.snapshot();
        assert!(!snap.scan_success);
        // Prior value untouched by the failed cycle.
        assert_eq!(
            snap.humidity,
            Some(HumidityReading {
                humidity_pct: 55.0,
                temp_c: 21.0
            })
        );
        assert_eq!(snap.read_timestamp_ms, 2_000);
    }
}
