//! Sensor subsystem — individual I2C drivers and the aggregating [`SensorHub`].
//!
//! The hub owns every sensor driver plus its latched status. Each driver
//! satisfies the one [`Sensor`] capability trait (`init` / `read`), replacing
//! the per-kind ad hoc globals of the C++-era firmware with one polymorphic
//! abstraction.
//!
//! Status is probed exactly once at startup: a sensor that fails its probe
//! is `NotWorking` for the whole process lifetime and is never read again
//! (no re-probe policy exists; see `DESIGN.md`).

pub mod air_quality;
pub mod contactless;
pub mod humidity;
pub mod imu;

use log::{info, warn};

use crate::aggregate::KindReading;
use crate::error::SensorError;

// ───────────────────────────────────────────────────────────────
// Kinds and status
// ───────────────────────────────────────────────────────────────

/// The four sensor kinds on the EnvNode board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SensorKind {
    /// MPU-6050: 3-axis accel, 3-axis gyro, die temperature.
    Imu,
    /// MLX90614: contactless ambient + object temperature.
    ContactlessTemp,
    /// AHT10: relative humidity + temperature.
    HumidityTemp,
    /// SGP30: TVOC + eCO2.
    AirQuality,
}

impl SensorKind {
    pub const ALL: [SensorKind; 4] = [
        SensorKind::Imu,
        SensorKind::ContactlessTemp,
        SensorKind::HumidityTemp,
        SensorKind::AirQuality,
    ];

    /// Backend path segment for this kind.
    pub fn name(self) -> &'static str {
        match self {
            Self::Imu => "IMU",
            Self::ContactlessTemp => "Contactless_Temperature",
            Self::HumidityTemp => "Humidity_Temperature",
            Self::AirQuality => "Air_Quality",
        }
    }
}

/// Per-kind lifecycle status, latched by the startup probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SensorStatus {
    #[default]
    Uninitialized,
    Working,
    NotWorking,
}

impl SensorStatus {
    /// String pushed in the one-time status snapshot.
    pub fn name(self) -> &'static str {
        match self {
            Self::Uninitialized => "Uninitialized",
            Self::Working => "Working",
            Self::NotWorking => "NotWorking",
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Capability trait
// ───────────────────────────────────────────────────────────────

/// The uniform capability every sensor driver satisfies.
pub trait Sensor {
    fn kind(&self) -> SensorKind;

    /// One-time device probe/configuration.
    fn init(&mut self) -> Result<(), SensorError>;

    /// Take one measurement in physical units.
    fn read(&mut self) -> Result<KindReading, SensorError>;
}

// ───────────────────────────────────────────────────────────────
// Hub
// ───────────────────────────────────────────────────────────────

struct HubEntry {
    sensor: Box<dyn Sensor + Send>,
    status: SensorStatus,
}

/// Owns all sensor drivers and their latched statuses.
pub struct SensorHub {
    entries: Vec<HubEntry>,
}

impl SensorHub {
    /// Construct a hub over an arbitrary driver set (tests inject mocks here).
    pub fn new(sensors: Vec<Box<dyn Sensor + Send>>) -> Self {
        let entries = sensors
            .into_iter()
            .map(|sensor| HubEntry {
                sensor,
                status: SensorStatus::Uninitialized,
            })
            .collect();
        Self { entries }
    }

    /// The full on-board driver set.
    pub fn with_board_sensors() -> Self {
        Self::new(vec![
            Box::new(imu::Mpu6050::new()),
            Box::new(contactless::Mlx90614::new()),
            Box::new(humidity::Aht10::new()),
            Box::new(air_quality::Sgp30::new()),
        ])
    }

    /// Probe every sensor once and latch its status.
    ///
    /// Returns `true` only if every sensor probed Working. A failed probe
    /// marks that sensor NotWorking but never aborts the others.
    pub fn probe_all(&mut self) -> bool {
        let mut all_ok = true;
        for entry in &mut self.entries {
            let kind = entry.sensor.kind();
            match entry.sensor.init() {
                Ok(()) => {
                    entry.status = SensorStatus::Working;
                    info!("sensor probe: {}: OK", kind.name());
                }
                Err(e) => {
                    entry.status = SensorStatus::NotWorking;
                    warn!("sensor probe: {}: {e}", kind.name());
                    all_ok = false;
                }
            }
        }
        all_ok
    }

    /// Latched status for one kind (`Uninitialized` if the kind is not
    /// present in this hub's configuration).
    pub fn status(&self, kind: SensorKind) -> SensorStatus {
        self.entries
            .iter()
            .find(|e| e.sensor.kind() == kind)
            .map_or(SensorStatus::Uninitialized, |e| e.status)
    }

    /// All configured kinds with their latched statuses.
    pub fn statuses(&self) -> Vec<(SensorKind, SensorStatus)> {
        self.entries
            .iter()
            .map(|e| (e.sensor.kind(), e.status))
            .collect()
    }

    /// Read every Working sensor once, feeding each outcome to `f`.
    ///
    /// Non-Working sensors are skipped entirely: no read is attempted and
    /// `f` is not called for them.
    pub fn poll_working(
        &mut self,
        mut f: impl FnMut(SensorKind, Result<KindReading, SensorError>),
    ) {
        for entry in &mut self.entries {
            if entry.status != SensorStatus::Working {
                continue;
            }
            let kind = entry.sensor.kind();
            f(kind, entry.sensor.read());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::{HumidityReading, KindReading};

    struct ScriptedSensor {
        kind: SensorKind,
        init_ok: bool,
        reads: u32,
    }

    impl Sensor for ScriptedSensor {
        fn kind(&self) -> SensorKind {
            self.kind
        }
        fn init(&mut self) -> Result<(), SensorError> {
            if self.init_ok {
                Ok(())
            } else {
                Err(SensorError::NotDetected)
            }
        }
        fn read(&mut self) -> Result<KindReading, SensorError> {
            self.reads += 1;
            Ok(KindReading::HumidityTemp(HumidityReading {
                humidity_pct: 50.0,
                temp_c: 22.0,
            }))
        }
    }

    #[test]
    fn probe_latches_status_per_sensor() {
        let mut hub = SensorHub::new(vec![
            Box::new(ScriptedSensor {
                kind: SensorKind::HumidityTemp,
                init_ok: true,
                reads: 0,
            }),
            Box::new(ScriptedSensor {
                kind: SensorKind::AirQuality,
                init_ok: false,
                reads: 0,
            }),
        ]);
        assert!(!hub.probe_all());
        assert_eq!(hub.status(SensorKind::HumidityTemp), SensorStatus::Working);
        assert_eq!(hub.status(SensorKind::AirQuality), SensorStatus::NotWorking);
        assert_eq!(hub.status(SensorKind::Imu), SensorStatus::Uninitialized);
    }

    #[test]
    fn poll_skips_not_working() {
        let mut hub = SensorHub::new(vec![
            Box::new(ScriptedSensor {
                kind: SensorKind::HumidityTemp,
                init_ok: true,
                reads: 0,
            }),
            Box::new(ScriptedSensor {
                kind: SensorKind::AirQuality,
                init_ok: false,
                reads: 0,
            }),
        ]);
        hub.probe_all();

        let mut polled = Vec::new();
        hub.poll_working(|kind, _| polled.push(kind));
        assert_eq!(polled, vec![SensorKind::HumidityTemp]);
    }
}
