//! The shared sensor aggregate — latest reading of every kind.
//!
//! One instance per process: written exclusively by the acquisition loop
//! (core 1), read by the dispatch loop (core 0). The C++-era firmware
//! shared this struct as a bare global; here the writer takes the mutex
//! per kind, so the dispatch loop can never observe a half-updated reading
//! for a single kind. Cross-kind tearing (IMU from cycle N, humidity from
//! cycle N+1) remains possible and is tolerated, matching the source.

use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};

use crate::sensors::SensorKind;

// ───────────────────────────────────────────────────────────────
// Per-kind readings (physical units)
// ───────────────────────────────────────────────────────────────

/// MPU-6050: acceleration in m/s², angular rate in deg/s, die temp °C.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImuReading {
    pub accel_x: f32,
    pub accel_y: f32,
    pub accel_z: f32,
    pub gyro_x: f32,
    pub gyro_y: f32,
    pub gyro_z: f32,
    pub die_temp_c: f32,
}

/// MLX90614: ambient and object temperature, °C.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContactlessReading {
    pub ambient_c: f32,
    pub object_c: f32,
}

/// AHT10: relative humidity % and temperature °C.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HumidityReading {
    pub humidity_pct: f32,
    pub temp_c: f32,
}

/// SGP30: TVOC in ppb, eCO2 in ppm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AirQualityReading {
    pub tvoc_ppb: u16,
    pub eco2_ppm: u16,
}

/// One successful measurement, tagged by kind.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum KindReading {
    Imu(ImuReading),
    ContactlessTemp(ContactlessReading),
    HumidityTemp(HumidityReading),
    AirQuality(AirQualityReading),
}

impl KindReading {
    pub fn kind(&self) -> SensorKind {
        match self {
            Self::Imu(_) => SensorKind::Imu,
            Self::ContactlessTemp(_) => SensorKind::ContactlessTemp,
            Self::HumidityTemp(_) => SensorKind::HumidityTemp,
            Self::AirQuality(_) => SensorKind::AirQuality,
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Aggregate
// ───────────────────────────────────────────────────────────────

/// Latest reading per kind plus cycle metadata.
///
/// `None` means no successful read yet (or the kind's sensor is
/// NotWorking) — the dispatch loop omits such kinds from its pushes.
/// A failed read leaves the prior value untouched (partial-update
/// semantics) but still flips `scan_success` false for that cycle.
#[derive(Debug, Clone, Default)]
pub struct SensorAggregate {
    pub imu: Option<ImuReading>,
    pub contactless: Option<ContactlessReading>,
    pub humidity: Option<HumidityReading>,
    pub air_quality: Option<AirQualityReading>,
    /// AND over all Working sensors' last-read success.
    pub scan_success: bool,
    /// Acquisition-loop-local clock at the end of the last cycle,
    /// monotonically non-decreasing.
    pub read_timestamp_ms: u64,
}

impl SensorAggregate {
    /// Overwrite the one kind this reading belongs to.
    pub fn store(&mut self, reading: KindReading) {
        match reading {
            KindReading::Imu(r) => self.imu = Some(r),
            KindReading::ContactlessTemp(r) => self.contactless = Some(r),
            KindReading::HumidityTemp(r) => self.humidity = Some(r),
            KindReading::AirQuality(r) => self.air_quality = Some(r),
        }
    }

    /// Latest reading for one kind, if any.
    pub fn reading(&self, kind: SensorKind) -> Option<KindReading> {
        match kind {
            SensorKind::Imu => self.imu.map(KindReading::Imu),
            SensorKind::ContactlessTemp => self.contactless.map(KindReading::ContactlessTemp),
            SensorKind::HumidityTemp => self.humidity.map(KindReading::HumidityTemp),
            SensorKind::AirQuality => self.air_quality.map(KindReading::AirQuality),
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Shared handle
// ───────────────────────────────────────────────────────────────

/// Cloneable cross-core handle to the one aggregate.
#[derive(Clone, Default)]
pub struct SharedAggregate {
    inner: Arc<Mutex<SensorAggregate>>,
}

impl SharedAggregate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store one kind's reading. The lock is held only for this one
    /// kind's field group, which is what keeps same-kind tearing
    /// impossible while permitting cross-kind tearing.
    pub fn store(&self, reading: KindReading) {
        self.lock().store(reading);
    }

    /// Close out an acquisition cycle: set the success flag and advance
    /// the timestamp (clamped so it never goes backwards).
    pub fn finish_cycle(&self, success: bool, now_ms: u64) {
        let mut agg = self.lock();
        agg.scan_success = success;
        agg.read_timestamp_ms = agg.read_timestamp_ms.max(now_ms);
    }

    /// Consistent copy for the dispatch loop.
    pub fn snapshot(&self) -> SensorAggregate {
        self.lock().clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, SensorAggregate> {
        // A poisoned lock means a sensor driver panicked mid-store; the
        // aggregate itself is still per-kind consistent, so keep going.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
