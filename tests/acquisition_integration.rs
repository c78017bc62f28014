//! Integration tests: SensorHub → AcquisitionLoop → SharedAggregate.
//!
//! Scripted sensor drivers stand in for the I2C devices; the assertions
//! are on what lands in the shared aggregate across cycles.

use std::sync::{Arc, Mutex};

use envnode::acquisition::AcquisitionLoop;
use envnode::aggregate::{
    AirQualityReading, HumidityReading, ImuReading, KindReading, SharedAggregate,
};
use envnode::sensors::{Sensor, SensorHub, SensorKind, SensorStatus};
use envnode::SensorError;

// ── Scripted driver ───────────────────────────────────────────

/// Driver whose init result is fixed and whose reads follow a script;
/// past the script's end the last entry repeats.
struct ScriptedSensor {
    kind: SensorKind,
    init_ok: bool,
    script: Vec<Result<KindReading, SensorError>>,
    cursor: usize,
    reads: Arc<Mutex<u32>>,
}

impl ScriptedSensor {
    fn new(kind: SensorKind, init_ok: bool, script: Vec<Result<KindReading, SensorError>>) -> Self {
        Self {
            kind,
            init_ok,
            script,
            cursor: 0,
            reads: Arc::new(Mutex::new(0)),
        }
    }

    fn read_counter(&self) -> Arc<Mutex<u32>> {
        Arc::clone(&self.reads)
    }
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
        *self.reads.lock().unwrap() += 1;
        let entry = self
            .script
            .get(self.cursor)
            .or_else(|| self.script.last())
            .copied()
            .unwrap_or(Err(SensorError::BusError));
        self.cursor += 1;
        entry
    }
}

fn humidity(pct: f32) -> KindReading {
    KindReading::HumidityTemp(HumidityReading {
        humidity_pct: pct,
        temp_c: 21.0,
    })
}

fn imu(az: f32) -> KindReading {
    KindReading::Imu(ImuReading {
        accel_x: 0.0,
        accel_y: 0.0,
        accel_z: az,
        gyro_x: 0.0,
        gyro_y: 0.0,
        gyro_z: 0.0,
        die_temp_c: 30.0,
    })
}

fn air(tvoc: u16) -> KindReading {
    KindReading::AirQuality(AirQualityReading {
        tvoc_ppb: tvoc,
        eco2_ppm: 400,
    })
}

// ── Tests ─────────────────────────────────────────────────────

#[test]
fn each_read_updates_only_its_own_kind() {
    let shared = SharedAggregate::new();
    let loop_ = AcquisitionLoop::new(shared.clone(), 2_000);

    let mut hub = SensorHub::new(vec![
        Box::new(ScriptedSensor::new(SensorKind::Imu, true, vec![Ok(imu(9.8))])),
        Box::new(ScriptedSensor::new(
            SensorKind::HumidityTemp,
            true,
            vec![Ok(humidity(40.0)), Ok(humidity(55.0))],
        )),
    ]);
    hub.probe_all();

    assert!(loop_.run_cycle(&mut hub, 2_000));
    let snap = shared.snapshot();
    assert_eq!(snap.humidity.unwrap().humidity_pct, 40.0);
    assert_eq!(snap.imu.unwrap().accel_z, 9.8);
    assert!(snap.contactless.is_none());
    assert!(snap.air_quality.is_none());

    // Second cycle moves humidity without disturbing the IMU value.
    assert!(loop_.run_cycle(&mut hub, 4_000));
    let snap = shared.snapshot();
    assert_eq!(snap.humidity.unwrap().humidity_pct, 55.0);
    assert_eq!(snap.imu.unwrap().accel_z, 9.8);
}

#[test]
fn failed_read_keeps_prior_value_and_degrades_the_cycle() {
    let shared = SharedAggregate::new();
    let loop_ = AcquisitionLoop::new(shared.clone(), 2_000);

    let mut hub = SensorHub::new(vec![Box::new(ScriptedSensor::new(
        SensorKind::AirQuality,
        true,
        vec![Ok(air(125)), Err(SensorError::BusError), Ok(air(250))],
    ))]);
    hub.probe_all();

    assert!(loop_.run_cycle(&mut hub, 1_000));
    assert_eq!(shared.snapshot().air_quality.unwrap().tvoc_ppb, 125);

    // The failed cycle flips scan_success but the last good value stays.
    assert!(!loop_.run_cycle(&mut hub, 2_000));
    let snap = shared.snapshot();
    assert!(!snap.scan_success);
    assert_eq!(snap.air_quality.unwrap().tvoc_ppb, 125);

    // Recovery on the next cycle.
    assert!(loop_.run_cycle(&mut hub, 3_000));
    let snap = shared.snapshot();
    assert!(snap.scan_success);
    assert_eq!(snap.air_quality.unwrap().tvoc_ppb, 250);
}

#[test]
fn not_working_sensor_is_never_read() {
    let shared = SharedAggregate::new();
    let loop_ = AcquisitionLoop::new(shared.clone(), 2_000);

    let dead = ScriptedSensor::new(SensorKind::ContactlessTemp, false, vec![]);
    let dead_reads = dead.read_counter();
    let alive = ScriptedSensor::new(SensorKind::HumidityTemp, true, vec![Ok(humidity(50.0))]);
    let alive_reads = alive.read_counter();

    let mut hub = SensorHub::new(vec![Box::new(dead), Box::new(alive)]);
    assert!(!hub.probe_all());
    assert_eq!(
        hub.status(SensorKind::ContactlessTemp),
        SensorStatus::NotWorking
    );

    for cycle in 1..=3u32 {
        loop_.run_cycle(&mut hub, u64::from(cycle) * 2_000);
    }

    assert_eq!(*dead_reads.lock().unwrap(), 0);
    assert_eq!(*alive_reads.lock().unwrap(), 3);
    // A degraded hub can still produce fully successful cycles: only
    // Working sensors count toward scan_success.
    assert!(shared.snapshot().scan_success);
}

#[test]
fn timestamp_never_goes_backwards() {
    let shared = SharedAggregate::new();
    let loop_ = AcquisitionLoop::new(shared.clone(), 2_000);

    let mut hub = SensorHub::new(vec![Box::new(ScriptedSensor::new(
        SensorKind::Imu,
        true,
        vec![Ok(imu(9.8))],
    ))]);
    hub.probe_all();

    loop_.run_cycle(&mut hub, 5_000);
    assert_eq!(shared.snapshot().read_timestamp_ms, 5_000);

    // A clock hiccup handing in an older stamp must not rewind it.
    loop_.run_cycle(&mut hub, 4_000);
    assert_eq!(shared.snapshot().read_timestamp_ms, 5_000);

    loop_.run_cycle(&mut hub, 7_000);
    assert_eq!(shared.snapshot().read_timestamp_ms, 7_000);
}
