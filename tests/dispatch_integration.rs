//! Integration tests: DispatchLoop → backend / modem ports.
//!
//! Drives whole dispatch cycles against recording mocks and checks the
//! externally visible write pattern: which paths were touched, in what
//! shape, and how failures on one path affect the rest of the cycle.

use std::collections::HashMap;

use serde_json::{json, Value};

use envnode::adapters::firebase::FirebaseAdapter;
use envnode::aggregate::{HumidityReading, ImuReading, KindReading, SharedAggregate};
use envnode::config::SystemConfig;
use envnode::dispatch::DispatchLoop;
use envnode::ports::{BackendPort, ModemPort};
use envnode::records::HistoryRecord;
use envnode::sensors::{SensorKind, SensorStatus};
use envnode::{BackendError, ModemError};

// ── Mock implementations ──────────────────────────────────────

/// Backend over a HashMap that records every write and can be told to
/// fail any path containing a given fragment.
#[derive(Default)]
struct MockBackend {
    store: HashMap<String, Value>,
    writes: Vec<String>,
    fail_fragments: Vec<&'static str>,
}

impl MockBackend {
    fn fail_on(&mut self, fragment: &'static str) {
        self.fail_fragments.push(fragment);
    }

    fn should_fail(&self, path: &str) -> bool {
        self.fail_fragments.iter().any(|f| path.contains(f))
    }

    fn writes_to(&self, fragment: &str) -> usize {
        self.writes.iter().filter(|p| p.contains(fragment)).count()
    }
}

impl BackendPort for MockBackend {
    fn set_record(&mut self, path: &str, value: &Value) -> Result<(), BackendError> {
        if self.should_fail(path) {
            return Err(BackendError::Unreachable);
        }
        self.writes.push(path.to_owned());
        self.store.insert(path.to_owned(), value.clone());
        Ok(())
    }

    fn get_string(&mut self, path: &str) -> Result<String, BackendError> {
        if self.should_fail(path) {
            return Err(BackendError::Unreachable);
        }
        match self.store.get(path) {
            Some(Value::String(s)) => Ok(s.clone()),
            Some(_) => Err(BackendError::InvalidValue),
            None => Err(BackendError::NotFound),
        }
    }

    fn get_int(&mut self, path: &str) -> Result<i64, BackendError> {
        if self.should_fail(path) {
            return Err(BackendError::Unreachable);
        }
        self.store
            .get(path)
            .and_then(Value::as_i64)
            .ok_or(BackendError::NotFound)
    }

    fn delete_subtree(&mut self, path: &str) -> Result<(), BackendError> {
        if self.should_fail(path) {
            return Err(BackendError::Unreachable);
        }
        let prefix = format!("{path}/");
        self.store.retain(|k, _| k != path && !k.starts_with(&prefix));
        Ok(())
    }
}

#[derive(Default)]
struct MockModem {
    sent: Vec<(String, String)>,
}

impl ModemPort for MockModem {
    fn send_sms(&mut self, number: &str, message: &str) -> Result<(), ModemError> {
        self.sent.push((number.to_owned(), message.to_owned()));
        Ok(())
    }
}

// ── Fixtures ──────────────────────────────────────────────────

fn test_config() -> SystemConfig {
    SystemConfig {
        user_name: "alice".to_owned(),
        alert_number: "+15550001111".to_owned(),
        dispatch_yield_ms: 0,
        ..Default::default()
    }
}

fn all_working() -> Vec<(SensorKind, SensorStatus)> {
    SensorKind::ALL
        .into_iter()
        .map(|k| (k, SensorStatus::Working))
        .collect()
}

fn seeded_shared() -> SharedAggregate {
    let shared = SharedAggregate::new();
    shared.store(KindReading::Imu(ImuReading {
        accel_x: 0.1,
        accel_y: -0.2,
        accel_z: 9.8,
        gyro_x: 1.0,
        gyro_y: 0.0,
        gyro_z: -1.0,
        die_temp_c: 31.5,
    }));
    shared.store(KindReading::HumidityTemp(HumidityReading {
        humidity_pct: 48.0,
        temp_c: 22.5,
    }));
    shared.finish_cycle(true, 2_000);
    shared
}

const STAMP: &str = "2026-08-29 10:00:00";

// ── Tests ─────────────────────────────────────────────────────

#[test]
fn status_snapshot_is_pushed_exactly_once() {
    let mut dispatch = DispatchLoop::new(seeded_shared(), &test_config());
    let mut backend = MockBackend::default();
    let mut modem = MockModem::default();
    let statuses = all_working();

    for _ in 0..3 {
        dispatch.run_cycle(&mut backend, &mut modem, &statuses, STAMP);
    }

    assert_eq!(backend.writes_to("Sensor_Status"), 1);
    let status = &backend.store["alice/Sensor_Status"];
    assert_eq!(status["imu"], json!("Working"));
    assert_eq!(status["last_update"], json!(STAMP));
}

#[test]
fn failed_status_push_is_not_retried() {
    let mut dispatch = DispatchLoop::new(seeded_shared(), &test_config());
    let mut backend = MockBackend::default();
    backend.fail_on("Sensor_Status");
    let mut modem = MockModem::default();
    let statuses = all_working();

    dispatch.run_cycle(&mut backend, &mut modem, &statuses, STAMP);
    backend.fail_fragments.clear();
    dispatch.run_cycle(&mut backend, &mut modem, &statuses, STAMP);

    // Status is latched at probe time, so the loop never re-sends it.
    assert_eq!(backend.writes_to("Sensor_Status"), 0);
}

#[test]
fn one_kind_push_failure_does_not_block_the_others() {
    let mut dispatch = DispatchLoop::new(seeded_shared(), &test_config());
    let mut backend = MockBackend::default();
    backend.fail_on("Sensor_Data/IMU");
    let mut modem = MockModem::default();
    let statuses = all_working();

    dispatch.run_cycle(&mut backend, &mut modem, &statuses, STAMP);

    assert_eq!(backend.writes_to("Sensor_Data/IMU"), 0);
    assert_eq!(backend.writes_to("Sensor_Data/Humidity_Temperature"), 1);
    // History and the counter still happen after the failed push.
    assert_eq!(backend.writes_to("ML_Training_Data/record_001"), 1);
    assert_eq!(backend.writes_to("ML_Training_Meta/record_count"), 1);
}

#[test]
fn not_working_kinds_are_omitted_everywhere() {
    let mut dispatch = DispatchLoop::new(seeded_shared(), &test_config());
    let mut backend = MockBackend::default();
    let mut modem = MockModem::default();
    // Humidity has a stored reading but its sensor is down.
    let statuses = vec![
        (SensorKind::Imu, SensorStatus::Working),
        (SensorKind::ContactlessTemp, SensorStatus::NotWorking),
        (SensorKind::HumidityTemp, SensorStatus::NotWorking),
        (SensorKind::AirQuality, SensorStatus::Working),
    ];

    dispatch.run_cycle(&mut backend, &mut modem, &statuses, STAMP);

    assert_eq!(backend.writes_to("Sensor_Data/IMU"), 1);
    assert_eq!(backend.writes_to("Sensor_Data/Humidity_Temperature"), 0);

    let status = &backend.store["alice/Sensor_Status"];
    assert_eq!(status["humidity_temperature"], json!("NotWorking"));

    // The history record omits the field entirely rather than writing null.
    let history = &backend.store["alice/ML_Training_Data/record_001"];
    assert!(history.get("humidity_temperature").is_none());
    assert!(history.get("imu").is_some());
}

#[test]
fn history_slots_advance_across_cycles() {
    let mut dispatch = DispatchLoop::new(seeded_shared(), &test_config());
    let mut backend = MockBackend::default();
    let mut modem = MockModem::default();
    let statuses = all_working();

    for _ in 0..3 {
        dispatch.run_cycle(&mut backend, &mut modem, &statuses, STAMP);
    }

    assert_eq!(backend.writes_to("record_001"), 1);
    assert_eq!(backend.writes_to("record_002"), 1);
    assert_eq!(backend.writes_to("record_003"), 1);
    assert_eq!(
        backend.store["alice/ML_Training_Meta/record_count"],
        json!(3)
    );
}

#[test]
fn mailbox_on_flag_fires_sms_until_cleared() {
    let mut dispatch = DispatchLoop::new(seeded_shared(), &test_config());
    let mut backend = MockBackend::default();
    let mut modem = MockModem::default();
    let statuses = all_working();

    backend
        .set_record("alice/Actions/action_2", &json!("ON"))
        .unwrap();
    // Lowercase and OFF never trigger.
    backend
        .set_record("alice/Actions/action_3", &json!("on"))
        .unwrap();
    backend
        .set_record("alice/Actions/action_4", &json!("OFF"))
        .unwrap();

    dispatch.run_cycle(&mut backend, &mut modem, &statuses, STAMP);
    assert_eq!(modem.sent.len(), 1);
    assert_eq!(modem.sent[0].0, "+15550001111");

    // Level-triggered: still ON, fires again.
    dispatch.run_cycle(&mut backend, &mut modem, &statuses, STAMP);
    assert_eq!(modem.sent.len(), 2);

    // Cleared on the backend: silence.
    backend
        .set_record("alice/Actions/action_2", &json!("OFF"))
        .unwrap();
    dispatch.run_cycle(&mut backend, &mut modem, &statuses, STAMP);
    assert_eq!(modem.sent.len(), 2);
}

#[test]
fn unreachable_mailbox_keeps_stale_flags() {
    let mut dispatch = DispatchLoop::new(seeded_shared(), &test_config());
    let mut backend = MockBackend::default();
    let mut modem = MockModem::default();
    let statuses = all_working();

    backend
        .set_record("alice/Actions/action_1", &json!("ON"))
        .unwrap();
    dispatch.run_cycle(&mut backend, &mut modem, &statuses, STAMP);
    assert_eq!(modem.sent.len(), 1);

    // Backend goes dark: the stale ON keeps alerting.
    backend.fail_on("Actions");
    dispatch.run_cycle(&mut backend, &mut modem, &statuses, STAMP);
    assert_eq!(modem.sent.len(), 2);
    assert_eq!(dispatch.mailbox().value(1), Some("ON"));
}

#[test]
fn history_record_round_trips_through_host_backend() {
    // Same cycle, but through the real host FirebaseAdapter instead of
    // the hand-rolled mock, then deserialized back into the struct.
    let mut dispatch = DispatchLoop::new(seeded_shared(), &test_config());
    let mut backend = FirebaseAdapter::new("example.firebaseio.com", "", 4_000);
    let mut modem = MockModem::default();
    let statuses = all_working();

    for _ in 0..3 {
        dispatch.run_cycle(&mut backend, &mut modem, &statuses, STAMP);
    }

    let stored = backend
        .sim_value("alice/ML_Training_Data/record_003")
        .expect("third cycle wrote record_003")
        .clone();
    let record: HistoryRecord = serde_json::from_value(stored).unwrap();
    assert_eq!(record.datetime, STAMP);
    assert_eq!(record.imu.unwrap().accel_z, 9.8);
    assert_eq!(record.actions.len(), 5);
}
