//! Backend record shapes.
//!
//! Everything pushed over [`crate::ports::BackendPort`] serializes from
//! these structs via `serde_json`, so a record written to a path and read
//! back reproduces identical field values.

use serde::{Deserialize, Serialize};

use crate::aggregate::{
    AirQualityReading, ContactlessReading, HumidityReading, ImuReading, SensorAggregate,
};
use crate::mailbox::{CommandMailbox, ACTION_COUNT};
use crate::sensors::{SensorKind, SensorStatus};

/// One-time status snapshot pushed under `Sensor_Status` on the first
/// dispatch cycle only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusRecord {
    pub imu: String,
    pub contactless_temperature: String,
    pub humidity_temperature: String,
    pub air_quality: String,
    /// Human-readable last-update stamp, `YYYY-MM-DD HH:MM:SS`.
    pub last_update: String,
}

impl StatusRecord {
    pub fn new(statuses: &[(SensorKind, SensorStatus)], datetime: &str) -> Self {
        let lookup = |kind: SensorKind| {
            statuses
                .iter()
                .find(|(k, _)| *k == kind)
                .map_or(SensorStatus::Uninitialized, |(_, s)| *s)
                .name()
                .to_owned()
        };
        Self {
            imu: lookup(SensorKind::Imu),
            contactless_temperature: lookup(SensorKind::ContactlessTemp),
            humidity_temperature: lookup(SensorKind::HumidityTemp),
            air_quality: lookup(SensorKind::AirQuality),
            last_update: datetime.to_owned(),
        }
    }
}

/// One immutable history snapshot per rotation slot under
/// `ML_Training_Data/record_<NNN>`.
///
/// Only kinds whose sensor was Working at snapshot time are present;
/// the rest are omitted from the serialized record entirely.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRecord {
    /// `YYYY-MM-DD HH:MM:SS`.
    pub datetime: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub imu: Option<ImuReading>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub contactless_temperature: Option<ContactlessReading>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub humidity_temperature: Option<HumidityReading>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub air_quality: Option<AirQualityReading>,
    /// Mailbox contents at snapshot time, `action_1..action_5` in order.
    pub actions: Vec<String>,
}

impl HistoryRecord {
    pub fn from_snapshot(
        aggregate: &SensorAggregate,
        statuses: &[(SensorKind, SensorStatus)],
        mailbox: &CommandMailbox,
        datetime: &str,
    ) -> Self {
        let working = |kind: SensorKind| {
            statuses
                .iter()
                .any(|(k, s)| *k == kind && *s == SensorStatus::Working)
        };
        Self {
            datetime: datetime.to_owned(),
            imu: aggregate.imu.filter(|_| working(SensorKind::Imu)),
            contactless_temperature: aggregate
                .contactless
                .filter(|_| working(SensorKind::ContactlessTemp)),
            humidity_temperature: aggregate
                .humidity
                .filter(|_| working(SensorKind::HumidityTemp)),
            air_quality: aggregate
                .air_quality
                .filter(|_| working(SensorKind::AirQuality)),
            actions: (1..=ACTION_COUNT)
                .map(|i| mailbox.value(i).unwrap_or_default().to_owned())
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_record_covers_all_kinds() {
        let statuses = vec![
            (SensorKind::Imu, SensorStatus::Working),
            (SensorKind::AirQuality, SensorStatus::NotWorking),
        ];
        let rec = StatusRecord::new(&statuses, "2026-01-02 03:04:05");
        assert_eq!(rec.imu, "Working");
        assert_eq!(rec.air_quality, "NotWorking");
        assert_eq!(rec.humidity_temperature, "Uninitialized");
        assert_eq!(rec.last_update, "2026-01-02 03:04:05");
    }

    #[test]
    fn history_record_omits_non_working_kinds() {
        let mut agg = SensorAggregate::default();
        agg.humidity = Some(HumidityReading {
            humidity_pct: 60.0,
            temp_c: 25.0,
        });
        // Stale air-quality value from before the sensor died.
        agg.air_quality = Some(AirQualityReading {
            tvoc_ppb: 5,
            eco2_ppm: 410,
        });

        let statuses = vec![
            (SensorKind::HumidityTemp, SensorStatus::Working),
            (SensorKind::AirQuality, SensorStatus::NotWorking),
        ];
        let rec = HistoryRecord::from_snapshot(
            &agg,
            &statuses,
            &CommandMailbox::new(),
            "2026-01-02 03:04:05",
        );
        assert!(rec.humidity_temperature.is_some());
        assert!(rec.air_quality.is_none());

        let json = serde_json::to_value(&rec).unwrap();
        assert!(json.get("air_quality").is_none(), "omitted, not null");
    }

    #[test]
    fn history_record_round_trips() {
        let mut agg = SensorAggregate::default();
        agg.imu = Some(ImuReading {
            accel_x: 1.0,
            accel_y: 0.0,
            accel_z: 9.8,
            gyro_x: 0.0,
            gyro_y: 0.0,
            gyro_z: 0.0,
            die_temp_c: 30.5,
        });
        let statuses = vec![(SensorKind::Imu, SensorStatus::Working)];
        let mut mailbox = CommandMailbox::new();
        mailbox.set(1, "ON");

        let rec = HistoryRecord::from_snapshot(&agg, &statuses, &mailbox, "2026-08-29 12:00:00");
        let json = serde_json::to_value(&rec).unwrap();
        let back: HistoryRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back, rec);
        assert_eq!(back.actions[0], "ON");
    }
}
