//! Backend path layout, scoped under the configured user prefix.
//!
//! ```text
//! <user>/Sensor_Data/<Kind>              latest reading per kind, overwritten each cycle
//! <user>/Sensor_Status/*                 one-time status snapshot
//! <user>/ML_Training_Data/record_<NNN>   rotating history slots, 001..max
//! <user>/ML_Training_Meta/record_count   persisted rotation counter
//! <user>/Actions/action_<1..5>           remote-writable command strings
//! ```

use crate::sensors::SensorKind;

/// Latest-reading snapshot path for one sensor kind.
pub fn sensor_data(user: &str, kind: SensorKind) -> String {
    format!("{user}/Sensor_Data/{}", kind.name())
}

/// One-time status snapshot path.
pub fn sensor_status(user: &str) -> String {
    format!("{user}/Sensor_Status")
}

/// History slot path, `NNN` zero-padded to 3 digits.
pub fn training_record(user: &str, slot: u32) -> String {
    format!("{user}/ML_Training_Data/{}", record_key(slot))
}

/// The whole history subtree (wiped on rotation wraparound).
pub fn training_data_root(user: &str) -> String {
    format!("{user}/ML_Training_Data")
}

/// Persisted rotation counter path.
pub fn record_count(user: &str) -> String {
    format!("{user}/ML_Training_Meta/record_count")
}

/// Remote action slot path, `index` is 1-based.
pub fn action(user: &str, index: usize) -> String {
    format!("{user}/Actions/action_{index}")
}

/// Record key for a history slot, e.g. `record_003`.
pub fn record_key(slot: u32) -> String {
    format!("record_{slot:03}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_key_is_zero_padded() {
        assert_eq!(record_key(3), "record_003");
        assert_eq!(record_key(42), "record_042");
        assert_eq!(record_key(100), "record_100");
    }

    #[test]
    fn paths_are_user_scoped() {
        assert_eq!(
            sensor_data("alice", SensorKind::Imu),
            "alice/Sensor_Data/IMU"
        );
        assert_eq!(action("alice", 1), "alice/Actions/action_1");
        assert_eq!(
            record_count("alice"),
            "alice/ML_Training_Meta/record_count"
        );
        assert_eq!(
            training_record("alice", 7),
            "alice/ML_Training_Data/record_007"
        );
    }
}
