//! ESP32 time adapter.
//!
//! Provides monotonic uptime and calendar wall-clock time.
//!
//! - **`target_os = "espidf"`** — uptime wraps `esp_timer_get_time()`;
//!   calendar time comes from `gettimeofday()` + `localtime_r()` and is
//!   only trusted once SNTP has moved the clock past 2020.
//! - **`not(target_os = "espidf")`** — `std::time::Instant` for uptime
//!   and `chrono::Local` for calendar time.

use core::fmt;

/// Broken-down local time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateTimeParts {
    pub year: i32,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

impl fmt::Display for DateTimeParts {
    /// The record datetime format: `YYYY-MM-DD HH:MM:SS`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
            self.year, self.month, self.day, self.hour, self.minute, self.second
        )
    }
}

/// Time adapter for the ESP32 platform.
pub struct Esp32TimeAdapter {
    #[cfg(not(target_os = "espidf"))]
    start: std::time::Instant,
}

impl Default for Esp32TimeAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl Esp32TimeAdapter {
    pub fn new() -> Self {
        Self {
            #[cfg(not(target_os = "espidf"))]
            start: std::time::Instant::now(),
        }
    }

    /// Microseconds since boot (monotonic, wraps at `u64::MAX`).
    #[cfg(target_os = "espidf")]
    pub fn uptime_us(&self) -> u64 {
        (unsafe { esp_idf_svc::sys::esp_timer_get_time() }) as u64
    }

    /// Microseconds since boot (monotonic, wraps at `u64::MAX`).
    #[cfg(not(target_os = "espidf"))]
    pub fn uptime_us(&self) -> u64 {
        self.start.elapsed().as_micros() as u64
    }

    /// Seconds since boot (monotonic).
    pub fn uptime_secs(&self) -> u64 {
        self.uptime_us() / 1_000_000
    }

    /// Broken-down local wall-clock time. `None` if the clock is not
    /// synced yet (e.g. pre-SNTP).
    #[cfg(target_os = "espidf")]
    pub fn now(&self) -> Option<DateTimeParts> {
        use core::ptr;
        let mut tv = esp_idf_svc::sys::timeval {
            tv_sec: 0,
            tv_usec: 0,
        };
        if unsafe { esp_idf_svc::sys::gettimeofday(&mut tv, ptr::null_mut()) } != 0 {
            return None;
        }
        // Reject obviously unsynced time (e.g. before 2020-01-01)
        const EPOCH_2020: i64 = 1_577_836_800;
        if tv.tv_sec < EPOCH_2020 {
            return None;
        }
        let secs = tv.tv_sec as esp_idf_svc::sys::time_t;
        let mut tm: esp_idf_svc::sys::tm = unsafe { core::mem::zeroed() };
        if unsafe { esp_idf_svc::sys::localtime_r(&secs, &mut tm) }.is_null() {
            return None;
        }
        Some(DateTimeParts {
            year: tm.tm_year + 1900,
            month: (tm.tm_mon + 1) as u8,
            day: tm.tm_mday as u8,
            hour: tm.tm_hour as u8,
            minute: tm.tm_min as u8,
            second: tm.tm_sec as u8,
        })
    }

    /// Broken-down local wall-clock time via chrono on the host.
    #[cfg(not(target_os = "espidf"))]
    pub fn now(&self) -> Option<DateTimeParts> {
        use chrono::{Datelike, Local, Timelike};
        let now = Local::now();
        Some(DateTimeParts {
            year: now.year(),
            month: now.month() as u8,
            day: now.day() as u8,
            hour: now.hour() as u8,
            minute: now.minute() as u8,
            second: now.second() as u8,
        })
    }

    /// Record-format datetime string, or the epoch placeholder when the
    /// wall clock is not synced yet.
    pub fn datetime_string(&self) -> String {
        match self.now() {
            Some(parts) => parts.to_string(),
            None => "1970-01-01 00:00:00".into(),
        }
    }
}
