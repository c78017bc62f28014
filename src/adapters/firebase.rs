//! Key-path datastore adapter (Firebase-RTDB-shaped REST API).
//!
//! Implements [`BackendPort`].
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: HTTPS via the ESP-IDF HTTP client.
//!   Records map onto the RTDB REST convention: `PUT <host>/<path>.json`
//!   writes, `GET` reads, `DELETE` wipes a subtree. The auth token rides
//!   in the query string.
//! - **all other targets**: an in-memory map plus failure injection for
//!   host-side tests. Values are stored as parsed JSON, so whatever is
//!   written reads back identically.

use log::info;
use serde_json::Value;

use crate::ports::BackendPort;
use crate::BackendError;

#[cfg(not(target_os = "espidf"))]
use std::collections::HashMap;

pub struct FirebaseAdapter {
    host: String,
    auth: String,
    timeout_ms: u32,
    #[cfg(not(target_os = "espidf"))]
    store: HashMap<String, Value>,
    /// Simulation: any path containing one of these substrings fails.
    #[cfg(not(target_os = "espidf"))]
    sim_fail_substrings: Vec<String>,
}

impl FirebaseAdapter {
    pub fn new(host: &str, auth: &str, timeout_ms: u32) -> Self {
        #[cfg(target_os = "espidf")]
        info!("FirebaseAdapter: REST client for {host}");
        #[cfg(not(target_os = "espidf"))]
        info!("FirebaseAdapter: simulation backend");

        Self {
            host: host.to_owned(),
            auth: auth.to_owned(),
            timeout_ms,
            #[cfg(not(target_os = "espidf"))]
            store: HashMap::new(),
            #[cfg(not(target_os = "espidf"))]
            sim_fail_substrings: Vec::new(),
        }
    }

    // ── Simulation controls (host tests) ──────────────────────

    /// Make every call whose path contains `fragment` fail.
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_fail_on(&mut self, fragment: &str) {
        self.sim_fail_substrings.push(fragment.to_owned());
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn sim_clear_failures(&mut self) {
        self.sim_fail_substrings.clear();
    }

    /// Raw stored value at a path (host tests).
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_value(&self, path: &str) -> Option<&Value> {
        self.store.get(path)
    }

    /// Number of stored paths under a prefix (host tests).
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_count_under(&self, prefix: &str) -> usize {
        let with_slash = format!("{prefix}/");
        self.store
            .keys()
            .filter(|k| *k == prefix || k.starts_with(&with_slash))
            .count()
    }

    #[cfg(not(target_os = "espidf"))]
    fn sim_should_fail(&self, path: &str) -> bool {
        self.sim_fail_substrings.iter().any(|s| path.contains(s))
    }

    // ── Platform-specific transport ───────────────────────────

    #[cfg(target_os = "espidf")]
    fn url(&self, path: &str) -> String {
        if self.auth.is_empty() {
            format!("https://{}/{}.json", self.host, path)
        } else {
            format!("https://{}/{}.json?auth={}", self.host, path, self.auth)
        }
    }

    /// One REST round trip. A non-2xx status maps to `Rejected`; any
    /// transport error maps to `Unreachable`.
    #[cfg(target_os = "espidf")]
    fn request(
        &mut self,
        method: esp_idf_svc::http::Method,
        path: &str,
        body: Option<&str>,
    ) -> Result<String, BackendError> {
        use esp_idf_svc::http::client::{Configuration, EspHttpConnection};

        let mut conn = EspHttpConnection::new(&Configuration {
            timeout: Some(core::time::Duration::from_millis(u64::from(self.timeout_ms))),
            crt_bundle_attach: Some(esp_idf_svc::sys::esp_crt_bundle_attach),
            ..Default::default()
        })
        .map_err(|_| BackendError::Unreachable)?;

        let url = self.url(path);
        let headers = [("Content-Type", "application/json")];
        conn.initiate_request(method, &url, &headers)
            .map_err(|_| BackendError::Unreachable)?;
        if let Some(body) = body {
            conn.write(body.as_bytes())
                .map_err(|_| BackendError::Unreachable)?;
        }
        conn.initiate_response()
            .map_err(|_| BackendError::Unreachable)?;

        let status = conn.status();
        if !(200..300).contains(&status) {
            return Err(BackendError::Rejected);
        }

        let mut out = Vec::new();
        let mut buf = [0u8; 256];
        loop {
            match conn.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => out.extend_from_slice(&buf[..n]),
                Err(_) => return Err(BackendError::Unreachable),
            }
        }
        String::from_utf8(out).map_err(|_| BackendError::InvalidValue)
    }

    #[cfg(target_os = "espidf")]
    fn platform_set(&mut self, path: &str, value: &Value) -> Result<(), BackendError> {
        let body = serde_json::to_string(value).map_err(|_| BackendError::Serialize)?;
        self.request(esp_idf_svc::http::Method::Put, path, Some(&body))
            .map(|_| ())
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_set(&mut self, path: &str, value: &Value) -> Result<(), BackendError> {
        if self.sim_should_fail(path) {
            return Err(BackendError::Unreachable);
        }
        self.store.insert(path.to_owned(), value.clone());
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn platform_get(&mut self, path: &str) -> Result<Value, BackendError> {
        let body = self.request(esp_idf_svc::http::Method::Get, path, None)?;
        // RTDB answers `null` for an absent path.
        let value: Value =
            serde_json::from_str(&body).map_err(|_| BackendError::InvalidValue)?;
        if value.is_null() {
            return Err(BackendError::NotFound);
        }
        Ok(value)
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_get(&mut self, path: &str) -> Result<Value, BackendError> {
        if self.sim_should_fail(path) {
            return Err(BackendError::Unreachable);
        }
        self.store.get(path).cloned().ok_or(BackendError::NotFound)
    }

    #[cfg(target_os = "espidf")]
    fn platform_delete(&mut self, path: &str) -> Result<(), BackendError> {
        self.request(esp_idf_svc::http::Method::Delete, path, None)
            .map(|_| ())
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_delete(&mut self, path: &str) -> Result<(), BackendError> {
        if self.sim_should_fail(path) {
            return Err(BackendError::Unreachable);
        }
        let prefix = format!("{path}/");
        self.store
            .retain(|k, _| k != path && !k.starts_with(&prefix));
        Ok(())
    }
}

// ───────────────────────────────────────────────────────────────
// BackendPort
// ───────────────────────────────────────────────────────────────

impl BackendPort for FirebaseAdapter {
    fn set_record(&mut self, path: &str, value: &Value) -> Result<(), BackendError> {
        self.platform_set(path, value)
    }

    fn get_string(&mut self, path: &str) -> Result<String, BackendError> {
        match self.platform_get(path)? {
            Value::String(s) => Ok(s),
            _ => Err(BackendError::InvalidValue),
        }
    }

    fn get_int(&mut self, path: &str) -> Result<i64, BackendError> {
        self.platform_get(path)?
            .as_i64()
            .ok_or(BackendError::InvalidValue)
    }

    fn delete_subtree(&mut self, path: &str) -> Result<(), BackendError> {
        self.platform_delete(path)
    }
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────

#[cfg(all(test, not(target_os = "espidf")))]
mod tests {
    use super::*;
    use serde_json::json;

    fn adapter() -> FirebaseAdapter {
        FirebaseAdapter::new("example.firebaseio.com", "secret", 4_000)
    }

    #[test]
    fn set_then_get_round_trips() {
        let mut fb = adapter();
        fb.set_record("u/Sensor_Data/IMU", &json!({"accel_x": 1.5}))
            .unwrap();
        assert_eq!(
            fb.sim_value("u/Sensor_Data/IMU").unwrap()["accel_x"],
            json!(1.5)
        );
    }

    #[test]
    fn typed_getters_enforce_types() {
        let mut fb = adapter();
        fb.set_record("u/a", &json!("hello")).unwrap();
        fb.set_record("u/b", &json!(42)).unwrap();

        assert_eq!(fb.get_string("u/a").unwrap(), "hello");
        assert_eq!(fb.get_int("u/b").unwrap(), 42);
        assert_eq!(fb.get_int("u/a"), Err(BackendError::InvalidValue));
        assert_eq!(fb.get_string("u/missing"), Err(BackendError::NotFound));
    }

    #[test]
    fn delete_subtree_removes_children_only() {
        let mut fb = adapter();
        fb.set_record("u/ML_Training_Data/record_001", &json!(1))
            .unwrap();
        fb.set_record("u/ML_Training_Data/record_002", &json!(2))
            .unwrap();
        fb.set_record("u/ML_Training_Meta/record_count", &json!(2))
            .unwrap();

        fb.delete_subtree("u/ML_Training_Data").unwrap();
        assert_eq!(fb.sim_count_under("u/ML_Training_Data"), 0);
        assert_eq!(fb.get_int("u/ML_Training_Meta/record_count").unwrap(), 2);
    }

    #[test]
    fn failure_injection_is_path_scoped() {
        let mut fb = adapter();
        fb.sim_fail_on("Sensor_Data/IMU");
        assert_eq!(
            fb.set_record("u/Sensor_Data/IMU", &json!(1)),
            Err(BackendError::Unreachable)
        );
        fb.set_record("u/Sensor_Data/Air_Quality", &json!(2)).unwrap();
    }
}
