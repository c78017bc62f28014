//! WiFi station-mode adapter.
//!
//! Implements [`ConnectivityPort`]. The backend uplink rides on this
//! connection, so the dispatch loop polls it each cycle and the adapter
//! handles reconnection on its own.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: real ESP-IDF WiFi driver via
//!   `esp_idf_svc::wifi::BlockingWifi`, attached from `main` once the
//!   modem peripheral exists.
//! - **all other targets**: simulation stubs for host-side tests.
//!
//! ## Reconnection policy
//!
//! On disconnect the adapter waits an exponential backoff (2 s → 4 s →
//! 8 s … capped at 60 s) before retrying.

use core::fmt;
use log::{error, info, warn};

// ───────────────────────────────────────────────────────────────
// Port trait
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectivityError {
    NoCredentials,
    InvalidSsid,
    InvalidPassword,
    AuthFailed,
    ConnectionFailed,
    AlreadyConnected,
}

impl fmt::Display for ConnectivityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoCredentials => write!(f, "no WiFi credentials configured"),
            Self::InvalidSsid => write!(f, "SSID invalid (must be 1-32 printable ASCII bytes)"),
            Self::InvalidPassword => {
                write!(f, "password invalid (must be 8-64 bytes for WPA2, or empty for open)")
            }
            Self::AuthFailed => write!(f, "access point rejected credentials"),
            Self::ConnectionFailed => write!(f, "WiFi connection failed"),
            Self::AlreadyConnected => write!(f, "already connected to AP"),
        }
    }
}

pub trait ConnectivityPort {
    fn connect(&mut self) -> Result<(), ConnectivityError>;
    fn disconnect(&mut self);
    fn is_connected(&self) -> bool;
    fn poll(&mut self);
    fn set_credentials(&mut self, ssid: &str, password: &str) -> Result<(), ConnectivityError>;
    fn rssi(&self) -> Option<i8>;
}

// ───────────────────────────────────────────────────────────────
// Connection state
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WifiState {
    Disconnected,
    Connecting,
    Connected,
    Reconnecting { attempt: u32 },
    Failed,
}

const MAX_BACKOFF_SECS: u32 = 60;

// ───────────────────────────────────────────────────────────────
// Validation
// ───────────────────────────────────────────────────────────────

fn is_printable_ascii(s: &str) -> bool {
    s.bytes().all(|b| (0x20..=0x7E).contains(&b))
}

fn validate_ssid(ssid: &str) -> Result<(), ConnectivityError> {
    if ssid.is_empty() || ssid.len() > 32 {
        return Err(ConnectivityError::InvalidSsid);
    }
    if !is_printable_ascii(ssid) {
        return Err(ConnectivityError::InvalidSsid);
    }
    Ok(())
}

fn validate_password(password: &str) -> Result<(), ConnectivityError> {
    if password.is_empty() {
        return Ok(());
    }
    if password.len() < 8 || password.len() > 64 {
        return Err(ConnectivityError::InvalidPassword);
    }
    Ok(())
}

// ───────────────────────────────────────────────────────────────
// WiFi adapter
// ───────────────────────────────────────────────────────────────

pub struct WifiAdapter {
    state: WifiState,
    ssid: heapless::String<32>,
    password: heapless::String<64>,
    backoff_secs: u32,
    last_rssi: Option<i8>,
    #[cfg(target_os = "espidf")]
    wifi: Option<esp_idf_svc::wifi::BlockingWifi<esp_idf_svc::wifi::EspWifi<'static>>>,
    /// Simulation: scripted connect failures for host tests.
    #[cfg(not(target_os = "espidf"))]
    sim_fail_next: u32,
}

impl WifiAdapter {
    pub fn new() -> Self {
        Self {
            state: WifiState::Disconnected,
            ssid: heapless::String::new(),
            password: heapless::String::new(),
            backoff_secs: 2,
            last_rssi: None,
            #[cfg(target_os = "espidf")]
            wifi: None,
            #[cfg(not(target_os = "espidf"))]
            sim_fail_next: 0,
        }
    }

    pub fn state(&self) -> WifiState {
        self.state
    }

    pub fn backoff_secs(&self) -> u32 {
        self.backoff_secs
    }

    /// Hand over the driver once `main` owns the modem peripheral.
    #[cfg(target_os = "espidf")]
    pub fn attach(
        &mut self,
        wifi: esp_idf_svc::wifi::BlockingWifi<esp_idf_svc::wifi::EspWifi<'static>>,
    ) {
        self.wifi = Some(wifi);
    }

    /// Simulation: make the next `n` connect attempts fail.
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_fail_next_connects(&mut self, n: u32) {
        self.sim_fail_next = n;
    }

    // ── Platform-specific ─────────────────────────────────────

    #[cfg(target_os = "espidf")]
    fn platform_connect(&mut self) -> Result<(), ConnectivityError> {
        use esp_idf_svc::wifi::{AuthMethod, ClientConfiguration, Configuration};

        let wifi = self
            .wifi
            .as_mut()
            .ok_or(ConnectivityError::ConnectionFailed)?;

        let auth_method = if self.password.is_empty() {
            AuthMethod::None
        } else {
            AuthMethod::WPA2Personal
        };
        wifi.set_configuration(&Configuration::Client(ClientConfiguration {
            ssid: self.ssid.clone(),
            password: self.password.clone(),
            auth_method,
            ..Default::default()
        }))
        .map_err(|_| ConnectivityError::ConnectionFailed)?;

        wifi.start().map_err(|_| ConnectivityError::ConnectionFailed)?;
        wifi.connect().map_err(|_| ConnectivityError::AuthFailed)?;
        wifi.wait_netif_up()
            .map_err(|_| ConnectivityError::ConnectionFailed)?;
        Ok(())
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_connect(&mut self) -> Result<(), ConnectivityError> {
        if self.sim_fail_next > 0 {
            self.sim_fail_next -= 1;
            warn!("WiFi(sim): scripted connect failure");
            return Err(ConnectivityError::ConnectionFailed);
        }
        info!("WiFi(sim): connected to '{}'", self.ssid);
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn platform_disconnect(&mut self) {
        if let Some(wifi) = self.wifi.as_mut() {
            let _ = wifi.disconnect();
            let _ = wifi.stop();
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_disconnect(&mut self) {
        info!("WiFi(sim): disconnected");
    }

    #[cfg(target_os = "espidf")]
    fn platform_is_connected(&self) -> bool {
        self.wifi
            .as_ref()
            .and_then(|w| w.is_connected().ok())
            .unwrap_or(false)
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_is_connected(&self) -> bool {
        self.state == WifiState::Connected
    }

    #[cfg(target_os = "espidf")]
    fn platform_rssi(&self) -> Option<i8> {
        let mut ap_info: esp_idf_svc::sys::wifi_ap_record_t = Default::default();
        // SAFETY: ap_info is a plain record filled in by the driver.
        let ret = unsafe { esp_idf_svc::sys::esp_wifi_sta_get_ap_info(&mut ap_info) };
        if ret == esp_idf_svc::sys::ESP_OK {
            Some(ap_info.rssi)
        } else {
            None
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_rssi(&self) -> Option<i8> {
        if self.state != WifiState::Connected {
            return None;
        }
        Some(-58)
    }
}

impl Default for WifiAdapter {
    fn default() -> Self {
        Self::new()
    }
}

// ───────────────────────────────────────────────────────────────
// ConnectivityPort
// ───────────────────────────────────────────────────────────────

impl ConnectivityPort for WifiAdapter {
    fn connect(&mut self) -> Result<(), ConnectivityError> {
        if self.ssid.is_empty() {
            return Err(ConnectivityError::NoCredentials);
        }
        if self.state == WifiState::Connected {
            return Err(ConnectivityError::AlreadyConnected);
        }

        info!("WiFi: connecting to '{}'", self.ssid);
        self.state = WifiState::Connecting;

        match self.platform_connect() {
            Ok(()) => {
                self.state = WifiState::Connected;
                self.backoff_secs = 2;
                self.last_rssi = self.platform_rssi();
                info!("WiFi: connected (RSSI={:?})", self.last_rssi);
                Ok(())
            }
            Err(e) => {
                error!("WiFi: connection failed — {e}");
                self.state = WifiState::Reconnecting { attempt: 0 };
                Err(e)
            }
        }
    }

    fn disconnect(&mut self) {
        self.platform_disconnect();
        self.state = WifiState::Disconnected;
        self.last_rssi = None;
        info!("WiFi: disconnected");
    }

    fn is_connected(&self) -> bool {
        self.platform_is_connected()
    }

    fn poll(&mut self) {
        match self.state {
            WifiState::Reconnecting { attempt } => {
                info!(
                    "WiFi: reconnect attempt {attempt} (backoff {}s)",
                    self.backoff_secs
                );
                match self.platform_connect() {
                    Ok(()) => {
                        self.state = WifiState::Connected;
                        self.backoff_secs = 2;
                        self.last_rssi = self.platform_rssi();
                        info!("WiFi: reconnected (RSSI={:?})", self.last_rssi);
                    }
                    Err(_) => {
                        self.backoff_secs = (self.backoff_secs * 2).min(MAX_BACKOFF_SECS);
                        self.state = WifiState::Reconnecting {
                            attempt: attempt + 1,
                        };
                    }
                }
            }
            WifiState::Connected => {
                if !self.platform_is_connected() {
                    warn!("WiFi: connection lost, entering reconnect");
                    self.state = WifiState::Reconnecting { attempt: 0 };
                    self.last_rssi = None;
                } else {
                    self.last_rssi = self.platform_rssi();
                }
            }
            _ => {}
        }
    }

    fn set_credentials(&mut self, ssid: &str, password: &str) -> Result<(), ConnectivityError> {
        validate_ssid(ssid)?;
        validate_password(password)?;
        self.ssid.clear();
        self.ssid
            .push_str(ssid)
            .map_err(|_| ConnectivityError::InvalidSsid)?;
        self.password.clear();
        self.password
            .push_str(password)
            .map_err(|_| ConnectivityError::InvalidPassword)?;
        info!("WiFi: credentials updated (SSID='{}')", self.ssid);
        Ok(())
    }

    fn rssi(&self) -> Option<i8> {
        self.last_rssi
    }
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────

#[cfg(all(test, not(target_os = "espidf")))]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_ssid() {
        let mut a = WifiAdapter::new();
        assert_eq!(
            a.set_credentials("", "password123"),
            Err(ConnectivityError::InvalidSsid)
        );
    }

    #[test]
    fn rejects_short_password() {
        let mut a = WifiAdapter::new();
        assert_eq!(
            a.set_credentials("MyNet", "short"),
            Err(ConnectivityError::InvalidPassword)
        );
    }

    #[test]
    fn accepts_open_network() {
        let mut a = WifiAdapter::new();
        assert!(a.set_credentials("OpenCafe", "").is_ok());
    }

    #[test]
    fn connect_without_credentials_fails() {
        let mut a = WifiAdapter::new();
        assert_eq!(a.connect(), Err(ConnectivityError::NoCredentials));
    }

    #[test]
    fn connect_disconnect_roundtrip() {
        let mut a = WifiAdapter::new();
        a.set_credentials("TestNet", "password1").unwrap();
        a.connect().unwrap();
        assert!(a.is_connected());
        assert!(a.rssi().is_some());
        a.disconnect();
        assert!(!a.is_connected());
        assert!(a.rssi().is_none());
    }

    #[test]
    fn double_connect_fails() {
        let mut a = WifiAdapter::new();
        a.set_credentials("Net", "password1").unwrap();
        a.connect().unwrap();
        assert_eq!(a.connect(), Err(ConnectivityError::AlreadyConnected));
    }

    #[test]
    fn backoff_doubles_until_capped() {
        let mut a = WifiAdapter::new();
        a.set_credentials("Net", "password1").unwrap();
        // One failure for connect() itself plus seven failing polls.
        a.sim_fail_next_connects(8);
        assert!(a.connect().is_err());

        let mut seen = Vec::new();
        for _ in 0..7 {
            seen.push(a.backoff_secs());
            a.poll();
        }
        assert_eq!(seen, vec![2, 4, 8, 16, 32, 60, 60]);
        assert!(matches!(a.state(), WifiState::Reconnecting { .. }));

        // Once an attempt succeeds the backoff resets.
        a.poll();
        assert_eq!(a.state(), WifiState::Connected);
        assert_eq!(a.backoff_secs(), 2);
    }
}
