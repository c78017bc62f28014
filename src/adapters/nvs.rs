//! NVS (Non-Volatile Storage) adapter.
//!
//! Implements [`ConfigPort`]: the whole [`SystemConfig`] is persisted
//! as one postcard blob under the `envnode` namespace. All fields are
//! range-checked before anything touches flash, so a bad save can
//! never brick the next boot.
//!
//! On ESP32 the partition self-heals: a version mismatch or a full
//! page table triggers an erase and re-init on first open.

use log::{info, warn};

use crate::config::SystemConfig;
use crate::ports::{ConfigError, ConfigPort};

#[cfg(not(target_os = "espidf"))]
use std::collections::HashMap;

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

const CONFIG_NAMESPACE: &str = "envnode";
const CONFIG_KEY: &[u8] = b"syscfg\0";

#[allow(dead_code)]
const MAX_BLOB_SIZE: usize = 4000;

pub struct NvsAdapter {
    #[cfg(not(target_os = "espidf"))]
    store: std::cell::RefCell<HashMap<String, Vec<u8>>>,
}

impl NvsAdapter {
    /// Create the adapter and initialise NVS flash.
    ///
    /// Returns `Err(ConfigError::IoError)` only if flash cannot be
    /// recovered; a stale page table is erased and re-initialised.
    pub fn new() -> Result<Self, ConfigError> {
        #[cfg(target_os = "espidf")]
        {
            // SAFETY: called from the single main-task context before
            // any concurrent NVS access.
            let ret = unsafe { nvs_flash_init() };
            if ret == ESP_ERR_NVS_NO_FREE_PAGES || ret == ESP_ERR_NVS_NEW_VERSION_FOUND {
                warn!("NVS: erasing and re-initialising flash partition");
                if unsafe { nvs_flash_erase() } != ESP_OK {
                    return Err(ConfigError::IoError);
                }
                if unsafe { nvs_flash_init() } != ESP_OK {
                    return Err(ConfigError::IoError);
                }
            } else if ret != ESP_OK {
                return Err(ConfigError::IoError);
            }
            info!("NvsAdapter: ESP-IDF NVS initialised");
        }

        #[cfg(not(target_os = "espidf"))]
        info!("NvsAdapter: simulation backend");

        Ok(Self {
            #[cfg(not(target_os = "espidf"))]
            store: std::cell::RefCell::new(HashMap::new()),
        })
    }

    /// Open an NVS namespace, execute a closure with the handle, then close.
    #[cfg(target_os = "espidf")]
    fn with_nvs_handle<F, T>(namespace: &str, write: bool, f: F) -> Result<T, i32>
    where
        F: FnOnce(nvs_handle_t) -> Result<T, i32>,
    {
        let mut ns_buf = [0u8; 16];
        let ns_bytes = namespace.as_bytes();
        let len = ns_bytes.len().min(15);
        ns_buf[..len].copy_from_slice(&ns_bytes[..len]);

        let mut handle: nvs_handle_t = 0;
        let mode = if write {
            nvs_open_mode_t_NVS_READWRITE
        } else {
            nvs_open_mode_t_NVS_READONLY
        };

        let ret = unsafe { nvs_open(ns_buf.as_ptr() as *const _, mode, &mut handle) };
        if ret != ESP_OK {
            return Err(ret);
        }

        let result = f(handle);
        unsafe {
            nvs_close(handle);
        }
        result
    }
}

fn validate_config(cfg: &SystemConfig) -> Result<(), ConfigError> {
    if cfg.user_name.is_empty() || cfg.user_name.contains('/') {
        return Err(ConfigError::ValidationFailed(
            "user_name must be non-empty and must not contain '/'",
        ));
    }
    if !(500..=60_000).contains(&cfg.acquisition_interval_ms) {
        return Err(ConfigError::ValidationFailed(
            "acquisition_interval_ms must be 500–60000",
        ));
    }
    if !(1_000..=300_000).contains(&cfg.dispatch_interval_ms) {
        return Err(ConfigError::ValidationFailed(
            "dispatch_interval_ms must be 1000–300000",
        ));
    }
    if cfg.dispatch_yield_ms > 1_000 {
        return Err(ConfigError::ValidationFailed(
            "dispatch_yield_ms must be 0–1000",
        ));
    }
    if !(500..=30_000).contains(&cfg.backend_timeout_ms) {
        return Err(ConfigError::ValidationFailed(
            "backend_timeout_ms must be 500–30000",
        ));
    }
    if !(1_000..=60_000).contains(&cfg.modem_phase_timeout_ms) {
        return Err(ConfigError::ValidationFailed(
            "modem_phase_timeout_ms must be 1000–60000",
        ));
    }
    if !(1..=1_000).contains(&cfg.max_records) {
        return Err(ConfigError::ValidationFailed(
            "max_records must be 1–1000",
        ));
    }
    Ok(())
}

impl ConfigPort for NvsAdapter {
    fn load(&self) -> Result<SystemConfig, ConfigError> {
        #[cfg(not(target_os = "espidf"))]
        {
            let key = format!("{CONFIG_NAMESPACE}::syscfg");
            match self.store.borrow().get(&key) {
                Some(bytes) => {
                    let cfg: SystemConfig =
                        postcard::from_bytes(bytes).map_err(|_| ConfigError::Corrupted)?;
                    info!("NvsAdapter: loaded config from store");
                    Ok(cfg)
                }
                None => Err(ConfigError::NotFound),
            }
        }

        #[cfg(target_os = "espidf")]
        {
            let result = Self::with_nvs_handle(CONFIG_NAMESPACE, false, |handle| {
                let mut size: usize = 0;

                // First call sizes the blob.
                let ret = unsafe {
                    nvs_get_blob(
                        handle,
                        CONFIG_KEY.as_ptr() as *const _,
                        core::ptr::null_mut(),
                        &mut size,
                    )
                };
                if ret == ESP_ERR_NVS_NOT_FOUND {
                    return Err(ESP_ERR_NVS_NOT_FOUND);
                }
                if ret != ESP_OK || size == 0 || size > MAX_BLOB_SIZE {
                    return Err(ret);
                }

                let mut buf = vec![0u8; size];
                let ret = unsafe {
                    nvs_get_blob(
                        handle,
                        CONFIG_KEY.as_ptr() as *const _,
                        buf.as_mut_ptr() as *mut _,
                        &mut size,
                    )
                };
                if ret != ESP_OK {
                    return Err(ret);
                }
                Ok(buf)
            });

            match result {
                Ok(bytes) => {
                    let cfg: SystemConfig =
                        postcard::from_bytes(&bytes).map_err(|_| ConfigError::Corrupted)?;
                    info!("NvsAdapter: loaded config from NVS ({} bytes)", bytes.len());
                    Ok(cfg)
                }
                Err(e) if e == ESP_ERR_NVS_NOT_FOUND => Err(ConfigError::NotFound),
                Err(e) => {
                    warn!("NvsAdapter: NVS read error {e}");
                    Err(ConfigError::IoError)
                }
            }
        }
    }

    fn save(&self, config: &SystemConfig) -> Result<(), ConfigError> {
        validate_config(config)?;

        #[cfg(not(target_os = "espidf"))]
        {
            let key = format!("{CONFIG_NAMESPACE}::syscfg");
            let bytes = postcard::to_allocvec(config).map_err(|_| ConfigError::IoError)?;
            self.store.borrow_mut().insert(key, bytes);
            info!("NvsAdapter: config saved (simulation)");
            Ok(())
        }

        #[cfg(target_os = "espidf")]
        {
            let bytes = postcard::to_allocvec(config).map_err(|_| ConfigError::IoError)?;
            let result = Self::with_nvs_handle(CONFIG_NAMESPACE, true, |handle| {
                let ret = unsafe {
                    nvs_set_blob(
                        handle,
                        CONFIG_KEY.as_ptr() as *const _,
                        bytes.as_ptr() as *const _,
                        bytes.len(),
                    )
                };
                if ret != ESP_OK {
                    return Err(ret);
                }
                let ret = unsafe { nvs_commit(handle) };
                if ret != ESP_OK {
                    return Err(ret);
                }
                Ok(())
            });
            match result {
                Ok(()) => {
                    info!("NvsAdapter: config saved to NVS ({} bytes)", bytes.len());
                    Ok(())
                }
                Err(e) => {
                    warn!("NvsAdapter: NVS write error {e}");
                    Err(ConfigError::IoError)
                }
            }
        }
    }
}
