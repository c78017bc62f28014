//! EnvNode firmware library.
//!
//! Exposes the pure-logic modules for integration testing and external
//! inspection. All ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod acquisition;
pub mod aggregate;
pub mod alert;
pub mod config;
pub mod diagnostics;
pub mod dispatch;
pub mod history;
pub mod mailbox;
pub mod paths;
pub mod ports;
pub mod records;

mod error;
pub mod pins;

pub use error::{BackendError, Error, ModemError, Result, SensorError};

pub mod adapters;
pub mod drivers;
pub mod sensors;
