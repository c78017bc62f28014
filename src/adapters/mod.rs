//! Adapters — concrete implementations of the port traits.
//!
//! | Adapter    | Implements     | Connects to                      |
//! |------------|----------------|----------------------------------|
//! | `firebase` | BackendPort    | HTTPS key-path datastore         |
//! | `modem`    | ModemPort      | SIM800 AT link / scripted serial |
//! | `nvs`      | ConfigPort     | NVS flash / in-memory store      |
//! | `time`     | —              | ESP32 system + wall clock        |
//! | `wifi`     | Connectivity   | ESP-IDF Wi-Fi STA                |

pub mod firebase;
pub mod modem;
pub mod nvs;
pub mod time;
pub mod wifi;
