//! EnvNode Firmware — Main Entry Point
//!
//! Dual-core split:
//!
//! ```text
//! ┌──────────────────────────────┐  ┌──────────────────────────────┐
//! │  APP_CPU (core 1)            │  │  PRO_CPU (core 0)            │
//! │                              │  │                              │
//! │  AcquisitionLoop @ 2 s       │  │  DispatchLoop @ 5 s          │
//! │  SensorHub → SharedAggregate │  │  snapshot → backend pushes   │
//! │                              │  │  history · mailbox · alerts  │
//! └──────────────┬───────────────┘  └──────────────┬───────────────┘
//!                └───── Arc<Mutex<SensorAggregate>> ┘
//! ```
//!
//! The main task stays behind as a health monitor: it polls WiFi
//! reconnection, feeds the task watchdog, and logs heap/uptime.

use anyhow::Result;
use log::{error, info, warn};

use envnode::acquisition::AcquisitionLoop;
use envnode::adapters::firebase::FirebaseAdapter;
use envnode::adapters::modem::Sim800Adapter;
use envnode::adapters::nvs::NvsAdapter;
use envnode::adapters::time::Esp32TimeAdapter;
use envnode::adapters::wifi::{ConnectivityPort, WifiAdapter};
use envnode::aggregate::SharedAggregate;
use envnode::config::{InitFailurePolicy, SystemConfig};
use envnode::diagnostics;
use envnode::dispatch::DispatchLoop;
use envnode::drivers::{hw_init, task_pin, watchdog::Watchdog};
use envnode::pins;
use envnode::ports::{ConfigError, ConfigPort};
use envnode::sensors::SensorHub;

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  EnvNode v{}                        ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Initialise hardware peripherals ────────────────────
    if let Err(e) = hw_init::init_peripherals() {
        // Peripheral init failure is critical — log and halt.
        // In production this triggers the watchdog reset after timeout.
        error!("HAL init failed: {e} — halting");
        #[allow(clippy::empty_loop)]
        loop {}
    }
    let found = hw_init::scan_i2c_bus();
    info!("I2C scan: {found} device(s) responded");
    let watchdog = Watchdog::new();

    // ── 3. Load config from NVS (or defaults) ─────────────────
    let nvs = match NvsAdapter::new() {
        Ok(n) => n,
        Err(e) => {
            warn!("NVS init failed ({e:?}), running with defaults and no persistence");
            // On next reboot the partition should self-heal.
            return run_with_config(SystemConfig::default(), watchdog);
        }
    };
    let config = match nvs.load() {
        Ok(cfg) => {
            info!("Config loaded from NVS");
            cfg
        }
        Err(ConfigError::NotFound) => {
            info!("First boot: persisting default config");
            let cfg = SystemConfig::default();
            if let Err(e) = nvs.save(&cfg) {
                warn!("Default config save failed: {e:?}");
            }
            cfg
        }
        Err(e) => {
            warn!("NVS config load failed ({e:?}), using defaults");
            SystemConfig::default()
        }
    };

    run_with_config(config, watchdog)
}

fn run_with_config(config: SystemConfig, watchdog: Watchdog) -> Result<()> {
    // ── 4. WiFi station ───────────────────────────────────────
    let mut wifi = WifiAdapter::new();

    #[cfg(target_os = "espidf")]
    {
        use esp_idf_svc::eventloop::EspSystemEventLoop;
        use esp_idf_svc::hal::peripherals::Peripherals;
        use esp_idf_svc::nvs::EspDefaultNvsPartition;
        use esp_idf_svc::wifi::{BlockingWifi, EspWifi};

        let peripherals = Peripherals::take()?;
        let sysloop = EspSystemEventLoop::take()?;
        let nvs_partition = EspDefaultNvsPartition::take()?;
        let driver = EspWifi::new(peripherals.modem, sysloop.clone(), Some(nvs_partition))?;
        wifi.attach(BlockingWifi::wrap(driver, sysloop)?);
    }

    match wifi.set_credentials(&config.wifi_ssid, &config.wifi_password) {
        Ok(()) => {
            if let Err(e) = wifi.connect() {
                // The poll loop below keeps retrying with backoff; the
                // dispatch loop simply fails its pushes until then.
                warn!("WiFi: initial connect failed ({e}), will retry");
            }
        }
        Err(e) => warn!("WiFi: invalid credentials ({e}), running offline"),
    }
    hw_init::set_status_led(wifi.is_connected());

    // ── 5. Probe sensors ──────────────────────────────────────
    let mut hub = SensorHub::with_board_sensors();
    let all_working = hub.probe_all();
    if !all_working {
        match config.init_failure_policy {
            InitFailurePolicy::Degrade => {
                warn!("Sensor probe: some sensors absent, continuing degraded");
            }
            InitFailurePolicy::Halt => {
                anyhow::bail!("sensor probe failed and policy is Halt");
            }
        }
    }
    let statuses = hub.statuses();

    // ── 6. Spawn the two core-pinned loops ────────────────────
    let shared = SharedAggregate::new();

    let acq = AcquisitionLoop::new(shared.clone(), config.acquisition_interval_ms);
    task_pin::spawn_on_core(task_pin::Core::App, 2, 8, "acq\0", move || {
        acq.run(hub);
    });

    let dispatch = DispatchLoop::new(shared, &config);
    let backend = FirebaseAdapter::new(
        &config.backend_host,
        &config.backend_auth,
        config.backend_timeout_ms,
    );
    let alert_timeout = config.modem_phase_timeout_ms;
    #[cfg(target_os = "espidf")]
    let modem = Sim800Adapter::new(
        envnode::adapters::modem::UartLink::new(pins::MODEM_UART_NUM),
        alert_timeout,
    );
    #[cfg(not(target_os = "espidf"))]
    let modem = Sim800Adapter::new(
        envnode::adapters::modem::ScriptedLink::new(&[]),
        alert_timeout,
    );
    task_pin::spawn_on_core(task_pin::Core::Pro, 1, 12, "dispatch\0", move || {
        dispatch.run(backend, modem, statuses);
    });

    info!("System ready. Entering health loop.");

    // ── 7. Health loop ────────────────────────────────────────
    let clock = Esp32TimeAdapter::new();
    loop {
        wifi.poll();
        hw_init::set_status_led(wifi.is_connected());
        diagnostics::log_health(clock.uptime_secs());
        watchdog.feed();
        std::thread::sleep(std::time::Duration::from_secs(
            diagnostics::HEALTH_INTERVAL_SECS,
        ));
    }
}
