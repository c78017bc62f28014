//! One-shot hardware peripheral initialization.
//!
//! Configures the shared I2C master bus, the modem UART, and the status
//! LED GPIO using raw ESP-IDF sys calls. Called once from `main()` before
//! the loop tasks start. Also runs the boot-time I2C bus scan that logs
//! every acknowledging device address.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

#[cfg(target_os = "espidf")]
use log::info;

use crate::pins;

// ── Error type ────────────────────────────────────────────────

/// Errors during one-shot peripheral initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwInitError {
    I2cInitFailed(i32),
    UartInitFailed(i32),
    GpioConfigFailed(i32),
}

impl core::fmt::Display for HwInitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::I2cInitFailed(rc) => write!(f, "I2C master init failed (rc={})", rc),
            Self::UartInitFailed(rc) => write!(f, "modem UART init failed (rc={})", rc),
            Self::GpioConfigFailed(rc) => write!(f, "GPIO config failed (rc={})", rc),
        }
    }
}

#[cfg(target_os = "espidf")]
const I2C_PORT: i32 = 0;
#[cfg(target_os = "espidf")]
const I2C_TIMEOUT_TICKS: u32 = 100;

#[cfg(target_os = "espidf")]
pub fn init_peripherals() -> Result<(), HwInitError> {
    // SAFETY: Called once from main() before the loop tasks spawn;
    // single-threaded.
    unsafe {
        init_i2c()?;
        init_modem_uart()?;
        init_status_led()?;
    }
    info!("hw_init: all peripherals configured");
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_peripherals() -> Result<(), HwInitError> {
    log::info!("hw_init(sim): peripheral init skipped");
    Ok(())
}

// ── I2C master ────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
unsafe fn init_i2c() -> Result<(), HwInitError> {
    let cfg = i2c_config_t {
        mode: i2c_mode_t_I2C_MODE_MASTER,
        sda_io_num: pins::I2C_SDA_GPIO,
        scl_io_num: pins::I2C_SCL_GPIO,
        sda_pullup_en: true,
        scl_pullup_en: true,
        __bindgen_anon_1: i2c_config_t__bindgen_ty_1 {
            master: i2c_config_t__bindgen_ty_1__bindgen_ty_1 {
                clk_speed: pins::I2C_FREQ_HZ,
            },
        },
        ..Default::default()
    };

    let ret = unsafe { i2c_param_config(I2C_PORT, &cfg) };
    if ret != ESP_OK {
        return Err(HwInitError::I2cInitFailed(ret));
    }

    let ret = unsafe { i2c_driver_install(I2C_PORT, i2c_mode_t_I2C_MODE_MASTER, 0, 0, 0) };
    if ret != ESP_OK {
        return Err(HwInitError::I2cInitFailed(ret));
    }

    info!(
        "hw_init: I2C master on SDA={} SCL={} @ {} Hz",
        pins::I2C_SDA_GPIO,
        pins::I2C_SCL_GPIO,
        pins::I2C_FREQ_HZ
    );
    Ok(())
}

/// Write `wbuf` then read `rbuf.len()` bytes from the device at `addr`.
/// Only the acquisition task touches the bus after init, so no lock.
#[cfg(target_os = "espidf")]
pub fn i2c_write_read(addr: u8, wbuf: &[u8], rbuf: &mut [u8]) -> Result<(), i32> {
    // SAFETY: driver installed in init_i2c(); single-task bus access.
    let ret = unsafe {
        i2c_master_write_read_device(
            I2C_PORT,
            addr,
            wbuf.as_ptr(),
            wbuf.len(),
            rbuf.as_mut_ptr(),
            rbuf.len(),
            I2C_TIMEOUT_TICKS,
        )
    };
    if ret == ESP_OK { Ok(()) } else { Err(ret) }
}

/// Write `buf` to the device at `addr`.
#[cfg(target_os = "espidf")]
pub fn i2c_write(addr: u8, buf: &[u8]) -> Result<(), i32> {
    // SAFETY: driver installed in init_i2c(); single-task bus access.
    let ret = unsafe {
        i2c_master_write_to_device(I2C_PORT, addr, buf.as_ptr(), buf.len(), I2C_TIMEOUT_TICKS)
    };
    if ret == ESP_OK { Ok(()) } else { Err(ret) }
}

/// Read `rbuf.len()` bytes from the device at `addr` with no register write.
#[cfg(target_os = "espidf")]
pub fn i2c_read(addr: u8, rbuf: &mut [u8]) -> Result<(), i32> {
    // SAFETY: driver installed in init_i2c(); single-task bus access.
    let ret = unsafe {
        i2c_master_read_from_device(I2C_PORT, addr, rbuf.as_mut_ptr(), rbuf.len(), I2C_TIMEOUT_TICKS)
    };
    if ret == ESP_OK { Ok(()) } else { Err(ret) }
}

/// Probe every 7-bit address and log the ones that acknowledge.
///
/// Diagnostic only — sensor presence is decided by each driver's own
/// probe, not by this scan.
#[cfg(target_os = "espidf")]
pub fn scan_i2c_bus() -> usize {
    let mut found = 0usize;
    for addr in 1u8..127 {
        // An empty write is the cheapest "are you there" probe.
        if i2c_write(addr, &[]).is_ok() {
            info!("i2c scan: device at 0x{addr:02X}");
            found += 1;
        }
    }
    if found == 0 {
        log::warn!("i2c scan: no devices found — check wiring");
    } else {
        info!("i2c scan: {found} device(s)");
    }
    found
}

#[cfg(not(target_os = "espidf"))]
pub fn scan_i2c_bus() -> usize {
    log::info!("i2c scan(sim): skipped");
    0
}

// ── Modem UART ────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
unsafe fn init_modem_uart() -> Result<(), HwInitError> {
    let cfg = uart_config_t {
        baud_rate: pins::MODEM_BAUD as i32,
        data_bits: uart_word_length_t_UART_DATA_8_BITS,
        parity: uart_parity_t_UART_PARITY_DISABLE,
        stop_bits: uart_stop_bits_t_UART_STOP_BITS_1,
        flow_ctrl: uart_hw_flowcontrol_t_UART_HW_FLOWCTRL_DISABLE,
        ..Default::default()
    };

    let ret = unsafe { uart_param_config(pins::MODEM_UART_NUM, &cfg) };
    if ret != ESP_OK {
        return Err(HwInitError::UartInitFailed(ret));
    }

    let ret = unsafe {
        uart_set_pin(
            pins::MODEM_UART_NUM,
            pins::MODEM_TX_GPIO,
            pins::MODEM_RX_GPIO,
            -1,
            -1,
        )
    };
    if ret != ESP_OK {
        return Err(HwInitError::UartInitFailed(ret));
    }

    let ret = unsafe {
        uart_driver_install(pins::MODEM_UART_NUM, 1024, 1024, 0, core::ptr::null_mut(), 0)
    };
    if ret != ESP_OK {
        return Err(HwInitError::UartInitFailed(ret));
    }

    info!(
        "hw_init: modem UART{} on TX={} RX={} @ {} baud",
        pins::MODEM_UART_NUM,
        pins::MODEM_TX_GPIO,
        pins::MODEM_RX_GPIO,
        pins::MODEM_BAUD
    );
    Ok(())
}

// ── Status LED ────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
unsafe fn init_status_led() -> Result<(), HwInitError> {
    let cfg = gpio_config_t {
        pin_bit_mask: 1u64 << pins::STATUS_LED_GPIO,
        mode: gpio_mode_t_GPIO_MODE_OUTPUT,
        pull_up_en: gpio_pullup_t_GPIO_PULLUP_DISABLE,
        pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
        intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
    };
    let ret = unsafe { gpio_config(&cfg) };
    if ret != ESP_OK {
        return Err(HwInitError::GpioConfigFailed(ret));
    }
    unsafe { gpio_set_level(pins::STATUS_LED_GPIO, 0) };
    Ok(())
}

#[cfg(target_os = "espidf")]
pub fn set_status_led(on: bool) {
    // SAFETY: pin configured as output in init_status_led().
    unsafe {
        gpio_set_level(pins::STATUS_LED_GPIO, u32::from(on));
    }
}

#[cfg(not(target_os = "espidf"))]
pub fn set_status_led(_on: bool) {}
