//! GPIO / peripheral pin assignments for the EnvNode main board.
//!
//! Single source of truth — every driver references this module rather than
//! hard-coding pin numbers.  Change a pin here and it propagates everywhere.

// ---------------------------------------------------------------------------
// I2C bus (shared by all four sensors)
// ---------------------------------------------------------------------------

/// I2C SDA line — all sensors share the one master bus.
pub const I2C_SDA_GPIO: i32 = 21;
/// I2C SCL line.
pub const I2C_SCL_GPIO: i32 = 22;
/// I2C bus clock in Hz. 100 kHz standard mode — the MLX90614 is not
/// reliable at 400 kHz on long leads.
pub const I2C_FREQ_HZ: u32 = 100_000;

// ---------------------------------------------------------------------------
// Sensor I2C addresses
// ---------------------------------------------------------------------------

/// MPU-6050 IMU (AD0 low).
pub const IMU_I2C_ADDR: u8 = 0x68;
/// MLX90614 contactless thermometer.
pub const CONTACTLESS_I2C_ADDR: u8 = 0x5A;
/// AHT10 humidity/temperature.
pub const HUMIDITY_I2C_ADDR: u8 = 0x38;
/// SGP30 air-quality (TVOC/eCO2).
pub const AIR_QUALITY_I2C_ADDR: u8 = 0x58;

// ---------------------------------------------------------------------------
// GSM modem UART (SIM800-class, AT command set)
// ---------------------------------------------------------------------------

/// UART port number wired to the modem.
pub const MODEM_UART_NUM: i32 = 1;
/// UART TX → modem RX.
pub const MODEM_TX_GPIO: i32 = 17;
/// UART RX ← modem TX.
pub const MODEM_RX_GPIO: i32 = 16;
/// Modem link baud rate.
pub const MODEM_BAUD: u32 = 115_200;

// ---------------------------------------------------------------------------
// Status LED
// ---------------------------------------------------------------------------

/// On-board status LED, lit while Wi-Fi is associated.
pub const STATUS_LED_GPIO: i32 = 2;
