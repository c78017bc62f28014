//! MLX90614 contactless infrared thermometer (SMBus/I2C).
//!
//! RAM registers 0x06 (ambient) and 0x07 (object) hold linearised
//! temperatures in units of 0.02 K. Bit 15 set means the conversion is
//! flagged invalid — the C++-era driver saw this as NaN and treated the
//! whole read as failed; here it maps to `SensorError::BadMeasurement`.

use core::sync::atomic::{AtomicBool, AtomicU16};
#[cfg(not(target_os = "espidf"))]
use core::sync::atomic::Ordering;

use crate::aggregate::{ContactlessReading, KindReading};
use crate::error::SensorError;
use crate::pins;

use super::{Sensor, SensorKind};

#[cfg(target_os = "espidf")]
use crate::drivers::hw_init;

const REG_TA: u8 = 0x06;
const REG_TOBJ1: u8 = 0x07;
const ERROR_FLAG: u16 = 0x8000;
const KELVIN_PER_LSB: f32 = 0.02;
const ZERO_C_IN_K: f32 = 273.15;

static SIM_PRESENT: AtomicBool = AtomicBool::new(true);
// Raw register defaults: 25.00 °C = (25 + 273.15) / 0.02 = 14907 (floor).
static SIM_AMBIENT_RAW: AtomicU16 = AtomicU16::new(14_907);
static SIM_OBJECT_RAW: AtomicU16 = AtomicU16::new(14_907);

#[cfg(not(target_os = "espidf"))]
pub fn sim_set_present(present: bool) {
    SIM_PRESENT.store(present, Ordering::Relaxed);
}

/// Inject raw register values; set [`ERROR_FLAG`] (bit 15) to force a
/// failed read.
#[cfg(not(target_os = "espidf"))]
pub fn sim_set_raw(ambient: u16, object: u16) {
    SIM_AMBIENT_RAW.store(ambient, Ordering::Relaxed);
    SIM_OBJECT_RAW.store(object, Ordering::Relaxed);
}

pub struct Mlx90614 {
    addr: u8,
}

impl Mlx90614 {
    pub fn new() -> Self {
        Self {
            addr: pins::CONTACTLESS_I2C_ADDR,
        }
    }

    #[cfg(target_os = "espidf")]
    fn read_reg(&mut self, reg: u8) -> Result<u16, SensorError> {
        // Reply is little-endian data word + PEC byte.
        let mut buf = [0u8; 3];
        hw_init::i2c_write_read(self.addr, &[reg], &mut buf)
            .map_err(|_| SensorError::BusError)?;
        Ok(u16::from_le_bytes([buf[0], buf[1]]))
    }

    #[cfg(not(target_os = "espidf"))]
    fn read_reg(&mut self, reg: u8) -> Result<u16, SensorError> {
        match reg {
            REG_TA => Ok(SIM_AMBIENT_RAW.load(Ordering::Relaxed)),
            REG_TOBJ1 => Ok(SIM_OBJECT_RAW.load(Ordering::Relaxed)),
            _ => Err(SensorError::BusError),
        }
    }

    fn to_celsius(raw: u16) -> Result<f32, SensorError> {
        if raw & ERROR_FLAG != 0 {
            return Err(SensorError::BadMeasurement);
        }
        Ok(raw as f32 * KELVIN_PER_LSB - ZERO_C_IN_K)
    }
}

impl Sensor for Mlx90614 {
    fn kind(&self) -> SensorKind {
        SensorKind::ContactlessTemp
    }

    fn init(&mut self) -> Result<(), SensorError> {
        #[cfg(target_os = "espidf")]
        {
            // A successful ambient read is the presence probe.
            self.read_reg(REG_TA).map(|_| ())
        }
        #[cfg(not(target_os = "espidf"))]
        {
            if SIM_PRESENT.load(Ordering::Relaxed) {
                Ok(())
            } else {
                Err(SensorError::NotDetected)
            }
        }
    }

    fn read(&mut self) -> Result<KindReading, SensorError> {
        let ambient = Self::to_celsius(self.read_reg(REG_TA)?)?;
        let object = Self::to_celsius(self.read_reg(REG_TOBJ1)?)?;
        Ok(KindReading::ContactlessTemp(ContactlessReading {
            ambient_c: ambient,
            object_c: object,
        }))
    }
}
