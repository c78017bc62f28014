//! AHT10 humidity/temperature sensor (I2C).
//!
//! Init sends the calibrate command and checks the calibration-enabled
//! status bit. A measurement is a trigger command, a ~80 ms conversion
//! wait, then a 6-byte burst: status, 20-bit humidity, 20-bit temperature.

use core::sync::atomic::{AtomicBool, AtomicU32};
#[cfg(not(target_os = "espidf"))]
use core::sync::atomic::Ordering;

use crate::aggregate::{HumidityReading, KindReading};
use crate::error::SensorError;
use crate::pins;

use super::{Sensor, SensorKind};

#[cfg(target_os = "espidf")]
use crate::drivers::hw_init;

#[cfg(target_os = "espidf")]
const CMD_CALIBRATE: [u8; 3] = [0xE1, 0x08, 0x00];
#[cfg(target_os = "espidf")]
const CMD_TRIGGER: [u8; 3] = [0xAC, 0x33, 0x00];
#[cfg(target_os = "espidf")]
const STATUS_BUSY: u8 = 0x80;
#[cfg(target_os = "espidf")]
const STATUS_CALIBRATED: u8 = 0x08;
#[cfg(target_os = "espidf")]
const MEASURE_DELAY_MS: u64 = 80;

const FULL_SCALE: f32 = (1 << 20) as f32;

static SIM_PRESENT: AtomicBool = AtomicBool::new(true);
static SIM_FAIL_READ: AtomicBool = AtomicBool::new(false);
// Raw 20-bit counts; defaults ≈ 50 % RH, 25 °C.
static SIM_HUM_RAW: AtomicU32 = AtomicU32::new(1 << 19);
static SIM_TEMP_RAW: AtomicU32 = AtomicU32::new(393_216);

#[cfg(not(target_os = "espidf"))]
pub fn sim_set_present(present: bool) {
    SIM_PRESENT.store(present, Ordering::Relaxed);
}

#[cfg(not(target_os = "espidf"))]
pub fn sim_set_fail_read(fail: bool) {
    SIM_FAIL_READ.store(fail, Ordering::Relaxed);
}

#[cfg(not(target_os = "espidf"))]
pub fn sim_set_raw(humidity: u32, temperature: u32) {
    SIM_HUM_RAW.store(humidity & 0xF_FFFF, Ordering::Relaxed);
    SIM_TEMP_RAW.store(temperature & 0xF_FFFF, Ordering::Relaxed);
}

pub struct Aht10 {
    addr: u8,
}

impl Aht10 {
    pub fn new() -> Self {
        Self {
            addr: pins::HUMIDITY_I2C_ADDR,
        }
    }

    #[cfg(target_os = "espidf")]
    fn read_raw(&mut self) -> Result<(u32, u32), SensorError> {
        hw_init::i2c_write(self.addr, &CMD_TRIGGER).map_err(|_| SensorError::BusError)?;
        std::thread::sleep(std::time::Duration::from_millis(MEASURE_DELAY_MS));

        let mut buf = [0u8; 6];
        hw_init::i2c_read(self.addr, &mut buf).map_err(|_| SensorError::BusError)?;
        if buf[0] & STATUS_BUSY != 0 {
            return Err(SensorError::BadMeasurement);
        }

        let hum = (u32::from(buf[1]) << 12) | (u32::from(buf[2]) << 4) | (u32::from(buf[3]) >> 4);
        let temp = ((u32::from(buf[3]) & 0x0F) << 16) | (u32::from(buf[4]) << 8) | u32::from(buf[5]);
        Ok((hum, temp))
    }

    #[cfg(not(target_os = "espidf"))]
    fn read_raw(&mut self) -> Result<(u32, u32), SensorError> {
        if SIM_FAIL_READ.load(Ordering::Relaxed) {
            return Err(SensorError::BusError);
        }
        Ok((
            SIM_HUM_RAW.load(Ordering::Relaxed),
            SIM_TEMP_RAW.load(Ordering::Relaxed),
        ))
    }
}

impl Sensor for Aht10 {
    fn kind(&self) -> SensorKind {
        SensorKind::HumidityTemp
    }

    #[cfg(target_os = "espidf")]
    fn init(&mut self) -> Result<(), SensorError> {
        hw_init::i2c_write(self.addr, &CMD_CALIBRATE).map_err(|_| SensorError::NotDetected)?;
        std::thread::sleep(std::time::Duration::from_millis(10));

        let mut status = [0u8; 1];
        hw_init::i2c_read(self.addr, &mut status).map_err(|_| SensorError::NotDetected)?;
        if status[0] & STATUS_CALIBRATED == 0 {
            return Err(SensorError::WarmingUp);
        }
        Ok(())
    }

    #[cfg(not(target_os = "espidf"))]
    fn init(&mut self) -> Result<(), SensorError> {
        if SIM_PRESENT.load(Ordering::Relaxed) {
            Ok(())
        } else {
            Err(SensorError::NotDetected)
        }
    }

    fn read(&mut self) -> Result<KindReading, SensorError> {
        let (hum_raw, temp_raw) = self.read_raw()?;
        Ok(KindReading::HumidityTemp(HumidityReading {
            humidity_pct: hum_raw as f32 / FULL_SCALE * 100.0,
            temp_c: temp_raw as f32 / FULL_SCALE * 200.0 - 50.0,
        }))
    }
}

#[cfg(all(test, not(target_os = "espidf")))]
mod tests {
    use super::*;

    #[test]
    fn mid_scale_is_fifty_percent() {
        sim_set_raw(1 << 19, 393_216);
        sim_set_fail_read(false);
        let mut aht = Aht10::new();
        let KindReading::HumidityTemp(r) = aht.read().unwrap() else {
            panic!("wrong kind");
        };
        assert!((r.humidity_pct - 50.0).abs() < 0.01);
        // 393216 / 2^20 * 200 - 50 = 25.0
        assert!((r.temp_c - 25.0).abs() < 0.01);
    }
}
