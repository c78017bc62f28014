//! MPU-6050 six-axis IMU (I2C).
//!
//! Configured at ±2 g accel full scale (16384 LSB/g) and ±250 °/s gyro
//! full scale (131 LSB per °/s). Acceleration is reported in m/s²,
//! angular rate in deg/s, die temperature in °C.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: register reads over the shared I2C bus (initialised by
//! hw_init). On host/test: reads from static atomics for injection.

use core::sync::atomic::{AtomicBool, AtomicI16};
#[cfg(not(target_os = "espidf"))]
use core::sync::atomic::Ordering;

use crate::aggregate::{ImuReading, KindReading};
use crate::error::SensorError;
use crate::pins;

use super::{Sensor, SensorKind};

#[cfg(target_os = "espidf")]
use crate::drivers::hw_init;

const REG_PWR_MGMT_1: u8 = 0x6B;
const REG_ACCEL_XOUT_H: u8 = 0x3B;
const REG_WHO_AM_I: u8 = 0x75;
const WHO_AM_I_VALUE: u8 = 0x68;

const ACCEL_LSB_PER_G: f32 = 16_384.0;
const GYRO_LSB_PER_DPS: f32 = 131.0;
const GRAVITY: f32 = 9.806_65;

static SIM_PRESENT: AtomicBool = AtomicBool::new(true);
static SIM_FAIL_READ: AtomicBool = AtomicBool::new(false);
static SIM_RAW: [AtomicI16; 7] = [
    AtomicI16::new(0), // ax
    AtomicI16::new(0), // ay
    AtomicI16::new(16_384), // az: 1 g
    AtomicI16::new(0), // temp raw
    AtomicI16::new(0), // gx
    AtomicI16::new(0), // gy
    AtomicI16::new(0), // gz
];

#[cfg(not(target_os = "espidf"))]
pub fn sim_set_present(present: bool) {
    SIM_PRESENT.store(present, Ordering::Relaxed);
}

#[cfg(not(target_os = "espidf"))]
pub fn sim_set_fail_read(fail: bool) {
    SIM_FAIL_READ.store(fail, Ordering::Relaxed);
}

/// Inject raw register values: accel x/y/z, die temp, gyro x/y/z.
#[cfg(not(target_os = "espidf"))]
pub fn sim_set_raw(ax: i16, ay: i16, az: i16, temp: i16, gx: i16, gy: i16, gz: i16) {
    for (slot, v) in SIM_RAW.iter().zip([ax, ay, az, temp, gx, gy, gz]) {
        slot.store(v, Ordering::Relaxed);
    }
}

pub struct Mpu6050 {
    addr: u8,
}

impl Mpu6050 {
    pub fn new() -> Self {
        Self {
            addr: pins::IMU_I2C_ADDR,
        }
    }

    #[cfg(target_os = "espidf")]
    fn probe(&mut self) -> Result<(), SensorError> {
        let mut who = [0u8; 1];
        hw_init::i2c_write_read(self.addr, &[REG_WHO_AM_I], &mut who)
            .map_err(|_| SensorError::NotDetected)?;
        if who[0] != WHO_AM_I_VALUE {
            return Err(SensorError::NotDetected);
        }
        // Clear the sleep bit; device boots asleep.
        hw_init::i2c_write(self.addr, &[REG_PWR_MGMT_1, 0x00])
            .map_err(|_| SensorError::BusError)?;
        Ok(())
    }

    #[cfg(not(target_os = "espidf"))]
    fn probe(&mut self) -> Result<(), SensorError> {
        if SIM_PRESENT.load(Ordering::Relaxed) {
            Ok(())
        } else {
            Err(SensorError::NotDetected)
        }
    }

    /// Burst-read accel, temp, gyro as one 14-byte transaction.
    #[cfg(target_os = "espidf")]
    fn read_raw(&mut self) -> Result<[i16; 7], SensorError> {
        let mut buf = [0u8; 14];
        hw_init::i2c_write_read(self.addr, &[REG_ACCEL_XOUT_H], &mut buf)
            .map_err(|_| SensorError::BusError)?;
        let mut out = [0i16; 7];
        for (i, chunk) in buf.chunks_exact(2).enumerate() {
            out[i] = i16::from_be_bytes([chunk[0], chunk[1]]);
        }
        Ok(out)
    }

    #[cfg(not(target_os = "espidf"))]
    fn read_raw(&mut self) -> Result<[i16; 7], SensorError> {
        if SIM_FAIL_READ.load(Ordering::Relaxed) {
            return Err(SensorError::BusError);
        }
        let mut out = [0i16; 7];
        for (o, slot) in out.iter_mut().zip(SIM_RAW.iter()) {
            *o = slot.load(Ordering::Relaxed);
        }
        Ok(out)
    }
}

impl Sensor for Mpu6050 {
    fn kind(&self) -> SensorKind {
        SensorKind::Imu
    }

    fn init(&mut self) -> Result<(), SensorError> {
        self.probe()
    }

    fn read(&mut self) -> Result<KindReading, SensorError> {
        let [ax, ay, az, temp, gx, gy, gz] = self.read_raw()?;
        Ok(KindReading::Imu(ImuReading {
            accel_x: (ax as f32 / ACCEL_LSB_PER_G) * GRAVITY,
            accel_y: (ay as f32 / ACCEL_LSB_PER_G) * GRAVITY,
            accel_z: (az as f32 / ACCEL_LSB_PER_G) * GRAVITY,
            gyro_x: gx as f32 / GYRO_LSB_PER_DPS,
            gyro_y: gy as f32 / GYRO_LSB_PER_DPS,
            gyro_z: gz as f32 / GYRO_LSB_PER_DPS,
            // MPU-6050 datasheet §4.18
            die_temp_c: temp as f32 / 340.0 + 36.53,
        }))
    }
}

#[cfg(all(test, not(target_os = "espidf")))]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // The sim registers are shared statics; serialize the tests that
    // write different values into them.
    static SIM_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn one_g_on_z_converts_to_gravity() {
        let _guard = SIM_LOCK.lock().unwrap();
        sim_set_raw(0, 0, 16_384, 0, 0, 0, 0);
        sim_set_fail_read(false);
        let mut imu = Mpu6050::new();
        let KindReading::Imu(r) = imu.read().unwrap() else {
            panic!("wrong kind");
        };
        assert!((r.accel_z - GRAVITY).abs() < 1e-3);
        assert!(r.accel_x.abs() < 1e-6);
        assert!((r.die_temp_c - 36.53).abs() < 0.01);
    }

    #[test]
    fn gyro_scaling() {
        let _guard = SIM_LOCK.lock().unwrap();
        sim_set_raw(0, 0, 16_384, 0, 131, -262, 0);
        sim_set_fail_read(false);
        let mut imu = Mpu6050::new();
        let KindReading::Imu(r) = imu.read().unwrap() else {
            panic!("wrong kind");
        };
        assert!((r.gyro_x - 1.0).abs() < 1e-3);
        assert!((r.gyro_y + 2.0).abs() < 1e-3);
    }
}
