//! Tilt sensing
//!
//! The scheduler only needs one 3-axis acceleration sample per tick, in g.
//! [`TiltSensor`] is that contract; [`Mpu6050`] implements it over
//! embedded-hal I²C.
//!
//! The hourglass is mounted with its long axis at 45° to the sensor's X/Y
//! axes, so tilt along the hourglass is read from two derived axes:
//!
//! - `xx = -ax - ay` (across the hourglass)
//! - `yy = -ax + ay` (along the hourglass; positive means bulb A is up)

use embedded_hal::i2c::I2c;

/// One accelerometer reading in g
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Acceleration {
    /// Sensor X axis
    pub x: f32,
    /// Sensor Y axis
    pub y: f32,
    /// Sensor Z axis
    pub z: f32,
}

impl Acceleration {
    /// Create a sample from raw axes
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Tilt across the hourglass
    pub fn xx(&self) -> f32 {
        -self.x - self.y
    }

    /// Tilt along the hourglass
    pub fn yy(&self) -> f32 {
        -self.x + self.y
    }

    /// Whether bulb A is the upper bulb (`yy > 0`)
    pub fn bulb_a_up(&self) -> bool {
        self.yy() > 0.0
    }
}

/// A source of acceleration samples
pub trait TiltSensor {
    /// Error returned by a failed read
    type Error: core::fmt::Debug;

    /// Bring the sensor up before the first sample
    fn init(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Take one sample
    fn sample(&mut self) -> Result<Acceleration, Self::Error>;
}

/// Default 7-bit address (AD0 low)
pub const MPU6050_ADDRESS_LOW: u8 = 0x68;
/// Alternate 7-bit address (AD0 high)
pub const MPU6050_ADDRESS_HIGH: u8 = 0x69;

const REG_CONFIG: u8 = 0x1A;
const REG_ACCEL_CONFIG: u8 = 0x1C;
const REG_ACCEL_XOUT_H: u8 = 0x3B;
const REG_PWR_MGMT_1: u8 = 0x6B;
const REG_WHO_AM_I: u8 = 0x75;

const WHO_AM_I_EXPECTED: u8 = 0x68;

/// Full-scale accelerometer range
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AccelRange {
    /// ±2 g
    #[default]
    G2,
    /// ±4 g
    G4,
    /// ±8 g
    G8,
    /// ±16 g
    G16,
}

impl AccelRange {
    fn bits(self) -> u8 {
        match self {
            AccelRange::G2 => 0,
            AccelRange::G4 => 1,
            AccelRange::G8 => 2,
            AccelRange::G16 => 3,
        }
    }

    fn lsb_per_g(self) -> f32 {
        match self {
            AccelRange::G2 => 16384.0,
            AccelRange::G4 => 8192.0,
            AccelRange::G8 => 4096.0,
            AccelRange::G16 => 2048.0,
        }
    }
}

/// MPU6050 errors
#[derive(Debug, PartialEq)]
pub enum SensorError<E> {
    /// Bus error
    I2c(E),
    /// Unexpected WHO_AM_I value
    InvalidWhoAmI(u8),
    /// Digital low-pass filter setting outside `0..=6`
    InvalidFilter(u8),
}

impl<E> From<E> for SensorError<E> {
    fn from(value: E) -> Self {
        Self::I2c(value)
    }
}

impl<E: core::fmt::Debug> core::fmt::Display for SensorError<E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::I2c(e) => write!(f, "I2C error: {e:?}"),
            Self::InvalidWhoAmI(who) => write!(f, "Unexpected WHO_AM_I 0x{who:02X}"),
            Self::InvalidFilter(value) => write!(f, "Invalid low-pass filter setting {value}"),
        }
    }
}

impl<E: core::fmt::Debug> core::error::Error for SensorError<E> {}

/// InvenSense MPU6050 accelerometer (gyro unused)
pub struct Mpu6050<I> {
    i2c: I,
    addr: u8,
    range: AccelRange,
}

impl<I, E> Mpu6050<I>
where
    I: I2c<Error = E>,
{
    /// Driver at the default address
    pub fn new(i2c: I) -> Self {
        Self::new_with_addr(i2c, MPU6050_ADDRESS_LOW)
    }

    /// Driver at an explicit address
    pub fn new_with_addr(i2c: I, addr: u8) -> Self {
        Self {
            i2c,
            addr,
            range: AccelRange::G2,
        }
    }

    /// Check identity, wake the chip, select ±2 g and the widest low-pass filter
    pub fn init(&mut self) -> Result<(), SensorError<E>> {
        let who = self.read_who_am_i()?;
        if who != WHO_AM_I_EXPECTED {
            return Err(SensorError::InvalidWhoAmI(who));
        }
        self.wake()?;
        self.set_accel_range(AccelRange::G2)?;
        self.set_low_pass_filter(0)?;
        Ok(())
    }

    /// Read the identity register
    pub fn read_who_am_i(&mut self) -> Result<u8, SensorError<E>> {
        let mut data = [0u8; 1];
        self.i2c.write_read(self.addr, &[REG_WHO_AM_I], &mut data)?;
        Ok(data[0])
    }

    /// Leave sleep mode (internal oscillator)
    pub fn wake(&mut self) -> Result<(), SensorError<E>> {
        self.i2c.write(self.addr, &[REG_PWR_MGMT_1, 0x00])?;
        Ok(())
    }

    /// Select accelerometer full-scale range
    pub fn set_accel_range(&mut self, range: AccelRange) -> Result<(), SensorError<E>> {
        self.i2c
            .write(self.addr, &[REG_ACCEL_CONFIG, range.bits() << 3])?;
        self.range = range;
        Ok(())
    }

    /// Select the digital low-pass filter, `0` (260 Hz) to `6` (5 Hz)
    pub fn set_low_pass_filter(&mut self, setting: u8) -> Result<(), SensorError<E>> {
        if setting > 6 {
            return Err(SensorError::InvalidFilter(setting));
        }
        self.i2c.write(self.addr, &[REG_CONFIG, setting])?;
        Ok(())
    }

    /// Read (X, Y, Z) in g
    pub fn read_accel(&mut self) -> Result<Acceleration, SensorError<E>> {
        let mut data = [0u8; 6];
        // X_H, X_L, Y_H, Y_L, Z_H, Z_L
        self.i2c
            .write_read(self.addr, &[REG_ACCEL_XOUT_H], &mut data)?;

        let raw_x = i16::from_be_bytes([data[0], data[1]]);
        let raw_y = i16::from_be_bytes([data[2], data[3]]);
        let raw_z = i16::from_be_bytes([data[4], data[5]]);

        let scale = self.range.lsb_per_g();
        Ok(Acceleration::new(
            raw_x as f32 / scale,
            raw_y as f32 / scale,
            raw_z as f32 / scale,
        ))
    }

    /// Release the bus
    pub fn release(self) -> I {
        self.i2c
    }
}

impl<I, E> TiltSensor for Mpu6050<I>
where
    I: I2c<Error = E>,
    E: core::fmt::Debug,
{
    type Error = SensorError<E>;

    fn init(&mut self) -> Result<(), Self::Error> {
        Mpu6050::init(self)
    }

    fn sample(&mut self) -> Result<Acceleration, Self::Error> {
        self.read_accel()
    }
}

#[cfg(test)]
pub(crate) mod mock {
    use super::*;
    use alloc::collections::VecDeque;

    /// Sensor that replays a script, then repeats its last entry
    #[derive(Debug)]
    pub struct ScriptedSensor {
        script: VecDeque<Option<Acceleration>>,
        last: Option<Acceleration>,
    }

    impl ScriptedSensor {
        pub fn steady(sample: Acceleration) -> Self {
            Self {
                script: VecDeque::new(),
                last: Some(sample),
            }
        }

        pub fn failing() -> Self {
            Self {
                script: VecDeque::new(),
                last: None,
            }
        }

        pub fn hold(&mut self, sample: Option<Acceleration>) {
            self.script.clear();
            self.last = sample;
        }

        pub fn then(&mut self, sample: Option<Acceleration>) {
            self.script.push_back(sample);
        }
    }

    impl TiltSensor for ScriptedSensor {
        type Error = ();

        fn sample(&mut self) -> Result<Acceleration, Self::Error> {
            if let Some(next) = self.script.pop_front() {
                self.last = next;
            }
            self.last.ok_or(())
        }
    }

    /// Bulb A up, along the hourglass (`yy = 1`)
    pub const A_UP: Acceleration = Acceleration::new(-0.5, 0.5, 0.0);
    /// Bulb B up, along the hourglass (`yy = -1`)
    pub const B_UP: Acceleration = Acceleration::new(0.5, -0.5, 0.0);
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;
    use embedded_hal::i2c::{ErrorType, Operation};

    #[derive(Debug, Default)]
    struct MockI2c {
        writes: Vec<(u8, Vec<u8>)>,
        who_am_i: u8,
        accel: [u8; 6],
    }

    impl ErrorType for MockI2c {
        type Error = core::convert::Infallible;
    }

    impl I2c for MockI2c {
        fn transaction(
            &mut self,
            address: u8,
            operations: &mut [Operation<'_>],
        ) -> Result<(), Self::Error> {
            let mut register = None;
            for op in operations.iter_mut() {
                match op {
                    Operation::Write(bytes) => {
                        register = bytes.first().copied();
                        self.writes.push((address, bytes.to_vec()));
                    }
                    Operation::Read(buffer) => match register {
                        Some(REG_WHO_AM_I) => buffer[0] = self.who_am_i,
                        Some(REG_ACCEL_XOUT_H) => buffer.copy_from_slice(&self.accel),
                        _ => buffer.fill(0),
                    },
                }
            }
            Ok(())
        }
    }

    #[test]
    fn test_derived_axes() {
        let sample = Acceleration::new(0.25, 0.75, 0.1);
        assert!((sample.xx() - -1.0).abs() < 1e-6);
        assert!((sample.yy() - 0.5).abs() < 1e-6);
        assert!(sample.bulb_a_up());
        assert!(!Acceleration::new(0.5, -0.5, 0.0).bulb_a_up());
    }

    #[test]
    fn test_init_writes_wake_range_and_filter() {
        let i2c = MockI2c {
            who_am_i: WHO_AM_I_EXPECTED,
            ..MockI2c::default()
        };
        let mut sensor = Mpu6050::new(i2c);
        sensor.init().unwrap();

        let writes: Vec<Vec<u8>> = sensor
            .release()
            .writes
            .into_iter()
            .filter(|(_, bytes)| bytes.len() == 2)
            .map(|(_, bytes)| bytes)
            .collect();
        assert_eq!(
            writes,
            [
                alloc::vec![REG_PWR_MGMT_1, 0x00],
                alloc::vec![REG_ACCEL_CONFIG, 0x00],
                alloc::vec![REG_CONFIG, 0x00],
            ]
        );
    }

    #[test]
    fn test_init_rejects_unknown_chip() {
        let i2c = MockI2c {
            who_am_i: 0x12,
            ..MockI2c::default()
        };
        let mut sensor = Mpu6050::new(i2c);
        assert_eq!(sensor.init(), Err(SensorError::InvalidWhoAmI(0x12)));
    }

    #[test]
    fn test_read_accel_scales_big_endian_samples() {
        // +1 g on X, -0.5 g on Y, +0.25 g on Z at ±2 g
        let i2c = MockI2c {
            who_am_i: WHO_AM_I_EXPECTED,
            accel: [0x40, 0x00, 0xE0, 0x00, 0x10, 0x00],
            ..MockI2c::default()
        };
        let mut sensor = Mpu6050::new(i2c);
        let sample = sensor.sample().unwrap();
        assert_eq!(sample, Acceleration::new(1.0, -0.5, 0.25));
    }

    #[test]
    fn test_range_changes_scale() {
        let i2c = MockI2c {
            accel: [0x10, 0x00, 0x00, 0x00, 0x00, 0x00],
            ..MockI2c::default()
        };
        let mut sensor = Mpu6050::new(i2c);
        sensor.set_accel_range(AccelRange::G8).unwrap();
        assert_eq!(sensor.read_accel().unwrap().x, 1.0);
    }

    #[test]
    fn test_invalid_filter_is_rejected() {
        let mut sensor = Mpu6050::new(MockI2c::default());
        assert_eq!(sensor.set_low_pass_filter(7), Err(SensorError::InvalidFilter(7)));
    }
}
