//! LED Sand Hourglass Control Core
//!
//! Firmware core for an hourglass built from two cascaded MAX7219 8×8 LED
//! matrices ("bulbs"), a tilt sensor and a wireless configuration channel.
//!
//! ## Features
//!
//! - `no_std` compatible
//! - `embedded-hal` v1.0 support (SPI display chain, I²C MPU6050)
//! - Orientation-aware grain scheduler with wraparound-safe deadlines
//! - Cellular sand simulation per bulb
//! - CRC-checked settings persistence over any key/value medium
//! - Async task bodies for `embassy`-style cooperative executors
//!
//! ## Usage
//!
//! ```rust,no_run
//! use core::convert::Infallible;
//! use embedded_hal::spi::{Operation, SpiDevice};
//! use hourglass::{Builder, Hourglass, Max7219, ScheduleConfig, SpiInterface, Ticks};
//! use rand::rngs::mock::StepRng;
//!
//! # struct MockSpi;
//! # impl embedded_hal::spi::ErrorType for MockSpi { type Error = Infallible; }
//! # impl SpiDevice for MockSpi {
//! #     fn transaction(
//! #         &mut self,
//! #         _operations: &mut [Operation<'_, u8>],
//! #     ) -> Result<(), Self::Error> {
//! #         Ok(())
//! #     }
//! # }
//! # let spi = MockSpi;
//! let config = match Builder::new().brightness(1).build() {
//!     Ok(config) => config,
//!     Err(_) => return,
//! };
//! let mut display: Max7219<_, 2> = Max7219::new(SpiInterface::new(spi), config);
//! let _ = display.init();
//!
//! let mut glass = Hourglass::default();
//! let mut rng = StepRng::new(1, 7);
//! glass.reset(ScheduleConfig::new(60, 60), None, Ticks::from_millis(0), &mut rng);
//! let _ = glass.render(&mut display);
//! ```

#![no_std]

#[cfg(test)]
extern crate alloc;

/// Application composition
pub mod app;
/// MAX7219 register definitions
pub mod command;
/// Display configuration types and builder
pub mod config;
/// Wireless configuration channel
pub mod control;
/// Core display operations
pub mod display;
/// Error types for the driver
pub mod error;
/// Orientation-aware transfer scheduler
pub mod hourglass;
/// Hardware interface abstraction
pub mod interface;
/// Pixel addressing and bulb projection
pub mod layout;
/// Cooperative task bodies
pub mod runtime;
/// Grain physics
pub mod sand;
/// Tilt sensing
pub mod sensor;
/// Schedule configuration and persistence
pub mod settings;
/// Wrapping monotonic time
pub mod time;

pub use app::{App, CHAIN_LENGTH, HourglassDisplay};
pub use config::{Builder, Config};
pub use control::{ConfigField, ConfigWrites, ControlCommand, ControlLink};
pub use display::Max7219;
pub use error::{BuilderError, Error};
pub use hourglass::{Bulb, Hourglass, Progress, ScheduleState};
pub use interface::InterfaceError;
pub use interface::{DisplayInterface, SpiInterface};
pub use sand::{Bulb8x8, GrainPhysics, SandGrid};
pub use sensor::{Acceleration, Mpu6050, SensorError, TiltSensor};
pub use settings::{
    ScheduleConfig, SettingsError, SettingsStorage, SettingsStore, TransferInterval,
};
pub use time::{Monotonic, Ticks};
