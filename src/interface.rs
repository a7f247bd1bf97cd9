//! Hardware interface abstraction
//!
//! This module provides the [`DisplayInterface`] trait and the [`SpiInterface`]
//! struct for talking to a chain of MAX7219 chips over SPI.
//!
//! ## Hardware Requirements
//!
//! A MAX7219 chain needs only:
//! - SPI bus (MOSI + SCK), mode 0, up to 10 MHz
//! - **CS/LOAD**: chip select, owned by the [`SpiDevice`] implementation
//!
//! The chips latch shifted data on the rising edge of LOAD, so one register
//! write to the whole chain must be a single chip-select framed burst. An
//! [`SpiDevice`] guarantees exactly that for each `write` call.
//!
//! ## Example
//!
//! ```rust,no_run
//! use embedded_hal::spi::{Operation, SpiDevice};
//! use hourglass::{command, DisplayInterface, SpiInterface};
//! # use core::convert::Infallible;
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
//! let mut interface = SpiInterface::new(MockSpi);
//!
//! // Set intensity 1 on a single chip
//! let _ = interface.send_burst(&[command::INTENSITY, 0x01]);
//! ```

use core::fmt::Debug;
use embedded_hal::spi::SpiDevice;

type InterfaceResult<T, E> = core::result::Result<T, E>;

/// Trait for hardware interface to a MAX7219 chain
///
/// This trait abstracts over different hardware implementations,
/// allowing [`Max7219`](crate::display::Max7219) to work with any
/// transport that can frame a burst of bytes with chip select.
///
/// ## Implementing
///
/// For most cases, use the provided [`SpiInterface`]. If the board drives
/// LOAD from a plain GPIO and shares the bus, implement this trait on your
/// own type.
pub trait DisplayInterface {
    /// Error type for interface operations
    ///
    /// Must implement [`Debug`] for error reporting.
    type Error: Debug;

    /// Send one chip-select framed burst
    ///
    /// The implementation must:
    /// 1. Assert chip select
    /// 2. Shift out every byte of `data` in order
    /// 3. Release chip select (latching the words into the chips)
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying bus transfer fails.
    #[allow(clippy::type_complexity)]
    fn send_burst(&mut self, data: &[u8]) -> InterfaceResult<(), Self::Error>;
}

/// Errors that can occur at the interface level
#[derive(Debug)]
pub enum InterfaceError<SpiErr> {
    /// SPI communication error
    Spi(SpiErr),
}

impl<SpiErr: Debug> core::fmt::Display for InterfaceError<SpiErr> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Spi(e) => write!(f, "SPI error: {e:?}"),
        }
    }
}

impl<SpiErr: Debug> core::error::Error for InterfaceError<SpiErr> {}

/// Hardware interface implementation for a MAX7219 chain
///
/// Implements [`DisplayInterface`] for an embedded-hal v1.0 [`SpiDevice`],
/// which owns the CS/LOAD line.
pub struct SpiInterface<SPI> {
    /// SPI device for communication
    spi: SPI,
}

impl<SPI> SpiInterface<SPI>
where
    SPI: SpiDevice,
{
    /// Create a new SpiInterface
    pub fn new(spi: SPI) -> Self {
        Self { spi }
    }

    /// Release the underlying SPI device
    pub fn release(self) -> SPI {
        self.spi
    }
}

impl<SPI> DisplayInterface for SpiInterface<SPI>
where
    SPI: SpiDevice,
    SPI::Error: Debug,
{
    type Error = InterfaceError<SPI::Error>;

    fn send_burst(&mut self, data: &[u8]) -> InterfaceResult<(), Self::Error> {
        self.spi.write(data).map_err(InterfaceError::Spi)
    }
}
