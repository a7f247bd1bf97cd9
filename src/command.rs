//! MAX7219 register definitions
//!
//! Every transfer to a MAX7219 is a 16-bit word: the register address byte
//! followed by the data byte. In a daisy chain the words for all chips are
//! shifted out back-to-back while chip select is held low, and latched together
//! when it rises.
//!
//! ## Example
//!
//! ```rust,no_run
//! use hourglass::{command, DisplayInterface, SpiInterface};
//! # use core::convert::Infallible;
//! # use embedded_hal::spi::{Operation, SpiDevice};
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
//! # let mut interface = SpiInterface::new(MockSpi);
//! // Wake both chips of a two-panel chain in one burst
//! let _ = interface.send_burst(&[
//!     command::SHUTDOWN,
//!     command::SHUTDOWN_NORMAL,
//!     command::SHUTDOWN,
//!     command::SHUTDOWN_NORMAL,
//! ]);
//! ```

// Addressing

/// No-op register (0x00)
///
/// Used to pad the chain when only some chips should latch a write.
pub const NOOP: u8 = 0x00;

/// First digit (row) register (0x01)
///
/// Rows 0..=7 live at `DIGIT0 + row`. Each holds one byte, MSB leftmost.
pub const DIGIT0: u8 = 0x01;

/// Number of digit (row) registers per chip
pub const ROWS: u8 = 8;

// Control registers

/// Decode-mode register (0x09)
///
/// Selects BCD code-B decoding per digit. Matrix use requires 0x00.
pub const DECODE_MODE: u8 = 0x09;

/// Intensity register (0x0A)
///
/// Duty-cycle brightness, 0x00 (min) to 0x0F (max).
pub const INTENSITY: u8 = 0x0A;

/// Scan-limit register (0x0B)
///
/// Number of digits scanned minus one. 0x07 scans all 8 rows.
pub const SCAN_LIMIT: u8 = 0x0B;

/// Shutdown register (0x0C)
///
/// 0x00 = shutdown (display blank), 0x01 = normal operation.
pub const SHUTDOWN: u8 = 0x0C;

/// Display-test register (0x0F)
///
/// 0x01 lights every LED regardless of digit registers, 0x00 = normal.
pub const DISPLAY_TEST: u8 = 0x0F;

// Register values

/// Shutdown register value: display off
pub const SHUTDOWN_ENTER: u8 = 0x00;

/// Shutdown register value: normal operation
pub const SHUTDOWN_NORMAL: u8 = 0x01;

/// Display-test register value: test mode off
pub const DISPLAY_TEST_OFF: u8 = 0x00;

/// Scan-limit register value: scan all 8 rows
pub const SCAN_ALL_ROWS: u8 = ROWS - 1;

/// Decode-mode register value: raw segment data, no BCD decoding
pub const DECODE_NONE: u8 = 0x00;

/// Highest accepted intensity value
pub const MAX_INTENSITY: u8 = 0x0F;

/// Power-up sequence, applied to every chip in the chain in order
///
/// Disable display, disable test mode, scan all rows, disable decode, enable display.
pub const INIT_SEQUENCE: [(u8, u8); 5] = [
    (SHUTDOWN, SHUTDOWN_ENTER),
    (DISPLAY_TEST, DISPLAY_TEST_OFF),
    (SCAN_LIMIT, SCAN_ALL_ROWS),
    (DECODE_MODE, DECODE_NONE),
    (SHUTDOWN, SHUTDOWN_NORMAL),
];
