//! Error types for the display driver
//!
//! This module defines error types for configuration building ([`BuilderError`])
//! and display operations ([`Error`]).
//!
//! ## Error Types
//!
//! - [`BuilderError`] - Errors during configuration construction
//! - [`Error`] - Runtime errors during display operations
//! - [`InterfaceError`](crate::interface::InterfaceError) - Low-level bus errors
//!
//! An out-of-range brightness is always reported, never clamped: it can only
//! come from a caller bug.
//!
//! ## Example
//!
//! ```
//! use hourglass::{Builder, BuilderError};
//!
//! let result = Builder::new().brightness(16).build();
//! assert!(matches!(result, Err(BuilderError::InvalidBrightness { value: 16 })));
//! ```

use crate::command::MAX_INTENSITY;
use crate::interface::DisplayInterface;

/// Errors that can occur when interacting with the display
///
/// Generic over the interface type to preserve the specific error type.
#[derive(Debug)]
pub enum Error<I: DisplayInterface> {
    /// Interface error (SPI)
    ///
    /// Wraps the underlying hardware error from the [`DisplayInterface`] implementation.
    Interface(I::Error),
    /// Brightness outside `0..=15`
    InvalidBrightness {
        /// Value requested
        value: u8,
    },
}

impl<I: DisplayInterface> core::fmt::Display for Error<I> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Interface(_) => write!(f, "Interface error"),
            Self::InvalidBrightness { value } => {
                write!(f, "Invalid brightness {value} (max {MAX_INTENSITY})")
            }
        }
    }
}

impl<I: DisplayInterface + core::fmt::Debug> core::error::Error for Error<I> {}

/// Errors that can occur when building configuration
#[derive(Debug, PartialEq)]
pub enum BuilderError {
    /// Brightness outside `0..=15`
    InvalidBrightness {
        /// Value requested
        value: u8,
    },
}

impl core::fmt::Display for BuilderError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::InvalidBrightness { value } => {
                write!(f, "Invalid brightness {value} (max {MAX_INTENSITY})")
            }
        }
    }
}

impl core::error::Error for BuilderError {}
