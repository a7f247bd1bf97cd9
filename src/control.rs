//! Wireless configuration channel
//!
//! The peer sees two read/write/notify values, grain count and duration, each
//! a little-endian unsigned integer. How they travel (advertising, GATT,
//! notifications) is the board's business: it implements [`ControlLink`] for
//! the connection cycle and one [`ConfigWrites`] per value, and spawns the
//! task bodies in [`crate::runtime`].
//!
//! ## Example
//!
//! ```
//! use hourglass::control::{decode_u32_le, encode_u32_le, ConfigField, ControlCommand};
//!
//! assert_eq!(encode_u32_le(60), [60, 0, 0, 0]);
//! assert_eq!(decode_u32_le(&[0x10, 0x0E]), 3600);
//! assert_eq!(
//!     ConfigField::Duration.command(3600),
//!     ControlCommand::SetDuration(3600)
//! );
//! ```

use core::fmt::{self, Debug};

/// Name the device advertises under
pub const ADVERTISED_NAME: &str = "Sanduhr";

/// Service grouping both values
pub const SERVICE_UUID: u128 = 0x4A98_0000_8580_425B_A2A8_3335_3579_C6F5;

/// Widest value the channel carries
pub const VALUE_LEN: usize = 4;

/// Longest write payload a listener captures (one write at the default ATT MTU)
pub const WRITE_BUF_LEN: usize = 20;

/// One of the two values the peer can read and write
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ConfigField {
    /// Number of grains
    GrainCount,
    /// Run time in seconds
    Duration,
}

impl ConfigField {
    /// Characteristic carrying this value
    pub const fn uuid(self) -> u128 {
        match self {
            ConfigField::GrainCount => 0x4A98_0001_8580_425B_A2A8_3335_3579_C6F5,
            ConfigField::Duration => 0x4A98_0002_8580_425B_A2A8_3335_3579_C6F5,
        }
    }

    /// The command a write of `value` to this field stands for
    pub const fn command(self, value: u32) -> ControlCommand {
        match self {
            ConfigField::GrainCount => ControlCommand::SetGrainCount(value),
            ConfigField::Duration => ControlCommand::SetDuration(value),
        }
    }
}

impl fmt::Display for ConfigField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigField::GrainCount => write!(f, "grain count"),
            ConfigField::Duration => write!(f, "duration"),
        }
    }
}

/// A configuration change requested by the peer
///
/// Values are raw; the receiver clamps them.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ControlCommand {
    /// Change the number of grains
    SetGrainCount(u32),
    /// Change the run time in seconds
    SetDuration(u32),
}

/// Encode a value the way the peer reads it
pub const fn encode_u32_le(value: u32) -> [u8; VALUE_LEN] {
    value.to_le_bytes()
}

/// Decode an unsigned little-endian integer of any length
///
/// An empty payload is 0. Values too wide for a `u32` saturate to
/// `u32::MAX`; the receiver clamps either way.
pub fn decode_u32_le(data: &[u8]) -> u32 {
    let (low, high) = data.split_at(data.len().min(VALUE_LEN));
    if high.iter().any(|byte| *byte != 0) {
        return u32::MAX;
    }
    let mut bytes = [0u8; VALUE_LEN];
    bytes[..low.len()].copy_from_slice(low);
    u32::from_le_bytes(bytes)
}

/// Connection cycle of the wireless peripheral
#[allow(async_fn_in_trait)]
pub trait ControlLink {
    /// Transport error type
    type Error: Debug;

    /// Advertise until a peer connects
    async fn accept(&mut self) -> Result<(), Self::Error>;

    /// Update `field` and notify the connected peer
    async fn publish(&mut self, field: ConfigField, value: [u8; VALUE_LEN])
    -> Result<(), Self::Error>;

    /// Wait until the connected peer goes away
    async fn disconnected(&mut self) -> Result<(), Self::Error>;
}

/// Stream of peer writes to one value
#[allow(async_fn_in_trait)]
pub trait ConfigWrites {
    /// Transport error type
    type Error: Debug;

    /// Wait for the next write and copy its payload into `buf`
    ///
    /// Returns the payload length, which may exceed `buf.len()` if the
    /// payload was truncated.
    async fn written(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error>;
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_is_four_byte_le() {
        assert_eq!(encode_u32_le(3600), [0x10, 0x0E, 0x00, 0x00]);
        assert_eq!(encode_u32_le(u32::MAX), [0xFF; 4]);
    }

    #[test]
    fn test_decode_short_payloads() {
        assert_eq!(decode_u32_le(&[30]), 30);
        assert_eq!(decode_u32_le(&[0xE8, 0x03]), 1000);
        assert_eq!(decode_u32_le(&[0x3F, 0x42, 0x0F]), 999_999);
        assert_eq!(decode_u32_le(&[0, 0, 0, 0]), 0);
    }

    #[test]
    fn test_decode_empty_payload_is_zero() {
        assert_eq!(decode_u32_le(&[]), 0);
    }

    #[test]
    fn test_decode_long_payloads() {
        assert_eq!(decode_u32_le(&[30, 0, 0, 0, 0, 0, 0, 0]), 30);
        assert_eq!(decode_u32_le(&[0x10, 0x0E, 0, 0, 0]), 3600);
        assert_eq!(decode_u32_le(&[1, 2, 3, 4, 5]), u32::MAX);
        assert_eq!(decode_u32_le(&[0, 0, 0, 0, 0, 0, 1]), u32::MAX);
    }

    #[test]
    fn test_field_commands() {
        assert_eq!(
            ConfigField::GrainCount.command(7),
            ControlCommand::SetGrainCount(7)
        );
        assert_ne!(ConfigField::GrainCount.uuid(), ConfigField::Duration.uuid());
        assert_eq!(ConfigField::Duration.uuid() >> 96, SERVICE_UUID >> 96 | 2);
    }
}
