//! Schedule configuration and its persistence
//!
//! [`ScheduleConfig`] is the two-field record the control channel edits: how
//! many grains run through the glass and how long that should take. Values
//! arriving from outside are clamped, never rejected.
//!
//! [`SettingsStore`] frames the record for a key/value medium the board
//! provides through [`SettingsStorage`]. A record is a small header followed by
//! the `postcard` encoding of the config:
//!
//! | offset | size | field                |
//! |--------|------|----------------------|
//! | 0      | 4    | magic `HGS1` (LE)    |
//! | 4      | 2    | format version (LE)  |
//! | 6      | 2    | payload length (LE)  |
//! | 8      | 4    | CRC-32 of payload    |
//! | 12     | len  | payload              |
//!
//! Anything that does not check out loads as "nothing stored".
//!
//! ## Example
//!
//! ```
//! use hourglass::settings::{ScheduleConfig, TransferInterval};
//!
//! let config = ScheduleConfig::new(1000, 0);
//! assert_eq!(config.grain_count, 60);
//! assert_eq!(config.duration_seconds, 5);
//!
//! let config = ScheduleConfig::default();
//! assert_eq!(config.transfer_interval(), TransferInterval::Millis(1000));
//! ```

use core::fmt::Debug;

use crc32fast::Hasher;
use serde::{Deserialize, Serialize};

/// Well-known name the settings record is stored under
pub const SETTINGS_KEY: &str = "hourglass_settings";

/// Fewest grains a glass can hold
pub const MIN_GRAIN_COUNT: u32 = 1;
/// Most grains a glass can hold (leaves the receiving corner free)
pub const MAX_GRAIN_COUNT: u32 = 60;
/// Shortest run time in seconds
pub const MIN_DURATION_SECONDS: u32 = 5;
/// Longest run time in seconds
pub const MAX_DURATION_SECONDS: u32 = 3600;

/// Grain count used on first start or after a failed load
pub const DEFAULT_GRAIN_COUNT: u32 = 60;
/// Duration used on first start or after a failed load
pub const DEFAULT_DURATION_SECONDS: u32 = 60;

const SETTINGS_MAGIC: u32 = 0x4853_4731; // 'HGS1'
const SETTINGS_VERSION: u16 = 1;
const HEADER_LEN: usize = 12;
const PAYLOAD_MAX: usize = 32;

/// Largest record [`SettingsStore`] will read or write
pub const RECORD_MAX: usize = HEADER_LEN + PAYLOAD_MAX;

/// Grain count and run time of the hourglass
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// Grains in play, `1..=60`
    pub grain_count: u32,
    /// Time for the whole glass to run out, `5..=3600` seconds
    pub duration_seconds: u32,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            grain_count: DEFAULT_GRAIN_COUNT,
            duration_seconds: DEFAULT_DURATION_SECONDS,
        }
    }
}

impl ScheduleConfig {
    /// Build a config, clamping both fields into range
    pub fn new(grain_count: u32, duration_seconds: u32) -> Self {
        Self {
            grain_count,
            duration_seconds,
        }
        .clamped()
    }

    /// Copy of `self` with both fields clamped into range
    #[must_use]
    pub fn clamped(self) -> Self {
        Self {
            grain_count: self.grain_count.clamp(MIN_GRAIN_COUNT, MAX_GRAIN_COUNT),
            duration_seconds: self
                .duration_seconds
                .clamp(MIN_DURATION_SECONDS, MAX_DURATION_SECONDS),
        }
    }

    /// Replace the grain count (clamped)
    #[must_use]
    pub fn with_grain_count(self, grain_count: u32) -> Self {
        Self {
            grain_count,
            ..self
        }
        .clamped()
    }

    /// Replace the duration (clamped)
    #[must_use]
    pub fn with_duration(self, duration_seconds: u32) -> Self {
        Self {
            duration_seconds,
            ..self
        }
        .clamped()
    }

    /// Target time between two grain transfers
    pub fn transfer_interval(&self) -> TransferInterval {
        TransferInterval::new(self.grain_count, self.duration_seconds)
    }
}

/// Time between successive grain transfers
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransferInterval {
    /// Whole milliseconds, fraction truncated
    Millis(u32),
    /// No grains to schedule
    Never,
}

impl TransferInterval {
    /// `duration_seconds * 1000 / grain_count`, or [`Never`](Self::Never) for zero grains
    pub fn new(grain_count: u32, duration_seconds: u32) -> Self {
        if grain_count == 0 {
            return Self::Never;
        }
        Self::Millis(duration_seconds.saturating_mul(1000) / grain_count)
    }

    /// Interval in milliseconds, if finite
    pub fn as_millis(self) -> Option<u32> {
        match self {
            Self::Millis(ms) => Some(ms),
            Self::Never => None,
        }
    }
}

/// Key/value medium for the settings record
pub trait SettingsStorage {
    /// Storage error type
    type Error: Debug;

    /// Copy the record stored under `key` into `buf`
    ///
    /// Returns `Ok(None)` if nothing is stored, otherwise the record length.
    /// Records longer than `buf` may be truncated.
    fn read(&mut self, key: &str, buf: &mut [u8]) -> Result<Option<usize>, Self::Error>;

    /// Replace the record stored under `key`
    fn write(&mut self, key: &str, data: &[u8]) -> Result<(), Self::Error>;
}

/// Errors from [`SettingsStore`]
#[derive(Debug, PartialEq, Eq)]
pub enum SettingsError<E> {
    /// The storage medium failed
    Storage(E),
    /// The record could not be serialised
    Encode,
}

impl<E: Debug> core::fmt::Display for SettingsError<E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Storage(e) => write!(f, "Settings storage error: {:?}", e),
            Self::Encode => write!(f, "Settings record could not be encoded"),
        }
    }
}

impl<E: Debug> core::error::Error for SettingsError<E> {}

/// Loads and saves [`ScheduleConfig`] under [`SETTINGS_KEY`]
pub struct SettingsStore<S> {
    storage: S,
}

impl<S: SettingsStorage> SettingsStore<S> {
    /// Wrap a storage medium
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Load the stored config
    ///
    /// Returns `Ok(None)` when nothing usable is stored. Stored values are
    /// clamped into range.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError::Storage` if the medium could not be read.
    pub fn load(&mut self) -> Result<Option<ScheduleConfig>, SettingsError<S::Error>> {
        let mut buf = [0u8; RECORD_MAX];
        let Some(len) = self
            .storage
            .read(SETTINGS_KEY, &mut buf)
            .map_err(SettingsError::Storage)?
        else {
            return Ok(None);
        };
        let record = decode_record(&buf[..len.min(RECORD_MAX)]);
        if record.is_none() {
            log::warn!("Stored settings are corrupt, ignoring them");
        }
        Ok(record)
    }

    /// Persist `config`
    ///
    /// # Errors
    ///
    /// Returns `SettingsError::Encode` if the record does not fit, or
    /// `SettingsError::Storage` if the medium rejected the write.
    pub fn save(&mut self, config: &ScheduleConfig) -> Result<(), SettingsError<S::Error>> {
        let mut buf = [0u8; RECORD_MAX];
        let len = encode_record(config, &mut buf).ok_or(SettingsError::Encode)?;
        self.storage
            .write(SETTINGS_KEY, &buf[..len])
            .map_err(SettingsError::Storage)
    }

    /// Access the storage medium
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Consume the store and return the storage medium
    pub fn release(self) -> S {
        self.storage
    }
}

fn calc_crc32(data: &[u8]) -> u32 {
    let mut h = Hasher::new();
    h.update(data);
    h.finalize()
}

/// Frame `config` into `out`, returning the record length
fn encode_record(config: &ScheduleConfig, out: &mut [u8; RECORD_MAX]) -> Option<usize> {
    let (header, payload) = out.split_at_mut(HEADER_LEN);
    let len = postcard::to_slice(config, payload).ok()?.len();
    let crc = calc_crc32(&payload[..len]);

    header[0..4].copy_from_slice(&SETTINGS_MAGIC.to_le_bytes());
    header[4..6].copy_from_slice(&SETTINGS_VERSION.to_le_bytes());
    header[6..8].copy_from_slice(&(len as u16).to_le_bytes());
    header[8..12].copy_from_slice(&crc.to_le_bytes());
    Some(HEADER_LEN + len)
}

/// Validate and decode a framed record
fn decode_record(record: &[u8]) -> Option<ScheduleConfig> {
    let header = record.get(..HEADER_LEN)?;
    let magic = u32::from_le_bytes(header[0..4].try_into().ok()?);
    let version = u16::from_le_bytes(header[4..6].try_into().ok()?);
    let len = u16::from_le_bytes(header[6..8].try_into().ok()?) as usize;
    let crc = u32::from_le_bytes(header[8..12].try_into().ok()?);

    if magic != SETTINGS_MAGIC || version != SETTINGS_VERSION || len > PAYLOAD_MAX {
        return None;
    }
    let payload = record.get(HEADER_LEN..HEADER_LEN + len)?;
    if calc_crc32(payload) != crc {
        return None;
    }
    postcard::from_bytes::<ScheduleConfig>(payload)
        .ok()
        .map(ScheduleConfig::clamped)
}


#[cfg(test)]
mod tests {
    use super::mock::MemoryStorage;
    use super::*;

    fn framed(config: &ScheduleConfig) -> alloc::vec::Vec<u8> {
        let mut buf = [0u8; RECORD_MAX];
        let len = encode_record(config, &mut buf).unwrap();
        buf[..len].to_vec()
    }

    #[test]
    fn test_defaults() {
        let config = ScheduleConfig::default();
        assert_eq!(config.grain_count, 60);
        assert_eq!(config.duration_seconds, 60);
    }

    #[test]
    fn test_clamp_boundaries() {
        let config = ScheduleConfig::default();
        assert_eq!(config.with_grain_count(0).grain_count, 1);
        assert_eq!(config.with_grain_count(1000).grain_count, 60);
        assert_eq!(config.with_duration(0).duration_seconds, 5);
        assert_eq!(config.with_duration(999_999).duration_seconds, 3600);
        assert_eq!(config.with_grain_count(30).grain_count, 30);
    }

    #[test]
    fn test_transfer_interval() {
        assert_eq!(
            ScheduleConfig::new(60, 60).transfer_interval(),
            TransferInterval::Millis(1000)
        );
        // 3600 s over 7 grains truncates
        assert_eq!(
            ScheduleConfig::new(7, 3600).transfer_interval(),
            TransferInterval::Millis(514_285)
        );
        assert_eq!(TransferInterval::new(0, 60), TransferInterval::Never);
        assert_eq!(TransferInterval::Never.as_millis(), None);
    }

    #[test]
    fn test_save_then_load() {
        let mut store = SettingsStore::new(MemoryStorage::default());
        let config = ScheduleConfig::new(25, 300);
        store.save(&config).unwrap();
        assert_eq!(store.load(), Ok(Some(config)));
        assert_eq!(store.storage().record.as_ref().unwrap().0, SETTINGS_KEY);
    }

    #[test]
    fn test_missing_record_loads_as_none() {
        let mut store = SettingsStore::new(MemoryStorage::default());
        assert_eq!(store.load(), Ok(None));
    }

    #[test]
    fn test_corrupt_crc_loads_as_none() {
        let mut data = framed(&ScheduleConfig::new(25, 300));
        let last = data.len() - 1;
        data[last] ^= 0xFF;
        let mut store = SettingsStore::new(MemoryStorage::with_record(&data));
        assert_eq!(store.load(), Ok(None));
    }

    #[test]
    fn test_bad_magic_loads_as_none() {
        let mut data = framed(&ScheduleConfig::default());
        data[0] = b'X';
        let mut store = SettingsStore::new(MemoryStorage::with_record(&data));
        assert_eq!(store.load(), Ok(None));
    }

    #[test]
    fn test_truncated_record_loads_as_none() {
        let data = framed(&ScheduleConfig::default());
        let mut store = SettingsStore::new(MemoryStorage::with_record(&data[..data.len() - 1]));
        assert_eq!(store.load(), Ok(None));

        let mut store = SettingsStore::new(MemoryStorage::with_record(&data[..5]));
        assert_eq!(store.load(), Ok(None));
    }

    #[test]
    fn test_out_of_range_record_is_clamped() {
        let raw = ScheduleConfig {
            grain_count: 500,
            duration_seconds: 1,
        };
        let data = framed(&raw);
        let mut store = SettingsStore::new(MemoryStorage::with_record(&data));
        assert_eq!(store.load(), Ok(Some(ScheduleConfig::new(60, 5))));
    }

    #[test]
    fn test_storage_faults_surface() {
        let mut storage = MemoryStorage::default();
        storage.fail_reads = true;
        storage.fail_writes = true;
        let mut store = SettingsStore::new(storage);
        assert_eq!(store.load(), Err(SettingsError::Storage(())));
        assert_eq!(
            store.save(&ScheduleConfig::default()),
            Err(SettingsError::Storage(()))
        );
    }
}
