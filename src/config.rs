//! Display configuration types and builder

use crate::command::MAX_INTENSITY;
pub use crate::error::BuilderError;

/// Default brightness applied at power-up
pub const DEFAULT_BRIGHTNESS: u8 = 1;

/// Display configuration
///
/// Use [`Builder`] to create a Config.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Config {
    /// Intensity written after the init sequence, `0..=15`
    pub brightness: u8,
    /// Whether the frame buffer is pushed (blank) right after init
    pub clear_on_init: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            brightness: DEFAULT_BRIGHTNESS,
            clear_on_init: true,
        }
    }
}

/// Builder for constructing display configuration
///
/// # Example
///
/// ```rust
/// use hourglass::Builder;
///
/// let config = match Builder::new().brightness(4).build() {
///     Ok(config) => config,
///     Err(_) => return,
/// };
/// assert_eq!(config.brightness, 4);
/// ```
#[must_use]
pub struct Builder {
    brightness: u8,
    clear_on_init: bool,
}

impl Default for Builder {
    fn default() -> Self {
        let defaults = Config::default();
        Self {
            brightness: defaults.brightness,
            clear_on_init: defaults.clear_on_init,
        }
    }
}

impl Builder {
    /// Create a new Builder with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the power-up brightness (validated in [`build`](Self::build))
    pub fn brightness(mut self, value: u8) -> Self {
        self.brightness = value;
        self
    }

    /// Set whether a blank frame is pushed after init
    pub fn clear_on_init(mut self, value: bool) -> Self {
        self.clear_on_init = value;
        self
    }

    /// Build the configuration
    ///
    /// # Errors
    ///
    /// Returns `BuilderError::InvalidBrightness` if brightness is above 15
    pub fn build(self) -> Result<Config, BuilderError> {
        if self.brightness > MAX_INTENSITY {
            return Err(BuilderError::InvalidBrightness {
                value: self.brightness,
            });
        }
        Ok(Config {
            brightness: self.brightness,
            clear_on_init: self.clear_on_init,
        })
    }
}
