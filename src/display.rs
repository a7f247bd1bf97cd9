//! Core display operations

use crate::command::{
    DIGIT0, INIT_SEQUENCE, INTENSITY, MAX_INTENSITY, ROWS, SHUTDOWN, SHUTDOWN_ENTER,
};
use crate::config::Config;
use crate::error::Error;
use crate::interface::DisplayInterface;
use crate::layout::{PANEL_SIZE, pixel_address};

type DisplayResult<I> = core::result::Result<(), Error<I>>;

/// Driver for `N` cascaded MAX7219 8×8 matrices
///
/// Owns a frame buffer for the whole chain and exposes exactly what a renderer
/// needs: [`clear`](Self::clear), [`set_pixel`](Self::set_pixel) and
/// [`push`](Self::push). Pixel writes only touch the buffer; nothing reaches
/// the hardware until `push`.
pub struct Max7219<I, const N: usize>
where
    I: DisplayInterface,
{
    /// Hardware interface
    interface: I,
    /// Display configuration
    config: Config,
    /// One byte per chip per row, MSB leftmost
    buffer: [[u8; N]; ROWS as usize],
    /// Last intensity written to the chain
    brightness: u8,
}

impl<I, const N: usize> Max7219<I, N>
where
    I: DisplayInterface,
{
    /// Panel width in pixels
    pub const WIDTH: u32 = PANEL_SIZE * N as u32;
    /// Panel height in pixels
    pub const HEIGHT: u32 = PANEL_SIZE;

    /// Create a new driver instance with a blank buffer
    pub fn new(interface: I, config: Config) -> Self {
        Self {
            interface,
            config,
            buffer: [[0; N]; ROWS as usize],
            brightness: config.brightness,
        }
    }

    /// Run the power-up sequence on every chip, then apply the configured brightness
    ///
    /// Order: disable display, disable test mode, scan all 8 rows, disable
    /// decode, enable display.
    pub fn init(&mut self) -> DisplayResult<I> {
        for (register, data) in INIT_SEQUENCE {
            self.write_all(register, data)?;
        }
        self.set_brightness(self.config.brightness)?;
        if self.config.clear_on_init {
            self.clear();
            self.push()?;
        }
        Ok(())
    }

    /// Set chain brightness
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidBrightness` if `value` is above 15. Nothing is
    /// sent in that case.
    pub fn set_brightness(&mut self, value: u8) -> DisplayResult<I> {
        if value > MAX_INTENSITY {
            return Err(Error::InvalidBrightness { value });
        }
        self.write_all(INTENSITY, value)?;
        self.brightness = value;
        Ok(())
    }

    /// Last brightness successfully applied
    pub fn brightness(&self) -> u8 {
        self.brightness
    }

    /// Blank the frame buffer
    pub fn clear(&mut self) {
        self.buffer = [[0; N]; ROWS as usize];
    }

    /// Set or reset one pixel in the frame buffer
    ///
    /// Coordinates outside the panel are ignored.
    pub fn set_pixel(&mut self, x: u32, y: u32, on: bool) {
        let Some((row, chip, bit)) = pixel_address(x, y, N) else {
            return;
        };
        if on {
            self.buffer[row][chip] |= bit;
        } else {
            self.buffer[row][chip] &= !bit;
        }
    }

    /// Read one pixel from the frame buffer (`false` outside the panel)
    pub fn pixel(&self, x: u32, y: u32) -> bool {
        pixel_address(x, y, N).is_some_and(|(row, chip, bit)| self.buffer[row][chip] & bit != 0)
    }

    /// Write the frame buffer to the chain
    ///
    /// Each of the 8 row registers is written once: one burst per row carrying
    /// one word per chip, chip select released between rows.
    pub fn push(&mut self) -> DisplayResult<I> {
        for row in 0..ROWS {
            let bytes = self.buffer[row as usize];
            let words: [[u8; 2]; N] = core::array::from_fn(|chip| [DIGIT0 + row, bytes[chip]]);
            self.send_burst(words.as_flattened())?;
        }
        Ok(())
    }

    /// Blank the buffer and push it, leaving the chips running
    pub fn blank(&mut self) -> DisplayResult<I> {
        self.clear();
        self.push()
    }

    /// Put every chip into shutdown mode
    ///
    /// The LEDs go dark but the row registers keep their contents; [`init`](Self::init)
    /// wakes the chain again.
    pub fn shutdown(&mut self) -> DisplayResult<I> {
        self.write_all(SHUTDOWN, SHUTDOWN_ENTER)
    }

    /// Raw frame buffer, indexed `[row][chip]`
    pub fn buffer(&self) -> &[[u8; N]; ROWS as usize] {
        &self.buffer
    }

    /// Access the underlying configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Access the underlying interface
    pub fn interface(&self) -> &I {
        &self.interface
    }

    /// Consume the driver and return the interface
    pub fn release(self) -> I {
        self.interface
    }

    /// Write the same register/value word to every chip in one burst
    fn write_all(&mut self, register: u8, data: u8) -> DisplayResult<I> {
        let words = [[register, data]; N];
        self.send_burst(words.as_flattened())
    }

    fn send_burst(&mut self, data: &[u8]) -> DisplayResult<I> {
        self.interface.send_burst(data).map_err(Error::Interface)
    }
}
