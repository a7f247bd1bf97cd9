//! Pixel addressing and bulb projection
//!
//! The frame buffer of an `N`-chip chain is a 8N×8 monochrome panel stored
//! horizontally packed: each row holds one byte per chip, and within a byte the
//! most significant bit is the leftmost pixel. Row `y` of chip `m` is the byte
//! shifted into digit register `y` of that chip.
//!
//! The two bulbs are projected onto that panel transposed: bulb-local column
//! `x` becomes device row `x`, bulb-local row `y` becomes device column `y`,
//! and bulb B sits one panel width to the right of bulb A.
//!
//! ## Example
//!
//! ```
//! use hourglass::layout::{pixel_address, project};
//! use hourglass::Bulb;
//!
//! // For a 2-chip chain, device pixel (0,0) is row 0, chip 0, MSB
//! assert_eq!(pixel_address(0, 0, 2), Some((0, 0, 0x80)));
//!
//! // Bulb B cell (x=1, y=2) lands on device column 10, row 1
//! assert_eq!(project(Bulb::B, 1, 2), (10, 1));
//! ```

use crate::hourglass::Bulb;

/// Side length of one matrix panel (and of one bulb) in pixels
pub const PANEL_SIZE: u32 = 8;

/// Resolve device pixel coordinates to a buffer location
///
/// Converts panel coordinates (x, y) to (row, chip, bit_mask) for a chain of
/// `chips` panels laid out left to right.
///
/// # Arguments
///
/// * `x` - X coordinate (column), 0 to 8*chips-1
/// * `y` - Y coordinate (row), 0 to 7
/// * `chips` - Number of cascaded panels
///
/// # Returns
///
/// `None` if the pixel lies outside the panel, otherwise:
/// - `row`: digit register index (0..8)
/// - `chip`: position in the chain (0..chips)
/// - `bit_mask`: bit within the row byte (0x80 for the leftmost pixel)
pub fn pixel_address(x: u32, y: u32, chips: usize) -> Option<(usize, usize, u8)> {
    let width = PANEL_SIZE * chips as u32;
    if x >= width || y >= PANEL_SIZE {
        return None;
    }
    let chip = (x / PANEL_SIZE) as usize;
    let bit = 0x80 >> (x % PANEL_SIZE);
    Some((y as usize, chip, bit))
}

/// Map a bulb-local cell to device pixel coordinates
///
/// Returns `(device_x, device_y)` on the combined 16×8 logical panel.
pub fn project(bulb: Bulb, x: u32, y: u32) -> (u32, u32) {
    let offset = match bulb {
        Bulb::A => 0,
        Bulb::B => PANEL_SIZE,
    };
    (y + offset, x)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pixel_address_single_chip() {
        assert_eq!(pixel_address(0, 0, 1), Some((0, 0, 0x80)));
        assert_eq!(pixel_address(1, 0, 1), Some((0, 0, 0x40)));
        assert_eq!(pixel_address(7, 0, 1), Some((0, 0, 0x01)));
        assert_eq!(pixel_address(0, 7, 1), Some((7, 0, 0x80)));
    }

    #[test]
    fn test_pixel_address_second_chip() {
        assert_eq!(pixel_address(8, 0, 2), Some((0, 1, 0x80)));
        assert_eq!(pixel_address(15, 3, 2), Some((3, 1, 0x01)));
    }

    #[test]
    fn test_pixel_address_out_of_bounds() {
        assert_eq!(pixel_address(16, 0, 2), None);
        assert_eq!(pixel_address(0, 8, 2), None);
        assert_eq!(pixel_address(8, 0, 1), None);
    }

    #[test]
    fn test_project_transposes_bulb_a() {
        assert_eq!(project(Bulb::A, 0, 0), (0, 0));
        assert_eq!(project(Bulb::A, 7, 0), (0, 7));
        assert_eq!(project(Bulb::A, 0, 7), (7, 0));
        assert_eq!(project(Bulb::A, 7, 7), (7, 7));
    }

    #[test]
    fn test_project_offsets_bulb_b() {
        assert_eq!(project(Bulb::B, 0, 0), (8, 0));
        assert_eq!(project(Bulb::B, 7, 7), (15, 7));
    }
}
