//! Grain physics
//!
//! [`GrainPhysics`] is what the scheduler needs from a bulb: a boolean grid it
//! can read and write, and a step function that lets the grains fall under the
//! current tilt. [`SandGrid`] is the cellular implementation used on the
//! device.
//!
//! The acceleration handed to [`GrainPhysics::advance`] is already in bulb
//! coordinates: the first axis points along the anti-diagonal (towards
//! `(W-1, 0)` when positive) and the second along the main diagonal (towards
//! `(W-1, H-1)` when positive). The third axis is accepted but unused.

/// A bulb's grain grid and its motion rule
pub trait GrainPhysics {
    /// Grid width in cells
    fn width(&self) -> usize;

    /// Grid height in cells
    fn height(&self) -> usize;

    /// Whether cell `(x, y)` holds a grain (`false` outside the grid)
    fn get(&self, x: usize, y: usize) -> bool;

    /// Place or remove a grain at `(x, y)` (ignored outside the grid)
    fn set(&mut self, x: usize, y: usize, value: bool);

    /// Let grains move one step under acceleration; `true` if any moved
    ///
    /// Must never create or destroy grains.
    fn advance(&mut self, accel_x: f32, accel_y: f32, accel_z: f32) -> bool;

    /// Remove every grain
    fn clear(&mut self) {
        for y in 0..self.height() {
            for x in 0..self.width() {
                self.set(x, y, false);
            }
        }
    }

    /// Number of grains in the grid
    fn grain_count(&self) -> usize {
        let mut count = 0;
        for y in 0..self.height() {
            for x in 0..self.width() {
                if self.get(x, y) {
                    count += 1;
                }
            }
        }
        count
    }
}

/// Below this on both grid axes the bulb is lying flat and nothing moves
const FLAT_THRESHOLD: f32 = 0.1;

/// tan(67.5°): a component smaller than this fraction of the other is dropped,
/// quantising gravity to eight directions
const OCTANT_RATIO: f32 = 2.414_213_5;

/// Fixed-size cellular sand grid
///
/// Each call to [`advance`](GrainPhysics::advance) moves every grain at most
/// one cell: straight "down" if free, otherwise to the free neighbour on the
/// side gravity leans towards. Grains nearest the floor move first so a
/// column falls together.
#[derive(Clone, Debug, PartialEq)]
pub struct SandGrid<const W: usize, const H: usize> {
    cells: [[bool; W]; H],
    /// Tie-breaker for perfectly balanced side choices
    lean_toggle: bool,
}

/// One bulb of the hourglass
pub type Bulb8x8 = SandGrid<8, 8>;

impl<const W: usize, const H: usize> Default for SandGrid<W, H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const W: usize, const H: usize> SandGrid<W, H> {
    /// Empty grid
    pub const fn new() -> Self {
        Self {
            cells: [[false; W]; H],
            lean_toggle: false,
        }
    }

    fn free(&self, x: isize, y: isize) -> bool {
        x >= 0
            && y >= 0
            && (x as usize) < W
            && (y as usize) < H
            && !self.cells[y as usize][x as usize]
    }

    fn axis_step(component: f32, other: f32) -> isize {
        if component.abs() * OCTANT_RATIO < other.abs() {
            0
        } else if component > 0.0 {
            1
        } else {
            -1
        }
    }

    /// Ordered candidate moves for gravity `(gx, gy)` quantised to `(sx, sy)`
    fn candidates(&mut self, sx: isize, sy: isize, gx: f32, gy: f32) -> [(isize, isize); 3] {
        let toggle = self.lean_toggle;
        self.lean_toggle = !self.lean_toggle;

        if sx != 0 && sy != 0 {
            // Diagonal: fall back to whichever axis pulls harder
            let x_first = if gx.abs() == gy.abs() {
                toggle
            } else {
                gx.abs() > gy.abs()
            };
            if x_first {
                [(sx, sy), (sx, 0), (0, sy)]
            } else {
                [(sx, sy), (0, sy), (sx, 0)]
            }
        } else if sx != 0 {
            // Straight along x: slide sideways in y towards the lean
            let side = lean(gy, toggle);
            [(sx, 0), (sx, side), (sx, -side)]
        } else {
            let side = lean(gx, toggle);
            [(0, sy), (side, sy), (-side, sy)]
        }
    }
}

fn lean(component: f32, toggle: bool) -> isize {
    if component > 0.0 {
        1
    } else if component < 0.0 {
        -1
    } else if toggle {
        1
    } else {
        -1
    }
}

/// Indices `0..len`, starting from the floor side when `step` is non-zero
fn floor_first(len: usize, step: isize) -> impl Iterator<Item = usize> {
    (0..len).map(move |i| if step > 0 { len - 1 - i } else { i })
}

impl<const W: usize, const H: usize> GrainPhysics for SandGrid<W, H> {
    fn width(&self) -> usize {
        W
    }

    fn height(&self) -> usize {
        H
    }

    fn get(&self, x: usize, y: usize) -> bool {
        x < W && y < H && self.cells[y][x]
    }

    fn set(&mut self, x: usize, y: usize, value: bool) {
        if x < W && y < H {
            self.cells[y][x] = value;
        }
    }

    fn advance(&mut self, accel_x: f32, accel_y: f32, _accel_z: f32) -> bool {
        // Rotate the diagonal axes onto the grid axes
        let gx = accel_y + accel_x;
        let gy = accel_y - accel_x;
        if gx.abs() < FLAT_THRESHOLD && gy.abs() < FLAT_THRESHOLD {
            return false;
        }

        let sx = Self::axis_step(gx, gy);
        let sy = Self::axis_step(gy, gx);

        let mut settled = [[false; W]; H];
        let mut changed = false;

        for y in floor_first(H, sy) {
            for x in floor_first(W, sx) {
                if !self.cells[y][x] || settled[y][x] {
                    continue;
                }
                let moves = self.candidates(sx, sy, gx, gy);
                let (xi, yi) = (x as isize, y as isize);
                let target = moves
                    .into_iter()
                    .filter(|&(dx, dy)| dx != 0 || dy != 0)
                    .map(|(dx, dy)| (xi + dx, yi + dy))
                    .find(|&(nx, ny)| self.free(nx, ny));

                if let Some((nx, ny)) = target {
                    let (nx, ny) = (nx as usize, ny as usize);
                    self.cells[y][x] = false;
                    self.cells[ny][nx] = true;
                    settled[ny][nx] = true;
                    changed = true;
                }
            }
        }

        changed
    }

    fn clear(&mut self) {
        self.cells = [[false; W]; H];
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settle(grid: &mut Bulb8x8, xx: f32, yy: f32) -> usize {
        let mut steps = 0;
        while grid.advance(xx, yy, 0.0) {
            steps += 1;
            assert!(steps < 1_000, "grid never settled");
        }
        steps
    }

    #[test]
    fn test_new_grid_is_empty() {
        let grid = Bulb8x8::new();
        assert_eq!(grid.grain_count(), 0);
        assert_eq!(grid.width(), 8);
        assert_eq!(grid.height(), 8);
    }

    #[test]
    fn test_get_set_out_of_bounds() {
        let mut grid = Bulb8x8::new();
        grid.set(8, 0, true);
        grid.set(0, 8, true);
        assert_eq!(grid.grain_count(), 0);
        assert!(!grid.get(8, 0));
    }

    #[test]
    fn test_flat_does_not_move() {
        let mut grid = Bulb8x8::new();
        grid.set(3, 3, true);
        assert!(!grid.advance(0.03, -0.02, 1.0));
        assert!(grid.get(3, 3));
    }

    #[test]
    fn test_grain_falls_along_main_diagonal() {
        let mut grid = Bulb8x8::new();
        grid.set(2, 2, true);
        assert!(grid.advance(0.0, 1.0, 0.0));
        assert!(grid.get(3, 3));
        settle(&mut grid, 0.0, 1.0);
        assert!(grid.get(7, 7));
        assert_eq!(grid.grain_count(), 1);
    }

    #[test]
    fn test_grain_slides_along_edge_into_corner() {
        let mut grid = Bulb8x8::new();
        grid.set(0, 5, true);
        settle(&mut grid, 0.0, -1.0);
        assert!(grid.get(0, 0));
    }

    #[test]
    fn test_anti_diagonal_gravity() {
        let mut grid = Bulb8x8::new();
        grid.set(4, 4, true);
        settle(&mut grid, 1.0, 0.0);
        assert!(grid.get(7, 0));
    }

    #[test]
    fn test_advance_conserves_grains() {
        let mut grid = Bulb8x8::new();
        for i in (0..64).step_by(3) {
            grid.set(i % 8, i / 8, true);
        }
        let before = grid.grain_count();
        for (xx, yy) in [(0.0, 1.0), (1.0, 0.3), (-0.7, -0.7), (0.2, -1.0)] {
            for _ in 0..20 {
                grid.advance(xx, yy, 0.0);
                assert_eq!(grid.grain_count(), before);
            }
        }
    }

    #[test]
    fn test_settled_pile_leaves_top_corner_empty() {
        let mut grid = Bulb8x8::new();
        for i in 0..60 {
            grid.set(i % 8, i / 8, true);
        }
        settle(&mut grid, 0.0, -1.0);
        assert_eq!(grid.grain_count(), 60);
        assert!(grid.get(0, 0));
        assert!(!grid.get(7, 7));
    }

    #[test]
    fn test_full_grid_cannot_move() {
        let mut grid = Bulb8x8::new();
        for i in 0..64 {
            grid.set(i % 8, i / 8, true);
        }
        assert!(!grid.advance(0.0, 1.0, 0.0));
    }

    #[test]
    fn test_clear() {
        let mut grid = Bulb8x8::new();
        grid.set(1, 2, true);
        grid.clear();
        assert_eq!(grid.grain_count(), 0);
    }
}
