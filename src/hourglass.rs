//! Orientation-aware transfer scheduler
//!
//! [`Hourglass`] owns both bulbs and decides, once per tick, whether a grain
//! may cross the neck. Grains fall at a fixed rate derived from the
//! [`ScheduleConfig`]: every [`TransferInterval`] one grain leaves the upper
//! bulb's outflow corner for the lower bulb's inflow corner, as long as the
//! glass is tilted far enough and the corners allow it.
//!
//! The neck joins cell `(7, 7)` of bulb A to cell `(0, 0)` of bulb B. With
//! `yy > 0` bulb A is up and drains into B; with `yy < 0` it is the other way
//! round.
//!
//! The scheduler is synchronous and never touches hardware except through
//! [`Hourglass::render`]; callers hand it a sample and a timestamp.

use core::fmt;

use rand::RngCore;
use rand::seq::SliceRandom;

use crate::display::Max7219;
use crate::error::Error;
use crate::interface::DisplayInterface;
use crate::layout::project;
use crate::sand::{Bulb8x8, GrainPhysics};
use crate::sensor::Acceleration;
use crate::settings::{ScheduleConfig, TransferInterval};
use crate::time::Ticks;

/// `|yy|` must exceed this for a grain to pass the neck
pub const TRANSFER_TILT_THRESHOLD: f32 = 0.8;

/// Upper bound on cells per bulb the scheduler can fill
const MAX_CELLS: usize = 64;

/// One half of the hourglass
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Bulb {
    /// First bulb, left half of the display; up when `yy > 0`
    A,
    /// Second bulb, right half of the display; up when `yy < 0`
    B,
}

impl Bulb {
    /// The upper bulb for a given orientation
    pub const fn upper(orientation_positive: bool) -> Self {
        if orientation_positive { Bulb::A } else { Bulb::B }
    }

    /// The other bulb
    pub const fn other(self) -> Self {
        match self {
            Bulb::A => Bulb::B,
            Bulb::B => Bulb::A,
        }
    }
}

impl fmt::Display for Bulb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bulb::A => write!(f, "1 (A)"),
            Bulb::B => write!(f, "2 (B)"),
        }
    }
}

/// Timing state of the current run
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScheduleState {
    /// When the next grain may fall; `None` if nothing is ever scheduled
    pub next_transfer_deadline: Option<Ticks>,
    /// Whether bulb A was up at the last tick
    pub orientation_positive: bool,
    /// Grains fallen since the last reset or flip, for progress display
    pub transferred_count: u32,
}

impl Default for ScheduleState {
    fn default() -> Self {
        Self {
            next_transfer_deadline: None,
            orientation_positive: true,
            transferred_count: 0,
        }
    }
}

/// How far the current run has progressed
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Progress {
    /// Grains are still due to fall
    Falling {
        /// 1-based number of the next grain
        next_grain: u32,
        /// Configured grain count
        grain_count: u32,
        /// Time until the next grain is due, 0 if overdue
        remaining_ms: u32,
    },
    /// Every grain has fallen
    RunOut,
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Progress::Falling {
                next_grain,
                grain_count,
                remaining_ms,
            } => write!(
                f,
                "Next grain ({}/{}) falls in: {}.{}s",
                next_grain,
                grain_count,
                remaining_ms / 1000,
                remaining_ms % 1000 / 100
            ),
            Progress::RunOut => write!(f, "Hourglass has run out"),
        }
    }
}

/// The scheduler: both bulbs plus the timing state that moves grains between them
#[derive(Clone, Debug, PartialEq)]
pub struct Hourglass<P = Bulb8x8> {
    config: ScheduleConfig,
    interval: TransferInterval,
    state: ScheduleState,
    bulb_a: P,
    bulb_b: P,
}

impl Default for Hourglass<Bulb8x8> {
    fn default() -> Self {
        Self::new(Bulb8x8::new(), Bulb8x8::new())
    }
}

impl<P: GrainPhysics> Hourglass<P> {
    /// Wrap two bulbs; call [`reset`](Self::reset) before ticking
    pub fn new(bulb_a: P, bulb_b: P) -> Self {
        let config = ScheduleConfig::default();
        Self {
            config,
            interval: config.transfer_interval(),
            state: ScheduleState::default(),
            bulb_a,
            bulb_b,
        }
    }

    /// Rebuild the whole run from `config`
    ///
    /// Empties both bulbs and fills the lower one with `grain_count` grains at
    /// distinct random cells. The lower bulb is taken from `sample`; without a
    /// sample bulb A is assumed to be up. The first transfer is scheduled one
    /// interval after `now`.
    pub fn reset<R>(
        &mut self,
        config: ScheduleConfig,
        sample: Option<Acceleration>,
        now: Ticks,
        rng: &mut R,
    ) where
        R: RngCore + ?Sized,
    {
        self.config = config;
        self.interval = config.transfer_interval();
        match self.interval {
            TransferInterval::Millis(ms) => log::info!(
                "New setting: {} grains, {}s. Interval: {}ms",
                config.grain_count,
                config.duration_seconds,
                ms
            ),
            TransferInterval::Never => log::info!(
                "New setting: {} grains, {}s. Interval: never",
                config.grain_count,
                config.duration_seconds
            ),
        }

        self.bulb_a.clear();
        self.bulb_b.clear();

        let orientation_positive = sample.is_none_or(|accel| accel.bulb_a_up());
        let upper = Bulb::upper(orientation_positive);
        log::info!("Start orientation detected: Bulb {} is on top", upper);

        let lower = self.bulb_mut(upper.other());
        let width = lower.width().max(1);
        let cells = (lower.width() * lower.height()).min(MAX_CELLS);
        let mut indices: [u8; MAX_CELLS] = core::array::from_fn(|i| i as u8);
        let (chosen, _) = indices[..cells].partial_shuffle(rng, config.grain_count as usize);
        for &index in chosen.iter() {
            let index = index as usize;
            lower.set(index % width, index / width, true);
        }

        self.state = ScheduleState {
            next_transfer_deadline: self.deadline_after(now),
            orientation_positive,
            transferred_count: 0,
        };
        log::info!("Hourglass reset with {} grains", self.grain_count());
    }

    /// Advance the run by one tick
    ///
    /// Without a sample (sensor fault) nothing changes. Otherwise this
    /// re-anchors the timer on a flip, moves at most one grain through the
    /// neck if the deadline has passed, then lets both bulbs settle one step.
    ///
    /// Returns whether anything visible changed.
    pub fn tick(&mut self, sample: Option<Acceleration>, now: Ticks) -> bool {
        let Some(accel) = sample else {
            return false;
        };
        let xx = accel.xx();
        let yy = accel.yy();

        let orientation_positive = yy > 0.0;
        if orientation_positive != self.state.orientation_positive {
            self.flip(orientation_positive, now);
        }

        let mut transferred = false;
        if let Some(deadline) = self.state.next_transfer_deadline {
            if now.is_after(deadline) && self.transfer(yy) {
                self.state.next_transfer_deadline = self
                    .interval
                    .as_millis()
                    .map(|ms| deadline.wrapping_add(ms));
                self.state.transferred_count = self.state.transferred_count.saturating_add(1);
                transferred = true;
                log::debug!("Grain {} crossed the neck", self.state.transferred_count);
            }
        }

        let changed_a = self.bulb_a.advance(xx, yy, accel.z);
        let changed_b = self.bulb_b.advance(xx, yy, accel.z);
        transferred || changed_a || changed_b
    }

    /// Draw both bulbs into `display` and push the frame
    pub fn render<I, const N: usize>(&self, display: &mut Max7219<I, N>) -> Result<(), Error<I>>
    where
        I: DisplayInterface,
    {
        display.clear();
        for bulb in [Bulb::A, Bulb::B] {
            let grid = self.bulb(bulb);
            for y in 0..grid.height() {
                for x in 0..grid.width() {
                    if grid.get(x, y) {
                        let (dx, dy) = project(bulb, x as u32, y as u32);
                        display.set_pixel(dx, dy, true);
                    }
                }
            }
        }
        display.push()
    }

    /// Progress of the current run as seen at `now`
    pub fn progress(&self, now: Ticks) -> Progress {
        let grain_count = self.config.grain_count;
        if grain_count.saturating_sub(self.state.transferred_count) == 0 {
            return Progress::RunOut;
        }
        let remaining_ms = self
            .state
            .next_transfer_deadline
            .map_or(0, |deadline| deadline.diff(now).max(0) as u32);
        Progress::Falling {
            next_grain: self.state.transferred_count + 1,
            grain_count,
            remaining_ms,
        }
    }

    /// Active configuration
    pub fn config(&self) -> ScheduleConfig {
        self.config
    }

    /// Interval derived from the active configuration
    pub fn interval(&self) -> TransferInterval {
        self.interval
    }

    /// Timing state
    pub fn state(&self) -> &ScheduleState {
        &self.state
    }

    /// Grid of one bulb
    pub fn bulb(&self, bulb: Bulb) -> &P {
        match bulb {
            Bulb::A => &self.bulb_a,
            Bulb::B => &self.bulb_b,
        }
    }

    /// Grains in both bulbs together
    pub fn grain_count(&self) -> usize {
        self.bulb_a.grain_count() + self.bulb_b.grain_count()
    }

    fn bulb_mut(&mut self, bulb: Bulb) -> &mut P {
        match bulb {
            Bulb::A => &mut self.bulb_a,
            Bulb::B => &mut self.bulb_b,
        }
    }

    fn deadline_after(&self, now: Ticks) -> Option<Ticks> {
        self.interval.as_millis().map(|ms| now.wrapping_add(ms))
    }

    /// Re-anchor timer and progress after the glass was turned over
    fn flip(&mut self, orientation_positive: bool, now: Ticks) {
        let counted = if orientation_positive {
            self.bulb_b.grain_count()
        } else {
            self.bulb_a.grain_count()
        };
        self.state = ScheduleState {
            next_transfer_deadline: self.deadline_after(now),
            orientation_positive,
            transferred_count: counted as u32,
        };
        log::debug!(
            "Flip: bulb {} is now on top, progress at {}",
            Bulb::upper(orientation_positive),
            counted
        );
    }

    /// Move one grain through the neck if tilt and occupancy allow
    fn transfer(&mut self, yy: f32) -> bool {
        let outflow_x = self.bulb_a.width().saturating_sub(1);
        let outflow_y = self.bulb_a.height().saturating_sub(1);
        let a_corner = self.bulb_a.get(outflow_x, outflow_y);
        let b_corner = self.bulb_b.get(0, 0);

        if yy > TRANSFER_TILT_THRESHOLD && a_corner && !b_corner {
            self.bulb_a.set(outflow_x, outflow_y, false);
            self.bulb_b.set(0, 0, true);
            true
        } else if yy < -TRANSFER_TILT_THRESHOLD && b_corner && !a_corner {
            self.bulb_b.set(0, 0, false);
            self.bulb_a.set(outflow_x, outflow_y, true);
            true
        } else {
            false
        }
    }
}
