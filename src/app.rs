//! Application composition
//!
//! [`App`] wires the scheduler to its collaborators: the tilt sensor it samples,
//! the display it renders to, the settings store, a random source for grain
//! placement and the monotonic clock. Every method here is synchronous and
//! runs to completion, so a caller holding the app behind a lock never exposes
//! a half-applied tick, reset or configuration change.

use rand::RngCore;

use crate::control::ControlCommand;
use crate::display::Max7219;
use crate::error::Error;
use crate::hourglass::{Hourglass, Progress};
use crate::interface::DisplayInterface;
use crate::sensor::TiltSensor;
use crate::settings::{ScheduleConfig, SettingsStorage, SettingsStore};
use crate::time::{Monotonic, Ticks};

/// Number of cascaded 8×8 matrices, one per bulb
pub const CHAIN_LENGTH: usize = 2;

/// The display the hourglass renders to
pub type HourglassDisplay<I> = Max7219<I, CHAIN_LENGTH>;

/// The running hourglass and everything it talks to
pub struct App<S, I, St, R, C>
where
    I: DisplayInterface,
{
    hourglass: Hourglass,
    sensor: S,
    display: HourglassDisplay<I>,
    store: SettingsStore<St>,
    rng: R,
    clock: C,
}

impl<S, I, St, R, C> App<S, I, St, R, C>
where
    S: TiltSensor,
    I: DisplayInterface,
    St: SettingsStorage,
    R: RngCore,
    C: Monotonic,
{
    /// Assemble an app; nothing touches hardware until [`start`](Self::start)
    pub fn new(
        sensor: S,
        display: HourglassDisplay<I>,
        store: SettingsStore<St>,
        rng: R,
        clock: C,
    ) -> Self {
        Self {
            hourglass: Hourglass::default(),
            sensor,
            display,
            store,
            rng,
            clock,
        }
    }

    /// Bring up sensor and display, load settings and start the first run
    ///
    /// A sensor that fails to initialise is only logged; ticks treat its
    /// samples as faults until it answers.
    ///
    /// # Errors
    ///
    /// Returns the display error if the chain could not be initialised.
    pub fn start(&mut self) -> Result<(), Error<I>> {
        if let Err(e) = self.sensor.init() {
            log::warn!("Tilt sensor init failed: {:?}", e);
        }
        self.display.init()?;
        let config = self.load_settings();
        self.reset_with(config);
        Ok(())
    }

    /// One tick: sample, advance the scheduler, render if anything changed
    pub fn step(&mut self) -> bool {
        let sample = match self.sensor.sample() {
            Ok(sample) => Some(sample),
            Err(e) => {
                log::debug!("Tilt sample failed: {:?}", e);
                None
            }
        };
        let changed = self.hourglass.tick(sample, self.clock.now());
        if changed {
            self.render();
        }
        changed
    }

    /// Restart the run with the current configuration
    pub fn reset(&mut self) {
        self.reset_with(self.hourglass.config());
    }

    /// Change the grain count (clamped to `1..=60`), persist it and restart
    pub fn set_grain_count(&mut self, grain_count: u32) {
        let config = self.hourglass.config().with_grain_count(grain_count);
        self.apply_config(config);
    }

    /// Change the run time (clamped to `5..=3600` s), persist it and restart
    pub fn set_duration(&mut self, duration_seconds: u32) {
        let config = self.hourglass.config().with_duration(duration_seconds);
        self.apply_config(config);
    }

    /// Carry out a command from the control channel
    pub fn apply(&mut self, command: ControlCommand) {
        match command {
            ControlCommand::SetGrainCount(n) => self.set_grain_count(n),
            ControlCommand::SetDuration(s) => self.set_duration(s),
        }
    }

    /// Blank the display
    pub fn shutdown(&mut self) -> Result<(), Error<I>> {
        self.display.blank()
    }

    /// Progress of the current run
    pub fn progress(&self) -> Progress {
        self.hourglass.progress(self.clock.now())
    }

    /// Current time on the app's clock
    pub fn now(&self) -> Ticks {
        self.clock.now()
    }

    /// Active configuration
    pub fn config(&self) -> ScheduleConfig {
        self.hourglass.config()
    }

    /// The scheduler
    pub fn hourglass(&self) -> &Hourglass {
        &self.hourglass
    }

    /// The display
    pub fn display(&self) -> &HourglassDisplay<I> {
        &self.display
    }

    /// The settings store
    pub fn store(&self) -> &SettingsStore<St> {
        &self.store
    }

    /// The tilt sensor
    pub fn sensor_mut(&mut self) -> &mut S {
        &mut self.sensor
    }

    fn load_settings(&mut self) -> ScheduleConfig {
        match self.store.load() {
            Ok(Some(config)) => {
                log::info!(
                    "Settings loaded: {} grains, {}s",
                    config.grain_count,
                    config.duration_seconds
                );
                return config;
            }
            Ok(None) => log::info!("No stored settings, using defaults"),
            Err(e) => log::warn!("Loading settings failed: {}", e),
        }
        let config = ScheduleConfig::default();
        self.persist(&config);
        config
    }

    fn apply_config(&mut self, config: ScheduleConfig) {
        self.persist(&config);
        self.reset_with(config);
    }

    fn persist(&mut self, config: &ScheduleConfig) {
        match self.store.save(config) {
            Ok(()) => log::info!("Settings saved"),
            Err(e) => log::warn!("Error saving settings: {}", e),
        }
    }

    fn reset_with(&mut self, config: ScheduleConfig) {
        let sample = self.sensor.sample().ok();
        let now = self.clock.now();
        self.hourglass.reset(config, sample, now, &mut self.rng);
        self.render();
    }

    fn render(&mut self) {
        if let Err(e) = self.hourglass.render(&mut self.display) {
            log::warn!("Render failed: {}", e);
        }
    }
}
