//! Cooperative task bodies
//!
//! The board spawns four tasks that share one [`App`] behind an async mutex:
//!
//! - [`tick_loop`]: sample, tick and render every 20 ms, until stopped
//! - [`peripheral_task`]: advertise, push the current settings to each new
//!   peer, wait for it to leave
//! - [`config_listener`] (twice): apply the peer's writes to one value
//!
//! Every unit of work on the app ([`App::step`], [`App::apply`], ...) is
//! synchronous and runs with the lock held, so no task can observe another
//! task's change half done. Tasks only yield between units of work.
//!
//! ## Example
//!
//! ```rust,ignore
//! static APP: StaticCell<SharedApp<CriticalSectionRawMutex, ...>> = StaticCell::new();
//! static STOP: StopSignal<CriticalSectionRawMutex> = Signal::new();
//!
//! let app = APP.init(Mutex::new(app));
//! join4(
//!     tick_loop(app, &mut Delay, &STOP),
//!     peripheral_task(app, &mut link, &mut Delay),
//!     config_listener(app, ConfigField::GrainCount, &mut grain_writes, &mut Delay),
//!     config_listener(app, ConfigField::Duration, &mut duration_writes, &mut Delay),
//! )
//! .await;
//! ```

use embassy_futures::select::{Either, select};
use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::mutex::Mutex;
use embassy_sync::signal::Signal;
use embedded_hal_async::delay::DelayNs;
use rand::RngCore;

use crate::app::App;
use crate::control::{
    ConfigField, ConfigWrites, ControlLink, WRITE_BUF_LEN, decode_u32_le, encode_u32_le,
};
use crate::error::Error;
use crate::interface::DisplayInterface;
use crate::sensor::TiltSensor;
use crate::settings::SettingsStorage;
use crate::time::{Monotonic, Ticks};

/// Period of the tick loop
pub const TICK_PERIOD_MS: u32 = 20;
/// Minimum time between two progress log lines
pub const PROGRESS_LOG_PERIOD_MS: u32 = 250;
/// Back-off after a connection cycle failed
pub const ADVERTISE_BACKOFF_MS: u32 = 2000;
/// Back-off after a failed or truncated write
pub const LISTENER_BACKOFF_MS: u32 = 100;
/// Gap between the two values pushed to a new peer
pub const PUSH_GAP_MS: u32 = 50;

/// The app as shared between tasks
pub type SharedApp<M, S, I, St, R, C> = Mutex<M, App<S, I, St, R, C>>;

/// Raised once to stop the tick loop
pub type StopSignal<M> = Signal<M, ()>;

/// Tick the app every [`TICK_PERIOD_MS`] until `stop` is raised, then blank the display
///
/// A progress line is logged at most every [`PROGRESS_LOG_PERIOD_MS`].
pub async fn tick_loop<M, SM, S, I, St, R, C, D>(
    app: &SharedApp<M, S, I, St, R, C>,
    delay: &mut D,
    stop: &StopSignal<SM>,
) -> Result<(), Error<I>>
where
    M: RawMutex,
    SM: RawMutex,
    S: TiltSensor,
    I: DisplayInterface,
    St: SettingsStorage,
    R: RngCore,
    C: Monotonic,
    D: DelayNs,
{
    let mut last_report: Option<Ticks> = None;
    loop {
        {
            let mut app = app.lock().await;
            app.step();
            let now = app.now();
            if last_report.is_none_or(|at| now.diff(at) > PROGRESS_LOG_PERIOD_MS as i32) {
                log::info!("{}", app.progress());
                last_report = Some(now);
            }
        }

        if let Either::First(()) = select(stop.wait(), delay.delay_ms(TICK_PERIOD_MS)).await {
            break;
        }
    }

    log::info!("Stopping, clearing display");
    shutdown(app).await
}

/// Serve peers forever: on each connection push both values, then wait for disconnect
///
/// Link faults are logged and retried after [`ADVERTISE_BACKOFF_MS`].
pub async fn peripheral_task<M, S, I, St, R, C, L, D>(
    app: &SharedApp<M, S, I, St, R, C>,
    link: &mut L,
    delay: &mut D,
) where
    M: RawMutex,
    S: TiltSensor,
    I: DisplayInterface,
    St: SettingsStorage,
    R: RngCore,
    C: Monotonic,
    L: ControlLink,
    D: DelayNs,
{
    log::info!("Starting control channel");
    loop {
        if let Err(e) = serve_connection(app, link, delay).await {
            log::warn!("Error in control channel: {:?}", e);
            delay.delay_ms(ADVERTISE_BACKOFF_MS).await;
        }
    }
}

async fn serve_connection<M, S, I, St, R, C, L, D>(
    app: &SharedApp<M, S, I, St, R, C>,
    link: &mut L,
    delay: &mut D,
) -> Result<(), L::Error>
where
    M: RawMutex,
    S: TiltSensor,
    I: DisplayInterface,
    St: SettingsStorage,
    R: RngCore,
    C: Monotonic,
    L: ControlLink,
    D: DelayNs,
{
    link.accept().await?;
    log::info!("Connection established, sending current settings");

    let config = app.lock().await.config();
    link.publish(ConfigField::GrainCount, encode_u32_le(config.grain_count)).await?;
    delay.delay_ms(PUSH_GAP_MS).await;
    link.publish(ConfigField::Duration, encode_u32_le(config.duration_seconds)).await?;
    log::info!("Current settings sent");

    link.disconnected().await?;
    log::info!("Connection lost");
    Ok(())
}

/// Apply every write to `field` forever
///
/// Payloads of any length are applied, clamped by the app. Transport faults
/// and payloads longer than [`WRITE_BUF_LEN`] are logged and followed by a
/// [`LISTENER_BACKOFF_MS`] pause.
pub async fn config_listener<M, S, I, St, R, C, W, D>(
    app: &SharedApp<M, S, I, St, R, C>,
    field: ConfigField,
    writes: &mut W,
    delay: &mut D,
) where
    M: RawMutex,
    S: TiltSensor,
    I: DisplayInterface,
    St: SettingsStorage,
    R: RngCore,
    C: Monotonic,
    W: ConfigWrites,
    D: DelayNs,
{
    let mut buf = [0u8; WRITE_BUF_LEN];
    loop {
        let len = match writes.written(&mut buf).await {
            Ok(len) => len,
            Err(e) => {
                log::warn!("Reading {} write failed: {:?}", field, e);
                delay.delay_ms(LISTENER_BACKOFF_MS).await;
                continue;
            }
        };
        let Some(data) = buf.get(..len) else {
            log::warn!("Ignoring {} write: {} bytes, truncated", field, len);
            delay.delay_ms(LISTENER_BACKOFF_MS).await;
            continue;
        };
        let value = decode_u32_le(data);
        log::info!("Received new {}: {}", field, value);
        app.lock().await.apply(field.command(value));
    }
}

/// Blank the display
pub async fn shutdown<M, S, I, St, R, C>(app: &SharedApp<M, S, I, St, R, C>) -> Result<(), Error<I>>
where
    M: RawMutex,
    S: TiltSensor,
    I: DisplayInterface,
    St: SettingsStorage,
    R: RngCore,
    C: Monotonic,
{
    app.lock().await.shutdown()
}
