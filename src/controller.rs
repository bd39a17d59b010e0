//! The clock's main loop.
//!
//! ```text
//! Booting -> JoiningNetwork -> Syncing -> Displaying --(button)--> JoiningNetwork -> ...
//!                 ^   |            |
//!                 |   +--(fail)----+--> retry with backoff, or Failed once attempts run out
//!                 +---------------------- Failed (error screen held, then start over)
//! ```
//!
//! A button press while displaying selects the next timezone and goes through the whole
//! join/fetch/program cycle again so the RTC holds that zone's local time.

use embedded_hal::digital::InputPin;
use embedded_hal_async::delay::DelayNs;

use crate::{
    config::Config,
    error::SyncError,
    http::TcpConnector,
    input::InputWatcher,
    network::{JoinHandle, NetworkJoin, Radio},
    parser,
    system::{
        display::{self, Frame, TextDisplay},
        time::{ClockStore, RealTimeClock},
    },
    time_service::TimeServiceClient,
    timezone::{TimezoneId, TimezoneRegistry},
    utils::millis,
};

#[derive(Debug)]
pub enum ClockState {
    Booting,
    JoiningNetwork,
    /// Online; the handle is released once the fetch is done, whatever its outcome.
    Syncing(JoinHandle),
    Displaying,
    /// Every attempt failed; the error screen is up until the next cycle.
    Failed(SyncError),
}

/// Hardware the controller drives. Built once at boot and owned for the device's lifetime.
pub struct Devices<R, N, T, P, S, D> {
    pub radio: R,
    pub connector: N,
    pub rtc: T,
    pub button: P,
    pub screen: S,
    pub delay: D,
    pub free_memory: fn() -> usize,
}

pub struct ClockController<R, N, T, P, S, D> {
    config: &'static Config,
    network: NetworkJoin<R>,
    time_service: TimeServiceClient<N>,
    clock: ClockStore<T>,
    input: InputWatcher<P>,
    screen: S,
    delay: D,
    free_memory: fn() -> usize,
    timezones: TimezoneRegistry,
    state: ClockState,
    attempt: u8,
}

impl<R, N, T, P, S, D> ClockController<R, N, T, P, S, D>
where
    R: Radio,
    N: TcpConnector,
    T: RealTimeClock,
    P: InputPin,
    S: TextDisplay,
    D: DelayNs,
{
    pub fn new(
        config: &'static Config,
        timezones: TimezoneRegistry,
        devices: Devices<R, N, T, P, S, D>,
    ) -> Self {
        Self {
            config,
            network: NetworkJoin::new(devices.radio),
            time_service: TimeServiceClient::new(devices.connector, config.time_service()),
            clock: ClockStore::new(devices.rtc),
            input: InputWatcher::new(devices.button),
            screen: devices.screen,
            delay: devices.delay,
            free_memory: devices.free_memory,
            timezones,
            state: ClockState::Booting,
            attempt: 0,
        }
    }

    pub fn state(&self) -> &ClockState {
        &self.state
    }

    pub fn timezone(&self) -> TimezoneId {
        self.timezones.current()
    }

    pub async fn run(&mut self) -> ! {
        loop {
            self.step().await;
        }
    }

    /// Performs the work of the current state and moves to the next one.
    pub async fn step(&mut self) {
        let state = core::mem::replace(&mut self.state, ClockState::Booting);
        self.state = match state {
            ClockState::Booting => {
                log::info!("Clock booting, timezone {}", self.timezones.current());
                ClockState::JoiningNetwork
            }
            ClockState::JoiningNetwork => self.join().await,
            ClockState::Syncing(handle) => self.sync(handle).await,
            ClockState::Displaying => self.tick().await,
            ClockState::Failed(err) => self.hold_failure(err).await,
        };
    }

    async fn join(&mut self) -> ClockState {
        self.attempt = self.attempt.saturating_add(1);
        let timezone = self.timezones.current();
        self.show(&display::status_frame(timezone, "connecting..."));

        let wifi = self.config.wifi();
        let handle = match self.network.connect(wifi.ssid(), wifi.password()).await {
            Ok(handle) => handle,
            Err(err) => return self.attempt_failed(err.into()).await,
        };
        match self
            .network
            .await_connected(&handle, &mut self.delay, wifi.poll_interval(), wifi.join_timeout())
            .await
        {
            Ok(()) => ClockState::Syncing(handle),
            Err(err) => {
                self.network.release(handle).await;
                self.attempt_failed(err.into()).await
            }
        }
    }

    async fn sync(&mut self, handle: JoinHandle) -> ClockState {
        let timezone = self.timezones.current();
        let shape = self.config.time_service().shape();
        let result = match self.time_service.fetch(timezone).await {
            Ok(response) => parser::parse(&response, shape).map_err(SyncError::from),
            Err(err) => Err(err.into()),
        };

        match result {
            Ok(ts) => {
                self.clock.program(&ts);
                self.network.release(handle).await;
                log::info!("Synchronised {timezone} after {} attempt(s)", self.attempt);
                self.attempt = 0;
                ClockState::Displaying
            }
            Err(err) => {
                self.network.release(handle).await;
                self.attempt_failed(err).await
            }
        }
    }

    async fn attempt_failed(&mut self, err: SyncError) -> ClockState {
        let policy = self.config.sync();
        if self.attempt < policy.max_attempts() {
            let backoff = policy.backoff(self.attempt);
            log::warn!(
                "Sync attempt {}/{} failed: {err}, retrying in {} ms",
                self.attempt,
                policy.max_attempts(),
                backoff.as_millis()
            );
            self.delay.delay_ms(millis(backoff)).await;
            ClockState::JoiningNetwork
        } else {
            log::error!("Sync failed after {} attempt(s): {err}", self.attempt);
            self.attempt = 0;
            ClockState::Failed(err)
        }
    }

    async fn tick(&mut self) -> ClockState {
        if self.input.pressed() {
            let timezone = self.timezones.advance();
            log::info!("Button pressed, resyncing for {timezone}");
            return ClockState::JoiningNetwork;
        }

        let (ts, into_second) = self.clock.read_with_fraction();
        if let Err(err) = display::render(&mut self.screen, &ts, self.timezones.current(), (self.free_memory)()) {
            log::error!("Failed to display: {err:?}");
        }

        // Wake on the next second boundary.
        let period = self.config.tick_period();
        let wait = period
            .checked_sub(into_second)
            .filter(|wait| wait.as_ticks() > 0)
            .unwrap_or(period);
        self.delay.delay_ms(millis(wait)).await;
        ClockState::Displaying
    }

    /// Keeps the error screen up for the configured hold, counting down once per tick.
    async fn hold_failure(&mut self, err: SyncError) -> ClockState {
        let tick = self.config.tick_period();
        let mut remaining = self.config.sync().failure_hold();
        loop {
            if self.input.pressed() {
                let timezone = self.timezones.advance();
                log::info!("Button pressed, retrying for {timezone}");
                return ClockState::JoiningNetwork;
            }
            self.show(&display::error_frame(self.timezones.current(), &err, remaining));
            self.delay.delay_ms(millis(tick.min(remaining))).await;
            remaining = remaining.checked_sub(tick).unwrap_or_default();
            if remaining.as_ticks() == 0 {
                return ClockState::JoiningNetwork;
            }
        }
    }

    fn show(&mut self, frame: &Frame) {
        if let Err(err) = display::show(&mut self.screen, frame) {
            log::error!("Failed to display: {err:?}");
        }
    }
}
