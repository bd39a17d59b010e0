use embassy_time::Duration;

use crate::parser::ResponseShape;

pub struct Config {
    wifi: WiFiConfig,
    time_service: TimeServiceConfig,
    sync: SyncPolicy,
    tick_period: Duration,
}

impl Config {
    pub fn wifi(&self) -> &WiFiConfig {
        &self.wifi
    }

    pub fn time_service(&self) -> &TimeServiceConfig {
        &self.time_service
    }

    pub fn sync(&self) -> &SyncPolicy {
        &self.sync
    }

    pub fn tick_period(&self) -> Duration {
        self.tick_period
    }

    pub fn with_wifi(mut self, wifi: WiFiConfig) -> Self {
        self.wifi = wifi;
        self
    }

    pub fn with_time_service(mut self, time_service: TimeServiceConfig) -> Self {
        self.time_service = time_service;
        self
    }

    pub fn with_sync(mut self, sync: SyncPolicy) -> Self {
        self.sync = sync;
        self
    }

    pub fn with_tick_period(mut self, tick_period: Duration) -> Self {
        self.tick_period = tick_period;
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            wifi: Default::default(),
            time_service: Default::default(),
            sync: Default::default(),
            tick_period: Duration::from_secs(1),
        }
    }
}

pub struct WiFiConfig {
    ssid: &'static str,
    password: &'static str,
    join_timeout: Duration,
    poll_interval: Duration,
}

impl WiFiConfig {
    pub fn new(ssid: &'static str, password: &'static str) -> Self {
        Self {
            ssid,
            password,
            ..Default::default()
        }
    }

    pub fn ssid(&self) -> &'static str {
        self.ssid
    }

    pub fn password(&self) -> &'static str {
        self.password
    }

    pub fn join_timeout(&self) -> Duration {
        self.join_timeout
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    pub fn with_join_timeout(mut self, join_timeout: Duration) -> Self {
        self.join_timeout = join_timeout;
        self
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }
}

impl Default for WiFiConfig {
    fn default() -> Self {
        Self {
            ssid: match option_env!("SSID") {
                Some(ssid) => ssid,
                None => "devstation-2.4g",
            },
            password: match option_env!("PASSWORD") {
                Some(password) => password,
                None => "",
            },
            join_timeout: Duration::from_secs(20),
            poll_interval: Duration::from_secs(1),
        }
    }
}

pub struct TimeServiceConfig {
    host: &'static str,
    port: u16,
    path_prefix: &'static str,
    fetch_timeout: Duration,
    shape: ResponseShape,
}

impl TimeServiceConfig {
    pub fn host(&self) -> &'static str {
        self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Request path with the timezone identifier appended, e.g. `/api/timezone/` + `Asia/Kolkata`.
    pub fn path_prefix(&self) -> &'static str {
        self.path_prefix
    }

    pub fn fetch_timeout(&self) -> Duration {
        self.fetch_timeout
    }

    pub fn shape(&self) -> ResponseShape {
        self.shape
    }

    pub fn with_host(mut self, host: &'static str, port: u16) -> Self {
        self.host = host;
        self.port = port;
        self
    }

    pub fn with_fetch_timeout(mut self, fetch_timeout: Duration) -> Self {
        self.fetch_timeout = fetch_timeout;
        self
    }

    pub fn with_shape(mut self, shape: ResponseShape) -> Self {
        self.shape = shape;
        self
    }
}

impl Default for TimeServiceConfig {
    fn default() -> Self {
        Self {
            host: "worldtimeapi.org",
            port: 80,
            path_prefix: "/api/timezone/",
            fetch_timeout: Duration::from_secs(10),
            shape: ResponseShape::Datetime,
        }
    }
}

/// How hard the controller tries before it gives up on a synchronisation cycle.
pub struct SyncPolicy {
    max_attempts: u8,
    backoff: Duration,
    max_backoff: Duration,
    failure_hold: Duration,
}

impl SyncPolicy {
    pub fn new(max_attempts: u8, backoff: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff,
            ..Default::default()
        }
    }

    pub fn max_attempts(&self) -> u8 {
        self.max_attempts
    }

    pub fn max_backoff(&self) -> Duration {
        self.max_backoff
    }

    /// How long the error screen stays up before the whole cycle starts over.
    pub fn failure_hold(&self) -> Duration {
        self.failure_hold
    }

    pub fn with_max_backoff(mut self, max_backoff: Duration) -> Self {
        self.max_backoff = max_backoff;
        self
    }

    pub fn with_failure_hold(mut self, failure_hold: Duration) -> Self {
        self.failure_hold = failure_hold;
        self
    }

    /// Delay before retry number `attempt` (1-based), doubling each time up to `max_backoff`.
    pub fn backoff(&self, attempt: u8) -> Duration {
        let shift = u32::from(attempt.saturating_sub(1)).min(16);
        let ticks = self.backoff.as_ticks().saturating_mul(1_u64 << shift);
        Duration::from_ticks(ticks.min(self.max_backoff.as_ticks()))
    }
}

impl Default for SyncPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Duration::from_secs(2),
            max_backoff: Duration::from_secs(30),
            failure_hold: Duration::from_secs(60),
        }
    }
}
