use embassy_time::Duration;
use embedded_hal_async::delay::DelayNs;
use thiserror::Error;

use crate::utils::millis;

/// The WiFi radio as seen by the clock: start joining, ask whether we are online, power down.
#[allow(async_fn_in_trait)]
pub trait Radio {
    type Error: core::fmt::Debug;

    /// Starts association with `ssid`; does not wait for it to finish.
    async fn connect(&mut self, ssid: &str, password: &str) -> Result<(), Self::Error>;

    /// True once associated and holding an IP address.
    fn is_connected(&mut self) -> bool;

    async fn disconnect(&mut self) -> Result<(), Self::Error>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum JoinError {
    #[error("join timeout")]
    Timeout,
    #[error("radio fault")]
    Radio,
}

pub type JoinResult<T> = Result<T, JoinError>;

/// Proof that the radio was powered up for a join. Hand it back to [`NetworkJoin::release`].
#[must_use = "the radio stays powered until the handle is released"]
#[derive(Debug)]
pub struct JoinHandle {
    _private: (),
}

pub struct NetworkJoin<R> {
    radio: R,
}

impl<R: Radio> NetworkJoin<R> {
    pub fn new(radio: R) -> Self {
        Self { radio }
    }

    /// Starts joining `ssid`. On error the radio is already powered down again.
    pub async fn connect(&mut self, ssid: &str, password: &str) -> JoinResult<JoinHandle> {
        log::info!("Joining WiFi network {ssid}");
        if let Err(err) = self.radio.connect(ssid, password).await {
            log::error!("Starting WiFi join failed: {err:?}");
            self.power_down().await;
            return Err(JoinError::Radio);
        }
        Ok(JoinHandle { _private: () })
    }

    /// Polls the radio every `poll_interval` until it reports a connection or `timeout` passes.
    pub async fn await_connected<D: DelayNs>(
        &mut self,
        _handle: &JoinHandle,
        delay: &mut D,
        poll_interval: Duration,
        timeout: Duration,
    ) -> JoinResult<()> {
        let mut waited = Duration::from_ticks(0);
        loop {
            if self.radio.is_connected() {
                log::info!("WiFi connected after {} ms", waited.as_millis());
                return Ok(());
            }
            if waited >= timeout {
                log::error!("WiFi not connected within {} ms", timeout.as_millis());
                return Err(JoinError::Timeout);
            }
            delay.delay_ms(millis(poll_interval)).await;
            waited += poll_interval;
        }
    }

    /// Powers the radio down again.
    pub async fn release(&mut self, handle: JoinHandle) {
        let JoinHandle { _private } = handle;
        self.power_down().await;
    }

    async fn power_down(&mut self) {
        match self.radio.disconnect().await {
            Ok(()) => log::info!("WiFi released"),
            Err(err) => log::warn!("Releasing WiFi failed: {err:?}"),
        }
    }

    pub fn radio(&self) -> &R {
        &self.radio
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use embassy_futures::block_on;

    use super::*;

    /// Reports a connection after `connects_after` polls; `None` never connects.
    #[derive(Debug, Default)]
    pub(crate) struct FakeRadio {
        pub connects_after: Option<u32>,
        pub refuse_connect: bool,
        pub polls: u32,
        pub connects: u32,
        pub disconnects: u32,
    }

    impl Radio for FakeRadio {
        type Error = &'static str;

        async fn connect(&mut self, _ssid: &str, _password: &str) -> Result<(), &'static str> {
            if self.refuse_connect {
                return Err("radio off");
            }
            self.connects += 1;
            self.polls = 0;
            Ok(())
        }

        fn is_connected(&mut self) -> bool {
            let connected = self.connects_after.is_some_and(|after| self.polls >= after);
            self.polls += 1;
            connected
        }

        async fn disconnect(&mut self) -> Result<(), &'static str> {
            self.disconnects += 1;
            Ok(())
        }
    }

    /// Delay that returns at once and keeps count of the time it was asked to wait.
    #[derive(Debug, Default)]
    pub(crate) struct CountingDelay {
        pub waited_ns: u64,
    }

    impl DelayNs for CountingDelay {
        async fn delay_ns(&mut self, ns: u32) {
            self.waited_ns += u64::from(ns);
        }
    }

    impl CountingDelay {
        pub fn waited_ms(&self) -> u64 {
            self.waited_ns / 1_000_000
        }
    }

    #[test]
    fn connects_after_a_few_polls() {
        let mut join = NetworkJoin::new(FakeRadio {
            connects_after: Some(3),
            ..Default::default()
        });
        let mut delay = CountingDelay::default();
        block_on(async {
            let handle = join.connect("ssid", "pw").await.unwrap();
            join.await_connected(&handle, &mut delay, Duration::from_secs(1), Duration::from_secs(10))
                .await
                .unwrap();
            join.release(handle).await;
        });
        assert_eq!(delay.waited_ms(), 3_000);
        assert_eq!(join.radio().connects, 1);
        assert_eq!(join.radio().disconnects, 1);
    }

    #[test]
    fn times_out() {
        let mut join = NetworkJoin::new(FakeRadio::default());
        let mut delay = CountingDelay::default();
        let result = block_on(async {
            let handle = join.connect("ssid", "pw").await.unwrap();
            let result = join
                .await_connected(&handle, &mut delay, Duration::from_millis(500), Duration::from_secs(2))
                .await;
            join.release(handle).await;
            result
        });
        assert_eq!(result, Err(JoinError::Timeout));
        assert_eq!(delay.waited_ms(), 2_000);
        assert_eq!(join.radio().polls, 5);
    }

    #[test]
    fn refused_connect() {
        let mut join = NetworkJoin::new(FakeRadio {
            refuse_connect: true,
            ..Default::default()
        });
        assert_eq!(block_on(join.connect("ssid", "pw")).unwrap_err(), JoinError::Radio);
        assert_eq!(join.radio().connects, 0);
        assert_eq!(join.radio().disconnects, 1);
    }
}
