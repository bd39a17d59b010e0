use chrono::{NaiveDateTime, Timelike};
use embassy_time::Duration;

use crate::timestamp::CalendarTimestamp;

/// A free-running wall clock which can be set and read back.
pub trait RealTimeClock {
    fn set_datetime(&mut self, datetime: &NaiveDateTime);

    /// Current value, advanced by whatever time passed since it was set.
    fn datetime(&self) -> NaiveDateTime;
}

/// The RTC holding local time for the selected timezone.
pub struct ClockStore<T> {
    rtc: T,
}

impl<T: RealTimeClock> ClockStore<T> {
    pub fn new(rtc: T) -> Self {
        Self { rtc }
    }

    pub fn program(&mut self, ts: &CalendarTimestamp) {
        match ts.to_naive() {
            Some(datetime) => {
                log::info!("Setting RTC to {datetime}");
                self.rtc.set_datetime(&datetime);
            }
            None => log::error!("Refusing to program RTC with invalid time {ts:?}"),
        }
    }

    pub fn read(&self) -> CalendarTimestamp {
        self.read_with_fraction().0
    }

    /// The current reading plus how far the RTC already is into that second.
    pub fn read_with_fraction(&self) -> (CalendarTimestamp, Duration) {
        let datetime = self.rtc.datetime();
        log::debug!("Time read from RTC: {datetime}");
        let fraction = Duration::from_micros(u64::from(datetime.nanosecond() % 1_000_000_000) / 1_000);
        (CalendarTimestamp::from_naive(&datetime), fraction)
    }

    pub fn rtc(&self) -> &T {
        &self.rtc
    }
}
