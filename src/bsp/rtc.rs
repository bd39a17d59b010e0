use chrono::{DateTime, NaiveDateTime};
use esp_hal::rtc_cntl::Rtc;
use world_clock::system::time::RealTimeClock;

/// The chip's low-power timer used as a wall clock. It counts microseconds and keeps running
/// while WiFi is powered down, but not across a power cycle.
pub struct ChipRtc {
    rtc: Rtc<'static>,
}

impl ChipRtc {
    pub fn new(rtc: Rtc<'static>) -> Self {
        Self { rtc }
    }
}

impl RealTimeClock for ChipRtc {
    fn set_datetime(&mut self, datetime: &NaiveDateTime) {
        let micros = datetime.and_utc().timestamp_micros();
        self.rtc.set_current_time_us(u64::try_from(micros).unwrap_or(0));
    }

    fn datetime(&self) -> NaiveDateTime {
        let micros = i64::try_from(self.rtc.current_time_us()).unwrap_or(i64::MAX);
        match DateTime::from_timestamp_micros(micros) {
            Some(t) => t.naive_utc(),
            None => {
                log::error!("RTC value out of range: {micros} us");
                NaiveDateTime::default()
            }
        }
    }
}
