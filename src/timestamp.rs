use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike};

/// Seconds between the Unix epoch and the device epoch (2000-01-01T00:00:00).
pub const UNIX_EPOCH_DIFF: i64 = 946_684_800;

/// A decomposed wall-clock reading as kept by the RTC.
///
/// `weekday` and `subsecond` are not tracked by the device and are always zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarTimestamp {
    pub year: i32,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    pub weekday: u8,
    pub subsecond: u32,
}

impl CalendarTimestamp {
    /// Builds a timestamp, rejecting anything that is not a real calendar instant.
    pub fn new(year: i32, month: u8, day: u8, hour: u8, minute: u8, second: u8) -> Option<Self> {
        let date = NaiveDate::from_ymd_opt(year, month.into(), day.into())?;
        let time = NaiveTime::from_hms_opt(hour.into(), minute.into(), second.into())?;
        Some(Self::from_naive(&date.and_time(time)))
    }

    pub fn from_naive(datetime: &NaiveDateTime) -> Self {
        Self {
            year: datetime.year(),
            month: datetime.month() as u8,
            day: datetime.day() as u8,
            hour: datetime.hour() as u8,
            minute: datetime.minute() as u8,
            second: datetime.second() as u8,
            weekday: 0,
            subsecond: 0,
        }
    }

    pub fn to_naive(&self) -> Option<NaiveDateTime> {
        let date = NaiveDate::from_ymd_opt(self.year, self.month.into(), self.day.into())?;
        let time = NaiveTime::from_hms_opt(self.hour.into(), self.minute.into(), self.second.into())?;
        Some(date.and_time(time))
    }

    /// Seconds since the device epoch, if the fields describe a valid instant.
    pub fn device_epoch_seconds(&self) -> Option<i64> {
        self.to_naive()
            .map(|datetime| datetime.and_utc().timestamp() - UNIX_EPOCH_DIFF)
    }
}
