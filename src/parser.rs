//! Turns a time-service response into a [`CalendarTimestamp`].
//!
//! Two response fields are understood:
//!
//! * `datetime`: local time as ISO-8601 with a trailing UTC offset, e.g.
//!   `2020-07-04T02:01:46.283707-04:00`. The service already resolved the requested timezone
//!   (including DST), so the offset is validated and then dropped.
//! * `unixtime`: seconds since the Unix epoch. This is UTC; it is rebased onto the device epoch
//!   (2000-01-01) before being split into calendar fields.
//!
//! Which one is used is a configuration choice ([`ResponseShape`]); the parser never falls back
//! from one to the other.

use chrono::{DateTime, TimeDelta};
use thiserror::Error;

use crate::{
    time_service::TimeServiceResponse,
    timestamp::{CalendarTimestamp, UNIX_EPOCH_DIFF},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseShape {
    Datetime,
    Unixtime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("bad datetime")]
    MalformedDatetime,
    #[error("epoch underflow")]
    EpochUnderflow,
    #[error("time out of range")]
    OutOfRange,
    #[error("no {0} field")]
    MissingField(&'static str),
}

pub type ParseResult<T> = Result<T, ParseError>;

pub fn parse(response: &TimeServiceResponse<'_>, shape: ResponseShape) -> ParseResult<CalendarTimestamp> {
    match shape {
        ResponseShape::Datetime => {
            let datetime = response.datetime.ok_or(ParseError::MissingField("datetime"))?;
            parse_datetime(datetime)
        }
        ResponseShape::Unixtime => {
            let unixtime = response.unixtime.ok_or(ParseError::MissingField("unixtime"))?;
            parse_unixtime(unixtime)
        }
    }
}

/// `YYYY-MM-DDTHH:MM:SS[.ffffff]±HH:MM`
pub fn parse_datetime(datetime: &str) -> ParseResult<CalendarTimestamp> {
    let (date, time_and_offset) = datetime
        .split_once('T')
        .ok_or(ParseError::MalformedDatetime)?;
    let (year, month, day) = split3(date, '-')?;

    // The offset sign is the first '+' or '-' after the 'T'; the date's dashes are already gone.
    let sign = time_and_offset
        .find(['+', '-'])
        .ok_or(ParseError::MalformedDatetime)?;
    let (local_time, offset) = (&time_and_offset[..sign], &time_and_offset[sign + 1..]);
    let (offset_hours, offset_minutes) = offset
        .split_once(':')
        .ok_or(ParseError::MalformedDatetime)?;
    number::<u8>(offset_hours)?;
    number::<u8>(offset_minutes)?;

    let (hour, minute, seconds) = split3(local_time, ':')?;
    let second = match seconds.split_once('.') {
        Some((whole, fraction)) => {
            digits(fraction)?;
            whole
        }
        None => seconds,
    };

    CalendarTimestamp::new(
        number(year)?,
        number(month)?,
        number(day)?,
        number(hour)?,
        number(minute)?,
        number(second)?,
    )
    .ok_or(ParseError::OutOfRange)
}

pub fn parse_unixtime(unixtime: i64) -> ParseResult<CalendarTimestamp> {
    let since_device_epoch = unixtime
        .checked_sub(UNIX_EPOCH_DIFF)
        .filter(|seconds| *seconds >= 0)
        .ok_or(ParseError::EpochUnderflow)?;
    let device_epoch = DateTime::from_timestamp(UNIX_EPOCH_DIFF, 0).ok_or(ParseError::OutOfRange)?;
    let datetime = TimeDelta::try_seconds(since_device_epoch)
        .and_then(|delta| device_epoch.checked_add_signed(delta))
        .ok_or(ParseError::OutOfRange)?;
    Ok(CalendarTimestamp::from_naive(&datetime.naive_utc()))
}

fn split3(s: &str, separator: char) -> ParseResult<(&str, &str, &str)> {
    let mut parts = s.split(separator);
    match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(a), Some(b), Some(c), None) => Ok((a, b, c)),
        _ => Err(ParseError::MalformedDatetime),
    }
}

/// Plain decimal digits only; signs, spaces and empty strings are malformed.
fn digits(s: &str) -> ParseResult<&str> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ParseError::MalformedDatetime);
    }
    Ok(s)
}

fn number<T: core::str::FromStr>(s: &str) -> ParseResult<T> {
    digits(s)?.parse().map_err(|_| ParseError::OutOfRange)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn datetime(s: &str) -> ParseResult<CalendarTimestamp> {
        parse(
            &TimeServiceResponse {
                datetime: Some(s),
                unixtime: None,
            },
            ResponseShape::Datetime,
        )
    }

    fn unixtime(u: i64) -> ParseResult<CalendarTimestamp> {
        parse(
            &TimeServiceResponse {
                datetime: None,
                unixtime: Some(u),
            },
            ResponseShape::Unixtime,
        )
    }

    #[test]
    fn iso_negative_offset() {
        // Seconds land in `second`, not `minute`: 02:01:46 is hour 2, minute 1, second 46.
        let ts = datetime("2020-07-04T02:01:46.283707-04:00").unwrap();
        assert_eq!(
            ts,
            CalendarTimestamp {
                year: 2020,
                month: 7,
                day: 4,
                hour: 2,
                minute: 1,
                second: 46,
                weekday: 0,
                subsecond: 0,
            }
        );
    }

    #[test]
    fn iso_positive_offset() {
        let ts = datetime("2023-01-02T03:04:05.999999+05:30").unwrap();
        assert_eq!((ts.year, ts.month, ts.day), (2023, 1, 2));
        assert_eq!((ts.hour, ts.minute, ts.second), (3, 4, 5));
        assert_eq!((ts.weekday, ts.subsecond), (0, 0));
    }

    #[test]
    fn iso_without_fraction() {
        let ts = datetime("2024-02-29T23:59:59+00:00").unwrap();
        assert_eq!((ts.month, ts.day, ts.second), (2, 29, 59));
    }

    #[test]
    fn iso_before_device_epoch() {
        let ts = datetime("1999-12-31T23:59:59.1+01:00").unwrap();
        assert_eq!((ts.year, ts.month, ts.day, ts.second), (1999, 12, 31, 59));
        assert_eq!(ts.device_epoch_seconds(), Some(-1));
    }

    #[test]
    fn iso_field_sweep() {
        for (month, day, hour, minute, second) in [(1, 31, 0, 0, 0), (6, 15, 12, 30, 45), (12, 1, 23, 59, 59)] {
            let mut buf = heapless::String::<40>::new();
            core::fmt::write(
                &mut buf,
                format_args!("2031-{month:02}-{day:02}T{hour:02}:{minute:02}:{second:02}.000001-07:00"),
            )
            .unwrap();
            let ts = datetime(&buf).unwrap();
            assert_eq!(
                (ts.year, ts.month, ts.day, ts.hour, ts.minute, ts.second),
                (2031, month, day, hour, minute, second)
            );
        }
    }

    #[test]
    fn iso_malformed() {
        for input in [
            "2020-07-04",
            "2020-07-04T02:01:46",
            "2020-07T02:01:46.1+01:00",
            "2020-07-04-01T02:01:46.1+01:00",
            "2020-07-04T02:01+01:00",
            "2020-07-04T02:01:46:10+01:00",
            "2020-07-04T02:0a:46.1+01:00",
            "2020-07-04T02:01:46.x+01:00",
            "2020-07-04T02:01:46.1+0100",
            "2020-07-04T02:01:46.1Z",
            "2020-07-04T:01:46.1+01:00",
            "",
        ] {
            assert_eq!(datetime(input), Err(ParseError::MalformedDatetime), "{input}");
        }
    }

    #[test]
    fn iso_out_of_range_is_not_clamped() {
        for input in [
            "2020-13-04T02:01:46.1+01:00",
            "2021-02-29T02:01:46.1+01:00",
            "2020-07-04T24:01:46.1+01:00",
            "2020-07-04T02:60:46.1+01:00",
            "2020-07-04T02:01:60.1+01:00",
            "2020-07-04T999:01:46.1+01:00",
        ] {
            assert_eq!(datetime(input), Err(ParseError::OutOfRange), "{input}");
        }
    }

    #[test]
    fn unixtime_round_trips_to_device_epoch() {
        for u in [946_684_800, 946_684_801, 951_782_400, 1_593_835_200, 1_709_251_199, 4_102_444_800] {
            let ts = unixtime(u).unwrap();
            assert_eq!(ts.device_epoch_seconds(), Some(u - UNIX_EPOCH_DIFF), "{u}");
            assert_eq!((ts.weekday, ts.subsecond), (0, 0));
        }
    }

    #[test]
    fn unixtime_known_dates() {
        let ts = unixtime(1_593_835_200).unwrap();
        assert_eq!(
            (ts.year, ts.month, ts.day, ts.hour, ts.minute, ts.second),
            (2020, 7, 4, 4, 0, 0)
        );
        // 2000-02-29 exists, 2000 being divisible by 400.
        let leap = unixtime(951_782_400).unwrap();
        assert_eq!((leap.year, leap.month, leap.day), (2000, 2, 29));
    }

    #[test]
    fn unixtime_before_device_epoch() {
        assert_eq!(unixtime(946_684_799), Err(ParseError::EpochUnderflow));
        assert_eq!(unixtime(0), Err(ParseError::EpochUnderflow));
        assert_eq!(unixtime(i64::MIN), Err(ParseError::EpochUnderflow));
    }

    #[test]
    fn selected_field_must_be_present() {
        let response = TimeServiceResponse {
            datetime: None,
            unixtime: Some(1_593_835_200),
        };
        assert_eq!(
            parse(&response, ResponseShape::Datetime),
            Err(ParseError::MissingField("datetime"))
        );
        let response = TimeServiceResponse {
            datetime: Some("2020-07-04T02:01:46.283707-04:00"),
            unixtime: None,
        };
        assert_eq!(
            parse(&response, ResponseShape::Unixtime),
            Err(ParseError::MissingField("unixtime"))
        );
    }
}
