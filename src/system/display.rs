use core::fmt::{self, Write as _};

use embassy_time::Duration;
use heapless::{String, Vec};

use crate::{error::SyncError, timestamp::CalendarTimestamp, timezone::TimezoneId};

pub const DISPLAY_HEIGHT_PX: u32 = 32;
pub const LEFT_MARGIN_PX: i32 = 1;
pub const TOP_MARGIN_PX: i32 = 1;
pub const NEWLINE_OFFSET_PX: i32 = 8;
pub const MAX_LINES: usize = 4;

/// A frame-buffered text display.
pub trait TextDisplay {
    type Error: fmt::Debug;

    /// Blanks the frame buffer; nothing changes on the panel until [`TextDisplay::flush`].
    fn clear(&mut self);

    /// Draws `text` with its top-left corner at (`x`, `y`) into the frame buffer.
    fn text(&mut self, text: &str, x: i32, y: i32) -> Result<(), Self::Error>;

    fn flush(&mut self) -> Result<(), Self::Error>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayLine {
    pub text: String<32>,
    pub y: i32,
}

pub type Frame = Vec<DisplayLine, MAX_LINES>;

#[derive(Default)]
struct FrameBuilder {
    frame: Frame,
}

impl FrameBuilder {
    /// Adds the next line below the previous one. Text that does not fit is cut short.
    fn line(mut self, args: fmt::Arguments<'_>) -> Self {
        let mut text = String::new();
        let _ = text.write_fmt(args);
        let row = self.frame.len() as i32;
        let _ = self.frame.push(DisplayLine {
            text,
            y: TOP_MARGIN_PX + row * NEWLINE_OFFSET_PX,
        });
        self
    }

    fn build(self) -> Frame {
        self.frame
    }
}

/// City, date, time and free memory, one per line.
pub fn clock_frame(ts: &CalendarTimestamp, label: TimezoneId, free_memory: usize) -> Frame {
    FrameBuilder::default()
        .line(format_args!("{}", label.city()))
        .line(format_args!("date: {}/{}/{}", ts.day, ts.month, ts.year))
        .line(format_args!("time: {}:{}:{}", ts.hour, ts.minute, ts.second))
        .line(format_args!("memory: {free_memory}"))
        .build()
}

pub fn status_frame(label: TimezoneId, status: &str) -> Frame {
    FrameBuilder::default()
        .line(format_args!("{}", label.city()))
        .line(format_args!("{status}"))
        .build()
}

/// Shown when synchronisation gave up, instead of a stale or blank clock.
pub fn error_frame(label: TimezoneId, err: &SyncError, retry_in: Duration) -> Frame {
    FrameBuilder::default()
        .line(format_args!("{}", label.city()))
        .line(format_args!("sync failed"))
        .line(format_args!("{err}"))
        .line(format_args!("retry in {}s", retry_in.as_secs()))
        .build()
}

pub fn show<D: TextDisplay>(display: &mut D, frame: &Frame) -> Result<(), D::Error> {
    display.clear();
    for line in frame {
        display.text(&line.text, LEFT_MARGIN_PX, line.y)?;
    }
    display.flush()
}

pub fn render<D: TextDisplay>(
    display: &mut D,
    ts: &CalendarTimestamp,
    label: TimezoneId,
    free_memory: usize,
) -> Result<(), D::Error> {
    show(display, &clock_frame(ts, label, free_memory))
}
