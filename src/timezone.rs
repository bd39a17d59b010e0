use core::fmt;

use heapless::String;

/// A `Region/City` identifier as understood by the time service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimezoneId(&'static str);

impl TimezoneId {
    pub const fn new(id: &'static str) -> Self {
        Self(id)
    }

    pub fn as_str(&self) -> &'static str {
        self.0
    }

    /// City part of the identifier with underscores turned into spaces: `America/New_York` -> `New York`.
    pub fn city(&self) -> String<32> {
        let city = self.0.rsplit('/').next().unwrap_or(self.0);
        let mut label = String::new();
        for c in city.chars() {
            if label.push(if c == '_' { ' ' } else { c }).is_err() {
                break;
            }
        }
        label
    }
}

impl fmt::Display for TimezoneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

pub const SUPPORTED_TIMEZONES: [TimezoneId; 3] = [
    TimezoneId::new("America/New_York"),
    TimezoneId::new("Asia/Kolkata"),
    TimezoneId::new("Europe/Rome"),
];

/// The compiled-in timezone list and the one currently shown.
#[derive(Debug)]
pub struct TimezoneRegistry {
    zones: &'static [TimezoneId],
    index: usize,
}

impl TimezoneRegistry {
    /// Returns `None` for an empty list so that `current` can never fail.
    pub fn new(zones: &'static [TimezoneId]) -> Option<Self> {
        if zones.is_empty() {
            None
        } else {
            Some(Self { zones, index: 0 })
        }
    }

    pub fn current(&self) -> TimezoneId {
        self.zones[self.index]
    }

    pub fn advance(&mut self) -> TimezoneId {
        self.index = (self.index + 1) % self.zones.len();
        log::info!("Timezone switched to {}", self.current());
        self.current()
    }

    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }
}

impl Default for TimezoneRegistry {
    fn default() -> Self {
        Self {
            zones: &SUPPORTED_TIMEZONES,
            index: 0,
        }
    }
}
