//! Network-synchronised world clock.
//!
//! The device joins a WiFi network, asks a time service for the local time of the selected
//! timezone, programs the RTC with it and then redraws date, time and free memory on a small
//! monochrome display once per second. A single button cycles through the supported timezones.
//!
//! Everything in this library is hardware independent: the controller is generic over a small
//! set of capability traits which the firmware binary implements for the real board.
#![cfg_attr(not(test), no_std)]

pub mod config;
pub mod controller;
pub mod error;
pub mod http;
pub mod input;
pub mod network;
pub mod parser;
pub mod system;
pub mod time_service;
pub mod timestamp;
pub mod timezone;
pub mod utils;

pub use config::Config;
pub use controller::{ClockController, ClockState, Devices};
pub use error::SyncError;
pub use timestamp::CalendarTimestamp;
pub use timezone::{TimezoneId, TimezoneRegistry};
