//! Wall-clock times of day as minutes since midnight.
//!
//! All times handled by the engine are "wall clock" values tied to a single
//! caller-supplied timezone. They are parsed once from `HH:MM` strings and
//! carried as integers from then on; no timezone conversion ever happens here.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SlotError};

/// Minutes in a calendar day.
pub const MINUTES_PER_DAY: u16 = 1440;

/// Minutes since midnight, `0..=1440`.
///
/// `1440` is only ever produced as an interval end and stands for "end of day"
/// (an interval ending at midnight).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TimeOfDay(u16);

impl TimeOfDay {
    pub const MIDNIGHT: TimeOfDay = TimeOfDay(0);
    pub const END_OF_DAY: TimeOfDay = TimeOfDay(MINUTES_PER_DAY);

    /// Returns `None` past the end-of-day sentinel.
    pub const fn from_minutes(minutes: u16) -> Option<Self> {
        if minutes <= MINUTES_PER_DAY {
            Some(TimeOfDay(minutes))
        } else {
            None
        }
    }

    pub const fn from_hm(hour: u16, minute: u16) -> Option<Self> {
        if hour < 24 && minute < 60 {
            Some(TimeOfDay(hour * 60 + minute))
        } else {
            None
        }
    }

    pub const fn minutes(self) -> u16 {
        self.0
    }

    /// Shift forward by `minutes`, or `None` if the result passes end of day.
    pub fn checked_add(self, minutes: u16) -> Option<Self> {
        self.0.checked_add(minutes).and_then(Self::from_minutes)
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let wrapped = self.0 % MINUTES_PER_DAY;
        write!(f, "{:02}:{:02}", wrapped / 60, wrapped % 60)
    }
}

impl FromStr for TimeOfDay {
    type Err = SlotError;

    fn from_str(s: &str) -> Result<Self> {
        parse_time_of_day(s)
    }
}

/// Parse a wall-clock string into minutes since midnight.
///
/// Accepts `HH:MM`, plus the permissive shapes remote records tend to carry:
/// `HH:MM:SS` and full ISO timestamps such as `2026-03-16T10:00:00Z`. For the
/// latter the part after `T` is used; in every case only the first five
/// characters are read.
///
/// # Errors
/// Returns `SlotError::Format` when either component is missing, non-numeric,
/// or out of range (hour 0-23, minute 0-59).
pub fn parse_time_of_day(s: &str) -> Result<TimeOfDay> {
    let trimmed = s.trim();
    let clock = match trimmed.split_once('T') {
        Some((_, rest)) => rest,
        None => trimmed,
    };
    let clock: String = clock.chars().take(5).collect();

    let (hour, minute) = clock
        .split_once(':')
        .ok_or_else(|| SlotError::Format(s.to_string()))?;
    let hour = parse_component(hour).ok_or_else(|| SlotError::Format(s.to_string()))?;
    let minute = parse_component(minute).ok_or_else(|| SlotError::Format(s.to_string()))?;

    TimeOfDay::from_hm(hour, minute).ok_or_else(|| SlotError::Format(s.to_string()))
}

/// Zero-padded `HH:MM`. The end-of-day sentinel renders as `00:00`.
pub fn format_time_of_day(t: TimeOfDay) -> String {
    t.to_string()
}

fn parse_component(part: &str) -> Option<u16> {
    if part.is_empty() || part.len() > 2 || !part.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    part.parse().ok()
}

/// Parse an ISO `YYYY-MM-DD` calendar date.
pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| SlotError::InvalidDate(s.to_string()))
}

/// Check that `timezone` names an IANA zone.
///
/// The engine never converts between zones; the name is only passed through
/// to the remote service, so it is rejected early rather than at the backend.
pub fn validate_timezone(timezone: &str) -> Result<Tz> {
    timezone
        .parse()
        .map_err(|_| SlotError::InvalidTimezone(timezone.to_string()))
}
