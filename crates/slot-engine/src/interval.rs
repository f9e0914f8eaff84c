//! Half-open `[start, end)` wall-clock intervals within one calendar day.
//!
//! Expansion splits coarse availability ranges into fixed-size atomic slots;
//! containment is the single test used to decide whether a chosen time may be
//! booked.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SlotError};
use crate::time::{parse_time_of_day, TimeOfDay};

/// A `[start, end)` range of minutes within a single day.
///
/// A well-formed interval has `end > start`. Inverted or zero-length values can
/// still be constructed with [`Interval::new`] (remote data and user input are
/// not trusted), but they never satisfy [`contains`] and are skipped by
/// [`expand`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Interval {
    pub start: TimeOfDay,
    pub end: TimeOfDay,
}

impl Interval {
    pub const fn new(start: TimeOfDay, end: TimeOfDay) -> Self {
        Self { start, end }
    }

    /// Build an interval, rejecting inverted and zero-length ranges.
    pub fn try_new(start: TimeOfDay, end: TimeOfDay) -> Result<Self> {
        if end <= start {
            return Err(SlotError::Format(format!("{start}-{end}")));
        }
        Ok(Self { start, end })
    }

    /// Build from raw minute values. `None` if either is past end of day.
    pub fn from_minutes(start: u16, end: u16) -> Option<Self> {
        Some(Self::new(
            TimeOfDay::from_minutes(start)?,
            TimeOfDay::from_minutes(end)?,
        ))
    }

    /// Parse a pair of wall-clock strings, applying the midnight rollover rule.
    ///
    /// # Errors
    /// `SlotError::Format` if either side fails to parse or the result is empty.
    pub fn from_wall_clock(start: &str, end: &str) -> Result<Self> {
        let interval = Self::new(parse_time_of_day(start)?, parse_time_of_day(end)?);
        let interval = interval.with_midnight_rollover();
        Self::try_new(interval.start, interval.end)
    }

    /// Treat an end of `00:00` as end of day, unless the interval also starts
    /// at `00:00`.
    pub fn with_midnight_rollover(self) -> Self {
        if self.end == TimeOfDay::MIDNIGHT && self.start != TimeOfDay::MIDNIGHT {
            Self::new(self.start, TimeOfDay::END_OF_DAY)
        } else {
            self
        }
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    pub fn duration_minutes(&self) -> u16 {
        self.end.minutes().saturating_sub(self.start.minutes())
    }

    pub fn contains(&self, inner: &Interval) -> bool {
        contains(self, inner)
    }

    /// Adjacent intervals (one ends where the other starts) do not overlap.
    pub fn overlaps(&self, other: &Interval) -> bool {
        self.start < other.end && other.start < self.end
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

/// True iff `inner` lies entirely within `outer`.
///
/// An empty or inverted `inner` is never contained, so callers may pass
/// unchecked user input without a separate guard.
pub fn contains(outer: &Interval, inner: &Interval) -> bool {
    if inner.is_empty() {
        return false;
    }
    inner.start >= outer.start && inner.end <= outer.end
}

/// Split each range into consecutive, non-overlapping pieces of exactly
/// `granularity` minutes.
///
/// A trailing remainder shorter than `granularity` is dropped: partial slots
/// are never offered. Output is de-duplicated by `(start, end)`; callers that
/// need ordering sort it themselves. A zero granularity yields nothing.
pub fn expand(ranges: &[Interval], granularity: u16) -> Vec<Interval> {
    if granularity == 0 {
        return Vec::new();
    }

    let step = u32::from(granularity);
    let mut seen: HashSet<(TimeOfDay, TimeOfDay)> = HashSet::new();
    let mut pieces = Vec::new();

    for range in ranges.iter().filter(|r| !r.is_empty()) {
        let end = u32::from(range.end.minutes());
        let mut cursor = u32::from(range.start.minutes());

        while cursor + step <= end {
            // Both bounds are <= range.end, which is a valid TimeOfDay.
            let piece = Interval::new(minutes(cursor), minutes(cursor + step));
            if seen.insert((piece.start, piece.end)) {
                pieces.push(piece);
            }
            cursor += step;
        }
    }

    pieces
}

/// Sort ascending by start, then end.
pub fn sort_intervals(intervals: &mut [Interval]) {
    intervals.sort_by_key(|i| (i.start, i.end));
}

fn minutes(value: u32) -> TimeOfDay {
    let clamped = u16::try_from(value).unwrap_or(u16::MAX);
    TimeOfDay::from_minutes(clamped).unwrap_or(TimeOfDay::END_OF_DAY)
}
