//! Fixed-granularity candidate slots for one business day.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::interval::{expand, sort_intervals, Interval};
use crate::time::TimeOfDay;

/// Atomic slot size, in minutes.
pub const DEFAULT_GRANULARITY: u16 = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlotKind {
    /// Exactly one granularity step long.
    Atomic,
    /// An availability range before expansion.
    Coarse,
}

/// Who a booked slot is assigned to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignee {
    pub user_id: String,
    pub user_name: Option<String>,
    pub user_email: Option<String>,
}

/// An interval on a specific date, as shown to the person booking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    /// `"{date}-{HH:MM}"`, stable for a given date and start.
    pub id: String,
    pub date: NaiveDate,
    pub interval: Interval,
    pub kind: SlotKind,
    pub is_booked: bool,
    pub booking_id: Option<String>,
    pub assignee: Option<Assignee>,
}

impl Slot {
    pub fn new(date: NaiveDate, interval: Interval, kind: SlotKind) -> Self {
        Self {
            id: slot_id(date, interval.start),
            date,
            interval,
            kind,
            is_booked: false,
            booking_id: None,
            assignee: None,
        }
    }

    pub fn mark_booked(&mut self, booking_id: Option<String>, assignee: Option<Assignee>) {
        self.is_booked = true;
        self.booking_id = booking_id;
        self.assignee = assignee;
    }

    pub fn clear_booking(&mut self) {
        self.is_booked = false;
        self.booking_id = None;
        self.assignee = None;
    }
}

pub fn slot_id(date: NaiveDate, start: TimeOfDay) -> String {
    format!("{}-{}", date.format("%Y-%m-%d"), start)
}

/// Walk `[business_start, business_end)` in `granularity`-minute steps.
///
/// A slot is emitted only if it ends at or before `business_end`, so a
/// misaligned window loses its trailing remainder. All slots start unbooked.
/// Deterministic: the same inputs always give the same ordered output.
pub fn generate_slots(
    date: NaiveDate,
    business_start: TimeOfDay,
    business_end: TimeOfDay,
    granularity: u16,
) -> Vec<Slot> {
    let mut intervals = expand(&[Interval::new(business_start, business_end)], granularity);
    sort_intervals(&mut intervals);
    intervals
        .into_iter()
        .map(|interval| Slot::new(date, interval, SlotKind::Atomic))
        .collect()
}
