//! Bookings and availability windows as reported by the remote service.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::interval::{expand, sort_intervals, Interval};
use crate::slots::{Slot, SlotKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    #[default]
    Scheduled,
    Completed,
    Cancelled,
}

impl BookingStatus {
    /// Whether the booking still occupies its time.
    pub fn is_active(self) -> bool {
        !matches!(self, BookingStatus::Cancelled)
    }

    /// Read a remote status string. Unknown values are treated as scheduled.
    pub fn from_remote(raw: &str) -> Self {
        raw.parse().unwrap_or_default()
    }
}

impl FromStr for BookingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "scheduled" | "booked" | "confirmed" => Ok(BookingStatus::Scheduled),
            "completed" => Ok(BookingStatus::Completed),
            "cancelled" | "canceled" => Ok(BookingStatus::Cancelled),
            other => Err(other.to_string()),
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BookingStatus::Scheduled => "scheduled",
            BookingStatus::Completed => "completed",
            BookingStatus::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

/// A persisted booking. Only `status` and `retry_count` ever change, and only
/// when re-read from the remote service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: String,
    pub date: NaiveDate,
    pub interval: Interval,
    pub status: BookingStatus,
    pub booking_type: String,
    pub booking_source: String,
    /// Server-reported counter, display only.
    pub retry_count: u32,
    pub user_id: String,
    pub user_name: Option<String>,
    pub user_email: Option<String>,
    pub tenant_id: String,
    pub lead_id: String,
    pub student_id: Option<String>,
    pub created_by: String,
    pub timezone: String,
}

/// Coarse availability for one user on one date. Replaced wholesale on every
/// fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityWindow {
    pub user_id: String,
    pub date: NaiveDate,
    pub ranges: Vec<Interval>,
}

impl AvailabilityWindow {
    /// Expand the coarse ranges into sorted atomic intervals.
    pub fn atomic_intervals(&self, granularity: u16) -> Vec<Interval> {
        let mut atomic = expand(&self.ranges, granularity);
        sort_intervals(&mut atomic);
        atomic
    }

    pub fn coarse_slots(&self) -> Vec<Slot> {
        self.ranges
            .iter()
            .map(|range| Slot::new(self.date, *range, SlotKind::Coarse))
            .collect()
    }
}
