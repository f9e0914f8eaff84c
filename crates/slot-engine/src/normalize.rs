//! Normalization of loosely-typed remote records into canonical shapes.
//!
//! The bookings and availability endpoints have used several field names for
//! the same value over time. Each logical field is read through an ordered
//! list of [`Extractor`]s; the first one that yields a value wins. Records
//! that cannot produce a valid interval are dropped, never treated as fatal.

use chrono::NaiveDate;
use serde_json::Value;
use tracing::debug;

use crate::booking::{Booking, BookingStatus};
use crate::interval::Interval;
use crate::slots::slot_id;
use crate::time::{parse_date, parse_time_of_day};

/// One way of reading a field out of a JSON record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extractor {
    /// A top-level key whose value is a string.
    Text(&'static str),
    /// A top-level key whose value is a number or a numeric string.
    Number(&'static str),
}

impl Extractor {
    pub fn extract_text<'a>(&self, record: &'a Value) -> Option<&'a str> {
        match self {
            Extractor::Text(key) => record
                .get(key)
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty()),
            Extractor::Number(_) => None,
        }
    }

    pub fn extract_number(&self, record: &Value) -> Option<u64> {
        match self {
            Extractor::Number(key) => match record.get(key)? {
                Value::Number(n) => n.as_u64(),
                Value::String(s) => s.trim().parse().ok(),
                _ => None,
            },
            Extractor::Text(_) => None,
        }
    }
}

use Extractor::{Number, Text};

pub const START_EXTRACTORS: &[Extractor] = &[
    Text("start"),
    Text("startTime"),
    Text("start_time"),
    Text("scheduled_at"),
];

pub const END_EXTRACTORS: &[Extractor] = &[
    Text("end"),
    Text("endTime"),
    Text("end_time"),
    Text("ends_at"),
];

pub const DURATION_EXTRACTORS: &[Extractor] = &[
    Number("durationMinutes"),
    Number("duration_minutes"),
    Number("duration"),
];

pub const ID_EXTRACTORS: &[Extractor] = &[Text("id"), Text("_id"), Text("bookingId")];
pub const DATE_EXTRACTORS: &[Extractor] = &[Text("date"), Text("bookingDate")];
pub const STATUS_EXTRACTORS: &[Extractor] = &[Text("status")];
pub const BOOKING_TYPE_EXTRACTORS: &[Extractor] = &[Text("bookingType"), Text("booking_type")];
pub const BOOKING_SOURCE_EXTRACTORS: &[Extractor] =
    &[Text("bookingSource"), Text("booking_source")];
pub const RETRY_COUNT_EXTRACTORS: &[Extractor] = &[Number("retryCount"), Number("retry_count")];
pub const USER_ID_EXTRACTORS: &[Extractor] = &[
    Text("userId"),
    Text("user_id"),
    Text("assignedUserId"),
    Text("counsellorId"),
];
pub const USER_NAME_EXTRACTORS: &[Extractor] = &[Text("userName"), Text("user_name")];
pub const USER_EMAIL_EXTRACTORS: &[Extractor] = &[Text("userEmail"), Text("user_email")];
pub const TENANT_ID_EXTRACTORS: &[Extractor] = &[Text("tenantId"), Text("tenant_id")];
pub const LEAD_ID_EXTRACTORS: &[Extractor] = &[
    Text("leadId"),
    Text("lead_id"),
    Text("studentId"),
    Text("student_id"),
];
pub const STUDENT_ID_EXTRACTORS: &[Extractor] = &[Text("studentId"), Text("student_id")];
pub const CREATED_BY_EXTRACTORS: &[Extractor] = &[Text("createdBy"), Text("created_by")];
pub const TIMEZONE_EXTRACTORS: &[Extractor] = &[Text("timezone"), Text("timeZone")];

pub fn first_text<'a>(record: &'a Value, extractors: &[Extractor]) -> Option<&'a str> {
    extractors.iter().find_map(|e| e.extract_text(record))
}

pub fn first_number(record: &Value, extractors: &[Extractor]) -> Option<u64> {
    extractors.iter().find_map(|e| e.extract_number(record))
}

/// Read a record's start/end into an [`Interval`].
///
/// The end may also come from a duration field when no end alias is present.
/// Returns `None` for missing, unparseable, or empty ranges.
pub fn normalize_interval(record: &Value) -> Option<Interval> {
    let start = parse_time_of_day(first_text(record, START_EXTRACTORS)?).ok()?;

    let end = match first_text(record, END_EXTRACTORS) {
        Some(raw) => parse_time_of_day(raw).ok()?,
        None => {
            let duration = first_number(record, DURATION_EXTRACTORS)?;
            start.checked_add(u16::try_from(duration).ok()?)?
        }
    };

    let interval = Interval::new(start, end).with_midnight_rollover();
    Interval::try_new(interval.start, interval.end).ok()
}

/// Normalize every record, silently dropping the ones that fail.
pub fn normalize_intervals(records: &[Value]) -> Vec<Interval> {
    records
        .iter()
        .filter_map(|record| {
            let interval = normalize_interval(record);
            if interval.is_none() {
                debug!(%record, "dropping record without a usable start/end");
            }
            interval
        })
        .collect()
}

/// Read a full booking record.
///
/// Requires a usable interval; every other field falls back to a default. A
/// record without an id gets the `"{date}-{HH:MM}"` id of its slot. The date comes from an explicit date field, else the date part of
/// an ISO start timestamp, else `fallback_date`.
pub fn normalize_booking(record: &Value, fallback_date: NaiveDate) -> Option<Booking> {
    let Some(interval) = normalize_interval(record) else {
        debug!(%record, "dropping booking without a usable start/end");
        return None;
    };
    let date = booking_date(record).unwrap_or(fallback_date);
    let id = first_text(record, ID_EXTRACTORS)
        .map_or_else(|| slot_id(date, interval.start), str::to_string);

    let text = |extractors: &[Extractor]| first_text(record, extractors).map(str::to_string);

    Some(Booking {
        id,
        date,
        interval,
        status: first_text(record, STATUS_EXTRACTORS)
            .map(BookingStatus::from_remote)
            .unwrap_or_default(),
        booking_type: text(BOOKING_TYPE_EXTRACTORS).unwrap_or_default(),
        booking_source: text(BOOKING_SOURCE_EXTRACTORS).unwrap_or_default(),
        retry_count: first_number(record, RETRY_COUNT_EXTRACTORS)
            .and_then(|n| u32::try_from(n).ok())
            .unwrap_or(0),
        user_id: text(USER_ID_EXTRACTORS).unwrap_or_default(),
        user_name: text(USER_NAME_EXTRACTORS),
        user_email: text(USER_EMAIL_EXTRACTORS),
        tenant_id: text(TENANT_ID_EXTRACTORS).unwrap_or_default(),
        lead_id: text(LEAD_ID_EXTRACTORS).unwrap_or_default(),
        student_id: text(STUDENT_ID_EXTRACTORS),
        created_by: text(CREATED_BY_EXTRACTORS).unwrap_or_default(),
        timezone: text(TIMEZONE_EXTRACTORS).unwrap_or_default(),
    })
}

pub fn normalize_bookings(records: &[Value], fallback_date: NaiveDate) -> Vec<Booking> {
    records
        .iter()
        .filter_map(|record| normalize_booking(record, fallback_date))
        .collect()
}

fn booking_date(record: &Value) -> Option<NaiveDate> {
    if let Some(raw) = first_text(record, DATE_EXTRACTORS) {
        let day = raw.split_once('T').map_or(raw, |(day, _)| day);
        return parse_date(day).ok();
    }
    let start = first_text(record, START_EXTRACTORS)?;
    let (day, _) = start.split_once('T')?;
    parse_date(day).ok()
}

