//! Tests for remote record normalization.

use chrono::NaiveDate;
use serde_json::json;
use slot_engine::normalize::{first_text, Extractor, START_EXTRACTORS};
use slot_engine::{normalize_booking, normalize_bookings, normalize_interval, normalize_intervals, BookingStatus, Interval};

fn iv(start: &str, end: &str) -> Interval {
    Interval::from_wall_clock(start, end).unwrap()
}

fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 16).unwrap()
}

// ── Intervals ───────────────────────────────────────────────────────────────

#[test]
fn every_start_and_end_alias_is_understood() {
    let records = [
        json!({"start": "10:00", "end": "11:00"}),
        json!({"startTime": "10:00", "endTime": "11:00"}),
        json!({"start_time": "10:00:00", "end_time": "11:00:00"}),
        json!({"scheduled_at": "2026-03-16T10:00:00Z", "ends_at": "2026-03-16T11:00:00Z"}),
    ];
    for record in &records {
        assert_eq!(normalize_interval(record), Some(iv("10:00", "11:00")), "{record}");
    }
}

#[test]
fn aliases_are_tried_in_order() {
    let record = json!({"startTime": "08:00", "start": "09:00", "end": "10:00"});
    assert_eq!(normalize_interval(&record), Some(iv("09:00", "10:00")));
    assert_eq!(first_text(&record, START_EXTRACTORS), Some("09:00"));
}

#[test]
fn empty_string_alias_falls_through_to_the_next() {
    let record = json!({"start": "", "startTime": "09:00", "end": "09:15"});
    assert_eq!(normalize_interval(&record), Some(iv("09:00", "09:15")));
}

#[test]
fn end_can_come_from_duration() {
    let record = json!({"start": "09:00", "durationMinutes": 30});
    assert_eq!(normalize_interval(&record), Some(iv("09:00", "09:30")));
    let record = json!({"start": "09:00", "duration": "45"});
    assert_eq!(normalize_interval(&record), Some(iv("09:00", "09:45")));
}

#[test]
fn midnight_end_is_end_of_day() {
    let record = json!({"start": "23:00", "end": "00:00"});
    assert_eq!(normalize_interval(&record).map(|i| i.end.minutes()), Some(1440));
}

#[test]
fn unusable_records_are_dropped_not_fatal() {
    let records = vec![
        json!({"start": "10:00", "end": "11:00"}),
        json!({"start": "10:00"}),
        json!({"end": "11:00"}),
        json!({"start": "ten", "end": "11:00"}),
        json!({"start": "11:00", "end": "10:00"}),
        json!({"start": 1000, "end": 1100}),
        json!("10:00-11:00"),
    ];
    assert_eq!(normalize_intervals(&records), vec![iv("10:00", "11:00")]);
}

#[test]
fn number_extractor_ignores_text_values() {
    let record = json!({"retryCount": "3", "status": "x"});
    assert_eq!(Extractor::Number("retryCount").extract_number(&record), Some(3));
    assert_eq!(Extractor::Number("status").extract_number(&record), None);
    assert_eq!(Extractor::Text("retryCount").extract_number(&record), None);
}

// ── Bookings ────────────────────────────────────────────────────────────────

#[test]
fn full_camel_case_booking() {
    let record = json!({
        "id": "bk-1",
        "date": "2026-03-17",
        "startTime": "10:15",
        "endTime": "10:30",
        "status": "SCHEDULED",
        "bookingType": "consultation",
        "bookingSource": "user_ui",
        "retryCount": 2,
        "userId": "u-9",
        "userName": "Sam",
        "userEmail": "sam@example.com",
        "tenantId": "t-1",
        "leadId": "lead-4",
        "studentId": "stu-4",
        "createdBy": "u-1",
        "timezone": "Asia/Kolkata"
    });
    let booking = normalize_booking(&record, day()).unwrap();
    assert_eq!(booking.id, "bk-1");
    assert_eq!(booking.date, NaiveDate::from_ymd_opt(2026, 3, 17).unwrap());
    assert_eq!(booking.interval, iv("10:15", "10:30"));
    assert_eq!(booking.status, BookingStatus::Scheduled);
    assert_eq!(booking.retry_count, 2);
    assert_eq!(booking.user_name.as_deref(), Some("Sam"));
    assert_eq!(booking.lead_id, "lead-4");
    assert_eq!(booking.student_id.as_deref(), Some("stu-4"));
    assert_eq!(booking.timezone, "Asia/Kolkata");
}

#[test]
fn snake_case_booking_takes_date_from_timestamp() {
    let record = json!({
        "_id": "bk-2",
        "scheduled_at": "2026-03-18T14:00:00Z",
        "ends_at": "2026-03-18T14:15:00Z",
        "status": "canceled",
        "user_id": "u-2",
        "lead_id": "lead-2"
    });
    let booking = normalize_booking(&record, day()).unwrap();
    assert_eq!(booking.date, NaiveDate::from_ymd_opt(2026, 3, 18).unwrap());
    assert_eq!(booking.status, BookingStatus::Cancelled);
    assert!(!booking.status.is_active());
    assert_eq!(booking.user_id, "u-2");
    assert_eq!(booking.retry_count, 0);
}

#[test]
fn missing_date_uses_fallback() {
    let record = json!({"id": "bk-3", "start": "09:00", "end": "09:15"});
    assert_eq!(normalize_booking(&record, day()).unwrap().date, day());
}

#[test]
fn unknown_status_reads_as_scheduled() {
    let record = json!({"id": "bk-4", "start": "09:00", "end": "09:15", "status": "pending_review"});
    assert_eq!(normalize_booking(&record, day()).unwrap().status, BookingStatus::Scheduled);
}

#[test]
fn bookings_without_interval_are_dropped() {
    let records = vec![
        json!({"id": "bk-5"}),
        json!({"id": "bk-7", "start": "nine", "end": "09:15"}),
        json!({"id": "bk-6", "start": "09:00", "end": "09:15", "status": "completed"}),
    ];
    let bookings = normalize_bookings(&records, day());
    assert_eq!(bookings.len(), 1);
    assert_eq!(bookings[0].status, BookingStatus::Completed);
}

#[test]
fn booking_without_id_gets_slot_id() {
    let record = json!({"start": "09:30", "end": "09:45", "date": "2026-03-17"});
    let booking = normalize_booking(&record, day()).unwrap();
    assert_eq!(booking.id, "2026-03-17-09:30");
    assert_eq!(booking.interval, iv("09:30", "09:45"));
}
