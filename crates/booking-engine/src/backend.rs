//! Port to the remote bookings/availability service.
//!
//! The service owns every persisted booking and availability window. This
//! trait describes only how the engine calls it; responses stay as raw JSON
//! records because their field names vary and normalizing them is the
//! engine's job.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Serialize;
use serde_json::Value;

use crate::error::RemoteError;

/// Query for `GET bookings`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingsQuery {
    pub lead_id: String,
    pub date: NaiveDate,
}

/// Query for the primary `GET availability` endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityRequest {
    pub user_id: String,
    pub date: NaiveDate,
    pub slot_minutes: u16,
    pub timezone: String,
    pub business_hours_start: String,
    pub business_hours_end: String,
}

/// Query for the fallback `GET booking-availability` endpoint, which takes an
/// explicit day window instead of business hours.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DayWindowRequest {
    pub user_id: String,
    pub day_start: String,
    pub day_end: String,
    pub slot_minutes: u16,
    pub timezone: String,
}

impl DayWindowRequest {
    /// Whole-day window in the caller's wall clock.
    pub fn for_day(request: &AvailabilityRequest) -> Self {
        let day = request.date.format("%Y-%m-%d");
        Self {
            user_id: request.user_id.clone(),
            day_start: format!("{day}T00:00:00"),
            day_end: format!("{day}T23:59:59"),
            slot_minutes: request.slot_minutes,
            timezone: request.timezone.clone(),
        }
    }
}

/// Availability ranges and existing bookings for one user and day.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AvailabilityPayload {
    pub available_slots: Vec<Value>,
    pub bookings: Vec<Value>,
}

const AVAILABLE_KEYS: &[&str] = &["availableSlots", "available_slots", "slots"];
const BOOKING_KEYS: &[&str] = &["bookings", "existingBookings"];

impl AvailabilityPayload {
    /// Accept either `{availableSlots, bookings}` (with a few key aliases) or
    /// a bare array of availability ranges.
    pub fn from_value(value: Value) -> Result<Self, RemoteError> {
        match value {
            Value::Array(available_slots) => Ok(Self {
                available_slots,
                bookings: Vec::new(),
            }),
            Value::Object(mut map) => {
                let mut take = |keys: &[&str]| {
                    keys.iter()
                        .find_map(|key| match map.remove(*key) {
                            Some(Value::Array(items)) => Some(items),
                            _ => None,
                        })
                        .unwrap_or_default()
                };
                let available_slots = take(AVAILABLE_KEYS);
                let bookings = take(BOOKING_KEYS);
                Ok(Self {
                    available_slots,
                    bookings,
                })
            }
            other => Err(RemoteError::Decode(format!(
                "expected availability object or array, got {other}"
            ))),
        }
    }
}

/// Body of `POST bookings`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingRequest {
    pub lead_id: String,
    pub user_id: String,
    pub date: NaiveDate,
    pub start_time: String,
    pub end_time: String,
    /// `"{date}T{start}:00Z"`. The `Z` is literal: `start` is already in the
    /// caller's wall clock and no UTC conversion happens.
    pub scheduled_at: String,
    pub tenant_id: String,
    pub student_id: String,
    pub assigned_user_id: String,
    pub created_by: String,
    pub booking_type: String,
    pub booking_source: String,
    pub timezone: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_email: Option<String>,
}

/// Acknowledgement of a created booking.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreatedBooking {
    /// Missing when the backend acknowledged without echoing an id.
    pub id: Option<String>,
}

impl CreatedBooking {
    /// Read the id from `{id}`, `{_id}`, `{bookingId}`, or the same nested
    /// under `booking` or `data`.
    pub fn from_value(value: &Value) -> Self {
        let direct = slot_engine::normalize::first_text(value, slot_engine::normalize::ID_EXTRACTORS);
        let nested = || {
            ["booking", "data"].iter().find_map(|key| {
                value.get(*key).and_then(|inner| {
                    slot_engine::normalize::first_text(inner, slot_engine::normalize::ID_EXTRACTORS)
                })
            })
        };
        Self {
            id: direct.or_else(nested).map(str::to_string),
        }
    }
}

/// The remote collaborator. One method per endpoint; one attempt per call.
#[async_trait]
pub trait BookingBackend: Send + Sync {
    /// `GET bookings?leadId=&date=`
    async fn list_bookings(&self, query: &BookingsQuery) -> Result<Vec<Value>, RemoteError>;

    /// `GET availability` (primary).
    async fn availability(
        &self,
        request: &AvailabilityRequest,
    ) -> Result<AvailabilityPayload, RemoteError>;

    /// `GET booking-availability` (fallback).
    async fn booking_availability(
        &self,
        request: &DayWindowRequest,
    ) -> Result<AvailabilityPayload, RemoteError>;

    /// `POST bookings`
    async fn create_booking(
        &self,
        request: &CreateBookingRequest,
    ) -> Result<CreatedBooking, RemoteError>;

    /// `POST bookings/{id}/cancel`
    async fn cancel_booking(&self, booking_id: &str) -> Result<(), RemoteError>;

    /// `POST leads/{id}/notes`
    async fn add_note(&self, lead_id: &str, text: &str) -> Result<(), RemoteError>;
}
