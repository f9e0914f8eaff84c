//! Shared fixtures for booking-engine integration tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use booking_engine::{
    AvailabilityPayload, AvailabilityRequest, BookingBackend, BookingContext, BookingEngine,
    BookingsQuery, CreateBookingRequest, CreatedBooking, DayWindowRequest, EngineConfig,
    EngineState, RemoteError, StateChange, StateObserver,
};
use chrono::NaiveDate;
use serde_json::{json, Value};
use slot_engine::Interval;

// ── Calls ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    ListBookings(BookingsQuery),
    Availability(AvailabilityRequest),
    BookingAvailability(DayWindowRequest),
    Create(CreateBookingRequest),
    Cancel(String),
    Note { lead_id: String, text: String },
}

// ── Fake backend ────────────────────────────────────────────────────────────

/// In-memory backend with canned responses that records every call.
pub struct FakeBackend {
    pub calls: Mutex<Vec<Call>>,
    pub availability: Mutex<Result<AvailabilityPayload, RemoteError>>,
    pub fallback: Mutex<Result<AvailabilityPayload, RemoteError>>,
    pub bookings: Mutex<Result<Vec<Value>, RemoteError>>,
    pub create: Mutex<Result<CreatedBooking, RemoteError>>,
    pub cancel: Mutex<Result<(), RemoteError>>,
    pub note: Mutex<Result<(), RemoteError>>,
    /// Bookings returned by `list_bookings` once a create succeeded.
    pub bookings_after_create: Mutex<Option<Vec<Value>>>,
    /// Yield once inside `create_booking` so a second submission can start.
    pub yield_on_create: bool,
}

impl Default for FakeBackend {
    fn default() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            availability: Mutex::new(Ok(payload(
                vec![json!({"start": "10:00", "end": "11:00"})],
                vec![],
            ))),
            fallback: Mutex::new(Err(RemoteError::Unsupported("no fallback".into()))),
            bookings: Mutex::new(Ok(Vec::new())),
            create: Mutex::new(Ok(CreatedBooking {
                id: Some("bk-new".into()),
            })),
            cancel: Mutex::new(Ok(())),
            note: Mutex::new(Ok(())),
            bookings_after_create: Mutex::new(None),
            yield_on_create: false,
        }
    }
}

impl FakeBackend {
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls().iter().filter(|c| pred(c)).count()
    }

    pub fn availability_calls(&self) -> usize {
        self.count(|c| matches!(c, Call::Availability(_) | Call::BookingAvailability(_)))
    }

    pub fn remote_writes(&self) -> usize {
        self.count(|c| matches!(c, Call::Create(_) | Call::Cancel(_) | Call::Note { .. }))
    }

    /// Calls made after the first booking create.
    pub fn calls_after_create(&self) -> Vec<Call> {
        let calls = self.calls();
        match calls.iter().position(|c| matches!(c, Call::Create(_))) {
            Some(index) => calls[index + 1..].to_vec(),
            None => Vec::new(),
        }
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl BookingBackend for FakeBackend {
    async fn list_bookings(&self, query: &BookingsQuery) -> Result<Vec<Value>, RemoteError> {
        self.record(Call::ListBookings(query.clone()));
        self.bookings.lock().unwrap().clone()
    }

    async fn availability(
        &self,
        request: &AvailabilityRequest,
    ) -> Result<AvailabilityPayload, RemoteError> {
        self.record(Call::Availability(request.clone()));
        self.availability.lock().unwrap().clone()
    }

    async fn booking_availability(
        &self,
        request: &DayWindowRequest,
    ) -> Result<AvailabilityPayload, RemoteError> {
        self.record(Call::BookingAvailability(request.clone()));
        self.fallback.lock().unwrap().clone()
    }

    async fn create_booking(
        &self,
        request: &CreateBookingRequest,
    ) -> Result<CreatedBooking, RemoteError> {
        self.record(Call::Create(request.clone()));
        if self.yield_on_create {
            tokio::task::yield_now().await;
        }
        let result = self.create.lock().unwrap().clone();
        if result.is_ok() {
            if let Some(after) = self.bookings_after_create.lock().unwrap().take() {
                *self.bookings.lock().unwrap() = Ok(after);
            }
        }
        result
    }

    async fn cancel_booking(&self, booking_id: &str) -> Result<(), RemoteError> {
        self.record(Call::Cancel(booking_id.to_string()));
        self.cancel.lock().unwrap().clone()
    }

    async fn add_note(&self, lead_id: &str, text: &str) -> Result<(), RemoteError> {
        self.record(Call::Note {
            lead_id: lead_id.to_string(),
            text: text.to_string(),
        });
        self.note.lock().unwrap().clone()
    }
}

// ── Observer ────────────────────────────────────────────────────────────────

/// Keeps every (change, snapshot) pair the engine reports.
#[derive(Clone, Default)]
pub struct Recorder {
    pub events: Arc<Mutex<Vec<(StateChange, EngineState)>>>,
}

impl Recorder {
    pub fn events(&self) -> Vec<(StateChange, EngineState)> {
        self.events.lock().unwrap().clone()
    }

    pub fn changes(&self) -> Vec<StateChange> {
        self.events().into_iter().map(|(c, _)| c).collect()
    }
}

impl StateObserver for Recorder {
    fn on_change(&self, change: StateChange, state: &EngineState) {
        self.events.lock().unwrap().push((change, state.clone()));
    }
}

// ── Builders ────────────────────────────────────────────────────────────────

pub fn payload(available: Vec<Value>, bookings: Vec<Value>) -> AvailabilityPayload {
    AvailabilityPayload {
        available_slots: available,
        bookings,
    }
}

pub fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 16).unwrap()
}

pub fn context() -> BookingContext {
    BookingContext {
        tenant_id: "tenant-1".into(),
        created_by: "agent-7".into(),
        assigned_user_id: "agent-7".into(),
        lead_id: "lead-42".into(),
        student_id: "student-42".into(),
        user_id: "counsellor-3".into(),
        user_name: Some("Priya".into()),
        user_email: Some("priya@example.com".into()),
        date: day(),
        timezone: "Asia/Kolkata".into(),
    }
}

pub fn engine(backend: FakeBackend) -> BookingEngine<FakeBackend> {
    BookingEngine::new(backend, EngineConfig::default()).unwrap()
}

pub fn iv(start: &str, end: &str) -> Interval {
    Interval::from_wall_clock(start, end).unwrap()
}
