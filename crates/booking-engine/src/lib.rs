//! # booking-engine
//!
//! Client-side availability and booking engine for a remote bookings API.
//!
//! The engine fetches a counsellor's availability for a day, expands it into
//! 15-minute atomic slots, gates the "Book" action on containment, submits
//! bookings and cancellations, and re-fetches after every mutation. The remote
//! service is the only source of truth; local state is a disposable
//! projection of it.
//!
//! ## Modules
//!
//! - [`backend`] — The `BookingBackend` port and its request/response types
//! - [`http`] — `reqwest` implementation of the port
//! - [`engine`] — `BookingEngine`: state, selection, generation stamping
//! - [`reconciler`] — Availability and bookings refresh
//! - [`orchestrator`] — Booking submission
//! - [`cancel`] — Cancellation
//! - [`context`] — The active (user, date) booking context
//! - [`state`] — Derived state snapshot and observers
//! - [`config`] — TOML/env configuration
//! - [`error`] — Error types and conflict classification

pub mod backend;
pub mod cancel;
pub mod config;
pub mod context;
pub mod engine;
pub mod error;
pub mod http;
pub mod orchestrator;
pub mod reconciler;
pub mod state;

pub use backend::{
    AvailabilityPayload, AvailabilityRequest, BookingBackend, BookingsQuery, CreateBookingRequest,
    CreatedBooking, DayWindowRequest,
};
pub use config::EngineConfig;
pub use context::{BookingContext, ContextKey};
pub use engine::BookingEngine;
pub use error::{classify_failure, BookingError, RemoteError, Severity};
pub use http::HttpBackend;
pub use orchestrator::{scheduled_at, BookingReceipt, NoteOutcome, BOOKING_SOURCE};
pub use state::{BookingPhase, EngineState, RefreshOutcome, StateChange, StateObserver};
