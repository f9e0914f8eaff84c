//! # slot-engine
//!
//! Pure interval arithmetic behind appointment booking: wall-clock parsing,
//! 15-minute slot generation, availability expansion and the containment check
//! that decides whether a chosen time may be booked.
//!
//! Everything here is synchronous and free of I/O. Remote fetching and booking
//! orchestration live in `booking-engine`.
//!
//! ## Modules
//!
//! - [`time`] — `HH:MM` <-> minutes since midnight
//! - [`interval`] — `[start, end)` intervals, expansion, containment
//! - [`slots`] — Fixed-granularity slot generation for a business day
//! - [`validator`] — The "may this be booked" gate
//! - [`booking`] — Booking and availability-window records
//! - [`normalize`] — Field-alias extraction from loosely-typed remote JSON
//! - [`error`] — Error types

pub mod booking;
pub mod error;
pub mod interval;
pub mod normalize;
pub mod slots;
pub mod time;
pub mod validator;

pub use booking::{AvailabilityWindow, Booking, BookingStatus};
pub use error::SlotError;
pub use interval::{contains, expand, sort_intervals, Interval};
pub use normalize::{normalize_booking, normalize_bookings, normalize_interval, normalize_intervals};
pub use slots::{generate_slots, Assignee, Slot, SlotKind, DEFAULT_GRANULARITY};
pub use time::{format_time_of_day, parse_date, parse_time_of_day, validate_timezone, TimeOfDay};
pub use validator::{is_bookable, is_bookable_wall_clock};
