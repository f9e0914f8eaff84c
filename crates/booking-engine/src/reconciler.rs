//! Availability reconciliation: fetch, normalize, expand, apply.
//!
//! The remote service is the sole source of truth. Each refresh replaces the
//! derived state wholesale; nothing is merged. Existing bookings are shown
//! alongside availability but never subtracted from it here.

use serde_json::Value;
use slot_engine::normalize::{first_text, STATUS_EXTRACTORS};
use slot_engine::{
    normalize_bookings, normalize_intervals, sort_intervals, AvailabilityWindow, BookingStatus,
};
use tracing::{debug, warn};

use crate::backend::{AvailabilityPayload, AvailabilityRequest, BookingBackend, BookingsQuery, DayWindowRequest};
use crate::context::BookingContext;
use crate::engine::BookingEngine;
use crate::error::{BookingError, RemoteError, Result};
use crate::state::{RefreshOutcome, StateChange};

impl<B: BookingBackend> BookingEngine<B> {
    /// Open `context` and fetch both bookings and availability for it.
    pub async fn load(&self, context: &BookingContext) -> Result<RefreshOutcome> {
        self.open(context);
        self.refresh(context).await
    }

    /// Re-fetch bookings, then availability. Both run even if the first fails;
    /// the first error is returned.
    pub async fn refresh(&self, context: &BookingContext) -> Result<RefreshOutcome> {
        let bookings = self.refresh_bookings(context).await;
        let availability = self.refresh_availability(context).await;
        bookings.and(availability)
    }

    /// Fetch the lead's bookings for the day and re-mark the generated slots.
    ///
    /// On failure the previous bookings are left as they are. A context other
    /// than the open one is not fetched and reports `Stale`.
    pub async fn refresh_bookings(&self, context: &BookingContext) -> Result<RefreshOutcome> {
        if !self.is_open(context) {
            debug!(date = %context.date, "skipping bookings refresh for a day that is not open");
            return Ok(RefreshOutcome::Stale);
        }
        let token = self.next_bookings_generation();
        let query = BookingsQuery {
            lead_id: context.effective_lead_id().to_string(),
            date: context.date,
        };
        let fetched = self.backend.list_bookings(&query).await;

        let mut state = self.lock_state();
        if !self.is_current_bookings(token) {
            warn!(token, date = %context.date, "discarding stale bookings response");
            return Ok(RefreshOutcome::Stale);
        }

        let records = fetched.map_err(|err| BookingError::Transport(err.message().to_string()))?;
        state.bookings = normalize_bookings(&records, context.date);
        state.apply_bookings(self.config.slot_minutes);
        let count = state.bookings.len();
        debug!(count, dropped = records.len() - count, "bookings refreshed");
        self.notify(StateChange::BookingsRefreshed, &state);
        Ok(RefreshOutcome::Applied { count })
    }

    /// Fetch availability (primary endpoint, then fallback) and rebuild the
    /// atomic slots and booked intervals.
    ///
    /// If both endpoints fail, all derived availability is cleared and the
    /// error is returned: nothing stays bookable on possibly-wrong data.
    /// Like bookings, only the open context is refreshed.
    pub async fn refresh_availability(&self, context: &BookingContext) -> Result<RefreshOutcome> {
        if !self.is_open(context) {
            debug!(date = %context.date, "skipping availability refresh for a day that is not open");
            return Ok(RefreshOutcome::Stale);
        }
        let token = self.next_availability_generation();
        let fetched = self.fetch_availability(context).await;

        let mut state = self.lock_state();
        if !self.is_current_availability(token) {
            warn!(token, date = %context.date, "discarding stale availability response");
            return Ok(RefreshOutcome::Stale);
        }
        state.generation = token;

        let payload = match fetched {
            Ok(payload) => payload,
            Err(err) => {
                warn!(error = %err, user_id = %context.user_id, "availability unavailable; clearing slots");
                state.clear_availability();
                self.notify(StateChange::AvailabilityCleared, &state);
                return Err(BookingError::Transport(err.message().to_string()));
            }
        };

        let window = AvailabilityWindow {
            user_id: context.user_id.clone(),
            date: context.date,
            ranges: normalize_intervals(&payload.available_slots),
        };
        let active: Vec<Value> = payload.bookings.into_iter().filter(is_active_record).collect();
        let mut booked = normalize_intervals(&active);
        sort_intervals(&mut booked);

        state.atomic_slots = window.atomic_intervals(self.config.slot_minutes);
        state.booked_intervals = booked;
        state.window = Some(window);
        state.reselect();

        let count = state.atomic_slots.len();
        debug!(count, booked = state.booked_intervals.len(), "availability refreshed");
        self.notify(StateChange::AvailabilityRefreshed, &state);
        Ok(RefreshOutcome::Applied { count })
    }

    async fn fetch_availability(
        &self,
        context: &BookingContext,
    ) -> std::result::Result<AvailabilityPayload, RemoteError> {
        let request = self.availability_request(context);
        match self.backend.availability(&request).await {
            Ok(payload) => Ok(payload),
            Err(primary) => {
                warn!(error = %primary, "primary availability endpoint failed; trying booking-availability");
                self.backend
                    .booking_availability(&DayWindowRequest::for_day(&request))
                    .await
            }
        }
    }

    pub(crate) fn availability_request(&self, context: &BookingContext) -> AvailabilityRequest {
        let (start, end) = self.business_hours;
        AvailabilityRequest {
            user_id: context.user_id.clone(),
            date: context.date,
            slot_minutes: self.config.slot_minutes,
            timezone: timezone_of(context, &self.config.timezone),
            business_hours_start: start.to_string(),
            business_hours_end: end.to_string(),
        }
    }
}

/// Records without a status count as active.
fn is_active_record(record: &Value) -> bool {
    first_text(record, STATUS_EXTRACTORS).map_or(true, |raw| BookingStatus::from_remote(raw).is_active())
}

/// The context's timezone, or the configured default when it has none.
pub(crate) fn timezone_of(context: &BookingContext, fallback: &str) -> String {
    if context.timezone.trim().is_empty() {
        fallback.to_string()
    } else {
        context.timezone.clone()
    }
}
