//! Booking submission: validate, submit, mark, refresh, attach note.

use slot_engine::{is_bookable, Assignee, Interval};
use tracing::{info, warn};

use crate::backend::{BookingBackend, CreateBookingRequest};
use crate::context::BookingContext;
use crate::engine::{BookingEngine, SubmissionGuard};
use crate::error::{BookingError, Result};
use crate::reconciler::timezone_of;
use crate::state::{BookingPhase, StateChange};

/// Every booking created through the engine is tagged with this source.
pub const BOOKING_SOURCE: &str = "user_ui";

/// Outcome of the best-effort note write that follows a booking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoteOutcome {
    NotRequested,
    Saved,
    /// The booking stands; only the note was lost.
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingReceipt {
    pub booking_id: Option<String>,
    pub interval: Interval,
    pub scheduled_at: String,
    pub note: NoteOutcome,
}

impl<B: BookingBackend> BookingEngine<B> {
    /// Book the currently selected interval.
    ///
    /// # Errors
    /// `BookingError::Validation` if nothing is selected, otherwise as
    /// [`BookingEngine::book`].
    pub async fn book_selection(
        &self,
        context: &BookingContext,
        note: Option<&str>,
    ) -> Result<BookingReceipt> {
        let selection = { self.lock_state().selection };
        let Some(candidate) = selection else {
            return Err(BookingError::Validation("Select a time slot to book".into()));
        };
        self.book(context, candidate, note).await
    }

    /// Book `candidate` for `context`.
    ///
    /// Required identifiers and containment in an atomic slot are checked
    /// before any remote call. On success the matching slot is marked booked
    /// immediately, then bookings and availability are re-fetched and the
    /// note, if any, is attached. On a remote rejection the state is
    /// refreshed as well; availability conflicts come back as
    /// `BookingError::Conflict`.
    ///
    /// # Errors
    /// - `Validation`: missing identifier, `context` is not the open day,
    ///   unbookable time, or another submission already in flight. No remote
    ///   call was made.
    /// - `Conflict`: the backend reports the time was taken.
    /// - `Transport`: any other remote failure.
    pub async fn book(
        &self,
        context: &BookingContext,
        candidate: Interval,
        note: Option<&str>,
    ) -> Result<BookingReceipt> {
        let Some(_guard) = SubmissionGuard::acquire(&self.submitting) else {
            return Err(BookingError::Validation(
                "A booking is already being submitted".into(),
            ));
        };

        self.set_phase(BookingPhase::Validating);
        if let Err(err) = self.preflight(context, &candidate) {
            self.set_phase(BookingPhase::Failed);
            return Err(err);
        }

        self.set_phase(BookingPhase::Submitting);
        let request = self.create_request(context, &candidate);
        let created = self.backend.create_booking(&request).await;

        match created {
            Ok(created) => {
                info!(
                    booking_id = created.id.as_deref().unwrap_or("<none>"),
                    date = %context.date,
                    interval = %candidate,
                    "booking created"
                );
                self.update(StateChange::SlotBooked, |state| {
                    state.mark_booked(&candidate, created.id.clone(), Some(assignee(context)));
                    state.phase = BookingPhase::Succeeded;
                });

                if let Err(err) = self.refresh(context).await {
                    warn!(error = %err, "refresh after booking failed");
                }

                let note = self.attach_note(context, note).await;
                Ok(BookingReceipt {
                    booking_id: created.id,
                    interval: candidate,
                    scheduled_at: request.scheduled_at,
                    note,
                })
            }
            Err(remote) => {
                let err = BookingError::from(remote);
                if err.is_conflict() {
                    warn!(error = %err, interval = %candidate, "slot was taken before booking completed");
                } else {
                    warn!(error = %err, interval = %candidate, "booking failed");
                }
                self.set_phase(BookingPhase::Failed);

                if let Err(refresh_err) = self.refresh(context).await {
                    warn!(error = %refresh_err, "refresh after failed booking failed");
                }
                Err(err)
            }
        }
    }

    fn preflight(&self, context: &BookingContext, candidate: &Interval) -> Result<()> {
        context.validate()?;
        let state = self.lock_state();
        if state.context.as_ref() != Some(&context.key()) {
            return Err(BookingError::Validation(format!(
                "Load availability for {} before booking",
                context.date
            )));
        }
        if !is_bookable(candidate, &state.atomic_slots) {
            return Err(BookingError::Validation(format!(
                "{candidate} is not an available time slot"
            )));
        }
        Ok(())
    }

    fn create_request(&self, context: &BookingContext, candidate: &Interval) -> CreateBookingRequest {
        let start = candidate.start.to_string();
        CreateBookingRequest {
            lead_id: context.effective_lead_id().to_string(),
            user_id: context.user_id.clone(),
            date: context.date,
            scheduled_at: scheduled_at(context, &start),
            start_time: start,
            end_time: candidate.end.to_string(),
            tenant_id: context.tenant_id.clone(),
            student_id: context.effective_student_id().to_string(),
            assigned_user_id: context.effective_assigned_user_id().to_string(),
            created_by: context.effective_created_by().to_string(),
            booking_type: self.config.booking_type.clone(),
            booking_source: BOOKING_SOURCE.to_string(),
            timezone: timezone_of(context, &self.config.timezone),
            user_name: context.user_name.clone(),
            user_email: context.user_email.clone(),
        }
    }

    async fn attach_note(&self, context: &BookingContext, note: Option<&str>) -> NoteOutcome {
        let Some(text) = note.map(str::trim).filter(|t| !t.is_empty()) else {
            return NoteOutcome::NotRequested;
        };
        match self.backend.add_note(context.effective_lead_id(), text).await {
            Ok(()) => NoteOutcome::Saved,
            Err(err) => {
                warn!(error = %err, lead_id = %context.effective_lead_id(), "could not attach booking note");
                NoteOutcome::Failed(err.message().to_string())
            }
        }
    }
}

/// `"{date}T{HH:MM}:00Z"`, built literally.
///
/// The `Z` suffix does not mean a UTC conversion happened: `start` is the
/// caller's wall-clock time and the backend expects exactly this string.
pub fn scheduled_at(context: &BookingContext, start: &str) -> String {
    format!("{}T{start}:00Z", context.date.format("%Y-%m-%d"))
}

fn assignee(context: &BookingContext) -> Assignee {
    Assignee {
        user_id: context.user_id.clone(),
        user_name: context.user_name.clone(),
        user_email: context.user_email.clone(),
    }
}
