//! Booking cancellation.

use slot_engine::BookingStatus;
use tracing::{info, warn};

use crate::backend::BookingBackend;
use crate::context::BookingContext;
use crate::engine::BookingEngine;
use crate::error::{BookingError, Result};
use crate::state::StateChange;

impl<B: BookingBackend> BookingEngine<B> {
    /// Cancel `booking_id`.
    ///
    /// Local state is only touched once the backend confirms: the slot holding
    /// the booking is released and the booking marked cancelled, then bookings
    /// and availability are re-fetched when `context` is the day currently
    /// open in the engine.
    ///
    /// # Errors
    /// `Validation` for an empty id; `Transport` if the backend refuses, with
    /// local state left untouched.
    pub async fn cancel(&self, booking_id: &str, context: &BookingContext) -> Result<()> {
        let booking_id = booking_id.trim();
        if booking_id.is_empty() {
            return Err(BookingError::Validation("No booking selected to cancel".into()));
        }

        if let Err(remote) = self.backend.cancel_booking(booking_id).await {
            let err = BookingError::Transport(remote.message().to_string());
            warn!(error = %err, booking_id, "cancellation failed");
            return Err(err);
        }
        info!(booking_id, "booking cancelled");

        self.update(StateChange::SlotReleased, |state| {
            let interval = state
                .bookings
                .iter_mut()
                .find(|b| b.id == booking_id)
                .map(|booking| {
                    booking.status = BookingStatus::Cancelled;
                    booking.interval
                });
            for slot in &mut state.slots {
                let held = slot.booking_id.as_deref() == Some(booking_id)
                    || (slot.is_booked
                        && slot.booking_id.is_none()
                        && interval.is_some_and(|iv| slot.interval.overlaps(&iv)));
                if held {
                    slot.clear_booking();
                }
            }
        });

        // Only the open day is re-fetched; another day's lists never replace it.
        if let Err(err) = self.refresh(context).await {
            warn!(error = %err, "refresh after cancellation failed");
        }
        Ok(())
    }
}
