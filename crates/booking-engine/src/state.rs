//! In-memory projection of remote state for the active context.
//!
//! Nothing here is authoritative. Every field is rebuilt from the remote
//! service on refresh; the only local edits are the optimistic booked/unbooked
//! flags applied right after a confirmed booking or cancellation.

use slot_engine::{Assignee, AvailabilityWindow, Booking, Interval, Slot, SlotKind};

use crate::context::ContextKey;

/// Progress of the current booking attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BookingPhase {
    #[default]
    Idle,
    Validating,
    Submitting,
    Succeeded,
    Failed,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EngineState {
    pub context: Option<ContextKey>,
    /// Generator output for the day, with booking flags applied.
    pub slots: Vec<Slot>,
    /// Bookings for the lead on this day, cancelled ones included.
    pub bookings: Vec<Booking>,
    pub window: Option<AvailabilityWindow>,
    /// Sorted atomic intervals that may be booked.
    pub atomic_slots: Vec<Interval>,
    /// Already-booked intervals at their original granularity, for display.
    pub booked_intervals: Vec<Interval>,
    pub selection: Option<Interval>,
    pub phase: BookingPhase,
    /// Token of the availability fetch that produced the current state.
    pub generation: u64,
}

impl EngineState {
    pub(crate) fn clear_availability(&mut self) {
        self.window = None;
        self.atomic_slots.clear();
        self.booked_intervals.clear();
        self.selection = None;
    }

    /// Keep the selection if it is still an atomic slot, otherwise pick the
    /// first one (or nothing).
    pub(crate) fn reselect(&mut self) {
        let still_offered = self
            .selection
            .is_some_and(|selected| self.atomic_slots.contains(&selected));
        if !still_offered {
            self.selection = self.atomic_slots.first().copied();
        }
    }

    /// Recompute every slot's booked flag from the active bookings.
    ///
    /// A booking marks every slot it overlaps. One that falls outside the
    /// generated grid gets a slot of its own so it still shows as booked.
    pub(crate) fn apply_bookings(&mut self, granularity: u16) {
        for slot in &mut self.slots {
            slot.clear_booking();
        }
        let open_date = self.context.as_ref().map(|key| key.date);
        let active: Vec<Booking> = self
            .bookings
            .iter()
            .filter(|b| b.status.is_active())
            .cloned()
            .collect();
        for booking in &active {
            let mut marked = false;
            for slot in self
                .slots
                .iter_mut()
                .filter(|s| s.date == booking.date && s.interval.overlaps(&booking.interval))
            {
                slot.mark_booked(Some(booking.id.clone()), Some(assignee_of(booking)));
                marked = true;
            }
            if !marked && open_date == Some(booking.date) {
                let kind = if booking.interval.duration_minutes() == granularity {
                    SlotKind::Atomic
                } else {
                    SlotKind::Coarse
                };
                let index = self.insert_slot(Slot::new(booking.date, booking.interval, kind));
                self.slots[index].mark_booked(Some(booking.id.clone()), Some(assignee_of(booking)));
            }
        }
    }

    /// Optimistically mark the slot holding `candidate` as booked.
    ///
    /// Falls back to the atomic slot containing `candidate` when the
    /// business-hours grid has none, adding it to `slots`.
    pub(crate) fn mark_booked(
        &mut self,
        candidate: &Interval,
        booking_id: Option<String>,
        assignee: Option<Assignee>,
    ) {
        let index = match self.slots.iter().position(|s| s.interval.contains(candidate)) {
            Some(index) => index,
            None => {
                let date = self.context.as_ref().map(|key| key.date);
                let atomic = self.atomic_slots.iter().find(|a| a.contains(candidate)).copied();
                let (Some(date), Some(atomic)) = (date, atomic) else {
                    return;
                };
                self.insert_slot(Slot::new(date, atomic, SlotKind::Atomic))
            }
        };
        self.slots[index].mark_booked(booking_id, assignee);
    }

    /// Insert keeping `slots` ordered by start.
    fn insert_slot(&mut self, slot: Slot) -> usize {
        let index = self
            .slots
            .partition_point(|s| s.interval.start < slot.interval.start);
        self.slots.insert(index, slot);
        index
    }
}

fn assignee_of(booking: &Booking) -> Assignee {
    Assignee {
        user_id: booking.user_id.clone(),
        user_name: booking.user_name.clone(),
        user_email: booking.user_email.clone(),
    }
}

/// Result of a refresh that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    Applied { count: usize },
    /// A newer fetch was started before this one resolved; its result was
    /// discarded.
    Stale,
}

/// What changed, passed to observers with the new state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateChange {
    ContextOpened,
    SelectionChanged,
    PhaseChanged,
    BookingsRefreshed,
    AvailabilityRefreshed,
    AvailabilityCleared,
    SlotBooked,
    SlotReleased,
}

/// Receives a snapshot after every state change.
///
/// Called while the engine's state lock is held: implementations must not call
/// back into the engine.
pub trait StateObserver: Send + Sync {
    fn on_change(&self, change: StateChange, state: &EngineState);
}
