//! The booking engine: one instance per booking screen.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use parking_lot::{Mutex, MutexGuard};
use slot_engine::{generate_slots, is_bookable, Interval, TimeOfDay};
use tracing::debug;

use crate::backend::BookingBackend;
use crate::config::EngineConfig;
use crate::context::BookingContext;
use crate::error::Result;
use crate::state::{BookingPhase, EngineState, StateChange, StateObserver};

/// Owns the derived state for the active context and runs reconciliation,
/// booking and cancellation against a [`BookingBackend`].
///
/// All operations take `&self`. Availability and booking fetches are stamped
/// with a generation token so a slow response for a previous context cannot
/// overwrite newer state, and at most one booking submission runs at a time.
pub struct BookingEngine<B> {
    pub(crate) backend: B,
    pub(crate) config: EngineConfig,
    pub(crate) business_hours: (TimeOfDay, TimeOfDay),
    state: Mutex<EngineState>,
    observers: Vec<Box<dyn StateObserver>>,
    availability_generation: AtomicU64,
    bookings_generation: AtomicU64,
    pub(crate) submitting: AtomicBool,
}

impl<B: BookingBackend> BookingEngine<B> {
    /// # Errors
    /// Returns the config's validation error.
    pub fn new(backend: B, config: EngineConfig) -> Result<Self> {
        config.validate()?;
        let business_hours = config.business_hours()?;
        Ok(Self {
            backend,
            config,
            business_hours,
            state: Mutex::new(EngineState::default()),
            observers: Vec::new(),
            availability_generation: AtomicU64::new(0),
            bookings_generation: AtomicU64::new(0),
            submitting: AtomicBool::new(false),
        })
    }

    pub fn with_observer(mut self, observer: impl StateObserver + 'static) -> Self {
        self.observers.push(Box::new(observer));
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> EngineState {
        self.state.lock().clone()
    }

    /// Switch to `context`'s day: regenerate the business-hours slots and
    /// drop everything derived from the previous context. In-flight fetches
    /// for the old context become stale.
    pub fn open(&self, context: &BookingContext) {
        self.availability_generation.fetch_add(1, Ordering::SeqCst);
        self.bookings_generation.fetch_add(1, Ordering::SeqCst);

        let (start, end) = self.business_hours;
        let slots = generate_slots(context.date, start, end, self.config.slot_minutes);
        debug!(user_id = %context.user_id, date = %context.date, slots = slots.len(), "opening booking day");

        self.update(StateChange::ContextOpened, |state| {
            *state = EngineState {
                context: Some(context.key()),
                slots,
                ..EngineState::default()
            };
        });
    }

    pub fn select(&self, candidate: Interval) {
        self.update(StateChange::SelectionChanged, |state| {
            state.selection = Some(candidate);
        });
    }

    /// Parse and select a wall-clock pair.
    ///
    /// # Errors
    /// `BookingError::Format` if either time does not parse; the previous
    /// selection is cleared so nothing stale stays bookable.
    pub fn select_wall_clock(&self, start: &str, end: &str) -> Result<()> {
        let parsed = slot_engine::parse_time_of_day(start)
            .and_then(|s| slot_engine::parse_time_of_day(end).map(|e| Interval::new(s, e)));
        match parsed {
            Ok(candidate) => {
                self.select(candidate);
                Ok(())
            }
            Err(err) => {
                self.clear_selection();
                Err(err.into())
            }
        }
    }

    pub fn clear_selection(&self) {
        self.update(StateChange::SelectionChanged, |state| {
            state.selection = None;
        });
    }

    /// Whether `context`'s (user, date) is the day the engine currently holds.
    pub fn is_open(&self, context: &BookingContext) -> bool {
        self.state.lock().context.as_ref() == Some(&context.key())
    }

    /// Whether the Book action should be enabled right now.
    pub fn can_book(&self) -> bool {
        let state = self.state.lock();
        state.phase != BookingPhase::Submitting
            && state
                .selection
                .is_some_and(|candidate| is_bookable(&candidate, &state.atomic_slots))
    }

    pub(crate) fn next_availability_generation(&self) -> u64 {
        self.availability_generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub(crate) fn is_current_availability(&self, token: u64) -> bool {
        self.availability_generation.load(Ordering::SeqCst) == token
    }

    pub(crate) fn next_bookings_generation(&self) -> u64 {
        self.bookings_generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub(crate) fn is_current_bookings(&self, token: u64) -> bool {
        self.bookings_generation.load(Ordering::SeqCst) == token
    }

    pub(crate) fn lock_state(&self) -> MutexGuard<'_, EngineState> {
        self.state.lock()
    }

    /// Apply `f` to the state and notify observers.
    pub(crate) fn update<R>(&self, change: StateChange, f: impl FnOnce(&mut EngineState) -> R) -> R {
        let mut state = self.state.lock();
        let result = f(&mut state);
        self.notify(change, &state);
        result
    }

    pub(crate) fn notify(&self, change: StateChange, state: &EngineState) {
        for observer in &self.observers {
            observer.on_change(change, state);
        }
    }

    pub(crate) fn set_phase(&self, phase: BookingPhase) {
        self.update(StateChange::PhaseChanged, |state| state.phase = phase);
    }
}

/// Clears the submission flag when a booking attempt ends, however it ends.
pub(crate) struct SubmissionGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> SubmissionGuard<'a> {
    pub(crate) fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for SubmissionGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}
