//! The single gate deciding whether a chosen time may be booked.

use crate::interval::{contains, Interval};
use crate::time::parse_time_of_day;

/// True iff `candidate` is non-empty and lies wholly inside at least one
/// atomic slot.
///
/// Partial overlap is not enough: with an atomic slot `09:00-09:15`, the
/// candidate `09:10-09:30` is rejected. A candidate ending at `00:00` is read
/// as ending at end of day. Side-effect free and linear in `atomic_slots`.
pub fn is_bookable(candidate: &Interval, atomic_slots: &[Interval]) -> bool {
    let candidate = candidate.with_midnight_rollover();
    if candidate.is_empty() {
        return false;
    }
    atomic_slots.iter().any(|slot| contains(slot, &candidate))
}

/// [`is_bookable`] for raw user input. Unparseable times are never bookable.
pub fn is_bookable_wall_clock(start: &str, end: &str, atomic_slots: &[Interval]) -> bool {
    match (parse_time_of_day(start), parse_time_of_day(end)) {
        (Ok(start), Ok(end)) => is_bookable(&Interval::new(start, end), atomic_slots),
        _ => false,
    }
}
