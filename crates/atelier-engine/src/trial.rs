//! Trial-reservation policy: shift occupancy and free trial dates.
//!
//! Trials are booked per (item, date, shift). Each shift holds a fixed number
//! of non-cancelled reservations. A date is offered as free while at least one
//! of its bookable shifts has room, with two calendar rules layered on top:
//!
//! - Sundays are never offered.
//! - Saturday afternoons are always closed, so a Saturday is judged on its
//!   morning shift alone.

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::calendar::horizon;
use crate::model::{ItemId, Reservation};
use crate::shift::Shift;

/// Count the non-cancelled reservations for one (item, date, shift) triple.
pub fn shift_occupancy(
    reservations: &[Reservation],
    item_id: ItemId,
    date: NaiveDate,
    shift: Shift,
) -> usize {
    reservations
        .iter()
        .filter(|r| r.occupies(item_id, date, shift))
        .count()
}

/// Occupancy of both shifts on a single date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayOccupancy {
    pub date: NaiveDate,
    pub morning: usize,
    pub afternoon: usize,
    /// The afternoon shift is closed on this date regardless of occupancy.
    pub afternoon_closed: bool,
}

impl DayOccupancy {
    pub fn count(&self, shift: Shift) -> usize {
        match shift {
            Shift::Morning => self.morning,
            Shift::Afternoon => self.afternoon,
        }
    }

    /// Whether `shift` has reached `capacity` (closed shifts are always full).
    pub fn is_full(&self, shift: Shift, capacity: usize) -> bool {
        match shift {
            Shift::Afternoon if self.afternoon_closed => true,
            _ => self.count(shift) >= capacity,
        }
    }

    /// Whether the date can still take a trial in some shift.
    pub fn has_room(&self, capacity: usize) -> bool {
        if is_closed(self.date) {
            return false;
        }
        Shift::ALL.iter().any(|&shift| !self.is_full(shift, capacity))
    }
}

/// Sundays take no trials at all.
pub fn is_closed(date: NaiveDate) -> bool {
    date.weekday() == Weekday::Sun
}

/// Saturday afternoons take no trials.
pub fn afternoon_closed(date: NaiveDate) -> bool {
    date.weekday() == Weekday::Sat
}

/// Occupancy of both shifts for `item_id` on `date`.
pub fn day_occupancy(reservations: &[Reservation], item_id: ItemId, date: NaiveDate) -> DayOccupancy {
    DayOccupancy {
        date,
        morning: shift_occupancy(reservations, item_id, date, Shift::Morning),
        afternoon: shift_occupancy(reservations, item_id, date, Shift::Afternoon),
        afternoon_closed: afternoon_closed(date),
    }
}

/// Dates in `[today, today + horizon_days)` that can still take a trial for
/// `item_id`, in increasing order.
///
/// `reservations` may contain records for other items or outside the horizon;
/// they are ignored.
pub fn free_dates(
    reservations: &[Reservation],
    item_id: ItemId,
    today: NaiveDate,
    horizon_days: u32,
    capacity: usize,
) -> Vec<NaiveDate> {
    horizon(today, horizon_days)
        .filter(|&date| day_occupancy(reservations, item_id, date).has_room(capacity))
        .collect()
}
