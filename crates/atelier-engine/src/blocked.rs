//! Compute blocked and free order dates for an item over a day horizon.
//!
//! Each active order blocks `[event - buffer, event + buffer]`. Two strategies
//! produce the same result behind the [`BlockedDateStrategy`] trait:
//!
//! - [`IntervalMerge`] sorts the protected windows, merges overlapping or
//!   adjacent ones, then walks the horizon against the merged list.
//! - [`BruteForce`] scans every day of the horizon against every order.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::calendar::{horizon, offset, DateWindow};
use crate::conflict::protected_window;
use crate::model::{ItemId, Order, OrderId};

/// Which orders take part in a blocked-date computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderScope {
    pub item_id: ItemId,
    /// The order being edited, which must not block its own dates.
    pub excluding: Option<OrderId>,
}

impl OrderScope {
    pub fn item(item_id: ItemId) -> Self {
        Self {
            item_id,
            excluding: None,
        }
    }

    pub fn qualifies(&self, order: &Order) -> bool {
        order.item_id == self.item_id && order.is_active() && Some(order.id) != self.excluding
    }
}

/// Blocked dates and their complement within a horizon.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BlockedDates {
    /// Dates inside some order's protected window, ascending.
    pub blocked: Vec<NaiveDate>,
    /// Every other date of the horizon, ascending.
    pub free: Vec<NaiveDate>,
}

impl BlockedDates {
    pub fn is_blocked(&self, date: NaiveDate) -> bool {
        self.blocked.binary_search(&date).is_ok()
    }
}

/// Interchangeable implementation of the blocked-date computation.
pub trait BlockedDateStrategy: Send + Sync {
    fn compute(
        &self,
        orders: &[Order],
        scope: OrderScope,
        today: NaiveDate,
        horizon_days: u32,
        buffer_days: i64,
    ) -> BlockedDates;
}

/// Per-day scan of every qualifying order.
#[derive(Debug, Clone, Copy, Default)]
pub struct BruteForce;

impl BlockedDateStrategy for BruteForce {
    fn compute(
        &self,
        orders: &[Order],
        scope: OrderScope,
        today: NaiveDate,
        horizon_days: u32,
        buffer_days: i64,
    ) -> BlockedDates {
        let mut result = BlockedDates::default();
        for day in horizon(today, horizon_days) {
            let blocked = orders
                .iter()
                .filter(|o| scope.qualifies(o))
                .any(|o| protected_window(o.event_date, buffer_days).contains(day));
            if blocked {
                result.blocked.push(day);
            } else {
                result.free.push(day);
            }
        }
        result
    }
}

/// Sort-and-merge of protected windows, then a single pass over the horizon.
#[derive(Debug, Clone, Copy, Default)]
pub struct IntervalMerge;

impl BlockedDateStrategy for IntervalMerge {
    fn compute(
        &self,
        orders: &[Order],
        scope: OrderScope,
        today: NaiveDate,
        horizon_days: u32,
        buffer_days: i64,
    ) -> BlockedDates {
        let windows: Vec<DateWindow> = orders
            .iter()
            .filter(|o| scope.qualifies(o))
            .map(|o| protected_window(o.event_date, buffer_days))
            .collect();
        let merged = merge_windows(windows);

        let mut result = BlockedDates::default();
        let mut cursor = merged.iter().peekable();
        for day in horizon(today, horizon_days) {
            // Skip windows that end before this day; the list is sorted and disjoint.
            while cursor.peek().is_some_and(|w| w.end < day) {
                cursor.next();
            }
            if cursor.peek().is_some_and(|w| w.contains(day)) {
                result.blocked.push(day);
            } else {
                result.free.push(day);
            }
        }
        result
    }
}

/// Merge overlapping or adjacent windows into a sorted, disjoint list.
pub fn merge_windows(mut windows: Vec<DateWindow>) -> Vec<DateWindow> {
    windows.sort();

    let mut merged: Vec<DateWindow> = Vec::with_capacity(windows.len());
    for window in windows {
        if let Some(last) = merged.last_mut() {
            if window.start <= offset(last.end, 1) {
                last.end = last.end.max(window.end);
                continue;
            }
        }
        merged.push(window);
    }
    merged
}

/// Narrow `free` to the dates acceptable as a return date.
///
/// A candidate is rejected when some active order's event falls 0 to
/// `buffer_days` days after it (`0 <= event - candidate <= buffer`). The
/// buffer only looks forward: a return may follow a past event arbitrarily
/// closely but must leave turnaround time before the next one.
pub fn free_return_dates<'a, I>(free: &[NaiveDate], orders: I, buffer_days: i64) -> Vec<NaiveDate>
where
    I: IntoIterator<Item = &'a Order>,
{
    let upcoming: BTreeSet<NaiveDate> = orders
        .into_iter()
        .filter(|o| o.is_active())
        .map(|o| o.event_date)
        .collect();

    free.iter()
        .copied()
        .filter(|&candidate| {
            upcoming
                .range(candidate..=offset(candidate, buffer_days.max(0)))
                .next()
                .is_none()
        })
        .collect()
}
