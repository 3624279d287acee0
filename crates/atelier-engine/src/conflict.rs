//! Detect order conflicts under the rental-order policy.
//!
//! Every active order protects the window `[event - buffer, event + buffer]`
//! around its event date. A candidate event date conflicts with an order when
//! it lands inside that window, i.e. when `|order.event - candidate| <= buffer`.
//! The check is event-to-event: with the default buffer of 2 days an order on
//! the 10th blocks the 8th through the 12th, and the 13th is bookable.
//! Cancelled orders protect nothing.

use chrono::NaiveDate;

use crate::calendar::DateWindow;
use crate::model::{ItemId, Order, OrderId};

/// The dates an order at `event_date` keeps the item for.
pub fn protected_window(event_date: NaiveDate, buffer_days: i64) -> DateWindow {
    DateWindow::around(event_date, buffer_days)
}

/// Find the first active order for `item_id` whose event date lies within
/// `buffer_days` of `candidate`, skipping `excluding` (the order being edited).
pub fn find_order_conflict<'a>(
    orders: &'a [Order],
    item_id: ItemId,
    candidate: NaiveDate,
    buffer_days: i64,
    excluding: Option<OrderId>,
) -> Option<&'a Order> {
    let window = protected_window(candidate, buffer_days);
    orders.iter().find(|order| {
        order.item_id == item_id
            && order.is_active()
            && Some(order.id) != excluding
            && window.contains(order.event_date)
    })
}

/// Whether booking `item_id` for `candidate` would collide with an existing order.
pub fn order_conflict(
    orders: &[Order],
    item_id: ItemId,
    candidate: NaiveDate,
    buffer_days: i64,
    excluding: Option<OrderId>,
) -> bool {
    find_order_conflict(orders, item_id, candidate, buffer_days, excluding).is_some()
}
