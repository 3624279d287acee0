//! Tests for order conflict detection under the ±2-day window.

use atelier_engine::conflict::{find_order_conflict, order_conflict, protected_window};
use atelier_engine::model::Order;
use atelier_engine::parse_iso_date;
use chrono::{NaiveDate, Utc};

fn d(s: &str) -> NaiveDate {
    parse_iso_date(s).unwrap()
}

/// Helper to create an order for `item_id` on `event_date`.
fn order(id: u64, item_id: u64, event_date: &str) -> Order {
    let event = d(event_date);
    Order {
        id,
        customer_id: 1,
        item_id,
        event_date: event,
        trial_date: None,
        pickup_date: event.pred_opt().unwrap(),
        return_date: event.succ_opt().unwrap(),
        notes: None,
        confirmed: false,
        cancelled: false,
        created_at: Utc::now(),
    }
}

#[test]
fn two_day_gap_conflicts() {
    let orders = vec![order(1, 5, "2024-06-08")];
    assert!(order_conflict(&orders, 5, d("2024-06-10"), 2, None));
}

#[test]
fn three_day_gap_does_not_conflict() {
    let orders = vec![order(1, 5, "2024-06-13")];
    assert!(!order_conflict(&orders, 5, d("2024-06-10"), 2, None));
}

#[test]
fn window_is_inclusive_on_both_sides() {
    let orders = vec![order(1, 5, "2024-06-10")];
    for day in ["2024-06-08", "2024-06-09", "2024-06-10", "2024-06-11", "2024-06-12"] {
        assert!(order_conflict(&orders, 5, d(day), 2, None), "{day} should conflict");
    }
    assert!(!order_conflict(&orders, 5, d("2024-06-07"), 2, None));
    assert!(!order_conflict(&orders, 5, d("2024-06-13"), 2, None));
}

#[test]
fn other_items_never_conflict() {
    let orders = vec![order(1, 6, "2024-06-10")];
    assert!(!order_conflict(&orders, 5, d("2024-06-10"), 2, None));
}

#[test]
fn edited_order_does_not_conflict_with_itself() {
    let orders = vec![order(1, 5, "2024-06-10"), order(2, 5, "2024-06-20")];

    assert!(!order_conflict(&orders, 5, d("2024-06-11"), 2, Some(1)));
    // Still conflicts with the other order.
    let clash = find_order_conflict(&orders, 5, d("2024-06-19"), 2, Some(1));
    assert_eq!(clash.map(|o| o.id), Some(2));
}

#[test]
fn cancelled_orders_release_their_window() {
    let mut cancelled = order(1, 5, "2024-06-10");
    cancelled.cancelled = true;
    assert!(!order_conflict(&[cancelled], 5, d("2024-06-10"), 2, None));
}

#[test]
fn protected_window_spans_buffer_days() {
    let window = protected_window(d("2024-06-10"), 2);
    assert_eq!(window.start, d("2024-06-08"));
    assert_eq!(window.end, d("2024-06-12"));
}
