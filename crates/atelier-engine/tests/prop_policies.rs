//! Property-based tests for the booking policies using proptest.
//!
//! These tests verify invariants that should hold for *any* booking history,
//! not just the specific examples in the other test files.

use atelier_engine::blocked::{free_return_dates, BlockedDateStrategy, BruteForce, IntervalMerge, OrderScope};
use atelier_engine::calendar::{horizon, offset};
use atelier_engine::conflict::order_conflict;
use atelier_engine::model::Order;
use atelier_engine::{
    BookingService, FixedClock, MemoryStore, NewItem, PolicyConfig, ReservationRequest, Shift,
};
use chrono::{Datelike, NaiveDate, Utc, Weekday};
use proptest::prelude::*;

// ---------------------------------------------------------------------------
// Strategies
// ---------------------------------------------------------------------------

fn base_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 3).unwrap()
}

/// A date within ~8 months of the base date.
fn arb_date() -> impl Strategy<Value = NaiveDate> {
    (-30i64..240).prop_map(|days| offset(base_date(), days))
}

fn arb_shift() -> impl Strategy<Value = Shift> {
    prop_oneof![Just(Shift::Morning), Just(Shift::Afternoon)]
}

/// Orders for items 1..=3 with optional cancellation.
fn arb_orders() -> impl Strategy<Value = Vec<Order>> {
    prop::collection::vec((1u64..=3, arb_date(), any::<bool>()), 0..12).prop_map(|specs| {
        specs
            .into_iter()
            .enumerate()
            .map(|(i, (item_id, event_date, cancelled))| order(i as u64 + 1, item_id, event_date, cancelled))
            .collect()
    })
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn order(id: u64, item_id: u64, event_date: NaiveDate, cancelled: bool) -> Order {
    Order {
        id,
        customer_id: 1,
        item_id,
        event_date,
        trial_date: None,
        pickup_date: offset(event_date, -1),
        return_date: offset(event_date, 1),
        notes: None,
        confirmed: false,
        cancelled,
        created_at: Utc::now(),
    }
}

fn service() -> (BookingService<MemoryStore>, u64) {
    let svc = BookingService::new(MemoryStore::new(), PolicyConfig::default())
        .unwrap()
        .with_clock(FixedClock(base_date()));
    let item = svc
        .add_item(NewItem {
            name: "Sereia".to_string(),
            model: "vestido".to_string(),
            kind: "aluguel".to_string(),
            category: "noiva".to_string(),
            description: None,
            available: true,
        })
        .unwrap()
        .id;
    (svc, item)
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn occupancy_never_exceeds_capacity(
        attempts in prop::collection::vec((0i64..10, arb_shift()), 1..40)
    ) {
        let (svc, item) = service();
        for (day, shift) in &attempts {
            let request = ReservationRequest {
                customer_name: "Ana".to_string(),
                phone: "11 90000-0000".to_string(),
                date: offset(base_date(), *day).to_string(),
                shift: shift.to_string(),
            };
            // Rejections are expected once a shift fills up.
            let _ = svc.register_reservation(item, &request);
        }
        for day in horizon(base_date(), 10) {
            for shift in Shift::ALL {
                prop_assert!(svc.shift_occupancy(item, day, shift).unwrap() <= 2);
            }
        }
    }

    #[test]
    fn free_trial_dates_skip_sundays_and_full_days(
        attempts in prop::collection::vec((0i64..14, arb_shift()), 0..60)
    ) {
        let (svc, item) = service();
        for (day, shift) in &attempts {
            let request = ReservationRequest {
                customer_name: "Ana".to_string(),
                phone: "11 90000-0000".to_string(),
                date: offset(base_date(), *day).to_string(),
                shift: shift.to_string(),
            };
            let _ = svc.register_reservation(item, &request);
        }

        let free = svc.free_dates(item, Some(14)).unwrap();
        for date in free {
            prop_assert_ne!(date.weekday(), Weekday::Sun);
            let morning = svc.shift_occupancy(item, date, Shift::Morning).unwrap();
            let afternoon = svc.shift_occupancy(item, date, Shift::Afternoon).unwrap();
            if date.weekday() == Weekday::Sat {
                prop_assert!(morning < 2);
            } else {
                prop_assert!(morning < 2 || afternoon < 2);
            }
        }
    }

    #[test]
    fn strategies_agree(orders in arb_orders(), item_id in 1u64..=3, horizon_days in 0u32..200) {
        let scope = OrderScope { item_id, excluding: orders.first().map(|o| o.id) };
        let fast = IntervalMerge.compute(&orders, scope, base_date(), horizon_days, 2);
        let slow = BruteForce.compute(&orders, scope, base_date(), horizon_days, 2);
        prop_assert_eq!(fast, slow);
    }

    #[test]
    fn blocked_and_free_are_complements(orders in arb_orders(), item_id in 1u64..=3) {
        let dates = IntervalMerge.compute(&orders, OrderScope::item(item_id), base_date(), 180, 2);
        prop_assert_eq!(dates.blocked.len() + dates.free.len(), 180);
        for day in &dates.free {
            prop_assert!(!dates.blocked.contains(day));
            prop_assert!(!order_conflict(&orders, item_id, *day, 2, None));
        }
        for day in &dates.blocked {
            prop_assert!(order_conflict(&orders, item_id, *day, 2, None));
        }
    }

    #[test]
    fn order_conflict_is_symmetric(a in arb_date(), b in arb_date()) {
        let at_a = vec![order(1, 1, a, false)];
        let at_b = vec![order(1, 1, b, false)];
        prop_assert_eq!(
            order_conflict(&at_a, 1, b, 2, None),
            order_conflict(&at_b, 1, a, 2, None)
        );
    }

    #[test]
    fn return_dates_are_a_subset_of_free(orders in arb_orders()) {
        let free: Vec<NaiveDate> = horizon(base_date(), 90).collect();
        let returns = free_return_dates(&free, &orders, 3);
        for day in &returns {
            prop_assert!(free.contains(day));
            for o in orders.iter().filter(|o| !o.cancelled) {
                let gap = (o.event_date - *day).num_days();
                prop_assert!(!(0..=3).contains(&gap));
            }
        }
    }
}
