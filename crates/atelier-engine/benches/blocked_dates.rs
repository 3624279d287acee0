use atelier_engine::blocked::{BlockedDateStrategy, BruteForce, IntervalMerge, OrderScope};
use atelier_engine::calendar::offset;
use atelier_engine::model::Order;
use chrono::{NaiveDate, Utc};
use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;

fn orders(count: u64) -> Vec<Order> {
    let start = NaiveDate::from_ymd_opt(2024, 6, 3).unwrap();
    (0..count)
        .map(|i| {
            let event_date = offset(start, (i as i64 * 7) % 200);
            Order {
                id: i + 1,
                customer_id: 1,
                item_id: i % 3,
                event_date,
                trial_date: None,
                pickup_date: offset(event_date, -1),
                return_date: offset(event_date, 1),
                notes: None,
                confirmed: true,
                cancelled: false,
                created_at: Utc::now(),
            }
        })
        .collect()
}

fn bench_blocked_dates(c: &mut Criterion) {
    let today = NaiveDate::from_ymd_opt(2024, 6, 3).unwrap();
    let scope = OrderScope::item(0);
    let mut group = c.benchmark_group("blocked_dates_180d");

    for count in [10u64, 100, 1000] {
        let orders = orders(count);
        group.bench_function(format!("interval_merge/{count}"), |b| {
            b.iter(|| IntervalMerge.compute(black_box(&orders), scope, today, 180, 2))
        });
        group.bench_function(format!("brute_force/{count}"), |b| {
            b.iter(|| BruteForce.compute(black_box(&orders), scope, today, 180, 2))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_blocked_dates);
criterion_main!(benches);
