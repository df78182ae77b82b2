//! Criterion benchmarks for feature engineering and estimator fitting.
//!
//! Logs are synthesized in memory so runs are deterministic.

use chrono::{TimeDelta, TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use pm_core::log::{Event, EventLog};
use pm_core::mining::build_traces;
use pm_core::predict::{engineer_features, Estimator, RandomForestRegressor, RidgeRegression};

const STEPS: [&str; 6] = ["Receive", "Validate", "Pay", "Pick", "Pack", "Ship"];

/// `cases` traces, each skipping one step chosen by case number.
fn synthetic_log(cases: u64) -> EventLog {
    let origin = Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap();
    let mut log = EventLog::new();
    for case in 0..cases {
        let start = origin + TimeDelta::hours(case as i64);
        let skip = (case % STEPS.len() as u64) as usize;
        let mut t = start;
        for (i, step) in STEPS.iter().enumerate() {
            if i == skip && i != 0 {
                continue;
            }
            t += TimeDelta::minutes(5 + ((case * 7 + i as u64 * 13) % 40) as i64);
            log.push(Event::new(case, *step, t));
        }
    }
    log
}

fn bench_engineer_features(c: &mut Criterion) {
    let traces = build_traces(&synthetic_log(500));
    c.bench_function("features/engineer_500_cases", |b| {
        b.iter(|| {
            let matrix = engineer_features(black_box(&traces));
            black_box(matrix);
        })
    });
}

fn bench_estimator_fit(c: &mut Criterion) {
    let matrix = engineer_features(&build_traces(&synthetic_log(200)));
    let x = matrix.dense();
    let y = matrix.targets();

    let mut group = c.benchmark_group("estimator_fit");
    group.sample_size(10);

    for n_estimators in [10usize, 50] {
        group.bench_with_input(
            BenchmarkId::new("random_forest", n_estimators),
            &n_estimators,
            |b, &n| {
                b.iter(|| {
                    let mut forest = RandomForestRegressor::new(n, 42);
                    forest.fit(black_box(&x), black_box(&y)).expect("forest should fit");
                    black_box(forest);
                });
            },
        );
    }

    group.bench_function("ridge", |b| {
        b.iter(|| {
            let mut ridge = RidgeRegression::new(1.0);
            ridge.fit(black_box(&x), black_box(&y)).expect("ridge should fit");
            black_box(ridge);
        })
    });

    group.finish();
}

criterion_group!(benches, bench_engineer_features, bench_estimator_fit);
criterion_main!(benches);
