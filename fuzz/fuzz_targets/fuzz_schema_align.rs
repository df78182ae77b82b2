//! Fuzz target for aligning live case rows against a fitted schema.
//!
//! Whatever columns arrive, the aligned row must match the schema width.

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use pm_core::predict::{ActivityRegistry, FeatureSchema, StateRow};

#[derive(Debug, Arbitrary)]
struct Input {
    labels: Vec<String>,
    columns: Vec<(String, f64)>,
}

fuzz_target!(|input: Input| {
    let registry = ActivityRegistry::from_labels(input.labels.iter().take(16));
    let schema = FeatureSchema::from_registry(&registry);

    let mut row = StateRow::new("fuzz");
    for (column, value) in input.columns.into_iter().take(32) {
        row.set(column, value);
    }
    let (aligned, _report) = schema.align(&row);
    assert_eq!(aligned.len(), schema.len());
    let _ = schema.activity_for(&aligned);
});
