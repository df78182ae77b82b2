//! Cycle-time and throughput KPIs.

use super::{duration_seconds, Trace};
use serde::Serialize;

/// Cycle-time statistics (seconds) and throughput (cases per day).
///
/// Cycle-time fields are `None` when no trace qualifies.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Kpis {
    pub case_count: usize,
    pub average_cycle_time: Option<f64>,
    pub min_cycle_time: Option<f64>,
    pub max_cycle_time: Option<f64>,
    pub throughput_cases_per_day: f64,
    /// Whole days between the earliest and latest event.
    pub span_days: i64,
}

/// Compute KPIs over all traces.
///
/// Throughput divides the case count by the whole-day span of the log.
/// A span shorter than one day reports the raw case count; no traces
/// reports zero.
pub fn compute_kpis(traces: &[Trace]) -> Kpis {
    let cycle_times: Vec<f64> = traces.iter().map(Trace::full_cycle_time).collect();

    let earliest = traces.iter().map(Trace::start_time).min();
    let latest = traces.iter().map(Trace::end_time).max();
    let span_days = match (earliest, latest) {
        (Some(lo), Some(hi)) => (hi - lo).num_days(),
        _ => 0,
    };

    let case_count = traces.len();
    let throughput_cases_per_day = if case_count == 0 {
        0.0
    } else if span_days > 0 {
        case_count as f64 / span_days as f64
    } else {
        case_count as f64
    };

    Kpis {
        case_count,
        average_cycle_time: pm_math::mean(&cycle_times),
        min_cycle_time: pm_math::min(&cycle_times),
        max_cycle_time: pm_math::max(&cycle_times),
        throughput_cases_per_day,
        span_days,
    }
}

/// Span of the whole set of traces in seconds.
pub fn total_span_seconds(traces: &[Trace]) -> f64 {
    let earliest = traces.iter().map(Trace::start_time).min();
    let latest = traces.iter().map(Trace::end_time).max();
    match (earliest, latest) {
        (Some(lo), Some(hi)) => duration_seconds(hi - lo),
        _ => 0.0,
    }
}
