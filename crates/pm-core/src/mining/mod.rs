//! Descriptive process mining: traces, flow variants, KPIs, bottlenecks.

pub mod bottleneck;
pub mod flow;
pub mod kpi;
pub mod trace;

pub use bottleneck::{activity_durations, identify_bottlenecks, Bottleneck, BOTTLENECK_LIMIT};
pub use flow::{discover_flows, FlowVariant};
pub use kpi::{compute_kpis, Kpis};
pub use trace::{build_traces, Trace};

use chrono::TimeDelta;
use serde::{Deserialize, Serialize};

/// Activity sequence of a trace, timestamps dropped.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FlowKey(pub Vec<String>);

impl FlowKey {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for FlowKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.join(" -> "))
    }
}

/// Seconds in a signed duration, with microsecond precision.
pub fn duration_seconds(delta: TimeDelta) -> f64 {
    match delta.num_microseconds() {
        Some(us) => us as f64 / 1_000_000.0,
        None => delta.num_milliseconds() as f64 / 1_000.0,
    }
}
