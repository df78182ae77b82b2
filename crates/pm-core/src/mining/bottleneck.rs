//! Bottleneck ranking by average inter-activity duration.
//!
//! The gap between two consecutive events is charged to the earlier
//! activity. Processing time and queue time are not distinguished; the
//! log carries no resource data to separate them.

use super::{duration_seconds, Trace};
use pm_math::RunningMean;
use serde::Serialize;
use std::collections::HashMap;

/// Maximum number of bottlenecks reported.
pub const BOTTLENECK_LIMIT: usize = 3;

/// Average time spent in (or waiting after) an activity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bottleneck {
    pub activity: String,
    pub average_duration: f64,
    pub samples: u64,
}

/// Average gap per activity across all traces, longest first.
///
/// Equal averages keep first-seen order. Activities that only ever end a
/// trace have no samples and are absent.
pub fn activity_durations(traces: &[Trace]) -> Vec<Bottleneck> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut stats: Vec<(&str, RunningMean)> = Vec::new();

    for trace in traces {
        for pair in trace.events().windows(2) {
            let gap = duration_seconds(pair[1].timestamp - pair[0].timestamp);
            let label = pair[0].activity.as_str();
            let slot = *index.entry(label).or_insert_with(|| {
                stats.push((label, RunningMean::new()));
                stats.len() - 1
            });
            stats[slot].1.push(gap);
        }
    }

    let mut ranked: Vec<Bottleneck> = stats
        .into_iter()
        .filter_map(|(label, acc)| {
            acc.mean().map(|average_duration| Bottleneck {
                activity: label.to_string(),
                average_duration,
                samples: acc.count(),
            })
        })
        .collect();
    ranked.sort_by(|a, b| b.average_duration.total_cmp(&a.average_duration));
    ranked
}

/// The top [`BOTTLENECK_LIMIT`] activities by average duration.
///
/// Empty when no trace has two or more events.
pub fn identify_bottlenecks(traces: &[Trace]) -> Vec<Bottleneck> {
    let mut ranked = activity_durations(traces);
    ranked.truncate(BOTTLENECK_LIMIT);
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::sample_event_log;
    use crate::log::{Event, EventLog};
    use crate::mining::build_traces;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_sample_log_top_three() {
        let traces = build_traces(&sample_event_log());
        let top = identify_bottlenecks(&traces);

        assert_eq!(top.len(), 3);
        // Pick Items: 45, 30, 60, 50 minutes
        assert_eq!(top[0].activity, "Pick Items");
        assert_eq!(top[0].average_duration, 2775.0);
        assert_eq!(top[0].samples, 4);
        // Process Payment: 30, 40 minutes
        assert_eq!(top[1].activity, "Process Payment");
        assert_eq!(top[1].average_duration, 2100.0);
        // Start Order: 15, 40, 20, 40 minutes
        assert_eq!(top[2].activity, "Start Order");
        assert_eq!(top[2].average_duration, 1725.0);
    }

    #[test]
    fn test_single_event_traces_have_no_bottlenecks() {
        let t = Utc.with_ymd_and_hms(2023, 1, 1, 8, 0, 0).unwrap();
        let log: EventLog = vec![Event::new(1u64, "A", t), Event::new(2u64, "B", t)]
            .into_iter()
            .collect();
        assert!(identify_bottlenecks(&build_traces(&log)).is_empty());
    }

    #[test]
    fn test_last_activity_never_reported() {
        let t = |m| Utc.with_ymd_and_hms(2023, 1, 1, 8, m, 0).unwrap();
        let log: EventLog = vec![Event::new(1u64, "A", t(0)), Event::new(1u64, "End", t(10))]
            .into_iter()
            .collect();
        let ranked = activity_durations(&build_traces(&log));
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].activity, "A");
        assert_eq!(ranked[0].average_duration, 600.0);
    }
}
