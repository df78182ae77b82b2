//! Feature engineering: one row per event with progress, elapsed time,
//! and the remaining-time target.

use crate::mining::{duration_seconds, Trace};
use chrono::{DateTime, Utc};
use pm_common::CaseId;
use serde::Serialize;
use std::collections::BTreeSet;

use super::schema::StateRow;

pub const COL_ACTIVITIES_COMPLETED: &str = "activities_completed";
pub const COL_TIME_SINCE_START: &str = "time_since_start";
pub const COL_CURRENT_ACTIVITY_DURATION: &str = "current_activity_duration";

/// Prefix of the one-hot activity indicator columns.
pub const ACTIVITY_PREFIX: &str = "activity_";

/// Numeric feature columns, in schema order.
pub const NUMERIC_COLUMNS: [&str; 3] = [
    COL_ACTIVITIES_COMPLETED,
    COL_TIME_SINCE_START,
    COL_CURRENT_ACTIVITY_DURATION,
];

/// Index of an activity label in an [`ActivityRegistry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ActivityId(pub usize);

/// Sorted, de-duplicated activity labels; one indicator column each.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ActivityRegistry {
    labels: Vec<String>,
}

impl ActivityRegistry {
    pub fn from_labels<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let set: BTreeSet<String> = labels.into_iter().map(Into::into).collect();
        ActivityRegistry {
            labels: set.into_iter().collect(),
        }
    }

    pub fn from_traces(traces: &[Trace]) -> Self {
        Self::from_labels(
            traces
                .iter()
                .flat_map(|t| t.events().iter().map(|e| e.activity.as_str())),
        )
    }

    pub fn id_of(&self, label: &str) -> Option<ActivityId> {
        self.labels
            .binary_search_by(|l| l.as_str().cmp(label))
            .ok()
            .map(ActivityId)
    }

    pub fn label(&self, id: ActivityId) -> Option<&str> {
        self.labels.get(id.0).map(String::as_str)
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Indicator column names (`activity_<label>`), in label order.
    pub fn column_names(&self) -> Vec<String> {
        self.labels.iter().map(|l| activity_column(l)).collect()
    }
}

/// Indicator column name for an activity label.
pub fn activity_column(label: &str) -> String {
    format!("{}{}", ACTIVITY_PREFIX, label)
}

/// Engineered features for one event.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureVector {
    pub case_id: CaseId,
    pub activity: String,
    pub activity_id: ActivityId,
    pub timestamp: DateTime<Utc>,
    pub activities_completed: usize,
    /// Seconds since the first event of the case.
    pub time_since_start: f64,
    /// Seconds since the previous event of the case (0 for the first).
    pub current_activity_duration: f64,
    /// Target: seconds until the last event of the case, never negative.
    pub remaining_cycle_time: f64,
    pub full_cycle_time: f64,
}

impl FeatureVector {
    /// Named inference row: numeric columns plus this event's indicator.
    ///
    /// Indicators of other activities are omitted and read as zero.
    pub fn to_state_row(&self) -> StateRow {
        StateRow::new(self.case_id.clone())
            .with(COL_ACTIVITIES_COMPLETED, self.activities_completed as f64)
            .with(COL_TIME_SINCE_START, self.time_since_start)
            .with(COL_CURRENT_ACTIVITY_DURATION, self.current_activity_duration)
            .with(activity_column(&self.activity), 1.0)
    }
}

/// Feature rows for a set of traces, plus the registry their activity ids
/// refer to.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FeatureMatrix {
    registry: ActivityRegistry,
    rows: Vec<FeatureVector>,
}

impl FeatureMatrix {
    pub fn registry(&self) -> &ActivityRegistry {
        &self.registry
    }

    pub fn rows(&self) -> &[FeatureVector] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn case_count(&self) -> usize {
        self.rows
            .iter()
            .map(|r| &r.case_id)
            .collect::<BTreeSet<_>>()
            .len()
    }

    /// Subset of rows by index, sharing this matrix's registry.
    pub fn select(&self, indices: &[usize]) -> FeatureMatrix {
        FeatureMatrix {
            registry: self.registry.clone(),
            rows: indices
                .iter()
                .filter_map(|&i| self.rows.get(i).cloned())
                .collect(),
        }
    }

    /// Dense row in `[numeric..., one-hot...]` order.
    pub fn dense_row(&self, row: &FeatureVector) -> Vec<f64> {
        let mut values = Vec::with_capacity(NUMERIC_COLUMNS.len() + self.registry.len());
        values.push(row.activities_completed as f64);
        values.push(row.time_since_start);
        values.push(row.current_activity_duration);
        values.extend((0..self.registry.len()).map(|i| {
            if row.activity_id.0 == i {
                1.0
            } else {
                0.0
            }
        }));
        values
    }

    pub fn dense(&self) -> Vec<Vec<f64>> {
        self.rows.iter().map(|r| self.dense_row(r)).collect()
    }

    pub fn targets(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.remaining_cycle_time).collect()
    }

    pub fn state_rows(&self) -> Vec<StateRow> {
        self.rows.iter().map(FeatureVector::to_state_row).collect()
    }
}

/// Expand every event of every trace into a feature row.
///
/// Rows follow trace order, then position within the trace.
pub fn engineer_features(traces: &[Trace]) -> FeatureMatrix {
    let registry = ActivityRegistry::from_traces(traces);
    let mut rows = Vec::with_capacity(traces.iter().map(Trace::len).sum());

    for trace in traces {
        let start = trace.start_time();
        let full_cycle_time = trace.full_cycle_time();
        let events = trace.events();

        for (i, event) in events.iter().enumerate() {
            let time_since_start = duration_seconds(event.timestamp - start);
            let current_activity_duration = if i > 0 {
                duration_seconds(event.timestamp - events[i - 1].timestamp)
            } else {
                0.0
            };
            let remaining_cycle_time = (full_cycle_time - time_since_start).max(0.0);
            let Some(activity_id) = registry.id_of(&event.activity) else {
                continue;
            };

            rows.push(FeatureVector {
                case_id: trace.case_id().clone(),
                activity: event.activity.clone(),
                activity_id,
                timestamp: event.timestamp,
                activities_completed: i + 1,
                time_since_start,
                current_activity_duration,
                remaining_cycle_time,
                full_cycle_time,
            });
        }
    }

    FeatureMatrix { registry, rows }
}
