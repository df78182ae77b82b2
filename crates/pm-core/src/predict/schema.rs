//! Feature schema fixed at fit time, and alignment of inference rows to it.
//!
//! Inference rows are matched to the schema by column name:
//! - a schema column absent from the row is filled with zero
//! - a row column absent from the schema is dropped
//! - values are emitted in schema order
//!
//! Mismatches are recorded in an [`AlignmentReport`], never raised.

use pm_common::CaseId;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, BTreeSet};

use super::features::{ActivityRegistry, COL_TIME_SINCE_START, NUMERIC_COLUMNS};

/// A named-column inference row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateRow {
    pub case_id: CaseId,
    pub columns: BTreeMap<String, f64>,
}

impl StateRow {
    pub fn new(case_id: impl Into<CaseId>) -> Self {
        StateRow {
            case_id: case_id.into(),
            columns: BTreeMap::new(),
        }
    }

    /// Builder-style column setter.
    pub fn with(mut self, column: impl Into<String>, value: f64) -> Self {
        self.columns.insert(column.into(), value);
        self
    }

    pub fn set(&mut self, column: impl Into<String>, value: f64) {
        self.columns.insert(column.into(), value);
    }

    pub fn get(&self, column: &str) -> Option<f64> {
        self.columns.get(column).copied()
    }

    /// Elapsed seconds for the case, zero when the column is absent.
    pub fn time_since_start(&self) -> f64 {
        self.get(COL_TIME_SINCE_START).unwrap_or(0.0)
    }
}

/// Columns reconciled while aligning a batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlignmentReport {
    /// Schema columns missing from at least one row (filled with zero).
    pub filled: BTreeSet<String>,
    /// Row columns not in the schema (dropped).
    pub dropped: BTreeSet<String>,
}

impl AlignmentReport {
    /// True when every row matched the schema exactly.
    pub fn is_exact(&self) -> bool {
        self.filled.is_empty() && self.dropped.is_empty()
    }

    pub fn merge(&mut self, other: AlignmentReport) {
        self.filled.extend(other.filled);
        self.dropped.extend(other.dropped);
    }
}

/// Ordered feature columns a model was fitted on.
///
/// Numeric columns come first, then one indicator per activity in label
/// order. `version` fingerprints the ordered column list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureSchema {
    version: String,
    activities: Vec<String>,
    columns: Vec<String>,
}

impl FeatureSchema {
    pub fn from_registry(registry: &ActivityRegistry) -> Self {
        let mut columns: Vec<String> = NUMERIC_COLUMNS.iter().map(|c| c.to_string()).collect();
        columns.extend(registry.column_names());
        FeatureSchema {
            version: fingerprint(&columns),
            activities: registry.labels().to_vec(),
            columns,
        }
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn activities(&self) -> &[String] {
        &self.activities
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Offset of the first activity indicator in a dense row.
    pub fn activity_offset(&self) -> usize {
        NUMERIC_COLUMNS.len()
    }

    /// Project one row onto the schema.
    pub fn align(&self, row: &StateRow) -> (Vec<f64>, AlignmentReport) {
        let mut report = AlignmentReport::default();
        let values = self
            .columns
            .iter()
            .map(|col| match row.columns.get(col) {
                Some(v) => *v,
                None => {
                    report.filled.insert(col.clone());
                    0.0
                }
            })
            .collect();

        let known: BTreeSet<&str> = self.columns.iter().map(String::as_str).collect();
        for col in row.columns.keys() {
            if !known.contains(col.as_str()) {
                report.dropped.insert(col.clone());
            }
        }
        (values, report)
    }

    /// Project a batch of rows onto the schema, preserving row order.
    pub fn align_batch(&self, rows: &[StateRow]) -> (Vec<Vec<f64>>, AlignmentReport) {
        let mut report = AlignmentReport::default();
        let matrix = rows
            .iter()
            .map(|row| {
                let (values, r) = self.align(row);
                report.merge(r);
                values
            })
            .collect();
        (matrix, report)
    }

    /// Activity whose indicator holds the largest value in an aligned row.
    ///
    /// Ties, including a row with no indicator set, resolve to the first
    /// such column in schema order. `None` only when the schema has no
    /// activities.
    pub fn activity_for(&self, aligned: &[f64]) -> Option<&str> {
        let offset = self.activity_offset();
        let indicators = aligned.get(offset..)?;
        let mut best: Option<(usize, f64)> = None;
        for (i, &v) in indicators.iter().enumerate().take(self.activities.len()) {
            match best {
                Some((_, b)) if v <= b => {}
                _ => best = Some((i, v)),
            }
        }
        best.and_then(|(i, _)| self.activities.get(i).map(String::as_str))
    }
}

/// Short hex SHA-256 of the ordered column names.
fn fingerprint(columns: &[String]) -> String {
    let mut hasher = Sha256::new();
    for col in columns {
        hasher.update(col.as_bytes());
        hasher.update([0u8]);
    }
    hex::encode(&hasher.finalize()[..6])
}
