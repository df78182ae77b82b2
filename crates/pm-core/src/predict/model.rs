//! Remaining-time model: a fitted estimator plus the feature schema it
//! was fitted on.

use pm_common::{Error, Result};
use pm_config::ModelParams;
use serde::Serialize;

use super::alert::Alert;
use super::estimator::{build_estimator, Estimator};
use super::features::FeatureMatrix;
use super::schema::{AlignmentReport, FeatureSchema, StateRow};

/// Predictions for a batch of inference rows.
#[derive(Debug, Clone, Serialize)]
pub struct Predictions {
    /// Predicted remaining seconds, one per row in input order.
    pub remaining: Vec<f64>,
    pub alignment: AlignmentReport,
}

/// Alerts for a batch of inference rows.
#[derive(Debug, Clone, Serialize)]
pub struct AlertBatch {
    pub alerts: Vec<Alert>,
    pub alignment: AlignmentReport,
}

impl AlertBatch {
    pub fn breached(&self) -> usize {
        self.alerts.iter().filter(|a| a.breached).count()
    }
}

/// A fitted remaining-cycle-time model.
///
/// Read-only after [`PredictiveModel::fit`]; the schema it records is
/// authoritative for every later prediction.
#[derive(Debug)]
pub struct PredictiveModel {
    schema: FeatureSchema,
    estimator: Box<dyn Estimator>,
    training_rows: usize,
}

impl PredictiveModel {
    /// Fit the configured estimator on historical feature rows.
    pub fn fit(training: &FeatureMatrix, params: &ModelParams) -> Result<Self> {
        Self::fit_with(training, build_estimator(params))
    }

    /// Fit a caller-supplied estimator.
    pub fn fit_with(training: &FeatureMatrix, mut estimator: Box<dyn Estimator>) -> Result<Self> {
        if training.is_empty() {
            return Err(Error::NoTrainingData);
        }
        let schema = FeatureSchema::from_registry(training.registry());
        estimator.fit(&training.dense(), &training.targets())?;
        tracing::debug!(
            estimator = estimator.name(),
            rows = training.len(),
            columns = schema.len(),
            schema_version = schema.version(),
            "estimator fitted"
        );
        Ok(PredictiveModel {
            schema,
            estimator,
            training_rows: training.len(),
        })
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    pub fn estimator_name(&self) -> &'static str {
        self.estimator.name()
    }

    pub fn training_rows(&self) -> usize {
        self.training_rows
    }

    /// Predict remaining seconds for named rows.
    ///
    /// Rows are aligned to the fit-time schema first; predictions are
    /// clamped at zero.
    pub fn predict(&self, rows: &[StateRow]) -> Result<Predictions> {
        let (aligned, alignment) = self.schema.align_batch(rows);
        let remaining = self.predict_aligned(&aligned)?;
        Ok(Predictions {
            remaining,
            alignment,
        })
    }

    /// Predict on rows already in schema order.
    pub fn predict_aligned(&self, aligned: &[Vec<f64>]) -> Result<Vec<f64>> {
        if aligned.is_empty() {
            return Ok(Vec::new());
        }
        let raw = self.estimator.predict(aligned)?;
        Ok(raw.into_iter().map(|v| v.max(0.0)).collect())
    }

    /// Predict and classify each row against the SLA threshold (seconds).
    pub fn predict_and_alert(&self, rows: &[StateRow], sla_threshold: f64) -> Result<AlertBatch> {
        let (aligned, alignment) = self.schema.align_batch(rows);
        if !alignment.is_exact() {
            tracing::debug!(
                filled = ?alignment.filled,
                dropped = ?alignment.dropped,
                "inference rows aligned to fit-time schema"
            );
        }
        let remaining = self.predict_aligned(&aligned)?;

        let alerts = rows
            .iter()
            .zip(&aligned)
            .zip(remaining)
            .map(|((row, values), predicted)| {
                let activity = self.schema.activity_for(values).unwrap_or_default();
                Alert::new(
                    row.case_id.clone(),
                    activity,
                    row.time_since_start(),
                    predicted,
                    sla_threshold,
                )
            })
            .collect();

        Ok(AlertBatch { alerts, alignment })
    }
}
