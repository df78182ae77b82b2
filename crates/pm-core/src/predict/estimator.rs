//! Regression estimator capability.
//!
//! The pipeline only needs `fit(X, y)` and `predict(X)`; any backend that
//! implements [`Estimator`] can be swapped in through configuration.

use pm_config::{EstimatorKind, ModelParams};
use thiserror::Error;

use super::forest::RandomForestRegressor;
use super::ridge::RidgeRegression;

/// Estimator fit/predict failures.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EstimatorError {
    #[error("empty training set")]
    EmptyTrainingSet,

    #[error("{rows} feature rows but {targets} targets")]
    LengthMismatch { rows: usize, targets: usize },

    #[error("expected {expected} features per row, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("non-finite value in training data")]
    NonFinite,

    #[error("normal equations are singular")]
    Singular,

    #[error("estimator has not been fitted")]
    NotFitted,
}

impl From<EstimatorError> for pm_common::Error {
    fn from(err: EstimatorError) -> Self {
        match err {
            EstimatorError::EmptyTrainingSet => pm_common::Error::NoTrainingData,
            EstimatorError::NotFitted => pm_common::Error::ModelNotFitted,
            other => pm_common::Error::Model(other.to_string()),
        }
    }
}

/// A regression backend.
pub trait Estimator: std::fmt::Debug + Send + Sync {
    /// Short name for logs and reports.
    fn name(&self) -> &'static str;

    /// Fit on dense rows `x` against targets `y`.
    fn fit(&mut self, x: &[Vec<f64>], y: &[f64]) -> Result<(), EstimatorError>;

    /// One prediction per row, in row order.
    fn predict(&self, x: &[Vec<f64>]) -> Result<Vec<f64>, EstimatorError>;

    fn is_fitted(&self) -> bool;
}

/// Build the configured estimator, unfitted.
pub fn build_estimator(params: &ModelParams) -> Box<dyn Estimator> {
    match params.estimator {
        EstimatorKind::RandomForest => Box::new(RandomForestRegressor::from_params(params)),
        EstimatorKind::Ridge => Box::new(RidgeRegression::new(params.ridge_lambda)),
    }
}

/// Shared input checks for `fit`. Returns the feature count.
pub(crate) fn check_training_data(x: &[Vec<f64>], y: &[f64]) -> Result<usize, EstimatorError> {
    if x.is_empty() {
        return Err(EstimatorError::EmptyTrainingSet);
    }
    if x.len() != y.len() {
        return Err(EstimatorError::LengthMismatch {
            rows: x.len(),
            targets: y.len(),
        });
    }
    let width = x[0].len();
    check_width(x, width)?;
    if y.iter().any(|v| !v.is_finite()) || x.iter().flatten().any(|v| !v.is_finite()) {
        return Err(EstimatorError::NonFinite);
    }
    Ok(width)
}

/// Every row must have `width` columns.
pub(crate) fn check_width(x: &[Vec<f64>], width: usize) -> Result<(), EstimatorError> {
    match x.iter().find(|row| row.len() != width) {
        Some(row) => Err(EstimatorError::DimensionMismatch {
            expected: width,
            actual: row.len(),
        }),
        None => Ok(()),
    }
}
