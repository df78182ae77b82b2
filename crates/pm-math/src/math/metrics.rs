//! Regression quality metrics.

use super::stats::{mean, sum_squared_error};

/// Mean absolute error between targets and predictions.
///
/// Returns `None` when the slices are empty or differ in length.
pub fn mean_absolute_error(y_true: &[f64], y_pred: &[f64]) -> Option<f64> {
    if y_true.is_empty() || y_true.len() != y_pred.len() {
        return None;
    }
    let total: f64 = y_true
        .iter()
        .zip(y_pred)
        .map(|(t, p)| (t - p).abs())
        .sum();
    Some(total / y_true.len() as f64)
}

/// Coefficient of determination.
///
/// Returns `None` when the slices are empty, differ in length, or the
/// targets have zero variance (R² is undefined there).
pub fn r2_score(y_true: &[f64], y_pred: &[f64]) -> Option<f64> {
    if y_true.len() != y_pred.len() {
        return None;
    }
    let center = mean(y_true)?;
    let ss_tot = sum_squared_error(y_true, center);
    if ss_tot == 0.0 {
        return None;
    }
    let ss_res: f64 = y_true
        .iter()
        .zip(y_pred)
        .map(|(t, p)| (t - p) * (t - p))
        .sum();
    Some(1.0 - ss_res / ss_tot)
}
