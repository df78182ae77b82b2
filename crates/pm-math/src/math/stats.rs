//! Summary statistics over duration samples.
//!
//! Callers filter non-finite values first. Empty input yields `None`
//! rather than a division by zero.

use serde::{Deserialize, Serialize};

/// Arithmetic mean, or `None` for empty input.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(kahan_sum(values) / values.len() as f64)
}

/// Minimum value, or `None` for empty input.
pub fn min(values: &[f64]) -> Option<f64> {
    values.iter().copied().reduce(f64::min)
}

/// Maximum value, or `None` for empty input.
pub fn max(values: &[f64]) -> Option<f64> {
    values.iter().copied().reduce(f64::max)
}

/// Population variance, or `None` for empty input.
pub fn variance(values: &[f64]) -> Option<f64> {
    let m = mean(values)?;
    Some(sum_squared_error(values, m) / values.len() as f64)
}

/// Sum of squared deviations from `center`.
pub fn sum_squared_error(values: &[f64], center: f64) -> f64 {
    values.iter().map(|v| (v - center) * (v - center)).sum()
}

/// Compensated summation.
pub fn kahan_sum(values: &[f64]) -> f64 {
    let mut sum = 0.0;
    let mut comp = 0.0;
    for v in values {
        let y = v - comp;
        let t = sum + y;
        comp = (t - sum) - y;
        sum = t;
    }
    sum
}

/// Streaming mean (Welford) for per-key aggregation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RunningMean {
    count: u64,
    mean: f64,
    m2: f64,
}

impl RunningMean {
    /// Create an empty accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one sample.
    pub fn push(&mut self, value: f64) {
        self.count += 1;
        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (value - self.mean);
    }

    /// Number of samples seen.
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Current mean, `None` before the first sample.
    pub fn mean(&self) -> Option<f64> {
        (self.count > 0).then_some(self.mean)
    }

    /// Population variance, `None` before the first sample.
    pub fn variance(&self) -> Option<f64> {
        (self.count > 0).then(|| self.m2 / self.count as f64)
    }
}

impl Extend<f64> for RunningMean {
    fn extend<I: IntoIterator<Item = f64>>(&mut self, iter: I) {
        for v in iter {
            self.push(v);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() <= tol
    }

    #[test]
    fn mean_empty_is_none() {
        assert!(mean(&[]).is_none());
        assert!(min(&[]).is_none());
        assert!(max(&[]).is_none());
        assert!(variance(&[]).is_none());
    }

    #[test]
    fn mean_min_max_basic() {
        let v = [5400.0, 4200.0];
        assert!(approx_eq(mean(&v).unwrap(), 4800.0, 1e-12));
        assert_eq!(min(&v), Some(4200.0));
        assert_eq!(max(&v), Some(5400.0));
    }

    #[test]
    fn variance_of_constant_is_zero() {
        assert_eq!(variance(&[3.0, 3.0, 3.0]), Some(0.0));
    }

    #[test]
    fn kahan_sum_small_increments() {
        let mut v = vec![1e16];
        v.extend(std::iter::repeat(1.0).take(1000));
        assert!(approx_eq(kahan_sum(&v), 1e16 + 1000.0, 1.0));
    }

    #[test]
    fn running_mean_matches_batch() {
        let samples = [900.0, 1800.0, 2700.0, 2400.0];
        let mut acc = RunningMean::new();
        acc.extend(samples.iter().copied());
        assert_eq!(acc.count(), 4);
        assert!(approx_eq(acc.mean().unwrap(), mean(&samples).unwrap(), 1e-9));
        assert!(approx_eq(
            acc.variance().unwrap(),
            variance(&samples).unwrap(),
            1e-6
        ));
    }

    #[test]
    fn running_mean_empty() {
        let acc = RunningMean::new();
        assert!(acc.mean().is_none());
        assert!(acc.variance().is_none());
    }
}
