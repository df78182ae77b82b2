//! Ridge regression via the normal equations.
//!
//! Features are centered and scaled to unit variance before solving
//! `(ZᵀZ + λI) w = Zᵀy`, so the intercept is not penalised and the pivot
//! tolerance does not depend on the units of the inputs. Constant columns
//! carry no information and get a zero coefficient.

use serde::Serialize;

use super::estimator::{check_training_data, check_width, Estimator, EstimatorError};

/// Relative spread below which a column counts as constant.
const MIN_COLUMN_SCALE: f64 = 1e-9;

/// Linear least squares with an L2 penalty.
#[derive(Debug, Clone, Serialize)]
pub struct RidgeRegression {
    lambda: f64,
    coefficients: Vec<f64>,
    intercept: f64,
    fitted: bool,
}

impl RidgeRegression {
    pub fn new(lambda: f64) -> Self {
        RidgeRegression {
            lambda: lambda.max(0.0),
            coefficients: Vec::new(),
            intercept: 0.0,
            fitted: false,
        }
    }

    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }
}

impl Estimator for RidgeRegression {
    fn name(&self) -> &'static str {
        "ridge"
    }

    fn fit(&mut self, x: &[Vec<f64>], y: &[f64]) -> Result<(), EstimatorError> {
        let width = check_training_data(x, y)?;
        let n = x.len() as f64;

        let x_mean: Vec<f64> = (0..width)
            .map(|j| x.iter().map(|row| row[j]).sum::<f64>() / n)
            .collect();
        let x_scale: Vec<f64> = (0..width)
            .map(|j| {
                let var = x.iter().map(|row| (row[j] - x_mean[j]).powi(2)).sum::<f64>() / n;
                var.sqrt()
            })
            .collect();
        let y_mean = y.iter().sum::<f64>() / n;

        let active: Vec<usize> = (0..width)
            .filter(|&j| x_scale[j] > MIN_COLUMN_SCALE * x_mean[j].abs().max(1.0))
            .collect();
        let k = active.len();

        // Gram matrix and right-hand side on standardized data
        let mut gram = vec![vec![0.0; k]; k];
        let mut rhs = vec![0.0; k];
        let mut z = vec![0.0; k];
        for (row, &target) in x.iter().zip(y) {
            for (slot, &j) in active.iter().enumerate() {
                z[slot] = (row[j] - x_mean[j]) / x_scale[j];
            }
            let yc = target - y_mean;
            for a in 0..k {
                rhs[a] += z[a] * yc;
                for b in a..k {
                    gram[a][b] += z[a] * z[b];
                }
            }
        }
        for a in 0..k {
            for b in 0..a {
                gram[a][b] = gram[b][a];
            }
            gram[a][a] += self.lambda;
        }

        let scaled = solve(gram, rhs)?;
        let mut weights = vec![0.0; width];
        for (&j, w) in active.iter().zip(scaled) {
            weights[j] = w / x_scale[j];
        }
        self.intercept = y_mean - weights.iter().zip(&x_mean).map(|(w, m)| w * m).sum::<f64>();
        self.coefficients = weights;
        self.fitted = true;
        Ok(())
    }

    fn predict(&self, x: &[Vec<f64>]) -> Result<Vec<f64>, EstimatorError> {
        if !self.fitted {
            return Err(EstimatorError::NotFitted);
        }
        check_width(x, self.coefficients.len())?;
        Ok(x.iter()
            .map(|row| {
                self.intercept
                    + row
                        .iter()
                        .zip(&self.coefficients)
                        .map(|(v, w)| v * w)
                        .sum::<f64>()
            })
            .collect())
    }

    fn is_fitted(&self) -> bool {
        self.fitted
    }
}

/// Gaussian elimination with partial pivoting.
fn solve(mut a: Vec<Vec<f64>>, mut b: Vec<f64>) -> Result<Vec<f64>, EstimatorError> {
    let n = b.len();
    let scale = a
        .iter()
        .flatten()
        .fold(0.0_f64, |acc, v| acc.max(v.abs()))
        .max(1.0);
    let tol = scale * 1e-12;

    for col in 0..n {
        let pivot = (col..n)
            .max_by(|&i, &j| a[i][col].abs().total_cmp(&a[j][col].abs()))
            .unwrap_or(col);
        if a[pivot][col].abs() <= tol {
            return Err(EstimatorError::Singular);
        }
        a.swap(col, pivot);
        b.swap(col, pivot);

        for row in col + 1..n {
            let factor = a[row][col] / a[col][col];
            if factor == 0.0 {
                continue;
            }
            for k in col..n {
                a[row][k] -= factor * a[col][k];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut x = vec![0.0; n];
    for row in (0..n).rev() {
        let tail: f64 = (row + 1..n).map(|k| a[row][k] * x[k]).sum();
        x[row] = (b[row] - tail) / a[row][row];
    }
    Ok(x)
}
