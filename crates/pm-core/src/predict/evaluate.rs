//! Hold-out evaluation and sampling.

use pm_common::Result;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::Serialize;

use super::features::FeatureMatrix;
use super::model::PredictiveModel;

/// Row indices of a shuffled train/test partition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrainTestSplit {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Shuffle `0..n` with `seed` and hold out `ceil(n * test_fraction)` rows.
///
/// At least one row always stays in the training set.
pub fn train_test_split(n: usize, test_fraction: f64, seed: u64) -> TrainTestSplit {
    if n == 0 {
        return TrainTestSplit {
            train: Vec::new(),
            test: Vec::new(),
        };
    }
    let fraction = test_fraction.clamp(0.0, 1.0);
    let n_test = ((n as f64 * fraction).ceil() as usize).min(n - 1);

    let mut order: Vec<usize> = (0..n).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    order.shuffle(&mut rng);

    let train = order.split_off(n_test);
    TrainTestSplit { train, test: order }
}

/// Up to `k` indices drawn without replacement from `pool`, seeded.
pub fn sample_indices(pool: &[usize], k: usize, seed: u64) -> Vec<usize> {
    let mut picked = pool.to_vec();
    let mut rng = StdRng::seed_from_u64(seed);
    picked.shuffle(&mut rng);
    picked.truncate(k);
    picked
}

/// Hold-out scores.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelEvaluation {
    pub train_rows: usize,
    pub test_rows: usize,
    /// Mean absolute error in seconds.
    pub mae: f64,
    /// `None` when the hold-out targets have zero variance.
    pub r2: Option<f64>,
}

/// Score a fitted model on held-out rows. `None` when there are none.
pub fn evaluate(model: &PredictiveModel, test: &FeatureMatrix) -> Result<Option<ModelEvaluation>> {
    if test.is_empty() {
        return Ok(None);
    }
    let predictions = model.predict(&test.state_rows())?;
    let truth = test.targets();
    let Some(mae) = pm_math::mean_absolute_error(&truth, &predictions.remaining) else {
        return Ok(None);
    };
    Ok(Some(ModelEvaluation {
        train_rows: model.training_rows(),
        test_rows: test.len(),
        mae,
        r2: pm_math::r2_score(&truth, &predictions.remaining),
    }))
}
