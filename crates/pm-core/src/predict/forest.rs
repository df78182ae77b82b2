//! Random forest regression.
//!
//! Bagged CART regression trees: each tree is grown on a bootstrap sample
//! with variance-reduction splits over every feature, and the forest
//! predicts the mean of its trees. Bootstrap draws come from a seeded
//! `StdRng`, so a given seed and training set always yield the same forest.

use pm_config::ModelParams;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

use super::estimator::{check_training_data, check_width, Estimator, EstimatorError};

#[derive(Debug, Clone, Serialize)]
enum Node {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

/// A single regression tree stored as a node arena; node 0 is the root.
#[derive(Debug, Clone, Serialize)]
pub struct RegressionTree {
    nodes: Vec<Node>,
}

/// Tree growth limits.
#[derive(Debug, Clone, Copy)]
struct GrowParams {
    max_depth: Option<usize>,
    min_samples_split: usize,
    min_samples_leaf: usize,
}

struct BestSplit {
    feature: usize,
    threshold: f64,
    score: f64,
}

impl RegressionTree {
    /// Grow from an explicit stack of pending nodes; depth is limited only
    /// by `max_depth` and the data.
    fn grow(x: &[Vec<f64>], y: &[f64], sample: Vec<usize>, params: GrowParams) -> Self {
        let mut nodes = vec![Node::Leaf {
            value: mean_of(y, &sample),
        }];
        let mut pending = vec![(0, sample, 0)];

        while let Some((id, sample, depth)) = pending.pop() {
            let Some((feature, threshold)) = choose_split(x, y, &sample, depth, params) else {
                continue;
            };
            let (left, right): (Vec<usize>, Vec<usize>) = sample
                .into_iter()
                .partition(|&i| x[i][feature] <= threshold);

            let left_id = nodes.len();
            let right_id = left_id + 1;
            nodes.push(Node::Leaf {
                value: mean_of(y, &left),
            });
            nodes.push(Node::Leaf {
                value: mean_of(y, &right),
            });
            nodes[id] = Node::Split {
                feature,
                threshold,
                left: left_id,
                right: right_id,
            };
            pending.push((right_id, right, depth + 1));
            pending.push((left_id, left, depth + 1));
        }
        RegressionTree { nodes }
    }

    pub fn predict_row(&self, row: &[f64]) -> f64 {
        let mut id = 0;
        loop {
            match &self.nodes[id] {
                Node::Leaf { value } => return *value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    let v = row.get(*feature).copied().unwrap_or(0.0);
                    id = if v <= *threshold { *left } else { *right };
                }
            }
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn depth(&self) -> usize {
        let mut deepest = 0;
        let mut stack = vec![(0, 0)];
        while let Some((id, depth)) = stack.pop() {
            match self.nodes.get(id) {
                Some(Node::Split { left, right, .. }) => {
                    stack.push((*left, depth + 1));
                    stack.push((*right, depth + 1));
                }
                Some(Node::Leaf { .. }) => deepest = deepest.max(depth),
                None => {}
            }
        }
        deepest
    }
}

fn mean_of(y: &[f64], sample: &[usize]) -> f64 {
    if sample.is_empty() {
        0.0
    } else {
        sample.iter().map(|&i| y[i]).sum::<f64>() / sample.len() as f64
    }
}

/// Split for a node, or `None` when it stays a leaf.
fn choose_split(
    x: &[Vec<f64>],
    y: &[f64],
    sample: &[usize],
    depth: usize,
    params: GrowParams,
) -> Option<(usize, f64)> {
    let n = sample.len();
    let depth_reached = params.max_depth.is_some_and(|d| depth >= d);
    if depth_reached || n < params.min_samples_split || n < 2 * params.min_samples_leaf {
        return None;
    }
    let mean = mean_of(y, sample);
    let sse: f64 = sample.iter().map(|&i| (y[i] - mean).powi(2)).sum();
    if sse <= f64::EPSILON {
        return None;
    }

    let best = best_split(x, y, sample, params.min_samples_leaf)?;
    // parent SSE minus children SSE
    if sse - best.score <= f64::EPSILON * sse.max(1.0) {
        return None;
    }
    Some((best.feature, best.threshold))
}

/// Lowest children-SSE split over all features, honouring the leaf size.
fn best_split(
    x: &[Vec<f64>],
    y: &[f64],
    sample: &[usize],
    min_leaf: usize,
) -> Option<BestSplit> {
    let n = sample.len();
    let width = x[sample[0]].len();
    let total_sum: f64 = sample.iter().map(|&i| y[i]).sum();
    let total_sq: f64 = sample.iter().map(|&i| y[i] * y[i]).sum();
    let mut best: Option<BestSplit> = None;
    let mut order = sample.to_vec();

    for feature in 0..width {
        order.sort_by(|&a, &b| x[a][feature].total_cmp(&x[b][feature]));

        let mut left_sum = 0.0;
        let mut left_sq = 0.0;
        for k in 0..n - 1 {
            let yi = y[order[k]];
            left_sum += yi;
            left_sq += yi * yi;

            let left_n = k + 1;
            let right_n = n - left_n;
            if left_n < min_leaf || right_n < min_leaf {
                continue;
            }
            let here = x[order[k]][feature];
            let next = x[order[k + 1]][feature];
            if here >= next {
                continue;
            }

            let right_sum = total_sum - left_sum;
            let right_sq = total_sq - left_sq;
            let score = (left_sq - left_sum * left_sum / left_n as f64)
                + (right_sq - right_sum * right_sum / right_n as f64);

            if best.as_ref().map_or(true, |b| score < b.score) {
                best = Some(BestSplit {
                    feature,
                    threshold: here + (next - here) / 2.0,
                    score,
                });
            }
        }
    }
    best
}

/// Bagged regression-tree ensemble.
#[derive(Debug, Clone, Serialize)]
pub struct RandomForestRegressor {
    n_estimators: usize,
    max_depth: Option<usize>,
    min_samples_split: usize,
    min_samples_leaf: usize,
    bootstrap_ratio: f64,
    seed: u64,
    n_features: Option<usize>,
    trees: Vec<RegressionTree>,
}

impl RandomForestRegressor {
    pub fn new(n_estimators: usize, seed: u64) -> Self {
        RandomForestRegressor {
            n_estimators: n_estimators.max(1),
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            bootstrap_ratio: 1.0,
            seed,
            n_features: None,
            trees: Vec::new(),
        }
    }

    pub fn from_params(params: &ModelParams) -> Self {
        Self::new(params.n_estimators, params.seed)
            .with_max_depth(params.max_depth)
            .with_min_samples(params.min_samples_split, params.min_samples_leaf)
            .with_bootstrap_ratio(params.bootstrap_ratio)
    }

    pub fn with_max_depth(mut self, max_depth: Option<usize>) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_min_samples(mut self, split: usize, leaf: usize) -> Self {
        self.min_samples_split = split.max(2);
        self.min_samples_leaf = leaf.max(1);
        self
    }

    pub fn with_bootstrap_ratio(mut self, ratio: f64) -> Self {
        self.bootstrap_ratio = if ratio > 0.0 { ratio.min(1.0) } else { 1.0 };
        self
    }

    pub fn trees(&self) -> &[RegressionTree] {
        &self.trees
    }
}

impl Estimator for RandomForestRegressor {
    fn name(&self) -> &'static str {
        "random_forest"
    }

    fn fit(&mut self, x: &[Vec<f64>], y: &[f64]) -> Result<(), EstimatorError> {
        let width = check_training_data(x, y)?;
        let n = x.len();
        let draws = ((n as f64 * self.bootstrap_ratio).round() as usize).clamp(1, n);
        let params = GrowParams {
            max_depth: self.max_depth,
            min_samples_split: self.min_samples_split,
            min_samples_leaf: self.min_samples_leaf,
        };

        let mut rng = StdRng::seed_from_u64(self.seed);
        self.trees = (0..self.n_estimators)
            .map(|_| {
                let sample: Vec<usize> = (0..draws).map(|_| rng.random_range(0..n)).collect();
                RegressionTree::grow(x, y, sample, params)
            })
            .collect();
        self.n_features = Some(width);
        Ok(())
    }

    fn predict(&self, x: &[Vec<f64>]) -> Result<Vec<f64>, EstimatorError> {
        let width = self.n_features.ok_or(EstimatorError::NotFitted)?;
        check_width(x, width)?;
        let n_trees = self.trees.len() as f64;
        Ok(x.iter()
            .map(|row| self.trees.iter().map(|t| t.predict_row(row)).sum::<f64>() / n_trees)
            .collect())
    }

    fn is_fitted(&self) -> bool {
        self.n_features.is_some()
    }
}
