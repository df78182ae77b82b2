//! Analysis configuration types.
//!
//! Mirrors `config.json`. Every section has serde defaults so a partial
//! file only overrides what it names.

use serde::{Deserialize, Serialize};

use crate::validate::ValidationError;

/// Root configuration for an analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Config schema version.
    #[serde(default = "default_schema_version")]
    pub schema_version: String,

    /// Service-level policy used for alerting.
    #[serde(default)]
    pub sla: SlaPolicy,

    /// Regression estimator selection and hyperparameters.
    #[serde(default)]
    pub model: ModelParams,

    /// Hold-out evaluation and sample alerting.
    #[serde(default)]
    pub evaluation: EvaluationParams,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            sla: SlaPolicy::default(),
            model: ModelParams::default(),
            evaluation: EvaluationParams::default(),
        }
    }
}

fn default_schema_version() -> String {
    crate::CONFIG_SCHEMA_VERSION.to_string()
}

impl AnalysisConfig {
    /// Load a config from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, ValidationError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ValidationError::IoError(format!("Failed to read {}: {}", path.display(), e))
        })?;

        Self::from_str(&content)
    }

    /// Parse a config from a JSON string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(json: &str) -> Result<Self, ValidationError> {
        serde_json::from_str(json)
            .map_err(|e| ValidationError::ParseError(format!("Invalid JSON: {}", e)))
    }

    /// Serialize to pretty JSON.
    pub fn to_json_pretty(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| "{}".to_string())
    }
}

/// SLA policy.
///
/// The threshold is the maximum acceptable total case duration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlaPolicy {
    /// Threshold in seconds.
    pub threshold_seconds: f64,
}

impl Default for SlaPolicy {
    fn default() -> Self {
        Self {
            threshold_seconds: 3600.0,
        }
    }
}

/// Which regression backend fits remaining cycle time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EstimatorKind {
    /// Bagged regression trees.
    #[default]
    RandomForest,
    /// Linear least squares with L2 penalty.
    Ridge,
}

impl std::fmt::Display for EstimatorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EstimatorKind::RandomForest => write!(f, "random_forest"),
            EstimatorKind::Ridge => write!(f, "ridge"),
        }
    }
}

impl std::str::FromStr for EstimatorKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "random_forest" | "random-forest" | "forest" | "rf" => Ok(EstimatorKind::RandomForest),
            "ridge" | "linear" => Ok(EstimatorKind::Ridge),
            _ => Err(format!("unknown estimator: {}", s)),
        }
    }
}

/// Estimator hyperparameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelParams {
    pub estimator: EstimatorKind,
    /// Number of trees in the forest.
    pub n_estimators: usize,
    /// Maximum tree depth (None = grow until leaves are pure or too small).
    pub max_depth: Option<usize>,
    /// Minimum samples required to split a node.
    pub min_samples_split: usize,
    /// Minimum samples in each leaf.
    pub min_samples_leaf: usize,
    /// Bootstrap sample size as a fraction of the training set.
    pub bootstrap_ratio: f64,
    /// Seed for bootstrap sampling.
    pub seed: u64,
    /// L2 penalty for ridge regression.
    pub ridge_lambda: f64,
}

impl Default for ModelParams {
    fn default() -> Self {
        Self {
            estimator: EstimatorKind::RandomForest,
            n_estimators: 100,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            bootstrap_ratio: 1.0,
            seed: 42,
            ridge_lambda: 1.0,
        }
    }
}

/// Hold-out evaluation parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationParams {
    /// Fraction of feature rows held out for scoring, in [0, 1).
    pub test_fraction: f64,
    /// Seed for the train/test shuffle.
    pub seed: u64,
    /// How many hold-out rows to run through alerting.
    pub sample_predictions: usize,
}

impl Default for EvaluationParams {
    fn default() -> Self {
        Self {
            test_fraction: 0.2,
            seed: 42,
            sample_predictions: 5,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AnalysisConfig::default();
        assert_eq!(config.schema_version, "1.0.0");
        assert_eq!(config.sla.threshold_seconds, 3600.0);
        assert_eq!(config.model.estimator, EstimatorKind::RandomForest);
        assert_eq!(config.model.n_estimators, 100);
        assert_eq!(config.model.seed, 42);
        assert_eq!(config.evaluation.test_fraction, 0.2);
        assert_eq!(config.evaluation.sample_predictions, 5);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config =
            AnalysisConfig::from_str(r#"{"sla": {"threshold_seconds": 7200}, "model": {"estimator": "ridge"}}"#)
                .unwrap();
        assert_eq!(config.sla.threshold_seconds, 7200.0);
        assert_eq!(config.model.estimator, EstimatorKind::Ridge);
        assert_eq!(config.model.n_estimators, 100);
        assert_eq!(config.evaluation, EvaluationParams::default());
    }

    #[test]
    fn test_invalid_json_is_parse_error() {
        let err = AnalysisConfig::from_str("{not json").unwrap_err();
        assert!(matches!(err, ValidationError::ParseError(_)));
    }

    #[test]
    fn test_estimator_kind_parse() {
        assert_eq!("forest".parse::<EstimatorKind>().unwrap(), EstimatorKind::RandomForest);
        assert_eq!("RIDGE".parse::<EstimatorKind>().unwrap(), EstimatorKind::Ridge);
        assert!("svm".parse::<EstimatorKind>().is_err());
        assert_eq!(EstimatorKind::RandomForest.to_string(), "random_forest");
    }

    #[test]
    fn test_round_trip_json() {
        let config = AnalysisConfig::default();
        let parsed = AnalysisConfig::from_str(&config.to_json_pretty()).unwrap();
        assert_eq!(parsed, config);
    }
}
