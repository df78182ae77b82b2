//! Configuration validation errors and semantic validation.

use thiserror::Error;

use crate::settings::AnalysisConfig;

/// Validation result type.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Configuration validation errors.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("I/O error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("Version mismatch: expected {expected}, got {actual}")]
    VersionMismatch { expected: String, actual: String },
}

impl ValidationError {
    /// Error code for structured error reporting.
    pub fn code(&self) -> u32 {
        match self {
            ValidationError::IoError(_) => 60,
            ValidationError::ParseError(_) => 61,
            ValidationError::InvalidValue { .. } => 65,
            ValidationError::VersionMismatch { .. } => 66,
        }
    }

    fn invalid(field: &str, message: impl Into<String>) -> Self {
        ValidationError::InvalidValue {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

/// Validate an analysis configuration semantically.
pub fn validate_config(config: &AnalysisConfig) -> ValidationResult<()> {
    if config.schema_version != crate::CONFIG_SCHEMA_VERSION {
        return Err(ValidationError::VersionMismatch {
            expected: crate::CONFIG_SCHEMA_VERSION.to_string(),
            actual: config.schema_version.clone(),
        });
    }

    let sla = config.sla.threshold_seconds;
    if !sla.is_finite() || sla <= 0.0 {
        return Err(ValidationError::invalid(
            "sla.threshold_seconds",
            format!("must be a positive number of seconds (got {})", sla),
        ));
    }

    let model = &config.model;
    if model.n_estimators == 0 {
        return Err(ValidationError::invalid(
            "model.n_estimators",
            "must be at least 1",
        ));
    }
    if model.max_depth == Some(0) {
        return Err(ValidationError::invalid(
            "model.max_depth",
            "must be at least 1 when set",
        ));
    }
    if model.min_samples_split < 2 {
        return Err(ValidationError::invalid(
            "model.min_samples_split",
            format!("must be at least 2 (got {})", model.min_samples_split),
        ));
    }
    if model.min_samples_leaf < 1 {
        return Err(ValidationError::invalid(
            "model.min_samples_leaf",
            "must be at least 1",
        ));
    }
    if !(model.bootstrap_ratio > 0.0 && model.bootstrap_ratio <= 1.0) {
        return Err(ValidationError::invalid(
            "model.bootstrap_ratio",
            format!("must be in (0, 1] (got {})", model.bootstrap_ratio),
        ));
    }
    if !model.ridge_lambda.is_finite() || model.ridge_lambda <= 0.0 {
        return Err(ValidationError::invalid(
            "model.ridge_lambda",
            format!("must be positive (got {})", model.ridge_lambda),
        ));
    }

    let eval = &config.evaluation;
    if !(0.0..1.0).contains(&eval.test_fraction) {
        return Err(ValidationError::invalid(
            "evaluation.test_fraction",
            format!("must be in [0, 1) (got {})", eval.test_fraction),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&AnalysisConfig::default()).is_ok());
    }

    #[test]
    fn test_rejects_non_positive_sla() {
        let mut config = AnalysisConfig::default();
        config.sla.threshold_seconds = 0.0;
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("sla.threshold_seconds"));
    }

    #[test]
    fn test_rejects_zero_estimators() {
        let mut config = AnalysisConfig::default();
        config.model.n_estimators = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_rejects_non_positive_ridge_lambda() {
        let mut config = AnalysisConfig::default();
        config.model.ridge_lambda = 0.0;
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("model.ridge_lambda"));
        config.model.ridge_lambda = f64::NAN;
        assert!(validate_config(&config).is_err());
        config.model.ridge_lambda = 0.5;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_rejects_bad_test_fraction() {
        let mut config = AnalysisConfig::default();
        config.evaluation.test_fraction = 1.0;
        assert!(validate_config(&config).is_err());
        config.evaluation.test_fraction = -0.1;
        assert!(validate_config(&config).is_err());
        config.evaluation.test_fraction = 0.0;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_rejects_version_mismatch() {
        let mut config = AnalysisConfig::default();
        config.schema_version = "0.9.0".to_string();
        let err = validate_config(&config).unwrap_err();
        assert!(matches!(err, ValidationError::VersionMismatch { .. }));
        assert_eq!(err.code(), 66);
    }

    #[test]
    fn test_rejects_bad_tree_params() {
        let mut config = AnalysisConfig::default();
        config.model.min_samples_split = 1;
        assert!(validate_config(&config).is_err());

        let mut config = AnalysisConfig::default();
        config.model.max_depth = Some(0);
        assert!(validate_config(&config).is_err());

        let mut config = AnalysisConfig::default();
        config.model.bootstrap_ratio = 1.5;
        assert!(validate_config(&config).is_err());
    }
}
