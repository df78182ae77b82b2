//! Error types for Process Mining.
//!
//! This module provides structured error handling with:
//! - Stable error codes for machine parsing
//! - Category classification for error grouping
//! - Recoverability hints for automation
//! - Remediation suggestions for humans
//!
//! # Human-Facing Output
//!
//! ```text
//! ✗ Missing Column
//!   Reason: event log is missing required column 'timestamp'
//!   Fix: The event log must provide case_id, activity and timestamp columns.
//! ```
//!
//! # Agent-Facing Output
//!
//! ```json
//! {
//!   "code": 21,
//!   "category": "ingestion",
//!   "message": "event log is missing required column 'timestamp'",
//!   "recoverable": true,
//!   "suggested_action": "fix_input",
//!   "context": { "column": "timestamp" }
//! }
//! ```
//!
//! Schema drift between training and prediction is deliberately absent from
//! this taxonomy: it is reconciled in place and never surfaces as an error.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for Process Mining operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error categories for grouping related errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Configuration file errors.
    Config,
    /// Event log ingestion errors (missing file, schema mismatch).
    Ingestion,
    /// Not enough data for a stage to produce a result.
    Data,
    /// Estimator fit/predict errors.
    Model,
    /// File I/O and serialization errors.
    Io,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCategory::Config => write!(f, "config"),
            ErrorCategory::Ingestion => write!(f, "ingestion"),
            ErrorCategory::Data => write!(f, "data"),
            ErrorCategory::Model => write!(f, "model"),
            ErrorCategory::Io => write!(f, "io"),
        }
    }
}

/// Suggested actions for agents to take in response to errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestedAction {
    /// Retry the operation.
    Retry,
    /// Reset configuration to defaults.
    ResetConfig,
    /// Run config validation.
    RunCheck,
    /// Correct the input file and rerun.
    FixInput,
    /// Supply a larger event log.
    ProvideMoreData,
    /// Abort the operation.
    Abort,
    /// Manual intervention required.
    ManualIntervention,
}

impl std::fmt::Display for SuggestedAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SuggestedAction::Retry => write!(f, "retry"),
            SuggestedAction::ResetConfig => write!(f, "reset_config"),
            SuggestedAction::RunCheck => write!(f, "run_check"),
            SuggestedAction::FixInput => write!(f, "fix_input"),
            SuggestedAction::ProvideMoreData => write!(f, "provide_more_data"),
            SuggestedAction::Abort => write!(f, "abort"),
            SuggestedAction::ManualIntervention => write!(f, "manual_intervention"),
        }
    }
}

/// Unified error type for Process Mining.
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors (10-19)
    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    // Ingestion errors (20-29)
    #[error("event log not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    #[error("event log is missing required column '{column}'")]
    MissingColumn { column: String },

    #[error("malformed record at line {line}: {message}")]
    InvalidRecord { line: usize, message: String },

    #[error("unparseable timestamp '{value}' at line {line}")]
    InvalidTimestamp { line: usize, value: String },

    #[error("unsupported event log format: {0}")]
    UnsupportedFormat(String),

    // Insufficient data (30-39)
    #[error("no data available for stage '{stage}'")]
    EmptyInput { stage: String },

    #[error("no data to train the model")]
    NoTrainingData,

    // Model errors (40-49)
    #[error("model error: {0}")]
    Model(String),

    #[error("model has not been fitted")]
    ModelNotFitted,

    // I/O errors (60-69)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Returns the error code for this error type.
    ///
    /// Error codes are stable and grouped by category:
    /// - 10-19: Configuration errors
    /// - 20-29: Ingestion errors
    /// - 30-39: Insufficient data
    /// - 40-49: Model errors
    /// - 60-69: I/O errors
    pub fn code(&self) -> u32 {
        match self {
            Error::Config(_) => 10,
            Error::InvalidConfig(_) => 11,
            Error::FileNotFound { .. } => 20,
            Error::MissingColumn { .. } => 21,
            Error::InvalidRecord { .. } => 22,
            Error::InvalidTimestamp { .. } => 23,
            Error::UnsupportedFormat(_) => 24,
            Error::EmptyInput { .. } => 30,
            Error::NoTrainingData => 31,
            Error::Model(_) => 40,
            Error::ModelNotFitted => 41,
            Error::Io(_) => 60,
            Error::Json(_) => 61,
        }
    }

    /// Returns the error category for grouping and filtering.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Config(_) | Error::InvalidConfig(_) => ErrorCategory::Config,

            Error::FileNotFound { .. }
            | Error::MissingColumn { .. }
            | Error::InvalidRecord { .. }
            | Error::InvalidTimestamp { .. }
            | Error::UnsupportedFormat(_) => ErrorCategory::Ingestion,

            Error::EmptyInput { .. } | Error::NoTrainingData => ErrorCategory::Data,

            Error::Model(_) | Error::ModelNotFitted => ErrorCategory::Model,

            Error::Io(_) | Error::Json(_) => ErrorCategory::Io,
        }
    }

    /// Returns whether this error is potentially recoverable.
    ///
    /// Ingestion problems are recoverable by fixing the input; a model that
    /// was never fitted indicates a programming error.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Error::Config(_) | Error::InvalidConfig(_) => true,

            Error::FileNotFound { .. } => true,
            Error::MissingColumn { .. } => true,
            Error::InvalidRecord { .. } => true,
            Error::InvalidTimestamp { .. } => true,
            Error::UnsupportedFormat(_) => true,

            Error::EmptyInput { .. } => true,
            Error::NoTrainingData => true,

            Error::Model(_) => true,
            Error::ModelNotFitted => false,

            Error::Io(_) => true,
            Error::Json(_) => true,
        }
    }

    /// Returns the suggested action for agents.
    pub fn suggested_action(&self) -> SuggestedAction {
        match self {
            Error::Config(_) => SuggestedAction::RunCheck,
            Error::InvalidConfig(_) => SuggestedAction::ResetConfig,

            Error::FileNotFound { .. }
            | Error::MissingColumn { .. }
            | Error::InvalidRecord { .. }
            | Error::InvalidTimestamp { .. }
            | Error::UnsupportedFormat(_) => SuggestedAction::FixInput,

            Error::EmptyInput { .. } | Error::NoTrainingData => SuggestedAction::ProvideMoreData,

            Error::Model(_) => SuggestedAction::ManualIntervention,
            Error::ModelNotFitted => SuggestedAction::Abort,

            Error::Io(_) => SuggestedAction::Retry,
            Error::Json(_) => SuggestedAction::FixInput,
        }
    }

    /// Returns a human-readable remediation hint.
    pub fn remediation(&self) -> &'static str {
        match self {
            Error::Config(_) => {
                "Run 'pm-core config validate' to check the configuration file."
            }
            Error::InvalidConfig(_) => {
                "Fix the reported field or remove the config file to fall back to defaults."
            }
            Error::FileNotFound { .. } => "Check the event log path and try again.",
            Error::MissingColumn { .. } => {
                "The event log must provide case_id, activity and timestamp columns."
            }
            Error::InvalidRecord { .. } => {
                "Fix the malformed row; each row needs a value for every required column."
            }
            Error::InvalidTimestamp { .. } => {
                "Use RFC 3339 or 'YYYY-MM-DD HH:MM:SS' timestamps."
            }
            Error::UnsupportedFormat(_) => "Provide the event log as .csv, .json or .jsonl.",
            Error::EmptyInput { .. } => "The event log holds no usable events for this stage.",
            Error::NoTrainingData => {
                "Provide historical cases with at least one event to train the model."
            }
            Error::Model(_) => {
                "Estimator failed on this data. Try the other estimator in the config."
            }
            Error::ModelNotFitted => "Internal error: prediction requested before fit.",
            Error::Io(_) => "Check file permissions and disk space, then retry.",
            Error::Json(_) => "Invalid JSON. Check the file syntax.",
        }
    }

    /// Returns a short headline for human-readable output.
    pub fn headline(&self) -> &'static str {
        match self {
            Error::Config(_) => "Configuration Error",
            Error::InvalidConfig(_) => "Invalid Configuration",
            Error::FileNotFound { .. } => "Event Log Not Found",
            Error::MissingColumn { .. } => "Missing Column",
            Error::InvalidRecord { .. } => "Malformed Record",
            Error::InvalidTimestamp { .. } => "Invalid Timestamp",
            Error::UnsupportedFormat(_) => "Unsupported Format",
            Error::EmptyInput { .. } => "Insufficient Data",
            Error::NoTrainingData => "No Training Data",
            Error::Model(_) => "Model Error",
            Error::ModelNotFitted => "Model Not Fitted",
            Error::Io(_) => "I/O Error",
            Error::Json(_) => "JSON Parse Error",
        }
    }
}

/// Structured error response for JSON output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuredError {
    /// Stable error code.
    pub code: u32,

    /// Error category for grouping.
    pub category: ErrorCategory,

    /// Human-readable error message.
    pub message: String,

    /// Whether the error is potentially recoverable.
    pub recoverable: bool,

    /// Suggested action for agents.
    pub suggested_action: SuggestedAction,

    /// Additional structured context (e.g., path, column, line).
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub context: HashMap<String, serde_json::Value>,
}

impl From<&Error> for StructuredError {
    fn from(err: &Error) -> Self {
        let mut context = HashMap::new();

        match err {
            Error::FileNotFound { path } => {
                context.insert("path".to_string(), serde_json::json!(path.display().to_string()));
            }
            Error::MissingColumn { column } => {
                context.insert("column".to_string(), serde_json::json!(column));
            }
            Error::InvalidRecord { line, .. } => {
                context.insert("line".to_string(), serde_json::json!(line));
            }
            Error::InvalidTimestamp { line, value } => {
                context.insert("line".to_string(), serde_json::json!(line));
                context.insert("value".to_string(), serde_json::json!(value));
            }
            Error::EmptyInput { stage } => {
                context.insert("stage".to_string(), serde_json::json!(stage));
            }
            _ => {}
        }

        StructuredError {
            code: err.code(),
            category: err.category(),
            message: err.to_string(),
            recoverable: err.is_recoverable(),
            suggested_action: err.suggested_action(),
            context,
        }
    }
}

impl StructuredError {
    /// Add additional context to the error.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        if let Ok(v) = serde_json::to_value(value) {
            self.context.insert(key.into(), v);
        }
        self
    }

    /// Serialize to JSON string.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            format!(r#"{{"code":{},"error":"serialization_failed"}}"#, self.code)
        })
    }

    /// Serialize to pretty JSON string.
    pub fn to_json_pretty(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| self.to_json())
    }
}

/// Format an error for human-readable stderr output.
///
/// Output format:
/// ```text
/// ✗ [Headline]
///   Reason: [Error message]
///   Fix: [Remediation hint]
/// ```
pub fn format_error_human(err: &Error, use_color: bool) -> String {
    let (red, cyan, reset) = if use_color {
        ("\x1b[31m", "\x1b[36m", "\x1b[0m")
    } else {
        ("", "", "")
    };

    format!(
        "{red}✗{reset} {headline}\n  Reason: {message}\n  {cyan}Fix:{reset} {remediation}",
        red = red,
        cyan = cyan,
        reset = reset,
        headline = err.headline(),
        message = err,
        remediation = err.remediation()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code() {
        assert_eq!(Error::Config("test".into()).code(), 10);
        assert_eq!(
            Error::MissingColumn {
                column: "timestamp".into()
            }
            .code(),
            21
        );
        assert_eq!(Error::NoTrainingData.code(), 31);
    }

    #[test]
    fn test_error_category() {
        assert_eq!(Error::Config("test".into()).category(), ErrorCategory::Config);
        assert_eq!(
            Error::FileNotFound {
                path: PathBuf::from("missing.csv")
            }
            .category(),
            ErrorCategory::Ingestion
        );
        assert_eq!(
            Error::EmptyInput {
                stage: "trace".into()
            }
            .category(),
            ErrorCategory::Data
        );
        assert_eq!(Error::ModelNotFitted.category(), ErrorCategory::Model);
    }

    #[test]
    fn test_error_recoverable() {
        assert!(Error::NoTrainingData.is_recoverable());
        assert!(!Error::ModelNotFitted.is_recoverable());
    }

    #[test]
    fn test_suggested_action() {
        assert_eq!(
            Error::InvalidTimestamp {
                line: 3,
                value: "yesterday".into()
            }
            .suggested_action(),
            SuggestedAction::FixInput
        );
        assert_eq!(
            Error::NoTrainingData.suggested_action(),
            SuggestedAction::ProvideMoreData
        );
    }

    #[test]
    fn test_display_messages() {
        let err = Error::MissingColumn {
            column: "activity".into(),
        };
        assert_eq!(err.to_string(), "event log is missing required column 'activity'");
        assert_eq!(Error::NoTrainingData.to_string(), "no data to train the model");
    }

    #[test]
    fn test_structured_error_from_error() {
        let err = Error::InvalidTimestamp {
            line: 7,
            value: "not-a-date".into(),
        };
        let structured = StructuredError::from(&err);

        assert_eq!(structured.code, 23);
        assert_eq!(structured.category, ErrorCategory::Ingestion);
        assert!(structured.recoverable);
        assert_eq!(structured.context.get("line"), Some(&serde_json::json!(7)));
        assert_eq!(
            structured.context.get("value"),
            Some(&serde_json::json!("not-a-date"))
        );
    }

    #[test]
    fn test_structured_error_json() {
        let err = Error::EmptyInput {
            stage: "fit".into(),
        };
        let json = StructuredError::from(&err).with_context("cases", 0).to_json();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["code"], 30);
        assert_eq!(parsed["category"], "data");
        assert_eq!(parsed["suggested_action"], "provide_more_data");
        assert_eq!(parsed["context"]["stage"], "fit");
        assert_eq!(parsed["context"]["cases"], 0);
    }

    #[test]
    fn test_format_error_human_no_color() {
        let err = Error::FileNotFound {
            path: PathBuf::from("log.csv"),
        };
        let out = format_error_human(&err, false);
        assert!(out.starts_with("✗ Event Log Not Found"));
        assert!(out.contains("Reason: event log not found: log.csv"));
        assert!(out.contains("Fix: Check the event log path"));
    }
}
