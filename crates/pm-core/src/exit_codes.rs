//! Exit codes for the pm-core CLI.
//!
//! Exit codes communicate the analysis outcome without requiring output
//! parsing.
//!
//! Exit code ranges:
//! - 0-2: Operational outcomes (parse outcome from code, not output)
//! - 10-19: User/environment errors (recoverable by user action)
//! - 20-29: Internal errors (bugs, should be reported)

use pm_common::{Error, ErrorCategory};

/// Exit codes for pm-core operations.
///
/// These codes are a stable contract for automation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    // ========================================================================
    // Operational Outcomes (0-2)
    // ========================================================================
    /// Analysis completed; no predicted SLA breach.
    Clean = 0,

    /// At least one alert predicts an SLA breach.
    SlaBreached = 1,

    /// A stage had no data to work with.
    InsufficientData = 2,

    // ========================================================================
    // User / Environment Errors (10-19)
    // ========================================================================
    /// Invalid arguments
    ArgsError = 10,

    /// Event log missing or malformed
    IngestionError = 11,

    /// Configuration failed to load or validate
    ConfigError = 12,

    // ========================================================================
    // Internal Errors (20-29)
    // ========================================================================
    /// Internal error (bug - please report)
    InternalError = 20,

    /// I/O error
    IoError = 21,
}

impl ExitCode {
    /// Convert to i32 for process exit.
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Check if this exit code indicates an operational outcome (codes 0-2).
    pub fn is_operational(self) -> bool {
        (self as i32) < 10
    }

    /// Check if this exit code is a user/environment error (codes 10-19).
    pub fn is_user_error(self) -> bool {
        let code = self as i32;
        (10..20).contains(&code)
    }

    /// Check if this exit code is an internal error (codes 20-29).
    pub fn is_internal_error(self) -> bool {
        (self as i32) >= 20
    }

    /// Get the code name as a string constant (for JSON output).
    pub fn code_name(&self) -> &'static str {
        match self {
            ExitCode::Clean => "OK_CLEAN",
            ExitCode::SlaBreached => "OK_SLA_BREACHED",
            ExitCode::InsufficientData => "OK_INSUFFICIENT_DATA",
            ExitCode::ArgsError => "ERR_ARGS",
            ExitCode::IngestionError => "ERR_INGESTION",
            ExitCode::ConfigError => "ERR_CONFIG",
            ExitCode::InternalError => "ERR_INTERNAL",
            ExitCode::IoError => "ERR_IO",
        }
    }

    /// Map a failed run to its exit code.
    pub fn for_error(err: &Error) -> Self {
        match err.category() {
            ErrorCategory::Config => ExitCode::ConfigError,
            ErrorCategory::Ingestion => ExitCode::IngestionError,
            ErrorCategory::Data => ExitCode::InsufficientData,
            ErrorCategory::Model => ExitCode::InternalError,
            ErrorCategory::Io => ExitCode::IoError,
        }
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as i32
    }
}

impl std::fmt::Display for ExitCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.code_name(), self.as_i32())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_ranges() {
        assert!(ExitCode::Clean.is_operational());
        assert!(ExitCode::SlaBreached.is_operational());
        assert!(ExitCode::InsufficientData.is_operational());
        assert!(ExitCode::IngestionError.is_user_error());
        assert!(ExitCode::ConfigError.is_user_error());
        assert!(ExitCode::IoError.is_internal_error());
        assert!(!ExitCode::ArgsError.is_internal_error());
    }

    #[test]
    fn test_for_error() {
        let missing = Error::FileNotFound {
            path: PathBuf::from("log.csv"),
        };
        assert_eq!(ExitCode::for_error(&missing), ExitCode::IngestionError);
        assert_eq!(
            ExitCode::for_error(&Error::NoTrainingData),
            ExitCode::InsufficientData
        );
        assert_eq!(
            ExitCode::for_error(&Error::InvalidConfig("x".into())),
            ExitCode::ConfigError
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(ExitCode::SlaBreached.to_string(), "OK_SLA_BREACHED (1)");
        assert_eq!(i32::from(ExitCode::IoError), 21);
    }
}
