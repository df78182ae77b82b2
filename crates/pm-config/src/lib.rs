//! Process Mining configuration loading and validation.
//!
//! This crate provides:
//! - Typed Rust structs for the analysis config file (`config.json`)
//! - Config resolution (CLI → env → XDG → /etc → defaults)
//! - Semantic validation
//! - Config snapshots for run provenance

pub mod resolve;
pub mod settings;
pub mod snapshot;
pub mod validate;

pub use resolve::{resolve_config, ConfigPath, ConfigSource};
pub use settings::{AnalysisConfig, EstimatorKind, EvaluationParams, ModelParams, SlaPolicy};
pub use snapshot::ConfigSnapshot;
pub use validate::{validate_config, ValidationError, ValidationResult};

/// Schema version for configuration files.
pub const CONFIG_SCHEMA_VERSION: &str = "1.0.0";

/// Load, validate, and snapshot the configuration.
///
/// Returns built-in defaults when no config file resolves.
pub fn load_config(
    cli_path: Option<&std::path::Path>,
) -> ValidationResult<(AnalysisConfig, ConfigSnapshot)> {
    let resolved = resolve_config(cli_path);
    let (config, raw) = match &resolved.path {
        Some(path) => {
            let raw = std::fs::read_to_string(path).map_err(|e| {
                ValidationError::IoError(format!("Failed to read {}: {}", path.display(), e))
            })?;
            (AnalysisConfig::from_str(&raw)?, Some(raw))
        }
        None => (AnalysisConfig::default(), None),
    };
    validate_config(&config)?;
    let snapshot = ConfigSnapshot::new(&config, &resolved, raw.as_deref());
    Ok((config, snapshot))
}
