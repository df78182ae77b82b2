//! Configuration snapshots for run provenance.
//!
//! A snapshot captures the exact configuration in effect for a run so a
//! report can be reproduced later.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::resolve::ConfigPath;
use crate::settings::AnalysisConfig;

/// A frozen snapshot of configuration state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigSnapshot {
    /// When this snapshot was taken.
    pub timestamp: DateTime<Utc>,

    /// Schema version of the configuration.
    pub schema_version: String,

    /// Path the config was loaded from.
    #[serde(default)]
    pub path: Option<String>,

    /// Source of the configuration.
    pub source: String,

    /// SHA-256 of the raw file content (None for built-in defaults).
    #[serde(default)]
    pub content_hash: Option<String>,

    /// SHA-256 of the effective configuration after defaults were applied.
    pub effective_hash: String,

    /// Key configuration values for quick reference.
    pub summary: ConfigSummary,
}

/// Summary of key configuration values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigSummary {
    pub sla_threshold_seconds: f64,
    pub estimator: String,
    pub n_estimators: usize,
    pub seed: u64,
    pub test_fraction: f64,
}

impl ConfigSnapshot {
    /// Create a new snapshot from a loaded configuration.
    pub fn new(config: &AnalysisConfig, resolved: &ConfigPath, raw: Option<&str>) -> Self {
        let effective = serde_json::to_string(config).unwrap_or_default();

        ConfigSnapshot {
            timestamp: Utc::now(),
            schema_version: config.schema_version.clone(),
            path: resolved.path.as_ref().map(|p| p.display().to_string()),
            source: resolved.source.to_string(),
            content_hash: raw.map(hash_content),
            effective_hash: hash_content(&effective),
            summary: ConfigSummary {
                sla_threshold_seconds: config.sla.threshold_seconds,
                estimator: config.model.estimator.to_string(),
                n_estimators: config.model.n_estimators,
                seed: config.model.seed,
                test_fraction: config.evaluation.test_fraction,
            },
        }
    }

    /// Whether two snapshots describe the same effective configuration.
    pub fn same_effective_config(&self, other: &ConfigSnapshot) -> bool {
        self.effective_hash == other.effective_hash
    }
}

/// Hex-encoded SHA-256 of a string.
pub fn hash_content(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolve::ConfigSource;

    #[test]
    fn test_hash_content_stable() {
        let a = hash_content("{}");
        assert_eq!(a.len(), 64);
        assert_eq!(a, hash_content("{}"));
        assert_ne!(a, hash_content("{ }"));
    }

    #[test]
    fn test_snapshot_defaults() {
        let config = AnalysisConfig::default();
        let snapshot = ConfigSnapshot::new(&config, &ConfigPath::default(), None);
        assert_eq!(snapshot.source, ConfigSource::BuiltinDefault.to_string());
        assert!(snapshot.path.is_none());
        assert!(snapshot.content_hash.is_none());
        assert_eq!(snapshot.summary.estimator, "random_forest");
        assert_eq!(snapshot.summary.sla_threshold_seconds, 3600.0);
    }

    #[test]
    fn test_effective_hash_tracks_values() {
        let base = AnalysisConfig::default();
        let mut changed = base.clone();
        changed.sla.threshold_seconds = 1800.0;

        let a = ConfigSnapshot::new(&base, &ConfigPath::default(), None);
        let b = ConfigSnapshot::new(&base, &ConfigPath::default(), None);
        let c = ConfigSnapshot::new(&changed, &ConfigPath::default(), None);
        assert!(a.same_effective_config(&b));
        assert!(!a.same_effective_config(&c));
    }
}
