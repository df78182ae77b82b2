//! Configuration loading, validation, and resolution tests against real files.
//!
//! Covers:
//! - Validation of on-disk config files
//! - Resolution order (CLI > env > config dir > XDG)
//! - Snapshot provenance

use pm_config::resolve::{resolve_config, ConfigSource};
use pm_config::validate::ValidationError;
use pm_config::{load_config, AnalysisConfig, EstimatorKind};
use std::env;
use std::fs;
use std::path::Path;
use std::sync::{Mutex, OnceLock};
use tempfile::TempDir;

static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

const ENV_KEYS: &[&str] = &["PM_CONFIG", "PROCESS_MINING_CONFIG_DIR", "XDG_CONFIG_HOME"];

const VALID_CONFIG: &str = r#"{
    "schema_version": "1.0.0",
    "sla": { "threshold_seconds": 7200 },
    "model": { "estimator": "ridge", "ridge_lambda": 0.5 },
    "evaluation": { "test_fraction": 0.25, "seed": 7 }
}"#;

struct EnvGuard {
    keys: Vec<String>,
    saved: Vec<Option<String>>,
}

impl EnvGuard {
    fn new(keys: &[&str]) -> Self {
        let saved = keys.iter().map(|k| env::var(k).ok()).collect();
        for key in keys {
            env::remove_var(key);
        }
        Self {
            keys: keys.iter().map(|k| k.to_string()).collect(),
            saved,
        }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (idx, key) in self.keys.iter().enumerate() {
            match self.saved.get(idx).and_then(|v| v.as_ref()) {
                Some(val) => env::set_var(key, val),
                None => env::remove_var(key),
            }
        }
    }
}

fn with_env_lock<T>(f: impl FnOnce() -> T) -> T {
    let _guard = ENV_LOCK
        .get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    f()
}

fn write_config(dir: &Path, content: &str) -> std::path::PathBuf {
    fs::create_dir_all(dir).expect("create config dir");
    let path = dir.join("config.json");
    fs::write(&path, content).expect("write config");
    path
}

#[test]
fn test_load_valid_config_file() {
    let temp = TempDir::new().expect("temp dir");
    let path = write_config(temp.path(), VALID_CONFIG);

    let (config, snapshot) = load_config(Some(&path)).expect("valid config loads");
    assert_eq!(config.sla.threshold_seconds, 7200.0);
    assert_eq!(config.model.estimator, EstimatorKind::Ridge);
    assert_eq!(config.model.ridge_lambda, 0.5);
    assert_eq!(config.evaluation.test_fraction, 0.25);
    assert_eq!(config.model.n_estimators, 100);

    assert_eq!(snapshot.source, ConfigSource::CliArgument.to_string());
    assert_eq!(snapshot.path.as_deref(), Some(path.display().to_string().as_str()));
    assert!(snapshot.content_hash.is_some());
    assert_eq!(snapshot.summary.estimator, "ridge");
}

#[test]
fn test_load_rejects_invalid_sla() {
    let temp = TempDir::new().expect("temp dir");
    let path = write_config(temp.path(), r#"{"sla": {"threshold_seconds": -5}}"#);

    let err = load_config(Some(&path)).expect_err("negative SLA should fail");
    assert!(matches!(err, ValidationError::InvalidValue { .. }));
}

#[test]
fn test_load_rejects_malformed_json() {
    let temp = TempDir::new().expect("temp dir");
    let path = write_config(temp.path(), "{\"sla\": ");

    let err = load_config(Some(&path)).expect_err("malformed JSON should fail");
    assert!(matches!(err, ValidationError::ParseError(_)));
}

#[test]
fn test_load_missing_cli_path_is_io_error() {
    let temp = TempDir::new().expect("temp dir");
    let path = temp.path().join("absent.json");

    let err = load_config(Some(&path)).expect_err("missing file should fail");
    assert!(matches!(err, ValidationError::IoError(_)));
    assert_eq!(err.code(), 60);
}

#[test]
fn test_load_rejects_future_schema() {
    let temp = TempDir::new().expect("temp dir");
    let path = write_config(temp.path(), r#"{"schema_version": "2.0.0"}"#);

    let err = load_config(Some(&path)).expect_err("unknown schema should fail");
    assert!(matches!(err, ValidationError::VersionMismatch { .. }));
}

#[test]
fn test_from_file_matches_load() {
    let temp = TempDir::new().expect("temp dir");
    let path = write_config(temp.path(), VALID_CONFIG);

    let direct = AnalysisConfig::from_file(&path).expect("from_file");
    let (loaded, _) = load_config(Some(&path)).expect("load_config");
    assert_eq!(direct, loaded);
}

#[test]
fn test_resolve_config_cli_over_env() {
    with_env_lock(|| {
        let _guard = EnvGuard::new(ENV_KEYS);

        let temp = TempDir::new().expect("temp dir");
        let cli_path = write_config(&temp.path().join("cli"), VALID_CONFIG);
        let env_path = write_config(&temp.path().join("env"), VALID_CONFIG);

        env::set_var("PM_CONFIG", env_path.display().to_string());

        let resolved = resolve_config(Some(&cli_path));
        assert_eq!(resolved.source, ConfigSource::CliArgument);
        assert_eq!(resolved.path.unwrap(), cli_path);
    });
}

#[test]
fn test_resolve_config_env_over_config_dir() {
    with_env_lock(|| {
        let _guard = EnvGuard::new(ENV_KEYS);

        let temp = TempDir::new().expect("temp dir");
        let env_path = write_config(&temp.path().join("env"), VALID_CONFIG);
        let config_dir = temp.path().join("config_dir");
        write_config(&config_dir, VALID_CONFIG);

        env::set_var("PM_CONFIG", env_path.display().to_string());
        env::set_var("PROCESS_MINING_CONFIG_DIR", config_dir.display().to_string());

        let resolved = resolve_config(None);
        assert_eq!(resolved.source, ConfigSource::Environment);
        assert_eq!(resolved.path.unwrap(), env_path);
    });
}

#[test]
fn test_resolve_config_dir_when_env_path_missing() {
    with_env_lock(|| {
        let _guard = EnvGuard::new(ENV_KEYS);

        let temp = TempDir::new().expect("temp dir");
        let config_dir = temp.path().join("config_dir");
        let dir_path = write_config(&config_dir, VALID_CONFIG);

        env::set_var(
            "PM_CONFIG",
            temp.path().join("missing.json").display().to_string(),
        );
        env::set_var("PROCESS_MINING_CONFIG_DIR", config_dir.display().to_string());

        let resolved = resolve_config(None);
        assert_eq!(resolved.source, ConfigSource::Environment);
        assert_eq!(resolved.path.unwrap(), dir_path);
    });
}

#[test]
fn test_resolve_config_xdg_fallback() {
    with_env_lock(|| {
        let _guard = EnvGuard::new(ENV_KEYS);

        let temp = TempDir::new().expect("temp dir");
        let xdg_dir = temp.path().join("xdg");
        let app_path = write_config(&xdg_dir.join("process-mining"), VALID_CONFIG);

        env::set_var("XDG_CONFIG_HOME", xdg_dir.display().to_string());

        let resolved = resolve_config(None);
        // dirs honours XDG_CONFIG_HOME on Linux only.
        if cfg!(target_os = "linux") {
            assert_eq!(resolved.source, ConfigSource::XdgConfig);
            assert_eq!(resolved.path.unwrap(), app_path);
        }
    });
}
