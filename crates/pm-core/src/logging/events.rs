//! Structured event vocabulary for logging.
//!
//! All events carry the run correlation fields from [`LogContext`] and the
//! pipeline [`Stage`] they belong to.

use serde::{Deserialize, Serialize};

/// Processing stages in the mining pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Startup and configuration.
    Init,
    /// Reading the event log.
    Ingest,
    /// Grouping events into per-case traces.
    Trace,
    /// Flow variant discovery.
    Discover,
    /// Cycle time and throughput.
    Kpi,
    /// Inter-activity duration ranking.
    Bottleneck,
    /// Feature engineering.
    Features,
    /// Estimator training.
    Fit,
    /// Hold-out scoring.
    Evaluate,
    /// Prediction and SLA alerting.
    Predict,
    /// Report rendering.
    Report,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Init => "init",
            Stage::Ingest => "ingest",
            Stage::Trace => "trace",
            Stage::Discover => "discover",
            Stage::Kpi => "kpi",
            Stage::Bottleneck => "bottleneck",
            Stage::Features => "features",
            Stage::Fit => "fit",
            Stage::Evaluate => "evaluate",
            Stage::Predict => "predict",
            Stage::Report => "report",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Standard event names used in logging.
pub mod event_names {
    // Run lifecycle
    pub const RUN_STARTED: &str = "run.started";
    pub const RUN_FINISHED: &str = "run.finished";

    // Config
    pub const CONFIG_LOADED: &str = "config.loaded";
    pub const CONFIG_DEFAULT_USED: &str = "config.default_used";
    pub const CONFIG_ERROR: &str = "config.error";

    // Ingest
    pub const INGEST_STARTED: &str = "ingest.started";
    pub const INGEST_FINISHED: &str = "ingest.finished";
    pub const INGEST_FAILED: &str = "ingest.failed";

    // Descriptive mining
    pub const TRACES_BUILT: &str = "trace.built";
    pub const FLOWS_DISCOVERED: &str = "discover.finished";
    pub const KPIS_COMPUTED: &str = "kpi.computed";
    pub const BOTTLENECKS_RANKED: &str = "bottleneck.ranked";

    // Predictive scoring
    pub const FEATURES_BUILT: &str = "features.built";
    pub const MODEL_FITTED: &str = "model.fitted";
    pub const MODEL_EVALUATED: &str = "model.evaluated";
    pub const SCHEMA_ALIGNED: &str = "predict.schema_aligned";
    pub const PREDICT_ALERT: &str = "predict.alert";

    // Data shortfalls
    pub const INSUFFICIENT_DATA: &str = "stage.insufficient_data";

    // Error events
    pub const INTERNAL_ERROR: &str = "internal_error";
}

/// Correlation context attached to every structured event of a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogContext {
    /// Unique ID for this invocation.
    pub run_id: String,

    /// Host identifier.
    pub host_id: String,

    /// Event log being analyzed, when there is one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_path: Option<String>,
}

impl LogContext {
    pub fn new(run_id: impl Into<String>, host_id: impl Into<String>) -> Self {
        LogContext {
            run_id: run_id.into(),
            host_id: host_id.into(),
            log_path: None,
        }
    }

    /// Attach the path of the event log under analysis.
    pub fn with_log_path(mut self, path: impl Into<String>) -> Self {
        self.log_path = Some(path.into());
        self
    }

    /// Log path as a display string (`-` when absent).
    pub fn log_path_display(&self) -> &str {
        self.log_path.as_deref().unwrap_or("-")
    }
}
