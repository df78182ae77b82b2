//! End-to-end analysis runs over one event-log snapshot.
//!
//! Stages that have nothing to work on report
//! [`StageOutcome::InsufficientData`] and later stages short-circuit.
//! An estimator that cannot be fitted to the training rows is reported
//! the same way at the fit stage. Errors are left for an unusable SLA
//! threshold and failures of an already fitted model.

use pm_common::{Error, Result};
use pm_config::AnalysisConfig;
use serde::Serialize;

use crate::log::EventLog;
use crate::log_event;
use crate::logging::{event_names, LogContext, Stage};
use crate::mining::{
    build_traces, compute_kpis, discover_flows, identify_bottlenecks, kpi::total_span_seconds,
    Bottleneck, FlowVariant, Kpis, Trace,
};
use crate::predict::{
    engineer_features, evaluate, sample_indices, train_test_split, Alert, AlignmentReport,
    FeatureSchema, ModelEvaluation, PredictiveModel,
};

/// Result of one pipeline stage.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum StageOutcome<T> {
    Complete(T),
    InsufficientData { stage: Stage, reason: String },
}

impl<T> StageOutcome<T> {
    pub fn insufficient(stage: Stage, reason: impl Into<String>) -> Self {
        StageOutcome::InsufficientData {
            stage,
            reason: reason.into(),
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, StageOutcome::Complete(_))
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            StageOutcome::Complete(v) => Some(v),
            StageOutcome::InsufficientData { .. } => None,
        }
    }
}

/// Descriptive mining over a log.
#[derive(Debug, Clone, Serialize)]
pub struct MiningReport {
    pub event_count: usize,
    pub case_count: usize,
    /// Seconds between the earliest and latest event.
    pub span_seconds: f64,
    pub unique_flows: usize,
    pub flows: Vec<FlowVariant>,
    pub kpis: Kpis,
    pub bottlenecks: StageOutcome<Vec<Bottleneck>>,
}

impl MiningReport {
    pub fn has_insufficient_data(&self) -> bool {
        self.case_count == 0 || !self.bottlenecks.is_complete()
    }
}

/// Trace the log, then discover flows, KPIs and bottlenecks.
pub fn mine(log: &EventLog, ctx: &LogContext) -> MiningReport {
    let traces = build_traces(log);
    log_event!(
        ctx,
        INFO,
        event_names::TRACES_BUILT,
        Stage::Trace,
        "traces built",
        events = log.len(),
        cases = traces.len()
    );
    mine_traces(log.len(), &traces, ctx)
}

fn mine_traces(event_count: usize, traces: &[Trace], ctx: &LogContext) -> MiningReport {
    let flows = discover_flows(traces);
    log_event!(
        ctx,
        INFO,
        event_names::FLOWS_DISCOVERED,
        Stage::Discover,
        "flow variants discovered",
        unique_flows = flows.len()
    );

    let kpis = compute_kpis(traces);
    log_event!(
        ctx,
        INFO,
        event_names::KPIS_COMPUTED,
        Stage::Kpi,
        "cycle-time KPIs computed",
        average_cycle_time = ?kpis.average_cycle_time,
        throughput = kpis.throughput_cases_per_day
    );

    let bottlenecks = if traces.is_empty() {
        StageOutcome::insufficient(Stage::Bottleneck, "event log is empty")
    } else if traces.iter().all(|t| t.len() < 2) {
        StageOutcome::insufficient(Stage::Bottleneck, "no case has two or more events")
    } else {
        let ranked = identify_bottlenecks(traces);
        log_event!(
            ctx,
            INFO,
            event_names::BOTTLENECKS_RANKED,
            Stage::Bottleneck,
            "bottlenecks ranked",
            top = ranked.first().map(|b| b.activity.as_str()).unwrap_or("-")
        );
        StageOutcome::Complete(ranked)
    };
    if let StageOutcome::InsufficientData { stage, reason } = &bottlenecks {
        log_event!(
            ctx,
            WARN,
            event_names::INSUFFICIENT_DATA,
            stage,
            reason.as_str()
        );
    }

    MiningReport {
        event_count,
        case_count: traces.len(),
        span_seconds: total_span_seconds(traces),
        unique_flows: flows.len(),
        flows,
        kpis,
        bottlenecks,
    }
}

/// Shape of the engineered feature set.
#[derive(Debug, Clone, Serialize)]
pub struct FeatureSummary {
    pub rows: usize,
    pub cases: usize,
    pub activities: usize,
    pub train_rows: usize,
    pub test_rows: usize,
}

/// Alerts for the sampled hold-out rows.
#[derive(Debug, Clone, Serialize)]
pub struct SampleAlerts {
    pub alerts: Vec<Alert>,
    pub alignment: AlignmentReport,
}

/// Predictive run over a log.
#[derive(Debug, Clone, Serialize)]
pub struct PredictionReport {
    pub sla_threshold_seconds: f64,
    pub estimator: String,
    pub features: StageOutcome<FeatureSummary>,
    pub schema: Option<FeatureSchema>,
    pub evaluation: StageOutcome<ModelEvaluation>,
    pub alerts: StageOutcome<SampleAlerts>,
}

impl PredictionReport {
    fn skipped(config: &AnalysisConfig, sla: f64, stage: Stage, reason: &str) -> Self {
        PredictionReport {
            sla_threshold_seconds: sla,
            estimator: config.model.estimator.to_string(),
            features: StageOutcome::insufficient(stage, reason),
            schema: None,
            evaluation: StageOutcome::insufficient(stage, reason),
            alerts: StageOutcome::insufficient(stage, reason),
        }
    }

    pub fn breached_count(&self) -> usize {
        self.alerts
            .value()
            .map_or(0, |s| s.alerts.iter().filter(|a| a.breached).count())
    }

    pub fn has_insufficient_data(&self) -> bool {
        !(self.features.is_complete() && self.evaluation.is_complete() && self.alerts.is_complete())
    }
}

/// Engineer features, fit on a seeded split, score the hold-out and
/// alert on a sample of it.
///
/// `sla_override` replaces the configured threshold (seconds).
pub fn predict(
    log: &EventLog,
    config: &AnalysisConfig,
    sla_override: Option<f64>,
    ctx: &LogContext,
) -> Result<PredictionReport> {
    let sla = sla_override.unwrap_or(config.sla.threshold_seconds);
    if !sla.is_finite() || sla <= 0.0 {
        return Err(Error::InvalidConfig(format!(
            "SLA threshold must be a positive number of seconds (got {})",
            sla
        )));
    }
    let eval = &config.evaluation;

    let traces = build_traces(log);
    let matrix = engineer_features(&traces);
    if matrix.is_empty() {
        log_event!(
            ctx,
            WARN,
            event_names::INSUFFICIENT_DATA,
            Stage::Features,
            "no feature rows; skipping fit"
        );
        return Ok(PredictionReport::skipped(
            config,
            sla,
            Stage::Features,
            "no events to engineer features from",
        ));
    }

    let split = train_test_split(matrix.len(), eval.test_fraction, eval.seed);
    let train = matrix.select(&split.train);
    let test = matrix.select(&split.test);
    log_event!(
        ctx,
        INFO,
        event_names::FEATURES_BUILT,
        Stage::Features,
        "features engineered",
        rows = matrix.len(),
        cases = matrix.case_count(),
        activities = matrix.registry().len(),
        train_rows = train.len(),
        test_rows = test.len()
    );
    let features = FeatureSummary {
        rows: matrix.len(),
        cases: matrix.case_count(),
        activities: matrix.registry().len(),
        train_rows: train.len(),
        test_rows: test.len(),
    };

    let model = match PredictiveModel::fit(&train, &config.model) {
        Ok(model) => model,
        Err(err) => {
            let reason = format!("{} could not be fitted: {}", config.model.estimator, err);
            log_event!(
                ctx,
                WARN,
                event_names::INSUFFICIENT_DATA,
                Stage::Fit,
                reason.as_str(),
                train_rows = train.len()
            );
            return Ok(PredictionReport {
                sla_threshold_seconds: sla,
                estimator: config.model.estimator.to_string(),
                features: StageOutcome::Complete(features),
                schema: None,
                evaluation: StageOutcome::insufficient(Stage::Fit, reason.as_str()),
                alerts: StageOutcome::insufficient(Stage::Fit, reason),
            });
        }
    };
    log_event!(
        ctx,
        INFO,
        event_names::MODEL_FITTED,
        Stage::Fit,
        "model fitted",
        estimator = model.estimator_name(),
        schema_version = model.schema().version(),
        columns = model.schema().len()
    );

    let evaluation = match evaluate(&model, &test)? {
        Some(scores) => {
            log_event!(
                ctx,
                INFO,
                event_names::MODEL_EVALUATED,
                Stage::Evaluate,
                "hold-out evaluated",
                mae = scores.mae,
                r2 = ?scores.r2
            );
            StageOutcome::Complete(scores)
        }
        None => {
            log_event!(
                ctx,
                WARN,
                event_names::INSUFFICIENT_DATA,
                Stage::Evaluate,
                "hold-out set is empty"
            );
            StageOutcome::insufficient(Stage::Evaluate, "hold-out set is empty")
        }
    };

    let picked = sample_indices(&split.test, eval.sample_predictions, eval.seed);
    let alerts = if picked.is_empty() {
        StageOutcome::insufficient(Stage::Predict, "no hold-out rows to sample")
    } else {
        let rows = matrix.select(&picked).state_rows();
        let batch = model.predict_and_alert(&rows, sla)?;
        if !batch.alignment.is_exact() {
            log_event!(
                ctx,
                DEBUG,
                event_names::SCHEMA_ALIGNED,
                Stage::Predict,
                "inference rows aligned",
                filled = batch.alignment.filled.len(),
                dropped = batch.alignment.dropped.len()
            );
        }
        for alert in &batch.alerts {
            if alert.breached {
                log_event!(
                    ctx,
                    WARN,
                    event_names::PREDICT_ALERT,
                    Stage::Predict,
                    alert.message(),
                    case_id = %alert.case_id,
                    predicted_total = alert.predicted_total_time
                );
            } else {
                log_event!(
                    ctx,
                    DEBUG,
                    event_names::PREDICT_ALERT,
                    Stage::Predict,
                    alert.message(),
                    case_id = %alert.case_id
                );
            }
        }
        StageOutcome::Complete(SampleAlerts {
            alerts: batch.alerts,
            alignment: batch.alignment,
        })
    };

    Ok(PredictionReport {
        sla_threshold_seconds: sla,
        estimator: model.estimator_name().to_string(),
        features: StageOutcome::Complete(features),
        schema: Some(model.schema().clone()),
        evaluation,
        alerts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::sample_event_log;
    use crate::log::Event;
    use chrono::{Duration, TimeZone, Utc};
    use pm_config::EstimatorKind;

    fn ctx() -> LogContext {
        LogContext::new("run-test", "host-test")
    }

    #[test]
    fn test_mine_sample_log() {
        let report = mine(&sample_event_log(), &ctx());
        assert_eq!(report.event_count, 14);
        assert_eq!(report.case_count, 4);
        assert_eq!(report.unique_flows, 4);
        assert_eq!(report.flows.iter().map(|f| f.count).sum::<usize>(), 4);
        assert_eq!(report.kpis.span_days, 3);
        let top = report.bottlenecks.value().unwrap();
        assert_eq!(top[0].activity, "Pick Items");
        assert!(!report.has_insufficient_data());
    }

    #[test]
    fn test_mine_empty_log() {
        let report = mine(&EventLog::new(), &ctx());
        assert_eq!(report.case_count, 0);
        assert!(report.flows.is_empty());
        assert_eq!(report.kpis.average_cycle_time, None);
        assert_eq!(report.kpis.throughput_cases_per_day, 0.0);
        assert!(matches!(
            report.bottlenecks,
            StageOutcome::InsufficientData {
                stage: Stage::Bottleneck,
                ..
            }
        ));
        assert!(report.has_insufficient_data());
    }

    #[test]
    fn test_predict_sample_log() {
        let config = AnalysisConfig::default();
        let report = predict(&sample_event_log(), &config, None, &ctx()).unwrap();

        let features = report.features.value().unwrap();
        assert_eq!(features.rows, 14);
        assert_eq!(features.test_rows, 3);
        assert_eq!(report.schema.as_ref().unwrap().len(), 8);
        assert!(report.evaluation.is_complete());

        let sample = report.alerts.value().unwrap();
        assert_eq!(sample.alerts.len(), 3);
        assert!(sample.alerts.iter().all(|a| a.sla_threshold == 3600.0));
    }

    #[test]
    fn test_predict_sla_override() {
        let config = AnalysisConfig::default();
        // nothing in the sample log runs past a day
        let report = predict(&sample_event_log(), &config, Some(86_400.0), &ctx()).unwrap();
        assert_eq!(report.sla_threshold_seconds, 86_400.0);
        assert_eq!(report.breached_count(), 0);

        // a one-second SLA passes only rows predicted to finish within it
        let report = predict(&sample_event_log(), &config, Some(1.0), &ctx()).unwrap();
        let sample = report.alerts.value().unwrap();
        for alert in &sample.alerts {
            assert_eq!(alert.breached, alert.predicted_total_time > 1.0);
        }
    }

    #[test]
    fn test_predict_rejects_unusable_sla() {
        let config = AnalysisConfig::default();
        for bad in [0.0, -5.0, f64::NAN, f64::INFINITY] {
            let err = predict(&sample_event_log(), &config, Some(bad), &ctx()).unwrap_err();
            assert!(matches!(err, Error::InvalidConfig(_)), "{bad}: {err}");
        }
    }

    #[test]
    fn test_predict_unfittable_estimator_is_insufficient_data() {
        // one-hot activity columns are collinear once centered, so an
        // unpenalised ridge has no unique solution
        let mut config = AnalysisConfig::default();
        config.model.estimator = EstimatorKind::Ridge;
        config.model.ridge_lambda = 0.0;
        let report = predict(&sample_event_log(), &config, None, &ctx()).unwrap();
        assert!(report.features.is_complete());
        assert!(report.schema.is_none());
        assert!(matches!(
            report.evaluation,
            StageOutcome::InsufficientData {
                stage: Stage::Fit,
                ..
            }
        ));
        assert!(report.has_insufficient_data());
        assert_eq!(report.breached_count(), 0);
    }

    #[test]
    fn test_predict_month_long_log_with_ridge() {
        let start = Utc.with_ymd_and_hms(2023, 1, 1, 8, 0, 0).unwrap();
        let activities = ["Receive", "Check", "Approve", "Ship", "Close"];
        let mut events = Vec::new();
        for case in 0..400_u64 {
            let opened = start + Duration::minutes((case * 108) as i64);
            let step = Duration::hours((1 + case % 7) as i64);
            for (k, activity) in activities.iter().enumerate() {
                events.push(Event::new(case, *activity, opened + step * k as i32));
            }
        }
        let log: EventLog = events.into_iter().collect();

        let mut config = AnalysisConfig::default();
        config.model.estimator = EstimatorKind::Ridge;
        let report = predict(&log, &config, None, &ctx()).unwrap();
        assert_eq!(report.features.value().unwrap().rows, 2000);
        assert_eq!(report.estimator, "ridge");
        let scores = report.evaluation.value().unwrap();
        assert!(scores.mae.is_finite());
        assert!(report.alerts.is_complete());
    }

    #[test]
    fn test_predict_empty_log_short_circuits() {
        let report =
            predict(&EventLog::new(), &AnalysisConfig::default(), None, &ctx()).unwrap();
        assert!(!report.features.is_complete());
        assert!(report.schema.is_none());
        assert!(report.has_insufficient_data());
        assert_eq!(report.breached_count(), 0);
    }

    #[test]
    fn test_predict_single_event_has_no_holdout() {
        let t = Utc.with_ymd_and_hms(2023, 1, 1, 8, 0, 0).unwrap();
        let log: EventLog = vec![Event::new(1u64, "Start", t)].into_iter().collect();
        let report = predict(&log, &AnalysisConfig::default(), None, &ctx()).unwrap();
        assert!(report.features.is_complete());
        assert!(!report.evaluation.is_complete());
        assert!(!report.alerts.is_complete());
    }

    #[test]
    fn test_stage_outcome_serialization() {
        let outcome: StageOutcome<Vec<u32>> =
            StageOutcome::insufficient(Stage::Evaluate, "hold-out set is empty");
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["status"], "insufficient_data");
        assert_eq!(json["value"]["stage"], "evaluate");

        let json = serde_json::to_value(StageOutcome::Complete(vec![1u32])).unwrap();
        assert_eq!(json["status"], "complete");
        assert_eq!(json["value"][0], 1);
    }
}
