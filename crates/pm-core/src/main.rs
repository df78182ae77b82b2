//! Process Mining Core - Mining and Prediction Engine
//!
//! The main entry point for pm-core, handling:
//! - Event log ingestion
//! - Flow discovery, KPIs and bottleneck ranking
//! - Remaining-cycle-time prediction and SLA alerting
//! - Configuration inspection

use clap::{Args, Parser, Subcommand};
use pm_common::{format_error_human, Error, OutputFormat, RunId, StructuredError, SCHEMA_VERSION};
use pm_config::{load_config, AnalysisConfig, ConfigSnapshot, ValidationError};
use pm_core::exit_codes::ExitCode;
use pm_core::fixtures;
use pm_core::log::{load_event_log, EventLog};
use pm_core::log_event;
use pm_core::logging::{
    event_names, get_host_id, init_logging, LogConfig, LogContext, LogFormat, LogLevel, Stage,
};
use pm_core::mining::{build_traces, FlowVariant};
use pm_core::pipeline::{self, MiningReport, PredictionReport, StageOutcome};
use pm_core::predict::{engineer_features, format_duration};
use std::path::{Path, PathBuf};

/// Process Mining Core - flow discovery, KPIs, bottlenecks and SLA prediction
#[derive(Parser)]
#[command(name = "pm-core")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    global: GlobalOpts,
}

/// Global options available to all commands
#[derive(Args, Debug)]
struct GlobalOpts {
    /// Path to the analysis config file
    #[arg(long, global = true, env = "PM_CONFIG")]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "json")]
    format: OutputFormat,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Decrease verbosity (quiet mode)
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Discover flows, compute KPIs and rank bottlenecks
    Mine(LogArgs),

    /// Fit a remaining-time model and alert on sampled cases
    Predict(PredictArgs),

    /// Mining and prediction in one run
    Analyze(PredictArgs),

    /// Emit the engineered feature rows
    Features(LogArgs),

    /// Analyze the built-in sample log
    Demo(DemoArgs),

    /// Configuration management
    Config(ConfigArgs),

    /// Print version information
    Version,
}

// ============================================================================
// Command argument structs
// ============================================================================

#[derive(Args, Debug)]
struct LogArgs {
    /// Event log (CSV, JSON array or JSONL) with case_id, activity, timestamp
    log: PathBuf,
}

#[derive(Args, Debug)]
struct PredictArgs {
    /// Event log (CSV, JSON array or JSONL) with case_id, activity, timestamp
    log: PathBuf,

    /// SLA threshold in seconds (overrides config)
    #[arg(long, value_parser = parse_sla)]
    sla: Option<f64>,
}

#[derive(Args, Debug)]
struct DemoArgs {
    /// Also write the sample log as CSV to this path
    #[arg(long)]
    write: Option<PathBuf>,

    /// SLA threshold in seconds (overrides config)
    #[arg(long, value_parser = parse_sla)]
    sla: Option<f64>,
}

#[derive(Args, Debug)]
struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommands,
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Show the effective configuration and where it came from
    Show,
    /// Validate a configuration file
    Validate {
        /// Config file to validate (default: resolved config)
        path: Option<PathBuf>,
    },
}

/// A positive, finite number of seconds.
fn parse_sla(value: &str) -> Result<f64, String> {
    let seconds: f64 = value
        .trim()
        .parse()
        .map_err(|_| format!("'{}' is not a number of seconds", value))?;
    if seconds.is_finite() && seconds > 0.0 {
        Ok(seconds)
    } else {
        Err(format!("must be a positive number of seconds (got {})", value))
    }
}

fn main() {
    let cli = Cli::parse();

    let cli_level = if cli.global.quiet {
        Some(LogLevel::Error)
    } else {
        match cli.global.verbose {
            0 => None,
            1 => Some(LogLevel::Debug),
            _ => Some(LogLevel::Trace),
        }
    };
    // Machine-readable stdout pairs with JSONL on stderr unless PM_LOG_FORMAT says otherwise.
    let cli_format = (std::env::var_os("PM_LOG_FORMAT").is_none() && cli.global.format.is_machine())
        .then_some(LogFormat::Jsonl);
    init_logging(&LogConfig::from_env(cli_level, cli_format));

    let exit_code = match &cli.command {
        Commands::Mine(args) => run_mine(&cli.global, args),
        Commands::Predict(args) => run_predict(&cli.global, args),
        Commands::Analyze(args) => run_analyze(&cli.global, args),
        Commands::Features(args) => run_features(&cli.global, args),
        Commands::Demo(args) => run_demo(&cli.global, args),
        Commands::Config(args) => match &args.command {
            ConfigCommands::Show => run_config_show(&cli.global),
            ConfigCommands::Validate { path } => run_config_validate(&cli.global, path.as_deref()),
        },
        Commands::Version => {
            print_version(&cli.global);
            ExitCode::Clean
        }
    };

    std::process::exit(exit_code.as_i32());
}

// ============================================================================
// Shared plumbing
// ============================================================================

struct Run {
    id: RunId,
    ctx: LogContext,
}

impl Run {
    fn start(command: &str, log_path: Option<&Path>) -> Self {
        let id = RunId::new();
        let mut ctx = LogContext::new(id.to_string(), get_host_id());
        if let Some(path) = log_path {
            ctx = ctx.with_log_path(path.display().to_string());
        }
        log_event!(
            ctx,
            INFO,
            event_names::RUN_STARTED,
            Stage::Init,
            "run started",
            command = command
        );
        Run { id, ctx }
    }

    fn finish(&self, exit: ExitCode) -> ExitCode {
        log_event!(
            self.ctx,
            INFO,
            event_names::RUN_FINISHED,
            Stage::Report,
            "run finished",
            exit_code = exit.as_i32(),
            exit_name = exit.code_name()
        );
        exit
    }

    fn envelope(&self, command: &str, body: serde_json::Value) -> serde_json::Value {
        let mut out = serde_json::json!({
            "schema_version": SCHEMA_VERSION,
            "run_id": self.id.0,
            "generated_at": chrono::Utc::now().to_rfc3339(),
            "command": command,
        });
        if let (Some(map), serde_json::Value::Object(extra)) = (out.as_object_mut(), body) {
            map.extend(extra);
        }
        out
    }
}

fn print_json(value: &serde_json::Value) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{}", text),
        Err(e) => eprintln!("failed to serialize output: {}", e),
    }
}

/// Report an error in the requested format and map it to an exit code.
fn output_error(global: &GlobalOpts, run: &Run, err: &Error) -> ExitCode {
    let exit = ExitCode::for_error(err);
    if exit.is_internal_error() {
        log_event!(
            run.ctx,
            ERROR,
            event_names::INTERNAL_ERROR,
            Stage::Report,
            "run aborted",
            error = err.to_string(),
            code = err.code()
        );
    }
    match global.format {
        OutputFormat::Json => {
            let structured = StructuredError::from(err);
            let response = run.envelope(
                "error",
                serde_json::json!({ "status": "error", "error": structured }),
            );
            match serde_json::to_string_pretty(&response) {
                Ok(text) => eprintln!("{}", text),
                Err(_) => eprintln!("{}", structured.to_json()),
            }
        }
        OutputFormat::Summary => eprintln!("[{}] error: {}", run.id, err),
        OutputFormat::Exitcode => {}
        OutputFormat::Md => eprintln!("{}", format_error_human(err, !global.no_color)),
    }
    run.finish(exit)
}

/// Report a configuration error. Always exits with the config code.
fn output_config_error(global: &GlobalOpts, run: &Run, error: &ValidationError) -> ExitCode {
    log_event!(
        run.ctx,
        ERROR,
        event_names::CONFIG_ERROR,
        Stage::Init,
        "configuration rejected",
        error = error.to_string()
    );
    match global.format {
        OutputFormat::Json => {
            let response = run.envelope(
                "config",
                serde_json::json!({
                    "status": "error",
                    "error": { "code": error.code(), "message": error.to_string() }
                }),
            );
            match serde_json::to_string_pretty(&response) {
                Ok(text) => eprintln!("{}", text),
                Err(_) => eprintln!("{}", error),
            }
        }
        OutputFormat::Summary => eprintln!("[{}] config error: {}", run.id, error),
        OutputFormat::Exitcode => {}
        OutputFormat::Md => {
            eprintln!("# Configuration Error");
            eprintln!();
            eprintln!("Error: {}", error);
        }
    }
    run.finish(ExitCode::ConfigError)
}

fn load_analysis_config(
    global: &GlobalOpts,
    run: &Run,
) -> Result<(AnalysisConfig, ConfigSnapshot), ExitCode> {
    match load_config(global.config.as_deref()) {
        Ok((config, snapshot)) => {
            if snapshot.path.is_some() {
                log_event!(
                    run.ctx,
                    INFO,
                    event_names::CONFIG_LOADED,
                    Stage::Init,
                    "configuration loaded",
                    source = snapshot.source.as_str(),
                    effective_hash = snapshot.effective_hash.as_str()
                );
            } else {
                log_event!(
                    run.ctx,
                    DEBUG,
                    event_names::CONFIG_DEFAULT_USED,
                    Stage::Init,
                    "no config file found; using built-in defaults"
                );
            }
            Ok((config, snapshot))
        }
        Err(e) => Err(output_config_error(global, run, &e)),
    }
}

fn load_log(global: &GlobalOpts, run: &Run, path: &Path) -> Result<EventLog, ExitCode> {
    log_event!(
        run.ctx,
        INFO,
        event_names::INGEST_STARTED,
        Stage::Ingest,
        "reading event log"
    );
    match load_event_log(path) {
        Ok(log) => {
            log_event!(
                run.ctx,
                INFO,
                event_names::INGEST_FINISHED,
                Stage::Ingest,
                "event log loaded",
                events = log.len(),
                cases = log.case_count()
            );
            Ok(log)
        }
        Err(e) => {
            log_event!(
                run.ctx,
                ERROR,
                event_names::INGEST_FAILED,
                Stage::Ingest,
                "event log rejected",
                error = e.to_string(),
                code = e.code()
            );
            Err(output_error(global, run, &e))
        }
    }
}

fn mining_exit(report: &MiningReport) -> ExitCode {
    if report.has_insufficient_data() {
        ExitCode::InsufficientData
    } else {
        ExitCode::Clean
    }
}

fn prediction_exit(report: &PredictionReport) -> ExitCode {
    if report.breached_count() > 0 {
        ExitCode::SlaBreached
    } else if report.has_insufficient_data() {
        ExitCode::InsufficientData
    } else {
        ExitCode::Clean
    }
}

fn seconds_or_na(value: Option<f64>) -> String {
    value.map(format_duration).unwrap_or_else(|| "n/a".to_string())
}

fn flow_line(flow: &FlowVariant) -> String {
    format!("{} × {}", flow.count, flow.activities)
}

// ============================================================================
// Command implementations
// ============================================================================

fn run_mine(global: &GlobalOpts, args: &LogArgs) -> ExitCode {
    let run = Run::start("mine", Some(&args.log));
    let log = match load_log(global, &run, &args.log) {
        Ok(log) => log,
        Err(code) => return code,
    };
    let report = pipeline::mine(&log, &run.ctx);

    match global.format {
        OutputFormat::Json => print_json(&run.envelope(
            "mine",
            serde_json::json!({ "source": args.log.display().to_string(), "mining": report }),
        )),
        OutputFormat::Summary => println!("[{}] {}", run.id, mining_summary(&report)),
        OutputFormat::Exitcode => {}
        OutputFormat::Md => print_mining_md(&args.log.display().to_string(), &report),
    }
    run.finish(mining_exit(&report))
}

fn run_predict(global: &GlobalOpts, args: &PredictArgs) -> ExitCode {
    let run = Run::start("predict", Some(&args.log));
    let (config, snapshot) = match load_analysis_config(global, &run) {
        Ok(c) => c,
        Err(code) => return code,
    };
    let log = match load_log(global, &run, &args.log) {
        Ok(log) => log,
        Err(code) => return code,
    };
    let report = match pipeline::predict(&log, &config, args.sla, &run.ctx) {
        Ok(r) => r,
        Err(e) => return output_error(global, &run, &e),
    };

    match global.format {
        OutputFormat::Json => print_json(&run.envelope(
            "predict",
            serde_json::json!({
                "source": args.log.display().to_string(),
                "config": snapshot,
                "prediction": report,
            }),
        )),
        OutputFormat::Summary => println!("[{}] {}", run.id, prediction_summary(&report)),
        OutputFormat::Exitcode => {}
        OutputFormat::Md => print_prediction_md(&args.log.display().to_string(), &report),
    }
    run.finish(prediction_exit(&report))
}

fn run_analyze(global: &GlobalOpts, args: &PredictArgs) -> ExitCode {
    let run = Run::start("analyze", Some(&args.log));
    let (config, snapshot) = match load_analysis_config(global, &run) {
        Ok(c) => c,
        Err(code) => return code,
    };
    let log = match load_log(global, &run, &args.log) {
        Ok(log) => log,
        Err(code) => return code,
    };
    analyze_log(
        global,
        &run,
        &args.log.display().to_string(),
        &log,
        &config,
        &snapshot,
        args.sla,
    )
}

fn analyze_log(
    global: &GlobalOpts,
    run: &Run,
    source: &str,
    log: &EventLog,
    config: &AnalysisConfig,
    snapshot: &ConfigSnapshot,
    sla: Option<f64>,
) -> ExitCode {
    let mining = pipeline::mine(log, &run.ctx);
    let prediction = match pipeline::predict(log, config, sla, &run.ctx) {
        Ok(r) => r,
        Err(e) => return output_error(global, run, &e),
    };

    match global.format {
        OutputFormat::Json => print_json(&run.envelope(
            "analyze",
            serde_json::json!({
                "source": source,
                "config": snapshot,
                "mining": mining,
                "prediction": prediction,
            }),
        )),
        OutputFormat::Summary => println!(
            "[{}] {}; {}",
            run.id,
            mining_summary(&mining),
            prediction_summary(&prediction)
        ),
        OutputFormat::Exitcode => {}
        OutputFormat::Md => {
            print_mining_md(source, &mining);
            println!();
            print_prediction_md(source, &prediction);
        }
    }

    let exit = match prediction_exit(&prediction) {
        ExitCode::Clean => mining_exit(&mining),
        other => other,
    };
    run.finish(exit)
}

fn run_features(global: &GlobalOpts, args: &LogArgs) -> ExitCode {
    let run = Run::start("features", Some(&args.log));
    let log = match load_log(global, &run, &args.log) {
        Ok(log) => log,
        Err(code) => return code,
    };
    let matrix = engineer_features(&build_traces(&log));
    log_event!(
        run.ctx,
        INFO,
        event_names::FEATURES_BUILT,
        Stage::Features,
        "features engineered",
        rows = matrix.len(),
        activities = matrix.registry().len()
    );
    if matrix.is_empty() {
        let err = Error::EmptyInput {
            stage: Stage::Features.to_string(),
        };
        return output_error(global, &run, &err);
    }

    match global.format {
        OutputFormat::Json => print_json(&run.envelope(
            "features",
            serde_json::json!({
                "source": args.log.display().to_string(),
                "activities": matrix.registry().labels(),
                "rows": matrix.rows(),
            }),
        )),
        OutputFormat::Summary => println!(
            "[{}] features: {} rows, {} cases, {} activities",
            run.id,
            matrix.len(),
            matrix.case_count(),
            matrix.registry().len()
        ),
        OutputFormat::Exitcode => {}
        OutputFormat::Md => {
            println!("# Features: {}", args.log.display());
            println!();
            println!("| case_id | activity | activities_completed | time_since_start | current_activity_duration | remaining_cycle_time |");
            println!("|---|---|---|---|---|---|");
            for row in matrix.rows() {
                println!(
                    "| {} | {} | {} | {} | {} | {} |",
                    row.case_id,
                    row.activity,
                    row.activities_completed,
                    row.time_since_start,
                    row.current_activity_duration,
                    row.remaining_cycle_time
                );
            }
        }
    }

    run.finish(ExitCode::Clean)
}

fn run_demo(global: &GlobalOpts, args: &DemoArgs) -> ExitCode {
    let run = Run::start("demo", args.write.as_deref());
    if let Some(path) = &args.write {
        if let Err(e) = fixtures::write_sample_csv(path) {
            return output_error(global, &run, &e);
        }
        log_event!(
            run.ctx,
            INFO,
            event_names::INGEST_FINISHED,
            Stage::Ingest,
            "sample event log written",
            path = %path.display()
        );
    }
    let (config, snapshot) = match load_analysis_config(global, &run) {
        Ok(c) => c,
        Err(code) => return code,
    };
    let log = fixtures::sample_event_log();
    analyze_log(
        global,
        &run,
        "built-in sample",
        &log,
        &config,
        &snapshot,
        args.sla,
    )
}

fn run_config_show(global: &GlobalOpts) -> ExitCode {
    let run = Run::start("config show", None);
    let (config, snapshot) = match load_analysis_config(global, &run) {
        Ok(c) => c,
        Err(code) => return code,
    };

    match global.format {
        OutputFormat::Json => print_json(&run.envelope(
            "config show",
            serde_json::json!({
                "source": {
                    "path": snapshot.path,
                    "kind": snapshot.source,
                    "hash": snapshot.content_hash,
                    "using_defaults": snapshot.path.is_none(),
                },
                "effective_hash": snapshot.effective_hash,
                "values": config,
            }),
        )),
        OutputFormat::Summary => println!(
            "[{}] config: {} (sla={}s estimator={})",
            run.id,
            snapshot.path.as_deref().unwrap_or("built-in defaults"),
            config.sla.threshold_seconds,
            config.model.estimator
        ),
        OutputFormat::Exitcode => {}
        OutputFormat::Md => {
            println!("# pm-core config show");
            println!();
            match &snapshot.path {
                Some(path) => {
                    println!("Source: {} ({})", path, snapshot.source);
                    println!("Hash: {}", snapshot.content_hash.as_deref().unwrap_or("n/a"));
                }
                None => println!("Source: **built-in defaults** (no config.json found)"),
            }
            println!("Schema version: {}", config.schema_version);
            println!();
            println!("```json");
            println!("{}", config.to_json_pretty());
            println!("```");
        }
    }
    run.finish(ExitCode::Clean)
}

fn run_config_validate(global: &GlobalOpts, path: Option<&Path>) -> ExitCode {
    let run = Run::start("config validate", None);
    let target = path.or(global.config.as_deref());
    let (config, snapshot) = match load_config(target) {
        Ok(c) => c,
        Err(e) => return output_config_error(global, &run, &e),
    };

    match global.format {
        OutputFormat::Json => print_json(&run.envelope(
            "config validate",
            serde_json::json!({
                "status": "valid",
                "path": snapshot.path,
                "using_defaults": snapshot.path.is_none(),
                "config_schema_version": config.schema_version,
                "summary": snapshot.summary,
            }),
        )),
        OutputFormat::Summary => println!("[{}] config validate: OK", run.id),
        OutputFormat::Exitcode => {}
        OutputFormat::Md => {
            println!("# Configuration Validation");
            println!();
            println!("Status: ✓ Valid");
            match &snapshot.path {
                Some(p) => println!("Config: {}", p),
                None => println!("Config: using built-in defaults"),
            }
        }
    }
    run.finish(ExitCode::Clean)
}

fn print_version(global: &GlobalOpts) {
    let version_info = serde_json::json!({
        "schema_version": SCHEMA_VERSION,
        "pm_core_version": env!("CARGO_PKG_VERSION"),
        "rust_version": env!("CARGO_PKG_RUST_VERSION"),
    });

    match global.format {
        OutputFormat::Json => print_json(&version_info),
        OutputFormat::Exitcode => {}
        _ => {
            println!("pm-core {}", env!("CARGO_PKG_VERSION"));
            println!("schema version: {}", SCHEMA_VERSION);
        }
    }
}

// ============================================================================
// Rendering
// ============================================================================

fn mining_summary(report: &MiningReport) -> String {
    let top = match &report.bottlenecks {
        StageOutcome::Complete(ranked) => ranked
            .first()
            .map(|b| b.activity.clone())
            .unwrap_or_else(|| "-".to_string()),
        StageOutcome::InsufficientData { .. } => "-".to_string(),
    };
    format!(
        "mine: {} cases, {} flows, avg cycle {}, top bottleneck {}",
        report.case_count,
        report.unique_flows,
        seconds_or_na(report.kpis.average_cycle_time),
        top
    )
}

fn prediction_summary(report: &PredictionReport) -> String {
    let rows = report.features.value().map_or(0, |f| f.rows);
    let mae = report
        .evaluation
        .value()
        .map(|e| format!("{:.2}s", e.mae))
        .unwrap_or_else(|| "n/a".to_string());
    let sampled = report.alerts.value().map_or(0, |s| s.alerts.len());
    format!(
        "predict: {} rows, MAE {}, {}/{} breached (SLA {}s)",
        rows,
        mae,
        report.breached_count(),
        sampled,
        report.sla_threshold_seconds
    )
}

fn print_insufficient<T>(outcome: &StageOutcome<T>) -> bool {
    if let StageOutcome::InsufficientData { stage, reason } = outcome {
        println!("_Insufficient data ({}): {}_", stage, reason);
        true
    } else {
        false
    }
}

fn print_mining_md(source: &str, report: &MiningReport) {
    println!("# Process Mining Report: {}", source);
    println!();
    println!("## 1. Process Flows");
    println!();
    println!("Unique flows: {}", report.unique_flows);
    for flow in &report.flows {
        println!("- {}", flow_line(flow));
    }
    println!();
    println!("## 2. KPIs");
    println!();
    let kpis = &report.kpis;
    println!("- Cases: {}", kpis.case_count);
    println!(
        "- Average cycle time: {}",
        seconds_or_na(kpis.average_cycle_time)
    );
    println!("- Minimum cycle time: {}", seconds_or_na(kpis.min_cycle_time));
    println!("- Maximum cycle time: {}", seconds_or_na(kpis.max_cycle_time));
    println!(
        "- Throughput: {:.2} cases/day over {} day(s)",
        kpis.throughput_cases_per_day, kpis.span_days
    );
    println!();
    println!("## 3. Bottlenecks");
    println!();
    if !print_insufficient(&report.bottlenecks) {
        if let Some(ranked) = report.bottlenecks.value() {
            for (i, b) in ranked.iter().enumerate() {
                println!(
                    "{}. {}: avg {} ({} samples)",
                    i + 1,
                    b.activity,
                    format_duration(b.average_duration),
                    b.samples
                );
            }
        }
    }
}

fn print_prediction_md(source: &str, report: &PredictionReport) {
    println!("# Predictive Analytics Report: {}", source);
    println!();
    println!("## 1. Features");
    println!();
    if !print_insufficient(&report.features) {
        if let Some(f) = report.features.value() {
            println!(
                "Engineered {} rows for {} cases ({} activities); train/test = {}/{}",
                f.rows, f.cases, f.activities, f.train_rows, f.test_rows
            );
        }
    }
    println!();
    println!("## 2. Model");
    println!();
    println!("Estimator: {}", report.estimator);
    if let Some(schema) = &report.schema {
        println!(
            "Feature schema: {} ({} columns)",
            schema.version(),
            schema.len()
        );
    }
    if !print_insufficient(&report.evaluation) {
        if let Some(e) = report.evaluation.value() {
            println!("- Mean Absolute Error (MAE): {:.2} seconds", e.mae);
            match e.r2 {
                Some(r2) => println!("- R-squared (R2) Score: {:.2}", r2),
                None => println!("- R-squared (R2) Score: n/a"),
            }
        }
    }
    println!();
    println!(
        "## 3. Alerts (SLA {})",
        format_duration(report.sla_threshold_seconds)
    );
    println!();
    if !print_insufficient(&report.alerts) {
        if let Some(sample) = report.alerts.value() {
            for alert in &sample.alerts {
                println!("- {}", alert.message());
            }
        }
    }
}
