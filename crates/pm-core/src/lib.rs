//! Process Mining Core Library
//!
//! This library provides the analysis engine behind the `pm-core` binary:
//! - Event log ingestion (CSV, JSON, JSONL)
//! - Trace building, flow discovery, KPIs and bottleneck ranking
//! - Feature engineering and remaining-cycle-time prediction
//! - SLA alerting
//! - Exit codes and structured logging for the CLI
//!
//! The binary entry point is in `main.rs`.

pub mod exit_codes;
pub mod fixtures;
pub mod log;
pub mod logging;
pub mod mining;
pub mod pipeline;
pub mod predict;
