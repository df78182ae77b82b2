//! Process Mining common types, IDs, and errors.
//!
//! This crate provides foundational types shared across pm-core modules:
//! - Case and run identity types
//! - Common error types with stable codes
//! - Output formats for command results
//! - Report schema versioning

pub mod error;
pub mod id;
pub mod output;
pub mod schema;

pub use error::{
    format_error_human, Error, ErrorCategory, Result, StructuredError, SuggestedAction,
};
pub use id::{CaseId, RunId};
pub use output::OutputFormat;
pub use schema::SCHEMA_VERSION;
