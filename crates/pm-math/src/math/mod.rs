//! Core math modules.

pub mod metrics;
pub mod stats;
