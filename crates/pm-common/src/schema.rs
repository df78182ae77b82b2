//! Report schema versioning.

/// Schema version stamped into every JSON payload emitted by pm-core.
///
/// Bump the minor version for additive fields, the major version when a
/// field changes meaning or disappears.
pub const SCHEMA_VERSION: &str = "1.0.0";
