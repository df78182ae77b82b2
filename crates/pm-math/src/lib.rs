//! Process Mining math utilities.

pub mod math;

pub use math::metrics::*;
pub use math::stats::*;
