//! Fuzz target for config.json parsing.
//!
//! Tests that parsing and validation handle arbitrary input without
//! panicking.

#![no_main]

use libfuzzer_sys::fuzz_target;
use pm_config::AnalysisConfig;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        let _ = AnalysisConfig::from_str(s);
    }
});
