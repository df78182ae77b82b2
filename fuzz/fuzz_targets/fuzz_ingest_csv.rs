//! Fuzz target for CSV event log parsing.
//!
//! Arbitrary text must either parse into events or return an error,
//! never panic. Parsed logs are pushed through trace building.

#![no_main]

use libfuzzer_sys::fuzz_target;
use pm_core::log::ingest::parse_events;
use pm_core::log::LogFormatKind;
use pm_core::mining::build_traces;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok(log) = parse_events(s, LogFormatKind::Csv) {
            let traces = build_traces(&log);
            assert_eq!(traces.iter().map(|t| t.len()).sum::<usize>(), log.len());
        }
    }
});
