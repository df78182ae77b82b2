//! Fuzz target for JSON Lines event log parsing.

#![no_main]

use libfuzzer_sys::fuzz_target;
use pm_core::log::ingest::parse_events;
use pm_core::log::LogFormatKind;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        let _ = parse_events(s, LogFormatKind::Jsonl);
    }
});
