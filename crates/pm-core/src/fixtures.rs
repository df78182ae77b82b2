//! Built-in demonstration event log.
//!
//! Four order-fulfilment cases on consecutive days. Used by `pm-core demo`
//! and throughout the tests.

use chrono::{NaiveDate, TimeZone, Utc};
use pm_common::Result;
use std::path::Path;

use crate::log::{Event, EventLog};

const SAMPLE_ROWS: [(u64, &str, &str); 14] = [
    (1, "Start Order", "2023-01-01 08:00:00"),
    (1, "Process Payment", "2023-01-01 08:15:00"),
    (1, "Pick Items", "2023-01-01 08:45:00"),
    (1, "Ship Order", "2023-01-01 09:30:00"),
    (2, "Start Order", "2023-01-02 10:00:00"),
    (2, "Pick Items", "2023-01-02 10:40:00"),
    (2, "Ship Order", "2023-01-02 11:10:00"),
    (3, "Start Order", "2023-01-03 13:00:00"),
    (3, "Process Payment", "2023-01-03 13:20:00"),
    (3, "Pick Items", "2023-01-03 14:00:00"),
    (3, "Deliver", "2023-01-03 15:00:00"),
    (4, "Start Order", "2023-01-04 09:00:00"),
    (4, "Pick Items", "2023-01-04 09:40:00"),
    (4, "Deliver", "2023-01-04 10:30:00"),
];

/// The demonstration log, in file order.
pub fn sample_event_log() -> EventLog {
    SAMPLE_ROWS
        .iter()
        .filter_map(|(case, activity, ts)| {
            let naive =
                chrono::NaiveDateTime::parse_from_str(ts, "%Y-%m-%d %H:%M:%S").ok()?;
            Some(Event::new(*case, *activity, Utc.from_utc_datetime(&naive)))
        })
        .collect()
}

/// The demonstration log as CSV text with a header row.
pub fn sample_csv() -> String {
    let mut out = String::from("case_id,activity,timestamp\n");
    for (case, activity, ts) in SAMPLE_ROWS {
        out.push_str(&format!("{},{},{}\n", case, activity, ts));
    }
    out
}

/// Write the demonstration CSV to `path`.
pub fn write_sample_csv(path: &Path) -> Result<()> {
    std::fs::write(path, sample_csv())?;
    Ok(())
}

/// First day of the demonstration log.
pub fn sample_start_date() -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(2023, 1, 1)
}
