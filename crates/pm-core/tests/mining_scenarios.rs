//! Descriptive mining scenarios over small hand-built and on-disk logs.

use chrono::{DateTime, TimeZone, Utc};
use pm_common::{CaseId, Error};
use pm_core::fixtures::{sample_event_log, write_sample_csv};
use pm_core::log::{load_event_log, Event, EventLog};
use pm_core::logging::LogContext;
use pm_core::mining::{
    activity_durations, build_traces, compute_kpis, discover_flows, identify_bottlenecks,
};
use pm_core::pipeline::{mine, StageOutcome};
use std::fs;
use tempfile::TempDir;

fn at(day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2023, 1, day, hour, minute, 0).unwrap()
}

/// Case 1 runs 90 minutes through payment; case 2 skips payment and runs 70.
fn two_case_log() -> EventLog {
    vec![
        Event::new(1u64, "Start", at(1, 8, 0)),
        Event::new(1u64, "Pay", at(1, 8, 15)),
        Event::new(1u64, "Pick", at(1, 8, 45)),
        Event::new(1u64, "Ship", at(1, 9, 30)),
        Event::new(2u64, "Start", at(2, 10, 0)),
        Event::new(2u64, "Pick", at(2, 10, 40)),
        Event::new(2u64, "Ship", at(2, 11, 10)),
    ]
    .into_iter()
    .collect()
}

#[test]
fn two_distinct_flows_and_average_cycle_time() {
    let traces = build_traces(&two_case_log());
    let flows = discover_flows(&traces);

    assert_eq!(flows.len(), 2);
    assert!(flows.iter().all(|f| f.count == 1));
    assert_eq!(flows[0].activities.to_string(), "Start -> Pay -> Pick -> Ship");

    let kpis = compute_kpis(&traces);
    assert_eq!(kpis.average_cycle_time, Some(80.0 * 60.0));
    assert_eq!(kpis.min_cycle_time, Some(70.0 * 60.0));
    assert_eq!(kpis.max_cycle_time, Some(90.0 * 60.0));
    // 1 day and 3h10m apart: one whole day
    assert_eq!(kpis.span_days, 1);
    assert_eq!(kpis.throughput_cases_per_day, 2.0);
}

#[test]
fn repeated_variant_is_counted() {
    let mut log = two_case_log();
    log.push(Event::new(3u64, "Start", at(3, 9, 0)));
    log.push(Event::new(3u64, "Pick", at(3, 9, 30)));
    log.push(Event::new(3u64, "Ship", at(3, 10, 0)));

    let flows = discover_flows(&build_traces(&log));
    assert_eq!(flows.len(), 2);
    assert_eq!(flows[0].activities.to_string(), "Start -> Pick -> Ship");
    assert_eq!(flows[0].count, 2);
    assert_eq!(flows[1].count, 1);
}

#[test]
fn same_day_log_reports_raw_case_count_as_throughput() {
    let log: EventLog = vec![
        Event::new("a", "Start", at(1, 8, 0)),
        Event::new("a", "End", at(1, 9, 0)),
        Event::new("b", "Start", at(1, 10, 0)),
        Event::new("b", "End", at(1, 12, 0)),
        Event::new("c", "Start", at(1, 13, 0)),
    ]
    .into_iter()
    .collect();
    let kpis = compute_kpis(&build_traces(&log));
    assert_eq!(kpis.span_days, 0);
    assert_eq!(kpis.throughput_cases_per_day, 3.0);
    // the single-event case contributes a zero cycle time
    assert_eq!(kpis.min_cycle_time, Some(0.0));
}

#[test]
fn out_of_order_events_are_sequenced_per_case() {
    let log: EventLog = vec![
        Event::new(10u64, "Ship", at(1, 12, 0)),
        Event::new(2u64, "Pick", at(1, 9, 0)),
        Event::new(10u64, "Start", at(1, 8, 0)),
        Event::new(2u64, "Start", at(1, 8, 30)),
    ]
    .into_iter()
    .collect();
    let traces = build_traces(&log);

    // natural ordering puts case 2 before case 10
    assert_eq!(traces[0].case_id(), &CaseId::from(2u64));
    assert_eq!(traces[1].case_id(), &CaseId::from(10u64));
    assert_eq!(traces[1].activity_sequence(), vec!["Start", "Ship"]);
    assert_eq!(traces[1].full_cycle_time(), 4.0 * 3600.0);
}

#[test]
fn bottleneck_charges_gap_to_preceding_activity() {
    let traces = build_traces(&two_case_log());
    let ranked = activity_durations(&traces);

    // Pick: 45 and 30 minutes; Start: 15 and 40; Pay: 30
    assert_eq!(ranked[0].activity, "Pick");
    assert_eq!(ranked[0].average_duration, 37.5 * 60.0);
    assert_eq!(ranked[1].activity, "Pay");
    assert_eq!(ranked[2].activity, "Start");
    assert_eq!(ranked[2].average_duration, 27.5 * 60.0);
    assert!(ranked.iter().all(|b| b.activity != "Ship"));
}

#[test]
fn fewer_than_three_activities_yields_fewer_bottlenecks() {
    let log: EventLog = vec![
        Event::new(1u64, "A", at(1, 8, 0)),
        Event::new(1u64, "B", at(1, 8, 5)),
        Event::new(1u64, "C", at(1, 8, 6)),
    ]
    .into_iter()
    .collect();
    let top = identify_bottlenecks(&build_traces(&log));
    assert_eq!(top.len(), 2);
    assert_eq!(top[0].activity, "A");
}

#[test]
fn csv_on_disk_round_trips_through_mining() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("orders.csv");
    write_sample_csv(&path).unwrap();

    let log = load_event_log(&path).unwrap();
    assert_eq!(log, sample_event_log());

    let report = mine(&log, &LogContext::new("run-test", "host-test"));
    assert_eq!(report.case_count, 4);
    assert_eq!(report.unique_flows, 4);
    match &report.bottlenecks {
        StageOutcome::Complete(top) => {
            let names: Vec<_> = top.iter().map(|b| b.activity.as_str()).collect();
            assert_eq!(names, vec!["Pick Items", "Process Payment", "Start Order"]);
        }
        other => panic!("expected bottlenecks, got {:?}", other),
    }
}

#[test]
fn json_and_jsonl_logs_are_accepted() {
    let dir = TempDir::new().unwrap();

    let json = dir.path().join("log.json");
    fs::write(
        &json,
        r#"[
            {"case_id": 1, "activity": "Start", "timestamp": "2023-01-01T08:00:00Z"},
            {"case_id": 1, "activity": "End", "timestamp": "2023-01-01T09:00:00Z"}
        ]"#,
    )
    .unwrap();
    let log = load_event_log(&json).unwrap();
    assert_eq!(log.len(), 2);

    let jsonl = dir.path().join("log.jsonl");
    fs::write(
        &jsonl,
        "{\"case_id\": \"x\", \"activity\": \"Start\", \"timestamp\": \"2023-01-01 08:00:00\"}\n\
         {\"case_id\": \"x\", \"activity\": \"End\", \"timestamp\": \"2023-01-01 08:30:00\"}\n",
    )
    .unwrap();
    let log = load_event_log(&jsonl).unwrap();
    let traces = build_traces(&log);
    assert_eq!(traces.len(), 1);
    assert_eq!(traces[0].full_cycle_time(), 1800.0);
}

#[test]
fn ingestion_failures_are_reported() {
    let dir = TempDir::new().unwrap();

    let missing = dir.path().join("nope.csv");
    assert!(matches!(
        load_event_log(&missing),
        Err(Error::FileNotFound { .. })
    ));

    let no_ts = dir.path().join("no_ts.csv");
    fs::write(&no_ts, "case_id,activity\n1,Start\n").unwrap();
    match load_event_log(&no_ts) {
        Err(Error::MissingColumn { column }) => assert_eq!(column, "timestamp"),
        other => panic!("expected missing column, got {:?}", other),
    }

    let bad_ts = dir.path().join("bad_ts.csv");
    fs::write(&bad_ts, "case_id,activity,timestamp\n1,Start,yesterday\n").unwrap();
    assert!(matches!(
        load_event_log(&bad_ts),
        Err(Error::InvalidTimestamp { line: 2, .. })
    ));
}

#[test]
fn empty_log_mines_to_insufficient_data() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("empty.csv");
    fs::write(&path, "case_id,activity,timestamp\n").unwrap();

    let log = load_event_log(&path).unwrap();
    assert!(log.is_empty());

    let report = mine(&log, &LogContext::new("run-test", "host-test"));
    assert!(report.has_insufficient_data());
    assert_eq!(report.kpis.average_cycle_time, None);
    assert_eq!(report.kpis.throughput_cases_per_day, 0.0);
}
