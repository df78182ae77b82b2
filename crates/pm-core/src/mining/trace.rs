//! Per-case traces.

use crate::log::{Event, EventLog};
use chrono::{DateTime, TimeDelta, Utc};
use pm_common::CaseId;
use serde::Serialize;
use std::collections::BTreeMap;

use super::{duration_seconds, FlowKey};

/// Time-ordered events of one case.
///
/// Never empty. Events are sorted by timestamp; equal timestamps keep
/// their log order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trace {
    case_id: CaseId,
    events: Vec<Event>,
}

impl Trace {
    /// Build a trace from the events of one case, or `None` if there are none.
    pub fn from_events(case_id: CaseId, mut events: Vec<Event>) -> Option<Self> {
        if events.is_empty() {
            return None;
        }
        // sort_by_key is stable
        events.sort_by_key(|e| e.timestamp);
        Some(Trace { case_id, events })
    }

    pub fn case_id(&self) -> &CaseId {
        &self.case_id
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Always false; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn start_time(&self) -> DateTime<Utc> {
        self.events[0].timestamp
    }

    pub fn end_time(&self) -> DateTime<Utc> {
        self.events[self.events.len() - 1].timestamp
    }

    pub fn cycle_time(&self) -> TimeDelta {
        self.end_time() - self.start_time()
    }

    /// Cycle time in seconds.
    pub fn full_cycle_time(&self) -> f64 {
        duration_seconds(self.cycle_time())
    }

    pub fn activity_sequence(&self) -> Vec<&str> {
        self.events.iter().map(|e| e.activity.as_str()).collect()
    }

    pub fn flow_key(&self) -> FlowKey {
        FlowKey(self.events.iter().map(|e| e.activity.clone()).collect())
    }
}

/// Group a log into one trace per case, in natural case-id order.
///
/// An empty log yields no traces.
pub fn build_traces(log: &EventLog) -> Vec<Trace> {
    let mut groups: BTreeMap<CaseId, Vec<Event>> = BTreeMap::new();
    for event in log {
        groups
            .entry(event.case_id.clone())
            .or_default()
            .push(event.clone());
    }
    groups
        .into_iter()
        .filter_map(|(case_id, events)| Trace::from_events(case_id, events))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2023, 1, 1, h, m, 0).unwrap()
    }

    #[test]
    fn test_empty_log_no_traces() {
        assert!(build_traces(&EventLog::new()).is_empty());
    }

    #[test]
    fn test_groups_and_sorts() {
        let log: EventLog = vec![
            Event::new(10u64, "B", at(9, 0)),
            Event::new(2u64, "Y", at(8, 30)),
            Event::new(10u64, "A", at(8, 0)),
            Event::new(2u64, "X", at(8, 0)),
        ]
        .into_iter()
        .collect();

        let traces = build_traces(&log);
        assert_eq!(traces.len(), 2);
        // 2 before 10 under natural ordering
        assert_eq!(traces[0].case_id().as_str(), "2");
        assert_eq!(traces[0].activity_sequence(), vec!["X", "Y"]);
        assert_eq!(traces[1].activity_sequence(), vec!["A", "B"]);
        assert_eq!(traces[1].full_cycle_time(), 3600.0);
        assert_eq!(traces[1].start_time(), at(8, 0));
        assert_eq!(traces[1].end_time(), at(9, 0));
    }

    #[test]
    fn test_equal_timestamps_keep_log_order() {
        let log: EventLog = vec![
            Event::new("c", "Second", at(8, 0)),
            Event::new("c", "Third", at(8, 0)),
            Event::new("c", "First", at(7, 0)),
        ]
        .into_iter()
        .collect();

        let traces = build_traces(&log);
        assert_eq!(traces[0].activity_sequence(), vec!["First", "Second", "Third"]);
    }

    #[test]
    fn test_single_event_trace_has_zero_cycle_time() {
        let trace = Trace::from_events("x".into(), vec![Event::new("x", "Only", at(8, 0))]).unwrap();
        assert_eq!(trace.full_cycle_time(), 0.0);
        assert_eq!(trace.len(), 1);
        assert!(Trace::from_events("y".into(), Vec::new()).is_none());
    }
}
