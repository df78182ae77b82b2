//! Event log: the immutable (case, activity, timestamp) record set every
//! analysis starts from.

pub mod ingest;

pub use ingest::{load_event_log, parse_timestamp, LogFormatKind};

use chrono::{DateTime, Utc};
use pm_common::CaseId;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A single recorded step of a case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Case the event belongs to.
    pub case_id: CaseId,
    /// Activity label.
    pub activity: String,
    /// When the activity was recorded.
    pub timestamp: DateTime<Utc>,
}

impl Event {
    pub fn new(
        case_id: impl Into<CaseId>,
        activity: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Event {
            case_id: case_id.into(),
            activity: activity.into(),
            timestamp,
        }
    }
}

/// Ordered collection of events.
///
/// Insertion order is preserved; it is the tie-break when two events of
/// one case share a timestamp.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventLog {
    events: Vec<Event>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event.
    pub fn push(&mut self, event: Event) {
        self.events.push(event);
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Event> {
        self.events.iter()
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Number of distinct case identifiers.
    pub fn case_count(&self) -> usize {
        self.events
            .iter()
            .map(|e| &e.case_id)
            .collect::<HashSet<_>>()
            .len()
    }

    /// Earliest and latest timestamp across the whole log.
    pub fn time_span(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        let first = self.events.first()?.timestamp;
        Some(self.events.iter().fold((first, first), |(lo, hi), e| {
            (lo.min(e.timestamp), hi.max(e.timestamp))
        }))
    }
}

impl FromIterator<Event> for EventLog {
    fn from_iter<I: IntoIterator<Item = Event>>(iter: I) -> Self {
        EventLog {
            events: iter.into_iter().collect(),
        }
    }
}

impl Extend<Event> for EventLog {
    fn extend<I: IntoIterator<Item = Event>>(&mut self, iter: I) {
        self.events.extend(iter);
    }
}

impl<'a> IntoIterator for &'a EventLog {
    type Item = &'a Event;
    type IntoIter = std::slice::Iter<'a, Event>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2023, 1, 1, h, m, 0).unwrap()
    }

    #[test]
    fn test_empty_log() {
        let log = EventLog::new();
        assert!(log.is_empty());
        assert_eq!(log.case_count(), 0);
        assert!(log.time_span().is_none());
    }

    #[test]
    fn test_case_count_and_span() {
        let log: EventLog = vec![
            Event::new(2u64, "Start", at(9, 0)),
            Event::new(1u64, "Start", at(8, 0)),
            Event::new(1u64, "Ship", at(9, 30)),
        ]
        .into_iter()
        .collect();

        assert_eq!(log.len(), 3);
        assert_eq!(log.case_count(), 2);
        assert_eq!(log.time_span(), Some((at(8, 0), at(9, 30))));
    }

    #[test]
    fn test_preserves_insertion_order() {
        let mut log = EventLog::new();
        log.push(Event::new("a", "X", at(8, 0)));
        log.push(Event::new("a", "Y", at(8, 0)));
        let labels: Vec<_> = log.iter().map(|e| e.activity.as_str()).collect();
        assert_eq!(labels, vec!["X", "Y"]);
    }
}
