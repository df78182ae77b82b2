//! Event log ingestion.
//!
//! Reads `.csv`, `.json` (array of objects) and `.jsonl`/`.ndjson` files
//! carrying at least `case_id`, `activity` and `timestamp`. Extra columns
//! are ignored. Any failure aborts ingestion; no partial log is returned.

use super::{Event, EventLog};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use pm_common::{CaseId, Error, Result};
use serde_json::Value;
use std::path::Path;

pub const COL_CASE_ID: &str = "case_id";
pub const COL_ACTIVITY: &str = "activity";
pub const COL_TIMESTAMP: &str = "timestamp";

/// On-disk event log encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormatKind {
    Csv,
    Json,
    Jsonl,
}

impl LogFormatKind {
    /// Detect the format from the file extension; unknown extensions are CSV.
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref()
        {
            Some("json") => LogFormatKind::Json,
            Some("jsonl") | Some("ndjson") => LogFormatKind::Jsonl,
            _ => LogFormatKind::Csv,
        }
    }
}

impl std::fmt::Display for LogFormatKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogFormatKind::Csv => write!(f, "csv"),
            LogFormatKind::Json => write!(f, "json"),
            LogFormatKind::Jsonl => write!(f, "jsonl"),
        }
    }
}

/// Load an event log from disk.
pub fn load_event_log(path: &Path) -> Result<EventLog> {
    if !path.exists() {
        return Err(Error::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    let content = std::fs::read_to_string(path)?;
    let kind = LogFormatKind::from_path(path);
    tracing::debug!(path = %path.display(), format = %kind, bytes = content.len(), "reading event log");
    parse_events(&content, kind)
}

/// Parse an in-memory event log.
pub fn parse_events(content: &str, kind: LogFormatKind) -> Result<EventLog> {
    match kind {
        LogFormatKind::Csv => parse_csv(content),
        LogFormatKind::Json => parse_json_array(content),
        LogFormatKind::Jsonl => parse_jsonl(content),
    }
}

/// Parse a timestamp in any of the accepted layouts.
///
/// Offset-less values are taken as UTC; a bare date is midnight.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for layout in [
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M",
    ] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, layout) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

// ---------------------------------------------------------------------------
// CSV
// ---------------------------------------------------------------------------

/// One CSV record and the 1-based line it starts on.
struct CsvRecord {
    line: usize,
    fields: Vec<String>,
}

/// Split CSV text into records, honouring double-quoted fields with `""`
/// escapes and embedded newlines. Blank lines are skipped.
fn split_csv_records(content: &str) -> Result<Vec<CsvRecord>> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let mut records = Vec::new();
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut line = 1usize;
    let mut record_line = 1usize;
    let mut chars = content.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    field.push('"');
                }
                '"' => in_quotes = false,
                '\n' => {
                    line += 1;
                    field.push(c);
                }
                _ => field.push(c),
            }
            continue;
        }

        match c {
            '"' if field.trim().is_empty() => {
                field.clear();
                in_quotes = true;
            }
            ',' => fields.push(std::mem::take(&mut field)),
            '\r' if chars.peek() == Some(&'\n') => {}
            '\n' => {
                fields.push(std::mem::take(&mut field));
                push_record(&mut records, record_line, std::mem::take(&mut fields));
                line += 1;
                record_line = line;
            }
            _ => field.push(c),
        }
    }

    if in_quotes {
        return Err(Error::InvalidRecord {
            line: record_line,
            message: "unterminated quoted field".to_string(),
        });
    }
    fields.push(field);
    push_record(&mut records, record_line, fields);
    Ok(records)
}

fn push_record(records: &mut Vec<CsvRecord>, line: usize, fields: Vec<String>) {
    let blank = fields.iter().all(|f| f.trim().is_empty());
    if !blank {
        records.push(CsvRecord { line, fields });
    }
}

fn column_index(header: &[String], name: &str) -> Result<usize> {
    header
        .iter()
        .position(|h| h.trim() == name)
        .ok_or_else(|| Error::MissingColumn {
            column: name.to_string(),
        })
}

fn parse_csv(content: &str) -> Result<EventLog> {
    let records = split_csv_records(content)?;
    let mut iter = records.into_iter();
    let header = match iter.next() {
        Some(h) => h.fields,
        None => {
            return Err(Error::MissingColumn {
                column: COL_CASE_ID.to_string(),
            })
        }
    };

    let case_idx = column_index(&header, COL_CASE_ID)?;
    let activity_idx = column_index(&header, COL_ACTIVITY)?;
    let ts_idx = column_index(&header, COL_TIMESTAMP)?;
    let needed = case_idx.max(activity_idx).max(ts_idx) + 1;

    let mut log = EventLog::new();
    for record in iter {
        if record.fields.len() < needed {
            return Err(Error::InvalidRecord {
                line: record.line,
                message: format!(
                    "expected at least {} fields, found {}",
                    needed,
                    record.fields.len()
                ),
            });
        }
        let case_id = required_text(&record.fields[case_idx], COL_CASE_ID, record.line)?;
        let activity = required_text(&record.fields[activity_idx], COL_ACTIVITY, record.line)?;
        let raw_ts = &record.fields[ts_idx];
        let timestamp = parse_timestamp(raw_ts).ok_or_else(|| Error::InvalidTimestamp {
            line: record.line,
            value: raw_ts.clone(),
        })?;
        log.push(Event::new(CaseId::new(case_id), activity, timestamp));
    }
    Ok(log)
}

fn required_text(value: &str, column: &str, line: usize) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidRecord {
            line,
            message: format!("empty {}", column),
        });
    }
    Ok(trimmed.to_string())
}

// ---------------------------------------------------------------------------
// JSON / JSONL
// ---------------------------------------------------------------------------

fn parse_json_array(content: &str) -> Result<EventLog> {
    let value: Value = serde_json::from_str(content)?;
    let Value::Array(items) = value else {
        return Err(Error::UnsupportedFormat(
            "JSON event log must be an array of objects".to_string(),
        ));
    };
    items
        .iter()
        .enumerate()
        .map(|(idx, item)| event_from_json(item, idx + 1))
        .collect()
}

fn parse_jsonl(content: &str) -> Result<EventLog> {
    let mut log = EventLog::new();
    for (idx, raw) in content.lines().enumerate() {
        let line = idx + 1;
        let raw = raw.trim();
        if raw.is_empty() {
            continue;
        }
        let value: Value = serde_json::from_str(raw).map_err(|e| Error::InvalidRecord {
            line,
            message: e.to_string(),
        })?;
        log.push(event_from_json(&value, line)?);
    }
    Ok(log)
}

fn event_from_json(value: &Value, line: usize) -> Result<Event> {
    let Value::Object(map) = value else {
        return Err(Error::InvalidRecord {
            line,
            message: "expected a JSON object".to_string(),
        });
    };
    let field = |name: &str| {
        map.get(name).ok_or_else(|| Error::MissingColumn {
            column: name.to_string(),
        })
    };

    let case_id = match field(COL_CASE_ID)? {
        Value::String(s) => required_text(s, COL_CASE_ID, line)?,
        Value::Number(n) => n.to_string(),
        other => {
            return Err(Error::InvalidRecord {
                line,
                message: format!("case_id must be a string or number, got {}", other),
            })
        }
    };
    let activity = match field(COL_ACTIVITY)? {
        Value::String(s) => required_text(s, COL_ACTIVITY, line)?,
        other => {
            return Err(Error::InvalidRecord {
                line,
                message: format!("activity must be a string, got {}", other),
            })
        }
    };
    let ts_value = field(COL_TIMESTAMP)?;
    let timestamp = ts_value
        .as_str()
        .and_then(parse_timestamp)
        .ok_or_else(|| Error::InvalidTimestamp {
            line,
            value: match ts_value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            },
        })?;

    Ok(Event::new(CaseId::new(case_id), activity, timestamp))
}
