//! SLA alerts for in-flight cases.

use pm_common::CaseId;
use serde::Serialize;

/// Outcome of one remaining-time prediction against the SLA.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Alert {
    pub case_id: CaseId,
    pub current_activity: String,
    pub time_since_start: f64,
    pub predicted_remaining_time: f64,
    /// `time_since_start + predicted_remaining_time`.
    pub predicted_total_time: f64,
    pub sla_threshold: f64,
    /// Predicted total strictly exceeds the threshold.
    pub breached: bool,
}

impl Alert {
    pub fn new(
        case_id: CaseId,
        current_activity: impl Into<String>,
        time_since_start: f64,
        predicted_remaining_time: f64,
        sla_threshold: f64,
    ) -> Self {
        let predicted_total_time = time_since_start + predicted_remaining_time;
        Alert {
            case_id,
            current_activity: current_activity.into(),
            time_since_start,
            predicted_remaining_time,
            predicted_total_time,
            sla_threshold,
            breached: predicted_total_time > sla_threshold,
        }
    }

    /// One-line human rendering.
    pub fn message(&self) -> String {
        let total = format_duration(self.predicted_total_time);
        let remaining = format_duration(self.predicted_remaining_time);
        if self.breached {
            format!(
                "ALERT: Case {} ({}) is predicted to exceed SLA. Predicted total time: {}. Remaining: {}",
                self.case_id, self.current_activity, total, remaining
            )
        } else {
            format!(
                "Prediction: Case {} ({}) will complete within approx. {}. Remaining: {}",
                self.case_id, self.current_activity, total, remaining
            )
        }
    }
}

impl std::fmt::Display for Alert {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message())
    }
}

/// Render seconds as `[N day(s), ]H:MM:SS[.ffffff]`.
///
/// Rounded to the microsecond; the fraction is shown only when non-zero.
pub fn format_duration(seconds: f64) -> String {
    if !seconds.is_finite() {
        return seconds.to_string();
    }
    let total_us = (seconds.abs() * 1_000_000.0).round() as u128;
    let sign = if seconds < 0.0 && total_us > 0 { "-" } else { "" };
    let micros = total_us % 1_000_000;
    let total_secs = total_us / 1_000_000;
    let days = total_secs / 86_400;
    let hours = (total_secs % 86_400) / 3_600;
    let minutes = (total_secs % 3_600) / 60;
    let secs = total_secs % 60;

    let mut out = String::from(sign);
    if days > 0 {
        out.push_str(&format!("{} day{}, ", days, if days == 1 { "" } else { "s" }));
    }
    out.push_str(&format!("{}:{:02}:{:02}", hours, minutes, secs));
    if micros > 0 {
        out.push_str(&format!(".{:06}", micros));
    }
    out
}
