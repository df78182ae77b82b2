//! Output formats for command results.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// How a command renders its report on stdout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Report envelope as pretty JSON
    #[default]
    Json,

    /// Markdown report with flow, KPI, bottleneck and alert sections
    Md,

    /// One line per stage
    Summary,

    /// Nothing on stdout; the exit code carries the outcome
    Exitcode,
}

impl OutputFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Md => "md",
            OutputFormat::Summary => "summary",
            OutputFormat::Exitcode => "exitcode",
        }
    }

    /// Formats read by scripts rather than people; their logs go out as JSONL.
    pub fn is_machine(self) -> bool {
        matches!(self, OutputFormat::Json | OutputFormat::Exitcode)
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
