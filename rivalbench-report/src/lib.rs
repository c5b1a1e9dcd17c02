#![warn(missing_docs)]
//! rivalbench Report - Competition Reporting
//!
//! Output formats:
//! - JSON (machine-readable)
//! - Human (terminal / CI log)

mod human;
mod json;
mod report;

pub use human::format_human_output;
pub use json::{generate_json_report, parse_json_report};
pub use report::{
    AdjustedTargetEntry, CompetitionReport, ReportMessage, ReportMeta, SCHEMA_VERSION,
};

/// Output format selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// JSON with full schema
    Json,
    /// Human-readable terminal output
    Human,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "human" | "text" => Ok(OutputFormat::Human),
            other => Err(format!("Unknown output format: {}", other)),
        }
    }
}

/// Render a report in the given format
pub fn render(report: &CompetitionReport, format: OutputFormat) -> Result<String, serde_json::Error> {
    match format {
        OutputFormat::Json => generate_json_report(report),
        OutputFormat::Human => Ok(format_human_output(report)),
    }
}
