//! JSON Output

use crate::report::CompetitionReport;

/// Generate a prettified JSON report.
pub fn generate_json_report(report: &CompetitionReport) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(report)
}

/// Parse a report previously written by [`generate_json_report`].
pub fn parse_json_report(json: &str) -> Result<CompetitionReport, serde_json::Error> {
    serde_json::from_str(json)
}
