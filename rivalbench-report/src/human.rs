//! Human Output
//!
//! Plain-text rendering of a competition report for terminals and CI logs.

use crate::report::{CompetitionReport, ReportMessage};
use rivalbench_core::MessageSeverity;

/// Format a report for human-readable terminal display
pub fn format_human_output(report: &CompetitionReport) -> String {
    let mut output = String::new();

    output.push('\n');
    output.push_str(&format!("Competition: {}\n", report.meta.benchmark));
    output.push_str(&"=".repeat(60));
    output.push_str("\n\n");

    let mut current_run = None;
    for message in &report.messages {
        if current_run != Some(message.run) {
            current_run = Some(message.run);
            if message.run == 0 {
                output.push_str("Setup\n");
            } else {
                output.push_str(&format!("Run {}\n", message.run));
            }
            output.push_str(&"-".repeat(60));
            output.push('\n');
        }
        push_message(&mut output, message);
    }

    if !report.adjusted_targets.is_empty() {
        output.push_str("\nAdjusted limits\n");
        output.push_str(&"-".repeat(60));
        output.push('\n');

        let width = report
            .adjusted_targets
            .iter()
            .map(|t| t.target.len())
            .max()
            .unwrap_or(20);
        for entry in &report.adjusted_targets {
            output.push_str(&format!(
                "  {:<width$}  {}\n",
                entry.target,
                entry.limit,
                width = width
            ));
        }
    }

    output.push('\n');
    output.push_str(&"=".repeat(60));
    output.push('\n');
    output.push_str(&format!(
        "Runs: {} | Runs left: {} | Warnings: {} | Errors: {}\n",
        report.runs,
        report.runs_left,
        report
            .messages
            .iter()
            .filter(|m| m.severity == MessageSeverity::Warning)
            .count(),
        report.count_at_least(MessageSeverity::TestError),
    ));
    if report.run_limit_exceeded {
        output.push_str("Run limit exceeded\n");
    }
    let verdict = if report.passed() { "PASSED" } else { "FAILED" };
    output.push_str(&format!(
        "Result: {} (highest severity: {})\n",
        verdict, report.highest_severity
    ));

    output
}

fn push_message(output: &mut String, message: &ReportMessage) {
    let icon = match message.severity {
        MessageSeverity::Informational => " ",
        MessageSeverity::Warning => "!",
        MessageSeverity::TestError => "✗",
        MessageSeverity::SetupError | MessageSeverity::ExecutionError => "💥",
    };
    output.push_str(&format!(
        "  {} #{}.{} [{:.3}s] {} {}: {}\n",
        icon,
        message.run,
        message.sequence,
        message.elapsed_secs,
        message.source,
        message.severity,
        message.text
    ));
    if let Some(hint) = &message.hint {
        output.push_str(&format!("      hint: {}\n", hint));
    }
}
