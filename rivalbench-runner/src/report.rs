//! Report Building
//!
//! Turns the final competition state into a [`CompetitionReport`] and writes
//! it to the configured report path.

use crate::config::CompetitionConfig;
use anyhow::Context;
use rivalbench_core::{ADJUSTED_TARGETS, CompetitionState, MessageSeverity, MessageSource};
use rivalbench_report::{
    AdjustedTargetEntry, CompetitionReport, ReportMessage, ReportMeta, generate_json_report,
};
use std::path::Path;
use std::sync::PoisonError;

/// Build a report from the competition state
pub fn build_report(
    state: &CompetitionState,
    config: &CompetitionConfig,
    benchmark: &str,
) -> CompetitionReport {
    let adjusted_targets = config
        .registry()
        .and_then(|registry| registry.get(&ADJUSTED_TARGETS).ok().flatten())
        .map(|adjusted| {
            let adjusted = adjusted.lock().unwrap_or_else(PoisonError::into_inner);
            adjusted.iter().map(AdjustedTargetEntry::from).collect::<Vec<_>>()
        })
        .unwrap_or_default();

    CompetitionReport {
        meta: ReportMeta::new(benchmark),
        runs: state.run_number(),
        runs_left: state.runs_left(),
        run_limit_exceeded: state.run_limit_exceeded(),
        highest_severity: state.highest_message_severity(),
        messages: state.messages().iter().map(ReportMessage::from).collect(),
        adjusted_targets,
    }
}

/// Write `report` as JSON, creating parent directories as needed
pub fn write_json_report(report: &CompetitionReport, path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
    }
    let json = generate_json_report(report)?;
    std::fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

/// Export the report when `[output] report_path` is set, logging the outcome
pub(crate) fn export_report(
    state: &mut CompetitionState,
    config: &CompetitionConfig,
    benchmark: &str,
) {
    let Some(path) = config.options().output.report_path.as_deref() else {
        return;
    };

    let report = build_report(state, config, benchmark);
    match write_json_report(&report, path) {
        Ok(()) => state.write_message(
            MessageSource::Exporter,
            MessageSeverity::Informational,
            format!("Report written to {}", path.display()),
        ),
        Err(e) => state.write_message(
            MessageSource::Exporter,
            MessageSeverity::Warning,
            format!("Report export failed: {:#}", e),
        ),
    }
}
