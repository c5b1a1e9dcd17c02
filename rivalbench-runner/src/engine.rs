//! Execution Engine
//!
//! The collaborator that actually runs the benchmarks. The competition only
//! sees the [`Summary`] it returns.

use crate::config::CompetitionConfig;
use anyhow::Context;
use rivalbench_core::Summary;
use std::path::Path;

/// Runs a benchmark suite once and reports its samples
///
/// The competition holds the lock on its [`COMPETITION_STATE`] slot for the
/// whole run, engine calls included. An engine must not lock that state
/// through `config.registry()`; doing so deadlocks.
///
/// [`COMPETITION_STATE`]: rivalbench_core::COMPETITION_STATE
pub trait ExecutionEngine {
    /// Execute `benchmark` and return the run summary
    fn execute(&mut self, benchmark: &str, config: &CompetitionConfig) -> anyhow::Result<Summary>;
}

impl<F> ExecutionEngine for F
where
    F: FnMut(&str, &CompetitionConfig) -> anyhow::Result<Summary>,
{
    fn execute(&mut self, benchmark: &str, config: &CompetitionConfig) -> anyhow::Result<Summary> {
        self(benchmark, config)
    }
}

/// Engine that replays recorded summaries, repeating the last one when exhausted
#[derive(Debug, Clone)]
pub struct ReplayEngine {
    summaries: Vec<Summary>,
    position: usize,
}

impl ReplayEngine {
    /// Replay `summaries` in order
    pub fn new(summaries: Vec<Summary>) -> Self {
        Self {
            summaries,
            position: 0,
        }
    }

    /// Load summaries from a JSON file holding one summary or an array of them
    pub fn from_json_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read summaries from {}", path.display()))?;
        Self::from_json(&content)
    }

    /// Parse summaries from JSON: one summary or an array of them
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        let summaries = if value.is_array() {
            serde_json::from_value(value)?
        } else {
            vec![serde_json::from_value(value)?]
        };
        Ok(Self::new(summaries))
    }

    /// Runs replayed so far
    pub fn executions(&self) -> usize {
        self.position
    }
}

impl ExecutionEngine for ReplayEngine {
    fn execute(&mut self, benchmark: &str, _config: &CompetitionConfig) -> anyhow::Result<Summary> {
        let index = self.position.min(self.summaries.len().saturating_sub(1));
        let summary = self
            .summaries
            .get(index)
            .cloned()
            .with_context(|| format!("No recorded summary to replay for {}", benchmark))?;
        self.position += 1;
        Ok(summary)
    }
}
