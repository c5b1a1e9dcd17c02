//! Run Analysis
//!
//! Analysers inspect the summary of a finished run, log messages and request
//! reruns. They are stateless; anything that has to survive between runs is
//! kept in the run registry.

mod adjustment;
mod limits_check;

pub use adjustment::{ANNOTATIONS_UPDATED, LimitAdjustment};
pub use limits_check::{LIMITS_FAILED, LimitCheck};

use crate::config::CompetitionConfig;
use anyhow::Context;
use rivalbench_core::{
    ADJUSTED_TARGETS, AdjustedTargets, BenchmarkReport, COMPETITION_TARGETS, CompetitionLimit,
    CompetitionState, CompetitionTarget, CompetitionTargets, Condition, RunRegistry, Summary,
};
use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, PoisonError};

/// Inspects one finished run
pub trait Analyser: Send + Sync {
    /// Short identifier used in logs
    fn name(&self) -> &'static str;

    /// Analyse the run described by `ctx`
    fn analyse(&self, ctx: &mut AnalysisContext<'_>) -> anyhow::Result<()>;
}

/// What an analyser gets to see of a run
pub struct AnalysisContext<'a> {
    /// Summary of the run
    pub summary: &'a Summary,
    /// Session state, for messages and rerun requests
    pub state: &'a mut CompetitionState,
    /// Competition configuration
    pub config: &'a CompetitionConfig,
}

impl<'a> AnalysisContext<'a> {
    /// Bundle the inputs of one analysis
    pub fn new(
        summary: &'a Summary,
        state: &'a mut CompetitionState,
        config: &'a CompetitionConfig,
    ) -> Self {
        Self {
            summary,
            state,
            config,
        }
    }

    fn registry(&self) -> anyhow::Result<&Arc<RunRegistry>> {
        self.config
            .registry()
            .context("Competition config has no run registry")
    }

    /// Session targets, initialised on first access from the configured
    /// records and the benchmarks of this run
    pub fn session_targets(&self) -> anyhow::Result<Arc<Mutex<CompetitionTargets>>> {
        let shared = self
            .registry()?
            .get_or_create(&COMPETITION_TARGETS, || Mutex::new(CompetitionTargets::new()))?;

        {
            let mut targets = shared.lock().unwrap_or_else(PoisonError::into_inner);
            if !targets.is_initialized() {
                targets.initialize(self.initial_targets()?)?;
                tracing::debug!("Initialized {} competition target(s)", targets.len());
            }
        }
        Ok(shared)
    }

    /// Targets whose limits were widened during the session
    pub fn adjusted_targets(&self) -> anyhow::Result<Arc<Mutex<AdjustedTargets>>> {
        Ok(self
            .registry()?
            .get_or_create(&ADJUSTED_TARGETS, || Mutex::new(AdjustedTargets::new()))?)
    }

    fn initial_targets(&self) -> anyhow::Result<Vec<CompetitionTarget>> {
        let options = self.config.options();
        let mut targets = Vec::new();
        let mut seen = BTreeSet::new();

        for record in &options.targets {
            let target = record
                .to_target()
                .with_context(|| format!("Invalid limit record for {}", record.name))?;
            seen.insert(target.target().clone());
            targets.push(target);
        }
        for report in self.summary.competitors() {
            if seen.insert(report.target.clone()) {
                targets.push(CompetitionTarget::new(
                    report.target.clone(),
                    CompetitionLimit::EMPTY,
                ));
            }
        }
        Ok(targets)
    }

    /// Unit of a target's bounds
    pub fn unit_of(&self, target: &CompetitionTarget) -> String {
        self.config
            .options()
            .target_record(target.target().as_str())
            .map(|r| r.unit.clone())
            .unwrap_or_else(|| "ratio".to_string())
    }
}

/// Competitor with the baseline of its condition group
#[derive(Debug, Clone, Copy)]
pub(crate) struct Pairing<'a> {
    pub condition: &'a Condition,
    pub report: &'a BenchmarkReport,
    pub baseline: &'a BenchmarkReport,
}

/// Split a summary into competitor/baseline pairs and groups without a baseline
pub(crate) fn pair_with_baselines<'a>(
    groups: &'a std::collections::BTreeMap<Condition, Vec<&'a BenchmarkReport>>,
) -> (Vec<Pairing<'a>>, Vec<(&'a Condition, usize)>) {
    let mut pairs = Vec::new();
    let mut orphaned = Vec::new();

    for (condition, reports) in groups {
        let competitors: Vec<&BenchmarkReport> =
            reports.iter().copied().filter(|r| !r.is_baseline).collect();
        match reports.iter().copied().find(|r| r.is_baseline) {
            Some(baseline) => pairs.extend(competitors.into_iter().map(|report| Pairing {
                condition,
                report,
                baseline,
            })),
            None if !competitors.is_empty() => orphaned.push((condition, competitors.len())),
            None => {}
        }
    }
    (pairs, orphaned)
}
