//! Limit Check
//!
//! Compares each competitor's observed ratio against its competition limit.

use super::{Analyser, AnalysisContext, pair_with_baselines};
use anyhow::Context;
use rivalbench_core::{LimitCheckOutcome, MessageSeverity, MessageSource};
use std::sync::PoisonError;

/// Reason attached to the rerun request after a failed check
pub const LIMITS_FAILED: &str = "Competition limits failed";

/// Check pass: observed ratios against competition limits
#[derive(Debug, Clone, Copy, Default)]
pub struct LimitCheck;

impl Analyser for LimitCheck {
    fn name(&self) -> &'static str {
        "limit-check"
    }

    fn analyse(&self, ctx: &mut AnalysisContext<'_>) -> anyhow::Result<()> {
        let options = ctx.config.options();
        let calculator = ctx.config.calculator();
        let adjusting = options.adjustment.adjust_limits;

        let groups = ctx.summary.condition_groups();
        let (pairs, orphaned) = pair_with_baselines(&groups);

        for (condition, count) in orphaned {
            ctx.state.write_message(
                MessageSource::Analyser,
                MessageSeverity::Warning,
                format!(
                    "No baseline for condition {}, {} benchmark(s) not checked",
                    condition, count
                ),
            );
        }

        let targets = ctx.session_targets()?;
        let mut failures = Vec::new();
        let mut checked = 0usize;
        {
            let targets = targets.lock().unwrap_or_else(PoisonError::into_inner);
            for pair in &pairs {
                let id = &pair.report.target;
                let limit = match targets.get(id) {
                    Some(target) if !target.limit().is_empty() => *target.limit(),
                    _ => {
                        if !adjusting {
                            ctx.state.write_message_with_hint(
                                MessageSource::Analyser,
                                MessageSeverity::Warning,
                                format!("Benchmark {} has empty limit", id),
                                "Add a [[target]] record or enable [adjustment] adjust_limits",
                            );
                        }
                        continue;
                    }
                };

                let Some(actual) = calculator
                    .relative_actual_range(&pair.report.samples, &pair.baseline.samples)
                    .with_context(|| format!("Relative range of {} ({})", id, pair.condition))?
                else {
                    tracing::debug!(target_id = %id, "No relative range, skipping limit check");
                    continue;
                };

                let verdict = match limit.check(actual) {
                    LimitCheckOutcome::Within | LimitCheckOutcome::NoLimit => {
                        checked += 1;
                        continue;
                    }
                    LimitCheckOutcome::FasterThanLimit => "faster than limit",
                    LimitCheckOutcome::SlowerThanLimit => "slower than limit",
                    LimitCheckOutcome::OutOfBothBounds => "out of both bounds of limit",
                };
                checked += 1;
                failures.push(format!(
                    "Benchmark {} ({}): ratio {} is {} {}",
                    id, pair.condition, actual, verdict, limit
                ));
            }
        }

        if failures.is_empty() {
            if checked > 0 {
                ctx.state.write_message(
                    MessageSource::Analyser,
                    MessageSeverity::Informational,
                    format!("All competition limits satisfied ({} checked)", checked),
                );
            }
            return Ok(());
        }

        let rerun = options.check.rerun_if_limits_failed && !ctx.state.last_run();
        let severity = if rerun {
            MessageSeverity::Warning
        } else {
            MessageSeverity::TestError
        };
        for failure in failures {
            ctx.state.write_message_with_hint(
                MessageSource::Analyser,
                severity,
                failure,
                "Check the benchmark for regressions or widen its limit",
            );
        }
        if rerun {
            ctx.state
                .request_reruns(options.check.additional_reruns_if_limits_failed, LIMITS_FAILED)?;
        }
        Ok(())
    }
}
