//! Limit Adjustment
//!
//! Widens competition limits until they cover the observed ratios, then hands
//! the new limits to the annotation writer and asks for reruns to confirm them.

use super::{Analyser, AnalysisContext, pair_with_baselines};
use crate::annotation::AnnotationRequest;
use anyhow::Context;
use rayon::prelude::*;
use rivalbench_core::{CompetitionTarget, MessageSeverity, MessageSource, TargetId};
use rivalbench_stats::MetricRange;
use std::collections::BTreeSet;
use std::sync::PoisonError;

/// Reason attached to the rerun request after limits changed
pub const ANNOTATIONS_UPDATED: &str = "Annotations updated";

/// Annotation pass: widen-only limit adjustment
#[derive(Debug, Clone, Copy, Default)]
pub struct LimitAdjustment;

impl Analyser for LimitAdjustment {
    fn name(&self) -> &'static str {
        "limit-adjustment"
    }

    fn analyse(&self, ctx: &mut AnalysisContext<'_>) -> anyhow::Result<()> {
        let options = &ctx.config.options().adjustment;
        let calculator = ctx.config.calculator();

        let groups = ctx.summary.condition_groups();
        let (pairs, _) = pair_with_baselines(&groups);

        let ranges: Vec<(TargetId, Option<MetricRange>)> = pairs
            .par_iter()
            .map(|pair| {
                calculator
                    .relative_limit_range(&pair.report.samples, &pair.baseline.samples)
                    .map(|range| (pair.report.target.clone(), range))
                    .with_context(|| {
                        format!("Relative limit range of {} ({})", pair.report.target, pair.condition)
                    })
            })
            .collect::<anyhow::Result<_>>()?;

        let targets = ctx.session_targets()?;
        let mut changed: Vec<CompetitionTarget> = {
            let mut targets = targets.lock().unwrap_or_else(PoisonError::into_inner);
            let mut widened = BTreeSet::new();
            for (id, range) in ranges {
                let Some(range) = range else {
                    tracing::debug!(target_id = %id, "No relative limit range, skipping");
                    continue;
                };
                let Some(target) = targets.get_mut(&id) else {
                    tracing::debug!(target_id = %id, "Benchmark has no competition target");
                    continue;
                };
                if target.union_with(range.normalized()) {
                    widened.insert(id);
                }
            }

            // A target shared by several conditions is loosened once per pass
            widened
                .into_iter()
                .filter_map(|id| {
                    let target = targets.get_mut(&id)?;
                    target.loosen_and_mark_pending(options.loose_limits_percent);
                    Some(target.clone())
                })
                .collect()
        };

        if changed.is_empty() {
            ctx.state.request_reruns(
                0,
                "All competition limits already cover the observed ratios",
            )?;
            return Ok(());
        }

        let requests: Vec<_> = changed
            .iter()
            .map(|target| AnnotationRequest::for_target(target, ctx.unit_of(target)))
            .collect();
        ctx.config
            .annotation_writer()
            .write_annotations(&requests)
            .context("Failed to write competition limit annotations")?;

        {
            let mut targets = targets.lock().unwrap_or_else(PoisonError::into_inner);
            let adjusted = ctx.adjusted_targets()?;
            let mut adjusted = adjusted.lock().unwrap_or_else(PoisonError::into_inner);
            for target in &mut changed {
                target.mark_annotated();
                if let Some(stored) = targets.get_mut(target.target()) {
                    stored.mark_annotated();
                }
                adjusted.record(target.clone());
            }
        }

        for target in &changed {
            ctx.state.write_message(
                MessageSource::Analyser,
                MessageSeverity::Informational,
                format!("Limit of {} adjusted to {}", target.target(), target.limit()),
            );
        }
        ctx.state.request_reruns(
            options.additional_reruns_if_annotations_updated,
            ANNOTATIONS_UPDATED,
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::RecordingAnnotationWriter;
    use crate::config::{CompetitionConfig, CompetitionOptions, TargetRecord};
    use rivalbench_core::{BenchmarkReport, CompetitionState, LimitBound, Summary};
    use std::sync::Arc;

    fn options() -> CompetitionOptions {
        let mut options = CompetitionOptions::default();
        options.adjustment.adjust_limits = true;
        options.adjustment.loose_limits_percent = 0.0;
        options.calculator.kind = rivalbench_stats::CalculatorKind::SingleValue;
        options
    }

    fn summary(fast: f64) -> Summary {
        Summary::new(
            "run",
            vec![
                BenchmarkReport::new("base", vec![100.0]).baseline(),
                BenchmarkReport::new("fast", vec![fast]),
            ],
        )
    }

    fn running_state() -> CompetitionState {
        let mut state = CompetitionState::new();
        state.first_time_init(10).unwrap();
        state.prepare_for_run().unwrap();
        state
    }

    #[test]
    fn test_empty_limit_is_filled_and_annotated() {
        let writer = Arc::new(RecordingAnnotationWriter::new());
        let config =
            CompetitionConfig::from_options(options()).with_annotation_writer(writer.clone());
        let summary = summary(50.0);
        let mut state = running_state();

        LimitAdjustment
            .analyse(&mut AnalysisContext::new(&summary, &mut state, &config))
            .unwrap();

        let request = writer.latest_for(&"fast".into()).unwrap();
        assert_eq!(request.min, Some(0.5));
        assert_eq!(request.max, Some(0.5));
        assert_eq!(request.unit, "ratio");
        assert_eq!(state.runs_left(), 2);
        assert!(
            state
                .messages()
                .iter()
                .any(|m| m.text().contains(ANNOTATIONS_UPDATED))
        );

        let ctx = AnalysisContext::new(&summary, &mut state, &config);
        let targets = ctx.session_targets().unwrap();
        let targets = targets.lock().unwrap();
        assert!(!targets.get(&"fast".into()).unwrap().has_pending_annotation());
        let adjusted = ctx.adjusted_targets().unwrap();
        assert_eq!(adjusted.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_converges_when_covered() {
        let writer = Arc::new(RecordingAnnotationWriter::new());
        let config =
            CompetitionConfig::from_options(options()).with_annotation_writer(writer.clone());
        let mut state = running_state();

        for fast in [50.0, 60.0, 55.0] {
            let summary = summary(fast);
            LimitAdjustment
                .analyse(&mut AnalysisContext::new(&summary, &mut state, &config))
                .unwrap();
        }

        assert_eq!(writer.batches().len(), 2);
        let request = writer.latest_for(&"fast".into()).unwrap();
        assert_eq!(request.min, Some(0.5));
        assert_eq!(request.max, Some(0.6));
        assert!(
            state
                .messages()
                .last()
                .unwrap()
                .text()
                .starts_with("No additional runs requested")
        );
    }

    #[test]
    fn test_loosen_percent_applied() {
        let mut options = options();
        options.adjustment.loose_limits_percent = 10.0;
        let writer = Arc::new(RecordingAnnotationWriter::new());
        let config = CompetitionConfig::from_options(options).with_annotation_writer(writer.clone());
        let summary = summary(50.0);
        let mut state = running_state();

        LimitAdjustment
            .analyse(&mut AnalysisContext::new(&summary, &mut state, &config))
            .unwrap();

        let request = writer.latest_for(&"fast".into()).unwrap();
        assert!((request.min.unwrap() - 0.45).abs() < 1e-12);
        assert!((request.max.unwrap() - 0.55).abs() < 1e-12);
    }

    #[test]
    fn test_ignored_bounds_stay_ignored() {
        let mut options = options();
        let mut record = TargetRecord::new("fast", None, Some(0.4));
        record.ignore_min = true;
        options.targets.push(record);
        let writer = Arc::new(RecordingAnnotationWriter::new());
        let config = CompetitionConfig::from_options(options).with_annotation_writer(writer.clone());
        let summary = summary(50.0);
        let mut state = running_state();

        LimitAdjustment
            .analyse(&mut AnalysisContext::new(&summary, &mut state, &config))
            .unwrap();

        let ctx = AnalysisContext::new(&summary, &mut state, &config);
        let targets = ctx.session_targets().unwrap();
        let targets = targets.lock().unwrap();
        let fast = targets.get(&"fast".into()).unwrap();
        assert_eq!(fast.limit().min(), LimitBound::Ignored);
        assert_eq!(fast.limit().max(), LimitBound::Value(0.5));
    }

    #[test]
    fn test_calculator_error_propagates() {
        let config = CompetitionConfig::from_options(options());
        let summary = Summary::new(
            "run",
            vec![
                BenchmarkReport::new("base", vec![100.0]).baseline(),
                BenchmarkReport::new("fast", vec![50.0, 51.0]),
            ],
        );
        let mut state = running_state();
        let result = LimitAdjustment.analyse(&mut AnalysisContext::new(&summary, &mut state, &config));
        assert!(result.is_err());
    }

    #[test]
    fn test_shared_target_across_conditions_annotated_once() {
        let mut options = options();
        options.adjustment.loose_limits_percent = 10.0;
        let writer = Arc::new(RecordingAnnotationWriter::new());
        let config = CompetitionConfig::from_options(options).with_annotation_writer(writer.clone());
        let summary = Summary::new(
            "run",
            vec![
                BenchmarkReport::new("base", vec![100.0])
                    .with_condition("sort", "n=10")
                    .baseline(),
                BenchmarkReport::new("fast", vec![50.0]).with_condition("sort", "n=10"),
                BenchmarkReport::new("base", vec![100.0])
                    .with_condition("sort", "n=1000")
                    .baseline(),
                BenchmarkReport::new("fast", vec![60.0]).with_condition("sort", "n=1000"),
            ],
        );
        let mut state = running_state();

        LimitAdjustment
            .analyse(&mut AnalysisContext::new(&summary, &mut state, &config))
            .unwrap();

        let batches = writer.batches();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].len(), 1);
        let request = &batches[0][0];
        assert!((request.min.unwrap() - 0.45).abs() < 1e-12);
        assert!((request.max.unwrap() - 0.66).abs() < 1e-12);
        assert_eq!(
            state
                .messages()
                .iter()
                .filter(|m| m.text().starts_with("Limit of fast adjusted"))
                .count(),
            1
        );
    }
}
