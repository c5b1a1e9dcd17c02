//! Competition Orchestrator
//!
//! Drives the run/rerun loop:
//!
//! ```text
//! init ─▶ ┌ prepare_for_run ─▶ engine ─▶ analysers ─▶ run_completed ┐
//!         └────────────────── while runs_left > 0 ◀────────────────┘
//!      ─▶ run-limit check ─▶ validation errors ─▶ complete ─▶ report
//! ```
//!
//! Engine and analyser failures (panics included) end the loop with a single
//! ExecutionError message; the state is still returned to the caller.

use crate::analysis::AnalysisContext;
use crate::config::CompetitionConfig;
use crate::engine::ExecutionEngine;
use crate::report::export_report;
use rivalbench_core::{
    COMPETITION_STATE, CompetitionPhase, CompetitionState, MessageSeverity, MessageSource,
    RegistryError, SharedCompetitionState, StateError, Summary,
};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Mutex, PoisonError};
use thiserror::Error;

/// Configuration errors that prevent a competition from starting
#[derive(Debug, Error)]
pub enum CompetitionError {
    /// The config was built without a registry
    #[error("Competition config has no run registry")]
    MissingRegistry,

    /// The registry already holds a started state
    #[error("Competition state was already used by another competition")]
    StateAlreadyUsed,

    /// State transition failed
    #[error("Invalid competition state: {0}")]
    State(#[from] StateError),

    /// Registry slot holds another type
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// A competition over one benchmark suite
#[derive(Debug, Clone)]
pub struct Competition {
    config: CompetitionConfig,
}

impl Competition {
    /// Competition with the given configuration
    pub fn new(config: CompetitionConfig) -> Self {
        Self { config }
    }

    /// Configuration of this competition
    pub fn config(&self) -> &CompetitionConfig {
        &self.config
    }

    /// Run the competition to completion
    pub fn run<E>(
        &self,
        engine: &mut E,
        benchmark: &str,
    ) -> Result<SharedCompetitionState, CompetitionError>
    where
        E: ExecutionEngine + ?Sized,
    {
        let registry = self
            .config
            .registry()
            .ok_or(CompetitionError::MissingRegistry)?;
        let shared =
            registry.get_or_create(&COMPETITION_STATE, || Mutex::new(CompetitionState::new()))?;

        {
            let mut state = shared.lock().unwrap_or_else(PoisonError::into_inner);
            if state.phase() != CompetitionPhase::NotStarted {
                return Err(CompetitionError::StateAlreadyUsed);
            }
            state.first_time_init(self.config.options().run.max_runs_allowed)?;
            tracing::info!(
                benchmark,
                max_runs = state.max_runs_allowed(),
                "Starting competition"
            );

            match self.run_loop(&mut state, engine, benchmark) {
                Ok(()) => self.check_run_count(&mut state),
                Err(message) => state.write_message(
                    MessageSource::Runner,
                    MessageSeverity::ExecutionError,
                    message,
                ),
            }

            self.report_validation_errors(&mut state);
            state.complete();
            export_report(&mut state, &self.config, benchmark);

            tracing::info!(
                benchmark,
                runs = state.run_number(),
                severity = %state.highest_message_severity(),
                "Competition finished"
            );
        }

        Ok(shared)
    }

    fn run_loop<E>(
        &self,
        state: &mut CompetitionState,
        engine: &mut E,
        benchmark: &str,
    ) -> Result<(), String>
    where
        E: ExecutionEngine + ?Sized,
    {
        while state.runs_left() > 0 {
            state.prepare_for_run().map_err(|e| e.to_string())?;

            let mut text = format!(
                "Run {}, total runs (expected): {}",
                state.run_number(),
                state.run_number() + state.runs_left()
            );
            if state.last_run() {
                text.push_str(", last run");
            }
            state.write_message(MessageSource::Runner, MessageSeverity::Informational, text);

            let summary = guarded("Benchmark execution", || {
                engine.execute(benchmark, &self.config)
            })?;
            let analysed = self.analyse(state, &summary);
            state.run_completed(summary);
            analysed?;

            if state.has_critical_errors_in_run() {
                tracing::warn!(run = state.run_number(), "Critical error, stopping competition");
                break;
            }
            if state.last_run() {
                break;
            }
            if state.runs_left() > 0 {
                state.write_message(
                    MessageSource::Runner,
                    MessageSeverity::Informational,
                    format!("Runs left: {}", state.runs_left()),
                );
            }
        }
        Ok(())
    }

    fn analyse(&self, state: &mut CompetitionState, summary: &Summary) -> Result<(), String> {
        for analyser in self.config.analysers() {
            tracing::debug!(analyser = analyser.name(), "Analysing run");
            let mut ctx = AnalysisContext::new(summary, state, &self.config);
            guarded(&format!("Analyser {}", analyser.name()), || {
                analyser.analyse(&mut ctx)
            })?;
        }
        Ok(())
    }

    fn check_run_count(&self, state: &mut CompetitionState) {
        if state.run_limit_exceeded() {
            state.write_message_with_hint(
                MessageSource::Runner,
                MessageSeverity::TestError,
                format!(
                    "The benchmark run limit ({} runs) exceeded, {} rerun(s) still requested",
                    state.max_runs_allowed(),
                    state.runs_left()
                ),
                "Results are unstable; raise [run] max_runs_allowed or investigate the noise",
            );
        } else if state.run_number() > 1 {
            state.write_message(
                MessageSource::Runner,
                MessageSeverity::Warning,
                format!(
                    "The competition took {} runs; consider tighter benchmark settings",
                    state.run_number()
                ),
            );
        }
    }

    fn report_validation_errors(&self, state: &mut CompetitionState) {
        let Some(summary) = state.last_run_summary() else {
            return;
        };
        let errors: Vec<_> = summary
            .validation_errors
            .iter()
            .map(|e| {
                let severity = if e.is_critical {
                    MessageSeverity::TestError
                } else {
                    MessageSeverity::Warning
                };
                let text = match &e.benchmark {
                    Some(benchmark) => format!("{}: {}", benchmark, e.message),
                    None => e.message.clone(),
                };
                (severity, text)
            })
            .collect();

        for (severity, text) in errors {
            state.write_message(MessageSource::Validator, severity, text);
        }
    }
}

/// Run `f`, turning both errors and panics into a message
fn guarded<T>(what: &str, f: impl FnOnce() -> anyhow::Result<T>) -> Result<T, String> {
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(format!("{} failed: {:#}", what, e)),
        Err(panic) => {
            let message = if let Some(s) = panic.downcast_ref::<&str>() {
                s.to_string()
            } else if let Some(s) = panic.downcast_ref::<String>() {
                s.clone()
            } else {
                "Unknown panic".to_string()
            };
            Err(format!("{} panicked: {}", what, message))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CompetitionOptions;
    use crate::analysis::{Analyser, AnalysisContext};
    use rivalbench_core::{BenchmarkReport, RunRegistry, ValidationError};
    use std::sync::Arc;

    fn options(max_runs: u32) -> CompetitionOptions {
        let mut options = CompetitionOptions::default();
        options.run.max_runs_allowed = max_runs;
        options
    }

    fn empty_summary(_: &str, _: &CompetitionConfig) -> anyhow::Result<Summary> {
        Ok(Summary::new("run", Vec::new()))
    }

    #[test]
    fn test_single_run() {
        let competition = Competition::new(CompetitionConfig::from_options(options(5)));
        let shared = competition.run(&mut empty_summary, "suite").unwrap();
        let state = shared.lock().unwrap();
        assert_eq!(state.run_number(), 1);
        assert_eq!(state.runs_left(), 0);
        assert_eq!(state.phase(), CompetitionPhase::Completed);
        assert_eq!(state.highest_message_severity(), MessageSeverity::Informational);
        assert_eq!(
            state.messages()[0].text(),
            "Run 1, total runs (expected): 1"
        );
    }

    #[test]
    fn test_missing_registry() {
        let config = CompetitionConfig::from_options(options(5)).without_registry();
        let result = Competition::new(config).run(&mut empty_summary, "suite");
        assert!(matches!(result, Err(CompetitionError::MissingRegistry)));
    }

    #[test]
    fn test_state_cannot_be_reused() {
        let registry = Arc::new(RunRegistry::new());
        let config = CompetitionConfig::from_options(options(5)).with_registry(registry);
        let competition = Competition::new(config);
        competition.run(&mut empty_summary, "suite").unwrap();
        assert!(matches!(
            competition.run(&mut empty_summary, "suite"),
            Err(CompetitionError::StateAlreadyUsed)
        ));
    }

    #[test]
    fn test_single_run_cap_marks_last_run() {
        let competition = Competition::new(CompetitionConfig::from_options(options(1)));
        let shared = competition.run(&mut empty_summary, "suite").unwrap();
        let state = shared.lock().unwrap();
        assert_eq!(
            state.messages()[0].text(),
            "Run 1, total runs (expected): 1, last run"
        );
    }

    #[test]
    fn test_engine_error_becomes_execution_error() {
        let competition = Competition::new(CompetitionConfig::from_options(options(5)));
        let mut engine = |_: &str, _: &CompetitionConfig| -> anyhow::Result<Summary> {
            anyhow::bail!("engine exploded")
        };
        let shared = competition.run(&mut engine, "suite").unwrap();
        let state = shared.lock().unwrap();
        let errors: Vec<_> = state
            .messages()
            .iter()
            .filter(|m| m.severity() == MessageSeverity::ExecutionError)
            .collect();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].text().contains("engine exploded"));
        assert!(state.last_run_summary().is_none());
    }

    #[test]
    fn test_engine_panic_becomes_execution_error() {
        let competition = Competition::new(CompetitionConfig::from_options(options(5)));
        let mut engine = |_: &str, _: &CompetitionConfig| -> anyhow::Result<Summary> {
            panic!("engine panicked hard")
        };
        let shared = competition.run(&mut engine, "suite").unwrap();
        let state = shared.lock().unwrap();
        assert_eq!(state.highest_message_severity(), MessageSeverity::ExecutionError);
        assert!(
            state
                .messages()
                .iter()
                .any(|m| m.text().contains("engine panicked hard"))
        );
    }

    #[test]
    fn test_validation_errors_reported() {
        let competition = Competition::new(CompetitionConfig::from_options(options(5)));
        let mut engine = |_: &str, _: &CompetitionConfig| -> anyhow::Result<Summary> {
            let mut summary = Summary::new("run", vec![BenchmarkReport::new("a", vec![1.0])]);
            summary.validation_errors = vec![
                ValidationError::new("noisy machine", false),
                ValidationError::new("no samples", true).for_benchmark("a"),
            ];
            Ok(summary)
        };
        let shared = competition.run(&mut engine, "suite").unwrap();
        let state = shared.lock().unwrap();
        let validator: Vec<_> = state
            .messages()
            .iter()
            .filter(|m| m.source() == MessageSource::Validator)
            .map(|m| (m.severity(), m.text().to_string()))
            .collect();
        assert_eq!(
            validator,
            vec![
                (MessageSeverity::Warning, "noisy machine".to_string()),
                (MessageSeverity::TestError, "a: no samples".to_string()),
            ]
        );
    }

    struct PanickingAnalyser;

    impl Analyser for PanickingAnalyser {
        fn name(&self) -> &'static str {
            "panicking"
        }

        fn analyse(&self, _ctx: &mut AnalysisContext<'_>) -> anyhow::Result<()> {
            panic!("analyser gave up")
        }
    }

    #[test]
    fn test_validation_errors_survive_analyser_panic() {
        let config = CompetitionConfig::from_options(options(5)).with_analyser(PanickingAnalyser);
        let competition = Competition::new(config);
        let mut engine = |_: &str, _: &CompetitionConfig| -> anyhow::Result<Summary> {
            let mut summary = Summary::new("run", vec![BenchmarkReport::new("a", vec![1.0])]);
            summary.validation_errors = vec![ValidationError::new("critical validation", true)];
            Ok(summary)
        };
        let shared = competition.run(&mut engine, "suite").unwrap();
        let state = shared.lock().unwrap();

        assert!(state.last_run_summary().is_some());
        let validator: Vec<_> = state
            .messages()
            .iter()
            .filter(|m| m.source() == MessageSource::Validator)
            .collect();
        assert_eq!(validator.len(), 1);
        assert_eq!(validator[0].severity(), MessageSeverity::TestError);
        assert_eq!(validator[0].text(), "critical validation");
        assert!(
            state
                .messages()
                .iter()
                .any(|m| m.severity() == MessageSeverity::ExecutionError
                    && m.text().contains("analyser gave up"))
        );
    }
}
