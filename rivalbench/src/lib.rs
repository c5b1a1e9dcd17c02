#![warn(missing_docs)]
//! # rivalbench
//!
//! Adaptive benchmark competitions for Rust.
//!
//! rivalbench runs a benchmark suite through your execution engine, compares
//! every benchmark against the baseline of its job/parameter group and keeps
//! rerunning until the observed ratios are stable:
//! - **Run/rerun control**: analysers request reruns; a hard cap turns endless
//!   reruns into a test error
//! - **Statistical models**: exact single-value or log-normal estimates of
//!   means, variances and ratio ranges
//! - **Widen-only limits**: competition limits only ever grow to cover new
//!   observations, ignored bounds stay ignored
//! - **Severity-tagged log**: every decision is recorded with run number,
//!   elapsed time and source
//!
//! ## Quick Start
//!
//! ```ignore
//! use rivalbench::prelude::*;
//!
//! rivalbench::init_tracing(false);
//!
//! let options = CompetitionOptions::discover().unwrap_or_default();
//! let competition = Competition::new(CompetitionConfig::from_options(options));
//!
//! let mut engine = |suite: &str, _config: &CompetitionConfig| -> anyhow::Result<Summary> {
//!     Ok(Summary::new(suite, vec![
//!         BenchmarkReport::new("std_sort", vec![102.0, 99.0, 101.0]).baseline(),
//!         BenchmarkReport::new("my_sort", vec![81.0, 80.0, 83.0]),
//!     ]))
//! };
//!
//! let state = competition.run(&mut engine, "sorting")?;
//! println!("{}", rivalbench::format_report(&state.lock().unwrap(), competition.config(), "sorting"));
//! ```
//!
//! ## Configuration
//!
//! Settings are read from `competition.toml`; see
//! [`CompetitionOptions::default_toml`] for every key.

// Re-export core types
pub use rivalbench_core::{
    AdjustedTargets, AllocationStats, BenchmarkReport, COMPETITION_STATE, CompetitionLimit,
    CompetitionPhase, CompetitionState, CompetitionTarget, CompetitionTargets, Condition,
    LimitBound, LimitCheckOutcome, Message, MessageSeverity, MessageSource, RunRegistry,
    SharedCompetitionState, StateKey, Summary, TargetId, ValidationError,
};

// Re-export stats
pub use rivalbench_stats::{
    CalculatorKind, LogNormalCalculator, MetricCalculator, MetricRange, SingleValueCalculator,
};

// Re-export runner
pub use rivalbench_runner::{
    Analyser, AnalysisContext, AnnotationRequest, AnnotationWriter, Competition,
    CompetitionConfig, CompetitionError, CompetitionOptions, ExecutionEngine, LimitAdjustment,
    LimitCheck, NoopAnnotationWriter, RecordingAnnotationWriter, ReplayEngine, TargetRecord,
    build_report,
};

// Re-export report
pub use rivalbench_report::{
    CompetitionReport, OutputFormat, format_human_output, generate_json_report,
};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        BenchmarkReport, Competition, CompetitionConfig, CompetitionOptions, ExecutionEngine,
        MessageSeverity, Summary, TargetRecord,
    };
}

/// Install a `tracing` fmt subscriber for rivalbench events.
///
/// Does nothing when a global subscriber is already installed.
pub fn init_tracing(verbose: bool) {
    let filter = if verbose {
        "rivalbench=debug"
    } else {
        "rivalbench=info"
    };
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Human-readable report of a finished competition
pub fn format_report(state: &CompetitionState, config: &CompetitionConfig, benchmark: &str) -> String {
    format_human_output(&build_report(state, config, benchmark))
}
