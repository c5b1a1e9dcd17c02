#![warn(missing_docs)]
//! rivalbench Runner
//!
//! Runs a benchmark competition: executes the suite through an
//! [`ExecutionEngine`], analyses every run, requests reruns until the observed
//! ratios settle (or the run cap is hit) and reports the outcome.
//!
//! # Example
//!
//! ```ignore
//! use rivalbench_runner::{Competition, CompetitionConfig, CompetitionOptions};
//!
//! let options = CompetitionOptions::discover().unwrap_or_default();
//! let competition = Competition::new(CompetitionConfig::from_options(options));
//! let state = competition.run(&mut my_engine, "parsers")?;
//! ```

mod analysis;
mod annotation;
mod config;
mod engine;
mod orchestrator;
mod report;

pub use analysis::{
    ANNOTATIONS_UPDATED, Analyser, AnalysisContext, LIMITS_FAILED, LimitAdjustment, LimitCheck,
};
pub use annotation::{
    AnnotationRequest, AnnotationWriter, NoopAnnotationWriter, RecordingAnnotationWriter,
};
pub use config::{
    AdjustmentOptions, CONFIG_FILE_NAME, CalculatorOptions, CheckOptions, CompetitionConfig,
    CompetitionOptions, OutputOptions, RunOptions, TargetRecord,
};
pub use engine::{ExecutionEngine, ReplayEngine};
pub use orchestrator::{Competition, CompetitionError};
pub use report::{build_report, write_json_report};
