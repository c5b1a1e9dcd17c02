#![warn(missing_docs)]
//! rivalbench Core - Competition State
//!
//! The data a competition session keeps between runs:
//! - `CompetitionState`: run/rerun counters and the severity-tagged message log
//! - `CompetitionLimit` / `CompetitionTarget`: widen-only ratio limits per benchmark
//! - `RunRegistry`: config-scoped store that hands out one state per key
//! - `Summary`: what the execution engine reports after each run

mod limits;
mod message;
mod registry;
mod state;
mod summary;
mod targets;

pub use limits::{CompetitionLimit, LimitBound, LimitCheckOutcome, LimitError};
pub use message::{Message, MessageSeverity, MessageSource};
pub use registry::{RegistryError, RunRegistry, StateKey};
pub use state::{CompetitionPhase, CompetitionState, SharedCompetitionState, StateError};
pub use summary::{AllocationStats, BenchmarkReport, Condition, Summary, ValidationError};
pub use targets::{
    AdjustedTargets, CompetitionTarget, CompetitionTargets, TargetId, TargetsError,
};

use std::sync::Mutex;

/// Registry slot of the session's competition state
pub const COMPETITION_STATE: StateKey<Mutex<CompetitionState>> =
    StateKey::new("rivalbench.competition-state");

/// Registry slot of the session's competition targets
pub const COMPETITION_TARGETS: StateKey<Mutex<CompetitionTargets>> =
    StateKey::new("rivalbench.competition-targets");

/// Registry slot of the targets adjusted during the session
pub const ADJUSTED_TARGETS: StateKey<Mutex<AdjustedTargets>> =
    StateKey::new("rivalbench.adjusted-targets");
