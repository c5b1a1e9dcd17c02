//! Competition Targets
//!
//! One [`CompetitionTarget`] per benchmark method, collected into a
//! [`CompetitionTargets`] set whose keys are fixed once initialised.

use crate::limits::CompetitionLimit;
use rivalbench_stats::MetricRange;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Errors from target set operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TargetsError {
    /// Target set initialized twice
    #[error("Competition targets are already initialized")]
    AlreadyInitialized,

    /// Two targets share a name
    #[error("Duplicate competition target: {0}")]
    DuplicateTarget(TargetId),
}

/// Identity of a benchmark method
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TargetId(String);

impl TargetId {
    /// Wrap a method identifier
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The identifier string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TargetId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for TargetId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for TargetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Limit of one benchmark method
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompetitionTarget {
    target: TargetId,
    limit: CompetitionLimit,
    uses_external_annotation: bool,
    has_pending_annotation: bool,
}

impl CompetitionTarget {
    /// Target with the given limit
    pub fn new(target: impl Into<TargetId>, limit: CompetitionLimit) -> Self {
        Self {
            target: target.into(),
            limit,
            uses_external_annotation: false,
            has_pending_annotation: false,
        }
    }

    /// Limits are stored outside the benchmark source (e.g. an annotation file)
    pub fn with_external_annotation(mut self, external: bool) -> Self {
        self.uses_external_annotation = external;
        self
    }

    /// Benchmark method
    pub fn target(&self) -> &TargetId {
        &self.target
    }

    /// Current limit
    pub fn limit(&self) -> &CompetitionLimit {
        &self.limit
    }

    /// Whether limits live outside the benchmark source
    pub fn uses_external_annotation(&self) -> bool {
        self.uses_external_annotation
    }

    /// Whether a widened limit still has to be written by the annotation writer
    pub fn has_pending_annotation(&self) -> bool {
        self.has_pending_annotation
    }

    /// Widen the limit to cover `range`
    pub fn union_with(&mut self, range: MetricRange) -> bool {
        self.limit.union_with(range)
    }

    /// Relax the limit by `percent` and flag it for annotation
    pub fn loosen_and_mark_pending(&mut self, percent: f64) {
        self.limit.loosen(percent);
        self.has_pending_annotation = true;
    }

    /// The annotation writer has persisted the limit
    pub fn mark_annotated(&mut self) {
        self.has_pending_annotation = false;
    }
}

/// Set of targets keyed by method, initialised exactly once
#[derive(Debug, Clone, Default)]
pub struct CompetitionTargets {
    targets: BTreeMap<TargetId, CompetitionTarget>,
    initialized: bool,
}

impl CompetitionTargets {
    /// Empty, uninitialised set
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether [`initialize`](Self::initialize) has run
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Fill the set. Keys are fixed afterwards.
    pub fn initialize(
        &mut self,
        targets: impl IntoIterator<Item = CompetitionTarget>,
    ) -> Result<(), TargetsError> {
        if self.initialized {
            return Err(TargetsError::AlreadyInitialized);
        }

        let mut collected = BTreeMap::new();
        for target in targets {
            let id = target.target.clone();
            if collected.insert(id.clone(), target).is_some() {
                return Err(TargetsError::DuplicateTarget(id));
            }
        }

        self.targets = collected;
        self.initialized = true;
        Ok(())
    }

    /// Target for a method
    pub fn get(&self, id: &TargetId) -> Option<&CompetitionTarget> {
        self.targets.get(id)
    }

    /// Mutable target for a method
    pub fn get_mut(&mut self, id: &TargetId) -> Option<&mut CompetitionTarget> {
        self.targets.get_mut(id)
    }

    /// All targets ordered by method
    pub fn iter(&self) -> impl Iterator<Item = &CompetitionTarget> {
        self.targets.values()
    }

    /// Targets waiting for the annotation writer
    pub fn pending_annotation(&self) -> impl Iterator<Item = &CompetitionTarget> {
        self.targets.values().filter(|t| t.has_pending_annotation)
    }

    /// Number of targets
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    /// Whether the set has no targets
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

/// Session-lifetime record of every target whose limit was widened
#[derive(Debug, Clone, Default)]
pub struct AdjustedTargets {
    targets: BTreeMap<TargetId, CompetitionTarget>,
}

impl AdjustedTargets {
    /// Empty accumulator
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the latest state of an adjusted target
    pub fn record(&mut self, target: CompetitionTarget) {
        self.targets.insert(target.target.clone(), target);
    }

    /// Adjusted targets ordered by method
    pub fn iter(&self) -> impl Iterator<Item = &CompetitionTarget> {
        self.targets.values()
    }

    /// Number of adjusted targets
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    /// Whether nothing was adjusted
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}
