//! Annotation Writer
//!
//! Seam for persisting widened limits. How the limits end up in source files
//! or annotation documents is up to the implementation.

use rivalbench_core::{CompetitionTarget, TargetId};
use serde::{Deserialize, Serialize};
use std::sync::{Mutex, PoisonError};

/// New limit of one benchmark, to be persisted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotationRequest {
    /// Benchmark method
    pub target: TargetId,
    /// Lower ratio bound, `None` when unset or ignored
    pub min: Option<f64>,
    /// Upper ratio bound, `None` when unset or ignored
    pub max: Option<f64>,
    /// Unit of the bounds
    pub unit: String,
}

impl AnnotationRequest {
    /// Request for the current limit of `target`
    pub fn for_target(target: &CompetitionTarget, unit: impl Into<String>) -> Self {
        Self {
            target: target.target().clone(),
            min: target.limit().min().value(),
            max: target.limit().max().value(),
            unit: unit.into(),
        }
    }
}

/// Persists widened limits
pub trait AnnotationWriter: Send + Sync {
    /// Write one batch of requests
    fn write_annotations(&self, requests: &[AnnotationRequest]) -> anyhow::Result<()>;
}

/// Discards every request
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopAnnotationWriter;

impl AnnotationWriter for NoopAnnotationWriter {
    fn write_annotations(&self, requests: &[AnnotationRequest]) -> anyhow::Result<()> {
        tracing::debug!("Discarding {} annotation request(s)", requests.len());
        Ok(())
    }
}

/// Keeps every batch in memory
#[derive(Debug, Default)]
pub struct RecordingAnnotationWriter {
    batches: Mutex<Vec<Vec<AnnotationRequest>>>,
}

impl RecordingAnnotationWriter {
    /// Empty recorder
    pub fn new() -> Self {
        Self::default()
    }

    /// Batches in the order they were written
    pub fn batches(&self) -> Vec<Vec<AnnotationRequest>> {
        self.batches
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// All requests, flattened
    pub fn requests(&self) -> Vec<AnnotationRequest> {
        self.batches().into_iter().flatten().collect()
    }

    /// Latest request for `target`
    pub fn latest_for(&self, target: &TargetId) -> Option<AnnotationRequest> {
        self.requests().into_iter().rev().find(|r| &r.target == target)
    }
}

impl AnnotationWriter for RecordingAnnotationWriter {
    fn write_annotations(&self, requests: &[AnnotationRequest]) -> anyhow::Result<()> {
        self.batches
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(requests.to_vec());
        Ok(())
    }
}
