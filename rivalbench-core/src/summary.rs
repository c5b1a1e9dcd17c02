//! Execution Summary
//!
//! Data handed back by the benchmark execution engine after one run: timing
//! samples per benchmark, validation errors, and the job/parameter conditions
//! that decide which baseline a benchmark is compared against.

use crate::targets::TargetId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Result of one execution of the benchmark suite
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Summary {
    /// Human-readable title of the run
    #[serde(default)]
    pub title: String,
    /// Per-benchmark reports
    #[serde(default)]
    pub reports: Vec<BenchmarkReport>,
    /// Problems found while validating the run
    #[serde(default)]
    pub validation_errors: Vec<ValidationError>,
}

/// Samples collected for one benchmark under one condition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkReport {
    /// Benchmark method
    pub target: TargetId,
    /// Job the benchmark ran under
    #[serde(default)]
    pub job: String,
    /// Parameter set the benchmark ran with
    #[serde(default)]
    pub parameters: String,
    /// Whether this benchmark is the baseline of its condition group
    #[serde(default)]
    pub is_baseline: bool,
    /// Raw timing samples in nanoseconds
    #[serde(default)]
    pub samples: Vec<f64>,
    /// Allocation statistics, when the engine tracked them
    #[serde(default)]
    pub allocations: Option<AllocationStats>,
}

/// Heap allocation counters for a benchmark
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationStats {
    /// Bytes allocated per operation
    pub bytes_allocated: u64,
    /// Allocations per operation
    pub allocation_count: u64,
}

/// Validation problem reported by the engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationError {
    /// Description
    pub message: String,
    /// Critical errors invalidate the run
    #[serde(default)]
    pub is_critical: bool,
    /// Affected benchmark, `None` for suite-wide problems
    #[serde(default)]
    pub benchmark: Option<TargetId>,
}

/// Job and parameters shared by benchmarks that are compared with each other
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Condition {
    /// Job identifier
    pub job: String,
    /// Parameter set identifier
    pub parameters: String,
}

impl std::fmt::Display for Condition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (self.job.is_empty(), self.parameters.is_empty()) {
            (true, true) => write!(f, "default"),
            (false, true) => write!(f, "{}", self.job),
            (true, false) => write!(f, "{}", self.parameters),
            (false, false) => write!(f, "{}, {}", self.job, self.parameters),
        }
    }
}

impl BenchmarkReport {
    /// Report with samples under the default condition
    pub fn new(target: impl Into<TargetId>, samples: Vec<f64>) -> Self {
        Self {
            target: target.into(),
            job: String::new(),
            parameters: String::new(),
            is_baseline: false,
            samples,
            allocations: None,
        }
    }

    /// Mark this report as its group's baseline
    pub fn baseline(mut self) -> Self {
        self.is_baseline = true;
        self
    }

    /// Set the job/parameter condition
    pub fn with_condition(mut self, job: impl Into<String>, parameters: impl Into<String>) -> Self {
        self.job = job.into();
        self.parameters = parameters.into();
        self
    }

    /// Condition this report belongs to
    pub fn condition(&self) -> Condition {
        Condition {
            job: self.job.clone(),
            parameters: self.parameters.clone(),
        }
    }
}

impl ValidationError {
    /// Validation error not tied to a benchmark
    pub fn new(message: impl Into<String>, is_critical: bool) -> Self {
        Self {
            message: message.into(),
            is_critical,
            benchmark: None,
        }
    }

    /// Attach the affected benchmark
    pub fn for_benchmark(mut self, benchmark: impl Into<TargetId>) -> Self {
        self.benchmark = Some(benchmark.into());
        self
    }
}

impl Summary {
    /// Summary with the given reports and no validation errors
    pub fn new(title: impl Into<String>, reports: Vec<BenchmarkReport>) -> Self {
        Self {
            title: title.into(),
            reports,
            validation_errors: Vec::new(),
        }
    }

    /// Reports grouped by condition, in deterministic order
    pub fn condition_groups(&self) -> BTreeMap<Condition, Vec<&BenchmarkReport>> {
        let mut groups: BTreeMap<Condition, Vec<&BenchmarkReport>> = BTreeMap::new();
        for report in &self.reports {
            groups.entry(report.condition()).or_default().push(report);
        }
        groups
    }

    /// Baseline report sharing the condition of `report`
    pub fn baseline_for(&self, report: &BenchmarkReport) -> Option<&BenchmarkReport> {
        self.reports
            .iter()
            .find(|r| r.is_baseline && r.job == report.job && r.parameters == report.parameters)
    }

    /// Reports that are compared against a baseline
    pub fn competitors(&self) -> impl Iterator<Item = &BenchmarkReport> {
        self.reports.iter().filter(|r| !r.is_baseline)
    }

    /// Whether any validation error is critical
    pub fn has_critical_validation_errors(&self) -> bool {
        self.validation_errors.iter().any(|e| e.is_critical)
    }
}
