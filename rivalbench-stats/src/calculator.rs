//! Metric Calculator Strategies
//!
//! A closed set of calculation strategies behind one enum. Every operation
//! returns `Ok(None)` when there is no data; errors are reserved for contract
//! violations such as handing several values to the single-value model.

use crate::log_normal::LogNormalCalculator;
use crate::range::MetricRange;
use crate::single_value::SingleValueCalculator;
use serde::{Deserialize, Serialize};

/// Errors from metric calculation
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CalculatorError {
    /// More than one sample given to the single-value model
    #[error("Single-value calculator expects exactly one value, got {len}")]
    NotSingleValue {
        /// Number of samples given
        len: usize,
    },
}

/// Name of a calculation strategy, as used in configuration files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CalculatorKind {
    /// Exactly one value per run, no accuracy envelope
    SingleValue,
    /// Log-normally distributed samples
    #[default]
    LogNormal,
}

impl std::fmt::Display for CalculatorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CalculatorKind::SingleValue => write!(f, "single-value"),
            CalculatorKind::LogNormal => write!(f, "log-normal"),
        }
    }
}

/// Metric calculation strategy
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MetricCalculator {
    /// Exact single-value model
    SingleValue(SingleValueCalculator),
    /// Log-normal statistical model
    LogNormal(LogNormalCalculator),
}

impl Default for MetricCalculator {
    fn default() -> Self {
        MetricCalculator::LogNormal(LogNormalCalculator::default())
    }
}

impl MetricCalculator {
    /// Strategy of the given kind with default accuracy envelopes
    pub fn of_kind(kind: CalculatorKind) -> Self {
        match kind {
            CalculatorKind::SingleValue => MetricCalculator::SingleValue(SingleValueCalculator),
            CalculatorKind::LogNormal => MetricCalculator::LogNormal(LogNormalCalculator::default()),
        }
    }

    /// Which strategy this is
    pub fn kind(&self) -> CalculatorKind {
        match self {
            MetricCalculator::SingleValue(_) => CalculatorKind::SingleValue,
            MetricCalculator::LogNormal(_) => CalculatorKind::LogNormal,
        }
    }

    /// Mean value of the samples
    pub fn mean(&self, values: &[f64]) -> Result<Option<f64>, CalculatorError> {
        match self {
            MetricCalculator::SingleValue(c) => c.mean(values),
            MetricCalculator::LogNormal(c) => Ok(c.mean(values)),
        }
    }

    /// Variance estimate of the samples
    pub fn variance(&self, values: &[f64]) -> Result<Option<f64>, CalculatorError> {
        match self {
            MetricCalculator::SingleValue(c) => c.variance(values),
            MetricCalculator::LogNormal(c) => Ok(c.variance(values)),
        }
    }

    /// Mean of `values` relative to `baseline`
    pub fn relative_mean(
        &self,
        values: &[f64],
        baseline: &[f64],
    ) -> Result<Option<f64>, CalculatorError> {
        match self {
            MetricCalculator::SingleValue(c) => c.relative_mean(values, baseline),
            MetricCalculator::LogNormal(c) => Ok(c.relative_mean(values, baseline)),
        }
    }

    /// Variance of the ratio `values / baseline`
    pub fn relative_variance(
        &self,
        values: &[f64],
        baseline: &[f64],
    ) -> Result<Option<f64>, CalculatorError> {
        match self {
            MetricCalculator::SingleValue(c) => c.relative_variance(values, baseline),
            MetricCalculator::LogNormal(c) => Ok(c.relative_variance(values, baseline)),
        }
    }

    /// Observed range of the samples
    pub fn actual_range(&self, values: &[f64]) -> Result<Option<MetricRange>, CalculatorError> {
        match self {
            MetricCalculator::SingleValue(c) => c.actual_range(values),
            MetricCalculator::LogNormal(c) => Ok(c.actual_range(values)),
        }
    }

    /// Range a limit should cover for the samples
    pub fn limit_range(&self, values: &[f64]) -> Result<Option<MetricRange>, CalculatorError> {
        match self {
            MetricCalculator::SingleValue(c) => c.limit_range(values),
            MetricCalculator::LogNormal(c) => Ok(c.limit_range(values)),
        }
    }

    /// Observed range of the ratio `values / baseline`
    pub fn relative_actual_range(
        &self,
        values: &[f64],
        baseline: &[f64],
    ) -> Result<Option<MetricRange>, CalculatorError> {
        match self {
            MetricCalculator::SingleValue(c) => c.relative_actual_range(values, baseline),
            MetricCalculator::LogNormal(c) => Ok(c.relative_actual_range(values, baseline)),
        }
    }

    /// Range a relative limit should cover for the ratio `values / baseline`
    pub fn relative_limit_range(
        &self,
        values: &[f64],
        baseline: &[f64],
    ) -> Result<Option<MetricRange>, CalculatorError> {
        match self {
            MetricCalculator::SingleValue(c) => c.relative_limit_range(values, baseline),
            MetricCalculator::LogNormal(c) => Ok(c.relative_limit_range(values, baseline)),
        }
    }
}
