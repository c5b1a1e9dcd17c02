#![warn(missing_docs)]
//! rivalbench Statistical Engine
//!
//! Turns raw timing samples into the estimates a competition needs:
//! - Mean and variance of a benchmark's samples
//! - Ratios against a baseline benchmark (relative mean / relative variance)
//! - Observed ranges and the accuracy envelopes used as limit ranges
//!
//! Two calculation strategies are available through [`MetricCalculator`]:
//! an exact single-value model and a log-normal model suited to timing ratios.

mod calculator;
mod log_normal;
mod range;
mod single_value;

pub use calculator::{CalculatorError, CalculatorKind, MetricCalculator};
pub use log_normal::LogNormalCalculator;
pub use range::MetricRange;
pub use single_value::SingleValueCalculator;

/// Default accuracy envelope of the log-normal absolute limit range (±1%)
pub const DEFAULT_ABSOLUTE_ACCURACY: f64 = 0.01;

/// Default accuracy envelope of the log-normal relative limit range (±1% × ±1%)
pub const DEFAULT_RELATIVE_ACCURACY: f64 = 0.02;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constants() {
        assert!((DEFAULT_ABSOLUTE_ACCURACY - 0.01).abs() < f64::EPSILON);
        assert!((DEFAULT_RELATIVE_ACCURACY - 0.02).abs() < f64::EPSILON);
    }
}
