//! Log-Normal Calculator
//!
//! Timing samples (and ratios between them) are modelled as log-normally
//! distributed. All estimates are computed in log space and transformed back:
//! - mean: `exp(mean(ln x))` (geometric mean)
//! - variance: `exp(stddev(ln x))` (multiplicative spread, 1.0 = no spread)
//! - ratios: difference of log means, log variances added (samples assumed
//!   independent, covariance = 0)
//!
//! Non-positive samples map to `0` in log space.

use crate::range::MetricRange;
use crate::{DEFAULT_ABSOLUTE_ACCURACY, DEFAULT_RELATIVE_ACCURACY};

/// Log-normal metric model with configurable accuracy envelopes
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LogNormalCalculator {
    /// Relative half-width of the absolute limit range (0.01 = ±1%)
    pub absolute_accuracy: f64,
    /// Relative half-width of the relative limit range (0.02 = ±2%)
    pub relative_accuracy: f64,
}

impl Default for LogNormalCalculator {
    fn default() -> Self {
        Self {
            absolute_accuracy: DEFAULT_ABSOLUTE_ACCURACY,
            relative_accuracy: DEFAULT_RELATIVE_ACCURACY,
        }
    }
}

/// Summary of a sample array in log space
#[derive(Debug, Clone, Copy)]
struct LogMoments {
    mean: f64,
    variance: f64,
}

impl LogMoments {
    fn of(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }

        let logs: Vec<f64> = values
            .iter()
            .map(|&x| if x > 0.0 { x.ln() } else { 0.0 })
            .collect();

        let n = logs.len() as f64;
        let mean = logs.iter().sum::<f64>() / n;
        let variance = if logs.len() < 2 {
            0.0
        } else {
            logs.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1.0)
        };

        Some(Self { mean, variance })
    }

    fn std_dev(&self) -> f64 {
        self.variance.sqrt()
    }
}

impl LogNormalCalculator {
    /// Calculator with explicit accuracy envelopes
    pub fn new(absolute_accuracy: f64, relative_accuracy: f64) -> Self {
        Self {
            absolute_accuracy,
            relative_accuracy,
        }
    }

    /// Geometric mean of the samples
    pub fn mean(&self, values: &[f64]) -> Option<f64> {
        LogMoments::of(values).map(|m| m.mean.exp())
    }

    /// `exp` of the log-space standard deviation
    pub fn variance(&self, values: &[f64]) -> Option<f64> {
        LogMoments::of(values).map(|m| m.std_dev().exp())
    }

    /// Ratio of geometric means, `values / baseline`
    pub fn relative_mean(&self, values: &[f64], baseline: &[f64]) -> Option<f64> {
        let sample = LogMoments::of(values)?;
        let base = LogMoments::of(baseline)?;
        Some((sample.mean - base.mean).exp())
    }

    /// Standard deviation of the ratio's log-normal distribution
    pub fn relative_variance(&self, values: &[f64], baseline: &[f64]) -> Option<f64> {
        let sample = LogMoments::of(values)?;
        let base = LogMoments::of(baseline)?;

        let result_mean = sample.mean - base.mean;
        let result_variance = sample.variance + base.variance;

        let second_moment = (2.0 * result_mean + 2.0 * result_variance).exp();
        let squared_mean = (2.0 * result_mean + result_variance).exp();
        Some((second_moment - squared_mean).max(0.0).sqrt())
    }

    /// Point estimate `[mean, mean]`
    pub fn actual_range(&self, values: &[f64]) -> Option<MetricRange> {
        self.mean(values).map(MetricRange::point)
    }

    /// `[mean·(1 − a), mean·(1 + a)]`
    pub fn limit_range(&self, values: &[f64]) -> Option<MetricRange> {
        self.actual_range(values).map(|r| {
            r.scaled(1.0 - self.absolute_accuracy, 1.0 + self.absolute_accuracy)
        })
    }

    /// Point estimate `[ratio, ratio]`
    pub fn relative_actual_range(&self, values: &[f64], baseline: &[f64]) -> Option<MetricRange> {
        self.relative_mean(values, baseline).map(MetricRange::point)
    }

    /// `[ratio·(1 − r), ratio·(1 + r)]`
    pub fn relative_limit_range(&self, values: &[f64], baseline: &[f64]) -> Option<MetricRange> {
        self.relative_actual_range(values, baseline).map(|r| {
            r.scaled(1.0 - self.relative_accuracy, 1.0 + self.relative_accuracy)
        })
    }
}
