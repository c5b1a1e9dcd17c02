//! Metric Ranges
//!
//! An interval describing either an observed metric value or the limit a
//! metric is expected to stay within. Absence of a range is `Option::None`.

use serde::{Deserialize, Serialize};

/// Closed interval `[min, max]` of a metric
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricRange {
    /// Lower bound
    pub min: f64,
    /// Upper bound
    pub max: f64,
}

impl MetricRange {
    /// Create a range as given. Bounds are not reordered.
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Degenerate range `[value, value]` presenting a point estimate as a range
    pub fn point(value: f64) -> Self {
        Self {
            min: value,
            max: value,
        }
    }

    /// Same range with `min <= max`
    pub fn normalized(self) -> Self {
        if self.min > self.max {
            Self {
                min: self.max,
                max: self.min,
            }
        } else {
            self
        }
    }

    /// Multiply both bounds by separate factors
    pub fn scaled(self, min_factor: f64, max_factor: f64) -> Self {
        Self {
            min: self.min * min_factor,
            max: self.max * max_factor,
        }
    }

    /// Width of the range
    pub fn width(&self) -> f64 {
        self.max - self.min
    }

    /// Whether `value` lies within the range (inclusive)
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    /// Whether min and max are the same value
    pub fn is_point(&self) -> bool {
        self.min == self.max
    }
}

impl std::fmt::Display for MetricRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:.4}..{:.4}]", self.min, self.max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalized_swaps_inverted_bounds() {
        let range = MetricRange::new(2.0, 1.0).normalized();
        assert_eq!(range, MetricRange::new(1.0, 2.0));

        let ordered = MetricRange::new(1.0, 2.0);
        assert_eq!(ordered.normalized(), ordered);
    }

    #[test]
    fn test_point() {
        let range = MetricRange::point(3.5);
        assert!(range.is_point());
        assert!(range.contains(3.5));
        assert!(!range.contains(3.6));
        assert!(range.width().abs() < f64::EPSILON);
    }

    #[test]
    fn test_display() {
        assert_eq!(MetricRange::new(0.5, 1.25).to_string(), "[0.5000..1.2500]");
    }
}
