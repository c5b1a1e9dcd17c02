//! Competition Limits
//!
//! An acceptable `[min, max]` ratio band for a benchmark relative to its
//! baseline. Each bound is either unset (`Empty`), switched off (`Ignored`)
//! or a positive number.
//!
//! Limits only ever widen through union: a numeric min can only decrease and
//! a numeric max can only increase. An ignored bound is a fixed point of
//! union; only building a new limit replaces it.

use rivalbench_stats::MetricRange;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from limit construction
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LimitError {
    /// Negative, NaN or infinite bound
    #[error("Limit bound must be a finite non-negative number, got {0}")]
    InvalidBound(f64),

    /// Bounds in the wrong order
    #[error("Limit min {min} is greater than max {max}")]
    MinGreaterThanMax {
        /// Requested lower bound
        min: f64,
        /// Requested upper bound
        max: f64,
    },
}

/// One side of a competition limit
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LimitBound {
    /// Not set yet, the first union fills it
    #[default]
    Empty,
    /// No bound on this side
    Ignored,
    /// Numeric bound
    Value(f64),
}

impl LimitBound {
    /// The numeric bound, if any
    pub fn value(self) -> Option<f64> {
        match self {
            LimitBound::Value(v) => Some(v),
            _ => None,
        }
    }

    /// Whether the bound is unset
    pub fn is_empty(self) -> bool {
        matches!(self, LimitBound::Empty)
    }

    /// Whether the bound is switched off
    pub fn is_ignored(self) -> bool {
        matches!(self, LimitBound::Ignored)
    }

    fn validated(value: f64) -> Result<Self, LimitError> {
        if value.is_finite() && value >= 0.0 {
            Ok(LimitBound::Value(value))
        } else {
            Err(LimitError::InvalidBound(value))
        }
    }
}

impl std::fmt::Display for LimitBound {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LimitBound::Empty => write!(f, "?"),
            LimitBound::Ignored => write!(f, "*"),
            LimitBound::Value(v) => write!(f, "{:.2}", v),
        }
    }
}

/// Outcome of checking an observed range against a limit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitCheckOutcome {
    /// Observed range lies within the limit
    Within,
    /// Observed minimum is below the lower bound
    FasterThanLimit,
    /// Observed maximum is above the upper bound
    SlowerThanLimit,
    /// Observed range exceeds both bounds
    OutOfBothBounds,
    /// The limit has no bounds set
    NoLimit,
}

impl LimitCheckOutcome {
    /// Whether the observed range violates the limit
    pub fn is_failure(self) -> bool {
        matches!(
            self,
            LimitCheckOutcome::FasterThanLimit
                | LimitCheckOutcome::SlowerThanLimit
                | LimitCheckOutcome::OutOfBothBounds
        )
    }
}

/// Competition limit: acceptable ratio band relative to the baseline
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CompetitionLimit {
    min: LimitBound,
    max: LimitBound,
}

impl CompetitionLimit {
    /// Both bounds unset
    pub const EMPTY: CompetitionLimit = CompetitionLimit {
        min: LimitBound::Empty,
        max: LimitBound::Empty,
    };

    /// Both bounds switched off
    pub const IGNORED: CompetitionLimit = CompetitionLimit {
        min: LimitBound::Ignored,
        max: LimitBound::Ignored,
    };

    /// Numeric limit; bounds must be finite, non-negative and ordered
    pub fn new(min: f64, max: f64) -> Result<Self, LimitError> {
        let limit = Self {
            min: LimitBound::validated(min)?,
            max: LimitBound::validated(max)?,
        };
        if min > max {
            return Err(LimitError::MinGreaterThanMax { min, max });
        }
        Ok(limit)
    }

    /// Limit from arbitrary bounds
    pub fn from_bounds(min: LimitBound, max: LimitBound) -> Result<Self, LimitError> {
        if let LimitBound::Value(v) = min {
            LimitBound::validated(v)?;
        }
        if let LimitBound::Value(v) = max {
            LimitBound::validated(v)?;
        }
        if let (LimitBound::Value(lo), LimitBound::Value(hi)) = (min, max) {
            if lo > hi {
                return Err(LimitError::MinGreaterThanMax { min: lo, max: hi });
            }
        }
        Ok(Self { min, max })
    }

    /// Lower bound
    pub fn min(&self) -> LimitBound {
        self.min
    }

    /// Upper bound
    pub fn max(&self) -> LimitBound {
        self.max
    }

    /// Both bounds unset
    pub fn is_empty(&self) -> bool {
        self.min.is_empty() && self.max.is_empty()
    }

    /// Both bounds switched off
    pub fn is_ignored(&self) -> bool {
        self.min.is_ignored() && self.max.is_ignored()
    }

    /// Widen the lower bound to `new_min`. Returns whether the bound changed.
    pub fn union_with_min(&mut self, new_min: f64) -> bool {
        if self.min.is_ignored() || new_min <= 0.0 || !new_min.is_finite() {
            return false;
        }
        match self.min {
            LimitBound::Value(current) if new_min >= current => false,
            _ => {
                self.min = LimitBound::Value(new_min);
                true
            }
        }
    }

    /// Widen the upper bound to `new_max`. Returns whether the bound changed.
    pub fn union_with_max(&mut self, new_max: f64) -> bool {
        if self.max.is_ignored() || new_max <= 0.0 || !new_max.is_finite() {
            return false;
        }
        match self.max {
            LimitBound::Value(current) if new_max <= current => false,
            _ => {
                self.max = LimitBound::Value(new_max);
                true
            }
        }
    }

    /// Widen both bounds to cover `range` (inverted ranges are reordered first)
    pub fn union_with(&mut self, range: MetricRange) -> bool {
        let range = range.normalized();
        let min_changed = self.union_with_min(range.min);
        let max_changed = self.union_with_max(range.max);
        min_changed || max_changed
    }

    /// Widen both bounds to cover another limit's numeric bounds
    pub fn union_with_limit(&mut self, other: &CompetitionLimit) -> bool {
        let min_changed = other.min.value().is_some_and(|v| self.union_with_min(v));
        let max_changed = other.max.value().is_some_and(|v| self.union_with_max(v));
        min_changed || max_changed
    }

    /// Relax numeric bounds outward by `percent`
    pub fn loosen(&mut self, percent: f64) {
        let factor = percent / 100.0;
        if let LimitBound::Value(v) = self.min {
            self.min = LimitBound::Value((v * (1.0 - factor)).max(0.0));
        }
        if let LimitBound::Value(v) = self.max {
            self.max = LimitBound::Value(v * (1.0 + factor));
        }
    }

    /// Whether `value` satisfies both numeric bounds
    pub fn contains(&self, value: f64) -> bool {
        let above_min = self.min.value().is_none_or(|min| value >= min);
        let below_max = self.max.value().is_none_or(|max| value <= max);
        above_min && below_max
    }

    /// Check an observed range against this limit
    pub fn check(&self, actual: MetricRange) -> LimitCheckOutcome {
        if self.min.value().is_none() && self.max.value().is_none() {
            return LimitCheckOutcome::NoLimit;
        }
        let actual = actual.normalized();
        let too_fast = self.min.value().is_some_and(|min| actual.min < min);
        let too_slow = self.max.value().is_some_and(|max| actual.max > max);
        match (too_fast, too_slow) {
            (false, false) => LimitCheckOutcome::Within,
            (true, false) => LimitCheckOutcome::FasterThanLimit,
            (false, true) => LimitCheckOutcome::SlowerThanLimit,
            (true, true) => LimitCheckOutcome::OutOfBothBounds,
        }
    }
}

impl std::fmt::Display for CompetitionLimit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}..{}]", self.min, self.max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    #[test]
    fn test_new_validates() {
        assert!(CompetitionLimit::new(0.5, 2.0).is_ok());
        assert_eq!(
            CompetitionLimit::new(2.0, 0.5),
            Err(LimitError::MinGreaterThanMax { min: 2.0, max: 0.5 })
        );
        assert!(matches!(
            CompetitionLimit::new(-1.0, 2.0),
            Err(LimitError::InvalidBound(_))
        ));
        assert!(matches!(
            CompetitionLimit::new(1.0, f64::INFINITY),
            Err(LimitError::InvalidBound(_))
        ));
    }

    #[test]
    fn test_empty_is_filled_by_union() {
        let mut limit = CompetitionLimit::EMPTY;
        assert!(limit.union_with(MetricRange::new(0.9, 1.1)));
        assert_eq!(limit.min(), LimitBound::Value(0.9));
        assert_eq!(limit.max(), LimitBound::Value(1.1));
    }

    #[test]
    fn test_union_only_widens() {
        let mut limit = CompetitionLimit::new(1.0, 2.0).unwrap();
        assert!(!limit.union_with(MetricRange::new(1.2, 1.8)));
        assert_eq!(limit, CompetitionLimit::new(1.0, 2.0).unwrap());

        assert!(limit.union_with(MetricRange::new(0.8, 1.5)));
        assert_eq!(limit.min(), LimitBound::Value(0.8));
        assert_eq!(limit.max(), LimitBound::Value(2.0));
    }

    #[test]
    fn test_union_swaps_inverted_range() {
        let mut limit = CompetitionLimit::EMPTY;
        assert!(limit.union_with(MetricRange::new(3.0, 1.0)));
        assert_eq!(limit.min(), LimitBound::Value(1.0));
        assert_eq!(limit.max(), LimitBound::Value(3.0));
    }

    #[test]
    fn test_union_rejects_non_positive_and_infinite() {
        let mut limit = CompetitionLimit::EMPTY;
        assert!(!limit.union_with_min(0.0));
        assert!(!limit.union_with_min(-1.0));
        assert!(!limit.union_with_min(f64::INFINITY));
        assert!(!limit.union_with_max(f64::NAN));
        assert!(limit.is_empty());
    }

    #[test]
    fn test_ignored_is_fixed_point() {
        let mut limit = CompetitionLimit::IGNORED;
        assert!(!limit.union_with(MetricRange::new(0.1, 100.0)));
        assert!(limit.is_ignored());

        let mut half = CompetitionLimit::from_bounds(LimitBound::Ignored, LimitBound::Value(2.0))
            .unwrap();
        assert!(half.union_with(MetricRange::new(0.5, 3.0)));
        assert_eq!(half.min(), LimitBound::Ignored);
        assert_eq!(half.max(), LimitBound::Value(3.0));
    }

    #[test]
    fn test_widen_only_random_sequences() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..50 {
            let mut limit = CompetitionLimit::EMPTY;
            let mut last_min = f64::INFINITY;
            let mut last_max = 0.0;
            for _ in 0..200 {
                let a: f64 = rng.gen_range(-1.0..10.0);
                let b: f64 = rng.gen_range(-1.0..10.0);
                limit.union_with(MetricRange::new(a, b));
                if let Some(min) = limit.min().value() {
                    assert!(min <= last_min);
                    last_min = min;
                }
                if let Some(max) = limit.max().value() {
                    assert!(max >= last_max);
                    last_max = max;
                }
            }
        }
    }

    #[test]
    fn test_union_with_limit() {
        let mut limit = CompetitionLimit::new(1.0, 2.0).unwrap();
        let other = CompetitionLimit::from_bounds(LimitBound::Value(0.5), LimitBound::Empty)
            .unwrap();
        assert!(limit.union_with_limit(&other));
        assert_eq!(limit.min(), LimitBound::Value(0.5));
        assert!(!limit.union_with_limit(&CompetitionLimit::IGNORED));
    }

    #[test]
    fn test_loosen() {
        let mut limit = CompetitionLimit::new(1.0, 2.0).unwrap();
        limit.loosen(3.0);
        assert!((limit.min().value().unwrap() - 0.97).abs() < 1e-12);
        assert!((limit.max().value().unwrap() - 2.06).abs() < 1e-12);

        let mut ignored = CompetitionLimit::IGNORED;
        ignored.loosen(3.0);
        assert!(ignored.is_ignored());
    }

    #[test]
    fn test_check() {
        let limit = CompetitionLimit::new(1.0, 2.0).unwrap();
        assert_eq!(limit.check(MetricRange::point(1.5)), LimitCheckOutcome::Within);
        assert_eq!(
            limit.check(MetricRange::point(0.5)),
            LimitCheckOutcome::FasterThanLimit
        );
        assert_eq!(
            limit.check(MetricRange::point(2.5)),
            LimitCheckOutcome::SlowerThanLimit
        );
        assert_eq!(
            limit.check(MetricRange::new(0.5, 2.5)),
            LimitCheckOutcome::OutOfBothBounds
        );
        assert_eq!(
            CompetitionLimit::EMPTY.check(MetricRange::point(1.0)),
            LimitCheckOutcome::NoLimit
        );
        assert!(limit.contains(1.0) && limit.contains(2.0) && !limit.contains(2.01));
    }

    #[test]
    fn test_display() {
        assert_eq!(CompetitionLimit::new(0.5, 1.25).unwrap().to_string(), "[0.50..1.25]");
        assert_eq!(CompetitionLimit::EMPTY.to_string(), "[?..?]");
        assert_eq!(CompetitionLimit::IGNORED.to_string(), "[*..*]");
    }
}
