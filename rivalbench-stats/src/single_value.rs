//! Single-Value Calculator
//!
//! Exact model for metrics that produce one value per run (e.g. a total
//! allocation count). Limits equal the observed value; there is no variance.

use crate::calculator::CalculatorError;
use crate::range::MetricRange;

/// Calculator over arrays holding exactly one value
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SingleValueCalculator;

impl SingleValueCalculator {
    /// Create the calculator
    pub fn new() -> Self {
        Self
    }

    /// The value of a single-element array, `None` for an empty one
    fn single(values: &[f64]) -> Result<Option<f64>, CalculatorError> {
        match values {
            [] => Ok(None),
            [value] => Ok(Some(*value)),
            _ => Err(CalculatorError::NotSingleValue { len: values.len() }),
        }
    }

    /// The value itself
    pub fn mean(&self, values: &[f64]) -> Result<Option<f64>, CalculatorError> {
        Self::single(values)
    }

    /// Always `None`: a single value has no variance
    pub fn variance(&self, values: &[f64]) -> Result<Option<f64>, CalculatorError> {
        Self::single(values)?;
        Ok(None)
    }

    /// `value / baseline`, `None` when the baseline is zero
    pub fn relative_mean(
        &self,
        values: &[f64],
        baseline: &[f64],
    ) -> Result<Option<f64>, CalculatorError> {
        let (Some(value), Some(base)) = (Self::single(values)?, Self::single(baseline)?) else {
            return Ok(None);
        };
        if base == 0.0 {
            return Ok(None);
        }
        Ok(Some(value / base))
    }

    /// Always `None`
    pub fn relative_variance(
        &self,
        values: &[f64],
        baseline: &[f64],
    ) -> Result<Option<f64>, CalculatorError> {
        Self::single(values)?;
        Self::single(baseline)?;
        Ok(None)
    }

    /// `[value, value]`
    pub fn actual_range(&self, values: &[f64]) -> Result<Option<MetricRange>, CalculatorError> {
        Ok(Self::single(values)?.map(MetricRange::point))
    }

    /// Same as the actual range: no accuracy envelope
    pub fn limit_range(&self, values: &[f64]) -> Result<Option<MetricRange>, CalculatorError> {
        self.actual_range(values)
    }

    /// `[ratio, ratio]`
    pub fn relative_actual_range(
        &self,
        values: &[f64],
        baseline: &[f64],
    ) -> Result<Option<MetricRange>, CalculatorError> {
        Ok(self.relative_mean(values, baseline)?.map(MetricRange::point))
    }

    /// Same as the relative actual range
    pub fn relative_limit_range(
        &self,
        values: &[f64],
        baseline: &[f64],
    ) -> Result<Option<MetricRange>, CalculatorError> {
        self.relative_actual_range(values, baseline)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_value_mean() {
        let calc = SingleValueCalculator::new();
        assert_eq!(calc.mean(&[42.0]).unwrap(), Some(42.0));
        assert_eq!(calc.variance(&[42.0]).unwrap(), None);
    }

    #[test]
    fn test_empty_is_not_an_error() {
        let calc = SingleValueCalculator::new();
        assert_eq!(calc.mean(&[]).unwrap(), None);
        assert_eq!(calc.actual_range(&[]).unwrap(), None);
        assert_eq!(calc.relative_mean(&[], &[1.0]).unwrap(), None);
        assert_eq!(calc.relative_mean(&[1.0], &[]).unwrap(), None);
    }

    #[test]
    fn test_multiple_values_rejected() {
        let calc = SingleValueCalculator::new();
        assert!(matches!(
            calc.mean(&[1.0, 2.0]),
            Err(CalculatorError::NotSingleValue { len: 2 })
        ));
        assert!(matches!(
            calc.variance(&[1.0, 2.0, 3.0]),
            Err(CalculatorError::NotSingleValue { len: 3 })
        ));
        assert!(matches!(
            calc.relative_mean(&[1.0], &[1.0, 2.0]),
            Err(CalculatorError::NotSingleValue { len: 2 })
        ));
    }

    #[test]
    fn test_relative_mean() {
        let calc = SingleValueCalculator::new();
        assert_eq!(calc.relative_mean(&[30.0], &[10.0]).unwrap(), Some(3.0));
        assert_eq!(calc.relative_mean(&[30.0], &[0.0]).unwrap(), None);
    }

    #[test]
    fn test_limit_range_equals_actual_range() {
        let calc = SingleValueCalculator::new();
        let actual = calc.actual_range(&[5.0]).unwrap();
        let limit = calc.limit_range(&[5.0]).unwrap();
        assert_eq!(actual, limit);
        assert_eq!(limit, Some(MetricRange::point(5.0)));

        let relative = calc.relative_limit_range(&[6.0], &[3.0]).unwrap();
        assert_eq!(relative, Some(MetricRange::point(2.0)));
    }
}
