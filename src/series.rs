use crate::error::{PlotError, Result};

/// One benchmark run: problem sizes paired index-for-index with measurements.
///
/// A `Series` is validated on construction and never mutated afterwards;
/// transformations produce a new series.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    id: String,
    x: Vec<f64>,
    y: Vec<f64>,
}

impl Series {
    /// Build a series, checking that `x` and `y` are non-empty, of equal
    /// length, finite, that `x` is strictly increasing and `y` non-negative.
    pub fn new(id: impl Into<String>, x: Vec<f64>, y: Vec<f64>) -> Result<Self> {
        let id = id.into();

        if x.is_empty() || y.is_empty() {
            return Err(PlotError::malformed(&id, "series is empty"));
        }
        if x.len() != y.len() {
            return Err(PlotError::malformed(
                &id,
                format!("x has {} samples but y has {}", x.len(), y.len()),
            ));
        }
        if let Some(i) = x.iter().position(|v| !v.is_finite()) {
            return Err(PlotError::malformed(&id, format!("x[{i}] is not finite")));
        }
        if let Some(i) = y.iter().position(|v| !v.is_finite() || *v < 0.0) {
            return Err(PlotError::malformed(
                &id,
                format!("y[{i}] = {} is not a finite non-negative measurement", y[i]),
            ));
        }
        if let Some(i) = x.windows(2).position(|w| w[1] <= w[0]) {
            return Err(PlotError::malformed(
                &id,
                format!("x is not strictly increasing at sample {}", i + 1),
            ));
        }

        Ok(Self { id, x, y })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn x(&self) -> &[f64] {
        &self.x
    }

    pub fn y(&self) -> &[f64] {
        &self.y
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    /// Always false for a constructed series; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    /// The final (largest-size) sample.
    pub fn last(&self) -> (f64, f64) {
        let j = self.x.len() - 1;
        (self.x[j], self.y[j])
    }

    /// Samples as `(x, y)` points, in order.
    pub fn points(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.x.iter().copied().zip(self.y.iter().copied())
    }

    /// A new series with the same identifier and sizes but different
    /// measurements. Re-validates the result.
    pub(crate) fn with_y(&self, y: Vec<f64>) -> Result<Self> {
        Series::new(self.id.clone(), self.x.clone(), y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_series() {
        let s = Series::new("run", vec![1.0, 2.0, 4.0], vec![10.0, 20.0, 40.0]).unwrap();
        assert_eq!(s.id(), "run");
        assert_eq!(s.len(), 3);
        assert_eq!(s.last(), (4.0, 40.0));
        assert_eq!(
            s.points().collect::<Vec<_>>(),
            vec![(1.0, 10.0), (2.0, 20.0), (4.0, 40.0)]
        );
    }

    #[test]
    fn test_empty_series_rejected() {
        let err = Series::new("empty", vec![], vec![]).unwrap_err();
        assert!(matches!(err, PlotError::MalformedSeries { .. }));
    }

    #[test]
    fn test_length_mismatch_rejected() {
        let err = Series::new("short", vec![1.0, 2.0], vec![1.0]).unwrap_err();
        match err {
            PlotError::MalformedSeries { dataset, reason } => {
                assert_eq!(dataset, "short");
                assert!(reason.contains("2 samples"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_non_increasing_x_rejected() {
        assert!(Series::new("flat", vec![1.0, 1.0], vec![1.0, 2.0]).is_err());
        assert!(Series::new("down", vec![2.0, 1.0], vec![1.0, 2.0]).is_err());
    }

    #[test]
    fn test_negative_or_nan_measurement_rejected() {
        assert!(Series::new("neg", vec![1.0], vec![-1.0]).is_err());
        assert!(Series::new("nan", vec![1.0], vec![f64::NAN]).is_err());
        assert!(Series::new("inf", vec![f64::INFINITY], vec![1.0]).is_err());
    }
}
