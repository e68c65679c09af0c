//! Derived metrics over loaded series.
//!
//! All operations are pure: they never modify their input.

use crate::error::{PlotError, Result, Stage};
use crate::series::Series;
use tracing::debug;

/// Bytes of one value slot on the benchmark target (`int` on 32-bit RISC-V).
/// Subtracted from per-element memory to isolate container bookkeeping.
pub const DEFAULT_POINTER_WIDTH: f64 = 4.0;

/// Convert cumulative measurements into per-element cost: `y'[i] = y[i] / x[i]`.
///
/// Sizes are left unchanged. Fails without producing a series if any size is
/// zero.
pub fn normalize_per_unit(series: &Series) -> Result<Series> {
    if let Some(index) = series.x().iter().position(|&x| x == 0.0) {
        return Err(PlotError::DivisionByZero {
            dataset: series.id().to_string(),
            index,
            stage: Stage::Normalize,
        });
    }

    let y = series
        .points()
        .map(|(x, y)| y / x)
        .collect::<Vec<f64>>();

    debug!(dataset = series.id(), samples = y.len(), "normalized per unit");
    series.with_y(y)
}

/// Per-element structural overhead in bytes: `y[last] / x[last] - pointer_width`.
///
/// Only the final sample is consulted, so this reports the asymptotic
/// overhead at the largest measured size rather than an average over the
/// run. Earlier samples have no influence on the result.
pub fn extract_overhead(series: &Series, pointer_width: f64) -> Result<f64> {
    let (x, y) = series.last();
    if x == 0.0 {
        return Err(PlotError::DivisionByZero {
            dataset: series.id().to_string(),
            index: series.len() - 1,
            stage: Stage::Overhead,
        });
    }

    let overhead = y / x - pointer_width;
    debug!(dataset = series.id(), size = x, overhead, "extracted overhead");
    Ok(overhead)
}

/// Overhead of an empty container. There is no size-dependent curve to
/// divide, so the measured constant is the overhead.
pub fn extract_fixed_overhead(bytes: f64) -> f64 {
    bytes
}

/// Invert a per-operation latency in nanoseconds into operations per second.
pub fn ops_per_second(variant: &str, latency_ns: f64) -> Result<f64> {
    if latency_ns == 0.0 {
        return Err(PlotError::DivisionByZero {
            dataset: variant.to_string(),
            index: 0,
            stage: Stage::Throughput,
        });
    }
    Ok(1.0 / (latency_ns * 1e-9))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::collection::vec as prop_vec;
    use proptest::prelude::*;

    /// Strictly increasing positive sizes paired with non-negative measurements
    fn arb_series() -> impl Strategy<Value = Series> {
        prop_vec((1u32..1000, 0.0f64..1e6), 1..40).prop_map(|samples| {
            let mut size = 0.0;
            let (x, y): (Vec<f64>, Vec<f64>) = samples
                .into_iter()
                .map(|(step, y)| {
                    size += step as f64;
                    (size, y)
                })
                .unzip();
            Series::new("arb", x, y).unwrap()
        })
    }

    #[test]
    fn test_normalize_divides_each_sample() {
        let s = Series::new("ins", vec![100.0, 500.0, 1000.0], vec![200.0, 1500.0, 5000.0]).unwrap();
        let n = normalize_per_unit(&s).unwrap();
        assert_eq!(n.x(), s.x());
        assert_eq!(n.y(), &[2.0, 3.0, 5.0]);
        assert_eq!(n.id(), "ins");
        // input untouched
        assert_eq!(s.y(), &[200.0, 1500.0, 5000.0]);
    }

    #[test]
    fn test_normalize_rejects_zero_size() {
        let s = Series::new("zero", vec![0.0, 10.0], vec![1.0, 2.0]).unwrap();
        match normalize_per_unit(&s) {
            Err(PlotError::DivisionByZero { dataset, index, stage }) => {
                assert_eq!(dataset, "zero");
                assert_eq!(index, 0);
                assert_eq!(stage, Stage::Normalize);
            }
            other => panic!("expected division by zero, got {other:?}"),
        }
    }

    #[test]
    fn test_overhead_reference_value() {
        let s = Series::new("mem", vec![100.0, 10000.0], vec![900.0, 50000.0]).unwrap();
        assert_eq!(extract_overhead(&s, 4.0).unwrap(), 1.0);
    }

    #[test]
    fn test_overhead_zero_size() {
        let s = Series::new("mem", vec![0.0], vec![16.0]).unwrap();
        assert!(matches!(
            extract_overhead(&s, DEFAULT_POINTER_WIDTH),
            Err(PlotError::DivisionByZero { stage: Stage::Overhead, .. })
        ));
    }

    #[test]
    fn test_fixed_overhead_is_constant() {
        assert_eq!(extract_fixed_overhead(596.0), 596.0);
    }

    #[test]
    fn test_ops_per_second() {
        let hz = ops_per_second("append", 417.0).unwrap();
        assert!((hz - 2_398_081.534_772_182).abs() < 1e-3);
        assert!(ops_per_second("append", 0.0).is_err());
    }

    proptest! {
        #[test]
        fn prop_normalize_elementwise(s in arb_series()) {
            let n = normalize_per_unit(&s).unwrap();
            prop_assert_eq!(n.x(), s.x());
            for i in 0..s.len() {
                prop_assert_eq!(n.y()[i], s.y()[i] / s.x()[i]);
            }
        }

        #[test]
        fn prop_overhead_ignores_earlier_samples(
            s in arb_series(),
            noise in prop_vec(0.0f64..1e6, 40),
            width in 0.0f64..16.0,
        ) {
            let mut y = s.y().to_vec();
            let last = y.len() - 1;
            for (i, v) in y.iter_mut().enumerate().take(last) {
                *v = noise[i];
            }
            let other = Series::new("other", s.x().to_vec(), y).unwrap();
            prop_assert_eq!(
                extract_overhead(&s, width).unwrap(),
                extract_overhead(&other, width).unwrap()
            );
        }
    }
}
