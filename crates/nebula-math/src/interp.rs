//! Piecewise-linear interpolation with linear extrapolation.
//!
//! Used to turn a forward-modelled calibration curve (temperature → ratio)
//! into its inverse (ratio → temperature).

use nebula_types::error::{NebulaError, NebulaResult};

/// Linear interpolant over samples sorted by abscissa.
#[derive(Debug, Clone)]
pub struct LinearInterpolant {
    x: Vec<f64>,
    y: Vec<f64>,
}

impl LinearInterpolant {
    /// Build from unsorted samples. Needs at least two points, finite values
    /// and distinct abscissae.
    pub fn new(x: &[f64], y: &[f64]) -> NebulaResult<Self> {
        if x.len() != y.len() {
            return Err(NebulaError::ShapeMismatch {
                expected: vec![x.len()],
                actual: vec![y.len()],
            });
        }
        if x.len() < 2 {
            return Err(NebulaError::InvalidParameter(
                "interpolation requires at least two samples".to_string(),
            ));
        }
        if !x.iter().chain(y.iter()).all(|v| v.is_finite()) {
            return Err(NebulaError::InvalidParameter(
                "interpolation samples must be finite".to_string(),
            ));
        }

        let mut pairs: Vec<(f64, f64)> = x.iter().copied().zip(y.iter().copied()).collect();
        pairs.sort_by(|a, b| a.0.total_cmp(&b.0));
        if pairs.windows(2).any(|w| w[1].0 <= w[0].0) {
            return Err(NebulaError::InvalidParameter(
                "interpolation abscissae must be distinct".to_string(),
            ));
        }

        let (x, y) = pairs.into_iter().unzip();
        Ok(LinearInterpolant { x, y })
    }

    /// Abscissa range covered by the samples.
    pub fn domain(&self) -> (f64, f64) {
        (self.x[0], self.x[self.x.len() - 1])
    }

    pub fn contains(&self, x: f64) -> bool {
        let (lo, hi) = self.domain();
        x >= lo && x <= hi
    }

    /// Evaluate; outside the domain the end segment is extended.
    pub fn eval(&self, x: f64) -> f64 {
        if x.is_nan() {
            return f64::NAN;
        }
        let n = self.x.len();
        // index of the segment [i, i+1] to use
        let i = match self.x.partition_point(|&xi| xi <= x) {
            0 => 0,
            p if p >= n => n - 2,
            p => p - 1,
        };
        let (x0, x1) = (self.x[i], self.x[i + 1]);
        let (y0, y1) = (self.y[i], self.y[i + 1]);
        y0 + (y1 - y0) * (x - x0) / (x1 - x0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_at_samples() {
        let f = LinearInterpolant::new(&[0.0, 1.0, 3.0], &[2.0, 4.0, 0.0]).unwrap();
        assert!((f.eval(0.0) - 2.0).abs() < 1e-12);
        assert!((f.eval(1.0) - 4.0).abs() < 1e-12);
        assert!((f.eval(3.0) - 0.0).abs() < 1e-12);
    }

    #[test]
    fn test_midpoint() {
        let f = LinearInterpolant::new(&[0.0, 1.0, 3.0], &[2.0, 4.0, 0.0]).unwrap();
        assert!((f.eval(0.5) - 3.0).abs() < 1e-12);
        assert!((f.eval(2.0) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_unsorted_input_sorted() {
        let f = LinearInterpolant::new(&[3.0, 0.0, 1.0], &[0.0, 2.0, 4.0]).unwrap();
        assert_eq!(f.domain(), (0.0, 3.0));
        assert!((f.eval(0.5) - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_linear_extrapolation() {
        let f = LinearInterpolant::new(&[1.0, 2.0, 4.0], &[10.0, 20.0, 30.0]).unwrap();
        assert!(!f.contains(0.0));
        assert!((f.eval(0.0) - 0.0).abs() < 1e-12);
        assert!((f.eval(6.0) - 40.0).abs() < 1e-12);
    }

    #[test]
    fn test_rejects_bad_samples() {
        assert!(LinearInterpolant::new(&[1.0], &[1.0]).is_err());
        assert!(LinearInterpolant::new(&[1.0, 2.0], &[1.0]).is_err());
        assert!(LinearInterpolant::new(&[1.0, 1.0], &[1.0, 2.0]).is_err());
        assert!(LinearInterpolant::new(&[1.0, f64::NAN], &[1.0, 2.0]).is_err());
    }

    #[test]
    fn test_nan_propagates() {
        let f = LinearInterpolant::new(&[0.0, 1.0], &[0.0, 1.0]).unwrap();
        assert!(f.eval(f64::NAN).is_nan());
    }
}
