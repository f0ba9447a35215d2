//! NaN-ignoring summary statistics over a line-of-sight selection.

use nebula_types::error::{ensure_shape, NebulaResult};
use nebula_types::state::{SkyMap, SkyMask};

/// Mean of the non-NaN values; NaN when there are none.
pub fn nan_mean(values: &[f64]) -> f64 {
    let (sum, n) = values
        .iter()
        .filter(|v| !v.is_nan())
        .fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    if n == 0 {
        f64::NAN
    } else {
        sum / n as f64
    }
}

/// Standard deviation of the non-NaN values with `ddof` delta degrees of
/// freedom; NaN when fewer than `ddof + 1` values remain.
pub fn nan_std(values: &[f64], ddof: usize) -> f64 {
    let kept: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    if kept.len() <= ddof {
        return f64::NAN;
    }
    let mean = kept.iter().sum::<f64>() / kept.len() as f64;
    let ss = kept.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>();
    (ss / (kept.len() - ddof) as f64).sqrt()
}

/// Values of `map` where `mask` is set, in row-major order.
pub fn masked_values(map: &SkyMap, mask: &SkyMask) -> NebulaResult<Vec<f64>> {
    ensure_shape(map.shape(), mask.shape())?;
    Ok(map
        .iter()
        .zip(mask.iter())
        .filter(|(_, m)| **m)
        .map(|(v, _)| *v)
        .collect())
}

/// (mean, sample std) of `map` over `mask`.
pub fn summary(map: &SkyMap, mask: &SkyMask) -> NebulaResult<(f64, f64)> {
    let values = masked_values(map, mask)?;
    Ok((nan_mean(&values), nan_std(&values, 1)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nan_mean_ignores_nan() {
        assert!((nan_mean(&[1.0, f64::NAN, 3.0]) - 2.0).abs() < 1e-12);
        assert!(nan_mean(&[]).is_nan());
        assert!(nan_mean(&[f64::NAN]).is_nan());
    }

    #[test]
    fn test_infinity_is_not_filtered() {
        // matches np.nanmean: only NaN is dropped
        assert_eq!(nan_mean(&[1.0, f64::INFINITY, f64::NAN]), f64::INFINITY);
        assert!(nan_std(&[1.0, f64::INFINITY, 2.0], 1).is_nan());
    }

    #[test]
    fn test_nan_std_sample() {
        // sample std of 2, 4, 4, 4, 5, 5, 7, 9 with ddof=1
        let v = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0, f64::NAN];
        let expected = (32.0_f64 / 7.0).sqrt();
        assert!((nan_std(&v, 1) - expected).abs() < 1e-12);
        assert!((nan_std(&v, 0) - 2.0).abs() < 1e-12);
        assert!(nan_std(&[1.0], 1).is_nan());
    }

    #[test]
    fn test_summary_over_mask() {
        let map = SkyMap::from_shape_vec((2, 2), vec![1.0, 100.0, 3.0, f64::NAN]).unwrap();
        let mask = SkyMask::from_shape_vec((2, 2), vec![true, false, true, true]).unwrap();
        let (mean, std) = summary(&map, &mask).unwrap();
        assert!((mean - 2.0).abs() < 1e-12);
        assert!((std - 2.0_f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_mask_shape_checked() {
        let map = SkyMap::zeros((2, 3));
        let mask = SkyMask::from_elem((3, 2), true);
        assert!(masked_values(&map, &mask).is_err());
    }
}
