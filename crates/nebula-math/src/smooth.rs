// ─────────────────────────────────────────────────────────────────────
// Nebulous — Smoothing
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Isotropic Gaussian smoothing of sky maps.
//!
//! Separable convolution with zero padding outside the image, so flux
//! near the edge leaks out of the map rather than being reflected back.

use nebula_types::constants::GAUSSIAN_TRUNCATE;
use nebula_types::error::{NebulaError, NebulaResult};
use nebula_types::state::SkyMap;
use ndarray::{Array1, Array2, Axis};

/// How sky maps are treated after projection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Smoothing {
    None,
    /// Standard deviation in cells.
    Gaussian { sigma: f64 },
}

impl Smoothing {
    /// `Some(kernel)` → Gaussian, `None` → no smoothing.
    pub fn from_kernel(kernel: Option<f64>) -> Self {
        match kernel {
            Some(sigma) => Smoothing::Gaussian { sigma },
            None => Smoothing::None,
        }
    }

    pub fn apply(&self, image: &SkyMap) -> NebulaResult<SkyMap> {
        match *self {
            Smoothing::None => Ok(image.clone()),
            Smoothing::Gaussian { sigma } => gaussian_filter(image, sigma),
        }
    }
}

impl Default for Smoothing {
    fn default() -> Self {
        Smoothing::Gaussian {
            sigma: nebula_types::constants::DEFAULT_KERNEL,
        }
    }
}

/// Normalised 1D Gaussian weights, truncated at `GAUSSIAN_TRUNCATE` σ.
pub fn gaussian_kernel_1d(sigma: f64) -> NebulaResult<Array1<f64>> {
    if !sigma.is_finite() || sigma <= 0.0 {
        return Err(NebulaError::InvalidParameter(format!(
            "Gaussian kernel sigma must be finite and > 0, got {sigma}"
        )));
    }
    let radius = (GAUSSIAN_TRUNCATE * sigma + 0.5) as isize;
    let mut kernel = Array1::from_shape_fn((2 * radius + 1) as usize, |i| {
        let x = i as f64 - radius as f64;
        (-0.5 * x * x / (sigma * sigma)).exp()
    });
    let total = kernel.sum();
    kernel /= total;
    Ok(kernel)
}

/// Convolve every lane along `axis` with `kernel`, zero outside the image.
fn convolve_axis(image: &Array2<f64>, kernel: &Array1<f64>, axis: Axis) -> Array2<f64> {
    let radius = (kernel.len() / 2) as isize;
    let mut out = Array2::zeros(image.dim());
    for (src, mut dst) in image.lanes(axis).into_iter().zip(out.lanes_mut(axis)) {
        let n = src.len() as isize;
        for i in 0..n {
            let mut acc = 0.0;
            for (k, w) in kernel.iter().enumerate() {
                let j = i + k as isize - radius;
                if j >= 0 && j < n {
                    acc += w * src[j as usize];
                }
            }
            dst[i as usize] = acc;
        }
    }
    out
}

/// Isotropic 2D Gaussian filter with standard deviation `sigma` cells.
pub fn gaussian_filter(image: &SkyMap, sigma: f64) -> NebulaResult<SkyMap> {
    let kernel = gaussian_kernel_1d(sigma)?;
    let rows = convolve_axis(image, &kernel, Axis(0));
    Ok(convolve_axis(&rows, &kernel, Axis(1)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kernel_normalised_and_symmetric() {
        let k = gaussian_kernel_1d(1.0).unwrap();
        assert_eq!(k.len(), 9);
        assert!((k.sum() - 1.0).abs() < 1e-12);
        for i in 0..k.len() {
            assert!((k[i] - k[k.len() - 1 - i]).abs() < 1e-15);
        }
        assert!(k[4] > k[3]);
    }

    #[test]
    fn test_kernel_rejects_bad_sigma() {
        assert!(gaussian_kernel_1d(0.0).is_err());
        assert!(gaussian_kernel_1d(-1.0).is_err());
        assert!(gaussian_kernel_1d(f64::NAN).is_err());
    }

    #[test]
    fn test_interior_flux_conserved() {
        let mut image = SkyMap::zeros((21, 21));
        image[[10, 10]] = 5.0;
        let smoothed = gaussian_filter(&image, 1.5).unwrap();
        assert!((smoothed.sum() - 5.0).abs() < 1e-10);
        assert!(smoothed[[10, 10]] < 5.0);
        assert!((smoothed[[9, 10]] - smoothed[[11, 10]]).abs() < 1e-14);
        assert!((smoothed[[10, 9]] - smoothed[[9, 10]]).abs() < 1e-14);
    }

    #[test]
    fn test_edge_flux_leaks_out() {
        let mut image = SkyMap::zeros((5, 5));
        image[[0, 0]] = 1.0;
        let smoothed = gaussian_filter(&image, 1.0).unwrap();
        assert!(smoothed.sum() < 1.0);
        assert!(smoothed.iter().all(|v| *v >= 0.0));
    }

    #[test]
    fn test_constant_interior_unchanged() {
        let image = SkyMap::from_elem((30, 30), 2.0);
        let smoothed = gaussian_filter(&image, 1.0).unwrap();
        assert!((smoothed[[15, 15]] - 2.0).abs() < 1e-12);
        assert!(smoothed[[0, 0]] < 2.0);
    }

    #[test]
    fn test_no_smoothing_is_identity() {
        let image = SkyMap::from_shape_fn((4, 6), |(i, j)| (i * 6 + j) as f64);
        assert_eq!(Smoothing::None.apply(&image).unwrap(), image);
        assert_eq!(Smoothing::from_kernel(None), Smoothing::None);
        assert_eq!(
            Smoothing::from_kernel(Some(2.0)),
            Smoothing::Gaussian { sigma: 2.0 }
        );
    }
}
