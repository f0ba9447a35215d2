// ─────────────────────────────────────────────────────────────────────
// Nebulous — Constants
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
/// Assumed electron temperature [K] when a density inversion is given none.
pub const DEFAULT_TEMPERATURE_K: f64 = 10.0e3;

/// Assumed electron density [cm⁻³] when a temperature inversion is given none.
pub const DEFAULT_DENSITY_CM3: f64 = 1.0e3;

/// Default Gaussian smoothing width of sky maps, in cells.
pub const DEFAULT_KERNEL: f64 = 1.0;

/// Gaussian kernels are truncated at this many standard deviations.
pub const GAUSSIAN_TRUNCATE: f64 = 4.0;

/// Line intensities are quoted relative to Hβ = 100.
pub const HBETA_SCALE: f64 = 100.0;

/// hc/k in Å·K, converts a wavelength to an excitation temperature.
pub const HC_OVER_K_ANGSTROM: f64 = 1.438_776_9e8;

/// Balmer-jump calibration grid: lower temperature bound [K].
pub const BALMER_TEMPERATURE_MIN: f64 = 500.0;

/// Balmer-jump calibration grid: upper temperature bound [K].
pub const BALMER_TEMPERATURE_MAX: f64 = 30.0e3;

/// Balmer-jump calibration grid: number of temperature samples.
pub const BALMER_GRID_POINTS: usize = 1000;

/// Balmer-jump emissivity proxy temperature exponent, n_e² T^(-3/2).
pub const BALMER_TEMPERATURE_EXPONENT: f64 = -1.5;

/// Lines of sight shallower than this many cells are excluded from statistics.
pub const DEFAULT_MIN_DEPTH: usize = 5;
