//! Synthetic observations of a nebula and their inversion.
//!
//! Forward: per-cell emissivity, line-of-sight projection, smoothing.
//! Inverse: line-ratio temperature/density, ionic abundance, Balmer-jump
//! temperature, emission-measure density.

pub mod abundance;
pub mod atomic;
pub mod balmer;
pub mod emission_measure;
pub mod emissivity;
pub mod ion;
pub mod line_ratio;
