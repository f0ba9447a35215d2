//! Nebula geometry and field sampling.
//!
//! Geometry: spherical shells as cell-sets, random partitions
//! Fields: exponential, lognormal, power-lognormal, MLP, beta, normal,
//! radial gradients and polytropic fields derived from another field

pub mod geometry;
pub mod pdf;
