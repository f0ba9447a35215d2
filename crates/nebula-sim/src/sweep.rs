// ─────────────────────────────────────────────────────────────────────
// Nebulous — Sweep Helpers
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
use crate::nebula::Nebula;
use nebula_diagnostics::ion::Transition;
use nebula_types::config::{ExperimentConfig, FieldDistribution};
use nebula_types::error::{NebulaError, NebulaResult};
use nebula_types::state::{Cube, SkyMap, SkyMask};
use ndarray::Zip;

/// Points in a density sweep over an ion's density range.
pub const DENSITY_GRID_POINTS: usize = 25;

/// Temperature sweep bounds [K].
pub const TEMPERATURE_SWEEP: (f64, f64) = (5.0e3, 15.0e3);

/// Points in a filling-factor temperature sweep.
pub const TEMPERATURE_GRID_POINTS: usize = 25;

/// Points in an ADF temperature sweep.
pub const ADF_TEMPERATURE_GRID_POINTS: usize = 100;

/// Polytropic index bounds and point count.
pub const POLYTROPE_INDICES: (f64, f64, usize) = (0.0, 2.0, 25);

/// How the swept field is built at each step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldModel {
    /// The step value on every emitting cell.
    Uniform,
    /// Drawn from `distribution` with the step value as its mean.
    Sampled {
        distribution: FieldDistribution,
        seed: u64,
    },
}

impl FieldModel {
    pub fn from_config(config: &ExperimentConfig) -> Self {
        FieldModel::Sampled {
            distribution: config.distribution,
            seed: config.seed(),
        }
    }

    pub fn build(&self, nebula: &Nebula, mean: f64) -> NebulaResult<Cube> {
        match self {
            FieldModel::Uniform => nebula.uniform(mean),
            FieldModel::Sampled { distribution, seed } => nebula.sample(distribution, mean, *seed),
        }
    }

    pub fn label(&self) -> String {
        match self {
            FieldModel::Uniform => "uniform".to_string(),
            FieldModel::Sampled { distribution, .. } => distribution.label(),
        }
    }
}

/// `n` evenly spaced values from `start` to `stop` inclusive.
pub fn linspace(start: f64, stop: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => (0..n)
            .map(|i| start + (stop - start) * i as f64 / (n - 1) as f64)
            .collect(),
    }
}

pub(crate) fn check_grid(name: &str, grid: &[f64]) -> NebulaResult<()> {
    if grid.is_empty() {
        return Err(NebulaError::ConfigError(format!("{name} sweep is empty")));
    }
    if let Some(bad) = grid.iter().find(|v| !v.is_finite() || **v <= 0.0) {
        return Err(NebulaError::InvalidParameter(format!(
            "{name} sweep values must be finite and > 0, got {bad}"
        )));
    }
    Ok(())
}

/// `numerator / denominator` on `mask`, zero elsewhere.
pub(crate) fn masked_ratio(numerator: &SkyMap, denominator: &SkyMap, mask: &SkyMask) -> SkyMap {
    let mut ratio = SkyMap::zeros(numerator.dim());
    Zip::from(&mut ratio)
        .and(numerator)
        .and(denominator)
        .and(mask)
        .for_each(|r, &a, &b, &m| {
            if m {
                *r = a / b;
            }
        });
    ratio
}

/// Short column tag of a transition: the first four characters of its name.
pub(crate) fn transition_tag(transition: &Transition) -> String {
    transition.to_string().chars().take(4).collect()
}
