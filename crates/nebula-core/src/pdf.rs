// ─────────────────────────────────────────────────────────────────────
// Nebulous — Field Sampler
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Stochastic and derived physical fields over a nebula cell-set.
//!
//! Every sampler returns a full-size cube that is zero outside `loc`. Each
//! call seeds its own `StdRng`, so the same seed gives the same cube no
//! matter what else was sampled before.

use nebula_math::grid::radial_distance;
use nebula_types::config::FieldDistribution;
use nebula_types::error::{NebulaError, NebulaResult};
use nebula_types::state::{CellSet, Cube};
use rand::distributions::Open01;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Beta, Distribution, Exp, LogNormal, Normal, StandardNormal};
use statrs::distribution::{ContinuousCDF, Normal as GaussianCdf};
use tracing::debug;

/// Keeps the power-lognormal inverse transform away from Φ⁻¹(0) and Φ⁻¹(1).
const CDF_CLAMP: f64 = 1e-15;

/// Normalisation of a polytropic field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolytropeMean {
    /// Straight average over the active cells.
    Geometric,
    /// Average weighted by the source field, Σ(n·f)/Σn.
    Weighted,
}

fn check_mean(mean: f64) -> NebulaResult<()> {
    if !mean.is_finite() || mean <= 0.0 {
        return Err(NebulaError::InvalidParameter(format!(
            "field mean must be finite and > 0, got {mean}"
        )));
    }
    Ok(())
}

fn check_width(name: &str, value: f64) -> NebulaResult<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(NebulaError::InvalidParameter(format!(
            "{name} must be finite and >= 0, got {value}"
        )));
    }
    Ok(())
}

fn check_positive(name: &str, value: f64) -> NebulaResult<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(NebulaError::InvalidParameter(format!(
            "{name} must be finite and > 0, got {value}"
        )));
    }
    Ok(())
}

fn distribution_error(family: &str, err: impl std::fmt::Debug) -> NebulaError {
    NebulaError::InvalidParameter(format!("{family} distribution: {err:?}"))
}

fn mean_of(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Draw `loc.len()` values and place them on the grid.
fn draw<D: Distribution<f64>>(loc: &CellSet, dist: &D, seed: u64) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..loc.len()).map(|_| dist.sample(&mut rng)).collect()
}

fn finish(family: &str, loc: &CellSet, values: &[f64]) -> NebulaResult<Cube> {
    if !values.is_empty() {
        debug!(
            family,
            n_cells = values.len(),
            sample_mean = mean_of(values),
            "field sampled"
        );
    }
    loc.scatter(values)
}

/// Exponential field with scale `mean`.
pub fn exponential(loc: &CellSet, mean: f64, seed: u64) -> NebulaResult<Cube> {
    check_mean(mean)?;
    let dist = Exp::new(1.0 / mean).map_err(|e| distribution_error("exponential", e))?;
    finish("exponential", loc, &draw(loc, &dist, seed))
}

/// Lognormal field whose analytic mean is `mean`: scale = mean·e^(−σ²/2).
pub fn lognormal(loc: &CellSet, mean: f64, sigma: f64, seed: u64) -> NebulaResult<Cube> {
    check_mean(mean)?;
    check_width("lognormal sigma", sigma)?;
    let mu = mean.ln() - 0.5 * sigma * sigma;
    let dist = LogNormal::new(mu, sigma).map_err(|e| distribution_error("lognormal", e))?;
    finish("lognormal", loc, &draw(loc, &dist, seed))
}

/// Power-lognormal field, F(x) = 1 − Φ(−ln x / σ)^c, rescaled so the
/// sample mean over `loc` is exactly `mean`.
pub fn lognormal_pareto(
    loc: &CellSet,
    mean: f64,
    sigma: f64,
    c: f64,
    seed: u64,
) -> NebulaResult<Cube> {
    check_mean(mean)?;
    check_positive("pareto sigma", sigma)?;
    check_positive("pareto c", c)?;
    let gauss = GaussianCdf::new(0.0, 1.0).map_err(|e| distribution_error("pareto", e))?;

    let mut rng = StdRng::seed_from_u64(seed);
    let mut values: Vec<f64> = (0..loc.len())
        .map(|_| {
            let u: f64 = rng.sample(Open01);
            let p = u.powf(1.0 / c).clamp(CDF_CLAMP, 1.0 - CDF_CLAMP);
            (-sigma * gauss.inverse_cdf(p)).exp()
        })
        .collect();

    if !values.is_empty() {
        let scale = mean / mean_of(&values);
        values.iter_mut().for_each(|v| *v *= scale);
    }
    finish("pareto", loc, &values)
}

/// Modified-lognormal-power-law field, exp(μ + σZ − ln(U)/α) with
/// μ = ln(mean·(1 − 1/α)) − σ²/2. Requires α > 1.
pub fn mlp(loc: &CellSet, mean: f64, sigma: f64, alpha: f64, seed: u64) -> NebulaResult<Cube> {
    check_mean(mean)?;
    check_width("mlp sigma", sigma)?;
    if !alpha.is_finite() || alpha <= 1.0 {
        return Err(NebulaError::InvalidParameter(format!(
            "mlp alpha must be finite and > 1, got {alpha}"
        )));
    }
    let mu = (mean * (1.0 - 1.0 / alpha)).ln() - 0.5 * sigma * sigma;

    let mut rng = StdRng::seed_from_u64(seed);
    let values: Vec<f64> = (0..loc.len())
        .map(|_| {
            let z: f64 = rng.sample(StandardNormal);
            let u: f64 = rng.sample(Open01);
            (mu + sigma * z - u.ln() / alpha).exp()
        })
        .collect();
    finish("mlp", loc, &values)
}

/// Beta(α, β) field rescaled by mean / (α/(α+β)).
pub fn beta(loc: &CellSet, mean: f64, alpha: f64, beta: f64, seed: u64) -> NebulaResult<Cube> {
    check_mean(mean)?;
    check_positive("beta alpha", alpha)?;
    check_positive("beta beta", beta)?;
    let dist = Beta::new(alpha, beta).map_err(|e| distribution_error("beta", e))?;
    let scale = mean * (alpha + beta) / alpha;
    let values: Vec<f64> = draw(loc, &dist, seed).into_iter().map(|v| v * scale).collect();
    finish("beta", loc, &values)
}

/// Normal(mean, σ) field; negative draws are redrawn until none remain.
pub fn normal(loc: &CellSet, mean: f64, sigma: f64, seed: u64) -> NebulaResult<Cube> {
    check_mean(mean)?;
    check_width("normal sigma", sigma)?;
    let dist = Normal::new(mean, sigma).map_err(|e| distribution_error("normal", e))?;

    let mut rng = StdRng::seed_from_u64(seed);
    let mut values: Vec<f64> = (0..loc.len()).map(|_| dist.sample(&mut rng)).collect();
    let mut rounds = 0usize;
    loop {
        let negative: Vec<usize> = values
            .iter()
            .enumerate()
            .filter(|(_, v)| **v < 0.0)
            .map(|(i, _)| i)
            .collect();
        if negative.is_empty() {
            break;
        }
        rounds += 1;
        for i in negative {
            values[i] = dist.sample(&mut rng);
        }
    }
    if rounds > 0 {
        debug!(rounds, "normal field: negative draws resampled");
    }
    finish("normal", loc, &values)
}

/// `func` applied to the radial distance normalised to the cell-set's
/// outermost cell; rescaled to `mean` when given.
pub fn radial_gradient<F>(loc: &CellSet, func: F, mean: Option<f64>) -> NebulaResult<Cube>
where
    F: Fn(f64) -> f64,
{
    if let Some(m) = mean {
        check_mean(m)?;
    }
    let r = loc.gather(&radial_distance(loc.dim()));
    let r_max = r.iter().copied().fold(0.0, f64::max);
    let mut values: Vec<f64> = r
        .iter()
        .map(|&d| func(if r_max > 0.0 { d / r_max } else { 0.0 }))
        .collect();

    if let (Some(target), false) = (mean, values.is_empty()) {
        let current = mean_of(&values);
        if !current.is_finite() || current == 0.0 {
            return Err(NebulaError::InvalidParameter(format!(
                "radial gradient mean {current} cannot be rescaled to {target}"
            )));
        }
        values.iter_mut().for_each(|v| *v *= target / current);
    }
    finish("radial", loc, &values)
}

/// `cube^(index − 1)` over the active cells, normalised to `mean`.
///
/// `loc` defaults to the cells where `cube` is positive.
pub fn polytrope(
    cube: &Cube,
    index: f64,
    mean: f64,
    weighting: PolytropeMean,
    loc: Option<&CellSet>,
) -> NebulaResult<Cube> {
    check_mean(mean)?;
    if !index.is_finite() {
        return Err(NebulaError::InvalidParameter(format!(
            "polytropic index must be finite, got {index}"
        )));
    }
    let default_loc;
    let loc = match loc {
        Some(l) => l,
        None => {
            default_loc = CellSet::positive(cube);
            &default_loc
        }
    };
    nebula_types::error::ensure_shape(&loc.dim().0, cube.shape())?;
    if loc.is_empty() {
        return Err(NebulaError::InvalidParameter(
            "polytrope requires at least one active cell".to_string(),
        ));
    }

    let source = loc.gather(cube);
    let mut values: Vec<f64> = source.iter().map(|n| n.powf(index - 1.0)).collect();

    let current = match weighting {
        PolytropeMean::Geometric => mean_of(&values),
        PolytropeMean::Weighted => {
            let total: f64 = source.iter().sum();
            source.iter().zip(&values).map(|(n, f)| n * f).sum::<f64>() / total
        }
    };
    if !current.is_finite() || current <= 0.0 {
        return Err(NebulaError::InvalidParameter(format!(
            "polytrope normalisation is {current} for index {index}"
        )));
    }
    values.iter_mut().for_each(|v| *v *= mean / current);
    finish("polytrope", loc, &values)
}

/// Sample a configured distribution family. `Normal` widths are fractions
/// of `mean`.
pub fn sample_field(
    distribution: &FieldDistribution,
    loc: &CellSet,
    mean: f64,
    seed: u64,
) -> NebulaResult<Cube> {
    match *distribution {
        FieldDistribution::Exponential => exponential(loc, mean, seed),
        FieldDistribution::Lognormal { sigma } => lognormal(loc, mean, sigma, seed),
        FieldDistribution::Pareto { sigma, c } => lognormal_pareto(loc, mean, sigma, c, seed),
        FieldDistribution::Mlp { sigma, alpha } => mlp(loc, mean, sigma, alpha, seed),
        FieldDistribution::Beta { alpha, beta: b } => beta(loc, mean, alpha, b, seed),
        FieldDistribution::Normal { sigma } => normal(loc, mean, sigma * mean, seed),
    }
}
