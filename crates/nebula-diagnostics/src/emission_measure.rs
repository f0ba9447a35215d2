// ─────────────────────────────────────────────────────────────────────
// Nebulous — Emission Measure
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Emission measure and the density it implies.
//!
//! EM = Σ n_e² along the line of sight. With a temperature field the sum
//! is weighted by T^(−1/2) and rescaled by the square root of a sky
//! temperature, as a recombination-line observer would.

use nebula_math::grid::{depth_true, project_los};
use nebula_math::smooth::Smoothing;
use nebula_types::error::{ensure_shape, NebulaError, NebulaResult};
use nebula_types::state::{Cube, Depth, SkyMap, SkyValue, VolumeField, LOS_AXIS};
use ndarray::Zip;
use tracing::debug;

/// Sky temperature used to undo the T^(−1/2) weighting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TemperatureWeighting {
    /// Σ T / depth
    Geometric,
    /// Σ n_e T / Σ n_e; geometric when the density is uniform.
    #[default]
    DensityWeighted,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct EmissionMeasureOptions<'a> {
    /// Temperature cube; no temperature weighting when absent.
    pub temperature: Option<&'a Cube>,
    /// Known sky temperature; derived from `temperature` when absent.
    pub sky_temperature: Option<SkyValue<'a>>,
    pub weighting: TemperatureWeighting,
    /// Line-of-sight depth; counted from the non-zero cells when absent.
    pub depth: Option<&'a Depth>,
    pub smoothing: Smoothing,
}

/// Representative temperature of each line of sight, zero where the
/// temperature cube has no cells.
pub fn sky_temperature(
    temperature: &Cube,
    electron_density: VolumeField<'_>,
    weighting: TemperatureWeighting,
    depth: Option<&Depth>,
) -> NebulaResult<SkyMap> {
    let counted;
    let depth = match depth {
        Some(d) => {
            ensure_shape(&temperature.shape()[..2], d.shape())?;
            d
        }
        None => {
            counted = depth_true(temperature);
            &counted
        }
    };
    let t_sum = temperature.sum_axis(LOS_AXIS);
    let mut sky = SkyMap::zeros(t_sum.dim());

    match (weighting, electron_density) {
        (TemperatureWeighting::DensityWeighted, VolumeField::Cube(n)) => {
            ensure_shape(temperature.shape(), n.shape())?;
            let n_sum = n.sum_axis(LOS_AXIS);
            let nt_sum = (n * temperature).sum_axis(LOS_AXIS);
            Zip::from(&mut sky)
                .and(depth)
                .and(&nt_sum)
                .and(&n_sum)
                .for_each(|s, &d, &nt, &ns| {
                    if d > 0 && ns != 0.0 {
                        *s = nt / ns;
                    }
                });
        }
        _ => {
            Zip::from(&mut sky)
                .and(depth)
                .and(&t_sum)
                .for_each(|s, &d, &ts| {
                    if d > 0 {
                        *s = ts / d as f64;
                    }
                });
        }
    }
    Ok(sky)
}

/// Emission measure on the sky.
///
/// When `sky_temperature` is supplied the smoothing acts on the
/// T^(−1/2)-weighted sum before the √T rescale; otherwise it acts on the
/// final map.
pub fn emission_measure(
    electron_density: VolumeField<'_>,
    options: &EmissionMeasureOptions<'_>,
) -> NebulaResult<SkyMap> {
    let Some(temperature) = options.temperature else {
        let em = match electron_density {
            VolumeField::Cube(n) => project_los(&n.mapv(|v| v * v)),
            VolumeField::Uniform(n) => {
                let depth = options.depth.ok_or_else(|| {
                    NebulaError::ConfigError(
                        "emission measure of a uniform density needs a depth map or a temperature cube"
                            .to_string(),
                    )
                })?;
                depth.mapv(|d| n * n * d as f64)
            }
        };
        debug!(total = em.sum(), "emission measure (isothermal)");
        return options.smoothing.apply(&em);
    };

    if let Some(n) = electron_density.as_cube() {
        ensure_shape(temperature.shape(), n.shape())?;
    }
    let weighted = Cube::from_shape_fn(temperature.dim(), |(i, j, k)| {
        let t = temperature[[i, j, k]];
        if t > 0.0 {
            let n = electron_density.at([i, j, k]);
            n * n / t.sqrt()
        } else {
            0.0
        }
    });
    let weighted_sum = project_los(&weighted);

    match options.sky_temperature {
        Some(sky_t) => {
            sky_t.check_shape(weighted_sum.dim())?;
            let smoothed = options.smoothing.apply(&weighted_sum)?;
            Ok(SkyMap::from_shape_fn(smoothed.dim(), |pos| {
                smoothed[pos] * sky_t.at(pos).sqrt()
            }))
        }
        None => {
            let sky_t = sky_temperature(temperature, electron_density, options.weighting, options.depth)?;
            let em = weighted_sum * sky_t.mapv(f64::sqrt);
            debug!(total = em.sum(), weighting = ?options.weighting, "emission measure");
            options.smoothing.apply(&em)
        }
    }
}

/// n_e = √(EM / depth) where depth > `min_depth`, zero elsewhere.
pub fn density_from_emission_measure(
    emission_measure: &SkyMap,
    depth: &Depth,
    min_depth: usize,
) -> NebulaResult<SkyMap> {
    ensure_shape(emission_measure.shape(), depth.shape())?;
    let mut density = SkyMap::zeros(emission_measure.dim());
    Zip::from(&mut density)
        .and(emission_measure)
        .and(depth)
        .for_each(|n, &em, &d| {
            if d > min_depth {
                *n = (em / d as f64).sqrt();
            }
        });
    Ok(density)
}
