// ─────────────────────────────────────────────────────────────────────
// Nebulous — Emissivity
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Forward model: per-cell line emissivity and its projection on the sky.

use crate::atomic::AtomicData;
use crate::ion::{IonDefinition, Transition};
use nebula_math::grid::project_los;
use nebula_math::smooth::Smoothing;
use nebula_types::error::{ensure_shape, NebulaError, NebulaResult};
use nebula_types::state::{CellSet, Cube, CubeDim, SkyMap, VolumeField};
use ndarray::{Array3, Zip};
use tracing::debug;

/// Physical state of the nebula fed to the forward model.
#[derive(Debug, Clone, Copy)]
pub struct EmissivityInputs<'a> {
    pub temperature: VolumeField<'a>,
    pub electron_density: VolumeField<'a>,
    /// Emitting-ion density; the electron density when absent.
    pub ion_density: Option<VolumeField<'a>>,
    /// Cells to evaluate; where every spatial field is positive when absent.
    pub active_cells: Option<&'a CellSet>,
}

impl<'a> EmissivityInputs<'a> {
    pub fn new(temperature: impl Into<VolumeField<'a>>, electron_density: impl Into<VolumeField<'a>>) -> Self {
        EmissivityInputs {
            temperature: temperature.into(),
            electron_density: electron_density.into(),
            ion_density: None,
            active_cells: None,
        }
    }

    pub fn with_active_cells(mut self, loc: &'a CellSet) -> Self {
        self.active_cells = Some(loc);
        self
    }

    pub fn with_ion_density(mut self, ion_density: impl Into<VolumeField<'a>>) -> Self {
        self.ion_density = Some(ion_density.into());
        self
    }
}

/// One emissivity cube per transition, n_e·n_i·ε, zero off the active cells.
#[derive(Debug, Clone)]
pub struct EmissivityVolumes {
    pub transitions: Vec<Transition>,
    pub volumes: Vec<Cube>,
    pub active: CellSet,
}

/// Line-of-sight sums of [`EmissivityVolumes`], one map per transition.
#[derive(Debug, Clone)]
pub struct SkyIntensity {
    pub transitions: Vec<Transition>,
    pub maps: Vec<SkyMap>,
}

impl SkyIntensity {
    pub fn map(&self, transition: &Transition) -> NebulaResult<&SkyMap> {
        self.transitions
            .iter()
            .position(|t| t == transition)
            .map(|i| &self.maps[i])
            .ok_or_else(|| NebulaError::AtomicData(format!("no sky map for transition {transition}")))
    }

    pub fn first(&self) -> NebulaResult<&SkyMap> {
        self.maps
            .first()
            .ok_or_else(|| NebulaError::ConfigError("sky intensity has no transitions".to_string()))
    }

    pub fn sky_shape(&self) -> NebulaResult<(usize, usize)> {
        Ok(self.first()?.dim())
    }
}

/// Cells where every cube is strictly positive.
fn positive_everywhere(dim: CubeDim, cubes: &[&Cube]) -> CellSet {
    let mut mask = Array3::from_elem(dim.shape(), true);
    for cube in cubes {
        Zip::from(&mut mask).and(*cube).for_each(|m, &v| *m &= v > 0.0);
    }
    CellSet::from_mask(&mask)
}

/// Per-cell emissivity of every transition of `ion`.
///
/// Fails with `ConfigError` when temperature, electron density and ion
/// density are all uniform: there would be no grid to evaluate on.
pub fn compute_emissivity<A: AtomicData + ?Sized>(
    atomic: &A,
    ion: &IonDefinition,
    inputs: &EmissivityInputs<'_>,
) -> NebulaResult<EmissivityVolumes> {
    ion.validate()?;
    let ion_density = inputs.ion_density.unwrap_or(inputs.electron_density);
    let spatial: Vec<&Cube> = [inputs.temperature, inputs.electron_density, ion_density]
        .iter()
        .filter_map(|f| f.as_cube())
        .collect();
    let Some(first) = spatial.first() else {
        return Err(NebulaError::ConfigError(format!(
            "emissivity of {} needs a spatially varying temperature, electron density or ion density",
            ion.key
        )));
    };
    let dim = CubeDim::of(first);
    for cube in &spatial[1..] {
        ensure_shape(first.shape(), cube.shape())?;
    }

    let default_active;
    let active = match inputs.active_cells {
        Some(loc) => {
            ensure_shape(&dim.0, &loc.dim().0)?;
            loc
        }
        None => {
            default_active = positive_everywhere(dim, &spatial);
            &default_active
        }
    };

    let mut volumes = Vec::with_capacity(ion.transitions.len());
    for transition in ion.transitions {
        let mut volume = dim.zeros();
        for &idx in active.iter() {
            let n_e = inputs.electron_density.at(idx);
            let n_i = ion_density.at(idx);
            let eps = atomic.emissivity(ion, transition, inputs.temperature.at(idx), n_e)?;
            volume[idx] = eps * n_e * n_i;
        }
        volumes.push(volume);
    }

    debug!(
        ion = ion.key,
        transitions = ion.transitions.len(),
        active_cells = active.len(),
        "emissivity computed"
    );
    Ok(EmissivityVolumes {
        transitions: ion.transitions.to_vec(),
        volumes,
        active: active.clone(),
    })
}

/// Project every volume along the line of sight, then smooth.
pub fn compute_sky_intensity(
    volumes: &EmissivityVolumes,
    smoothing: Smoothing,
) -> NebulaResult<SkyIntensity> {
    let maps = volumes
        .volumes
        .iter()
        .map(|v| smoothing.apply(&project_los(v)))
        .collect::<NebulaResult<Vec<_>>>()?;
    Ok(SkyIntensity {
        transitions: volumes.transitions.clone(),
        maps,
    })
}

/// [`compute_emissivity`] followed by [`compute_sky_intensity`].
pub fn forward_model<A: AtomicData + ?Sized>(
    atomic: &A,
    ion: &IonDefinition,
    inputs: &EmissivityInputs<'_>,
    smoothing: Smoothing,
) -> NebulaResult<SkyIntensity> {
    compute_sky_intensity(&compute_emissivity(atomic, ion, inputs)?, smoothing)
}
