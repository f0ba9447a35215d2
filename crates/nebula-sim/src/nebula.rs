// ─────────────────────────────────────────────────────────────────────
// Nebulous — Nebula
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! The fixed part of an experiment: shell geometry, depth, line of sight.

use nebula_core::geometry::sphere;
use nebula_core::pdf::sample_field;
use nebula_math::grid::depth;
use nebula_math::smooth::Smoothing;
use nebula_types::config::{ExperimentConfig, FieldDistribution, GeometryConfig};
use nebula_types::error::{NebulaError, NebulaResult};
use nebula_types::state::{CellSet, Cube, CubeDim, Depth, SkyMask};
use tracing::info;

/// A spherical-shell nebula and the sky selection its statistics use.
#[derive(Debug, Clone)]
pub struct Nebula {
    pub dim: CubeDim,
    /// Emitting cells.
    pub cells: CellSet,
    pub depth: Depth,
    /// `depth > min_depth`
    pub line_of_sight: SkyMask,
    pub min_depth: usize,
    pub smoothing: Smoothing,
}

impl Nebula {
    pub fn new(geometry: &GeometryConfig, smoothing: Smoothing, min_depth: usize) -> NebulaResult<Self> {
        geometry.validate()?;
        let dim = geometry.cube_dim()?;
        let cells = sphere(dim, geometry.in_rad, geometry.out_rad, geometry.axis)?;
        if cells.is_empty() {
            return Err(NebulaError::ConfigError(format!(
                "geometry in_rad={} out_rad={} selects no cells",
                geometry.in_rad, geometry.out_rad
            )));
        }
        let depth = depth(&cells);
        let line_of_sight = depth.mapv(|d| d > min_depth);
        let sight_lines = line_of_sight.iter().filter(|m| **m).count();
        if sight_lines == 0 {
            return Err(NebulaError::ConfigError(format!(
                "no line of sight deeper than min_depth={min_depth}"
            )));
        }
        info!(dim = ?dim.0, cells = cells.len(), sight_lines, "nebula built");
        Ok(Nebula {
            dim,
            cells,
            depth,
            line_of_sight,
            min_depth,
            smoothing,
        })
    }

    pub fn from_config(config: &ExperimentConfig) -> NebulaResult<Self> {
        config.validate()?;
        Nebula::new(
            &config.geometry,
            Smoothing::from_kernel(config.smoothing.kernel()),
            config.min_depth,
        )
    }

    /// Field drawn from `distribution` over the emitting cells.
    pub fn sample(&self, distribution: &FieldDistribution, mean: f64, seed: u64) -> NebulaResult<Cube> {
        sample_field(distribution, &self.cells, mean, seed)
    }

    /// Constant field over the emitting cells, zero elsewhere.
    pub fn uniform(&self, value: f64) -> NebulaResult<Cube> {
        self.cells.scatter(&vec![value; self.cells.len()])
    }
}
