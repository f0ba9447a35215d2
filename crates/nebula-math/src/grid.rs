// ─────────────────────────────────────────────────────────────────────
// Nebulous — Grid Utilities
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Cube coordinates, radial distance, line-of-sight depth and projection.
//!
//! The origin sits at the mean coordinate of each axis, so an even-sized
//! axis has no cell exactly at the centre.

use nebula_types::state::{CellSet, Cube, CubeDim, Depth, SkyMap, LOS_AXIS};
use ndarray::Array1;

/// Centred coordinate of every index along an axis of length `n`.
fn centred_axis(n: usize) -> Array1<f64> {
    let centre = (n as f64 - 1.0) / 2.0;
    Array1::from_shape_fn(n, |i| i as f64 - centre)
}

/// Per-cell (x, y, z) coordinates relative to the cube centre.
pub fn coordinates(dim: CubeDim) -> (Cube, Cube, Cube) {
    let (nx, ny, nz) = dim.shape();
    let (ax, ay, az) = (centred_axis(nx), centred_axis(ny), centred_axis(nz));
    let x = Cube::from_shape_fn(dim.shape(), |(i, _, _)| ax[i]);
    let y = Cube::from_shape_fn(dim.shape(), |(_, j, _)| ay[j]);
    let z = Cube::from_shape_fn(dim.shape(), |(_, _, k)| az[k]);
    (x, y, z)
}

/// Euclidean distance of every cell from the cube centre.
pub fn radial_distance(dim: CubeDim) -> Cube {
    let (nx, ny, nz) = dim.shape();
    let (ax, ay, az) = (centred_axis(nx), centred_axis(ny), centred_axis(nz));
    Cube::from_shape_fn(dim.shape(), |(i, j, k)| {
        (ax[i] * ax[i] + ay[j] * ay[j] + az[k] * az[k]).sqrt()
    })
}

/// Number of non-zero cells along each line of sight.
pub fn depth_true(cube: &Cube) -> Depth {
    cube.map_axis(LOS_AXIS, |lane| lane.iter().filter(|v| **v != 0.0).count())
}

/// Number of nebula cells along each line of sight, counting every cell
/// inside the boundary whether or not it holds material.
pub fn depth(loc: &CellSet) -> Depth {
    let (nx, ny, _) = loc.dim().shape();
    let mut depth = Depth::zeros((nx, ny));
    for &[i, j, _] in loc.iter() {
        depth[[i, j]] += 1;
    }
    depth
}

/// Sum along the line of sight, skipping non-finite cells.
pub fn project_los(cube: &Cube) -> SkyMap {
    cube.map_axis(LOS_AXIS, |lane| {
        lane.iter().filter(|v| v.is_finite()).sum::<f64>()
    })
}
