// ─────────────────────────────────────────────────────────────────────
// Nebulous — Geometry
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Nebula shapes as cell-sets, and random partitioning of a cell-set.

use nebula_math::grid::radial_distance;
use nebula_types::error::{NebulaError, NebulaResult};
use nebula_types::state::{CellSet, CubeDim};
use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::debug;

/// Tolerance on Σ pvals = 1.
const PVALS_SUM_TOL: f64 = 1e-8;

/// Spherical shell between fractional radii `in_rad` and `out_rad`.
///
/// Radii are fractions of half the extent along `axis`; a cell belongs to the
/// shell when its distance from the cube centre lies in `[in, out]`
/// (inclusive). `in_rad >= out_rad` yields an empty set.
pub fn sphere(dim: CubeDim, in_rad: f64, out_rad: f64, axis: usize) -> NebulaResult<CellSet> {
    if axis > 2 {
        return Err(NebulaError::InvalidParameter(format!(
            "sphere axis must be 0, 1 or 2, got {axis}"
        )));
    }
    for (name, r) in [("in_rad", in_rad), ("out_rad", out_rad)] {
        if !r.is_finite() || r < 0.0 {
            return Err(NebulaError::InvalidParameter(format!(
                "sphere {name} must be finite and >= 0, got {r}"
            )));
        }
    }
    if in_rad >= out_rad {
        debug!(in_rad, out_rad, "degenerate shell, returning empty cell-set");
        return Ok(CellSet::empty(dim));
    }

    let half = 0.5 * dim.0[axis] as f64;
    let (r_in, r_out) = (in_rad * half, out_rad * half);
    let r = radial_distance(dim);
    let cells = CellSet::from_mask(&r.mapv(|d| d >= r_in && d <= r_out));
    debug!(
        dim = ?dim.0,
        r_in,
        r_out,
        n_cells = cells.len(),
        "sphere generated"
    );
    Ok(cells)
}

/// Split `loc` into `pvals.len()` disjoint subsets, assigning each cell
/// independently with probabilities `pvals`. Identical inputs reproduce
/// identical partitions.
pub fn partition(loc: &CellSet, pvals: &[f64], seed: u64) -> NebulaResult<Vec<CellSet>> {
    if pvals.is_empty() {
        return Err(NebulaError::InvalidParameter(
            "partition requires at least one probability".to_string(),
        ));
    }
    if pvals.iter().any(|p| !p.is_finite() || *p < 0.0) {
        return Err(NebulaError::InvalidParameter(format!(
            "partition probabilities must be finite and >= 0, got {pvals:?}"
        )));
    }
    let total: f64 = pvals.iter().sum();
    if (total - 1.0).abs() > PVALS_SUM_TOL {
        return Err(NebulaError::InvalidParameter(format!(
            "partition probabilities must sum to 1, got {total}"
        )));
    }

    let chooser = WeightedIndex::new(pvals)
        .map_err(|e| NebulaError::InvalidParameter(format!("partition weights: {e}")))?;
    let mut rng = StdRng::seed_from_u64(seed);

    let mut groups: Vec<Vec<[usize; 3]>> = vec![Vec::new(); pvals.len()];
    for cell in loc.iter() {
        groups[chooser.sample(&mut rng)].push(*cell);
    }

    groups
        .into_iter()
        .map(|cells| CellSet::new(loc.dim(), cells))
        .collect()
}
