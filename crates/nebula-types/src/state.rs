// ─────────────────────────────────────────────────────────────────────
// Nebulous — State
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
use crate::error::{NebulaError, NebulaResult};
use ndarray::{Array2, Array3, Axis};
use serde::{Deserialize, Serialize};

/// 3D scalar field over the simulation grid.
pub type Cube = Array3<f64>;

/// 2D map on the sky plane (the cube with the line-of-sight axis removed).
pub type SkyMap = Array2<f64>;

/// Selection of sky-plane positions (the "los" selection).
pub type SkyMask = Array2<bool>;

/// Number of cells along each line of sight.
pub type Depth = Array2<usize>;

/// Axis along which every projection is taken.
pub const LOS_AXIS: Axis = Axis(2);

/// Grid dimensions (x, y, z); z is the line of sight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CubeDim(pub [usize; 3]);

impl CubeDim {
    /// Isotropic n×n×n grid.
    pub fn cubic(n: usize) -> Self {
        CubeDim([n, n, n])
    }

    /// Parse a dimension list: three entries are taken as-is, any other
    /// non-empty list is extended isotropically from its first entry.
    pub fn from_slice(dim: &[usize]) -> NebulaResult<Self> {
        let parsed = match dim {
            [] => {
                return Err(NebulaError::ConfigError(
                    "cube dimensions must contain at least one extent".to_string(),
                ))
            }
            [x, y, z] => CubeDim([*x, *y, *z]),
            [n, ..] => CubeDim::cubic(*n),
        };
        if parsed.0.iter().any(|&n| n == 0) {
            return Err(NebulaError::ConfigError(format!(
                "cube dimensions must be non-zero, got {:?}",
                parsed.0
            )));
        }
        Ok(parsed)
    }

    pub fn shape(&self) -> (usize, usize, usize) {
        (self.0[0], self.0[1], self.0[2])
    }

    /// Shape of the sky plane.
    pub fn sky_shape(&self) -> (usize, usize) {
        (self.0[0], self.0[1])
    }

    pub fn n_cells(&self) -> usize {
        self.0.iter().product()
    }

    /// Empty cube of this size.
    pub fn zeros(&self) -> Cube {
        Cube::zeros(self.shape())
    }

    /// Dimensions of an existing cube.
    pub fn of(cube: &Cube) -> Self {
        let (x, y, z) = cube.dim();
        CubeDim([x, y, z])
    }
}

/// Set of grid cells belonging to a nebula (or a partition of it).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellSet {
    dim: CubeDim,
    cells: Vec<[usize; 3]>,
}

impl CellSet {
    /// Build from explicit indices; every index must lie inside `dim` and
    /// appear once.
    pub fn new(dim: CubeDim, cells: Vec<[usize; 3]>) -> NebulaResult<Self> {
        if let Some(bad) = cells
            .iter()
            .find(|c| c.iter().zip(dim.0.iter()).any(|(i, n)| i >= n))
        {
            return Err(NebulaError::InvalidParameter(format!(
                "cell {bad:?} lies outside grid {:?}",
                dim.0
            )));
        }
        let mut seen = Array3::from_elem(dim.shape(), false);
        for &[i, j, k] in &cells {
            if std::mem::replace(&mut seen[[i, j, k]], true) {
                return Err(NebulaError::InvalidParameter(format!(
                    "cell {:?} listed more than once",
                    [i, j, k]
                )));
            }
        }
        Ok(CellSet { dim, cells })
    }

    pub fn empty(dim: CubeDim) -> Self {
        CellSet {
            dim,
            cells: Vec::new(),
        }
    }

    /// Cells where `mask` is true, in row-major order.
    pub fn from_mask(mask: &Array3<bool>) -> Self {
        let (x, y, z) = mask.dim();
        let cells = mask
            .indexed_iter()
            .filter(|(_, m)| **m)
            .map(|((i, j, k), _)| [i, j, k])
            .collect();
        CellSet {
            dim: CubeDim([x, y, z]),
            cells,
        }
    }

    /// Cells where `cube` is strictly positive.
    pub fn positive(cube: &Cube) -> Self {
        Self::from_mask(&cube.mapv(|v| v > 0.0))
    }

    pub fn dim(&self) -> CubeDim {
        self.dim
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn cells(&self) -> &[[usize; 3]] {
        &self.cells
    }

    pub fn iter(&self) -> impl Iterator<Item = &[usize; 3]> {
        self.cells.iter()
    }

    pub fn to_mask(&self) -> Array3<bool> {
        let mut mask = Array3::from_elem(self.dim.shape(), false);
        for &[i, j, k] in &self.cells {
            mask[[i, j, k]] = true;
        }
        mask
    }

    /// Values of `cube` at each cell, in cell order.
    pub fn gather(&self, cube: &Cube) -> Vec<f64> {
        self.cells.iter().map(|&[i, j, k]| cube[[i, j, k]]).collect()
    }

    /// Zero cube with `values` written at each cell, in cell order.
    pub fn scatter(&self, values: &[f64]) -> NebulaResult<Cube> {
        if values.len() != self.cells.len() {
            return Err(NebulaError::ShapeMismatch {
                expected: vec![self.cells.len()],
                actual: vec![values.len()],
            });
        }
        let mut cube = self.dim.zeros();
        for (&[i, j, k], &v) in self.cells.iter().zip(values) {
            cube[[i, j, k]] = v;
        }
        Ok(cube)
    }
}

/// A physical quantity that is either constant over the nebula or varies cell by cell.
#[derive(Debug, Clone, Copy)]
pub enum VolumeField<'a> {
    Uniform(f64),
    Cube(&'a Cube),
}

impl<'a> VolumeField<'a> {
    pub fn at(&self, idx: [usize; 3]) -> f64 {
        match self {
            VolumeField::Uniform(v) => *v,
            VolumeField::Cube(c) => c[idx],
        }
    }

    pub fn as_cube(&self) -> Option<&'a Cube> {
        match self {
            VolumeField::Uniform(_) => None,
            VolumeField::Cube(c) => Some(*c),
        }
    }

    pub fn is_spatial(&self) -> bool {
        matches!(self, VolumeField::Cube(_))
    }
}

impl From<f64> for VolumeField<'_> {
    fn from(v: f64) -> Self {
        VolumeField::Uniform(v)
    }
}

impl<'a> From<&'a Cube> for VolumeField<'a> {
    fn from(c: &'a Cube) -> Self {
        VolumeField::Cube(c)
    }
}

/// A sky-plane quantity that is either a single value or a map.
#[derive(Debug, Clone, Copy)]
pub enum SkyValue<'a> {
    Uniform(f64),
    Map(&'a SkyMap),
}

impl<'a> SkyValue<'a> {
    pub fn at(&self, idx: (usize, usize)) -> f64 {
        match self {
            SkyValue::Uniform(v) => *v,
            SkyValue::Map(m) => m[idx],
        }
    }

    pub fn as_map(&self) -> Option<&'a SkyMap> {
        match self {
            SkyValue::Uniform(_) => None,
            SkyValue::Map(m) => Some(*m),
        }
    }

    /// Fails when a map does not cover the given sky shape.
    pub fn check_shape(&self, shape: (usize, usize)) -> NebulaResult<()> {
        match self {
            SkyValue::Uniform(_) => Ok(()),
            SkyValue::Map(m) => crate::error::ensure_shape(&[shape.0, shape.1], m.shape()),
        }
    }
}

impl From<f64> for SkyValue<'_> {
    fn from(v: f64) -> Self {
        SkyValue::Uniform(v)
    }
}

impl<'a> From<&'a SkyMap> for SkyValue<'a> {
    fn from(m: &'a SkyMap) -> Self {
        SkyValue::Map(m)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_dimension_is_isotropic() {
        let dim = CubeDim::from_slice(&[30]).unwrap();
        assert_eq!(dim, CubeDim([30, 30, 30]));
        assert_eq!(dim.sky_shape(), (30, 30));
        assert_eq!(dim.n_cells(), 27_000);
    }

    #[test]
    fn test_two_entry_dimension_uses_first() {
        let dim = CubeDim::from_slice(&[12, 7]).unwrap();
        assert_eq!(dim, CubeDim([12, 12, 12]));
    }

    #[test]
    fn test_explicit_dimension_kept() {
        let dim = CubeDim::from_slice(&[4, 5, 6]).unwrap();
        assert_eq!(dim.shape(), (4, 5, 6));
    }

    #[test]
    fn test_empty_or_zero_dimension_rejected() {
        assert!(CubeDim::from_slice(&[]).is_err());
        assert!(CubeDim::from_slice(&[4, 0, 4]).is_err());
    }

    #[test]
    fn test_cellset_rejects_out_of_bounds() {
        let dim = CubeDim::cubic(3);
        assert!(CellSet::new(dim, vec![[0, 1, 3]]).is_err());
        assert!(CellSet::new(dim, vec![[2, 2, 2]]).is_ok());
    }

    #[test]
    fn test_cellset_rejects_duplicates() {
        let dim = CubeDim::cubic(3);
        let err = CellSet::new(dim, vec![[1, 1, 0], [0, 2, 1], [1, 1, 0]]).unwrap_err();
        assert!(err.to_string().contains("more than once"));
    }

    #[test]
    fn test_mask_roundtrip() {
        let dim = CubeDim::cubic(4);
        let cells = CellSet::new(dim, vec![[0, 0, 0], [1, 2, 3], [3, 3, 3]]).unwrap();
        let back = CellSet::from_mask(&cells.to_mask());
        assert_eq!(back, cells);
    }

    #[test]
    fn test_scatter_gather() {
        let dim = CubeDim::cubic(3);
        let cells = CellSet::new(dim, vec![[0, 0, 1], [2, 1, 0]]).unwrap();
        let cube = cells.scatter(&[4.0, 7.0]).unwrap();
        assert_eq!(cube[[0, 0, 1]], 4.0);
        assert_eq!(cube[[2, 1, 0]], 7.0);
        assert_eq!(cube.sum(), 11.0);
        assert_eq!(cells.gather(&cube), vec![4.0, 7.0]);
        assert!(cells.scatter(&[1.0]).is_err());
    }

    #[test]
    fn test_positive_cells() {
        let mut cube = Cube::zeros((2, 2, 2));
        cube[[1, 0, 1]] = 3.0;
        cube[[0, 1, 0]] = -1.0;
        let cells = CellSet::positive(&cube);
        assert_eq!(cells.cells(), &[[1, 0, 1]]);
    }

    #[test]
    fn test_sky_value_shape_check() {
        let map = SkyMap::zeros((3, 4));
        assert!(SkyValue::Map(&map).check_shape((3, 4)).is_ok());
        assert!(SkyValue::Map(&map).check_shape((4, 3)).is_err());
        assert!(SkyValue::Uniform(1.0).check_shape((9, 9)).is_ok());
    }
}
