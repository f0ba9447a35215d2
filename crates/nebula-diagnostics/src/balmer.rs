// ─────────────────────────────────────────────────────────────────────
// Nebulous — Balmer Jump
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Balmer-jump thermometer.
//!
//! The jump is modelled as n_e² T^(−3/2) per cell and compared with the
//! H 11→2 line. Both scale as n_e², so their ratio depends on temperature
//! only through the calibration curve built at one fixed density.

use crate::atomic::AtomicData;
use crate::ion::{self, BALMER_REFERENCE};
use crate::line_ratio::{DiagnosticMap, Quantity};
use nebula_math::grid::project_los;
use nebula_math::interp::LinearInterpolant;
use nebula_math::smooth::Smoothing;
use nebula_types::constants::{
    BALMER_GRID_POINTS, BALMER_TEMPERATURE_EXPONENT, BALMER_TEMPERATURE_MAX,
    BALMER_TEMPERATURE_MIN,
};
use nebula_types::error::{ensure_shape, NebulaError, NebulaResult};
use nebula_types::state::{CellSet, Cube, CubeDim, SkyMap, SkyMask, SkyValue, VolumeField};
use tracing::{debug, warn};

/// Jump "emissivity" n_e² T^(−3/2) on the active cells.
///
/// Active cells default to where the spatial inputs are positive.
pub fn balmer_jump_emissivity(
    temperature: VolumeField<'_>,
    electron_density: VolumeField<'_>,
    active_cells: Option<&CellSet>,
) -> NebulaResult<Cube> {
    let (dim, default_mask) = match (electron_density.as_cube(), temperature.as_cube()) {
        (Some(n), _) => (CubeDim::of(n), n.mapv(|v| v > 0.0)),
        (None, Some(t)) => (CubeDim::of(t), t.mapv(|v| v > 0.0)),
        (None, None) => {
            return Err(NebulaError::ConfigError(
                "Balmer jump needs a spatially varying temperature or electron density".to_string(),
            ))
        }
    };
    if let (Some(n), Some(t)) = (electron_density.as_cube(), temperature.as_cube()) {
        ensure_shape(n.shape(), t.shape())?;
    }
    let default_active;
    let active = match active_cells {
        Some(loc) => {
            ensure_shape(&dim.0, &loc.dim().0)?;
            loc
        }
        None => {
            default_active = CellSet::from_mask(&default_mask);
            &default_active
        }
    };

    let mut jump = dim.zeros();
    for &idx in active.iter() {
        let n = electron_density.at(idx);
        jump[idx] = n * n * temperature.at(idx).powf(BALMER_TEMPERATURE_EXPONENT);
    }
    Ok(jump)
}

/// Projected, smoothed Balmer-jump intensity.
pub fn balmer_jump_intensity(jump: &Cube, smoothing: Smoothing) -> NebulaResult<SkyMap> {
    smoothing.apply(&project_los(jump))
}

/// Calibration of jump / I(H 11→2) against temperature at one density.
#[derive(Debug, Clone)]
pub struct BalmerJump {
    interpolant: LinearInterpolant,
    density: f64,
}

impl BalmerJump {
    /// Tabulate T^(−3/2) / ε(H 11→2) on 500–30,000 K at `density`.
    ///
    /// The curve is density-specific, so a density map is a usage error.
    pub fn calibrate<A: AtomicData + ?Sized>(atomic: &A, density: SkyValue<'_>) -> NebulaResult<Self> {
        let density = match density {
            SkyValue::Uniform(d) => d,
            SkyValue::Map(_) => {
                return Err(NebulaError::ConfigError(
                    "Balmer-jump calibration needs a single density, not a map".to_string(),
                ))
            }
        };
        if !density.is_finite() || density <= 0.0 {
            return Err(NebulaError::InvalidParameter(format!(
                "Balmer-jump calibration density must be finite and > 0, got {density}"
            )));
        }

        let hydrogen = ion::recombination_line("BJ")?;
        let step = (BALMER_TEMPERATURE_MAX - BALMER_TEMPERATURE_MIN) / (BALMER_GRID_POINTS - 1) as f64;
        let mut ratios = Vec::with_capacity(BALMER_GRID_POINTS);
        let mut temperatures = Vec::with_capacity(BALMER_GRID_POINTS);
        for i in 0..BALMER_GRID_POINTS {
            let t = BALMER_TEMPERATURE_MIN + step * i as f64;
            let j_h = atomic.emissivity(hydrogen, &BALMER_REFERENCE, t, density)?;
            ratios.push(t.powf(BALMER_TEMPERATURE_EXPONENT) / j_h);
            temperatures.push(t);
        }
        let interpolant = LinearInterpolant::new(&ratios, &temperatures)?;
        debug!(density, domain = ?interpolant.domain(), "Balmer jump calibrated");
        Ok(BalmerJump {
            interpolant,
            density,
        })
    }

    pub fn density(&self) -> f64 {
        self.density
    }

    /// Calibrated ratio range.
    pub fn ratio_range(&self) -> (f64, f64) {
        self.interpolant.domain()
    }

    /// Temperature for one jump / I(H 11→2) ratio; linear extrapolation
    /// beyond the calibrated range.
    pub fn temperature_at(&self, ratio: f64) -> f64 {
        self.interpolant.eval(ratio)
    }

    /// Temperature map from the jump and reference-line sky maps. The line
    /// of sight defaults to where the reference line is positive.
    pub fn temperature(
        &self,
        jump: &SkyMap,
        reference: &SkyMap,
        line_of_sight: Option<&SkyMask>,
    ) -> NebulaResult<DiagnosticMap> {
        ensure_shape(reference.shape(), jump.shape())?;
        let line_of_sight = match line_of_sight {
            Some(mask) => {
                ensure_shape(reference.shape(), mask.shape())?;
                mask.clone()
            }
            None => reference.mapv(|v| v > 0.0),
        };

        let mut values = SkyMap::zeros(reference.dim());
        let mut extrapolated = 0usize;
        for (pos, _) in line_of_sight.indexed_iter().filter(|(_, m)| **m) {
            let ratio = jump[pos] / reference[pos];
            if ratio.is_finite() && !self.interpolant.contains(ratio) {
                extrapolated += 1;
            }
            values[pos] = self.temperature_at(ratio);
        }
        if extrapolated > 0 {
            warn!(
                extrapolated,
                range = ?self.ratio_range(),
                "Balmer jump: ratios outside the calibrated range were extrapolated"
            );
        }
        Ok(DiagnosticMap {
            quantity: Quantity::Temperature,
            values,
            line_of_sight,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atomic::SyntheticAtomicData;
    use crate::emissivity::{forward_model, EmissivityInputs};

    fn shell_density(n: usize, value: f64) -> Cube {
        let c = (n as f64 - 1.0) / 2.0;
        Cube::from_shape_fn((n, n, n), |(i, j, k)| {
            let r = ((i as f64 - c).powi(2) + (j as f64 - c).powi(2) + (k as f64 - c).powi(2)).sqrt();
            if r >= 0.15 * n as f64 && r <= 0.45 * n as f64 {
                value
            } else {
                0.0
            }
        })
    }

    #[test]
    fn test_jump_emissivity_formula() {
        let den = shell_density(8, 100.0);
        let jump = balmer_jump_emissivity(VolumeField::Uniform(1e4), (&den).into(), None).unwrap();
        let expected = 1e4 * 1e4f64.powf(-1.5);
        for (j, n) in jump.iter().zip(den.iter()) {
            if *n > 0.0 {
                assert!((j - expected).abs() < 1e-12 * expected);
            } else {
                assert_eq!(*j, 0.0);
            }
        }
        let uniform = balmer_jump_emissivity(VolumeField::Uniform(1e4), VolumeField::Uniform(1e3), None);
        assert!(uniform.is_err());
    }

    #[test]
    fn test_calibration_rejects_density_map() {
        let atomic = SyntheticAtomicData::default();
        let map = SkyMap::from_elem((3, 3), 1e3);
        match BalmerJump::calibrate(&atomic, SkyValue::Map(&map)) {
            Err(NebulaError::ConfigError(msg)) => assert!(msg.contains("single density")),
            other => panic!("Expected ConfigError, got {other:?}"),
        }
        assert!(BalmerJump::calibrate(&atomic, SkyValue::Uniform(0.0)).is_err());
    }

    #[test]
    fn test_calibration_inverts_grid() {
        let atomic = SyntheticAtomicData::default();
        let bj = BalmerJump::calibrate(&atomic, SkyValue::Uniform(1e3)).unwrap();
        let hydrogen = ion::recombination_line("BJ").unwrap();
        for t in [1_500.0, 7_250.0, 12_000.0, 25_000.0] {
            let j = atomic.emissivity(hydrogen, &BALMER_REFERENCE, t, 1e3).unwrap();
            let back = bj.temperature_at(t.powf(-1.5) / j);
            assert!((back / t - 1.0).abs() < 1e-3, "{t} -> {back}");
        }
    }

    #[test]
    fn test_extrapolates_beyond_grid() {
        let atomic = SyntheticAtomicData::default();
        let bj = BalmerJump::calibrate(&atomic, SkyValue::Uniform(1e3)).unwrap();
        let (lo, _) = bj.ratio_range();
        let t = bj.temperature_at(0.5 * lo);
        assert!(t.is_finite() && t > BALMER_TEMPERATURE_MAX);
    }

    #[test]
    fn test_isothermal_nebula_recovered() {
        let atomic = SyntheticAtomicData::default();
        let den = shell_density(12, 1e3);
        let smoothing = Smoothing::Gaussian { sigma: 1.0 };
        let inputs = EmissivityInputs::new(1.1e4, &den);
        let hydrogen = ion::recombination_line("BJ").unwrap();
        let reference = forward_model(&atomic, hydrogen, &inputs, smoothing).unwrap();
        let jump = balmer_jump_emissivity(VolumeField::Uniform(1.1e4), (&den).into(), None).unwrap();
        let jump_sky = balmer_jump_intensity(&jump, smoothing).unwrap();

        let bj = BalmerJump::calibrate(&atomic, SkyValue::Uniform(1e3)).unwrap();
        let map = bj.temperature(&jump_sky, &reference.maps[0], None).unwrap();
        for (t, m) in map.values.iter().zip(map.line_of_sight.iter()) {
            if *m {
                assert!((t / 1.1e4 - 1.0).abs() < 1e-3, "BJ temperature {t}");
            } else {
                assert_eq!(*t, 0.0);
            }
        }
    }
}
