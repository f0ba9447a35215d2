// ─────────────────────────────────────────────────────────────────────
// Nebulous — Atomic Data
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Atomic-physics calculations behind the diagnostics.
//!
//! [`AtomicData`] is the seam to an atomic database: emissivities, ratio
//! inversions and ionic abundances as pure functions of (T, n_e, line).
//! [`SyntheticAtomicData`] is a closed-form, self-consistent model of it.
//!
//! Collisional lines: ε = S · T^(−1/2) · exp(−χ/T) / (1 + n_e/n_c),
//! χ = hc/(kλ). Doublet critical densities bracket the ion's density range
//! so I₁/I₂ falls monotonically with density; triplet auroral lines have
//! the higher excitation energy so (I₁+I₂)/I₃ falls monotonically with T.
//!
//! Recombination lines: ε = A · (T/10⁴ K)^b, independent of density.

use crate::ion::{self, Combiner, DiagnosticClass, IonDefinition, LineKind, Transition, H_BETA};
use nebula_types::constants::{HBETA_SCALE, HC_OVER_K_ANGSTROM};
use nebula_types::error::{NebulaError, NebulaResult};

/// Collision strength scale of the synthetic collisional lines.
const COLLISION_STRENGTH: f64 = 1.0e-21;

/// Doublet critical densities sit this factor either side of the centre
/// of the ion's density range.
const DOUBLET_SPREAD: f64 = 3.162_277_660_168_379_5;

/// Critical density of triplet nebular lines [cm⁻³].
const NEBULAR_CRITICAL_DENSITY: f64 = 1.0e5;

/// Critical density of triplet auroral lines [cm⁻³].
const AURORAL_CRITICAL_DENSITY: f64 = 1.0e7;

/// (label, A [erg cm³ s⁻¹] at 10⁴ K, temperature exponent b)
const RECOMBINATION_COEFFICIENTS: &[(&str, f64, f64)] = &[
    ("4_2", 1.24e-25, -0.83),
    ("11_2", 2.3e-27, -0.93),
    ("4089.29", 5.2e-27, -0.72),
    ("4638.86", 1.4e-26, -0.68),
    ("4641.81", 3.5e-26, -0.68),
    ("4649.13", 6.3e-26, -0.68),
];

/// Bisection steps in log space; enough for full double precision over
/// eight decades.
const BISECTION_STEPS: usize = 64;

/// The quantity held fixed while a line ratio is inverted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum KnownParameter {
    Temperature(f64),
    Density(f64),
}

/// Atomic-physics service. Implementations return NaN (not an error) when
/// a physical input or a ratio falls outside what they can evaluate.
pub trait AtomicData {
    /// Volume emissivity [erg cm³ s⁻¹] of one transition.
    fn emissivity(
        &self,
        ion: &IonDefinition,
        transition: &Transition,
        temperature: f64,
        density: f64,
    ) -> NebulaResult<f64>;

    /// Temperature (density-sensitive ion) or density (temperature-sensitive
    /// ion) at which `combiner` applied to the ion's emissivities equals
    /// `ratio`.
    fn invert_ratio(
        &self,
        ion: &IonDefinition,
        ratio: f64,
        combiner: &Combiner,
        known: KnownParameter,
    ) -> NebulaResult<f64>;

    /// Ionic abundance relative to H⁺ from `intensity_ratio` = 100·I/I(Hβ).
    fn ionic_abundance(
        &self,
        ion: &IonDefinition,
        transition: &Transition,
        intensity_ratio: f64,
        temperature: f64,
        density: f64,
    ) -> NebulaResult<f64>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct SyntheticAtomicData {
    /// Temperature search range [K].
    pub temperature_bounds: (f64, f64),
    /// Density search range [cm⁻³].
    pub density_bounds: (f64, f64),
}

impl Default for SyntheticAtomicData {
    fn default() -> Self {
        SyntheticAtomicData {
            temperature_bounds: (300.0, 1.0e5),
            density_bounds: (1.0, 1.0e8),
        }
    }
}

impl SyntheticAtomicData {
    fn critical_density(ion: &IonDefinition, index: usize) -> f64 {
        match ion.diagnostic {
            Some(DiagnosticClass::DensitySensitive) => {
                let (lo, hi) = ion.density_range.unwrap_or((1e1, 1e5));
                let centre = (lo * hi).sqrt();
                if index == 0 {
                    centre / DOUBLET_SPREAD
                } else {
                    centre * DOUBLET_SPREAD
                }
            }
            _ if index == 2 => AURORAL_CRITICAL_DENSITY,
            _ => NEBULAR_CRITICAL_DENSITY,
        }
    }

    fn collisional(
        ion: &IonDefinition,
        transition: &Transition,
        temperature: f64,
        density: f64,
    ) -> NebulaResult<f64> {
        let index = ion.position(transition)?;
        let Transition::Wavelength(lambda) = *transition else {
            return Err(NebulaError::AtomicData(format!(
                "collisional line {transition} of {} needs a wavelength",
                ion.key
            )));
        };
        let chi = HC_OVER_K_ANGSTROM / lambda;
        let n_c = Self::critical_density(ion, index);
        Ok(COLLISION_STRENGTH * temperature.powf(-0.5) * (-chi / temperature).exp()
            / (1.0 + density / n_c))
    }

    fn recombination(
        ion: &IonDefinition,
        transition: &Transition,
        temperature: f64,
    ) -> NebulaResult<f64> {
        ion.position(transition)?;
        let label = match transition {
            Transition::Label(l) => l.to_string(),
            Transition::Wavelength(w) => w.to_string(),
        };
        let (_, a, b) = RECOMBINATION_COEFFICIENTS
            .iter()
            .find(|(l, _, _)| *l == label)
            .ok_or_else(|| {
                NebulaError::AtomicData(format!(
                    "no recombination coefficient for {} {label}",
                    ion.key
                ))
            })?;
        Ok(a * (temperature / 1.0e4).powf(*b))
    }

    /// Combined model ratio at (T, n_e).
    fn model_ratio(
        &self,
        ion: &IonDefinition,
        combiner: &Combiner,
        temperature: f64,
        density: f64,
    ) -> f64 {
        let emissivities: Option<Vec<f64>> = ion
            .transitions
            .iter()
            .map(|t| self.emissivity(ion, t, temperature, density).ok())
            .collect();
        match emissivities {
            Some(e) => combiner(&e),
            None => f64::NAN,
        }
    }
}

/// Root of `f(x) = target` for `x` in `[lo, hi]`, bisecting in ln x.
/// NaN when the target is not bracketed.
fn bisect_log<F: Fn(f64) -> f64>(f: F, target: f64, (lo, hi): (f64, f64)) -> f64 {
    let (mut a, mut b) = (lo.ln(), hi.ln());
    let fa = f(lo) - target;
    let fb = f(hi) - target;
    if !fa.is_finite() || !fb.is_finite() {
        return f64::NAN;
    }
    if fa == 0.0 {
        return lo;
    }
    if fb == 0.0 {
        return hi;
    }
    if fa.signum() == fb.signum() {
        return f64::NAN;
    }
    let sign_a = fa.signum();
    for _ in 0..BISECTION_STEPS {
        let mid = 0.5 * (a + b);
        let fm = f(mid.exp()) - target;
        if fm == 0.0 {
            return mid.exp();
        }
        if fm.signum() == sign_a {
            a = mid;
        } else {
            b = mid;
        }
    }
    (0.5 * (a + b)).exp()
}

impl AtomicData for SyntheticAtomicData {
    fn emissivity(
        &self,
        ion: &IonDefinition,
        transition: &Transition,
        temperature: f64,
        density: f64,
    ) -> NebulaResult<f64> {
        if !(temperature.is_finite() && temperature > 0.0 && density.is_finite() && density >= 0.0)
        {
            return Ok(f64::NAN);
        }
        match ion.kind {
            LineKind::Collisional => Self::collisional(ion, transition, temperature, density),
            LineKind::Recombination => Self::recombination(ion, transition, temperature),
        }
    }

    fn invert_ratio(
        &self,
        ion: &IonDefinition,
        ratio: f64,
        combiner: &Combiner,
        known: KnownParameter,
    ) -> NebulaResult<f64> {
        let class = ion.diagnostic_class()?;
        match (class, known) {
            (DiagnosticClass::DensitySensitive, KnownParameter::Temperature(t)) => {
                if !(ratio.is_finite() && ratio > 0.0 && t.is_finite() && t > 0.0) {
                    return Ok(f64::NAN);
                }
                Ok(bisect_log(
                    |n| self.model_ratio(ion, combiner, t, n),
                    ratio,
                    self.density_bounds,
                ))
            }
            (DiagnosticClass::TemperatureSensitive, KnownParameter::Density(n)) => {
                if !(ratio.is_finite() && ratio > 0.0 && n.is_finite() && n >= 0.0) {
                    return Ok(f64::NAN);
                }
                Ok(bisect_log(
                    |t| self.model_ratio(ion, combiner, t, n),
                    ratio,
                    self.temperature_bounds,
                ))
            }
            (class, known) => Err(NebulaError::ConfigError(format!(
                "{} is {class:?}, cannot invert with known {known:?}",
                ion.key
            ))),
        }
    }

    fn ionic_abundance(
        &self,
        ion: &IonDefinition,
        transition: &Transition,
        intensity_ratio: f64,
        temperature: f64,
        density: f64,
    ) -> NebulaResult<f64> {
        let hydrogen = ion::recombination_line("HI")?;
        let line = self.emissivity(ion, transition, temperature, density)?;
        let h_beta = self.emissivity(hydrogen, &H_BETA, temperature, density)?;
        Ok(intensity_ratio / HBETA_SCALE * h_beta / line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ion::{
        density_diagnostic, density_ratio, recombination_line, temperature_diagnostic,
        temperature_ratio, BALMER_REFERENCE, DENSITY_DIAGNOSTICS, TEMPERATURE_DIAGNOSTICS,
    };

    fn ratio_at(atomic: &SyntheticAtomicData, ion: &IonDefinition, t: f64, n: f64) -> f64 {
        let e: Vec<f64> = ion
            .transitions
            .iter()
            .map(|tr| atomic.emissivity(ion, tr, t, n).unwrap())
            .collect();
        ion.diagnostic.unwrap().default_ratio(&e)
    }

    #[test]
    fn test_density_ratio_falls_with_density() {
        let atomic = SyntheticAtomicData::default();
        for ion in DENSITY_DIAGNOSTICS {
            let low = ratio_at(&atomic, ion, 1e4, 10.0);
            let high = ratio_at(&atomic, ion, 1e4, 1e7);
            assert!(low > high, "{}: {low} <= {high}", ion.key);
        }
    }

    #[test]
    fn test_temperature_ratio_falls_with_temperature() {
        let atomic = SyntheticAtomicData::default();
        for ion in TEMPERATURE_DIAGNOSTICS {
            let cool = ratio_at(&atomic, ion, 5e3, 1e3);
            let hot = ratio_at(&atomic, ion, 15e3, 1e3);
            assert!(cool > hot, "{}: {cool} <= {hot}", ion.key);
        }
    }

    #[test]
    fn test_density_roundtrip_all_ions() {
        let atomic = SyntheticAtomicData::default();
        for ion in DENSITY_DIAGNOSTICS {
            for n in [50.0, 1e3, 2e4] {
                let r = ratio_at(&atomic, ion, 1e4, n);
                let back = atomic
                    .invert_ratio(ion, r, &density_ratio, KnownParameter::Temperature(1e4))
                    .unwrap();
                assert!((back / n - 1.0).abs() < 1e-6, "{}: {n} -> {back}", ion.key);
            }
        }
    }

    #[test]
    fn test_temperature_roundtrip_all_ions() {
        let atomic = SyntheticAtomicData::default();
        for ion in TEMPERATURE_DIAGNOSTICS {
            for t in [5e3, 1e4, 15e3] {
                let r = ratio_at(&atomic, ion, t, 1e3);
                let back = atomic
                    .invert_ratio(ion, r, &temperature_ratio, KnownParameter::Density(1e3))
                    .unwrap();
                assert!((back / t - 1.0).abs() < 1e-6, "{}: {t} -> {back}", ion.key);
            }
        }
    }

    #[test]
    fn test_custom_combiner() {
        let atomic = SyntheticAtomicData::default();
        let ion = density_diagnostic("SII").unwrap();
        let inverse = |v: &[f64]| v[1] / v[0];
        let r = 1.0 / ratio_at(&atomic, ion, 1e4, 300.0);
        let n = atomic
            .invert_ratio(ion, r, &inverse, KnownParameter::Temperature(1e4))
            .unwrap();
        assert!((n / 300.0 - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_unbracketed_ratio_is_nan() {
        let atomic = SyntheticAtomicData::default();
        let ion = density_diagnostic("SII").unwrap();
        let known = KnownParameter::Temperature(1e4);
        assert!(atomic.invert_ratio(ion, 1e6, &density_ratio, known).unwrap().is_nan());
        assert!(atomic.invert_ratio(ion, 0.0, &density_ratio, known).unwrap().is_nan());
        assert!(atomic
            .invert_ratio(ion, f64::INFINITY, &density_ratio, known)
            .unwrap()
            .is_nan());
    }

    #[test]
    fn test_wrong_known_parameter() {
        let atomic = SyntheticAtomicData::default();
        let ion = temperature_diagnostic("OIII").unwrap();
        let known = KnownParameter::Temperature(1e4);
        let result = atomic.invert_ratio(ion, 100.0, &temperature_ratio, known);
        assert!(matches!(result, Err(NebulaError::ConfigError(_))));
        let orl = recombination_line("OII").unwrap();
        assert!(atomic
            .invert_ratio(orl, 1.0, &density_ratio, KnownParameter::Density(1e3))
            .is_err());
    }

    #[test]
    fn test_abundance_of_forward_ratio_is_one() {
        let atomic = SyntheticAtomicData::default();
        let hydrogen = recombination_line("HI").unwrap();
        for ion in [
            density_diagnostic("OII").unwrap(),
            temperature_diagnostic("OIII").unwrap(),
            recombination_line("OII").unwrap(),
        ] {
            let (t, n) = (8e3, 2e3);
            let hb = atomic.emissivity(hydrogen, &H_BETA, t, n).unwrap();
            for tr in ion.transitions {
                let line = atomic.emissivity(ion, tr, t, n).unwrap();
                let abd = atomic
                    .ionic_abundance(ion, tr, HBETA_SCALE * line / hb, t, n)
                    .unwrap();
                assert!((abd - 1.0).abs() < 1e-12, "{} {tr}: {abd}", ion.key);
            }
        }
    }

    #[test]
    fn test_unknown_transition_errors() {
        let atomic = SyntheticAtomicData::default();
        let ion = density_diagnostic("SII").unwrap();
        let result = atomic.emissivity(ion, &Transition::Wavelength(5007.0), 1e4, 1e3);
        assert!(matches!(result, Err(NebulaError::AtomicData(_))));
    }

    #[test]
    fn test_unphysical_inputs_give_nan() {
        let atomic = SyntheticAtomicData::default();
        let bj = recombination_line("BJ").unwrap();
        assert!(atomic.emissivity(bj, &BALMER_REFERENCE, 0.0, 1e3).unwrap().is_nan());
        assert!(atomic.emissivity(bj, &BALMER_REFERENCE, 1e4, -1.0).unwrap().is_nan());
        assert!(atomic.emissivity(bj, &BALMER_REFERENCE, 1e4, 1e3).unwrap() > 0.0);
    }

    #[test]
    fn test_bisect_log_brackets() {
        let root = bisect_log(|x| x * x, 49.0, (1.0, 100.0));
        assert!((root - 7.0).abs() < 1e-10);
        assert!(bisect_log(|x| x, 500.0, (1.0, 100.0)).is_nan());
        assert_eq!(bisect_log(|x| x, 1.0, (1.0, 100.0)), 1.0);
    }
}
