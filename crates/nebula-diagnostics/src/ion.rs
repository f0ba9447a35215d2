// ─────────────────────────────────────────────────────────────────────
// Nebulous — Ion Registry
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Immutable ion definitions and the static diagnostic registry.
//!
//! A density-sensitive ion has exactly two collisional transitions, a
//! temperature-sensitive ion exactly three. The diagnostic class picks the
//! default line ratio; there is one inversion algorithm for all ions.

use nebula_types::error::{NebulaError, NebulaResult};
use std::fmt;
use Transition::{Label as L, Wavelength as W};

/// A line, identified by wavelength [Å] or by a recombination label.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Transition {
    Wavelength(f64),
    Label(&'static str),
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transition::Wavelength(w) => write!(f, "{w}"),
            Transition::Label(l) => f.write_str(l),
        }
    }
}

/// Hβ, the normalising recombination line.
pub const H_BETA: Transition = Transition::Label("4_2");

/// H 11→2, the reference line of the Balmer-jump thermometer.
pub const BALMER_REFERENCE: Transition = Transition::Label("11_2");

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Collisional,
    Recombination,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticClass {
    /// Two transitions, I₁/I₂ inverted at fixed temperature.
    DensitySensitive,
    /// Three transitions, (I₁+I₂)/I₃ inverted at fixed density.
    TemperatureSensitive,
}

impl DiagnosticClass {
    pub fn transition_count(&self) -> usize {
        match self {
            DiagnosticClass::DensitySensitive => 2,
            DiagnosticClass::TemperatureSensitive => 3,
        }
    }

    /// Default line ratio for this class.
    pub fn default_ratio(&self, intensities: &[f64]) -> f64 {
        match self {
            DiagnosticClass::DensitySensitive => density_ratio(intensities),
            DiagnosticClass::TemperatureSensitive => temperature_ratio(intensities),
        }
    }
}

/// Combines per-transition intensities into the inverted ratio.
pub type Combiner = dyn Fn(&[f64]) -> f64;

/// I₁ / I₂
pub fn density_ratio(intensities: &[f64]) -> f64 {
    intensities[0] / intensities[1]
}

/// (I₁ + I₂) / I₃
pub fn temperature_ratio(intensities: &[f64]) -> f64 {
    (intensities[0] + intensities[1]) / intensities[2]
}

#[derive(Debug, Clone, PartialEq)]
pub struct IonDefinition {
    /// Registry key, e.g. `OIII`.
    pub key: &'static str,
    pub species: &'static str,
    pub stage: u8,
    pub kind: LineKind,
    pub transitions: &'static [Transition],
    pub diagnostic: Option<DiagnosticClass>,
    /// Log-spaced density sweep bounds [cm⁻³] for density experiments.
    pub density_range: Option<(f64, f64)>,
}

impl IonDefinition {
    /// Checks the transition count against the diagnostic class.
    pub fn validate(&self) -> NebulaResult<()> {
        let n = self.transitions.len();
        match self.diagnostic {
            Some(class) if class.transition_count() != n => Err(NebulaError::ConfigError(format!(
                "{} is {:?} and needs {} transitions, has {}",
                self.key,
                class,
                class.transition_count(),
                n
            ))),
            None if n == 0 => Err(NebulaError::ConfigError(format!(
                "{} has no transitions",
                self.key
            ))),
            _ => Ok(()),
        }
    }

    /// Diagnostic class, or a `ConfigError` for pure abundance lines.
    pub fn diagnostic_class(&self) -> NebulaResult<DiagnosticClass> {
        self.diagnostic.ok_or_else(|| {
            NebulaError::ConfigError(format!("{} is not a line-ratio diagnostic", self.key))
        })
    }

    pub fn position(&self, transition: &Transition) -> NebulaResult<usize> {
        self.transitions
            .iter()
            .position(|t| t == transition)
            .ok_or_else(|| {
                NebulaError::AtomicData(format!("{} has no transition {transition}", self.key))
            })
    }

    /// `n` log-spaced densities across `density_range`.
    pub fn density_grid(&self, n: usize) -> NebulaResult<Vec<f64>> {
        let (lo, hi) = self.density_range.ok_or_else(|| {
            NebulaError::ConfigError(format!("{} has no density sweep range", self.key))
        })?;
        if n < 2 {
            return Ok(vec![lo; n]);
        }
        let (a, b) = (lo.log10(), hi.log10());
        Ok((0..n)
            .map(|i| 10f64.powf(a + (b - a) * i as f64 / (n - 1) as f64))
            .collect())
    }
}

/// Sweep range for ions without a dedicated one.
const DEFAULT_DENSITY_RANGE: (f64, f64) = (1e1, 1e5);

const fn density_cel(
    key: &'static str,
    species: &'static str,
    stage: u8,
    transitions: &'static [Transition],
    range: (f64, f64),
) -> IonDefinition {
    IonDefinition {
        key,
        species,
        stage,
        kind: LineKind::Collisional,
        transitions,
        diagnostic: Some(DiagnosticClass::DensitySensitive),
        density_range: Some(range),
    }
}

const fn temperature_cel(
    key: &'static str,
    species: &'static str,
    stage: u8,
    transitions: &'static [Transition],
) -> IonDefinition {
    IonDefinition {
        key,
        species,
        stage,
        kind: LineKind::Collisional,
        transitions,
        diagnostic: Some(DiagnosticClass::TemperatureSensitive),
        density_range: None,
    }
}

const fn recombination(
    key: &'static str,
    species: &'static str,
    stage: u8,
    transitions: &'static [Transition],
) -> IonDefinition {
    IonDefinition {
        key,
        species,
        stage,
        kind: LineKind::Recombination,
        transitions,
        diagnostic: None,
        density_range: None,
    }
}

pub static DENSITY_DIAGNOSTICS: &[IonDefinition] = &[
    density_cel("ArIV", "Ar", 4, &[W(4711.0), W(4740.0)], (1e2, 1e6)),
    density_cel("CIII", "C", 3, &[W(1907.0), W(1909.0)], (1e3, 1e7)),
    density_cel("ClIII", "Cl", 3, &[W(5518.0), W(5538.0)], (1e2, 1e5)),
    density_cel("KV", "K", 5, &[W(4123.0), W(4163.0)], (1e3, 1e7)),
    density_cel("NI", "N", 1, &[W(5198.0), W(5200.0)], (1e1, 1e4)),
    density_cel("NIII", "N", 3, &[W(1749.0), W(1752.0)], DEFAULT_DENSITY_RANGE),
    density_cel("NeIV", "Ne", 4, &[W(2425.0), W(2423.0)], (1e2, 1e6)),
    density_cel("OII", "O", 2, &[W(3729.0), W(3726.0)], (1e1, 1e4)),
    density_cel("OIII", "O", 3, &[W(88.36e4), W(51.81e4)], (1e1, 1e4)),
    density_cel("OIV", "O", 4, &[W(1405.0), W(1401.0)], DEFAULT_DENSITY_RANGE),
    density_cel("SII", "S", 2, &[W(6716.0), W(6731.0)], (1e1, 1e4)),
    density_cel("SiIII", "Si", 3, &[W(1883.0), W(1892.0)], (1e2, 1e6)),
];

pub static TEMPERATURE_DIAGNOSTICS: &[IonDefinition] = &[
    temperature_cel("ArIII", "Ar", 3, &[W(7136.0), W(7751.0), W(5192.0)]),
    temperature_cel("ClIV", "Cl", 4, &[W(7530.0), W(8045.0), W(5323.0)]),
    temperature_cel("NII", "N", 2, &[W(6548.0), W(6584.0), W(5754.0)]),
    temperature_cel("NeIII", "Ne", 3, &[W(3869.0), W(3968.0), W(3343.0)]),
    temperature_cel("OIII", "O", 3, &[W(5007.0), W(4959.0), W(4363.0)]),
    temperature_cel("SIII", "S", 3, &[W(9531.0), W(9069.0), W(6312.0)]),
];

pub static RECOMBINATION_LINES: &[IonDefinition] = &[
    recombination("HI", "H", 1, &[H_BETA]),
    recombination(
        "OII",
        "O",
        2,
        &[L("4089.29"), L("4638.86"), L("4641.81"), L("4649.13")],
    ),
    recombination("BJ", "H", 1, &[BALMER_REFERENCE]),
];

fn find(table: &'static [IonDefinition], key: &str, what: &str) -> NebulaResult<&'static IonDefinition> {
    table
        .iter()
        .find(|ion| ion.key == key)
        .ok_or_else(|| NebulaError::UnknownIon(format!("{what} '{key}'")))
}

pub fn density_diagnostic(key: &str) -> NebulaResult<&'static IonDefinition> {
    find(DENSITY_DIAGNOSTICS, key, "density diagnostic")
}

pub fn temperature_diagnostic(key: &str) -> NebulaResult<&'static IonDefinition> {
    find(TEMPERATURE_DIAGNOSTICS, key, "temperature diagnostic")
}

pub fn recombination_line(key: &str) -> NebulaResult<&'static IonDefinition> {
    find(RECOMBINATION_LINES, key, "recombination line")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_cardinality() {
        for ion in DENSITY_DIAGNOSTICS
            .iter()
            .chain(TEMPERATURE_DIAGNOSTICS)
            .chain(RECOMBINATION_LINES)
        {
            ion.validate().unwrap();
        }
        assert!(DENSITY_DIAGNOSTICS.iter().all(|i| i.transitions.len() == 2));
        assert!(TEMPERATURE_DIAGNOSTICS.iter().all(|i| i.transitions.len() == 3));
    }

    #[test]
    fn test_same_key_in_two_tables() {
        let den = density_diagnostic("OIII").unwrap();
        let tem = temperature_diagnostic("OIII").unwrap();
        assert_eq!(den.diagnostic, Some(DiagnosticClass::DensitySensitive));
        assert_eq!(tem.transitions[2], Transition::Wavelength(4363.0));
    }

    #[test]
    fn test_unknown_ion() {
        match density_diagnostic("FeIII") {
            Err(NebulaError::UnknownIon(msg)) => assert!(msg.contains("FeIII")),
            other => panic!("Expected UnknownIon, got {other:?}"),
        }
        assert!(temperature_diagnostic("SII").is_err());
        assert!(recombination_line("HeII").is_err());
    }

    #[test]
    fn test_wrong_cardinality_rejected() {
        let bad = IonDefinition {
            transitions: &[W(5007.0), W(4959.0)],
            ..temperature_diagnostic("OIII").unwrap().clone()
        };
        assert!(matches!(bad.validate(), Err(NebulaError::ConfigError(_))));
    }

    #[test]
    fn test_default_ratios() {
        let v = [3.0, 1.0, 2.0];
        assert_eq!(DiagnosticClass::DensitySensitive.default_ratio(&v), 3.0);
        assert_eq!(DiagnosticClass::TemperatureSensitive.default_ratio(&v), 2.0);
    }

    #[test]
    fn test_density_grid() {
        let sii = density_diagnostic("SII").unwrap();
        let grid = sii.density_grid(25).unwrap();
        assert_eq!(grid.len(), 25);
        assert!((grid[0] - 10.0).abs() < 1e-9);
        assert!((grid[24] - 1e4).abs() < 1e-6);
        assert!((grid[12] - 10f64.powf(2.5)).abs() < 1e-6);
        assert!(temperature_diagnostic("NII").unwrap().density_grid(5).is_err());
    }

    #[test]
    fn test_transition_lookup() {
        let orl = recombination_line("OII").unwrap();
        assert_eq!(orl.position(&L("4649.13")).unwrap(), 3);
        assert!(orl.position(&H_BETA).is_err());
        assert_eq!(L("4089.29").to_string(), "4089.29");
    }
}
