// ─────────────────────────────────────────────────────────────────────
// Nebulous — Line-Ratio Inversion
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Density from a CEL doublet, temperature from a CEL triplet.

use crate::atomic::{AtomicData, KnownParameter};
use crate::emissivity::SkyIntensity;
use crate::ion::{Combiner, DiagnosticClass, IonDefinition};
use nebula_types::constants::{DEFAULT_DENSITY_CM3, DEFAULT_TEMPERATURE_K};
use nebula_types::error::{ensure_shape, NebulaError, NebulaResult};
use nebula_types::state::{SkyMap, SkyMask, SkyValue};
use tracing::{debug, warn};

/// What a [`DiagnosticMap`] holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quantity {
    Temperature,
    Density,
}

/// A temperature or density map; zero outside `line_of_sight`, NaN inside
/// wherever the atomic data could not invert the observed ratio.
#[derive(Debug, Clone)]
pub struct DiagnosticMap {
    pub quantity: Quantity,
    pub values: SkyMap,
    pub line_of_sight: SkyMask,
}

/// Optional overrides for [`invert_line_ratio`].
#[derive(Clone, Copy, Default)]
pub struct InversionOptions<'a> {
    /// Positions to evaluate; where the first transition is bright when absent.
    pub line_of_sight: Option<&'a SkyMask>,
    /// Ratio of the per-transition intensities; the diagnostic class
    /// default when absent.
    pub combiner: Option<&'a Combiner>,
}

impl std::fmt::Debug for InversionOptions<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InversionOptions")
            .field("line_of_sight", &self.line_of_sight.map(|m| m.dim()))
            .field("custom_combiner", &self.combiner.is_some())
            .finish()
    }
}

/// Invert the observed line ratio of `ion` on every line of sight.
///
/// `known` is the temperature for a density-sensitive ion and the density
/// for a temperature-sensitive one; 10⁴ K and 10³ cm⁻³ when absent.
pub fn invert_line_ratio<A: AtomicData + ?Sized>(
    atomic: &A,
    ion: &IonDefinition,
    sky: &SkyIntensity,
    known: Option<SkyValue<'_>>,
    options: InversionOptions<'_>,
) -> NebulaResult<DiagnosticMap> {
    ion.validate()?;
    let class = ion.diagnostic_class()?;
    if sky.maps.len() != ion.transitions.len() {
        return Err(NebulaError::ShapeMismatch {
            expected: vec![ion.transitions.len()],
            actual: vec![sky.maps.len()],
        });
    }
    let shape = sky.sky_shape()?;
    for map in &sky.maps {
        ensure_shape(&[shape.0, shape.1], map.shape())?;
    }

    let (quantity, known) = match class {
        DiagnosticClass::DensitySensitive => (
            Quantity::Density,
            known.unwrap_or(SkyValue::Uniform(DEFAULT_TEMPERATURE_K)),
        ),
        DiagnosticClass::TemperatureSensitive => (
            Quantity::Temperature,
            known.unwrap_or(SkyValue::Uniform(DEFAULT_DENSITY_CM3)),
        ),
    };
    known.check_shape(shape)?;

    let line_of_sight = match options.line_of_sight {
        Some(mask) => {
            ensure_shape(&[shape.0, shape.1], mask.shape())?;
            mask.clone()
        }
        None => sky.maps[0].mapv(|v| v > 0.0),
    };
    let default_combiner = move |v: &[f64]| class.default_ratio(v);
    let combiner: &Combiner = match options.combiner {
        Some(c) => c,
        None => &default_combiner,
    };

    let mut values = SkyMap::zeros(shape);
    let mut intensities = vec![0.0; sky.maps.len()];
    let mut evaluated = 0usize;
    for (pos, _) in line_of_sight.indexed_iter().filter(|(_, m)| **m) {
        for (slot, map) in intensities.iter_mut().zip(&sky.maps) {
            *slot = map[pos];
        }
        let param = match quantity {
            Quantity::Density => KnownParameter::Temperature(known.at(pos)),
            Quantity::Temperature => KnownParameter::Density(known.at(pos)),
        };
        values[pos] = atomic.invert_ratio(ion, combiner(&intensities), combiner, param)?;
        evaluated += 1;
    }

    if evaluated == 0 {
        warn!(ion = ion.key, "line-ratio inversion: empty line of sight");
    }
    let failed = values.iter().filter(|v| v.is_nan()).count();
    debug!(ion = ion.key, ?quantity, evaluated, failed, "line ratio inverted");
    Ok(DiagnosticMap {
        quantity,
        values,
        line_of_sight,
    })
}
