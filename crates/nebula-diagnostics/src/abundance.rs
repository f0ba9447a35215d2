//! Ionic abundances from line intensities relative to Hβ.

use crate::atomic::AtomicData;
use crate::emissivity::SkyIntensity;
use crate::ion::{IonDefinition, Transition};
use nebula_types::constants::HBETA_SCALE;
use nebula_types::error::{ensure_shape, NebulaResult};
use nebula_types::state::{SkyMap, SkyMask, SkyValue};
use tracing::debug;

/// One abundance map per transition, zero outside `line_of_sight`.
#[derive(Debug, Clone)]
pub struct AbundanceMaps {
    pub transitions: Vec<Transition>,
    pub maps: Vec<SkyMap>,
    pub line_of_sight: SkyMask,
}

/// Abundance of `ion` from each of its lines, evaluated at the given
/// temperature and density. Either may be a single value or a sky map.
/// The line of sight defaults to where Hβ is positive.
pub fn ionic_abundance<A: AtomicData + ?Sized>(
    atomic: &A,
    ion: &IonDefinition,
    sky: &SkyIntensity,
    temperature: SkyValue<'_>,
    density: SkyValue<'_>,
    h_beta: &SkyMap,
    line_of_sight: Option<&SkyMask>,
) -> NebulaResult<AbundanceMaps> {
    let shape = h_beta.dim();
    for map in &sky.maps {
        ensure_shape(h_beta.shape(), map.shape())?;
    }
    temperature.check_shape(shape)?;
    density.check_shape(shape)?;
    let line_of_sight = match line_of_sight {
        Some(mask) => {
            ensure_shape(h_beta.shape(), mask.shape())?;
            mask.clone()
        }
        None => h_beta.mapv(|v| v > 0.0),
    };

    let mut maps = Vec::with_capacity(sky.maps.len());
    for (transition, intensity) in sky.transitions.iter().zip(&sky.maps) {
        let mut abundance = SkyMap::zeros(shape);
        for (pos, _) in line_of_sight.indexed_iter().filter(|(_, m)| **m) {
            let ratio = HBETA_SCALE * intensity[pos] / h_beta[pos];
            abundance[pos] = atomic.ionic_abundance(
                ion,
                transition,
                ratio,
                temperature.at(pos),
                density.at(pos),
            )?;
        }
        maps.push(abundance);
    }

    debug!(
        ion = ion.key,
        lines = maps.len(),
        evaluated = line_of_sight.iter().filter(|m| **m).count(),
        "ionic abundance computed"
    );
    Ok(AbundanceMaps {
        transitions: sky.transitions.clone(),
        maps,
        line_of_sight,
    })
}
