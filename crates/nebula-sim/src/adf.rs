// ─────────────────────────────────────────────────────────────────────
// Nebulous — Abundance Discrepancy
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! ORL / CEL abundance discrepancy factor under density or temperature
//! fluctuations.
//!
//! The CEL abundance comes from the first line of one CEL ion; every ORL
//! line gives its own abundance and ADF column, tagged by its wavelength.

use crate::filling_factor::{balmer_temperature, invert};
use crate::nebula::Nebula;
use crate::sweep::{
    check_grid, linspace, masked_ratio, transition_tag, FieldModel, ADF_TEMPERATURE_GRID_POINTS,
    DENSITY_GRID_POINTS, TEMPERATURE_SWEEP,
};
use crate::table::{StatsRow, StatsTable};
use nebula_diagnostics::abundance::{ionic_abundance, AbundanceMaps};
use nebula_diagnostics::atomic::AtomicData;
use nebula_diagnostics::balmer::BalmerJump;
use nebula_diagnostics::emissivity::{forward_model, EmissivityInputs, SkyIntensity};
use nebula_diagnostics::ion::{recombination_line, IonDefinition, H_BETA};
use nebula_types::config::ExperimentConfig;
use nebula_types::constants::{DEFAULT_DENSITY_CM3, DEFAULT_TEMPERATURE_K};
use nebula_types::error::NebulaResult;
use nebula_types::state::{SkyMap, SkyValue};
use tracing::info;

/// Density-fluctuation ADF sweep at a fixed temperature.
#[derive(Debug, Clone)]
pub struct DensityAdfSweep<'a> {
    /// Density-sensitive CEL giving the density map.
    pub density_ion: &'a IonDefinition,
    /// CEL whose first line gives the CEL abundance.
    pub abundance_ion: &'a IonDefinition,
    /// Recombination lines giving the ORL abundances.
    pub orl: &'a IonDefinition,
    pub field: FieldModel,
    pub temperature: f64,
    pub densities: Vec<f64>,
}

impl<'a> DensityAdfSweep<'a> {
    /// Sweep over `density_ion`'s density range with the OII recombination
    /// lines, abundance from `abundance_ion` or else `density_ion`.
    pub fn from_config(
        config: &ExperimentConfig,
        density_ion: &'a IonDefinition,
        abundance_ion: Option<&'a IonDefinition>,
    ) -> NebulaResult<Self> {
        Ok(DensityAdfSweep {
            density_ion,
            abundance_ion: abundance_ion.unwrap_or(density_ion),
            orl: recombination_line("OII")?,
            field: FieldModel::from_config(config),
            temperature: DEFAULT_TEMPERATURE_K,
            densities: density_ion.density_grid(DENSITY_GRID_POINTS)?,
        })
    }
}

/// Temperature-fluctuation ADF sweep at a fixed density.
#[derive(Debug, Clone)]
pub struct TemperatureAdfSweep<'a> {
    /// Temperature-sensitive CEL giving the CEL temperature map.
    pub temperature_ion: &'a IonDefinition,
    /// CEL whose first line gives the CEL abundance.
    pub abundance_ion: &'a IonDefinition,
    /// Recombination lines, evaluated at the Balmer-jump temperature.
    pub orl: &'a IonDefinition,
    pub field: FieldModel,
    pub density: f64,
    pub temperatures: Vec<f64>,
}

impl<'a> TemperatureAdfSweep<'a> {
    pub fn from_config(
        config: &ExperimentConfig,
        temperature_ion: &'a IonDefinition,
        abundance_ion: Option<&'a IonDefinition>,
    ) -> NebulaResult<Self> {
        let (lo, hi) = TEMPERATURE_SWEEP;
        Ok(TemperatureAdfSweep {
            temperature_ion,
            abundance_ion: abundance_ion.unwrap_or(temperature_ion),
            orl: recombination_line("OII")?,
            field: FieldModel::from_config(config),
            density: DEFAULT_DENSITY_CM3,
            temperatures: linspace(lo, hi, ADF_TEMPERATURE_GRID_POINTS),
        })
    }
}

pub(crate) fn h_beta_sky<A: AtomicData + ?Sized>(
    atomic: &A,
    nebula: &Nebula,
    inputs: &EmissivityInputs<'_>,
) -> NebulaResult<SkyMap> {
    let hydrogen = recombination_line("HI")?;
    let sky = forward_model(atomic, hydrogen, inputs, nebula.smoothing)?;
    Ok(sky.map(&H_BETA)?.clone())
}

/// Abundance of `ion` from its first line only.
pub(crate) fn first_line_abundance<A: AtomicData + ?Sized>(
    atomic: &A,
    nebula: &Nebula,
    ion: &IonDefinition,
    inputs: &EmissivityInputs<'_>,
    temperature: SkyValue<'_>,
    density: SkyValue<'_>,
    h_beta: &SkyMap,
) -> NebulaResult<SkyMap> {
    let full = forward_model(atomic, ion, inputs, nebula.smoothing)?;
    let first = SkyIntensity {
        transitions: full.transitions.iter().take(1).copied().collect(),
        maps: vec![full.first()?.clone()],
    };
    let abundance = ionic_abundance(
        atomic,
        ion,
        &first,
        temperature,
        density,
        h_beta,
        Some(&nebula.line_of_sight),
    )?;
    Ok(abundance.maps.into_iter().next().unwrap_or_else(|| SkyMap::zeros(h_beta.dim())))
}

pub(crate) fn orl_abundance<A: AtomicData + ?Sized>(
    atomic: &A,
    nebula: &Nebula,
    ion: &IonDefinition,
    inputs: &EmissivityInputs<'_>,
    temperature: SkyValue<'_>,
    density: SkyValue<'_>,
    h_beta: &SkyMap,
) -> NebulaResult<AbundanceMaps> {
    let sky = forward_model(atomic, ion, inputs, nebula.smoothing)?;
    ionic_abundance(
        atomic,
        ion,
        &sky,
        temperature,
        density,
        h_beta,
        Some(&nebula.line_of_sight),
    )
}

/// `ORL_abd_*_<tag>` for every ORL line, plus `<stem>_*_<tag>` for the ORL
/// abundance over each CEL reference.
pub(crate) fn record_orl(
    row: &mut StatsRow,
    nebula: &Nebula,
    orl: &AbundanceMaps,
    references: &[(&str, &SkyMap)],
) -> NebulaResult<()> {
    let los = &nebula.line_of_sight;
    for (transition, map) in orl.transitions.iter().zip(&orl.maps) {
        let tag = transition_tag(transition);
        row.summarize_tagged("ORL_abd", &tag, map, los)?;
        for (stem, cel) in references {
            let adf = masked_ratio(map, cel, los);
            row.summarize_tagged(stem, &tag, &adf, los)?;
        }
    }
    Ok(())
}

/// ADF under density fluctuations.
///
/// Columns: `CEL_abd_*`, `ORL_abd_*_<tag>`, `ADF_*_<tag>`, `den`.
pub fn density_adf<A: AtomicData + ?Sized>(
    atomic: &A,
    nebula: &Nebula,
    sweep: &DensityAdfSweep<'_>,
) -> NebulaResult<StatsTable> {
    check_grid("density", &sweep.densities)?;
    let los = &nebula.line_of_sight;
    let temperature = SkyValue::Uniform(sweep.temperature);
    let mut table = StatsTable::new();

    for &den in &sweep.densities {
        let n_e = sweep.field.build(nebula, den)?;
        let inputs = EmissivityInputs::new(sweep.temperature, &n_e).with_active_cells(&nebula.cells);
        let h_beta = h_beta_sky(atomic, nebula, &inputs)?;

        let cel_den = invert(atomic, nebula, sweep.density_ion, &inputs, temperature)?;
        let density = SkyValue::Map(&cel_den.values);
        let cel_abd = first_line_abundance(
            atomic,
            nebula,
            sweep.abundance_ion,
            &inputs,
            temperature,
            density,
            &h_beta,
        )?;
        let orl_abd = orl_abundance(atomic, nebula, sweep.orl, &inputs, temperature, density, &h_beta)?;

        let mut row = StatsRow::new();
        row.summarize("CEL_abd", &cel_abd, los)?;
        record_orl(&mut row, nebula, &orl_abd, &[("ADF", &cel_abd)])?;
        row.set("den", den);
        info!(
            density_ion = sweep.density_ion.key,
            abundance_ion = sweep.abundance_ion.key,
            field = %sweep.field.label(),
            den,
            "density ADF"
        );
        table.push(row);
    }
    Ok(table)
}

/// ADF under temperature fluctuations. CEL abundances use the CEL
/// temperature, ORL abundances the Balmer-jump temperature.
///
/// Columns: `CEL_adf_*` (the CEL abundance), `CEL_tem_*`, `BJ_tem_*`,
/// `ORL_abd_*_<tag>`, `ADF_*_<tag>`, `tem`.
pub fn temperature_adf<A: AtomicData + ?Sized>(
    atomic: &A,
    nebula: &Nebula,
    sweep: &TemperatureAdfSweep<'_>,
) -> NebulaResult<StatsTable> {
    check_grid("temperature", &sweep.temperatures)?;
    let los = &nebula.line_of_sight;
    let density = SkyValue::Uniform(sweep.density);
    let calibration = BalmerJump::calibrate(atomic, density)?;
    let mut table = StatsTable::new();

    for &tem in &sweep.temperatures {
        let t_field = sweep.field.build(nebula, tem)?;
        let inputs = EmissivityInputs::new(&t_field, sweep.density).with_active_cells(&nebula.cells);
        let h_beta = h_beta_sky(atomic, nebula, &inputs)?;

        let cel_tem = invert(atomic, nebula, sweep.temperature_ion, &inputs, density)?;
        let cel_abd = first_line_abundance(
            atomic,
            nebula,
            sweep.abundance_ion,
            &inputs,
            SkyValue::Map(&cel_tem.values),
            density,
            &h_beta,
        )?;
        let bj_tem = balmer_temperature(atomic, nebula, &calibration, &t_field, &inputs)?;
        let orl_abd = orl_abundance(
            atomic,
            nebula,
            sweep.orl,
            &inputs,
            SkyValue::Map(&bj_tem.values),
            density,
            &h_beta,
        )?;

        let mut row = StatsRow::new();
        row.summarize("CEL_adf", &cel_abd, los)?
            .summarize("CEL_tem", &cel_tem.values, los)?
            .summarize("BJ_tem", &bj_tem.values, los)?;
        record_orl(&mut row, nebula, &orl_abd, &[("ADF", &cel_abd)])?;
        row.set("tem", tem);
        info!(
            temperature_ion = sweep.temperature_ion.key,
            abundance_ion = sweep.abundance_ion.key,
            field = %sweep.field.label(),
            tem,
            "temperature ADF"
        );
        table.push(row);
    }
    Ok(table)
}
