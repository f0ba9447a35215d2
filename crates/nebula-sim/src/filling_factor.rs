// ─────────────────────────────────────────────────────────────────────
// Nebulous — Filling Factor
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Emission-measure density against line-ratio density.
//!
//! Each step compares √(EM/depth) with the CEL doublet density on the same
//! sight lines; the ratio of the two is the filling-factor signal.

use crate::nebula::Nebula;
use crate::sweep::{
    check_grid, linspace, masked_ratio, FieldModel, DENSITY_GRID_POINTS, TEMPERATURE_GRID_POINTS,
    TEMPERATURE_SWEEP,
};
use crate::table::{StatsRow, StatsTable};
use nebula_diagnostics::atomic::AtomicData;
use nebula_diagnostics::balmer::{balmer_jump_emissivity, balmer_jump_intensity, BalmerJump};
use nebula_diagnostics::emission_measure::{
    density_from_emission_measure, emission_measure, EmissionMeasureOptions,
};
use nebula_diagnostics::emissivity::{forward_model, EmissivityInputs};
use nebula_diagnostics::ion::{recombination_line, IonDefinition};
use nebula_diagnostics::line_ratio::{invert_line_ratio, DiagnosticMap, InversionOptions};
use nebula_types::config::ExperimentConfig;
use nebula_types::constants::{DEFAULT_DENSITY_CM3, DEFAULT_TEMPERATURE_K};
use nebula_types::error::NebulaResult;
use nebula_types::state::{Cube, SkyValue, VolumeField};
use tracing::info;

/// Density sweep at a fixed temperature.
#[derive(Debug, Clone)]
pub struct DensitySweep<'a> {
    /// Density-sensitive CEL.
    pub ion: &'a IonDefinition,
    pub field: FieldModel,
    pub temperature: f64,
    pub densities: Vec<f64>,
}

impl<'a> DensitySweep<'a> {
    /// Sampled density over the ion's density range at 10⁴ K.
    pub fn from_config(config: &ExperimentConfig, ion: &'a IonDefinition) -> NebulaResult<Self> {
        Ok(DensitySweep {
            ion,
            field: FieldModel::from_config(config),
            temperature: DEFAULT_TEMPERATURE_K,
            densities: ion.density_grid(DENSITY_GRID_POINTS)?,
        })
    }
}

/// Temperature sweep at a fixed density.
#[derive(Debug, Clone)]
pub struct TemperatureSweep<'a> {
    /// Density-sensitive CEL, inverted at the CEL temperature.
    pub density_ion: &'a IonDefinition,
    /// Temperature-sensitive CEL.
    pub temperature_ion: &'a IonDefinition,
    pub field: FieldModel,
    pub density: f64,
    pub temperatures: Vec<f64>,
}

impl<'a> TemperatureSweep<'a> {
    pub fn from_config(
        config: &ExperimentConfig,
        density_ion: &'a IonDefinition,
        temperature_ion: &'a IonDefinition,
    ) -> Self {
        let (lo, hi) = TEMPERATURE_SWEEP;
        TemperatureSweep {
            density_ion,
            temperature_ion,
            field: FieldModel::from_config(config),
            density: DEFAULT_DENSITY_CM3,
            temperatures: linspace(lo, hi, TEMPERATURE_GRID_POINTS),
        }
    }
}

/// CEL line-ratio map over the nebula's line of sight.
pub(crate) fn invert<A: AtomicData + ?Sized>(
    atomic: &A,
    nebula: &Nebula,
    ion: &IonDefinition,
    inputs: &EmissivityInputs<'_>,
    known: SkyValue<'_>,
) -> NebulaResult<DiagnosticMap> {
    let sky = forward_model(atomic, ion, inputs, nebula.smoothing)?;
    let options = InversionOptions {
        line_of_sight: Some(&nebula.line_of_sight),
        combiner: None,
    };
    invert_line_ratio(atomic, ion, &sky, Some(known), options)
}

/// Balmer-jump temperature map of a nebula at one density.
pub(crate) fn balmer_temperature<A: AtomicData + ?Sized>(
    atomic: &A,
    nebula: &Nebula,
    calibration: &BalmerJump,
    temperature: &Cube,
    inputs: &EmissivityInputs<'_>,
) -> NebulaResult<DiagnosticMap> {
    let hydrogen = recombination_line("BJ")?;
    let reference = forward_model(atomic, hydrogen, inputs, nebula.smoothing)?;
    let jump = balmer_jump_emissivity(
        VolumeField::Cube(temperature),
        inputs.electron_density,
        Some(&nebula.cells),
    )?;
    let jump_sky = balmer_jump_intensity(&jump, nebula.smoothing)?;
    calibration.temperature(&jump_sky, reference.first()?, Some(&nebula.line_of_sight))
}

/// Density filling factor over `sweep.densities`.
///
/// Columns: `CEL_den_*`, `EM_den_*`, `ratio_*` (EM / CEL), `den`.
pub fn density_filling_factor<A: AtomicData + ?Sized>(
    atomic: &A,
    nebula: &Nebula,
    sweep: &DensitySweep<'_>,
) -> NebulaResult<StatsTable> {
    check_grid("density", &sweep.densities)?;
    let los = &nebula.line_of_sight;
    let mut table = StatsTable::new();

    for &den in &sweep.densities {
        let n_e = sweep.field.build(nebula, den)?;
        let em_options = EmissionMeasureOptions {
            smoothing: nebula.smoothing,
            ..Default::default()
        };
        let em = emission_measure(VolumeField::Cube(&n_e), &em_options)?;
        let em_den = density_from_emission_measure(&em, &nebula.depth, nebula.min_depth)?;

        let inputs = EmissivityInputs::new(sweep.temperature, &n_e).with_active_cells(&nebula.cells);
        let cel = invert(atomic, nebula, sweep.ion, &inputs, SkyValue::Uniform(sweep.temperature))?;
        let ratio = masked_ratio(&em_den, &cel.values, los);

        let mut row = StatsRow::new();
        row.summarize("CEL_den", &cel.values, los)?
            .summarize("EM_den", &em_den, los)?
            .summarize("ratio", &ratio, los)?
            .set("den", den);
        info!(
            ion = sweep.ion.key,
            field = %sweep.field.label(),
            den,
            ratio = row.get("ratio_avg").unwrap_or(f64::NAN),
            "density filling factor"
        );
        table.push(row);
    }
    Ok(table)
}

/// Temperature filling factor over `sweep.temperatures`.
///
/// The EM density uses the Balmer-jump temperature as sky temperature.
/// Columns: `CEL_den_*`, `EM_den_*`, `ratio_*`, `CEL_tem_*`, `BJ_tem_*`,
/// `tem`.
pub fn temperature_filling_factor<A: AtomicData + ?Sized>(
    atomic: &A,
    nebula: &Nebula,
    sweep: &TemperatureSweep<'_>,
) -> NebulaResult<StatsTable> {
    check_grid("temperature", &sweep.temperatures)?;
    let los = &nebula.line_of_sight;
    let calibration = BalmerJump::calibrate(atomic, SkyValue::Uniform(sweep.density))?;
    let mut table = StatsTable::new();

    for &tem in &sweep.temperatures {
        let t_field = sweep.field.build(nebula, tem)?;
        let inputs = EmissivityInputs::new(&t_field, sweep.density).with_active_cells(&nebula.cells);

        let cel_tem = invert(
            atomic,
            nebula,
            sweep.temperature_ion,
            &inputs,
            SkyValue::Uniform(sweep.density),
        )?;
        let cel_den = invert(
            atomic,
            nebula,
            sweep.density_ion,
            &inputs,
            SkyValue::Map(&cel_tem.values),
        )?;
        let bj_tem = balmer_temperature(atomic, nebula, &calibration, &t_field, &inputs)?;

        let em_options = EmissionMeasureOptions {
            temperature: Some(&t_field),
            sky_temperature: Some(SkyValue::Map(&bj_tem.values)),
            depth: Some(&nebula.depth),
            smoothing: nebula.smoothing,
            ..Default::default()
        };
        let em = emission_measure(VolumeField::Uniform(sweep.density), &em_options)?;
        let em_den = density_from_emission_measure(&em, &nebula.depth, nebula.min_depth)?;
        let ratio = masked_ratio(&em_den, &cel_den.values, los);

        let mut row = StatsRow::new();
        row.summarize("CEL_den", &cel_den.values, los)?
            .summarize("EM_den", &em_den, los)?
            .summarize("ratio", &ratio, los)?
            .summarize("CEL_tem", &cel_tem.values, los)?
            .summarize("BJ_tem", &bj_tem.values, los)?
            .set("tem", tem);
        info!(
            density_ion = sweep.density_ion.key,
            temperature_ion = sweep.temperature_ion.key,
            tem,
            bj_tem = row.get("BJ_tem_avg").unwrap_or(f64::NAN),
            "temperature filling factor"
        );
        table.push(row);
    }
    Ok(table)
}
