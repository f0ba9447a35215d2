// ─────────────────────────────────────────────────────────────────────
// Nebulous — Correlated Density and Temperature
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Filling factor and ADF on a nebula whose temperature follows its density,
//! T ∝ n_e^(γ−1).
//!
//! The density field is drawn once; each step derives a polytropic
//! temperature from it. The CEL temperature is read at the mean density and
//! the CEL density at the CEL temperature map, as an observer would.

use crate::adf::{first_line_abundance, h_beta_sky, orl_abundance, record_orl};
use crate::filling_factor::{balmer_temperature, invert};
use crate::nebula::Nebula;
use crate::sweep::{check_grid, linspace, masked_ratio, FieldModel, POLYTROPE_INDICES};
use crate::table::{StatsRow, StatsTable};
use crate::temperature_bias::polytropic_temperature;
use nebula_core::pdf::PolytropeMean;
use nebula_diagnostics::atomic::AtomicData;
use nebula_diagnostics::balmer::BalmerJump;
use nebula_diagnostics::emission_measure::{
    density_from_emission_measure, emission_measure, EmissionMeasureOptions,
};
use nebula_diagnostics::emissivity::EmissivityInputs;
use nebula_diagnostics::ion::{recombination_line, IonDefinition};
use nebula_diagnostics::line_ratio::DiagnosticMap;
use nebula_types::config::ExperimentConfig;
use nebula_types::constants::{DEFAULT_DENSITY_CM3, DEFAULT_TEMPERATURE_K};
use nebula_types::error::{NebulaError, NebulaResult};
use nebula_types::state::{Cube, SkyValue, VolumeField};
use tracing::info;

/// Points in a correlated ADF index sweep.
pub const CORRELATED_ADF_INDEX_POINTS: usize = 50;

/// Mean temperature of a correlated ADF sweep [K].
pub const CORRELATED_ADF_TEMPERATURE_K: f64 = 8.0e3;

/// Polytropic-index sweep over one sampled density field.
#[derive(Debug, Clone)]
pub struct CorrelatedSweep<'a> {
    /// Density-sensitive CEL.
    pub density_ion: &'a IonDefinition,
    /// Temperature-sensitive CEL.
    pub temperature_ion: &'a IonDefinition,
    /// Density field; the temperature follows it.
    pub field: FieldModel,
    pub density_mean: f64,
    pub temperature_mean: f64,
    pub weighting: PolytropeMean,
    pub indices: Vec<f64>,
}

impl<'a> CorrelatedSweep<'a> {
    /// Indices 0–2 at 10³ cm⁻³ and 10⁴ K, density-weighted temperature mean.
    pub fn from_config(
        config: &ExperimentConfig,
        density_ion: &'a IonDefinition,
        temperature_ion: &'a IonDefinition,
    ) -> Self {
        let (lo, hi, n) = POLYTROPE_INDICES;
        CorrelatedSweep {
            density_ion,
            temperature_ion,
            field: FieldModel::from_config(config),
            density_mean: DEFAULT_DENSITY_CM3,
            temperature_mean: DEFAULT_TEMPERATURE_K,
            weighting: PolytropeMean::Weighted,
            indices: linspace(lo, hi, n),
        }
    }
}

/// Correlated sweep plus the recombination lines for the ADF.
#[derive(Debug, Clone)]
pub struct CorrelatedAdfSweep<'a> {
    pub base: CorrelatedSweep<'a>,
    pub orl: &'a IonDefinition,
}

impl<'a> CorrelatedAdfSweep<'a> {
    /// OII recombination lines, 50 indices at 8000 K.
    pub fn from_config(
        config: &ExperimentConfig,
        density_ion: &'a IonDefinition,
        temperature_ion: &'a IonDefinition,
    ) -> NebulaResult<Self> {
        let (lo, hi, _) = POLYTROPE_INDICES;
        let base = CorrelatedSweep {
            temperature_mean: CORRELATED_ADF_TEMPERATURE_K,
            indices: linspace(lo, hi, CORRELATED_ADF_INDEX_POINTS),
            ..CorrelatedSweep::from_config(config, density_ion, temperature_ion)
        };
        Ok(CorrelatedAdfSweep {
            base,
            orl: recombination_line("OII")?,
        })
    }
}

/// One polytropic step: the model fields and the CEL readings.
struct Step {
    temperature: Cube,
    cel_tem: DiagnosticMap,
    cel_den: DiagnosticMap,
    bj_tem: DiagnosticMap,
}

fn check_indices(indices: &[f64]) -> NebulaResult<()> {
    if indices.is_empty() {
        return Err(NebulaError::ConfigError("polytropic index sweep is empty".to_string()));
    }
    if let Some(bad) = indices.iter().find(|g| !g.is_finite()) {
        return Err(NebulaError::InvalidParameter(format!(
            "polytropic index must be finite, got {bad}"
        )));
    }
    Ok(())
}

fn observe<A: AtomicData + ?Sized>(
    atomic: &A,
    nebula: &Nebula,
    sweep: &CorrelatedSweep<'_>,
    calibration: &BalmerJump,
    n_e: &Cube,
    gamma: f64,
) -> NebulaResult<Step> {
    let temperature =
        polytropic_temperature(nebula, n_e, gamma, sweep.temperature_mean, sweep.weighting)?;
    let inputs = EmissivityInputs::new(&temperature, n_e).with_active_cells(&nebula.cells);
    let cel_tem = invert(
        atomic,
        nebula,
        sweep.temperature_ion,
        &inputs,
        SkyValue::Uniform(sweep.density_mean),
    )?;
    let cel_den = invert(
        atomic,
        nebula,
        sweep.density_ion,
        &inputs,
        SkyValue::Map(&cel_tem.values),
    )?;
    let bj_tem = balmer_temperature(atomic, nebula, calibration, &temperature, &inputs)?;
    Ok(Step {
        temperature,
        cel_tem,
        cel_den,
        bj_tem,
    })
}

/// Filling factor for each polytropic index.
///
/// The EM density uses the Balmer-jump temperature as sky temperature.
/// Columns: `BJ_tem_*`, `CEL_den_*`, `CEL_tem_*`, `EM_den_*`, `ratio_*`,
/// `gamma`.
pub fn correlated_filling_factor<A: AtomicData + ?Sized>(
    atomic: &A,
    nebula: &Nebula,
    sweep: &CorrelatedSweep<'_>,
) -> NebulaResult<StatsTable> {
    check_indices(&sweep.indices)?;
    check_grid("mean", &[sweep.density_mean, sweep.temperature_mean])?;
    let los = &nebula.line_of_sight;
    let n_e = sweep.field.build(nebula, sweep.density_mean)?;
    let calibration = BalmerJump::calibrate(atomic, SkyValue::Uniform(sweep.density_mean))?;
    let mut table = StatsTable::new();

    for &gamma in &sweep.indices {
        let step = observe(atomic, nebula, sweep, &calibration, &n_e, gamma)?;
        let em_options = EmissionMeasureOptions {
            temperature: Some(&step.temperature),
            sky_temperature: Some(SkyValue::Map(&step.bj_tem.values)),
            depth: Some(&nebula.depth),
            smoothing: nebula.smoothing,
            ..Default::default()
        };
        let em = emission_measure(VolumeField::Cube(&n_e), &em_options)?;
        let em_den = density_from_emission_measure(&em, &nebula.depth, nebula.min_depth)?;
        let ratio = masked_ratio(&em_den, &step.cel_den.values, los);

        let mut row = StatsRow::new();
        row.summarize("BJ_tem", &step.bj_tem.values, los)?
            .summarize("CEL_den", &step.cel_den.values, los)?
            .summarize("CEL_tem", &step.cel_tem.values, los)?
            .summarize("EM_den", &em_den, los)?
            .summarize("ratio", &ratio, los)?
            .set("gamma", gamma);
        info!(
            density_ion = sweep.density_ion.key,
            temperature_ion = sweep.temperature_ion.key,
            field = %sweep.field.label(),
            gamma,
            ratio = row.get("ratio_avg").unwrap_or(f64::NAN),
            "correlated filling factor"
        );
        table.push(row);
    }
    Ok(table)
}

/// ORL / CEL abundance discrepancy for each polytropic index.
///
/// CEL abundances come from the first line of each CEL ion at the CEL
/// temperature and density; ORL abundances use the Balmer-jump temperature
/// and the CEL density. Columns: `CEL_den_abd_*`, `CEL_tem_abd_*`,
/// `BJ_tem_*`, `CEL_tem_*`, `CEL_den_*`, `ORL_abd_*_<tag>`,
/// `ADF_den_*_<tag>`, `ADF_tem_*_<tag>`, `gamma`.
pub fn correlated_adf<A: AtomicData + ?Sized>(
    atomic: &A,
    nebula: &Nebula,
    sweep: &CorrelatedAdfSweep<'_>,
) -> NebulaResult<StatsTable> {
    let base = &sweep.base;
    check_indices(&base.indices)?;
    check_grid("mean", &[base.density_mean, base.temperature_mean])?;
    let los = &nebula.line_of_sight;
    let n_e = base.field.build(nebula, base.density_mean)?;
    let calibration = BalmerJump::calibrate(atomic, SkyValue::Uniform(base.density_mean))?;
    let mut table = StatsTable::new();

    for &gamma in &base.indices {
        let step = observe(atomic, nebula, base, &calibration, &n_e, gamma)?;
        let inputs = EmissivityInputs::new(&step.temperature, &n_e).with_active_cells(&nebula.cells);
        let h_beta = h_beta_sky(atomic, nebula, &inputs)?;
        let cel_t = SkyValue::Map(&step.cel_tem.values);
        let cel_n = SkyValue::Map(&step.cel_den.values);

        let abd_den =
            first_line_abundance(atomic, nebula, base.density_ion, &inputs, cel_t, cel_n, &h_beta)?;
        let abd_tem =
            first_line_abundance(atomic, nebula, base.temperature_ion, &inputs, cel_t, cel_n, &h_beta)?;
        let orl_abd = orl_abundance(
            atomic,
            nebula,
            sweep.orl,
            &inputs,
            SkyValue::Map(&step.bj_tem.values),
            cel_n,
            &h_beta,
        )?;

        let mut row = StatsRow::new();
        row.summarize("CEL_den_abd", &abd_den, los)?
            .summarize("CEL_tem_abd", &abd_tem, los)?
            .summarize("BJ_tem", &step.bj_tem.values, los)?
            .summarize("CEL_tem", &step.cel_tem.values, los)?
            .summarize("CEL_den", &step.cel_den.values, los)?;
        record_orl(
            &mut row,
            nebula,
            &orl_abd,
            &[("ADF_den", &abd_den), ("ADF_tem", &abd_tem)],
        )?;
        row.set("gamma", gamma);
        info!(
            density_ion = base.density_ion.key,
            temperature_ion = base.temperature_ion.key,
            orl = sweep.orl.key,
            gamma,
            "correlated ADF"
        );
        table.push(row);
    }
    Ok(table)
}
