//! Temperature measured on a polytropic nebula, T ∝ n_e^(γ−1).

use crate::filling_factor::{balmer_temperature, invert};
use crate::nebula::Nebula;
use crate::sweep::{linspace, FieldModel, POLYTROPE_INDICES};
use crate::table::{StatsRow, StatsTable};
use nebula_core::pdf::{polytrope, PolytropeMean};
use nebula_diagnostics::atomic::AtomicData;
use nebula_diagnostics::balmer::BalmerJump;
use nebula_diagnostics::emissivity::EmissivityInputs;
use nebula_diagnostics::ion::IonDefinition;
use nebula_types::config::ExperimentConfig;
use nebula_types::constants::{DEFAULT_DENSITY_CM3, DEFAULT_TEMPERATURE_K};
use nebula_types::error::{NebulaError, NebulaResult};
use nebula_types::state::{Cube, SkyValue};
use tracing::info;

/// The instrument reading the temperature.
#[derive(Debug, Clone, Copy)]
pub enum Thermometer<'a> {
    /// Temperature-sensitive CEL triplet, inverted at the mean density.
    LineRatio(&'a IonDefinition),
    /// Balmer jump calibrated at the mean density.
    BalmerJump,
}

impl Thermometer<'_> {
    pub fn name(&self) -> &'static str {
        match self {
            Thermometer::LineRatio(ion) => ion.key,
            Thermometer::BalmerJump => "BJ",
        }
    }
}

#[derive(Debug, Clone)]
pub struct PolytropeSweep<'a> {
    pub thermometer: Thermometer<'a>,
    /// Density field; the temperature follows it.
    pub field: FieldModel,
    pub density_mean: f64,
    pub temperature_mean: f64,
    pub weighting: PolytropeMean,
    pub indices: Vec<f64>,
}

impl<'a> PolytropeSweep<'a> {
    pub fn from_config(config: &ExperimentConfig, thermometer: Thermometer<'a>) -> Self {
        let (lo, hi, n) = POLYTROPE_INDICES;
        PolytropeSweep {
            thermometer,
            field: FieldModel::from_config(config),
            density_mean: DEFAULT_DENSITY_CM3,
            temperature_mean: DEFAULT_TEMPERATURE_K,
            weighting: PolytropeMean::Weighted,
            indices: linspace(lo, hi, n),
        }
    }
}

/// Temperature following `n_e` with index `gamma`, normalised to `mean`
/// over the nebula's cells.
pub(crate) fn polytropic_temperature(
    nebula: &Nebula,
    n_e: &Cube,
    gamma: f64,
    mean: f64,
    weighting: PolytropeMean,
) -> NebulaResult<Cube> {
    polytrope(n_e, gamma, mean, weighting, Some(&nebula.cells))
}

/// Measured temperature for each polytropic index.
///
/// Columns: `tem_avg`, `tem_std`, `gamma`.
pub fn polytrope_temperature<A: AtomicData + ?Sized>(
    atomic: &A,
    nebula: &Nebula,
    sweep: &PolytropeSweep<'_>,
) -> NebulaResult<StatsTable> {
    if sweep.indices.is_empty() {
        return Err(NebulaError::ConfigError("polytropic index sweep is empty".to_string()));
    }
    let los = &nebula.line_of_sight;
    let n_e = sweep.field.build(nebula, sweep.density_mean)?;
    let calibration = match sweep.thermometer {
        Thermometer::BalmerJump => Some(BalmerJump::calibrate(
            atomic,
            SkyValue::Uniform(sweep.density_mean),
        )?),
        Thermometer::LineRatio(_) => None,
    };
    let mut table = StatsTable::new();

    for &gamma in &sweep.indices {
        let tem = polytropic_temperature(nebula, &n_e, gamma, sweep.temperature_mean, sweep.weighting)?;
        let inputs = EmissivityInputs::new(&tem, &n_e).with_active_cells(&nebula.cells);
        let measured = match (sweep.thermometer, &calibration) {
            (Thermometer::LineRatio(ion), _) => invert(
                atomic,
                nebula,
                ion,
                &inputs,
                SkyValue::Uniform(sweep.density_mean),
            )?,
            (Thermometer::BalmerJump, Some(bj)) => balmer_temperature(atomic, nebula, bj, &tem, &inputs)?,
            (Thermometer::BalmerJump, None) => {
                return Err(NebulaError::ConfigError(
                    "Balmer-jump thermometer is not calibrated".to_string(),
                ))
            }
        };

        let mut row = StatsRow::new();
        row.summarize("tem", &measured.values, los)?.set("gamma", gamma);
        info!(
            thermometer = sweep.thermometer.name(),
            gamma,
            tem = row.get("tem_avg").unwrap_or(f64::NAN),
            "polytropic temperature"
        );
        table.push(row);
    }
    Ok(table)
}
