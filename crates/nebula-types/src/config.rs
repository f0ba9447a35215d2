// ─────────────────────────────────────────────────────────────────────
// Nebulous — Config
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
use crate::constants::{DEFAULT_KERNEL, DEFAULT_MIN_DEPTH};
use crate::error::{NebulaError, NebulaResult};
use crate::state::CubeDim;
use serde::{Deserialize, Serialize};

/// Top-level experiment configuration, one JSON file per run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperimentConfig {
    #[serde(default)]
    pub geometry: GeometryConfig,
    #[serde(default)]
    pub smoothing: SmoothingConfig,
    /// Lines of sight at most this deep are left out of the statistics.
    #[serde(default = "default_min_depth")]
    pub min_depth: usize,
    pub distribution: FieldDistribution,
    /// Overrides the distribution family's default seed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

/// Spherical-shell nebula geometry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeometryConfig {
    /// One extent (isotropic) or three.
    #[serde(default = "default_dim")]
    pub dim: Vec<usize>,
    /// Fractional inner radius (default: 0.3)
    #[serde(default = "default_in_rad")]
    pub in_rad: f64,
    /// Fractional outer radius (default: 0.9)
    #[serde(default = "default_out_rad")]
    pub out_rad: f64,
    /// Axis whose half-extent the radii are relative to.
    #[serde(default)]
    pub axis: usize,
}

/// Gaussian smoothing of sky maps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmoothingConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Standard deviation in cells (default: 1.0)
    #[serde(default = "default_kernel")]
    pub kernel: f64,
}

/// Probability model for a sampled field.
///
/// `Normal::sigma` is a fraction of the mean, so one configuration serves a
/// whole sweep over mean values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "family", rename_all = "lowercase")]
pub enum FieldDistribution {
    Exponential,
    Lognormal { sigma: f64 },
    Pareto { sigma: f64, c: f64 },
    Mlp { sigma: f64, alpha: f64 },
    Beta { alpha: f64, beta: f64 },
    Normal { sigma: f64 },
}

fn default_dim() -> Vec<usize> {
    vec![30]
}
fn default_in_rad() -> f64 {
    0.3
}
fn default_out_rad() -> f64 {
    0.9
}
fn default_true() -> bool {
    true
}
fn default_kernel() -> f64 {
    DEFAULT_KERNEL
}
fn default_min_depth() -> usize {
    DEFAULT_MIN_DEPTH
}

impl Default for GeometryConfig {
    fn default() -> Self {
        GeometryConfig {
            dim: default_dim(),
            in_rad: default_in_rad(),
            out_rad: default_out_rad(),
            axis: 0,
        }
    }
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        SmoothingConfig {
            enabled: true,
            kernel: DEFAULT_KERNEL,
        }
    }
}

impl GeometryConfig {
    pub fn cube_dim(&self) -> NebulaResult<CubeDim> {
        CubeDim::from_slice(&self.dim)
    }

    pub fn validate(&self) -> NebulaResult<()> {
        self.cube_dim()?;
        if self.axis > 2 {
            return Err(NebulaError::ConfigError(format!(
                "geometry axis must be 0, 1 or 2, got {}",
                self.axis
            )));
        }
        for (name, r) in [("in_rad", self.in_rad), ("out_rad", self.out_rad)] {
            if !r.is_finite() || r < 0.0 {
                return Err(NebulaError::ConfigError(format!(
                    "geometry {name} must be finite and >= 0, got {r}"
                )));
            }
        }
        Ok(())
    }
}

impl SmoothingConfig {
    /// Kernel width when smoothing is on.
    pub fn kernel(&self) -> Option<f64> {
        self.enabled.then_some(self.kernel)
    }

    pub fn validate(&self) -> NebulaResult<()> {
        if self.enabled && (!self.kernel.is_finite() || self.kernel <= 0.0) {
            return Err(NebulaError::ConfigError(format!(
                "smoothing kernel must be finite and > 0, got {}",
                self.kernel
            )));
        }
        Ok(())
    }
}

impl FieldDistribution {
    /// Family name used to key output tables.
    pub fn name(&self) -> &'static str {
        match self {
            FieldDistribution::Exponential => "exponential",
            FieldDistribution::Lognormal { .. } => "lognormal",
            FieldDistribution::Pareto { .. } => "pareto",
            FieldDistribution::Mlp { .. } => "mlp",
            FieldDistribution::Beta { .. } => "beta",
            FieldDistribution::Normal { .. } => "normal",
        }
    }

    /// Shape parameters as (name, value) pairs.
    pub fn params(&self) -> Vec<(&'static str, f64)> {
        match *self {
            FieldDistribution::Exponential => Vec::new(),
            FieldDistribution::Lognormal { sigma } => vec![("sigma", sigma)],
            FieldDistribution::Pareto { sigma, c } => vec![("sigma", sigma), ("c", c)],
            FieldDistribution::Mlp { sigma, alpha } => vec![("sigma", sigma), ("alpha", alpha)],
            FieldDistribution::Beta { alpha, beta } => vec![("alpha", alpha), ("beta", beta)],
            FieldDistribution::Normal { sigma } => vec![("sigma", sigma)],
        }
    }

    /// Historical per-family seed, used when a run does not set one.
    pub fn default_seed(&self) -> u64 {
        match self {
            FieldDistribution::Exponential => 1000,
            FieldDistribution::Lognormal { .. } => 5007,
            FieldDistribution::Pareto { .. } => 7007,
            FieldDistribution::Mlp { .. } => 3923,
            FieldDistribution::Beta { .. } => 82921,
            FieldDistribution::Normal { .. } => 8938,
        }
    }

    /// Label such as `lognormal_sigma_08` for naming result sets.
    pub fn label(&self) -> String {
        let mut label = self.name().to_string();
        for (key, value) in self.params() {
            label.push_str(&format!("_{key}_{}", value.to_string().replace('.', "")));
        }
        label
    }
}

impl ExperimentConfig {
    /// Load from a JSON file.
    pub fn from_file(path: &str) -> NebulaResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> NebulaResult<()> {
        self.geometry.validate()?;
        self.smoothing.validate()
    }

    pub fn seed(&self) -> u64 {
        self.seed.unwrap_or_else(|| self.distribution.default_seed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn config_path(name: &str) -> String {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("..")
            .join("..")
            .join("configs")
            .join(name)
            .to_string_lossy()
            .to_string()
    }

    #[test]
    fn test_load_density_config() {
        let cfg = ExperimentConfig::from_file(&config_path("den_ff_lognormal.json")).unwrap();
        assert_eq!(cfg.geometry.dim, vec![30, 30, 30]);
        assert!((cfg.geometry.in_rad - 0.3).abs() < 1e-12);
        assert_eq!(cfg.distribution, FieldDistribution::Lognormal { sigma: 0.8 });
        assert_eq!(cfg.min_depth, 5);
        assert_eq!(cfg.seed(), 5007);
        assert_eq!(cfg.smoothing.kernel(), Some(1.0));
    }

    #[test]
    fn test_load_all_configs() {
        for name in [
            "den_ff_lognormal.json",
            "den_adf_mlp.json",
            "tem_adf_normal.json",
            "den_tem_polytrope.json",
        ] {
            let path = config_path(name);
            let result = ExperimentConfig::from_file(&path);
            assert!(result.is_ok(), "Failed to load config {path}: {result:?}");
        }
    }

    #[test]
    fn test_defaults_fill_missing_sections() {
        let cfg: ExperimentConfig =
            serde_json::from_str(r#"{"distribution": {"family": "exponential"}}"#).unwrap();
        assert_eq!(cfg.geometry.dim, vec![30]);
        assert!((cfg.geometry.out_rad - 0.9).abs() < 1e-12);
        assert!(cfg.smoothing.enabled);
        assert_eq!(cfg.seed(), 1000);
        assert_eq!(cfg.geometry.cube_dim().unwrap(), CubeDim::cubic(30));
    }

    #[test]
    fn test_explicit_seed_overrides_family_default() {
        let cfg: ExperimentConfig = serde_json::from_str(
            r#"{"distribution": {"family": "mlp", "sigma": 0.3, "alpha": 1.5}, "seed": 11}"#,
        )
        .unwrap();
        assert_eq!(cfg.seed(), 11);
    }

    #[test]
    fn test_invalid_kernel_rejected() {
        let cfg: ExperimentConfig = serde_json::from_str(
            r#"{"distribution": {"family": "exponential"}, "smoothing": {"kernel": 0.0}}"#,
        )
        .unwrap();
        match cfg.validate() {
            Err(NebulaError::ConfigError(msg)) => assert!(msg.contains("kernel")),
            other => panic!("Expected ConfigError, got {other:?}"),
        }
    }

    #[test]
    fn test_disabled_smoothing_has_no_kernel() {
        let smoothing = SmoothingConfig {
            enabled: false,
            kernel: -1.0,
        };
        assert!(smoothing.validate().is_ok());
        assert_eq!(smoothing.kernel(), None);
    }

    #[test]
    fn test_distribution_label() {
        let dist = FieldDistribution::Mlp {
            sigma: 0.3,
            alpha: 1.5,
        };
        assert_eq!(dist.label(), "mlp_sigma_03_alpha_15");
        assert_eq!(FieldDistribution::Exponential.label(), "exponential");
    }

    #[test]
    fn test_roundtrip_serialization() {
        let cfg = ExperimentConfig::from_file(&config_path("den_adf_mlp.json")).unwrap();
        let json = serde_json::to_string_pretty(&cfg).unwrap();
        let cfg2: ExperimentConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(cfg.distribution, cfg2.distribution);
        assert_eq!(cfg.geometry.dim, cfg2.geometry.dim);
        assert_eq!(cfg.min_depth, cfg2.min_depth);
    }
}
