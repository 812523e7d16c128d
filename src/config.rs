//! TOML-based scenario configuration and preset definitions.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::plant::{PlantParams, WeatherParams};
use crate::sim::WeekBoundary;

/// Top-level scenario configuration parsed from TOML.
///
/// All fields have defaults matching the baseline scenario. Load from
/// TOML with [`ScenarioConfig::from_toml_file`] or use
/// [`ScenarioConfig::baseline`] for the built-in default.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioConfig {
    /// Seed and scheduling.
    #[serde(default)]
    pub simulation: SimulationConfig,
    /// Plant parameters for synthetic sites and for empty site table cells.
    #[serde(default)]
    pub plant: PlantParams,
    /// Fleet target and metric settings.
    #[serde(default)]
    pub fleet: FleetConfig,
    /// Input tables; synthetic inputs are generated when both are absent.
    #[serde(default)]
    pub inputs: InputsConfig,
    /// Synthetic fleet used without input tables.
    #[serde(default)]
    pub synthetic: SyntheticConfig,
}

/// Seed and scheduling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    /// Master random seed for synthetic weather.
    pub seed: u64,
    /// Simulate sites on a worker pool.
    pub parallel: bool,
    /// Worker count; 0 uses one per CPU.
    pub threads: usize,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            parallel: true,
            threads: 0,
        }
    }
}

/// Fleet target and metric settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FleetConfig {
    /// Explicit fleet target (GW). Derived from `reserve_margin` when unset.
    pub target_gw: Option<f64>,
    /// Overbuild of summed plant targets over the fleet target.
    pub reserve_margin: f64,
    /// Thresholds for availability; empty means target and 95 % of target.
    pub thresholds_gw: Vec<f64>,
    pub week_boundary: WeekBoundary,
    /// Simultaneous failures above which an hour counts as clustered.
    pub failure_cluster_size: usize,
    /// Fraction of a plant target that counts as "near target".
    pub near_target_fraction: f64,
    /// Regions compared by the failure correlation report.
    pub correlation_regions: Vec<String>,
}

impl Default for FleetConfig {
    fn default() -> Self {
        Self {
            target_gw: None,
            reserve_margin: 0.2,
            thresholds_gw: Vec::new(),
            week_boundary: WeekBoundary::default(),
            failure_cluster_size: 50,
            near_target_fraction: 0.95,
            correlation_regions: vec![
                "Rajasthan".to_string(),
                "Tamil Nadu".to_string(),
                "Assam".to_string(),
            ],
        }
    }
}

impl FleetConfig {
    /// Fleet target for a fleet whose plant targets sum to `nameplate_gw`.
    pub fn resolve_target_gw(&self, nameplate_gw: f64) -> f64 {
        self.target_gw
            .unwrap_or(nameplate_gw / (1.0 + self.reserve_margin))
    }

    /// Thresholds to evaluate against `target_gw`.
    pub fn resolve_thresholds_gw(&self, target_gw: f64) -> Vec<f64> {
        if self.thresholds_gw.is_empty() {
            vec![target_gw, 0.95 * target_gw]
        } else {
            self.thresholds_gw.clone()
        }
    }
}

/// Input table locations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InputsConfig {
    pub sites_csv: Option<PathBuf>,
    pub capacity_factors_csv: Option<PathBuf>,
    /// Per-plant output of another dispatcher, scored next to the greedy run.
    pub compare_outputs_csv: Option<PathBuf>,
}

impl InputsConfig {
    /// Both table paths, if configured.
    pub fn tables(&self) -> Option<(&Path, &Path)> {
        match (&self.sites_csv, &self.capacity_factors_csv) {
            (Some(s), Some(c)) => Some((s.as_path(), c.as_path())),
            _ => None,
        }
    }
}

/// Synthetic fleet used without input tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SyntheticConfig {
    /// Number of plants, assigned to `regions` round-robin.
    pub sites: usize,
    pub regions: Vec<String>,
    pub weather: WeatherParams,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            sites: 120,
            regions: [
                "Rajasthan",
                "Gujarat",
                "Maharashtra",
                "Karnataka",
                "Andhra Pradesh",
                "Tamil Nadu",
                "Madhya Pradesh",
                "Telangana",
                "Uttar Pradesh",
                "Odisha",
                "West Bengal",
                "Assam",
            ]
            .iter()
            .map(|r| r.to_string())
            .collect(),
            weather: WeatherParams::default(),
        }
    }
}

/// Configuration error with field path and constraint description.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{field}: {message}")]
pub struct ConfigError {
    /// Dotted field path (e.g., `"plant.efficiency"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl ConfigError {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl ScenarioConfig {
    /// Returns the baseline scenario: 120 plants of 6 GW solar and 16 GWh
    /// storage firming 1 GW each, 20 % reserve margin.
    pub fn baseline() -> Self {
        Self::default()
    }

    /// Returns the no-reserve preset: the fleet target equals the summed
    /// plant targets.
    pub fn no_reserve() -> Self {
        Self {
            fleet: FleetConfig {
                reserve_margin: 0.0,
                ..FleetConfig::default()
            },
            ..Self::default()
        }
    }

    /// Returns the small-battery preset: half the storage per plant.
    pub fn small_battery() -> Self {
        Self {
            plant: PlantParams {
                battery_gwh: 8.0,
                ..PlantParams::default()
            },
            ..Self::default()
        }
    }

    /// Available preset names.
    pub const PRESETS: &[&str] = &["baseline", "no_reserve", "small_battery"];

    /// Loads a scenario from a named preset.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the preset name is unknown.
    pub fn from_preset(name: &str) -> Result<Self, ConfigError> {
        match name {
            "baseline" => Ok(Self::baseline()),
            "no_reserve" => Ok(Self::no_reserve()),
            "small_battery" => Ok(Self::small_battery()),
            _ => Err(ConfigError::new(
                "preset",
                format!(
                    "unknown preset \"{name}\", available: {}",
                    Self::PRESETS.join(", ")
                ),
            )),
        }
    }

    /// Parses a scenario from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| {
            ConfigError::new("scenario", format!("cannot read \"{}\": {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a scenario from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::new("toml", e.to_string()))
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        let p = &self.plant;
        for (field, value) in [
            ("plant.solar_gw", p.solar_gw),
            ("plant.battery_gwh", p.battery_gwh),
            ("plant.target_gw", p.target_gw),
        ] {
            if !(value > 0.0 && value.is_finite()) {
                errors.push(ConfigError::new(field, format!("must be > 0, got {value}")));
            }
        }
        if !(p.efficiency > 0.0 && p.efficiency <= 1.0) {
            errors.push(ConfigError::new("plant.efficiency", "must be in (0.0, 1.0]"));
        }
        if !(0.0..=1.0).contains(&p.initial_soc) {
            errors.push(ConfigError::new("plant.initial_soc", "must be in [0.0, 1.0]"));
        }

        let f = &self.fleet;
        if let Some(target) = f.target_gw {
            if !(target > 0.0 && target.is_finite()) {
                errors.push(ConfigError::new("fleet.target_gw", "must be > 0"));
            }
        }
        if !(f.reserve_margin >= 0.0 && f.reserve_margin.is_finite()) {
            errors.push(ConfigError::new("fleet.reserve_margin", "must be >= 0"));
        }
        if f.thresholds_gw.iter().any(|t| !(*t > 0.0 && t.is_finite())) {
            errors.push(ConfigError::new("fleet.thresholds_gw", "every threshold must be > 0"));
        }
        if !(f.near_target_fraction > 0.0 && f.near_target_fraction <= 1.0) {
            errors.push(ConfigError::new(
                "fleet.near_target_fraction",
                "must be in (0.0, 1.0]",
            ));
        }

        let i = &self.inputs;
        if i.sites_csv.is_some() != i.capacity_factors_csv.is_some() {
            errors.push(ConfigError::new(
                "inputs",
                "sites_csv and capacity_factors_csv must be given together",
            ));
        }

        let s = &self.synthetic;
        if s.sites == 0 {
            errors.push(ConfigError::new("synthetic.sites", "must be > 0"));
        }
        if s.regions.is_empty() {
            errors.push(ConfigError::new("synthetic.regions", "must not be empty"));
        }

        let w = &s.weather;
        if w.sunrise_hour >= w.sunset_hour {
            errors.push(ConfigError::new(
                "synthetic.weather.sunrise_hour",
                "must be < synthetic.weather.sunset_hour",
            ));
        }
        if w.sunset_hour > 24 {
            errors.push(ConfigError::new("synthetic.weather.sunset_hour", "must be <= 24"));
        }
        if !(w.peak_cf > 0.0 && w.peak_cf <= 1.0) {
            errors.push(ConfigError::new("synthetic.weather.peak_cf", "must be in (0.0, 1.0]"));
        }
        if !(w.mean_clearness > 0.0) {
            errors.push(ConfigError::new("synthetic.weather.mean_clearness", "must be > 0"));
        }
        if !(0.0..1.0).contains(&w.alpha) {
            errors.push(ConfigError::new("synthetic.weather.alpha", "must be in [0.0, 1.0)"));
        }
        if !(w.cloud_noise_std >= 0.0) {
            errors.push(ConfigError::new("synthetic.weather.cloud_noise_std", "must be >= 0"));
        }
        if !(0.0..=1.0).contains(&w.regional_weight) {
            errors.push(ConfigError::new(
                "synthetic.weather.regional_weight",
                "must be in [0.0, 1.0]",
            ));
        }
        if w.monsoon_start_day > w.monsoon_end_day || w.monsoon_end_day > 365 {
            errors.push(ConfigError::new(
                "synthetic.weather.monsoon_start_day",
                "must satisfy monsoon_start_day <= monsoon_end_day <= 365",
            ));
        }
        if !(0.0..=1.0).contains(&w.monsoon_depth) {
            errors.push(ConfigError::new(
                "synthetic.weather.monsoon_depth",
                "must be in [0.0, 1.0]",
            ));
        }

        errors
    }
}
