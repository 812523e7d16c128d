//! Site identity and plant sizing parameters.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Stable identifier of a site within a fleet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SiteId(pub u32);

impl fmt::Display for SiteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Sizing and operating parameters of one solar-plus-storage plant.
///
/// Doubles as the `[plant]` section of a scenario file, where it supplies
/// defaults for sites whose table row leaves a column empty.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlantParams {
    /// Installed solar capacity (GW DC).
    pub solar_gw: f64,
    /// Battery energy capacity (GWh).
    pub battery_gwh: f64,
    /// Firm output target (GW).
    pub target_gw: f64,
    /// Round-trip efficiency, applied on discharge only (0.0 < eff <= 1.0).
    pub efficiency: f64,
    /// Initial state of charge as a fraction of battery capacity (0.0-1.0).
    pub initial_soc: f64,
}

impl Default for PlantParams {
    fn default() -> Self {
        Self {
            solar_gw: 6.0,
            battery_gwh: 16.0,
            target_gw: 1.0,
            efficiency: 0.92,
            initial_soc: 0.5,
        }
    }
}

/// A plant location with its immutable configuration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Site {
    pub id: SiteId,
    /// State or region label used for regional grouping.
    pub region: String,
    pub lat: f64,
    pub lon: f64,
    pub params: PlantParams,
}

impl Site {
    pub fn new(id: SiteId, region: impl Into<String>, params: PlantParams) -> Self {
        Self {
            id,
            region: region.into(),
            lat: 0.0,
            lon: 0.0,
            params,
        }
    }

    /// Sets the site coordinates.
    pub fn at(mut self, lat: f64, lon: f64) -> Self {
        self.lat = lat;
        self.lon = lon;
        self
    }

    /// Initial stored energy in GWh.
    pub fn initial_soc_gwh(&self) -> f64 {
        self.params.initial_soc * self.params.battery_gwh
    }

    /// Checks that every sizing parameter is physically meaningful.
    ///
    /// # Errors
    ///
    /// Returns the first offending field as a [`ValidationError`].
    pub fn validate(&self) -> Result<(), ValidationError> {
        let p = &self.params;
        for (field, value) in [
            ("solar_gw", p.solar_gw),
            ("battery_gwh", p.battery_gwh),
            ("target_gw", p.target_gw),
        ] {
            if !(value > 0.0 && value.is_finite()) {
                return Err(ValidationError::NonPositive {
                    site: self.id,
                    field,
                    value,
                });
            }
        }
        if !(p.efficiency > 0.0 && p.efficiency <= 1.0) {
            return Err(ValidationError::OutOfRange {
                site: self.id,
                field: "efficiency",
                range: "(0, 1]",
                value: p.efficiency,
            });
        }
        if !(0.0..=1.0).contains(&p.initial_soc) {
            return Err(ValidationError::OutOfRange {
                site: self.id,
                field: "initial_soc",
                range: "[0, 1]",
                value: p.initial_soc,
            });
        }
        Ok(())
    }
}
