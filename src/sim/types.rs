//! Core simulation records: per-plant hourly state and fleet snapshots.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::plant::SiteId;

/// Hours in one day.
pub const HOURS_PER_DAY: usize = 24;
/// Hours in one week.
pub const HOURS_PER_WEEK: usize = 168;
/// Hours in a non-leap year.
pub const HOURS_PER_YEAR: usize = 8760;

/// Complete record of one plant for one hour.
///
/// Every step lasts one hour, so GW flows and GWh energies share a scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PlantState {
    /// Hour index within the year (0-8759).
    pub hour: usize,
    /// Solar generation (GW).
    pub solar_gw: f64,
    /// Power delivered to the grid (GW).
    pub grid_output_gw: f64,
    /// Firm output target (GW).
    pub target_gw: f64,
    /// Surplus routed into storage, lossless (GW).
    pub charge_gw: f64,
    /// Energy withdrawn from storage this hour, before the efficiency loss.
    ///
    /// GWh over the one-hour step, numerically equal to the mean GW drawn.
    /// Grid delivery is `storage_delivery_gw = discharge_gw * efficiency`.
    pub discharge_gw: f64,
    /// Share of `grid_output_gw` supplied by storage (GW).
    pub storage_delivery_gw: f64,
    /// Surplus that could neither be delivered nor stored (GW).
    pub curtailment_gw: f64,
    /// State of charge at the end of the hour (GWh).
    pub soc_gwh: f64,
}

impl PlantState {
    /// Unserved part of the target (GW, >= 0).
    pub fn shortfall_gw(&self) -> f64 {
        (self.target_gw - self.grid_output_gw).max(0.0)
    }

    /// `true` when delivered output fell below the target.
    pub fn is_shortfall(&self) -> bool {
        self.grid_output_gw < self.target_gw
    }
}

impl fmt::Display for PlantState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "h={:>4} | out={:>6.3} GW  target={:>6.3} GW | solar={:.3}  \
             charge={:.3}  discharge={:.3}  curtail={:.3} | SoC={:.3} GWh",
            self.hour,
            self.grid_output_gw,
            self.target_gw,
            self.solar_gw,
            self.charge_gw,
            self.discharge_gw,
            self.curtailment_gw,
            self.soc_gwh,
        )
    }
}

/// Fleet-wide output for one hour.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FleetSnapshot {
    pub hour: usize,
    /// Sum of grid output across all plants (GW).
    pub output_gw: f64,
    /// Plants delivering less than their own target this hour.
    pub plants_failing: usize,
}

/// Per-site hourly plant states, keyed in ascending site order.
pub type PlantRuns = BTreeMap<SiteId, Vec<PlantState>>;
