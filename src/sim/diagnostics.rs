//! Per-plant availability and correlated failure diagnostics.

use std::fmt;

use serde::Serialize;

use crate::error::ValidationError;
use crate::plant::SiteId;

use super::types::{FleetSnapshot, PlantRuns};

/// Hours one plant met its own target, and came close to it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PlantAvailability {
    pub site: SiteId,
    pub hours: usize,
    pub hours_at_target: usize,
    /// Hours with output >= `near_target_fraction * target`.
    pub hours_near_target: usize,
}

impl PlantAvailability {
    pub fn fraction_at_target(&self) -> f64 {
        fraction(self.hours_at_target, self.hours)
    }
}

/// Mean, best and worst of a per-plant hour count.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HourCountSummary {
    pub mean: f64,
    pub best: usize,
    pub worst: usize,
}

impl HourCountSummary {
    fn from_counts(counts: impl Iterator<Item = usize> + Clone) -> Self {
        let n = counts.clone().count();
        let total: usize = counts.clone().sum();
        Self {
            mean: if n == 0 { 0.0 } else { total as f64 / n as f64 },
            best: counts.clone().max().unwrap_or(0),
            worst: counts.min().unwrap_or(0),
        }
    }
}

/// Plant-level diagnostics of a fleet run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FleetDiagnostics {
    pub near_target_fraction: f64,
    pub plants: Vec<PlantAvailability>,
    pub at_target: HourCountSummary,
    pub near_target: HourCountSummary,
    /// Mean over plants of the fraction of hours at target.
    pub mean_plant_availability: f64,
    pub max_simultaneous_failures: usize,
    pub mean_failures_per_hour: f64,
    pub cluster_size: usize,
    /// Hours with more than `cluster_size` plants below target.
    pub hours_over_cluster: usize,
    /// Mean output of a plant in the hours it is below target, `None` if no
    /// plant ever fails.
    pub mean_output_when_failing_gw: Option<f64>,
}

impl FleetDiagnostics {
    /// Derives diagnostics from per-plant runs and their aggregate.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyFleet`] for empty runs and
    /// [`ValidationError::InvalidParameter`] when `near_target_fraction` is
    /// outside (0, 1].
    pub fn from_runs(
        runs: &PlantRuns,
        fleet: &[FleetSnapshot],
        cluster_size: usize,
        near_target_fraction: f64,
    ) -> Result<Self, ValidationError> {
        if runs.is_empty() {
            return Err(ValidationError::EmptyFleet);
        }
        if !(near_target_fraction > 0.0 && near_target_fraction <= 1.0) {
            return Err(ValidationError::InvalidParameter {
                field: "near_target_fraction",
                value: near_target_fraction,
            });
        }

        let mut failing_output = 0.0;
        let mut failing_hours = 0usize;
        let plants: Vec<PlantAvailability> = runs
            .iter()
            .map(|(&site, states)| {
                let mut at = 0;
                let mut near = 0;
                for s in states {
                    if s.grid_output_gw >= s.target_gw {
                        at += 1;
                    } else {
                        failing_output += s.grid_output_gw;
                        failing_hours += 1;
                    }
                    if s.grid_output_gw >= near_target_fraction * s.target_gw {
                        near += 1;
                    }
                }
                PlantAvailability {
                    site,
                    hours: states.len(),
                    hours_at_target: at,
                    hours_near_target: near,
                }
            })
            .collect();

        let mean_plant_availability = plants
            .iter()
            .map(PlantAvailability::fraction_at_target)
            .sum::<f64>()
            / plants.len() as f64;

        let failing = fleet.iter().map(|s| s.plants_failing);
        let mean_failures_per_hour = if fleet.is_empty() {
            0.0
        } else {
            failing.clone().sum::<usize>() as f64 / fleet.len() as f64
        };

        Ok(Self {
            near_target_fraction,
            at_target: HourCountSummary::from_counts(plants.iter().map(|p| p.hours_at_target)),
            near_target: HourCountSummary::from_counts(plants.iter().map(|p| p.hours_near_target)),
            plants,
            mean_plant_availability,
            max_simultaneous_failures: failing.clone().max().unwrap_or(0),
            mean_failures_per_hour,
            cluster_size,
            hours_over_cluster: failing.filter(|&n| n > cluster_size).count(),
            mean_output_when_failing_gw: (failing_hours > 0)
                .then(|| failing_output / failing_hours as f64),
        })
    }
}

fn fraction(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64
    }
}

impl fmt::Display for FleetDiagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Plant Diagnostics ---")?;
        writeln!(
            f,
            "Hours at target:       mean {:.0}, best {}, worst {}",
            self.at_target.mean, self.at_target.best, self.at_target.worst
        )?;
        writeln!(
            f,
            "Hours >= {:.0}% target: mean {:.0}, best {}, worst {}",
            100.0 * self.near_target_fraction,
            self.near_target.mean,
            self.near_target.best,
            self.near_target.worst
        )?;
        writeln!(
            f,
            "Mean plant availability: {:.1}%",
            100.0 * self.mean_plant_availability
        )?;
        writeln!(
            f,
            "Max plants failing together: {} of {}",
            self.max_simultaneous_failures,
            self.plants.len()
        )?;
        writeln!(
            f,
            "Mean plants failing per hour: {:.1}",
            self.mean_failures_per_hour
        )?;
        writeln!(
            f,
            "Hours with >{} failures: {}",
            self.cluster_size, self.hours_over_cluster
        )?;
        match self.mean_output_when_failing_gw {
            Some(v) => writeln!(f, "Avg output when failing: {v:.2} GW"),
            None => writeln!(f, "Avg output when failing: n/a"),
        }
    }
}
