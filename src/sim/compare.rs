//! Scoring of per-plant output produced by another dispatcher against the
//! greedy run of the same fleet.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::error::ValidationError;
use crate::plant::SiteId;

use super::inputs::FleetInputs;
use super::metrics::ReliabilityMetrics;
use super::types::{HOURS_PER_YEAR, PlantRuns, PlantState};

/// Builds plant runs from an hourly grid output table (GW per site).
///
/// Solar generation is derived from the fleet's capacity factors. Storage
/// flows are not part of the table and stay at zero, so only output-based
/// reports are meaningful for the result.
///
/// # Errors
///
/// Returns a [`ValidationError`] when the table does not cover exactly the
/// fleet's sites, a column is not [`HOURS_PER_YEAR`] long, or a value is
/// negative or not finite.
pub fn runs_from_outputs(
    inputs: &FleetInputs,
    outputs: &BTreeMap<SiteId, Vec<f64>>,
) -> Result<PlantRuns, ValidationError> {
    if outputs.len() != inputs.len() {
        return Err(ValidationError::OutputCountMismatch {
            sites: inputs.len(),
            columns: outputs.len(),
        });
    }

    let mut runs = PlantRuns::new();
    for (site, cf) in inputs.iter() {
        let series = outputs
            .get(&site.id)
            .ok_or(ValidationError::MissingOutput(site.id))?;
        if series.len() != HOURS_PER_YEAR {
            return Err(ValidationError::ShapeMismatch {
                site: site.id,
                expected: HOURS_PER_YEAR,
                actual: series.len(),
            });
        }

        let mut states = Vec::with_capacity(HOURS_PER_YEAR);
        for (hour, (&output, &factor)) in series.iter().zip(cf).enumerate() {
            if !(output.is_finite() && output >= 0.0) {
                return Err(ValidationError::InvalidOutput {
                    site: site.id,
                    hour,
                    value: output,
                });
            }
            states.push(PlantState {
                hour,
                solar_gw: factor * site.params.solar_gw,
                grid_output_gw: output,
                target_gw: site.params.target_gw,
                charge_gw: 0.0,
                discharge_gw: 0.0,
                storage_delivery_gw: 0.0,
                curtailment_gw: 0.0,
                soc_gwh: 0.0,
            });
        }
        runs.insert(site.id, states);
    }
    Ok(runs)
}

/// Availability difference at one threshold, in percentage points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ThresholdGap {
    pub threshold_gw: f64,
    /// Greedy hourly availability (%).
    pub greedy_pct: f64,
    /// Compared hourly availability (%).
    pub compared_pct: f64,
    /// `compared_pct - greedy_pct`.
    pub gap_pp: f64,
}

/// Metrics of an externally dispatched fleet next to the greedy ones.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DispatchComparison {
    /// Name shown in the report, usually the source file stem.
    pub label: String,
    pub metrics: ReliabilityMetrics,
    /// One entry per threshold evaluated in both runs.
    pub hourly_gaps: Vec<ThresholdGap>,
    /// Difference in delivered energy share of target (pp).
    pub energy_gap_pp: f64,
}

impl DispatchComparison {
    /// Pairs `metrics` with the greedy metrics threshold by threshold.
    pub fn new(
        label: impl Into<String>,
        greedy: &ReliabilityMetrics,
        metrics: ReliabilityMetrics,
    ) -> Self {
        let hourly_gaps = greedy
            .thresholds
            .iter()
            .filter_map(|g| {
                metrics.at(g.threshold_gw).map(|c| {
                    let greedy_pct = 100.0 * g.hourly.fraction();
                    let compared_pct = 100.0 * c.hourly.fraction();
                    ThresholdGap {
                        threshold_gw: g.threshold_gw,
                        greedy_pct,
                        compared_pct,
                        gap_pp: compared_pct - greedy_pct,
                    }
                })
            })
            .collect();
        let energy_gap_pp =
            100.0 * (metrics.energy_fraction_of_target - greedy.energy_fraction_of_target);

        Self {
            label: label.into(),
            metrics,
            hourly_gaps,
            energy_gap_pp,
        }
    }
}

impl fmt::Display for DispatchComparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Compared Dispatch: {} ---", self.label)?;
        writeln!(f, "{}", self.metrics)?;
        writeln!(f, "Gap vs greedy (hours at or above threshold):")?;
        for g in &self.hourly_gaps {
            writeln!(
                f,
                "  >= {:.2} GW: greedy {:.1}%, {} {:.1}% ({:+.1} pp)",
                g.threshold_gw, g.greedy_pct, self.label, g.compared_pct, g.gap_pp
            )?;
        }
        writeln!(f, "Energy share gap:      {:+.1} pp", self.energy_gap_pp)
    }
}
