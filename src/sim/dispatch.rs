//! Greedy hour-by-hour dispatch of a single plant.
//!
//! Each hour uses only that hour's solar and the current battery state: no
//! look-ahead and no knowledge of other plants.

use crate::error::{Result, ValidationError};
use crate::plant::{Battery, Site};

use super::types::{HOURS_PER_YEAR, PlantState};

/// Checks a site and its capacity factor series before simulation.
///
/// # Errors
///
/// Returns a [`ValidationError`] for invalid site parameters, a series whose
/// length is not [`HOURS_PER_YEAR`], or any capacity factor outside `[0, 1]`.
pub fn validate_inputs(site: &Site, capacity_factors: &[f64]) -> Result<(), ValidationError> {
    site.validate()?;
    if capacity_factors.len() != HOURS_PER_YEAR {
        return Err(ValidationError::SeriesLength {
            site: site.id,
            expected: HOURS_PER_YEAR,
            actual: capacity_factors.len(),
        });
    }
    if let Some((hour, &value)) = capacity_factors
        .iter()
        .enumerate()
        .find(|(_, cf)| !(0.0..=1.0).contains(*cf))
    {
        return Err(ValidationError::CapacityFactorOutOfRange {
            site: site.id,
            hour,
            value,
        });
    }
    Ok(())
}

/// Simulates one year of greedy dispatch for `site`.
///
/// # Arguments
///
/// * `site` - Plant configuration
/// * `capacity_factors` - One capacity factor per hour of a non-leap year
///
/// # Returns
///
/// One [`PlantState`] per hour, in hour order.
///
/// # Errors
///
/// Fails before the first hour on invalid inputs, or with an invariant
/// violation if the state of charge ever leaves `[0, capacity]`.
pub fn simulate(site: &Site, capacity_factors: &[f64]) -> Result<Vec<PlantState>> {
    validate_inputs(site, capacity_factors)?;

    let mut battery = Battery::for_site(site);
    let mut states = Vec::with_capacity(capacity_factors.len());
    for (hour, &cf) in capacity_factors.iter().enumerate() {
        states.push(dispatch_hour(site, &mut battery, hour, cf)?);
    }
    Ok(states)
}

/// Advances `battery` by one hour and records the plant state.
fn dispatch_hour(
    site: &Site,
    battery: &mut Battery,
    hour: usize,
    capacity_factor: f64,
) -> Result<PlantState> {
    let target = site.params.target_gw;
    let solar = capacity_factor * site.params.solar_gw;

    let (grid_output, charge, discharge, storage_delivery, curtailment) = if solar >= target {
        let surplus = solar - target;
        let stored = battery.charge(surplus);
        (target, stored, 0.0, 0.0, (surplus - stored).max(0.0))
    } else {
        let deficit = target - solar;
        let d = battery.discharge(deficit);
        // Covered deficits report the target itself so that availability
        // comparisons are not defeated by `solar + (target - solar)` rounding.
        let output = if d.delivered_gw >= deficit {
            target
        } else {
            solar + d.delivered_gw
        };
        (output, 0.0, d.drawn_gwh, d.delivered_gw, 0.0)
    };

    let soc_gwh = battery.settle(hour)?;

    Ok(PlantState {
        hour,
        solar_gw: solar,
        grid_output_gw: grid_output,
        target_gw: target,
        charge_gw: charge,
        discharge_gw: discharge,
        storage_delivery_gw: storage_delivery,
        curtailment_gw: curtailment,
        soc_gwh,
    })
}
