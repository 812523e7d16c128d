//! Fleet aggregation: hourly sums of plant output.

use crate::error::ValidationError;

use super::types::{FleetSnapshot, HOURS_PER_YEAR, PlantRuns};

/// Sums grid output across all plants for every hour.
///
/// Plants are visited in ascending [`SiteId`](crate::plant::SiteId) order
/// regardless of how `runs` was built, so the floating point summation order
/// and therefore the result are fixed.
///
/// # Errors
///
/// Returns [`ValidationError::EmptyFleet`] for an empty map and
/// [`ValidationError::ShapeMismatch`] naming the first site whose series is
/// not [`HOURS_PER_YEAR`] long or not indexed hour by hour.
pub fn aggregate(runs: &PlantRuns) -> Result<Vec<FleetSnapshot>, ValidationError> {
    if runs.is_empty() {
        return Err(ValidationError::EmptyFleet);
    }

    for (&site, states) in runs {
        let aligned = states.iter().enumerate().all(|(h, s)| s.hour == h);
        if states.len() != HOURS_PER_YEAR || !aligned {
            return Err(ValidationError::ShapeMismatch {
                site,
                expected: HOURS_PER_YEAR,
                actual: states.len(),
            });
        }
    }

    let mut fleet: Vec<FleetSnapshot> = (0..HOURS_PER_YEAR)
        .map(|hour| FleetSnapshot {
            hour,
            output_gw: 0.0,
            plants_failing: 0,
        })
        .collect();

    for states in runs.values() {
        for (snapshot, state) in fleet.iter_mut().zip(states) {
            snapshot.output_gw += state.grid_output_gw;
            if state.is_shortfall() {
                snapshot.plants_failing += 1;
            }
        }
    }

    Ok(fleet)
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::plant::SiteId;
    use crate::sim::types::PlantState;

    fn flat(output: f64) -> Vec<PlantState> {
        (0..HOURS_PER_YEAR)
            .map(|hour| PlantState {
                hour,
                solar_gw: 0.0,
                grid_output_gw: output,
                target_gw: 1.0,
                charge_gw: 0.0,
                discharge_gw: 0.0,
                storage_delivery_gw: 0.0,
                curtailment_gw: 0.0,
                soc_gwh: 0.0,
            })
            .collect()
    }

    #[test]
    fn sums_outputs_and_counts_failures() {
        let mut runs = PlantRuns::new();
        runs.insert(SiteId(0), flat(1.0));
        runs.insert(SiteId(1), flat(0.25));
        let fleet = aggregate(&runs).unwrap();
        assert_eq!(fleet.len(), HOURS_PER_YEAR);
        assert_eq!(fleet[17].hour, 17);
        assert_eq!(fleet[17].output_gw, 1.25);
        assert_eq!(fleet[17].plants_failing, 1);
    }

    #[test]
    fn sum_matches_any_summation_order() {
        let outputs = [0.1, 0.7, 0.3, 1.0, 0.33];
        let runs: PlantRuns = outputs
            .iter()
            .enumerate()
            .map(|(i, &o)| (SiteId(i as u32), flat(o)))
            .collect();
        let fleet = aggregate(&runs).unwrap();

        let reversed: f64 = outputs.iter().rev().sum();
        let pairwise = (outputs[0] + outputs[4]) + (outputs[1] + outputs[3]) + outputs[2];
        for snapshot in &fleet {
            assert_relative_eq!(snapshot.output_gw, reversed, epsilon = 1e-12);
            assert_relative_eq!(snapshot.output_gw, pairwise, epsilon = 1e-12);
            assert_eq!(snapshot.plants_failing, 4);
        }
    }

    #[test]
    fn sum_follows_site_order_exactly() {
        let outputs = [0.1, 0.7, 0.3, 1.0, 0.33];
        let runs: PlantRuns = outputs
            .iter()
            .enumerate()
            .map(|(i, &o)| (SiteId(i as u32), flat(o)))
            .collect();
        let ascending = outputs.iter().fold(0.0, |acc, o| acc + o);
        assert_eq!(aggregate(&runs).unwrap()[0].output_gw, ascending);
    }

    #[test]
    fn short_series_is_a_shape_mismatch() {
        let mut runs = PlantRuns::new();
        runs.insert(SiteId(0), flat(1.0));
        let mut short = flat(1.0);
        short.truncate(100);
        runs.insert(SiteId(9), short);
        assert_eq!(
            aggregate(&runs).unwrap_err(),
            ValidationError::ShapeMismatch {
                site: SiteId(9),
                expected: HOURS_PER_YEAR,
                actual: 100
            }
        );
    }

    #[test]
    fn misindexed_series_is_a_shape_mismatch() {
        let mut runs = PlantRuns::new();
        let mut shifted = flat(1.0);
        shifted[5].hour = 6;
        runs.insert(SiteId(2), shifted);
        assert!(matches!(
            aggregate(&runs),
            Err(ValidationError::ShapeMismatch { site: SiteId(2), .. })
        ));
    }

    #[test]
    fn empty_fleet_is_rejected() {
        assert_eq!(
            aggregate(&PlantRuns::new()).unwrap_err(),
            ValidationError::EmptyFleet
        );
    }
}
