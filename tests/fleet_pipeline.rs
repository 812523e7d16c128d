//! End-to-end fleet runs: engine, aggregation, metrics, and CSV inputs.

mod common;

use approx::assert_relative_eq;

use common::{clear_sky_year, quick_scenario, small_fleet, study_site, year_with_dark_days};
use firm_solar_sim::Error;
use firm_solar_sim::error::ValidationError;
use firm_solar_sim::io::import::{
    write_capacity_factors_csv, write_plant_outputs_csv, write_sites_csv,
};
use firm_solar_sim::plant::SiteId;
use firm_solar_sim::runner::{InputLoader, run_scenario, synthetic_inputs};
use firm_solar_sim::sim::{
    CancellationToken, Engine, FleetInputs, HOURS_PER_YEAR, Parallelism, PlantRuns,
    ReliabilityMetrics, WeekBoundary, aggregate,
};

#[test]
fn parallel_and_sequential_fleets_agree() {
    let inputs = small_fleet(8);
    let seq = Engine::new(Parallelism::Sequential).run(&inputs).unwrap();
    let par = Engine::new(Parallelism::Parallel { threads: 4 })
        .run(&inputs)
        .unwrap();
    assert_eq!(aggregate(&seq).unwrap(), aggregate(&par).unwrap());
}

#[test]
fn firm_fleet_meets_every_threshold() {
    let inputs = small_fleet(4);
    let runs = Engine::default().run(&inputs).unwrap();
    let fleet = aggregate(&runs).unwrap();
    assert!(fleet.iter().all(|s| s.plants_failing == 0));
    assert!(fleet.iter().all(|s| s.output_gw == 4.0));

    let metrics =
        ReliabilityMetrics::compute(&fleet, 4.0, &[4.0, 3.8], WeekBoundary::Truncate).unwrap();
    let at_target = metrics.at(4.0).unwrap();
    assert_eq!(at_target.hourly.fraction(), 1.0);
    assert_eq!(at_target.daily.fraction(), 1.0);
    assert_eq!(at_target.weekly.fraction(), 1.0);
    assert_eq!(metrics.energy_fraction_of_target, 1.0);
}

#[test]
fn shared_dark_spell_fails_plants_together() {
    let sites = vec![study_site(0, "Assam"), study_site(1, "Assam")];
    let cf = [
        (SiteId(0), year_with_dark_days(0.6, 60..65)),
        (SiteId(1), year_with_dark_days(0.6, 60..65)),
    ]
    .into_iter()
    .collect();
    let inputs = FleetInputs::new(sites, cf).unwrap();
    let runs = Engine::new(Parallelism::Sequential).run(&inputs).unwrap();
    let fleet = aggregate(&runs).unwrap();

    let worst = fleet.iter().map(|s| s.plants_failing).max().unwrap();
    assert_eq!(worst, 2);
    // Outside the dark spell the fleet is firm.
    assert!(fleet[..60 * 24].iter().all(|s| s.output_gw == 2.0));
}

#[test]
fn mismatched_tables_fail_before_simulation() {
    let sites = vec![study_site(0, "Assam"), study_site(1, "Assam")];
    let cf = [(SiteId(0), clear_sky_year(0.6))].into_iter().collect();
    assert_eq!(
        FleetInputs::new(sites, cf).unwrap_err(),
        ValidationError::SiteCountMismatch {
            sites: 2,
            series: 1
        }
    );
}

#[test]
fn scenario_report_is_reproducible() {
    let cfg = quick_scenario(9);
    let a = run_scenario(&cfg, &mut InputLoader::new(), &CancellationToken::new()).unwrap();
    let b = run_scenario(&cfg, &mut InputLoader::new(), &CancellationToken::new()).unwrap();
    assert_eq!(a.report, b.report);
    assert_eq!(a.fleet.len(), HOURS_PER_YEAR);
    assert_eq!(a.report.correlation.regions.len(), 3);
}

#[test]
fn csv_inputs_reproduce_synthetic_run() {
    let cfg = quick_scenario(6);
    let synthetic = run_scenario(&cfg, &mut InputLoader::new(), &CancellationToken::new()).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let sites_path = dir.path().join("sites.csv");
    let cf_path = dir.path().join("cf.csv");
    let inputs = synthetic_inputs(&cfg).unwrap();
    write_sites_csv(inputs.sites(), &sites_path).unwrap();
    write_capacity_factors_csv(inputs.capacity_factor_table(), &cf_path).unwrap();

    let mut from_csv = cfg.clone();
    from_csv.inputs.sites_csv = Some(sites_path);
    from_csv.inputs.capacity_factors_csv = Some(cf_path);
    let mut loader = InputLoader::new();
    let loaded = run_scenario(&from_csv, &mut loader, &CancellationToken::new()).unwrap();
    assert_eq!(loaded.report, synthetic.report);

    // A second run through the same loader reuses the parsed tables.
    let again = run_scenario(&from_csv, &mut loader, &CancellationToken::new()).unwrap();
    assert_eq!(again.report, synthetic.report);
}

#[test]
fn missing_input_table_is_an_io_error() {
    let mut cfg = quick_scenario(3);
    cfg.inputs.sites_csv = Some("/nonexistent/sites.csv".into());
    cfg.inputs.capacity_factors_csv = Some("/nonexistent/cf.csv".into());
    let err = run_scenario(&cfg, &mut InputLoader::new(), &CancellationToken::new()).unwrap_err();
    assert!(matches!(err, Error::Io { .. }), "{err}");
}

#[test]
fn small_battery_is_no_more_reliable() {
    let base = quick_scenario(6);
    let mut small = base.clone();
    small.plant.battery_gwh = 4.0;

    let base = run_scenario(&base, &mut InputLoader::new(), &CancellationToken::new()).unwrap();
    let small = run_scenario(&small, &mut InputLoader::new(), &CancellationToken::new()).unwrap();
    for (b, s) in base.fleet.iter().zip(&small.fleet) {
        assert!(s.output_gw <= b.output_gw + 1e-9, "hour {}", b.hour);
    }
    assert!(small.report.metrics.total_energy_gwh <= base.report.metrics.total_energy_gwh + 1e-6);
}

#[test]
fn external_dispatch_is_scored_against_greedy() {
    let cfg = quick_scenario(6);
    let greedy = run_scenario(&cfg, &mut InputLoader::new(), &CancellationToken::new()).unwrap();
    assert!(greedy.report.comparison.is_none());

    let dir = tempfile::tempdir().unwrap();

    // The greedy outputs themselves score identically.
    let same_path = dir.path().join("greedy_again.csv");
    write_plant_outputs_csv(&greedy.runs, &same_path).unwrap();
    let mut same_cfg = cfg.clone();
    same_cfg.inputs.compare_outputs_csv = Some(same_path);
    let same =
        run_scenario(&same_cfg, &mut InputLoader::new(), &CancellationToken::new()).unwrap();
    let cmp = same.report.comparison.as_ref().unwrap();
    assert_eq!(cmp.label, "greedy_again");
    assert_eq!(cmp.metrics, greedy.report.metrics);
    assert!(cmp.hourly_gaps.iter().all(|g| g.gap_pp == 0.0));

    // A dispatcher holding every plant at its target closes the gap.
    let firm: PlantRuns = greedy
        .runs
        .iter()
        .map(|(&id, states)| {
            let held = states
                .iter()
                .map(|s| {
                    let mut s = *s;
                    s.grid_output_gw = s.target_gw;
                    s
                })
                .collect();
            (id, held)
        })
        .collect();
    let firm_path = dir.path().join("optimized.csv");
    write_plant_outputs_csv(&firm, &firm_path).unwrap();
    let mut firm_cfg = cfg.clone();
    firm_cfg.inputs.compare_outputs_csv = Some(firm_path);
    let scored =
        run_scenario(&firm_cfg, &mut InputLoader::new(), &CancellationToken::new()).unwrap();

    assert_eq!(scored.report.metrics, greedy.report.metrics);
    let cmp = scored.report.comparison.as_ref().unwrap();
    let target = greedy.report.fleet_target_gw;
    let greedy_at_target = greedy.report.metrics.at(target).unwrap().hourly.fraction();
    let gap = cmp
        .hourly_gaps
        .iter()
        .find(|g| g.threshold_gw == target)
        .unwrap();
    assert_eq!(gap.compared_pct, 100.0);
    assert_relative_eq!(gap.gap_pp, 100.0 * (1.0 - greedy_at_target), epsilon = 1e-9);
    assert!(scored.report.to_string().contains("--- Compared Dispatch: optimized ---"));
}

#[test]
fn external_dispatch_for_other_sites_is_rejected() {
    let cfg = quick_scenario(3);
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("outputs.csv");
    let four = run_scenario(
        &quick_scenario(4),
        &mut InputLoader::new(),
        &CancellationToken::new(),
    )
    .unwrap();
    write_plant_outputs_csv(&four.runs, &path).unwrap();

    let mut cfg = cfg;
    cfg.inputs.compare_outputs_csv = Some(path);
    let err = run_scenario(&cfg, &mut InputLoader::new(), &CancellationToken::new()).unwrap_err();
    assert!(
        matches!(
            err,
            Error::Validation(ValidationError::OutputCountMismatch {
                sites: 3,
                columns: 4
            })
        ),
        "{err}"
    );
}
