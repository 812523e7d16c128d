//! Hour-by-hour invariants of greedy dispatch over a full year.

mod common;

use approx::assert_relative_eq;

use common::{clear_sky_year, study_site, year_with_dark_days};
use firm_solar_sim::plant::PlantParams;
use firm_solar_sim::sim::{HOURS_PER_YEAR, simulate};

const TOL: f64 = 1e-9;

#[test]
fn every_hour_respects_physical_bounds() {
    let site = study_site(0, "Rajasthan");
    let cf = year_with_dark_days(0.6, 150..158);
    let states = simulate(&site, &cf).unwrap();
    assert_eq!(states.len(), HOURS_PER_YEAR);

    for (h, s) in states.iter().enumerate() {
        assert_eq!(s.hour, h);
        assert!(s.soc_gwh >= 0.0 && s.soc_gwh <= 16.0, "hour {h}: {s}");
        assert!(s.grid_output_gw <= s.target_gw + TOL, "hour {h}: {s}");
        assert!(s.grid_output_gw >= s.solar_gw.min(s.target_gw) - TOL, "hour {h}: {s}");
        assert!(s.charge_gw >= 0.0 && s.discharge_gw >= 0.0 && s.curtailment_gw >= 0.0);
        if s.solar_gw >= s.target_gw {
            assert_eq!(s.grid_output_gw, s.target_gw, "hour {h}: {s}");
            assert_eq!(s.discharge_gw, 0.0);
        } else {
            assert_eq!(s.charge_gw, 0.0);
            assert_eq!(s.curtailment_gw, 0.0);
        }
    }
}

#[test]
fn state_of_charge_follows_charge_and_discharge() {
    let site = study_site(0, "Rajasthan");
    let states = simulate(&site, &year_with_dark_days(0.6, 40..45)).unwrap();

    let mut previous = site.initial_soc_gwh();
    for s in &states {
        assert_relative_eq!(
            s.soc_gwh,
            previous + s.charge_gw - s.discharge_gw,
            epsilon = 1e-9
        );
        previous = s.soc_gwh;
    }
}

#[test]
fn storage_delivery_is_discharge_after_losses() {
    let site = study_site(0, "Rajasthan");
    let states = simulate(&site, &year_with_dark_days(0.6, 200..210)).unwrap();
    for s in states.iter().filter(|s| s.discharge_gw > 0.0) {
        assert_relative_eq!(
            s.storage_delivery_gw,
            s.discharge_gw * site.params.efficiency,
            epsilon = 1e-9
        );
    }
}

#[test]
fn curtailment_only_with_full_battery() {
    let site = study_site(0, "Rajasthan");
    let states = simulate(&site, &clear_sky_year(0.8)).unwrap();
    let curtailed: Vec<_> = states.iter().filter(|s| s.curtailment_gw > 0.0).collect();
    assert!(!curtailed.is_empty());
    for s in curtailed {
        assert_relative_eq!(s.soc_gwh, 16.0, epsilon = 1e-9);
    }
}

#[test]
fn shortfall_only_with_empty_battery() {
    let site = study_site(0, "Rajasthan");
    let states = simulate(&site, &year_with_dark_days(0.6, 100..110)).unwrap();
    let shortfalls: Vec<_> = states.iter().filter(|s| s.is_shortfall()).collect();
    assert!(!shortfalls.is_empty(), "ten dark days must drain the battery");
    for s in shortfalls {
        assert_eq!(s.soc_gwh, 0.0, "{s}");
    }
}

#[test]
fn clear_sky_year_is_firm() {
    let site = study_site(0, "Rajasthan");
    let states = simulate(&site, &clear_sky_year(0.6)).unwrap();
    assert!(states.iter().all(|s| !s.is_shortfall()));
}

#[test]
fn dispatch_is_deterministic() {
    let site = study_site(0, "Rajasthan");
    let cf = year_with_dark_days(0.55, 10..14);
    assert_eq!(simulate(&site, &cf).unwrap(), simulate(&site, &cf).unwrap());
}

#[test]
fn bigger_battery_never_delivers_less() {
    let cf = year_with_dark_days(0.6, 180..190);
    let small = study_site(0, "Rajasthan");
    let mut big = small.clone();
    big.params = PlantParams {
        battery_gwh: 24.0,
        ..small.params
    };

    let small_states = simulate(&small, &cf).unwrap();
    let big_states = simulate(&big, &cf).unwrap();
    for (a, b) in small_states.iter().zip(&big_states) {
        assert!(b.grid_output_gw >= a.grid_output_gw - TOL, "hour {}", a.hour);
    }
}

#[test]
fn zero_initial_charge_starts_empty() {
    let mut site = study_site(0, "Rajasthan");
    site.params.initial_soc = 0.0;
    let states = simulate(&site, &clear_sky_year(0.6)).unwrap();
    // Midnight with an empty battery delivers nothing.
    assert_eq!(states[0].grid_output_gw, 0.0);
    assert_eq!(states[0].soc_gwh, 0.0);
    assert!(states[0].is_shortfall());
}
