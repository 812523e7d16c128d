//! Shared test fixtures for integration tests.

#![allow(dead_code)]

use std::collections::BTreeMap;

use firm_solar_sim::config::ScenarioConfig;
use firm_solar_sim::plant::{PlantParams, Site, SiteId};
use firm_solar_sim::sim::{FleetInputs, HOURS_PER_DAY, HOURS_PER_YEAR};

/// Study plant: 6 GW solar, 16 GWh storage, 1 GW target, 92% efficiency.
pub fn study_site(id: u32, region: &str) -> Site {
    Site::new(SiteId(id), region, PlantParams::default())
}

/// Clear-sky year: half-sine between 06:00 and 18:00 peaking at `peak`.
pub fn clear_sky_year(peak: f64) -> Vec<f64> {
    (0..HOURS_PER_YEAR)
        .map(|h| {
            let hod = h % HOURS_PER_DAY;
            if (6..18).contains(&hod) {
                let x = (hod as f64 + 0.5 - 6.0) / 12.0;
                peak * (std::f64::consts::PI * x).sin()
            } else {
                0.0
            }
        })
        .collect()
}

/// Clear-sky year with every day of `dark_days` overcast at 5% of normal.
pub fn year_with_dark_days(peak: f64, dark_days: std::ops::Range<usize>) -> Vec<f64> {
    clear_sky_year(peak)
        .into_iter()
        .enumerate()
        .map(|(h, cf)| {
            if dark_days.contains(&(h / HOURS_PER_DAY)) {
                cf * 0.05
            } else {
                cf
            }
        })
        .collect()
}

/// Fleet of study plants in two regions with slightly different peaks.
pub fn small_fleet(n: u32) -> FleetInputs {
    let sites: Vec<Site> = (0..n)
        .map(|i| study_site(i, if i % 2 == 0 { "Rajasthan" } else { "Assam" }))
        .collect();
    let cf: BTreeMap<SiteId, Vec<f64>> = (0..n)
        .map(|i| (SiteId(i), clear_sky_year(0.6 + 0.02 * i as f64)))
        .collect();
    FleetInputs::new(sites, cf).expect("fixture inputs are valid")
}

/// Baseline scenario shrunk to a quick synthetic fleet.
pub fn quick_scenario(sites: usize) -> ScenarioConfig {
    let mut cfg = ScenarioConfig::baseline();
    cfg.synthetic.sites = sites;
    cfg.synthetic.regions = vec![
        "Rajasthan".to_string(),
        "Tamil Nadu".to_string(),
        "Assam".to_string(),
    ];
    cfg
}
