//! Command-line interface.

use std::path::PathBuf;

use clap::Parser;

use firm_solar_sim::config::ScenarioConfig;
use firm_solar_sim::error::Result;
use firm_solar_sim::sim::WeekBoundary;

/// Greedy dispatch simulator for a fleet of solar-plus-storage plants.
///
/// Without --scenario or --preset the baseline preset is used. Without
/// input tables a synthetic fleet is generated from the scenario seed.
#[derive(Debug, Parser)]
#[command(name = "firm-solar-sim", version, about)]
pub struct Cli {
    /// Load scenario from TOML config file
    #[arg(long, value_name = "PATH", conflicts_with = "preset")]
    pub scenario: Option<PathBuf>,

    /// Use a built-in preset (baseline, no_reserve, small_battery)
    #[arg(long, value_name = "NAME")]
    pub preset: Option<String>,

    /// Override the random seed
    #[arg(long)]
    pub seed: Option<u64>,

    /// Site table CSV
    #[arg(long, value_name = "PATH", requires = "capacity_factors_csv")]
    pub sites_csv: Option<PathBuf>,

    /// Wide hourly capacity factor CSV
    #[arg(long, value_name = "PATH", requires = "sites_csv")]
    pub capacity_factors_csv: Option<PathBuf>,

    /// Wide per-plant output CSV of another dispatcher to score against greedy
    #[arg(long, value_name = "PATH")]
    pub compare_outputs_csv: Option<PathBuf>,

    /// Worker threads (0 = one per CPU)
    #[arg(long, conflicts_with = "sequential")]
    pub threads: Option<usize>,

    /// Simulate sites one after another
    #[arg(long)]
    pub sequential: bool,

    /// Treatment of the hours after the last full week
    #[arg(long, value_enum)]
    pub week_boundary: Option<WeekBoundary>,

    /// Export every plant-hour to CSV
    #[arg(long, value_name = "PATH")]
    pub plant_out: Option<PathBuf>,

    /// Export the hourly fleet series to CSV
    #[arg(long, value_name = "PATH")]
    pub fleet_out: Option<PathBuf>,

    /// Export the full report as JSON
    #[arg(long, value_name = "PATH")]
    pub metrics_json: Option<PathBuf>,

    /// Write the site and capacity factor tables used by the run into a directory
    #[arg(long, value_name = "DIR")]
    pub inputs_out: Option<PathBuf>,

    /// Only log warnings and errors
    #[arg(short, long)]
    pub quiet: bool,
}

impl Cli {
    /// Resolves the scenario source and applies command-line overrides.
    ///
    /// # Errors
    ///
    /// Returns a config error for an unknown preset or an unreadable scenario file.
    pub fn scenario_config(&self) -> Result<ScenarioConfig> {
        let mut config = match (&self.scenario, &self.preset) {
            (Some(path), _) => ScenarioConfig::from_toml_file(path)?,
            (None, Some(name)) => ScenarioConfig::from_preset(name)?,
            (None, None) => ScenarioConfig::baseline(),
        };

        if let Some(seed) = self.seed {
            config.simulation.seed = seed;
        }
        if let (Some(sites), Some(cf)) = (&self.sites_csv, &self.capacity_factors_csv) {
            config.inputs.sites_csv = Some(sites.clone());
            config.inputs.capacity_factors_csv = Some(cf.clone());
        }
        if let Some(path) = &self.compare_outputs_csv {
            config.inputs.compare_outputs_csv = Some(path.clone());
        }
        if let Some(threads) = self.threads {
            config.simulation.threads = threads;
            config.simulation.parallel = true;
        }
        if self.sequential {
            config.simulation.parallel = false;
        }
        if let Some(boundary) = self.week_boundary {
            config.fleet.week_boundary = boundary;
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> std::result::Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("firm-solar-sim").chain(args.iter().copied()))
    }

    #[test]
    fn defaults_to_baseline() {
        let cli = parse(&[]).unwrap();
        let cfg = cli.scenario_config().unwrap();
        assert_eq!(cfg, ScenarioConfig::baseline());
    }

    #[test]
    fn preset_and_overrides() {
        let cli = parse(&[
            "--preset",
            "small_battery",
            "--seed",
            "7",
            "--sequential",
            "--week-boundary",
            "partial-week",
        ])
        .unwrap();
        let cfg = cli.scenario_config().unwrap();
        assert_eq!(cfg.plant.battery_gwh, 8.0);
        assert_eq!(cfg.simulation.seed, 7);
        assert!(!cfg.simulation.parallel);
        assert_eq!(cfg.fleet.week_boundary, WeekBoundary::PartialWeek);
    }

    #[test]
    fn compare_outputs_path_is_applied() {
        let cli = parse(&["--compare-outputs-csv", "optimized.csv"]).unwrap();
        let cfg = cli.scenario_config().unwrap();
        assert_eq!(
            cfg.inputs.compare_outputs_csv,
            Some(PathBuf::from("optimized.csv"))
        );
        assert!(cfg.inputs.tables().is_none());
    }

    #[test]
    fn unknown_preset_fails_on_resolve() {
        let cli = parse(&["--preset", "nope"]).unwrap();
        assert!(cli.scenario_config().is_err());
    }

    #[test]
    fn scenario_and_preset_conflict() {
        assert!(parse(&["--scenario", "a.toml", "--preset", "baseline"]).is_err());
    }

    #[test]
    fn input_tables_come_in_pairs() {
        assert!(parse(&["--sites-csv", "sites.csv"]).is_err());
        let cli = parse(&["--sites-csv", "s.csv", "--capacity-factors-csv", "cf.csv"]).unwrap();
        let cfg = cli.scenario_config().unwrap();
        assert!(cfg.inputs.tables().is_some());
    }

    #[test]
    fn threads_conflict_with_sequential() {
        assert!(parse(&["--threads", "4", "--sequential"]).is_err());
        let cfg = parse(&["--threads", "4"])
            .unwrap()
            .scenario_config()
            .unwrap();
        assert_eq!(cfg.simulation.threads, 4);
    }

    #[test]
    fn scenario_file_is_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("s.toml");
        std::fs::write(&path, "[fleet]\ntarget_gw = 90.0\n").unwrap();
        let cli = parse(&["--scenario", path.to_str().unwrap()]).unwrap();
        let cfg = cli.scenario_config().unwrap();
        assert_eq!(cfg.fleet.target_gw, Some(90.0));
    }
}
