//! Firm solar fleet simulator entry point: CLI wiring, logging, and exports.

mod cli;

use std::fs;
use std::process::ExitCode;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use firm_solar_sim::error::{Error, Result};
use firm_solar_sim::io::export::{export_fleet_csv, export_json, export_plant_csv};
use firm_solar_sim::io::import::{write_capacity_factors_csv, write_sites_csv};
use firm_solar_sim::runner::{InputLoader, RunOutcome, run_scenario};
use firm_solar_sim::sim::CancellationToken;

use crate::cli::Cli;

fn init_tracing(quiet: bool) {
    let default = if quiet { "warn" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.quiet);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let config = cli.scenario_config()?;
    let mut loader = InputLoader::new();
    let outcome = run_scenario(&config, &mut loader, &CancellationToken::new())?;

    println!("{}", outcome.report);
    export(cli, &outcome)
}

fn export(cli: &Cli, outcome: &RunOutcome) -> Result<()> {
    if let Some(path) = &cli.plant_out {
        export_plant_csv(&outcome.runs, path)?;
        info!(path = %path.display(), "plant results written");
    }
    if let Some(path) = &cli.fleet_out {
        export_fleet_csv(&outcome.fleet, outcome.report.fleet_target_gw, path)?;
        info!(path = %path.display(), "fleet series written");
    }
    if let Some(path) = &cli.metrics_json {
        export_json(&outcome.report, path)?;
        info!(path = %path.display(), "report written");
    }
    if let Some(dir) = &cli.inputs_out {
        fs::create_dir_all(dir).map_err(|source| Error::Io {
            path: dir.clone(),
            source,
        })?;
        write_sites_csv(outcome.inputs.sites(), &dir.join("sites.csv"))?;
        write_capacity_factors_csv(
            outcome.inputs.capacity_factor_table(),
            &dir.join("capacity_factors.csv"),
        )?;
        info!(dir = %dir.display(), "input tables written");
    }
    Ok(())
}
