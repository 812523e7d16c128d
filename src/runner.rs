//! Scenario runner: builds fleet inputs, runs the engine, and derives every
//! report from the result.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use rayon::prelude::*;
use serde::Serialize;
use tracing::{info, warn};

use crate::config::ScenarioConfig;
use crate::error::{Error, Result};
use crate::io::InputCache;
use crate::io::import::{
    SiteRecord, into_sites, load_capacity_factors, load_plant_outputs, load_site_records,
};
use crate::plant::{Site, SiteId, SyntheticWeather};
use crate::sim::{
    CancellationToken, DispatchComparison, Engine, FleetDiagnostics, FleetInputs, FleetSnapshot,
    Parallelism, PlantRuns, RegionalCorrelation, ReliabilityMetrics, aggregate, runs_from_outputs,
};

/// Loads fleet inputs from CSV tables or the synthetic generator.
///
/// Parsed tables are kept between calls and reused until the file changes.
#[derive(Debug, Default)]
pub struct InputLoader {
    sites: InputCache<Vec<SiteRecord>>,
    capacity_factors: InputCache<BTreeMap<SiteId, Vec<f64>>>,
    outputs: InputCache<BTreeMap<SiteId, Vec<f64>>>,
}

impl InputLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds validated inputs for `config`.
    ///
    /// # Errors
    ///
    /// Returns an I/O or parse error for unreadable tables and a
    /// validation error for inconsistent ones.
    pub fn load(&mut self, config: &ScenarioConfig) -> Result<FleetInputs> {
        match config.inputs.tables() {
            Some((sites_path, cf_path)) => {
                let records = self.sites.get_or_load(sites_path, load_site_records)?;
                let cf = self.capacity_factors.get_or_load(cf_path, load_capacity_factors)?;
                let sites = into_sites((*records).clone(), &config.plant);
                info!(
                    sites = sites.len(),
                    path = %sites_path.display(),
                    "using site table"
                );
                Ok(FleetInputs::new(sites, Arc::unwrap_or_clone(cf))?)
            }
            None => synthetic_inputs(config),
        }
    }

    /// Loads the per-plant output table of another dispatcher.
    ///
    /// # Errors
    ///
    /// Returns an I/O or parse error for an unreadable table.
    pub fn load_outputs(&mut self, path: &Path) -> Result<Arc<BTreeMap<SiteId, Vec<f64>>>> {
        self.outputs.get_or_load(path, load_plant_outputs)
    }

    /// Drops all cached tables.
    pub fn clear(&mut self) {
        self.sites.clear();
        self.capacity_factors.clear();
        self.outputs.clear();
    }
}

/// Generates a synthetic fleet from the `[synthetic]` section.
///
/// Sites are assigned to regions round-robin and share that region's cloud
/// series. The result depends only on the configuration and seed.
///
/// # Errors
///
/// Returns [`Error::Config`] for an empty site count or region list.
pub fn synthetic_inputs(config: &ScenarioConfig) -> Result<FleetInputs> {
    let syn = &config.synthetic;
    if syn.sites == 0 || syn.regions.is_empty() {
        return Err(Error::Config(
            config
                .validate()
                .into_iter()
                .filter(|e| e.field.starts_with("synthetic"))
                .collect(),
        ));
    }

    let weather = SyntheticWeather::new(syn.weather, config.simulation.seed);
    let clouds: Vec<Vec<f64>> = (0..syn.regions.len())
        .into_par_iter()
        .map(|r| weather.region_clouds(r))
        .collect();

    let (sites, series): (Vec<Site>, Vec<(SiteId, Vec<f64>)>) = (0..syn.sites)
        .into_par_iter()
        .map(|i| {
            let region = i % syn.regions.len();
            let id = SiteId(i as u32);
            let site = Site::new(id, syn.regions[region].clone(), config.plant);
            let cf = weather.site_capacity_factors(&clouds[region], i);
            (site, (id, cf))
        })
        .unzip();

    info!(
        sites = sites.len(),
        regions = syn.regions.len(),
        seed = config.simulation.seed,
        "generated synthetic fleet"
    );
    Ok(FleetInputs::new(sites, series.into_iter().collect())?)
}

/// Fleet-level summary of one scenario run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub sites: usize,
    /// Sum of plant targets (GW).
    pub nameplate_target_gw: f64,
    pub fleet_target_gw: f64,
    /// `nameplate / fleet target - 1`.
    pub reserve_margin: f64,
    pub metrics: ReliabilityMetrics,
    pub diagnostics: FleetDiagnostics,
    pub correlation: RegionalCorrelation,
    /// Externally dispatched outputs scored against the same fleet.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comparison: Option<DispatchComparison>,
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Fleet ---")?;
        writeln!(f, "Plants:                {}", self.sites)?;
        writeln!(f, "Nameplate target:      {:.2} GW", self.nameplate_target_gw)?;
        writeln!(f, "Fleet target:          {:.2} GW", self.fleet_target_gw)?;
        writeln!(
            f,
            "Reserve margin:        {:.1}%",
            100.0 * self.reserve_margin
        )?;
        writeln!(f)?;
        writeln!(f, "{}", self.metrics)?;
        writeln!(f, "{}", self.diagnostics)?;
        write!(f, "{}", self.correlation)?;
        if let Some(c) = &self.comparison {
            write!(f, "\n{c}")?;
        }
        Ok(())
    }
}

/// Everything produced by one scenario run.
#[derive(Debug)]
pub struct RunOutcome {
    pub inputs: FleetInputs,
    pub runs: PlantRuns,
    pub fleet: Vec<FleetSnapshot>,
    pub report: Report,
}

/// Runs a full scenario: inputs, dispatch, aggregation, and metrics.
///
/// # Errors
///
/// Returns [`Error::Config`] listing every configuration problem, or the
/// first input, simulation, or metric error.
pub fn run_scenario(
    config: &ScenarioConfig,
    loader: &mut InputLoader,
    cancel: &CancellationToken,
) -> Result<RunOutcome> {
    let errors = config.validate();
    if !errors.is_empty() {
        return Err(Error::Config(errors));
    }

    let inputs = loader.load(config)?;

    let parallelism = if config.simulation.parallel {
        Parallelism::Parallel {
            threads: config.simulation.threads,
        }
    } else {
        Parallelism::Sequential
    };
    let runs = Engine::new(parallelism)
        .with_cancellation(cancel.clone())
        .run(&inputs)?;
    let fleet = aggregate(&runs)?;

    let nameplate_target_gw = inputs.nameplate_target_gw();
    let fleet_target_gw = config.fleet.resolve_target_gw(nameplate_target_gw);
    let thresholds = config.fleet.resolve_thresholds_gw(fleet_target_gw);

    let metrics = ReliabilityMetrics::compute(
        &fleet,
        fleet_target_gw,
        &thresholds,
        config.fleet.week_boundary,
    )?;
    let diagnostics = FleetDiagnostics::from_runs(
        &runs,
        &fleet,
        config.fleet.failure_cluster_size,
        config.fleet.near_target_fraction,
    )?;

    let known = inputs.regions();
    for region in &config.fleet.correlation_regions {
        if !known.contains(region) {
            warn!(region = %region, "correlation region has no plants");
        }
    }
    let correlation =
        RegionalCorrelation::compute(inputs.sites(), &runs, &config.fleet.correlation_regions);

    if let Some(t) = metrics.at(fleet_target_gw) {
        info!(
            hourly = t.hourly.fraction(),
            daily = t.daily.fraction(),
            weekly = t.weekly.fraction(),
            "fleet availability at target"
        );
    }

    let comparison = match &config.inputs.compare_outputs_csv {
        Some(path) => Some(compare_outputs(
            path,
            loader,
            &inputs,
            &metrics,
            config,
            fleet_target_gw,
            &thresholds,
        )?),
        None => None,
    };

    let report = Report {
        sites: inputs.len(),
        nameplate_target_gw,
        fleet_target_gw,
        reserve_margin: nameplate_target_gw / fleet_target_gw - 1.0,
        metrics,
        diagnostics,
        correlation,
        comparison,
    };

    Ok(RunOutcome {
        inputs,
        runs,
        fleet,
        report,
    })
}

fn compare_outputs(
    path: &Path,
    loader: &mut InputLoader,
    inputs: &FleetInputs,
    greedy: &ReliabilityMetrics,
    config: &ScenarioConfig,
    fleet_target_gw: f64,
    thresholds: &[f64],
) -> Result<DispatchComparison> {
    let outputs = loader.load_outputs(path)?;
    let runs = runs_from_outputs(inputs, &outputs)?;
    let fleet = aggregate(&runs)?;
    let metrics = ReliabilityMetrics::compute(
        &fleet,
        fleet_target_gw,
        thresholds,
        config.fleet.week_boundary,
    )?;

    let label = path
        .file_stem()
        .map_or_else(|| "compared".to_string(), |s| s.to_string_lossy().into_owned());
    let comparison = DispatchComparison::new(label, greedy, metrics);
    if let Some(g) = comparison.hourly_gaps.first() {
        info!(
            label = %comparison.label,
            greedy_pct = g.greedy_pct,
            compared_pct = g.compared_pct,
            gap_pp = g.gap_pp,
            "compared dispatch scored"
        );
    }
    Ok(comparison)
}
