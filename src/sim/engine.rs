//! Fleet engine: maps the per-site dispatch over every site.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Instant;

use rayon::ThreadPoolBuilder;
use rayon::prelude::*;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::plant::{Site, SiteId};

use super::dispatch::simulate;
use super::inputs::FleetInputs;
use super::types::{PlantRuns, PlantState};

/// How sites are scheduled. Hours within one site are always sequential.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parallelism {
    /// One site after another on the calling thread.
    Sequential,
    /// A rayon worker pool; `threads == 0` uses one worker per CPU.
    Parallel { threads: usize },
}

/// Cooperative stop flag, checked before each site starts.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Runs greedy dispatch for a whole fleet.
///
/// Sites share no mutable state, so the result is identical for every
/// [`Parallelism`] setting.
#[derive(Debug, Clone)]
pub struct Engine {
    parallelism: Parallelism,
    cancel: CancellationToken,
}

impl Engine {
    pub fn new(parallelism: Parallelism) -> Self {
        Self {
            parallelism,
            cancel: CancellationToken::new(),
        }
    }

    /// Attaches a token that can stop the run between sites.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn parallelism(&self) -> Parallelism {
        self.parallelism
    }

    /// Simulates every site and returns the per-site hourly states.
    ///
    /// # Errors
    ///
    /// Returns the error of the first failing site in site table order,
    /// [`Error::Cancelled`] if the token fired, or a thread pool error. No
    /// partial result is returned.
    pub fn run(&self, inputs: &FleetInputs) -> Result<PlantRuns> {
        let started = Instant::now();
        info!(
            sites = inputs.len(),
            parallelism = ?self.parallelism,
            "starting greedy dispatch"
        );

        let results = match self.parallelism {
            Parallelism::Sequential => self.run_sequential(inputs),
            Parallelism::Parallel { threads } => self.run_parallel(inputs, threads)?,
        };

        let mut runs = PlantRuns::new();
        for result in results {
            let (id, states) = result?;
            runs.insert(id, states);
        }

        info!(
            sites = runs.len(),
            elapsed_ms = (started.elapsed().as_millis() as u64),
            "greedy dispatch finished"
        );
        Ok(runs)
    }

    fn run_sequential(&self, inputs: &FleetInputs) -> Vec<Result<(SiteId, Vec<PlantState>)>> {
        let total = inputs.len();
        let mut results = Vec::with_capacity(total);
        for (completed, (site, cf)) in inputs.iter().enumerate() {
            if self.cancel.is_cancelled() {
                results.push(Err(Error::Cancelled { completed, total }));
                break;
            }
            let result = simulate_site(site, cf);
            let failed = result.is_err();
            results.push(result);
            if failed {
                break;
            }
        }
        results
    }

    fn run_parallel(
        &self,
        inputs: &FleetInputs,
        threads: usize,
    ) -> Result<Vec<Result<(SiteId, Vec<PlantState>)>>> {
        let mut builder = ThreadPoolBuilder::new();
        if threads > 0 {
            builder = builder.num_threads(threads);
        }
        let pool = builder.build()?;

        let total = inputs.len();
        let completed = AtomicUsize::new(0);
        let pairs: Vec<(&Site, &[f64])> = inputs.iter().collect();

        Ok(pool.install(|| {
            pairs
                .par_iter()
                .map(|&(site, cf)| {
                    if self.cancel.is_cancelled() {
                        return Err(Error::Cancelled {
                            completed: completed.load(Ordering::Relaxed),
                            total,
                        });
                    }
                    let result = simulate_site(site, cf);
                    completed.fetch_add(1, Ordering::Relaxed);
                    result
                })
                .collect()
        }))
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(Parallelism::Parallel { threads: 0 })
    }
}

fn simulate_site(site: &Site, capacity_factors: &[f64]) -> Result<(SiteId, Vec<PlantState>)> {
    let states = simulate(site, capacity_factors)?;
    debug!(site = %site.id, region = %site.region, "site simulated");
    Ok((site.id, states))
}
