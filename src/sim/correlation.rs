//! Regional failure correlation.
//!
//! For each region the hourly failure fraction is the share of its plants
//! delivering less than their target. Regions sharing weather show strongly
//! correlated fractions.

use std::fmt;

use serde::Serialize;

use crate::plant::Site;

use super::types::{HOURS_PER_YEAR, PlantRuns};

/// Share of region A's plants that must be failing for an hour to count as
/// a regional failure hour.
pub const REGIONAL_FAILURE_SHARE: f64 = 0.5;

/// Hourly failure fraction of one region.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionFailure {
    pub region: String,
    pub plants: usize,
    /// Mean of `hourly` over the year.
    pub overall_rate: f64,
    #[serde(skip)]
    pub hourly: Vec<f64>,
}

/// Failure rate of `region` in hours when `given` is in regional failure.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConditionalFailure {
    pub given: String,
    pub region: String,
    /// Hours in which more than half of `given` failed.
    pub given_failure_hours: usize,
    pub overall_rate: f64,
    /// `None` when `given` never reaches regional failure.
    pub conditional_rate: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionalCorrelation {
    pub regions: Vec<RegionFailure>,
    /// Pearson correlation between region failure fractions, row-major in
    /// `regions` order. `None` where either series has zero variance.
    pub matrix: Vec<Vec<Option<f64>>>,
    pub conditional: Vec<ConditionalFailure>,
}

impl RegionalCorrelation {
    /// Correlates failure fractions of `regions`.
    ///
    /// A region with no plants gets an all-zero series, which correlates
    /// with nothing.
    pub fn compute(sites: &[Site], runs: &PlantRuns, regions: &[String]) -> Self {
        let regions: Vec<RegionFailure> = regions
            .iter()
            .map(|region| region_failure(sites, runs, region))
            .collect();

        let matrix = regions
            .iter()
            .map(|a| {
                regions
                    .iter()
                    .map(|b| pearson(&a.hourly, &b.hourly))
                    .collect()
            })
            .collect();

        let mut conditional = Vec::new();
        for given in &regions {
            for other in &regions {
                if given.region == other.region {
                    continue;
                }
                conditional.push(conditional_failure(given, other));
            }
        }

        Self {
            regions,
            matrix,
            conditional,
        }
    }
}

fn region_failure(sites: &[Site], runs: &PlantRuns, region: &str) -> RegionFailure {
    let members: Vec<_> = sites
        .iter()
        .filter(|s| s.region == region)
        .filter_map(|s| runs.get(&s.id))
        .collect();

    let len = members.first().map_or(HOURS_PER_YEAR, |states| states.len());
    let mut hourly = vec![0.0; len];
    if !members.is_empty() {
        for states in &members {
            for (slot, state) in hourly.iter_mut().zip(states.iter()) {
                if state.is_shortfall() {
                    *slot += 1.0;
                }
            }
        }
        let n = members.len() as f64;
        hourly.iter_mut().for_each(|v| *v /= n);
    }

    RegionFailure {
        region: region.to_owned(),
        plants: members.len(),
        overall_rate: mean(&hourly),
        hourly,
    }
}

fn conditional_failure(given: &RegionFailure, other: &RegionFailure) -> ConditionalFailure {
    let selected: Vec<f64> = given
        .hourly
        .iter()
        .zip(&other.hourly)
        .filter(|&(&g, _)| g > REGIONAL_FAILURE_SHARE)
        .map(|(_, &o)| o)
        .collect();

    ConditionalFailure {
        given: given.region.clone(),
        region: other.region.clone(),
        given_failure_hours: selected.len(),
        overall_rate: other.overall_rate,
        conditional_rate: (!selected.is_empty()).then(|| mean(&selected)),
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

/// Pearson correlation coefficient, `None` for mismatched lengths, fewer
/// than two points, or a constant series.
pub fn pearson(a: &[f64], b: &[f64]) -> Option<f64> {
    if a.len() != b.len() || a.len() < 2 {
        return None;
    }
    let (ma, mb) = (mean(a), mean(b));
    let mut cov = 0.0;
    let mut va = 0.0;
    let mut vb = 0.0;
    for (&x, &y) in a.iter().zip(b) {
        let (dx, dy) = (x - ma, y - mb);
        cov += dx * dy;
        va += dx * dx;
        vb += dy * dy;
    }
    if va <= 0.0 || vb <= 0.0 {
        return None;
    }
    Some((cov / (va.sqrt() * vb.sqrt())).clamp(-1.0, 1.0))
}

impl fmt::Display for RegionalCorrelation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Regional Failure Correlation ---")?;
        for r in &self.regions {
            writeln!(
                f,
                "{:<16} {:>3} plants, failing {:.1}% of plant-hours",
                r.region,
                r.plants,
                100.0 * r.overall_rate
            )?;
        }
        for (r, row) in self.regions.iter().zip(&self.matrix) {
            write!(f, "{:<16}", r.region)?;
            for value in row {
                match value {
                    Some(v) => write!(f, " {v:>6.2}")?,
                    None => write!(f, " {:>6}", "-")?,
                }
            }
            writeln!(f)?;
        }
        for c in &self.conditional {
            match c.conditional_rate {
                Some(rate) => writeln!(
                    f,
                    "When {} fails, {} failure rate {:.0}% -> {:.0}%",
                    c.given,
                    c.region,
                    100.0 * c.overall_rate,
                    100.0 * rate
                )?,
                None => writeln!(f, "{} never fails regionally", c.given)?,
            }
        }
        Ok(())
    }
}
