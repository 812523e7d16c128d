//! Validated fleet inputs: the site table joined with its capacity factor matrix.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::ValidationError;
use crate::plant::{Site, SiteId};

use super::dispatch::validate_inputs;

/// Sites and their hourly capacity factors, checked as a whole before any
/// simulation starts.
#[derive(Debug, Clone)]
pub struct FleetInputs {
    sites: Vec<Site>,
    capacity_factors: BTreeMap<SiteId, Vec<f64>>,
}

impl FleetInputs {
    /// Joins a site table with a capacity factor table.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] for duplicate site ids, differing table
    /// sizes, a site without a series, or any per-site input problem.
    pub fn new(
        sites: Vec<Site>,
        capacity_factors: BTreeMap<SiteId, Vec<f64>>,
    ) -> Result<Self, ValidationError> {
        if sites.is_empty() {
            return Err(ValidationError::EmptyFleet);
        }

        let mut seen = BTreeSet::new();
        for site in &sites {
            if !seen.insert(site.id) {
                return Err(ValidationError::DuplicateSite(site.id));
            }
        }

        if sites.len() != capacity_factors.len() {
            return Err(ValidationError::SiteCountMismatch {
                sites: sites.len(),
                series: capacity_factors.len(),
            });
        }

        for site in &sites {
            let series = capacity_factors
                .get(&site.id)
                .ok_or(ValidationError::MissingSeries(site.id))?;
            validate_inputs(site, series)?;
        }

        Ok(Self {
            sites,
            capacity_factors,
        })
    }

    pub fn sites(&self) -> &[Site] {
        &self.sites
    }

    pub fn len(&self) -> usize {
        self.sites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }

    /// Capacity factor series of `site`.
    pub fn capacity_factors(&self, site: SiteId) -> Option<&[f64]> {
        self.capacity_factors.get(&site).map(Vec::as_slice)
    }

    /// Every series keyed by site.
    pub fn capacity_factor_table(&self) -> &BTreeMap<SiteId, Vec<f64>> {
        &self.capacity_factors
    }

    /// Sites paired with their series, in site table order.
    pub fn iter(&self) -> impl Iterator<Item = (&Site, &[f64])> {
        self.sites.iter().filter_map(|site| {
            self.capacity_factors
                .get(&site.id)
                .map(|cf| (site, cf.as_slice()))
        })
    }

    /// Sum of every plant's own target (GW).
    pub fn nameplate_target_gw(&self) -> f64 {
        self.sites.iter().map(|s| s.params.target_gw).sum()
    }

    /// Distinct region labels in first-seen order.
    pub fn regions(&self) -> Vec<String> {
        let mut regions: Vec<String> = Vec::new();
        for site in &self.sites {
            if !regions.contains(&site.region) {
                regions.push(site.region.clone());
            }
        }
        regions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plant::PlantParams;
    use crate::sim::types::HOURS_PER_YEAR;

    fn site(id: u32, region: &str) -> Site {
        Site::new(SiteId(id), region, PlantParams::default())
    }

    fn series(ids: &[u32]) -> BTreeMap<SiteId, Vec<f64>> {
        ids.iter()
            .map(|&id| (SiteId(id), vec![0.2; HOURS_PER_YEAR]))
            .collect()
    }

    #[test]
    fn joins_matching_tables() {
        let inputs = FleetInputs::new(
            vec![site(0, "Assam"), site(1, "Gujarat"), site(2, "Assam")],
            series(&[0, 1, 2]),
        )
        .unwrap();
        assert_eq!(inputs.len(), 3);
        assert_eq!(inputs.iter().count(), 3);
        assert_eq!(inputs.nameplate_target_gw(), 3.0);
        assert_eq!(inputs.regions(), vec!["Assam", "Gujarat"]);
    }

    #[test]
    fn site_count_mismatch_is_rejected() {
        let err = FleetInputs::new(vec![site(0, "Assam")], series(&[0, 1])).unwrap_err();
        assert_eq!(
            err,
            ValidationError::SiteCountMismatch {
                sites: 1,
                series: 2
            }
        );
    }

    #[test]
    fn missing_series_is_rejected() {
        let err = FleetInputs::new(vec![site(0, "Assam")], series(&[5])).unwrap_err();
        assert_eq!(err, ValidationError::MissingSeries(SiteId(0)));
    }

    #[test]
    fn duplicate_site_is_rejected() {
        let err =
            FleetInputs::new(vec![site(4, "Assam"), site(4, "Bihar")], series(&[4])).unwrap_err();
        assert_eq!(err, ValidationError::DuplicateSite(SiteId(4)));
    }

    #[test]
    fn empty_fleet_is_rejected() {
        assert_eq!(
            FleetInputs::new(Vec::new(), BTreeMap::new()).unwrap_err(),
            ValidationError::EmptyFleet
        );
    }

    #[test]
    fn bad_series_is_rejected_up_front() {
        let mut cf = series(&[0]);
        cf.get_mut(&SiteId(0)).unwrap().truncate(10);
        assert!(matches!(
            FleetInputs::new(vec![site(0, "Assam")], cf),
            Err(ValidationError::SeriesLength { actual: 10, .. })
        ));
    }
}
