//! CSV import of the site table and the capacity factor matrix.
//!
//! The site table has one row per plant:
//!
//! ```text
//! site_id,state,lat,lon,solar_gw,battery_gwh,target_gw,efficiency,initial_soc
//! ```
//!
//! `center_lat`/`center_lon` are accepted for the coordinates. Plant
//! parameter columns may be absent or empty and then fall back to the
//! scenario's `[plant]` section. Without a `site_id` column the 0-based row
//! index is the id, which reads tables like
//!
//! ```text
//! state,center_lat,center_lon,avg_cf_dc,total_land_km2
//! ```
//!
//! Unknown columns are ignored.
//!
//! The capacity factor table is wide: an `hour` column followed by one
//! column per site id, one row per hour. Per-plant dispatch output tables
//! from other dispatchers use the same layout with GW values.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::plant::{PlantParams, Site, SiteId};
use crate::sim::PlantRuns;

/// One row of the site table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteRecord {
    /// Explicit id; the row index stands in when the column is absent.
    #[serde(default)]
    pub site_id: Option<u32>,
    #[serde(alias = "region")]
    pub state: String,
    #[serde(default, alias = "center_lat")]
    pub lat: Option<f64>,
    #[serde(default, alias = "center_lon")]
    pub lon: Option<f64>,
    #[serde(default)]
    pub solar_gw: Option<f64>,
    #[serde(default)]
    pub battery_gwh: Option<f64>,
    #[serde(default)]
    pub target_gw: Option<f64>,
    #[serde(default)]
    pub efficiency: Option<f64>,
    #[serde(default)]
    pub initial_soc: Option<f64>,
}

impl SiteRecord {
    /// Builds a site, filling empty parameter cells from `defaults`.
    ///
    /// `row` is the 0-based position in the table and becomes the id of a
    /// record without one.
    pub fn into_site(self, row: usize, defaults: &PlantParams) -> Site {
        let params = PlantParams {
            solar_gw: self.solar_gw.unwrap_or(defaults.solar_gw),
            battery_gwh: self.battery_gwh.unwrap_or(defaults.battery_gwh),
            target_gw: self.target_gw.unwrap_or(defaults.target_gw),
            efficiency: self.efficiency.unwrap_or(defaults.efficiency),
            initial_soc: self.initial_soc.unwrap_or(defaults.initial_soc),
        };
        let id = self.site_id.unwrap_or(row as u32);
        Site::new(SiteId(id), self.state, params)
            .at(self.lat.unwrap_or(0.0), self.lon.unwrap_or(0.0))
    }
}

impl From<&Site> for SiteRecord {
    fn from(site: &Site) -> Self {
        Self {
            site_id: Some(site.id.0),
            state: site.region.clone(),
            lat: Some(site.lat),
            lon: Some(site.lon),
            solar_gw: Some(site.params.solar_gw),
            battery_gwh: Some(site.params.battery_gwh),
            target_gw: Some(site.params.target_gw),
            efficiency: Some(site.params.efficiency),
            initial_soc: Some(site.params.initial_soc),
        }
    }
}

fn open(path: &Path) -> Result<File> {
    File::open(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn create(path: &Path) -> Result<File> {
    File::create(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn parse_error(path: &Path, message: impl Into<String>) -> Error {
    Error::Parse {
        path: path.to_path_buf(),
        message: message.into(),
    }
}

/// Loads the site table at `path`.
///
/// # Errors
///
/// Returns [`Error::Io`] if the file cannot be opened and [`Error::Parse`]
/// for a malformed row.
pub fn load_sites(path: &Path, defaults: &PlantParams) -> Result<Vec<Site>> {
    Ok(into_sites(load_site_records(path)?, defaults))
}

/// Builds sites from table rows in order.
pub fn into_sites(records: Vec<SiteRecord>, defaults: &PlantParams) -> Vec<Site> {
    records
        .into_iter()
        .enumerate()
        .map(|(row, r)| r.into_site(row, defaults))
        .collect()
}

/// Loads the raw rows of the site table at `path`.
///
/// # Errors
///
/// Same as [`load_sites`].
pub fn load_site_records(path: &Path) -> Result<Vec<SiteRecord>> {
    let records = read_site_records(open(path)?).map_err(|message| parse_error(path, message))?;
    debug!(path = %path.display(), sites = records.len(), "site table loaded");
    Ok(records)
}

/// Reads a site table from any reader.
///
/// # Errors
///
/// Returns a description of a malformed row, or of a table where only some
/// rows carry a `site_id`.
pub fn read_sites(
    reader: impl Read,
    defaults: &PlantParams,
) -> std::result::Result<Vec<Site>, String> {
    Ok(into_sites(read_site_records(reader)?, defaults))
}

fn read_site_records(reader: impl Read) -> std::result::Result<Vec<SiteRecord>, String> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let records: Vec<SiteRecord> = rdr
        .deserialize()
        .collect::<csv::Result<_>>()
        .map_err(|e| e.to_string())?;

    let with_id = records.iter().filter(|r| r.site_id.is_some()).count();
    if with_id != 0 && with_id != records.len() {
        return Err(format!(
            "{with_id} of {} rows have a site_id; give every row an id or none",
            records.len()
        ));
    }
    Ok(records)
}

/// Loads the wide capacity factor table at `path`.
///
/// # Errors
///
/// Returns [`Error::Io`] if the file cannot be opened and [`Error::Parse`]
/// for a bad header, a non-numeric cell, a ragged row, or out-of-order hours.
/// Series length and value range are checked later against the site table.
pub fn load_capacity_factors(path: &Path) -> Result<BTreeMap<SiteId, Vec<f64>>> {
    let table = read_capacity_factors(open(path)?).map_err(|message| parse_error(path, message))?;
    debug!(path = %path.display(), columns = table.len(), "capacity factor table loaded");
    Ok(table)
}

/// Reads a wide capacity factor table from any reader.
///
/// # Errors
///
/// Returns a description of the first problem found.
pub fn read_capacity_factors(
    reader: impl Read,
) -> std::result::Result<BTreeMap<SiteId, Vec<f64>>, String> {
    read_wide_table(reader)
}

/// Loads a wide per-plant dispatch output table (GW) at `path`.
///
/// # Errors
///
/// Same as [`load_capacity_factors`]. Values are checked later against the
/// fleet they are compared with.
pub fn load_plant_outputs(path: &Path) -> Result<BTreeMap<SiteId, Vec<f64>>> {
    let table = read_plant_outputs(open(path)?).map_err(|message| parse_error(path, message))?;
    debug!(path = %path.display(), columns = table.len(), "plant output table loaded");
    Ok(table)
}

/// Reads a wide per-plant dispatch output table from any reader.
///
/// # Errors
///
/// Returns a description of the first problem found.
pub fn read_plant_outputs(
    reader: impl Read,
) -> std::result::Result<BTreeMap<SiteId, Vec<f64>>, String> {
    read_wide_table(reader)
}

fn read_wide_table(reader: impl Read) -> std::result::Result<BTreeMap<SiteId, Vec<f64>>, String> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = rdr.headers().map_err(|e| e.to_string())?.clone();
    let mut columns = headers.iter();
    if columns.next() != Some("hour") {
        return Err("first column must be \"hour\"".to_string());
    }
    let mut ids = Vec::with_capacity(headers.len().saturating_sub(1));
    for name in columns {
        let id: u32 = name
            .parse()
            .map_err(|_| format!("column \"{name}\" is not a site id"))?;
        if ids.contains(&SiteId(id)) {
            return Err(format!("site {id} appears in more than one column"));
        }
        ids.push(SiteId(id));
    }

    let mut series: Vec<Vec<f64>> = vec![Vec::new(); ids.len()];
    for (row, record) in rdr.records().enumerate() {
        let record = record.map_err(|e| e.to_string())?;
        let hour: usize = record
            .get(0)
            .and_then(|h| h.parse().ok())
            .ok_or_else(|| format!("row {}: bad hour index", row + 1))?;
        if hour != row {
            return Err(format!("row {}: expected hour {row}, got {hour}", row + 1));
        }
        for (column, cell) in series.iter_mut().zip(record.iter().skip(1)) {
            let value: f64 = cell
                .parse()
                .map_err(|_| format!("row {}: \"{cell}\" is not a number", row + 1))?;
            column.push(value);
        }
    }

    Ok(ids.into_iter().zip(series).collect())
}

/// Writes the site table to `path` in the layout [`load_sites`] reads.
///
/// # Errors
///
/// Returns an error if the file cannot be created or written.
pub fn write_sites_csv(sites: &[Site], path: &Path) -> Result<()> {
    write_sites(sites, create(path)?)?;
    Ok(())
}

/// Writes the site table to any writer.
///
/// # Errors
///
/// Returns a [`csv::Error`] if writing fails.
pub fn write_sites(sites: &[Site], writer: impl Write) -> csv::Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    for site in sites {
        wtr.serialize(SiteRecord::from(site))?;
    }
    wtr.flush()?;
    Ok(())
}

/// Writes a wide capacity factor table to `path`, columns in site id order.
///
/// # Errors
///
/// Returns an error if the file cannot be created or written.
pub fn write_capacity_factors_csv(table: &BTreeMap<SiteId, Vec<f64>>, path: &Path) -> Result<()> {
    write_capacity_factors(table, create(path)?)?;
    Ok(())
}

/// Writes a wide capacity factor table to any writer.
///
/// # Errors
///
/// Returns a [`csv::Error`] if writing fails.
pub fn write_capacity_factors(
    table: &BTreeMap<SiteId, Vec<f64>>,
    writer: impl Write,
) -> csv::Result<()> {
    write_wide_table(table, writer)
}

/// Writes the grid output of every plant as a wide table to `path`, in the
/// layout [`load_plant_outputs`] reads.
///
/// # Errors
///
/// Returns an error if the file cannot be created or written.
pub fn write_plant_outputs_csv(runs: &PlantRuns, path: &Path) -> Result<()> {
    write_plant_outputs(runs, create(path)?)?;
    Ok(())
}

/// Writes the grid output of every plant as a wide table to any writer.
///
/// # Errors
///
/// Returns a [`csv::Error`] if writing fails.
pub fn write_plant_outputs(runs: &PlantRuns, writer: impl Write) -> csv::Result<()> {
    let table: BTreeMap<SiteId, Vec<f64>> = runs
        .iter()
        .map(|(&id, states)| (id, states.iter().map(|s| s.grid_output_gw).collect()))
        .collect();
    write_wide_table(&table, writer)
}

fn write_wide_table(table: &BTreeMap<SiteId, Vec<f64>>, writer: impl Write) -> csv::Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);

    let mut header = vec!["hour".to_string()];
    header.extend(table.keys().map(ToString::to_string));
    wtr.write_record(&header)?;

    let hours = table.values().map(Vec::len).max().unwrap_or(0);
    for hour in 0..hours {
        let mut row = Vec::with_capacity(table.len() + 1);
        row.push(hour.to_string());
        for series in table.values() {
            row.push(series.get(hour).map_or_else(String::new, |v| v.to_string()));
        }
        wtr.write_record(&row)?;
    }

    wtr.flush()?;
    Ok(())
}
