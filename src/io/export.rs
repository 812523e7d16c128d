//! CSV and JSON export of simulation results.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use serde::Serialize;

use crate::error::{Error, Result};
use crate::sim::types::{FleetSnapshot, PlantRuns};

/// Column header of the per-plant CSV export.
const PLANT_HEADER: &str = "site_id,hour,solar_gw,grid_output_gw,charge_gw,discharge_gw,\
                            curtailment_gw,soc_gwh,shortfall_gw";

/// Column header of the fleet CSV export.
const FLEET_HEADER: &str = "hour,output_gw,target_gw,plants_failing";

fn create(path: &Path) -> Result<BufWriter<File>> {
    File::create(path)
        .map(BufWriter::new)
        .map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })
}

fn io_error(path: &Path) -> impl FnOnce(io::Error) -> Error + '_ {
    move |source| Error::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Exports every plant-hour to a CSV file at `path`.
///
/// Rows are ordered by site id, then hour, so identical runs produce
/// identical files.
///
/// # Errors
///
/// Returns [`Error::Io`] if the file cannot be created or written.
pub fn export_plant_csv(runs: &PlantRuns, path: &Path) -> Result<()> {
    write_plant_csv(runs, create(path)?).map_err(io_error(path))
}

/// Writes every plant-hour as CSV to any writer.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_plant_csv(runs: &PlantRuns, writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    wtr.write_record(PLANT_HEADER.split(',').map(str::trim))?;

    for (site, states) in runs {
        for s in states {
            wtr.write_record(&[
                site.to_string(),
                s.hour.to_string(),
                format!("{:.6}", s.solar_gw),
                format!("{:.6}", s.grid_output_gw),
                format!("{:.6}", s.charge_gw),
                format!("{:.6}", s.discharge_gw),
                format!("{:.6}", s.curtailment_gw),
                format!("{:.6}", s.soc_gwh),
                format!("{:.6}", s.shortfall_gw()),
            ])?;
        }
    }

    wtr.flush()?;
    Ok(())
}

/// Exports the fleet series to a CSV file at `path`.
///
/// # Errors
///
/// Returns [`Error::Io`] if the file cannot be created or written.
pub fn export_fleet_csv(fleet: &[FleetSnapshot], target_gw: f64, path: &Path) -> Result<()> {
    write_fleet_csv(fleet, target_gw, create(path)?).map_err(io_error(path))
}

/// Writes the fleet series as CSV to any writer.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_fleet_csv(
    fleet: &[FleetSnapshot],
    target_gw: f64,
    writer: impl Write,
) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    wtr.write_record(FLEET_HEADER.split(','))?;

    for s in fleet {
        wtr.write_record(&[
            s.hour.to_string(),
            format!("{:.6}", s.output_gw),
            format!("{target_gw:.6}"),
            s.plants_failing.to_string(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

/// Exports `report` as pretty-printed JSON to `path`.
///
/// # Errors
///
/// Returns [`Error::Io`] if the file cannot be created and [`Error::Json`]
/// if serialization fails.
pub fn export_json(report: &impl Serialize, path: &Path) -> Result<()> {
    let mut out = create(path)?;
    serde_json::to_writer_pretty(&mut out, report)?;
    out.write_all(b"\n").map_err(io_error(path))?;
    out.flush().map_err(io_error(path))
}
