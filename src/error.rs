//! Error taxonomy for simulation, aggregation, and input loading.

use std::path::PathBuf;

use thiserror::Error;

use crate::config::ConfigError;
use crate::plant::SiteId;

/// Malformed input shape or range, detected before any simulation runs.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("site {site}: expected {expected} hourly capacity factors, got {actual}")]
    SeriesLength {
        site: SiteId,
        expected: usize,
        actual: usize,
    },

    #[error("site {site}, hour {hour}: capacity factor {value} is outside [0, 1]")]
    CapacityFactorOutOfRange { site: SiteId, hour: usize, value: f64 },

    #[error("site {site}: {field} must be > 0, got {value}")]
    NonPositive {
        site: SiteId,
        field: &'static str,
        value: f64,
    },

    #[error("site {site}: {field} must be in {range}, got {value}")]
    OutOfRange {
        site: SiteId,
        field: &'static str,
        range: &'static str,
        value: f64,
    },

    #[error("site table has {sites} sites but capacity factor table has {series} columns")]
    SiteCountMismatch { sites: usize, series: usize },

    #[error("capacity factor table has no column for site {0}")]
    MissingSeries(SiteId),

    #[error("duplicate site id {0}")]
    DuplicateSite(SiteId),

    #[error("site {site}: expected {expected} hourly plant states, got {actual}")]
    ShapeMismatch {
        site: SiteId,
        expected: usize,
        actual: usize,
    },

    #[error("dispatch output table has {columns} columns for {sites} sites")]
    OutputCountMismatch { sites: usize, columns: usize },

    #[error("dispatch output table has no column for site {0}")]
    MissingOutput(SiteId),

    #[error("site {site}, hour {hour}: dispatch output {value} GW is negative or not finite")]
    InvalidOutput { site: SiteId, hour: usize, value: f64 },

    #[error("fleet has no plants")]
    EmptyFleet,

    #[error("fleet output series is empty")]
    EmptySeries,

    #[error("{field} must be a positive finite number, got {value}")]
    InvalidParameter { field: &'static str, value: f64 },
}

/// State of charge left the physical envelope after clamping.
///
/// Indicates an arithmetic defect in the dispatch recurrence and is never
/// recoverable.
#[derive(Debug, Clone, PartialEq, Error)]
#[error(
    "site {site}, hour {hour}: state of charge {soc_gwh} GWh outside [0, {capacity_gwh}] GWh"
)]
pub struct InvariantViolation {
    pub site: SiteId,
    pub hour: usize,
    pub soc_gwh: f64,
    pub capacity_gwh: f64,
}

/// Crate-level error.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("invariant violation: {0}")]
    Invariant(#[from] InvariantViolation),

    #[error("{}", join_config_errors(.0))]
    Config(Vec<ConfigError>),

    #[error("cannot access \"{}\": {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed CSV in \"{}\": {message}", path.display())]
    Parse { path: PathBuf, message: String },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("run cancelled after {completed} of {total} sites")]
    Cancelled { completed: usize, total: usize },
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Self::Config(vec![err])
    }
}

fn join_config_errors(errors: &[ConfigError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
