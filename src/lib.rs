//! Greedy dispatch simulator for a fleet of solar-plus-storage plants, with
//! fleet aggregation and reliability metrics.

pub mod config;
pub mod error;
/// CSV import/export and the input cache.
pub mod io;
/// Sites, batteries, and synthetic weather.
pub mod plant;
pub mod runner;
/// Dispatch engine, fleet aggregation, and metrics.
pub mod sim;

pub use error::{Error, Result};
