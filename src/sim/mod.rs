pub mod compare;
pub mod correlation;
pub mod diagnostics;
pub mod dispatch;
pub mod engine;
pub mod fleet;
pub mod inputs;
pub mod metrics;
pub mod types;
pub mod window;

pub use compare::{DispatchComparison, runs_from_outputs};
pub use correlation::RegionalCorrelation;
pub use diagnostics::FleetDiagnostics;
pub use dispatch::simulate;
pub use engine::{CancellationToken, Engine, Parallelism};
pub use fleet::aggregate;
pub use inputs::FleetInputs;
pub use metrics::ReliabilityMetrics;
pub use types::{
    FleetSnapshot, HOURS_PER_DAY, HOURS_PER_WEEK, HOURS_PER_YEAR, PlantRuns, PlantState,
};
pub use window::WeekBoundary;
