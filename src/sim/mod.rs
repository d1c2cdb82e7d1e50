pub mod bounds;
pub mod engine;
/// Scheduled producer outages.
pub mod interruption;
pub mod kpi;
/// Seasonal heat-net operating points.
pub mod seasonal;
pub mod types;

pub use engine::{Engine, simulate};
pub use kpi::EnergySummary;
pub use types::EnergyResult;
