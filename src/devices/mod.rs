//! Physical sub-models: thermal buffer ledger and producer states.

/// Stratified three-layer buffer tank.
pub mod buffer;
/// Air-source heat pump model.
pub mod heat_pump;
/// Solar thermal collector field model.
pub mod solar;
pub mod types;

pub use buffer::BufferLedger;
pub use heat_pump::HeatPumpState;
pub use solar::{SolarPhase, SolarState};
pub use types::{BufferTemperatures, BufferTier, HourWeather, PhysicalState};
