//! Hourly district-heating dispatch simulator.
//!
//! One simulated year is 8760 hours. Each hour the engine offers the demand
//! to the producers in priority order, charges surplus heat into a
//! three-tier buffer tank and draws on it for whatever the producers
//! did not cover.

pub mod config;
pub mod devices;
pub mod error;
pub mod io;
pub mod model;
pub mod profiles;
/// Dispatch engine, producer bounds, interruptions, seasonal model and reporting.
pub mod sim;
