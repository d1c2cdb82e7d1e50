//! Shared test fixtures for integration tests.

#![allow(dead_code)]

use std::io;

use heat_dispatch_sim::io::diagnostics::DiagnosticsSink;
use heat_dispatch_sim::model::{
    BufferSpec, HOURS, HeatNet, Producer, ProducerFunction, Project, Weather,
};

/// Tolerance for per-hour energy balance checks (kW).
pub const BALANCE_EPS: f64 = 1e-6;

/// Buffer with no volume: it never charges, discharges or loses heat.
pub fn no_buffer() -> BufferSpec {
    BufferSpec {
        volume_litres: 0.0,
        ..BufferSpec::default()
    }
}

/// Project with a constant load curve, mild constant weather and no buffer.
pub fn constant_project(load_kw: f64, producers: Vec<Producer>) -> Project {
    Project {
        load_curve: vec![load_kw; HOURS],
        heat_net: HeatNet::default(),
        buffer: no_buffer(),
        consumer_heating_limit: 15.0,
        weather: constant_weather(5.0),
        producers,
    }
}

pub fn constant_weather(temperature: f64) -> Weather {
    Weather {
        temperatures: vec![temperature; HOURS],
        radiation: vec![0.0; HOURS],
    }
}

/// Weather alternating between `even` and `odd` hour temperatures.
pub fn alternating_weather(even: f64, odd: f64) -> Weather {
    Weather {
        temperatures: (0..HOURS)
            .map(|h| if h % 2 == 0 { even } else { odd })
            .collect(),
        radiation: vec![0.0; HOURS],
    }
}

/// A plain base-load producer with ample capacity.
pub fn big_boiler(id: &str) -> Producer {
    Producer::new(id, ProducerFunction::BaseLoad, 10_000.0)
}

/// Sink that keeps every artifact in memory.
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub texts: Vec<(String, String)>,
    pub series: Vec<(String, Vec<f64>)>,
}

impl DiagnosticsSink for RecordingSink {
    fn write_text(&mut self, name: &str, text: &str) -> io::Result<()> {
        self.texts.push((name.to_string(), text.to_string()));
        Ok(())
    }

    fn write_series(&mut self, name: &str, values: &[f64]) -> io::Result<()> {
        self.series.push((name.to_string(), values.to_vec()));
        Ok(())
    }
}

/// Sink whose every write fails.
#[derive(Debug, Default)]
pub struct FailingSink {
    pub attempts: usize,
}

impl DiagnosticsSink for FailingSink {
    fn write_text(&mut self, _name: &str, _text: &str) -> io::Result<()> {
        self.attempts += 1;
        Err(io::Error::new(io::ErrorKind::PermissionDenied, "read-only"))
    }

    fn write_series(&mut self, _name: &str, _values: &[f64]) -> io::Result<()> {
        self.attempts += 1;
        Err(io::Error::other("disk full"))
    }
}
