//! Result aggregate of a dispatch run.

use std::collections::BTreeMap;

use crate::model::{HOURS, Project};

/// Everything a run produces. Hourly series have [`HOURS`] entries.
///
/// Per hour the series satisfy
/// `Σ producer_results + supplied_buffer_heat - buffer_charged + unmet_load = load_curve`.
#[derive(Debug, Clone, PartialEq)]
pub struct EnergyResult {
    /// Producer ids in dispatch order; indexes the per-producer vectors.
    pub producer_ids: Vec<String>,
    pub load_curve: Vec<f64>,
    /// Total heat supplied per hour: producer output, including what charged
    /// the buffer, plus buffer discharge (kW).
    pub supplied_power: Vec<f64>,
    /// Heat that reached the heat net (kW).
    pub net_supply: Vec<f64>,
    /// Heat delivered per producer and hour, `[producer][hour]` (kW).
    pub producer_results: Vec<Vec<f64>>,
    /// Unlimited HT headroom at the start of each hour (kWh).
    pub buffer_capacity: Vec<f64>,
    pub buffer_loss: Vec<f64>,
    /// Heat discharged from the buffer into the heat net (kW).
    pub supplied_buffer_heat: Vec<f64>,
    /// Surplus producer heat absorbed by the buffer (kW).
    pub buffer_charged: Vec<f64>,
    /// Demand neither producers nor buffer could cover (kW).
    pub unmet_load: Vec<f64>,
    /// Stagnation days per producer, set for solar producers only.
    pub producer_stagnation_days: Vec<Option<u32>>,
    /// Seasonal performance factor per producer, set for heat pumps only.
    pub producer_jaz: Vec<Option<f64>>,
    pub total_load: f64,
    /// Annual heat per producer id (kWh).
    pub total_heats: BTreeMap<String, f64>,
    pub total_produced_heat: f64,
    pub total_buffered_heat: f64,
    pub total_buffer_loss: f64,
    pub total_unmet_load: f64,
}

impl EnergyResult {
    pub fn new(project: &Project) -> Self {
        let n = project.producers.len();
        Self {
            producer_ids: project.producers.iter().map(|p| p.id.clone()).collect(),
            load_curve: project.load_curve.clone(),
            supplied_power: vec![0.0; HOURS],
            net_supply: vec![0.0; HOURS],
            producer_results: vec![vec![0.0; HOURS]; n],
            buffer_capacity: vec![0.0; HOURS],
            buffer_loss: vec![0.0; HOURS],
            supplied_buffer_heat: vec![0.0; HOURS],
            buffer_charged: vec![0.0; HOURS],
            unmet_load: vec![0.0; HOURS],
            producer_stagnation_days: vec![None; n],
            producer_jaz: vec![None; n],
            total_load: 0.0,
            total_heats: BTreeMap::new(),
            total_produced_heat: 0.0,
            total_buffered_heat: 0.0,
            total_buffer_loss: 0.0,
            total_unmet_load: 0.0,
        }
    }

    /// Fills the annual totals from the hourly series.
    pub fn calc_totals(&mut self) {
        self.total_load = self.load_curve.iter().sum();
        self.total_heats.clear();
        self.total_produced_heat = 0.0;
        for (id, series) in self.producer_ids.iter().zip(&self.producer_results) {
            let total: f64 = series.iter().sum();
            self.total_heats.insert(id.clone(), total);
            self.total_produced_heat += total;
        }
        self.total_buffered_heat = self.supplied_buffer_heat.iter().sum();
        self.total_buffer_loss = self.buffer_loss.iter().sum();
        self.total_unmet_load = self.unmet_load.iter().sum();
    }

    /// Hourly allocation of the producer with `id`.
    pub fn producer_result(&self, id: &str) -> Option<&[f64]> {
        let k = self.producer_ids.iter().position(|p| p == id)?;
        Some(&self.producer_results[k])
    }

    /// Net heat balance error at `hour`; zero up to rounding.
    pub fn balance_error(&self, hour: usize) -> f64 {
        let produced: f64 = self.producer_results.iter().map(|s| s[hour]).sum();
        produced + self.supplied_buffer_heat[hour] - self.buffer_charged[hour]
            + self.unmet_load[hour]
            - self.load_curve[hour]
    }
}
