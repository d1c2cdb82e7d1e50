use crate::devices::types::{BufferTemperatures, BufferTier, HourWeather};
use crate::model::HeatPumpSpec;

/// Offset between degrees Celsius and kelvin.
const KELVIN: f64 = 273.15;

/// Hour-by-hour operating state of an air-source heat pump.
///
/// The unit lifts outdoor air heat to `min(max_flow_temperature, buffer max)`.
/// Below the rating source temperature its output is derated linearly; below
/// the minimum source temperature it is off. Delivered heat and the
/// electricity it cost accumulate into the seasonal performance factor.
#[derive(Debug, Clone)]
pub struct HeatPumpState {
    spec: HeatPumpSpec,
    flow_temperature: f64,
    source_temperature: f64,
    /// Share of the rated power available this hour (0.0 to 1.0).
    derate: f64,
    cop: f64,
    consumed_kw: f64,
    load_type: Option<BufferTier>,
    heat_kwh: f64,
    electricity_kwh: f64,
}

impl HeatPumpState {
    pub fn new(spec: HeatPumpSpec) -> Self {
        Self {
            spec,
            flow_temperature: spec.max_flow_temperature,
            source_temperature: spec.rating_source_temperature,
            derate: 1.0,
            cop: 1.0,
            consumed_kw: 0.0,
            load_type: None,
            heat_kwh: 0.0,
            electricity_kwh: 0.0,
        }
    }

    pub fn calc_pre(&mut self, _hour: usize, temps: &BufferTemperatures, weather: HourWeather) {
        let s = &self.spec;
        self.consumed_kw = 0.0;
        self.source_temperature = weather.temperature;
        self.flow_temperature = s.max_flow_temperature.min(temps.max);

        self.derate = if weather.temperature < s.min_source_temperature {
            0.0
        } else if weather.temperature < s.rating_source_temperature {
            let deficit = s.rating_source_temperature - weather.temperature;
            (1.0 - s.derate_per_kelvin * deficit).clamp(0.0, 1.0)
        } else {
            1.0
        };

        let lift = (self.flow_temperature - self.source_temperature).max(1.0);
        self.cop = (s.quality_grade * (self.flow_temperature + KELVIN) / lift).clamp(1.0, 10.0);

        self.load_type = if self.derate > 0.0 {
            temps.classify(self.flow_temperature)
        } else {
            None
        };
    }

    pub fn achievable_temperature(&self) -> f64 {
        self.flow_temperature
    }

    pub fn buffer_load_type(&self) -> Option<BufferTier> {
        self.load_type
    }

    pub fn derate(&self) -> f64 {
        self.derate
    }

    pub fn cop(&self) -> f64 {
        self.cop
    }

    pub fn set_consumed_power(&mut self, watts: f64) {
        self.consumed_kw = (watts / 1000.0).max(0.0);
    }

    pub fn calc_post(&mut self, _hour: usize) {
        if self.consumed_kw > 0.0 {
            self.heat_kwh += self.consumed_kw;
            self.electricity_kwh += self.consumed_kw / self.cop;
        }
    }

    /// Seasonal performance factor (JAZ); `0.0` if the unit never ran.
    pub fn jaz(&self) -> f64 {
        if self.electricity_kwh > 0.0 {
            self.heat_kwh / self.electricity_kwh
        } else {
            0.0
        }
    }
}
