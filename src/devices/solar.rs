use std::fmt;

use crate::devices::types::{BufferTemperatures, BufferTier, HourWeather};
use crate::model::SolarCollectorSpec;

/// Operating phase of a collector field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolarPhase {
    /// Collector warms up; nothing is delivered yet.
    Heating,
    /// Collector is hot enough to deliver heat.
    Operation,
    /// Collector reached its stagnation temperature and is idle.
    Stagnation,
}

impl fmt::Display for SolarPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Heating => "heating",
            Self::Operation => "operation",
            Self::Stagnation => "stagnation",
        };
        f.write_str(name)
    }
}

/// Hour-by-hour thermal state of a solar collector field.
///
/// The collector temperature integrates the net gain
/// `area * (eta0 * G - a1 * (TK - TL))` minus whatever the dispatcher consumed.
/// Heat that is not taken warms the field until it stagnates.
#[derive(Debug, Clone)]
pub struct SolarState {
    id: String,
    spec: SolarCollectorSpec,
    phase: SolarPhase,
    /// Collector temperature (°C).
    collector_temperature: f64,
    ambient_temperature: f64,
    radiation: f64,
    /// Net collector gain this hour (kW).
    gain_kw: f64,
    consumed_kw: f64,
    load_type: Option<BufferTier>,
    stagnation_days: u32,
    last_stagnation_day: Option<usize>,
    log: Vec<String>,
}

impl SolarState {
    pub fn new(id: String, spec: SolarCollectorSpec) -> Self {
        Self {
            id,
            spec,
            phase: SolarPhase::Heating,
            collector_temperature: 0.0,
            ambient_temperature: 0.0,
            radiation: 0.0,
            gain_kw: 0.0,
            consumed_kw: 0.0,
            load_type: None,
            stagnation_days: 0,
            last_stagnation_day: None,
            log: Vec::new(),
        }
    }

    fn set_phase(&mut self, hour: usize, phase: SolarPhase) {
        if phase != self.phase {
            self.log.push(format!(
                "{};{hour};{}->{phase};TK={:.1}",
                self.id, self.phase, self.collector_temperature
            ));
            self.phase = phase;
        }
    }

    fn gain_at(&self, collector_temperature: f64) -> f64 {
        let s = &self.spec;
        s.area_m2
            * (s.optical_efficiency * self.radiation
                - s.loss_coefficient * (collector_temperature - self.ambient_temperature))
            / 1000.0
    }

    /// Advances the phase for `hour` before any power is allocated.
    pub fn calc_pre(&mut self, hour: usize, temps: &BufferTemperatures, weather: HourWeather) {
        self.ambient_temperature = weather.temperature;
        self.radiation = weather.radiation;
        self.consumed_kw = 0.0;
        if hour == 0 {
            self.collector_temperature = weather.temperature;
        }

        if self.phase == SolarPhase::Stagnation && self.radiation <= 0.0 {
            self.collector_temperature = self.ambient_temperature;
            self.set_phase(hour, SolarPhase::Heating);
        }

        self.gain_kw = self.gain_at(self.collector_temperature);

        match self.phase {
            SolarPhase::Heating => {
                if self.gain_kw > 0.0 && self.collector_temperature >= temps.flow {
                    self.set_phase(hour, SolarPhase::Operation);
                }
            }
            SolarPhase::Operation => {
                if self.gain_kw <= 0.0 || self.collector_temperature < temps.return_ {
                    self.set_phase(hour, SolarPhase::Heating);
                }
            }
            SolarPhase::Stagnation => {}
        }

        self.load_type = temps.classify(self.collector_temperature);
    }

    pub fn phase(&self) -> SolarPhase {
        self.phase
    }

    pub fn is_operating(&self) -> bool {
        self.phase == SolarPhase::Operation
    }

    pub fn achievable_temperature(&self) -> f64 {
        self.collector_temperature
    }

    pub fn buffer_load_type(&self) -> Option<BufferTier> {
        self.load_type
    }

    /// Heat the field can deliver this hour (kW).
    pub fn available_power(&self) -> f64 {
        if self.is_operating() {
            self.gain_kw.max(0.0)
        } else {
            0.0
        }
    }

    pub fn set_consumed_power(&mut self, watts: f64) {
        self.consumed_kw = (watts / 1000.0).max(0.0);
    }

    /// Heats or cools the field with the heat that was not consumed.
    pub fn calc_post(&mut self, hour: usize) {
        if self.phase == SolarPhase::Stagnation {
            return;
        }

        let unused_kw = self.gain_kw - self.consumed_kw;
        let capacity_kj_per_k = self.spec.heat_capacity * self.spec.area_m2;
        if capacity_kj_per_k > 0.0 {
            self.collector_temperature += unused_kw * 3600.0 / capacity_kj_per_k;
        }
        self.collector_temperature = self.collector_temperature.max(self.ambient_temperature);

        if self.collector_temperature >= self.spec.stagnation_temperature {
            self.collector_temperature = self.spec.stagnation_temperature;
            self.set_phase(hour, SolarPhase::Stagnation);
            let day = hour / 24;
            if self.last_stagnation_day != Some(day) {
                self.stagnation_days += 1;
                self.last_stagnation_day = Some(day);
            }
        }
    }

    /// Days with at least one stagnation event, valid after the full run.
    pub fn stagnation_days(&self) -> u32 {
        self.stagnation_days
    }

    /// Phase transitions recorded so far, one line per event.
    pub fn log(&self) -> &[String] {
        &self.log
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temps() -> BufferTemperatures {
        BufferTemperatures {
            envelope: 20.0,
            flow: 80.0,
            return_: 50.0,
            max: 95.0,
        }
    }

    fn sunny() -> HourWeather {
        HourWeather {
            temperature: 20.0,
            radiation: 900.0,
        }
    }

    fn state() -> SolarState {
        SolarState::new("solar".into(), SolarCollectorSpec::default())
    }

    #[test]
    fn starts_heating_and_not_operating() {
        let mut s = state();
        s.calc_pre(0, &temps(), sunny());
        assert_eq!(s.phase(), SolarPhase::Heating);
        assert!(!s.is_operating());
        assert_eq!(s.available_power(), 0.0);
        assert_eq!(s.buffer_load_type(), None);
    }

    #[test]
    fn unused_gain_heats_into_operation() {
        let mut s = state();
        let mut hour = 0;
        while !s.is_operating() && hour < 24 {
            s.calc_pre(hour, &temps(), sunny());
            if s.is_operating() {
                break;
            }
            s.calc_post(hour);
            hour += 1;
        }
        assert!(s.is_operating(), "field never reached operation");
        assert!(s.available_power() > 0.0);
        assert!(s.achievable_temperature() >= temps().flow);
        assert!(!s.log().is_empty());
    }

    #[test]
    fn idle_field_stagnates_once_per_day() {
        let mut s = state();
        for hour in 0..12 {
            s.calc_pre(hour, &temps(), sunny());
            s.calc_post(hour);
        }
        assert_eq!(s.phase(), SolarPhase::Stagnation);
        assert_eq!(s.stagnation_days(), 1);

        // night resets the field
        s.calc_pre(12, &temps(), HourWeather {
            temperature: 10.0,
            radiation: 0.0,
        });
        assert_eq!(s.phase(), SolarPhase::Heating);
        assert_eq!(s.achievable_temperature(), 10.0);
        assert_eq!(s.stagnation_days(), 1);
    }

    #[test]
    fn consuming_all_gain_holds_temperature() {
        let mut s = state();
        s.calc_pre(0, &temps(), sunny());
        s.collector_temperature = 85.0;
        s.calc_pre(1, &temps(), sunny());
        assert!(s.is_operating());
        let gain = s.available_power();
        s.set_consumed_power(gain * 1000.0);
        s.calc_post(1);
        assert!((s.achievable_temperature() - 85.0).abs() < 1e-9);
    }
}
