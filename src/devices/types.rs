//! Common types shared by the buffer ledger and the producer physical models.

use crate::model::{Producer, ProducerModel};

use super::heat_pump::HeatPumpState;
use super::solar::SolarState;

/// Temperature stratum of the thermal buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferTier {
    /// Hottest layer, usable for any demand.
    Ht,
    /// Layer at flow temperature.
    Vt,
    /// Coolest layer, only partially usable for the heat net.
    Nt,
}

/// Buffer temperatures for the current hour (°C).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BufferTemperatures {
    /// Temperature around the tank.
    pub envelope: f64,
    /// Heat-net flow temperature.
    pub flow: f64,
    /// Heat-net return temperature.
    pub return_: f64,
    /// Temperature of the fully charged HT layer.
    pub max: f64,
}

impl BufferTemperatures {
    /// Maps a supply temperature onto the tier it can charge.
    ///
    /// Returns `None` when the temperature is below the return temperature.
    pub fn classify(&self, temperature: f64) -> Option<BufferTier> {
        if temperature >= self.max {
            Some(BufferTier::Ht)
        } else if temperature >= self.flow {
            Some(BufferTier::Vt)
        } else if temperature >= self.return_ {
            Some(BufferTier::Nt)
        } else {
            None
        }
    }
}

/// Weather conditions for one hour.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct HourWeather {
    /// Outdoor temperature (°C).
    pub temperature: f64,
    /// Global irradiance (W/m²).
    pub radiation: f64,
}

/// Per-run physical state of one producer.
///
/// Held in a vector parallel to the project's producer list.
#[derive(Debug, Clone)]
pub enum PhysicalState {
    /// Plain and profile-driven producers carry no state.
    Stateless,
    Solar(SolarState),
    HeatPump(HeatPumpState),
}

impl PhysicalState {
    pub fn for_producer(producer: &Producer) -> Self {
        match &producer.model {
            ProducerModel::Solar(spec) => Self::Solar(SolarState::new(producer.id.clone(), *spec)),
            ProducerModel::HeatPump(spec) => Self::HeatPump(HeatPumpState::new(*spec)),
            ProducerModel::Plain | ProducerModel::Profile(_) => Self::Stateless,
        }
    }

    /// Advances the model before any power decision for `hour`.
    pub fn calc_pre(&mut self, hour: usize, temps: &BufferTemperatures, weather: HourWeather) {
        match self {
            Self::Solar(s) => s.calc_pre(hour, temps, weather),
            Self::HeatPump(h) => h.calc_pre(hour, temps, weather),
            Self::Stateless => {}
        }
    }

    /// Tier reported by the physical model; `Some(Ht)` for stateless producers.
    pub fn buffer_load_type(&self) -> Option<BufferTier> {
        match self {
            Self::Solar(s) => s.buffer_load_type(),
            Self::HeatPump(h) => h.buffer_load_type(),
            Self::Stateless => Some(BufferTier::Ht),
        }
    }

    pub fn achievable_temperature(&self) -> Option<f64> {
        match self {
            Self::Solar(s) => Some(s.achievable_temperature()),
            Self::HeatPump(h) => Some(h.achievable_temperature()),
            Self::Stateless => None,
        }
    }

    /// Only a solar field outside its operating phase is unavailable.
    pub fn is_operating(&self) -> bool {
        match self {
            Self::Solar(s) => s.is_operating(),
            Self::HeatPump(_) | Self::Stateless => true,
        }
    }

    pub fn set_consumed_power(&mut self, watts: f64) {
        match self {
            Self::Solar(s) => s.set_consumed_power(watts),
            Self::HeatPump(h) => h.set_consumed_power(watts),
            Self::Stateless => {}
        }
    }

    pub fn calc_post(&mut self, hour: usize) {
        match self {
            Self::Solar(s) => s.calc_post(hour),
            Self::HeatPump(h) => h.calc_post(hour),
            Self::Stateless => {}
        }
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

    #[test]
    fn classify_by_thresholds() {
        let t = temps();
        assert_eq!(t.classify(95.0), Some(BufferTier::Ht));
        assert_eq!(t.classify(94.9), Some(BufferTier::Vt));
        assert_eq!(t.classify(80.0), Some(BufferTier::Vt));
        assert_eq!(t.classify(50.0), Some(BufferTier::Nt));
        assert_eq!(t.classify(49.9), None);
    }

    #[test]
    fn stateless_defaults() {
        let state = PhysicalState::Stateless;
        assert_eq!(state.buffer_load_type(), Some(BufferTier::Ht));
        assert!(state.is_operating());
        assert_eq!(state.achievable_temperature(), None);
    }
}
