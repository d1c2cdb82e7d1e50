//! Input data model: project, producers, heat net, buffer and weather.
//!
//! Everything here is read-only for the simulator. The types derive
//! `Deserialize` so scenario files can embed them directly.

use std::collections::HashSet;

use serde::Deserialize;

use crate::error::SimError;

/// Number of simulated hours (one non-leap year).
pub const HOURS: usize = 8760;

/// Complete simulation input.
#[derive(Debug, Clone)]
pub struct Project {
    /// Hourly heat demand of the network (kW), exactly [`HOURS`] values.
    pub load_curve: Vec<f64>,
    pub heat_net: HeatNet,
    pub buffer: BufferSpec,
    /// Outdoor temperature above which consumers stop heating (°C).
    pub consumer_heating_limit: f64,
    pub weather: Weather,
    /// Producers in dispatch priority order.
    pub producers: Vec<Producer>,
}

impl Project {
    /// Checks the structural invariants the dispatch loop relies on.
    ///
    /// # Errors
    ///
    /// Returns the first violated invariant as a [`SimError`].
    pub fn validate(&self) -> Result<(), SimError> {
        if self.load_curve.len() != HOURS {
            return Err(SimError::LoadCurveLength {
                expected: HOURS,
                actual: self.load_curve.len(),
            });
        }
        self.buffer.validate()?;

        let mut seen = HashSet::new();
        for producer in &self.producers {
            if !seen.insert(producer.id.as_str()) {
                return Err(SimError::DuplicateProducer(producer.id.clone()));
            }
            producer.validate()?;
        }
        Ok(())
    }
}

/// Product group of a producer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductType {
    HeatPump,
    SolarThermalPlant,
    #[default]
    Other,
}

impl ProductType {
    pub fn label(self) -> &'static str {
        match self {
            Self::HeatPump => "heat_pump",
            Self::SolarThermalPlant => "solar_thermal_plant",
            Self::Other => "other",
        }
    }
}

/// Dispatch role of a producer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProducerFunction {
    #[default]
    BaseLoad,
    PeakLoad,
    MaxLoad,
}

/// Direction of an outdoor-temperature lockout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutdoorControlKind {
    /// Enabled only at or above the threshold.
    From,
    /// Enabled only at or below the threshold.
    Until,
}

/// Outdoor-temperature control of a producer.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutdoorControl {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Threshold outdoor temperature (°C).
    pub threshold: f64,
    pub kind: OutdoorControlKind,
}

fn default_true() -> bool {
    true
}

impl OutdoorControl {
    pub fn new(kind: OutdoorControlKind, threshold: f64) -> Self {
        Self {
            enabled: true,
            threshold,
            kind,
        }
    }

    /// Returns `true` when the producer is locked at `outdoor_temperature`.
    pub fn locks_out(&self, outdoor_temperature: f64) -> bool {
        if !self.enabled {
            return false;
        }
        match self.kind {
            OutdoorControlKind::From => outdoor_temperature < self.threshold,
            OutdoorControlKind::Until => outdoor_temperature > self.threshold,
        }
    }
}

/// Rated output range of a producer (kW).
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RatedPower {
    #[serde(default)]
    pub min_kw: f64,
    pub max_kw: f64,
}

/// Fixed hourly operating profile; overrides type-based behaviour.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProducerProfile {
    /// Supply temperature per hour (°C).
    pub temperature_levels: Vec<f64>,
    #[serde(default)]
    pub min_power: Option<Vec<f64>>,
    #[serde(default)]
    pub max_power: Option<Vec<f64>>,
}

/// Flat-plate collector field parameters.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SolarCollectorSpec {
    /// Aperture area (m²).
    pub area_m2: f64,
    /// Optical efficiency η0.
    pub optical_efficiency: f64,
    /// Linear heat loss coefficient a1 (W/(m²·K)).
    pub loss_coefficient: f64,
    /// Thermal capacity of the collector loop (kJ/(m²·K)).
    pub heat_capacity: f64,
    /// Temperature at which the field goes into stagnation (°C).
    pub stagnation_temperature: f64,
}

impl Default for SolarCollectorSpec {
    fn default() -> Self {
        Self {
            area_m2: 500.0,
            optical_efficiency: 0.8,
            loss_coefficient: 3.5,
            heat_capacity: 100.0,
            stagnation_temperature: 130.0,
        }
    }
}

/// Air-source heat pump parameters.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HeatPumpSpec {
    /// Highest flow temperature the unit reaches (°C).
    pub max_flow_temperature: f64,
    /// Fraction of the Carnot COP reached in practice.
    pub quality_grade: f64,
    /// Source temperature at which the rated power applies (°C).
    pub rating_source_temperature: f64,
    /// Below this source temperature the unit is off (°C).
    pub min_source_temperature: f64,
    /// Relative power loss per kelvin below the rating point.
    pub derate_per_kelvin: f64,
}

impl Default for HeatPumpSpec {
    fn default() -> Self {
        Self {
            max_flow_temperature: 75.0,
            quality_grade: 0.45,
            rating_source_temperature: 7.0,
            min_source_temperature: -15.0,
            derate_per_kelvin: 0.015,
        }
    }
}

/// Physical behaviour attached to a producer. At most one applies.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProducerModel {
    #[default]
    Plain,
    Profile(ProducerProfile),
    Solar(SolarCollectorSpec),
    HeatPump(HeatPumpSpec),
}

impl ProducerModel {
    fn label(&self) -> &'static str {
        match self {
            Self::Plain => "plain",
            Self::Profile(_) => "profile",
            Self::Solar(_) => "solar",
            Self::HeatPump(_) => "heat_pump",
        }
    }
}

/// Scheduled outage, `MM-DD` or `MM-DD HH:MM` in the reference year.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TimeInterval {
    pub start: String,
    pub end: String,
}

impl TimeInterval {
    pub fn new(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
        }
    }
}

/// A heat producer.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Producer {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub product_type: ProductType,
    #[serde(default)]
    pub function: ProducerFunction,
    pub rated: RatedPower,
    #[serde(default)]
    pub model: ProducerModel,
    #[serde(default)]
    pub outdoor_control: Option<OutdoorControl>,
    #[serde(default)]
    pub interruptions: Vec<TimeInterval>,
}

impl Producer {
    /// Creates a plain producer with a rated range of `[0, max_kw]`.
    pub fn new(id: impl Into<String>, function: ProducerFunction, max_kw: f64) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            product_type: ProductType::Other,
            function,
            rated: RatedPower { min_kw: 0.0, max_kw },
            model: ProducerModel::Plain,
            outdoor_control: None,
            interruptions: Vec::new(),
        }
    }

    /// Attaches a physical model and sets the matching product type.
    pub fn with_model(mut self, model: ProducerModel) -> Self {
        self.product_type = match &model {
            ProducerModel::Solar(_) => ProductType::SolarThermalPlant,
            ProducerModel::HeatPump(_) => ProductType::HeatPump,
            ProducerModel::Plain | ProducerModel::Profile(_) => self.product_type,
        };
        self.model = model;
        self
    }

    pub fn with_outdoor_control(mut self, control: OutdoorControl) -> Self {
        self.outdoor_control = Some(control);
        self
    }

    pub fn with_interruption(mut self, interval: TimeInterval) -> Self {
        self.interruptions.push(interval);
        self
    }

    pub fn is_solar(&self) -> bool {
        matches!(self.model, ProducerModel::Solar(_))
    }

    fn validate(&self) -> Result<(), SimError> {
        let consistent = match &self.model {
            ProducerModel::Plain => self.product_type == ProductType::Other,
            ProducerModel::Profile(_) => true,
            ProducerModel::Solar(_) => self.product_type == ProductType::SolarThermalPlant,
            ProducerModel::HeatPump(_) => self.product_type == ProductType::HeatPump,
        };
        if !consistent {
            return Err(SimError::ModelMismatch {
                producer: self.id.clone(),
                model: self.model.label(),
                product_type: self.product_type.label(),
            });
        }

        if let ProducerModel::Profile(profile) = &self.model {
            let series = [
                ("temperature_levels", Some(&profile.temperature_levels)),
                ("min_power", profile.min_power.as_ref()),
                ("max_power", profile.max_power.as_ref()),
            ];
            for (name, values) in series {
                if let Some(values) = values {
                    if values.len() != HOURS {
                        return Err(SimError::ProfileLength {
                            producer: self.id.clone(),
                            series: name,
                            expected: HOURS,
                            actual: values.len(),
                        });
                    }
                }
            }
        }
        Ok(())
    }
}

/// Optional seasonal sliding of heat-net temperatures and buffer target.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SeasonalDriving {
    pub flow_temperature_winter: f64,
    pub flow_temperature_summer: f64,
    pub return_temperature_winter: f64,
    pub return_temperature_summer: f64,
    pub target_charge_level_winter: f64,
    pub target_charge_level_summer: f64,
}

impl Default for SeasonalDriving {
    fn default() -> Self {
        Self {
            flow_temperature_winter: 85.0,
            flow_temperature_summer: 70.0,
            return_temperature_winter: 55.0,
            return_temperature_summer: 45.0,
            target_charge_level_winter: 0.9,
            target_charge_level_summer: 0.5,
        }
    }
}

/// Heat-net operating temperatures.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HeatNet {
    /// Flow temperature (°C).
    pub supply_temperature: f64,
    /// Return temperature (°C).
    pub return_temperature: f64,
    /// Buffer charge level the producers aim for (0.0 to 1.0).
    pub target_charge_level: f64,
    pub seasonal: Option<SeasonalDriving>,
}

impl Default for HeatNet {
    fn default() -> Self {
        Self {
            supply_temperature: 80.0,
            return_temperature: 50.0,
            target_charge_level: 0.8,
            seasonal: None,
        }
    }
}

/// Stratified buffer tank parameters.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BufferSpec {
    pub volume_litres: f64,
    /// Temperature of the fully charged HT layer (°C).
    pub max_temperature: f64,
    /// Temperature of the NT layer (°C).
    pub nt_temperature: f64,
    /// Temperature around the tank (°C).
    pub envelope_temperature: f64,
    /// Standing loss per kelvin above the envelope (W/K).
    pub loss_coefficient_w_per_k: f64,
    /// Initial charge of every layer (0.0 to 1.0).
    pub initial_charge_level: f64,
    /// Share of the volume in the HT layer.
    pub ht_share: f64,
    /// Share of the volume in the VT layer; NT takes the rest.
    pub vt_share: f64,
}

impl Default for BufferSpec {
    fn default() -> Self {
        Self {
            volume_litres: 10_000.0,
            max_temperature: 95.0,
            nt_temperature: 60.0,
            envelope_temperature: 20.0,
            loss_coefficient_w_per_k: 15.0,
            initial_charge_level: 0.5,
            ht_share: 0.5,
            vt_share: 0.3,
        }
    }
}

impl BufferSpec {
    /// Checks the tank geometry the buffer ledger is built from.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::BufferSpec`] for a negative volume or volume
    /// shares that are negative or sum to more than the whole tank.
    pub fn validate(&self) -> Result<(), SimError> {
        if self.volume_litres < 0.0 {
            return Err(SimError::BufferSpec(format!(
                "volume must be >= 0, got {}",
                self.volume_litres
            )));
        }
        if self.ht_share < 0.0 || self.vt_share < 0.0 || self.ht_share + self.vt_share > 1.0 + 1e-9
        {
            return Err(SimError::BufferSpec(format!(
                "layer shares must be >= 0 and sum to at most 1, got ht {} vt {}",
                self.ht_share, self.vt_share
            )));
        }
        Ok(())
    }
}

/// Hourly weather series. Series may be shorter than [`HOURS`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Weather {
    /// Outdoor temperature (°C).
    pub temperatures: Vec<f64>,
    /// Global irradiance on the collector plane (W/m²).
    pub radiation: Vec<f64>,
}

impl Weather {
    /// Outdoor temperature at `hour`, `0.0` where the series has no value.
    pub fn temperature_at(&self, hour: usize) -> f64 {
        self.temperatures.get(hour).copied().unwrap_or(0.0)
    }

    pub fn radiation_at(&self, hour: usize) -> f64 {
        self.radiation.get(hour).copied().unwrap_or(0.0)
    }

    /// Lowest outdoor temperature of the simulated year.
    pub fn min_temperature(&self) -> f64 {
        (0..HOURS)
            .map(|h| self.temperature_at(h))
            .fold(f64::INFINITY, f64::min)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project(producers: Vec<Producer>) -> Project {
        Project {
            load_curve: vec![0.0; HOURS],
            heat_net: HeatNet::default(),
            buffer: BufferSpec::default(),
            consumer_heating_limit: 15.0,
            weather: Weather::default(),
            producers,
        }
    }

    #[test]
    fn from_control_locks_below_threshold() {
        let control = OutdoorControl::new(OutdoorControlKind::From, 5.0);
        assert!(control.locks_out(4.9));
        assert!(!control.locks_out(5.0));
        assert!(!control.locks_out(12.0));
    }

    #[test]
    fn until_control_locks_above_threshold() {
        let control = OutdoorControl::new(OutdoorControlKind::Until, 5.0);
        assert!(control.locks_out(5.1));
        assert!(!control.locks_out(5.0));
        assert!(!control.locks_out(-10.0));
    }

    #[test]
    fn disabled_control_never_locks() {
        let mut control = OutdoorControl::new(OutdoorControlKind::From, 5.0);
        control.enabled = false;
        assert!(!control.locks_out(-30.0));
    }

    #[test]
    fn short_weather_reads_zero() {
        let weather = Weather {
            temperatures: vec![3.0, 4.0],
            radiation: Vec::new(),
        };
        assert_eq!(weather.temperature_at(1), 4.0);
        assert_eq!(weather.temperature_at(2), 0.0);
        assert_eq!(weather.radiation_at(0), 0.0);
        assert_eq!(weather.min_temperature(), 0.0);
    }

    #[test]
    fn validate_rejects_short_load_curve() {
        let mut p = project(Vec::new());
        p.load_curve.truncate(10);
        assert_eq!(
            p.validate(),
            Err(SimError::LoadCurveLength {
                expected: HOURS,
                actual: 10
            })
        );
    }

    #[test]
    fn validate_rejects_overlapping_buffer_shares() {
        let mut p = project(Vec::new());
        p.buffer.ht_share = 0.8;
        p.buffer.vt_share = 0.5;
        assert!(matches!(p.validate(), Err(SimError::BufferSpec(_))));

        p.buffer.vt_share = 0.2;
        assert!(p.validate().is_ok());
        p.buffer.volume_litres = -1.0;
        assert!(matches!(p.validate(), Err(SimError::BufferSpec(_))));
    }

    #[test]
    fn validate_rejects_duplicate_ids() {
        let p = project(vec![
            Producer::new("a", ProducerFunction::BaseLoad, 10.0),
            Producer::new("a", ProducerFunction::PeakLoad, 10.0),
        ]);
        assert_eq!(p.validate(), Err(SimError::DuplicateProducer("a".into())));
    }

    #[test]
    fn validate_rejects_heat_pump_type_without_model() {
        let mut producer = Producer::new("hp", ProducerFunction::BaseLoad, 10.0);
        producer.product_type = ProductType::HeatPump;
        let p = project(vec![producer]);
        assert!(matches!(p.validate(), Err(SimError::ModelMismatch { .. })));
    }

    #[test]
    fn validate_rejects_short_profile() {
        let producer = Producer::new("p", ProducerFunction::BaseLoad, 10.0).with_model(
            ProducerModel::Profile(ProducerProfile {
                temperature_levels: vec![90.0; 24],
                min_power: None,
                max_power: None,
            }),
        );
        let p = project(vec![producer]);
        assert!(matches!(p.validate(), Err(SimError::ProfileLength { .. })));
    }

    #[test]
    fn with_model_sets_product_type() {
        let producer = Producer::new("s", ProducerFunction::BaseLoad, 10.0)
            .with_model(ProducerModel::Solar(SolarCollectorSpec::default()));
        assert_eq!(producer.product_type, ProductType::SolarThermalPlant);
        assert!(producer.is_solar());
        assert!(project(vec![producer]).validate().is_ok());
    }
}
