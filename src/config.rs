//! TOML-based scenario configuration and preset definitions.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::error::{DataError, SimError};
use crate::io::weather::{WeatherFileSettings, read_load_curve, read_weather};
use crate::model::{
    BufferSpec, HOURS, HeatNet, HeatPumpSpec, OutdoorControl, OutdoorControlKind, ProductType,
    Producer, ProducerFunction, ProducerModel, Project, SeasonalDriving, SolarCollectorSpec,
    TimeInterval, Weather,
};
use crate::profiles::{SyntheticLoad, SyntheticWeather};
use crate::sim::interruption::hour_interval;

/// Top-level scenario configuration parsed from TOML.
///
/// All sections have defaults; producers must be listed explicitly. Load from
/// TOML with [`ScenarioConfig::from_toml_file`] or use one of the
/// [`PRESETS`](ScenarioConfig::PRESETS).
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioConfig {
    /// Run-wide parameters.
    #[serde(default)]
    pub simulation: SimulationConfig,
    /// Where the hourly weather comes from.
    #[serde(default)]
    pub weather: WeatherConfig,
    /// Where the hourly heat demand comes from.
    #[serde(default)]
    pub load: LoadConfig,
    #[serde(default)]
    pub consumers: ConsumerConfig,
    #[serde(default)]
    pub heat_net: HeatNet,
    #[serde(default)]
    pub buffer: BufferSpec,
    /// Producers in dispatch priority order.
    #[serde(default)]
    pub producers: Vec<Producer>,
    /// Directory relative file paths are resolved against.
    #[serde(skip)]
    pub base_dir: Option<PathBuf>,
}

/// Run-wide parameters.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    /// Master random seed for synthetic profiles.
    pub seed: u64,
    /// Directory for diagnostic artifacts; none are written if unset.
    pub log_dir: Option<PathBuf>,
}

/// Weather source.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case", deny_unknown_fields)]
pub enum WeatherConfig {
    Synthetic(SyntheticWeather),
    /// Multi-year station file averaged to one year.
    File {
        path: PathBuf,
        #[serde(default)]
        settings: WeatherFileSettings,
    },
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self::Synthetic(SyntheticWeather::default())
    }
}

/// Heat-demand source.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case", deny_unknown_fields)]
pub enum LoadConfig {
    Synthetic(SyntheticLoad),
    /// The same demand every hour (kW).
    Constant { kw: f64 },
    /// Single-column file with one value per hour.
    File { path: PathBuf },
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self::Synthetic(SyntheticLoad::default())
    }
}

/// Consumer-side parameters.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConsumerConfig {
    /// Highest outdoor temperature at which any consumer still heats (°C).
    pub heating_limit: f64,
}

impl Default for ConsumerConfig {
    fn default() -> Self {
        Self {
            heating_limit: 15.0,
        }
    }
}

/// Configuration error with field path and constraint description.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("config error: {field}: {message}")]
pub struct ConfigError {
    /// Dotted field path (e.g., `"buffer.ht_share"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl ConfigError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Failure to turn a scenario into a runnable [`Project`].
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("invalid scenario: {}", join_errors(.0))]
    Invalid(Vec<ConfigError>),
    #[error(transparent)]
    Data(#[from] DataError),
    #[error(transparent)]
    Project(#[from] SimError),
}

fn join_errors(errors: &[ConfigError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

fn unit_range(errors: &mut Vec<ConfigError>, field: &str, value: f64) {
    if !(0.0..=1.0).contains(&value) {
        errors.push(ConfigError::new(field, "must be in [0.0, 1.0]"));
    }
}

fn boiler(id: &str, function: ProducerFunction, min_kw: f64, max_kw: f64) -> Producer {
    let mut p = Producer::new(id, function, max_kw);
    p.rated.min_kw = min_kw;
    p
}

impl ScenarioConfig {
    /// Returns the baseline scenario: a biomass base-load boiler backed by a
    /// gas peak boiler and a 50 m³ buffer.
    pub fn baseline() -> Self {
        Self {
            simulation: SimulationConfig::default(),
            weather: WeatherConfig::default(),
            load: LoadConfig::default(),
            consumers: ConsumerConfig::default(),
            heat_net: HeatNet::default(),
            buffer: BufferSpec {
                volume_litres: 50_000.0,
                ..BufferSpec::default()
            },
            producers: vec![
                boiler("biomass", ProducerFunction::BaseLoad, 150.0, 600.0),
                boiler("gas_peak", ProducerFunction::PeakLoad, 0.0, 900.0),
            ],
            base_dir: None,
        }
    }

    /// Returns the solar district preset: a collector field ahead of the
    /// boilers, seasonal heat-net driving and a large buffer. The biomass
    /// boiler is serviced in summer and locked out on warm days.
    pub fn solar_district() -> Self {
        let solar = Producer::new("solar", ProducerFunction::MaxLoad, 0.0).with_model(
            ProducerModel::Solar(SolarCollectorSpec {
                area_m2: 2_000.0,
                ..SolarCollectorSpec::default()
            }),
        );
        let biomass = boiler("biomass", ProducerFunction::BaseLoad, 150.0, 600.0)
            .with_outdoor_control(OutdoorControl::new(OutdoorControlKind::Until, 18.0))
            .with_interruption(TimeInterval::new("07-01", "08-15"));

        Self {
            heat_net: HeatNet {
                seasonal: Some(SeasonalDriving::default()),
                ..HeatNet::default()
            },
            buffer: BufferSpec {
                volume_litres: 150_000.0,
                ..BufferSpec::default()
            },
            producers: vec![
                solar,
                biomass,
                boiler("gas_peak", ProducerFunction::PeakLoad, 0.0, 900.0),
            ],
            ..Self::baseline()
        }
    }

    /// Returns the heat-pump preset: an air-source heat pump covers the base
    /// until it gets too cold, a gas boiler takes the peaks.
    pub fn heat_pump() -> Self {
        let hp = Producer::new("heat_pump", ProducerFunction::BaseLoad, 400.0)
            .with_model(ProducerModel::HeatPump(HeatPumpSpec::default()))
            .with_outdoor_control(OutdoorControl::new(OutdoorControlKind::From, -12.0));

        Self {
            heat_net: HeatNet {
                supply_temperature: 70.0,
                return_temperature: 40.0,
                ..HeatNet::default()
            },
            buffer: BufferSpec {
                volume_litres: 80_000.0,
                max_temperature: 80.0,
                nt_temperature: 55.0,
                ..BufferSpec::default()
            },
            producers: vec![hp, boiler("gas_peak", ProducerFunction::PeakLoad, 0.0, 1_200.0)],
            ..Self::baseline()
        }
    }

    /// Available preset names.
    pub const PRESETS: &[&str] = &["baseline", "solar_district", "heat_pump"];

    /// Loads a scenario from a named preset.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the preset name is unknown.
    pub fn from_preset(name: &str) -> Result<Self, ConfigError> {
        match name {
            "baseline" => Ok(Self::baseline()),
            "solar_district" => Ok(Self::solar_district()),
            "heat_pump" => Ok(Self::heat_pump()),
            _ => Err(ConfigError::new(
                "preset",
                format!(
                    "unknown preset \"{name}\", available: {}",
                    Self::PRESETS.join(", ")
                ),
            )),
        }
    }

    /// Parses a scenario from a TOML file. Relative data paths are resolved
    /// against the file's directory.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| {
            ConfigError::new("scenario", format!("cannot read \"{}\": {e}", path.display()))
        })?;
        let mut cfg = Self::from_toml_str(&content)?;
        cfg.base_dir = path.parent().map(Path::to_path_buf);
        Ok(cfg)
    }

    /// Parses a scenario from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown
    /// fields or variants (e.g. an unrecognized outdoor-control kind).
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::new("toml", e.to_string()))
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        match &self.base_dir {
            Some(dir) if path.is_relative() => dir.join(path),
            _ => path.to_path_buf(),
        }
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        match &self.weather {
            WeatherConfig::Synthetic(w) => {
                unit_range(&mut errors, "weather.cloud_alpha", w.cloud_alpha);
            }
            WeatherConfig::File { settings, .. } => {
                if settings.start_year > settings.end_year {
                    errors.push(ConfigError::new(
                        "weather.settings.start_year",
                        "must be <= weather.settings.end_year",
                    ));
                }
            }
        }

        match &self.load {
            LoadConfig::Synthetic(l) => {
                if l.annual_demand_kwh < 0.0 {
                    errors.push(ConfigError::new("load.annual_demand_kwh", "must be >= 0"));
                }
                unit_range(&mut errors, "load.hot_water_share", l.hot_water_share);
            }
            LoadConfig::Constant { kw } => {
                if *kw < 0.0 {
                    errors.push(ConfigError::new("load.kw", "must be >= 0"));
                }
            }
            LoadConfig::File { .. } => {}
        }

        let net = &self.heat_net;
        if net.return_temperature >= net.supply_temperature {
            errors.push(ConfigError::new(
                "heat_net.return_temperature",
                "must be < heat_net.supply_temperature",
            ));
        }
        unit_range(&mut errors, "heat_net.target_charge_level", net.target_charge_level);
        if let Some(s) = &net.seasonal {
            if s.return_temperature_winter >= s.flow_temperature_winter
                || s.return_temperature_summer >= s.flow_temperature_summer
            {
                errors.push(ConfigError::new(
                    "heat_net.seasonal",
                    "return temperatures must be below flow temperatures",
                ));
            }
            unit_range(
                &mut errors,
                "heat_net.seasonal.target_charge_level_winter",
                s.target_charge_level_winter,
            );
            unit_range(
                &mut errors,
                "heat_net.seasonal.target_charge_level_summer",
                s.target_charge_level_summer,
            );
        }

        let buf = &self.buffer;
        if buf.volume_litres < 0.0 {
            errors.push(ConfigError::new("buffer.volume_litres", "must be >= 0"));
        }
        unit_range(&mut errors, "buffer.ht_share", buf.ht_share);
        unit_range(&mut errors, "buffer.vt_share", buf.vt_share);
        if buf.ht_share + buf.vt_share > 1.0 {
            errors.push(ConfigError::new(
                "buffer.vt_share",
                "buffer.ht_share + buffer.vt_share must be <= 1.0",
            ));
        }
        unit_range(&mut errors, "buffer.initial_charge_level", buf.initial_charge_level);
        if buf.max_temperature < buf.nt_temperature {
            errors.push(ConfigError::new(
                "buffer.max_temperature",
                "must be >= buffer.nt_temperature",
            ));
        }
        if buf.loss_coefficient_w_per_k < 0.0 {
            errors.push(ConfigError::new("buffer.loss_coefficient_w_per_k", "must be >= 0"));
        }

        if self.producers.is_empty() {
            errors.push(ConfigError::new("producers", "must define at least one producer"));
        }
        let mut seen = HashSet::new();
        for (i, p) in self.producers.iter().enumerate() {
            let at = |name: &str| format!("producers[{i}].{name}");
            if p.id.trim().is_empty() {
                errors.push(ConfigError::new(at("id"), "must not be empty"));
            } else if !seen.insert(p.id.as_str()) {
                errors.push(ConfigError::new(at("id"), format!("duplicate id \"{}\"", p.id)));
            }
            if p.rated.max_kw < 0.0 {
                errors.push(ConfigError::new(at("rated.max_kw"), "must be >= 0"));
            }
            if p.rated.min_kw < 0.0 || p.rated.min_kw > p.rated.max_kw {
                errors.push(ConfigError::new(
                    at("rated.min_kw"),
                    "must be in [0, rated.max_kw]",
                ));
            }
            for (j, interval) in p.interruptions.iter().enumerate() {
                if let Err(stamp) = hour_interval(interval) {
                    errors.push(ConfigError::new(
                        at(&format!("interruptions[{j}]")),
                        format!("invalid time \"{stamp}\", expected MM-DD or MM-DD HH:MM"),
                    ));
                }
            }
            if let ProducerModel::Profile(profile) = &p.model {
                if profile.temperature_levels.len() != HOURS {
                    errors.push(ConfigError::new(
                        at("model.temperature_levels"),
                        format!("must have {HOURS} values"),
                    ));
                }
            }
        }

        errors
    }

    /// Builds the simulation input: validates, then reads or synthesizes the
    /// weather and load series.
    ///
    /// Producers left at the default product type get the type matching
    /// their model.
    ///
    /// # Errors
    ///
    /// Returns a [`BuildError`] if validation fails, a data file cannot be
    /// read, or the resulting project is inconsistent.
    pub fn build_project(&self) -> Result<Project, BuildError> {
        let errors = self.validate();
        if !errors.is_empty() {
            return Err(BuildError::Invalid(errors));
        }

        let seed = self.simulation.seed;
        let weather: Weather = match &self.weather {
            WeatherConfig::Synthetic(w) => w.generate(seed),
            WeatherConfig::File { path, settings } => {
                read_weather(&self.resolve(path), settings)?
            }
        };
        let heating_limit = self.consumers.heating_limit;
        let load_curve = match &self.load {
            LoadConfig::Synthetic(l) => l.load_curve(&weather, heating_limit),
            LoadConfig::Constant { kw } => vec![*kw; HOURS],
            LoadConfig::File { path } => read_load_curve(&self.resolve(path))?,
        };

        let producers = self
            .producers
            .iter()
            .map(|p| {
                if p.product_type == ProductType::Other {
                    p.clone().with_model(p.model.clone())
                } else {
                    p.clone()
                }
            })
            .collect();

        let project = Project {
            load_curve,
            heat_net: self.heat_net,
            buffer: self.buffer,
            consumer_heating_limit: heating_limit,
            weather,
            producers,
        };
        project.validate()?;
        Ok(project)
    }
}
