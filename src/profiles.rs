//! Seeded synthetic weather and heat-demand profiles.
//!
//! These let a scenario run without station data or metered load files.
//! Identical seeds give identical series.

use std::f64::consts::PI;

use rand::{Rng, SeedableRng, rngs::StdRng};
use serde::Deserialize;

use crate::model::{HOURS, Weather};

const DAYS: usize = HOURS / 24;

/// Bounds of the AR(1) cloud multiplier.
const CLOUD_MIN: f64 = 0.1;
const CLOUD_MAX: f64 = 1.0;

/// Draws from `N(0, std_dev²)` via Box-Muller. Zero for non-positive `std_dev`.
pub fn gaussian_noise(rng: &mut StdRng, std_dev: f64) -> f64 {
    if std_dev <= 0.0 {
        return 0.0;
    }

    let u1: f64 = rng.random::<f64>().clamp(1e-12, 1.0);
    let u2: f64 = rng.random::<f64>();
    let z0 = (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos();
    z0 * std_dev
}

/// Synthetic central-European climate.
///
/// Temperature is an annual cosine (coldest mid-January) plus a daily cosine
/// (coldest before dawn) plus a persistent AR(1) anomaly. Radiation is a
/// half-sine over a seasonally varying day length, scaled by an AR(1)
/// cloud multiplier.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SyntheticWeather {
    /// Annual mean air temperature (°C).
    pub mean_temperature: f64,
    /// Half the summer/winter swing (K).
    pub annual_amplitude: f64,
    /// Half the day/night swing (K).
    pub daily_amplitude: f64,
    /// Standard deviation of the hourly temperature innovation (K).
    pub temperature_noise_std: f64,
    /// Clear-sky irradiance at solar noon in midsummer (W/m²).
    pub peak_radiation: f64,
    /// AR(1) correlation of the cloud multiplier (0.0 to 1.0).
    pub cloud_alpha: f64,
    /// Standard deviation of the cloud innovation.
    pub cloud_noise_std: f64,
}

impl Default for SyntheticWeather {
    fn default() -> Self {
        Self {
            mean_temperature: 9.0,
            annual_amplitude: 10.0,
            daily_amplitude: 4.0,
            temperature_noise_std: 0.8,
            peak_radiation: 850.0,
            cloud_alpha: 0.85,
            cloud_noise_std: 0.3,
        }
    }
}

impl SyntheticWeather {
    /// Generates a full year of weather.
    pub fn generate(&self, seed: u64) -> Weather {
        let mut rng = StdRng::seed_from_u64(seed);
        let alpha = self.cloud_alpha.clamp(0.0, 1.0);
        let mut anomaly = 0.0;
        let mut cloud = 1.0;

        let mut temperatures = Vec::with_capacity(HOURS);
        let mut radiation = Vec::with_capacity(HOURS);
        for hour in 0..HOURS {
            let day = (hour / 24) as f64;
            let hod = (hour % 24) as f64;

            let annual = -self.annual_amplitude * (2.0 * PI * (day - 15.0) / DAYS as f64).cos();
            let daily = -self.daily_amplitude * (2.0 * PI * (hod - 4.0) / 24.0).cos();
            anomaly = 0.95 * anomaly + gaussian_noise(&mut rng, self.temperature_noise_std);
            temperatures.push(self.mean_temperature + annual + daily + anomaly);

            let innovation = 1.0 + gaussian_noise(&mut rng, self.cloud_noise_std);
            cloud = (alpha * cloud + (1.0 - alpha) * innovation).clamp(CLOUD_MIN, CLOUD_MAX);
            radiation.push(self.peak_radiation * daylight_frac(hour) * cloud);
        }

        Weather {
            temperatures,
            radiation,
        }
    }
}

/// Clear-sky fraction of the peak irradiance at `hour` (0.0 to 1.0).
///
/// Day length swings between 8 h at the winter and 16 h at the summer solstice.
pub fn daylight_frac(hour: usize) -> f64 {
    let day = (hour / 24) as f64;
    // -1 at the winter solstice, +1 at the summer solstice
    let season = -(2.0 * PI * (day + 10.0) / DAYS as f64).cos();
    let half_length = 6.0 + 2.0 * season;
    let sunrise = 12.0 - half_length;
    let t = (hour % 24) as f64 + 0.5 - sunrise;
    if t <= 0.0 || t >= 2.0 * half_length {
        return 0.0;
    }
    let intensity = 0.55 + 0.45 * (1.0 + season) / 2.0;
    intensity * (PI * t / (2.0 * half_length)).sin()
}

/// Degree-hour heat-demand model.
///
/// A constant hot-water share runs all year; the space-heating share is
/// spread over the hours below the heating limit in proportion to
/// `heating_limit - outdoor temperature`. The curve sums to the annual demand.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SyntheticLoad {
    /// Annual heat demand (kWh).
    pub annual_demand_kwh: f64,
    /// Share of the demand independent of the weather (0.0 to 1.0).
    pub hot_water_share: f64,
}

impl Default for SyntheticLoad {
    fn default() -> Self {
        Self {
            annual_demand_kwh: 2_500_000.0,
            hot_water_share: 0.15,
        }
    }
}

impl SyntheticLoad {
    /// Builds the hourly load curve (kW).
    ///
    /// # Arguments
    ///
    /// * `weather` - Hourly outdoor temperature; missing hours read as 0 °C
    /// * `heating_limit` - Outdoor temperature above which no space heating is needed
    pub fn load_curve(&self, weather: &Weather, heating_limit: f64) -> Vec<f64> {
        let share = self.hot_water_share.clamp(0.0, 1.0);
        let degree_hours: Vec<f64> = (0..HOURS)
            .map(|h| (heating_limit - weather.temperature_at(h)).max(0.0))
            .collect();
        let total: f64 = degree_hours.iter().sum();

        let (base, heating) = if total > 0.0 {
            (share * self.annual_demand_kwh, (1.0 - share) * self.annual_demand_kwh)
        } else {
            (self.annual_demand_kwh, 0.0)
        };
        let base_kw = base / HOURS as f64;

        degree_hours
            .iter()
            .map(|&dh| {
                let space = if total > 0.0 { heating * dh / total } else { 0.0 };
                base_kw + space
            })
            .collect()
    }
}
