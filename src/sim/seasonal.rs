//! Seasonal heat-net parameters derived from the outdoor temperature.

use crate::model::{HeatNet, HOURS, Project};

/// Temperature range over which seasonal values slide.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeasonalBounds {
    /// Coldest outdoor temperature of the year; full winter values apply here (°C).
    pub min_temperature: f64,
    /// Consumer heating limit; full summer values apply from here on (°C).
    pub heating_limit: f64,
}

impl SeasonalBounds {
    pub fn for_project(project: &Project) -> Self {
        Self {
            min_temperature: project.weather.min_temperature(),
            heating_limit: project.consumer_heating_limit,
        }
    }

    /// Position between winter (0.0) and summer (1.0).
    fn summer_fraction(&self, outdoor_temperature: f64) -> f64 {
        let span = self.heating_limit - self.min_temperature;
        if span <= 0.0 {
            return if outdoor_temperature >= self.heating_limit {
                1.0
            } else {
                0.0
            };
        }
        ((outdoor_temperature - self.min_temperature) / span).clamp(0.0, 1.0)
    }
}

/// Heat-net operating point for one hour.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeasonalItem {
    pub target_charge_level: f64,
    pub flow_temperature: f64,
    pub return_temperature: f64,
}

impl SeasonalItem {
    /// Computes the operating point for one outdoor temperature.
    ///
    /// Without seasonal driving the heat net's fixed values are returned.
    pub fn calc(heat_net: &HeatNet, bounds: &SeasonalBounds, outdoor_temperature: f64) -> Self {
        let Some(seasonal) = heat_net.seasonal else {
            return Self {
                target_charge_level: heat_net.target_charge_level,
                flow_temperature: heat_net.supply_temperature,
                return_temperature: heat_net.return_temperature,
            };
        };

        let x = bounds.summer_fraction(outdoor_temperature);
        let lerp = |winter: f64, summer: f64| winter + x * (summer - winter);
        Self {
            target_charge_level: lerp(
                seasonal.target_charge_level_winter,
                seasonal.target_charge_level_summer,
            ),
            flow_temperature: lerp(
                seasonal.flow_temperature_winter,
                seasonal.flow_temperature_summer,
            ),
            return_temperature: lerp(
                seasonal.return_temperature_winter,
                seasonal.return_temperature_summer,
            ),
        }
    }

    /// Operating points for every hour of the project's year.
    pub fn year(project: &Project) -> Vec<Self> {
        let bounds = SeasonalBounds::for_project(project);
        (0..HOURS)
            .map(|h| Self::calc(&project.heat_net, &bounds, project.weather.temperature_at(h)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SeasonalDriving;

    fn bounds() -> SeasonalBounds {
        SeasonalBounds {
            min_temperature: -10.0,
            heating_limit: 15.0,
        }
    }

    #[test]
    fn fixed_values_without_seasonal_driving() {
        let net = HeatNet::default();
        let item = SeasonalItem::calc(&net, &bounds(), -5.0);
        assert_eq!(item.flow_temperature, net.supply_temperature);
        assert_eq!(item.return_temperature, net.return_temperature);
        assert_eq!(item.target_charge_level, net.target_charge_level);
    }

    #[test]
    fn interpolates_between_winter_and_summer() {
        let net = HeatNet {
            seasonal: Some(SeasonalDriving::default()),
            ..HeatNet::default()
        };
        let winter = SeasonalItem::calc(&net, &bounds(), -20.0);
        assert_eq!(winter.flow_temperature, 85.0);
        let summer = SeasonalItem::calc(&net, &bounds(), 25.0);
        assert_eq!(summer.flow_temperature, 70.0);
        assert_eq!(summer.target_charge_level, 0.5);

        let mid = SeasonalItem::calc(&net, &bounds(), 2.5);
        assert!((mid.flow_temperature - 77.5).abs() < 1e-9);
        assert!((mid.return_temperature - 50.0).abs() < 1e-9);
    }

    #[test]
    fn degenerate_range_switches_at_limit() {
        let b = SeasonalBounds {
            min_temperature: 15.0,
            heating_limit: 15.0,
        };
        assert_eq!(b.summer_fraction(14.0), 0.0);
        assert_eq!(b.summer_fraction(15.0), 1.0);
    }
}
