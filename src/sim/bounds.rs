//! Achievable power range of a producer for one hour.

use crate::devices::PhysicalState;
use crate::model::{Producer, ProducerModel};

/// Power range `[min_kw, max_kw]` a producer can run at this hour.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PowerBounds {
    pub min_kw: f64,
    pub max_kw: f64,
}

impl PowerBounds {
    /// Clamps `baseline` into the range. `max_kw` wins if the range is inverted.
    pub fn clamp(&self, baseline: f64) -> f64 {
        baseline.max(self.min_kw).min(self.max_kw)
    }
}

/// Combines rated capacity with the producer's current physical state.
///
/// - profile: the hour's profile bounds, falling back to the rated range
/// - solar: exactly the collector's available gain
/// - heat pump: rated range scaled by the source-temperature derate
/// - plain: rated range
pub fn power_bounds(producer: &Producer, state: &PhysicalState, hour: usize) -> PowerBounds {
    let rated = producer.rated;
    match (&producer.model, state) {
        (ProducerModel::Profile(profile), _) => {
            let pick = |series: &Option<Vec<f64>>, fallback: f64| {
                series
                    .as_ref()
                    .and_then(|s| s.get(hour).copied())
                    .unwrap_or(fallback)
            };
            PowerBounds {
                min_kw: pick(&profile.min_power, rated.min_kw),
                max_kw: pick(&profile.max_power, rated.max_kw),
            }
        }
        (_, PhysicalState::Solar(solar)) => {
            let gain = solar.available_power();
            PowerBounds {
                min_kw: gain,
                max_kw: gain,
            }
        }
        (_, PhysicalState::HeatPump(hp)) => PowerBounds {
            min_kw: rated.min_kw * hp.derate(),
            max_kw: rated.max_kw * hp.derate(),
        },
        (_, PhysicalState::Stateless) => PowerBounds {
            min_kw: rated.min_kw,
            max_kw: rated.max_kw,
        },
    }
}
