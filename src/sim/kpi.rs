//! Annual summary figures derived from a finished run.

use std::fmt;

use serde::Serialize;

use super::types::EnergyResult;

/// Annual figures of one producer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProducerSummary {
    pub id: String,
    /// Heat delivered over the year (kWh).
    pub heat_kwh: f64,
    /// Share of the total load (percent).
    pub share_pct: f64,
    /// Hours with non-zero output.
    pub operating_hours: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stagnation_days: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jaz: Option<f64>,
}

/// Aggregate indicators of a complete run.
///
/// Computed post-hoc from [`EnergyResult`] so reported numbers always match
/// the hourly series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnergySummary {
    pub total_load_kwh: f64,
    pub produced_kwh: f64,
    /// Heat the buffer released into the net (kWh).
    pub buffered_kwh: f64,
    /// Surplus heat stored by the buffer (kWh).
    pub charged_kwh: f64,
    pub buffer_loss_kwh: f64,
    pub unmet_kwh: f64,
    /// Hours in which demand was not fully met.
    pub unmet_hours: usize,
    pub peak_load_kw: f64,
    /// Share of the load that reached consumers (percent).
    pub coverage_pct: f64,
    pub producers: Vec<ProducerSummary>,
}

impl EnergySummary {
    /// Tolerance below which an hourly shortfall counts as met (kW).
    const UNMET_EPSILON: f64 = 1e-6;

    pub fn from_result(result: &EnergyResult) -> Self {
        let total_load = result.load_curve.iter().sum::<f64>();
        let share = |heat: f64| {
            if total_load > 0.0 {
                100.0 * heat / total_load
            } else {
                0.0
            }
        };

        let producers = result
            .producer_ids
            .iter()
            .enumerate()
            .map(|(k, id)| {
                let series = &result.producer_results[k];
                let heat_kwh: f64 = series.iter().sum();
                ProducerSummary {
                    id: id.clone(),
                    heat_kwh,
                    share_pct: share(heat_kwh),
                    operating_hours: series.iter().filter(|&&v| v > 0.0).count(),
                    stagnation_days: result.producer_stagnation_days[k],
                    jaz: result.producer_jaz[k],
                }
            })
            .collect();

        let unmet_kwh: f64 = result.unmet_load.iter().sum();
        Self {
            total_load_kwh: total_load,
            produced_kwh: result.producer_results.iter().flatten().sum(),
            buffered_kwh: result.supplied_buffer_heat.iter().sum(),
            charged_kwh: result.buffer_charged.iter().sum(),
            buffer_loss_kwh: result.buffer_loss.iter().sum(),
            unmet_kwh,
            unmet_hours: result
                .unmet_load
                .iter()
                .filter(|&&v| v > Self::UNMET_EPSILON)
                .count(),
            peak_load_kw: result.load_curve.iter().copied().fold(0.0, f64::max),
            coverage_pct: if total_load > 0.0 {
                100.0 * (1.0 - unmet_kwh / total_load)
            } else {
                100.0
            },
            producers,
        }
    }
}

impl fmt::Display for EnergySummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Energy Summary ---")?;
        writeln!(f, "Total load:            {:.1} kWh", self.total_load_kwh)?;
        writeln!(f, "Peak load:             {:.2} kW", self.peak_load_kw)?;
        writeln!(f, "Produced heat:         {:.1} kWh", self.produced_kwh)?;
        writeln!(
            f,
            "Buffer:                {:.1} kWh out, {:.1} kWh in, {:.1} kWh lost",
            self.buffered_kwh, self.charged_kwh, self.buffer_loss_kwh
        )?;
        writeln!(
            f,
            "Unmet load:            {:.1} kWh in {} h ({:.2}% covered)",
            self.unmet_kwh, self.unmet_hours, self.coverage_pct
        )?;
        write!(f, "Producers:")?;
        for p in &self.producers {
            write!(
                f,
                "\n  {:<20} {:>12.1} kWh {:>6.1}% {:>5} h",
                p.id, p.heat_kwh, p.share_pct, p.operating_hours
            )?;
            if let Some(days) = p.stagnation_days {
                write!(f, "  stagnation {days} d")?;
            }
            if let Some(jaz) = p.jaz {
                write!(f, "  JAZ {jaz:.2}")?;
            }
        }
        Ok(())
    }
}
