//! Hourly dispatch of producers and the buffer against the heat demand.

use tracing::{debug, info, trace};

use crate::devices::{BufferLedger, BufferTemperatures, BufferTier, HourWeather, PhysicalState};
use crate::error::SimError;
use crate::io::diagnostics::DiagnosticsSink;
use crate::model::{HOURS, OutdoorControl, Producer, ProducerFunction, ProducerModel, Project};

use super::bounds::power_bounds;
use super::interruption::InterruptionMask;
use super::seasonal::SeasonalItem;
use super::types::EnergyResult;

/// Diagnostic artifact names.
pub const SOLAR_LOG: &str = "solar_calc.log";
pub const TARGET_CHARGE_LEVELS: &str = "seasonal_target_charge_levels.csv";
pub const FLOW_TEMPERATURES: &str = "seasonal_flow_temperatures.csv";
pub const RETURN_TEMPERATURES: &str = "seasonal_return_temperatures.csv";

/// Runs the full year and returns the result.
///
/// Diagnostics go to `sink`; a failing sink is logged and ignored.
///
/// # Errors
///
/// Returns a [`SimError`] if the project is inconsistent (series lengths,
/// model/product type mismatch, duplicate ids, bad interruption stamps).
pub fn simulate(
    project: &Project,
    sink: &mut dyn DiagnosticsSink,
) -> Result<EnergyResult, SimError> {
    Ok(Engine::new(project)?.run(sink))
}

/// Whether a producer may run this hour.
///
/// It must be classified into a buffer tier, be operating (solar fields only
/// deliver in their operating phase), not be interrupted and not be locked
/// out by its outdoor-temperature control.
fn is_eligible(
    tier: Option<BufferTier>,
    state: &PhysicalState,
    mask: Option<&InterruptionMask>,
    control: Option<&OutdoorControl>,
    hour: usize,
    outdoor_temperature: f64,
) -> bool {
    tier.is_some()
        && state.is_operating()
        && !mask.is_some_and(|m| m.is_interrupted(hour))
        && !control.is_some_and(|c| c.locks_out(outdoor_temperature))
}

/// Tier a producer feeds this hour. A temperature profile takes precedence
/// over the physical model.
fn buffer_load_type(
    producer: &Producer,
    state: &PhysicalState,
    temps: &BufferTemperatures,
    hour: usize,
) -> Option<BufferTier> {
    match &producer.model {
        ProducerModel::Profile(profile) => temps.classify(profile.temperature_levels[hour]),
        _ => state.buffer_load_type(),
    }
}

fn achievable_temperature(
    producer: &Producer,
    state: &PhysicalState,
    temps: &BufferTemperatures,
    hour: usize,
) -> f64 {
    match &producer.model {
        ProducerModel::Profile(profile) => profile.temperature_levels[hour],
        _ => state.achievable_temperature().unwrap_or(temps.flow),
    }
}

/// Share of the demand an NT producer at `temperature` can cover.
fn producer_nt_load_factor(temperature: f64, temps: &BufferTemperatures) -> f64 {
    let span = temps.flow - temps.return_;
    if span <= 0.0 {
        return 0.0;
    }
    ((temperature - temps.return_) / span).clamp(0.0, 1.0)
}

/// Owns the mutable state of one run: buffer, producer states and the
/// growing result.
pub struct Engine<'a> {
    project: &'a Project,
    masks: Vec<Option<InterruptionMask>>,
    buffer: BufferLedger,
    states: Vec<PhysicalState>,
    result: EnergyResult,
}

impl<'a> Engine<'a> {
    /// Validates `project` and prepares a fresh run.
    ///
    /// # Errors
    ///
    /// See [`simulate`].
    pub fn new(project: &'a Project) -> Result<Self, SimError> {
        project.validate()?;
        let masks = InterruptionMask::build_all(&project.producers)?;
        Ok(Self {
            project,
            masks,
            buffer: BufferLedger::new(project.buffer, SeasonalItem::year(project))?,
            states: project.producers.iter().map(PhysicalState::for_producer).collect(),
            result: EnergyResult::new(project),
        })
    }

    /// Dispatches every hour of the year, then collects producer metrics,
    /// writes diagnostics and fills the totals.
    pub fn run(mut self, sink: &mut dyn DiagnosticsSink) -> EnergyResult {
        info!(
            producers = self.project.producers.len(),
            "starting dispatch run"
        );
        for hour in 0..HOURS {
            self.step(hour);
        }

        for (k, state) in self.states.iter().enumerate() {
            match state {
                PhysicalState::Solar(solar) => {
                    self.result.producer_stagnation_days[k] = Some(solar.stagnation_days());
                }
                PhysicalState::HeatPump(hp) => self.result.producer_jaz[k] = Some(hp.jaz()),
                PhysicalState::Stateless => {}
            }
        }

        self.write_diagnostics(sink);
        self.result.calc_totals();
        info!(
            total_load = self.result.total_load,
            produced = self.result.total_produced_heat,
            buffered = self.result.total_buffered_heat,
            unmet = self.result.total_unmet_load,
            "dispatch run finished"
        );
        self.result
    }

    fn step(&mut self, hour: usize) {
        let project = self.project;
        let load = project.load_curve[hour];

        self.buffer.pre_step(hour);
        if hour == 0 {
            self.result.buffer_capacity[0] = self.buffer.ht_capacity();
        }

        let temps = self.buffer.temperatures();
        let weather = HourWeather {
            temperature: project.weather.temperature_at(hour),
            radiation: project.weather.radiation_at(hour),
        };
        for state in &mut self.states {
            state.calc_pre(hour, &temps, weather);
        }

        let tiers: Vec<Option<BufferTier>> = project
            .producers
            .iter()
            .zip(&self.states)
            .map(|(p, s)| buffer_load_type(p, s, &temps, hour))
            .collect();
        let eligible: Vec<bool> = project
            .producers
            .iter()
            .enumerate()
            .map(|(k, p)| {
                is_eligible(
                    tiers[k],
                    &self.states[k],
                    self.masks[k].as_ref(),
                    p.outdoor_control.as_ref(),
                    hour,
                    weather.temperature,
                )
            })
            .collect();
        let have_ht = tiers
            .iter()
            .zip(&eligible)
            .any(|(&t, &e)| e && t == Some(BufferTier::Ht));

        let mut heat_net = 0.0;
        let mut produced = 0.0;
        for k in 0..project.producers.len() {
            if load - heat_net <= 0.0 {
                break;
            }
            let Some(tier) = tiers[k].filter(|_| eligible[k]) else {
                continue;
            };
            let delivered = self.allocate(k, hour, tier, have_ht, &mut heat_net);
            self.result.producer_results[k][hour] = delivered;
            produced += delivered;
            self.states[k].set_consumed_power(delivered * 1000.0);
        }

        for state in &mut self.states {
            state.calc_post(hour);
        }

        let required = load - heat_net;
        if required > 0.0 {
            let nt_limit = (load * self.buffer.nt_load_factor() - heat_net).max(0.0);
            let mut residual = self.buffer.discharge(hour, required, BufferTier::Ht);
            residual = self.buffer.discharge(hour, residual, BufferTier::Vt);
            if residual > 0.0 && have_ht {
                let ask = nt_limit.min(residual);
                residual = self.buffer.discharge(hour, ask, BufferTier::Nt) + (residual - ask);
            }
            let drawn = required - residual;
            heat_net += drawn;
            self.result.supplied_buffer_heat[hour] += drawn;
        }

        self.result.supplied_power[hour] = produced + self.result.supplied_buffer_heat[hour];
        self.result.net_supply[hour] = heat_net;
        self.result.unmet_load[hour] = (load - heat_net).max(0.0);
        self.result.buffer_loss[hour] = self.buffer.apply_loss(hour);
        if hour + 1 < HOURS {
            self.result.buffer_capacity[hour + 1] = self.buffer.ht_capacity();
        }
        self.buffer.post_step(hour);

        trace!(
            hour,
            load,
            supplied = heat_net,
            stored = self.buffer.stored_energy(),
            "hour dispatched"
        );
    }

    /// Decides the output of producer `k` and books it against the heat net
    /// and the buffer. Returns the heat the producer delivered.
    fn allocate(
        &mut self,
        k: usize,
        hour: usize,
        tier: BufferTier,
        have_ht: bool,
        heat_net: &mut f64,
    ) -> f64 {
        let project = self.project;
        let producer = &project.producers[k];
        let load = project.load_curve[hour];
        let required = load - *heat_net;
        let temps = self.buffer.temperatures();

        let state = &self.states[k];
        let load_factor = match tier {
            BufferTier::Nt => {
                let achievable = achievable_temperature(producer, state, &temps, hour);
                producer_nt_load_factor(achievable, &temps)
            }
            BufferTier::Ht | BufferTier::Vt => 1.0,
        };
        let bounds = power_bounds(producer, state, hour);

        let mut reduced = (load * load_factor - *heat_net).max(0.0);
        let nt_limit = (load * self.buffer.nt_load_factor() - *heat_net).max(0.0);
        let nt_unloadable = nt_limit.min(self.buffer.dischargeable(BufferTier::Nt));
        let limited = producer.function != ProducerFunction::MaxLoad;
        let max_relative = reduced + self.buffer.chargeable(tier, limited, load_factor);
        let max_absolute = reduced + self.buffer.chargeable(tier, false, load_factor);

        let baseline = match producer.function {
            ProducerFunction::PeakLoad => reduced,
            ProducerFunction::BaseLoad | ProducerFunction::MaxLoad => max_relative,
        };
        let mut power = bounds.clamp(baseline);

        if !producer.is_solar()
            && self.buffer_covers(required, have_ht, nt_unloadable, producer.function)
        {
            trace!(hour, producer = %producer.id, "buffer covers demand, producer idle");
            return 0.0;
        }
        if power > max_absolute {
            trace!(
                hour,
                producer = %producer.id,
                power,
                max_absolute,
                "output exceeds what net and buffer can take, producer idle"
            );
            return 0.0;
        }

        if tier == BufferTier::Ht
            && producer.function == ProducerFunction::PeakLoad
            && self.buffer.dischargeable(BufferTier::Nt) > 0.0
        {
            let ask = nt_unloadable.min(power - bounds.min_kw).max(0.0);
            let drawn = ask - self.buffer.discharge(hour, ask, BufferTier::Nt);
            *heat_net += drawn;
            self.result.supplied_buffer_heat[hour] += drawn;
            power -= drawn;
            reduced -= drawn;
        }

        if !have_ht && tier == BufferTier::Nt {
            return 0.0;
        }

        let surplus = power - reduced;
        if surplus > 0.0 {
            let absorbed = self
                .buffer
                .charge(hour, surplus, tier, false, load_factor);
            self.result.buffer_charged[hour] += absorbed;
            *heat_net += reduced;
            reduced + absorbed
        } else {
            *heat_net += power;
            power
        }
    }

    /// Whether the buffer alone can cover `required`, so that running the
    /// producer would be wasted. MAX_LOAD producers always run.
    fn buffer_covers(
        &self,
        required: f64,
        have_ht: bool,
        nt_unloadable: f64,
        function: ProducerFunction,
    ) -> bool {
        let nt = if have_ht { nt_unloadable } else { 0.0 };
        let unloadable = self.buffer.dischargeable(BufferTier::Ht)
            + self.buffer.dischargeable(BufferTier::Vt)
            + nt;
        match function {
            ProducerFunction::PeakLoad => unloadable >= required,
            ProducerFunction::BaseLoad => {
                unloadable >= required && self.buffer.target_still_reached_after_discharge(required)
            }
            ProducerFunction::MaxLoad => false,
        }
    }

    fn write_diagnostics(&self, sink: &mut dyn DiagnosticsSink) {
        let solar_log = self
            .states
            .iter()
            .filter_map(|s| match s {
                PhysicalState::Solar(solar) => Some(solar.log().join("\n")),
                _ => None,
            })
            .filter(|log| !log.is_empty())
            .collect::<Vec<_>>()
            .join("\n");
        if let Err(e) = sink.write_text(SOLAR_LOG, &solar_log) {
            debug!(artifact = SOLAR_LOG, error = %e, "diagnostics write failed");
        }

        let items = SeasonalItem::year(self.project);
        let series: [(&str, fn(&SeasonalItem) -> f64); 3] = [
            (TARGET_CHARGE_LEVELS, |i| i.target_charge_level),
            (FLOW_TEMPERATURES, |i| i.flow_temperature),
            (RETURN_TEMPERATURES, |i| i.return_temperature),
        ];
        for (name, pick) in series {
            let values: Vec<f64> = items.iter().map(pick).collect();
            if let Err(e) = sink.write_series(name, &values) {
                debug!(artifact = name, error = %e, "diagnostics write failed");
            }
        }
    }
}
