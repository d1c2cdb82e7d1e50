//! Stratified thermal buffer tank ledger.

use crate::devices::types::{BufferTemperatures, BufferTier};
use crate::error::SimError;
use crate::model::BufferSpec;
use crate::sim::seasonal::SeasonalItem;

/// Specific heat of water (kWh per litre and kelvin).
const WATER_KWH_PER_LITRE_K: f64 = 0.001_163;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct Layer {
    capacity_kwh: f64,
    stored_kwh: f64,
}

impl Layer {
    fn headroom_kwh(&self, level: f64) -> f64 {
        (self.capacity_kwh * level - self.stored_kwh).max(0.0)
    }

    /// Clamps the content to the capacity and returns the overflow.
    fn overflow(&mut self) -> f64 {
        let excess = (self.stored_kwh - self.capacity_kwh).max(0.0);
        self.stored_kwh -= excess;
        excess
    }
}

/// Three-layer stratified buffer tank.
///
/// `BufferLedger` tracks the heat stored in the HT, VT and NT layers. Layer
/// capacities follow the heat-net temperatures of the current hour, so they
/// are re-derived at every [`pre_step`](Self::pre_step).
///
/// All energies are kWh; with a one-hour step they double as kW.
///
/// # Hour bracket
/// Every charge, discharge and loss call for an hour must happen between
/// `pre_step(hour)` and `post_step(hour)`. Debug builds assert this.
#[derive(Debug, Clone)]
pub struct BufferLedger {
    spec: BufferSpec,
    /// Heat-net operating point per hour.
    seasonal: Vec<SeasonalItem>,
    temps: BufferTemperatures,
    target_charge_level: f64,
    ht: Layer,
    vt: Layer,
    nt: Layer,
    /// Heat pushed out of the NT layer by shrinking capacities, not yet reported.
    spilled_kwh: f64,
    open_hour: Option<usize>,
}

impl BufferLedger {
    /// Creates a ledger charged to `spec.initial_charge_level`.
    ///
    /// # Arguments
    ///
    /// * `spec` - Tank geometry and temperatures
    /// * `seasonal` - Heat-net operating point per hour (see [`SeasonalItem::year`])
    ///
    /// # Errors
    ///
    /// Returns [`SimError::BufferSpec`] if `seasonal` is empty or `spec` fails
    /// [`BufferSpec::validate`].
    pub fn new(spec: BufferSpec, seasonal: Vec<SeasonalItem>) -> Result<Self, SimError> {
        spec.validate()?;
        let first = *seasonal
            .first()
            .ok_or_else(|| SimError::BufferSpec("no heat-net operating point".into()))?;
        let mut ledger = Self {
            spec,
            seasonal,
            temps: BufferTemperatures {
                envelope: spec.envelope_temperature,
                flow: first.flow_temperature,
                return_: first.return_temperature,
                max: spec.max_temperature,
            },
            target_charge_level: first.target_charge_level,
            ht: Layer::default(),
            vt: Layer::default(),
            nt: Layer::default(),
            spilled_kwh: 0.0,
            open_hour: None,
        };
        ledger.apply_operating_point(first);

        let level = spec.initial_charge_level.clamp(0.0, 1.0);
        for layer in [&mut ledger.ht, &mut ledger.vt, &mut ledger.nt] {
            layer.stored_kwh = layer.capacity_kwh * level;
        }
        Ok(ledger)
    }

    fn layer(&self, tier: BufferTier) -> &Layer {
        match tier {
            BufferTier::Ht => &self.ht,
            BufferTier::Vt => &self.vt,
            BufferTier::Nt => &self.nt,
        }
    }

    fn layer_mut(&mut self, tier: BufferTier) -> &mut Layer {
        match tier {
            BufferTier::Ht => &mut self.ht,
            BufferTier::Vt => &mut self.vt,
            BufferTier::Nt => &mut self.nt,
        }
    }

    fn apply_operating_point(&mut self, item: SeasonalItem) {
        self.temps.flow = item.flow_temperature;
        self.temps.return_ = item.return_temperature;
        self.target_charge_level = item.target_charge_level.clamp(0.0, 1.0);

        let s = &self.spec;
        let ret = self.temps.return_;
        let nt_share = (1.0 - s.ht_share - s.vt_share).max(0.0);
        let litre_kelvin = |share: f64, top: f64| {
            s.volume_litres * share * WATER_KWH_PER_LITRE_K * (top - ret).max(0.0)
        };
        self.ht.capacity_kwh = litre_kelvin(s.ht_share, s.max_temperature);
        self.vt.capacity_kwh = litre_kelvin(s.vt_share, self.temps.flow);
        self.nt.capacity_kwh = litre_kelvin(nt_share, s.nt_temperature);

        // Heat above a shrunken layer settles into the next cooler one.
        let from_ht = self.ht.overflow();
        self.vt.stored_kwh += from_ht;
        let from_vt = self.vt.overflow();
        self.nt.stored_kwh += from_vt;
        self.spilled_kwh += self.nt.overflow();
    }

    fn assert_open(&self, hour: usize) {
        debug_assert_eq!(self.open_hour, Some(hour), "buffer hour bracket violated");
    }

    /// Opens `hour`: applies the hour's heat-net temperatures.
    pub fn pre_step(&mut self, hour: usize) {
        debug_assert!(self.open_hour.is_none(), "pre_step without post_step");
        if let Some(item) = self.seasonal.get(hour).copied() {
            self.apply_operating_point(item);
        }
        self.open_hour = Some(hour);
    }

    /// Closes `hour`.
    pub fn post_step(&mut self, hour: usize) {
        self.assert_open(hour);
        self.open_hour = None;
    }

    pub fn temperatures(&self) -> BufferTemperatures {
        self.temps
    }

    pub fn envelope_temperature(&self) -> f64 {
        self.temps.envelope
    }

    pub fn flow_temperature(&self) -> f64 {
        self.temps.flow
    }

    pub fn return_temperature(&self) -> f64 {
        self.temps.return_
    }

    pub fn max_temperature(&self) -> f64 {
        self.temps.max
    }

    /// Heat a tier can still take this hour.
    ///
    /// `limited` caps the layer at the target charge level instead of its full
    /// capacity. `load_factor` scales the NT headroom and is ignored otherwise.
    pub fn chargeable(&self, tier: BufferTier, limited: bool, load_factor: f64) -> f64 {
        let level = if limited { self.target_charge_level } else { 1.0 };
        let headroom = self.layer(tier).headroom_kwh(level);
        match tier {
            BufferTier::Nt => headroom * load_factor.clamp(0.0, 1.0),
            BufferTier::Ht | BufferTier::Vt => headroom,
        }
    }

    /// Unlimited HT headroom, the figure reported as buffer capacity.
    pub fn ht_capacity(&self) -> f64 {
        self.chargeable(BufferTier::Ht, false, 1.0)
    }

    /// Heat a tier can release this hour.
    pub fn dischargeable(&self, tier: BufferTier) -> f64 {
        self.layer(tier).stored_kwh
    }

    /// Share of the demand the NT layer can cover at the current temperatures.
    pub fn nt_load_factor(&self) -> f64 {
        let span = self.temps.flow - self.temps.return_;
        if span <= 0.0 {
            return 0.0;
        }
        ((self.spec.nt_temperature - self.temps.return_) / span).clamp(0.0, 1.0)
    }

    /// Whether HT and VT would still sit at or above the target charge level
    /// after releasing `amount`.
    pub fn target_still_reached_after_discharge(&self, amount: f64) -> bool {
        let stored = self.ht.stored_kwh + self.vt.stored_kwh;
        let capacity = self.ht.capacity_kwh + self.vt.capacity_kwh;
        stored - amount >= self.target_charge_level * capacity
    }

    /// Stores up to `power` in `tier` and returns the amount absorbed.
    pub fn charge(
        &mut self,
        hour: usize,
        power: f64,
        tier: BufferTier,
        limited: bool,
        load_factor: f64,
    ) -> f64 {
        self.assert_open(hour);
        if power <= 0.0 {
            return 0.0;
        }
        let absorbed = power.min(self.chargeable(tier, limited, load_factor));
        self.layer_mut(tier).stored_kwh += absorbed;
        absorbed
    }

    /// Releases up to `power` from `tier` and returns the part NOT satisfied.
    pub fn discharge(&mut self, hour: usize, power: f64, tier: BufferTier) -> f64 {
        self.assert_open(hour);
        if power <= 0.0 {
            return 0.0;
        }
        let layer = self.layer_mut(tier);
        let taken = power.min(layer.stored_kwh);
        layer.stored_kwh -= taken;
        power - taken
    }

    /// Removes the hour's standing loss and returns it.
    ///
    /// The returned figure also includes heat spilled from the NT layer when
    /// the hour's temperatures shrank the layers, so stored energy changes
    /// only through charge, discharge and this loss.
    pub fn apply_loss(&mut self, hour: usize) -> f64 {
        self.assert_open(hour);
        let spilled = std::mem::take(&mut self.spilled_kwh);
        let stored = self.stored_energy();
        let capacity = self.ht.capacity_kwh + self.vt.capacity_kwh + self.nt.capacity_kwh;
        if stored <= 0.0 || capacity <= 0.0 {
            return spilled;
        }

        let fill = (stored / capacity).min(1.0);
        let mean_temperature = self.temps.return_ + fill * (self.temps.max - self.temps.return_);
        let loss = (self.spec.loss_coefficient_w_per_k * (mean_temperature - self.temps.envelope)
            / 1000.0)
            .clamp(0.0, stored);

        for layer in [&mut self.ht, &mut self.vt, &mut self.nt] {
            layer.stored_kwh -= loss * layer.stored_kwh / stored;
        }
        loss + spilled
    }

    /// Total heat held in all layers (kWh).
    pub fn stored_energy(&self) -> f64 {
        self.ht.stored_kwh + self.vt.stored_kwh + self.nt.stored_kwh
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(flow: f64, ret: f64) -> SeasonalItem {
        SeasonalItem {
            target_charge_level: 0.8,
            flow_temperature: flow,
            return_temperature: ret,
        }
    }

    fn ledger(initial: f64) -> BufferLedger {
        let spec = BufferSpec {
            initial_charge_level: initial,
            ..BufferSpec::default()
        };
        BufferLedger::new(spec, vec![item(80.0, 50.0); 4]).expect("buffer should be valid")
    }

    #[test]
    fn capacities_follow_volume_and_spans() {
        let b = ledger(0.0);
        // 5000 L * 1.163 Wh/(L K) * 45 K
        assert!((b.ht_capacity() - 261.675).abs() < 1e-6);
        assert!((b.chargeable(BufferTier::Vt, false, 1.0) - 104.67).abs() < 1e-6);
        assert!((b.chargeable(BufferTier::Nt, false, 1.0) - 23.26).abs() < 1e-6);
        assert_eq!(b.stored_energy(), 0.0);
    }

    #[test]
    fn limited_ceiling_stops_at_target_level() {
        let b = ledger(0.0);
        let full = b.chargeable(BufferTier::Ht, false, 1.0);
        let soft = b.chargeable(BufferTier::Ht, true, 1.0);
        assert!((soft - 0.8 * full).abs() < 1e-9);
    }

    #[test]
    fn nt_headroom_scaled_by_load_factor() {
        let b = ledger(0.0);
        let full = b.chargeable(BufferTier::Nt, false, 1.0);
        assert!((b.chargeable(BufferTier::Nt, false, 0.5) - full * 0.5).abs() < 1e-9);
        // load factor only affects NT
        assert_eq!(
            b.chargeable(BufferTier::Vt, false, 0.5),
            b.chargeable(BufferTier::Vt, false, 1.0)
        );
    }

    #[test]
    fn discharge_reports_residual() {
        let mut b = ledger(0.0);
        b.pre_step(0);
        let absorbed = b.charge(0, 30.0, BufferTier::Ht, false, 1.0);
        assert_eq!(absorbed, 30.0);
        assert_eq!(b.discharge(0, 20.0, BufferTier::Ht), 0.0);
        assert!((b.discharge(0, 25.0, BufferTier::Ht) - 15.0).abs() < 1e-9);
        assert_eq!(b.dischargeable(BufferTier::Ht), 0.0);
        b.post_step(0);
    }

    #[test]
    fn charge_capped_by_headroom() {
        let mut b = ledger(1.0);
        b.pre_step(0);
        assert_eq!(b.charge(0, 50.0, BufferTier::Ht, false, 1.0), 0.0);
        b.post_step(0);
    }

    #[test]
    fn nt_load_factor_from_temperatures() {
        let b = ledger(0.0);
        // (60 - 50) / (80 - 50)
        assert!((b.nt_load_factor() - 1.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn target_predicate() {
        let b = ledger(1.0);
        let upper = b.dischargeable(BufferTier::Ht) + b.dischargeable(BufferTier::Vt);
        assert!(b.target_still_reached_after_discharge(0.1 * upper));
        assert!(!b.target_still_reached_after_discharge(0.5 * upper));
    }

    #[test]
    fn loss_is_capped_by_content() {
        let mut b = ledger(0.0);
        b.pre_step(0);
        assert_eq!(b.apply_loss(0), 0.0);
        b.charge(0, 0.001, BufferTier::Ht, false, 1.0);
        let loss = b.apply_loss(0);
        assert!((loss - 0.001).abs() < 1e-12);
        assert!(b.stored_energy().abs() < 1e-12);
        b.post_step(0);
    }

    #[test]
    fn loss_drawn_proportionally() {
        let mut b = ledger(0.5);
        let before_ht = b.dischargeable(BufferTier::Ht);
        let before = b.stored_energy();
        b.pre_step(0);
        let loss = b.apply_loss(0);
        b.post_step(0);
        assert!(loss > 0.0);
        let expected_ht = before_ht - loss * before_ht / before;
        assert!((b.dischargeable(BufferTier::Ht) - expected_ht).abs() < 1e-9);
    }

    #[test]
    fn shrinking_layer_cascades_heat_down() {
        let spec = BufferSpec {
            initial_charge_level: 1.0,
            ..BufferSpec::default()
        };
        let mut b = BufferLedger::new(spec, vec![item(80.0, 50.0), item(80.0, 60.0)])
            .expect("buffer should be valid");
        let before = b.stored_energy();
        b.pre_step(0);
        b.post_step(0);
        b.pre_step(1);
        // HT and VT shrank, NT has no room left, so heat is lost
        let spilled = before - b.stored_energy();
        assert!(spilled > 0.0);
        assert_eq!(b.ht_capacity(), 0.0);
        // the vanished heat is reported with the hour's loss
        assert!(b.apply_loss(1) > spilled);
        b.post_step(1);
    }

    #[test]
    fn stored_energy_changes_only_through_reported_flows() {
        let spec = BufferSpec {
            initial_charge_level: 1.0,
            ..BufferSpec::default()
        };
        let mut b = BufferLedger::new(spec, vec![item(80.0, 50.0), item(80.0, 60.0)])
            .expect("buffer should be valid");
        b.pre_step(0);
        let loss0 = b.apply_loss(0);
        b.post_step(0);
        let before = b.stored_energy();

        b.pre_step(1);
        let discharged = 20.0 - b.discharge(1, 20.0, BufferTier::Ht);
        let charged = b.charge(1, 5.0, BufferTier::Ht, false, 1.0);
        let loss1 = b.apply_loss(1);
        b.post_step(1);

        assert!(loss0 > 0.0);
        assert_eq!(charged, 5.0);
        let after = b.stored_energy();
        assert!(
            (before + charged - discharged - loss1 - after).abs() < 1e-9,
            "before {before} charged {charged} discharged {discharged} loss {loss1} after {after}"
        );
    }

    #[test]
    fn zero_volume_is_inert() {
        let spec = BufferSpec {
            volume_litres: 0.0,
            ..BufferSpec::default()
        };
        let mut b =
            BufferLedger::new(spec, vec![item(80.0, 50.0)]).expect("buffer should be valid");
        b.pre_step(0);
        assert_eq!(b.charge(0, 10.0, BufferTier::Ht, false, 1.0), 0.0);
        assert_eq!(b.discharge(0, 10.0, BufferTier::Vt), 10.0);
        assert_eq!(b.apply_loss(0), 0.0);
        assert!(!b.target_still_reached_after_discharge(1.0));
        b.post_step(0);
    }

    #[test]
    fn invalid_shares_are_rejected() {
        let spec = BufferSpec {
            ht_share: 0.8,
            vt_share: 0.5,
            ..BufferSpec::default()
        };
        assert!(matches!(
            BufferLedger::new(spec, vec![item(80.0, 50.0)]),
            Err(SimError::BufferSpec(_))
        ));
        assert!(matches!(
            BufferLedger::new(BufferSpec::default(), Vec::new()),
            Err(SimError::BufferSpec(_))
        ));
    }
}
