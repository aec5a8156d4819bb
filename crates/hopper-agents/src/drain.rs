//! Carrier absorbers.

use hopper_core::{Carrier, ConfigError, FluxId, RandomService, SiteId, Species, TickId};
use hopper_lattice::Lattice;

use crate::charge::ChargeAgent;
use crate::flux::{bind, check_probability, FluxBinding, FluxCounters, FluxSnapshot};

/// Removes carriers of one kind that hop onto it.
///
/// A drain only flags the carrier; detachment happens at the carrier's
/// next commit boundary.
#[derive(Clone, Debug)]
pub struct DrainAgent {
    id: FluxId,
    carrier: Carrier,
    binding: FluxBinding,
    site: SiteId,
    probability: f64,
    counters: FluxCounters,
    last: FluxSnapshot,
}

impl DrainAgent {
    /// Bind a new drain to the lattice.
    ///
    /// # Errors
    ///
    /// [`ConfigError`] if the probability is outside `[0, 1]` or the
    /// binding cannot be reserved.
    pub fn register(
        lattice: &mut Lattice,
        id: FluxId,
        carrier: Carrier,
        binding: FluxBinding,
        probability: f64,
    ) -> Result<Self, ConfigError> {
        check_probability("drain probability", probability)?;
        let site = bind(lattice, id, Species::Drain, binding)?;
        Ok(Self {
            id,
            carrier,
            binding,
            site,
            probability,
            counters: FluxCounters::default(),
            last: FluxSnapshot::default(),
        })
    }

    /// Identifier.
    pub fn id(&self) -> FluxId {
        self.id
    }

    /// Carrier this drain accepts.
    pub fn carrier(&self) -> Carrier {
        self.carrier
    }

    /// Face or site binding.
    pub fn binding(&self) -> FluxBinding {
        self.binding
    }

    /// The special or interior site the drain occupies.
    pub fn site(&self) -> SiteId {
        self.site
    }

    /// Attempt/success counters.
    pub fn counters(&self) -> &FluxCounters {
        &self.counters
    }

    /// Replace the counters and rate window, e.g. from a checkpoint.
    pub fn restore_counters(&mut self, counters: FluxCounters, last: FluxSnapshot) {
        self.counters = counters;
        self.last = last;
    }

    /// The snapshot taken by the last [`store_last`](Self::store_last).
    pub fn last(&self) -> &FluxSnapshot {
        &self.last
    }

    /// Start a new rate window at `tick`.
    pub fn store_last(&mut self, tick: TickId) {
        self.last = self.counters.snapshot(tick);
    }

    /// `true` if this drain takes `carrier`.
    pub fn accepts(&self, carrier: Carrier) -> bool {
        self.carrier == carrier
    }

    /// Offer `agent` to the drain.
    ///
    /// Incompatible or already-removed carriers are refused without
    /// drawing or counting. Otherwise counts an attempt and, on success,
    /// flags the carrier removed.
    pub fn try_to_accept(&mut self, agent: &mut ChargeAgent, rng: &mut RandomService) -> bool {
        if !self.accepts(agent.carrier()) || agent.is_removed() {
            return false;
        }
        let ok = rng.choose_yes(self.probability);
        self.counters.record(ok);
        if ok {
            agent.mark_removed();
        }
        ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hopper_core::{AgentId, Face};
    use hopper_lattice::Dimensions;

    fn setup(p: f64) -> (Lattice, DrainAgent, ChargeAgent, ChargeAgent) {
        let mut l = Lattice::new(Dimensions::new(3, 3, 3), 1).unwrap();
        let d = DrainAgent::register(
            &mut l,
            FluxId(1),
            Carrier::Hole,
            FluxBinding::Face(Face::Right),
            p,
        )
        .unwrap();
        let h = ChargeAgent::register(&mut l, AgentId(0), Carrier::Hole, SiteId(2), 1).unwrap();
        let e = ChargeAgent::register(&mut l, AgentId(1), Carrier::Electron, SiteId(5), 1).unwrap();
        (l, d, h, e)
    }

    #[test]
    fn accepts_compatible_carrier_and_defers_detach() {
        let (l, mut d, mut h, _) = setup(1.0);
        let mut rng = RandomService::new(1);
        assert!(d.try_to_accept(&mut h, &mut rng));
        assert!(h.is_removed());
        assert_eq!(l.species_at(h.site()), Species::Hole);
        assert_eq!((d.counters().attempts(), d.counters().successes()), (1, 1));
    }

    #[test]
    fn refuses_incompatible_carrier_without_counting() {
        let (_, mut d, _, mut e) = setup(1.0);
        let mut rng = RandomService::new(1);
        assert!(!d.try_to_accept(&mut e, &mut rng));
        assert!(!e.is_removed());
        assert_eq!(d.counters().attempts(), 0);
    }

    #[test]
    fn zero_probability_counts_failures() {
        let (_, mut d, mut h, _) = setup(0.0);
        let mut rng = RandomService::new(1);
        for _ in 0..10 {
            assert!(!d.try_to_accept(&mut h, &mut rng));
        }
        assert_eq!((d.counters().attempts(), d.counters().successes()), (10, 0));
    }

    #[test]
    fn face_drain_uses_special_slot() {
        let (l, d, _, _) = setup(0.5);
        assert_eq!(l.face_of(d.site()), Some(Face::Right));
        assert_eq!(l.species_at(d.site()), Species::Drain);
    }
}
