//! Electron-hole recombination.
//!
//! The recombination agent is not bound to a site. The scheduler scans
//! for encounters (an electron and a hole within `encounter_range` lattice
//! steps of each other, per axis) and offers each pair here. The agent
//! tunes its acceptance probability so that recombinations per tick track
//! the configured target rate.

use hopper_core::{ConfigError, RandomService, TickId};

use crate::charge::ChargeAgent;
use crate::flux::{FluxCounters, FluxSnapshot};

/// Removes opposite-carrier pairs at a target rate.
#[derive(Clone, Debug)]
pub struct RecombinationAgent {
    target_rate: f64,
    encounter_range: u32,
    probability: f64,
    counters: FluxCounters,
    last: FluxSnapshot,
}

impl RecombinationAgent {
    /// Create with a target of `target_rate` recombinations per tick.
    ///
    /// `probability` is used until the first window with encounters.
    pub fn new(target_rate: f64, encounter_range: u32, probability: f64) -> Result<Self, ConfigError> {
        if !(target_rate.is_finite() && target_rate >= 0.0) {
            return Err(ConfigError::InvalidParameter {
                name: "recombination target rate",
                reason: format!("must be finite and non-negative, got {target_rate}"),
            });
        }
        crate::flux::check_probability("recombination probability", probability)?;
        Ok(Self {
            target_rate,
            encounter_range,
            probability,
            counters: FluxCounters::default(),
            last: FluxSnapshot::default(),
        })
    }

    /// Encounter radius in lattice steps. Zero disables encounters.
    pub fn encounter_range(&self) -> u32 {
        self.encounter_range
    }

    /// Current acceptance probability.
    pub fn probability(&self) -> f64 {
        self.probability
    }

    /// Encounters (attempts) and recombinations (successes).
    pub fn counters(&self) -> &FluxCounters {
        &self.counters
    }

    /// Replace the counters, rate window, and probability, e.g. from a
    /// checkpoint.
    pub fn restore_state(&mut self, counters: FluxCounters, last: FluxSnapshot, probability: f64) {
        self.counters = counters;
        self.last = last;
        self.probability = probability;
    }

    /// The snapshot taken by the last [`store_last`](Self::store_last).
    pub fn last(&self) -> &FluxSnapshot {
        &self.last
    }

    /// Start a new rate window at `tick`.
    pub fn store_last(&mut self, tick: TickId) {
        self.last = self.counters.snapshot(tick);
    }

    /// Re-estimate the acceptance probability at `tick`.
    ///
    /// `target_rate / (encounters per tick)` over the window since
    /// [`store_last`](Self::store_last), clamped to `[0, 1]`. Keeps the
    /// previous value if the window is empty or saw no encounters.
    pub fn guess_probability(&mut self, tick: TickId) -> f64 {
        let ticks = tick.0.saturating_sub(self.last.tick.0);
        let encounters = self.counters.attempts().saturating_sub(self.last.attempts);
        if ticks > 0 && encounters > 0 {
            let observed = encounters as f64 / ticks as f64;
            self.probability = (self.target_rate / observed).clamp(0.0, 1.0);
        }
        self.probability
    }

    /// Offer an encountered pair.
    ///
    /// Pairs of the same carrier, or with either member already removed,
    /// are refused without drawing or counting. On success both carriers
    /// are flagged removed.
    pub fn try_to_accept(
        &mut self,
        a: &mut ChargeAgent,
        b: &mut ChargeAgent,
        rng: &mut RandomService,
    ) -> bool {
        if a.carrier() == b.carrier() || a.is_removed() || b.is_removed() {
            return false;
        }
        let ok = rng.choose_yes(self.probability);
        self.counters.record(ok);
        if ok {
            a.mark_removed();
            b.mark_removed();
        }
        ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hopper_core::{AgentId, Carrier, SiteId};
    use hopper_lattice::{Dimensions, Lattice};

    fn pair(l: &mut Lattice) -> (ChargeAgent, ChargeAgent) {
        (
            ChargeAgent::register(l, AgentId(0), Carrier::Electron, SiteId(0), 1).unwrap(),
            ChargeAgent::register(l, AgentId(1), Carrier::Hole, SiteId(1), 1).unwrap(),
        )
    }

    #[test]
    fn certain_recombination_removes_both() {
        let mut l = Lattice::new(Dimensions::new(3, 1, 1), 0).unwrap();
        let (mut e, mut h) = pair(&mut l);
        let mut r = RecombinationAgent::new(1.0, 1, 1.0).unwrap();
        let mut rng = RandomService::new(3);
        assert!(r.try_to_accept(&mut e, &mut h, &mut rng));
        assert!(e.is_removed() && h.is_removed());
        assert!(!r.try_to_accept(&mut e, &mut h, &mut rng), "already removed");
        assert_eq!(r.counters().attempts(), 1);
    }

    #[test]
    fn same_carrier_pair_refused() {
        let mut l = Lattice::new(Dimensions::new(3, 1, 1), 0).unwrap();
        let mut a = ChargeAgent::register(&mut l, AgentId(0), Carrier::Hole, SiteId(0), 1).unwrap();
        let mut b = ChargeAgent::register(&mut l, AgentId(1), Carrier::Hole, SiteId(1), 1).unwrap();
        let mut r = RecombinationAgent::new(1.0, 1, 1.0).unwrap();
        assert!(!r.try_to_accept(&mut a, &mut b, &mut RandomService::new(1)));
        assert_eq!(r.counters().attempts(), 0);
    }

    #[test]
    fn guess_tracks_target_over_window() {
        let mut l = Lattice::new(Dimensions::new(3, 1, 1), 0).unwrap();
        let (mut e, mut h) = pair(&mut l);
        let mut r = RecombinationAgent::new(0.5, 1, 0.0).unwrap();
        let mut rng = RandomService::new(3);
        assert_eq!(r.guess_probability(TickId(4)), 0.0, "no encounters yet");
        for _ in 0..8 {
            r.try_to_accept(&mut e, &mut h, &mut rng);
        }
        // 8 encounters over 4 ticks: 2 per tick, target 0.5.
        assert_eq!(r.guess_probability(TickId(4)), 0.25);
        r.store_last(TickId(4));
        assert_eq!(r.guess_probability(TickId(4)), 0.25);
    }

    #[test]
    fn guess_is_clamped() {
        let mut l = Lattice::new(Dimensions::new(3, 1, 1), 0).unwrap();
        let (mut e, mut h) = pair(&mut l);
        let mut r = RecombinationAgent::new(10.0, 0, 0.0).unwrap();
        r.try_to_accept(&mut e, &mut h, &mut RandomService::new(1));
        assert_eq!(r.guess_probability(TickId(1)), 1.0);
        assert_eq!(r.encounter_range(), 0);
    }

    #[test]
    fn rejects_negative_rate() {
        assert!(RecombinationAgent::new(-1.0, 1, 0.5).is_err());
        assert!(RecombinationAgent::new(1.0, 1, 2.0).is_err());
    }
}
