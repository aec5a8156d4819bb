//! Per-tick counters and cumulative removal statistics.
//!
//! [`TickMetrics`] describes a single tick; [`RemovalStats`] accumulates
//! over the whole run and is carried through checkpoints.

use hopper_core::TickId;

/// What happened during a single tick.
///
/// Durations are in microseconds.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TickMetrics {
    /// The tick these metrics describe.
    pub tick: TickId,
    /// Carriers injected by sources.
    pub injected: u32,
    /// Injection attempts that did not place a carrier.
    pub injection_failures: u32,
    /// Proposals sent to the evaluator.
    pub evaluated: u32,
    /// Hops written to the lattice.
    pub committed: u32,
    /// Proposals refused.
    pub rejected: u32,
    /// Carriers absorbed by drains.
    pub drained: u32,
    /// Electron-hole pairs recombined.
    pub recombined: u32,
    /// Carriers placed by charge balancing.
    pub balanced: u32,
    /// Electrons on the lattice after the tick.
    pub electrons: u32,
    /// Holes on the lattice after the tick.
    pub holes: u32,
    /// `true` if the preferred evaluator failed and local evaluation ran.
    pub evaluator_fallback: bool,
    /// Time spent evaluating energies.
    pub evaluation_us: u64,
    /// Wall-clock time for the whole tick.
    pub total_us: u64,
}

/// Run totals over every carrier that has left the lattice.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct RemovalStats {
    /// Carriers absorbed by drains.
    pub drained: u64,
    /// Carriers removed by recombination (two per event).
    pub recombined: u64,
    /// Sum of lifetimes (ticks) of removed carriers.
    pub lifetime_sum: u64,
    /// Sum of pathlengths (hops) of removed carriers.
    pub pathlength_sum: u64,
}

impl RemovalStats {
    /// Carriers removed in total.
    pub fn removed(&self) -> u64 {
        self.drained + self.recombined
    }

    /// Add one removed carrier.
    pub fn record(&mut self, lifetime: u64, pathlength: u64) {
        self.lifetime_sum += lifetime;
        self.pathlength_sum += pathlength;
    }

    /// Mean lifetime in ticks, `None` before the first removal.
    pub fn mean_lifetime(&self) -> Option<f64> {
        let n = self.removed();
        (n > 0).then(|| self.lifetime_sum as f64 / n as f64)
    }

    /// Mean pathlength in hops, `None` before the first removal.
    pub fn mean_pathlength(&self) -> Option<f64> {
        let n = self.removed();
        (n > 0).then(|| self.pathlength_sum as f64 / n as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_metrics_are_zero() {
        let m = TickMetrics::default();
        assert_eq!(m.tick, TickId(0));
        assert_eq!(m.injected, 0);
        assert_eq!(m.committed, 0);
        assert!(!m.evaluator_fallback);
        assert_eq!(m.total_us, 0);
    }

    #[test]
    fn removal_means() {
        let mut s = RemovalStats::default();
        assert_eq!(s.mean_lifetime(), None);
        s.drained = 1;
        s.record(10, 4);
        s.recombined = 2;
        s.record(20, 2);
        s.record(30, 0);
        assert_eq!(s.removed(), 3);
        assert_eq!(s.mean_lifetime(), Some(20.0));
        assert_eq!(s.mean_pathlength(), Some(2.0));
    }
}
