//! Full-state checkpoints.
//!
//! A [`Checkpoint`] holds everything that changes after setup: carriers
//! with their counters, flux and recombination counters with their rate
//! windows, run statistics, identifier and tick counters, and the random
//! stream position. Defects are recorded so a restore can confirm the
//! configuration rebuilt the same lattice. Background potentials are not
//! stored; they are a pure function of the configuration and seed.
//!
//! [`Simulation::checkpoint`](crate::Simulation::checkpoint) captures one
//! and [`Simulation::restore`](crate::Simulation::restore) resumes from it.

use hopper_agents::{FluxCounters, FluxSnapshot};
use hopper_core::{AgentId, Carrier, RngState, SiteId, TickId};

use crate::metrics::RemovalStats;

/// One carrier on the lattice.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CarrierRecord {
    /// Identifier.
    pub id: AgentId,
    /// Electron or hole.
    pub carrier: Carrier,
    /// Current site.
    pub site: SiteId,
    /// Ticks survived.
    pub lifetime: u64,
    /// Successful hops.
    pub pathlength: u64,
}

/// Counters of one source or drain.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct FluxRecord {
    /// Cumulative counters.
    pub counters: FluxCounters,
    /// Start of the current rate window.
    pub last: FluxSnapshot,
}

/// State of the recombination agent.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RecombinationRecord {
    /// Encounters and recombinations.
    pub counters: FluxCounters,
    /// Start of the current rate window.
    pub last: FluxSnapshot,
    /// Current acceptance probability.
    pub probability: f64,
}

/// Snapshot of the mutable state of a run.
#[derive(Clone, Debug, PartialEq)]
pub struct Checkpoint {
    /// Last completed tick.
    pub tick: TickId,
    /// Identifier the next injected carrier will receive.
    pub next_id: AgentId,
    /// Carriers in scheduling order.
    pub carriers: Vec<CarrierRecord>,
    /// Defect sites, ascending.
    pub defects: Vec<SiteId>,
    /// Source counters in configuration order.
    pub sources: Vec<FluxRecord>,
    /// Drain counters in configuration order.
    pub drains: Vec<FluxRecord>,
    /// Recombination state, if enabled.
    pub recombination: Option<RecombinationRecord>,
    /// Run totals.
    pub removals: RemovalStats,
    /// Random stream position.
    pub rng: RngState,
}

impl Checkpoint {
    /// Number of carriers of `carrier` in the checkpoint.
    pub fn count(&self, carrier: Carrier) -> usize {
        self.carriers.iter().filter(|c| c.carrier == carrier).count()
    }
}
