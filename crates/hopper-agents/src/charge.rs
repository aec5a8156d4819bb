//! Mobile charge carriers and their per-tick move state machine.
//!
//! Each tick a carrier goes `Resident -> Proposed -> {Committed, Rejected}`
//! and back to `Resident` in [`ChargeAgent::complete_tick`]. Proposal only
//! reads; the lattice is written by [`ChargeAgent::decide_future`] and
//! [`ChargeAgent::complete_tick`], which the scheduler calls serially.

use hopper_core::{AgentId, Carrier, OccupancyError, RandomService, SiteId};
use hopper_lattice::{Lattice, Neighbours, Occupant};

use crate::policy::MovePolicy;

/// Where a carrier is in the current tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum MoveState {
    /// Between ticks.
    #[default]
    Resident,
    /// A future site has been chosen.
    Proposed,
    /// The hop was accepted and written to the lattice.
    Committed,
    /// The hop was refused; the carrier stays put.
    Rejected,
}

impl MoveState {
    /// Lower-case name.
    pub fn name(self) -> &'static str {
        match self {
            MoveState::Resident => "resident",
            MoveState::Proposed => "proposed",
            MoveState::Committed => "committed",
            MoveState::Rejected => "rejected",
        }
    }
}

impl std::fmt::Display for MoveState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Result of [`ChargeAgent::complete_tick`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    /// Still on the lattice.
    Alive,
    /// Removed and unregistered; the scheduler should drop it.
    Detached,
}

/// A mobile electron or hole.
#[derive(Clone, Debug)]
pub struct ChargeAgent {
    id: AgentId,
    carrier: Carrier,
    site: SiteId,
    future: Option<SiteId>,
    neighbours: Neighbours,
    lifetime: u64,
    pathlength: u64,
    removed: bool,
    energy_delta: Option<f64>,
    state: MoveState,
}

impl ChargeAgent {
    /// Place a new carrier on `site` and cache its neighbour list.
    ///
    /// # Errors
    ///
    /// Whatever [`Lattice::register_agent`] rejects; nothing is written.
    pub fn register(
        lattice: &mut Lattice,
        id: AgentId,
        carrier: Carrier,
        site: SiteId,
        range: u32,
    ) -> Result<Self, OccupancyError> {
        let neighbours = lattice.register_agent(id, carrier.species(), site, range)?;
        Ok(Self {
            id,
            carrier,
            site,
            future: None,
            neighbours,
            lifetime: 0,
            pathlength: 0,
            removed: false,
            energy_delta: None,
            state: MoveState::Resident,
        })
    }

    /// Rebuild a carrier with recorded counters, e.g. from a checkpoint.
    pub fn restore(
        lattice: &mut Lattice,
        id: AgentId,
        carrier: Carrier,
        site: SiteId,
        range: u32,
        lifetime: u64,
        pathlength: u64,
    ) -> Result<Self, OccupancyError> {
        let mut agent = Self::register(lattice, id, carrier, site, range)?;
        agent.lifetime = lifetime;
        agent.pathlength = pathlength;
        Ok(agent)
    }

    /// Identifier.
    pub fn id(&self) -> AgentId {
        self.id
    }

    /// Carrier kind.
    pub fn carrier(&self) -> Carrier {
        self.carrier
    }

    /// Charge sign, `-1` or `+1`.
    pub fn charge(&self) -> i32 {
        self.carrier.charge()
    }

    /// Current site.
    pub fn site(&self) -> SiteId {
        self.site
    }

    /// Proposed site, if any.
    pub fn future(&self) -> Option<SiteId> {
        self.future
    }

    /// Cached hop targets.
    pub fn neighbours(&self) -> &[SiteId] {
        &self.neighbours
    }

    /// Ticks survived.
    pub fn lifetime(&self) -> u64 {
        self.lifetime
    }

    /// Successful hops.
    pub fn pathlength(&self) -> u64 {
        self.pathlength
    }

    /// `true` once flagged for removal.
    pub fn is_removed(&self) -> bool {
        self.removed
    }

    /// Energy change stored for the current proposal.
    pub fn energy_delta(&self) -> Option<f64> {
        self.energy_delta
    }

    /// Tick state.
    pub fn state(&self) -> MoveState {
        self.state
    }

    /// Pick a uniformly random neighbour as the proposed future site.
    ///
    /// A carrier with no neighbours proposes nothing and will be rejected.
    pub fn choose_future(&mut self, rng: &mut RandomService) -> Option<SiteId> {
        self.future = rng.choose(&self.neighbours).copied();
        self.energy_delta = None;
        self.state = MoveState::Proposed;
        self.future
    }

    /// Store the evaluated energy change for the current proposal.
    pub fn set_energy_delta(&mut self, de: f64) {
        self.energy_delta = Some(de);
    }

    /// Refuse the current proposal.
    pub fn reject(&mut self) -> MoveState {
        self.state = MoveState::Rejected;
        self.state
    }

    /// Apply the acceptance test and, on success, move on the lattice.
    ///
    /// Rejects without drawing if the carrier is already removed, the
    /// proposal is missing, has no energy, or targets anything other than
    /// an empty interior site.
    pub fn decide_future(
        &mut self,
        lattice: &mut Lattice,
        rng: &mut RandomService,
        policy: &MovePolicy,
    ) -> MoveState {
        if self.removed {
            return self.reject();
        }
        let (Some(future), Some(de)) = (self.future, self.energy_delta) else {
            return self.reject();
        };
        if !lattice.is_empty(future) || !de.is_finite() {
            return self.reject();
        }
        let axis = lattice.dominant_axis(future, self.site);
        if !policy.accept(rng, de, axis) {
            return self.reject();
        }
        match lattice.move_agent(self.site, future) {
            Ok(()) => {
                self.site = future;
                self.state = MoveState::Committed;
            }
            Err(_) => {
                self.state = MoveState::Rejected;
            }
        }
        self.state
    }

    /// Flag for removal. The carrier stays on the lattice until
    /// [`complete_tick`](Self::complete_tick).
    pub fn mark_removed(&mut self) {
        self.removed = true;
    }

    /// Close the tick: age, count a committed hop, refresh neighbours, and
    /// detach if removed.
    ///
    /// A removed carrier that no longer holds its site is already
    /// detached and is left alone.
    ///
    /// # Errors
    ///
    /// [`OccupancyError`] if the lattice refuses to release a site this
    /// carrier still holds. The carrier is flagged removed regardless.
    pub fn complete_tick(
        &mut self,
        lattice: &mut Lattice,
        range: u32,
    ) -> Result<TickOutcome, OccupancyError> {
        self.lifetime += 1;
        if self.state == MoveState::Committed {
            self.pathlength += 1;
            self.neighbours = lattice.neighbours(self.site, range);
        }
        self.state = MoveState::Resident;
        self.future = None;
        self.energy_delta = None;
        if self.removed {
            if lattice.occupant_at(self.site) == Some(Occupant::Charge(self.id)) {
                self.detach(lattice)?;
            }
            return Ok(TickOutcome::Detached);
        }
        Ok(TickOutcome::Alive)
    }

    /// Unregister from the lattice immediately.
    pub fn detach(&mut self, lattice: &mut Lattice) -> Result<(), OccupancyError> {
        self.removed = true;
        lattice.unregister_agent(self.site)
    }
}
