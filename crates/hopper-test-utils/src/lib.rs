//! Test utilities and mock types for Hopper development.
//!
//! Provides mock [`CoulombBackend`](hopper_engine::CoulombBackend)
//! implementations, standard [`SimulationConfig`](hopper_engine::SimulationConfig)
//! fixtures, and whole-simulation invariant checks.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod backends;
pub mod fixtures;

pub use backends::{CorruptBackend, FailingBackend, ReferenceBackend};
pub use fixtures::{bipolar_config, closed_box_config, source_drain_config};

use hopper_core::{Carrier, Species};
use hopper_engine::Simulation;
use hopper_lattice::Occupant;

/// Panic unless every carrier occupies exactly its own site and the
/// lattice holds no charge the simulation does not know about.
pub fn assert_occupancy_consistent(sim: &Simulation) {
    let lattice = sim.lattice();
    let mut seen = std::collections::HashSet::new();
    for agent in sim.agents() {
        assert!(!agent.is_removed(), "removed agent {} still scheduled", agent.id());
        assert!(seen.insert(agent.site()), "two agents on site {}", agent.site());
        assert_eq!(
            lattice.occupant_at(agent.site()),
            Some(Occupant::Charge(agent.id())),
            "agent {} not registered at its site",
            agent.id()
        );
        assert_eq!(lattice.species_at(agent.site()), agent.carrier().species());
        assert!(lattice.is_interior(agent.site()));
    }
    assert_eq!(
        lattice.count(Species::Electron) as usize,
        sim.carrier_count(Carrier::Electron)
    );
    assert_eq!(
        lattice.count(Species::Hole) as usize,
        sim.carrier_count(Carrier::Hole)
    );
}
