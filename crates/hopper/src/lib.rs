//! Hopper: kinetic Monte Carlo transport of electrons and holes on a 3-D
//! lattice.
//!
//! This is the top-level facade crate that re-exports the public API from
//! all Hopper sub-crates. For most users, adding `hopper` as a single
//! dependency is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use hopper::prelude::*;
//!
//! let config = SimulationConfig {
//!     dimensions: Dimensions::new(8, 8, 8),
//!     temperature: f64::INFINITY,
//!     sources: vec![FluxSpec::face(Carrier::Electron, Face::Left, 1.0)],
//!     drains: vec![FluxSpec::face(Carrier::Electron, Face::Right, 1.0)],
//!     seed: Some(42),
//!     ..SimulationConfig::default()
//! };
//! let mut sim = Simulation::new(config, None).unwrap();
//! let metrics = sim.perform_iterations(10);
//! assert_eq!(metrics.tick, TickId(10));
//! assert!(sim.carrier_count(Carrier::Electron) > 0);
//! ```
//!
//! # Modules
//!
//! Each module corresponds to a sub-crate. Use them for types not in the prelude:
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `hopper-core` | IDs, species and carriers, errors, `RandomService` |
//! | [`lattice`] | `hopper-lattice` | Site indexing, neighbours, occupancy, distances |
//! | [`potential`] | `hopper-potential` | Distance tables, Coulomb kernels, energy model |
//! | [`agents`] | `hopper-agents` | Charge carriers, sources, drains, recombination |
//! | [`engine`] | `hopper-engine` | Configuration, scheduler, evaluators, checkpoints |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Core types, errors, and randomness (`hopper-core`).
pub use hopper_core as types;

/// Lattice geometry and occupancy (`hopper-lattice`).
///
/// [`lattice::Lattice`] is the single owner of site state; the
/// [`lattice::geometry`] module holds the distance helpers.
pub use hopper_lattice as lattice;

/// Electrostatics (`hopper-potential`).
pub use hopper_potential as potential;

/// Agents (`hopper-agents`).
pub use hopper_agents as agents;

/// Scheduler and evaluators (`hopper-engine`).
///
/// [`engine::Simulation`] runs ticks; implement
/// [`engine::CoulombBackend`] to offload energy evaluation.
pub use hopper_engine as engine;

/// Common imports for typical Hopper usage.
///
/// ```rust
/// use hopper::prelude::*;
/// ```
pub mod prelude {
    // Core types
    pub use hopper_core::{AgentId, Carrier, Face, FluxId, RandomService, SiteId, Species, TickId};

    // Errors
    pub use hopper_core::{ConfigError, EvaluatorError, OccupancyError, RestoreError};

    // Lattice
    pub use hopper_lattice::{Dimensions, Lattice};

    // Agents
    pub use hopper_agents::{FluxBinding, SourceMode};

    // Engine
    pub use hopper_engine::{
        Checkpoint, CoulombBackend, EvaluatorKind, FluxSpec, Simulation, SimulationConfig,
        TickMetrics,
    };
}
