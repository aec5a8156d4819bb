//! Tick scheduler for Hopper simulations.
//!
//! [`Simulation`] owns the lattice, the agents, the energy model, and the
//! random stream, and advances them one tick at a time:
//!
//! 1. sources inject, subject to carrier caps;
//! 2. every carrier proposes a future site (serial, so draws are ordered);
//! 3. energy changes are evaluated in parallel against a frozen snapshot,
//!    locally or by an external [`CoulombBackend`];
//! 4. moves are committed serially in agent order, with proposals onto
//!    drains routed to the drain;
//! 5. encountered electron-hole pairs are offered for recombination;
//! 6. removed carriers are dropped and counted;
//! 7. charge balancing and progress reporting.
//!
//! [`Checkpoint`] captures the full mutable state, and
//! [`Simulation::restore`] resumes a run bit-for-bit.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod checkpoint;
pub mod config;
pub mod evaluator;
pub mod metrics;
pub mod simulation;

pub use checkpoint::{CarrierRecord, Checkpoint, FluxRecord, RecombinationRecord};
pub use config::{
    DefectConfig, ElectrostaticsConfig, EvaluatorKind, FieldConfig, FluxSpec, RecombinationConfig,
    SimulationConfig,
};
pub use evaluator::{
    BatchEvaluator, CoulombBackend, EnergyEvaluator, EvaluationContext, LocalEvaluator,
};
pub use metrics::{RemovalStats, TickMetrics};
pub use simulation::Simulation;
