//! Core types for the Hopper charge-transport engine.
//!
//! This is the leaf crate of the workspace. It defines the fundamental
//! vocabulary shared by every other crate: strongly-typed identifiers,
//! the site species and carrier strategy table, lattice faces, the error
//! taxonomy, and the seeded [`RandomService`].

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod id;
pub mod random;
pub mod species;

pub use error::{ConfigError, EvaluatorError, OccupancyError, RestoreError};
pub use id::{AgentId, FluxId, SiteId, TickId};
pub use random::{RandomService, RngState};
pub use species::{Carrier, Face, Species};
