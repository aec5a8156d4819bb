//! Electrostatics for Hopper simulations.
//!
//! - [`DistanceTables`]: displacement-keyed real and image distance tables.
//! - [`PotentialField`]: point and Gaussian Coulomb kernels, with and
//!   without image charges, summed over a [`ChargeSnapshot`].
//! - [`EnergyModel`]: the energy change of a proposed hop, shared by the
//!   local and external evaluators.
//! - [`external`]: bias, gate, trap, and disorder background potentials.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod energy;
pub mod external;
pub mod field;
pub mod tables;
pub mod units;

pub use energy::{EnergyModel, EnergyModelBuilder, MoveRequest};
pub use external::{
    set_potential_disorder, set_potential_gate, set_potential_linear, set_potential_traps,
};
pub use field::{erf, ChargeSnapshot, FieldParams, Kernel, PotentialField};
pub use tables::{DistanceTable, DistanceTables};
pub use units::{coulomb_prefactor, inverse_kt};
