//! Agents of a Hopper simulation.
//!
//! - [`ChargeAgent`]: a mobile electron or hole with a per-tick
//!   propose/decide/commit state machine.
//! - [`SourceAgent`] and [`DrainAgent`]: boundary flux agents bound to a
//!   lattice face or an interior site, with attempt/success counters.
//! - [`RecombinationAgent`]: removes encountered electron-hole pairs at a
//!   target rate.
//!
//! Electron and hole behaviour differs only through the
//! [`Carrier`](hopper_core::Carrier) table; there is one agent type per
//! role, not per carrier.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod charge;
pub mod drain;
pub mod flux;
pub mod policy;
pub mod recombination;
pub mod source;

pub use charge::{ChargeAgent, MoveState, TickOutcome};
pub use drain::DrainAgent;
pub use flux::{rate_per_tick, success_probability, FluxBinding, FluxCounters, FluxSnapshot};
pub use policy::{AxisCoupling, MovePolicy};
pub use recombination::RecombinationAgent;
pub use source::{SourceAgent, SourceMode};
