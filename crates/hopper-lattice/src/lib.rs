//! Lattice storage for Hopper simulations.
//!
//! [`Lattice`] is a flat 3-D grid of `X * Y * Z` interior sites plus a
//! reserved range of special boundary sites for face-bound sources and
//! drains. It tracks which species sits on every site, a non-owning
//! handle to the occupant, and a scalar background potential per
//! interior site.
//!
//! Neighbour lists are clipped at the lattice edges (no periodic wrap).
//! Special sites join the neighbourhood of every interior site within
//! the hopping range of their face.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod geometry;
pub mod lattice;

#[cfg(test)]
pub(crate) mod compliance;

pub use lattice::{Dimensions, Lattice, Neighbours, Occupant};
