//! Error types for the Hopper engine.
//!
//! Organised by how the scheduler reacts to them: configuration errors
//! abort setup, occupancy errors reject a single operation, evaluator
//! errors trigger the local fallback, and restore errors refuse a
//! checkpoint.

use std::error::Error;
use std::fmt;

use crate::id::{FluxId, SiteId};
use crate::species::{Face, Species};

/// Invalid setup. Fatal: detected before any tick runs.
#[derive(Clone, Debug, PartialEq)]
pub enum ConfigError {
    /// A lattice dimension is zero.
    EmptyLattice,
    /// Site count (interior plus special) does not fit in a `u32` index.
    LatticeTooLarge {
        /// Requested total site count.
        sites: u64,
    },
    /// Hopping range is zero.
    InvalidHoppingRange,
    /// More face-bound flux agents than reserved special slots.
    SpecialSlotsExhausted {
        /// Number of reserved slots.
        reserved: u32,
        /// Face the extra agent was bound to.
        face: Face,
    },
    /// Two setup entities claim the same interior site.
    ConflictingReservation {
        /// The contested site.
        site: SiteId,
        /// What already holds it.
        existing: Species,
    },
    /// A bound site index lies outside the interior range.
    SiteOutOfRange {
        /// The offending site.
        site: SiteId,
    },
    /// A probability lies outside `[0, 1]` or is not finite.
    InvalidProbability {
        /// Parameter name.
        name: &'static str,
        /// Offending value.
        value: f64,
    },
    /// A numeric parameter is NaN, negative where forbidden, or otherwise invalid.
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Description of the violated constraint.
        reason: String,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyLattice => write!(f, "lattice dimensions must all be at least 1"),
            Self::LatticeTooLarge { sites } => {
                write!(f, "lattice of {sites} sites exceeds u32 indexing")
            }
            Self::InvalidHoppingRange => write!(f, "hopping range must be at least 1"),
            Self::SpecialSlotsExhausted { reserved, face } => write!(
                f,
                "all {reserved} special slots in use; cannot bind agent to {face} face"
            ),
            Self::ConflictingReservation { site, existing } => {
                write!(f, "site {site} already reserved by {existing}")
            }
            Self::SiteOutOfRange { site } => write!(f, "site {site} is outside the lattice"),
            Self::InvalidProbability { name, value } => {
                write!(f, "{name} must be a probability in [0, 1], got {value}")
            }
            Self::InvalidParameter { name, reason } => write!(f, "invalid {name}: {reason}"),
        }
    }
}

impl Error for ConfigError {}

/// A rejected lattice write. Recoverable: the caller counts it as a
/// failed attempt and the tick continues.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OccupancyError {
    /// The target site already holds an occupant.
    Occupied {
        /// Target site.
        site: SiteId,
        /// Species currently there.
        species: Species,
    },
    /// The target site index is outside the lattice.
    OutOfRange {
        /// Target site.
        site: SiteId,
    },
    /// The operation needs an interior site but got a special one.
    SpecialSite {
        /// Target site.
        site: SiteId,
    },
    /// The site holds no occupant to remove.
    Vacant {
        /// Target site.
        site: SiteId,
    },
    /// A flux agent has no interior site to act on.
    NoTargets {
        /// The agent.
        flux: FluxId,
    },
}

impl fmt::Display for OccupancyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Occupied { site, species } => {
                write!(f, "site {site} already occupied by {species}")
            }
            Self::OutOfRange { site } => write!(f, "site {site} out of range"),
            Self::SpecialSite { site } => {
                write!(f, "site {site} is a special boundary site")
            }
            Self::Vacant { site } => write!(f, "site {site} holds no occupant"),
            Self::NoTargets { flux } => write!(f, "flux agent {flux} has no target sites"),
        }
    }
}

impl Error for OccupancyError {}

/// The external batch evaluator could not produce a usable result.
///
/// The scheduler logs this and recomputes the tick's energies locally.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EvaluatorError {
    /// The backend reported a failure.
    Unavailable {
        /// Backend-provided description.
        reason: String,
    },
    /// The backend returned the wrong number of results.
    ResultCountMismatch {
        /// Requests submitted.
        expected: usize,
        /// Results returned.
        actual: usize,
    },
    /// A result was missing, duplicated, or not finite.
    MalformedResult {
        /// Description of the defect.
        reason: String,
    },
}

impl fmt::Display for EvaluatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unavailable { reason } => write!(f, "evaluator unavailable: {reason}"),
            Self::ResultCountMismatch { expected, actual } => {
                write!(f, "evaluator returned {actual} results for {expected} requests")
            }
            Self::MalformedResult { reason } => write!(f, "malformed evaluator result: {reason}"),
        }
    }
}

impl Error for EvaluatorError {}

/// A checkpoint could not be restored.
#[derive(Clone, Debug, PartialEq)]
pub enum RestoreError {
    /// The configuration the checkpoint is restored into is invalid.
    Config(ConfigError),
    /// The restored generator does not reproduce the recorded stream.
    ReproducibilityViolation {
        /// What did not match.
        reason: String,
    },
    /// The checkpoint places an entity where the lattice refuses it.
    Occupancy(OccupancyError),
    /// The checkpoint's shape does not match the configuration.
    Mismatch {
        /// Description of the mismatch.
        reason: String,
    },
}

impl fmt::Display for RestoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "config: {e}"),
            Self::ReproducibilityViolation { reason } => {
                write!(f, "reproducibility violation: {reason}")
            }
            Self::Occupancy(e) => write!(f, "occupancy: {e}"),
            Self::Mismatch { reason } => write!(f, "checkpoint mismatch: {reason}"),
        }
    }
}

impl Error for RestoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Config(e) => Some(e),
            Self::Occupancy(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigError> for RestoreError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<OccupancyError> for RestoreError {
    fn from(e: OccupancyError) -> Self {
        Self::Occupancy(e)
    }
}
