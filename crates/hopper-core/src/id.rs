//! Strongly-typed identifiers for sites, agents, and ticks.

use std::fmt;

/// Flat index of a lattice site.
///
/// Interior sites occupy `0..volume` and map bijectively to `(x, y, z)`
/// via `x + y*X + z*X*Y`. Indices at or above `volume` belong to the
/// reserved special range used by face-bound flux agents.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SiteId(pub u32);

impl SiteId {
    /// The index as a `usize`, for slice addressing.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for SiteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for SiteId {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

/// Identifies a mobile charge agent.
///
/// Allocated sequentially by the scheduler; never reused within a run,
/// so a checkpoint can restore the exact numbering.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AgentId(pub u64);

impl AgentId {
    /// The identifier following this one.
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for AgentId {
    fn from(v: u64) -> Self {
        Self(v)
    }
}

/// Identifies a flux (source, drain) agent.
///
/// `FluxId(n)` is the n-th flux agent created at setup: sources first,
/// then drains, in configuration order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FluxId(pub u32);

impl fmt::Display for FluxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for FluxId {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

/// Monotonically increasing tick counter.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TickId(pub u64);

impl fmt::Display for TickId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for TickId {
    fn from(v: u64) -> Self {
        Self(v)
    }
}
