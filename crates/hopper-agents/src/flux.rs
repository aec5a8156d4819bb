//! Counters, windowed rates, and lattice binding shared by flux agents.

use hopper_core::{ConfigError, Face, FluxId, OccupancyError, SiteId, Species, TickId};
use hopper_lattice::Lattice;

/// Monotonic attempt/success counters.
///
/// `successes <= attempts` always holds; both only grow, except at
/// [`reset`](Self::reset).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct FluxCounters {
    attempts: u64,
    successes: u64,
}

impl FluxCounters {
    /// Rebuild counters from recorded values.
    ///
    /// Returns `None` if `successes > attempts`.
    pub fn from_parts(attempts: u64, successes: u64) -> Option<Self> {
        (successes <= attempts).then_some(Self {
            attempts,
            successes,
        })
    }

    /// Record one attempt and whether it succeeded.
    pub fn record(&mut self, success: bool) {
        self.attempts += 1;
        if success {
            self.successes += 1;
        }
    }

    /// Total attempts.
    pub fn attempts(&self) -> u64 {
        self.attempts
    }

    /// Total successes.
    pub fn successes(&self) -> u64 {
        self.successes
    }

    /// Zero both counters.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Capture the counters at `tick`.
    pub fn snapshot(&self, tick: TickId) -> FluxSnapshot {
        FluxSnapshot {
            attempts: self.attempts,
            successes: self.successes,
            tick,
        }
    }
}

/// Counter values captured by `store_last`, the start of a rate window.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct FluxSnapshot {
    /// Attempts at capture.
    pub attempts: u64,
    /// Successes at capture.
    pub successes: u64,
    /// Tick of capture.
    pub tick: TickId,
}

/// Fraction of attempts in the window that succeeded.
///
/// `None` if the window holds no attempts.
pub fn success_probability(current: &FluxCounters, last: &FluxSnapshot) -> Option<f64> {
    let attempts = current.attempts().saturating_sub(last.attempts);
    let successes = current.successes().saturating_sub(last.successes);
    (attempts > 0).then(|| successes as f64 / attempts as f64)
}

/// Successes per tick over the window ending at `now`.
///
/// `None` for an empty window.
pub fn rate_per_tick(current: &FluxCounters, last: &FluxSnapshot, now: TickId) -> Option<f64> {
    let ticks = now.0.saturating_sub(last.tick.0);
    let successes = current.successes().saturating_sub(last.successes);
    (ticks > 0).then(|| successes as f64 / ticks as f64)
}

/// Where a flux agent sits.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FluxBinding {
    /// A special slot attached to a lattice face.
    Face(Face),
    /// A concrete interior site.
    Site(SiteId),
}

/// Register a flux agent and return its site.
///
/// Face bindings consume a special slot; site bindings claim the interior
/// site outright.
pub(crate) fn bind(
    lattice: &mut Lattice,
    id: FluxId,
    species: Species,
    binding: FluxBinding,
) -> Result<SiteId, ConfigError> {
    match binding {
        FluxBinding::Face(face) => lattice.register_special(id, species, face),
        FluxBinding::Site(site) => lattice
            .register_flux_site(id, species, site)
            .map(|()| site)
            .map_err(|e| match e {
                OccupancyError::Occupied { site, species } => ConfigError::ConflictingReservation {
                    site,
                    existing: species,
                },
                OccupancyError::OutOfRange { site }
                | OccupancyError::SpecialSite { site }
                | OccupancyError::Vacant { site } => ConfigError::SiteOutOfRange { site },
                e @ OccupancyError::NoTargets { .. } => ConfigError::InvalidParameter {
                    name: "flux binding",
                    reason: e.to_string(),
                },
            }),
    }
}

pub(crate) fn check_probability(name: &'static str, p: f64) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&p) {
        Ok(())
    } else {
        Err(ConfigError::InvalidProbability { name, value: p })
    }
}
