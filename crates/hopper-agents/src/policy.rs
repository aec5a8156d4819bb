//! Acceptance policy for carrier hops.

use hopper_core::RandomService;

/// Per-axis coupling factors for anisotropic transport.
///
/// A hop along an axis with coupling `c` is accepted with probability `c`
/// when downhill and `(1 - c) * exp(-dE / kT)` when uphill.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AxisCoupling {
    /// Coupling along x.
    pub x: f64,
    /// Coupling along y.
    pub y: f64,
    /// Coupling along z.
    pub z: f64,
}

impl AxisCoupling {
    /// The same coupling on every axis.
    pub fn isotropic(c: f64) -> Self {
        Self { x: c, y: c, z: c }
    }

    /// Coupling for `axis` (0 = x, 1 = y, 2 = z).
    pub fn along(&self, axis: usize) -> f64 {
        match axis {
            0 => self.x,
            1 => self.y,
            _ => self.z,
        }
    }
}

/// Inverse temperature and optional coupling, fixed for a run.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MovePolicy {
    /// `1 / kT` in 1/eV. Zero accepts every hop.
    pub inv_kt: f64,
    /// Coupled Metropolis when set, plain Metropolis otherwise.
    pub coupling: Option<AxisCoupling>,
}

impl MovePolicy {
    /// Plain Metropolis at `inv_kt`.
    pub fn metropolis(inv_kt: f64) -> Self {
        Self {
            inv_kt,
            coupling: None,
        }
    }

    /// Stochastic acceptance of a hop with energy change `de` along `axis`.
    pub fn accept(&self, rng: &mut RandomService, de: f64, axis: usize) -> bool {
        match self.coupling {
            None => rng.metropolis(de, self.inv_kt),
            Some(c) => rng.metropolis_with_coupling(de, self.inv_kt, c.along(axis)),
        }
    }
}
