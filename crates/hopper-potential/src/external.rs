//! Externally applied background potentials.
//!
//! Every setter adds to the lattice's background array, so contributions
//! stack in call order. These run once at setup.

use hopper_core::{RandomService, SiteId};
use hopper_lattice::Lattice;

/// Linear bias along x from `v_left` at the left electrode to `v_right`
/// at the right electrode, sampled at site centres.
pub fn set_potential_linear(lattice: &mut Lattice, v_left: f64, v_right: f64) {
    let nx = f64::from(lattice.dimensions().x);
    for i in 0..lattice.volume() {
        let site = SiteId(i);
        let (x, _, _) = lattice.position_of(site);
        lattice.add_potential(site, v_left + (v_right - v_left) * x / nx);
    }
}

/// Gate field along z: `v_gate` at the bottom face, decaying linearly to
/// zero at the top.
pub fn set_potential_gate(lattice: &mut Lattice, v_gate: f64) {
    let nz = f64::from(lattice.dimensions().z);
    for i in 0..lattice.volume() {
        let site = SiteId(i);
        let (_, _, z) = lattice.position_of(site);
        lattice.add_potential(site, v_gate * (1.0 - z / nz));
    }
}

/// Shift each listed site by `depth`. Out-of-range sites are ignored.
pub fn set_potential_traps(lattice: &mut Lattice, sites: &[SiteId], depth: f64) {
    for &site in sites {
        lattice.add_potential(site, depth);
    }
}

/// Gaussian energetic disorder: each interior site gets an independent
/// `normal(mean, sigma)` shift.
pub fn set_potential_disorder(lattice: &mut Lattice, rng: &mut RandomService, mean: f64, sigma: f64) {
    for i in 0..lattice.volume() {
        let shift = rng.normal(mean, sigma);
        lattice.add_potential(SiteId(i), shift);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hopper_lattice::Dimensions;

    fn lattice() -> Lattice {
        Lattice::new(Dimensions::new(4, 2, 2), 0).unwrap()
    }

    #[test]
    fn linear_bias_is_monotone_along_x() {
        let mut l = lattice();
        set_potential_linear(&mut l, 0.0, 1.0);
        let at = |x| l.potential(l.site_index(x, 1, 1));
        assert!((at(0) - 0.125).abs() < 1e-12);
        assert!((at(3) - 0.875).abs() < 1e-12);
        assert_eq!(at(1), l.potential(l.site_index(1, 0, 0)));
    }

    #[test]
    fn gate_decays_from_bottom() {
        let mut l = lattice();
        set_potential_gate(&mut l, 2.0);
        let bottom = l.potential(l.site_index(0, 0, 0));
        let top = l.potential(l.site_index(0, 0, 1));
        assert!((bottom - 1.5).abs() < 1e-12);
        assert!((top - 0.5).abs() < 1e-12);
    }

    #[test]
    fn contributions_stack() {
        let mut l = lattice();
        let trap = l.site_index(2, 1, 0);
        set_potential_linear(&mut l, 1.0, 1.0);
        set_potential_traps(&mut l, &[trap, SiteId(999)], -0.3);
        assert!((l.potential(trap) - 0.7).abs() < 1e-12);
        assert!((l.potential(SiteId(0)) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn disorder_is_seeded() {
        let mut a = lattice();
        let mut b = lattice();
        set_potential_disorder(&mut a, &mut RandomService::new(3), 0.0, 0.1);
        set_potential_disorder(&mut b, &mut RandomService::new(3), 0.0, 0.1);
        assert_eq!(a.potentials(), b.potentials());
        assert!(a.potentials().iter().any(|&v| v != 0.0));
    }
}
