//! Lattice invariant test helpers.
//!
//! These functions verify indexing, neighbour, and occupancy invariants
//! on a concrete [`Lattice`]. Reused across the test modules of this
//! crate.

use hopper_core::{SiteId, Species};
use indexmap::IndexSet;

use crate::lattice::Lattice;

/// Assert that `site_index(coords(s)) == s` for every interior site.
pub fn assert_index_bijection(lattice: &Lattice) {
    for i in 0..lattice.volume() {
        let site = SiteId(i);
        let (x, y, z) = lattice.coords(site);
        let back = lattice.site_index(x, y, z);
        assert_eq!(
            back, site,
            "coords({site:?}) = ({x}, {y}, {z}) maps back to {back:?}"
        );
    }
}

/// Assert that `distance(a, a) == 0` for every interior site.
pub fn assert_distance_reflexive(lattice: &Lattice) {
    for i in 0..lattice.volume() {
        let s = SiteId(i);
        let d = lattice.distance(s, s);
        assert!(d.abs() < f64::EPSILON, "distance({s:?}, {s:?}) = {d}");
    }
}

/// Assert that signed displacements flip sign when swapped and that the
/// image offset is symmetric.
pub fn assert_displacement_antisymmetric(lattice: &Lattice) {
    for a in 0..lattice.volume() {
        for b in 0..lattice.volume() {
            let (a, b) = (SiteId(a), SiteId(b));
            let (dx, dy, dz) = lattice.displacement(a, b);
            let (ex, ey, ez) = lattice.displacement(b, a);
            assert!(
                dx == -ex && dy == -ey && dz == -ez,
                "displacement({a:?}, {b:?}) = ({dx}, {dy}, {dz}) but reverse is ({ex}, {ey}, {ez})"
            );
            assert_eq!(
                lattice.x_image_distance_i(a, b),
                lattice.x_image_distance_i(b, a),
                "image offset asymmetric for {a:?}, {b:?}"
            );
        }
    }
}

/// Assert that `b in neighbours(a)` implies `a in neighbours(b)` for
/// interior sites.
pub fn assert_neighbours_symmetric(lattice: &Lattice, range: u32) {
    for i in 0..lattice.volume() {
        let a = SiteId(i);
        for nb in lattice.neighbours(a, range) {
            if !lattice.is_interior(nb) {
                continue;
            }
            let back = lattice.neighbours(nb, range);
            assert!(
                back.contains(&a),
                "{nb:?} is a neighbour of {a:?} but not vice versa"
            );
        }
    }
}

/// Assert neighbour lists contain no duplicates, never the site itself,
/// and only sites within `range` per axis.
pub fn assert_neighbours_well_formed(lattice: &Lattice, range: u32) {
    for i in 0..lattice.volume() {
        let a = SiteId(i);
        let nbs = lattice.neighbours(a, range);
        let unique: IndexSet<SiteId> = nbs.iter().copied().collect();
        assert_eq!(unique.len(), nbs.len(), "duplicate neighbours of {a:?}");
        assert!(!unique.contains(&a), "{a:?} listed as its own neighbour");
        for nb in nbs.iter().copied().filter(|&s| lattice.is_interior(s)) {
            let d = lattice.chebyshev_distance(a, nb);
            assert!(
                d >= 1 && d <= range,
                "{nb:?} at Chebyshev distance {d} from {a:?} exceeds range {range}"
            );
        }
    }
}

/// Assert that the per-species counts agree with a full scan of the
/// interior, and that every mobile carrier has an occupant handle.
pub fn assert_occupancy_consistent(lattice: &Lattice) {
    let species = [
        Species::Empty,
        Species::Electron,
        Species::Hole,
        Species::Defect,
        Species::Source,
        Species::Drain,
    ];
    let mut total = 0;
    for s in species {
        let scanned = lattice.occupied_sites(s).len() as u32;
        assert_eq!(lattice.count(s), scanned, "{s} count out of sync");
        total += scanned;
    }
    assert_eq!(total, lattice.volume(), "species counts do not cover the lattice");
    for i in 0..lattice.volume() {
        let site = SiteId(i);
        if lattice.species_at(site).carrier().is_some() {
            assert!(
                lattice.occupant_at(site).is_some(),
                "{} at {site:?} has no occupant handle",
                lattice.species_at(site)
            );
        }
    }
}

/// Run all invariant checks.
pub fn run_full_compliance(lattice: &Lattice, range: u32) {
    assert_index_bijection(lattice);
    assert_distance_reflexive(lattice);
    assert_displacement_antisymmetric(lattice);
    assert_neighbours_symmetric(lattice, range);
    assert_neighbours_well_formed(lattice, range);
    assert_occupancy_consistent(lattice);
}
