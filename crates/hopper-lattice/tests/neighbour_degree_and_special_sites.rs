use hopper_core::{AgentId, Face, FluxId, SiteId, Species};
use hopper_lattice::{Dimensions, Lattice, Occupant};

#[test]
fn thin_slab_neighbour_degree() {
    let slab = Lattice::new(Dimensions::new(5, 5, 1), 0).unwrap();
    assert_eq!(slab.neighbours(slab.site_index(2, 2, 0), 1).len(), 8);
    assert_eq!(slab.neighbours(slab.site_index(0, 0, 0), 1).len(), 3);

    let single = Lattice::new(Dimensions::new(1, 1, 1), 0).unwrap();
    assert!(single.neighbours(SiteId(0), 1).is_empty());
}

#[test]
fn range_larger_than_lattice_reaches_every_site() {
    let l = Lattice::new(Dimensions::new(3, 3, 3), 0).unwrap();
    assert_eq!(l.neighbours(SiteId(0), 5).len(), 26);
}

#[test]
fn source_and_drain_pair_on_opposite_faces() {
    let mut l = Lattice::new(Dimensions::new(4, 3, 3), 2).unwrap();
    let source = l
        .register_special(FluxId(0), Species::Source, Face::Left)
        .unwrap();
    let drain = l
        .register_special(FluxId(1), Species::Drain, Face::Right)
        .unwrap();
    assert_eq!(l.species_at(source), Species::Source);
    assert_eq!(l.occupant_at(drain), Some(Occupant::Flux(FluxId(1))));

    let left_edge = l.site_index(0, 1, 1);
    let nbs = l.neighbours(left_edge, 1);
    assert!(nbs.contains(&source));
    assert!(!nbs.contains(&drain));
    // Specials come after the interior box.
    assert_eq!(nbs.last(), Some(&source));
}

#[test]
fn corner_site_sees_every_adjacent_face() {
    let mut l = Lattice::new(Dimensions::new(3, 3, 3), 3).unwrap();
    let specials: Vec<SiteId> = [Face::Left, Face::Front, Face::Bottom]
        .into_iter()
        .enumerate()
        .map(|(i, f)| {
            l.register_special(FluxId(i as u32), Species::Drain, f)
                .unwrap()
        })
        .collect();
    let nbs = l.neighbours(SiteId(0), 1);
    assert_eq!(nbs.len(), 7 + 3);
    for s in specials {
        assert!(nbs.contains(&s));
    }
}

#[test]
fn interior_bound_flux_site_blocks_agents() {
    let mut l = Lattice::new(Dimensions::new(3, 3, 3), 0).unwrap();
    let site = l.site_index(1, 1, 1);
    l.register_flux_site(FluxId(0), Species::Drain, site)
        .unwrap();
    assert!(!l.is_empty(site));
    assert!(l
        .register_agent(AgentId(0), Species::Electron, site, 1)
        .is_err());
    assert_eq!(l.count(Species::Drain), 1);
}
