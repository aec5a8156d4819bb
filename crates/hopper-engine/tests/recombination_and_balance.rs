//! Recombination removes opposite pairs; balancing replaces lost charge.

use hopper_core::{Carrier, Face, Species};
use hopper_engine::{FluxSpec, RecombinationConfig, Simulation, SimulationConfig};
use hopper_lattice::Dimensions;
use hopper_test_utils::{assert_occupancy_consistent, closed_box_config};

fn crowded() -> SimulationConfig {
    SimulationConfig {
        dimensions: Dimensions::new(5, 5, 5),
        max_electrons: 15,
        max_holes: 15,
        seed_fraction: 1.0,
        recombination: Some(RecombinationConfig {
            target_rate: 100.0,
            encounter_range: 1,
            initial_probability: 1.0,
        }),
        ..closed_box_config(31)
    }
}

#[test]
fn recombination_removes_pairs() {
    let mut sim = Simulation::new(crowded(), None).unwrap();
    assert_eq!(sim.carrier_count(Carrier::Electron), 15);
    assert_eq!(sim.carrier_count(Carrier::Hole), 15);
    let mut recombined = 0;
    for _ in 0..20 {
        recombined += sim.step().recombined;
        assert_eq!(
            sim.lattice().count(Species::Electron),
            sim.lattice().count(Species::Hole)
        );
        assert_occupancy_consistent(&sim);
    }
    assert!(recombined > 0);
    assert_eq!(sim.removals().recombined, 2 * u64::from(recombined));
    let r = sim.recombination().unwrap();
    assert_eq!(r.counters().successes(), u64::from(recombined));
    assert_eq!(
        sim.carrier_count(Carrier::Electron) as u32,
        15 - recombined
    );
}

#[test]
fn closed_box_conserves_both_carriers() {
    let mut sim = Simulation::new(closed_box_config(19), None).unwrap();
    assert!(sim.recombination().is_none());
    assert!(!sim.config().balance_charges);
    let electrons = sim.carrier_count(Carrier::Electron);
    let holes = sim.carrier_count(Carrier::Hole);
    assert_eq!((electrons, holes), (10, 10));
    let mut committed = 0u64;
    for _ in 0..300 {
        let metrics = sim.step();
        assert_eq!(metrics.injected, 0);
        committed += u64::from(metrics.committed);
        assert_eq!(sim.carrier_count(Carrier::Electron), electrons);
        assert_eq!(sim.carrier_count(Carrier::Hole), holes);
        assert_eq!(sim.lattice().count(Species::Electron) as usize, electrons);
        assert_eq!(sim.lattice().count(Species::Hole) as usize, holes);
    }
    assert!(committed > 0, "carriers never moved");
    assert_eq!(sim.removals().removed(), 0);
}

#[test]
fn zero_probability_recombination_only_counts_encounters() {
    let mut cfg = crowded();
    cfg.recombination = Some(RecombinationConfig {
        target_rate: 0.0,
        encounter_range: 1,
        initial_probability: 0.0,
    });
    let mut sim = Simulation::new(cfg, None).unwrap();
    sim.perform_iterations(10);
    let r = sim.recombination().unwrap();
    assert!(r.counters().attempts() > 0);
    assert_eq!(r.counters().successes(), 0);
    assert_eq!(sim.carrier_count(Carrier::Hole), 15);
}

#[test]
fn balancing_replaces_drained_electrons() {
    let mut cfg = closed_box_config(37);
    cfg.temperature = f64::INFINITY;
    cfg.drains = vec![FluxSpec::face(Carrier::Electron, Face::Right, 1.0)];
    cfg.balance_charges = true;
    let mut sim = Simulation::new(cfg, None).unwrap();
    let holes = sim.carrier_count(Carrier::Hole) as u64;
    let mut balanced = 0u64;
    for _ in 0..400 {
        balanced += u64::from(sim.step().balanced);
        let electrons = sim.carrier_count(Carrier::Electron) as u64;
        assert!(electrons <= holes);
        assert_eq!(sim.carrier_count(Carrier::Hole) as u64, holes);
    }
    let drained = sim.removals().drained;
    assert!(drained > 0, "no electron was drained");
    assert!(balanced > 0);
    let electrons = sim.carrier_count(Carrier::Electron) as u64;
    assert_eq!(holes - electrons, drained - balanced);
    assert_eq!(sim.sources()[0].counters().attempts(), 400);
}
