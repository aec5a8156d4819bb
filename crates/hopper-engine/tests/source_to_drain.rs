//! End-to-end transport: electrons injected at the left face reach the
//! drain at the right face.

use hopper_core::{Carrier, Species};
use hopper_engine::Simulation;
use hopper_test_utils::{assert_occupancy_consistent, bipolar_config, source_drain_config};

#[test]
fn electrons_cross_the_device() {
    let mut sim = Simulation::new(source_drain_config(42), None).unwrap();
    sim.perform_iterations(1000);
    let drained = sim.drains()[0].counters().successes();
    assert!(drained >= 1, "no electron reached the drain");
    assert_eq!(sim.removals().drained, drained);
    assert_eq!(sim.lattice().count(Species::Hole), 0);
}

#[test]
fn injected_minus_drained_is_on_the_lattice() {
    let mut sim = Simulation::new(source_drain_config(7), None).unwrap();
    for _ in 0..300 {
        sim.step();
        let injected = sim.sources()[0].counters().successes();
        let drained = sim.drains()[0].counters().successes();
        assert_eq!(
            injected - drained,
            sim.carrier_count(Carrier::Electron) as u64,
            "charge not conserved at tick {}",
            sim.tick()
        );
    }
}

#[test]
fn occupancy_stays_consistent_every_tick() {
    let mut sim = Simulation::new(source_drain_config(3), None).unwrap();
    for _ in 0..200 {
        sim.step();
        assert_occupancy_consistent(&sim);
    }
}

#[test]
fn lifetimes_and_pathlengths_accumulate() {
    let mut sim = Simulation::new(source_drain_config(11), None).unwrap();
    sim.perform_iterations(800);
    let stats = *sim.removals();
    if stats.removed() > 0 {
        let lifetime = stats.mean_lifetime().unwrap();
        let path = stats.mean_pathlength().unwrap();
        assert!(lifetime >= path, "more hops than ticks");
        assert!(path >= 1.0);
    }
    for agent in sim.agents() {
        assert!(agent.pathlength() <= agent.lifetime());
    }
}

/// Run the bipolar device with both electrodes shifted by `offset` and
/// report `(attempts, successes)` per source plus the final carrier counts.
fn injections_with_offset(offset: f64) -> (Vec<(u64, u64)>, usize, usize) {
    let mut cfg = bipolar_config(5);
    cfg.field.voltage_left = offset;
    cfg.field.voltage_right = 0.25 + offset;
    let mut sim = Simulation::new(cfg, None).unwrap();
    sim.perform_iterations(40);
    let counters = sim
        .sources()
        .iter()
        .map(|s| (s.counters().attempts(), s.counters().successes()))
        .collect();
    (
        counters,
        sim.carrier_count(Carrier::Electron),
        sim.carrier_count(Carrier::Hole),
    )
}

#[test]
fn uniform_electrode_offset_leaves_injection_unchanged() {
    let zero = injections_with_offset(0.0);
    assert!(zero.0[0].1 > 0, "no electron injected");
    assert!(zero.0[1].1 > 0, "no hole injected");
    assert_eq!(injections_with_offset(0.5), zero);
    assert_eq!(injections_with_offset(-0.5), zero);
}
