//! Standard simulation configurations.
//!
//! All fixtures use a fixed seed and a small lattice so integration tests
//! run in milliseconds.

use hopper_agents::SourceMode;
use hopper_core::{Carrier, Face};
use hopper_engine::{FluxSpec, SimulationConfig};
use hopper_lattice::Dimensions;

/// Electrons injected at the left face and extracted at the right, with
/// every hop accepted.
pub fn source_drain_config(seed: u64) -> SimulationConfig {
    SimulationConfig {
        dimensions: Dimensions::new(10, 10, 10),
        temperature: f64::INFINITY,
        sources: vec![FluxSpec::face(Carrier::Electron, Face::Left, 1.0)],
        drains: vec![FluxSpec::face(Carrier::Electron, Face::Right, 1.0)],
        seed: Some(seed),
        ..SimulationConfig::default()
    }
}

/// Electrons from the left, holes from the right, each extracted at the
/// opposite face, at room temperature with a forward bias and
/// energy-sensitive injection.
pub fn bipolar_config(seed: u64) -> SimulationConfig {
    let mut cfg = SimulationConfig {
        dimensions: Dimensions::new(8, 6, 6),
        temperature: 300.0,
        sources: vec![
            FluxSpec::face(Carrier::Electron, Face::Left, 0.8),
            FluxSpec::face(Carrier::Hole, Face::Right, 0.8),
        ],
        drains: vec![
            FluxSpec::face(Carrier::Electron, Face::Right, 0.9),
            FluxSpec::face(Carrier::Hole, Face::Left, 0.9),
        ],
        max_electrons: 40,
        max_holes: 40,
        seed: Some(seed),
        ..SimulationConfig::default()
    };
    cfg.sources[0].mode = SourceMode::Metropolis;
    cfg.sources[1].mode = SourceMode::Metropolis;
    cfg.field.voltage_left = 0.0;
    cfg.field.voltage_right = 0.2;
    cfg
}

/// A closed box with seeded carriers of both kinds and no flux. The
/// sources exist only to seed; their probability is zero.
pub fn closed_box_config(seed: u64) -> SimulationConfig {
    SimulationConfig {
        dimensions: Dimensions::new(6, 6, 6),
        temperature: 300.0,
        sources: vec![
            FluxSpec::face(Carrier::Electron, Face::Left, 0.0),
            FluxSpec::face(Carrier::Hole, Face::Right, 0.0),
        ],
        max_electrons: 20,
        max_holes: 20,
        seed_fraction: 0.5,
        seed: Some(seed),
        ..SimulationConfig::default()
    }
}
