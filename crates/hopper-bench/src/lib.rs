//! Benchmark profiles for the Hopper charge-transport engine.
//!
//! - [`reference_profile`]: 20x20x20 bipolar device (8K sites) with
//!   Coulomb interactions and seeded carriers
//! - [`stress_profile`]: 48x48x24 device (~55K sites) with image charges,
//!   Gaussian kernel, and disorder
//! - [`scatter_sites`]: deterministic interior sites for kernel benches

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use hopper_agents::SourceMode;
use hopper_core::{Carrier, Face, SiteId};
use hopper_engine::{FluxSpec, SimulationConfig};
use hopper_lattice::Dimensions;

fn bipolar(dims: Dimensions, cap: usize, seed: u64) -> SimulationConfig {
    SimulationConfig {
        dimensions: dims,
        sources: vec![
            FluxSpec::face(Carrier::Electron, Face::Left, 0.5),
            FluxSpec::face(Carrier::Hole, Face::Right, 0.5),
        ],
        drains: vec![
            FluxSpec::face(Carrier::Electron, Face::Right, 0.9),
            FluxSpec::face(Carrier::Hole, Face::Left, 0.9),
        ],
        max_electrons: cap,
        max_holes: cap,
        seed_fraction: 0.5,
        seed: Some(seed),
        ..SimulationConfig::default()
    }
}

/// 20x20x20 device, up to 200 carriers of each kind, half seeded.
pub fn reference_profile(seed: u64) -> SimulationConfig {
    let mut cfg = bipolar(Dimensions::new(20, 20, 20), 200, seed);
    cfg.field.voltage_right = 0.5;
    cfg
}

/// 48x48x24 device with every interaction switched on.
pub fn stress_profile(seed: u64) -> SimulationConfig {
    let mut cfg = bipolar(Dimensions::new(48, 48, 24), 1000, seed);
    cfg.sources[0].mode = SourceMode::Metropolis;
    cfg.sources[1].mode = SourceMode::Metropolis;
    cfg.electrostatics.image_charges = true;
    cfg.electrostatics.gaussian_sigma = Some(0.8);
    cfg.field.voltage_right = 1.0;
    cfg.field.gate_voltage = 0.2;
    cfg.field.disorder = Some((0.0, 0.05));
    cfg
}

/// `count` distinct interior sites of a lattice with `volume` sites,
/// spread by a fixed multiplicative hash.
pub fn scatter_sites(volume: u32, count: usize) -> Vec<SiteId> {
    let mut sites: Vec<SiteId> = (0..u64::from(volume))
        .map(|i| i.wrapping_mul(6_364_136_223_846_793_007) % u64::from(volume))
        .map(|i| SiteId(i as u32))
        .collect();
    sites.sort();
    sites.dedup();
    sites.truncate(count);
    sites
}
