//! Minimal run: electrons cross a 10x10x10 device under forward bias.
//!
//! ```text
//! RUST_LOG=info cargo run -p hopper-engine --example quickstart
//! ```

use hopper_core::{Carrier, Face};
use hopper_engine::{FluxSpec, Simulation, SimulationConfig};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let mut config = SimulationConfig {
        sources: vec![FluxSpec::face(Carrier::Electron, Face::Left, 0.5)],
        drains: vec![FluxSpec::face(Carrier::Electron, Face::Right, 0.9)],
        print_interval: 250,
        seed: Some(2024),
        ..SimulationConfig::default()
    };
    config.field.voltage_right = 0.5;
    config.field.disorder = Some((0.0, 0.05));

    let mut sim = Simulation::new(config, None)?;
    let metrics = sim.perform_iterations(2000).clone();
    let stats = *sim.removals();

    println!("tick          {}", metrics.tick);
    println!("electrons     {}", metrics.electrons);
    println!("drained       {}", stats.drained);
    if let Some(t) = stats.mean_lifetime() {
        println!("mean lifetime {t:.1} ticks");
    }
    if let Some(p) = stats.mean_pathlength() {
        println!("mean path     {p:.1} hops");
    }
    Ok(())
}
