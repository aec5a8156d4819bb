//! Local and external evaluators agree, and failures fall back locally.

use std::sync::atomic::Ordering;

use hopper_engine::{EvaluatorKind, Simulation, SimulationConfig};
use hopper_test_utils::{
    bipolar_config, closed_box_config, CorruptBackend, FailingBackend, ReferenceBackend,
};

fn batch(cfg: SimulationConfig) -> SimulationConfig {
    SimulationConfig {
        evaluator: EvaluatorKind::Batch,
        ..cfg
    }
}

#[test]
fn batch_backend_matches_local() {
    let backend = ReferenceBackend::new();
    let served = backend.batches();
    let mut local = Simulation::new(bipolar_config(13), None).unwrap();
    let mut remote = Simulation::new(batch(bipolar_config(13)), Some(Box::new(backend))).unwrap();
    assert_eq!(remote.evaluator_name(), "batch:reference");
    for _ in 0..120 {
        local.step();
        remote.step();
    }
    assert_eq!(local.checkpoint(), remote.checkpoint());
    assert!(served.load(Ordering::Relaxed) > 0);
    assert_eq!(remote.fallback_count(), 0);
}

#[test]
fn failing_backend_falls_back_without_changing_results() {
    let backend = FailingBackend::new(5);
    let calls = backend.calls.clone();
    let mut local = Simulation::new(closed_box_config(17), None).unwrap();
    let mut remote = Simulation::new(batch(closed_box_config(17)), Some(Box::new(backend))).unwrap();
    local.perform_iterations(20);
    remote.perform_iterations(20);
    let calls = calls.load(Ordering::Relaxed) as u64;
    assert!(calls > 5);
    assert_eq!(remote.fallback_count(), calls - 5);
    assert_eq!(local.checkpoint(), remote.checkpoint());
}

#[test]
fn malformed_batches_fall_back() {
    let mut local = Simulation::new(closed_box_config(23), None).unwrap();
    let mut remote =
        Simulation::new(batch(closed_box_config(23)), Some(Box::new(CorruptBackend))).unwrap();
    let mut flagged = 0;
    for _ in 0..10 {
        local.step();
        if remote.step().evaluator_fallback {
            flagged += 1;
        }
    }
    assert!(flagged > 0);
    assert_eq!(remote.fallback_count(), flagged);
    assert_eq!(local.checkpoint(), remote.checkpoint());
}

#[test]
fn local_kind_ignores_backend() {
    let sim = Simulation::new(bipolar_config(1), Some(Box::new(ReferenceBackend::new()))).unwrap();
    assert_eq!(sim.evaluator_name(), "local");
}
