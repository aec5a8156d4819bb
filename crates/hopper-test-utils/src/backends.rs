//! Mock external evaluators.
//!
//! - [`ReferenceBackend`]: serial evaluation through the shared energy
//!   model, answering in reverse order to exercise result matching.
//! - [`FailingBackend`]: succeeds for N calls, then reports unavailable.
//! - [`CorruptBackend`]: returns a malformed batch.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use hopper_core::{AgentId, EvaluatorError};
use hopper_engine::{CoulombBackend, EvaluationContext};
use hopper_potential::MoveRequest;

fn serial(requests: &[MoveRequest], ctx: &EvaluationContext<'_>) -> Vec<(AgentId, f64)> {
    let background = ctx.lattice.potentials();
    requests
        .iter()
        .rev()
        .map(|r| (r.agent, ctx.model.move_energy(r, ctx.snapshot, background)))
        .collect()
}

/// Serial backend computing the same energies as local evaluation.
#[derive(Clone, Debug, Default)]
pub struct ReferenceBackend {
    pub batches: Arc<AtomicUsize>,
}

impl ReferenceBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared count of batches served.
    pub fn batches(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.batches)
    }
}

impl CoulombBackend for ReferenceBackend {
    fn name(&self) -> &str {
        "reference"
    }

    fn evaluate_batch(
        &mut self,
        requests: &[MoveRequest],
        ctx: &EvaluationContext<'_>,
    ) -> Result<Vec<(AgentId, f64)>, EvaluatorError> {
        self.batches.fetch_add(1, Ordering::Relaxed);
        Ok(serial(requests, ctx))
    }
}

/// Serves `succeed_count` batches, then fails every call.
#[derive(Debug)]
pub struct FailingBackend {
    pub succeed_count: usize,
    pub calls: Arc<AtomicUsize>,
}

impl FailingBackend {
    pub fn new(succeed_count: usize) -> Self {
        Self {
            succeed_count,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }
}

impl CoulombBackend for FailingBackend {
    fn name(&self) -> &str {
        "failing"
    }

    fn evaluate_batch(
        &mut self,
        requests: &[MoveRequest],
        ctx: &EvaluationContext<'_>,
    ) -> Result<Vec<(AgentId, f64)>, EvaluatorError> {
        let n = self.calls.fetch_add(1, Ordering::Relaxed);
        if n >= self.succeed_count {
            Err(EvaluatorError::Unavailable {
                reason: format!("device lost after {} batches", self.succeed_count),
            })
        } else {
            Ok(serial(requests, ctx))
        }
    }
}

/// Drops the last result of every batch.
#[derive(Clone, Copy, Debug, Default)]
pub struct CorruptBackend;

impl CoulombBackend for CorruptBackend {
    fn name(&self) -> &str {
        "corrupt"
    }

    fn evaluate_batch(
        &mut self,
        requests: &[MoveRequest],
        ctx: &EvaluationContext<'_>,
    ) -> Result<Vec<(AgentId, f64)>, EvaluatorError> {
        let mut out = serial(requests, ctx);
        out.pop();
        Ok(out)
    }
}
