//! Energy evaluation for a tick's batch of proposed hops.
//!
//! All evaluators see the same [`EvaluationContext`]: the lattice and a
//! [`ChargeSnapshot`] frozen before any move of the tick is committed. An
//! evaluator returns one energy change per request, in request order.
//!
//! [`LocalEvaluator`] fans the batch out over the rayon thread pool.
//! [`BatchEvaluator`] hands it to an external [`CoulombBackend`] and
//! validates the reply; the scheduler falls back to local evaluation when
//! either step fails.

use hopper_core::{AgentId, EvaluatorError, TickId};
use hopper_lattice::Lattice;
use hopper_potential::{ChargeSnapshot, EnergyModel, MoveRequest};
use indexmap::IndexMap;
use rayon::prelude::*;

/// Read-only state an evaluator works from.
#[derive(Clone, Copy, Debug)]
pub struct EvaluationContext<'a> {
    /// Occupancy and background potential.
    pub lattice: &'a Lattice,
    /// Carrier and defect positions at the start of evaluation.
    pub snapshot: &'a ChargeSnapshot,
    /// Kernel and interaction settings.
    pub model: &'a EnergyModel,
    /// Tick being evaluated.
    pub tick: TickId,
}

/// Computes energy changes for a batch of hops.
pub trait EnergyEvaluator: Send {
    /// Name used in logs.
    fn name(&self) -> &str;

    /// One energy change (eV) per request, in request order.
    ///
    /// # Errors
    ///
    /// [`EvaluatorError`] if the batch cannot be evaluated; the scheduler
    /// then evaluates it locally.
    fn evaluate(
        &mut self,
        requests: &[MoveRequest],
        ctx: &EvaluationContext<'_>,
    ) -> Result<Vec<f64>, EvaluatorError>;
}

// ── LocalEvaluator ───────────────────────────────────────────────

/// Data-parallel evaluation on the rayon thread pool.
///
/// Results never depend on thread count: each request is a pure function
/// of the context.
#[derive(Clone, Copy, Debug, Default)]
pub struct LocalEvaluator;

impl LocalEvaluator {
    /// Evaluate every request. Infallible.
    pub fn energies(requests: &[MoveRequest], ctx: &EvaluationContext<'_>) -> Vec<f64> {
        let background = ctx.lattice.potentials();
        requests
            .par_iter()
            .map(|r| ctx.model.move_energy(r, ctx.snapshot, background))
            .collect()
    }
}

impl EnergyEvaluator for LocalEvaluator {
    fn name(&self) -> &str {
        "local"
    }

    fn evaluate(
        &mut self,
        requests: &[MoveRequest],
        ctx: &EvaluationContext<'_>,
    ) -> Result<Vec<f64>, EvaluatorError> {
        Ok(Self::energies(requests, ctx))
    }
}

// ── CoulombBackend ───────────────────────────────────────────────

/// An external accelerator that evaluates whole batches.
///
/// The backend may answer in any order; each result is keyed by the
/// requesting agent.
pub trait CoulombBackend: Send {
    /// Name used in logs.
    fn name(&self) -> &str;

    /// Evaluate `requests` against `ctx`.
    ///
    /// # Errors
    ///
    /// [`EvaluatorError::Unavailable`] if the backend cannot run.
    fn evaluate_batch(
        &mut self,
        requests: &[MoveRequest],
        ctx: &EvaluationContext<'_>,
    ) -> Result<Vec<(AgentId, f64)>, EvaluatorError>;
}

/// Adapts a [`CoulombBackend`] to [`EnergyEvaluator`], checking that the
/// reply covers every request exactly once with finite values.
pub struct BatchEvaluator {
    backend: Box<dyn CoulombBackend>,
    name: String,
}

impl BatchEvaluator {
    /// Wrap `backend`.
    pub fn new(backend: Box<dyn CoulombBackend>) -> Self {
        let name = format!("batch:{}", backend.name());
        Self { backend, name }
    }

    fn reorder(
        requests: &[MoveRequest],
        results: Vec<(AgentId, f64)>,
    ) -> Result<Vec<f64>, EvaluatorError> {
        if results.len() != requests.len() {
            return Err(EvaluatorError::ResultCountMismatch {
                expected: requests.len(),
                actual: results.len(),
            });
        }
        let mut by_agent: IndexMap<AgentId, f64> = IndexMap::with_capacity(results.len());
        for (agent, de) in results {
            if !de.is_finite() {
                return Err(EvaluatorError::MalformedResult {
                    reason: format!("non-finite energy {de} for agent {agent}"),
                });
            }
            if by_agent.insert(agent, de).is_some() {
                return Err(EvaluatorError::MalformedResult {
                    reason: format!("duplicate result for agent {agent}"),
                });
            }
        }
        requests
            .iter()
            .map(|r| {
                by_agent
                    .get(&r.agent)
                    .copied()
                    .ok_or_else(|| EvaluatorError::MalformedResult {
                        reason: format!("no result for agent {}", r.agent),
                    })
            })
            .collect()
    }
}

impl std::fmt::Debug for BatchEvaluator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchEvaluator")
            .field("backend", &self.backend.name())
            .finish()
    }
}

impl EnergyEvaluator for BatchEvaluator {
    fn name(&self) -> &str {
        &self.name
    }

    fn evaluate(
        &mut self,
        requests: &[MoveRequest],
        ctx: &EvaluationContext<'_>,
    ) -> Result<Vec<f64>, EvaluatorError> {
        if requests.is_empty() {
            return Ok(Vec::new());
        }
        let results = self.backend.evaluate_batch(requests, ctx)?;
        Self::reorder(requests, results)
    }
}
