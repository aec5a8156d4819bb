//! The tick scheduler.
//!
//! [`Simulation`] is a callable struct with no background threads. Each
//! [`step()`](Simulation::step) runs the full tick pipeline described in
//! the crate docs; only the energy evaluation phase fans out to the rayon
//! pool, and it sees the lattice read-only.

use std::cmp::Ordering;
use std::time::Instant;

use hopper_agents::{
    rate_per_tick, ChargeAgent, DrainAgent, FluxBinding, MovePolicy, MoveState,
    RecombinationAgent, SourceAgent, TickOutcome,
};
use hopper_core::{
    AgentId, Carrier, ConfigError, Face, FluxId, OccupancyError, RandomService, RestoreError,
    SiteId, Species, TickId,
};
use hopper_lattice::{Lattice, Occupant};
use hopper_potential::{
    set_potential_disorder, set_potential_gate, set_potential_linear, set_potential_traps,
    ChargeSnapshot, EnergyModel, MoveRequest,
};
use indexmap::IndexMap;
use tracing::{debug, info, warn};

use crate::checkpoint::{CarrierRecord, Checkpoint, FluxRecord, RecombinationRecord};
use crate::config::{DefectConfig, EvaluatorKind, FieldConfig, SimulationConfig};
use crate::evaluator::{
    BatchEvaluator, CoulombBackend, EnergyEvaluator, EvaluationContext, LocalEvaluator,
};
use crate::metrics::{RemovalStats, TickMetrics};

// ── Setup helpers ────────────────────────────────────────────────

fn reservation_error(e: OccupancyError) -> ConfigError {
    match e {
        OccupancyError::Occupied { site, species } => ConfigError::ConflictingReservation {
            site,
            existing: species,
        },
        OccupancyError::OutOfRange { site }
        | OccupancyError::SpecialSite { site }
        | OccupancyError::Vacant { site } => ConfigError::SiteOutOfRange { site },
        e @ OccupancyError::NoTargets { .. } => ConfigError::InvalidParameter {
            name: "flux binding",
            reason: e.to_string(),
        },
    }
}

/// Draw `count` distinct sites from `pool` without replacement.
fn sample_sites(rng: &mut RandomService, mut pool: Vec<SiteId>, count: usize) -> Vec<SiteId> {
    let count = count.min(pool.len());
    let mut picked = Vec::with_capacity(count);
    for _ in 0..count {
        let i = rng.index(pool.len());
        picked.push(pool.swap_remove(i));
    }
    picked
}

fn fraction_of(fraction: f64, n: usize) -> usize {
    (fraction * n as f64).round() as usize
}

fn place_defects(
    lattice: &mut Lattice,
    rng: &mut RandomService,
    cfg: &DefectConfig,
) -> Result<(), ConfigError> {
    for &site in &cfg.sites {
        lattice.register_defect(site).map_err(reservation_error)?;
    }
    if cfg.fraction > 0.0 {
        let free: Vec<SiteId> = (0..lattice.volume())
            .map(SiteId)
            .filter(|&s| lattice.is_empty(s))
            .collect();
        let count = fraction_of(cfg.fraction, free.len());
        for site in sample_sites(rng, free, count) {
            lattice.register_defect(site).map_err(reservation_error)?;
        }
    }
    Ok(())
}

fn apply_background(lattice: &mut Lattice, rng: &mut RandomService, cfg: &FieldConfig) {
    set_potential_linear(lattice, cfg.voltage_left, cfg.voltage_right);
    if cfg.gate_voltage != 0.0 {
        set_potential_gate(lattice, cfg.gate_voltage);
    }
    let mut traps = cfg.trap_sites.clone();
    if cfg.trap_fraction > 0.0 {
        let pool: Vec<SiteId> = (0..lattice.volume()).map(SiteId).collect();
        let count = fraction_of(cfg.trap_fraction, pool.len());
        traps.extend(sample_sites(rng, pool, count));
    }
    set_potential_traps(lattice, &traps, cfg.trap_depth);
    if let Some((mean, sigma)) = cfg.disorder {
        set_potential_disorder(lattice, rng, mean, sigma);
    }
}

/// Potential a source's carriers start from. The x faces sit at their
/// electrode voltage. Other faces use the mean background over their
/// targets; site bindings use the background at the site.
fn reference_potential(lattice: &Lattice, field: &FieldConfig, source: &SourceAgent) -> f64 {
    match source.binding() {
        FluxBinding::Face(Face::Left) => field.voltage_left,
        FluxBinding::Face(Face::Right) => field.voltage_right,
        FluxBinding::Site(site) => lattice.potential(site),
        FluxBinding::Face(_) => {
            let targets = source.targets();
            if targets.is_empty() {
                return 0.0;
            }
            let sum: f64 = targets.iter().map(|&t| lattice.potential(t)).sum();
            sum / targets.len() as f64
        }
    }
}

fn select_evaluator(
    kind: EvaluatorKind,
    backend: Option<Box<dyn CoulombBackend>>,
) -> Box<dyn EnergyEvaluator> {
    match (kind, backend) {
        (EvaluatorKind::Batch, Some(backend)) => Box::new(BatchEvaluator::new(backend)),
        (EvaluatorKind::Batch, None) => {
            warn!("batch evaluation requested without a backend, evaluating locally");
            Box::new(LocalEvaluator)
        }
        (EvaluatorKind::Local, Some(backend)) => {
            debug!(backend = backend.name(), "local evaluation selected, backend unused");
            Box::new(LocalEvaluator)
        }
        (EvaluatorKind::Local, None) => Box::new(LocalEvaluator),
    }
}

/// Two distinct mutable elements of a slice.
fn pair_mut<T>(items: &mut [T], i: usize, j: usize) -> (&mut T, &mut T) {
    debug_assert_ne!(i, j);
    if i < j {
        let (lo, hi) = items.split_at_mut(j);
        (&mut lo[i], &mut hi[0])
    } else {
        let (lo, hi) = items.split_at_mut(i);
        (&mut hi[0], &mut lo[j])
    }
}

// ── Simulation ───────────────────────────────────────────────────

/// One kinetic Monte Carlo run.
///
/// Carriers live in an [`IndexMap`] keyed by [`AgentId`]; its insertion
/// order is the commit order, so two runs with the same configuration and
/// seed are identical tick for tick regardless of thread count.
pub struct Simulation {
    config: SimulationConfig,
    lattice: Lattice,
    model: EnergyModel,
    policy: MovePolicy,
    rng: RandomService,
    agents: IndexMap<AgentId, ChargeAgent>,
    sources: Vec<SourceAgent>,
    drains: Vec<DrainAgent>,
    recombination: Option<RecombinationAgent>,
    evaluator: Box<dyn EnergyEvaluator>,
    next_id: AgentId,
    tick: TickId,
    removals: RemovalStats,
    last_metrics: TickMetrics,
    fallbacks: u64,
}

impl std::fmt::Debug for Simulation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Simulation")
            .field("tick", &self.tick)
            .field("carriers", &self.agents.len())
            .field("sources", &self.sources.len())
            .field("drains", &self.drains.len())
            .field("evaluator", &self.evaluator.name())
            .finish()
    }
}

impl Simulation {
    /// Validate `config`, build the lattice and agents, and seed carriers.
    ///
    /// `backend` is used when `config.evaluator` is
    /// [`EvaluatorKind::Batch`]; without one the run evaluates locally.
    ///
    /// # Errors
    ///
    /// [`ConfigError`] if validation or any setup registration fails.
    pub fn new(
        config: SimulationConfig,
        backend: Option<Box<dyn CoulombBackend>>,
    ) -> Result<Self, ConfigError> {
        let mut sim = Self::build(config, backend)?;
        let seeded = sim.seed_charges();
        info!(
            dims = ?sim.config.dimensions,
            seed = sim.rng.seed(),
            sources = sim.sources.len(),
            drains = sim.drains.len(),
            defects = sim.lattice.count(Species::Defect),
            seeded,
            evaluator = sim.evaluator.name(),
            "simulation initialised"
        );
        Ok(sim)
    }

    /// Everything in [`new`](Self::new) except carrier seeding.
    fn build(
        config: SimulationConfig,
        backend: Option<Box<dyn CoulombBackend>>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let mut rng = RandomService::from_option(config.seed);
        let mut lattice = Lattice::new(config.dimensions, config.max_special)?;
        let range = config.hopping_range;

        let mut next_flux = 0u32;
        let mut sources = Vec::with_capacity(config.sources.len());
        for spec in &config.sources {
            sources.push(SourceAgent::register(
                &mut lattice,
                FluxId(next_flux),
                spec.carrier,
                spec.binding,
                spec.probability,
                spec.mode,
                range,
            )?);
            next_flux += 1;
        }
        let mut drains = Vec::with_capacity(config.drains.len());
        for spec in &config.drains {
            drains.push(DrainAgent::register(
                &mut lattice,
                FluxId(next_flux),
                spec.carrier,
                spec.binding,
                spec.probability,
            )?);
            next_flux += 1;
        }

        place_defects(&mut lattice, &mut rng, &config.defects)?;
        apply_background(&mut lattice, &mut rng, &config.field);
        for source in &mut sources {
            let reference = reference_potential(&lattice, &config.field, source);
            source.set_reference_potential(reference);
        }

        let e = &config.electrostatics;
        let model = EnergyModel::builder()
            .params(e.field_params())
            .coulomb(e.coulomb)
            .image_charges(e.image_charges)
            .kernel(e.kernel())
            .build(config.dimensions)?;

        let recombination = match &config.recombination {
            Some(r) => Some(RecombinationAgent::new(
                r.target_rate,
                r.encounter_range,
                r.initial_probability,
            )?),
            None => None,
        };
        let policy = MovePolicy {
            inv_kt: config.resolved_inv_kt(),
            coupling: config.coupling,
        };
        let evaluator = select_evaluator(config.evaluator, backend);

        Ok(Self {
            config,
            lattice,
            model,
            policy,
            rng,
            agents: IndexMap::new(),
            sources,
            drains,
            recombination,
            evaluator,
            next_id: AgentId(0),
            tick: TickId(0),
            removals: RemovalStats::default(),
            last_metrics: TickMetrics::default(),
            fallbacks: 0,
        })
    }

    fn insert(&mut self, agent: ChargeAgent) {
        self.agents.insert(agent.id(), agent);
        self.next_id = self.next_id.next();
    }

    fn free_interior_sites(&self) -> Vec<SiteId> {
        (0..self.lattice.volume())
            .map(SiteId)
            .filter(|&s| self.lattice.is_empty(s))
            .collect()
    }

    fn below_cap(&self, carrier: Carrier) -> bool {
        (self.lattice.count(carrier.species()) as usize) < self.config.cap(carrier)
    }

    /// Place the initial carriers: `seed_fraction` of each cap, for every
    /// carrier that has a source, at random empty interior sites.
    ///
    /// Returns the number placed.
    pub fn seed_charges(&mut self) -> u32 {
        if self.config.seed_fraction <= 0.0 {
            return 0;
        }
        let range = self.config.hopping_range;
        let mut placed = 0;
        for carrier in Carrier::ALL {
            let Some(idx) = self.sources.iter().position(|s| s.carrier() == carrier) else {
                continue;
            };
            let target = fraction_of(self.config.seed_fraction, self.config.cap(carrier));
            let free = self.free_interior_sites();
            for site in sample_sites(&mut self.rng, free, target) {
                if !self.below_cap(carrier) {
                    break;
                }
                match self.sources[idx].try_to_seed(
                    &mut self.lattice,
                    &mut self.rng,
                    self.next_id,
                    range,
                    Some(site),
                ) {
                    Ok(agent) => {
                        self.insert(agent);
                        placed += 1;
                    }
                    Err(error) => debug!(%site, %error, "seed site unavailable"),
                }
            }
        }
        placed
    }

    // ── Accessors ────────────────────────────────────────────────

    /// The configuration this run was built from.
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// The lattice.
    pub fn lattice(&self) -> &Lattice {
        &self.lattice
    }

    /// The energy model.
    pub fn model(&self) -> &EnergyModel {
        &self.model
    }

    /// Last completed tick.
    pub fn tick(&self) -> TickId {
        self.tick
    }

    /// Resolved seed of the random stream.
    pub fn seed(&self) -> u64 {
        self.rng.seed()
    }

    /// Carriers in commit order.
    pub fn agents(&self) -> impl Iterator<Item = &ChargeAgent> {
        self.agents.values()
    }

    /// Carrier by identifier.
    pub fn agent(&self, id: AgentId) -> Option<&ChargeAgent> {
        self.agents.get(&id)
    }

    /// Number of carriers of `carrier` on the lattice.
    pub fn carrier_count(&self, carrier: Carrier) -> usize {
        self.agents
            .values()
            .filter(|a| a.carrier() == carrier)
            .count()
    }

    /// Sources in configuration order.
    pub fn sources(&self) -> &[SourceAgent] {
        &self.sources
    }

    /// Drains in configuration order.
    pub fn drains(&self) -> &[DrainAgent] {
        &self.drains
    }

    /// The recombination agent, if enabled.
    pub fn recombination(&self) -> Option<&RecombinationAgent> {
        self.recombination.as_ref()
    }

    /// Run totals over removed carriers.
    pub fn removals(&self) -> &RemovalStats {
        &self.removals
    }

    /// Metrics of the last completed tick.
    pub fn last_metrics(&self) -> &TickMetrics {
        &self.last_metrics
    }

    /// Name of the preferred evaluator.
    pub fn evaluator_name(&self) -> &str {
        self.evaluator.name()
    }

    /// Ticks on which the preferred evaluator failed.
    pub fn fallback_count(&self) -> u64 {
        self.fallbacks
    }

    // ── Tick pipeline ────────────────────────────────────────────

    /// Run `n` ticks and return the metrics of the last one.
    pub fn perform_iterations(&mut self, n: u64) -> &TickMetrics {
        for _ in 0..n {
            self.step();
        }
        &self.last_metrics
    }

    /// Run one tick.
    pub fn step(&mut self) -> &TickMetrics {
        let started = Instant::now();
        self.tick = TickId(self.tick.0 + 1);
        let mut metrics = TickMetrics {
            tick: self.tick,
            ..TickMetrics::default()
        };

        self.perform_injections(&mut metrics);
        let requests = self.propose();
        self.evaluate(&requests, &mut metrics);
        self.commit(&mut metrics);
        self.perform_recombinations(&mut metrics);
        self.sweep_removed();
        if self.config.balance_charges {
            metrics.balanced = self.balance_charges();
        }

        metrics.electrons = self.lattice.count(Species::Electron);
        metrics.holes = self.lattice.count(Species::Hole);
        metrics.total_us = started.elapsed().as_micros() as u64;
        debug!(
            tick = self.tick.0,
            injected = metrics.injected,
            committed = metrics.committed,
            rejected = metrics.rejected,
            drained = metrics.drained,
            recombined = metrics.recombined,
            electrons = metrics.electrons,
            holes = metrics.holes,
            "tick complete"
        );
        self.last_metrics = metrics;

        let interval = self.config.print_interval;
        if interval > 0 && self.tick.0 % interval == 0 {
            self.report_progress();
            self.store_last();
        }
        &self.last_metrics
    }

    /// One injection attempt per source, skipping sources whose carrier
    /// is at its cap.
    pub fn perform_injections(&mut self, metrics: &mut TickMetrics) {
        let range = self.config.hopping_range;
        let inv_kt = self.policy.inv_kt;
        let defect_charge = self.config.defects.charge;
        for i in 0..self.sources.len() {
            let carrier = self.sources[i].carrier();
            if !self.below_cap(carrier) {
                continue;
            }
            let model = &self.model;
            let result = self.sources[i].try_to_inject(
                &mut self.lattice,
                &mut self.rng,
                self.next_id,
                range,
                inv_kt,
                |lattice, site, reference| {
                    let snapshot = ChargeSnapshot::capture(lattice, defect_charge);
                    let background = lattice.potentials();
                    model.placement_energy(carrier, reference, site, &snapshot, background)
                },
            );
            match result {
                Ok(Some(agent)) => {
                    self.insert(agent);
                    metrics.injected += 1;
                }
                Ok(None) => metrics.injection_failures += 1,
                Err(error) => {
                    metrics.injection_failures += 1;
                    debug!(source = %self.sources[i].id(), %error, "injection target unavailable");
                }
            }
        }
    }

    /// Every carrier picks a future site. Only hops onto empty interior
    /// sites need an energy; the rest are settled at commit.
    fn propose(&mut self) -> Vec<MoveRequest> {
        let mut requests = Vec::with_capacity(self.agents.len());
        for agent in self.agents.values_mut() {
            if agent.is_removed() {
                continue;
            }
            if let Some(future) = agent.choose_future(&mut self.rng) {
                if self.lattice.is_empty(future) {
                    requests.push(MoveRequest {
                        agent: agent.id(),
                        carrier: agent.carrier(),
                        current: agent.site(),
                        future,
                    });
                }
            }
        }
        requests
    }

    fn evaluate(&mut self, requests: &[MoveRequest], metrics: &mut TickMetrics) {
        let started = Instant::now();
        let snapshot = ChargeSnapshot::capture(&self.lattice, self.config.defects.charge);
        let ctx = EvaluationContext {
            lattice: &self.lattice,
            snapshot: &snapshot,
            model: &self.model,
            tick: self.tick,
        };
        let energies = match self.evaluator.evaluate(requests, &ctx) {
            Ok(energies) if energies.len() == requests.len() => energies,
            Ok(energies) => {
                warn!(
                    tick = self.tick.0,
                    evaluator = self.evaluator.name(),
                    expected = requests.len(),
                    actual = energies.len(),
                    "evaluator returned the wrong number of energies, falling back to local"
                );
                metrics.evaluator_fallback = true;
                LocalEvaluator::energies(requests, &ctx)
            }
            Err(error) => {
                warn!(
                    tick = self.tick.0,
                    evaluator = self.evaluator.name(),
                    %error,
                    "evaluator failed, falling back to local"
                );
                metrics.evaluator_fallback = true;
                LocalEvaluator::energies(requests, &ctx)
            }
        };
        if metrics.evaluator_fallback {
            self.fallbacks += 1;
        }
        for (request, de) in requests.iter().zip(energies) {
            if let Some(agent) = self.agents.get_mut(&request.agent) {
                agent.set_energy_delta(de);
            }
        }
        metrics.evaluated = requests.len() as u32;
        metrics.evaluation_us = started.elapsed().as_micros() as u64;
    }

    /// Serial commit in insertion order.
    fn commit(&mut self, metrics: &mut TickMetrics) {
        let range = self.config.hopping_range;
        for agent in self.agents.values_mut() {
            if let Some(future) = agent.future() {
                if let Some(Occupant::Flux(id)) = self.lattice.occupant_at(future) {
                    if let Some(drain) = self.drains.iter_mut().find(|d| d.id() == id) {
                        if drain.try_to_accept(agent, &mut self.rng) {
                            metrics.drained += 1;
                            self.removals.drained += 1;
                        }
                    }
                }
            }
            match agent.decide_future(&mut self.lattice, &mut self.rng, &self.policy) {
                MoveState::Committed => metrics.committed += 1,
                _ => metrics.rejected += 1,
            }
            match agent.complete_tick(&mut self.lattice, range) {
                Ok(TickOutcome::Detached) => {
                    debug!(agent = %agent.id(), lifetime = agent.lifetime(), "carrier detached");
                }
                Ok(TickOutcome::Alive) => {}
                Err(error) => {
                    warn!(agent = %agent.id(), %error, "removed carrier could not be detached");
                }
            }
        }
    }

    /// Offer every electron-hole pair within the encounter range to the
    /// recombination agent.
    ///
    /// Pairs are collected before any is offered; a carrier removed by an
    /// earlier pair is refused without a draw.
    pub fn perform_recombinations(&mut self, metrics: &mut TickMetrics) {
        let Some(recombination) = self.recombination.as_mut() else {
            return;
        };
        let range = recombination.encounter_range();
        recombination.guess_probability(self.tick);

        let mut pairs = Vec::new();
        for (i, electron) in self.agents.values().enumerate() {
            if electron.carrier() != Carrier::Electron || electron.is_removed() {
                continue;
            }
            for site in self.lattice.neighbours(electron.site(), range) {
                if self.lattice.species_at(site) != Species::Hole {
                    continue;
                }
                if let Some(Occupant::Charge(id)) = self.lattice.occupant_at(site) {
                    if let Some(j) = self.agents.get_index_of(&id) {
                        pairs.push((i, j));
                    }
                }
            }
        }
        if pairs.is_empty() {
            return;
        }

        let mut agents: Vec<&mut ChargeAgent> = self.agents.values_mut().collect();
        for (i, j) in pairs {
            let (electron, hole) = pair_mut(&mut agents, i, j);
            if recombination.try_to_accept(electron, hole, &mut self.rng) {
                metrics.recombined += 1;
                self.removals.recombined += 2;
            }
        }
    }

    /// Detach any removed carrier still on the lattice and drop all
    /// removed carriers, recording their counters.
    fn sweep_removed(&mut self) {
        let lattice = &mut self.lattice;
        let removals = &mut self.removals;
        self.agents.retain(|_, agent| {
            if !agent.is_removed() {
                return true;
            }
            if lattice.occupant_at(agent.site()) == Some(Occupant::Charge(agent.id())) {
                if let Err(error) = agent.detach(lattice) {
                    warn!(agent = %agent.id(), %error, "removed carrier could not be detached");
                }
            }
            removals.record(agent.lifetime(), agent.pathlength());
            false
        });
    }

    /// Inject compensating carriers from the first source of the scarcer
    /// carrier until electron and hole counts match.
    ///
    /// Attempts are not counted against the source. Returns the number of
    /// carriers placed.
    pub fn balance_charges(&mut self) -> u32 {
        let electrons = self.lattice.count(Species::Electron);
        let holes = self.lattice.count(Species::Hole);
        let (carrier, deficit) = match electrons.cmp(&holes) {
            Ordering::Greater => (Carrier::Hole, electrons - holes),
            Ordering::Less => (Carrier::Electron, holes - electrons),
            Ordering::Equal => return 0,
        };
        let Some(idx) = self.sources.iter().position(|s| s.carrier() == carrier) else {
            return 0;
        };
        let range = self.config.hopping_range;
        let mut placed = 0;
        for _ in 0..deficit {
            if !self.below_cap(carrier) {
                break;
            }
            if let Ok(agent) = self.sources[idx].try_to_seed(
                &mut self.lattice,
                &mut self.rng,
                self.next_id,
                range,
                None,
            ) {
                self.insert(agent);
                placed += 1;
            }
        }
        placed
    }

    /// Start a new rate window on every flux and recombination agent.
    pub fn store_last(&mut self) {
        let tick = self.tick;
        for s in &mut self.sources {
            s.store_last(tick);
        }
        for d in &mut self.drains {
            d.store_last(tick);
        }
        if let Some(r) = &mut self.recombination {
            r.store_last(tick);
        }
    }

    fn report_progress(&self) {
        info!(
            tick = self.tick.0,
            electrons = self.lattice.count(Species::Electron),
            holes = self.lattice.count(Species::Hole),
            drained = self.removals.drained,
            recombined = self.removals.recombined,
            mean_lifetime = ?self.removals.mean_lifetime(),
            mean_pathlength = ?self.removals.mean_pathlength(),
            "progress"
        );
        for s in &self.sources {
            info!(
                source = %s.id(),
                carrier = %s.carrier(),
                rate = ?rate_per_tick(s.counters(), s.last(), self.tick),
                "injection rate"
            );
        }
        for d in &self.drains {
            info!(
                drain = %d.id(),
                carrier = %d.carrier(),
                rate = ?rate_per_tick(d.counters(), d.last(), self.tick),
                "extraction rate"
            );
        }
    }

    // ── Checkpoints ──────────────────────────────────────────────

    /// Capture the mutable state of the run.
    pub fn checkpoint(&self) -> Checkpoint {
        let flux = |counters, last| FluxRecord { counters, last };
        Checkpoint {
            tick: self.tick,
            next_id: self.next_id,
            carriers: self
                .agents
                .values()
                .map(|a| CarrierRecord {
                    id: a.id(),
                    carrier: a.carrier(),
                    site: a.site(),
                    lifetime: a.lifetime(),
                    pathlength: a.pathlength(),
                })
                .collect(),
            defects: self.lattice.occupied_sites(Species::Defect),
            sources: self
                .sources
                .iter()
                .map(|s| flux(*s.counters(), *s.last()))
                .collect(),
            drains: self
                .drains
                .iter()
                .map(|d| flux(*d.counters(), *d.last()))
                .collect(),
            recombination: self.recombination.as_ref().map(|r| RecombinationRecord {
                counters: *r.counters(),
                last: *r.last(),
                probability: r.probability(),
            }),
            removals: self.removals,
            rng: self.rng.state(),
        }
    }

    /// Rebuild a run from `config` and resume it at `checkpoint`.
    ///
    /// Setup is replayed from the checkpoint's seed so defects, traps, and
    /// disorder come out identical; carriers and counters are then loaded
    /// and the random stream is moved to the recorded position.
    ///
    /// # Errors
    ///
    /// - [`RestoreError::ReproducibilityViolation`] if `config.seed`
    ///   names a different seed, or the stream cannot be repositioned.
    /// - [`RestoreError::Mismatch`] if the rebuilt setup does not match
    ///   the checkpoint's defects, flux agents, or identifiers.
    /// - [`RestoreError::Config`] / [`RestoreError::Occupancy`] for an
    ///   invalid configuration or an unplaceable carrier.
    pub fn restore(
        mut config: SimulationConfig,
        checkpoint: &Checkpoint,
        backend: Option<Box<dyn CoulombBackend>>,
    ) -> Result<Self, RestoreError> {
        let recorded = checkpoint.rng.seed;
        match config.seed {
            Some(seed) => {
                let resolved = RandomService::new(seed).seed();
                if resolved != recorded {
                    return Err(RestoreError::ReproducibilityViolation {
                        reason: format!(
                            "configured seed {resolved} differs from checkpoint seed {recorded}"
                        ),
                    });
                }
            }
            None => config.seed = Some(recorded),
        }

        let mut sim = Self::build(config, backend)?;
        let defects = sim.lattice.occupied_sites(Species::Defect);
        if defects != checkpoint.defects {
            return Err(RestoreError::Mismatch {
                reason: format!(
                    "setup placed {} defects, checkpoint records {}",
                    defects.len(),
                    checkpoint.defects.len()
                ),
            });
        }
        if sim.sources.len() != checkpoint.sources.len()
            || sim.drains.len() != checkpoint.drains.len()
        {
            return Err(RestoreError::Mismatch {
                reason: "flux agent counts differ from configuration".to_string(),
            });
        }
        if sim.recombination.is_some() != checkpoint.recombination.is_some() {
            return Err(RestoreError::Mismatch {
                reason: "recombination enabled in only one of configuration and checkpoint"
                    .to_string(),
            });
        }

        for (s, r) in sim.sources.iter_mut().zip(&checkpoint.sources) {
            s.restore_counters(r.counters, r.last);
        }
        for (d, r) in sim.drains.iter_mut().zip(&checkpoint.drains) {
            d.restore_counters(r.counters, r.last);
        }
        if let (Some(agent), Some(r)) = (sim.recombination.as_mut(), checkpoint.recombination) {
            agent.restore_state(r.counters, r.last, r.probability);
        }

        let range = sim.config.hopping_range;
        for c in &checkpoint.carriers {
            if c.id >= checkpoint.next_id || sim.agents.contains_key(&c.id) {
                return Err(RestoreError::Mismatch {
                    reason: format!("carrier id {} is duplicated or not yet issued", c.id),
                });
            }
            let agent = ChargeAgent::restore(
                &mut sim.lattice,
                c.id,
                c.carrier,
                c.site,
                range,
                c.lifetime,
                c.pathlength,
            )?;
            sim.agents.insert(c.id, agent);
        }
        sim.next_id = checkpoint.next_id;
        sim.tick = checkpoint.tick;
        sim.removals = checkpoint.removals;
        sim.rng = RandomService::restore(checkpoint.rng)?;

        info!(
            tick = sim.tick.0,
            carriers = sim.agents.len(),
            seed = recorded,
            "restored from checkpoint"
        );
        Ok(sim)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FluxSpec;
    use hopper_lattice::Dimensions;

    fn small() -> SimulationConfig {
        SimulationConfig {
            dimensions: Dimensions::new(5, 4, 4),
            temperature: f64::INFINITY,
            ..Default::default()
        }
    }

    #[test]
    fn pair_mut_returns_both_orders() {
        let mut v = vec![1, 2, 3, 4];
        let (a, b) = pair_mut(&mut v, 0, 3);
        std::mem::swap(a, b);
        let (a, b) = pair_mut(&mut v, 2, 1);
        assert_eq!((*a, *b), (3, 2));
        assert_eq!(v, vec![4, 2, 3, 1]);
    }

    #[test]
    fn sample_sites_is_distinct_and_bounded() {
        let mut rng = RandomService::new(2);
        let pool: Vec<SiteId> = (0..10).map(SiteId).collect();
        let mut picked = sample_sites(&mut rng, pool, 25);
        assert_eq!(picked.len(), 10);
        picked.sort();
        picked.dedup();
        assert_eq!(picked.len(), 10);
    }

    #[test]
    fn random_defects_cover_fraction() {
        let cfg = SimulationConfig {
            defects: DefectConfig {
                fraction: 0.1,
                ..Default::default()
            },
            ..small()
        };
        let sim = Simulation::new(cfg, None).unwrap();
        assert_eq!(sim.lattice().count(Species::Defect), 8);
    }

    #[test]
    fn seed_charges_respects_fraction_and_sources() {
        let cfg = SimulationConfig {
            sources: vec![FluxSpec::face(Carrier::Hole, Face::Left, 0.0)],
            max_holes: 20,
            max_electrons: 20,
            seed_fraction: 0.5,
            ..small()
        };
        let sim = Simulation::new(cfg, None).unwrap();
        assert_eq!(sim.carrier_count(Carrier::Hole), 10);
        assert_eq!(sim.carrier_count(Carrier::Electron), 0);
    }

    #[test]
    fn caps_stop_injection() {
        let cfg = SimulationConfig {
            sources: vec![FluxSpec::face(Carrier::Electron, Face::Left, 1.0)],
            max_electrons: 3,
            ..small()
        };
        let mut sim = Simulation::new(cfg, None).unwrap();
        sim.perform_iterations(30);
        assert!(sim.carrier_count(Carrier::Electron) <= 3);
        assert_eq!(sim.carrier_count(Carrier::Electron), 3);
    }

    #[test]
    fn batch_without_backend_evaluates_locally() {
        let cfg = SimulationConfig {
            evaluator: EvaluatorKind::Batch,
            ..small()
        };
        let sim = Simulation::new(cfg, None).unwrap();
        assert_eq!(sim.evaluator_name(), "local");
    }

    #[test]
    fn oversized_hopping_range_covers_the_lattice() {
        let cfg = SimulationConfig {
            hopping_range: 10_000,
            sources: vec![FluxSpec::face(Carrier::Electron, Face::Left, 1.0)],
            max_electrons: 5,
            ..small()
        };
        let mut sim = Simulation::new(cfg, None).unwrap();
        // 79 other interior sites plus the source slot.
        assert_eq!(sim.lattice().neighbours(SiteId(0), 10_000).len(), 80);
        assert_eq!(sim.sources()[0].targets().len(), 80);
        sim.perform_iterations(20);
        assert!(sim.carrier_count(Carrier::Electron) <= 5);
        assert!(sim.sources()[0].counters().successes() > 0);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let cfg = SimulationConfig {
            hopping_range: 0,
            ..small()
        };
        assert_eq!(
            Simulation::new(cfg, None).unwrap_err(),
            ConfigError::InvalidHoppingRange
        );
    }
}
