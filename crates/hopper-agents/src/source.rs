//! Carrier injectors.

use hopper_core::{
    AgentId, Carrier, ConfigError, FluxId, OccupancyError, RandomService, SiteId, Species, TickId,
};
use hopper_lattice::Lattice;

use crate::charge::ChargeAgent;
use crate::flux::{bind, check_probability, FluxBinding, FluxCounters, FluxSnapshot};

/// How a source decides whether to inject.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SourceMode {
    /// Accept with the configured constant probability.
    #[default]
    Constant,
    /// Constant probability, then a Metropolis test on the energy change
    /// of moving a carrier from the source's reference potential onto the
    /// target site.
    Metropolis,
}

/// Injects carriers of one kind into the sites next to its binding.
#[derive(Clone, Debug)]
pub struct SourceAgent {
    id: FluxId,
    carrier: Carrier,
    binding: FluxBinding,
    site: SiteId,
    targets: Vec<SiteId>,
    probability: f64,
    mode: SourceMode,
    reference: f64,
    counters: FluxCounters,
    last: FluxSnapshot,
}

impl SourceAgent {
    /// Bind a new source to the lattice.
    ///
    /// Injection targets are the interior sites within `range` of the
    /// binding: the boundary layer for a face, the surrounding box for an
    /// interior site.
    ///
    /// # Errors
    ///
    /// [`ConfigError`] if the probability is outside `[0, 1]` or the
    /// binding cannot be reserved.
    pub fn register(
        lattice: &mut Lattice,
        id: FluxId,
        carrier: Carrier,
        binding: FluxBinding,
        probability: f64,
        mode: SourceMode,
        range: u32,
    ) -> Result<Self, ConfigError> {
        check_probability("source probability", probability)?;
        let site = bind(lattice, id, Species::Source, binding)?;
        let targets = lattice
            .neighbours(site, range)
            .into_iter()
            .filter(|&s| lattice.is_interior(s))
            .collect();
        Ok(Self {
            id,
            carrier,
            binding,
            site,
            targets,
            probability,
            mode,
            reference: 0.0,
            counters: FluxCounters::default(),
            last: FluxSnapshot::default(),
        })
    }

    /// Identifier.
    pub fn id(&self) -> FluxId {
        self.id
    }

    /// Carrier this source creates.
    pub fn carrier(&self) -> Carrier {
        self.carrier
    }

    /// Face or site binding.
    pub fn binding(&self) -> FluxBinding {
        self.binding
    }

    /// The special or interior site the source occupies.
    pub fn site(&self) -> SiteId {
        self.site
    }

    /// Interior sites the source can inject into.
    pub fn targets(&self) -> &[SiteId] {
        &self.targets
    }

    /// Acceptance mode.
    pub fn mode(&self) -> SourceMode {
        self.mode
    }

    /// Potential (V) a carrier leaves when it is injected, such as the
    /// electrode voltage of a face. Default: 0.
    pub fn reference_potential(&self) -> f64 {
        self.reference
    }

    /// Set the reference potential for energy-sensitive injection.
    pub fn set_reference_potential(&mut self, volts: f64) {
        self.reference = volts;
    }

    /// Attempt/success counters.
    pub fn counters(&self) -> &FluxCounters {
        &self.counters
    }

    /// Replace the counters and rate window, e.g. from a checkpoint.
    pub fn restore_counters(&mut self, counters: FluxCounters, last: FluxSnapshot) {
        self.counters = counters;
        self.last = last;
    }

    /// The snapshot taken by the last [`store_last`](Self::store_last).
    pub fn last(&self) -> &FluxSnapshot {
        &self.last
    }

    /// Start a new rate window at `tick`.
    pub fn store_last(&mut self, tick: TickId) {
        self.last = self.counters.snapshot(tick);
    }

    /// A random injection target.
    pub fn choose_site(&self, rng: &mut RandomService) -> Option<SiteId> {
        rng.choose(&self.targets).copied()
    }

    /// `true` if `site` is an empty interior site.
    pub fn valid_to_inject(&self, lattice: &Lattice, site: SiteId) -> bool {
        lattice.is_empty(site)
    }

    fn check_site(&self, lattice: &Lattice, site: SiteId) -> Result<(), OccupancyError> {
        if self.valid_to_inject(lattice, site) {
            return Ok(());
        }
        if !lattice.contains(site) {
            Err(OccupancyError::OutOfRange { site })
        } else if lattice.is_special(site) {
            Err(OccupancyError::SpecialSite { site })
        } else {
            Err(OccupancyError::Occupied {
                site,
                species: lattice.species_at(site),
            })
        }
    }

    /// One injection attempt. Every call counts as an attempt.
    ///
    /// `energy` is asked for the energy change of placing the carrier on
    /// the candidate site, given the reference potential, only in
    /// [`SourceMode::Metropolis`].
    ///
    /// Returns `Ok(Some(agent))` on injection, `Ok(None)` if the acceptance
    /// test refused, and `Err` if the chosen site was not valid.
    pub fn try_to_inject(
        &mut self,
        lattice: &mut Lattice,
        rng: &mut RandomService,
        next_id: AgentId,
        range: u32,
        inv_kt: f64,
        energy: impl FnOnce(&Lattice, SiteId, f64) -> f64,
    ) -> Result<Option<ChargeAgent>, OccupancyError> {
        let Some(site) = self.choose_site(rng) else {
            self.counters.record(false);
            return Err(OccupancyError::NoTargets { flux: self.id });
        };
        if let Err(e) = self.check_site(lattice, site) {
            self.counters.record(false);
            return Err(e);
        }
        let accepted = rng.choose_yes(self.probability)
            && match self.mode {
                SourceMode::Constant => true,
                SourceMode::Metropolis => {
                    rng.metropolis(energy(&*lattice, site, self.reference), inv_kt)
                }
            };
        if !accepted {
            self.counters.record(false);
            return Ok(None);
        }
        match ChargeAgent::register(lattice, next_id, self.carrier, site, range) {
            Ok(agent) => {
                self.counters.record(true);
                Ok(Some(agent))
            }
            Err(e) => {
                self.counters.record(false);
                Err(e)
            }
        }
    }

    /// Place a carrier without an acceptance test or counting.
    ///
    /// Uses `site` if given, otherwise a random target.
    pub fn try_to_seed(
        &self,
        lattice: &mut Lattice,
        rng: &mut RandomService,
        next_id: AgentId,
        range: u32,
        site: Option<SiteId>,
    ) -> Result<ChargeAgent, OccupancyError> {
        let site = match site {
            Some(s) => s,
            None => self
                .choose_site(rng)
                .ok_or(OccupancyError::NoTargets { flux: self.id })?,
        };
        self.check_site(lattice, site)?;
        ChargeAgent::register(lattice, next_id, self.carrier, site, range)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hopper_core::Face;
    use hopper_lattice::Dimensions;

    fn lattice() -> Lattice {
        Lattice::new(Dimensions::new(4, 3, 3), 2).unwrap()
    }

    fn left_source(l: &mut Lattice, p: f64, mode: SourceMode) -> SourceAgent {
        SourceAgent::register(
            l,
            FluxId(0),
            Carrier::Electron,
            FluxBinding::Face(Face::Left),
            p,
            mode,
            1,
        )
        .unwrap()
    }

    #[test]
    fn face_source_targets_boundary_layer() {
        let mut l = lattice();
        let s = left_source(&mut l, 1.0, SourceMode::Constant);
        assert_eq!(s.targets().len(), 9);
        assert!(s.targets().iter().all(|&t| l.index_to_x(t) == 0));
        assert!(l.is_special(s.site()));
    }

    #[test]
    fn certain_injection_places_carrier() {
        let mut l = lattice();
        let mut s = left_source(&mut l, 1.0, SourceMode::Constant);
        let mut rng = RandomService::new(8);
        let agent = s
            .try_to_inject(&mut l, &mut rng, AgentId(0), 1, 0.0, |_, _, _| 0.0)
            .unwrap()
            .unwrap();
        assert_eq!(agent.carrier(), Carrier::Electron);
        assert_eq!(l.species_at(agent.site()), Species::Electron);
        assert_eq!((s.counters().attempts(), s.counters().successes()), (1, 1));
    }

    #[test]
    fn invalid_site_still_counts_attempt() {
        let mut l = lattice();
        let mut s = left_source(&mut l, 1.0, SourceMode::Constant);
        for t in s.targets().to_vec() {
            l.register_defect(t).unwrap();
        }
        let mut rng = RandomService::new(8);
        let err = s
            .try_to_inject(&mut l, &mut rng, AgentId(0), 1, 0.0, |_, _, _| 0.0)
            .unwrap_err();
        assert!(matches!(err, OccupancyError::Occupied { species: Species::Defect, .. }));
        assert_eq!((s.counters().attempts(), s.counters().successes()), (1, 0));
    }

    #[test]
    fn zero_probability_never_injects() {
        let mut l = lattice();
        let mut s = left_source(&mut l, 0.0, SourceMode::Constant);
        let mut rng = RandomService::new(8);
        for i in 0..50 {
            let r = s.try_to_inject(&mut l, &mut rng, AgentId(i), 1, 0.0, |_, _, _| 0.0);
            assert!(matches!(r, Ok(None)));
        }
        assert_eq!(s.counters().attempts(), 50);
        assert_eq!(l.count(Species::Electron), 0);
    }

    #[test]
    fn metropolis_mode_consults_energy() {
        let mut l = lattice();
        let mut s = left_source(&mut l, 1.0, SourceMode::Metropolis);
        let mut rng = RandomService::new(8);
        for i in 0..20 {
            let r = s.try_to_inject(&mut l, &mut rng, AgentId(i), 1, 40.0, |_, _, _| 10.0);
            assert!(matches!(r, Ok(None)));
        }
        let r = s.try_to_inject(&mut l, &mut rng, AgentId(99), 1, 40.0, |_, _, _| -1.0);
        assert!(matches!(r, Ok(Some(_))));
    }

    #[test]
    fn metropolis_energy_sees_reference_potential() {
        let mut l = lattice();
        let mut s = left_source(&mut l, 1.0, SourceMode::Metropolis);
        s.set_reference_potential(0.5);
        let mut rng = RandomService::new(8);
        let mut seen = None;
        s.try_to_inject(&mut l, &mut rng, AgentId(0), 1, 40.0, |_, _, v| {
            seen = Some(v);
            0.0
        })
        .unwrap();
        assert_eq!(seen, Some(0.5));
    }

    #[test]
    fn source_without_targets_reports_itself() {
        let mut l = Lattice::new(Dimensions::new(1, 1, 1), 1).unwrap();
        let mut s = SourceAgent::register(
            &mut l,
            FluxId(4),
            Carrier::Hole,
            FluxBinding::Site(SiteId(0)),
            1.0,
            SourceMode::Constant,
            1,
        )
        .unwrap();
        assert!(s.targets().is_empty());
        let mut rng = RandomService::new(8);
        let err = s
            .try_to_inject(&mut l, &mut rng, AgentId(0), 1, 0.0, |_, _, _| 0.0)
            .unwrap_err();
        assert_eq!(err, OccupancyError::NoTargets { flux: FluxId(4) });
        assert_eq!((s.counters().attempts(), s.counters().successes()), (1, 0));
        assert!(matches!(
            s.try_to_seed(&mut l, &mut rng, AgentId(0), 1, None),
            Err(OccupancyError::NoTargets { .. })
        ));
    }

    #[test]
    fn seeding_skips_acceptance_but_checks_site() {
        let mut l = lattice();
        let s = left_source(&mut l, 0.0, SourceMode::Constant);
        let mut rng = RandomService::new(8);
        let inner = l.site_index(2, 1, 1);
        let a = s
            .try_to_seed(&mut l, &mut rng, AgentId(0), 1, Some(inner))
            .unwrap();
        assert_eq!(a.site(), inner);
        assert!(s
            .try_to_seed(&mut l, &mut rng, AgentId(1), 1, Some(inner))
            .is_err());
        assert!(s
            .try_to_seed(&mut l, &mut rng, AgentId(1), 1, Some(s.site()))
            .is_err());
        assert_eq!(s.counters().attempts(), 0);
    }

    #[test]
    fn rejects_bad_probability() {
        let mut l = lattice();
        assert!(matches!(
            SourceAgent::register(
                &mut l,
                FluxId(0),
                Carrier::Hole,
                FluxBinding::Face(Face::Right),
                1.5,
                SourceMode::Constant,
                1
            ),
            Err(ConfigError::InvalidProbability { .. })
        ));
    }

    #[test]
    fn store_last_opens_window() {
        let mut l = lattice();
        let mut s = left_source(&mut l, 1.0, SourceMode::Constant);
        let mut rng = RandomService::new(8);
        s.try_to_inject(&mut l, &mut rng, AgentId(0), 1, 0.0, |_, _, _| 0.0)
            .unwrap();
        s.store_last(TickId(5));
        assert_eq!(s.last().attempts, 1);
        assert_eq!(s.last().tick, TickId(5));
    }
}
