//! Simulation configuration and validation.
//!
//! [`SimulationConfig`] is the immutable parameter bundle for one run.
//! [`validate()`](SimulationConfig::validate) checks every structural and
//! numeric invariant before any lattice is built; the simulation
//! constructor calls it first.

use hopper_agents::{AxisCoupling, FluxBinding, SourceMode};
use hopper_core::{Carrier, ConfigError, Face, SiteId, Species};
use hopper_lattice::Dimensions;
use hopper_potential::{coulomb_prefactor, inverse_kt, FieldParams, Kernel};
use indexmap::IndexMap;

// ── FluxSpec ──────────────────────────────────────────────────────

/// One source or drain to create at setup.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FluxSpec {
    /// Carrier injected or absorbed.
    pub carrier: Carrier,
    /// Face or interior site.
    pub binding: FluxBinding,
    /// Constant acceptance probability in `[0, 1]`.
    pub probability: f64,
    /// Injection mode. Ignored for drains.
    pub mode: SourceMode,
}

impl FluxSpec {
    /// A constant-probability agent bound to `face`.
    pub fn face(carrier: Carrier, face: Face, probability: f64) -> Self {
        Self {
            carrier,
            binding: FluxBinding::Face(face),
            probability,
            mode: SourceMode::Constant,
        }
    }

    /// A constant-probability agent bound to an interior site.
    pub fn site(carrier: Carrier, site: SiteId, probability: f64) -> Self {
        Self {
            carrier,
            binding: FluxBinding::Site(site),
            probability,
            mode: SourceMode::Constant,
        }
    }
}

// ── ElectrostaticsConfig ──────────────────────────────────────────

/// Pairwise interaction settings.
#[derive(Clone, Debug, PartialEq)]
pub struct ElectrostaticsConfig {
    /// Include carrier-carrier Coulomb interactions. Default: true.
    pub coulomb: bool,
    /// Include image charges in the left electrode. Default: false.
    pub image_charges: bool,
    /// Image-charge scale. Default: -1 (metal electrode).
    pub image_factor: f64,
    /// Relative permittivity. Default: 3.5.
    pub dielectric: f64,
    /// Lattice spacing in nanometres. Default: 1.0.
    pub grid_spacing_nm: f64,
    /// Gaussian charge width in lattice units; `None` uses point charges.
    pub gaussian_sigma: Option<f64>,
}

impl Default for ElectrostaticsConfig {
    fn default() -> Self {
        Self {
            coulomb: true,
            image_charges: false,
            image_factor: -1.0,
            dielectric: 3.5,
            grid_spacing_nm: 1.0,
            gaussian_sigma: None,
        }
    }
}

impl ElectrostaticsConfig {
    /// Kernel parameters for the potential field.
    pub fn field_params(&self) -> FieldParams {
        FieldParams {
            coulomb_prefactor: coulomb_prefactor(self.dielectric, self.grid_spacing_nm),
            image_factor: self.image_factor,
            gaussian_sigma: self.gaussian_sigma.unwrap_or(1.0),
        }
    }

    /// Pair kernel selected by `gaussian_sigma`.
    pub fn kernel(&self) -> Kernel {
        match self.gaussian_sigma {
            Some(_) => Kernel::Gaussian,
            None => Kernel::Point,
        }
    }
}

// ── FieldConfig ───────────────────────────────────────────────────

/// Externally applied background potential.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FieldConfig {
    /// Potential at the left electrode (V).
    pub voltage_left: f64,
    /// Potential at the right electrode (V).
    pub voltage_right: f64,
    /// Gate potential at the bottom face (V).
    pub gate_voltage: f64,
    /// Explicit trap sites.
    pub trap_sites: Vec<SiteId>,
    /// Fraction of interior sites made traps at random, in `[0, 1]`.
    pub trap_fraction: f64,
    /// Potential shift applied at each trap (V).
    pub trap_depth: f64,
    /// Gaussian energetic disorder `(mean, sigma)` in volts.
    pub disorder: Option<(f64, f64)>,
}

// ── DefectConfig ──────────────────────────────────────────────────

/// Immobile defects placed at setup.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DefectConfig {
    /// Explicit defect sites.
    pub sites: Vec<SiteId>,
    /// Fraction of remaining empty interior sites made defects at random.
    pub fraction: f64,
    /// Charge of each defect in elementary charges. Default: 0.
    pub charge: f64,
}

// ── RecombinationConfig ───────────────────────────────────────────

/// Electron-hole recombination.
#[derive(Clone, Debug, PartialEq)]
pub struct RecombinationConfig {
    /// Target recombinations per tick.
    pub target_rate: f64,
    /// Encounter radius in lattice steps. Default: 1 (adjacent sites).
    pub encounter_range: u32,
    /// Probability used before the first estimate. Default: 1.0.
    pub initial_probability: f64,
}

impl Default for RecombinationConfig {
    fn default() -> Self {
        Self {
            target_rate: 1.0,
            encounter_range: 1,
            initial_probability: 1.0,
        }
    }
}

// ── EvaluatorKind ─────────────────────────────────────────────────

/// Which energy evaluator a run prefers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum EvaluatorKind {
    /// Parallel evaluation on the local thread pool.
    #[default]
    Local,
    /// Delegate batches to an external backend, falling back to local.
    Batch,
}

// ── SimulationConfig ──────────────────────────────────────────────

/// Complete parameter bundle for one run.
#[derive(Clone, Debug, PartialEq)]
pub struct SimulationConfig {
    /// Lattice extents. Default: 10 x 10 x 10.
    pub dimensions: Dimensions,
    /// Maximum per-axis hop length. Default: 1.
    pub hopping_range: u32,
    /// Reserved special slots for face-bound flux agents. Default: 6.
    pub max_special: u32,
    /// Temperature in kelvin; infinite means every hop is accepted. Default: 300.
    pub temperature: f64,
    /// Explicit `1 / kT` in 1/eV, overriding `temperature`.
    pub inv_kt: Option<f64>,
    /// Per-axis coupling for the coupled Metropolis test.
    pub coupling: Option<AxisCoupling>,
    /// Interaction settings.
    pub electrostatics: ElectrostaticsConfig,
    /// Applied fields, traps, and disorder.
    pub field: FieldConfig,
    /// Sources, created in order with `FluxId(0..)`.
    pub sources: Vec<FluxSpec>,
    /// Drains, numbered after the sources.
    pub drains: Vec<FluxSpec>,
    /// Recombination, if enabled.
    pub recombination: Option<RecombinationConfig>,
    /// Defects.
    pub defects: DefectConfig,
    /// Electron cap; injection pauses at the cap. Default: 1000.
    pub max_electrons: usize,
    /// Hole cap. Default: 1000.
    pub max_holes: usize,
    /// Fraction of each cap seeded at setup for carriers with a source.
    pub seed_fraction: f64,
    /// Reinject from sources when electron and hole counts drift apart.
    pub balance_charges: bool,
    /// RNG seed; `None` seeds from the clock.
    pub seed: Option<u64>,
    /// Ticks between progress log lines and rate windows; 0 disables.
    pub print_interval: u64,
    /// Preferred energy evaluator.
    pub evaluator: EvaluatorKind,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            dimensions: Dimensions::new(10, 10, 10),
            hopping_range: 1,
            max_special: 6,
            temperature: 300.0,
            inv_kt: None,
            coupling: None,
            electrostatics: ElectrostaticsConfig::default(),
            field: FieldConfig::default(),
            sources: Vec::new(),
            drains: Vec::new(),
            recombination: None,
            defects: DefectConfig::default(),
            max_electrons: 1000,
            max_holes: 1000,
            seed_fraction: 0.0,
            balance_charges: false,
            seed: Some(1),
            print_interval: 0,
            evaluator: EvaluatorKind::Local,
        }
    }
}

fn probability(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::InvalidProbability { name, value })
    }
}

fn positive(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidParameter {
            name,
            reason: format!("must be finite and positive, got {value}"),
        })
    }
}

fn finite(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::InvalidParameter {
            name,
            reason: format!("must be finite, got {value}"),
        })
    }
}

impl SimulationConfig {
    /// Resolved `1 / kT` in 1/eV.
    pub fn resolved_inv_kt(&self) -> f64 {
        self.inv_kt.unwrap_or_else(|| inverse_kt(self.temperature))
    }

    /// Cap for `carrier`.
    pub fn cap(&self, carrier: Carrier) -> usize {
        match carrier {
            Carrier::Electron => self.max_electrons,
            Carrier::Hole => self.max_holes,
        }
    }

    /// Validate every invariant.
    pub fn validate(&self) -> Result<(), ConfigError> {
        // 1. Lattice shape.
        let d = self.dimensions;
        if d.x == 0 || d.y == 0 || d.z == 0 {
            return Err(ConfigError::EmptyLattice);
        }
        let sites = d.volume() + u64::from(self.max_special);
        if sites > u64::from(u32::MAX) {
            return Err(ConfigError::LatticeTooLarge { sites });
        }
        if self.hopping_range == 0 {
            return Err(ConfigError::InvalidHoppingRange);
        }

        // 2. Temperature and acceptance.
        if self.temperature.is_nan() || self.temperature <= 0.0 {
            return Err(ConfigError::InvalidParameter {
                name: "temperature",
                reason: format!("must be positive, got {}", self.temperature),
            });
        }
        if let Some(v) = self.inv_kt {
            if !(v.is_finite() && v >= 0.0) {
                return Err(ConfigError::InvalidParameter {
                    name: "inv_kt",
                    reason: format!("must be finite and non-negative, got {v}"),
                });
            }
        }
        if let Some(c) = self.coupling {
            probability("coupling x", c.x)?;
            probability("coupling y", c.y)?;
            probability("coupling z", c.z)?;
        }

        // 3. Electrostatics.
        let e = &self.electrostatics;
        positive("dielectric", e.dielectric)?;
        positive("grid_spacing_nm", e.grid_spacing_nm)?;
        finite("image_factor", e.image_factor)?;
        if let Some(sigma) = e.gaussian_sigma {
            positive("gaussian_sigma", sigma)?;
        }

        // 4. Fields.
        let f = &self.field;
        finite("voltage_left", f.voltage_left)?;
        finite("voltage_right", f.voltage_right)?;
        finite("gate_voltage", f.gate_voltage)?;
        finite("trap_depth", f.trap_depth)?;
        probability("trap_fraction", f.trap_fraction)?;
        if let Some((mean, sigma)) = f.disorder {
            finite("disorder mean", mean)?;
            if !(sigma.is_finite() && sigma >= 0.0) {
                return Err(ConfigError::InvalidParameter {
                    name: "disorder sigma",
                    reason: format!("must be finite and non-negative, got {sigma}"),
                });
            }
        }
        let volume = d.volume() as u32;
        for &site in &f.trap_sites {
            if site.0 >= volume {
                return Err(ConfigError::SiteOutOfRange { site });
            }
        }

        // 5. Flux agents: probabilities, special slots, and site claims.
        for s in &self.sources {
            probability("source probability", s.probability)?;
        }
        for s in &self.drains {
            probability("drain probability", s.probability)?;
        }
        let mut claims: IndexMap<SiteId, Species> = IndexMap::new();
        let mut face_bound = 0u32;
        let tagged = self
            .sources
            .iter()
            .map(|s| (s, Species::Source))
            .chain(self.drains.iter().map(|s| (s, Species::Drain)));
        for (spec, species) in tagged {
            match spec.binding {
                FluxBinding::Face(face) => {
                    face_bound += 1;
                    if face_bound > self.max_special {
                        return Err(ConfigError::SpecialSlotsExhausted {
                            reserved: self.max_special,
                            face,
                        });
                    }
                }
                FluxBinding::Site(site) => {
                    if site.0 >= volume {
                        return Err(ConfigError::SiteOutOfRange { site });
                    }
                    if let Some(&existing) = claims.get(&site) {
                        return Err(ConfigError::ConflictingReservation { site, existing });
                    }
                    claims.insert(site, species);
                }
            }
        }

        // 6. Defects.
        probability("defect fraction", self.defects.fraction)?;
        finite("defect charge", self.defects.charge)?;
        for &site in &self.defects.sites {
            if site.0 >= volume {
                return Err(ConfigError::SiteOutOfRange { site });
            }
            if let Some(&existing) = claims.get(&site) {
                return Err(ConfigError::ConflictingReservation { site, existing });
            }
            claims.insert(site, Species::Defect);
        }

        // 7. Recombination, seeding.
        if let Some(r) = &self.recombination {
            if !(r.target_rate.is_finite() && r.target_rate >= 0.0) {
                return Err(ConfigError::InvalidParameter {
                    name: "recombination target rate",
                    reason: format!("must be finite and non-negative, got {}", r.target_rate),
                });
            }
            probability("recombination probability", r.initial_probability)?;
        }
        probability("seed_fraction", self.seed_fraction)?;
        Ok(())
    }
}
