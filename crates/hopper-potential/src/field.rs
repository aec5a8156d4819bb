//! Pairwise Coulomb potentials over a charge snapshot.

use hopper_core::{ConfigError, SiteId, Species};
use hopper_lattice::{Dimensions, Lattice};

use crate::tables::{DistanceTable, DistanceTables};

/// Positions of every charge on the lattice at one instant.
///
/// Built once per tick before evaluation and shared read-only by all
/// evaluators. Sites are in index order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ChargeSnapshot {
    /// Sites holding electrons.
    pub electrons: Vec<SiteId>,
    /// Sites holding holes.
    pub holes: Vec<SiteId>,
    /// Sites holding defects.
    pub defects: Vec<SiteId>,
    /// Charge carried by each defect (0 for neutral defects).
    pub defect_charge: f64,
}

impl ChargeSnapshot {
    /// Capture the charge layout of `lattice`.
    pub fn capture(lattice: &Lattice, defect_charge: f64) -> Self {
        Self {
            electrons: lattice.occupied_sites(Species::Electron),
            holes: lattice.occupied_sites(Species::Hole),
            defects: lattice.occupied_sites(Species::Defect),
            defect_charge,
        }
    }

    /// Net charge of the snapshot in elementary charges.
    pub fn net_charge(&self) -> f64 {
        self.holes.len() as f64 - self.electrons.len() as f64
            + self.defect_charge * self.defects.len() as f64
    }
}

/// Physical parameters of the potential kernels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FieldParams {
    /// Coulomb prefactor `ke` in volts at one lattice spacing.
    pub coulomb_prefactor: f64,
    /// Scale of image-charge terms. `-1` models a metal electrode.
    pub image_factor: f64,
    /// Width of the Gaussian charge cloud in lattice units.
    pub gaussian_sigma: f64,
}

impl Default for FieldParams {
    fn default() -> Self {
        Self {
            coulomb_prefactor: crate::units::coulomb_prefactor(3.5, 1.0),
            image_factor: -1.0,
            gaussian_sigma: 1.0,
        }
    }
}

impl FieldParams {
    /// Check that every parameter is finite and the width positive.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.coulomb_prefactor.is_finite() || self.coulomb_prefactor < 0.0 {
            return Err(ConfigError::InvalidParameter {
                name: "coulomb_prefactor",
                reason: format!("must be finite and non-negative, got {}", self.coulomb_prefactor),
            });
        }
        if !self.image_factor.is_finite() {
            return Err(ConfigError::InvalidParameter {
                name: "image_factor",
                reason: format!("must be finite, got {}", self.image_factor),
            });
        }
        if !(self.gaussian_sigma.is_finite() && self.gaussian_sigma > 0.0) {
            return Err(ConfigError::InvalidParameter {
                name: "gaussian_sigma",
                reason: format!("must be finite and positive, got {}", self.gaussian_sigma),
            });
        }
        Ok(())
    }
}

/// Point-charge or smeared-charge pair kernel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Kernel {
    /// `1 / r`.
    Point,
    /// `erf(r / (sqrt(2) sigma)) / r`.
    Gaussian,
}

/// Error function, Abramowitz and Stegun 7.1.26 (|error| < 1.5e-7).
pub fn erf(x: f64) -> f64 {
    const A1: f64 = 0.254_829_592;
    const A2: f64 = -0.284_496_736;
    const A3: f64 = 1.421_413_741;
    const A4: f64 = -1.453_152_027;
    const A5: f64 = 1.061_405_429;
    const P: f64 = 0.327_591_1;

    let sign = if x < 0.0 { -1.0 } else { 1.0 };
    let x = x.abs();
    let t = 1.0 / (1.0 + P * x);
    let poly = ((((A5 * t + A4) * t + A3) * t + A2) * t + A1) * t;
    sign * (1.0 - poly * (-x * x).exp())
}

fn gaussian_tables(tables: &DistanceTables, sigma: f64) -> (Vec<f64>, Vec<f64>) {
    let width = std::f64::consts::SQRT_2 * sigma;
    let smear = |table: &DistanceTable| {
        table
            .distances()
            .iter()
            .map(|&r| if r > 0.0 { erf(r / width) / r } else { 0.0 })
            .collect()
    };
    (smear(tables.real()), smear(tables.image()))
}

/// Precomputed pair kernels and the Coulomb sums over a snapshot.
///
/// Holds no agent positions: every query takes the [`ChargeSnapshot`] to
/// sum over. Kernel values are tabulated per displacement when the field
/// is built, so a pair term is a table lookup.
///
/// Each `*_e`, `*_h`, `*_d` method returns the potential (volts) at
/// `site` due to all electrons, holes, or defects respectively, excluding
/// a charge on `site` itself. The `*_image_*` forms add the image-charge
/// term `image_factor * ke * q / r_image`.
#[derive(Clone, Debug)]
pub struct PotentialField {
    params: FieldParams,
    tables: DistanceTables,
    gauss_real: Vec<f64>,
    gauss_image: Vec<f64>,
}

impl PotentialField {
    /// Build tables for a lattice of `dims`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidParameter`] if `params` fails
    /// [`FieldParams::validate`].
    pub fn new(dims: Dimensions, params: FieldParams) -> Result<Self, ConfigError> {
        params.validate()?;
        let tables = DistanceTables::precalculate_arrays(dims);
        let (gauss_real, gauss_image) = gaussian_tables(&tables, params.gaussian_sigma);
        Ok(Self {
            params,
            tables,
            gauss_real,
            gauss_image,
        })
    }

    /// Rebuild every table for new lattice dimensions.
    pub fn precalculate_arrays(&mut self, dims: Dimensions) {
        self.tables = DistanceTables::precalculate_arrays(dims);
        let (real, image) = gaussian_tables(&self.tables, self.params.gaussian_sigma);
        self.gauss_real = real;
        self.gauss_image = image;
    }

    /// Kernel parameters.
    pub fn params(&self) -> &FieldParams {
        &self.params
    }

    /// The distance tables.
    pub fn tables(&self) -> &DistanceTables {
        &self.tables
    }

    #[inline]
    fn gauss_slot(&self, dx: usize, dy: usize, dz: usize, nx: usize) -> usize {
        let ny = self.tables.dimensions().y as usize;
        dx + dy * nx + dz * nx * ny
    }

    /// Kernel value between two sites (0 when they coincide).
    #[inline]
    pub fn pair(&self, kernel: Kernel, a: SiteId, b: SiteId) -> f64 {
        match kernel {
            Kernel::Point => self.tables.inverse_distance(a, b),
            Kernel::Gaussian => {
                let (dx, dy, dz) = self.tables.key(a, b);
                let nx = self.tables.dimensions().x as usize;
                self.gauss_real[self.gauss_slot(dx, dy, dz, nx)]
            }
        }
    }

    /// Kernel value between `a` and the image of `b`.
    #[inline]
    pub fn image_pair(&self, kernel: Kernel, a: SiteId, b: SiteId) -> f64 {
        match kernel {
            Kernel::Point => self.tables.inverse_image_distance(a, b),
            Kernel::Gaussian => {
                let (dx, dy, dz) = self.tables.image_key(a, b);
                let nx = 2 * self.tables.dimensions().x as usize;
                self.gauss_image[self.gauss_slot(dx, dy, dz, nx)]
            }
        }
    }

    /// Potential at `site` from charges `q` on `sites`, skipping `skip`.
    ///
    /// With `image` set, each charge also contributes through its mirror.
    pub fn sum(
        &self,
        kernel: Kernel,
        image: bool,
        site: SiteId,
        sites: &[SiteId],
        q: f64,
        skip: SiteId,
    ) -> f64 {
        if q == 0.0 {
            return 0.0;
        }
        let ke = self.params.coulomb_prefactor;
        let f = self.params.image_factor;
        let mut total = 0.0;
        for &other in sites {
            if other == skip {
                continue;
            }
            total += self.pair(kernel, site, other);
            if image {
                total += f * self.image_pair(kernel, site, other);
            }
        }
        ke * q * total
    }

    /// Potential at `site` from every charge in `snap`, skipping `skip`.
    pub fn total(
        &self,
        kernel: Kernel,
        image: bool,
        site: SiteId,
        snap: &ChargeSnapshot,
        skip: SiteId,
    ) -> f64 {
        self.sum(kernel, image, site, &snap.electrons, -1.0, skip)
            + self.sum(kernel, image, site, &snap.holes, 1.0, skip)
            + self.sum(kernel, image, site, &snap.defects, snap.defect_charge, skip)
    }

    /// Electrons, point kernel.
    pub fn coulomb_e(&self, site: SiteId, snap: &ChargeSnapshot) -> f64 {
        self.sum(Kernel::Point, false, site, &snap.electrons, -1.0, site)
    }

    /// Holes, point kernel.
    pub fn coulomb_h(&self, site: SiteId, snap: &ChargeSnapshot) -> f64 {
        self.sum(Kernel::Point, false, site, &snap.holes, 1.0, site)
    }

    /// Defects, point kernel.
    pub fn coulomb_d(&self, site: SiteId, snap: &ChargeSnapshot) -> f64 {
        self.sum(Kernel::Point, false, site, &snap.defects, snap.defect_charge, site)
    }

    /// Electrons with images, point kernel.
    pub fn coulomb_image_e(&self, site: SiteId, snap: &ChargeSnapshot) -> f64 {
        self.sum(Kernel::Point, true, site, &snap.electrons, -1.0, site)
    }

    /// Holes with images, point kernel.
    pub fn coulomb_image_h(&self, site: SiteId, snap: &ChargeSnapshot) -> f64 {
        self.sum(Kernel::Point, true, site, &snap.holes, 1.0, site)
    }

    /// Defects with images, point kernel.
    pub fn coulomb_image_d(&self, site: SiteId, snap: &ChargeSnapshot) -> f64 {
        self.sum(Kernel::Point, true, site, &snap.defects, snap.defect_charge, site)
    }

    /// Electrons, Gaussian kernel.
    pub fn gauss_e(&self, site: SiteId, snap: &ChargeSnapshot) -> f64 {
        self.sum(Kernel::Gaussian, false, site, &snap.electrons, -1.0, site)
    }

    /// Holes, Gaussian kernel.
    pub fn gauss_h(&self, site: SiteId, snap: &ChargeSnapshot) -> f64 {
        self.sum(Kernel::Gaussian, false, site, &snap.holes, 1.0, site)
    }

    /// Defects, Gaussian kernel.
    pub fn gauss_d(&self, site: SiteId, snap: &ChargeSnapshot) -> f64 {
        self.sum(Kernel::Gaussian, false, site, &snap.defects, snap.defect_charge, site)
    }

    /// Electrons with images, Gaussian kernel.
    pub fn gauss_image_e(&self, site: SiteId, snap: &ChargeSnapshot) -> f64 {
        self.sum(Kernel::Gaussian, true, site, &snap.electrons, -1.0, site)
    }

    /// Holes with images, Gaussian kernel.
    pub fn gauss_image_h(&self, site: SiteId, snap: &ChargeSnapshot) -> f64 {
        self.sum(Kernel::Gaussian, true, site, &snap.holes, 1.0, site)
    }

    /// Defects with images, Gaussian kernel.
    pub fn gauss_image_d(&self, site: SiteId, snap: &ChargeSnapshot) -> f64 {
        self.sum(Kernel::Gaussian, true, site, &snap.defects, snap.defect_charge, site)
    }
}
