//! Energy change of a proposed hop.
//!
//! [`EnergyModel::move_energy`] is the single numerical contract shared by
//! every evaluator. For a carrier of charge `q` hopping from `c` to `f`:
//!
//! ```text
//! dE = q (V_bg(f) - V_bg(c))
//!    + q (phi(f) - phi(c))                        if Coulomb is enabled
//!    + f_img ke / 2 (K_img(f, f) - K_img(c, c))   if image charges are enabled
//! ```
//!
//! where `phi` sums every other charge in the snapshot (the mover itself
//! is excluded at both ends) and the last line is the change in the
//! carrier's interaction with its own image.

use hopper_core::{AgentId, Carrier, ConfigError, SiteId};
use hopper_lattice::Dimensions;

use crate::field::{ChargeSnapshot, FieldParams, Kernel, PotentialField};

/// One hop to evaluate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MoveRequest {
    /// The moving agent.
    pub agent: AgentId,
    /// Its carrier kind.
    pub carrier: Carrier,
    /// Where it is.
    pub current: SiteId,
    /// Where it wants to go.
    pub future: SiteId,
}

/// Energy model combining background field, Coulomb kernel, and images.
///
/// Constructed via [`EnergyModel::builder`].
#[derive(Clone, Debug)]
pub struct EnergyModel {
    field: PotentialField,
    coulomb: bool,
    image: bool,
    kernel: Kernel,
}

/// Builder for [`EnergyModel`].
///
/// Defaults: Coulomb on, images off, point kernel, default
/// [`FieldParams`].
#[derive(Clone, Debug)]
pub struct EnergyModelBuilder {
    params: FieldParams,
    coulomb: bool,
    image: bool,
    kernel: Kernel,
}

impl EnergyModel {
    /// Start configuring a model.
    pub fn builder() -> EnergyModelBuilder {
        EnergyModelBuilder {
            params: FieldParams::default(),
            coulomb: true,
            image: false,
            kernel: Kernel::Point,
        }
    }

    /// The underlying potential field.
    pub fn field(&self) -> &PotentialField {
        &self.field
    }

    /// `true` if pairwise interactions are included.
    pub fn coulomb_enabled(&self) -> bool {
        self.coulomb
    }

    /// `true` if image charges are included.
    pub fn image_enabled(&self) -> bool {
        self.image
    }

    /// Pair kernel in use.
    pub fn kernel(&self) -> Kernel {
        self.kernel
    }

    fn self_image(&self, site: SiteId) -> f64 {
        let p = self.field.params();
        0.5 * p.image_factor * p.coulomb_prefactor * self.field.image_pair(self.kernel, site, site)
    }

    /// Energy change (eV) of `request` against `snapshot` and the
    /// background potential array `background`.
    pub fn move_energy(
        &self,
        request: &MoveRequest,
        snapshot: &ChargeSnapshot,
        background: &[f64],
    ) -> f64 {
        let (c, f) = (request.current, request.future);
        let bg = |s: SiteId| background.get(s.index()).copied().unwrap_or(0.0);
        let mut de = request.carrier.energy_change(bg(c), bg(f));
        if self.coulomb {
            let q = request.carrier.charge_f64();
            let phi_f = self.field.total(self.kernel, self.image, f, snapshot, c);
            let phi_c = self.field.total(self.kernel, self.image, c, snapshot, c);
            de += q * (phi_f - phi_c);
            if self.image {
                de += self.self_image(f) - self.self_image(c);
            }
        }
        de
    }

    /// Energy change (eV) of bringing a new `carrier` from an electrode
    /// at potential `reference` onto the empty site `site`.
    ///
    /// Used for energy-sensitive injection. A uniform shift of the
    /// background and the reference cancels.
    pub fn placement_energy(
        &self,
        carrier: Carrier,
        reference: f64,
        site: SiteId,
        snapshot: &ChargeSnapshot,
        background: &[f64],
    ) -> f64 {
        let v = background.get(site.index()).copied().unwrap_or(0.0);
        let mut e = carrier.energy_change(reference, v);
        if self.coulomb {
            e += carrier.charge_f64() * self.field.total(self.kernel, self.image, site, snapshot, site);
            if self.image {
                e += self.self_image(site);
            }
        }
        e
    }
}

impl EnergyModelBuilder {
    /// Kernel parameters.
    pub fn params(mut self, params: FieldParams) -> Self {
        self.params = params;
        self
    }

    /// Include pairwise Coulomb interactions.
    pub fn coulomb(mut self, enabled: bool) -> Self {
        self.coulomb = enabled;
        self
    }

    /// Include image charges.
    pub fn image_charges(mut self, enabled: bool) -> Self {
        self.image = enabled;
        self
    }

    /// Pair kernel.
    pub fn kernel(mut self, kernel: Kernel) -> Self {
        self.kernel = kernel;
        self
    }

    /// Precalculate tables for `dims` and build the model.
    ///
    /// # Errors
    ///
    /// Propagates [`FieldParams::validate`] failures.
    pub fn build(self, dims: Dimensions) -> Result<EnergyModel, ConfigError> {
        Ok(EnergyModel {
            field: PotentialField::new(dims, self.params)?,
            coulomb: self.coulomb,
            image: self.image,
            kernel: self.kernel,
        })
    }
}
