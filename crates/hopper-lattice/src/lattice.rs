//! The 3-D site grid: indexing, neighbours, occupancy, and potential.

use hopper_core::{AgentId, ConfigError, Face, FluxId, OccupancyError, SiteId, Species};
use smallvec::SmallVec;

/// Neighbour list cached by agents.
///
/// Inline capacity covers hopping range 1 (26 interior neighbours plus
/// up to three adjacent special face sites) without heap allocation.
pub type Neighbours = SmallVec<[SiteId; 32]>;

/// Lattice extent along each axis.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Dimensions {
    /// Sites along x (transport axis).
    pub x: u32,
    /// Sites along y.
    pub y: u32,
    /// Sites along z.
    pub z: u32,
}

impl Dimensions {
    /// Construct from per-axis extents.
    pub const fn new(x: u32, y: u32, z: u32) -> Self {
        Self { x, y, z }
    }

    /// Total interior site count, widened to avoid overflow.
    pub fn volume(&self) -> u64 {
        u64::from(self.x) * u64::from(self.y) * u64::from(self.z)
    }

    /// Extent along `axis` (0 = x, 1 = y, 2 = z).
    pub fn along(&self, axis: usize) -> u32 {
        match axis {
            0 => self.x,
            1 => self.y,
            _ => self.z,
        }
    }
}

/// Non-owning handle to whatever stands on a site.
///
/// The lattice never owns agents; the scheduler does. Handles are used
/// for occupancy lookup only.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Occupant {
    /// A mobile charge agent.
    Charge(AgentId),
    /// A source or drain.
    Flux(FluxId),
}

/// Flat 3-D lattice with a reserved range of special boundary sites.
///
/// Interior sites are `0..volume`; sites `volume..volume + max_special`
/// are handed out to face-bound flux agents by
/// [`register_special`](Lattice::register_special). Each site stores its
/// species tag and optional occupant; interior sites also carry a scalar
/// background potential.
///
/// # Examples
///
/// ```
/// use hopper_lattice::{Dimensions, Lattice};
///
/// let lattice = Lattice::new(Dimensions::new(4, 4, 4), 2).unwrap();
/// let site = lattice.site_index(1, 2, 3);
/// assert_eq!(lattice.coords(site), (1, 2, 3));
/// assert_eq!(lattice.neighbours(site, 1).len(), 26);
/// ```
#[derive(Clone, Debug)]
pub struct Lattice {
    dims: Dimensions,
    volume: u32,
    max_special: u32,
    species: Vec<Species>,
    occupants: Vec<Option<Occupant>>,
    potential: Vec<f64>,
    special_faces: Vec<Option<Face>>,
    face_sites: [Vec<SiteId>; 6],
    counts: [u32; 6],
}

impl Lattice {
    /// Create an empty lattice with `max_special` reserved boundary slots.
    ///
    /// # Errors
    ///
    /// [`ConfigError::EmptyLattice`] if any dimension is zero, or
    /// [`ConfigError::LatticeTooLarge`] if `volume + max_special` does not
    /// fit a `u32` site index.
    pub fn new(dims: Dimensions, max_special: u32) -> Result<Self, ConfigError> {
        if dims.x == 0 || dims.y == 0 || dims.z == 0 {
            return Err(ConfigError::EmptyLattice);
        }
        let total = dims.volume() + u64::from(max_special);
        if total > u64::from(u32::MAX) {
            return Err(ConfigError::LatticeTooLarge { sites: total });
        }
        let volume = dims.volume() as u32;
        let total = total as usize;
        let mut counts = [0u32; 6];
        counts[Species::Empty as usize] = volume;
        Ok(Self {
            dims,
            volume,
            max_special,
            species: vec![Species::Empty; total],
            occupants: vec![None; total],
            potential: vec![0.0; volume as usize],
            special_faces: vec![None; max_special as usize],
            face_sites: Default::default(),
            counts,
        })
    }

    /// Lattice extents.
    pub fn dimensions(&self) -> Dimensions {
        self.dims
    }

    /// Number of interior sites.
    pub fn volume(&self) -> u32 {
        self.volume
    }

    /// Number of reserved special slots.
    pub fn max_special(&self) -> u32 {
        self.max_special
    }

    /// Interior plus special site count.
    pub fn site_count(&self) -> usize {
        self.species.len()
    }

    // ── Indexing ─────────────────────────────────────────────────

    /// Flat index of `(x, y, z)`.
    #[inline]
    pub fn site_index(&self, x: u32, y: u32, z: u32) -> SiteId {
        debug_assert!(x < self.dims.x && y < self.dims.y && z < self.dims.z);
        SiteId(x + y * self.dims.x + z * self.dims.x * self.dims.y)
    }

    /// Flat index of `(x, y, z)`, or `None` if any coordinate is outside.
    pub fn checked_site_index(&self, x: i64, y: i64, z: i64) -> Option<SiteId> {
        let inside = |v: i64, n: u32| v >= 0 && v < i64::from(n);
        if inside(x, self.dims.x) && inside(y, self.dims.y) && inside(z, self.dims.z) {
            Some(self.site_index(x as u32, y as u32, z as u32))
        } else {
            None
        }
    }

    /// x coordinate of an interior site.
    #[inline]
    pub fn index_to_x(&self, site: SiteId) -> u32 {
        site.0 % self.dims.x
    }

    /// y coordinate of an interior site.
    #[inline]
    pub fn index_to_y(&self, site: SiteId) -> u32 {
        (site.0 / self.dims.x) % self.dims.y
    }

    /// z coordinate of an interior site.
    #[inline]
    pub fn index_to_z(&self, site: SiteId) -> u32 {
        site.0 / (self.dims.x * self.dims.y)
    }

    /// `(x, y, z)` of an interior site.
    #[inline]
    pub fn coords(&self, site: SiteId) -> (u32, u32, u32) {
        (
            self.index_to_x(site),
            self.index_to_y(site),
            self.index_to_z(site),
        )
    }

    /// Continuous position of a site centre: `(x + 0.5, y + 0.5, z + 0.5)`.
    pub fn position_of(&self, site: SiteId) -> (f64, f64, f64) {
        let (x, y, z) = self.coords(site);
        (
            f64::from(x) + 0.5,
            f64::from(y) + 0.5,
            f64::from(z) + 0.5,
        )
    }

    /// `true` for `0..volume`.
    #[inline]
    pub fn is_interior(&self, site: SiteId) -> bool {
        site.0 < self.volume
    }

    /// `true` for the reserved special range.
    #[inline]
    pub fn is_special(&self, site: SiteId) -> bool {
        site.0 >= self.volume && site.index() < self.species.len()
    }

    /// `true` if the index addresses any site.
    #[inline]
    pub fn contains(&self, site: SiteId) -> bool {
        site.index() < self.species.len()
    }

    /// Face a special site is bound to.
    pub fn face_of(&self, site: SiteId) -> Option<Face> {
        if !self.is_special(site) {
            return None;
        }
        self.special_faces[(site.0 - self.volume) as usize]
    }

    /// How many layers `site` lies inside `face` (0 = on the face).
    pub fn depth_from(&self, face: Face, site: SiteId) -> u32 {
        let (x, y, z) = self.coords(site);
        match face {
            Face::Left => x,
            Face::Right => self.dims.x - 1 - x,
            Face::Front => y,
            Face::Back => self.dims.y - 1 - y,
            Face::Bottom => z,
            Face::Top => self.dims.z - 1 - z,
        }
    }

    // ── Neighbours ───────────────────────────────────────────────

    /// Sites reachable in one hop of at most `range` lattice steps per axis.
    ///
    /// For an interior site: every interior site in the surrounding
    /// Chebyshev box (clipped at the edges, excluding the site itself),
    /// followed by the special sites of every face whose boundary layer of
    /// depth `range` contains the site. For a special site: the boundary
    /// layer of its face, so special agents connect inward only.
    ///
    /// Order is deterministic: z-major box scan, then faces in
    /// [`Face::ALL`] order.
    pub fn neighbours(&self, site: SiteId, range: u32) -> Neighbours {
        if self.is_special(site) {
            return match self.face_of(site) {
                Some(face) => self.face_layer(face, range).into_iter().collect(),
                None => Neighbours::new(),
            };
        }
        let (x, y, z) = self.coords(site);
        // Clip the box to the lattice.
        let span = |c: u32, n: u32| c.saturating_sub(range)..=c.saturating_add(range).min(n - 1);
        let mut out = Neighbours::new();
        for nz in span(z, self.dims.z) {
            for ny in span(y, self.dims.y) {
                for nx in span(x, self.dims.x) {
                    if (nx, ny, nz) != (x, y, z) {
                        out.push(self.site_index(nx, ny, nz));
                    }
                }
            }
        }
        for face in Face::ALL {
            let specials = &self.face_sites[face.ordinal()];
            if !specials.is_empty() && self.depth_from(face, site) < range {
                out.extend(specials.iter().copied());
            }
        }
        out
    }

    /// Interior sites within `depth` layers of `face`, in index order.
    pub fn face_layer(&self, face: Face, depth: u32) -> Vec<SiteId> {
        (0..self.volume)
            .map(SiteId)
            .filter(|&s| self.depth_from(face, s) < depth)
            .collect()
    }

    /// Special sites bound to `face`, in registration order.
    pub fn special_sites(&self, face: Face) -> &[SiteId] {
        &self.face_sites[face.ordinal()]
    }

    // ── Occupancy ────────────────────────────────────────────────

    /// Species tag of a site (`Empty` for out-of-range indices).
    #[inline]
    pub fn species_at(&self, site: SiteId) -> Species {
        self.species
            .get(site.index())
            .copied()
            .unwrap_or(Species::Empty)
    }

    /// Occupant handle of a site.
    #[inline]
    pub fn occupant_at(&self, site: SiteId) -> Option<Occupant> {
        self.occupants.get(site.index()).copied().flatten()
    }

    /// `true` if the site is an interior site with nothing on it.
    #[inline]
    pub fn is_empty(&self, site: SiteId) -> bool {
        self.is_interior(site) && self.species[site.index()] == Species::Empty
    }

    /// Number of interior sites tagged with `species`.
    pub fn count(&self, species: Species) -> u32 {
        self.counts[species as usize]
    }

    /// Interior sites tagged with `species`, in index order.
    pub fn occupied_sites(&self, species: Species) -> Vec<SiteId> {
        self.species[..self.volume as usize]
            .iter()
            .enumerate()
            .filter(|(_, s)| **s == species)
            .map(|(i, _)| SiteId(i as u32))
            .collect()
    }

    fn check_vacant_interior(&self, site: SiteId) -> Result<(), OccupancyError> {
        if !self.contains(site) {
            return Err(OccupancyError::OutOfRange { site });
        }
        if !self.is_interior(site) {
            return Err(OccupancyError::SpecialSite { site });
        }
        let species = self.species[site.index()];
        if species != Species::Empty {
            return Err(OccupancyError::Occupied { site, species });
        }
        Ok(())
    }

    fn set_interior(&mut self, site: SiteId, species: Species, occupant: Option<Occupant>) {
        let old = self.species[site.index()];
        self.counts[old as usize] -= 1;
        self.counts[species as usize] += 1;
        self.species[site.index()] = species;
        self.occupants[site.index()] = occupant;
    }

    /// Place a charge agent and return its neighbour list for `range`.
    ///
    /// # Errors
    ///
    /// Rejects special, out-of-range, and occupied sites; the lattice is
    /// left unchanged.
    pub fn register_agent(
        &mut self,
        id: AgentId,
        species: Species,
        site: SiteId,
        range: u32,
    ) -> Result<Neighbours, OccupancyError> {
        self.check_vacant_interior(site)?;
        self.set_interior(site, species, Some(Occupant::Charge(id)));
        Ok(self.neighbours(site, range))
    }

    /// Clear an interior site holding an agent.
    pub fn unregister_agent(&mut self, site: SiteId) -> Result<(), OccupancyError> {
        if !self.is_interior(site) {
            return Err(OccupancyError::OutOfRange { site });
        }
        if self.occupants[site.index()].is_none() {
            return Err(OccupancyError::Vacant { site });
        }
        self.set_interior(site, Species::Empty, None);
        Ok(())
    }

    /// Move an occupant from `from` to the empty interior site `to`.
    pub fn move_agent(&mut self, from: SiteId, to: SiteId) -> Result<(), OccupancyError> {
        self.check_vacant_interior(to)?;
        if !self.is_interior(from) {
            return Err(OccupancyError::OutOfRange { site: from });
        }
        let occupant = self.occupants[from.index()].ok_or(OccupancyError::Vacant { site: from })?;
        let species = self.species[from.index()];
        self.set_interior(from, Species::Empty, None);
        self.set_interior(to, species, Some(occupant));
        Ok(())
    }

    /// Bind a flux agent to a face, consuming the next special slot.
    ///
    /// # Errors
    ///
    /// [`ConfigError::SpecialSlotsExhausted`] once all reserved slots are
    /// in use.
    pub fn register_special(
        &mut self,
        flux: FluxId,
        species: Species,
        face: Face,
    ) -> Result<SiteId, ConfigError> {
        let slot = self
            .special_faces
            .iter()
            .position(Option::is_none)
            .ok_or(ConfigError::SpecialSlotsExhausted {
                reserved: self.max_special,
                face,
            })?;
        let site = SiteId(self.volume + slot as u32);
        self.special_faces[slot] = Some(face);
        self.species[site.index()] = species;
        self.occupants[site.index()] = Some(Occupant::Flux(flux));
        self.face_sites[face.ordinal()].push(site);
        Ok(site)
    }

    /// Release a special slot.
    pub fn unregister_special(&mut self, site: SiteId) -> Result<(), OccupancyError> {
        let face = self.face_of(site).ok_or(OccupancyError::Vacant { site })?;
        let slot = (site.0 - self.volume) as usize;
        self.special_faces[slot] = None;
        self.species[site.index()] = Species::Empty;
        self.occupants[site.index()] = None;
        self.face_sites[face.ordinal()].retain(|&s| s != site);
        Ok(())
    }

    /// Bind a flux agent to a concrete interior site.
    pub fn register_flux_site(
        &mut self,
        flux: FluxId,
        species: Species,
        site: SiteId,
    ) -> Result<(), OccupancyError> {
        self.check_vacant_interior(site)?;
        self.set_interior(site, species, Some(Occupant::Flux(flux)));
        Ok(())
    }

    /// Mark an empty interior site as a defect.
    pub fn register_defect(&mut self, site: SiteId) -> Result<(), OccupancyError> {
        self.check_vacant_interior(site)?;
        self.set_interior(site, Species::Defect, None);
        Ok(())
    }

    /// Return a defect site to `Empty`.
    pub fn unregister_defect(&mut self, site: SiteId) -> Result<(), OccupancyError> {
        if self.species_at(site) != Species::Defect || !self.is_interior(site) {
            return Err(OccupancyError::Vacant { site });
        }
        self.set_interior(site, Species::Empty, None);
        Ok(())
    }

    // ── Background potential ─────────────────────────────────────

    /// Background potential at an interior site (0 for special sites).
    #[inline]
    pub fn potential(&self, site: SiteId) -> f64 {
        self.potential.get(site.index()).copied().unwrap_or(0.0)
    }

    /// The whole interior potential array, indexed by site.
    pub fn potentials(&self) -> &[f64] {
        &self.potential
    }

    /// Overwrite the potential at an interior site.
    pub fn set_potential(&mut self, site: SiteId, value: f64) {
        if let Some(v) = self.potential.get_mut(site.index()) {
            *v = value;
        }
    }

    /// Add to the potential at an interior site.
    pub fn add_potential(&mut self, site: SiteId, delta: f64) {
        if let Some(v) = self.potential.get_mut(site.index()) {
            *v += delta;
        }
    }

    /// Zero the whole potential array.
    pub fn reset_potential(&mut self) {
        self.potential.fill(0.0);
    }
}
