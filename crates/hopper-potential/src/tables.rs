//! Displacement-keyed distance tables.
//!
//! Every pairwise quantity on a cubic lattice depends only on the
//! absolute per-axis displacement, so a table of `X * Y * Z` entries covers
//! all `volume^2` real-distance pairs. Image distances reflect through
//! `x = 0`, giving x separations `1..2X`, so the image table is `2X * Y * Z`.

use hopper_core::SiteId;
use hopper_lattice::Dimensions;

/// Distance, squared distance, and inverse distance for each displacement.
#[derive(Clone, Debug)]
pub struct DistanceTable {
    nx: usize,
    ny: usize,
    distance: Vec<f64>,
    distance_squared: Vec<f64>,
    inverse: Vec<f64>,
}

impl DistanceTable {
    fn build(nx: usize, ny: usize, nz: usize) -> Self {
        let len = nx * ny * nz;
        let mut distance = Vec::with_capacity(len);
        let mut distance_squared = Vec::with_capacity(len);
        let mut inverse = Vec::with_capacity(len);
        for dz in 0..nz {
            for dy in 0..ny {
                for dx in 0..nx {
                    let r2 = (dx * dx + dy * dy + dz * dz) as f64;
                    let r = r2.sqrt();
                    distance_squared.push(r2);
                    distance.push(r);
                    inverse.push(if r > 0.0 { 1.0 / r } else { 0.0 });
                }
            }
        }
        Self {
            nx,
            ny,
            distance,
            distance_squared,
            inverse,
        }
    }

    #[inline]
    fn slot(&self, dx: usize, dy: usize, dz: usize) -> usize {
        dx + dy * self.nx + dz * self.nx * self.ny
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.distance.len()
    }

    /// `true` if the table has no entries.
    pub fn is_empty(&self) -> bool {
        self.distance.is_empty()
    }

    /// Distances in slot order (x fastest, then y, then z).
    pub fn distances(&self) -> &[f64] {
        &self.distance
    }

    /// Distance for displacement `(dx, dy, dz)`.
    #[inline]
    pub fn distance(&self, dx: usize, dy: usize, dz: usize) -> f64 {
        self.distance[self.slot(dx, dy, dz)]
    }

    /// Squared distance for displacement `(dx, dy, dz)`.
    #[inline]
    pub fn distance_squared(&self, dx: usize, dy: usize, dz: usize) -> f64 {
        self.distance_squared[self.slot(dx, dy, dz)]
    }

    /// Inverse distance for displacement `(dx, dy, dz)`; 0 at the origin.
    #[inline]
    pub fn inverse(&self, dx: usize, dy: usize, dz: usize) -> f64 {
        self.inverse[self.slot(dx, dy, dz)]
    }
}

/// Real and image distance tables plus the site projection they need.
#[derive(Clone, Debug)]
pub struct DistanceTables {
    dims: Dimensions,
    real: DistanceTable,
    image: DistanceTable,
}

impl DistanceTables {
    /// Build tables covering every site pair of a lattice of `dims`.
    pub fn precalculate_arrays(dims: Dimensions) -> Self {
        let (x, y, z) = (dims.x as usize, dims.y as usize, dims.z as usize);
        Self {
            dims,
            real: DistanceTable::build(x, y, z),
            image: DistanceTable::build(2 * x, y, z),
        }
    }

    /// Lattice extents the tables were built for.
    pub fn dimensions(&self) -> Dimensions {
        self.dims
    }

    /// Table keyed by absolute displacement.
    pub fn real(&self) -> &DistanceTable {
        &self.real
    }

    /// Table keyed by image displacement.
    pub fn image(&self) -> &DistanceTable {
        &self.image
    }

    #[inline]
    fn coords(&self, site: SiteId) -> (u32, u32, u32) {
        let plane = self.dims.x * self.dims.y;
        (
            site.0 % self.dims.x,
            (site.0 / self.dims.x) % self.dims.y,
            site.0 / plane,
        )
    }

    /// Absolute displacement between two interior sites.
    #[inline]
    pub fn key(&self, a: SiteId, b: SiteId) -> (usize, usize, usize) {
        let (ax, ay, az) = self.coords(a);
        let (bx, by, bz) = self.coords(b);
        (
            ax.abs_diff(bx) as usize,
            ay.abs_diff(by) as usize,
            az.abs_diff(bz) as usize,
        )
    }

    /// Displacement from the x-image of `b` to `a`.
    #[inline]
    pub fn image_key(&self, a: SiteId, b: SiteId) -> (usize, usize, usize) {
        let (ax, ay, az) = self.coords(a);
        let (bx, by, bz) = self.coords(b);
        (
            (ax + bx + 1) as usize,
            ay.abs_diff(by) as usize,
            az.abs_diff(bz) as usize,
        )
    }

    /// Distance between two interior sites.
    #[inline]
    pub fn distance(&self, a: SiteId, b: SiteId) -> f64 {
        let (dx, dy, dz) = self.key(a, b);
        self.real.distance(dx, dy, dz)
    }

    /// Inverse distance between two interior sites; 0 when `a == b`.
    #[inline]
    pub fn inverse_distance(&self, a: SiteId, b: SiteId) -> f64 {
        let (dx, dy, dz) = self.key(a, b);
        self.real.inverse(dx, dy, dz)
    }

    /// Distance from `a` to the image of `b`.
    #[inline]
    pub fn image_distance(&self, a: SiteId, b: SiteId) -> f64 {
        let (dx, dy, dz) = self.image_key(a, b);
        self.image.distance(dx, dy, dz)
    }

    /// Inverse distance from `a` to the image of `b`.
    #[inline]
    pub fn inverse_image_distance(&self, a: SiteId, b: SiteId) -> f64 {
        let (dx, dy, dz) = self.image_key(a, b);
        self.image.inverse(dx, dy, dz)
    }
}
