//! Displacements and distances between lattice sites.
//!
//! Signed per-axis displacements use the convention `a - b`. The image
//! variants reflect the second argument through the zero plane of the
//! axis: with continuous site-centre positions that is `pos(a) + pos(b)`,
//! and with integer coordinates `c(a) + c(b) + 1`. The two agree exactly,
//! and the image separation exceeds the plain one by `2 * pos(b)`.
//!
//! Euclidean image distances reflect along the transport axis x only
//! (the electrode plane at `x = 0`). All distances are in lattice units;
//! callers scale by the grid spacing.

use hopper_core::SiteId;

use crate::lattice::Lattice;

macro_rules! axis_distances {
    ($axis:ident, $plain:ident, $image:ident, $plain_i:ident, $image_i:ident, $proj:ident) => {
        #[doc = concat!("Signed ", stringify!($axis), " displacement between site centres.")]
        #[inline]
        pub fn $plain(&self, a: SiteId, b: SiteId) -> f64 {
            self.$plain_i(a, b) as f64
        }

        #[doc = concat!("Signed ", stringify!($axis), " separation of `a` from the image of `b`.")]
        #[inline]
        pub fn $image(&self, a: SiteId, b: SiteId) -> f64 {
            (f64::from(self.$proj(a)) + 0.5) + (f64::from(self.$proj(b)) + 0.5)
        }

        #[doc = concat!("Integer ", stringify!($axis), " displacement `c(a) - c(b)`.")]
        #[inline]
        pub fn $plain_i(&self, a: SiteId, b: SiteId) -> i64 {
            i64::from(self.$proj(a)) - i64::from(self.$proj(b))
        }

        #[doc = concat!("Integer ", stringify!($axis), " image separation `c(a) + c(b) + 1`.")]
        #[inline]
        pub fn $image_i(&self, a: SiteId, b: SiteId) -> i64 {
            i64::from(self.$proj(a)) + i64::from(self.$proj(b)) + 1
        }
    };
}

impl Lattice {
    axis_distances!(x, x_distance, x_image_distance, x_distance_i, x_image_distance_i, index_to_x);
    axis_distances!(y, y_distance, y_image_distance, y_distance_i, y_image_distance_i, index_to_y);
    axis_distances!(z, z_distance, z_image_distance, z_distance_i, z_image_distance_i, index_to_z);

    /// `(dx, dy, dz)` from `b` to `a`.
    #[inline]
    pub fn displacement(&self, a: SiteId, b: SiteId) -> (i64, i64, i64) {
        (
            self.x_distance_i(a, b),
            self.y_distance_i(a, b),
            self.z_distance_i(a, b),
        )
    }

    /// `(dx_image, dy, dz)` from the x-image of `b` to `a`.
    #[inline]
    pub fn image_displacement(&self, a: SiteId, b: SiteId) -> (i64, i64, i64) {
        (
            self.x_image_distance_i(a, b),
            self.y_distance_i(a, b),
            self.z_distance_i(a, b),
        )
    }

    /// Squared Euclidean distance.
    pub fn distance_squared(&self, a: SiteId, b: SiteId) -> i64 {
        let (dx, dy, dz) = self.displacement(a, b);
        dx * dx + dy * dy + dz * dz
    }

    /// Euclidean distance.
    pub fn distance(&self, a: SiteId, b: SiteId) -> f64 {
        (self.distance_squared(a, b) as f64).sqrt()
    }

    /// Squared distance from `a` to the image of `b`.
    pub fn image_distance_squared(&self, a: SiteId, b: SiteId) -> i64 {
        let (dx, dy, dz) = self.image_displacement(a, b);
        dx * dx + dy * dy + dz * dz
    }

    /// Distance from `a` to the image of `b`. Never below 1.
    pub fn image_distance(&self, a: SiteId, b: SiteId) -> f64 {
        (self.image_distance_squared(a, b) as f64).sqrt()
    }

    /// Largest absolute per-axis displacement.
    pub fn chebyshev_distance(&self, a: SiteId, b: SiteId) -> u32 {
        let (dx, dy, dz) = self.displacement(a, b);
        dx.unsigned_abs()
            .max(dy.unsigned_abs())
            .max(dz.unsigned_abs()) as u32
    }

    /// Axis (0 = x, 1 = y, 2 = z) with the largest absolute displacement.
    ///
    /// Ties resolve towards x, then y.
    pub fn dominant_axis(&self, a: SiteId, b: SiteId) -> usize {
        let (dx, dy, dz) = self.displacement(a, b);
        let (ax, ay, az) = (dx.abs(), dy.abs(), dz.abs());
        if ax >= ay && ax >= az {
            0
        } else if ay >= az {
            1
        } else {
            2
        }
    }
}
