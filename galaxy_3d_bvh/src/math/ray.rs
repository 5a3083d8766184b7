/// Ray with precomputed slab-test data.
///
/// The reciprocal direction and the sign mask are computed once per query
/// and carried by value, so traversals never share scratch state.

use glam::DVec3;
use super::aabb::Aabb;

/// A ray restricted to the parametric interval `[near, far]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    /// Ray origin
    pub origin: DVec3,
    /// Ray direction (not required to be normalized)
    pub direction: DVec3,
    /// Start of the accepted parametric interval
    pub near: f64,
    /// End of the accepted parametric interval
    pub far: f64,
    /// Per-axis `1 / direction`; a zero component yields ±infinity
    inv_direction: DVec3,
    /// Bit `i` set when axis `i` of `inv_direction` is negative
    sign: u8,
}

impl Ray {
    /// Create a ray and precompute its inverse direction and sign mask.
    pub fn new(origin: DVec3, direction: DVec3, near: f64, far: f64) -> Self {
        let inv_direction = DVec3::ONE / direction;
        let sign = (inv_direction.x < 0.0) as u8
            | (((inv_direction.y < 0.0) as u8) << 1)
            | (((inv_direction.z < 0.0) as u8) << 2);

        Self { origin, direction, near, far, inv_direction, sign }
    }

    /// Ray over `[0, +inf)`.
    pub fn from_origin_direction(origin: DVec3, direction: DVec3) -> Self {
        Self::new(origin, direction, 0.0, f64::INFINITY)
    }

    /// Precomputed reciprocal direction.
    pub fn inv_direction(&self) -> DVec3 {
        self.inv_direction
    }

    /// 3-bit negative-sign mask (bit0 = X, bit1 = Y, bit2 = Z).
    pub fn sign(&self) -> u8 {
        self.sign
    }

    /// Slab test against an AABB, restricted to `[near, far]`.
    ///
    /// The sign mask selects which bound is entered first on each axis.
    /// Zero direction components rely on IEEE-754 infinities; a NaN slab
    /// (origin exactly on a face of a parallel slab) never narrows the interval.
    pub fn intersects_aabb(&self, aabb: &Aabb) -> bool {
        let bounds = [aabb.min, aabb.max];
        let o = self.origin;
        let inv = self.inv_direction;

        let sx = (self.sign & 1) as usize;
        let sy = ((self.sign >> 1) & 1) as usize;
        let sz = ((self.sign >> 2) & 1) as usize;

        let mut t_min = (bounds[sx].x - o.x) * inv.x;
        let mut t_max = (bounds[1 - sx].x - o.x) * inv.x;

        let ty_min = (bounds[sy].y - o.y) * inv.y;
        let ty_max = (bounds[1 - sy].y - o.y) * inv.y;

        if t_min > ty_max || ty_min > t_max {
            return false;
        }
        t_min = t_min.max(ty_min);
        t_max = t_max.min(ty_max);

        let tz_min = (bounds[sz].z - o.z) * inv.z;
        let tz_max = (bounds[1 - sz].z - o.z) * inv.z;

        if t_min > tz_max || tz_min > t_max {
            return false;
        }
        t_min = t_min.max(tz_min);
        t_max = t_max.min(tz_max);

        t_min <= self.far && t_max >= self.near
    }
}

#[cfg(test)]
#[path = "ray_tests.rs"]
mod tests;
