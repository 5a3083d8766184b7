/// Axis-aligned bounding box arithmetic.
///
/// All operations are pure and allocation-free. Boxes use f64 bounds so
/// repeated incremental refits do not drift.

use glam::{DMat4, DVec3};
use crate::error::{Error, Result};

/// Axis-Aligned Bounding Box in world space
///
/// Interchangeable with the interval layout
/// `[min_x, max_x, min_y, max_y, min_z, max_z]` through
/// [`Aabb::from_array`] and [`Aabb::to_array`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    /// Minimum corner (x, y, z)
    pub min: DVec3,
    /// Maximum corner (x, y, z)
    pub max: DVec3,
}

impl Aabb {
    /// Create a box from its two corners (not validated).
    pub const fn new(min: DVec3, max: DVec3) -> Self {
        Self { min, max }
    }

    /// Create a box from the interval layout `[min_x, max_x, min_y, max_y, min_z, max_z]`.
    pub fn from_array(bounds: [f64; 6]) -> Self {
        Self {
            min: DVec3::new(bounds[0], bounds[2], bounds[4]),
            max: DVec3::new(bounds[1], bounds[3], bounds[5]),
        }
    }

    /// Interval layout `[min_x, max_x, min_y, max_y, min_z, max_z]`.
    pub fn to_array(&self) -> [f64; 6] {
        [self.min.x, self.max.x, self.min.y, self.max.y, self.min.z, self.max.z]
    }

    /// Per-axis union of `a` and `b`, then grown by `margin` on every side.
    pub fn union(a: &Aabb, b: &Aabb, margin: f64) -> Aabb {
        let pad = DVec3::splat(margin);
        Aabb {
            min: a.min.min(b.min) - pad,
            max: a.max.max(b.max) + pad,
        }
    }

    /// This box grown by `margin` on every side.
    pub fn expanded(&self, margin: f64) -> Aabb {
        let pad = DVec3::splat(margin);
        Aabb { min: self.min - pad, max: self.max + pad }
    }

    /// Test if this AABB fully contains another AABB.
    ///
    /// Returns `true` if `other` is entirely within `self` (touching faces count).
    /// Used by `move` to decide whether a leaf still fits inside its
    /// parent's margin-inflated box.
    pub fn contains(&self, other: &Aabb) -> bool {
        self.min.x <= other.min.x && self.max.x >= other.max.x
        && self.min.y <= other.min.y && self.max.y >= other.max.y
        && self.min.z <= other.min.z && self.max.z >= other.max.z
    }

    /// SAH surface area `2 (dx dy + dy dz + dz dx)`.
    ///
    /// Zero-volume boxes are legal and yield a finite (possibly zero) area.
    pub fn area(&self) -> f64 {
        let d = self.max - self.min;
        2.0 * (d.x * d.y + d.y * d.z + d.z * d.x)
    }

    /// Area of the margin-free union of two boxes, without building it.
    ///
    /// Only used for cost comparisons, never stored.
    pub fn combined_area(a: &Aabb, b: &Aabb) -> f64 {
        let d = a.max.max(b.max) - a.min.min(b.min);
        2.0 * (d.x * d.y + d.y * d.z + d.z * d.x)
    }

    /// `true` when every minimum is less than or equal to its maximum (NaN fails).
    pub fn is_valid(&self) -> bool {
        self.min.cmple(self.max).all()
    }

    /// Reject a box with a minimum greater than its maximum on any axis.
    pub fn validate(&self) -> Result<()> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(Error::MalformedBox(format!(
                "min {:?} is not below max {:?}",
                self.min.to_array(),
                self.max.to_array()
            )))
        }
    }

    /// Transform this local-space AABB by a matrix, returning a new world-space AABB.
    ///
    /// Uses the Arvo method: projects each matrix axis onto the AABB extents
    /// for a tight result without transforming all 8 corners.
    pub fn transformed(&self, matrix: &DMat4) -> Aabb {
        let translation = matrix.col(3).truncate();
        let mut new_min = translation;
        let mut new_max = translation;

        for i in 0..3 {
            let axis = matrix.col(i).truncate();
            let a = axis * self.min[i];
            let b = axis * self.max[i];
            new_min += a.min(b);
            new_max += a.max(b);
        }

        Aabb { min: new_min, max: new_max }
    }
}

#[cfg(test)]
#[path = "aabb_tests.rs"]
mod tests;
