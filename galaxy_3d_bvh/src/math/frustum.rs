/// Frustum: six clipping planes for visibility culling.
///
/// Each plane is represented as a DVec4 (A, B, C, D) where:
/// - (A, B, C) is the inward-pointing normal
/// - D is the signed distance
/// - A point P is inside the frustum if dot(plane, P_homogeneous) >= 0 for all planes
///
/// The caller is responsible for computing the frustum. `from_view_projection()`
/// is provided as a utility, but any six inward-facing planes work.

use bitflags::bitflags;
use glam::{DMat4, DVec3, DVec4};
use super::aabb::Aabb;

/// Frustum plane indices
pub const PLANE_LEFT: usize = 0;
pub const PLANE_RIGHT: usize = 1;
pub const PLANE_BOTTOM: usize = 2;
pub const PLANE_TOP: usize = 3;
pub const PLANE_NEAR: usize = 4;
pub const PLANE_FAR: usize = 5;

bitflags! {
    /// Planes that still have to be tested for a subtree.
    ///
    /// Bit `i` corresponds to plane index `i` (`PLANE_LEFT` .. `PLANE_FAR`).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct FrustumMask: u8 {
        const LEFT = 1 << PLANE_LEFT;
        const RIGHT = 1 << PLANE_RIGHT;
        const BOTTOM = 1 << PLANE_BOTTOM;
        const TOP = 1 << PLANE_TOP;
        const NEAR = 1 << PLANE_NEAR;
        const FAR = 1 << PLANE_FAR;
    }
}

impl FrustumMask {
    /// Mask holding only the plane at `index`.
    pub const fn plane(index: usize) -> Self {
        Self::from_bits_truncate(1 << index)
    }
}

/// Result of a frustum/AABB classification against a plane mask.
///
/// - `Outside` → skip the entire subtree
/// - `Inside` → every remaining plane accepts the box; collect the subtree untested
/// - `Partial` → recurse, testing only the planes left in the narrowed mask
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrustumTest {
    /// AABB is entirely outside at least one plane
    Outside,
    /// AABB is entirely inside every tested plane
    Inside,
    /// AABB straddles the planes left in the mask
    Partial(FrustumMask),
}

/// Six frustum planes for culling.
///
/// Each plane is (A, B, C, D) where Ax + By + Cz + D = 0.
/// Normal (A, B, C) points inward (toward the visible volume).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frustum {
    /// Frustum planes: left, right, bottom, top, near, far
    pub planes: [DVec4; 6],
}

impl Frustum {
    /// Build a frustum from six inward-facing planes, normalizing each one.
    pub fn from_planes(planes: [DVec4; 6]) -> Self {
        let mut planes = planes;
        for plane in &mut planes {
            let normal_len = plane.truncate().length();
            if normal_len > 0.0 {
                *plane /= normal_len;
            }
        }
        Self { planes }
    }

    /// Extract frustum planes from a view-projection matrix.
    ///
    /// Gribb & Hartmann, for glam's `_rh`/`_lh` projections whose clip depth
    /// range is [0, 1]. Works for perspective and orthographic projections.
    pub fn from_view_projection(vp: &DMat4) -> Self {
        let m = vp.to_cols_array_2d();

        Self::from_planes([
            // Left:   row3 + row0
            DVec4::new(m[0][3] + m[0][0], m[1][3] + m[1][0], m[2][3] + m[2][0], m[3][3] + m[3][0]),
            // Right:  row3 - row0
            DVec4::new(m[0][3] - m[0][0], m[1][3] - m[1][0], m[2][3] - m[2][0], m[3][3] - m[3][0]),
            // Bottom: row3 + row1
            DVec4::new(m[0][3] + m[0][1], m[1][3] + m[1][1], m[2][3] + m[2][1], m[3][3] + m[3][1]),
            // Top:    row3 - row1
            DVec4::new(m[0][3] - m[0][1], m[1][3] - m[1][1], m[2][3] - m[2][1], m[3][3] - m[3][1]),
            // Near:   row2 (z_clip >= 0)
            DVec4::new(m[0][2], m[1][2], m[2][2], m[3][2]),
            // Far:    row3 - row2
            DVec4::new(m[0][3] - m[0][2], m[1][3] - m[1][2], m[2][3] - m[2][2], m[3][3] - m[3][2]),
        ])
    }

    /// Classify an AABB against the planes still set in `mask`.
    ///
    /// For each tested plane:
    /// - p-vertex (corner furthest along the normal) outside → `Outside` (early out)
    /// - n-vertex (corner furthest against the normal) outside → plane stays in the mask
    /// - otherwise the plane fully accepts the box and is dropped from the mask
    ///
    /// An empty result mask is reported as `Inside`.
    pub fn intersects_box_mask(&self, aabb: &Aabb, mask: FrustumMask) -> FrustumTest {
        let mut remaining = FrustumMask::empty();

        for (index, plane) in self.planes.iter().enumerate() {
            let bit = FrustumMask::plane(index);
            if !mask.contains(bit) {
                continue;
            }

            let normal = plane.truncate();

            let p_vertex = DVec3::new(
                if normal.x >= 0.0 { aabb.max.x } else { aabb.min.x },
                if normal.y >= 0.0 { aabb.max.y } else { aabb.min.y },
                if normal.z >= 0.0 { aabb.max.z } else { aabb.min.z },
            );
            if normal.dot(p_vertex) + plane.w < 0.0 {
                return FrustumTest::Outside;
            }

            let n_vertex = DVec3::new(
                if normal.x >= 0.0 { aabb.min.x } else { aabb.max.x },
                if normal.y >= 0.0 { aabb.min.y } else { aabb.max.y },
                if normal.z >= 0.0 { aabb.min.z } else { aabb.max.z },
            );
            if normal.dot(n_vertex) + plane.w < 0.0 {
                remaining |= bit;
            }
        }

        if remaining.is_empty() { FrustumTest::Inside } else { FrustumTest::Partial(remaining) }
    }

    /// Classify an AABB against all six planes.
    pub fn classify_aabb(&self, aabb: &Aabb) -> FrustumTest {
        self.intersects_box_mask(aabb, FrustumMask::all())
    }

    /// Test if an AABB is (potentially) visible.
    ///
    /// Conservative: may return false positives near frustum corners, never false negatives.
    pub fn intersects_aabb(&self, aabb: &Aabb) -> bool {
        self.classify_aabb(aabb) != FrustumTest::Outside
    }
}

#[cfg(test)]
#[path = "frustum_tests.rs"]
mod tests;
