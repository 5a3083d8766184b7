//! Math module: boxes, rays and frustums.
//!
//! Pure value types with no tree knowledge. Every tree query and mutation
//! goes through these primitives.

mod aabb;
mod frustum;
mod ray;

pub use aabb::Aabb;
pub use frustum::{
    Frustum, FrustumMask, FrustumTest,
    PLANE_LEFT, PLANE_RIGHT, PLANE_BOTTOM, PLANE_TOP, PLANE_NEAR, PLANE_FAR,
};
pub use ray::Ray;
