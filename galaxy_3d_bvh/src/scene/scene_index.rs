/// Spatial index over host objects.
///
/// A SceneIndex indexes host keys by their world-space AABB for frustum
/// culling and ray picking. The caller creates and owns the index and keeps
/// it in sync with its objects.

use crate::error::Result;
use crate::math::{Aabb, Frustum, Ray};

/// Trait for spatial indexing of host objects.
pub trait SceneIndex<K>: Send + Sync {
    /// Insert an object with its world-space AABB.
    fn insert(&mut self, key: K, world_aabb: &Aabb) -> Result<()>;

    /// Remove an object from the index.
    fn remove(&mut self, key: K) -> Result<()>;

    /// Update an object's world-space AABB (e.g. after a transform change).
    fn update(&mut self, key: K, world_aabb: &Aabb) -> Result<()>;

    /// Query all objects whose world AABB intersects the frustum.
    /// Results are appended to `results`.
    fn query_frustum(&self, frustum: &Frustum, results: &mut Vec<K>);

    /// Query all objects whose world AABB the ray crosses within its
    /// `[near, far]` interval. Results are appended to `results`, unordered.
    fn query_ray(&self, ray: &Ray, results: &mut Vec<K>);

    /// Remove all objects from the index.
    fn clear(&mut self);
}
