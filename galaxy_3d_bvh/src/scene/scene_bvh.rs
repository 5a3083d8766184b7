/// SceneBvh: SceneIndex backed by the dynamic BVH.
///
/// Keeps a reverse lookup from host key to leaf handle so hosts never have
/// to hold on to `NodeKey`s. Leaf boxes are inflated by the tree margin
/// before insertion: an object wobbling inside that padding neither changes
/// its leaf box enough to leave its parent nor triggers a reinsertion.

use std::hash::Hash;
use rustc_hash::FxHashMap;
use crate::error::{Error, Result};
use crate::math::{Aabb, Frustum, Ray};
use crate::tree::{Bvh, BvhConfig, NodeKey};
use super::scene_index::SceneIndex;

const LOG_SOURCE: &str = "galaxy3d::SceneBvh";

/// Keyed BVH scene index.
///
/// `K` is the host's object identity (entity id, slot key, index...).
pub struct SceneBvh<K> {
    bvh: Bvh<K>,
    /// Reverse lookup: object key → leaf handle
    handles: FxHashMap<K, NodeKey>,
}

impl<K: Copy + Eq + Hash> SceneBvh<K> {
    /// Create an empty index whose internal and leaf boxes are padded by
    /// `margin`.
    pub fn new(margin: f64) -> Result<Self> {
        Self::with_config(BvhConfig::default().with_margin(margin))
    }

    /// Create an empty index from a full tree configuration.
    pub fn with_config(config: BvhConfig) -> Result<Self> {
        Ok(Self {
            bvh: Bvh::with_config(config)?,
            handles: FxHashMap::default(),
        })
    }

    /// Underlying tree
    pub fn bvh(&self) -> &Bvh<K> {
        &self.bvh
    }

    /// Leaf handle of an indexed object
    pub fn handle(&self, key: K) -> Option<NodeKey> {
        self.handles.get(&key).copied()
    }

    pub fn contains(&self, key: K) -> bool {
        self.handles.contains_key(&key)
    }

    /// Number of indexed objects
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Insert several objects. Stops at the first malformed box; objects
    /// before it stay indexed.
    pub fn insert_range<I>(&mut self, objects: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, Aabb)>,
    {
        for (key, world_aabb) in objects {
            self.insert_object(key, &world_aabb)?;
        }
        Ok(())
    }

    /// Re-read the world box of every object in `keys` through `box_of`,
    /// then restore the tree.
    ///
    /// All boxes are written first and leaves are moved afterwards, so a
    /// leaf is only relocated against siblings that already hold their new
    /// box. Unknown keys or malformed boxes fail the whole batch before any
    /// change.
    pub fn refresh<I, F>(&mut self, keys: I, mut box_of: F) -> Result<()>
    where
        I: IntoIterator<Item = K>,
        F: FnMut(K) -> Aabb,
    {
        let margin = self.bvh.config().margin;
        let mut batch = Vec::new();

        for key in keys {
            let handle = self.handle_of(key)?;
            let leaf_box = box_of(key).expanded(margin);
            leaf_box.validate().map_err(Self::log_and_return_error)?;
            batch.push((handle, leaf_box));
        }

        for (handle, leaf_box) in &batch {
            self.bvh.set_leaf_box(*handle, *leaf_box)?;
        }
        for (handle, _) in &batch {
            self.bvh.move_leaf(*handle)?;
        }

        crate::bvh_trace!(LOG_SOURCE, "Refreshed {} objects", batch.len());
        Ok(())
    }

    /// Helper to log errors before returning them
    fn log_and_return_error(error: Error) -> Error {
        crate::bvh_error!(LOG_SOURCE, "{}", error);
        error
    }

    fn handle_of(&self, key: K) -> Result<NodeKey> {
        self.handle(key).ok_or_else(|| {
            Self::log_and_return_error(Error::InvalidHandle("object is not indexed".to_string()))
        })
    }

    fn insert_object(&mut self, key: K, world_aabb: &Aabb) -> Result<()> {
        if self.handles.contains_key(&key) {
            crate::bvh_warn!(LOG_SOURCE, "Object inserted twice, updating its box instead");
            return self.update_object(key, world_aabb);
        }

        let leaf_box = world_aabb.expanded(self.bvh.config().margin);
        let handle = self.bvh.insert(key, leaf_box)?;
        self.handles.insert(key, handle);
        Ok(())
    }

    fn update_object(&mut self, key: K, world_aabb: &Aabb) -> Result<()> {
        let handle = self.handle_of(key)?;
        let leaf_box = world_aabb.expanded(self.bvh.config().margin);
        self.bvh.update(handle, leaf_box)
    }
}

// ===== SCENE INDEX TRAIT =====

impl<K: Copy + Eq + Hash + Send + Sync> SceneIndex<K> for SceneBvh<K> {
    fn insert(&mut self, key: K, world_aabb: &Aabb) -> Result<()> {
        self.insert_object(key, world_aabb)
    }

    fn remove(&mut self, key: K) -> Result<()> {
        let handle = self.handle_of(key)?;
        self.bvh.delete(handle)?;
        self.handles.remove(&key);
        Ok(())
    }

    fn update(&mut self, key: K, world_aabb: &Aabb) -> Result<()> {
        self.update_object(key, world_aabb)
    }

    fn query_frustum(&self, frustum: &Frustum, results: &mut Vec<K>) {
        self.bvh.visibility_query(frustum, results);
    }

    fn query_ray(&self, ray: &Ray, results: &mut Vec<K>) {
        self.bvh.intersect_ray(ray, results);
    }

    fn clear(&mut self) {
        self.bvh.clear();
        self.handles.clear();
    }
}

#[cfg(test)]
#[path = "scene_bvh_tests.rs"]
mod tests;
