/// Bvh: the public face of the dynamic bounding volume hierarchy.
///
/// Wraps an [`IncrementalBuilder`] (which owns the nodes and performs every
/// structural change) and adds the read-only queries:
/// - ray traversal (broad phase, unordered)
/// - frustum traversal with a per-subtree plane mask
/// - generic pre-order `traverse` used by inspection tools
///
/// Every query walks the tree with an explicit stack, so deep (unbalanced)
/// trees cannot overflow the call stack.

use glam::DVec3;
use crate::error::Result;
use crate::math::{Aabb, Frustum, FrustumMask, FrustumTest, Ray};
use super::builder::IncrementalBuilder;
use super::config::BvhConfig;
use super::node::{Node, NodeKey, NodeKind};

const LOG_SOURCE: &str = "galaxy3d::Bvh";

/// Dynamic BVH over payloads of type `T`.
///
/// Payloads are returned by value from queries, so the query methods
/// require `T: Clone`. Keys, indices and small handles are the intended
/// payloads.
#[derive(Debug, Clone)]
pub struct Bvh<T> {
    builder: IncrementalBuilder<T>,
}

impl<T> Default for Bvh<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Bvh<T> {
    /// Create an empty tree with the default configuration (no margin, no
    /// rotation tolerance).
    pub fn new() -> Self {
        Self {
            builder: IncrementalBuilder::new(BvhConfig::default()),
        }
    }

    /// Create an empty tree with a validated configuration.
    pub fn with_config(config: BvhConfig) -> Result<Self> {
        if let Err(error) = config.validate() {
            crate::bvh_error!(LOG_SOURCE, "{}", error);
            return Err(error);
        }

        crate::bvh_debug!(
            LOG_SOURCE,
            "Created BVH (margin: {}, rotation tolerance: {})",
            config.margin,
            config.rotation_tolerance
        );

        Ok(Self {
            builder: IncrementalBuilder::new(config),
        })
    }

    /// Underlying builder (node arena and structural operations)
    pub fn builder(&self) -> &IncrementalBuilder<T> {
        &self.builder
    }

    pub fn config(&self) -> &BvhConfig {
        self.builder.config()
    }

    // ===== MUTATION =====

    /// Insert a payload with its world-space box. Returns the leaf handle.
    pub fn insert(&mut self, payload: T, aabb: Aabb) -> Result<NodeKey> {
        self.builder.insert(payload, aabb)
    }

    /// Remove a leaf and hand its payload back. The handle becomes invalid.
    pub fn delete(&mut self, key: NodeKey) -> Result<T> {
        self.builder.delete(key)
    }

    /// Overwrite a leaf's box in place. Follow with [`Self::move_leaf`].
    pub fn set_leaf_box(&mut self, key: NodeKey, aabb: Aabb) -> Result<()> {
        self.builder.set_leaf_box(key, aabb)
    }

    /// Restore the tree after the leaf's box was changed in place.
    pub fn move_leaf(&mut self, key: NodeKey) -> Result<()> {
        self.builder.move_leaf(key)
    }

    /// Write a new box and relocate the leaf if it left its parent's box.
    pub fn update(&mut self, key: NodeKey, aabb: Aabb) -> Result<()> {
        self.builder.set_leaf_box(key, aabb)?;
        self.builder.move_leaf(key)
    }

    /// Remove every leaf. All handles become invalid.
    pub fn clear(&mut self) {
        crate::bvh_debug!(LOG_SOURCE, "Cleared BVH ({} leaves)", self.builder.len());
        self.builder.clear();
    }

    // ===== ACCESSORS =====

    /// Number of leaves
    pub fn len(&self) -> usize {
        self.builder.len()
    }

    pub fn is_empty(&self) -> bool {
        self.builder.is_empty()
    }

    pub fn root(&self) -> Option<NodeKey> {
        self.builder.root()
    }

    pub fn node(&self, key: NodeKey) -> Option<&Node<T>> {
        self.builder.node(key)
    }

    /// Payload of a live leaf
    pub fn payload(&self, key: NodeKey) -> Option<&T> {
        self.builder.node(key).and_then(Node::payload)
    }

    /// Box currently stored in a live leaf
    pub fn leaf_box(&self, key: NodeKey) -> Option<&Aabb> {
        self.builder.node(key).filter(|node| node.is_leaf()).map(Node::aabb)
    }

    /// Check the structural, coverage and count invariants.
    pub fn validate(&self) -> Result<()> {
        self.builder.validate()
    }

    /// [`Self::validate`], plus exact margin-union boxes on every internal node.
    pub fn validate_tight(&self) -> Result<()> {
        self.builder.validate_tight()
    }

    // ===== TRAVERSAL =====

    /// Pre-order depth-first walk. The root has depth 0 and the left child
    /// is visited before the right one.
    ///
    /// The visitor returns `true` to skip the children of the node it was
    /// given; the walk then continues with the next pending node.
    pub fn traverse<F>(&self, mut visitor: F)
    where
        F: FnMut(NodeKey, &Node<T>, usize) -> bool,
    {
        let Some(root) = self.builder.root() else {
            return;
        };

        let mut stack = vec![(root, 0usize)];
        while let Some((key, depth)) = stack.pop() {
            let Some(node) = self.builder.node(key) else {
                continue;
            };
            if visitor(key, node, depth) {
                continue;
            }
            if let Some((left, right)) = node.children() {
                stack.push((right, depth + 1));
                stack.push((left, depth + 1));
            }
        }
    }
}

impl<T: Clone> Bvh<T> {
    /// Append to `results` the payload of every leaf whose box the ray
    /// crosses within `[ray.near, ray.far]`.
    ///
    /// Broad phase only: the order of results carries no meaning and no
    /// exact primitive test is made.
    pub fn intersect_ray(&self, ray: &Ray, results: &mut Vec<T>) {
        let Some(root) = self.builder.root() else {
            return;
        };

        let mut stack = vec![root];
        while let Some(key) = stack.pop() {
            let Some(node) = self.builder.node(key) else {
                continue;
            };
            if !ray.intersects_aabb(node.aabb()) {
                continue;
            }
            match node.kind() {
                NodeKind::Leaf { payload } => results.push(payload.clone()),
                NodeKind::Internal { left, right, .. } => {
                    stack.push(*right);
                    stack.push(*left);
                }
            }
        }
    }

    /// Convenience form of [`Self::intersect_ray`] returning a fresh vector.
    pub fn intersect_ray_with(&self, origin: DVec3, direction: DVec3, near: f64, far: f64) -> Vec<T> {
        let mut results = Vec::new();
        self.intersect_ray(&Ray::new(origin, direction, near, far), &mut results);
        results
    }

    /// Append to `results` the payload of every leaf whose box is not
    /// fully outside the frustum.
    ///
    /// Each subtree only tests the planes its parent did not already accept.
    /// A subtree fully inside every plane is collected without further tests.
    pub fn visibility_query(&self, frustum: &Frustum, results: &mut Vec<T>) {
        let Some(root) = self.builder.root() else {
            return;
        };

        let mut stack = vec![(root, FrustumMask::all())];
        while let Some((key, mask)) = stack.pop() {
            let Some(node) = self.builder.node(key) else {
                continue;
            };

            match frustum.intersects_box_mask(node.aabb(), mask) {
                FrustumTest::Outside => {}
                FrustumTest::Inside => self.collect_all(key, results),
                FrustumTest::Partial(narrowed) => match node.kind() {
                    NodeKind::Leaf { payload } => results.push(payload.clone()),
                    NodeKind::Internal { left, right, .. } => {
                        stack.push((*right, narrowed));
                        stack.push((*left, narrowed));
                    }
                },
            }
        }
    }

    /// Collect every payload below `key` without any test.
    fn collect_all(&self, key: NodeKey, results: &mut Vec<T>) {
        let mut stack = vec![key];
        while let Some(key) = stack.pop() {
            let Some(node) = self.builder.node(key) else {
                continue;
            };
            match node.kind() {
                NodeKind::Leaf { payload } => results.push(payload.clone()),
                NodeKind::Internal { left, right, .. } => {
                    stack.push(*right);
                    stack.push(*left);
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "bvh_tests.rs"]
mod tests;
