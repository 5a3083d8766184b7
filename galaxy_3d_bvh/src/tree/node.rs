/// Node types for the BVH arena.
///
/// Nodes reference each other through generational `NodeKey`s instead of
/// pointers: a child knows its parent and a parent knows its children, and
/// the arena owns them all.

use slotmap::new_key_type;
use crate::math::Aabb;

// ===== SLOT MAP KEY =====

new_key_type! {
    /// Stable key for a node within a Bvh.
    ///
    /// The key returned by `insert` is the leaf's handle. It stays valid
    /// across moves and across the removal of other leaves, and becomes
    /// invalid (detectably, thanks to the slot version) once its own leaf
    /// is deleted.
    pub struct NodeKey;
}

/// Leaf or internal node payload.
#[derive(Debug, Clone)]
pub enum NodeKind<T> {
    /// Holds exactly one externally owned payload and no children
    Leaf {
        /// User payload
        payload: T,
    },
    /// Holds exactly two children and caches the surface area of its box
    Internal {
        /// Left child
        left: NodeKey,
        /// Right child
        right: NodeKey,
        /// `aabb.area()` as of the last refit of this node
        area: f64,
    },
}

/// A node of the hierarchy.
#[derive(Debug, Clone)]
pub struct Node<T> {
    /// Leaf: the object's box. Internal: margin-expanded union of its children
    pub(crate) aabb: Aabb,
    /// None only for the root
    pub(crate) parent: Option<NodeKey>,
    pub(crate) kind: NodeKind<T>,
}

impl<T> Node<T> {
    pub(crate) fn leaf(payload: T, aabb: Aabb) -> Self {
        Self { aabb, parent: None, kind: NodeKind::Leaf { payload } }
    }

    /// Internal node whose box is filled in by the next refit.
    pub(crate) fn internal(parent: Option<NodeKey>, left: NodeKey, right: NodeKey, aabb: Aabb) -> Self {
        Self { aabb, parent, kind: NodeKind::Internal { left, right, area: aabb.area() } }
    }

    /// Box bounding this node's subtree
    pub fn aabb(&self) -> &Aabb {
        &self.aabb
    }

    /// Parent key (None for the root)
    pub fn parent(&self) -> Option<NodeKey> {
        self.parent
    }

    /// Leaf/internal variant
    pub fn kind(&self) -> &NodeKind<T> {
        &self.kind
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self.kind, NodeKind::Leaf { .. })
    }

    /// Payload of a leaf, None for internal nodes
    pub fn payload(&self) -> Option<&T> {
        match &self.kind {
            NodeKind::Leaf { payload } => Some(payload),
            NodeKind::Internal { .. } => None,
        }
    }

    /// (left, right) of an internal node, None for leaves
    pub fn children(&self) -> Option<(NodeKey, NodeKey)> {
        match self.kind {
            NodeKind::Internal { left, right, .. } => Some((left, right)),
            NodeKind::Leaf { .. } => None,
        }
    }

    /// Cached area for internal nodes, computed on the fly for leaves.
    pub fn area(&self) -> f64 {
        match self.kind {
            NodeKind::Internal { area, .. } => area,
            NodeKind::Leaf { .. } => self.aabb.area(),
        }
    }
}
