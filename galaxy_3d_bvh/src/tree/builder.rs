/// IncrementalBuilder: online construction of a dynamic BVH.
///
/// Leaves are inserted one at a time next to the sibling that minimizes the
/// total SAH growth of the tree (branch and bound over the whole tree), then
/// ancestors are refit and locally rotated on the way back to the root.
/// Deletion promotes the sibling and refits without rotating.
///
/// Nodes live in a `SlotMap` arena addressed by `NodeKey`. The key of a leaf
/// is the handle given back to the host.

use slotmap::SlotMap;
use crate::error::{Error, Result};
use crate::math::Aabb;
use super::config::BvhConfig;
use super::node::{Node, NodeKey, NodeKind};

/// Log source for every message emitted by the tree
const LOG_SOURCE: &str = "galaxy3d::Bvh";

/// Incremental (bottom-up, insertion driven) BVH builder.
///
/// Owns the node arena and the root. Queries live on [`super::Bvh`].
#[derive(Debug, Clone)]
pub struct IncrementalBuilder<T> {
    /// Node arena (leaves and internal nodes)
    nodes: SlotMap<NodeKey, Node<T>>,
    /// None only when the tree is empty
    root: Option<NodeKey>,
    config: BvhConfig,
    /// Number of leaves currently in the tree
    leaf_count: usize,
}

impl<T> IncrementalBuilder<T> {
    /// Create an empty builder. The config must already be validated.
    pub fn new(config: BvhConfig) -> Self {
        Self {
            nodes: SlotMap::with_key(),
            root: None,
            config,
            leaf_count: 0,
        }
    }

    /// Helper to log errors before returning them
    fn log_and_return_error(error: Error) -> Error {
        crate::bvh_error!(LOG_SOURCE, "{}", error);
        error
    }

    // ===== ACCESSORS =====

    pub fn config(&self) -> &BvhConfig {
        &self.config
    }

    pub fn root(&self) -> Option<NodeKey> {
        self.root
    }

    pub fn node(&self, key: NodeKey) -> Option<&Node<T>> {
        self.nodes.get(key)
    }

    /// Number of leaves
    pub fn len(&self) -> usize {
        self.leaf_count
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Number of nodes (leaves + internal) in the arena
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Remove every node. All outstanding handles become invalid.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.root = None;
        self.leaf_count = 0;
    }

    /// Resolve a handle to its leaf, rejecting stale keys and internal nodes.
    fn leaf_node(&self, key: NodeKey) -> Result<&Node<T>> {
        match self.nodes.get(key) {
            Some(node) if node.is_leaf() => Ok(node),
            Some(_) => Err(Self::log_and_return_error(Error::InvalidHandle(format!(
                "{:?} refers to an internal node, not a leaf",
                key
            )))),
            None => Err(Self::log_and_return_error(Error::InvalidHandle(format!(
                "{:?} is not present in this tree (deleted or never inserted)",
                key
            )))),
        }
    }

    fn checked_box(aabb: Aabb) -> Result<Aabb> {
        aabb.validate().map_err(Self::log_and_return_error)?;
        Ok(aabb)
    }

    // ===== MUTATION =====

    /// Insert a payload with its world-space box and return the leaf handle.
    ///
    /// The box is rejected before any mutation if it is malformed.
    pub fn insert(&mut self, payload: T, aabb: Aabb) -> Result<NodeKey> {
        let aabb = Self::checked_box(aabb)?;
        let leaf = self.nodes.insert(Node::leaf(payload, aabb));
        self.leaf_count += 1;

        if self.root.is_none() {
            self.root = Some(leaf);
        } else {
            self.insert_leaf(leaf, None);
        }

        Ok(leaf)
    }

    /// Remove a leaf and return its payload. The handle becomes invalid.
    pub fn delete(&mut self, key: NodeKey) -> Result<T> {
        self.leaf_node(key)?;

        if let Some(discarded) = self.detach_leaf(key) {
            self.nodes.remove(discarded);
        }

        match self.nodes.remove(key) {
            Some(Node { kind: NodeKind::Leaf { payload }, .. }) => {
                self.leaf_count -= 1;
                Ok(payload)
            }
            _ => Err(Self::log_and_return_error(Error::InvariantViolation(format!(
                "{:?} vanished while being deleted",
                key
            )))),
        }
    }

    /// Overwrite the box stored in a leaf without touching the structure.
    ///
    /// Call [`Self::move_leaf`] afterwards to restore the tree invariants.
    pub fn set_leaf_box(&mut self, key: NodeKey, aabb: Aabb) -> Result<()> {
        self.leaf_node(key)?;
        let aabb = Self::checked_box(aabb)?;
        self.nodes[key].aabb = aabb;
        Ok(())
    }

    /// Relocate a leaf whose box was updated in place.
    ///
    /// Nothing happens if the leaf still fits inside its parent's box (the
    /// common case the margin exists for). Otherwise the leaf is detached and
    /// reinserted, reusing the discarded internal node.
    pub fn move_leaf(&mut self, key: NodeKey) -> Result<()> {
        let node = self.leaf_node(key)?;
        let aabb = Self::checked_box(node.aabb)?;

        let Some(parent) = node.parent else {
            return Ok(());
        };
        if self.nodes[parent].aabb.contains(&aabb) {
            return Ok(());
        }

        let reuse = self.detach_leaf(key);
        crate::bvh_trace!(LOG_SOURCE, "Reinserting {:?} after leaving its parent box", key);
        self.insert_leaf(key, reuse);
        Ok(())
    }

    /// Link an already allocated leaf into a non-empty tree.
    ///
    /// `reuse` is an internal node discarded by a preceding `detach_leaf`;
    /// it becomes the new parent instead of allocating a fresh node.
    fn insert_leaf(&mut self, leaf: NodeKey, reuse: Option<NodeKey>) {
        let leaf_box = self.nodes[leaf].aabb;

        let Some(sibling) = self.find_best_sibling(&leaf_box, leaf_box.area()) else {
            if let Some(unused) = reuse {
                self.nodes.remove(unused);
            }
            self.nodes[leaf].parent = None;
            self.root = Some(leaf);
            return;
        };

        let old_parent = self.nodes[sibling].parent;
        let aabb = Aabb::union(&self.nodes[sibling].aabb, &leaf_box, self.config.margin);

        let new_parent = match reuse {
            Some(shell) => {
                self.nodes[shell] = Node::internal(old_parent, sibling, leaf, aabb);
                shell
            }
            None => self.nodes.insert(Node::internal(old_parent, sibling, leaf, aabb)),
        };

        self.nodes[sibling].parent = Some(new_parent);
        self.nodes[leaf].parent = Some(new_parent);

        match old_parent {
            None => self.root = Some(new_parent),
            Some(grandparent) => self.replace_child(grandparent, sibling, new_parent),
        }

        self.refit_and_rotate(Some(new_parent));
    }

    /// Unlink a leaf: its sibling takes the parent's slot and the parent is
    /// returned (still allocated, no longer linked) for reuse or removal.
    ///
    /// Deleting the root leaf empties the tree and returns None.
    fn detach_leaf(&mut self, leaf: NodeKey) -> Option<NodeKey> {
        let Some(parent) = self.nodes[leaf].parent else {
            self.root = None;
            return None;
        };

        let grandparent = self.nodes[parent].parent;
        let (left, right) = self.nodes[parent].children()?;
        let sibling = if left == leaf { right } else { left };

        self.nodes[sibling].parent = grandparent;
        self.nodes[leaf].parent = None;
        self.nodes[parent].parent = None;

        match grandparent {
            None => self.root = Some(sibling),
            Some(grandparent) => {
                self.replace_child(grandparent, parent, sibling);
                self.refit(Some(grandparent));
            }
        }

        Some(parent)
    }

    fn replace_child(&mut self, parent: NodeKey, old: NodeKey, new: NodeKey) {
        if let NodeKind::Internal { left, right, .. } = &mut self.nodes[parent].kind {
            if *left == old {
                *left = new;
            } else if *right == old {
                *right = new;
            }
        }
    }

    // ===== BEST SIBLING SEARCH =====

    /// Branch and bound search for the node whose pairing with the new leaf
    /// minimizes `direct cost + inherited cost`.
    ///
    /// The inherited cost of a node is the area growth its ancestors would
    /// suffer; `leaf_area + inherited` bounds from below every candidate in
    /// the subtree, so subtrees whose bound reaches the best cost are pruned.
    /// The child with the smaller inherited cost is explored first. On equal
    /// costs the node found first wins.
    pub(crate) fn find_best_sibling(&self, leaf_box: &Aabb, leaf_area: f64) -> Option<NodeKey> {
        let root = self.root?;
        let root_node = &self.nodes[root];

        let mut best_node = root;
        let mut best_cost = Aabb::combined_area(leaf_box, &root_node.aabb);

        // (node, inherited cost, lower bound); the root is always expanded
        let mut stack = vec![(root, best_cost - root_node.area(), f64::NEG_INFINITY)];

        while let Some((key, inherited, bound)) = stack.pop() {
            if bound >= best_cost {
                continue;
            }
            let Some((left, right)) = self.nodes[key].children() else {
                continue;
            };

            let left_node = &self.nodes[left];
            let right_node = &self.nodes[right];

            let direct_l = Aabb::combined_area(leaf_box, &left_node.aabb);
            let current_l = direct_l + inherited;
            let inherited_l = inherited + direct_l - left_node.area();

            let direct_r = Aabb::combined_area(leaf_box, &right_node.aabb);
            let current_r = direct_r + inherited;
            let inherited_r = inherited + direct_r - right_node.area();

            if current_l <= current_r {
                if current_l < best_cost {
                    best_node = left;
                    best_cost = current_l;
                }
            } else if current_r < best_cost {
                best_node = right;
                best_cost = current_r;
            }

            let entry_l = (left, inherited_l, leaf_area + inherited_l);
            let entry_r = (right, inherited_r, leaf_area + inherited_r);
            let (first, second) = if inherited_r > inherited_l {
                (entry_l, entry_r)
            } else {
                (entry_r, entry_l)
            };

            // `second` can only be cheaper than `first`'s bound allows if `first` is
            if first.2 >= best_cost {
                continue;
            }
            if second.2 < best_cost {
                stack.push(second);
            }
            stack.push(first);
        }

        Some(best_node)
    }

    // ===== REFIT / ROTATION =====

    /// Recompute one internal node's box and cached area from its children.
    fn refit_node(&mut self, key: NodeKey) {
        let Some((left, right)) = self.nodes[key].children() else {
            return;
        };
        let aabb = Aabb::union(&self.nodes[left].aabb, &self.nodes[right].aabb, self.config.margin);

        let node = &mut self.nodes[key];
        node.aabb = aabb;
        if let NodeKind::Internal { area, .. } = &mut node.kind {
            *area = aabb.area();
        }
    }

    /// Refit every node from `start` up to the root.
    fn refit(&mut self, start: Option<NodeKey>) {
        let mut current = start;
        while let Some(key) = current {
            self.refit_node(key);
            current = self.nodes[key].parent;
        }
    }

    /// Refit every node from `start` up to the root, rotating each one.
    fn refit_and_rotate(&mut self, start: Option<NodeKey>) {
        let mut current = start;
        while let Some(key) = current {
            self.refit_node(key);
            self.rotate(key);
            current = self.nodes[key].parent;
        }
    }

    /// (left, right, cached area) of an internal node
    fn internal_parts(&self, key: NodeKey) -> Option<(NodeKey, NodeKey, f64)> {
        match self.nodes[key].kind {
            NodeKind::Internal { left, right, area } => Some((left, right, area)),
            NodeKind::Leaf { .. } => None,
        }
    }

    /// Greedy local rotation at `key`.
    ///
    /// Swapping a child with one of its nephews shrinks the nephew's old
    /// parent to the union of the child and the other nephew. Candidates are
    /// evaluated in the order L<->R.left, L<->R.right, R<->L.left, R<->L.right
    /// and one replaces the best only with a strictly larger gain, so the
    /// first of equal candidates wins. Gains must exceed the tolerance.
    fn rotate(&mut self, key: NodeKey) {
        let Some((left, right, _)) = self.internal_parts(key) else {
            return;
        };
        let left_box = self.nodes[left].aabb;
        let right_box = self.nodes[right].aabb;

        let mut best: Option<(NodeKey, NodeKey)> = None;
        let mut best_gain = self.config.rotation_tolerance;

        if let Some((rl, rr, r_area)) = self.internal_parts(right) {
            let rl_box = self.nodes[rl].aabb;
            let rr_box = self.nodes[rr].aabb;

            let gain = r_area - Aabb::combined_area(&left_box, &rr_box);
            if gain > best_gain {
                best = Some((left, rl));
                best_gain = gain;
            }
            let gain = r_area - Aabb::combined_area(&left_box, &rl_box);
            if gain > best_gain {
                best = Some((left, rr));
                best_gain = gain;
            }
        }

        if let Some((ll, lr, l_area)) = self.internal_parts(left) {
            let ll_box = self.nodes[ll].aabb;
            let lr_box = self.nodes[lr].aabb;

            let gain = l_area - Aabb::combined_area(&right_box, &lr_box);
            if gain > best_gain {
                best = Some((right, ll));
                best_gain = gain;
            }
            let gain = l_area - Aabb::combined_area(&right_box, &ll_box);
            if gain > best_gain {
                best = Some((right, lr));
            }
        }

        if let Some((child, nephew)) = best {
            self.swap(child, nephew);
            // Leaf depths changed, so nested margins changed too
            self.refit_node(key);
        }
    }

    /// Exchange a child with a nephew and refit the nephew's former parent.
    fn swap(&mut self, child: NodeKey, nephew: NodeKey) {
        let (Some(parent_child), Some(parent_nephew)) =
            (self.nodes[child].parent, self.nodes[nephew].parent)
        else {
            return;
        };

        self.replace_child(parent_child, child, nephew);
        self.replace_child(parent_nephew, nephew, child);

        self.nodes[child].parent = Some(parent_nephew);
        self.nodes[nephew].parent = Some(parent_child);

        self.refit_node(parent_nephew);
    }

    // ===== CONSISTENCY =====

    /// Check the structural, coverage and count invariants of the whole tree.
    ///
    /// - every internal box encloses both children (it is their margin union
    ///   right after a refit, a leaf may drift into the margin afterwards) and
    ///   its cached area equals the box area
    /// - every child points back to its parent
    /// - every leaf box lies inside every ancestor box
    /// - `internal nodes = leaves - 1` and every arena node is reachable
    pub fn validate(&self) -> Result<()> {
        let violation = |msg: String| Err(Self::log_and_return_error(Error::InvariantViolation(msg)));

        let Some(root) = self.root else {
            if self.nodes.is_empty() && self.leaf_count == 0 {
                return Ok(());
            }
            return violation(format!("empty tree still owns {} nodes", self.nodes.len()));
        };
        if self.nodes[root].parent.is_some() {
            return violation(format!("root {:?} has a parent", root));
        }

        let mut leaves = 0usize;
        let mut internals = 0usize;
        let mut stack = vec![root];

        while let Some(key) = stack.pop() {
            let Some(node) = self.nodes.get(key) else {
                return violation(format!("{:?} is linked but not allocated", key));
            };

            let mut ancestor = node.parent;
            while let Some(a) = ancestor {
                if !self.nodes[a].aabb.contains(&node.aabb) {
                    return violation(format!("{:?} escapes ancestor {:?}", key, a));
                }
                ancestor = self.nodes[a].parent;
            }

            match node.kind {
                NodeKind::Leaf { .. } => leaves += 1,
                NodeKind::Internal { left, right, area } => {
                    internals += 1;
                    for child in [left, right] {
                        if self.nodes.get(child).and_then(|c| c.parent) != Some(key) {
                            return violation(format!("{:?} does not point back to {:?}", child, key));
                        }
                    }
                    let children = Aabb::union(&self.nodes[left].aabb, &self.nodes[right].aabb, 0.0);
                    if !node.aabb.contains(&children) {
                        return violation(format!("{:?} box does not enclose its children", key));
                    }
                    if !approx_eq(area, node.aabb.area()) {
                        return violation(format!("{:?} cached area is stale", key));
                    }
                    stack.push(left);
                    stack.push(right);
                }
            }
        }

        if internals + 1 != leaves {
            return violation(format!("{} internal nodes for {} leaves", internals, leaves));
        }
        if leaves != self.leaf_count || leaves + internals != self.nodes.len() {
            return violation(format!(
                "{} reachable nodes, {} allocated, {} leaves counted",
                leaves + internals,
                self.nodes.len(),
                self.leaf_count
            ));
        }
        Ok(())
    }

    /// [`Self::validate`], plus every internal box must equal the margin
    /// union of its children exactly.
    ///
    /// Holds after insert, delete and any move that relocates its leaf. A
    /// move that stays inside the parent box leaves the ancestors looser and
    /// fails this check until the next refit of that branch.
    pub fn validate_tight(&self) -> Result<()> {
        self.validate()?;

        for (key, node) in self.nodes.iter() {
            let Some((left, right)) = node.children() else {
                continue;
            };
            let expected = Aabb::union(&self.nodes[left].aabb, &self.nodes[right].aabb, self.config.margin);
            if node.aabb != expected {
                return Err(Self::log_and_return_error(Error::InvariantViolation(format!(
                    "{:?} box is not the margin union of its children",
                    key
                ))));
            }
        }
        Ok(())
    }
}

fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() <= 1e-9 * (1.0 + a.abs().max(b.abs()))
}

#[cfg(test)]
#[path = "builder_tests.rs"]
mod tests;
