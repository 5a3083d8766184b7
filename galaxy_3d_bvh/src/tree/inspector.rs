/// BvhInspector: read-only statistics about a tree's shape and quality.
///
/// The surface score is the SAH cost proxy of the whole tree: every
/// internal node is weighted by the cost of one traversal step, every leaf
/// by the cost of one primitive test. Lower is better for ray queries.

use super::bvh::Bvh;

/// Cost of testing one leaf's primitive relative to one traversal step
pub const LEAF_INTERSECT_COST: f64 = 1.25;

/// Cost of descending through one internal node
pub const TRAVERSAL_COST: f64 = 1.0;

/// Snapshot of tree statistics, refreshed by [`BvhInspector::update`].
///
/// Depths count edges from the root (a lone root leaf has depth 0). An
/// empty tree reports zero everywhere.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BvhInspector {
    /// Leaves plus internal nodes
    pub total_nodes: usize,
    pub total_leaf_nodes: usize,
    /// Σ leaf area × LEAF_INTERSECT_COST + Σ internal area × TRAVERSAL_COST
    pub surface_score: f64,
    /// Depth of the shallowest leaf
    pub min_depth: usize,
    /// Depth of the deepest leaf
    pub max_depth: usize,
}

impl BvhInspector {
    /// Inspect `bvh` right away.
    pub fn new<T>(bvh: &Bvh<T>) -> Self {
        let mut inspector = Self::default();
        inspector.update(bvh);
        inspector
    }

    /// Recompute every statistic from the current state of `bvh`.
    pub fn update<T>(&mut self, bvh: &Bvh<T>) {
        *self = Self::default();
        let mut min_depth = usize::MAX;

        bvh.traverse(|_, node, depth| {
            self.total_nodes += 1;

            if node.is_leaf() {
                self.total_leaf_nodes += 1;
                self.surface_score += node.aabb().area() * LEAF_INTERSECT_COST;
                min_depth = min_depth.min(depth);
                self.max_depth = self.max_depth.max(depth);
            } else {
                self.surface_score += node.aabb().area() * TRAVERSAL_COST;
            }
            false
        });

        if self.total_leaf_nodes > 0 {
            self.min_depth = min_depth;
        }
    }

    /// Total number of internal nodes
    pub fn total_internal_nodes(&self) -> usize {
        self.total_nodes - self.total_leaf_nodes
    }
}

#[cfg(test)]
#[path = "inspector_tests.rs"]
mod tests;
