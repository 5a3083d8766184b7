//! Tree module: node arena, incremental builder and queries.
//!
//! The tree is not internally synchronized: mutate it from one thread,
//! and never run a query concurrently with a mutation.

mod builder;
mod bvh;
mod config;
mod inspector;
mod node;

#[cfg(test)]
mod test_support;

pub use builder::IncrementalBuilder;
pub use bvh::Bvh;
pub use config::BvhConfig;
pub use inspector::{BvhInspector, LEAF_INTERSECT_COST, TRAVERSAL_COST};
pub use node::{Node, NodeKey, NodeKind};
