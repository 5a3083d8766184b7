//! Scene module: keyed spatial index over host objects.
//!
//! Adapts the handle-based [`crate::tree::Bvh`] to hosts that identify
//! their objects by their own keys.

mod scene_bvh;
mod scene_index;

pub use scene_bvh::SceneBvh;
pub use scene_index::SceneIndex;
