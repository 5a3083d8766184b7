/*!
# Galaxy 3D BVH

Dynamic bounding volume hierarchy for spatial queries over moving objects.

Objects are inserted one at a time with their axis-aligned box and can be
moved or removed at any moment. Each insertion picks the placement with the
lowest surface area growth, then refits and locally rotates the ancestors,
so the tree stays efficient without ever being rebuilt.

## Architecture

- **Aabb / Ray / Frustum**: box arithmetic, slab test, plane-mask culling
- **IncrementalBuilder**: node arena, insert/delete/move, best-sibling search,
  refit and rotations
- **Bvh**: public tree type with ray, frustum and generic traversals
- **BvhInspector**: node counts, leaf depths and SAH score
- **SceneBvh**: keyed index mapping host objects to tree leaves
*/

// Internal modules
mod error;
pub mod log;
pub mod math;
pub mod scene;
pub mod tree;

// Main galaxy3d namespace module
pub mod galaxy3d {
    // Error types
    pub use crate::error::{Error, Result};

    // Tree types
    pub use crate::tree::{Bvh, BvhConfig, BvhInspector, Node, NodeKey, NodeKind};

    // Logging sub-module (types only, NOT macros)
    pub mod log {
        pub use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger, set_logger, reset_logger};
    }

    // Math sub-module
    pub mod math {
        pub use crate::math::*;
    }

    // Tree sub-module with builder internals and cost constants
    pub mod tree {
        pub use crate::tree::*;
    }

    // Scene sub-module
    pub mod scene {
        pub use crate::scene::*;
    }
}

// Re-export math library at crate root
pub use glam;
