/*!
# Jasim Perception

Spatial index answering "what can this agent perceive" for multi-agent
simulations.

Situated entities are indexed by a dynamic quad tree (2D) or oct tree (3D).
Each agent carries a frustum, and the entities it perceives are found by
culling the tree bottom-up from the agent's own node.

## Architecture

- **PerceptionTree**: arena of nodes with an entity -> node reverse index
- **TreeManipulator**: insert / remove / reorder, structural work deferred to `commit()`
- **TreeBuilder**: one-pass bulk construction
- **Frustum**: perception volumes (circle, front cone, pyramid, sphere)
- **BottomUpFrustumCullingIterator**: lazy culling from the perceiver's node
- **Environment**: mutate -> commit -> parallel perceive tick cycle

A tick always runs its mutations first and commits them. Queries come after
the commit, and they may run concurrently.
*/

// Internal modules
mod error;
mod engine;
pub mod log;
pub mod bounds;
pub mod zone;
pub mod space;
pub mod config;
pub mod tree;
pub mod frustum;
pub mod culling;
pub mod environment;

// Main jasim namespace module
pub mod jasim {
    // Error types
    pub use crate::error::{Error, Result};

    // Engine singleton
    pub use crate::engine::Engine;

    // Top-level façade
    pub use crate::environment::Environment;
    pub use crate::config::{IcosepPolicy, TreeConfig};

    // Logging sub-module (types only, NOT macros)
    pub mod log {
        pub use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger};
    }

    // Geometry sub-module
    pub mod geometry {
        pub use crate::bounds::{Aabb2, Aabb3, Bounds};
        pub use crate::space::{OctSpace, QuadSpace, Space};
        pub use crate::zone::*;
    }

    // Tree sub-module
    pub mod tree {
        pub use crate::tree::*;
    }

    // Frustum sub-module
    pub mod frustum {
        pub use crate::frustum::*;
    }

    // Culling sub-module
    pub mod culling {
        pub use crate::culling::*;
    }
}

// Re-export math library at crate root
pub use glam;
