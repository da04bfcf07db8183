/*!
# Stellar Scene

Scene graph and spatial indexing for interactive 3D applications.

This crate organizes world objects into a node hierarchy, keeps them
spatially queryable, and answers picking and visibility queries. Rendering,
asset import and windowing live elsewhere and talk to the scene through
narrow interfaces (mesh data, camera frustums, scene documents).

## Architecture

- **SceneManager**: owns the node tree, drives the per-frame passes, answers queries
- **Node**: transform, typed components and children
- **Octree**: spatial index over static nodes
- **Ray / LineSegment**: picking probes, tested against boxes then mesh triangles
- **SceneStore**: where scene documents are read and written

The scene is an explicitly constructed object. The logger is the only
process-wide state.
*/

// Internal modules
mod error;
mod engine;
mod config;
pub mod log;
pub mod math;
pub mod camera;
pub mod resource;
pub mod spatial;
pub mod scene;

// Main stellar namespace module
pub mod stellar {
    // Error types
    pub use crate::error::{Error, Result};

    // Logging front-end
    pub use crate::engine::Engine;

    // Scene configuration
    pub use crate::config::SceneConfig;

    // Logging sub-module (types only; the engine_* macros are exported at the crate root)
    pub mod log {
        pub use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger, CaptureLogger};
    }

    // Geometry primitives
    pub mod math {
        pub use crate::math::*;
    }

    // Camera component and frustum
    pub mod camera {
        pub use crate::camera::*;
    }

    // Mesh resources
    pub mod resource {
        pub use crate::resource::*;
    }

    // Spatial index
    pub mod spatial {
        pub use crate::spatial::*;
    }

    // Scene sub-module
    pub mod scene {
        pub use crate::scene::*;
    }
}

// Re-export math library at crate root
pub use glam;
