//! Scene module
//!
//! Node hierarchy, component registry, static/dynamic partitioning,
//! picking and scene persistence.

mod transform;
mod node;
mod uid;
mod raycast;
mod scene_manager;
pub mod component;
pub mod components;
pub mod persistence;

pub use transform::Transform;
pub use node::{Node, NodeKey, Uid};
pub use uid::{RandomUidSource, UidSource};
pub use raycast::{MeshProbe, RayHit};
pub use scene_manager::{PlayState, SceneManager, SceneStats};
pub use component::{
    ComponentHooks, ComponentId, ComponentState, ComponentType, ComponentTypes, Components, Slot,
};
pub use components::{Light, LightKind, Material, Mesh};
pub use persistence::{JsonFileStore, MemoryStore, SceneDocument, SceneStore};
