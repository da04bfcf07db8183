//! Resource management module
//!
//! Provides the mesh data consumed by mesh components and ray casting.

mod resource_manager;
pub mod mesh_resource;

pub use resource_manager::ResourceManager;
pub use mesh_resource::{
    MeshResource, MeshResourceDesc,
    PRIMITIVE_CUBE, PRIMITIVE_PLANE, PRIMITIVE_SPHERE,
};
