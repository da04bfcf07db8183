//! Concrete component types attached through the component registry.
//!
//! The camera component lives in `crate::camera` next to its frustum.

mod light;
mod material;
mod mesh;

pub use light::{Light, LightKind};
pub use material::Material;
pub use mesh::Mesh;
