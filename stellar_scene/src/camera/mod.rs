//! Camera module - camera component and frustum.
//!
//! The camera provides view/projection matrices and a frustum volume
//! for visibility queries. Rendering itself happens elsewhere.

mod camera;
mod frustum;

pub use camera::{Camera, Projection};
pub use frustum::{
    Frustum, FrustumTest,
    PLANE_LEFT, PLANE_RIGHT, PLANE_BOTTOM, PLANE_TOP, PLANE_NEAR, PLANE_FAR,
};
