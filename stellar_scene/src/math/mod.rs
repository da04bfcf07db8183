//! Geometry primitives for bounding volumes and picking.

mod aabb;
mod obb;
mod ray;
mod triangle;

pub use aabb::AABB;
pub use obb::OrientedBox;
pub use ray::{Ray, LineSegment};
pub use triangle::Triangle;
