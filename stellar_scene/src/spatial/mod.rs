//! Spatial acceleration for static scene nodes.

mod line_probe;
mod octree;

pub use line_probe::LineProbe;
pub use octree::{Octree, MAX_OCTREE_DEPTH};
