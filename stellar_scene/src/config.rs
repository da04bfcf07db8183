//! Scene configuration.
//!
//! Loaded from a JSON section; every key is optional.

use glam::Vec3;
use serde::{Deserialize, Serialize};
use crate::error::{Error, Result};
use crate::math::AABB;
use crate::spatial::MAX_OCTREE_DEPTH;
use crate::engine_warn;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// Half the side of the cube covered by the octree
    pub octree_half_extent: f32,
    /// Octree depth (root = 0)
    pub octree_max_depth: u32,
    pub octree_center: [f32; 3],
    /// Seed for the unique-ID source. `None` seeds from the OS.
    pub uid_seed: Option<u64>,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            octree_half_extent: 50.0,
            octree_max_depth: 4,
            octree_center: [0.0; 3],
            uid_seed: None,
        }
    }
}

impl SceneConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::InvalidConfig(e.to_string()))
    }

    /// Return a usable copy of this config.
    ///
    /// Invalid octree bounds degrade to an unbounded, root-only index.
    /// Depth is clamped to `MAX_OCTREE_DEPTH`.
    pub fn validated(&self) -> Self {
        let mut config = self.clone();
        if config.octree_max_depth > MAX_OCTREE_DEPTH {
            engine_warn!("stellar::SceneConfig",
                "Octree depth {} exceeds the maximum of {}, clamping",
                config.octree_max_depth, MAX_OCTREE_DEPTH);
            config.octree_max_depth = MAX_OCTREE_DEPTH;
        }
        let center_ok = config.octree_center.iter().all(|c| c.is_finite());
        if !config.octree_half_extent.is_finite() || config.octree_half_extent <= 0.0 || !center_ok {
            engine_warn!("stellar::SceneConfig",
                "Invalid octree bounds (half extent {}, center {:?}), using an unbounded root-only index",
                config.octree_half_extent, config.octree_center);
            config.octree_half_extent = f32::INFINITY;
            config.octree_center = [0.0; 3];
            config.octree_max_depth = 0;
        }
        config
    }

    /// World-space bounds covered by the octree
    pub fn octree_bounds(&self) -> AABB {
        if !self.octree_half_extent.is_finite() {
            return AABB::unbounded();
        }
        AABB::from_center_half_extents(
            Vec3::from_array(self.octree_center),
            Vec3::splat(self.octree_half_extent),
        )
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
