/// Light component.
///
/// Point and spot lights contribute their range as a box around the node
/// origin, so they are found by frustum queries that reach their area of
/// influence. Directional lights have no position and contribute nothing.

use glam::{Mat4, Vec3};
use crate::math::AABB;
use crate::scene::component::ComponentHooks;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LightKind {
    Directional,
    Point { range: f32 },
    /// Cone angles in radians
    Spot { range: f32, inner_cone: f32, outer_cone: f32 },
}

impl LightKind {
    pub fn range(&self) -> Option<f32> {
        match *self {
            LightKind::Directional => None,
            LightKind::Point { range } | LightKind::Spot { range, .. } => Some(range),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Light {
    pub kind: LightKind,
    pub color: Vec3,
    pub intensity: f32,
    world_position: Vec3,
    world_direction: Vec3,
}

impl Light {
    pub fn new(kind: LightKind, color: Vec3, intensity: f32) -> Self {
        Self {
            kind,
            color,
            intensity,
            world_position: Vec3::ZERO,
            world_direction: Vec3::NEG_Z,
        }
    }

    pub fn directional(color: Vec3, intensity: f32) -> Self {
        Self::new(LightKind::Directional, color, intensity)
    }

    pub fn point(color: Vec3, intensity: f32, range: f32) -> Self {
        Self::new(LightKind::Point { range }, color, intensity)
    }

    pub fn spot(color: Vec3, intensity: f32, range: f32, inner_cone: f32, outer_cone: f32) -> Self {
        Self::new(LightKind::Spot { range, inner_cone, outer_cone }, color, intensity)
    }

    /// World position as of the last transform pass
    pub fn world_position(&self) -> Vec3 {
        self.world_position
    }

    /// World -Z axis of the owning node, normalized
    pub fn world_direction(&self) -> Vec3 {
        self.world_direction
    }
}

impl Default for Light {
    fn default() -> Self {
        Self::point(Vec3::ONE, 1.0, 10.0)
    }
}

impl ComponentHooks for Light {
    fn on_transform_update(&mut self, global: &Mat4) {
        self.world_position = global.w_axis.truncate();
        self.world_direction = global.transform_vector3(Vec3::NEG_Z).normalize_or_zero();
    }

    fn enclose_local_box(&self, local_box: &mut AABB) {
        if let Some(range) = self.kind.range() {
            if range > 0.0 {
                local_box.enclose(&AABB::from_center_half_extents(Vec3::ZERO, Vec3::splat(range)));
            }
        }
    }
}
