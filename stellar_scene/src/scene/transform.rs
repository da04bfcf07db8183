/// Transform - local/global affine pose of a scene node.
///
/// Propagation is pull-based: local mutations only store the new local
/// matrix and raise `local_changed`. The global matrix is recomputed by
/// `update_transform` during the scene manager's transform pass, which
/// also clears the flag. Until then `global_transform` returns the last
/// computed value.
///
/// The local matrix is the source of truth. Translation, rotation and
/// scale are cached from it (decomposition drops shear).

use glam::{Mat4, Quat, Vec3};
use super::component::ComponentHooks;

#[derive(Debug, Clone)]
pub struct Transform {
    translation: Vec3,
    rotation: Quat,
    scale: Vec3,
    local: Mat4,
    global: Mat4,
    local_changed: bool,
}

impl Default for Transform {
    fn default() -> Self {
        Self::new()
    }
}

impl Transform {
    /// Identity transform, flagged as changed so the first pass computes it
    pub fn new() -> Self {
        Self {
            translation: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
            local: Mat4::IDENTITY,
            global: Mat4::IDENTITY,
            local_changed: true,
        }
    }

    pub fn from_trs(translation: Vec3, rotation: Quat, scale: Vec3) -> Self {
        let mut transform = Self::new();
        transform.set_trs(translation, rotation, scale);
        transform
    }

    // ===== LOCAL =====

    /// Store a new local matrix. The global matrix is NOT recomputed.
    pub fn set_local_transform(&mut self, local: Mat4) {
        let (scale, rotation, translation) = local.to_scale_rotation_translation();
        self.translation = translation;
        self.rotation = rotation;
        self.scale = scale;
        self.local = local;
        self.local_changed = true;
    }

    pub fn set_trs(&mut self, translation: Vec3, rotation: Quat, scale: Vec3) {
        self.translation = translation;
        self.rotation = rotation;
        self.scale = scale;
        self.local = Mat4::from_scale_rotation_translation(scale, rotation, translation);
        self.local_changed = true;
    }

    pub fn set_translation(&mut self, translation: Vec3) {
        self.set_trs(translation, self.rotation, self.scale);
    }

    pub fn set_rotation(&mut self, rotation: Quat) {
        self.set_trs(self.translation, rotation, self.scale);
    }

    pub fn set_scale(&mut self, scale: Vec3) {
        self.set_trs(self.translation, self.rotation, scale);
    }

    pub fn translation(&self) -> Vec3 {
        self.translation
    }

    pub fn rotation(&self) -> Quat {
        self.rotation
    }

    pub fn scale(&self) -> Vec3 {
        self.scale
    }

    pub fn local_transform(&self) -> &Mat4 {
        &self.local
    }

    /// True until the next propagation consumes the local change
    pub fn has_changed(&self) -> bool {
        self.local_changed
    }

    /// Force the next transform pass to recompute this node
    pub fn mark_changed(&mut self) {
        self.local_changed = true;
    }

    // ===== GLOBAL =====

    /// Recompute `global = parent_global * local`, clear the change flag
    /// and return the new global matrix for the children.
    pub fn update_transform(&mut self, parent_global: &Mat4) -> Mat4 {
        self.global = *parent_global * self.local;
        self.local_changed = false;
        self.global
    }

    /// Last computed global matrix (may be stale until the next pass)
    pub fn global_transform(&self) -> &Mat4 {
        &self.global
    }

    pub fn world_position(&self) -> Vec3 {
        self.global.w_axis.truncate()
    }
}

impl ComponentHooks for Transform {}

#[cfg(test)]
#[path = "transform_tests.rs"]
mod tests;
