/// Camera component.
///
/// Owns the projection parameters and caches the derived matrices:
/// - view = inverse of the owning node's global matrix, refreshed on every
///   transform update
/// - projection, rebuilt lazily in the update hook after a parameter changed
/// - frustum, rebuilt whenever either matrix changes
///
/// Visibility queries read `frustum()`.

use glam::{Mat4, Vec4};
use crate::scene::ComponentHooks;
use super::frustum::Frustum;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Projection {
    Perspective,
    Orthographic,
}

#[derive(Debug, Clone)]
pub struct Camera {
    projection: Projection,
    /// Vertical field of view in radians
    fov: f32,
    aspect: f32,
    near: f32,
    far: f32,
    /// Half height of the orthographic view volume
    ortho_size: f32,
    /// Whether this camera culls with its frustum
    pub culling: bool,
    pub background: Vec4,

    view_matrix: Mat4,
    projection_matrix: Mat4,
    frustum: Frustum,
    projection_dirty: bool,
}

impl Default for Camera {
    fn default() -> Self {
        Self::perspective(60f32.to_radians(), 16.0 / 9.0, 0.1, 1000.0)
    }
}

impl Camera {
    pub fn perspective(fov: f32, aspect: f32, near: f32, far: f32) -> Self {
        let mut camera = Self {
            projection: Projection::Perspective,
            fov,
            aspect,
            near,
            far,
            ortho_size: 10.0,
            culling: true,
            background: Vec4::new(0.0, 0.0, 0.0, 1.0),
            view_matrix: Mat4::IDENTITY,
            projection_matrix: Mat4::IDENTITY,
            frustum: Frustum::default(),
            projection_dirty: true,
        };
        camera.update_projection();
        camera
    }

    pub fn orthographic(ortho_size: f32, aspect: f32, near: f32, far: f32) -> Self {
        let mut camera = Self::perspective(60f32.to_radians(), aspect, near, far);
        camera.projection = Projection::Orthographic;
        camera.ortho_size = ortho_size;
        camera.update_projection();
        camera
    }

    // ===== PARAMETERS =====

    pub fn projection(&self) -> Projection {
        self.projection
    }

    pub fn fov(&self) -> f32 {
        self.fov
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    pub fn near(&self) -> f32 {
        self.near
    }

    pub fn far(&self) -> f32 {
        self.far
    }

    pub fn ortho_size(&self) -> f32 {
        self.ortho_size
    }

    pub fn set_projection(&mut self, projection: Projection) {
        self.projection = projection;
        self.projection_dirty = true;
    }

    pub fn set_fov(&mut self, fov: f32) {
        self.fov = fov;
        self.projection_dirty = true;
    }

    pub fn set_aspect(&mut self, aspect: f32) {
        self.aspect = aspect;
        self.projection_dirty = true;
    }

    pub fn set_clip_planes(&mut self, near: f32, far: f32) {
        self.near = near;
        self.far = far;
        self.projection_dirty = true;
    }

    pub fn set_ortho_size(&mut self, ortho_size: f32) {
        self.ortho_size = ortho_size;
        self.projection_dirty = true;
    }

    /// True when a parameter changed since the projection was last rebuilt
    pub fn is_projection_dirty(&self) -> bool {
        self.projection_dirty
    }

    // ===== DERIVED =====

    /// View matrix (inverse of the camera's world transform).
    pub fn view_matrix(&self) -> &Mat4 {
        &self.view_matrix
    }

    pub fn projection_matrix(&self) -> &Mat4 {
        &self.projection_matrix
    }

    /// Combined view-projection matrix (projection * view).
    pub fn view_projection_matrix(&self) -> Mat4 {
        self.projection_matrix * self.view_matrix
    }

    pub fn frustum(&self) -> &Frustum {
        &self.frustum
    }

    /// Rebuild the projection matrix and frustum from the parameters
    pub fn update_projection(&mut self) {
        self.projection_matrix = match self.projection {
            Projection::Perspective => {
                Mat4::perspective_rh(self.fov, self.aspect, self.near, self.far)
            }
            Projection::Orthographic => {
                let h = self.ortho_size;
                let w = h * self.aspect;
                Mat4::orthographic_rh(-w, w, -h, h, self.near, self.far)
            }
        };
        self.projection_dirty = false;
        self.update_frustum();
    }

    fn update_frustum(&mut self) {
        self.frustum = Frustum::from_view_projection(&self.view_projection_matrix());
    }
}

impl ComponentHooks for Camera {
    fn on_update(&mut self, _dt: f32) {
        if self.projection_dirty {
            self.update_projection();
        }
    }

    fn on_transform_update(&mut self, global: &Mat4) {
        let view = global.inverse();
        if view.is_finite() {
            self.view_matrix = view;
            self.update_frustum();
        }
    }
}

#[cfg(test)]
#[path = "camera_tests.rs"]
mod tests;
