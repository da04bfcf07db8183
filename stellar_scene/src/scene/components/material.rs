/// Material component - surface parameters carried for the renderer.

use glam::Vec4;
use crate::scene::component::ComponentHooks;

#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    /// Linear RGBA base colour
    pub color: Vec4,
    /// Resource UID of the base colour texture
    pub texture: Option<u64>,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            color: Vec4::ONE,
            texture: None,
        }
    }
}

impl Material {
    pub fn new(color: Vec4) -> Self {
        Self { color, texture: None }
    }

    pub fn with_texture(mut self, texture: u64) -> Self {
        self.texture = Some(texture);
        self
    }
}

impl ComponentHooks for Material {}
