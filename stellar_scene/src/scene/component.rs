//! Component registry - the typed capability slots attached to a node.
//!
//! Each capability has its own storage so access is exhaustive at compile
//! time: the Transform slot always exists, Material is an optional
//! singleton, Mesh, Camera and Light are growable lists. A presence mask
//! (`ComponentTypes`) mirrors what is attached.
//!
//! Hook dispatch walks the slots in a fixed order: transform, material,
//! meshes, cameras, lights (insertion order within each list).

use bitflags::bitflags;
use glam::Mat4;
use crate::camera::Camera;
use crate::math::AABB;
use super::components::{Light, Material, Mesh};
use super::transform::Transform;

// ============================================================================
// TYPES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentType {
    Transform,
    Mesh,
    Material,
    Camera,
    Light,
}

impl ComponentType {
    pub const ALL: [ComponentType; 5] = [
        ComponentType::Transform,
        ComponentType::Mesh,
        ComponentType::Material,
        ComponentType::Camera,
        ComponentType::Light,
    ];

    /// Singleton types allow at most one instance per node
    pub fn is_singleton(self) -> bool {
        matches!(self, ComponentType::Transform | ComponentType::Material)
    }

    pub fn mask(self) -> ComponentTypes {
        match self {
            ComponentType::Transform => ComponentTypes::TRANSFORM,
            ComponentType::Mesh => ComponentTypes::MESH,
            ComponentType::Material => ComponentTypes::MATERIAL,
            ComponentType::Camera => ComponentTypes::CAMERA,
            ComponentType::Light => ComponentTypes::LIGHT,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ComponentType::Transform => "Transform",
            ComponentType::Mesh => "Mesh",
            ComponentType::Material => "Material",
            ComponentType::Camera => "Camera",
            ComponentType::Light => "Light",
        }
    }
}

bitflags! {
    /// Presence mask of the component types attached to a node
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct ComponentTypes: u32 {
        const TRANSFORM = 1 << 0;
        const MESH      = 1 << 1;
        const MATERIAL  = 1 << 2;
        const CAMERA    = 1 << 3;
        const LIGHT     = 1 << 4;
    }
}

/// Identifies a component within its node. Never reused by that node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentId(u32);

impl ComponentId {
    /// The transform slot is always the first component of a node
    pub const TRANSFORM: ComponentId = ComponentId(0);

    pub fn index(self) -> u32 {
        self.0
    }
}

// ============================================================================
// HOOKS
// ============================================================================

/// Lifecycle callbacks every component type may override.
///
/// The scene manager calls them at fixed phase boundaries; none of them
/// can reach back into the scene.
pub trait ComponentHooks {
    /// First pre-update after the component was attached
    fn on_start(&mut self) {}
    fn on_enable(&mut self) {}
    fn on_disable(&mut self) {}
    fn on_pre_update(&mut self, _dt: f32) {}
    fn on_update(&mut self, _dt: f32) {}
    /// The owning node's global matrix was recomputed
    fn on_transform_update(&mut self, _global: &Mat4) {}
    /// The component is being released (removal or node destruction)
    fn on_finish(&mut self) {}
    fn on_play(&mut self) {}
    fn on_stop(&mut self) {}
    fn on_pause(&mut self) {}
    fn on_unpause(&mut self) {}

    /// Grow `local_box` by this component's object-space bounds
    fn enclose_local_box(&self, _local_box: &mut AABB) {}
}

/// Per-instance bookkeeping shared by every slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComponentState {
    pub id: ComponentId,
    pub active: bool,
    /// Set once `on_start` has run; unstarted components skip `on_update`
    pub started: bool,
}

#[derive(Debug, Clone)]
pub struct Slot<T> {
    pub state: ComponentState,
    pub component: T,
}

impl<T: ComponentHooks> Slot<T> {
    fn new(id: ComponentId, component: T) -> Self {
        Self {
            state: ComponentState { id, active: true, started: false },
            component,
        }
    }

    fn parts(&self) -> (&ComponentState, &dyn ComponentHooks) {
        (&self.state, &self.component)
    }

    fn parts_mut(&mut self) -> (&mut ComponentState, &mut dyn ComponentHooks) {
        (&mut self.state, &mut self.component)
    }
}

// ============================================================================
// COMPONENTS
// ============================================================================

/// All components owned by one node.
#[derive(Debug, Clone)]
pub struct Components {
    transform: Slot<Transform>,
    material: Option<Slot<Material>>,
    meshes: Vec<Slot<Mesh>>,
    cameras: Vec<Slot<Camera>>,
    lights: Vec<Slot<Light>>,
    types: ComponentTypes,
    next_id: u32,
    to_remove: Vec<ComponentId>,
}

impl Default for Components {
    fn default() -> Self {
        Self::new()
    }
}

impl Components {
    pub fn new() -> Self {
        Self {
            transform: Slot::new(ComponentId::TRANSFORM, Transform::new()),
            material: None,
            meshes: Vec::new(),
            cameras: Vec::new(),
            lights: Vec::new(),
            types: ComponentTypes::TRANSFORM,
            next_id: 1,
            to_remove: Vec::new(),
        }
    }

    fn allocate_id(&mut self) -> ComponentId {
        let id = ComponentId(self.next_id);
        self.next_id += 1;
        id
    }

    // ===== ADD =====

    /// Attach a material. Returns `None` if the node already has one.
    pub fn add_material(&mut self, material: Material) -> Option<ComponentId> {
        if self.material.is_some() {
            return None;
        }
        let id = self.allocate_id();
        self.material = Some(Slot::new(id, material));
        self.types |= ComponentTypes::MATERIAL;
        Some(id)
    }

    pub fn add_mesh(&mut self, mesh: Mesh) -> ComponentId {
        let id = self.allocate_id();
        self.meshes.push(Slot::new(id, mesh));
        self.types |= ComponentTypes::MESH;
        id
    }

    pub fn add_camera(&mut self, camera: Camera) -> ComponentId {
        let id = self.allocate_id();
        self.cameras.push(Slot::new(id, camera));
        self.types |= ComponentTypes::CAMERA;
        id
    }

    pub fn add_light(&mut self, light: Light) -> ComponentId {
        let id = self.allocate_id();
        self.lights.push(Slot::new(id, light));
        self.types |= ComponentTypes::LIGHT;
        id
    }

    // ===== DEFERRED REMOVAL =====

    /// Queue a component for removal at the next pre-update.
    ///
    /// Returns false for the transform and for unknown ids. Queueing the
    /// same id twice is harmless.
    pub fn queue_removal(&mut self, id: ComponentId) -> bool {
        if id == ComponentId::TRANSFORM || self.state(id).is_none() {
            return false;
        }
        if !self.to_remove.contains(&id) {
            self.to_remove.push(id);
        }
        true
    }

    pub fn pending_removals(&self) -> &[ComponentId] {
        &self.to_remove
    }

    /// Remove every queued component, calling its finish hook.
    /// Returns the number removed.
    pub fn drain_removals(&mut self) -> usize {
        let queued = std::mem::take(&mut self.to_remove);
        let mut removed = 0;
        for id in queued {
            if self.remove_now(id) {
                removed += 1;
            }
        }
        removed
    }

    fn remove_now(&mut self, id: ComponentId) -> bool {
        if let Some(slot) = self.material.as_mut().filter(|s| s.state.id == id) {
            slot.component.on_finish();
            self.material = None;
            self.types.remove(ComponentTypes::MATERIAL);
            return true;
        }
        if Self::remove_from(&mut self.meshes, id) {
            if self.meshes.is_empty() {
                self.types.remove(ComponentTypes::MESH);
            }
            return true;
        }
        if Self::remove_from(&mut self.cameras, id) {
            if self.cameras.is_empty() {
                self.types.remove(ComponentTypes::CAMERA);
            }
            return true;
        }
        if Self::remove_from(&mut self.lights, id) {
            if self.lights.is_empty() {
                self.types.remove(ComponentTypes::LIGHT);
            }
            return true;
        }
        false
    }

    fn remove_from<T: ComponentHooks>(slots: &mut Vec<Slot<T>>, id: ComponentId) -> bool {
        match slots.iter().position(|s| s.state.id == id) {
            Some(pos) => {
                let mut slot = slots.remove(pos);
                slot.component.on_finish();
                true
            }
            None => false,
        }
    }

    // ===== QUERIES =====

    pub fn types(&self) -> ComponentTypes {
        self.types
    }

    pub fn has(&self, ty: ComponentType) -> bool {
        self.types.contains(ty.mask())
    }

    pub fn count(&self, ty: ComponentType) -> usize {
        match ty {
            ComponentType::Transform => 1,
            ComponentType::Material => self.material.iter().count(),
            ComponentType::Mesh => self.meshes.len(),
            ComponentType::Camera => self.cameras.len(),
            ComponentType::Light => self.lights.len(),
        }
    }

    /// Number of attached components, transform included
    pub fn total_count(&self) -> usize {
        ComponentType::ALL.iter().map(|&ty| self.count(ty)).sum()
    }

    pub fn type_of(&self, id: ComponentId) -> Option<ComponentType> {
        self.entries().find(|(state, _)| state.id == id).map(|(_, ty)| ty)
    }

    /// `(state, type)` of every component in dispatch order
    pub fn entries(&self) -> impl Iterator<Item = (&ComponentState, ComponentType)> + '_ {
        std::iter::once((&self.transform.state, ComponentType::Transform))
            .chain(self.material.iter().map(|s| (&s.state, ComponentType::Material)))
            .chain(self.meshes.iter().map(|s| (&s.state, ComponentType::Mesh)))
            .chain(self.cameras.iter().map(|s| (&s.state, ComponentType::Camera)))
            .chain(self.lights.iter().map(|s| (&s.state, ComponentType::Light)))
    }

    pub fn state(&self, id: ComponentId) -> Option<&ComponentState> {
        self.entries().find(|(state, _)| state.id == id).map(|(state, _)| state)
    }

    // ===== TYPED ACCESS =====

    pub fn transform(&self) -> &Transform {
        &self.transform.component
    }

    pub fn transform_mut(&mut self) -> &mut Transform {
        &mut self.transform.component
    }

    pub fn material(&self) -> Option<&Slot<Material>> {
        self.material.as_ref()
    }

    pub fn material_mut(&mut self) -> Option<&mut Slot<Material>> {
        self.material.as_mut()
    }

    pub fn meshes(&self) -> &[Slot<Mesh>] {
        &self.meshes
    }

    pub fn meshes_mut(&mut self) -> &mut [Slot<Mesh>] {
        &mut self.meshes
    }

    pub fn cameras(&self) -> &[Slot<Camera>] {
        &self.cameras
    }

    pub fn cameras_mut(&mut self) -> &mut [Slot<Camera>] {
        &mut self.cameras
    }

    pub fn lights(&self) -> &[Slot<Light>] {
        &self.lights
    }

    pub fn lights_mut(&mut self) -> &mut [Slot<Light>] {
        &mut self.lights
    }

    // ===== DISPATCH =====

    pub fn iter(&self) -> impl Iterator<Item = (&ComponentState, &dyn ComponentHooks)> + '_ {
        std::iter::once(self.transform.parts())
            .chain(self.material.iter().map(Slot::parts))
            .chain(self.meshes.iter().map(Slot::parts))
            .chain(self.cameras.iter().map(Slot::parts))
            .chain(self.lights.iter().map(Slot::parts))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&mut ComponentState, &mut dyn ComponentHooks)> + '_ {
        std::iter::once(self.transform.parts_mut())
            .chain(self.material.iter_mut().map(Slot::parts_mut))
            .chain(self.meshes.iter_mut().map(Slot::parts_mut))
            .chain(self.cameras.iter_mut().map(Slot::parts_mut))
            .chain(self.lights.iter_mut().map(Slot::parts_mut))
    }

    /// Union of the object-space bounds of every active component
    pub fn local_box(&self) -> AABB {
        let mut local_box = AABB::empty();
        for (state, hooks) in self.iter() {
            if state.active {
                hooks.enclose_local_box(&mut local_box);
            }
        }
        local_box
    }
}

#[cfg(test)]
#[path = "component_tests.rs"]
mod tests;
