/// Node - a unit of the scene hierarchy.
///
/// A node owns its transform and components. Children are owned by the
/// scene manager's node table and referenced here by `NodeKey`; the parent
/// link is a plain back-reference used for unlinking and world-pose math.
///
/// Structural operations that touch other nodes or the static/dynamic
/// partition (create, destroy, reparent, static toggle, activation)
/// live on `SceneManager`. Everything local to one node lives here.

use glam::Mat4;
use slotmap::new_key_type;
use crate::camera::Camera;
use crate::math::{AABB, OrientedBox};
use crate::engine_warn;
use super::component::{
    ComponentHooks, ComponentId, ComponentState, ComponentType, ComponentTypes, Components, Slot,
};
use super::components::{Light, Material, Mesh};
use super::transform::Transform;

new_key_type! {
    /// Stable handle to a live node. Invalid as soon as the node is
    /// marked for destruction.
    pub struct NodeKey;
}

/// Persistent node identity. 0 means "none" and is reserved for the root.
pub type Uid = u64;

pub struct Node {
    uid: Uid,
    name: String,
    tag: String,
    layer: u32,
    pub(crate) active: bool,
    pub(crate) is_static: bool,
    pub(crate) parent: Option<NodeKey>,
    pub(crate) children: Vec<NodeKey>,
    components: Components,
    enclosing_box: AABB,
    oriented_box: OrientedBox,
    /// Recomputed this frame by the transform pass (or bounds changed)
    was_dirty: bool,
    /// A component was added, removed or toggled since the last box pass
    bounds_dirty: bool,
}

impl Node {
    pub(crate) fn new(uid: Uid, name: &str, parent: Option<NodeKey>) -> Self {
        Self {
            uid,
            name: name.to_string(),
            tag: String::new(),
            layer: 1,
            active: true,
            is_static: false,
            parent,
            children: Vec::new(),
            components: Components::new(),
            enclosing_box: AABB::empty(),
            oriented_box: OrientedBox::default(),
            was_dirty: false,
            bounds_dirty: true,
        }
    }

    // ===== IDENTITY & METADATA =====

    pub fn uid(&self) -> Uid {
        self.uid
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: &str) {
        self.name = name.to_string();
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn set_tag(&mut self, tag: &str) {
        self.tag = tag.to_string();
    }

    /// Layer bitmask
    pub fn layer(&self) -> u32 {
        self.layer
    }

    pub fn set_layer(&mut self, layer: u32) {
        self.layer = layer;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn is_static(&self) -> bool {
        self.is_static
    }

    pub fn parent(&self) -> Option<NodeKey> {
        self.parent
    }

    pub fn children(&self) -> &[NodeKey] {
        &self.children
    }

    // ===== TRANSFORM =====

    pub fn transform(&self) -> &Transform {
        self.components.transform()
    }

    pub fn transform_mut(&mut self) -> &mut Transform {
        self.components.transform_mut()
    }

    // ===== COMPONENTS =====

    pub fn components(&self) -> &Components {
        &self.components
    }

    pub fn component_types(&self) -> ComponentTypes {
        self.components.types()
    }

    pub fn has_component(&self, ty: ComponentType) -> bool {
        self.components.has(ty)
    }

    pub fn count_components(&self, ty: ComponentType) -> usize {
        self.components.count(ty)
    }

    /// Attach a default-constructed component of `ty`.
    ///
    /// Singleton types already present are rejected with a warning.
    pub fn create_component(&mut self, ty: ComponentType) -> Option<ComponentId> {
        match ty {
            ComponentType::Transform => {
                engine_warn!("stellar::Node",
                    "Node {} ('{}') already has a Transform", self.uid, self.name);
                None
            }
            ComponentType::Material => self.add_material(Material::default()),
            ComponentType::Mesh => Some(self.add_mesh(Mesh::default())),
            ComponentType::Camera => Some(self.add_camera(Camera::default())),
            ComponentType::Light => Some(self.add_light(Light::default())),
        }
    }

    pub fn add_material(&mut self, material: Material) -> Option<ComponentId> {
        let id = self.components.add_material(material);
        match id {
            Some(id) => self.on_component_added(id),
            None => engine_warn!("stellar::Node",
                "Node {} ('{}') already has a Material", self.uid, self.name),
        }
        id
    }

    pub fn add_mesh(&mut self, mesh: Mesh) -> ComponentId {
        let id = self.components.add_mesh(mesh);
        self.on_component_added(id);
        id
    }

    pub fn add_camera(&mut self, camera: Camera) -> ComponentId {
        let id = self.components.add_camera(camera);
        self.on_component_added(id);
        id
    }

    pub fn add_light(&mut self, light: Light) -> ComponentId {
        let id = self.components.add_light(light);
        self.on_component_added(id);
        id
    }

    /// New components see the current global pose right away
    fn on_component_added(&mut self, id: ComponentId) {
        let global = *self.components.transform().global_transform();
        if let Some((_, hooks)) = self.components.iter_mut().find(|(state, _)| state.id == id) {
            hooks.on_transform_update(&global);
        }
        self.bounds_dirty = true;
    }

    /// Queue a component for removal at the next pre-update.
    ///
    /// The transform cannot be removed. Unknown ids are rejected.
    pub fn remove_component(&mut self, id: ComponentId) -> bool {
        if id == ComponentId::TRANSFORM {
            engine_warn!("stellar::Node",
                "Node {} ('{}'): the Transform cannot be removed", self.uid, self.name);
            return false;
        }
        if !self.components.queue_removal(id) {
            engine_warn!("stellar::Node",
                "Node {} ('{}'): no component {:?} to remove", self.uid, self.name, id);
            return false;
        }
        true
    }

    /// Toggle one component. The transform is always active.
    pub fn set_component_active(&mut self, id: ComponentId, active: bool) -> bool {
        if id == ComponentId::TRANSFORM {
            engine_warn!("stellar::Node",
                "Node {} ('{}'): the Transform cannot be deactivated", self.uid, self.name);
            return false;
        }
        let node_active = self.active;
        let Some((state, hooks)) = self.components.iter_mut().find(|(state, _)| state.id == id) else {
            engine_warn!("stellar::Node",
                "Node {} ('{}'): no component {:?}", self.uid, self.name, id);
            return false;
        };
        if state.active != active {
            state.active = active;
            if node_active {
                if active { hooks.on_enable() } else { hooks.on_disable() }
            }
            self.bounds_dirty = true;
        }
        true
    }

    pub fn component_state(&self, id: ComponentId) -> Option<&ComponentState> {
        self.components.state(id)
    }

    pub fn component_type(&self, id: ComponentId) -> Option<ComponentType> {
        self.components.type_of(id)
    }

    /// First mesh component in attach order (the one used for picking)
    pub fn first_mesh(&self) -> Option<&Mesh> {
        self.components.meshes().first().map(|slot| &slot.component)
    }

    pub fn material(&self) -> Option<&Material> {
        self.components.material().map(|slot| &slot.component)
    }

    pub fn material_mut(&mut self) -> Option<&mut Material> {
        self.components.material_mut().map(|slot| &mut slot.component)
    }

    pub fn meshes(&self) -> &[Slot<Mesh>] {
        self.components.meshes()
    }

    pub fn cameras(&self) -> &[Slot<Camera>] {
        self.components.cameras()
    }

    pub fn lights(&self) -> &[Slot<Light>] {
        self.components.lights()
    }

    /// Mutable mesh access. Marks the bounds for recomputation.
    pub fn mesh_mut(&mut self, id: ComponentId) -> Option<&mut Mesh> {
        self.bounds_dirty = true;
        self.components
            .meshes_mut()
            .iter_mut()
            .find(|slot| slot.state.id == id)
            .map(|slot| &mut slot.component)
    }

    pub fn camera(&self, id: ComponentId) -> Option<&Camera> {
        self.components
            .cameras()
            .iter()
            .find(|slot| slot.state.id == id)
            .map(|slot| &slot.component)
    }

    pub fn camera_mut(&mut self, id: ComponentId) -> Option<&mut Camera> {
        self.components
            .cameras_mut()
            .iter_mut()
            .find(|slot| slot.state.id == id)
            .map(|slot| &mut slot.component)
    }

    /// Mutable light access. Marks the bounds for recomputation.
    pub fn light_mut(&mut self, id: ComponentId) -> Option<&mut Light> {
        self.bounds_dirty = true;
        self.components
            .lights_mut()
            .iter_mut()
            .find(|slot| slot.state.id == id)
            .map(|slot| &mut slot.component)
    }

    // ===== BOUNDS =====

    /// World-space AABB (envelope of the oriented box)
    pub fn enclosing_box(&self) -> &AABB {
        &self.enclosing_box
    }

    /// Local bounds carried by the global transform
    pub fn oriented_box(&self) -> &OrientedBox {
        &self.oriented_box
    }

    pub fn was_dirty(&self) -> bool {
        self.was_dirty
    }

    /// Recompute both boxes from the active components.
    ///
    /// A non-finite local box (empty or unbounded) is kept as-is in world
    /// space; the oriented box is then left non-finite.
    pub(crate) fn recalc_box(&mut self) {
        let local_box = self.components.local_box();
        if local_box.is_finite() {
            self.oriented_box = OrientedBox::from_aabb(&local_box, self.transform().global_transform());
            self.enclosing_box = self.oriented_box.enclosing_aabb();
        } else {
            self.oriented_box = OrientedBox::default();
            self.enclosing_box = local_box;
        }
    }

    // ===== FRAME PHASES (driven by SceneManager) =====

    /// Transform pass for this node alone. Returns the global matrix
    /// for the children and whether they must be recomputed.
    pub(crate) fn calc_transform(&mut self, parent_global: &Mat4, force: bool) -> (Mat4, bool) {
        let changed = force || self.transform().has_changed();
        if changed {
            let global = self.components.transform_mut().update_transform(parent_global);
            for (_, hooks) in self.components.iter_mut() {
                hooks.on_transform_update(&global);
            }
        }
        self.was_dirty = changed || self.bounds_dirty;
        self.bounds_dirty = false;
        (*self.transform().global_transform(), changed)
    }

    /// Remove queued components. Returns true if any were removed.
    pub(crate) fn drain_removals(&mut self) -> bool {
        if self.components.drain_removals() > 0 {
            self.bounds_dirty = true;
            true
        } else {
            false
        }
    }

    /// Start new components, then run pre-update on active ones
    pub(crate) fn pre_update(&mut self, dt: f32) {
        for (state, hooks) in self.components.iter_mut() {
            if !state.started {
                state.started = true;
                hooks.on_start();
            }
            if state.active {
                hooks.on_pre_update(dt);
            }
        }
    }

    pub(crate) fn update(&mut self, dt: f32) {
        for (state, hooks) in self.components.iter_mut() {
            if state.active && state.started {
                hooks.on_update(dt);
            }
        }
    }

    /// Run `f` on every active component
    pub(crate) fn for_each_active(&mut self, mut f: impl FnMut(&mut dyn ComponentHooks)) {
        for (state, hooks) in self.components.iter_mut() {
            if state.active {
                f(hooks);
            }
        }
    }

    /// Finish hooks on every component (node release)
    pub(crate) fn finish(&mut self) {
        for (_, hooks) in self.components.iter_mut() {
            hooks.on_finish();
        }
    }
}

#[cfg(test)]
#[path = "node_tests.rs"]
mod tests;
