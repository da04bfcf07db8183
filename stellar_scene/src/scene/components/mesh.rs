/// Mesh component - binds a shared `MeshResource` to a node.
///
/// The resource UID is kept even when the resource itself could not be
/// resolved, so the binding survives a save/load round trip.

use std::sync::Arc;
use crate::math::AABB;
use crate::resource::MeshResource;
use crate::scene::component::ComponentHooks;

#[derive(Debug, Clone, Default)]
pub struct Mesh {
    resource_uid: u64,
    resource: Option<Arc<MeshResource>>,
}

impl Mesh {
    pub fn new(resource: Arc<MeshResource>) -> Self {
        Self {
            resource_uid: resource.uid(),
            resource: Some(resource),
        }
    }

    /// A mesh bound to a resource that is not loaded
    pub fn unresolved(resource_uid: u64) -> Self {
        Self {
            resource_uid,
            resource: None,
        }
    }

    pub fn resource_uid(&self) -> u64 {
        self.resource_uid
    }

    pub fn resource(&self) -> Option<&Arc<MeshResource>> {
        self.resource.as_ref()
    }

    pub fn set_resource(&mut self, resource: Option<Arc<MeshResource>>) {
        if let Some(resource) = &resource {
            self.resource_uid = resource.uid();
        }
        self.resource = resource;
    }
}

impl ComponentHooks for Mesh {
    fn enclose_local_box(&self, local_box: &mut AABB) {
        if let Some(resource) = &self.resource {
            local_box.enclose(resource.local_bounds());
        }
    }
}
