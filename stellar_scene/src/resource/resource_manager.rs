/// Central resource manager for the scene.
///
/// Stores mesh resources by resource UID and hands out shared `Arc`
/// references. Mesh components loaded from a scene document resolve
/// their geometry through here.

use std::sync::Arc;
use rustc_hash::FxHashMap;
use crate::error::Result;
use crate::engine_bail;
use super::mesh_resource::{MeshResource, MeshResourceDesc};

pub struct ResourceManager {
    meshes: FxHashMap<u64, Arc<MeshResource>>,
}

impl ResourceManager {
    /// Create a new empty resource manager
    pub fn new() -> Self {
        Self {
            meshes: FxHashMap::default(),
        }
    }

    /// Create a resource manager holding the built-in cube, plane and sphere
    pub fn with_primitives() -> Self {
        let mut rm = Self::new();
        for mesh in [MeshResource::cube(), MeshResource::plane(), MeshResource::sphere()] {
            rm.meshes.insert(mesh.uid(), Arc::new(mesh));
        }
        rm
    }

    // ===== MESHES =====

    /// Build and register a mesh. Fails if the UID is already taken or
    /// the descriptor is invalid.
    pub fn create_mesh(&mut self, desc: MeshResourceDesc) -> Result<Arc<MeshResource>> {
        if self.meshes.contains_key(&desc.uid) {
            engine_bail!("stellar::ResourceManager",
                "Mesh resource {} ('{}') already exists", desc.uid, desc.name);
        }
        let mesh = Arc::new(MeshResource::from_desc(desc)?);
        self.meshes.insert(mesh.uid(), Arc::clone(&mesh));
        Ok(mesh)
    }

    /// Register an already built mesh, replacing any mesh with the same UID
    pub fn insert_mesh(&mut self, mesh: MeshResource) -> Arc<MeshResource> {
        let mesh = Arc::new(mesh);
        self.meshes.insert(mesh.uid(), Arc::clone(&mesh));
        mesh
    }

    pub fn mesh(&self, uid: u64) -> Option<Arc<MeshResource>> {
        self.meshes.get(&uid).cloned()
    }

    /// Remove a mesh. Nodes already holding it keep their reference.
    pub fn remove_mesh(&mut self, uid: u64) -> bool {
        self.meshes.remove(&uid).is_some()
    }

    pub fn mesh_count(&self) -> usize {
        self.meshes.len()
    }
}

impl Default for ResourceManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "resource_manager_tests.rs"]
mod tests;
