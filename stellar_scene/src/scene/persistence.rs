//! Scene documents and the stores that hold them.
//!
//! A document is a flat, depth-first list of node records (parents before
//! children). Each record carries the node's UID and its parent's UID;
//! the hierarchy is rebuilt from those on load.
//!
//! ```text
//! {
//!   "game_objects": [
//!     { "uid": 77, "parent_uid": 0, "name": "Cube", ...,
//!       "components": [
//!         { "active": true, "data": { "type": "Transform", "translation": [0, 0, 0], ... } },
//!         { "active": true, "data": { "type": "Mesh", "resource": 1 } }
//!       ] }
//!   ]
//! }
//! ```
//!
//! Parsing is lenient per node: a malformed record is logged and skipped,
//! the rest of the document still loads.

use std::path::{Path, PathBuf};
use glam::{Quat, Vec3, Vec4};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use crate::camera::{Camera, Projection};
use crate::error::{Error, Result};
use crate::{engine_error, engine_warn};
use super::components::{Light, LightKind, Material};
use super::node::Uid;
use super::transform::Transform;

// ============================================================================
// RECORDS
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SceneDocument {
    pub game_objects: Vec<NodeRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub uid: Uid,
    /// 0 = child of the scene root
    pub parent_uid: Uid,
    pub name: String,
    #[serde(default)]
    pub tag: String,
    #[serde(default = "default_layer")]
    pub layer: u32,
    #[serde(default = "default_true")]
    pub active: bool,
    #[serde(default)]
    pub is_static: bool,
    #[serde(default)]
    pub components: Vec<ComponentRecord>,
}

fn default_layer() -> u32 {
    1
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentRecord {
    #[serde(default = "default_true")]
    pub active: bool,
    pub data: ComponentData,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ComponentData {
    Transform(TransformData),
    Mesh(MeshData),
    Material(MaterialData),
    Camera(CameraData),
    Light(LightData),
    /// Any type this build does not know; skipped on load
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformData {
    pub translation: [f32; 3],
    /// Quaternion as x, y, z, w
    pub rotation: [f32; 4],
    pub scale: [f32; 3],
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeshData {
    /// Mesh resource UID
    pub resource: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialData {
    pub color: [f32; 4],
    #[serde(default)]
    pub texture: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProjectionData {
    Perspective,
    Orthographic,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraData {
    pub projection: ProjectionData,
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    pub ortho_size: f32,
    pub culling: bool,
    pub background: [f32; 4],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LightKindData {
    Directional,
    Point,
    Spot,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LightData {
    pub kind: LightKindData,
    pub color: [f32; 3],
    pub intensity: f32,
    #[serde(default)]
    pub range: f32,
    #[serde(default)]
    pub inner_cone: f32,
    #[serde(default)]
    pub outer_cone: f32,
}

// ============================================================================
// COMPONENT <-> RECORD
// ============================================================================

impl From<&Transform> for TransformData {
    fn from(transform: &Transform) -> Self {
        Self {
            translation: transform.translation().to_array(),
            rotation: transform.rotation().to_array(),
            scale: transform.scale().to_array(),
        }
    }
}

impl TransformData {
    pub fn apply(&self, transform: &mut Transform) {
        transform.set_trs(
            Vec3::from_array(self.translation),
            Quat::from_array(self.rotation).normalize(),
            Vec3::from_array(self.scale),
        );
    }
}

impl From<&Material> for MaterialData {
    fn from(material: &Material) -> Self {
        Self {
            color: material.color.to_array(),
            texture: material.texture,
        }
    }
}

impl From<&MaterialData> for Material {
    fn from(data: &MaterialData) -> Self {
        Material {
            color: Vec4::from_array(data.color),
            texture: data.texture,
        }
    }
}

impl From<&Camera> for CameraData {
    fn from(camera: &Camera) -> Self {
        Self {
            projection: match camera.projection() {
                Projection::Perspective => ProjectionData::Perspective,
                Projection::Orthographic => ProjectionData::Orthographic,
            },
            fov: camera.fov(),
            aspect: camera.aspect(),
            near: camera.near(),
            far: camera.far(),
            ortho_size: camera.ortho_size(),
            culling: camera.culling,
            background: camera.background.to_array(),
        }
    }
}

impl From<&CameraData> for Camera {
    fn from(data: &CameraData) -> Self {
        let mut camera = match data.projection {
            ProjectionData::Perspective => Camera::perspective(data.fov, data.aspect, data.near, data.far),
            ProjectionData::Orthographic => Camera::orthographic(data.ortho_size, data.aspect, data.near, data.far),
        };
        camera.set_fov(data.fov);
        camera.set_ortho_size(data.ortho_size);
        camera.update_projection();
        camera.culling = data.culling;
        camera.background = Vec4::from_array(data.background);
        camera
    }
}

impl From<&Light> for LightData {
    fn from(light: &Light) -> Self {
        let (kind, range, inner_cone, outer_cone) = match light.kind {
            LightKind::Directional => (LightKindData::Directional, 0.0, 0.0, 0.0),
            LightKind::Point { range } => (LightKindData::Point, range, 0.0, 0.0),
            LightKind::Spot { range, inner_cone, outer_cone } => {
                (LightKindData::Spot, range, inner_cone, outer_cone)
            }
        };
        Self {
            kind,
            color: light.color.to_array(),
            intensity: light.intensity,
            range,
            inner_cone,
            outer_cone,
        }
    }
}

impl From<&LightData> for Light {
    fn from(data: &LightData) -> Self {
        let kind = match data.kind {
            LightKindData::Directional => LightKind::Directional,
            LightKindData::Point => LightKind::Point { range: data.range },
            LightKindData::Spot => LightKind::Spot {
                range: data.range,
                inner_cone: data.inner_cone,
                outer_cone: data.outer_cone,
            },
        };
        Light::new(kind, Vec3::from_array(data.color), data.intensity)
    }
}

// ============================================================================
// JSON
// ============================================================================

/// Document shape used for lenient parsing
#[derive(Deserialize)]
struct RawSceneDocument {
    #[serde(default)]
    game_objects: Vec<serde_json::Value>,
}

impl SceneDocument {
    /// Parse a document, skipping (and logging) node records that do not
    /// match the record layout.
    pub fn from_json(json: &str) -> Result<Self> {
        let raw: RawSceneDocument = serde_json::from_str(json)
            .map_err(|e| Error::InvalidDocument(e.to_string()))?;

        let mut game_objects = Vec::with_capacity(raw.game_objects.len());
        for (index, value) in raw.game_objects.into_iter().enumerate() {
            match serde_json::from_value::<NodeRecord>(value) {
                Ok(record) => game_objects.push(record),
                Err(e) => engine_warn!("stellar::Persistence",
                    "Skipping malformed game object #{}: {}", index, e),
            }
        }
        Ok(Self { game_objects })
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

// ============================================================================
// ID REMAP
// ============================================================================

/// Old UID → new UID for nodes that were reassigned during a load
#[derive(Debug, Clone, Default)]
pub struct IdRemap {
    map: FxHashMap<Uid, Uid>,
}

impl IdRemap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, old: Uid, new: Uid) {
        self.map.insert(old, new);
    }

    /// The new UID for `uid`, or `uid` itself if it was kept
    pub fn resolve(&self, uid: Uid) -> Uid {
        self.map.get(&uid).copied().unwrap_or(uid)
    }

    pub fn contains(&self, uid: Uid) -> bool {
        self.map.contains_key(&uid)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

// ============================================================================
// STORES
// ============================================================================

/// Where scene documents are read from and written to.
pub trait SceneStore: Send {
    fn read(&mut self) -> Result<SceneDocument>;
    fn write(&mut self, document: &SceneDocument) -> Result<()>;
}

/// A JSON file on disk
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SceneStore for JsonFileStore {
    fn read(&mut self) -> Result<SceneDocument> {
        let json = std::fs::read_to_string(&self.path).map_err(|e| {
            engine_error!("stellar::Persistence",
                "Failed to read scene '{}': {}", self.path.display(), e);
            Error::from(e)
        })?;
        SceneDocument::from_json(&json)
    }

    fn write(&mut self, document: &SceneDocument) -> Result<()> {
        let json = document.to_json()?;
        std::fs::write(&self.path, json).map_err(|e| {
            engine_error!("stellar::Persistence",
                "Failed to write scene '{}': {}", self.path.display(), e);
            Error::from(e)
        })
    }
}

/// An in-memory JSON string (tests, undo snapshots, copy/paste)
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    json: Option<String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(json: impl Into<String>) -> Self {
        Self { json: Some(json.into()) }
    }

    /// Last written document, as JSON
    pub fn contents(&self) -> Option<&str> {
        self.json.as_deref()
    }
}

impl SceneStore for MemoryStore {
    fn read(&mut self) -> Result<SceneDocument> {
        match &self.json {
            Some(json) => SceneDocument::from_json(json),
            None => Err(Error::StoreMissing),
        }
    }

    fn write(&mut self, document: &SceneDocument) -> Result<()> {
        self.json = Some(document.to_json()?);
        Ok(())
    }
}

#[cfg(test)]
#[path = "persistence_tests.rs"]
mod tests;
