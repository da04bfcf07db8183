//! Scene manager - owns the node hierarchy and keeps it spatially queryable.
//!
//! The manager owns every node in a handle table (`SlotMap<NodeKey, Node>`)
//! under a single root, and keeps each non-root node in exactly one of two
//! partitions:
//!
//! - **static**: indexed by the octree, assumed not to move
//! - **dynamic**: a plain list, box-tested linearly by queries
//!
//! A frame runs `pre_update` then `update`:
//!
//! 1. release nodes destroyed last frame (finish hooks)
//! 2. drain queued component removals
//! 3. if anything changed: transform pass (top-down), then box pass
//! 4. service pending save/load requests
//! 5. pre-update hooks over the active tree
//!
//! Queries (`cast_ray`, `visible_nodes`, ...) read the boxes computed by the
//! last `pre_update`.

use glam::Mat4;
use rustc_hash::{FxHashMap, FxHashSet};
use slotmap::SlotMap;
use crate::camera::{Camera, Frustum};
use crate::config::SceneConfig;
use crate::error::{Error, Result};
use crate::math::{LineSegment, Ray};
use crate::resource::ResourceManager;
use crate::spatial::Octree;
use crate::{engine_debug, engine_error, engine_info, engine_trace, engine_warn};
use super::component::{ComponentHooks, ComponentId};
use super::components::{Light, Material, Mesh};
use super::node::{Node, NodeKey, Uid};
use super::persistence::{
    CameraData, ComponentData, ComponentRecord, IdRemap, LightData, MaterialData, MeshData,
    NodeRecord, SceneDocument, SceneStore, TransformData,
};
use super::raycast::{self, RayHit};
use super::uid::{RandomUidSource, UidSource};

const ROOT_NAME: &str = "Root";

/// Simulation state broadcast to components
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlayState {
    #[default]
    Stopped,
    Playing,
    Paused,
}

/// Diagnostic counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SceneStats {
    /// Live nodes, root excluded
    pub nodes: usize,
    pub static_nodes: usize,
    pub dynamic_nodes: usize,
    /// Destroyed nodes waiting for the next frame boundary
    pub pending_destruction: usize,
}

pub struct SceneManager {
    nodes: SlotMap<NodeKey, Node>,
    /// Every live node except the root
    uid_lookup: FxHashMap<Uid, NodeKey>,
    root: NodeKey,
    octree: Octree<NodeKey>,
    dynamic_objects: Vec<NodeKey>,
    /// Unlinked nodes, finished and dropped at the next pre-update
    pending_destruction: Vec<Node>,
    selected: Option<NodeKey>,
    uid_source: Box<dyn UidSource>,
    resources: ResourceManager,
    store: Option<Box<dyn SceneStore>>,
    config: SceneConfig,
    play_state: PlayState,
    any_transform_changed: bool,
    must_save: bool,
    must_load: bool,
}

impl Default for SceneManager {
    fn default() -> Self {
        Self::new(SceneConfig::default())
    }
}

impl SceneManager {
    /// Create a scene holding only the root node
    pub fn new(config: SceneConfig) -> Self {
        let uid_source = Box::new(RandomUidSource::new(config.uid_seed));
        Self::with_uid_source(config, uid_source)
    }

    pub fn with_uid_source(config: SceneConfig, uid_source: Box<dyn UidSource>) -> Self {
        let config = config.validated();
        let octree = Octree::new(config.octree_bounds(), config.octree_max_depth);

        let mut nodes = SlotMap::with_key();
        let root = nodes.insert(Node::new(0, ROOT_NAME, None));

        engine_info!("stellar::SceneManager",
            "Scene created (octree half extent {}, depth {})",
            config.octree_half_extent, config.octree_max_depth);

        Self {
            nodes,
            uid_lookup: FxHashMap::default(),
            root,
            octree,
            dynamic_objects: Vec::new(),
            pending_destruction: Vec::new(),
            selected: None,
            uid_source,
            resources: ResourceManager::with_primitives(),
            store: None,
            config,
            play_state: PlayState::Stopped,
            any_transform_changed: false,
            must_save: false,
            must_load: false,
        }
    }

    // ===== ACCESS =====

    pub fn root(&self) -> NodeKey {
        self.root
    }

    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    pub fn node(&self, key: NodeKey) -> Option<&Node> {
        self.nodes.get(key)
    }

    /// Mutable node access. The next pre-update runs the transform pass.
    pub fn node_mut(&mut self, key: NodeKey) -> Option<&mut Node> {
        let node = self.nodes.get_mut(key)?;
        self.any_transform_changed = true;
        Some(node)
    }

    pub fn contains(&self, key: NodeKey) -> bool {
        self.nodes.contains_key(key)
    }

    pub fn find_by_uid(&self, uid: Uid) -> Option<NodeKey> {
        self.uid_lookup.get(&uid).copied()
    }

    pub fn node_by_uid(&self, uid: Uid) -> Option<&Node> {
        self.find_by_uid(uid).and_then(|key| self.nodes.get(key))
    }

    /// Live nodes, root included
    pub fn nodes(&self) -> impl Iterator<Item = (NodeKey, &Node)> + '_ {
        self.nodes.iter()
    }

    pub fn resources(&self) -> &ResourceManager {
        &self.resources
    }

    pub fn resources_mut(&mut self) -> &mut ResourceManager {
        &mut self.resources
    }

    pub fn octree(&self) -> &Octree<NodeKey> {
        &self.octree
    }

    pub fn stats(&self) -> SceneStats {
        SceneStats {
            nodes: self.nodes.len() - 1,
            static_nodes: self.octree.len(),
            dynamic_nodes: self.dynamic_objects.len(),
            pending_destruction: self.pending_destruction.len(),
        }
    }

    // ===== CREATION & DESTRUCTION =====

    /// Create a node under the root
    pub fn create_node(&mut self, name: &str) -> NodeKey {
        let uid = self.next_free_uid();
        let root = self.root;
        self.insert_node(Node::new(uid, name, None), root)
    }

    /// Create a node under `parent`. The new node starts dynamic and
    /// inherits the parent's active flag.
    pub fn create_child(&mut self, parent: NodeKey, name: &str) -> Option<NodeKey> {
        if !self.nodes.contains_key(parent) {
            engine_warn!("stellar::SceneManager", "create_child: unknown parent {:?}", parent);
            return None;
        }
        let uid = self.next_free_uid();
        Some(self.insert_node(Node::new(uid, name, None), parent))
    }

    fn next_free_uid(&mut self) -> Uid {
        loop {
            let uid = self.uid_source.next_uid();
            if uid != 0 && !self.uid_lookup.contains_key(&uid) {
                return uid;
            }
        }
    }

    /// Register `node` as a dynamic child of `parent`
    fn insert_node(&mut self, mut node: Node, parent: NodeKey) -> NodeKey {
        node.parent = Some(parent);
        node.active = self.nodes.get(parent).map_or(true, |p| p.active);
        let uid = node.uid();
        let key = self.nodes.insert(node);
        if let Some(parent) = self.nodes.get_mut(parent) {
            parent.children.push(key);
        }
        self.uid_lookup.insert(uid, key);
        self.dynamic_objects.push(key);
        self.any_transform_changed = true;
        key
    }

    /// Mark a node and its subtree for destruction.
    ///
    /// The subtree leaves its parent, its partition and the UID lookup
    /// right away; its keys are invalid from here on. Finish hooks run at
    /// the next pre-update.
    pub fn destroy(&mut self, key: NodeKey) -> bool {
        if key == self.root {
            engine_warn!("stellar::SceneManager", "The scene root cannot be destroyed");
            return false;
        }
        let Some(parent) = self.nodes.get(key).map(|node| node.parent) else {
            return false;
        };
        if let Some(parent) = parent.and_then(|p| self.nodes.get_mut(p)) {
            parent.children.retain(|&child| child != key);
        }
        let before = self.pending_destruction.len();
        self.retire_subtree(key);
        engine_debug!("stellar::SceneManager",
            "Marked {} node(s) for destruction", self.pending_destruction.len() - before);
        true
    }

    fn retire_subtree(&mut self, key: NodeKey) {
        let Some(node) = self.nodes.get(key) else {
            return;
        };
        let children = node.children.clone();
        if node.is_static {
            self.octree.erase(key);
        } else {
            self.remove_dynamic(key);
        }

        for child in children {
            self.retire_subtree(child);
        }

        if let Some(node) = self.nodes.remove(key) {
            self.uid_lookup.remove(&node.uid());
            if self.selected == Some(key) {
                self.selected = None;
            }
            self.pending_destruction.push(node);
        }
    }

    fn remove_dynamic(&mut self, key: NodeKey) {
        if let Some(pos) = self.dynamic_objects.iter().position(|&k| k == key) {
            self.dynamic_objects.remove(pos);
        }
    }

    // ===== HIERARCHY =====

    /// Move `key` under `new_parent`.
    ///
    /// With `force`, the local transform is rewritten so the world pose is
    /// kept. Returns false if nothing moved.
    pub fn set_new_parent(&mut self, key: NodeKey, new_parent: NodeKey, force: bool) -> bool {
        if key == self.root {
            engine_warn!("stellar::SceneManager", "The scene root cannot be reparented");
            return false;
        }
        let (Some(node), true) = (self.nodes.get(key), self.nodes.contains_key(new_parent)) else {
            return false;
        };
        let old_parent = node.parent;
        if old_parent == Some(new_parent) {
            return false;
        }
        if self.is_ancestor_or_self(key, new_parent) {
            engine_warn!("stellar::SceneManager",
                "Cannot reparent node {} under its own descendant", node.uid());
            return false;
        }

        let old_global = *node.transform().global_transform();
        let parent_global = *self.nodes[new_parent].transform().global_transform();

        if let Some(parent) = old_parent.and_then(|p| self.nodes.get_mut(p)) {
            parent.children.retain(|&child| child != key);
        }
        if let Some(parent) = self.nodes.get_mut(new_parent) {
            parent.children.push(key);
        }

        if let Some(node) = self.nodes.get_mut(key) {
            node.parent = Some(new_parent);
            let local = parent_global.inverse() * old_global;
            if force && local.is_finite() {
                node.transform_mut().set_local_transform(local);
            } else {
                node.transform_mut().mark_changed();
            }
        }
        if !self.nodes[new_parent].active {
            self.set_active_rec(key, false);
        }
        self.any_transform_changed = true;
        true
    }

    /// Whether `ancestor` is `key` or one of its ancestors
    fn is_ancestor_or_self(&self, ancestor: NodeKey, key: NodeKey) -> bool {
        let mut current = Some(key);
        while let Some(k) = current {
            if k == ancestor {
                return true;
            }
            current = self.nodes.get(k).and_then(|node| node.parent);
        }
        false
    }

    // ===== STATIC / DYNAMIC PARTITION =====

    /// Move a node and its whole subtree to the static or dynamic partition
    pub fn set_static(&mut self, key: NodeKey, is_static: bool) -> bool {
        if key == self.root {
            engine_warn!("stellar::SceneManager", "The scene root cannot be made static");
            return false;
        }
        if !self.nodes.contains_key(key) {
            return false;
        }
        self.set_static_rec(key, is_static);
        true
    }

    fn set_static_rec(&mut self, key: NodeKey, is_static: bool) {
        let Some(node) = self.nodes.get_mut(key) else {
            return;
        };
        if node.is_static != is_static {
            node.is_static = is_static;
            if is_static {
                if let Some(pos) = self.dynamic_objects.iter().position(|&k| k == key) {
                    self.dynamic_objects.remove(pos);
                }
                self.octree.insert(key, node.enclosing_box());
            } else {
                self.octree.erase(key);
                self.dynamic_objects.push(key);
            }
        }

        let count = node.children.len();
        for i in 0..count {
            let Some(child) = self.child_at(key, i) else {
                break;
            };
            self.set_static_rec(child, is_static);
        }
    }

    fn child_at(&self, key: NodeKey, index: usize) -> Option<NodeKey> {
        self.nodes.get(key).and_then(|node| node.children.get(index).copied())
    }

    /// Dynamic partition, in registration order
    pub fn dynamic_objects(&self) -> &[NodeKey] {
        &self.dynamic_objects
    }

    pub fn is_indexed(&self, key: NodeKey) -> bool {
        self.octree.contains(key)
    }

    /// Re-create the octree from `config` and re-insert every static node
    pub fn rebuild_index(&mut self, config: SceneConfig) {
        self.config = config.validated();
        self.octree.create(self.config.octree_bounds(), self.config.octree_max_depth);
        for (key, node) in self.nodes.iter() {
            if node.is_static {
                self.octree.insert(key, node.enclosing_box());
            }
        }
        engine_info!("stellar::SceneManager",
            "Spatial index rebuilt with {} static node(s)", self.octree.len());
    }

    // ===== ACTIVATION =====

    pub fn enable(&mut self, key: NodeKey) -> bool {
        self.set_active(key, true)
    }

    pub fn disable(&mut self, key: NodeKey) -> bool {
        self.set_active(key, false)
    }

    pub fn switch_active(&mut self, key: NodeKey) -> bool {
        match self.nodes.get(key) {
            Some(node) => {
                let active = !node.active;
                self.set_active(key, active)
            }
            None => false,
        }
    }

    /// Enable or disable a node's subtree. Acts only where the state changes.
    ///
    /// An inactive node's subtree is inactive as a whole, so a node cannot
    /// be enabled while one of its ancestors is disabled.
    pub fn set_active(&mut self, key: NodeKey, active: bool) -> bool {
        if key == self.root {
            engine_warn!("stellar::SceneManager", "The scene root is always active");
            return false;
        }
        let Some(node) = self.nodes.get(key) else {
            return false;
        };
        if active && self.has_inactive_ancestor(key) {
            engine_warn!("stellar::SceneManager",
                "Cannot enable node {} under a disabled ancestor", node.uid());
            return false;
        }
        self.set_active_rec(key, active);
        true
    }

    fn has_inactive_ancestor(&self, key: NodeKey) -> bool {
        let mut current = self.nodes.get(key).and_then(|node| node.parent);
        while let Some(k) = current {
            let Some(node) = self.nodes.get(k) else {
                return false;
            };
            if !node.active {
                return true;
            }
            current = node.parent;
        }
        false
    }

    fn set_active_rec(&mut self, key: NodeKey, active: bool) {
        let Some(node) = self.nodes.get_mut(key) else {
            return;
        };
        if node.active == active {
            return;
        }
        node.active = active;
        if active {
            node.for_each_active(|hooks| hooks.on_enable());
        } else {
            node.for_each_active(|hooks| hooks.on_disable());
        }

        let count = node.children.len();
        for i in 0..count {
            let Some(child) = self.child_at(key, i) else {
                break;
            };
            self.set_active_rec(child, active);
        }
    }

    // ===== SELECTION =====

    pub fn select(&mut self, key: Option<NodeKey>) -> bool {
        match key {
            Some(key) if key == self.root || !self.nodes.contains_key(key) => false,
            _ => {
                self.selected = key;
                true
            }
        }
    }

    pub fn selected(&self) -> Option<NodeKey> {
        self.selected
    }

    // ===== FRAME =====

    /// Pre-update followed by update
    pub fn frame(&mut self, dt: f32) {
        self.pre_update(dt);
        self.update(dt);
    }

    pub fn pre_update(&mut self, dt: f32) {
        if !self.pending_destruction.is_empty() {
            engine_trace!("stellar::SceneManager",
                "Releasing {} destroyed node(s)", self.pending_destruction.len());
            for mut node in self.pending_destruction.drain(..) {
                node.finish();
            }
        }

        for node in self.nodes.values_mut() {
            if node.drain_removals() {
                self.any_transform_changed = true;
            }
        }

        if self.any_transform_changed {
            self.any_transform_changed = false;
            let root = self.root;
            self.calc_transform_rec(root, Mat4::IDENTITY, false);
            self.calc_boxes_rec(root);
        }

        if self.must_save {
            self.must_save = false;
            if let Err(e) = self.save_scene() {
                engine_error!("stellar::SceneManager", "Deferred save failed: {}", e);
            }
        }
        if self.must_load {
            self.must_load = false;
            if let Err(e) = self.load_scene() {
                engine_error!("stellar::SceneManager", "Deferred load failed: {}", e);
            }
        }

        self.visit_active(self.root, &mut |node| node.pre_update(dt));
    }

    pub fn update(&mut self, dt: f32) {
        self.visit_active(self.root, &mut |node| node.update(dt));
    }

    /// Depth-first over active nodes; an inactive node hides its subtree
    fn visit_active<F: FnMut(&mut Node)>(&mut self, key: NodeKey, f: &mut F) {
        let Some(node) = self.nodes.get_mut(key) else {
            return;
        };
        if !node.active {
            return;
        }
        f(node);

        let count = node.children.len();
        for i in 0..count {
            let Some(child) = self.child_at(key, i) else {
                break;
            };
            self.visit_active(child, &mut *f);
        }
    }

    /// Top-down transform pass. A static node that moved is demoted to
    /// the dynamic partition before its children are visited.
    fn calc_transform_rec(&mut self, key: NodeKey, parent_global: Mat4, force: bool) {
        let Some(node) = self.nodes.get_mut(key) else {
            return;
        };
        let (global, changed) = node.calc_transform(&parent_global, force);
        if changed && node.is_static {
            engine_trace!("stellar::SceneManager",
                "Static node {} moved, demoting to dynamic", node.uid());
            self.set_static_rec(key, false);
        }

        let count = self.nodes.get(key).map_or(0, |node| node.children.len());
        for i in 0..count {
            let Some(child) = self.child_at(key, i) else {
                break;
            };
            self.calc_transform_rec(child, global, changed);
        }
    }

    /// Box pass. Dirty nodes recompute their boxes; static ones refresh
    /// their octree placement.
    fn calc_boxes_rec(&mut self, key: NodeKey) {
        let Some(node) = self.nodes.get_mut(key) else {
            return;
        };
        if node.was_dirty() {
            node.recalc_box();
            if node.is_static {
                self.octree.update(key, node.enclosing_box());
            }
        }

        let count = node.children.len();
        for i in 0..count {
            let Some(child) = self.child_at(key, i) else {
                break;
            };
            self.calc_boxes_rec(child);
        }
    }

    // ===== PLAY STATE =====

    pub fn play_state(&self) -> PlayState {
        self.play_state
    }

    pub fn play(&mut self) {
        if self.play_state != PlayState::Playing {
            self.play_state = PlayState::Playing;
            self.broadcast(|hooks| hooks.on_play());
        }
    }

    pub fn stop(&mut self) {
        if self.play_state != PlayState::Stopped {
            self.play_state = PlayState::Stopped;
            self.broadcast(|hooks| hooks.on_stop());
        }
    }

    pub fn pause(&mut self) {
        if self.play_state == PlayState::Playing {
            self.play_state = PlayState::Paused;
            self.broadcast(|hooks| hooks.on_pause());
        }
    }

    pub fn unpause(&mut self) {
        if self.play_state == PlayState::Paused {
            self.play_state = PlayState::Playing;
            self.broadcast(|hooks| hooks.on_unpause());
        }
    }

    fn broadcast(&mut self, mut f: impl FnMut(&mut dyn ComponentHooks)) {
        self.visit_active(self.root, &mut |node| node.for_each_active(&mut f));
    }

    // ===== QUERIES =====

    /// Nearest mesh hit of `ray` over both partitions
    pub fn cast_ray(&self, ray: &Ray) -> Option<RayHit> {
        raycast::cast(ray, &self.octree, &self.dynamic_objects, &self.nodes)
    }

    /// Nearest mesh hit of `segment`; the distance is measured from its start
    pub fn cast_segment(&self, segment: &LineSegment) -> Option<RayHit> {
        raycast::cast(segment, &self.octree, &self.dynamic_objects, &self.nodes)
    }

    /// Static nodes whose stored box may intersect `frustum`
    pub fn static_candidates(&self, frustum: &Frustum) -> Vec<NodeKey> {
        let mut candidates = Vec::new();
        self.octree.collect_candidates(frustum, &mut candidates);
        candidates
    }

    /// Active nodes of both partitions that may be inside `frustum`
    pub fn visible_nodes(&self, frustum: &Frustum) -> Vec<NodeKey> {
        let is_active = |key: &NodeKey| self.nodes.get(*key).is_some_and(|node| node.active);

        let mut visible: Vec<NodeKey> = self.static_candidates(frustum)
            .into_iter()
            .filter(is_active)
            .collect();
        visible.extend(self.dynamic_objects.iter().copied().filter(|key| {
            is_active(key) && self.nodes.get(*key).is_some_and(|node| frustum.intersects_aabb(node.enclosing_box()))
        }));
        visible
    }

    /// Visible set as seen by one of a node's cameras
    pub fn visible_from(&self, key: NodeKey, camera: ComponentId) -> Vec<NodeKey> {
        match self.nodes.get(key).and_then(|node| node.camera(camera)) {
            Some(camera) => self.visible_nodes(camera.frustum()),
            None => Vec::new(),
        }
    }

    // ===== PERSISTENCE =====

    pub fn set_scene_store(&mut self, store: Box<dyn SceneStore>) {
        self.store = Some(store);
    }

    pub fn take_scene_store(&mut self) -> Option<Box<dyn SceneStore>> {
        self.store.take()
    }

    /// Save the scene at the start of the next pre-update
    pub fn request_save(&mut self) {
        self.must_save = true;
    }

    /// Replace the scene from the store at the start of the next pre-update
    pub fn request_load(&mut self) {
        self.must_load = true;
    }

    /// Write the whole scene to the installed store
    pub fn save_scene(&mut self) -> Result<()> {
        let document = self.save_subtree(self.root);
        let Some(store) = self.store.as_mut() else {
            return Err(Error::StoreMissing);
        };
        store.write(&document)?;
        engine_info!("stellar::SceneManager",
            "Scene saved ({} node(s))", document.game_objects.len());
        Ok(())
    }

    /// Replace the scene with the installed store's document.
    /// Returns the number of nodes created.
    pub fn load_scene(&mut self) -> Result<usize> {
        let Some(store) = self.store.as_mut() else {
            return Err(Error::StoreMissing);
        };
        let document = store.read()?;

        let root = self.root;
        let top_level = self.nodes.get(root).map(|r| r.children.clone()).unwrap_or_default();
        for key in top_level {
            self.destroy(key);
        }
        self.selected = None;

        let created = self.instantiate(&document, root, false);
        engine_info!("stellar::SceneManager", "Scene loaded ({} node(s))", created.len());
        Ok(created.len())
    }

    /// Depth-first records of `key` and its descendants. For the root,
    /// only its descendants are written.
    pub fn save_subtree(&self, key: NodeKey) -> SceneDocument {
        let mut document = SceneDocument::default();
        if key == self.root {
            if let Some(root) = self.nodes.get(key) {
                for &child in &root.children {
                    self.write_records(child, &mut document);
                }
            }
        } else {
            self.write_records(key, &mut document);
        }
        document
    }

    fn write_records(&self, key: NodeKey, document: &mut SceneDocument) {
        let Some(node) = self.nodes.get(key) else {
            return;
        };
        document.game_objects.push(self.node_record(node));
        for &child in &node.children {
            self.write_records(child, document);
        }
    }

    fn node_record(&self, node: &Node) -> NodeRecord {
        let parent_uid = node.parent
            .and_then(|p| self.nodes.get(p))
            .map_or(0, |p| p.uid());

        let components = node.components();
        let mut records = vec![ComponentRecord {
            active: true,
            data: ComponentData::Transform(TransformData::from(components.transform())),
        }];
        if let Some(slot) = components.material() {
            records.push(ComponentRecord {
                active: slot.state.active,
                data: ComponentData::Material(MaterialData::from(&slot.component)),
            });
        }
        for slot in components.meshes() {
            records.push(ComponentRecord {
                active: slot.state.active,
                data: ComponentData::Mesh(MeshData { resource: slot.component.resource_uid() }),
            });
        }
        for slot in components.cameras() {
            records.push(ComponentRecord {
                active: slot.state.active,
                data: ComponentData::Camera(CameraData::from(&slot.component)),
            });
        }
        for slot in components.lights() {
            records.push(ComponentRecord {
                active: slot.state.active,
                data: ComponentData::Light(LightData::from(&slot.component)),
            });
        }

        NodeRecord {
            uid: node.uid(),
            parent_uid,
            name: node.name().to_string(),
            tag: node.tag().to_string(),
            layer: node.layer(),
            active: node.active,
            is_static: node.is_static,
            components: records,
        }
    }

    /// Copy a subtree next to the original, with fresh UIDs.
    /// Returns the key of the copy's top node.
    pub fn duplicate(&mut self, key: NodeKey) -> Option<NodeKey> {
        if key == self.root {
            engine_warn!("stellar::SceneManager", "The scene root cannot be duplicated");
            return None;
        }
        let parent = self.nodes.get(key)?.parent.unwrap_or(self.root);
        let document = self.save_subtree(key);
        self.instantiate(&document, parent, true).first().copied()
    }

    /// Create the nodes of `document`.
    ///
    /// Recorded UIDs are kept unless they collide with a live node, are 0,
    /// or `reassign_all` is set. A record repeating a UID already seen in
    /// the same document is skipped. Parent links are resolved after every
    /// node exists: through the remap table first, then against live nodes.
    /// Records whose parent is 0, cannot be found, or would close a cycle
    /// go under `parent`. Returns the created keys in document order.
    pub fn instantiate(&mut self, document: &SceneDocument, parent: NodeKey, reassign_all: bool) -> Vec<NodeKey> {
        let parent = if self.nodes.contains_key(parent) { parent } else { self.root };
        let mut remap = IdRemap::new();
        let mut seen: FxHashSet<Uid> = FxHashSet::default();
        let mut created: Vec<(NodeKey, &NodeRecord)> = Vec::with_capacity(document.game_objects.len());

        for record in &document.game_objects {
            if record.uid != 0 && !seen.insert(record.uid) {
                engine_warn!("stellar::SceneManager",
                    "Skipping '{}': UID {} appears twice in the document", record.name, record.uid);
                continue;
            }
            let uid = if reassign_all || record.uid == 0 || self.uid_lookup.contains_key(&record.uid) {
                let uid = self.next_free_uid();
                remap.insert(record.uid, uid);
                uid
            } else {
                record.uid
            };
            let node = self.build_node(uid, record);
            let key = self.nodes.insert(node);
            self.uid_lookup.insert(uid, key);
            self.dynamic_objects.push(key);
            created.push((key, record));
        }
        if !remap.is_empty() {
            engine_debug!("stellar::SceneManager", "Reassigned {} UID(s) on load", remap.len());
        }

        let created_set: FxHashSet<NodeKey> = created.iter().map(|(key, _)| *key).collect();
        let mut top_level = Vec::new();
        for (key, record) in &created {
            let resolved = if record.parent_uid == 0 {
                None
            } else {
                self.uid_lookup.get(&remap.resolve(record.parent_uid)).copied()
            };
            let node_parent = match resolved {
                // Links made so far form a forest; unresolved nodes have no parent yet
                Some(p) if self.is_ancestor_or_self(*key, p) => {
                    engine_warn!("stellar::SceneManager",
                        "Parent {} of '{}' would form a cycle, attaching to fallback parent",
                        record.parent_uid, record.name);
                    parent
                }
                Some(p) => p,
                None => {
                    if record.parent_uid != 0 {
                        engine_warn!("stellar::SceneManager",
                            "Parent {} of '{}' not found, attaching to fallback parent",
                            record.parent_uid, record.name);
                    }
                    parent
                }
            };
            if let Some(node) = self.nodes.get_mut(*key) {
                node.parent = Some(node_parent);
            }
            if let Some(p) = self.nodes.get_mut(node_parent) {
                p.children.push(*key);
            }
            if !created_set.contains(&node_parent) {
                top_level.push(*key);
            }
        }

        for &key in &top_level {
            let parent_global = self.nodes.get(key)
                .and_then(|node| node.parent)
                .and_then(|p| self.nodes.get(p))
                .map_or(Mat4::IDENTITY, |p| *p.transform().global_transform());
            self.calc_transform_rec(key, parent_global, true);
            self.calc_boxes_rec(key);
        }

        // Nodes are built active; disabling cascades, so a node never ends
        // up active below an inactive one
        for &key in &top_level {
            if self.has_inactive_ancestor(key) {
                self.set_active_rec(key, false);
            }
        }
        for (key, record) in &created {
            if !record.active {
                self.set_active_rec(*key, false);
            }
            self.set_static_rec(*key, record.is_static);
        }

        created.into_iter().map(|(key, _)| key).collect()
    }

    fn build_node(&self, uid: Uid, record: &NodeRecord) -> Node {
        let mut node = Node::new(uid, &record.name, None);
        node.set_tag(&record.tag);
        node.set_layer(record.layer);

        for component in &record.components {
            let id = match &component.data {
                ComponentData::Transform(data) => {
                    data.apply(node.transform_mut());
                    None
                }
                ComponentData::Material(data) => node.add_material(Material::from(data)),
                ComponentData::Mesh(data) => {
                    let mesh = match self.resources.mesh(data.resource) {
                        Some(resource) => Mesh::new(resource),
                        None => {
                            engine_warn!("stellar::SceneManager",
                                "Mesh resource {} of '{}' is not loaded", data.resource, record.name);
                            Mesh::unresolved(data.resource)
                        }
                    };
                    Some(node.add_mesh(mesh))
                }
                ComponentData::Camera(data) => Some(node.add_camera(Camera::from(data))),
                ComponentData::Light(data) => Some(node.add_light(Light::from(data))),
                ComponentData::Unknown => {
                    engine_warn!("stellar::SceneManager",
                        "Skipping component of unknown type on '{}'", record.name);
                    None
                }
            };
            if let (Some(id), false) = (id, component.active) {
                node.set_component_active(id, false);
            }
        }
        node
    }
}

#[cfg(test)]
#[path = "scene_manager_tests.rs"]
mod tests;
