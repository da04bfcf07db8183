/// Octree - static spatial index over the static scene partition.
///
/// Uses single-node placement: each object is stored in exactly one node,
/// the deepest node whose AABB fully contains the object. If the object
/// straddles a child boundary, it stays in the parent.
///
/// - No duplication, so query results never need deduplicating
/// - O(depth) insert and erase per object
///
/// The tree structure is pre-allocated by `create` with a fixed
/// `max_depth`. All 8^d nodes exist regardless of occupancy.
///
/// # Degenerate boxes
///
/// Objects whose box is not finite, or that are not fully inside the
/// world bounds, are stored at the root. Empty boxes are never reported
/// by intersection queries. Non-finite, non-empty boxes (unbounded, NaN)
/// are treated as covering all of space: they are always frustum
/// candidates and are hit by every ray at distance 0.
///
/// # Uninitialized tree
///
/// `Octree::uninitialized()` has no nodes. Every operation on it is a
/// no-op until `create` is called.

use std::hash::Hash;
use rustc_hash::FxHashMap;
use glam::Vec3;
use crate::camera::{Frustum, FrustumTest};
use crate::math::AABB;
use crate::engine_warn;
use super::line_probe::LineProbe;

/// Index of the root node in the flat node array.
const ROOT: usize = 0;

/// Deepest supported subdivision. Depth 6 pre-allocates 299,593 cells.
pub const MAX_OCTREE_DEPTH: u32 = 6;

/// A single node in the octree.
struct OctreeNode<K> {
    /// World-space AABB of this node
    aabb: AABB,
    /// Index of the first child in the flat array (0 = no children / leaf)
    first_child: usize,
    /// Objects that don't fit in any child
    objects: Vec<K>,
}

pub struct Octree<K> {
    /// Flat array of all nodes, depth-first
    nodes: Vec<OctreeNode<K>>,
    /// Maximum depth of the tree (root = depth 0)
    max_depth: u32,
    /// Reverse lookup: object key → (node index, world AABB)
    object_locations: FxHashMap<K, (usize, AABB)>,
    /// subtree_sizes[d] = total node count for a subtree of depth d
    subtree_sizes: Vec<usize>,
}

impl<K: Copy + Eq + Hash> Octree<K> {
    /// A tree with no nodes. Inserts and queries do nothing.
    pub fn uninitialized() -> Self {
        Self {
            nodes: Vec::new(),
            max_depth: 0,
            object_locations: FxHashMap::default(),
            subtree_sizes: Vec::new(),
        }
    }

    /// Create an octree covering `bounds`.
    pub fn new(bounds: AABB, max_depth: u32) -> Self {
        let mut octree = Self::uninitialized();
        octree.create(bounds, max_depth);
        octree
    }

    /// (Re)initialize the tree over `bounds`, dropping every stored object.
    ///
    /// Non-finite bounds cannot be subdivided and produce a root-only tree.
    ///
    /// # Arguments
    ///
    /// * `bounds` - World-space AABB encompassing the static scene
    /// * `max_depth` - Maximum tree depth (root = 0), clamped to `MAX_OCTREE_DEPTH`. Total nodes = (8^(d+1) - 1) / 7.
    pub fn create(&mut self, bounds: AABB, max_depth: u32) {
        let max_depth = if !bounds.is_finite() {
            if max_depth > 0 {
                engine_warn!("stellar::Octree",
                    "Cannot subdivide non-finite bounds, using a root-only tree");
            }
            0
        } else if max_depth > MAX_OCTREE_DEPTH {
            engine_warn!("stellar::Octree",
                "Depth {} exceeds the maximum of {}, clamping", max_depth, MAX_OCTREE_DEPTH);
            MAX_OCTREE_DEPTH
        } else {
            max_depth
        };

        let total_nodes = Self::total_node_count(max_depth);
        let mut nodes = Vec::with_capacity(total_nodes);
        Self::build_recursive(&mut nodes, &bounds, 0, max_depth);
        debug_assert_eq!(nodes.len(), total_nodes);

        self.nodes = nodes;
        self.max_depth = max_depth;
        self.object_locations.clear();
        self.subtree_sizes = (0..=max_depth).map(Self::total_node_count).collect();
    }

    pub fn is_initialized(&self) -> bool {
        !self.nodes.is_empty()
    }

    /// World bounds of the root cell
    pub fn bounds(&self) -> Option<&AABB> {
        self.nodes.get(ROOT).map(|node| &node.aabb)
    }

    pub fn max_depth(&self) -> u32 {
        self.max_depth
    }

    /// Number of stored objects
    pub fn len(&self) -> usize {
        self.object_locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.object_locations.is_empty()
    }

    pub fn contains(&self, key: K) -> bool {
        self.object_locations.contains_key(&key)
    }

    /// The box an object was last inserted or updated with
    pub fn stored_box(&self, key: K) -> Option<&AABB> {
        self.object_locations.get(&key).map(|(_, aabb)| aabb)
    }

    /// Total number of nodes for a given depth: (8^(d+1) - 1) / 7
    fn total_node_count(max_depth: u32) -> usize {
        let mut count = 0usize;
        let mut level_count = 1usize;
        for _ in 0..=max_depth {
            count += level_count;
            level_count *= 8;
        }
        count
    }

    fn build_recursive(
        nodes: &mut Vec<OctreeNode<K>>,
        aabb: &AABB,
        depth: u32,
        max_depth: u32,
    ) {
        let node_index = nodes.len();
        nodes.push(OctreeNode {
            aabb: *aabb,
            first_child: 0,
            objects: Vec::new(),
        });

        if depth >= max_depth {
            return;
        }

        let center = aabb.center();
        nodes[node_index].first_child = nodes.len();

        for octant in 0..8u8 {
            let child_aabb = Self::octant_aabb(aabb, &center, octant);
            Self::build_recursive(nodes, &child_aabb, depth + 1, max_depth);
        }
    }

    /// Octant bit layout: bit0 = X, bit1 = Y, bit2 = Z (0 = low, 1 = high).
    fn octant_aabb(parent: &AABB, center: &Vec3, octant: u8) -> AABB {
        AABB {
            min: Vec3::new(
                if octant & 1 == 0 { parent.min.x } else { center.x },
                if octant & 2 == 0 { parent.min.y } else { center.y },
                if octant & 4 == 0 { parent.min.z } else { center.z },
            ),
            max: Vec3::new(
                if octant & 1 == 0 { center.x } else { parent.max.x },
                if octant & 2 == 0 { center.y } else { parent.max.y },
                if octant & 4 == 0 { center.z } else { parent.max.z },
            ),
        }
    }

    fn point_octant(center: &Vec3, point: &Vec3) -> u8 {
        ((point.x >= center.x) as u8)
            | (((point.y >= center.y) as u8) << 1)
            | (((point.z >= center.z) as u8) << 2)
    }

    fn subtree_offset(&self, octant: u8, remaining_depth: u32) -> usize {
        octant as usize * self.subtree_sizes[remaining_depth as usize]
    }

    /// Find the deepest node that fully contains `world_aabb`.
    ///
    /// If both AABB corners fall into the same octant, the object fits
    /// entirely in that child; otherwise it stays in the current node.
    fn find_target_node(&self, world_aabb: &AABB) -> usize {
        if !world_aabb.is_finite() || !self.nodes[ROOT].aabb.contains(world_aabb) {
            return ROOT;
        }

        let mut node_idx = ROOT;
        let mut depth = 0;

        loop {
            let first_child = self.nodes[node_idx].first_child;
            if depth >= self.max_depth || first_child == 0 {
                return node_idx;
            }

            let center = self.nodes[node_idx].aabb.center();
            let min_oct = Self::point_octant(&center, &world_aabb.min);
            let max_oct = Self::point_octant(&center, &world_aabb.max);
            if min_oct != max_oct {
                return node_idx;
            }

            node_idx = first_child + self.subtree_offset(min_oct, self.max_depth - depth - 1);
            depth += 1;
        }
    }

    // ===== MUTATION =====

    /// Insert an object with its world-space AABB.
    ///
    /// Inserting a key that is already stored moves it instead.
    pub fn insert(&mut self, key: K, world_aabb: &AABB) {
        if !self.is_initialized() {
            return;
        }
        if self.object_locations.contains_key(&key) {
            self.update(key, world_aabb);
            return;
        }

        let target = self.find_target_node(world_aabb);
        self.nodes[target].objects.push(key);
        self.object_locations.insert(key, (target, *world_aabb));
    }

    /// Remove an object. Returns false if it was not stored.
    pub fn erase(&mut self, key: K) -> bool {
        let Some((node_idx, _)) = self.object_locations.remove(&key) else {
            return false;
        };
        let objects = &mut self.nodes[node_idx].objects;
        if let Some(pos) = objects.iter().position(|&k| k == key) {
            objects.swap_remove(pos);
        }
        true
    }

    /// Refresh a stored object's box, moving it to another node if needed.
    /// Unknown keys are ignored.
    pub fn update(&mut self, key: K, world_aabb: &AABB) {
        if !self.is_initialized() {
            return;
        }
        let target = self.find_target_node(world_aabb);

        let Some(entry) = self.object_locations.get_mut(&key) else {
            return;
        };
        if entry.0 == target {
            entry.1 = *world_aabb;
            return;
        }

        self.erase(key);
        self.nodes[target].objects.push(key);
        self.object_locations.insert(key, (target, *world_aabb));
    }

    /// Remove all objects, keeping the node layout.
    pub fn clear(&mut self) {
        for node in &mut self.nodes {
            node.objects.clear();
        }
        self.object_locations.clear();
    }

    // ===== QUERIES =====

    /// Append every object whose stored box may intersect the frustum.
    ///
    /// Conservative: objects in cells fully inside the frustum are taken
    /// without testing their own box.
    pub fn collect_candidates(&self, frustum: &Frustum, results: &mut Vec<K>) {
        if !self.is_initialized() {
            return;
        }
        // Objects at the root may lie outside the root cell, so the root
        // is always tested object by object.
        self.query_frustum_recursive(ROOT, frustum, FrustumTest::Partial, results, 0);
    }

    /// 3-way classification at each node:
    /// - `Outside` → skip entire subtree
    /// - `Inside` → collect all objects from subtree without further testing
    /// - `Partial` → test objects individually, recurse into children
    fn query_frustum_recursive(
        &self,
        node_idx: usize,
        frustum: &Frustum,
        classification: FrustumTest,
        results: &mut Vec<K>,
        depth: u32,
    ) {
        let node = &self.nodes[node_idx];

        match classification {
            FrustumTest::Outside => {}
            FrustumTest::Inside => self.collect_all(node_idx, results, depth),
            FrustumTest::Partial => {
                for &key in &node.objects {
                    if let Some((_, world_aabb)) = self.object_locations.get(&key) {
                        if frustum.intersects_aabb(world_aabb) {
                            results.push(key);
                        }
                    }
                }

                if depth < self.max_depth && node.first_child != 0 {
                    for octant in 0..8u8 {
                        let child_idx = node.first_child
                            + self.subtree_offset(octant, self.max_depth - depth - 1);
                        let child_class = frustum.classify_aabb(&self.nodes[child_idx].aabb);
                        self.query_frustum_recursive(
                            child_idx, frustum, child_class, results, depth + 1,
                        );
                    }
                }
            }
        }
    }

    fn collect_all(&self, node_idx: usize, results: &mut Vec<K>, depth: u32) {
        let node = &self.nodes[node_idx];
        results.extend_from_slice(&node.objects);

        if depth < self.max_depth && node.first_child != 0 {
            for octant in 0..8u8 {
                let child_idx = node.first_child
                    + self.subtree_offset(octant, self.max_depth - depth - 1);
                self.collect_all(child_idx, results, depth + 1);
            }
        }
    }

    /// Append `(entry distance, key)` for every object whose stored box the
    /// probe crosses. Results are in tree order; callers sort them.
    pub fn collect_intersections<P: LineProbe + ?Sized>(
        &self,
        probe: &P,
        results: &mut Vec<(f32, K)>,
    ) {
        if !self.is_initialized() {
            return;
        }
        self.query_line_recursive(ROOT, probe, results, 0);
    }

    fn query_line_recursive<P: LineProbe + ?Sized>(
        &self,
        node_idx: usize,
        probe: &P,
        results: &mut Vec<(f32, K)>,
        depth: u32,
    ) {
        let node = &self.nodes[node_idx];

        for &key in &node.objects {
            if let Some((_, world_aabb)) = self.object_locations.get(&key) {
                if let Some(distance) = probe.enter_distance(world_aabb) {
                    results.push((distance, key));
                }
            }
        }

        if depth < self.max_depth && node.first_child != 0 {
            for octant in 0..8u8 {
                let child_idx = node.first_child
                    + self.subtree_offset(octant, self.max_depth - depth - 1);
                if probe.enter_distance(&self.nodes[child_idx].aabb).is_some() {
                    self.query_line_recursive(child_idx, probe, results, depth + 1);
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "octree_tests.rs"]
mod tests;
