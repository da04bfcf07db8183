/// Ray / segment picking against node meshes.
///
/// 1. Static candidates come from the octree, dynamic ones from a linear
///    box test of the dynamic list. Both are keyed by box entry distance.
/// 2. Candidates are visited in ascending entry distance; each node's first
///    mesh is tested triangle by triangle in the node's local space.
/// 3. The scan never stops early: box order is only a heuristic, a later
///    candidate may still hold a closer triangle.
///
/// All reported distances are world-space lengths from the probe start.

use glam::Mat4;
use slotmap::SlotMap;
use crate::math::{LineSegment, Ray};
use crate::resource::MeshResource;
use crate::spatial::{LineProbe, Octree};
use super::node::{Node, NodeKey};

/// Nearest triangle hit of a ray cast
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    pub node: NodeKey,
    /// World-space distance from the probe start
    pub distance: f32,
}

/// A probe that can also be tested against mesh triangles
pub trait MeshProbe: LineProbe {
    /// Nearest world-space hit distance against `mesh` placed at `global`
    fn mesh_distance(&self, mesh: &MeshResource, global: &Mat4) -> Option<f32>;
}

/// Inverse of `global`, or `None` when it cannot be inverted
fn local_space(global: &Mat4) -> Option<Mat4> {
    let inverse = global.inverse();
    inverse.is_finite().then_some(inverse)
}

fn nearest(hits: impl Iterator<Item = f32>) -> Option<f32> {
    let t = hits.fold(f32::INFINITY, f32::min);
    t.is_finite().then_some(t)
}

impl MeshProbe for Ray {
    fn mesh_distance(&self, mesh: &MeshResource, global: &Mat4) -> Option<f32> {
        let inverse = local_space(global)?;
        // Renormalize so the local parameter is a local distance
        let local = self.transformed(&inverse).normalized();
        if local.direction == glam::Vec3::ZERO {
            return None;
        }

        let t = nearest(mesh.triangles().filter_map(|tri| local.intersect_triangle(&tri)))?;
        let hit = global.transform_point3(local.point_at(t));
        Some(hit.distance(self.origin))
    }
}

impl MeshProbe for LineSegment {
    fn mesh_distance(&self, mesh: &MeshResource, global: &Mat4) -> Option<f32> {
        let inverse = local_space(global)?;
        // The segment fraction is preserved by affine maps
        let local = self.transformed(&inverse);
        let t = nearest(mesh.triangles().filter_map(|tri| local.intersect_triangle(&tri)))?;
        Some(t * self.length())
    }
}

/// Box candidates from both partitions, sorted by entry distance.
///
/// The sort is stable: equal distances keep static-before-dynamic
/// insertion order.
pub(crate) fn collect_candidates<P: MeshProbe>(
    probe: &P,
    octree: &Octree<NodeKey>,
    dynamic_objects: &[NodeKey],
    nodes: &SlotMap<NodeKey, Node>,
) -> Vec<(f32, NodeKey)> {
    let mut candidates = Vec::new();
    octree.collect_intersections(probe, &mut candidates);

    for &key in dynamic_objects {
        if let Some(node) = nodes.get(key) {
            if let Some(distance) = probe.enter_distance(node.enclosing_box()) {
                candidates.push((distance, key));
            }
        }
    }

    candidates.sort_by(|a, b| a.0.total_cmp(&b.0));
    candidates
}

/// Nearest mesh hit over both partitions
pub(crate) fn cast<P: MeshProbe>(
    probe: &P,
    octree: &Octree<NodeKey>,
    dynamic_objects: &[NodeKey],
    nodes: &SlotMap<NodeKey, Node>,
) -> Option<RayHit> {
    let mut best: Option<RayHit> = None;

    for (_, key) in collect_candidates(probe, octree, dynamic_objects, nodes) {
        let Some(node) = nodes.get(key) else {
            continue;
        };
        let Some(mesh) = node.first_mesh().and_then(|mesh| mesh.resource()) else {
            continue;
        };
        let Some(distance) = probe.mesh_distance(mesh, node.transform().global_transform()) else {
            continue;
        };
        if best.map_or(true, |b| distance < b.distance) {
            best = Some(RayHit { node: key, distance });
        }
    }

    best
}

#[cfg(test)]
#[path = "raycast_tests.rs"]
mod tests;
