use std::sync::Arc;
use glam::{Mat4, Vec3};
use slotmap::SlotMap;
use crate::math::{AABB, LineSegment, Ray};
use crate::resource::MeshResource;
use crate::scene::components::{Light, Mesh};
use crate::spatial::Octree;
use super::*;

fn cube() -> MeshResource {
    MeshResource::cube()
}

/// Node with a cube mesh at `position`, transform and box computed
fn cube_node(position: Vec3, scale: f32) -> Node {
    let mut node = Node::new(1, "cube", None);
    node.transform_mut().set_translation(position);
    node.transform_mut().set_scale(Vec3::splat(scale));
    node.add_mesh(Mesh::new(Arc::new(cube())));
    node.calc_transform(&Mat4::IDENTITY, true);
    node.recalc_box();
    node
}

fn world() -> Octree<NodeKey> {
    Octree::new(AABB::from_center_half_extents(Vec3::ZERO, Vec3::splat(50.0)), 3)
}

// ============================================================================
// MESH PROBE: RAY
// ============================================================================

#[test]
fn test_ray_hits_translated_cube_at_world_distance() {
    let global = Mat4::from_translation(Vec3::new(10.0, 0.0, 0.0));
    let ray = Ray::new(Vec3::new(0.0, 0.1, 0.2), Vec3::X);

    let distance = ray.mesh_distance(&cube(), &global).unwrap();
    assert!((distance - 9.5).abs() < 1e-4, "distance = {distance}");
}

#[test]
fn test_ray_distance_is_world_space_under_scale() {
    // Cube scaled by 4: near face at x = 10 - 2
    let global = Mat4::from_scale_rotation_translation(
        Vec3::splat(4.0),
        glam::Quat::IDENTITY,
        Vec3::new(10.0, 0.0, 0.0),
    );
    let ray = Ray::new(Vec3::new(0.0, 0.3, -0.4), Vec3::X);

    let distance = ray.mesh_distance(&cube(), &global).unwrap();
    assert!((distance - 8.0).abs() < 1e-4, "distance = {distance}");
}

#[test]
fn test_ray_miss_returns_none() {
    let global = Mat4::from_translation(Vec3::new(10.0, 0.0, 0.0));
    let ray = Ray::new(Vec3::new(0.0, 5.0, 0.0), Vec3::X);
    assert!(ray.mesh_distance(&cube(), &global).is_none());
}

#[test]
fn test_ray_pointing_away_misses() {
    let global = Mat4::from_translation(Vec3::new(10.0, 0.0, 0.0));
    let ray = Ray::new(Vec3::new(0.0, 0.1, 0.1), Vec3::NEG_X);
    assert!(ray.mesh_distance(&cube(), &global).is_none());
}

#[test]
fn test_singular_transform_is_skipped() {
    let global = Mat4::from_scale(Vec3::new(0.0, 1.0, 1.0));
    let ray = Ray::new(Vec3::new(-10.0, 0.1, 0.1), Vec3::X);
    assert!(ray.mesh_distance(&cube(), &global).is_none());
}

// ============================================================================
// MESH PROBE: SEGMENT
// ============================================================================

#[test]
fn test_segment_hit_scales_fraction_to_length() {
    let global = Mat4::from_translation(Vec3::new(10.0, 0.0, 0.0));
    let segment = LineSegment::new(Vec3::new(0.0, 0.1, 0.2), Vec3::new(20.0, 0.1, 0.2));

    let distance = segment.mesh_distance(&cube(), &global).unwrap();
    assert!((distance - 9.5).abs() < 1e-4, "distance = {distance}");
}

#[test]
fn test_segment_too_short_misses() {
    let global = Mat4::from_translation(Vec3::new(10.0, 0.0, 0.0));
    let segment = LineSegment::new(Vec3::new(0.0, 0.1, 0.2), Vec3::new(5.0, 0.1, 0.2));
    assert!(segment.mesh_distance(&cube(), &global).is_none());
}

// ============================================================================
// CAST
// ============================================================================

#[test]
fn test_cast_picks_nearest_dynamic() {
    let mut nodes: SlotMap<NodeKey, Node> = SlotMap::with_key();
    let far = nodes.insert(cube_node(Vec3::new(10.0, 0.0, 0.0), 1.0));
    let near = nodes.insert(cube_node(Vec3::new(4.0, 0.0, 0.0), 1.0));
    let octree = world();

    let ray = Ray::new(Vec3::new(0.0, 0.1, 0.2), Vec3::X);
    let hit = cast(&ray, &octree, &[far, near], &nodes).unwrap();
    assert_eq!(hit.node, near);
    assert!((hit.distance - 3.5).abs() < 1e-4);
}

#[test]
fn test_cast_merges_static_and_dynamic() {
    let mut nodes: SlotMap<NodeKey, Node> = SlotMap::with_key();
    let dynamic = nodes.insert(cube_node(Vec3::new(10.0, 0.0, 0.0), 1.0));
    let fixed = nodes.insert(cube_node(Vec3::new(6.0, 0.0, 0.0), 1.0));

    let mut octree = world();
    octree.insert(fixed, nodes[fixed].enclosing_box());

    let ray = Ray::new(Vec3::new(0.0, 0.1, 0.2), Vec3::X);
    let hit = cast(&ray, &octree, &[dynamic], &nodes).unwrap();
    assert_eq!(hit.node, fixed);
    assert!((hit.distance - 5.5).abs() < 1e-4);
}

#[test]
fn test_cast_scans_past_first_box() {
    // The light widens the plane node's box, so its box is entered first
    // while its triangle hit lies behind the cube.
    let mut nodes: SlotMap<NodeKey, Node> = SlotMap::with_key();

    let mut wide = Node::new(2, "wide", None);
    wide.transform_mut().set_translation(Vec3::new(10.0, 0.0, 0.0));
    wide.add_mesh(Mesh::new(Arc::new(MeshResource::plane())));
    wide.add_light(Light::point(Vec3::ONE, 1.0, 10.0));
    wide.calc_transform(&Mat4::IDENTITY, true);
    wide.recalc_box();
    let wide = nodes.insert(wide);

    let small = nodes.insert(cube_node(Vec3::new(10.0, 3.0, 0.0), 1.0));
    let octree = world();

    let ray = Ray::new(Vec3::new(10.2, 20.0, 0.1), Vec3::NEG_Y);
    let candidates = collect_candidates(&ray, &octree, &[wide, small], &nodes);
    assert_eq!(candidates[0].1, wide);

    let hit = cast(&ray, &octree, &[wide, small], &nodes).unwrap();
    assert_eq!(hit.node, small);
    assert!((hit.distance - 16.5).abs() < 1e-4, "distance = {}", hit.distance);
}

#[test]
fn test_cast_ignores_nodes_without_mesh() {
    let mut nodes: SlotMap<NodeKey, Node> = SlotMap::with_key();
    let mut empty = Node::new(3, "empty", None);
    empty.calc_transform(&Mat4::IDENTITY, true);
    empty.recalc_box();
    let empty = nodes.insert(empty);

    let ray = Ray::new(Vec3::new(-10.0, 0.0, 0.0), Vec3::X);
    assert!(cast(&ray, &world(), &[empty], &nodes).is_none());
}

#[test]
fn test_cast_is_deterministic() {
    let mut nodes: SlotMap<NodeKey, Node> = SlotMap::with_key();
    let keys: Vec<NodeKey> = (0..5)
        .map(|i| nodes.insert(cube_node(Vec3::new(3.0 * i as f32, 0.0, 0.0), 1.0)))
        .collect();
    let octree = world();

    let ray = Ray::new(Vec3::new(-20.0, 0.2, 0.1), Vec3::X);
    let first = cast(&ray, &octree, &keys, &nodes);
    let second = cast(&ray, &octree, &keys, &nodes);
    assert_eq!(first, second);
    assert_eq!(first.unwrap().node, keys[0]);
}

#[test]
fn test_candidates_sorted_by_entry_distance() {
    let mut nodes: SlotMap<NodeKey, Node> = SlotMap::with_key();
    let c = nodes.insert(cube_node(Vec3::new(9.0, 0.0, 0.0), 1.0));
    let a = nodes.insert(cube_node(Vec3::new(3.0, 0.0, 0.0), 1.0));
    let b = nodes.insert(cube_node(Vec3::new(6.0, 0.0, 0.0), 1.0));

    let ray = Ray::new(Vec3::ZERO, Vec3::X);
    let candidates = collect_candidates(&ray, &world(), &[c, a, b], &nodes);
    let order: Vec<NodeKey> = candidates.iter().map(|(_, key)| *key).collect();
    assert_eq!(order, vec![a, b, c]);
}
