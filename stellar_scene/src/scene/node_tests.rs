use std::sync::Arc;
use glam::{Mat4, Quat, Vec3};
use crate::camera::Camera;
use crate::resource::MeshResource;
use crate::scene::components::{Light, Material, Mesh};
use super::*;

fn node() -> Node {
    Node::new(7, "node", None)
}

fn cube_mesh() -> Mesh {
    Mesh::new(Arc::new(MeshResource::cube()))
}

// ============================================================================
// CONSTRUCTION & METADATA
// ============================================================================

#[test]
fn test_new_node_defaults() {
    let n = node();
    assert_eq!(n.uid(), 7);
    assert_eq!(n.name(), "node");
    assert_eq!(n.tag(), "");
    assert_eq!(n.layer(), 1);
    assert!(n.is_active());
    assert!(!n.is_static());
    assert!(n.parent().is_none());
    assert!(n.children().is_empty());
    assert_eq!(n.component_types(), ComponentTypes::TRANSFORM);
    assert!(n.enclosing_box().is_empty());
}

#[test]
fn test_metadata_setters() {
    let mut n = node();
    n.set_name("renamed");
    n.set_tag("Player");
    n.set_layer(0b100);
    assert_eq!(n.name(), "renamed");
    assert_eq!(n.tag(), "Player");
    assert_eq!(n.layer(), 0b100);
}

// ============================================================================
// COMPONENT CREATION
// ============================================================================

#[test]
fn test_create_component_enforces_singletons() {
    let mut n = node();
    assert!(n.create_component(ComponentType::Transform).is_none());
    assert!(n.create_component(ComponentType::Material).is_some());
    assert!(n.create_component(ComponentType::Material).is_none());
    assert!(n.create_component(ComponentType::Mesh).is_some());
    assert!(n.create_component(ComponentType::Mesh).is_some());
    assert_eq!(n.count_components(ComponentType::Mesh), 2);
    assert_eq!(n.count_components(ComponentType::Material), 1);
}

#[test]
fn test_added_component_sees_current_pose() {
    let mut n = node();
    n.transform_mut().set_translation(Vec3::new(3.0, 4.0, 5.0));
    n.calc_transform(&Mat4::IDENTITY, false);

    let id = n.add_light(Light::point(Vec3::ONE, 1.0, 1.0));
    let light = &n.lights()[0];
    assert_eq!(light.state.id, id);
    assert_eq!(light.component.world_position(), Vec3::new(3.0, 4.0, 5.0));
}

#[test]
fn test_add_material_keeps_first() {
    let mut n = node();
    n.add_material(Material::new(glam::Vec4::new(1.0, 0.0, 0.0, 1.0)));
    assert!(n.add_material(Material::default()).is_none());
    assert_eq!(n.material().unwrap().color.x, 1.0);
    assert_eq!(n.material().unwrap().color.y, 0.0);
}

// ============================================================================
// REMOVAL & ACTIVATION
// ============================================================================

#[test]
fn test_remove_component_is_deferred() {
    let mut n = node();
    let id = n.add_camera(Camera::default());
    assert!(n.remove_component(id));
    assert!(n.camera(id).is_some());

    assert!(n.drain_removals());
    assert!(n.camera(id).is_none());
    assert!(!n.has_component(ComponentType::Camera));
    assert!(!n.drain_removals());
}

#[test]
fn test_remove_transform_rejected() {
    let mut n = node();
    assert!(!n.remove_component(ComponentId::TRANSFORM));
    n.drain_removals();
    assert!(n.has_component(ComponentType::Transform));
}

#[test]
fn test_remove_unknown_rejected() {
    let mut n = node();
    let id = n.add_mesh(cube_mesh());
    n.remove_component(id);
    n.drain_removals();
    assert!(!n.remove_component(id));
}

#[test]
fn test_inactive_component_leaves_box() {
    let mut n = node();
    n.add_mesh(cube_mesh());
    let light = n.add_light(Light::point(Vec3::ONE, 1.0, 3.0));
    n.calc_transform(&Mat4::IDENTITY, true);
    n.recalc_box();
    assert_eq!(n.enclosing_box().max, Vec3::splat(3.0));

    assert!(n.set_component_active(light, false));
    n.calc_transform(&Mat4::IDENTITY, false);
    assert!(n.was_dirty());
    n.recalc_box();
    assert_eq!(n.enclosing_box().max, Vec3::splat(0.5));
}

#[test]
fn test_transform_cannot_be_deactivated() {
    let mut n = node();
    assert!(!n.set_component_active(ComponentId::TRANSFORM, false));
    assert!(n.component_state(ComponentId::TRANSFORM).unwrap().active);
}

// ============================================================================
// TRANSFORM & BOX PASSES
// ============================================================================

#[test]
fn test_calc_transform_skips_clean_node() {
    let mut n = node();
    n.transform_mut().set_translation(Vec3::X);
    let (_, changed) = n.calc_transform(&Mat4::IDENTITY, false);
    assert!(changed);
    assert!(n.was_dirty());

    let (_, changed) = n.calc_transform(&Mat4::IDENTITY, false);
    assert!(!changed);
    assert!(!n.was_dirty());
}

#[test]
fn test_calc_transform_forced_by_parent() {
    let mut n = node();
    n.calc_transform(&Mat4::IDENTITY, false);

    let parent = Mat4::from_translation(Vec3::new(0.0, 10.0, 0.0));
    let (global, changed) = n.calc_transform(&parent, true);
    assert!(changed);
    assert_eq!(global.w_axis.truncate(), Vec3::new(0.0, 10.0, 0.0));
}

#[test]
fn test_box_follows_rotation() {
    let mut n = node();
    n.add_mesh(cube_mesh());
    n.transform_mut().set_rotation(Quat::from_rotation_y(std::f32::consts::FRAC_PI_4));
    n.calc_transform(&Mat4::IDENTITY, false);
    n.recalc_box();

    let half = std::f32::consts::SQRT_2 * 0.5;
    let aabb = n.enclosing_box();
    assert!((aabb.max.x - half).abs() < 1e-5);
    assert!((aabb.max.z - half).abs() < 1e-5);
    assert!((aabb.max.y - 0.5).abs() < 1e-5);
    assert!(n.oriented_box().is_finite());
}

#[test]
fn test_box_without_geometry_stays_empty() {
    let mut n = node();
    n.add_camera(Camera::default());
    n.calc_transform(&Mat4::IDENTITY, true);
    n.recalc_box();
    assert!(n.enclosing_box().is_empty());
    assert!(!n.oriented_box().is_finite());
}

// ============================================================================
// HOOK PHASES
// ============================================================================

#[test]
fn test_update_waits_for_start() {
    let mut n = node();
    let id = n.add_camera(Camera::default());
    n.camera_mut(id).unwrap().set_fov(1.0);

    // Not started yet: update must not refresh the projection
    n.update(0.016);
    assert!(n.camera(id).unwrap().is_projection_dirty());

    n.pre_update(0.016);
    assert!(n.component_state(id).unwrap().started);
    n.update(0.016);
    assert!(!n.camera(id).unwrap().is_projection_dirty());
}

#[test]
fn test_inactive_component_skips_update() {
    let mut n = node();
    let id = n.add_camera(Camera::default());
    n.pre_update(0.016);
    n.set_component_active(id, false);
    n.camera_mut(id).unwrap().set_fov(1.0);

    n.update(0.016);
    assert!(n.camera(id).unwrap().is_projection_dirty());
}
