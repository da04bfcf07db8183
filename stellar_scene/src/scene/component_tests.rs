use std::sync::Arc;
use glam::{Vec3, Vec4};
use crate::camera::Camera;
use crate::resource::MeshResource;
use crate::scene::components::{Light, Material, Mesh};
use super::*;

fn cube_mesh() -> Mesh {
    Mesh::new(Arc::new(MeshResource::cube()))
}

// ============================================================================
// PRESENCE MASK
// ============================================================================

#[test]
fn test_new_has_only_transform() {
    let components = Components::new();
    assert_eq!(components.types(), ComponentTypes::TRANSFORM);
    assert!(components.has(ComponentType::Transform));
    assert_eq!(components.total_count(), 1);
    assert_eq!(components.type_of(ComponentId::TRANSFORM), Some(ComponentType::Transform));
}

#[test]
fn test_material_is_singleton() {
    let mut components = Components::new();
    assert!(components.add_material(Material::default()).is_some());
    assert!(components.add_material(Material::new(Vec4::ONE)).is_none());
    assert_eq!(components.count(ComponentType::Material), 1);
}

#[test]
fn test_repeatable_types_accumulate() {
    let mut components = Components::new();
    components.add_mesh(cube_mesh());
    components.add_mesh(cube_mesh());
    components.add_camera(Camera::default());
    components.add_light(Light::default());
    components.add_light(Light::default());

    assert_eq!(components.count(ComponentType::Mesh), 2);
    assert_eq!(components.count(ComponentType::Camera), 1);
    assert_eq!(components.count(ComponentType::Light), 2);
    assert_eq!(components.total_count(), 6);
    assert!(components.types().contains(ComponentTypes::MESH | ComponentTypes::CAMERA | ComponentTypes::LIGHT));
}

#[test]
fn test_ids_are_never_reused() {
    let mut components = Components::new();
    let a = components.add_mesh(cube_mesh());
    components.queue_removal(a);
    components.drain_removals();
    let b = components.add_mesh(cube_mesh());
    assert_ne!(a, b);
    assert!(b.index() > a.index());
}

// ============================================================================
// DEFERRED REMOVAL
// ============================================================================

#[test]
fn test_removal_waits_for_drain() {
    let mut components = Components::new();
    let id = components.add_camera(Camera::default());

    assert!(components.queue_removal(id));
    assert!(components.state(id).is_some());
    assert_eq!(components.pending_removals(), &[id]);

    assert_eq!(components.drain_removals(), 1);
    assert!(components.state(id).is_none());
    assert!(components.pending_removals().is_empty());
}

#[test]
fn test_transform_and_unknown_ids_cannot_be_queued() {
    let mut components = Components::new();
    assert!(!components.queue_removal(ComponentId::TRANSFORM));
    assert!(!components.queue_removal(ComponentId(42)));
}

#[test]
fn test_double_queue_removes_once() {
    let mut components = Components::new();
    let id = components.add_light(Light::default());
    components.queue_removal(id);
    components.queue_removal(id);
    assert_eq!(components.pending_removals().len(), 1);
    assert_eq!(components.drain_removals(), 1);
}

#[test]
fn test_repeatable_bit_cleared_with_last_instance() {
    let mut components = Components::new();
    let a = components.add_mesh(cube_mesh());
    let b = components.add_mesh(cube_mesh());

    components.queue_removal(a);
    components.drain_removals();
    assert!(components.has(ComponentType::Mesh));

    components.queue_removal(b);
    components.drain_removals();
    assert!(!components.has(ComponentType::Mesh));
}

#[test]
fn test_material_bit_cleared_on_removal() {
    let mut components = Components::new();
    let id = components.add_material(Material::default()).unwrap();
    components.queue_removal(id);
    components.drain_removals();
    assert!(!components.has(ComponentType::Material));
    assert!(components.add_material(Material::default()).is_some());
}

// ============================================================================
// DISPATCH ORDER & BOUNDS
// ============================================================================

#[test]
fn test_dispatch_order_is_fixed() {
    let mut components = Components::new();
    components.add_light(Light::default());
    components.add_camera(Camera::default());
    components.add_mesh(cube_mesh());
    components.add_material(Material::default());

    let types: Vec<ComponentType> = components.entries().map(|(_, ty)| ty).collect();
    assert_eq!(types, vec![
        ComponentType::Transform,
        ComponentType::Material,
        ComponentType::Mesh,
        ComponentType::Camera,
        ComponentType::Light,
    ]);
}

#[test]
fn test_local_box_unions_active_components() {
    let mut components = Components::new();
    components.add_mesh(cube_mesh());
    let light = components.add_light(Light::point(Vec3::ONE, 1.0, 2.0));

    let local_box = components.local_box();
    assert_eq!(local_box.min, Vec3::splat(-2.0));
    assert_eq!(local_box.max, Vec3::splat(2.0));

    for (state, _) in components.iter_mut() {
        if state.id == light {
            state.active = false;
        }
    }
    let local_box = components.local_box();
    assert_eq!(local_box.min, Vec3::splat(-0.5));
    assert_eq!(local_box.max, Vec3::splat(0.5));
}

#[test]
fn test_local_box_empty_without_geometry() {
    let mut components = Components::new();
    components.add_material(Material::default());
    components.add_camera(Camera::default());
    assert!(components.local_box().is_empty());
}

#[test]
fn test_singleton_rules() {
    assert!(ComponentType::Transform.is_singleton());
    assert!(ComponentType::Material.is_singleton());
    assert!(!ComponentType::Mesh.is_singleton());
    assert!(!ComponentType::Camera.is_singleton());
    assert!(!ComponentType::Light.is_singleton());
    assert_eq!(ComponentType::Light.name(), "Light");
}
