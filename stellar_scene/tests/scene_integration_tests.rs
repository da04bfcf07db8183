//! Integration tests for the scene graph, partitions, picking and persistence
//!
//! These tests drive a `SceneManager` through the public API only, frame by
//! frame, the way an application loop would.
//!
//! Run with: cargo test --test scene_integration_tests

use stellar_scene::glam::{Mat4, Quat, Vec3};
use stellar_scene::stellar::SceneConfig;
use stellar_scene::stellar::math::{LineSegment, Ray};
use stellar_scene::stellar::resource::{PRIMITIVE_CUBE, PRIMITIVE_SPHERE};
use stellar_scene::stellar::scene::{
    ComponentType, MemoryStore, Mesh, NodeKey, SceneManager,
};

const DT: f32 = 1.0 / 60.0;

fn new_scene(seed: u64) -> SceneManager {
    SceneManager::new(SceneConfig { uid_seed: Some(seed), ..SceneConfig::default() })
}

fn spawn(scene: &mut SceneManager, parent: Option<NodeKey>, name: &str, primitive: Option<u64>, at: Vec3) -> NodeKey {
    let key = match parent {
        Some(parent) => scene.create_child(parent, name).unwrap(),
        None => scene.create_node(name),
    };
    let resource = primitive.and_then(|uid| scene.resources().mesh(uid));
    let node = scene.node_mut(key).unwrap();
    if let Some(resource) = resource {
        node.add_mesh(Mesh::new(resource));
    }
    node.transform_mut().set_translation(at);
    key
}

/// Names of a subtree, depth-first, with their depth below `key`
fn outline(scene: &SceneManager, key: NodeKey) -> Vec<(usize, String)> {
    fn walk(scene: &SceneManager, key: NodeKey, depth: usize, out: &mut Vec<(usize, String)>) {
        let node = scene.node(key).unwrap();
        out.push((depth, node.name().to_string()));
        for &child in node.children() {
            walk(scene, child, depth + 1, out);
        }
    }
    let mut out = Vec::new();
    walk(scene, key, 0, &mut out);
    out
}

// ============================================================================
// PICKING
// ============================================================================

#[test]
fn test_integration_three_cubes_and_a_sphere() {
    let mut scene = new_scene(1);
    let left = spawn(&mut scene, None, "left", Some(PRIMITIVE_CUBE), Vec3::new(-5.0, 0.0, 0.0));
    let middle = spawn(&mut scene, None, "middle", Some(PRIMITIVE_CUBE), Vec3::ZERO);
    let right = spawn(&mut scene, None, "right", Some(PRIMITIVE_CUBE), Vec3::new(5.0, 0.0, 0.0));
    spawn(&mut scene, None, "sphere", Some(PRIMITIVE_SPHERE), Vec3::new(5.0, 3.0, 0.0));

    // Boxes exist after the first frame; only then do the cubes become static
    scene.frame(DT);
    for key in [left, middle, right] {
        scene.set_static(key, true);
    }
    scene.frame(DT);

    let ray = Ray::new(Vec3::new(-100.0, 0.0, 0.0), Vec3::X);
    let hit = scene.cast_ray(&ray).expect("the ray should hit the left cube");
    assert_eq!(hit.node, left);
    assert!((hit.distance - 94.5).abs() < 1e-3, "distance = {}", hit.distance);

    // Same query, same answer
    assert_eq!(scene.cast_ray(&ray), Some(hit));
}

#[test]
fn test_integration_segment_stops_short() {
    let mut scene = new_scene(2);
    spawn(&mut scene, None, "cube", Some(PRIMITIVE_CUBE), Vec3::new(0.0, 0.0, -10.0));
    scene.frame(DT);

    let short = LineSegment::new(Vec3::new(0.1, 0.2, 0.0), Vec3::new(0.1, 0.2, -9.0));
    assert!(scene.cast_segment(&short).is_none());

    let long = LineSegment::new(Vec3::new(0.1, 0.2, 0.0), Vec3::new(0.1, 0.2, -20.0));
    let hit = scene.cast_segment(&long).unwrap();
    assert!((hit.distance - 9.5).abs() < 1e-4);
}

#[test]
fn test_integration_picking_follows_moving_node() {
    let mut scene = new_scene(3);
    let mover = spawn(&mut scene, None, "mover", Some(PRIMITIVE_CUBE), Vec3::new(10.0, 0.0, 0.0));
    scene.frame(DT);
    scene.set_static(mover, true);

    let ray = Ray::new(Vec3::new(0.0, 0.1, 0.2), Vec3::X);
    assert!((scene.cast_ray(&ray).unwrap().distance - 9.5).abs() < 1e-4);

    // Moving a static node demotes it; picking still finds it at its new place
    scene.node_mut(mover).unwrap().transform_mut().set_translation(Vec3::new(20.0, 0.0, 0.0));
    scene.frame(DT);
    assert!(!scene.node(mover).unwrap().is_static());
    assert!((scene.cast_ray(&ray).unwrap().distance - 19.5).abs() < 1e-4);
}

// ============================================================================
// PARTITIONS
// ============================================================================

#[test]
fn test_integration_static_parent_with_ten_children() {
    let mut scene = new_scene(4);
    let parent = spawn(&mut scene, None, "parent", None, Vec3::ZERO);
    let children: Vec<NodeKey> = (0..10)
        .map(|i| spawn(&mut scene, Some(parent), &format!("child{i}"), Some(PRIMITIVE_CUBE), Vec3::new(i as f32, 0.0, 0.0)))
        .collect();
    let bystander = spawn(&mut scene, None, "bystander", None, Vec3::ZERO);
    scene.frame(DT);

    scene.set_static(parent, true);

    let dynamic = scene.dynamic_objects();
    assert!(!dynamic.contains(&parent));
    assert!(children.iter().all(|c| !dynamic.contains(c)));
    assert_eq!(dynamic, &[bystander]);

    let stats = scene.stats();
    assert_eq!(stats.static_nodes, 11);
    assert_eq!(stats.dynamic_nodes, 1);
    assert_eq!(stats.nodes, 12);

    // Static nodes stay put across frames
    scene.frame(DT);
    scene.frame(DT);
    assert_eq!(scene.stats().static_nodes, 11);
}

#[test]
fn test_integration_destroy_static_subtree() {
    let mut scene = new_scene(5);
    let parent = spawn(&mut scene, None, "parent", Some(PRIMITIVE_CUBE), Vec3::ZERO);
    for i in 0..4 {
        spawn(&mut scene, Some(parent), &format!("child{i}"), Some(PRIMITIVE_CUBE), Vec3::new(0.0, i as f32, 0.0));
    }
    scene.frame(DT);
    scene.set_static(parent, true);

    scene.destroy(parent);
    assert_eq!(scene.stats().static_nodes, 0);
    assert_eq!(scene.stats().pending_destruction, 5);
    assert!(scene.cast_ray(&Ray::new(Vec3::new(-10.0, 0.1, 0.2), Vec3::X)).is_none());

    scene.frame(DT);
    assert_eq!(scene.stats().pending_destruction, 0);
    assert_eq!(scene.stats().nodes, 0);
}

// ============================================================================
// HIERARCHY
// ============================================================================

#[test]
fn test_integration_reparent_keeps_world_pose() {
    let mut scene = new_scene(6);
    let arm = spawn(&mut scene, None, "arm", None, Vec3::new(2.0, 0.0, 0.0));
    let hand = spawn(&mut scene, Some(arm), "hand", Some(PRIMITIVE_CUBE), Vec3::new(0.0, 1.0, 0.0));
    let table = spawn(&mut scene, None, "table", None, Vec3::new(-3.0, 0.5, 4.0));
    scene.node_mut(table).unwrap().transform_mut().set_rotation(Quat::from_rotation_y(1.1));
    scene.frame(DT);
    let world = *scene.node(hand).unwrap().transform().global_transform();

    scene.set_new_parent(hand, table, true);
    scene.frame(DT);

    let after = *scene.node(hand).unwrap().transform().global_transform();
    assert!(after.abs_diff_eq(world, 1e-4));
    assert!(scene.node(arm).unwrap().children().is_empty());
    assert_eq!(scene.node(table).unwrap().children(), &[hand]);

    // Moving the new parent now carries the hand along
    scene.node_mut(table).unwrap().transform_mut().set_translation(Vec3::new(-3.0, 10.5, 4.0));
    scene.frame(DT);
    let lifted = *scene.node(hand).unwrap().transform().global_transform();
    let delta = lifted.w_axis.truncate() - world.w_axis.truncate();
    assert!(delta.abs_diff_eq(Vec3::new(0.0, 10.0, 0.0), 1e-4));
    assert_ne!(lifted, Mat4::IDENTITY);
}

// ============================================================================
// PERSISTENCE
// ============================================================================

#[test]
fn test_integration_save_and_load_five_nodes() {
    let mut source = new_scene(7);
    let house = spawn(&mut source, None, "house", Some(PRIMITIVE_CUBE), Vec3::new(0.0, 0.0, -5.0));
    let door = spawn(&mut source, Some(house), "door", Some(PRIMITIVE_CUBE), Vec3::new(0.0, 0.0, 0.6));
    spawn(&mut source, Some(door), "handle", None, Vec3::new(0.3, 0.0, 0.05));
    spawn(&mut source, Some(house), "roof", Some(PRIMITIVE_CUBE), Vec3::new(0.0, 1.0, 0.0));
    spawn(&mut source, None, "tree", Some(PRIMITIVE_SPHERE), Vec3::new(4.0, 0.0, -5.0));
    source.frame(DT);
    source.set_static(house, true);

    source.set_scene_store(Box::new(MemoryStore::new()));
    source.request_save();
    source.frame(DT);

    // A scene with a different UID sequence loads the same graph
    let mut target = new_scene(8);
    target.set_scene_store(source.take_scene_store().unwrap());
    target.request_load();
    target.frame(DT);

    assert_eq!(target.stats().nodes, 5);
    assert_eq!(outline(&target, target.root()), outline(&source, source.root()));
    assert_eq!(target.stats().static_nodes, 4);

    let hit = target.cast_ray(&Ray::new(Vec3::new(0.1, 0.2, 10.0), Vec3::NEG_Z)).unwrap();
    assert_eq!(target.node(hit.node).unwrap().name(), "door");
    assert!((hit.distance - 13.9).abs() < 1e-3, "distance = {}", hit.distance);
}

#[test]
fn test_integration_duplicate_then_save() {
    let mut scene = new_scene(9);
    let car = spawn(&mut scene, None, "car", Some(PRIMITIVE_CUBE), Vec3::ZERO);
    for wheel in ["fl", "fr", "rl", "rr"] {
        spawn(&mut scene, Some(car), wheel, Some(PRIMITIVE_SPHERE), Vec3::ZERO);
    }
    scene.frame(DT);

    let copy = scene.duplicate(car).unwrap();
    scene.frame(DT);
    assert_eq!(outline(&scene, copy), outline(&scene, car));
    assert_eq!(scene.stats().nodes, 10);

    scene.set_scene_store(Box::new(MemoryStore::new()));
    scene.save_scene().unwrap();
    scene.load_scene().unwrap();
    scene.frame(DT);

    assert_eq!(scene.stats().nodes, 10);
    let root = scene.node(scene.root()).unwrap();
    assert_eq!(root.children().len(), 2);
    for &top in root.children() {
        let node = scene.node(top).unwrap();
        assert_eq!(node.name(), "car");
        assert_eq!(node.children().len(), 4);
        assert!(node.has_component(ComponentType::Mesh));
    }
}
