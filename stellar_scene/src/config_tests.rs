use glam::Vec3;
use crate::spatial::MAX_OCTREE_DEPTH;
use super::*;

// ============================================================================
// Parsing
// ============================================================================

#[test]
fn test_default_values() {
    let config = SceneConfig::default();
    assert_eq!(config.octree_half_extent, 50.0);
    assert_eq!(config.octree_max_depth, 4);
    assert_eq!(config.octree_center, [0.0; 3]);
    assert_eq!(config.uid_seed, None);
}

#[test]
fn test_from_json_partial_keys() {
    let config = SceneConfig::from_json_str(r#"{ "octree_max_depth": 2, "uid_seed": 7 }"#).unwrap();
    assert_eq!(config.octree_max_depth, 2);
    assert_eq!(config.uid_seed, Some(7));
    assert_eq!(config.octree_half_extent, 50.0);
}

#[test]
fn test_from_json_malformed() {
    let err = SceneConfig::from_json_str("{ octree_max_depth: ").unwrap_err();
    assert!(matches!(err, Error::InvalidConfig(_)));
}

// ============================================================================
// Validation
// ============================================================================

#[test]
fn test_validated_keeps_good_config() {
    let config = SceneConfig::default();
    assert_eq!(config.validated(), config);
}

#[test]
fn test_validated_degrades_bad_extent() {
    for extent in [0.0, -3.0, f32::NAN] {
        let config = SceneConfig { octree_half_extent: extent, ..Default::default() }.validated();
        assert_eq!(config.octree_max_depth, 0);
        assert!(!config.octree_bounds().is_finite());
        assert!(!config.octree_bounds().is_empty());
    }
}

#[test]
fn test_validated_clamps_depth() {
    let config = SceneConfig::from_json_str(r#"{ "octree_max_depth": 22 }"#).unwrap().validated();
    assert_eq!(config.octree_max_depth, MAX_OCTREE_DEPTH);
    assert_eq!(config.octree_half_extent, 50.0);

    let config = SceneConfig { octree_max_depth: MAX_OCTREE_DEPTH, ..Default::default() }.validated();
    assert_eq!(config.octree_max_depth, MAX_OCTREE_DEPTH);
}

#[test]
fn test_octree_bounds() {
    let config = SceneConfig {
        octree_half_extent: 10.0,
        octree_center: [1.0, 2.0, 3.0],
        ..Default::default()
    };
    let bounds = config.octree_bounds();
    assert_eq!(bounds.min, Vec3::new(-9.0, -8.0, -7.0));
    assert_eq!(bounds.max, Vec3::new(11.0, 12.0, 13.0));
}
