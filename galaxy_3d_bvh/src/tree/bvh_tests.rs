use glam::{DMat4, DVec3, DVec4};
use crate::error::Error;
use crate::math::{Frustum, Ray};
use super::*;
use crate::tree::test_support::{random_box, random_vec3, seeded};

// ============================================================================
// TEST HELPERS
// ============================================================================

fn cube_at(x: f64, y: f64, z: f64) -> Aabb {
    Aabb::new(DVec3::new(x, y, z), DVec3::new(x + 1.0, y + 1.0, z + 1.0))
}

fn box_frustum(min: DVec3, max: DVec3) -> Frustum {
    Frustum::from_planes([
        DVec4::new(1.0, 0.0, 0.0, -min.x),
        DVec4::new(-1.0, 0.0, 0.0, max.x),
        DVec4::new(0.0, 1.0, 0.0, -min.y),
        DVec4::new(0.0, -1.0, 0.0, max.y),
        DVec4::new(0.0, 0.0, 1.0, -min.z),
        DVec4::new(0.0, 0.0, -1.0, max.z),
    ])
}

/// Tree of `count` random boxes whose payload is the insertion index
fn random_tree(seed: u64, count: u32, margin: f64) -> (Bvh<u32>, Vec<Aabb>) {
    let mut rng = seeded(seed);
    let mut bvh = Bvh::with_config(BvhConfig::default().with_margin(margin)).unwrap();
    let mut boxes = Vec::new();
    for i in 0..count {
        let aabb = random_box(&mut rng);
        bvh.insert(i, aabb).unwrap();
        boxes.push(aabb);
    }
    (bvh, boxes)
}

fn sorted(mut values: Vec<u32>) -> Vec<u32> {
    values.sort_unstable();
    values
}

// ============================================================================
// Construction
// ============================================================================

#[test]
fn test_new_is_empty() {
    let bvh: Bvh<u32> = Bvh::new();
    assert!(bvh.is_empty());
    assert_eq!(bvh.len(), 0);
    assert_eq!(bvh.root(), None);
    assert_eq!(*bvh.config(), BvhConfig::default());
    bvh.validate().unwrap();
}

#[test]
fn test_with_config_rejects_negative_margin() {
    let result = Bvh::<u32>::with_config(BvhConfig::default().with_margin(-1.0));
    assert!(matches!(result, Err(Error::InvalidConfig(_))));
}

#[test]
fn test_with_config_rejects_nan_tolerance() {
    let result = Bvh::<u32>::with_config(BvhConfig::default().with_rotation_tolerance(f64::NAN));
    assert!(matches!(result, Err(Error::InvalidConfig(_))));
}

#[test]
fn test_with_config_keeps_values() {
    let config = BvhConfig::default().with_margin(0.5).with_rotation_tolerance(2.0);
    let bvh = Bvh::<u32>::with_config(config).unwrap();
    assert_eq!(*bvh.config(), config);
}

#[test]
fn test_bvh_is_send_and_sync() {
    fn assert_send_sync<S: Send + Sync>() {}
    assert_send_sync::<Bvh<u32>>();
}

// ============================================================================
// Accessors and mutation
// ============================================================================

#[test]
fn test_payload_and_leaf_box() {
    let mut bvh = Bvh::new();
    let a = bvh.insert("a", cube_at(0.0, 0.0, 0.0)).unwrap();
    bvh.insert("b", cube_at(4.0, 0.0, 0.0)).unwrap();
    let root = bvh.root().unwrap();

    assert_eq!(bvh.payload(a), Some(&"a"));
    assert_eq!(bvh.leaf_box(a), Some(&cube_at(0.0, 0.0, 0.0)));
    assert_eq!(bvh.payload(root), None);
    assert_eq!(bvh.leaf_box(root), None);
}

#[test]
fn test_update_relocates_leaf() {
    let mut bvh = Bvh::new();
    let a = bvh.insert(1u32, cube_at(0.0, 0.0, 0.0)).unwrap();
    bvh.insert(2, cube_at(1.0, 0.0, 0.0)).unwrap();
    bvh.insert(3, cube_at(30.0, 0.0, 0.0)).unwrap();

    bvh.update(a, cube_at(31.0, 0.0, 0.0)).unwrap();

    assert_eq!(bvh.leaf_box(a), Some(&cube_at(31.0, 0.0, 0.0)));
    bvh.validate_tight().unwrap();

    let hits = bvh.intersect_ray_with(DVec3::new(31.5, 0.5, -10.0), DVec3::Z, 0.0, f64::INFINITY);
    assert_eq!(hits, vec![1]);
}

#[test]
fn test_update_with_stale_handle_fails() {
    let mut bvh = Bvh::new();
    let a = bvh.insert(1u32, cube_at(0.0, 0.0, 0.0)).unwrap();
    bvh.delete(a).unwrap();

    assert!(matches!(bvh.update(a, cube_at(1.0, 0.0, 0.0)), Err(Error::InvalidHandle(_))));
}

#[test]
fn test_clear_empties_tree() {
    let (mut bvh, _) = random_tree(3, 20, 0.0);
    bvh.clear();

    assert!(bvh.is_empty());
    assert_eq!(bvh.len(), 0);
    bvh.validate().unwrap();
}

#[test]
fn test_random_tree_with_margin_is_tight() {
    let (mut bvh, _) = random_tree(17, 120, 0.25);
    bvh.validate_tight().unwrap();

    let root = bvh.root().unwrap();
    let (left, _) = bvh.node(root).unwrap().children().unwrap();
    let mut leaf = left;
    while let Some((child, _)) = bvh.node(leaf).unwrap().children() {
        leaf = child;
    }
    bvh.delete(leaf).unwrap();
    bvh.validate_tight().unwrap();
}

// ============================================================================
// traverse
// ============================================================================

#[test]
fn test_traverse_empty_tree_visits_nothing() {
    let bvh: Bvh<u32> = Bvh::new();
    let mut visits = 0;
    bvh.traverse(|_, _, _| {
        visits += 1;
        false
    });
    assert_eq!(visits, 0);
}

#[test]
fn test_traverse_is_preorder_left_first() {
    let mut bvh = Bvh::new();
    let a = bvh.insert(1u32, Aabb::from_array([0.0, 1.0, 0.0, 1.0, 0.0, 1.0])).unwrap();
    let b = bvh.insert(2, Aabb::from_array([5.0, 6.0, 0.0, 1.0, 0.0, 1.0])).unwrap();
    let c = bvh.insert(3, Aabb::from_array([0.0, 1.0, 5.0, 6.0, 0.0, 1.0])).unwrap();
    let root = bvh.root().unwrap();
    let (inner, _) = bvh.node(root).unwrap().children().unwrap();

    let mut visited = Vec::new();
    bvh.traverse(|key, _, depth| {
        visited.push((key, depth));
        false
    });

    assert_eq!(visited, vec![(root, 0), (inner, 1), (a, 2), (b, 2), (c, 1)]);
}

#[test]
fn test_traverse_stop_skips_children() {
    let (bvh, _) = random_tree(11, 30, 0.0);

    let mut visits = 0;
    bvh.traverse(|_, _, _| {
        visits += 1;
        true
    });
    assert_eq!(visits, 1);
}

#[test]
fn test_traverse_visits_every_node_once() {
    let (bvh, _) = random_tree(12, 40, 0.25);

    let mut nodes = 0;
    let mut leaves = 0;
    bvh.traverse(|_, node, _| {
        nodes += 1;
        if node.is_leaf() {
            leaves += 1;
        }
        false
    });

    assert_eq!(leaves, 40);
    assert_eq!(nodes, 79);
}

// ============================================================================
// Ray traversal
// ============================================================================

#[test]
fn test_ray_on_empty_tree_returns_nothing() {
    let bvh: Bvh<u32> = Bvh::new();
    let hits = bvh.intersect_ray_with(DVec3::ZERO, DVec3::X, 0.0, f64::INFINITY);
    assert!(hits.is_empty());
}

#[test]
fn test_ray_hits_boxes_along_its_path() {
    let mut bvh = Bvh::new();
    bvh.insert(1u32, cube_at(0.0, 0.0, 0.0)).unwrap();
    bvh.insert(2, cube_at(5.0, 0.0, 0.0)).unwrap();
    bvh.insert(3, cube_at(0.0, 5.0, 0.0)).unwrap();

    let hits = bvh.intersect_ray_with(DVec3::new(-10.0, 0.5, 0.5), DVec3::X, 0.0, f64::INFINITY);
    assert_eq!(sorted(hits), vec![1, 2]);
}

#[test]
fn test_ray_interval_limits_hits() {
    let mut bvh = Bvh::new();
    bvh.insert(1u32, cube_at(0.0, 0.0, 0.0)).unwrap();
    bvh.insert(2, cube_at(5.0, 0.0, 0.0)).unwrap();

    let hits = bvh.intersect_ray_with(DVec3::new(-10.0, 0.5, 0.5), DVec3::X, 0.0, 12.0);
    assert_eq!(hits, vec![1]);

    let hits = bvh.intersect_ray_with(DVec3::new(-10.0, 0.5, 0.5), DVec3::X, 13.0, 20.0);
    assert_eq!(hits, vec![2]);
}

#[test]
fn test_ray_appends_to_existing_results() {
    let mut bvh = Bvh::new();
    bvh.insert(1u32, cube_at(0.0, 0.0, 0.0)).unwrap();

    let mut results = vec![99];
    let ray = Ray::from_origin_direction(DVec3::new(0.5, 0.5, -5.0), DVec3::Z);
    bvh.intersect_ray(&ray, &mut results);

    assert_eq!(results, vec![99, 1]);
}

#[test]
fn test_ray_matches_brute_force() {
    let (bvh, boxes) = random_tree(42, 300, 0.0);
    let mut rng = seeded(4242);

    for _ in 0..100 {
        let origin = random_vec3(&mut rng, -60.0, 60.0);
        let direction = random_vec3(&mut rng, -1.0, 1.0);
        let ray = Ray::new(origin, direction, 0.0, f64::INFINITY);

        let mut hits = Vec::new();
        bvh.intersect_ray(&ray, &mut hits);

        let expected: Vec<u32> = boxes.iter().enumerate()
            .filter(|(_, aabb)| ray.intersects_aabb(aabb))
            .map(|(i, _)| i as u32)
            .collect();

        assert_eq!(sorted(hits), expected);
    }
}

#[test]
fn test_axis_aligned_rays_match_brute_force() {
    let (bvh, boxes) = random_tree(8, 200, 0.5);
    let mut rng = seeded(88);

    for axis in [DVec3::X, DVec3::Y, DVec3::Z, -DVec3::X, -DVec3::Y, -DVec3::Z] {
        for _ in 0..20 {
            let origin = random_vec3(&mut rng, -60.0, 60.0);
            let ray = Ray::from_origin_direction(origin, axis);

            let mut hits = Vec::new();
            bvh.intersect_ray(&ray, &mut hits);

            let expected: Vec<u32> = boxes.iter().enumerate()
                .filter(|(_, aabb)| ray.intersects_aabb(aabb))
                .map(|(i, _)| i as u32)
                .collect();

            assert_eq!(sorted(hits), expected);
        }
    }
}

// ============================================================================
// Frustum traversal
// ============================================================================

#[test]
fn test_visibility_on_empty_tree_returns_nothing() {
    let bvh: Bvh<u32> = Bvh::new();
    let mut visible = Vec::new();
    bvh.visibility_query(&box_frustum(DVec3::splat(-1.0), DVec3::splat(1.0)), &mut visible);
    assert!(visible.is_empty());
}

#[test]
fn test_visibility_frustum_enclosing_everything() {
    let (bvh, _) = random_tree(5, 100, 0.0);

    let mut visible = Vec::new();
    bvh.visibility_query(&box_frustum(DVec3::splat(-1000.0), DVec3::splat(1000.0)), &mut visible);

    assert_eq!(sorted(visible), (0..100).collect::<Vec<u32>>());
}

#[test]
fn test_visibility_frustum_missing_everything() {
    let (bvh, _) = random_tree(6, 100, 0.0);

    let mut visible = Vec::new();
    bvh.visibility_query(&box_frustum(DVec3::splat(500.0), DVec3::splat(600.0)), &mut visible);

    assert!(visible.is_empty());
}

#[test]
fn test_visibility_selects_boxes_in_region() {
    let mut bvh = Bvh::new();
    bvh.insert(1u32, cube_at(0.0, 0.0, 0.0)).unwrap();
    bvh.insert(2, cube_at(10.0, 0.0, 0.0)).unwrap();
    bvh.insert(3, cube_at(20.0, 0.0, 0.0)).unwrap();
    bvh.insert(4, cube_at(10.0, 10.0, 0.0)).unwrap();

    let mut visible = Vec::new();
    let frustum = box_frustum(DVec3::new(5.0, -1.0, -1.0), DVec3::new(25.0, 2.0, 2.0));
    bvh.visibility_query(&frustum, &mut visible);

    assert_eq!(sorted(visible), vec![2, 3]);
}

#[test]
fn test_visibility_box_frustum_matches_brute_force() {
    let (bvh, boxes) = random_tree(21, 300, 0.0);
    let mut rng = seeded(2121);

    for _ in 0..50 {
        let min = random_vec3(&mut rng, -50.0, 50.0);
        let frustum = box_frustum(min, min + random_vec3(&mut rng, 0.0, 40.0));

        let mut visible = Vec::new();
        bvh.visibility_query(&frustum, &mut visible);

        let expected: Vec<u32> = boxes.iter().enumerate()
            .filter(|(_, aabb)| frustum.intersects_aabb(aabb))
            .map(|(i, _)| i as u32)
            .collect();

        assert_eq!(sorted(visible), expected);
    }
}

#[test]
fn test_visibility_perspective_matches_brute_force() {
    let (bvh, boxes) = random_tree(34, 300, 0.5);
    let projection = DMat4::perspective_rh(std::f64::consts::FRAC_PI_3, 1.5, 0.1, 80.0);

    let cameras = [
        (DVec3::new(0.0, 0.0, 60.0), DVec3::ZERO),
        (DVec3::new(-70.0, 10.0, 0.0), DVec3::new(0.0, 0.0, 5.0)),
        (DVec3::new(10.0, 10.0, 10.0), DVec3::new(-20.0, -5.0, 0.0)),
    ];

    for (eye, target) in cameras {
        let view = DMat4::look_at_rh(eye, target, DVec3::Y);
        let frustum = Frustum::from_view_projection(&(projection * view));

        let mut visible = Vec::new();
        bvh.visibility_query(&frustum, &mut visible);

        let expected: Vec<u32> = boxes.iter().enumerate()
            .filter(|(_, aabb)| frustum.intersects_aabb(aabb))
            .map(|(i, _)| i as u32)
            .collect();

        assert_eq!(sorted(visible), expected);
    }
}
