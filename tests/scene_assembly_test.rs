use cgmath::{InnerSpace, Point3, Vector3};
use shape_garden::{
    AssembledScene, SceneConfig, assemble_scene,
    assembly::EXTRUDE_OPTIONS,
    data_structures::{
        geometry::{ExtrudeOptions, GeometryParameters, extrude_geometry},
        points::StrideLayout,
        scene_graph::SceneNode,
    },
};

fn seeded(seed: u64) -> AssembledScene {
    assemble_scene(&SceneConfig {
        seed: Some(seed),
        ..Default::default()
    })
    .unwrap()
}

#[test]
fn scene_holds_light_seven_meshes_and_points() {
    let AssembledScene { scene, detached } = seeded(1);
    let names: Vec<&str> = scene.children().iter().map(|node| node.name()).collect();
    assert_eq!(
        names,
        [
            "light", "box", "floor", "capsule", "cylinder", "torus", "shape", "extrude", "points"
        ]
    );
    assert_eq!(scene.children().len(), 9);

    assert_eq!(detached.name(), "sphere");
    assert!(scene.find("sphere").is_none());
    assert!(matches!(
        detached.geometry().map(|g| &g.parameters),
        Some(GeometryParameters::Sphere { radius, width_segments: 32, height_segments: 32 }) if *radius == 1.0
    ));
}

#[test]
fn shadow_flags_follow_the_scene_table() {
    let AssembledScene { scene, .. } = seeded(1);
    for name in ["box", "floor", "capsule", "cylinder", "torus", "extrude"] {
        let node = scene.find(name).unwrap();
        assert!(node.cast_shadow(), "{} should cast", name);
        assert!(node.receive_shadow(), "{} should receive", name);
    }
    for name in ["shape", "points"] {
        let node = scene.find(name).unwrap();
        assert!(!node.cast_shadow() && !node.receive_shadow(), "{}", name);
    }
    assert!(scene.find("light").unwrap().cast_shadow());
}

#[test]
fn light_shines_from_above_towards_the_origin() {
    let AssembledScene { mut scene, .. } = seeded(1);
    scene.update_world_transforms();
    let light = scene.light().unwrap();
    assert_eq!(light.position, Point3::new(3.0, 4.0, 5.0));
    assert_eq!(light.intensity, 5.0);
    assert!(light.cast_shadow);
    let expected = Vector3::new(-3.0, -4.0, -5.0).normalize();
    assert!((light.direction() - expected).magnitude() < 1e-6);
}

#[test]
fn objects_are_placed_where_the_layout_says() {
    let AssembledScene { mut scene, .. } = seeded(1);
    scene.update_world_transforms();
    let position = |name: &str| scene.find(name).unwrap().get_world_transform().position;
    assert_eq!(position("box"), Vector3::new(0.0, 0.5, 0.0));
    assert_eq!(position("capsule"), Vector3::new(3.0, 1.75, 0.0));
    assert_eq!(position("cylinder"), Vector3::new(-3.0, 1.0, 0.0));
    assert_eq!(position("torus"), Vector3::new(0.0, 0.5, 1.0));
    assert_eq!(position("shape"), Vector3::new(0.0, 1.0, 2.0));
    assert_eq!(position("extrude"), Vector3::new(2.0, 1.3, 2.0));
    assert_eq!(position("points"), Vector3::new(0.0, 0.0, -5.0));

    // the floor plane is turned to face +y
    let floor = scene.find("floor").unwrap().get_world_transform().clone();
    let normal = floor.normal_matrix() * Vector3::unit_z();
    assert!((normal - Vector3::unit_y()).magnitude() < 1e-5);
}

#[test]
fn extrude_keeps_its_options() {
    let AssembledScene { scene, .. } = seeded(1);
    let extrude = scene.find("extrude").unwrap();
    match &extrude.geometry().unwrap().parameters {
        GeometryParameters::Extrude { options, shape } => {
            assert_eq!(
                *options,
                ExtrudeOptions {
                    steps: 1,
                    depth: 0.1,
                    bevel_enabled: true,
                    bevel_thickness: 0.1,
                    bevel_size: 0.3,
                    bevel_segments: 100,
                }
            );
            assert_eq!(shape.points().len(), 10);
        }
        other => panic!("unexpected parameters {:?}", other),
    }
}

#[test]
fn unbevelled_extrusion_spans_exactly_its_depth() {
    let star = shape_garden::assembly::star_shape();
    let geometry = extrude_geometry(
        &star,
        ExtrudeOptions {
            bevel_enabled: false,
            ..EXTRUDE_OPTIONS
        },
    )
    .unwrap();
    let (min, max) = geometry.bounds();
    assert_eq!(min[2], 0.0);
    assert!((max[2] - 0.1).abs() < 1e-6);
}

#[test]
fn point_cloud_is_bounded_and_reproducible() {
    let a = seeded(42);
    let b = seeded(42);
    let points = |s: &AssembledScene| s.scene.find("points").unwrap().point_buffer().unwrap().clone();
    let (pa, pb) = (points(&a), points(&b));
    assert_eq!(pa, pb);
    assert_eq!(pa.as_slice().len(), 1000 * 3);
    assert!(pa.as_slice().iter().all(|c| (-0.5..=0.5).contains(c)));
    // independent draws almost never put a point on the y == z plane
    assert!(pa.iter().any(|[_, y, z]| y != z));

    let c = points(&seeded(43));
    assert_ne!(pa, c);
}

#[test]
fn mirrored_layout_repeats_the_third_draw() {
    let scene = assemble_scene(&SceneConfig {
        seed: Some(42),
        stride_layout: StrideLayout::MirroredYz,
        point_count: 64,
        ..Default::default()
    })
    .unwrap()
    .scene;
    let cloud = scene.find("points").unwrap().point_buffer().unwrap();
    assert_eq!(cloud.len(), 64);
    assert!(cloud.iter().all(|[_, y, z]| y == z));
}
