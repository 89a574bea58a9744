//! Builds the demo scene: one light, seven meshes and a point cloud.
//!
//! Every object is fully built before it is attached. The sphere is built
//! the same way but left out of the scene.

use std::f32::consts::FRAC_PI_2;

use anyhow::Context;
use cgmath::{Point3, Quaternion, Rad, Rotation3};

use crate::data_structures::{
    color::Color,
    geometry::{
        ExtrudeOptions, Shape, box_geometry, capsule_geometry, cylinder_geometry,
        extrude_geometry, plane_geometry, shape_geometry, sphere_geometry, torus_geometry,
    },
    instance::Instance,
    light::DirectionalLight,
    material::Material,
    points::{PointBuffer, StrideLayout, time_seed},
    scene_graph::{LightNode, MeshNode, PointsNode, Scene},
};

/// How the generated parts of the scene are produced.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SceneConfig {
    pub point_count: usize,
    /// Edge length of the cube the points are scattered in.
    pub point_spread: f32,
    /// Seed for the point cloud. `None` seeds from the clock.
    pub seed: Option<u64>,
    pub stride_layout: StrideLayout,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            point_count: 1000,
            point_spread: 1.0,
            seed: None,
            stride_layout: StrideLayout::Independent,
        }
    }
}

pub const POINT_SIZE: f32 = 0.05;

/// The extrusion profile of the "extrude" node.
pub const EXTRUDE_OPTIONS: ExtrudeOptions = ExtrudeOptions {
    steps: 1,
    depth: 0.1,
    bevel_enabled: true,
    bevel_thickness: 0.1,
    bevel_size: 0.3,
    bevel_segments: 100,
};

pub struct AssembledScene {
    pub scene: Scene,
    /// Built but never attached.
    pub detached: MeshNode,
}

/// A ten-point star spanning [-1, 1] on both axes.
pub fn star_shape() -> Shape {
    let mut shape = Shape::new();
    shape
        .move_to(0.0, 1.0)
        .line_to(0.2, 0.2)
        .line_to(1.0, 0.2)
        .line_to(0.4, -0.1)
        .line_to(0.6, -1.0)
        .line_to(0.0, -0.5)
        .line_to(-0.6, -1.0)
        .line_to(-0.4, -0.1)
        .line_to(-1.0, 0.2)
        .line_to(-0.2, 0.2);
    shape
}

pub fn assemble_scene(config: &SceneConfig) -> anyhow::Result<AssembledScene> {
    let mut scene = Scene::new();

    let mut light = DirectionalLight::new(Color::from_hex(0xffffff), 5.0);
    light.position = Point3::new(3.0, 4.0, 5.0);
    light.look_at(Point3::new(0.0, 0.0, 0.0));
    light.cast_shadow = true;
    scene.add(Box::new(LightNode::new("light", light)));

    scene.add(Box::new(
        MeshNode::new(
            "box",
            box_geometry(1.0, 1.0, 1.0),
            Material::standard(Color::from_hex(0xff0000)),
        )
        .with_transform(Instance::at(0.0, 0.5, 0.0))
        .with_shadows(true, true),
    ));

    scene.add(Box::new(
        MeshNode::new(
            "floor",
            plane_geometry(20.0, 20.0),
            Material::standard(Color::from_hex(0xbbbbbb)),
        )
        .with_transform(Instance::new().with_rotation(Quaternion::from_angle_x(Rad(-FRAC_PI_2))))
        .with_shadows(true, true),
    ));

    scene.add(Box::new(
        MeshNode::new(
            "capsule",
            capsule_geometry(1.0, 2.0, 20, 30),
            Material::standard(Color::from_hex(0xffff00)),
        )
        .with_transform(Instance::at(3.0, 1.75, 0.0))
        .with_shadows(true, true),
    ));

    scene.add(Box::new(
        MeshNode::new(
            "cylinder",
            cylinder_geometry(1.0, 1.0, 2.0),
            Material::standard(Color::from_hex(0x00ff00)),
        )
        .with_transform(Instance::at(-3.0, 1.0, 0.0))
        .with_shadows(true, true),
    ));

    scene.add(Box::new(
        MeshNode::new(
            "torus",
            torus_geometry(0.5, 0.1, 16, 100),
            Material::standard(Color::from_hex(0x0000ff)),
        )
        .with_transform(Instance::at(0.0, 0.5, 1.0))
        .with_shadows(true, true),
    ));

    let star = star_shape();
    scene.add(Box::new(
        MeshNode::new(
            "shape",
            shape_geometry(&star).context("Cannot triangulate the star")?,
            Material::standard("#ff00ff".parse()?),
        )
        .with_transform(Instance::at(0.0, 1.0, 2.0)),
    ));

    scene.add(Box::new(
        MeshNode::new(
            "extrude",
            extrude_geometry(&star, EXTRUDE_OPTIONS).context("Cannot extrude the star")?,
            Material::standard("#0ddaaf".parse()?),
        )
        .with_transform(Instance::at(2.0, 1.3, 2.0))
        .with_shadows(true, true),
    ));

    let sphere = MeshNode::new(
        "sphere",
        sphere_geometry(1.0, 32, 32),
        Material::standard("#98daaf".parse()?),
    )
    .with_transform(Instance::at(0.0, 1.0, -3.0))
    .with_shadows(true, true);

    let seed = config.seed.unwrap_or_else(time_seed);
    log::debug!("point cloud seed {}", seed);
    let points = PointBuffer::random(
        config.point_count,
        config.point_spread,
        seed,
        config.stride_layout,
    );
    scene.add(Box::new(
        PointsNode::new(
            "points",
            points,
            Material::points("#ffff00".parse()?, POINT_SIZE),
        )
        .with_transform(Instance::at(0.0, 0.0, -5.0)),
    ));

    log::info!("scene assembled with {} objects", scene.children().len());
    Ok(AssembledScene {
        scene,
        detached: sphere,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn star_is_a_simple_ten_point_outline() {
        let star = star_shape();
        assert_eq!(star.points().len(), 10);
        assert!(star.signed_area().abs() > 0.0);
    }

    #[test]
    fn seeded_scenes_are_reproducible() {
        let config = SceneConfig {
            seed: Some(7),
            ..Default::default()
        };
        let a = assemble_scene(&config).unwrap();
        let b = assemble_scene(&config).unwrap();
        let points = |s: &AssembledScene| s.scene.find("points").and_then(|n| n.point_buffer().cloned());
        assert_eq!(points(&a), points(&b));
    }
}
