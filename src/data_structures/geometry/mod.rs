//! CPU-side geometry: tessellated primitives, flat shapes and extrusions.
//!
//! Every constructor returns a [`Geometry`] holding plain vertex data together
//! with the [`GeometryParameters`] it was built from. The GPU upload lives in
//! [`crate::data_structures::model`], so geometry can be built and inspected
//! without a device.

pub mod extrude;
pub mod primitives;
pub mod shape;

pub use extrude::{ExtrudeOptions, extrude_geometry};
pub use primitives::{
    box_geometry, capsule_geometry, cylinder_geometry, plane_geometry, sphere_geometry,
    torus_geometry,
};
pub use shape::{Shape, shape_geometry};

use crate::data_structures::model::ModelVertex;

/// The parameters a [`Geometry`] was constructed with.
#[derive(Clone, Debug, PartialEq)]
pub enum GeometryParameters {
    Box {
        width: f32,
        height: f32,
        depth: f32,
    },
    Plane {
        width: f32,
        height: f32,
        width_segments: u32,
        height_segments: u32,
    },
    Capsule {
        radius: f32,
        length: f32,
        cap_segments: u32,
        radial_segments: u32,
    },
    Cylinder {
        radius_top: f32,
        radius_bottom: f32,
        height: f32,
        radial_segments: u32,
        height_segments: u32,
        open_ended: bool,
    },
    Torus {
        radius: f32,
        tube: f32,
        radial_segments: u32,
        tubular_segments: u32,
    },
    Sphere {
        radius: f32,
        width_segments: u32,
        height_segments: u32,
    },
    Shape {
        shape: Shape,
    },
    Extrude {
        shape: Shape,
        options: ExtrudeOptions,
    },
}

/// Indexed triangle list with per-vertex normals.
#[derive(Clone, Debug)]
pub struct Geometry {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub indices: Vec<u32>,
    pub parameters: GeometryParameters,
}

impl Geometry {
    pub(crate) fn with_capacity(
        parameters: GeometryParameters,
        vertices: usize,
        indices: usize,
    ) -> Self {
        Self {
            positions: Vec::with_capacity(vertices),
            normals: Vec::with_capacity(vertices),
            indices: Vec::with_capacity(indices),
            parameters,
        }
    }

    pub(crate) fn push_vertex(&mut self, position: [f32; 3], normal: [f32; 3]) -> u32 {
        self.positions.push(position);
        self.normals.push(normal);
        (self.positions.len() - 1) as u32
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Axis-aligned bounds as `(min, max)`.
    pub fn bounds(&self) -> ([f32; 3], [f32; 3]) {
        self.positions.iter().fold(
            ([f32::MAX; 3], [f32::MIN; 3]),
            |(mut min, mut max), p| {
                for axis in 0..3 {
                    min[axis] = min[axis].min(p[axis]);
                    max[axis] = max[axis].max(p[axis]);
                }
                (min, max)
            },
        )
    }

    pub fn to_vertices(&self) -> Vec<ModelVertex> {
        self.positions
            .iter()
            .zip(self.normals.iter())
            .map(|(&position, &normal)| ModelVertex { position, normal })
            .collect()
    }
}
