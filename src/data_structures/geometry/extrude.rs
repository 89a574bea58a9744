//! Extrusion of a [`Shape`] along +z with an optional rounded bevel.
//!
//! The solid is built from layers of the outline. The front bevel runs from
//! `z = -bevel_thickness` up to `z = 0`, the straight part spans
//! `0..=depth` in `steps` slices, and the back bevel mirrors the front one
//! behind `depth`. Each bevel layer insets or outsets the outline along its
//! miter vectors by `bevel_size * sin(t * pi / 2)`. The two caps are the
//! triangulated outline itself, placed on the outermost layers.

use std::f32::consts::FRAC_PI_2;

use cgmath::{InnerSpace, Vector2, Vector3};

use super::{Geometry, GeometryParameters, shape::Shape};

/// Miter vectors longer than this are shortened so sharp corners don't spike.
const MAX_MITER: f32 = std::f32::consts::SQRT_2;

/// Tessellation and bevel profile of an extruded solid.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ExtrudeOptions {
    pub steps: u32,
    pub depth: f32,
    pub bevel_enabled: bool,
    pub bevel_thickness: f32,
    pub bevel_size: f32,
    pub bevel_segments: u32,
}

impl Default for ExtrudeOptions {
    fn default() -> Self {
        Self {
            steps: 1,
            depth: 1.0,
            bevel_enabled: true,
            bevel_thickness: 0.2,
            bevel_size: 0.1,
            bevel_segments: 3,
        }
    }
}

/// One copy of the outline: how far it is pushed along the miters and where it sits on z.
#[derive(Clone, Copy, Debug)]
struct Layer {
    offset: f32,
    z: f32,
}

impl ExtrudeOptions {
    fn layers(&self) -> Vec<Layer> {
        let steps = self.steps.max(1);
        let (segments, thickness, size) = if self.bevel_enabled {
            (
                self.bevel_segments.max(1),
                self.bevel_thickness,
                self.bevel_size,
            )
        } else {
            (0, 0.0, 0.0)
        };
        let bevel = |b: u32| {
            let t = b as f32 / segments as f32;
            (thickness * (t * FRAC_PI_2).cos(), size * (t * FRAC_PI_2).sin())
        };

        let mut layers = Vec::with_capacity((steps + 1 + 2 * segments) as usize);
        for b in 0..segments {
            let (z, offset) = bevel(b);
            layers.push(Layer { offset, z: -z });
        }
        for s in 0..=steps {
            layers.push(Layer {
                offset: size,
                z: self.depth / steps as f32 * s as f32,
            });
        }
        for b in (0..segments).rev() {
            let (z, offset) = bevel(b);
            layers.push(Layer {
                offset,
                z: self.depth + z,
            });
        }
        layers
    }
}

/// Extrudes `shape` into a closed solid.
pub fn extrude_geometry(shape: &Shape, options: ExtrudeOptions) -> anyhow::Result<Geometry> {
    let (cap_vertices, cap_indices) = shape.triangulate()?;
    let contour = shape.outline();
    let miters: Vec<Vector2<f32>> = (0..contour.len())
        .map(|i| {
            let prev = contour[(i + contour.len() - 1) % contour.len()];
            let next = contour[(i + 1) % contour.len()];
            miter(prev, contour[i], next)
        })
        .collect();
    let layers = options.layers();
    let sides = (layers.len() - 1) * contour.len();

    let mut geometry = Geometry::with_capacity(
        GeometryParameters::Extrude {
            shape: shape.clone(),
            options,
        },
        2 * cap_vertices.len() + sides * 4,
        2 * cap_indices.len() + sides * 6,
    );

    // both caps sit on layers with zero offset, so they are the plain outline
    let front = layers[0].z;
    let back = layers[layers.len() - 1].z;
    let base = geometry.vertex_count() as u32;
    for v in &cap_vertices {
        geometry.push_vertex([v[0], v[1], front], [0.0, 0.0, -1.0]);
    }
    for tri in cap_indices.chunks(3) {
        geometry
            .indices
            .extend_from_slice(&[base + tri[0], base + tri[2], base + tri[1]]);
    }
    let base = geometry.vertex_count() as u32;
    for v in &cap_vertices {
        geometry.push_vertex([v[0], v[1], back], [0.0, 0.0, 1.0]);
    }
    geometry
        .indices
        .extend(cap_indices.iter().map(|i| base + i));

    let at = |layer: &Layer, i: usize| {
        let p = contour[i] + miters[i] * layer.offset;
        Vector3::new(p.x, p.y, layer.z)
    };
    for pair in layers.windows(2) {
        let (near, far) = (&pair[0], &pair[1]);
        for i in 0..contour.len() {
            let j = (i + 1) % contour.len();
            let quad = [at(near, i), at(near, j), at(far, j), at(far, i)];
            let edge = contour[j] - contour[i];
            let fallback = Vector3::new(edge.y, -edge.x, 0.0);
            let face = (quad[1] - quad[0]).cross(quad[2] - quad[0])
                + (quad[2] - quad[0]).cross(quad[3] - quad[0]);
            let normal = if face.magnitude2() > 1e-12 {
                face.normalize()
            } else if fallback.magnitude2() > 1e-12 {
                fallback.normalize()
            } else {
                Vector3::unit_z()
            };
            let base = geometry.vertex_count() as u32;
            for corner in quad {
                geometry.push_vertex(corner.into(), normal.into());
            }
            geometry
                .indices
                .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        }
    }

    Ok(geometry)
}

/// The outward offset direction at `pt` of a counter-clockwise outline,
/// scaled so that both adjacent edges move by one unit.
fn miter(prev: Vector2<f32>, pt: Vector2<f32>, next: Vector2<f32>) -> Vector2<f32> {
    let outward = |d: Vector2<f32>| {
        let n = Vector2::new(d.y, -d.x);
        if n.magnitude2() > 0.0 { n.normalize() } else { n }
    };
    let n1 = outward(pt - prev);
    let n2 = outward(next - pt);
    let denom = 1.0 + n1.dot(n2);
    if denom < 1e-6 {
        // the outline folds back on itself
        return n1;
    }
    let v = (n1 + n2) / denom;
    if v.magnitude() > MAX_MITER {
        v.normalize() * MAX_MITER
    } else {
        v
    }
}
