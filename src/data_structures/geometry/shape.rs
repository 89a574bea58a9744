//! 2D outlines and their flat, triangulated faces.

use anyhow::{Context, bail};
use cgmath::Vector2;
use lyon_path::{Path, math::point};
use lyon_tessellation::{BuffersBuilder, FillOptions, FillTessellator, FillVertex, VertexBuffers};

use super::{Geometry, GeometryParameters};

const EPSILON: f32 = 1e-6;

/// A closed 2D outline built from straight segments.
///
/// The outline is implicitly closed: the last point connects back to the
/// first one. A repeated closing point is tolerated and dropped.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Shape {
    points: Vec<[f32; 2]>,
}

impl Shape {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts the outline. Any points added before are discarded.
    pub fn move_to(&mut self, x: f32, y: f32) -> &mut Self {
        self.points.clear();
        self.points.push([x, y]);
        self
    }

    pub fn line_to(&mut self, x: f32, y: f32) -> &mut Self {
        self.points.push([x, y]);
        self
    }

    pub fn points(&self) -> &[[f32; 2]] {
        &self.points
    }

    /// Signed area by the shoelace formula, positive for counter-clockwise outlines.
    pub fn signed_area(&self) -> f32 {
        let ring = self.ring();
        signed_area(&ring)
    }

    /// The outline without duplicates, wound counter-clockwise.
    pub fn outline(&self) -> Vec<Vector2<f32>> {
        let mut ring = self.ring();
        if signed_area(&ring) < 0.0 {
            ring.reverse();
        }
        ring
    }

    fn ring(&self) -> Vec<Vector2<f32>> {
        let mut ring: Vec<Vector2<f32>> = Vec::with_capacity(self.points.len());
        for p in &self.points {
            let p = Vector2::new(p[0], p[1]);
            if ring.last().is_none_or(|last| !close(*last, p)) {
                ring.push(p);
            }
        }
        if ring.len() > 1 && close(ring[0], ring[ring.len() - 1]) {
            ring.pop();
        }
        ring
    }

    /// Triangulates the face. Triangles are counter-clockwise in the xy plane.
    pub fn triangulate(&self) -> anyhow::Result<(Vec<[f32; 2]>, Vec<u32>)> {
        let ring = self.outline();
        if ring.len() < 3 {
            bail!(
                "a shape needs at least three distinct points, got {}",
                ring.len()
            );
        }

        let mut builder = Path::builder();
        builder.begin(point(ring[0].x, ring[0].y));
        for p in ring.iter().skip(1) {
            builder.line_to(point(p.x, p.y));
        }
        builder.close();
        let path = builder.build();

        let mut buffers: VertexBuffers<[f32; 2], u32> = VertexBuffers::new();
        FillTessellator::new()
            .tessellate_path(
                &path,
                &FillOptions::default(),
                &mut BuffersBuilder::new(&mut buffers, |vertex: FillVertex| {
                    let p = vertex.position();
                    [p.x, p.y]
                }),
            )
            .context("shape outline could not be triangulated")?;

        let VertexBuffers {
            vertices,
            mut indices,
        } = buffers;
        for tri in indices.chunks_mut(3) {
            let [a, b, c] = [tri[0], tri[1], tri[2]].map(|i| {
                let v = vertices[i as usize];
                Vector2::new(v[0], v[1])
            });
            if cross(b - a, c - a) < 0.0 {
                tri.swap(1, 2);
            }
        }
        if indices.is_empty() {
            bail!("shape outline has no area");
        }
        Ok((vertices, indices))
    }
}

pub(crate) fn signed_area(ring: &[Vector2<f32>]) -> f32 {
    let n = ring.len();
    (0..n)
        .map(|i| {
            let a = ring[i];
            let b = ring[(i + 1) % n];
            a.x * b.y - b.x * a.y
        })
        .sum::<f32>()
        / 2.0
}

pub(crate) fn cross(a: Vector2<f32>, b: Vector2<f32>) -> f32 {
    a.x * b.y - a.y * b.x
}

fn close(a: Vector2<f32>, b: Vector2<f32>) -> bool {
    (a.x - b.x).abs() < EPSILON && (a.y - b.y).abs() < EPSILON
}

/// The flat face of `shape` at z = 0, facing +z.
pub fn shape_geometry(shape: &Shape) -> anyhow::Result<Geometry> {
    let (vertices, indices) = shape.triangulate()?;
    let mut geometry = Geometry::with_capacity(
        GeometryParameters::Shape {
            shape: shape.clone(),
        },
        vertices.len(),
        indices.len(),
    );
    for v in vertices {
        geometry.push_vertex([v[0], v[1], 0.0], [0.0, 0.0, 1.0]);
    }
    geometry.indices = indices;
    Ok(geometry)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(clockwise: bool) -> Shape {
        let mut shape = Shape::new();
        if clockwise {
            shape
                .move_to(0.0, 0.0)
                .line_to(0.0, 1.0)
                .line_to(1.0, 1.0)
                .line_to(1.0, 0.0);
        } else {
            shape
                .move_to(0.0, 0.0)
                .line_to(1.0, 0.0)
                .line_to(1.0, 1.0)
                .line_to(0.0, 1.0)
                .line_to(0.0, 0.0);
        }
        shape
    }

    #[test]
    fn outline_is_counter_clockwise_without_closing_point() {
        let cw = square(true);
        assert!(cw.signed_area() < 0.0);
        let outline = cw.outline();
        assert_eq!(outline.len(), 4);
        assert!(signed_area(&outline) > 0.0);

        let ccw = square(false);
        assert_eq!(ccw.outline().len(), 4);
        assert!((ccw.signed_area() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn square_face_is_two_front_facing_triangles() {
        let geometry = shape_geometry(&square(true)).unwrap();
        assert_eq!(geometry.triangle_count(), 2);
        assert!(geometry.normals.iter().all(|n| *n == [0.0, 0.0, 1.0]));
        for tri in geometry.indices.chunks(3) {
            let p = |i: u32| {
                let v = geometry.positions[i as usize];
                Vector2::new(v[0], v[1])
            };
            assert!(cross(p(tri[1]) - p(tri[0]), p(tri[2]) - p(tri[0])) > 0.0);
        }
    }

    #[test]
    fn degenerate_outline_is_an_error() {
        let mut line = Shape::new();
        line.move_to(0.0, 0.0).line_to(1.0, 0.0).line_to(1.0, 0.0);
        assert!(shape_geometry(&line).is_err());
    }

    #[test]
    fn move_to_restarts_the_outline() {
        let mut shape = Shape::new();
        shape.move_to(5.0, 5.0).line_to(6.0, 6.0).move_to(0.0, 0.0);
        assert_eq!(shape.points(), &[[0.0, 0.0]]);
    }
}
