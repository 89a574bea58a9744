//! Procedural primitives.
//!
//! The tessellation follows the usual web-graphics conventions: y is up,
//! triangles are counter-clockwise when seen from outside and the vertex
//! layout of each shape matches the common box/plane/cylinder/sphere/torus
//! constructors, so vertex counts line up with what other tools report.
//! Out-of-range parameters are clamped instead of rejected.

use std::f32::consts::{FRAC_PI_2, PI, TAU};

use cgmath::{ElementWise, InnerSpace, Vector2, Vector3};

use super::{Geometry, GeometryParameters};

/// An axis-aligned box centred at the origin.
pub fn box_geometry(width: f32, height: f32, depth: f32) -> Geometry {
    let half = Vector3::new(width, height, depth) * 0.5;
    let mut geometry = Geometry::with_capacity(
        GeometryParameters::Box {
            width,
            height,
            depth,
        },
        24,
        36,
    );

    // (normal, right, up) with right x up == normal, so each quad is ccw from outside
    let faces = [
        (Vector3::unit_x(), -Vector3::unit_z(), Vector3::unit_y()),
        (-Vector3::unit_x(), Vector3::unit_z(), Vector3::unit_y()),
        (Vector3::unit_y(), Vector3::unit_x(), -Vector3::unit_z()),
        (-Vector3::unit_y(), Vector3::unit_x(), Vector3::unit_z()),
        (Vector3::unit_z(), Vector3::unit_x(), Vector3::unit_y()),
        (-Vector3::unit_z(), -Vector3::unit_x(), Vector3::unit_y()),
    ];

    for (normal, right, up) in faces {
        let centre = normal.mul_element_wise(half);
        let right = right.mul_element_wise(half);
        let up = up.mul_element_wise(half);
        let corners = [
            centre - right - up,
            centre + right - up,
            centre + right + up,
            centre - right + up,
        ];
        let base = geometry.vertex_count() as u32;
        for corner in corners {
            geometry.push_vertex(corner.into(), normal.into());
        }
        geometry
            .indices
            .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }

    geometry
}

/// A plane in the xy plane facing +z.
pub fn plane_geometry(width: f32, height: f32) -> Geometry {
    plane_geometry_segmented(width, height, 1, 1)
}

pub fn plane_geometry_segmented(
    width: f32,
    height: f32,
    width_segments: u32,
    height_segments: u32,
) -> Geometry {
    let gx = width_segments.max(1);
    let gy = height_segments.max(1);
    let mut geometry = Geometry::with_capacity(
        GeometryParameters::Plane {
            width,
            height,
            width_segments: gx,
            height_segments: gy,
        },
        ((gx + 1) * (gy + 1)) as usize,
        (gx * gy * 6) as usize,
    );

    let segment_width = width / gx as f32;
    let segment_height = height / gy as f32;
    // rows run top to bottom
    for iy in 0..=gy {
        let y = iy as f32 * segment_height - height / 2.0;
        for ix in 0..=gx {
            let x = ix as f32 * segment_width - width / 2.0;
            geometry.push_vertex([x, -y, 0.0], [0.0, 0.0, 1.0]);
        }
    }

    for iy in 0..gy {
        for ix in 0..gx {
            let a = ix + (gx + 1) * iy;
            let b = ix + (gx + 1) * (iy + 1);
            let c = (ix + 1) + (gx + 1) * (iy + 1);
            let d = (ix + 1) + (gx + 1) * iy;
            geometry.indices.extend_from_slice(&[a, b, d, b, c, d]);
        }
    }

    geometry
}

/// A cylinder along the y axis, centred at the origin, with 32 radial segments.
pub fn cylinder_geometry(radius_top: f32, radius_bottom: f32, height: f32) -> Geometry {
    cylinder_geometry_segmented(radius_top, radius_bottom, height, 32, 1, false)
}

pub fn cylinder_geometry_segmented(
    radius_top: f32,
    radius_bottom: f32,
    height: f32,
    radial_segments: u32,
    height_segments: u32,
    open_ended: bool,
) -> Geometry {
    let radial = radial_segments.max(3);
    let rows = height_segments.max(1);
    let half_height = height / 2.0;
    let mut geometry = Geometry::with_capacity(
        GeometryParameters::Cylinder {
            radius_top,
            radius_bottom,
            height,
            radial_segments: radial,
            height_segments: rows,
            open_ended,
        },
        ((radial + 1) * (rows + 1) + 2 * (2 * radial + 1)) as usize,
        ((radial * rows * 6) + 2 * radial * 3) as usize,
    );

    // normals of a cone tilt by the radius change over the height
    let slope = if height.abs() > f32::EPSILON {
        (radius_bottom - radius_top) / height
    } else {
        0.0
    };
    let mut grid: Vec<Vec<u32>> = Vec::with_capacity(rows as usize + 1);
    for y in 0..=rows {
        let v = y as f32 / rows as f32;
        let radius = v * (radius_bottom - radius_top) + radius_top;
        let row = (0..=radial)
            .map(|x| {
                let theta = x as f32 / radial as f32 * TAU;
                let (sin, cos) = theta.sin_cos();
                let normal = Vector3::new(sin, slope, cos).normalize();
                geometry.push_vertex(
                    [radius * sin, -v * height + half_height, radius * cos],
                    normal.into(),
                )
            })
            .collect();
        grid.push(row);
    }
    for x in 0..radial as usize {
        for y in 0..rows as usize {
            let a = grid[y][x];
            let b = grid[y + 1][x];
            let c = grid[y + 1][x + 1];
            let d = grid[y][x + 1];
            geometry.indices.extend_from_slice(&[a, b, d, b, c, d]);
        }
    }

    if !open_ended {
        if radius_top > 0.0 {
            push_cap(&mut geometry, radial, radius_top, half_height, true);
        }
        if radius_bottom > 0.0 {
            push_cap(&mut geometry, radial, radius_bottom, -half_height, false);
        }
    }

    geometry
}

fn push_cap(geometry: &mut Geometry, radial: u32, radius: f32, y: f32, top: bool) {
    let sign = if top { 1.0 } else { -1.0 };
    let normal = [0.0, sign, 0.0];
    let centre_start = geometry.vertex_count() as u32;
    // one centre vertex per segment keeps the cap layout of the body
    for _ in 0..radial {
        geometry.push_vertex([0.0, y, 0.0], normal);
    }
    let ring_start = geometry.vertex_count() as u32;
    for x in 0..=radial {
        let theta = x as f32 / radial as f32 * TAU;
        let (sin, cos) = theta.sin_cos();
        geometry.push_vertex([radius * sin, y, radius * cos], normal);
    }
    for x in 0..radial {
        let centre = centre_start + x;
        let current = ring_start + x;
        if top {
            geometry
                .indices
                .extend_from_slice(&[centre, current, current + 1]);
        } else {
            geometry
                .indices
                .extend_from_slice(&[centre, current + 1, current]);
        }
    }
}

/// A UV sphere centred at the origin.
pub fn sphere_geometry(radius: f32, width_segments: u32, height_segments: u32) -> Geometry {
    let ws = width_segments.max(3);
    let hs = height_segments.max(2);
    let mut geometry = Geometry::with_capacity(
        GeometryParameters::Sphere {
            radius,
            width_segments: ws,
            height_segments: hs,
        },
        ((ws + 1) * (hs + 1)) as usize,
        (ws * (hs - 1) * 6) as usize,
    );

    let mut grid: Vec<Vec<u32>> = Vec::with_capacity(hs as usize + 1);
    for iy in 0..=hs {
        let v = iy as f32 / hs as f32;
        let row = (0..=ws)
            .map(|ix| {
                let u = ix as f32 / ws as f32;
                let position = Vector3::new(
                    -radius * (u * TAU).cos() * (v * PI).sin(),
                    radius * (v * PI).cos(),
                    radius * (u * TAU).sin() * (v * PI).sin(),
                );
                let normal = safe_normalize(position, Vector3::unit_y());
                geometry.push_vertex(position.into(), normal.into())
            })
            .collect();
        grid.push(row);
    }
    for iy in 0..hs as usize {
        for ix in 0..ws as usize {
            let a = grid[iy][ix + 1];
            let b = grid[iy][ix];
            let c = grid[iy + 1][ix];
            let d = grid[iy + 1][ix + 1];
            if iy != 0 {
                geometry.indices.extend_from_slice(&[a, b, d]);
            }
            if iy != hs as usize - 1 {
                geometry.indices.extend_from_slice(&[b, c, d]);
            }
        }
    }

    geometry
}

/// A torus in the xy plane around the z axis.
pub fn torus_geometry(
    radius: f32,
    tube: f32,
    radial_segments: u32,
    tubular_segments: u32,
) -> Geometry {
    let radial = radial_segments.max(2);
    let tubular = tubular_segments.max(3);
    let mut geometry = Geometry::with_capacity(
        GeometryParameters::Torus {
            radius,
            tube,
            radial_segments: radial,
            tubular_segments: tubular,
        },
        ((radial + 1) * (tubular + 1)) as usize,
        (radial * tubular * 6) as usize,
    );

    for j in 0..=radial {
        for i in 0..=tubular {
            let u = i as f32 / tubular as f32 * TAU;
            let v = j as f32 / radial as f32 * TAU;
            let position = Vector3::new(
                (radius + tube * v.cos()) * u.cos(),
                (radius + tube * v.cos()) * u.sin(),
                tube * v.sin(),
            );
            let centre = Vector3::new(radius * u.cos(), radius * u.sin(), 0.0);
            let normal = safe_normalize(position - centre, Vector3::unit_z());
            geometry.push_vertex(position.into(), normal.into());
        }
    }
    for j in 1..=radial {
        for i in 1..=tubular {
            let a = (tubular + 1) * j + i - 1;
            let b = (tubular + 1) * (j - 1) + i - 1;
            let c = (tubular + 1) * (j - 1) + i;
            let d = (tubular + 1) * j + i;
            geometry.indices.extend_from_slice(&[a, b, d, b, c, d]);
        }
    }

    geometry
}

/// A capsule along the y axis: two hemispheres joined by a cylinder of
/// `length`. The total height is `length + 2 * radius`.
pub fn capsule_geometry(
    radius: f32,
    length: f32,
    cap_segments: u32,
    radial_segments: u32,
) -> Geometry {
    let caps = cap_segments.max(1);
    let radial = radial_segments.max(3);
    let half = length / 2.0;

    // profile from the bottom pole to the top pole as (point, normal)
    let mut profile: Vec<(Vector2<f32>, Vector2<f32>)> = Vec::with_capacity(2 * caps as usize + 2);
    for k in 0..=caps {
        let phi = -FRAC_PI_2 + FRAC_PI_2 * k as f32 / caps as f32;
        let normal = Vector2::new(phi.cos(), phi.sin());
        profile.push((Vector2::new(0.0, -half) + normal * radius, normal));
    }
    for k in 0..=caps {
        let phi = FRAC_PI_2 * k as f32 / caps as f32;
        let normal = Vector2::new(phi.cos(), phi.sin());
        profile.push((Vector2::new(0.0, half) + normal * radius, normal));
    }

    lathe(
        GeometryParameters::Capsule {
            radius,
            length,
            cap_segments: caps,
            radial_segments: radial,
        },
        &profile,
        radial,
    )
}

/// Revolves a profile in the xy half-plane (x >= 0) around the y axis.
pub(crate) fn lathe(
    parameters: GeometryParameters,
    profile: &[(Vector2<f32>, Vector2<f32>)],
    segments: u32,
) -> Geometry {
    let columns = segments + 1;
    let mut geometry = Geometry::with_capacity(
        parameters,
        profile.len() * columns as usize,
        profile.len().saturating_sub(1) * segments as usize * 6,
    );

    for (point, normal) in profile {
        for s in 0..=segments {
            let theta = s as f32 / segments as f32 * TAU;
            let (sin, cos) = theta.sin_cos();
            let n = safe_normalize(
                Vector3::new(normal.x * sin, normal.y, normal.x * cos),
                Vector3::unit_y(),
            );
            geometry.push_vertex([point.x * sin, point.y, point.x * cos], n.into());
        }
    }
    for k in 0..profile.len().saturating_sub(1) as u32 {
        for s in 0..segments {
            let a = k * columns + s;
            let b = k * columns + s + 1;
            let c = (k + 1) * columns + s + 1;
            let d = (k + 1) * columns + s;
            geometry.indices.extend_from_slice(&[a, b, c, a, c, d]);
        }
    }

    geometry
}

fn safe_normalize(v: Vector3<f32>, fallback: Vector3<f32>) -> Vector3<f32> {
    let len = v.magnitude();
    if len > f32::EPSILON { v / len } else { fallback }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_structures::geometry::test_support::{
        assert_indices_in_range, assert_unit_normals,
    };

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    /// Every triangle's winding normal agrees with the stored vertex normals.
    fn assert_outward_winding(geometry: &Geometry) {
        for tri in geometry.indices.chunks(3) {
            let p = |i: u32| Vector3::from(geometry.positions[i as usize]);
            let face = (p(tri[1]) - p(tri[0])).cross(p(tri[2]) - p(tri[0]));
            if face.magnitude() < 1e-7 {
                continue;
            }
            let avg: Vector3<f32> = tri
                .iter()
                .map(|&i| Vector3::from(geometry.normals[i as usize]))
                .fold(Vector3::new(0.0, 0.0, 0.0), |acc, n| acc + n);
            assert!(face.dot(avg) > 0.0, "triangle {:?} is wound inwards", tri);
        }
    }

    #[test]
    fn unit_box_has_flat_faces() {
        let cube = box_geometry(1.0, 1.0, 1.0);
        assert_eq!(cube.vertex_count(), 24);
        assert_eq!(cube.triangle_count(), 12);
        let (min, max) = cube.bounds();
        assert_eq!(min, [-0.5, -0.5, -0.5]);
        assert_eq!(max, [0.5, 0.5, 0.5]);
        assert_unit_normals(&cube);
        assert_outward_winding(&cube);
    }

    #[test]
    fn plane_faces_positive_z() {
        let plane = plane_geometry(20.0, 20.0);
        assert_eq!(plane.vertex_count(), 4);
        assert_eq!(plane.triangle_count(), 2);
        assert!(plane.normals.iter().all(|n| *n == [0.0, 0.0, 1.0]));
        let (min, max) = plane.bounds();
        assert_eq!((min[0], max[0]), (-10.0, 10.0));
        assert_eq!((min[2], max[2]), (0.0, 0.0));
        assert_outward_winding(&plane);
    }

    #[test]
    fn cylinder_counts_include_both_caps() {
        let cylinder = cylinder_geometry(1.0, 1.0, 2.0);
        // body: 33 * 2, caps: 2 * (32 centres + 33 ring)
        assert_eq!(cylinder.vertex_count(), 33 * 2 + 2 * (32 + 33));
        assert_eq!(cylinder.triangle_count(), 32 * 2 + 2 * 32);
        let (min, max) = cylinder.bounds();
        assert!(approx(min[1], -1.0) && approx(max[1], 1.0));
        assert_unit_normals(&cylinder);
        assert_indices_in_range(&cylinder);
        assert_outward_winding(&cylinder);
    }

    #[test]
    fn open_cylinder_skips_caps() {
        let tube = cylinder_geometry_segmented(1.0, 1.0, 2.0, 8, 2, true);
        assert_eq!(tube.vertex_count(), 9 * 3);
        assert_eq!(tube.triangle_count(), 8 * 2 * 2);
    }

    #[test]
    fn sphere_vertices_lie_on_the_radius() {
        let sphere = sphere_geometry(1.0, 32, 32);
        assert_eq!(sphere.vertex_count(), 33 * 33);
        // poles contribute one triangle per quad
        assert_eq!(sphere.triangle_count(), 32 * 32 * 2 - 2 * 32);
        for p in &sphere.positions {
            let r = Vector3::from(*p).magnitude();
            assert!(approx(r, 1.0));
        }
        assert_unit_normals(&sphere);
        assert_outward_winding(&sphere);
    }

    #[test]
    fn torus_stays_within_its_tube() {
        let torus = torus_geometry(0.5, 0.1, 16, 100);
        assert_eq!(torus.vertex_count(), 17 * 101);
        assert_eq!(torus.triangle_count(), 16 * 100 * 2);
        let (min, max) = torus.bounds();
        assert!(approx(max[0], 0.6) && approx(min[0], -0.6));
        assert!(approx(max[2], 0.1) && approx(min[2], -0.1));
        assert_unit_normals(&torus);
        assert_outward_winding(&torus);
    }

    #[test]
    fn capsule_height_is_length_plus_both_caps() {
        let capsule = capsule_geometry(1.0, 2.0, 20, 30);
        assert_eq!(capsule.vertex_count(), 2 * 21 * 31);
        let (min, max) = capsule.bounds();
        assert!(approx(min[1], -2.0) && approx(max[1], 2.0));
        // the seam at theta = 0 lies on +z
        assert!(approx(max[2], 1.0));
        assert_unit_normals(&capsule);
        assert_indices_in_range(&capsule);
        assert_outward_winding(&capsule);
    }

    #[test]
    fn degenerate_parameters_are_clamped() {
        let sphere = sphere_geometry(1.0, 0, 0);
        assert_eq!(
            sphere.parameters,
            GeometryParameters::Sphere {
                radius: 1.0,
                width_segments: 3,
                height_segments: 2
            }
        );
        assert!(sphere.triangle_count() > 0);
    }

    #[test]
    fn only_segment_counts_are_clamped() {
        let torus = torus_geometry(0.5, 0.1, 0, 1);
        assert_eq!(
            torus.parameters,
            GeometryParameters::Torus {
                radius: 0.5,
                tube: 0.1,
                radial_segments: 2,
                tubular_segments: 3
            }
        );

        let sphere = sphere_geometry(-1.0, 8, 8);
        assert_eq!(
            sphere.parameters,
            GeometryParameters::Sphere {
                radius: -1.0,
                width_segments: 8,
                height_segments: 8
            }
        );
        assert!(sphere.positions.iter().flatten().all(|c| c.is_finite()));
        assert!(sphere.triangle_count() > 0);

        let flat = sphere_geometry(0.0, 8, 8);
        assert!(flat.normals.iter().flatten().all(|c| c.is_finite()));
    }
}
