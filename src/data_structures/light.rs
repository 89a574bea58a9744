//! The directional light and the orthographic camera its shadow map is rendered from.

use cgmath::{EuclideanSpace, InnerSpace, Matrix4, Point3, Vector3};

use crate::{camera::OPENGL_TO_WGPU_MATRIX, data_structures::color::Color};

/// Box in light space that the shadow map covers.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ShadowCamera {
    pub left: f32,
    pub right: f32,
    pub bottom: f32,
    pub top: f32,
    pub near: f32,
    pub far: f32,
    /// Edge length of the square depth map in texels.
    pub map_size: u32,
    pub bias: f32,
}

impl Default for ShadowCamera {
    fn default() -> Self {
        Self {
            left: -5.0,
            right: 5.0,
            bottom: -5.0,
            top: 5.0,
            near: 0.5,
            far: 500.0,
            map_size: 512,
            bias: 0.005,
        }
    }
}

/// Parallel light shining from `position` towards `target`.
#[derive(Clone, Debug, PartialEq)]
pub struct DirectionalLight {
    pub color: Color,
    pub intensity: f32,
    pub position: Point3<f32>,
    pub target: Point3<f32>,
    pub cast_shadow: bool,
    pub shadow: ShadowCamera,
}

impl DirectionalLight {
    pub fn new(color: Color, intensity: f32) -> Self {
        Self {
            color,
            intensity,
            position: Point3::new(0.0, 1.0, 0.0),
            target: Point3::origin(),
            cast_shadow: false,
            shadow: ShadowCamera::default(),
        }
    }

    pub fn look_at(&mut self, target: Point3<f32>) {
        self.target = target;
    }

    /// Unit vector from the light towards its target.
    pub fn direction(&self) -> Vector3<f32> {
        let d = self.target - self.position;
        if d.magnitude2() > 0.0 {
            d.normalize()
        } else {
            -Vector3::unit_y()
        }
    }

    pub fn view(&self) -> Matrix4<f32> {
        let forward = self.direction();
        let up = if forward.cross(Vector3::unit_y()).magnitude2() < 1e-6 {
            Vector3::unit_z()
        } else {
            Vector3::unit_y()
        };
        Matrix4::look_at_rh(self.position, self.position + forward, up)
    }

    /// Projection from world space into the shadow map's clip space.
    pub fn view_proj(&self) -> Matrix4<f32> {
        let s = &self.shadow;
        let proj = cgmath::ortho(s.left, s.right, s.bottom, s.top, s.near, s.far);
        OPENGL_TO_WGPU_MATRIX * proj * self.view()
    }
}

#[cfg(test)]
mod tests {
    use cgmath::Vector4;

    use super::*;

    fn scene_light() -> DirectionalLight {
        let mut light = DirectionalLight::new(Color::WHITE, 5.0);
        light.position = Point3::new(3.0, 4.0, 5.0);
        light.look_at(Point3::origin());
        light
    }

    #[test]
    fn direction_points_at_target() {
        let light = scene_light();
        let expected = Vector3::new(-3.0, -4.0, -5.0).normalize();
        assert!((light.direction() - expected).magnitude() < 1e-6);
    }

    #[test]
    fn origin_lands_in_the_middle_of_the_shadow_map() {
        let light = scene_light();
        let clip = light.view_proj() * Vector4::new(0.0, 0.0, 0.0, 1.0);
        let ndc = clip.truncate() / clip.w;
        assert!(ndc.x.abs() < 1e-5 && ndc.y.abs() < 1e-5);
        assert!(ndc.z > 0.0 && ndc.z < 1.0);
    }

    #[test]
    fn straight_down_light_still_has_a_view() {
        let mut light = DirectionalLight::new(Color::WHITE, 1.0);
        light.position = Point3::new(0.0, 10.0, 0.0);
        let m = light.view();
        assert!(m.x.x.is_finite() && m.y.y.is_finite());
        let ndc = light.view_proj() * Vector4::new(0.0, 0.0, 0.0, 1.0);
        assert!(ndc.x.abs() < 1e-5);
    }
}
