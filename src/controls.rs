//! Orbit controls: rotate, dolly and pan the camera around a target point.
//!
//! Input events only accumulate a pending change (a spherical delta, a pan
//! offset and a zoom scale). [`OrbitControls::update`] applies it to the
//! camera and clears it, so it has to run once per frame and once right
//! after construction to point the camera at the target.

use std::f32::consts::PI;

use cgmath::{InnerSpace, Point3, Vector3};
use winit::event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent};

use crate::{camera::Camera, viewport::Viewport};

const EPS: f32 = 1e-6;
/// Pixels per scrolled line, the usual browser line height.
const LINE_HEIGHT: f32 = 100.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Gesture {
    None,
    Rotate,
    Dolly,
    Pan,
}

/// Offset of the camera from the target in spherical coordinates.
/// `phi` is the polar angle from +y, `theta` the azimuth around y from +z.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Spherical {
    pub radius: f32,
    pub phi: f32,
    pub theta: f32,
}

impl Spherical {
    pub fn from_offset(offset: Vector3<f32>) -> Self {
        let radius = offset.magnitude();
        if radius == 0.0 {
            return Self::default();
        }
        Self {
            radius,
            theta: offset.x.atan2(offset.z),
            phi: (offset.y / radius).clamp(-1.0, 1.0).acos(),
        }
    }

    pub fn to_offset(&self) -> Vector3<f32> {
        let sin_phi_radius = self.phi.sin() * self.radius;
        Vector3::new(
            sin_phi_radius * self.theta.sin(),
            self.phi.cos() * self.radius,
            sin_phi_radius * self.theta.cos(),
        )
    }

    /// Keeps `phi` off the poles, where the view direction would be parallel to up.
    pub fn make_safe(&mut self) {
        self.phi = self.phi.clamp(EPS, PI - EPS);
    }
}

#[derive(Debug)]
pub struct OrbitControls {
    pub target: Point3<f32>,
    pub enabled: bool,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub pan_speed: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    pub min_polar_angle: f32,
    pub max_polar_angle: f32,

    gesture: Gesture,
    cursor: Option<(f32, f32)>,
    spherical_delta: Spherical,
    pan_offset: Vector3<f32>,
    scale: f32,
}

impl OrbitControls {
    pub fn new(target: Point3<f32>) -> Self {
        Self {
            target,
            enabled: true,
            rotate_speed: 1.0,
            zoom_speed: 1.0,
            pan_speed: 1.0,
            min_distance: 0.0,
            max_distance: f32::INFINITY,
            min_polar_angle: 0.0,
            max_polar_angle: PI,
            gesture: Gesture::None,
            cursor: None,
            spherical_delta: Spherical::default(),
            pan_offset: Vector3::new(0.0, 0.0, 0.0),
            scale: 1.0,
        }
    }

    pub fn gesture(&self) -> Gesture {
        self.gesture
    }

    /// Feeds a window event in. Returns whether the controls used it.
    pub fn handle_window_events(
        &mut self,
        event: &WindowEvent,
        camera: &Camera,
        viewport: &Viewport,
    ) -> bool {
        if !self.enabled {
            return false;
        }
        match event {
            WindowEvent::MouseInput { state, button, .. } => match state {
                ElementState::Pressed => self.pointer_down(*button),
                ElementState::Released => self.pointer_up(),
            },
            WindowEvent::CursorMoved { position, .. } => {
                self.pointer_move(position.x as f32, position.y as f32, camera, viewport)
            }
            WindowEvent::MouseWheel { delta, .. } => {
                // browsers report wheel deltas with the opposite sign, in pixels
                let delta_y = match delta {
                    MouseScrollDelta::LineDelta(_, y) => -y * LINE_HEIGHT,
                    MouseScrollDelta::PixelDelta(pos) => -pos.y as f32,
                };
                self.wheel(delta_y)
            }
            WindowEvent::CursorLeft { .. } => {
                self.cursor = None;
                self.pointer_up()
            }
            _ => false,
        }
    }

    pub fn pointer_down(&mut self, button: MouseButton) -> bool {
        self.gesture = match button {
            MouseButton::Left => Gesture::Rotate,
            MouseButton::Middle => Gesture::Dolly,
            MouseButton::Right => Gesture::Pan,
            _ => return false,
        };
        true
    }

    pub fn pointer_up(&mut self) -> bool {
        let was_active = self.gesture != Gesture::None;
        self.gesture = Gesture::None;
        was_active
    }

    pub fn pointer_move(&mut self, x: f32, y: f32, camera: &Camera, viewport: &Viewport) -> bool {
        let Some((last_x, last_y)) = self.cursor.replace((x, y)) else {
            return false;
        };
        let (dx, dy) = (x - last_x, y - last_y);
        let height = viewport.height.max(1) as f32;
        match self.gesture {
            Gesture::None => return false,
            Gesture::Rotate => {
                self.rotate_left(2.0 * PI * dx * self.rotate_speed / height);
                self.rotate_up(2.0 * PI * dy * self.rotate_speed / height);
            }
            Gesture::Dolly => {
                if dy > 0.0 {
                    self.dolly_out(self.zoom_scale(dy));
                } else if dy < 0.0 {
                    self.dolly_in(self.zoom_scale(dy));
                }
            }
            Gesture::Pan => self.pan(
                dx * self.pan_speed,
                dy * self.pan_speed,
                camera,
                viewport,
            ),
        }
        true
    }

    pub fn wheel(&mut self, delta_y: f32) -> bool {
        if delta_y < 0.0 {
            self.dolly_in(self.zoom_scale(delta_y));
        } else if delta_y > 0.0 {
            self.dolly_out(self.zoom_scale(delta_y));
        } else {
            return false;
        }
        true
    }

    fn zoom_scale(&self, delta: f32) -> f32 {
        0.95_f32.powf(self.zoom_speed * (delta * 0.01).abs())
    }

    pub fn rotate_left(&mut self, angle: f32) {
        self.spherical_delta.theta -= angle;
    }

    pub fn rotate_up(&mut self, angle: f32) {
        self.spherical_delta.phi -= angle;
    }

    /// Moves the camera closer by `dolly_scale` (a factor below 1).
    pub fn dolly_in(&mut self, dolly_scale: f32) {
        self.scale *= dolly_scale;
    }

    pub fn dolly_out(&mut self, dolly_scale: f32) {
        self.scale /= dolly_scale;
    }

    /// Pans by a screen-space pixel delta. At the target's depth one viewport
    /// height in pixels covers `2 * distance * tan(fovy / 2)` world units.
    pub fn pan(&mut self, dx: f32, dy: f32, camera: &Camera, viewport: &Viewport) {
        let offset = camera.position - self.target;
        if offset.magnitude2() < EPS {
            return;
        }
        let target_distance = offset.magnitude() * (viewport.projection.fovy.0 / 2.0).tan();
        let height = viewport.height.max(1) as f32;

        let forward = -offset.normalize();
        let right = forward.cross(camera.up);
        if right.magnitude2() < EPS {
            return;
        }
        let right = right.normalize();
        let up = right.cross(forward);

        self.pan_offset += right * (-2.0 * dx * target_distance / height);
        self.pan_offset += up * (2.0 * dy * target_distance / height);
    }

    /// Applies the pending change to `camera`. Returns whether the camera moved.
    pub fn update(&mut self, camera: &mut Camera) -> bool {
        let offset = camera.position - self.target;
        let mut spherical = Spherical::from_offset(offset);

        spherical.theta += self.spherical_delta.theta;
        spherical.phi += self.spherical_delta.phi;
        spherical.phi = spherical
            .phi
            .clamp(self.min_polar_angle, self.max_polar_angle.max(self.min_polar_angle));
        spherical.make_safe();
        spherical.radius = (spherical.radius * self.scale)
            .clamp(self.min_distance, self.max_distance.max(self.min_distance));

        self.target += self.pan_offset;

        let position = self.target + spherical.to_offset();
        let moved = (position - camera.position).magnitude2() > EPS
            || (self.target - camera.target).magnitude2() > EPS;
        camera.position = position;
        camera.target = self.target;

        self.spherical_delta = Spherical::default();
        self.pan_offset = Vector3::new(0.0, 0.0, 0.0);
        self.scale = 1.0;
        moved
    }
}

#[cfg(test)]
mod tests {
    use cgmath::{EuclideanSpace, MetricSpace};

    use super::*;
    use crate::camera::CameraSettings;

    fn setup() -> (OrbitControls, Camera, Viewport) {
        let settings = CameraSettings::default();
        let mut camera = Camera::from(&settings);
        let mut controls = OrbitControls::new(Point3::origin());
        controls.update(&mut camera);
        (controls, camera, Viewport::new(800, 600, &settings))
    }

    #[test]
    fn first_update_keeps_the_start_position() {
        let (_, camera, _) = setup();
        assert!(camera.position.distance(Point3::new(0.0, 1.0, 5.0)) < 1e-4);
        assert_eq!(camera.target, Point3::origin());
    }

    #[test]
    fn idle_update_reports_no_motion() {
        let (mut controls, mut camera, _) = setup();
        assert!(!controls.update(&mut camera));
    }

    #[test]
    fn rotating_keeps_the_distance() {
        let (mut controls, mut camera, viewport) = setup();
        let before = camera.position.distance(controls.target);
        controls.pointer_down(MouseButton::Left);
        controls.pointer_move(100.0, 100.0, &camera, &viewport);
        controls.pointer_move(250.0, 140.0, &camera, &viewport);
        assert!(controls.update(&mut camera));
        assert!((camera.position.distance(controls.target) - before).abs() < 1e-4);
    }

    #[test]
    fn polar_angle_never_reaches_the_pole() {
        let (mut controls, mut camera, _) = setup();
        controls.rotate_up(10.0);
        controls.update(&mut camera);
        let offset = camera.position - controls.target;
        assert!(offset.x.abs() + offset.z.abs() > 0.0);
        assert!(offset.y > 0.0);
    }

    #[test]
    fn dolly_respects_distance_limits() {
        let (mut controls, mut camera, _) = setup();
        controls.min_distance = 2.0;
        controls.max_distance = 10.0;
        for _ in 0..50 {
            controls.wheel(-300.0);
            controls.update(&mut camera);
        }
        assert!((camera.position.distance(controls.target) - 2.0).abs() < 1e-4);
        for _ in 0..50 {
            controls.wheel(300.0);
            controls.update(&mut camera);
        }
        assert!((camera.position.distance(controls.target) - 10.0).abs() < 1e-4);
    }

    #[test]
    fn wheel_up_moves_closer() {
        let (mut controls, mut camera, _) = setup();
        let before = camera.position.distance(controls.target);
        controls.wheel(-100.0);
        controls.update(&mut camera);
        let after = camera.position.distance(controls.target);
        assert!((after - before * 0.95).abs() < 1e-4);
    }

    #[test]
    fn pan_moves_target_and_camera_together() {
        let (mut controls, mut camera, viewport) = setup();
        let offset_before = camera.position - controls.target;
        controls.pointer_down(MouseButton::Right);
        controls.pointer_move(400.0, 300.0, &camera, &viewport);
        controls.pointer_move(300.0, 300.0, &camera, &viewport);
        controls.pointer_up();
        controls.update(&mut camera);
        // dragging left moves the view to the right
        assert!(controls.target.x > 0.0);
        assert!(((camera.position - controls.target) - offset_before).magnitude() < 1e-4);
    }

    #[test]
    fn pan_with_the_camera_on_the_target_does_nothing() {
        let (mut controls, mut camera, viewport) = setup();
        camera.position = controls.target;
        controls.pan(100.0, 50.0, &camera, &viewport);
        controls.update(&mut camera);
        assert_eq!(controls.target, Point3::origin());
        assert!(camera.position.to_vec().magnitude().is_finite());
    }

    #[test]
    fn moves_without_a_gesture_are_ignored() {
        let (mut controls, mut camera, viewport) = setup();
        controls.pointer_move(0.0, 0.0, &camera, &viewport);
        assert!(!controls.pointer_move(50.0, 50.0, &camera, &viewport));
        assert!(!controls.update(&mut camera));
    }
}
