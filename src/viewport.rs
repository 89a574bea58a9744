//! Output size and the camera projection that has to follow it.

use cgmath::Deg;

use crate::camera::{CameraSettings, Projection};

/// Surface size in physical pixels, kept consistent with the projection's aspect.
#[derive(Clone, Debug, PartialEq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
    pub projection: Projection,
}

impl Viewport {
    pub fn new(width: u32, height: u32, settings: &CameraSettings) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        Self {
            width,
            height,
            projection: Projection::new(
                width,
                height,
                Deg(settings.fovy_deg),
                settings.znear,
                settings.zfar,
            ),
        }
    }

    /// Applies a new window size. Returns `false` and changes nothing if
    /// either side is zero, e.g. while the window is minimized.
    pub fn resize(&mut self, width: u32, height: u32) -> bool {
        if width == 0 || height == 0 {
            log::warn!("ignoring resize to {}x{}", width, height);
            return false;
        }
        self.width = width;
        self.height = height;
        self.projection.resize(width, height);
        true
    }

    pub fn aspect(&self) -> f32 {
        self.projection.aspect
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aspect_follows_size() {
        let mut viewport = Viewport::new(800, 600, &CameraSettings::default());
        for (w, h) in [(1, 1), (1920, 1080), (333, 777), (4096, 1)] {
            assert!(viewport.resize(w, h));
            assert_eq!((viewport.width, viewport.height), (w, h));
            assert_eq!(viewport.aspect(), w as f32 / h as f32);
        }
    }

    #[test]
    fn resizing_twice_is_idempotent() {
        let mut viewport = Viewport::new(800, 600, &CameraSettings::default());
        viewport.resize(1280, 720);
        let first = viewport.clone();
        viewport.resize(1280, 720);
        assert_eq!(viewport, first);
    }

    #[test]
    fn zero_sizes_are_ignored() {
        let mut viewport = Viewport::new(800, 600, &CameraSettings::default());
        assert!(!viewport.resize(0, 600));
        assert!(!viewport.resize(800, 0));
        assert_eq!((viewport.width, viewport.height), (800, 600));
        assert_eq!(viewport.aspect(), 800.0 / 600.0);
    }
}
