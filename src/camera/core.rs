use glam::{Mat4, Vec3};

use crate::options::CameraOptions;

/// Perspective camera defined by eye position, target, and projection
/// parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    /// Eye (camera) position in world space.
    pub eye: Vec3,
    /// Look-at target position.
    pub target: Vec3,
    /// Up direction vector.
    pub up: Vec3,
    /// Viewport aspect ratio (width / height).
    pub aspect: f32,
    /// Vertical field of view in degrees.
    pub fovy: f32,
    /// Near clipping plane distance.
    pub znear: f32,
    /// Far clipping plane distance.
    pub zfar: f32,
}

impl Camera {
    /// Camera at `options.position` looking at `options.target`.
    #[must_use]
    pub fn from_options(options: &CameraOptions, aspect: f32) -> Self {
        Self {
            eye: Vec3::from_array(options.position),
            target: Vec3::from_array(options.target),
            up: Vec3::Y,
            aspect,
            fovy: options.fovy,
            znear: options.znear,
            zfar: options.zfar,
        }
    }

    /// World-to-view transform.
    #[must_use]
    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye, self.target, self.up)
    }

    /// Whether eye, target and up span a view basis. False when the eye
    /// sits on the target or looks straight along `up`.
    #[must_use]
    pub fn has_view_basis(&self) -> bool {
        self.view().is_finite()
    }

    /// View-to-clip transform.
    #[must_use]
    pub fn projection(&self) -> Mat4 {
        // perspective_rh already uses [0,1] depth range (wgpu/Vulkan
        // convention)
        Mat4::perspective_rh(
            self.fovy.to_radians(),
            self.aspect,
            self.znear,
            self.zfar,
        )
    }

    /// Combined view-projection matrix.
    #[must_use]
    pub fn view_proj(&self) -> Mat4 {
        self.projection() * self.view()
    }

    /// Distance from eye to target.
    #[must_use]
    pub fn distance_to_target(&self) -> f32 {
        self.eye.distance(self.target)
    }

    /// Update the aspect ratio after a viewport resize. Zero-height
    /// viewports are ignored.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.aspect = width as f32 / height as f32;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_camera_looks_at_target() {
        let camera =
            Camera::from_options(&CameraOptions::default(), 16.0 / 9.0);
        assert_eq!(camera.eye, Vec3::new(20.0, 10.0, 0.0));
        assert_eq!(camera.target, Vec3::new(0.0, 5.0, 0.0));

        let target_in_view = camera.view().transform_point3(camera.target);
        assert!(target_in_view.x.abs() < 1e-4);
        assert!(target_in_view.y.abs() < 1e-4);
        assert!(target_in_view.z < 0.0);
    }

    #[test]
    fn coincident_eye_and_target_has_no_basis() {
        let options = CameraOptions {
            position: [0.0, 5.0, 0.0],
            target: [0.0, 5.0, 0.0],
            ..Default::default()
        };
        assert!(!Camera::from_options(&options, 1.0).has_view_basis());

        let overhead = CameraOptions {
            position: [0.0, 20.0, 0.0],
            target: [0.0, 5.0, 0.0],
            ..Default::default()
        };
        assert!(!Camera::from_options(&overhead, 1.0).has_view_basis());
        let default = Camera::from_options(&CameraOptions::default(), 1.0);
        assert!(default.has_view_basis());
    }

    #[test]
    fn resize_ignores_zero_height() {
        let mut camera = Camera::from_options(&CameraOptions::default(), 1.0);
        camera.resize(800, 0);
        assert_eq!(camera.aspect, 1.0);
        camera.resize(800, 400);
        assert_eq!(camera.aspect, 2.0);
    }
}
