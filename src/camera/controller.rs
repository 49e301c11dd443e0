use glam::{Quat, Vec2, Vec3};

use crate::camera::core::Camera;
use crate::options::CameraOptions;

/// Lengths below this are treated as zero when normalizing.
const DEGENERATE_LENGTH: f32 = 1e-5;

/// Closest the orbit may come to the vertical axis, in radians.
const POLE_MARGIN: f32 = 1e-3;

/// Wheel zoom direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoomDirection {
    /// Wheel up: one step toward the origin.
    In,
    /// Wheel down: one step away from the origin.
    Out,
}

/// Orbit-style camera manipulation.
///
/// Drags rotate the eye rigidly about the target (yaw about world up, then
/// pitch about the horizontal axis perpendicular to the view offset), so the
/// eye–target distance never changes. Wheel steps move the eye along its
/// direction from the world origin.
#[derive(Debug, Clone)]
pub struct OrbitController {
    rotate_sensitivity: f32,
    zoom_step: f32,
    min_zoom_distance: f32,
}

impl Default for OrbitController {
    fn default() -> Self {
        Self::new(&CameraOptions::default())
    }
}

impl OrbitController {
    /// Controller tuned by `options`.
    #[must_use]
    pub fn new(options: &CameraOptions) -> Self {
        Self {
            rotate_sensitivity: options.rotate_sensitivity,
            zoom_step: options.zoom_step,
            min_zoom_distance: options.min_zoom_distance.max(0.0),
        }
    }

    /// Apply a primary-button drag of `delta` pixels over `dt` seconds.
    pub fn orbit(&self, camera: &mut Camera, delta: Vec2, dt: f32) {
        let offset = camera.eye - camera.target;
        if offset.length() < DEGENERATE_LENGTH {
            return;
        }

        let yaw = -delta.x * dt * self.rotate_sensitivity;
        let offset = Quat::from_axis_angle(Vec3::Y, yaw) * offset;

        let pitch = delta.y * dt * self.rotate_sensitivity;
        let offset = pitch_about_horizontal(offset, pitch);

        camera.eye = camera.target + offset;
    }

    /// Apply one wheel step.
    pub fn zoom(&self, camera: &mut Camera, direction: ZoomDirection) {
        let distance = camera.eye.length();
        if distance < DEGENERATE_LENGTH {
            return;
        }
        let dir = camera.eye / distance;

        let new_distance = match direction {
            ZoomDirection::Out => distance + self.zoom_step,
            ZoomDirection::In => {
                if distance <= self.min_zoom_distance {
                    return;
                }
                (distance - self.zoom_step).max(self.min_zoom_distance)
            }
        };

        let eye = dir * new_distance;
        if eye.distance(camera.target) < DEGENERATE_LENGTH {
            return;
        }
        camera.eye = eye;
    }
}

/// Rotate `offset` toward +Y by `angle` about `normalize(offset × Y)`,
/// clamped so it never crosses either pole.
fn pitch_about_horizontal(offset: Vec3, angle: f32) -> Vec3 {
    let axis = offset.cross(Vec3::Y);
    if angle == 0.0 || axis.length() < DEGENERATE_LENGTH {
        return offset;
    }

    let length = offset.length();
    let polar = (offset.y / length).clamp(-1.0, 1.0).acos();
    let clamped = (polar - angle)
        .clamp(POLE_MARGIN, std::f32::consts::PI - POLE_MARGIN);
    let angle = polar - clamped;

    Quat::from_axis_angle(axis.normalize(), angle) * offset
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera() -> Camera {
        Camera::from_options(&CameraOptions::default(), 16.0 / 9.0)
    }

    #[test]
    fn orbit_preserves_distance_to_target() {
        let controller = OrbitController::default();
        let mut camera = camera();
        let radius = camera.distance_to_target();

        let drags = [(30.0, 0.0), (0.0, -45.0), (-120.0, 80.0), (5.0, 2000.0)];
        for (dx, dy) in drags {
            controller.orbit(&mut camera, Vec2::new(dx, dy), 0.016);
            assert!((camera.distance_to_target() - radius).abs() < 1e-3);
        }
        assert_eq!(camera.target, Vec3::new(0.0, 5.0, 0.0));
    }

    #[test]
    fn positive_vertical_drag_raises_eye() {
        let controller = OrbitController::default();
        let mut camera = camera();
        let before = camera.eye.y;
        controller.orbit(&mut camera, Vec2::new(0.0, 10.0), 0.1);
        assert!(camera.eye.y > before);
    }

    #[test]
    fn pitch_stops_short_of_pole() {
        let controller = OrbitController::default();
        let mut camera = camera();
        controller.orbit(&mut camera, Vec2::new(0.0, 1.0e6), 1.0);
        let offset = (camera.eye - camera.target).normalize();
        assert!(offset.y < 1.0);
        assert!(offset.cross(Vec3::Y).length() > 0.0);
        assert!(camera.view().is_finite());
    }

    #[test]
    fn yaw_rotates_about_vertical_axis() {
        let controller = OrbitController::default();
        let mut camera = camera();
        let height = camera.eye.y;
        controller.orbit(&mut camera, Vec2::new(100.0, 0.0), 0.1);
        assert!((camera.eye.y - height).abs() < 1e-4);
        assert!(camera.eye.z.abs() > 0.1);
    }

    #[test]
    fn zoom_steps_one_unit_from_origin() {
        let controller = OrbitController::default();
        let mut camera = camera();
        let start = camera.eye.length();

        controller.zoom(&mut camera, ZoomDirection::In);
        assert!((camera.eye.length() - (start - 1.0)).abs() < 1e-4);
        controller.zoom(&mut camera, ZoomDirection::Out);
        controller.zoom(&mut camera, ZoomDirection::Out);
        assert!((camera.eye.length() - (start + 1.0)).abs() < 1e-4);
    }

    #[test]
    fn zoom_in_never_passes_through_origin() {
        let controller = OrbitController::default();
        let mut camera = camera();
        let dir = camera.eye.normalize();

        for _ in 0..100 {
            controller.zoom(&mut camera, ZoomDirection::In);
        }
        assert!(camera.eye.length() >= 1.0 - 1e-4);
        assert!(camera.eye.normalize().dot(dir) > 0.999);
    }

    #[test]
    fn zoom_at_origin_is_noop() {
        let controller = OrbitController::default();
        let mut camera = camera();
        camera.eye = Vec3::ZERO;
        controller.zoom(&mut camera, ZoomDirection::Out);
        assert_eq!(camera.eye, Vec3::ZERO);
        controller.zoom(&mut camera, ZoomDirection::In);
        assert_eq!(camera.eye, Vec3::ZERO);
    }

    #[test]
    fn orbit_with_eye_on_target_is_noop() {
        let controller = OrbitController::default();
        let mut camera = camera();
        camera.eye = camera.target;
        controller.orbit(&mut camera, Vec2::new(10.0, 10.0), 0.1);
        assert_eq!(camera.eye, camera.target);
    }
}
