use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
/// Camera placement, projection and control parameters.
pub struct CameraOptions {
    /// Initial eye position.
    pub position: [f32; 3],
    /// Look-at target.
    pub target: [f32; 3],
    /// Vertical field of view in degrees.
    pub fovy: f32,
    /// Near clipping plane distance.
    pub znear: f32,
    /// Far clipping plane distance.
    pub zfar: f32,
    /// Orbit angle per pixel-second of drag, in radians.
    pub rotate_sensitivity: f32,
    /// Distance moved per wheel click.
    pub zoom_step: f32,
    /// Closest the eye may zoom to the world origin.
    pub min_zoom_distance: f32,
}

impl Default for CameraOptions {
    fn default() -> Self {
        Self {
            position: [20.0, 10.0, 0.0],
            target: [0.0, 5.0, 0.0],
            fovy: 45.0,
            znear: 0.1,
            zfar: 500.0,
            rotate_sensitivity: 0.25,
            zoom_step: 1.0,
            min_zoom_distance: 1.0,
        }
    }
}
