use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
/// Spot light placement, colors and drag response.
pub struct LightOptions {
    /// Initial world-space position.
    pub position: [f32; 3],
    /// Point the spot is aimed at.
    pub target: [f32; 3],
    /// Ambient color.
    pub ambient: [f32; 3],
    /// Diffuse color.
    pub diffuse: [f32; 3],
    /// World units moved per pixel of secondary-button drag.
    pub drag_scale: f32,
}

impl Default for LightOptions {
    fn default() -> Self {
        Self {
            position: [30.0, 43.0, -26.0],
            target: [0.0, 0.0, 0.0],
            ambient: [0.749, 0.855, 0.902],
            diffuse: [1.0, 0.875, 0.573],
            drag_scale: 0.5,
        }
    }
}
