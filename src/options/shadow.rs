use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
/// Shadow map size and light projection.
pub struct ShadowOptions {
    /// Square depth target resolution in texels.
    pub resolution: u32,
    /// Spot cone (light frustum) vertical field of view in degrees.
    pub fovy: f32,
    /// Light frustum near plane.
    pub znear: f32,
    /// Light frustum far plane.
    pub zfar: f32,
    /// Depth bias subtracted before the shadow comparison.
    pub depth_bias: f32,
}

impl Default for ShadowOptions {
    fn default() -> Self {
        Self {
            resolution: 1024,
            fovy: 45.0,
            znear: 1.0,
            zfar: 200.0,
            depth_bias: 0.0005,
        }
    }
}
