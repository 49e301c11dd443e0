use crate::camera::controller::ZoomDirection;

/// Discrete actions applied to a [`RenderScene`](super::RenderScene).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneCommand {
    /// Step the camera toward or away from the origin.
    Zoom(ZoomDirection),
}
