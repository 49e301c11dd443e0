//! Crate-level error types.

use std::fmt;

use crate::backend::RenderError;
use crate::gpu::render_context::RenderContextError;

/// Failures while building scene assets.
#[derive(Debug)]
pub enum AssetError {
    /// The backend rejected an asset upload.
    Render(RenderError),
    /// Generated asset data was inconsistent.
    Invalid(String),
}

impl fmt::Display for AssetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Render(e) => write!(f, "asset upload failed: {e}"),
            Self::Invalid(msg) => write!(f, "invalid asset: {msg}"),
        }
    }
}

impl std::error::Error for AssetError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Render(e) => Some(e),
            Self::Invalid(_) => None,
        }
    }
}

impl From<RenderError> for AssetError {
    fn from(e: RenderError) -> Self {
        Self::Render(e)
    }
}

/// Errors produced by the metaballs crate.
#[derive(Debug)]
pub enum SceneError {
    /// Graphics backend failure.
    Render(RenderError),
    /// Asset provider failure.
    Asset(AssetError),
    /// Generic I/O failure.
    Io(std::io::Error),
    /// TOML options parsing/serialization failure.
    OptionsParse(String),
    /// Camera options give no view direction.
    DegenerateCamera {
        /// Configured eye position.
        position: [f32; 3],
        /// Configured look-at target.
        target: [f32; 3],
    },
    /// Viewer event-loop failure.
    Viewer(String),
}

impl fmt::Display for SceneError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Render(e) => write!(f, "render error: {e}"),
            Self::Asset(e) => write!(f, "asset error: {e}"),
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::OptionsParse(msg) => {
                write!(f, "options parse error: {msg}")
            }
            Self::DegenerateCamera { position, target } => write!(
                f,
                "camera at {position:?} cannot look at {target:?}"
            ),
            Self::Viewer(msg) => write!(f, "viewer error: {msg}"),
        }
    }
}

impl std::error::Error for SceneError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Render(e) => Some(e),
            Self::Asset(e) => Some(e),
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<RenderError> for SceneError {
    fn from(e: RenderError) -> Self {
        Self::Render(e)
    }
}

impl From<RenderContextError> for SceneError {
    fn from(e: RenderContextError) -> Self {
        Self::Render(RenderError::Context(e))
    }
}

impl From<AssetError> for SceneError {
    fn from(e: AssetError) -> Self {
        Self::Asset(e)
    }
}

impl From<std::io::Error> for SceneError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}
