use std::fmt;

use crate::gpu::render_context::RenderContextError;
use crate::handle::{ResourceHandle, ResourceKind};

/// Which bracketed pass a call belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PassKind {
    /// Depth-only pass from the light's point of view.
    Shadow,
    /// Lit color pass into the visible framebuffer.
    Forward,
}

impl fmt::Display for PassKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Shadow => f.write_str("shadow pass"),
            Self::Forward => f.write_str("forward pass"),
        }
    }
}

/// Errors reported by a [`GraphicsBackend`](super::GraphicsBackend).
#[derive(Debug)]
pub enum RenderError {
    /// The handle does not name a live resource.
    UnknownHandle(ResourceHandle),
    /// The handle names a resource of a different kind.
    WrongKind {
        /// Offending handle.
        handle: ResourceHandle,
        /// Kind the operation needed.
        expected: ResourceKind,
    },
    /// A pass was begun while another was still open.
    PassAlreadyOpen {
        /// Pass that is still open.
        open: PassKind,
        /// Pass the caller tried to begin.
        requested: PassKind,
    },
    /// A pass-scoped call arrived while the named pass was not open.
    PassNotOpen(PassKind),
    /// A pass was requested outside `begin_frame` / `end_frame`.
    NoFrameInProgress,
    /// `begin_frame` was called twice without `end_frame`.
    FrameAlreadyInProgress,
    /// Resource data did not match its declared layout.
    InvalidData(String),
    /// Shader composition or compilation failed.
    Program(String),
    /// Swapchain acquisition failed.
    Surface(wgpu::SurfaceError),
    /// GPU context creation failed.
    Context(RenderContextError),
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownHandle(handle) => {
                write!(f, "unknown resource handle {handle}")
            }
            Self::WrongKind { handle, expected } => {
                write!(f, "handle {handle} is not a {expected}")
            }
            Self::PassAlreadyOpen { open, requested } => {
                write!(f, "cannot begin {requested}: {open} is still open")
            }
            Self::PassNotOpen(kind) => write!(f, "{kind} is not open"),
            Self::NoFrameInProgress => f.write_str("no frame in progress"),
            Self::FrameAlreadyInProgress => {
                f.write_str("frame already in progress")
            }
            Self::InvalidData(msg) => write!(f, "invalid resource data: {msg}"),
            Self::Program(msg) => write!(f, "shader program error: {msg}"),
            Self::Surface(e) => write!(f, "surface error: {e}"),
            Self::Context(e) => write!(f, "GPU context error: {e}"),
        }
    }
}

impl std::error::Error for RenderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Surface(e) => Some(e),
            Self::Context(e) => Some(e),
            _ => None,
        }
    }
}

impl From<wgpu::SurfaceError> for RenderError {
    fn from(e: wgpu::SurfaceError) -> Self {
        Self::Surface(e)
    }
}

impl From<RenderContextError> for RenderError {
    fn from(e: RenderContextError) -> Self {
        Self::Context(e)
    }
}
