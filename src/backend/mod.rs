//! The seam between the scene core and a graphics API.
//!
//! [`GraphicsBackend`] is object-safe; the scene, passes and collaborators
//! all take `&mut dyn GraphicsBackend`. Two implementations ship:
//! [`WgpuBackend`](crate::gpu::backend::WgpuBackend) for real rendering and
//! [`RecordingBackend`](recording::RecordingBackend) for headless runs and
//! tests.
//!
//! Pass begin/end methods are low level. Scene code opens passes through
//! [`ShadowPass`](crate::renderer::shadow::ShadowPass) and
//! [`ForwardPass`](crate::renderer::forward::ForwardPass), which borrow the
//! backend for their whole lifetime and end the pass on drop.

mod error;
/// Headless backend that records every call.
pub mod recording;
mod types;

pub use error::{PassKind, RenderError};
pub use types::{
    BillboardDraw, BlendMode, BufferDesc, BufferUsage, ForwardPassDesc,
    LightingDesc, Material, MeshData, MeshVertex, ProgramDesc, RenderState,
    Renderable, ShadowPassDesc, TextureDesc,
};

use crate::handle::ResourceHandle;

/// Result alias for backend operations.
pub type BackendResult<T> = Result<T, RenderError>;

/// Everything the scene core needs from a GPU.
pub trait GraphicsBackend {
    /// Width / height of the visible framebuffer.
    fn viewport_aspect(&self) -> f32;

    /// Create a buffer initialized with `desc.contents`.
    fn create_buffer(
        &mut self,
        desc: &BufferDesc<'_>,
    ) -> BackendResult<ResourceHandle>;

    /// Overwrite part of a buffer.
    fn write_buffer(
        &mut self,
        buffer: ResourceHandle,
        offset: u64,
        data: &[u8],
    ) -> BackendResult<()>;

    /// Create a sampled RGBA8 texture.
    fn create_texture(
        &mut self,
        desc: &TextureDesc<'_>,
    ) -> BackendResult<ResourceHandle>;

    /// Create a square depth-only render target that can later be sampled.
    fn create_depth_target(
        &mut self,
        label: &str,
        resolution: u32,
    ) -> BackendResult<ResourceHandle>;

    /// Upload a surface mesh.
    fn create_mesh(&mut self, mesh: &MeshData<'_>)
        -> BackendResult<ResourceHandle>;

    /// Compile a billboard program.
    fn create_program(
        &mut self,
        desc: &ProgramDesc<'_>,
    ) -> BackendResult<ResourceHandle>;

    /// Free a resource. Releasing an unknown handle is an error so that a
    /// double release is caught.
    fn release(&mut self, handle: ResourceHandle) -> BackendResult<()>;

    /// Start a frame (acquire the swapchain image).
    fn begin_frame(&mut self) -> BackendResult<()>;

    /// Submit the frame's work and present it.
    fn end_frame(&mut self) -> BackendResult<()>;

    /// Open the depth-only pass.
    fn begin_shadow_pass(
        &mut self,
        desc: &ShadowPassDesc,
    ) -> BackendResult<()>;

    /// Rasterize a renderable's depth into the open shadow pass.
    fn draw_shadow_caster(
        &mut self,
        renderable: &Renderable,
    ) -> BackendResult<()>;

    /// Close the depth-only pass.
    fn end_shadow_pass(&mut self) -> BackendResult<()>;

    /// Open the forward pass, clearing color and depth.
    fn begin_forward_pass(
        &mut self,
        desc: &ForwardPassDesc,
    ) -> BackendResult<()>;

    /// Draw a lit, shadowed renderable into the open forward pass.
    fn draw_renderable(&mut self, renderable: &Renderable)
        -> BackendResult<()>;

    /// Current fixed-function state.
    fn render_state(&self) -> RenderState;

    /// Replace the fixed-function state for subsequent draws.
    fn set_render_state(&mut self, state: RenderState);

    /// Draw `draw.vertex_count / 4` billboard quads into the open forward
    /// pass using the current render state.
    fn draw_billboards(&mut self, draw: &BillboardDraw) -> BackendResult<()>;

    /// Close the forward pass.
    fn end_forward_pass(&mut self) -> BackendResult<()>;
}
