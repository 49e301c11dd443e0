use glam::Mat4;

use super::{
    BackendResult, BillboardDraw, BufferDesc, BufferUsage, ForwardPassDesc,
    GraphicsBackend, MeshData, PassKind, ProgramDesc, RenderError,
    RenderState, Renderable, ShadowPassDesc, TextureDesc,
};
use crate::handle::{HandleStore, ResourceHandle, ResourceKind};

/// One recorded backend call.
#[derive(Debug, Clone, PartialEq)]
pub enum BackendCall {
    /// `create_buffer`.
    CreateBuffer {
        /// Returned handle.
        handle: ResourceHandle,
        /// Debug label.
        label: String,
        /// Binding role.
        usage: BufferUsage,
        /// Size in bytes.
        len: usize,
    },
    /// `write_buffer`.
    WriteBuffer {
        /// Target buffer.
        handle: ResourceHandle,
        /// Byte offset.
        offset: u64,
        /// Bytes written.
        len: usize,
    },
    /// `create_texture`.
    CreateTexture(ResourceHandle),
    /// `create_depth_target`.
    CreateDepthTarget {
        /// Returned handle.
        handle: ResourceHandle,
        /// Square resolution.
        resolution: u32,
    },
    /// `create_mesh`.
    CreateMesh(ResourceHandle),
    /// `create_program`.
    CreateProgram(ResourceHandle),
    /// `release`.
    Release(ResourceHandle),
    /// `begin_frame`.
    BeginFrame,
    /// `end_frame`.
    EndFrame,
    /// `begin_shadow_pass`.
    BeginShadowPass {
        /// Depth target.
        target: ResourceHandle,
        /// Light view-projection.
        light_view_proj: Mat4,
    },
    /// `draw_shadow_caster`.
    DrawShadowCaster(ResourceHandle),
    /// `end_shadow_pass`.
    EndShadowPass,
    /// `begin_forward_pass`.
    BeginForwardPass {
        /// Clear color.
        clear_color: [f32; 4],
        /// Shadow map consumed by the pass.
        shadow_map: ResourceHandle,
    },
    /// `draw_renderable`, with the state in effect.
    DrawRenderable {
        /// Mesh drawn.
        mesh: ResourceHandle,
        /// Render state at draw time.
        state: RenderState,
    },
    /// `set_render_state`.
    SetRenderState(RenderState),
    /// `draw_billboards`, with the state in effect.
    DrawBillboards {
        /// Quad vertices requested.
        vertex_count: u32,
        /// Position buffer bound to `particle_position`.
        positions: ResourceHandle,
        /// Texture unit `particle_texture` was bound to.
        texture_unit: u32,
        /// Render state at draw time.
        state: RenderState,
    },
    /// `end_forward_pass`.
    EndForwardPass,
}

/// Headless [`GraphicsBackend`] that validates the pass protocol and keeps
/// a log of every call.
///
/// Resource bytes are kept so callers can inspect uploads.
pub struct RecordingBackend {
    aspect: f32,
    resources: HandleStore<Vec<u8>>,
    calls: Vec<BackendCall>,
    state: RenderState,
    frame_open: bool,
    open_pass: Option<PassKind>,
    buffer_budget: Option<usize>,
}

impl Default for RecordingBackend {
    fn default() -> Self {
        Self::new(16.0 / 9.0)
    }
}

impl RecordingBackend {
    /// Backend reporting the given viewport aspect ratio.
    #[must_use]
    pub fn new(aspect: f32) -> Self {
        Self {
            aspect,
            resources: HandleStore::new(),
            calls: Vec::new(),
            state: RenderState::default(),
            frame_open: false,
            open_pass: None,
            buffer_budget: None,
        }
    }

    /// Let only `count` more `create_buffer` calls succeed.
    pub fn limit_buffers(&mut self, count: usize) {
        self.buffer_budget = Some(count);
    }

    /// Calls recorded so far, oldest first.
    #[must_use]
    pub fn calls(&self) -> &[BackendCall] {
        &self.calls
    }

    /// Forget recorded calls (resources stay live).
    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    /// Bytes currently stored for a buffer, texture or mesh.
    #[must_use]
    pub fn resource_bytes(&self, handle: ResourceHandle) -> Option<&[u8]> {
        self.resources.get(handle).ok().map(Vec::as_slice)
    }

    /// Number of live resources.
    #[must_use]
    pub fn live_resources(&self) -> usize {
        self.resources.len()
    }

    /// Pass currently open, if any.
    #[must_use]
    pub fn open_pass(&self) -> Option<PassKind> {
        self.open_pass
    }

    fn store(&mut self, kind: ResourceKind, bytes: Vec<u8>) -> ResourceHandle {
        self.resources.insert(kind, bytes)
    }

    fn begin_pass(&mut self, kind: PassKind) -> BackendResult<()> {
        if !self.frame_open {
            return Err(RenderError::NoFrameInProgress);
        }
        if let Some(open) = self.open_pass {
            return Err(RenderError::PassAlreadyOpen {
                open,
                requested: kind,
            });
        }
        self.open_pass = Some(kind);
        Ok(())
    }

    fn require_pass(&self, kind: PassKind) -> BackendResult<()> {
        if self.open_pass == Some(kind) {
            Ok(())
        } else {
            Err(RenderError::PassNotOpen(kind))
        }
    }

    fn end_pass(&mut self, kind: PassKind) -> BackendResult<()> {
        self.require_pass(kind)?;
        self.open_pass = None;
        Ok(())
    }

    fn require(
        &self,
        handle: ResourceHandle,
        kind: ResourceKind,
    ) -> BackendResult<()> {
        let _ = self.resources.get(handle.expect_kind(kind)?)?;
        Ok(())
    }
}

impl GraphicsBackend for RecordingBackend {
    fn viewport_aspect(&self) -> f32 {
        self.aspect
    }

    fn create_buffer(
        &mut self,
        desc: &BufferDesc<'_>,
    ) -> BackendResult<ResourceHandle> {
        if let Some(budget) = &mut self.buffer_budget {
            if *budget == 0 {
                return Err(RenderError::InvalidData(format!(
                    "no buffer budget left for '{}'",
                    desc.label
                )));
            }
            *budget -= 1;
        }
        let handle = self.store(ResourceKind::Buffer, desc.contents.to_vec());
        self.calls.push(BackendCall::CreateBuffer {
            handle,
            label: desc.label.to_owned(),
            usage: desc.usage,
            len: desc.contents.len(),
        });
        Ok(handle)
    }

    fn write_buffer(
        &mut self,
        buffer: ResourceHandle,
        offset: u64,
        data: &[u8],
    ) -> BackendResult<()> {
        let buffer = buffer.expect_kind(ResourceKind::Buffer)?;
        let bytes = self.resources.get_mut(buffer)?;
        let start = offset as usize;
        let end = start + data.len();
        if end > bytes.len() {
            return Err(RenderError::InvalidData(format!(
                "write of {} bytes at {offset} overruns {buffer} ({} bytes)",
                data.len(),
                bytes.len()
            )));
        }
        bytes[start..end].copy_from_slice(data);
        self.calls.push(BackendCall::WriteBuffer {
            handle: buffer,
            offset,
            len: data.len(),
        });
        Ok(())
    }

    fn create_texture(
        &mut self,
        desc: &TextureDesc<'_>,
    ) -> BackendResult<ResourceHandle> {
        let expected = (desc.width * desc.height * 4) as usize;
        if desc.rgba8.len() != expected {
            return Err(RenderError::InvalidData(format!(
                "texture '{}' has {} bytes, expected {expected}",
                desc.label,
                desc.rgba8.len()
            )));
        }
        let handle = self.store(ResourceKind::Texture, desc.rgba8.to_vec());
        self.calls.push(BackendCall::CreateTexture(handle));
        Ok(handle)
    }

    fn create_depth_target(
        &mut self,
        _label: &str,
        resolution: u32,
    ) -> BackendResult<ResourceHandle> {
        let handle = self.store(ResourceKind::DepthTarget, Vec::new());
        self.calls.push(BackendCall::CreateDepthTarget { handle, resolution });
        Ok(handle)
    }

    fn create_mesh(
        &mut self,
        mesh: &MeshData<'_>,
    ) -> BackendResult<ResourceHandle> {
        let handle = self.store(
            ResourceKind::Mesh,
            bytemuck::cast_slice(mesh.vertices).to_vec(),
        );
        self.calls.push(BackendCall::CreateMesh(handle));
        Ok(handle)
    }

    fn create_program(
        &mut self,
        desc: &ProgramDesc<'_>,
    ) -> BackendResult<ResourceHandle> {
        let handle =
            self.store(ResourceKind::Program, desc.source.as_bytes().to_vec());
        self.calls.push(BackendCall::CreateProgram(handle));
        Ok(handle)
    }

    fn release(&mut self, handle: ResourceHandle) -> BackendResult<()> {
        if self.resources.remove(handle).is_none() {
            return Err(RenderError::UnknownHandle(handle));
        }
        self.calls.push(BackendCall::Release(handle));
        Ok(())
    }

    fn begin_frame(&mut self) -> BackendResult<()> {
        if self.frame_open {
            return Err(RenderError::FrameAlreadyInProgress);
        }
        self.frame_open = true;
        self.calls.push(BackendCall::BeginFrame);
        Ok(())
    }

    fn end_frame(&mut self) -> BackendResult<()> {
        if !self.frame_open {
            return Err(RenderError::NoFrameInProgress);
        }
        if let Some(open) = self.open_pass {
            return Err(RenderError::PassAlreadyOpen {
                open,
                requested: open,
            });
        }
        self.frame_open = false;
        self.calls.push(BackendCall::EndFrame);
        Ok(())
    }

    fn begin_shadow_pass(
        &mut self,
        desc: &ShadowPassDesc,
    ) -> BackendResult<()> {
        self.require(desc.target, ResourceKind::DepthTarget)?;
        self.begin_pass(PassKind::Shadow)?;
        self.calls.push(BackendCall::BeginShadowPass {
            target: desc.target,
            light_view_proj: desc.light_view_proj,
        });
        Ok(())
    }

    fn draw_shadow_caster(
        &mut self,
        renderable: &Renderable,
    ) -> BackendResult<()> {
        self.require_pass(PassKind::Shadow)?;
        self.require(renderable.mesh, ResourceKind::Mesh)?;
        self.calls.push(BackendCall::DrawShadowCaster(renderable.mesh));
        Ok(())
    }

    fn end_shadow_pass(&mut self) -> BackendResult<()> {
        self.end_pass(PassKind::Shadow)?;
        self.calls.push(BackendCall::EndShadowPass);
        Ok(())
    }

    fn begin_forward_pass(
        &mut self,
        desc: &ForwardPassDesc,
    ) -> BackendResult<()> {
        self.require(desc.shadow_map, ResourceKind::DepthTarget)?;
        self.begin_pass(PassKind::Forward)?;
        self.calls.push(BackendCall::BeginForwardPass {
            clear_color: desc.clear_color,
            shadow_map: desc.shadow_map,
        });
        Ok(())
    }

    fn draw_renderable(
        &mut self,
        renderable: &Renderable,
    ) -> BackendResult<()> {
        self.require_pass(PassKind::Forward)?;
        self.require(renderable.mesh, ResourceKind::Mesh)?;
        self.calls.push(BackendCall::DrawRenderable {
            mesh: renderable.mesh,
            state: self.state,
        });
        Ok(())
    }

    fn render_state(&self) -> RenderState {
        self.state
    }

    fn set_render_state(&mut self, state: RenderState) {
        self.state = state;
        self.calls.push(BackendCall::SetRenderState(state));
    }

    fn draw_billboards(&mut self, draw: &BillboardDraw) -> BackendResult<()> {
        self.require_pass(PassKind::Forward)?;
        self.require(draw.program, ResourceKind::Program)?;
        self.require(draw.texture, ResourceKind::Texture)?;
        for buffer in [draw.corners, draw.uvs, draw.indices, draw.positions] {
            self.require(buffer, ResourceKind::Buffer)?;
        }
        if draw.vertex_count % 4 != 0 {
            return Err(RenderError::InvalidData(format!(
                "billboard vertex count {} is not a whole number of quads",
                draw.vertex_count
            )));
        }
        self.calls.push(BackendCall::DrawBillboards {
            vertex_count: draw.vertex_count,
            positions: draw.positions,
            texture_unit: draw.texture_unit,
            state: self.state,
        });
        Ok(())
    }

    fn end_forward_pass(&mut self) -> BackendResult<()> {
        self.end_pass(PassKind::Forward)?;
        self.calls.push(BackendCall::EndForwardPass);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn depth_target(backend: &mut RecordingBackend) -> ResourceHandle {
        backend.create_depth_target("shadow", 256).unwrap()
    }

    #[test]
    fn rejects_overlapping_passes() {
        let mut backend = RecordingBackend::default();
        let target = depth_target(&mut backend);
        backend.begin_frame().unwrap();
        backend
            .begin_shadow_pass(&ShadowPassDesc {
                target,
                light_view_proj: Mat4::IDENTITY,
            })
            .unwrap();
        let err = backend
            .begin_shadow_pass(&ShadowPassDesc {
                target,
                light_view_proj: Mat4::IDENTITY,
            })
            .unwrap_err();
        assert!(matches!(
            err,
            RenderError::PassAlreadyOpen {
                open: PassKind::Shadow,
                ..
            }
        ));
        assert!(backend.end_frame().is_err());
        backend.end_shadow_pass().unwrap();
        backend.end_frame().unwrap();
    }

    #[test]
    fn pass_requires_frame() {
        let mut backend = RecordingBackend::default();
        let target = depth_target(&mut backend);
        let err = backend
            .begin_shadow_pass(&ShadowPassDesc {
                target,
                light_view_proj: Mat4::IDENTITY,
            })
            .unwrap_err();
        assert!(matches!(err, RenderError::NoFrameInProgress));
    }

    #[test]
    fn write_buffer_updates_bytes_and_bounds() {
        let mut backend = RecordingBackend::default();
        let buffer = backend
            .create_buffer(&BufferDesc {
                label: "positions",
                usage: BufferUsage::Storage,
                contents: &[0; 8],
            })
            .unwrap();
        backend.write_buffer(buffer, 4, &[1, 2, 3, 4]).unwrap();
        assert_eq!(
            backend.resource_bytes(buffer),
            Some(&[0, 0, 0, 0, 1, 2, 3, 4][..])
        );
        assert!(backend.write_buffer(buffer, 6, &[9, 9, 9]).is_err());
    }

    #[test]
    fn double_release_is_an_error() {
        let mut backend = RecordingBackend::default();
        let target = depth_target(&mut backend);
        backend.release(target).unwrap();
        assert!(matches!(
            backend.release(target),
            Err(RenderError::UnknownHandle(_))
        ));
        assert_eq!(backend.live_resources(), 0);
    }
}
