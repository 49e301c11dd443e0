//! [`GraphicsBackend`] on top of wgpu.
//!
//! Handles resolve through a [`HandleStore`] of GPU objects. The active
//! render pass is kept between `begin_*` and `end_*` with its lifetime
//! detached from the frame encoder, and pipeline variants are built the
//! first time a (program, render state) pair is drawn.

use rustc_hash::FxHashMap;
use wgpu::util::DeviceExt;

use crate::backend::{
    BackendResult, BillboardDraw, BufferDesc, BufferUsage, ForwardPassDesc,
    GraphicsBackend, MeshData, PassKind, ProgramDesc, RenderError, RenderState,
    Renderable, ShadowPassDesc, TextureDesc,
};
use crate::gpu::pipeline_helpers::{
    self, billboard_vertex_layouts, comparison_sampler, create_pipeline,
    depth_texture_2d, filtering_sampler, mesh_vertex_layout, read_only_storage,
    texture_2d, uniform_buffer, PipelineSpec,
};
use crate::gpu::render_context::RenderContext;
use crate::gpu::shader_composer::{ShaderComposer, SHADOW_WGSL, SURFACE_WGSL};
use crate::gpu::texture::{DepthTexture, SampledTexture};
use crate::gpu::uniforms::{
    CameraUniform, LightUniform, ObjectUniform, ParticleUniform,
};
use crate::handle::{HandleStore, ResourceHandle, ResourceKind};

/// Pipeline-cache key of the built-in surface shader. Handle ids start at
/// 1, so 0 never collides with a program handle.
const SURFACE_PROGRAM: u64 = 0;

/// Indices emitted per quad (two triangles).
const INDICES_PER_QUAD: u32 = 6;

/// Bytes per `particle_position` slot (`vec4<f32>`).
const POSITION_STRIDE: u64 = 16;

enum GpuResource {
    Buffer(wgpu::Buffer),
    Texture(SampledTexture),
    DepthTarget(DepthTexture),
    Mesh {
        vertices: wgpu::Buffer,
        indices: wgpu::Buffer,
        index_count: u32,
    },
    Program(wgpu::ShaderModule),
}

fn buffer(
    resources: &HandleStore<GpuResource>,
    handle: ResourceHandle,
) -> BackendResult<&wgpu::Buffer> {
    match resources.get(handle.expect_kind(ResourceKind::Buffer)?)? {
        GpuResource::Buffer(buffer) => Ok(buffer),
        _ => Err(RenderError::UnknownHandle(handle)),
    }
}

fn texture(
    resources: &HandleStore<GpuResource>,
    handle: ResourceHandle,
) -> BackendResult<&SampledTexture> {
    match resources.get(handle.expect_kind(ResourceKind::Texture)?)? {
        GpuResource::Texture(texture) => Ok(texture),
        _ => Err(RenderError::UnknownHandle(handle)),
    }
}

fn depth_target(
    resources: &HandleStore<GpuResource>,
    handle: ResourceHandle,
) -> BackendResult<&DepthTexture> {
    match resources.get(handle.expect_kind(ResourceKind::DepthTarget)?)? {
        GpuResource::DepthTarget(depth) => Ok(depth),
        _ => Err(RenderError::UnknownHandle(handle)),
    }
}

fn program(
    resources: &HandleStore<GpuResource>,
    handle: ResourceHandle,
) -> BackendResult<&wgpu::ShaderModule> {
    match resources.get(handle.expect_kind(ResourceKind::Program)?)? {
        GpuResource::Program(module) => Ok(module),
        _ => Err(RenderError::UnknownHandle(handle)),
    }
}

struct UniformSlot {
    buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

/// Per-draw uniform buffers, reused frame to frame. Each draw in a frame
/// gets its own slot so queued writes never overwrite one another before
/// submission.
struct UniformPool {
    label: &'static str,
    size: u64,
    slots: Vec<UniformSlot>,
    next: usize,
}

impl UniformPool {
    fn new(label: &'static str, size: usize) -> Self {
        Self {
            label,
            size: size as u64,
            slots: Vec::new(),
            next: 0,
        }
    }

    fn reset(&mut self) {
        self.next = 0;
    }

    fn acquire(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        layout: &wgpu::BindGroupLayout,
        data: &[u8],
    ) -> &UniformSlot {
        if self.next == self.slots.len() {
            let buffer = device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(self.label),
                size: self.size,
                usage: wgpu::BufferUsages::UNIFORM
                    | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            });
            let bind_group =
                device.create_bind_group(&wgpu::BindGroupDescriptor {
                    label: Some(self.label),
                    layout,
                    entries: &[wgpu::BindGroupEntry {
                        binding: 0,
                        resource: buffer.as_entire_binding(),
                    }],
                });
            self.slots.push(UniformSlot { buffer, bind_group });
        }
        let slot = &self.slots[self.next];
        self.next += 1;
        queue.write_buffer(&slot.buffer, 0, data);
        slot
    }
}

struct Layouts {
    /// Forward group 0: camera + light.
    frame: wgpu::BindGroupLayout,
    /// Shadow group 0: light view-projection.
    shadow_light: wgpu::BindGroupLayout,
    /// Forward group 1: shadow map + comparison sampler.
    shadow_map: wgpu::BindGroupLayout,
    /// Shadow group 1 / forward group 2: per-object uniform.
    object: wgpu::BindGroupLayout,
    /// Billboard group 0: `proj_matrix`, `view_matrix`, size.
    particle: wgpu::BindGroupLayout,
    /// Billboard group 1: `particle_texture` + sampler.
    particle_texture: wgpu::BindGroupLayout,
    /// Billboard group 2: `particle_position` storage.
    particle_position: wgpu::BindGroupLayout,
}

impl Layouts {
    fn new(device: &wgpu::Device) -> Self {
        let layout = |label: &str, entries: &[wgpu::BindGroupLayoutEntry]| {
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some(label),
                entries,
            })
        };
        let vs_fs = wgpu::ShaderStages::VERTEX_FRAGMENT;
        Self {
            frame: layout(
                "Frame Layout",
                &[uniform_buffer(0, vs_fs), uniform_buffer(1, vs_fs)],
            ),
            shadow_light: layout(
                "Shadow Light Layout",
                &[uniform_buffer(0, wgpu::ShaderStages::VERTEX)],
            ),
            shadow_map: layout(
                "Shadow Map Layout",
                &[depth_texture_2d(0), comparison_sampler(1)],
            ),
            object: layout("Object Layout", &[uniform_buffer(0, vs_fs)]),
            particle: layout(
                "Particle Layout",
                &[uniform_buffer(0, wgpu::ShaderStages::VERTEX)],
            ),
            particle_texture: layout(
                "Particle Texture Layout",
                &[texture_2d(0), filtering_sampler(1)],
            ),
            particle_position: layout(
                "Particle Position Layout",
                &[read_only_storage(0)],
            ),
        }
    }
}

struct ActivePass {
    kind: PassKind,
    pass: wgpu::RenderPass<'static>,
    /// Shadow map sampled by a forward pass.
    shadow_map: Option<u64>,
}

struct Frame {
    surface_texture: wgpu::SurfaceTexture,
    view: wgpu::TextureView,
    encoder: wgpu::CommandEncoder,
    pass: Option<ActivePass>,
}

impl Frame {
    fn open_pass(&mut self, kind: PassKind) -> BackendResult<&mut ActivePass> {
        match self.pass.as_mut() {
            Some(active) if active.kind == kind => Ok(active),
            _ => Err(RenderError::PassNotOpen(kind)),
        }
    }

    fn ensure_closed(&self, requested: PassKind) -> BackendResult<()> {
        match &self.pass {
            Some(active) => Err(RenderError::PassAlreadyOpen {
                open: active.kind,
                requested,
            }),
            None => Ok(()),
        }
    }
}

/// wgpu implementation of [`GraphicsBackend`].
pub struct WgpuBackend {
    context: RenderContext,
    composer: ShaderComposer,
    resources: HandleStore<GpuResource>,
    layouts: Layouts,

    surface_module: wgpu::ShaderModule,
    shadow_pipeline: wgpu::RenderPipeline,
    pipelines: FxHashMap<(u64, RenderState), wgpu::RenderPipeline>,

    scene_depth: DepthTexture,
    color_sampler: wgpu::Sampler,
    shadow_sampler: wgpu::Sampler,

    camera_buffer: wgpu::Buffer,
    light_buffer: wgpu::Buffer,
    frame_group: wgpu::BindGroup,
    shadow_light_buffer: wgpu::Buffer,
    shadow_light_group: wgpu::BindGroup,

    shadow_map_groups: FxHashMap<u64, wgpu::BindGroup>,
    texture_groups: FxHashMap<u64, wgpu::BindGroup>,
    position_groups: FxHashMap<u64, wgpu::BindGroup>,

    objects: UniformPool,
    particles: UniformPool,

    frame: Option<Frame>,
    state: RenderState,
}

impl WgpuBackend {
    /// Build the backend's fixed pipelines and uniforms on an initialized
    /// context.
    ///
    /// # Errors
    ///
    /// [`RenderError::Program`] if a bundled shader fails to compose.
    pub fn new(context: RenderContext) -> BackendResult<Self> {
        let mut composer = ShaderComposer::new()?;
        let device = &context.device;
        let layouts = Layouts::new(device);

        let shadow_module = composer.compose(
            device,
            "Shadow Shader",
            SHADOW_WGSL,
            "shadow.wgsl",
        )?;
        let surface_module = composer.compose(
            device,
            "Surface Shader",
            SURFACE_WGSL,
            "surface.wgsl",
        )?;

        let mesh_layout = [mesh_vertex_layout()];
        let shadow_pipeline = create_pipeline(
            device,
            &PipelineSpec {
                label: "Shadow",
                shader: &shadow_module,
                buffers: &mesh_layout,
                bind_group_layouts: &[&layouts.shadow_light, &layouts.object],
                color_format: None,
                state: RenderState::OPAQUE,
                depth_bias: wgpu::DepthBiasState {
                    constant: 2,
                    slope_scale: 2.0,
                    clamp: 0.0,
                },
            },
        );

        let uniform = |label: &str, size: usize| {
            device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(label),
                size: size as u64,
                usage: wgpu::BufferUsages::UNIFORM
                    | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            })
        };
        let camera_buffer =
            uniform("Camera Uniform", size_of::<CameraUniform>());
        let light_buffer = uniform("Light Uniform", size_of::<LightUniform>());
        let shadow_light_buffer =
            uniform("Shadow Light Uniform", size_of::<LightUniform>());

        let frame_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Frame Bind Group"),
            layout: &layouts.frame,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: camera_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: light_buffer.as_entire_binding(),
                },
            ],
        });
        let shadow_light_group =
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("Shadow Light Bind Group"),
                layout: &layouts.shadow_light,
                entries: &[wgpu::BindGroupEntry {
                    binding: 0,
                    resource: shadow_light_buffer.as_entire_binding(),
                }],
            });

        let scene_depth = DepthTexture::new(
            device,
            "Scene Depth",
            context.config.width,
            context.config.height,
        );
        let color_sampler =
            pipeline_helpers::linear_sampler(device, "Particle Sampler");
        let shadow_sampler =
            pipeline_helpers::shadow_sampler(device, "Shadow Sampler");

        Ok(Self {
            composer,
            resources: HandleStore::new(),
            layouts,
            surface_module,
            shadow_pipeline,
            pipelines: FxHashMap::default(),
            scene_depth,
            color_sampler,
            shadow_sampler,
            camera_buffer,
            light_buffer,
            frame_group,
            shadow_light_buffer,
            shadow_light_group,
            shadow_map_groups: FxHashMap::default(),
            texture_groups: FxHashMap::default(),
            position_groups: FxHashMap::default(),
            objects: UniformPool::new(
                "Object Uniform",
                size_of::<ObjectUniform>(),
            ),
            particles: UniformPool::new(
                "Particle Uniform",
                size_of::<ParticleUniform>(),
            ),
            frame: None,
            state: RenderState::default(),
            context,
        })
    }

    /// The underlying render context.
    #[must_use]
    pub fn context(&self) -> &RenderContext {
        &self.context
    }

    /// Reconfigure the surface and scene depth for a new window size.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.context.resize(width, height);
        self.scene_depth = DepthTexture::new(
            &self.context.device,
            "Scene Depth",
            width,
            height,
        );
    }

    fn frame_mut(&mut self) -> BackendResult<&mut Frame> {
        self.frame.as_mut().ok_or(RenderError::NoFrameInProgress)
    }

    fn create_gpu_buffer(
        &self,
        label: &str,
        contents: &[u8],
        usage: wgpu::BufferUsages,
    ) -> wgpu::Buffer {
        // Zero-sized buffers cannot be bound.
        let padding = [0_u8; 16];
        let contents = if contents.is_empty() {
            &padding[..]
        } else {
            contents
        };
        self.context
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents,
                usage: usage | wgpu::BufferUsages::COPY_DST,
            })
    }
}

impl GraphicsBackend for WgpuBackend {
    fn viewport_aspect(&self) -> f32 {
        self.context.aspect()
    }

    fn create_buffer(
        &mut self,
        desc: &BufferDesc<'_>,
    ) -> BackendResult<ResourceHandle> {
        let usage = match desc.usage {
            BufferUsage::Vertex => wgpu::BufferUsages::VERTEX,
            BufferUsage::Index => wgpu::BufferUsages::INDEX,
            BufferUsage::Storage => wgpu::BufferUsages::STORAGE,
        };
        let buffer = self.create_gpu_buffer(desc.label, desc.contents, usage);
        Ok(self
            .resources
            .insert(ResourceKind::Buffer, GpuResource::Buffer(buffer)))
    }

    fn write_buffer(
        &mut self,
        handle: ResourceHandle,
        offset: u64,
        data: &[u8],
    ) -> BackendResult<()> {
        let target = buffer(&self.resources, handle)?;
        let len = data.len() as u64;
        if offset + len > target.size() {
            return Err(RenderError::InvalidData(format!(
                "write of {len} bytes at {offset} overruns {handle} ({} bytes)",
                target.size()
            )));
        }
        let align = wgpu::COPY_BUFFER_ALIGNMENT;
        if offset % align != 0 || len % align != 0 {
            return Err(RenderError::InvalidData(format!(
                "write to {handle} is not {align}-byte aligned"
            )));
        }
        self.context.queue.write_buffer(target, offset, data);
        Ok(())
    }

    fn create_texture(
        &mut self,
        desc: &TextureDesc<'_>,
    ) -> BackendResult<ResourceHandle> {
        let expected = (desc.width * desc.height * 4) as usize;
        if desc.width == 0 || desc.height == 0 || desc.rgba8.len() != expected {
            return Err(RenderError::InvalidData(format!(
                "texture '{}' is {}x{} with {} bytes",
                desc.label,
                desc.width,
                desc.height,
                desc.rgba8.len()
            )));
        }
        let texture = SampledTexture::from_rgba8(
            &self.context.device,
            &self.context.queue,
            desc.label,
            desc.width,
            desc.height,
            desc.rgba8,
        );
        Ok(self
            .resources
            .insert(ResourceKind::Texture, GpuResource::Texture(texture)))
    }

    fn create_depth_target(
        &mut self,
        label: &str,
        resolution: u32,
    ) -> BackendResult<ResourceHandle> {
        let depth = DepthTexture::new(
            &self.context.device,
            label,
            resolution,
            resolution,
        );
        Ok(self
            .resources
            .insert(ResourceKind::DepthTarget, GpuResource::DepthTarget(depth)))
    }

    fn create_mesh(
        &mut self,
        mesh: &MeshData<'_>,
    ) -> BackendResult<ResourceHandle> {
        if mesh.vertices.is_empty() || mesh.indices.is_empty() {
            return Err(RenderError::InvalidData(format!(
                "mesh '{}' has no geometry",
                mesh.label
            )));
        }
        let vertex_count = mesh.vertices.len() as u32;
        if let Some(bad) = mesh.indices.iter().find(|&&i| i >= vertex_count) {
            return Err(RenderError::InvalidData(format!(
                "mesh '{}' index {bad} out of range ({vertex_count} vertices)",
                mesh.label
            )));
        }
        let vertices = self.create_gpu_buffer(
            mesh.label,
            bytemuck::cast_slice(mesh.vertices),
            wgpu::BufferUsages::VERTEX,
        );
        let indices = self.create_gpu_buffer(
            mesh.label,
            bytemuck::cast_slice(mesh.indices),
            wgpu::BufferUsages::INDEX,
        );
        Ok(self.resources.insert(
            ResourceKind::Mesh,
            GpuResource::Mesh {
                vertices,
                indices,
                index_count: mesh.indices.len() as u32,
            },
        ))
    }

    fn create_program(
        &mut self,
        desc: &ProgramDesc<'_>,
    ) -> BackendResult<ResourceHandle> {
        let module = self.composer.compose(
            &self.context.device,
            desc.label,
            desc.source,
            desc.file_path,
        )?;
        Ok(self
            .resources
            .insert(ResourceKind::Program, GpuResource::Program(module)))
    }

    fn release(&mut self, handle: ResourceHandle) -> BackendResult<()> {
        if self.resources.remove(handle).is_none() {
            return Err(RenderError::UnknownHandle(handle));
        }
        let id = handle.id();
        let _ = self.shadow_map_groups.remove(&id);
        let _ = self.texture_groups.remove(&id);
        let _ = self.position_groups.remove(&id);
        self.pipelines.retain(|(program, _), _| *program != id);
        Ok(())
    }

    fn begin_frame(&mut self) -> BackendResult<()> {
        if self.frame.is_some() {
            return Err(RenderError::FrameAlreadyInProgress);
        }
        let surface_texture = match self.context.get_next_frame() {
            Ok(texture) => texture,
            Err(
                e @ (wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated),
            ) => {
                self.context.reconfigure();
                return Err(e.into());
            }
            Err(e) => return Err(e.into()),
        };
        let view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        self.objects.reset();
        self.particles.reset();
        self.frame = Some(Frame {
            surface_texture,
            view,
            encoder: self.context.create_encoder(),
            pass: None,
        });
        Ok(())
    }

    fn end_frame(&mut self) -> BackendResult<()> {
        if let Some(active) = self.frame_mut()?.pass.as_ref() {
            return Err(RenderError::PassAlreadyOpen {
                open: active.kind,
                requested: active.kind,
            });
        }
        let Some(frame) = self.frame.take() else {
            return Err(RenderError::NoFrameInProgress);
        };
        self.context.submit(frame.encoder);
        frame.surface_texture.present();
        Ok(())
    }

    fn begin_shadow_pass(
        &mut self,
        desc: &ShadowPassDesc,
    ) -> BackendResult<()> {
        let Some(frame) = self.frame.as_mut() else {
            return Err(RenderError::NoFrameInProgress);
        };
        frame.ensure_closed(PassKind::Shadow)?;
        let target = depth_target(&self.resources, desc.target)?;

        self.context.queue.write_buffer(
            &self.shadow_light_buffer,
            0,
            bytemuck::bytes_of(&LightUniform::depth_only(desc.light_view_proj)),
        );

        let mut pass = frame
            .encoder
            .begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Shadow Pass"),
                color_attachments: &[],
                depth_stencil_attachment: Some(
                    wgpu::RenderPassDepthStencilAttachment {
                        view: &target.view,
                        depth_ops: Some(wgpu::Operations {
                            load: wgpu::LoadOp::Clear(1.0),
                            store: wgpu::StoreOp::Store,
                        }),
                        stencil_ops: None,
                    },
                ),
                timestamp_writes: None,
                occlusion_query_set: None,
            })
            .forget_lifetime();
        pass.set_pipeline(&self.shadow_pipeline);
        pass.set_bind_group(0, &self.shadow_light_group, &[]);

        frame.pass = Some(ActivePass {
            kind: PassKind::Shadow,
            pass,
            shadow_map: None,
        });
        Ok(())
    }

    fn draw_shadow_caster(
        &mut self,
        renderable: &Renderable,
    ) -> BackendResult<()> {
        let Some(frame) = self.frame.as_mut() else {
            return Err(RenderError::NoFrameInProgress);
        };
        let active = frame.open_pass(PassKind::Shadow)?;
        let mesh = renderable.mesh.expect_kind(ResourceKind::Mesh)?;
        let GpuResource::Mesh {
            vertices,
            indices,
            index_count,
        } = self.resources.get(mesh)?
        else {
            return Err(RenderError::UnknownHandle(renderable.mesh));
        };

        let slot = self.objects.acquire(
            &self.context.device,
            &self.context.queue,
            &self.layouts.object,
            bytemuck::bytes_of(&ObjectUniform::from(renderable)),
        );
        let pass = &mut active.pass;
        pass.set_bind_group(1, &slot.bind_group, &[]);
        pass.set_vertex_buffer(0, vertices.slice(..));
        pass.set_index_buffer(indices.slice(..), wgpu::IndexFormat::Uint32);
        pass.draw_indexed(0..*index_count, 0, 0..1);
        Ok(())
    }

    fn end_shadow_pass(&mut self) -> BackendResult<()> {
        let frame = self.frame_mut()?;
        let _ = frame.open_pass(PassKind::Shadow)?;
        frame.pass = None;
        Ok(())
    }

    fn begin_forward_pass(
        &mut self,
        desc: &ForwardPassDesc,
    ) -> BackendResult<()> {
        let Some(frame) = self.frame.as_mut() else {
            return Err(RenderError::NoFrameInProgress);
        };
        frame.ensure_closed(PassKind::Forward)?;
        let shadow = depth_target(&self.resources, desc.shadow_map)?;

        let queue = &self.context.queue;
        queue.write_buffer(
            &self.camera_buffer,
            0,
            bytemuck::bytes_of(&CameraUniform::from_pass(desc)),
        );
        let light = LightUniform::from_lighting(&desc.lighting, shadow.width);
        queue.write_buffer(&self.light_buffer, 0, bytemuck::bytes_of(&light));

        let device = &self.context.device;
        let layout = &self.layouts.shadow_map;
        let sampler = &self.shadow_sampler;
        let _ = self
            .shadow_map_groups
            .entry(desc.shadow_map.id())
            .or_insert_with(|| {
                device.create_bind_group(&wgpu::BindGroupDescriptor {
                    label: Some("Shadow Map Bind Group"),
                    layout,
                    entries: &[
                        wgpu::BindGroupEntry {
                            binding: 0,
                            resource: wgpu::BindingResource::TextureView(
                                &shadow.view,
                            ),
                        },
                        wgpu::BindGroupEntry {
                            binding: 1,
                            resource: wgpu::BindingResource::Sampler(sampler),
                        },
                    ],
                })
            });

        let [r, g, b, a] = desc.clear_color;
        let pass = frame
            .encoder
            .begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Forward Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &frame.view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: f64::from(r),
                            g: f64::from(g),
                            b: f64::from(b),
                            a: f64::from(a),
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(
                    wgpu::RenderPassDepthStencilAttachment {
                        view: &self.scene_depth.view,
                        depth_ops: Some(wgpu::Operations {
                            load: wgpu::LoadOp::Clear(1.0),
                            store: wgpu::StoreOp::Store,
                        }),
                        stencil_ops: None,
                    },
                ),
                timestamp_writes: None,
                occlusion_query_set: None,
            })
            .forget_lifetime();

        frame.pass = Some(ActivePass {
            kind: PassKind::Forward,
            pass,
            shadow_map: Some(desc.shadow_map.id()),
        });
        Ok(())
    }

    fn draw_renderable(
        &mut self,
        renderable: &Renderable,
    ) -> BackendResult<()> {
        let Some(frame) = self.frame.as_mut() else {
            return Err(RenderError::NoFrameInProgress);
        };
        let active = frame.open_pass(PassKind::Forward)?;
        let mesh = renderable.mesh.expect_kind(ResourceKind::Mesh)?;
        let GpuResource::Mesh {
            vertices,
            indices,
            index_count,
        } = self.resources.get(mesh)?
        else {
            return Err(RenderError::UnknownHandle(renderable.mesh));
        };
        let shadow_group = active
            .shadow_map
            .and_then(|id| self.shadow_map_groups.get(&id))
            .ok_or(RenderError::PassNotOpen(PassKind::Forward))?;

        let device = &self.context.device;
        let layouts = &self.layouts;
        let module = &self.surface_module;
        let format = self.context.format();
        let state = self.state;
        let pipeline = self
            .pipelines
            .entry((SURFACE_PROGRAM, state))
            .or_insert_with(|| {
                create_pipeline(
                    device,
                    &PipelineSpec {
                        label: "Surface",
                        shader: module,
                        buffers: &[mesh_vertex_layout()],
                        bind_group_layouts: &[
                            &layouts.frame,
                            &layouts.shadow_map,
                            &layouts.object,
                        ],
                        color_format: Some(format),
                        state,
                        depth_bias: wgpu::DepthBiasState::default(),
                    },
                )
            });

        let slot = self.objects.acquire(
            device,
            &self.context.queue,
            &layouts.object,
            bytemuck::bytes_of(&ObjectUniform::from(renderable)),
        );
        let pass = &mut active.pass;
        pass.set_pipeline(pipeline);
        pass.set_bind_group(0, &self.frame_group, &[]);
        pass.set_bind_group(1, shadow_group, &[]);
        pass.set_bind_group(2, &slot.bind_group, &[]);
        pass.set_vertex_buffer(0, vertices.slice(..));
        pass.set_index_buffer(indices.slice(..), wgpu::IndexFormat::Uint32);
        pass.draw_indexed(0..*index_count, 0, 0..1);
        Ok(())
    }

    fn render_state(&self) -> RenderState {
        self.state
    }

    fn set_render_state(&mut self, state: RenderState) {
        self.state = state;
    }

    fn draw_billboards(&mut self, draw: &BillboardDraw) -> BackendResult<()> {
        let Some(frame) = self.frame.as_mut() else {
            return Err(RenderError::NoFrameInProgress);
        };
        let active = frame.open_pass(PassKind::Forward)?;
        if draw.vertex_count % 4 != 0 {
            return Err(RenderError::InvalidData(format!(
                "billboard vertex count {} is not a whole number of quads",
                draw.vertex_count
            )));
        }

        let module = program(&self.resources, draw.program)?;
        let particle_texture = texture(&self.resources, draw.texture)?;
        let corners = buffer(&self.resources, draw.corners)?;
        let uvs = buffer(&self.resources, draw.uvs)?;
        let indices = buffer(&self.resources, draw.indices)?;
        let positions = buffer(&self.resources, draw.positions)?;

        let quads = draw.vertex_count / 4;
        let index_count = quads * INDICES_PER_QUAD;
        if u64::from(index_count) * 4 > indices.size()
            || u64::from(quads) * POSITION_STRIDE > positions.size()
        {
            return Err(RenderError::InvalidData(format!(
                "billboard draw of {quads} quads exceeds its buffers"
            )));
        }
        if quads == 0 {
            return Ok(());
        }

        let device = &self.context.device;
        let layouts = &self.layouts;
        let format = self.context.format();
        let state = self.state;
        let pipeline = self
            .pipelines
            .entry((draw.program.id(), state))
            .or_insert_with(|| {
                create_pipeline(
                    device,
                    &PipelineSpec {
                        label: "Billboard",
                        shader: module,
                        buffers: &billboard_vertex_layouts(),
                        bind_group_layouts: &[
                            &layouts.particle,
                            &layouts.particle_texture,
                            &layouts.particle_position,
                        ],
                        color_format: Some(format),
                        state,
                        depth_bias: wgpu::DepthBiasState::default(),
                    },
                )
            });

        let sampler = &self.color_sampler;
        let texture_group = self
            .texture_groups
            .entry(draw.texture.id())
            .or_insert_with(|| {
                device.create_bind_group(&wgpu::BindGroupDescriptor {
                    label: Some("Particle Texture Bind Group"),
                    layout: &layouts.particle_texture,
                    entries: &[
                        wgpu::BindGroupEntry {
                            binding: 0,
                            resource: wgpu::BindingResource::TextureView(
                                &particle_texture.view,
                            ),
                        },
                        wgpu::BindGroupEntry {
                            binding: 1,
                            resource: wgpu::BindingResource::Sampler(sampler),
                        },
                    ],
                })
            });
        let position_group = self
            .position_groups
            .entry(draw.positions.id())
            .or_insert_with(|| {
                device.create_bind_group(&wgpu::BindGroupDescriptor {
                    label: Some("Particle Position Bind Group"),
                    layout: &layouts.particle_position,
                    entries: &[wgpu::BindGroupEntry {
                        binding: 0,
                        resource: positions.as_entire_binding(),
                    }],
                })
            });
        let uniform =
            ParticleUniform::new(draw.view, draw.proj, draw.particle_size);
        let slot = self.particles.acquire(
            device,
            &self.context.queue,
            &layouts.particle,
            bytemuck::bytes_of(&uniform),
        );

        let pass = &mut active.pass;
        pass.set_pipeline(pipeline);
        pass.set_bind_group(0, &slot.bind_group, &[]);
        pass.set_bind_group(1, &*texture_group, &[]);
        pass.set_bind_group(2, &*position_group, &[]);
        pass.set_vertex_buffer(0, corners.slice(..));
        pass.set_vertex_buffer(1, uvs.slice(..));
        pass.set_index_buffer(indices.slice(..), wgpu::IndexFormat::Uint32);
        pass.draw_indexed(0..index_count, 0, 0..1);
        Ok(())
    }

    fn end_forward_pass(&mut self) -> BackendResult<()> {
        let frame = self.frame_mut()?;
        let _ = frame.open_pass(PassKind::Forward)?;
        frame.pass = None;
        Ok(())
    }
}
