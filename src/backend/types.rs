use glam::{Mat4, Vec3};

use crate::handle::ResourceHandle;

/// How a buffer is bound at draw time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferUsage {
    /// Per-vertex attribute stream.
    Vertex,
    /// `u32` index stream.
    Index,
    /// Read-only storage buffer visible to the vertex stage.
    Storage,
}

/// Buffer creation request. `contents` fixes the buffer size.
#[derive(Debug, Clone, Copy)]
pub struct BufferDesc<'a> {
    /// Debug label.
    pub label: &'a str,
    /// Binding role.
    pub usage: BufferUsage,
    /// Initial bytes.
    pub contents: &'a [u8],
}

/// RGBA8 texture creation request.
#[derive(Debug, Clone, Copy)]
pub struct TextureDesc<'a> {
    /// Debug label.
    pub label: &'a str,
    /// Width in texels.
    pub width: u32,
    /// Height in texels.
    pub height: u32,
    /// Tightly packed RGBA8 texels, `width * height * 4` bytes.
    pub rgba8: &'a [u8],
}

/// Vertex layout shared by every surface mesh.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MeshVertex {
    /// Object-space position.
    pub position: [f32; 3],
    /// Object-space normal.
    pub normal: [f32; 3],
    /// Texture coordinate.
    pub uv: [f32; 2],
}

/// Mesh creation request.
#[derive(Debug, Clone, Copy)]
pub struct MeshData<'a> {
    /// Debug label.
    pub label: &'a str,
    /// Vertex stream.
    pub vertices: &'a [MeshVertex],
    /// Triangle-list indices into `vertices`.
    pub indices: &'a [u32],
}

/// Billboard shader program source. Must expose `vs_main` / `fs_main` and
/// the `particle_texture`, `proj_matrix`, `view_matrix` and
/// `particle_position` slots.
#[derive(Debug, Clone, Copy)]
pub struct ProgramDesc<'a> {
    /// Debug label.
    pub label: &'a str,
    /// WGSL source, may use `#import metaballs::...`.
    pub source: &'a str,
    /// Logical file path used in composer diagnostics.
    pub file_path: &'a str,
}

/// Color blending applied to subsequent draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BlendMode {
    /// Overwrite the destination.
    #[default]
    Disabled,
    /// `dst + src`, so overlapping draws accumulate brightness.
    Additive,
    /// Standard premultiplied-free alpha blending.
    Alpha,
}

/// Fixed-function state applied to subsequent draws in a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RenderState {
    /// Depth test and depth writes.
    pub depth_test: bool,
    /// Color blend mode.
    pub blend: BlendMode,
}

impl Default for RenderState {
    fn default() -> Self {
        Self::OPAQUE
    }
}

impl RenderState {
    /// Pass default: depth tested, no blending.
    pub const OPAQUE: Self = Self {
        depth_test: true,
        blend: BlendMode::Disabled,
    };

    /// Particle state: no depth test, additive blending.
    pub const ADDITIVE_OVERLAY: Self = Self {
        depth_test: false,
        blend: BlendMode::Additive,
    };
}

/// Surface shading parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    /// Diffuse albedo.
    pub base_color: Vec3,
    /// Specular intensity.
    pub specular: f32,
    /// Specular exponent.
    pub glossiness: f32,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            base_color: Vec3::splat(0.8),
            specular: 0.2,
            glossiness: 16.0,
        }
    }
}

/// A mesh drawn with a material at a world transform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Renderable {
    /// Mesh handle.
    pub mesh: ResourceHandle,
    /// Surface material.
    pub material: Material,
    /// Object-to-world transform.
    pub transform: Mat4,
}

/// Shadow pass parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadowPassDesc {
    /// Depth target that receives the light-space depth.
    pub target: ResourceHandle,
    /// Light view-projection matrix.
    pub light_view_proj: Mat4,
}

/// Light inputs to the forward pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightingDesc {
    /// World-space light position.
    pub position: Vec3,
    /// Ambient color.
    pub ambient: Vec3,
    /// Diffuse color.
    pub diffuse: Vec3,
    /// Light view-projection used to look up the shadow map.
    pub view_proj: Mat4,
    /// Constant bias subtracted from the light-space depth.
    pub depth_bias: f32,
}

/// Forward pass parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForwardPassDesc {
    /// Framebuffer clear color (RGBA).
    pub clear_color: [f32; 4],
    /// Camera view matrix.
    pub view: Mat4,
    /// Camera projection matrix.
    pub proj: Mat4,
    /// Camera world position.
    pub eye: Vec3,
    /// Light inputs.
    pub lighting: LightingDesc,
    /// Shadow depth produced by this frame's shadow pass.
    pub shadow_map: ResourceHandle,
}

/// One billboard batch draw.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BillboardDraw {
    /// Billboard program.
    pub program: ResourceHandle,
    /// Texture bound to `particle_texture`.
    pub texture: ResourceHandle,
    /// Texture unit `particle_texture` samples from.
    pub texture_unit: u32,
    /// `view_matrix` uniform.
    pub view: Mat4,
    /// `proj_matrix` uniform.
    pub proj: Mat4,
    /// World-space half-extent of each quad.
    pub particle_size: f32,
    /// Quad template corner offsets (vec3 per vertex).
    pub corners: ResourceHandle,
    /// Quad template texture coordinates (vec2 per vertex).
    pub uvs: ResourceHandle,
    /// Quad-to-triangle index buffer.
    pub indices: ResourceHandle,
    /// Per-slot particle positions (vec4 per slot), bound to
    /// `particle_position`.
    pub positions: ResourceHandle,
    /// Quad vertices to draw, always a multiple of four.
    pub vertex_count: u32,
}
