//! wgpu rendering backend.
//!
//! Provides wgpu device/surface initialization, shader composition, the
//! uniform layouts shared with WGSL, and [`WgpuBackend`](backend::WgpuBackend).

/// [`GraphicsBackend`](crate::backend::GraphicsBackend) implementation on wgpu.
pub mod backend;
/// Shared wgpu boilerplate for the scene's render pipelines.
pub mod pipeline_helpers;
/// wgpu device, surface, and queue initialization.
pub mod render_context;
/// WGSL shader composition with `#import` support via naga-oil.
pub mod shader_composer;
/// Depth targets and sampled textures.
pub mod texture;
/// Host-side uniform structs.
pub mod uniforms;
