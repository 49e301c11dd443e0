//! Host-side mirrors of the WGSL uniform structs.
//!
//! Layouts follow WGSL uniform address space rules: every struct is a
//! multiple of 16 bytes and vectors are padded to `vec4`.

use glam::Mat4;

use crate::backend::{ForwardPassDesc, LightingDesc, Renderable};

/// `metaballs::camera::CameraUniform`.
#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    /// Projection * view.
    pub view_proj: [[f32; 4]; 4],
    /// World-space camera position (w unused).
    pub eye: [f32; 4],
}

impl CameraUniform {
    /// Camera block for a forward pass.
    #[must_use]
    pub fn from_pass(desc: &ForwardPassDesc) -> Self {
        Self {
            view_proj: (desc.proj * desc.view).to_cols_array_2d(),
            eye: desc.eye.extend(1.0).to_array(),
        }
    }
}

/// `metaballs::lighting::LightUniform`.
#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LightUniform {
    /// Light view-projection.
    pub view_proj: [[f32; 4]; 4],
    /// World-space position (w unused).
    pub position: [f32; 4],
    /// Ambient color (a unused).
    pub ambient: [f32; 4],
    /// Diffuse color (a unused).
    pub diffuse: [f32; 4],
    /// Constant depth bias.
    pub depth_bias: f32,
    /// One shadow-map texel in UV units.
    pub texel_size: f32,
    _pad: [f32; 2],
}

impl LightUniform {
    /// Light block for the forward pass.
    #[must_use]
    pub fn from_lighting(
        lighting: &LightingDesc,
        shadow_resolution: u32,
    ) -> Self {
        Self {
            view_proj: lighting.view_proj.to_cols_array_2d(),
            position: lighting.position.extend(1.0).to_array(),
            ambient: lighting.ambient.extend(1.0).to_array(),
            diffuse: lighting.diffuse.extend(1.0).to_array(),
            depth_bias: lighting.depth_bias,
            texel_size: 1.0 / shadow_resolution.max(1) as f32,
            _pad: [0.0; 2],
        }
    }

    /// Light block for the shadow pass, where only `view_proj` is read.
    #[must_use]
    pub fn depth_only(view_proj: Mat4) -> Self {
        Self {
            view_proj: view_proj.to_cols_array_2d(),
            position: [0.0; 4],
            ambient: [0.0; 4],
            diffuse: [0.0; 4],
            depth_bias: 0.0,
            texel_size: 0.0,
            _pad: [0.0; 2],
        }
    }
}

/// `metaballs::lighting::ObjectUniform`.
#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ObjectUniform {
    /// Object-to-world transform.
    pub model: [[f32; 4]; 4],
    /// rgb = base color, a = specular.
    pub material: [f32; 4],
    /// Specular exponent.
    pub glossiness: f32,
    _pad: [f32; 3],
}

impl From<&Renderable> for ObjectUniform {
    fn from(renderable: &Renderable) -> Self {
        let material = renderable.material;
        Self {
            model: renderable.transform.to_cols_array_2d(),
            material: material.base_color.extend(material.specular).to_array(),
            glossiness: material.glossiness,
            _pad: [0.0; 3],
        }
    }
}

/// `ParticleUniform` in `particles.wgsl`.
#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ParticleUniform {
    /// `proj_matrix`.
    pub proj_matrix: [[f32; 4]; 4],
    /// `view_matrix`.
    pub view_matrix: [[f32; 4]; 4],
    /// Billboard half-extent.
    pub particle_size: f32,
    _pad: [f32; 3],
}

impl ParticleUniform {
    /// Billboard uniforms for one draw.
    #[must_use]
    pub fn new(view: Mat4, proj: Mat4, particle_size: f32) -> Self {
        Self {
            proj_matrix: proj.to_cols_array_2d(),
            view_matrix: view.to_cols_array_2d(),
            particle_size,
            _pad: [0.0; 3],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sizes_match_wgsl_layouts() {
        assert_eq!(size_of::<CameraUniform>(), 80);
        assert_eq!(size_of::<LightUniform>(), 128);
        assert_eq!(size_of::<ObjectUniform>(), 96);
        assert_eq!(size_of::<ParticleUniform>(), 144);
        for size in [
            size_of::<CameraUniform>(),
            size_of::<LightUniform>(),
            size_of::<ObjectUniform>(),
            size_of::<ParticleUniform>(),
        ] {
            assert_eq!(size % 16, 0);
        }
    }
}
