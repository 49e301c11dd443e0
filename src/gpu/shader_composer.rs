use std::borrow::Cow;

use naga_oil::compose::{
    ComposableModuleDescriptor, Composer, NagaModuleDescriptor, ShaderLanguage,
    ShaderType,
};

use crate::backend::RenderError;

/// Depth-only pass from the light's viewpoint.
pub const SHADOW_WGSL: &str = include_str!("../../assets/shaders/shadow.wgsl");
/// Lit, shadowed surface shader for the forward pass.
pub const SURFACE_WGSL: &str =
    include_str!("../../assets/shaders/surface.wgsl");
/// Camera-facing particle billboards.
pub const PARTICLES_WGSL: &str =
    include_str!("../../assets/shaders/particles.wgsl");

/// Resolves `#import metaballs::camera` and `#import metaballs::lighting`
/// in program sources and hands wgpu the composed `naga::Module`.
pub struct ShaderComposer {
    composer: Composer,
}

/// Shared module definition: (source, file_path)
struct ModuleDef {
    source: &'static str,
    file_path: &'static str,
}

// Dependency order: modules with no imports first.
const MODULES: &[ModuleDef] = &[
    ModuleDef {
        source: include_str!("../../assets/shaders/modules/camera.wgsl"),
        file_path: "modules/camera.wgsl",
    },
    ModuleDef {
        source: include_str!("../../assets/shaders/modules/lighting.wgsl"),
        file_path: "modules/lighting.wgsl",
    },
];

impl ShaderComposer {
    /// Composer with every shared module registered.
    ///
    /// # Errors
    ///
    /// [`RenderError::Program`] if a shared module fails to parse.
    pub fn new() -> Result<Self, RenderError> {
        let mut composer = Composer::default();

        for m in MODULES {
            let _ = composer
                .add_composable_module(ComposableModuleDescriptor {
                    source: m.source,
                    file_path: m.file_path,
                    language: ShaderLanguage::Wgsl,
                    ..Default::default()
                })
                .map_err(|e| {
                    RenderError::Program(format!(
                        "failed to register shader module '{}': {e}",
                        m.file_path
                    ))
                })?;
        }

        Ok(Self { composer })
    }

    /// Compose `source` and create its shader module on `device`.
    ///
    /// # Errors
    ///
    /// [`RenderError::Program`] if composition fails.
    pub fn compose(
        &mut self,
        device: &wgpu::Device,
        label: &str,
        source: &str,
        file_path: &str,
    ) -> Result<wgpu::ShaderModule, RenderError> {
        let naga_module = self.compose_naga(source, file_path)?;

        Ok(device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(label),
            source: wgpu::ShaderSource::Naga(Cow::Owned(naga_module)),
        }))
    }

    /// Compose `source` to naga IR only.
    ///
    /// # Errors
    ///
    /// [`RenderError::Program`] if composition fails.
    pub fn compose_naga(
        &mut self,
        source: &str,
        file_path: &str,
    ) -> Result<naga::Module, RenderError> {
        self.composer
            .make_naga_module(NagaModuleDescriptor {
                source,
                file_path,
                shader_type: ShaderType::Wgsl,
                ..Default::default()
            })
            .map_err(|e| {
                RenderError::Program(format!(
                    "failed to compose shader '{file_path}': {e}"
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry_points(module: &naga::Module) -> Vec<&str> {
        module.entry_points.iter().map(|ep| ep.name.as_str()).collect()
    }

    #[test]
    fn bundled_programs_compose() {
        let mut composer = ShaderComposer::new().unwrap();
        for (source, file_path) in [
            (SHADOW_WGSL, "shadow.wgsl"),
            (SURFACE_WGSL, "surface.wgsl"),
            (PARTICLES_WGSL, "particles.wgsl"),
        ] {
            let module = composer
                .compose_naga(source, file_path)
                .unwrap_or_else(|e| {
                    panic!("Shader '{file_path}' failed to compose: {e}")
                });
            assert!(entry_points(&module).contains(&"vs_main"), "{file_path}");
        }
    }

    #[test]
    fn particle_shader_exposes_named_slots() {
        let mut composer = ShaderComposer::new().unwrap();
        let module = composer
            .compose_naga(PARTICLES_WGSL, "particles.wgsl")
            .unwrap();
        let globals: Vec<_> = module
            .global_variables
            .iter()
            .filter_map(|(_, var)| var.name.as_deref())
            .collect();
        for slot in ["particle_texture", "particle_position"] {
            assert!(globals.contains(&slot), "missing {slot}");
        }

        let uniform = module
            .types
            .iter()
            .find(|(_, ty)| ty.name.as_deref() == Some("ParticleUniform"))
            .map(|(_, ty)| ty.inner.clone());
        let Some(naga::TypeInner::Struct { members, .. }) = uniform else {
            panic!("ParticleUniform not found");
        };
        let names: Vec<_> =
            members.iter().filter_map(|m| m.name.as_deref()).collect();
        assert!(names.contains(&"proj_matrix"));
        assert!(names.contains(&"view_matrix"));
    }

    #[test]
    fn broken_source_is_an_error() {
        let mut composer = ShaderComposer::new().unwrap();
        let result = composer.compose_naga("fn vs_main( {", "broken.wgsl");
        assert!(matches!(result, Err(RenderError::Program(_))));
    }
}
