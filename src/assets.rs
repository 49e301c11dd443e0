//! Asset provider collaborator and the built-in procedural assets.

use glam::{Mat4, Vec3};

use crate::backend::{
    GraphicsBackend, Material, MeshData, MeshVertex, ProgramDesc, Renderable,
    TextureDesc,
};
use crate::error::AssetError;
use crate::gpu::shader_composer::PARTICLES_WGSL;
use crate::handle::ResourceHandle;

/// Supplies the handles the scene draws with. The scene takes ownership of
/// every returned handle and releases it at teardown.
pub trait AssetProvider {
    /// The ground surface.
    ///
    /// # Errors
    ///
    /// [`AssetError`] if the mesh cannot be produced or uploaded.
    fn ground(
        &mut self,
        backend: &mut dyn GraphicsBackend,
    ) -> Result<Renderable, AssetError>;

    /// Billboard program exposing `particle_texture`, `proj_matrix`,
    /// `view_matrix` and `particle_position`.
    ///
    /// # Errors
    ///
    /// [`AssetError`] if the program fails to compile.
    fn particle_program(
        &mut self,
        backend: &mut dyn GraphicsBackend,
    ) -> Result<ResourceHandle, AssetError>;

    /// Texture sampled by each billboard.
    ///
    /// # Errors
    ///
    /// [`AssetError`] if the texture cannot be uploaded.
    fn particle_texture(
        &mut self,
        backend: &mut dyn GraphicsBackend,
    ) -> Result<ResourceHandle, AssetError>;
}

/// Generated ground plane, radial particle sprite and bundled billboard
/// shader.
#[derive(Debug, Clone, PartialEq)]
pub struct ProceduralAssets {
    /// Ground half-extent in world units.
    pub ground_half_extent: f32,
    /// Ground quads per side.
    pub ground_subdivisions: u32,
    /// Ground material.
    pub ground_material: Material,
    /// Particle sprite width and height in texels.
    pub sprite_resolution: u32,
}

impl Default for ProceduralAssets {
    fn default() -> Self {
        Self {
            ground_half_extent: 25.0,
            ground_subdivisions: 16,
            ground_material: Material::default(),
            sprite_resolution: 64,
        }
    }
}

impl ProceduralAssets {
    /// Vertices and indices of a square grid in the y = 0 plane, facing +Y.
    #[must_use]
    pub fn ground_geometry(&self) -> (Vec<MeshVertex>, Vec<u32>) {
        let n = self.ground_subdivisions.max(1);
        let extent = self.ground_half_extent;
        let step = 2.0 * extent / n as f32;

        let mut vertices = Vec::with_capacity(((n + 1) * (n + 1)) as usize);
        for row in 0..=n {
            for col in 0..=n {
                let u = col as f32 / n as f32;
                let v = row as f32 / n as f32;
                vertices.push(MeshVertex {
                    position: [
                        -extent + col as f32 * step,
                        0.0,
                        -extent + row as f32 * step,
                    ],
                    normal: [0.0, 1.0, 0.0],
                    uv: [u, v],
                });
            }
        }

        let mut indices = Vec::with_capacity((n * n * 6) as usize);
        let stride = n + 1;
        for row in 0..n {
            for col in 0..n {
                let a = row * stride + col;
                let b = a + 1;
                let c = a + stride;
                let d = c + 1;
                indices.extend_from_slice(&[a, c, b, b, c, d]);
            }
        }
        (vertices, indices)
    }

    /// White RGBA8 sprite whose alpha falls off smoothly from the center.
    #[must_use]
    pub fn sprite_texels(&self) -> Vec<u8> {
        let size = self.sprite_resolution.max(2);
        let half = (size - 1) as f32 / 2.0;
        let mut texels = Vec::with_capacity((size * size * 4) as usize);
        for y in 0..size {
            for x in 0..size {
                let dx = (x as f32 - half) / half;
                let dy = (y as f32 - half) / half;
                let r = (dx * dx + dy * dy).sqrt().min(1.0);
                let falloff = 1.0 - r * r * (3.0 - 2.0 * r);
                let alpha = (falloff * 255.0).round() as u8;
                texels.extend_from_slice(&[255, 255, 255, alpha]);
            }
        }
        texels
    }
}

impl AssetProvider for ProceduralAssets {
    fn ground(
        &mut self,
        backend: &mut dyn GraphicsBackend,
    ) -> Result<Renderable, AssetError> {
        let (vertices, indices) = self.ground_geometry();
        let mesh = backend.create_mesh(&MeshData {
            label: "Ground",
            vertices: &vertices,
            indices: &indices,
        })?;
        Ok(Renderable {
            mesh,
            material: self.ground_material,
            transform: Mat4::from_translation(Vec3::ZERO),
        })
    }

    fn particle_program(
        &mut self,
        backend: &mut dyn GraphicsBackend,
    ) -> Result<ResourceHandle, AssetError> {
        Ok(backend.create_program(&ProgramDesc {
            label: "Particle Billboards",
            source: PARTICLES_WGSL,
            file_path: "particles.wgsl",
        })?)
    }

    fn particle_texture(
        &mut self,
        backend: &mut dyn GraphicsBackend,
    ) -> Result<ResourceHandle, AssetError> {
        let size = self.sprite_resolution.max(2);
        let texels = self.sprite_texels();
        if texels.len() != (size * size * 4) as usize {
            return Err(AssetError::Invalid(format!(
                "sprite has {} bytes for {size}x{size}",
                texels.len()
            )));
        }
        Ok(backend.create_texture(&TextureDesc {
            label: "Particle Sprite",
            width: size,
            height: size,
            rgba8: &texels,
        })?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::recording::RecordingBackend;
    use crate::handle::ResourceKind;

    #[test]
    fn ground_is_flat_grid_facing_up() {
        let assets = ProceduralAssets {
            ground_subdivisions: 4,
            ..Default::default()
        };
        let (vertices, indices) = assets.ground_geometry();
        assert_eq!(vertices.len(), 25);
        assert_eq!(indices.len(), 4 * 4 * 6);
        assert!(vertices
            .iter()
            .all(|v| v.position[1] == 0.0 && v.normal == [0.0, 1.0, 0.0]));
        assert!(indices.iter().all(|&i| (i as usize) < vertices.len()));
    }

    #[test]
    fn sprite_is_opaque_at_center_and_clear_at_corners() {
        let assets = ProceduralAssets {
            sprite_resolution: 9,
            ..Default::default()
        };
        let texels = assets.sprite_texels();
        let alpha = |x: usize, y: usize| texels[(y * 9 + x) * 4 + 3];
        assert_eq!(alpha(4, 4), 255);
        assert_eq!(alpha(0, 0), 0);
        assert!(texels.chunks(4).all(|t| t[..3] == [255, 255, 255]));
    }

    #[test]
    fn provider_returns_typed_handles() {
        let mut backend = RecordingBackend::default();
        let mut assets = ProceduralAssets::default();
        let ground = assets.ground(&mut backend).unwrap();
        let program = assets.particle_program(&mut backend).unwrap();
        let texture = assets.particle_texture(&mut backend).unwrap();
        assert_eq!(ground.mesh.kind(), ResourceKind::Mesh);
        assert_eq!(program.kind(), ResourceKind::Program);
        assert_eq!(texture.kind(), ResourceKind::Texture);
    }
}
