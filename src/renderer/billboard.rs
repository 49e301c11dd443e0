//! GPU-resident quad template shared by every particle.
//!
//! Each particle slot owns four template vertices. The vertex shader places
//! them around `particle_position[vertex_index / 4]`, offset along the
//! camera's right and up axes by the corner value, so slot `i` of the
//! template always pairs with slot `i` of the simulation buffer.

use glam::Mat4;

use crate::backend::{
    BackendResult, BillboardDraw, BufferDesc, BufferUsage, GraphicsBackend,
};
use crate::handle::ResourceHandle;
use crate::options::ParticleOptions;
use crate::simulation::ParticleSimulation;

/// Quad corners: bottom-left, top-left, top-right, bottom-right.
pub const CORNERS: [[f32; 2]; 4] =
    [[-1.0, -1.0], [-1.0, 1.0], [1.0, 1.0], [1.0, -1.0]];

/// Texture coordinates matching [`CORNERS`].
pub const UVS: [[f32; 2]; 4] = [[0.0, 0.0], [0.0, 1.0], [1.0, 1.0], [1.0, 0.0]];

/// Triangle indices for one quad.
const QUAD_INDICES: [u32; 6] = [0, 1, 2, 0, 2, 3];

/// CPU-side template for `slots` quads.
#[derive(Debug, Clone, PartialEq)]
pub struct QuadTemplate {
    /// Four corner offsets per slot.
    pub corners: Vec<[f32; 3]>,
    /// Four texture coordinates per slot.
    pub uvs: Vec<[f32; 2]>,
    /// Six triangle-list indices per slot.
    pub indices: Vec<u32>,
}

impl QuadTemplate {
    /// Build the template for `slots` particles.
    #[must_use]
    pub fn new(slots: u32) -> Self {
        let n = slots as usize;
        let mut corners = Vec::with_capacity(n * 4);
        let mut uvs = Vec::with_capacity(n * 4);
        let mut indices = Vec::with_capacity(n * 6);
        for slot in 0..slots {
            corners.extend(CORNERS.iter().map(|&[x, y]| [x, y, 0.0]));
            uvs.extend_from_slice(&UVS);
            indices.extend(QUAD_INDICES.iter().map(|i| slot * 4 + i));
        }
        Self {
            corners,
            uvs,
            indices,
        }
    }

    /// Particle slots covered.
    #[must_use]
    pub fn slots(&self) -> usize {
        self.corners.len() / 4
    }
}

/// Program and texture used to shade billboards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParticleMaterial {
    /// Billboard program.
    pub program: ResourceHandle,
    /// Texture bound to `particle_texture`.
    pub texture: ResourceHandle,
    /// Texture unit `particle_texture` samples from.
    pub texture_unit: u32,
}

fn release_partial(
    backend: &mut dyn GraphicsBackend,
    handles: &[ResourceHandle],
) {
    for &handle in handles.iter().rev() {
        if let Err(release) = backend.release(handle) {
            log::warn!("failed to release {handle}: {release}");
        }
    }
}

/// Uploaded quad template plus the bounds-checked particle draw.
pub struct ParticleBatch {
    capacity: u32,
    size: f32,
    corners: ResourceHandle,
    uvs: ResourceHandle,
    indices: ResourceHandle,
    overflow_warned: bool,
}

impl ParticleBatch {
    /// Upload the template for `options.max_particles` slots.
    ///
    /// # Errors
    ///
    /// Any backend error from the uploads. Buffers created before the
    /// failure are released.
    pub fn new(
        backend: &mut dyn GraphicsBackend,
        options: &ParticleOptions,
    ) -> BackendResult<Self> {
        let template = QuadTemplate::new(options.max_particles);
        let corners = backend.create_buffer(&BufferDesc {
            label: "Billboard Corners",
            usage: BufferUsage::Vertex,
            contents: bytemuck::cast_slice(&template.corners),
        })?;
        let uvs = match backend.create_buffer(&BufferDesc {
            label: "Billboard UVs",
            usage: BufferUsage::Vertex,
            contents: bytemuck::cast_slice(&template.uvs),
        }) {
            Ok(h) => h,
            Err(e) => {
                release_partial(backend, &[corners]);
                return Err(e);
            }
        };
        let indices = match backend.create_buffer(&BufferDesc {
            label: "Billboard Indices",
            usage: BufferUsage::Index,
            contents: bytemuck::cast_slice(&template.indices),
        }) {
            Ok(h) => h,
            Err(e) => {
                release_partial(backend, &[corners, uvs]);
                return Err(e);
            }
        };
        log::debug!(
            "billboard template: {} slots, {} vertices",
            template.slots(),
            template.corners.len()
        );
        Ok(Self {
            capacity: options.max_particles,
            size: options.size,
            corners,
            uvs,
            indices,
            overflow_warned: false,
        })
    }

    /// Configured maximum particle count.
    #[must_use]
    pub const fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Corner, uv and index buffer handles.
    #[must_use]
    pub const fn handles(&self) -> [ResourceHandle; 3] {
        [self.corners, self.uvs, self.indices]
    }

    /// Template vertices to draw for `count` live particles.
    #[must_use]
    pub fn draw_count(&self, count: usize) -> u32 {
        let clamped = count.min(self.capacity as usize) as u32;
        clamped * 4
    }

    /// Draw the simulation's live particles with the current render state.
    /// Counts above capacity are clamped and reported once.
    ///
    /// # Errors
    ///
    /// Any backend error from the draw.
    pub fn draw(
        &mut self,
        backend: &mut dyn GraphicsBackend,
        sim: &dyn ParticleSimulation,
        material: &ParticleMaterial,
        view: Mat4,
        proj: Mat4,
    ) -> BackendResult<()> {
        let count = sim.count();
        if count > self.capacity as usize && !self.overflow_warned {
            self.overflow_warned = true;
            log::warn!(
                "simulation reports {count} particles, drawing {}",
                self.capacity
            );
        }
        backend.draw_billboards(&BillboardDraw {
            program: material.program,
            texture: material.texture,
            texture_unit: material.texture_unit,
            view,
            proj,
            particle_size: self.size,
            corners: self.corners,
            uvs: self.uvs,
            indices: self.indices,
            positions: sim.position_buffer(),
            vertex_count: self.draw_count(count),
        })
    }

    /// Release the template buffers.
    ///
    /// # Errors
    ///
    /// The first backend error; every buffer is still attempted.
    pub fn teardown(
        self,
        backend: &mut dyn GraphicsBackend,
    ) -> BackendResult<()> {
        let results = [
            backend.release(self.corners),
            backend.release(self.uvs),
            backend.release(self.indices),
        ];
        results.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::*;
    use crate::backend::recording::{BackendCall, RecordingBackend};
    use crate::backend::{
        ForwardPassDesc, LightingDesc, ProgramDesc, RenderError, TextureDesc,
    };

    struct FixedCount {
        count: usize,
        positions: ResourceHandle,
    }

    impl ParticleSimulation for FixedCount {
        fn advance(
            &mut self,
            _backend: &mut dyn GraphicsBackend,
            _dt: f32,
        ) -> BackendResult<()> {
            Ok(())
        }

        fn count(&self) -> usize {
            self.count
        }

        fn position_buffer(&self) -> ResourceHandle {
            self.positions
        }

        fn teardown(
            self: Box<Self>,
            backend: &mut dyn GraphicsBackend,
        ) -> BackendResult<()> {
            backend.release(self.positions)
        }
    }

    #[test]
    fn template_for_one_thousand_slots() {
        let template = QuadTemplate::new(1000);
        assert_eq!(template.corners.len(), 4000);
        assert_eq!(template.uvs.len(), 4000);
        assert_eq!(template.indices.len(), 6000);
        for (slot, quad) in template.corners.chunks(4).enumerate() {
            for (corner, expected) in quad.iter().zip(CORNERS) {
                assert_eq!(corner[..2], expected, "slot {slot}");
            }
        }
        assert!(template.uvs.chunks(4).all(|q| q == UVS));
        assert_eq!(&template.indices[6..12], &[4, 5, 6, 4, 6, 7]);
    }

    #[test]
    fn draw_count_is_clamped_to_capacity() {
        let mut backend = RecordingBackend::default();
        let options = ParticleOptions {
            max_particles: 10,
            ..Default::default()
        };
        let batch = ParticleBatch::new(&mut backend, &options).unwrap();
        assert_eq!(batch.draw_count(0), 0);
        assert_eq!(batch.draw_count(3), 12);
        assert_eq!(batch.draw_count(10), 40);
        assert_eq!(batch.draw_count(11), 40);
        assert_eq!(batch.draw_count(usize::MAX), 40);
    }

    #[test]
    fn draw_passes_clamped_count_to_backend() {
        let mut backend = RecordingBackend::default();
        let options = ParticleOptions {
            max_particles: 8,
            ..Default::default()
        };
        let mut batch = ParticleBatch::new(&mut backend, &options).unwrap();
        let positions = backend
            .create_buffer(&BufferDesc {
                label: "positions",
                usage: BufferUsage::Storage,
                contents: &[0; 8 * 16],
            })
            .unwrap();
        let material = ParticleMaterial {
            program: backend
                .create_program(&ProgramDesc {
                    label: "p",
                    source: "",
                    file_path: "p.wgsl",
                })
                .unwrap(),
            texture: backend
                .create_texture(&TextureDesc {
                    label: "t",
                    width: 1,
                    height: 1,
                    rgba8: &[255; 4],
                })
                .unwrap(),
            texture_unit: 0,
        };
        let shadow_map = backend.create_depth_target("s", 4).unwrap();
        let desc = ForwardPassDesc {
            clear_color: [0.0; 4],
            view: Mat4::IDENTITY,
            proj: Mat4::IDENTITY,
            eye: Vec3::Z,
            lighting: LightingDesc {
                position: Vec3::Y,
                ambient: Vec3::ZERO,
                diffuse: Vec3::ONE,
                view_proj: Mat4::IDENTITY,
                depth_bias: 0.0,
            },
            shadow_map,
        };

        backend.begin_frame().unwrap();
        backend.begin_forward_pass(&desc).unwrap();
        for count in [0, 5, 20] {
            let sim = FixedCount { count, positions };
            let identity = Mat4::IDENTITY;
            batch
                .draw(&mut backend, &sim, &material, identity, identity)
                .unwrap();
        }
        backend.end_forward_pass().unwrap();
        backend.end_frame().unwrap();

        let counts: Vec<u32> = backend
            .calls()
            .iter()
            .filter_map(|c| match c {
                BackendCall::DrawBillboards { vertex_count, .. } => {
                    Some(*vertex_count)
                }
                _ => None,
            })
            .collect();
        assert_eq!(counts, vec![0, 20, 32]);
        assert!(batch.overflow_warned);
    }

    #[test]
    fn failed_index_upload_releases_vertex_buffers() {
        let mut backend = RecordingBackend::default();
        backend.limit_buffers(2);
        let result =
            ParticleBatch::new(&mut backend, &ParticleOptions::default());
        assert!(matches!(result, Err(RenderError::InvalidData(_))));
        assert_eq!(backend.live_resources(), 0);

        let released: Vec<ResourceHandle> = backend
            .calls()
            .iter()
            .filter_map(|c| match c {
                BackendCall::Release(h) => Some(*h),
                _ => None,
            })
            .collect();
        let created: Vec<ResourceHandle> = backend
            .calls()
            .iter()
            .filter_map(|c| match c {
                BackendCall::CreateBuffer { handle, .. } => Some(*handle),
                _ => None,
            })
            .collect();
        assert_eq!(released, vec![created[1], created[0]]);
    }

    #[test]
    fn teardown_releases_template() {
        let mut backend = RecordingBackend::default();
        let options = ParticleOptions::default();
        let batch = ParticleBatch::new(&mut backend, &options).unwrap();
        assert_eq!(backend.live_resources(), 3);
        batch.teardown(&mut backend).unwrap();
        assert_eq!(backend.live_resources(), 0);
    }
}
