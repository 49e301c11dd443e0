//! The fixed scene: one ground surface, one light, one particle cloud.
//!
//! [`RenderScene`] owns the camera, the light and every GPU handle the
//! frame needs. The caller owns the backend and the simulation and passes
//! them in explicitly:
//!
//! ```ignore
//! let mut scene = RenderScene::new(&mut backend, &mut assets, options)?;
//! loop {
//!     scene.update(input.drain_motion(), clock.elapsed_seconds());
//!     sim.advance(&mut backend, step)?;
//!     scene.render(&mut backend, &sim)?;
//! }
//! scene.teardown(&mut backend)?;
//! ```

mod command;

pub use command::SceneCommand;

use glam::Vec2;

use crate::assets::AssetProvider;
use crate::backend::{
    BackendResult, ForwardPassDesc, GraphicsBackend, RenderState, Renderable,
};
use crate::camera::controller::OrbitController;
use crate::camera::core::Camera;
use crate::error::SceneError;
use crate::handle::ResourceHandle;
use crate::input::MotionFrame;
use crate::light::Light;
use crate::options::SceneOptions;
use crate::renderer::billboard::{ParticleBatch, ParticleMaterial};
use crate::renderer::forward::ForwardPass;
use crate::renderer::shadow::ShadowMapper;
use crate::simulation::ParticleSimulation;
use crate::util::stopwatch::Stopwatch;

/// Texture unit the particle sprite is bound to.
pub const PARTICLE_TEXTURE_UNIT: u32 = 0;

/// Camera, light and GPU resources for one scene.
pub struct RenderScene {
    camera: Camera,
    orbit: OrbitController,
    light: Light,
    shadow: ShadowMapper,
    particles: ParticleBatch,
    particle_material: ParticleMaterial,
    ground: Renderable,
    options: SceneOptions,
}

impl RenderScene {
    /// Build the scene: shadow target, billboard template, ground mesh,
    /// particle program and texture.
    ///
    /// # Errors
    ///
    /// [`SceneError::DegenerateCamera`] if the camera position has no view
    /// direction towards its target. Any backend or asset failure; resources
    /// created before the failure are released.
    pub fn new(
        backend: &mut dyn GraphicsBackend,
        assets: &mut dyn AssetProvider,
        options: SceneOptions,
    ) -> Result<Self, SceneError> {
        let mut timer = Stopwatch::start("scene setup");
        let mut created = Vec::new();
        match Self::build(backend, assets, options, &mut created, &mut timer) {
            Ok(scene) => {
                let _ = timer.stop();
                Ok(scene)
            }
            Err(e) => {
                log::error!("scene setup failed: {e}");
                for handle in created.into_iter().rev() {
                    if let Err(release) = backend.release(handle) {
                        log::warn!("failed to release {handle}: {release}");
                    }
                }
                Err(e)
            }
        }
    }

    fn build(
        backend: &mut dyn GraphicsBackend,
        assets: &mut dyn AssetProvider,
        options: SceneOptions,
        created: &mut Vec<ResourceHandle>,
        timer: &mut Stopwatch,
    ) -> Result<Self, SceneError> {
        let camera =
            Camera::from_options(&options.camera, backend.viewport_aspect());
        if !camera.has_view_basis() {
            return Err(SceneError::DegenerateCamera {
                position: options.camera.position,
                target: options.camera.target,
            });
        }
        let shadow = ShadowMapper::new(backend, &options.shadow)?;
        created.push(shadow.target());
        let _ = timer.split("shadow map");

        let particles = ParticleBatch::new(backend, &options.particles)?;
        created.extend(particles.handles());
        let _ = timer.split("billboard template");

        let ground = assets.ground(backend)?;
        created.push(ground.mesh);
        let program = assets.particle_program(backend)?;
        created.push(program);
        let texture = assets.particle_texture(backend)?;
        created.push(texture);
        let _ = timer.split("assets");

        log::info!(
            "scene ready: {} particle slots, shadow map {}px",
            particles.capacity(),
            options.shadow.resolution
        );
        Ok(Self {
            camera,
            orbit: OrbitController::new(&options.camera),
            light: Light::from_options(&options.light),
            shadow,
            particles,
            particle_material: ParticleMaterial {
                program,
                texture,
                texture_unit: PARTICLE_TEXTURE_UNIT,
            },
            ground,
            options,
        })
    }

    /// Current camera.
    #[must_use]
    pub const fn camera(&self) -> &Camera {
        &self.camera
    }

    /// Current light.
    #[must_use]
    pub const fn light(&self) -> &Light {
        &self.light
    }

    /// Options the scene was built with.
    #[must_use]
    pub const fn options(&self) -> &SceneOptions {
        &self.options
    }

    /// Apply one frame of accumulated mouse motion: primary drags orbit the
    /// camera, secondary drags move the light.
    pub fn update(&mut self, motion: MotionFrame, dt: f32) {
        if motion.delta == Vec2::ZERO {
            return;
        }
        if motion.primary_held {
            self.orbit.orbit(&mut self.camera, motion.delta, dt);
        }
        if motion.secondary_held {
            self.light.drag(motion.delta, self.options.light.drag_scale);
        }
    }

    /// Apply a discrete command.
    pub fn apply(&mut self, command: SceneCommand) {
        match command {
            SceneCommand::Zoom(direction) => {
                self.orbit.zoom(&mut self.camera, direction);
            }
        }
    }

    /// Render one frame: shadow pass, then the forward pass with the ground
    /// followed by the particles. The frame is ended even if a pass fails.
    ///
    /// # Errors
    ///
    /// The first backend error of the frame.
    pub fn render(
        &mut self,
        backend: &mut dyn GraphicsBackend,
        sim: &dyn ParticleSimulation,
    ) -> BackendResult<()> {
        let aspect = backend.viewport_aspect();
        if aspect.is_finite() && aspect > 0.0 {
            self.camera.aspect = aspect;
        }
        backend.begin_frame()?;
        let passes = self.draw_passes(backend, sim);
        let end = backend.end_frame();
        passes.and(end)
    }

    fn draw_passes(
        &mut self,
        backend: &mut dyn GraphicsBackend,
        sim: &dyn ParticleSimulation,
    ) -> BackendResult<()> {
        let mut shadow = self.shadow.begin(backend, &self.light)?;
        shadow.draw(&self.ground)?;
        shadow.finish()?;

        let view = self.camera.view();
        let proj = self.camera.projection();
        let desc = ForwardPassDesc {
            clear_color: self.options.display.clear_color,
            view,
            proj,
            eye: self.camera.eye,
            lighting: self.light.lighting(self.shadow.options()),
            shadow_map: self.shadow.target(),
        };
        let mut forward = ForwardPass::begin(backend, &desc)?;
        forward.draw(&self.ground)?;
        {
            let mut overlay =
                forward.override_state(RenderState::ADDITIVE_OVERLAY);
            self.particles.draw(
                overlay.backend(),
                sim,
                &self.particle_material,
                view,
                proj,
            )?;
        }
        forward.finish()
    }

    /// Release every GPU handle the scene owns. Each release is attempted
    /// even if an earlier one fails.
    ///
    /// # Errors
    ///
    /// The first release failure.
    pub fn teardown(
        self,
        backend: &mut dyn GraphicsBackend,
    ) -> BackendResult<()> {
        let mut timer = Stopwatch::start("scene teardown");
        let results = [
            backend.release(self.ground.mesh),
            backend.release(self.particle_material.program),
            backend.release(self.particle_material.texture),
            self.shadow.teardown(backend),
            self.particles.teardown(backend),
        ];
        let _ = timer.split("release");
        let _ = timer.stop();
        results.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::ProceduralAssets;
    use crate::backend::recording::{BackendCall, RecordingBackend};
    use crate::camera::controller::ZoomDirection;
    use crate::error::AssetError;
    use crate::simulation::{
        FountainParams, FountainSimulation, SIMULATION_STEP,
    };

    fn index_of(
        calls: &[BackendCall],
        wanted: fn(&BackendCall) -> bool,
    ) -> usize {
        let hits: Vec<usize> = calls
            .iter()
            .enumerate()
            .filter(|(_, c)| wanted(c))
            .map(|(i, _)| i)
            .collect();
        assert_eq!(hits.len(), 1, "expected exactly one matching call");
        hits[0]
    }

    fn scene(backend: &mut RecordingBackend) -> RenderScene {
        RenderScene::new(
            backend,
            &mut ProceduralAssets::default(),
            SceneOptions::default(),
        )
        .unwrap()
    }

    #[test]
    fn one_frame_orders_passes_and_restores_state() {
        let mut backend = RecordingBackend::default();
        let mut scene = scene(&mut backend);
        let params = FountainParams::default();
        let mut sim =
            FountainSimulation::new(&mut backend, 1000, params).unwrap();
        sim.advance(&mut backend, SIMULATION_STEP).unwrap();
        backend.clear_calls();

        scene.render(&mut backend, &sim).unwrap();

        let calls = backend.calls();
        let position =
            |wanted: fn(&BackendCall) -> bool| index_of(calls, wanted);
        let begin_shadow =
            position(|c| matches!(c, BackendCall::BeginShadowPass { .. }));
        let end_shadow = position(|c| matches!(c, BackendCall::EndShadowPass));
        let begin_forward =
            position(|c| matches!(c, BackendCall::BeginForwardPass { .. }));
        let end_forward =
            position(|c| matches!(c, BackendCall::EndForwardPass));
        let billboards =
            position(|c| matches!(c, BackendCall::DrawBillboards { .. }));
        assert!(begin_shadow < end_shadow);
        assert!(end_shadow < begin_forward);
        assert!(begin_forward < billboards && billboards < end_forward);
        assert_eq!(calls.first(), Some(&BackendCall::BeginFrame));
        assert_eq!(calls.last(), Some(&BackendCall::EndFrame));

        let BackendCall::DrawBillboards {
            vertex_count,
            state,
            texture_unit,
            ..
        } = calls[billboards].clone()
        else {
            unreachable!("billboard index points at another call");
        };
        assert_eq!(vertex_count as usize, 4 * sim.count());
        assert_eq!(state, RenderState::ADDITIVE_OVERLAY);
        assert_eq!(texture_unit, PARTICLE_TEXTURE_UNIT);
        assert!(calls[begin_forward..billboards].iter().any(|c| matches!(
            c,
            BackendCall::DrawRenderable {
                state: RenderState::OPAQUE,
                ..
            }
        )));
        assert_eq!(
            calls[billboards + 1],
            BackendCall::SetRenderState(RenderState::OPAQUE)
        );
        assert_eq!(backend.render_state(), RenderState::OPAQUE);
    }

    #[test]
    fn empty_simulation_draws_zero_quads() {
        let mut backend = RecordingBackend::default();
        let mut scene = scene(&mut backend);
        let sim =
            FountainSimulation::new(&mut backend, 16, FountainParams::default())
                .unwrap();
        backend.clear_calls();
        scene.render(&mut backend, &sim).unwrap();
        assert!(backend.calls().iter().any(|c| matches!(
            c,
            BackendCall::DrawBillboards { vertex_count: 0, .. }
        )));
        assert_eq!(backend.render_state(), RenderState::OPAQUE);
    }

    #[test]
    fn teardown_releases_everything_once() {
        let mut backend = RecordingBackend::default();
        let scene = scene(&mut backend);
        let sim: Box<dyn ParticleSimulation> = Box::new(
            FountainSimulation::new(&mut backend, 8, FountainParams::default())
                .unwrap(),
        );
        scene.teardown(&mut backend).unwrap();
        sim.teardown(&mut backend).unwrap();
        assert_eq!(backend.live_resources(), 0);
        let releases = backend
            .calls()
            .iter()
            .filter(|c| matches!(c, BackendCall::Release(_)))
            .count();
        assert_eq!(releases, 8);
    }

    #[test]
    fn motion_routes_to_camera_or_light() {
        let mut backend = RecordingBackend::default();
        let mut scene = scene(&mut backend);
        let radius = scene.camera().distance_to_target();
        let light_before = scene.light().position;

        scene.update(
            MotionFrame {
                delta: Vec2::new(40.0, 10.0),
                primary_held: true,
                secondary_held: false,
            },
            0.016,
        );
        assert!((scene.camera().distance_to_target() - radius).abs() < 1e-3);
        assert_eq!(scene.light().position, light_before);

        let eye = scene.camera().eye;
        scene.update(
            MotionFrame {
                delta: Vec2::new(2.0, 2.0),
                primary_held: false,
                secondary_held: true,
            },
            0.016,
        );
        assert_eq!(scene.camera().eye, eye);
        assert_ne!(scene.light().position, light_before);
    }

    #[test]
    fn zoom_command_moves_camera_one_step() {
        let mut backend = RecordingBackend::default();
        let mut scene = scene(&mut backend);
        let before = scene.camera().eye.length();
        scene.apply(SceneCommand::Zoom(ZoomDirection::In));
        assert!((scene.camera().eye.length() - (before - 1.0)).abs() < 1e-4);
    }

    struct BrokenTexture(ProceduralAssets);

    impl AssetProvider for BrokenTexture {
        fn ground(
            &mut self,
            backend: &mut dyn GraphicsBackend,
        ) -> Result<Renderable, AssetError> {
            self.0.ground(backend)
        }

        fn particle_program(
            &mut self,
            backend: &mut dyn GraphicsBackend,
        ) -> Result<ResourceHandle, AssetError> {
            self.0.particle_program(backend)
        }

        fn particle_texture(
            &mut self,
            _backend: &mut dyn GraphicsBackend,
        ) -> Result<ResourceHandle, AssetError> {
            Err(AssetError::Invalid("missing sprite".into()))
        }
    }

    #[test]
    fn failed_setup_releases_partial_resources() {
        let mut backend = RecordingBackend::default();
        let result = RenderScene::new(
            &mut backend,
            &mut BrokenTexture(ProceduralAssets::default()),
            SceneOptions::default(),
        );
        assert!(matches!(result, Err(SceneError::Asset(_))));
        assert_eq!(backend.live_resources(), 0);
    }

    #[test]
    fn camera_on_its_target_is_rejected() {
        let mut backend = RecordingBackend::default();
        let options = SceneOptions::from_toml(
            "[camera]\nposition = [0.0, 5.0, 0.0]\ntarget = [0.0, 5.0, 0.0]",
        )
        .unwrap();
        let mut assets = ProceduralAssets::default();
        let result = RenderScene::new(&mut backend, &mut assets, options);
        assert!(matches!(result, Err(SceneError::DegenerateCamera { .. })));
        assert_eq!(backend.live_resources(), 0);
    }
}
