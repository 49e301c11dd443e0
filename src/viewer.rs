//! Standalone window backed by winit.
//!
//! ```no_run
//! # use metaballs::viewer::Viewer;
//! # use metaballs::options::SceneOptions;
//! Viewer::builder()
//!     .with_options(SceneOptions::default())
//!     .build()
//!     .run()
//!     .unwrap();
//! ```

use std::sync::Arc;

use winit::{
    application::ApplicationHandler,
    event::{ElementState, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    window::{Window, WindowId},
};

use crate::assets::ProceduralAssets;
use crate::backend::RenderError;
use crate::error::SceneError;
use crate::gpu::backend::WgpuBackend;
use crate::gpu::render_context::RenderContext;
use crate::input::{scroll_lines, InputEvent, InputProcessor, MouseButton};
use crate::options::SceneOptions;
use crate::scene::{RenderScene, SceneCommand};
use crate::simulation::{FountainParams, FountainSimulation, ParticleSimulation};
use crate::util::frame_timing::FrameClock;

/// Configures a [`Viewer`] before its window opens.
pub struct ViewerBuilder {
    options: Option<SceneOptions>,
    fountain: FountainParams,
}

impl ViewerBuilder {
    fn new() -> Self {
        Self {
            options: None,
            fountain: FountainParams::default(),
        }
    }

    /// Use `options` instead of [`SceneOptions::default`].
    #[must_use]
    pub fn with_options(mut self, options: SceneOptions) -> Self {
        self.options = Some(options);
        self
    }

    /// Tune the built-in fountain simulation.
    #[must_use]
    pub fn with_fountain(mut self, fountain: FountainParams) -> Self {
        self.fountain = fountain;
        self
    }

    /// Finish configuration.
    #[must_use]
    pub fn build(self) -> Viewer {
        Viewer {
            options: self.options.unwrap_or_default(),
            fountain: self.fountain,
        }
    }
}

/// A window showing the scene with the fountain simulation.
pub struct Viewer {
    options: SceneOptions,
    fountain: FountainParams,
}

impl Viewer {
    /// Builder with default options and fountain.
    #[must_use]
    pub fn builder() -> ViewerBuilder {
        ViewerBuilder::new()
    }

    /// Run until the window closes.
    ///
    /// # Errors
    ///
    /// [`SceneError::Viewer`] if the event loop fails, or the error that
    /// stopped scene setup.
    pub fn run(self) -> Result<(), SceneError> {
        let event_loop =
            EventLoop::new().map_err(|e| SceneError::Viewer(e.to_string()))?;
        event_loop.set_control_flow(ControlFlow::Poll);

        let mut app = ViewerApp {
            options: self.options,
            fountain: self.fountain,
            running: None,
            input: InputProcessor::new(),
            clock: FrameClock::new(),
            setup_error: None,
        };

        event_loop
            .run_app(&mut app)
            .map_err(|e| SceneError::Viewer(e.to_string()))?;
        app.setup_error.map_or(Ok(()), Err)
    }
}

/// Window, GPU backend and everything drawn with it.
struct Running {
    window: Arc<Window>,
    backend: WgpuBackend,
    scene: RenderScene,
    sim: Box<dyn ParticleSimulation>,
}

impl Running {
    fn teardown(self) {
        let Self {
            mut backend,
            scene,
            sim,
            ..
        } = self;
        if let Err(e) = scene.teardown(&mut backend) {
            log::error!("scene teardown failed: {e}");
        }
        if let Err(e) = sim.teardown(&mut backend) {
            log::error!("simulation teardown failed: {e}");
        }
    }
}

struct ViewerApp {
    options: SceneOptions,
    fountain: FountainParams,
    running: Option<Running>,
    input: InputProcessor,
    clock: FrameClock,
    setup_error: Option<SceneError>,
}

impl ViewerApp {
    fn start(
        &self,
        event_loop: &ActiveEventLoop,
    ) -> Result<Running, SceneError> {
        let display = &self.options.display;
        let attrs = Window::default_attributes()
            .with_title(&display.title)
            .with_inner_size(winit::dpi::LogicalSize::new(
                display.width,
                display.height,
            ));
        let window = Arc::new(
            event_loop
                .create_window(attrs)
                .map_err(|e| SceneError::Viewer(e.to_string()))?,
        );

        let inner = window.inner_size();
        let context = pollster::block_on(RenderContext::new(
            window.clone(),
            (inner.width.max(1), inner.height.max(1)),
            display.vsync,
        ))?;
        let mut backend = WgpuBackend::new(context)?;

        let scene = RenderScene::new(
            &mut backend,
            &mut ProceduralAssets::default(),
            self.options.clone(),
        )?;
        let sim = match FountainSimulation::new(
            &mut backend,
            self.options.particles.max_particles,
            self.fountain.clone(),
        ) {
            Ok(sim) => sim,
            Err(e) => {
                if let Err(release) = scene.teardown(&mut backend) {
                    log::warn!("scene teardown failed: {release}");
                }
                return Err(e.into());
            }
        };

        Ok(Running {
            window,
            backend,
            scene,
            sim: Box::new(sim),
        })
    }

    fn redraw(&mut self) {
        let Some(running) = &mut self.running else {
            return;
        };
        self.clock.begin();

        let frame_seconds = self.clock.elapsed_seconds();
        running.scene.update(self.input.drain_motion(), frame_seconds);

        let step = self.options.simulation.step_for(frame_seconds);
        if let Err(e) = running.sim.advance(&mut running.backend, step) {
            log::error!("simulation step failed: {e}");
        }

        match running.scene.render(&mut running.backend, &*running.sim) {
            Ok(()) => {}
            Err(RenderError::Surface(
                wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated,
            )) => {
                log::debug!("surface reconfigured, frame skipped");
            }
            Err(e) => log::error!("render error: {e}"),
        }

        if self.clock.end() {
            let label = self.clock.rate_label();
            log::debug!("{label}");
            let title = format!("{} | {label}", self.options.display.title);
            running.window.set_title(&title);
        }
        running.window.request_redraw();
    }

    fn apply(&mut self, command: Option<SceneCommand>) {
        if let (Some(command), Some(running)) = (command, &mut self.running) {
            running.scene.apply(command);
        }
    }
}

impl ApplicationHandler for ViewerApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.running.is_some() {
            return;
        }
        match self.start(event_loop) {
            Ok(running) => {
                running.window.request_redraw();
                self.running = Some(running);
            }
            Err(e) => {
                log::error!("failed to start viewer: {e}");
                self.setup_error = Some(e);
                event_loop.exit();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => event_loop.exit(),

            WindowEvent::Resized(size) => {
                if let Some(running) = &mut self.running {
                    running.backend.resize(size.width, size.height);
                }
            }

            WindowEvent::RedrawRequested => self.redraw(),

            WindowEvent::MouseInput { button, state, .. } => {
                let command = self.input.handle_event(InputEvent::MouseButton {
                    button: MouseButton::from(button),
                    pressed: state == ElementState::Pressed,
                });
                self.apply(command);
            }

            WindowEvent::CursorMoved { position, .. } => {
                self.input
                    .handle_cursor_moved(position.x as f32, position.y as f32);
            }

            WindowEvent::CursorLeft { .. } => self.input.handle_cursor_left(),

            WindowEvent::MouseWheel { delta, .. } => {
                for command in self.input.handle_scroll(scroll_lines(delta)) {
                    self.apply(Some(command));
                }
            }

            _ => (),
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(running) = self.running.take() {
            running.teardown();
        }
    }
}
