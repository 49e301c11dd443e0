use crate::backend::{
    BackendResult, GraphicsBackend, Renderable, ShadowPassDesc,
};
use crate::handle::ResourceHandle;
use crate::light::Light;
use crate::options::ShadowOptions;

/// Owns the shadow depth target and the light projection settings.
pub struct ShadowMapper {
    target: ResourceHandle,
    options: ShadowOptions,
}

impl ShadowMapper {
    /// Allocate a square depth target of `options.resolution` texels.
    ///
    /// # Errors
    ///
    /// Any backend error from the allocation.
    pub fn new(
        backend: &mut dyn GraphicsBackend,
        options: &ShadowOptions,
    ) -> BackendResult<Self> {
        let target =
            backend.create_depth_target("Shadow Map", options.resolution)?;
        Ok(Self {
            target,
            options: options.clone(),
        })
    }

    /// Depth target written by the pass and sampled by the forward pass.
    #[must_use]
    pub const fn target(&self) -> ResourceHandle {
        self.target
    }

    /// Projection settings used for the light frustum.
    #[must_use]
    pub const fn options(&self) -> &ShadowOptions {
        &self.options
    }

    /// Open a shadow pass rendering from `light`.
    ///
    /// # Errors
    ///
    /// Fails if no frame is in progress or another pass is open.
    pub fn begin<'a>(
        &self,
        backend: &'a mut dyn GraphicsBackend,
        light: &Light,
    ) -> BackendResult<ShadowPass<'a>> {
        backend.begin_shadow_pass(&ShadowPassDesc {
            target: self.target,
            light_view_proj: light.view_proj(&self.options),
        })?;
        Ok(ShadowPass {
            backend,
            ended: false,
        })
    }

    /// Release the depth target.
    ///
    /// # Errors
    ///
    /// Any backend error from the release.
    pub fn teardown(
        self,
        backend: &mut dyn GraphicsBackend,
    ) -> BackendResult<()> {
        backend.release(self.target)
    }
}

/// An open depth-only pass. Ends the pass when finished or dropped.
pub struct ShadowPass<'a> {
    backend: &'a mut dyn GraphicsBackend,
    ended: bool,
}

impl ShadowPass<'_> {
    /// Rasterize a shadow caster.
    ///
    /// # Errors
    ///
    /// Any backend error from the draw.
    pub fn draw(&mut self, renderable: &Renderable) -> BackendResult<()> {
        self.backend.draw_shadow_caster(renderable)
    }

    /// End the pass, reporting any backend error.
    ///
    /// # Errors
    ///
    /// Any backend error from closing the pass.
    pub fn finish(mut self) -> BackendResult<()> {
        self.ended = true;
        self.backend.end_shadow_pass()
    }
}

impl Drop for ShadowPass<'_> {
    fn drop(&mut self) {
        if !self.ended {
            if let Err(e) = self.backend.end_shadow_pass() {
                log::error!("failed to end shadow pass: {e}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::recording::{BackendCall, RecordingBackend};
    use crate::backend::PassKind;
    use crate::options::LightOptions;

    #[test]
    fn dropped_pass_still_ends() {
        let mut backend = RecordingBackend::default();
        let mapper =
            ShadowMapper::new(&mut backend, &ShadowOptions::default()).unwrap();
        let light = Light::from_options(&LightOptions::default());
        backend.begin_frame().unwrap();
        {
            let _pass = mapper.begin(&mut backend, &light).unwrap();
        }
        assert_eq!(backend.open_pass(), None);
        assert_eq!(backend.calls().last(), Some(&BackendCall::EndShadowPass));
    }

    #[test]
    fn begin_requires_frame() {
        let mut backend = RecordingBackend::default();
        let mapper =
            ShadowMapper::new(&mut backend, &ShadowOptions::default()).unwrap();
        let light = Light::from_options(&LightOptions::default());
        assert!(mapper.begin(&mut backend, &light).is_err());
        assert_ne!(backend.open_pass(), Some(PassKind::Shadow));
    }

    #[test]
    fn teardown_releases_target() {
        let mut backend = RecordingBackend::default();
        let mapper =
            ShadowMapper::new(&mut backend, &ShadowOptions::default()).unwrap();
        assert!(backend.calls().contains(&BackendCall::CreateDepthTarget {
            handle: mapper.target(),
            resolution: 1024,
        }));
        mapper.teardown(&mut backend).unwrap();
        assert_eq!(backend.live_resources(), 0);
    }
}
