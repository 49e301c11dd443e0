use crate::backend::{
    BackendResult, ForwardPassDesc, GraphicsBackend, RenderState, Renderable,
};

/// An open forward pass. Ends the pass when finished or dropped.
pub struct ForwardPass<'a> {
    backend: &'a mut (dyn GraphicsBackend + 'a),
    ended: bool,
}

impl<'a> ForwardPass<'a> {
    /// Open the pass, clearing color and depth.
    ///
    /// # Errors
    ///
    /// Fails if no frame is in progress or another pass is open.
    pub fn begin(
        backend: &'a mut (dyn GraphicsBackend + 'a),
        desc: &ForwardPassDesc,
    ) -> BackendResult<Self> {
        backend.begin_forward_pass(desc)?;
        Ok(Self {
            backend,
            ended: false,
        })
    }

    /// Draw a lit, shadowed renderable with the current state.
    ///
    /// # Errors
    ///
    /// Any backend error from the draw.
    pub fn draw(&mut self, renderable: &Renderable) -> BackendResult<()> {
        self.backend.draw_renderable(renderable)
    }

    /// Switch to `state` until the returned guard is dropped, then restore
    /// whatever state was in effect before.
    pub fn override_state<'g>(
        &'g mut self,
        state: RenderState,
    ) -> StateGuard<'g, 'a> {
        let previous = self.backend.render_state();
        self.backend.set_render_state(state);
        StateGuard {
            backend: &mut *self.backend,
            previous,
        }
    }

    /// End the pass, reporting any backend error.
    ///
    /// # Errors
    ///
    /// Any backend error from closing the pass.
    pub fn finish(mut self) -> BackendResult<()> {
        self.ended = true;
        self.backend.end_forward_pass()
    }
}

impl Drop for ForwardPass<'_> {
    fn drop(&mut self) {
        if !self.ended {
            if let Err(e) = self.backend.end_forward_pass() {
                log::error!("failed to end forward pass: {e}");
            }
        }
    }
}

/// Scoped render-state override inside a [`ForwardPass`].
pub struct StateGuard<'g, 'a> {
    backend: &'g mut (dyn GraphicsBackend + 'a),
    previous: RenderState,
}

impl<'a> StateGuard<'_, 'a> {
    /// Backend for draws under the overridden state.
    pub fn backend(&mut self) -> &mut (dyn GraphicsBackend + 'a) {
        &mut *self.backend
    }
}

impl Drop for StateGuard<'_, '_> {
    fn drop(&mut self) {
        self.backend.set_render_state(self.previous);
    }
}

#[cfg(test)]
mod tests {
    use glam::{Mat4, Vec3};

    use super::*;
    use crate::backend::recording::{BackendCall, RecordingBackend};
    use crate::backend::LightingDesc;

    fn desc(backend: &mut RecordingBackend) -> ForwardPassDesc {
        let shadow_map = backend.create_depth_target("shadow", 16).unwrap();
        ForwardPassDesc {
            clear_color: [0.0; 4],
            view: Mat4::IDENTITY,
            proj: Mat4::IDENTITY,
            eye: Vec3::Z,
            lighting: LightingDesc {
                position: Vec3::Y,
                ambient: Vec3::splat(0.2),
                diffuse: Vec3::ONE,
                view_proj: Mat4::IDENTITY,
                depth_bias: 0.0,
            },
            shadow_map,
        }
    }

    #[test]
    fn guard_restores_previous_state() {
        let mut backend = RecordingBackend::default();
        let desc = desc(&mut backend);
        backend.begin_frame().unwrap();
        {
            let mut pass = ForwardPass::begin(&mut backend, &desc).unwrap();
            {
                let mut guard =
                    pass.override_state(RenderState::ADDITIVE_OVERLAY);
                assert_eq!(
                    guard.backend().render_state(),
                    RenderState::ADDITIVE_OVERLAY
                );
            }
            pass.finish().unwrap();
        }
        assert_eq!(backend.render_state(), RenderState::OPAQUE);
        let states: Vec<_> = backend
            .calls()
            .iter()
            .filter_map(|c| match c {
                BackendCall::SetRenderState(s) => Some(*s),
                _ => None,
            })
            .collect();
        assert_eq!(
            states,
            vec![RenderState::ADDITIVE_OVERLAY, RenderState::OPAQUE]
        );
    }

    #[test]
    fn dropped_pass_still_ends() {
        let mut backend = RecordingBackend::default();
        let desc = desc(&mut backend);
        backend.begin_frame().unwrap();
        drop(ForwardPass::begin(&mut backend, &desc).unwrap());
        assert_eq!(backend.open_pass(), None);
        assert_eq!(backend.calls().last(), Some(&BackendCall::EndForwardPass));
        backend.end_frame().unwrap();
    }
}
