//! Scoped render passes and the particle billboard batch.
//!
//! [`shadow::ShadowPass`] and [`forward::ForwardPass`] borrow the backend
//! mutably for as long as they are open, so a second pass cannot be begun
//! until the first has been finished or dropped.

/// Billboard quad template and the particle draw batch.
pub mod billboard;
/// Lit color pass and render-state overrides.
pub mod forward;
/// Depth-only pass from the light.
pub mod shadow;
