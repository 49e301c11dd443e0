//! Orbit camera for the metaball scene.
//!
//! [`Camera`](core::Camera) holds the eye, target and projection parameters
//! and derives view/projection matrices on demand.
//! [`OrbitController`](controller::OrbitController) turns mouse drags and
//! wheel clicks into rigid rotations about the target and zoom steps toward
//! the world origin.

/// Orbit and zoom transforms with degenerate-geometry guards.
pub mod controller;
/// Core camera struct.
pub mod core;
