// -- Lint policy ---------------------------------------------------------
// This is the single source of truth for crate-wide lints.

// Broad lint groups
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![deny(clippy::nursery)]
// Documentation
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]
#![deny(rustdoc::bare_urls)]
// No panicking in library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]
// No debug/print artifacts
#![deny(clippy::dbg_macro)]
#![deny(clippy::print_stdout)]
#![deny(clippy::print_stderr)]
// Import hygiene
#![deny(clippy::wildcard_imports)]
// Complexity limits
#![deny(clippy::cognitive_complexity)]
#![deny(clippy::excessive_nesting)]
// Function signature hygiene
#![deny(clippy::fn_params_excessive_bools)]
// Clone / pass-by-value hygiene
#![deny(clippy::needless_pass_by_value)]
#![deny(clippy::implicit_clone)]
// String hygiene
#![deny(clippy::inefficient_to_string)]
#![deny(clippy::redundant_closure_for_method_calls)]
#![deny(clippy::manual_string_new)]
#![deny(clippy::str_to_string)]
// Cargo lints (warn, not deny since cargo lints can be noisy)
#![warn(clippy::cargo)]
// Unused / redundant code
#![deny(unused_results)]
#![deny(unused_qualifications)]
// Cast hygiene
#![deny(trivial_casts)]
#![deny(trivial_numeric_casts)]

//! Real-time shadowed scene with an additive GPU particle billboard cloud,
//! built on wgpu.
//!
//! # Key entry points
//!
//! - [`scene::RenderScene`] - owns the camera, light and GPU handles and
//!   renders one frame at a time
//! - [`backend::GraphicsBackend`] - the seam to the GPU, implemented by
//!   [`gpu::backend::WgpuBackend`] and
//!   [`backend::recording::RecordingBackend`]
//! - [`simulation::ParticleSimulation`] - the particle source the billboard
//!   batch draws from
//! - [`options::SceneOptions`] - TOML-backed configuration
//!
//! # Frame order
//!
//! Each iteration drains input into the camera and light, steps the
//! simulation, renders the shadow map from the light, then renders the lit
//! ground followed by the particles with depth testing off and additive
//! blending on. [`util::frame_timing::FrameClock`] brackets the iteration
//! and keeps a smoothed frame rate.

pub mod assets;
pub mod backend;
pub mod camera;
pub mod error;
pub mod gpu;
pub mod handle;
pub mod input;
pub mod light;
pub mod options;
pub mod renderer;
pub mod scene;
pub mod simulation;
pub mod util;
#[cfg(feature = "viewer")]
pub mod viewer;

pub use error::SceneError;
pub use scene::RenderScene;
