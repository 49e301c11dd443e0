//! Input handling: event types, cursor tracking, and the input processor
//! that accumulates drags and turns wheel clicks into scene commands.

/// Platform-agnostic input events.
pub mod event;
/// Cursor position tracking for relative motion.
pub(crate) mod mouse;
/// Accumulates motion and converts button events into commands.
pub mod processor;

#[cfg(feature = "viewer")]
pub use event::scroll_lines;
pub use event::{InputEvent, MouseButton};
pub use processor::{InputProcessor, MotionFrame};
