//! Converts raw platform events into camera/light motion and commands.
//!
//! The `InputProcessor` owns all transient input state (pending motion,
//! held buttons, last cursor position). Motion is accumulated between
//! frames and drained once per frame; wheel clicks become zoom commands
//! immediately. Fractional wheel lines carry over until they add up to a
//! whole notch.

use glam::Vec2;

use super::event::{InputEvent, MouseButton};
use super::mouse::CursorTracker;
use crate::camera::controller::ZoomDirection;
use crate::scene::SceneCommand;

/// Motion accumulated since the previous frame, with the buttons held when
/// it was drained.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MotionFrame {
    /// Summed mouse motion in physical pixels.
    pub delta: Vec2,
    /// Primary button held (orbit camera).
    pub primary_held: bool,
    /// Secondary button held (drag light).
    pub secondary_held: bool,
}

/// Accumulates raw input events for the scene.
///
/// # Usage
///
/// ```ignore
/// // In the event loop:
/// if let Some(cmd) = input.handle_event(event) {
///     scene.apply(cmd);
/// }
///
/// // Once per frame:
/// scene.update(input.drain_motion(), elapsed);
/// ```
#[derive(Debug, Default)]
pub struct InputProcessor {
    cursor: CursorTracker,
    pending: Vec2,
    primary_held: bool,
    secondary_held: bool,
    scroll_remainder: f32,
}

impl InputProcessor {
    /// Processor with no pending motion and no buttons held.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the primary mouse button is held.
    #[must_use]
    pub fn primary_held(&self) -> bool {
        self.primary_held
    }

    /// Whether the secondary mouse button is held.
    #[must_use]
    pub fn secondary_held(&self) -> bool {
        self.secondary_held
    }

    /// Motion accumulated since the last drain.
    #[must_use]
    pub fn pending_motion(&self) -> Vec2 {
        self.pending
    }

    /// Process a raw input event and return zero or one commands.
    pub fn handle_event(&mut self, event: InputEvent) -> Option<SceneCommand> {
        match event {
            InputEvent::MouseMotion { dx, dy } => {
                self.pending += Vec2::new(dx, dy);
                None
            }
            InputEvent::MouseButton { button, pressed } => {
                self.handle_mouse_button(button, pressed)
            }
        }
    }

    /// Feed wheel travel in lines (positive away from the user). Each whole
    /// line, including carried fractions, yields one zoom command.
    pub fn handle_scroll(
        &mut self,
        lines: f32,
    ) -> std::iter::RepeatN<SceneCommand> {
        if lines.is_finite() {
            self.scroll_remainder += lines;
        }
        let whole = self.scroll_remainder.trunc();
        self.scroll_remainder -= whole;
        let direction = if whole > 0.0 {
            ZoomDirection::In
        } else {
            ZoomDirection::Out
        };
        std::iter::repeat_n(SceneCommand::Zoom(direction), whole.abs() as usize)
    }

    /// Feed an absolute cursor position; motion since the previous
    /// position is accumulated.
    pub fn handle_cursor_moved(&mut self, x: f32, y: f32) {
        if let Some(delta) = self.cursor.moved_to(x, y) {
            let _ = self.handle_event(InputEvent::MouseMotion {
                dx: delta.x,
                dy: delta.y,
            });
        }
    }

    /// The cursor left the window; the next position starts a new track.
    pub fn handle_cursor_left(&mut self) {
        self.cursor.reset();
    }

    /// Take the pending motion, leaving the accumulator at zero.
    pub fn drain_motion(&mut self) -> MotionFrame {
        MotionFrame {
            delta: std::mem::take(&mut self.pending),
            primary_held: self.primary_held,
            secondary_held: self.secondary_held,
        }
    }

    fn handle_mouse_button(
        &mut self,
        button: MouseButton,
        pressed: bool,
    ) -> Option<SceneCommand> {
        match button {
            MouseButton::Left => {
                self.primary_held = pressed;
                None
            }
            MouseButton::Right => {
                self.secondary_held = pressed;
                None
            }
            MouseButton::Middle => None,
            MouseButton::WheelUp => {
                pressed.then_some(SceneCommand::Zoom(ZoomDirection::In))
            }
            MouseButton::WheelDown => {
                pressed.then_some(SceneCommand::Zoom(ZoomDirection::Out))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(button: MouseButton) -> InputEvent {
        InputEvent::MouseButton {
            button,
            pressed: true,
        }
    }

    #[test]
    fn motion_accumulates_until_drained() {
        let mut input = InputProcessor::new();
        for (dx, dy) in [(2.0, 1.0), (3.0, -4.0)] {
            let _ = input.handle_event(InputEvent::MouseMotion { dx, dy });
        }
        let _ = input.handle_event(press(MouseButton::Left));

        let frame = input.drain_motion();
        assert_eq!(frame.delta, Vec2::new(5.0, -3.0));
        assert!(frame.primary_held);
        assert!(!frame.secondary_held);
        assert_eq!(input.drain_motion().delta, Vec2::ZERO);
    }

    #[test]
    fn wheel_presses_become_zoom_commands() {
        let mut input = InputProcessor::new();
        assert_eq!(
            input.handle_event(press(MouseButton::WheelUp)),
            Some(SceneCommand::Zoom(ZoomDirection::In))
        );
        assert_eq!(
            input.handle_event(press(MouseButton::WheelDown)),
            Some(SceneCommand::Zoom(ZoomDirection::Out))
        );
        let release = InputEvent::MouseButton {
            button: MouseButton::WheelUp,
            pressed: false,
        };
        assert_eq!(input.handle_event(release), None);
    }

    #[test]
    fn fractional_scroll_lines_accumulate() {
        let mut input = InputProcessor::new();
        assert_eq!(input.handle_scroll(0.5).count(), 0);
        let zoom_in: Vec<_> = input.handle_scroll(0.5).collect();
        assert_eq!(zoom_in, vec![SceneCommand::Zoom(ZoomDirection::In)]);

        let zoom_out: Vec<_> = input.handle_scroll(-2.25).collect();
        assert_eq!(zoom_out, vec![SceneCommand::Zoom(ZoomDirection::Out); 2]);
        assert_eq!(input.handle_scroll(f32::NAN).count(), 0);
        assert_eq!(input.handle_scroll(0.25).count(), 0);
    }

    #[test]
    fn button_release_clears_held_state() {
        let mut input = InputProcessor::new();
        let _ = input.handle_event(press(MouseButton::Right));
        assert!(input.secondary_held());
        let _ = input.handle_event(InputEvent::MouseButton {
            button: MouseButton::Right,
            pressed: false,
        });
        assert!(!input.secondary_held());
    }

    #[test]
    fn cursor_positions_feed_motion() {
        let mut input = InputProcessor::new();
        input.handle_cursor_moved(100.0, 100.0);
        input.handle_cursor_moved(110.0, 95.0);
        input.handle_cursor_moved(111.0, 95.0);
        assert_eq!(input.pending_motion(), Vec2::new(11.0, -5.0));
    }
}
