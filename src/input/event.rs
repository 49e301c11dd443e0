/// Platform-agnostic input events.
///
/// These are fed into an [`InputProcessor`](super::InputProcessor), which
/// accumulates motion for the next frame and converts wheel presses into
/// [`SceneCommand`](crate::scene::SceneCommand) values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    /// Relative mouse motion since the previous event.
    MouseMotion {
        /// Horizontal delta in physical pixels.
        dx: f32,
        /// Vertical delta in physical pixels.
        dy: f32,
    },
    /// Mouse button (or wheel click) pressed or released.
    MouseButton {
        /// Which button changed.
        button: MouseButton,
        /// `true` for press, `false` for release.
        pressed: bool,
    },
}

/// Platform-agnostic mouse button identifier. Wheel clicks are reported as
/// buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    /// Primary (left) mouse button.
    Left,
    /// Secondary (right) mouse button.
    Right,
    /// Middle mouse button (wheel click).
    Middle,
    /// One wheel notch away from the user.
    WheelUp,
    /// One wheel notch toward the user.
    WheelDown,
}

#[cfg(feature = "viewer")]
impl From<winit::event::MouseButton> for MouseButton {
    fn from(button: winit::event::MouseButton) -> Self {
        match button {
            winit::event::MouseButton::Left => Self::Left,
            winit::event::MouseButton::Right => Self::Right,
            _ => Self::Middle,
        }
    }
}

/// Wheel travel in lines for a winit scroll delta. Pixel deltas count as
/// one line per event, by sign.
#[cfg(feature = "viewer")]
#[must_use]
pub fn scroll_lines(delta: winit::event::MouseScrollDelta) -> f32 {
    match delta {
        winit::event::MouseScrollDelta::LineDelta(_, y) => y,
        winit::event::MouseScrollDelta::PixelDelta(pos) => {
            if pos.y == 0.0 {
                0.0
            } else {
                (pos.y as f32).signum()
            }
        }
    }
}
