use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
/// Window and presentation settings.
pub struct DisplayOptions {
    /// Cap presentation to the display refresh rate.
    pub vsync: bool,
    /// Framebuffer clear color (RGBA).
    pub clear_color: [f32; 4],
    /// Window title prefix; the frame rate is appended.
    pub title: String,
    /// Initial window width in logical pixels.
    pub width: u32,
    /// Initial window height in logical pixels.
    pub height: u32,
}

impl Default for DisplayOptions {
    fn default() -> Self {
        Self {
            vsync: true,
            clear_color: [1.0, 0.769, 0.0, 0.0],
            title: "Metaballs".to_owned(),
            width: 1280,
            height: 720,
        }
    }
}
