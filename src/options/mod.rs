//! Scene options with TOML file support.
//!
//! All tweakable settings (camera, light, shadow map, particle batch,
//! simulation stepping, window) are consolidated here. Every section uses
//! `#[serde(default)]`, so a file may override only the keys it names.

mod camera;
mod display;
mod light;
mod particles;
mod shadow;
mod simulation;

use std::path::Path;

pub use camera::CameraOptions;
pub use display::DisplayOptions;
pub use light::LightOptions;
pub use particles::ParticleOptions;
use serde::{Deserialize, Serialize};
pub use shadow::ShadowOptions;
pub use simulation::{SimulationOptions, StepPolicy};

use crate::error::SceneError;

/// Top-level options container.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct SceneOptions {
    /// Camera placement and controls.
    pub camera: CameraOptions,
    /// Spot light.
    pub light: LightOptions,
    /// Shadow map.
    pub shadow: ShadowOptions,
    /// Particle billboard batch.
    pub particles: ParticleOptions,
    /// Simulation stepping.
    pub simulation: SimulationOptions,
    /// Window and presentation.
    pub display: DisplayOptions,
}

impl SceneOptions {
    /// Load options from a TOML file. Missing fields use defaults.
    ///
    /// # Errors
    ///
    /// [`SceneError::Io`] if the file cannot be read,
    /// [`SceneError::OptionsParse`] if it is not valid options TOML.
    pub fn load(path: &Path) -> Result<Self, SceneError> {
        let content = std::fs::read_to_string(path).map_err(SceneError::Io)?;
        Self::from_toml(&content)
    }

    /// Parse options from TOML text.
    ///
    /// # Errors
    ///
    /// [`SceneError::OptionsParse`] on malformed input.
    pub fn from_toml(content: &str) -> Result<Self, SceneError> {
        toml::from_str(content)
            .map_err(|e| SceneError::OptionsParse(e.to_string()))
    }

    /// Save options to a TOML file (pretty-printed).
    ///
    /// # Errors
    ///
    /// [`SceneError::OptionsParse`] if serialization fails,
    /// [`SceneError::Io`] if the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), SceneError> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| SceneError::OptionsParse(e.to_string()))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(SceneError::Io)?;
        }
        std::fs::write(path, content).map_err(SceneError::Io)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_round_trips_through_toml() {
        let opts = SceneOptions::default();
        let toml_str = toml::to_string_pretty(&opts).unwrap();
        let parsed = SceneOptions::from_toml(&toml_str).unwrap();
        assert_eq!(opts, parsed);
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let toml_str = r"
[particles]
max_particles = 250

[simulation]
step = 'frame_delta'
";
        let opts = SceneOptions::from_toml(toml_str).unwrap();
        assert_eq!(opts.particles.max_particles, 250);
        assert_eq!(opts.simulation.step, StepPolicy::FrameDelta);
        // Everything else should be default
        assert_eq!(opts.particles.size, ParticleOptions::default().size);
        assert_eq!(opts.camera.rotate_sensitivity, 0.25);
        assert_eq!(opts.shadow.resolution, 1024);
        assert!(opts.display.vsync);
    }

    #[test]
    fn defaults_match_reference_scene() {
        let opts = SceneOptions::default();
        assert_eq!(opts.camera.position, [20.0, 10.0, 0.0]);
        assert_eq!(opts.camera.target, [0.0, 5.0, 0.0]);
        assert_eq!(opts.light.position, [30.0, 43.0, -26.0]);
        assert_eq!(opts.light.ambient, [0.749, 0.855, 0.902]);
        assert_eq!(opts.light.diffuse, [1.0, 0.875, 0.573]);
        assert_eq!(opts.display.clear_color, [1.0, 0.769, 0.0, 0.0]);
        assert_eq!(opts.particles.max_particles, 1000);
        assert_eq!(opts.simulation.step, StepPolicy::Fixed);
    }

    #[test]
    fn step_policy_selects_step() {
        let mut sim = SimulationOptions::default();
        assert_eq!(sim.step_for(0.2), 0.005);

        sim.step = StepPolicy::FrameDelta;
        assert_eq!(sim.step_for(0.016), 0.016);
        assert_eq!(sim.step_for(0.2), sim.max_step);
    }

    #[test]
    fn frame_delta_step_survives_bad_max_step() {
        let opts = SceneOptions::from_toml(
            "[simulation]\nstep = 'frame_delta'\nmax_step = -0.01",
        )
        .unwrap();
        assert_eq!(opts.simulation.step_for(0.016), 0.0);

        let sim = SimulationOptions {
            step: StepPolicy::FrameDelta,
            max_step: f32::NAN,
        };
        assert_eq!(sim.step_for(0.016), 0.016);
        assert_eq!(sim.step_for(-1.0), 0.0);
    }

    #[test]
    fn malformed_toml_is_parse_error() {
        let result = SceneOptions::from_toml("[camera\nfovy = ");
        assert!(matches!(result, Err(SceneError::OptionsParse(_))));
    }
}
