use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
/// Billboard batch capacity and appearance.
pub struct ParticleOptions {
    /// Slots in the quad template and position buffer.
    pub max_particles: u32,
    /// Billboard half-extent in world units.
    pub size: f32,
}

impl Default for ParticleOptions {
    fn default() -> Self {
        Self {
            max_particles: 1000,
            size: 0.5,
        }
    }
}
