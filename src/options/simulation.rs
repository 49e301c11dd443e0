use serde::{Deserialize, Serialize};

/// Step size handed to the particle simulation each frame.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum StepPolicy {
    /// Always advance by
    /// [`SIMULATION_STEP`](crate::simulation::SIMULATION_STEP), regardless
    /// of frame time.
    #[default]
    Fixed,
    /// Advance by the measured frame time, clamped to `max_step`. A
    /// negative `max_step` yields a zero step.
    FrameDelta,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
/// How the simulation is stepped.
pub struct SimulationOptions {
    /// Step policy.
    pub step: StepPolicy,
    /// Upper bound on a frame-delta step, in seconds.
    pub max_step: f32,
}

impl Default for SimulationOptions {
    fn default() -> Self {
        Self {
            step: StepPolicy::Fixed,
            max_step: 0.05,
        }
    }
}

impl SimulationOptions {
    /// Step for a frame that took `frame_seconds`.
    #[must_use]
    pub fn step_for(&self, frame_seconds: f32) -> f32 {
        match self.step {
            StepPolicy::Fixed => crate::simulation::SIMULATION_STEP,
            StepPolicy::FrameDelta => frame_seconds.min(self.max_step).max(0.0),
        }
    }
}
