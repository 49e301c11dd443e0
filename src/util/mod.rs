//! Shared utilities: frame timing and stage timers.

/// Per-frame timing and the smoothed frame rate.
pub mod frame_timing;
/// Split timer that logs stage durations.
pub mod stopwatch;
