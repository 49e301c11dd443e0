use web_time::Instant;

/// Accumulated time after which the smoothed rate is recomputed.
pub const RATE_UPDATE_INTERVAL: f32 = 0.1;

/// Per-frame wall-clock timing with a smoothed frames-per-second counter.
///
/// Call [`begin`](Self::begin) before the frame's work and
/// [`end`](Self::end) after it. The rate is recomputed whenever the
/// accumulated frame time exceeds [`RATE_UPDATE_INTERVAL`], as
/// `frames / interval`, after which the counters restart from zero.
#[derive(Debug, Clone)]
pub struct FrameClock {
    start: Option<Instant>,
    /// Most recent single-frame duration in seconds.
    frame_time: f32,
    /// Frames counted since the last rate update.
    counter: u32,
    /// Seconds accumulated since the last rate update.
    accumulated: f32,
    /// Last computed smoothed rate.
    rate: u32,
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameClock {
    /// Clock with no frame recorded yet.
    #[must_use]
    pub fn new() -> Self {
        Self {
            start: None,
            frame_time: 0.0,
            counter: 0,
            accumulated: 0.0,
            rate: 0,
        }
    }

    /// Mark the start of a frame.
    pub fn begin(&mut self) {
        self.begin_at(Instant::now());
    }

    /// Mark the end of a frame and update the smoothed rate.
    ///
    /// Returns `true` when the rate was recomputed.
    pub fn end(&mut self) -> bool {
        self.end_at(Instant::now())
    }

    /// [`begin`](Self::begin) with an explicit timestamp.
    pub fn begin_at(&mut self, now: Instant) {
        self.start = Some(now);
    }

    /// [`end`](Self::end) with an explicit timestamp. An `end` without a
    /// matching `begin` counts as a zero-length frame.
    pub fn end_at(&mut self, now: Instant) -> bool {
        let duration = self
            .start
            .take()
            .map_or(0.0, |start| now.duration_since(start).as_secs_f32());

        self.frame_time = duration;
        self.counter += 1;
        self.accumulated += duration;

        if self.accumulated > RATE_UPDATE_INTERVAL {
            self.rate =
                (self.counter as f32 * RATE_UPDATE_INTERVAL.recip()) as u32;
            self.counter = 0;
            self.accumulated = 0.0;
            return true;
        }
        false
    }

    /// Duration of the most recent frame in seconds.
    #[must_use]
    pub fn elapsed_seconds(&self) -> f32 {
        self.frame_time
    }

    /// Last smoothed frames-per-second value.
    #[must_use]
    pub fn rate(&self) -> u32 {
        self.rate
    }

    /// Text form of [`rate`](Self::rate) for on-screen display.
    #[must_use]
    pub fn rate_label(&self) -> String {
        format!("FPS: {}", self.rate)
    }

    /// Frames counted toward the next rate update.
    #[must_use]
    pub fn pending_frames(&self) -> u32 {
        self.counter
    }

    /// Seconds accumulated toward the next rate update.
    #[must_use]
    pub fn pending_seconds(&self) -> f32 {
        self.accumulated
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn run_frames(
        clock: &mut FrameClock,
        frames: u32,
        each: Duration,
    ) -> Vec<bool> {
        let mut t = Instant::now();
        (0..frames)
            .map(|_| {
                clock.begin_at(t);
                t += each;
                clock.end_at(t)
            })
            .collect()
    }

    #[test]
    fn elapsed_is_last_frame_duration() {
        let mut clock = FrameClock::new();
        let _ = run_frames(&mut clock, 1, Duration::from_millis(16));
        assert!((clock.elapsed_seconds() - 0.016).abs() < 1e-4);
        assert_eq!(clock.rate(), 0);
    }

    #[test]
    fn rate_updates_after_threshold_and_resets() {
        let mut clock = FrameClock::new();
        let updates = run_frames(&mut clock, 10, Duration::from_millis(11));

        // 9 frames = 0.099s (below threshold), the 10th crosses it.
        assert!(updates[..9].iter().all(|u| !u));
        assert!(updates[9]);
        assert_eq!(clock.rate(), 100);
        assert_eq!(clock.pending_frames(), 0);
        assert_eq!(clock.pending_seconds(), 0.0);
        assert_eq!(clock.rate_label(), "FPS: 100");
    }

    #[test]
    fn rate_is_held_between_updates() {
        let mut clock = FrameClock::new();
        let _ = run_frames(&mut clock, 3, Duration::from_millis(40));
        // 0.12s over 3 frames -> 3 / 0.1
        assert_eq!(clock.rate(), 30);

        let _ = run_frames(&mut clock, 2, Duration::from_millis(20));
        assert_eq!(clock.rate(), 30);
        assert_eq!(clock.pending_frames(), 2);
    }

    #[test]
    fn end_without_begin_counts_zero_length_frame() {
        let mut clock = FrameClock::new();
        assert!(!clock.end_at(Instant::now()));
        assert_eq!(clock.elapsed_seconds(), 0.0);
        assert_eq!(clock.pending_frames(), 1);
    }
}
