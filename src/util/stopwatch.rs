use std::time::Duration;

use web_time::Instant;

/// Logs per-stage and total durations of a multi-step operation.
///
/// ```ignore
/// let mut timer = Stopwatch::start("scene setup");
/// build_shadow_map();
/// timer.split("shadow map");
/// upload_billboards();
/// timer.split("billboards");
/// timer.stop();
/// ```
#[derive(Debug)]
pub struct Stopwatch {
    label: &'static str,
    started: Instant,
    last_split: Instant,
}

impl Stopwatch {
    /// Start timing `label`.
    #[must_use]
    pub fn start(label: &'static str) -> Self {
        let now = Instant::now();
        Self {
            label,
            started: now,
            last_split: now,
        }
    }

    /// Log the time since the previous split (or start) under `stage` and
    /// return it.
    pub fn split(&mut self, stage: &str) -> Duration {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_split);
        self.last_split = now;
        log::info!(
            "{}: {stage} took {:.2} ms",
            self.label,
            elapsed.as_secs_f64() * 1000.0
        );
        elapsed
    }

    /// Log and return the total time since [`start`](Self::start).
    pub fn stop(self) -> Duration {
        let total = self.started.elapsed();
        log::info!(
            "{}: done in {:.2} ms",
            self.label,
            total.as_secs_f64() * 1000.0
        );
        total
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_never_exceed_total() {
        let mut timer = Stopwatch::start("test");
        let a = timer.split("a");
        let b = timer.split("b");
        let total = timer.stop();
        assert!(a + b <= total);
    }
}
