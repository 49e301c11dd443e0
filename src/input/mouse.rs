use glam::Vec2;

/// Derives relative motion from successive absolute cursor positions.
#[derive(Debug, Default)]
pub(crate) struct CursorTracker {
    last: Option<Vec2>,
}

impl CursorTracker {
    /// Record a new cursor position and return the motion since the last
    /// one. The first position after creation or [`reset`](Self::reset)
    /// yields no motion.
    pub(crate) fn moved_to(&mut self, x: f32, y: f32) -> Option<Vec2> {
        let pos = Vec2::new(x, y);
        let delta = self.last.map(|last| pos - last);
        self.last = Some(pos);
        delta
    }

    /// Forget the last position (cursor left the window).
    pub(crate) fn reset(&mut self) {
        self.last = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn motion_is_difference_of_positions() {
        let mut tracker = CursorTracker::default();
        assert_eq!(tracker.moved_to(10.0, 10.0), None);
        assert_eq!(tracker.moved_to(13.0, 8.0), Some(Vec2::new(3.0, -2.0)));
        tracker.reset();
        assert_eq!(tracker.moved_to(0.0, 0.0), None);
    }
}
