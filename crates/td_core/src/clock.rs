//! Fixed-step frame clock.
//!
//! The host calls [`FrameClock::poll`] from its frame or timer callback
//! with a monotonic timestamp. The clock reports when a tick is due and
//! never asks for more than one tick per call, so a stalled host resumes
//! at normal speed instead of fast-forwarding.

use crate::simulation::TICK_DURATION_MS;

/// Time-since-last-tick accumulator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameClock {
    last_tick_ms: Option<u64>,
}

impl FrameClock {
    /// Clock that has not seen a frame yet.
    #[must_use]
    pub const fn new() -> Self {
        Self { last_tick_ms: None }
    }

    /// Report a frame at `now_ms`. Returns true when one tick should run.
    ///
    /// The first frame only records the time.
    pub fn poll(&mut self, now_ms: u64) -> bool {
        let Some(last) = self.last_tick_ms else {
            self.last_tick_ms = Some(now_ms);
            return false;
        };
        if now_ms.saturating_sub(last) >= u64::from(TICK_DURATION_MS) {
            self.last_tick_ms = Some(now_ms);
            true
        } else {
            false
        }
    }

    /// Forget the last frame, e.g. after a pause.
    pub fn reset(&mut self) {
        self.last_tick_ms = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_poll_only_records() {
        let mut clock = FrameClock::new();
        assert!(!clock.poll(1000));
        assert!(!clock.poll(1010));
        assert!(clock.poll(1016));
    }

    #[test]
    fn test_one_tick_per_poll_after_stall() {
        let mut clock = FrameClock::new();
        clock.poll(0);
        assert!(clock.poll(5000));
        assert!(!clock.poll(5001));
    }

    #[test]
    fn test_reset_waits_for_fresh_frame() {
        let mut clock = FrameClock::new();
        clock.poll(0);
        clock.reset();
        assert!(!clock.poll(100));
        assert!(clock.poll(116));
    }
}
