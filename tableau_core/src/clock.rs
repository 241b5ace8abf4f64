// Copyright 2026 the Tableau Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Frame clock.
//!
//! [`FrameClock`] turns the host's animation-frame timestamps into frame
//! indices and deltas. Deltas are clamped so a long stall (a backgrounded tab,
//! a debugger pause) does not turn into one enormous simulation step.

/// One advance of the clock.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameTime {
    /// Monotonically increasing frame index, starting at 0.
    pub frame_index: u64,
    /// Host timestamp of this frame, in milliseconds.
    pub timestamp_ms: f64,
    /// Time since the previous frame, clamped to `[0, max_delta_ms]`.
    pub delta_ms: f64,
}

/// Counts frames and measures clamped deltas between host timestamps.
#[derive(Clone, Debug)]
pub struct FrameClock {
    max_delta_ms: f64,
    next_index: u64,
    last_timestamp_ms: Option<f64>,
}

impl FrameClock {
    /// Creates a clock that clamps deltas to `max_delta_ms`.
    ///
    /// A negative or `NaN` limit is treated as 0, so every delta reads 0.
    #[must_use]
    pub fn new(max_delta_ms: f64) -> Self {
        let max_delta_ms = if max_delta_ms >= 0.0 {
            max_delta_ms
        } else {
            log::warn!("invalid max frame delta {max_delta_ms}ms, using 0");
            0.0
        };
        Self {
            max_delta_ms,
            next_index: 0,
            last_timestamp_ms: None,
        }
    }

    /// Advances to a frame at `timestamp_ms`.
    ///
    /// The first frame has a delta of zero, as does a timestamp that goes
    /// backwards.
    pub fn advance(&mut self, timestamp_ms: f64) -> FrameTime {
        let delta_ms = match self.last_timestamp_ms {
            Some(last) => (timestamp_ms - last).max(0.0).min(self.max_delta_ms),
            None => 0.0,
        };
        self.last_timestamp_ms = Some(timestamp_ms);
        let frame_index = self.next_index;
        self.next_index += 1;
        FrameTime {
            frame_index,
            timestamp_ms,
            delta_ms,
        }
    }

    /// Number of frames advanced so far.
    #[must_use]
    pub fn frame_count(&self) -> u64 {
        self.next_index
    }

    /// The delta clamp.
    #[must_use]
    pub fn max_delta_ms(&self) -> f64 {
        self.max_delta_ms
    }

    /// Forgets the previous timestamp so the next frame has a zero delta.
    ///
    /// Frame indices keep counting.
    pub fn reset(&mut self) {
        self.last_timestamp_ms = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_frame_has_zero_delta() {
        let mut clock = FrameClock::new(100.0);
        let t = clock.advance(1000.0);
        assert_eq!(t.frame_index, 0);
        assert_eq!(t.delta_ms, 0.0);
    }

    #[test]
    fn deltas_are_clamped() {
        let mut clock = FrameClock::new(100.0);
        clock.advance(0.0);
        assert_eq!(clock.advance(16.0).delta_ms, 16.0);
        assert_eq!(clock.advance(5000.0).delta_ms, 100.0);
        assert_eq!(clock.advance(4000.0).delta_ms, 0.0);
        assert_eq!(clock.frame_count(), 4);
    }

    #[test]
    fn invalid_limit_does_not_panic() {
        for max in [-5.0, f64::NAN] {
            let mut clock = FrameClock::new(max);
            assert_eq!(clock.max_delta_ms(), 0.0);
            clock.advance(0.0);
            assert_eq!(clock.advance(16.0).delta_ms, 0.0);
        }
    }

    #[test]
    fn reset_keeps_counting() {
        let mut clock = FrameClock::new(100.0);
        clock.advance(0.0);
        clock.advance(10.0);
        clock.reset();
        let t = clock.advance(20.0);
        assert_eq!(t.frame_index, 2);
        assert_eq!(t.delta_ms, 0.0);
    }
}
