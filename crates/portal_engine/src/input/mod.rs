//! Input samples delivered by the platform input collaborator
//!
//! The platform layer normalizes touch/mouse gestures into one
//! [`InputSample`] per tick. The core never sees raw events.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::foundation::math::Vec2;

/// Normalized per-tick input
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct InputSample {
    /// A gesture is in progress this tick
    pub active: bool,
    /// Horizontal pan delta
    pub dx: f32,
    /// Vertical pan delta
    pub dy: f32,
    /// Change of pinch span; spreading walks forward like panning up
    #[serde(default)]
    pub pinch_span_delta: f32,
}

impl InputSample {
    /// No gesture this tick
    pub fn idle() -> Self {
        Self::default()
    }

    /// A pan gesture
    pub fn pan(dx: f32, dy: f32) -> Self {
        Self {
            active: true,
            dx,
            dy,
            pinch_span_delta: 0.0,
        }
    }

    /// A pinch gesture
    pub fn pinch(span_delta: f32) -> Self {
        Self {
            active: true,
            dx: 0.0,
            dy: 0.0,
            pinch_span_delta: span_delta,
        }
    }

    /// Combined delta: `x` drives the angle, `y` the radius
    pub fn delta(&self) -> Vec2 {
        Vec2::new(self.dx, self.dy + self.pinch_span_delta)
    }
}

/// Rolling history of the most recent gesture deltas
#[derive(Debug, Clone)]
pub struct InputHistory {
    samples: VecDeque<Vec2>,
    capacity: usize,
}

impl InputHistory {
    /// Create a history keeping at most `capacity` samples
    pub fn new(capacity: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Record a delta, evicting the oldest when full
    pub fn push(&mut self, delta: Vec2) {
        if self.capacity == 0 {
            return;
        }
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(delta);
    }

    /// Forget every sample
    pub fn clear(&mut self) {
        self.samples.clear();
    }

    /// Number of recorded samples
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether nothing is recorded
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Per axis, the recorded delta with the largest magnitude (sign kept)
    pub fn peak(&self) -> Vec2 {
        let pick = |a: f32, b: f32| if b.abs() > a.abs() { b } else { a };
        self.samples
            .iter()
            .fold(Vec2::zeros(), |acc, s| Vec2::new(pick(acc.x, s.x), pick(acc.y, s.y)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pinch_adds_to_vertical() {
        let sample = InputSample {
            active: true,
            dx: 0.1,
            dy: 0.2,
            pinch_span_delta: 0.05,
        };
        approx::assert_relative_eq!(sample.delta(), Vec2::new(0.1, 0.25), epsilon = 1e-6);
    }

    #[test]
    fn test_history_keeps_most_recent() {
        let mut history = InputHistory::new(4);
        for i in 0u8..6 {
            history.push(Vec2::new(f32::from(i), 0.0));
        }
        assert_eq!(history.len(), 4);
        assert_eq!(history.peak(), Vec2::new(5.0, 0.0));
    }

    #[test]
    fn test_peak_keeps_sign_per_axis() {
        let mut history = InputHistory::new(4);
        history.push(Vec2::new(0.02, -0.01));
        history.push(Vec2::new(-0.05, 0.005));
        history.push(Vec2::new(0.01, -0.03));
        assert_eq!(history.peak(), Vec2::new(-0.05, -0.03));
    }
}
