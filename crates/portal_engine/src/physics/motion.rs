//! Input-driven motion and inertial fling
//!
//! While a gesture is active its deltas move the player directly. When the
//! gesture ends, the strongest recent delta per axis becomes a fling velocity
//! that keeps moving the player and decays exponentially each tick.

use crate::core::config::MotionConfig;
use crate::foundation::math::Vec2;
use crate::input::{InputHistory, InputSample};

/// Input history and fling velocity of the player
#[derive(Debug, Clone)]
pub struct PlayerMotion {
    history: InputHistory,
    fling: Vec2,
    gesture_active: bool,
}

impl PlayerMotion {
    /// Create a motion state remembering `history_len` samples
    pub fn new(history_len: usize) -> Self {
        Self {
            history: InputHistory::new(history_len),
            fling: Vec2::zeros(),
            gesture_active: false,
        }
    }

    /// Current fling velocity
    pub fn fling_velocity(&self) -> Vec2 {
        self.fling
    }

    /// Whether the player is still coasting
    pub fn is_flinging(&self) -> bool {
        self.fling != Vec2::zeros()
    }

    /// Stop any fling and forget the gesture history
    pub fn halt(&mut self) {
        self.fling = Vec2::zeros();
        self.history.clear();
        self.gesture_active = false;
    }

    /// Delta to apply this tick, in input units
    pub fn next_delta(&mut self, input: &InputSample, config: &MotionConfig) -> Vec2 {
        if input.active {
            let delta = input.delta();
            self.history.push(delta);
            self.fling = Vec2::zeros();
            self.gesture_active = true;
            return delta;
        }

        if self.gesture_active {
            self.gesture_active = false;
            let peak = self.history.peak();
            self.fling = if peak.magnitude() > config.fling_threshold {
                log::debug!("Fling started at ({:.4}, {:.4})", peak.x, peak.y);
                peak
            } else {
                Vec2::zeros()
            };
            self.history.clear();
        }

        let delta = self.fling;
        self.fling *= config.fling_decay;
        if self.fling.magnitude() < config.fling_min_velocity {
            self.fling = Vec2::zeros();
        }
        delta
    }
}

/// Convert an input delta into `(Δθ, Δr)` at the given radius
pub fn polar_delta(delta: Vec2, radius: f32, config: &MotionConfig) -> (f32, f32) {
    let d_theta = -config.angular_gain * delta.x;
    let d_radius = -config.radial_gain * delta.y * radius;
    (d_theta, d_radius)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_active_input_passes_through() {
        let config = MotionConfig::default();
        let mut motion = PlayerMotion::new(4);
        let delta = motion.next_delta(&InputSample::pan(0.1, -0.2), &config);
        assert_eq!(delta, Vec2::new(0.1, -0.2));
        assert!(!motion.is_flinging());
    }

    #[test]
    fn test_polar_delta_gains() {
        let config = MotionConfig::default();
        let (d_theta, d_radius) = polar_delta(Vec2::new(0.1, 0.25), 2.0, &config);
        assert_relative_eq!(d_theta, -0.2);
        assert_relative_eq!(d_radius, -0.5);
    }

    #[test]
    fn test_fling_uses_peak_of_last_samples_and_decays_to_zero() {
        let config = MotionConfig::default();
        let mut motion = PlayerMotion::new(config.fling_history);

        // The first sample falls out of the four-sample window
        for sample in [(0.0, 0.9), (0.03, 0.0), (-0.05, 0.01), (0.02, 0.02), (0.0, 0.0)] {
            motion.next_delta(&InputSample::pan(sample.0, sample.1), &config);
        }

        let first = motion.next_delta(&InputSample::idle(), &config);
        assert_relative_eq!(first, Vec2::new(-0.05, 0.02), epsilon = 1e-6);

        let second = motion.next_delta(&InputSample::idle(), &config);
        assert_relative_eq!(second, first * config.fling_decay, epsilon = 1e-6);

        let mut ticks = 0;
        while motion.is_flinging() {
            motion.next_delta(&InputSample::idle(), &config);
            ticks += 1;
            assert!(ticks < 200, "fling never settled");
        }
        assert_eq!(motion.next_delta(&InputSample::idle(), &config), Vec2::zeros());
    }

    #[test]
    fn test_fling_stops_on_velocity_magnitude() {
        let config = MotionConfig {
            fling_threshold: 0.01,
            fling_decay: 1.0,
            fling_min_velocity: 0.05,
            ..MotionConfig::default()
        };

        // Both components are below the minimum but the magnitude is not
        let mut motion = PlayerMotion::new(config.fling_history);
        motion.next_delta(&InputSample::pan(0.04, 0.04), &config);
        motion.next_delta(&InputSample::idle(), &config);
        assert!(motion.is_flinging());

        let mut motion = PlayerMotion::new(config.fling_history);
        motion.next_delta(&InputSample::pan(0.03, 0.03), &config);
        assert_relative_eq!(motion.next_delta(&InputSample::idle(), &config), Vec2::new(0.03, 0.03));
        assert!(!motion.is_flinging());
    }

    #[test]
    fn test_gentle_release_does_not_fling() {
        let config = MotionConfig::default();
        let mut motion = PlayerMotion::new(config.fling_history);
        motion.next_delta(&InputSample::pan(0.001, 0.002), &config);
        assert_eq!(motion.next_delta(&InputSample::idle(), &config), Vec2::zeros());
        assert!(!motion.is_flinging());
    }

    #[test]
    fn test_new_gesture_cancels_fling() {
        let config = MotionConfig::default();
        let mut motion = PlayerMotion::new(config.fling_history);
        motion.next_delta(&InputSample::pan(0.2, 0.0), &config);
        motion.next_delta(&InputSample::idle(), &config);
        assert!(motion.is_flinging());
        motion.next_delta(&InputSample::pan(0.0, 0.0), &config);
        assert!(!motion.is_flinging());
    }
}
