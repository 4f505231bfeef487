//! Player position and per-player motion state
//!
//! The player walks on a ring around the world origin. Position is stored
//! canonically in polar form; the cartesian form is always derived from it,
//! so the two can never disagree.

use super::motion::PlayerMotion;
use crate::core::config::MotionConfig;
use crate::foundation::math::{utils, Vec2, Vec3};

/// Player position on the ground plane plus eye height
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayerPosition {
    theta: f32,
    radius: f32,
    eye_height: f32,
}

impl PlayerPosition {
    /// Create a position from polar coordinates; the angle is wrapped into
    /// `[0, 2π)` and a negative radius is reflected through the origin.
    pub fn from_polar(theta: f32, radius: f32, eye_height: f32) -> Self {
        let (theta, radius) = if radius < 0.0 {
            (theta + std::f32::consts::PI, -radius)
        } else {
            (theta, radius)
        };
        Self {
            theta: utils::wrap_angle(theta),
            radius,
            eye_height,
        }
    }

    /// Create a position from cartesian coordinates
    pub fn from_xyz(x: f32, y: f32, z: f32) -> Self {
        Self {
            theta: utils::wrap_angle(y.atan2(x)),
            radius: x.hypot(y),
            eye_height: z,
        }
    }

    /// Create a position from a ground point at the given eye height
    pub fn from_ground(point: Vec2, eye_height: f32) -> Self {
        Self::from_xyz(point.x, point.y, eye_height)
    }

    /// Angle around the world origin in `[0, 2π)`
    pub fn theta(&self) -> f32 {
        self.theta
    }

    /// Distance from the world origin
    pub fn radius(&self) -> f32 {
        self.radius
    }

    /// Camera height above the ground
    pub fn eye_height(&self) -> f32 {
        self.eye_height
    }

    /// Cartesian form
    pub fn xyz(&self) -> Vec3 {
        let (sin, cos) = self.theta.sin_cos();
        Vec3::new(self.radius * cos, self.radius * sin, self.eye_height)
    }

    /// Position on the ground plane
    pub fn ground(&self) -> Vec2 {
        let (sin, cos) = self.theta.sin_cos();
        Vec2::new(self.radius * cos, self.radius * sin)
    }

    /// Horizontal view direction: the player always faces the world origin
    pub fn view_direction(&self) -> Vec2 {
        let (sin, cos) = self.theta.sin_cos();
        Vec2::new(-cos, -sin)
    }

    /// Position displaced by a polar delta
    pub fn offset(&self, d_theta: f32, d_radius: f32) -> Self {
        Self::from_polar(self.theta + d_theta, self.radius + d_radius, self.eye_height)
    }

    /// Same angle, radius clamped into `[inner, outer]`
    pub fn clamp_radius(&self, inner: f32, outer: f32) -> Self {
        Self {
            radius: utils::clamp(self.radius, inner, outer),
            ..*self
        }
    }
}

/// Everything the resolver tracks about the player between ticks
#[derive(Debug, Clone)]
pub struct PlayerState {
    /// Current position
    pub position: PlayerPosition,
    /// Input history and fling velocity
    pub motion: PlayerMotion,
}

impl PlayerState {
    /// Create a player standing still at `position`
    pub fn new(position: PlayerPosition, config: &MotionConfig) -> Self {
        Self {
            position,
            motion: PlayerMotion::new(config.fling_history),
        }
    }
}
