//! # Unified Configuration System
//!
//! All tunables of the portal engine in one place. Every section has sensible
//! defaults matching the demo gallery, a builder-style API, and a
//! `validate()` that rejects values the traversal or resolver cannot honour.
//!
//! ## Configuration Categories
//!
//! - **Render Config**: recursion depth, field of view, clip distances
//! - **Motion Config**: input gains, fling behaviour, walkable ring, collision margins
//! - **Capacity Config**: fixed limits of the scene registry

use serde::{Deserialize, Serialize};

pub use crate::config::{Config, ConfigError};

/// Scenes are identified by one stencil bit each in an 8-bit stencil buffer
pub const STENCIL_BITS: usize = 8;

/// Size of the light array uploaded per scene draw
pub const MAX_LIGHTS_PER_SCENE: usize = 8;

/// Deepest portal nesting a configuration may request; the command count
/// grows with the number of visible portals raised to this power
pub const MAX_RECURSION_DEPTH: u8 = 8;

/// # Render Configuration
///
/// Parameters of the player camera and the portal recursion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Maximum portal nesting depth rendered per frame. The nesting depth
    /// doubles as the stencil reference, hence `u8`.
    pub max_recursion_depth: u8,
    /// Field of view in degrees; vertical on portrait viewports (height ≥
    /// width), horizontal on landscape ones
    pub fov_degrees: f32,
    /// Distance to the near clipping plane
    pub near: f32,
    /// Distance to the far clipping plane
    pub far: f32,
    /// Thickness of the box volume substituted for a portal quad when the
    /// player stands in its threshold
    pub portal_volume_thickness: f32,
}

impl RenderConfig {
    /// Set the maximum recursion depth
    pub fn with_max_recursion_depth(mut self, depth: u8) -> Self {
        self.max_recursion_depth = depth;
        self
    }

    /// Set the field of view in degrees
    pub fn with_fov_degrees(mut self, fov: f32) -> Self {
        self.fov_degrees = fov;
        self
    }

    /// Set the clip distances
    pub fn with_clip_distances(mut self, near: f32, far: f32) -> Self {
        self.near = near;
        self.far = far;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_recursion_depth > MAX_RECURSION_DEPTH {
            return Err(ConfigError::Invalid(format!(
                "max_recursion_depth must be at most {}, got {}",
                MAX_RECURSION_DEPTH, self.max_recursion_depth
            )));
        }
        if !(self.fov_degrees > 0.0 && self.fov_degrees < 180.0) {
            return Err(ConfigError::Invalid(format!(
                "fov_degrees must be in (0, 180), got {}",
                self.fov_degrees
            )));
        }
        if self.near <= 0.0 || self.far <= self.near {
            return Err(ConfigError::Invalid(format!(
                "clip distances must satisfy 0 < near < far, got near={} far={}",
                self.near, self.far
            )));
        }
        if self.portal_volume_thickness <= 0.0 {
            return Err(ConfigError::Invalid("portal_volume_thickness must be positive".to_string()));
        }
        Ok(())
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            max_recursion_depth: 2,
            fov_degrees: 60.0,
            near: 0.1,
            far: 100.0,
            portal_volume_thickness: 0.25,
        }
    }
}

/// # Motion Configuration
///
/// Converts normalized input deltas into polar motion and bounds the
/// walkable ring around the world origin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionConfig {
    /// Angular delta per unit of horizontal pan (applied negated)
    pub angular_gain: f32,
    /// Radial delta per unit of vertical pan/pinch, scaled by current radius (applied negated)
    pub radial_gain: f32,
    /// Number of recent input samples considered for a fling
    pub fling_history: usize,
    /// Minimum combined sample magnitude that starts a fling
    pub fling_threshold: f32,
    /// Per-tick multiplicative decay of fling velocity
    pub fling_decay: f32,
    /// A fling whose velocity magnitude decays below this stops
    pub fling_min_velocity: f32,
    /// Closest the player may approach the world origin
    pub inner_bounding_radius: f32,
    /// Furthest the player may wander from the world origin
    pub outer_bounding_radius: f32,
    /// Collision radius of the player against static obstacles
    pub player_radius: f32,
    /// Margin kept between the player and portal backing volumes
    pub collision_buffer: f32,
    /// Height of the camera above the ground plane
    pub eye_height: f32,
    /// Simulated seconds per tick
    pub tick_seconds: f32,
}

impl MotionConfig {
    /// Set the walkable ring
    pub fn with_bounds(mut self, inner: f32, outer: f32) -> Self {
        self.inner_bounding_radius = inner;
        self.outer_bounding_radius = outer;
        self
    }

    /// Set the fling parameters
    pub fn with_fling(mut self, threshold: f32, decay: f32, min_velocity: f32) -> Self {
        self.fling_threshold = threshold;
        self.fling_decay = decay;
        self.fling_min_velocity = min_velocity;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.inner_bounding_radius <= 0.0 {
            return Err(ConfigError::Invalid(
                "inner_bounding_radius must be positive so the view direction is defined".to_string(),
            ));
        }
        if self.outer_bounding_radius <= self.inner_bounding_radius {
            return Err(ConfigError::Invalid(format!(
                "outer_bounding_radius {} must exceed inner_bounding_radius {}",
                self.outer_bounding_radius, self.inner_bounding_radius
            )));
        }
        if self.fling_history == 0 {
            return Err(ConfigError::Invalid("fling_history must be at least 1".to_string()));
        }
        if !(self.fling_decay > 0.0 && self.fling_decay < 1.0) {
            return Err(ConfigError::Invalid(format!(
                "fling_decay must be in (0, 1), got {}",
                self.fling_decay
            )));
        }
        if self.fling_min_velocity <= 0.0 || self.fling_threshold < 0.0 {
            return Err(ConfigError::Invalid("fling thresholds must be positive".to_string()));
        }
        if self.player_radius < 0.0 || self.collision_buffer < 0.0 {
            return Err(ConfigError::Invalid("collision margins cannot be negative".to_string()));
        }
        if self.tick_seconds <= 0.0 {
            return Err(ConfigError::Invalid("tick_seconds must be positive".to_string()));
        }
        Ok(())
    }
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            angular_gain: 2.0,
            radial_gain: 1.0,
            fling_history: 4,
            fling_threshold: 0.01,
            fling_decay: 0.88,
            fling_min_velocity: 0.0005,
            inner_bounding_radius: 0.5,
            outer_bounding_radius: 6.0,
            player_radius: 0.2,
            collision_buffer: 0.05,
            eye_height: 1.5,
            tick_seconds: 1.0 / 60.0,
        }
    }
}

/// # Capacity Configuration
///
/// Limits of the scene registry. Exceeding any of them is a content error
/// reported at load time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CapacityConfig {
    /// Maximum number of scenes (one stencil bit each)
    pub max_scenes: usize,
    /// Maximum number of permanent portals per scene
    pub max_portals_per_scene: usize,
    /// Maximum number of entities per scene
    pub max_entities_per_scene: usize,
    /// Size of each scene's shared light array
    pub max_lights_per_scene: usize,
}

impl CapacityConfig {
    /// Copy with the scene and light limits cut down to what the stencil
    /// buffer and the uniform light array can hold
    pub fn bounded(&self) -> Self {
        Self {
            max_scenes: self.max_scenes.min(STENCIL_BITS),
            max_lights_per_scene: self.max_lights_per_scene.min(MAX_LIGHTS_PER_SCENE),
            ..self.clone()
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_scenes == 0 || self.max_scenes > STENCIL_BITS {
            return Err(ConfigError::Invalid(format!(
                "max_scenes must be in 1..={}, got {}",
                STENCIL_BITS, self.max_scenes
            )));
        }
        if self.max_lights_per_scene > MAX_LIGHTS_PER_SCENE {
            return Err(ConfigError::Invalid(format!(
                "max_lights_per_scene must be at most {}, got {}",
                MAX_LIGHTS_PER_SCENE, self.max_lights_per_scene
            )));
        }
        Ok(())
    }
}

impl Default for CapacityConfig {
    fn default() -> Self {
        Self {
            max_scenes: 8,
            max_portals_per_scene: 8,
            max_entities_per_scene: 16,
            max_lights_per_scene: 8,
        }
    }
}

/// # Engine Configuration
///
/// Top-level configuration aggregating every subsystem.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Log filter used when `RUST_LOG` is not set
    pub log_level: String,
    /// Camera and recursion settings
    pub render: RenderConfig,
    /// Player motion settings
    pub motion: MotionConfig,
    /// Registry limits
    pub capacity: CapacityConfig,
}

impl EngineConfig {
    /// Set the render configuration
    pub fn with_render(mut self, render: RenderConfig) -> Self {
        self.render = render;
        self
    }

    /// Set the motion configuration
    pub fn with_motion(mut self, motion: MotionConfig) -> Self {
        self.motion = motion;
        self
    }

    /// Set the capacity configuration
    pub fn with_capacity(mut self, capacity: CapacityConfig) -> Self {
        self.capacity = capacity;
        self
    }

    /// Validate every section
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.render.validate()?;
        self.motion.validate()?;
        self.capacity.validate()?;
        Ok(())
    }

    /// Log filter, defaulting to `info`
    pub fn log_filter(&self) -> &str {
        if self.log_level.is_empty() { "info" } else { &self.log_level }
    }
}

impl Config for EngineConfig {}
