//! # Player Camera
//!
//! The camera is derived from the player's position every frame: it stands at
//! the player's eye and always looks horizontally at the vertical axis through
//! the world origin, with +Z up.
//!
//! ## Coordinate System
//! World space is Z-up. View space is right-handed with the camera looking
//! down -Z, matching the OpenGL clip conventions of [`super::projection`].

use super::projection::{self, ClipPlane, ProjectionError};
use crate::core::config::RenderConfig;
use crate::foundation::math::{utils, Mat4, Mat4Ext, MathError, Vec2, Vec3};
use crate::physics::PlayerPosition;

/// Size of the render target in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

impl Viewport {
    /// Create a viewport
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Width over height (0 for a zero-height viewport)
    pub fn aspect(&self) -> f32 {
        projection::aspect_ratio(self.width, self.height)
    }

    /// Portrait viewports use a vertical field of view
    pub fn is_portrait(&self) -> bool {
        self.height >= self.width
    }
}

/// Perspective camera following the player
#[derive(Debug, Clone)]
pub struct PlayerCamera {
    /// Camera position in world space
    pub position: Vec3,

    /// Point the camera is looking at in world space
    pub target: Vec3,

    /// Up vector for camera orientation
    pub up: Vec3,

    /// Field of view in radians; vertical or horizontal depending on the
    /// viewport orientation
    pub fov: f32,

    /// Render target size
    pub viewport: Viewport,

    /// Distance to near clipping plane
    pub near: f32,

    /// Distance to far clipping plane
    pub far: f32,
}

impl PlayerCamera {
    /// Build the camera for a player position
    pub fn from_player(position: &PlayerPosition, viewport: Viewport, config: &RenderConfig) -> Self {
        Self {
            position: position.xyz(),
            target: Vec3::new(0.0, 0.0, position.eye_height()),
            up: Vec3::z(),
            fov: utils::deg_to_rad(config.fov_degrees),
            viewport,
            near: config.near,
            far: config.far,
        }
    }

    /// Update the render target size
    pub fn set_viewport(&mut self, viewport: Viewport) {
        if viewport != self.viewport {
            log::info!(
                "Camera viewport changed: {}x{} -> {}x{}",
                self.viewport.width,
                self.viewport.height,
                viewport.width,
                viewport.height
            );
        }
        self.viewport = viewport;
    }

    /// Position projected onto the ground plane
    pub fn ground_position(&self) -> Vec2 {
        utils::ground(&self.position)
    }

    /// Horizontal unit view direction
    pub fn view_direction(&self) -> Result<Vec2, MathError> {
        utils::try_normalize_2d(utils::ground(&(self.target - self.position)))
    }

    /// World-to-view transform
    ///
    /// Fails when the camera stands on the vertical axis it looks at.
    pub fn view_matrix(&self) -> Result<Mat4, MathError> {
        Mat4::look_at(self.position, self.target, self.up)
    }

    /// Unclipped projection for the current viewport
    pub fn projection(&self) -> Result<Mat4, ProjectionError> {
        projection::perspective_for_viewport(
            self.fov,
            self.viewport.width,
            self.viewport.height,
            self.near,
            self.far,
        )
    }

    /// Projection whose near plane is `plane` (view space)
    pub fn oblique_projection(&self, plane: &ClipPlane) -> Result<Mat4, ProjectionError> {
        projection::oblique_perspective_for_viewport(
            self.fov,
            self.viewport.width,
            self.viewport.height,
            self.near,
            self.far,
            plane,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::constants::PI;
    use crate::foundation::math::Point3;
    use approx::assert_relative_eq;

    fn camera(theta: f32) -> PlayerCamera {
        let position = PlayerPosition::from_polar(theta, 3.0, 1.5);
        PlayerCamera::from_player(&position, Viewport::new(800, 600), &RenderConfig::default())
    }

    #[test]
    fn test_camera_faces_origin() {
        let camera = camera(PI * 1.5);
        assert_relative_eq!(camera.view_direction().unwrap(), Vec2::new(0.0, 1.0), epsilon = 1e-5);

        let view = camera.view_matrix().unwrap();
        let axis = view.transform_point(&Point3::new(0.0, 0.0, 1.5));
        assert_relative_eq!(axis.coords, Vec3::new(0.0, 0.0, -3.0), epsilon = 1e-4);
    }

    #[test]
    fn test_world_up_stays_up() {
        let view = camera(0.7).view_matrix().unwrap();
        let above = view.transform_point(&Point3::new(0.0, 0.0, 2.5));
        assert!(above.y > 0.0);
    }

    #[test]
    fn test_landscape_uses_horizontal_fov() {
        let camera = camera(0.0);
        assert!(!camera.viewport.is_portrait());
        let expected = projection::perspective_horizontal(camera.fov, 800.0 / 600.0, 0.1, 100.0).unwrap();
        assert_relative_eq!(camera.projection().unwrap(), expected);
    }
}
