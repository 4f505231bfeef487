//! Math utilities and types
//!
//! Provides the fundamental math types used by the scene registry, the
//! portal traversal and the movement resolver. The world is Z-up: the
//! ground is the XY plane and portals stand vertically on it.

use thiserror::Error;

pub use nalgebra::{Matrix4, Unit, Vector2, Vector3, Vector4};

/// 2D vector type (ground plane)
pub type Vec2 = Vector2<f32>;

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4D vector type (homogeneous coordinates and planes)
pub type Vec4 = Vector4<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// 3D point type
pub type Point3 = nalgebra::Point3<f32>;

/// Lengths below this are treated as zero when normalizing
pub const NORMALIZE_EPSILON: f32 = 1.0e-6;

/// Math errors
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum MathError {
    /// Attempted to normalize a vector with (near) zero length
    #[error("Cannot normalize zero-length vector ({x}, {y}, {z})")]
    ZeroLengthVector {
        /// X component of the offending vector
        x: f32,
        /// Y component of the offending vector
        y: f32,
        /// Z component of the offending vector
        z: f32,
    },
}

/// Math constants
pub mod constants {
    /// Pi constant
    pub const PI: f32 = std::f32::consts::PI;

    /// 2 * Pi
    pub const TAU: f32 = 2.0 * PI;

    /// Pi / 2
    pub const HALF_PI: f32 = PI * 0.5;

    /// Degrees to radians conversion factor
    pub const DEG_TO_RAD: f32 = PI / 180.0;

    /// Radians to degrees conversion factor
    pub const RAD_TO_DEG: f32 = 180.0 / PI;
}

/// Math utility functions
pub mod utils {
    use super::{constants, MathError, Vec2, Vec3, NORMALIZE_EPSILON};

    /// Convert degrees to radians
    pub fn deg_to_rad(degrees: f32) -> f32 {
        degrees * constants::DEG_TO_RAD
    }

    /// Convert radians to degrees
    pub fn rad_to_deg(radians: f32) -> f32 {
        radians * constants::RAD_TO_DEG
    }

    /// Clamp a value between min and max
    pub fn clamp(value: f32, min: f32, max: f32) -> f32 {
        if value < min { min } else if value > max { max } else { value }
    }

    /// Wrap an angle into `[0, 2π)`
    pub fn wrap_angle(angle: f32) -> f32 {
        let wrapped = angle.rem_euclid(constants::TAU);
        // rem_euclid can round up to exactly TAU for tiny negative inputs
        if wrapped >= constants::TAU { 0.0 } else { wrapped }
    }

    /// Normalize a 3D vector, failing loudly on zero length instead of
    /// producing NaN components.
    pub fn try_normalize(v: Vec3) -> Result<Vec3, MathError> {
        v.try_normalize(NORMALIZE_EPSILON)
            .ok_or(MathError::ZeroLengthVector { x: v.x, y: v.y, z: v.z })
    }

    /// Normalize a ground-plane vector, failing loudly on zero length
    pub fn try_normalize_2d(v: Vec2) -> Result<Vec2, MathError> {
        v.try_normalize(NORMALIZE_EPSILON)
            .ok_or(MathError::ZeroLengthVector { x: v.x, y: v.y, z: 0.0 })
    }

    /// Perpendicular of a ground-plane vector (rotated +90° about Z)
    pub fn perp(v: Vec2) -> Vec2 {
        Vec2::new(-v.y, v.x)
    }

    /// 2D cross product (z component of the 3D cross product)
    pub fn cross_2d(a: Vec2, b: Vec2) -> f32 {
        a.x * b.y - a.y * b.x
    }

    /// Drop the vertical component of a point
    pub fn ground(v: &Vec3) -> Vec2 {
        Vec2::new(v.x, v.y)
    }
}

/// Extension trait for Mat4 with additional convenience methods
pub trait Mat4Ext {
    /// Create a rotation matrix around the vertical (Z) axis
    fn rotation_z(angle: f32) -> Mat4;

    /// Create a right-handed look-at view matrix (camera looks down -Z in
    /// view space).
    ///
    /// Fails when `eye == target` or `up` is parallel to the view direction.
    fn look_at(eye: Vec3, target: Vec3, up: Vec3) -> Result<Mat4, MathError>;
}

impl Mat4Ext for Mat4 {
    fn rotation_z(angle: f32) -> Mat4 {
        Mat4::from_axis_angle(&Vec3::z_axis(), angle)
    }

    fn look_at(eye: Vec3, target: Vec3, up: Vec3) -> Result<Mat4, MathError> {
        let forward = utils::try_normalize(target - eye)?;
        let right = utils::try_normalize(forward.cross(&up))?;
        let camera_up = right.cross(&forward);

        let translation = Mat4::new(
            1.0, 0.0, 0.0, -eye.x,
            0.0, 1.0, 0.0, -eye.y,
            0.0, 0.0, 1.0, -eye.z,
            0.0, 0.0, 0.0, 1.0,
        );

        let rotation = Mat4::new(
            right.x, right.y, right.z, 0.0,
            camera_up.x, camera_up.y, camera_up.z, 0.0,
            -forward.x, -forward.y, -forward.z, 0.0,  // Negative forward for right-handed
            0.0, 0.0, 0.0, 1.0,
        );

        Ok(rotation * translation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_wrap_angle_range() {
        assert_relative_eq!(utils::wrap_angle(-constants::HALF_PI), 3.0 * constants::HALF_PI, epsilon = 1e-5);
        assert_relative_eq!(utils::wrap_angle(constants::TAU + 0.25), 0.25, epsilon = 1e-5);
        assert_eq!(utils::wrap_angle(0.0), 0.0);

        let tiny = utils::wrap_angle(-1.0e-9);
        assert!((0.0..constants::TAU).contains(&tiny));
    }

    #[test]
    fn test_try_normalize_rejects_zero() {
        let err = utils::try_normalize(Vec3::zeros()).unwrap_err();
        assert!(matches!(err, MathError::ZeroLengthVector { .. }));

        let n = utils::try_normalize(Vec3::new(0.0, 3.0, 4.0)).unwrap();
        assert_relative_eq!(n.magnitude(), 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_look_at_maps_target_onto_negative_z() {
        let view = Mat4::look_at(
            Vec3::new(0.0, -3.0, 1.5),
            Vec3::new(0.0, 0.0, 1.5),
            Vec3::z(),
        )
        .unwrap();

        let target = view.transform_point(&Point3::new(0.0, 0.0, 1.5));
        assert_relative_eq!(target.coords, Vec3::new(0.0, 0.0, -3.0), epsilon = 1e-5);
    }

    #[test]
    fn test_look_at_rejects_parallel_up() {
        let result = Mat4::look_at(Vec3::zeros(), Vec3::new(0.0, 0.0, 5.0), Vec3::z());
        assert!(result.is_err());
    }
}
