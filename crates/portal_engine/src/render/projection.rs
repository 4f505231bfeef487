//! # Oblique Frustum Projection
//!
//! Perspective matrices whose near plane is replaced by an arbitrary
//! view-space plane, so geometry between the camera and a portal is clipped
//! away when the scene behind the portal is drawn.
//!
//! ## Conventions
//!
//! OpenGL clip space: the camera looks down -Z in view space and NDC depth
//! spans `[-1, 1]`. A clip plane `(n, d)` keeps points with `n·p + d ≥ 0`; the
//! camera must be on its negative side.
//!
//! ## Method
//!
//! The clip-space corner opposite the plane, `q = M⁻¹ (sgn cx, sgn cy, 1, 1)`,
//! is computed in view space, the plane is scaled so it evaluates to 2 at `q`,
//! and the matrix's third row is replaced by the scaled plane minus the fourth
//! row. Points on the plane then land at NDC z = -1 and `q` stays on the far
//! plane at NDC z = 1 (E. Lengyel, "Oblique View Frustum Depth Projection and
//! Clipping").

use thiserror::Error;

use crate::foundation::math::{utils, Mat4, Vec3, Vec4};

/// `|c·q|` below this makes the oblique frustum degenerate
pub const DEGENERATE_PLANE_EPSILON: f32 = 1.0e-5;

/// Projection errors
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum ProjectionError {
    /// Field of view, aspect ratio or clip distances out of range
    #[error("Invalid projection parameters: fov={fov} aspect={aspect} near={near} far={far}")]
    InvalidParameters {
        /// Field of view in radians
        fov: f32,
        /// Width over height
        aspect: f32,
        /// Near clip distance
        near: f32,
        /// Far clip distance
        far: f32,
    },

    /// The clip plane passes (nearly) through the frustum's far corner
    #[error("Clip plane ({x}, {y}, {z}, {w}) is degenerate for this frustum")]
    DegenerateClipPlane {
        /// Plane normal X
        x: f32,
        /// Plane normal Y
        y: f32,
        /// Plane normal Z
        z: f32,
        /// Plane offset
        w: f32,
    },

    /// The view matrix could not be inverted
    #[error("View matrix is singular")]
    SingularView,

    /// The clip plane normal has zero length
    #[error("Clip plane normal has zero length")]
    ZeroNormal,
}

/// A view-space clip plane `n·p + distance = 0` with unit normal `n`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClipPlane {
    normal: Vec3,
    distance: f32,
}

impl ClipPlane {
    /// Create a plane, normalizing `(normal, distance)` together
    pub fn new(normal: Vec3, distance: f32) -> Result<Self, ProjectionError> {
        let length = normal.magnitude();
        let unit = utils::try_normalize(normal).map_err(|_| ProjectionError::ZeroNormal)?;
        Ok(Self {
            normal: unit,
            distance: distance / length,
        })
    }

    /// Transform a world-space plane into the view space of `view`
    ///
    /// Planes transform with the inverse transpose of the point transform.
    pub fn from_world(plane: Vec4, view: &Mat4) -> Result<Self, ProjectionError> {
        let inverse = view.try_inverse().ok_or(ProjectionError::SingularView)?;
        let transformed = inverse.transpose() * plane;
        Self::new(transformed.xyz(), transformed.w)
    }

    /// Unit normal
    pub fn normal(&self) -> Vec3 {
        self.normal
    }

    /// Signed offset from the view-space origin
    pub fn distance(&self) -> f32 {
        self.distance
    }

    /// Plane as a homogeneous 4-vector
    pub fn as_vec4(&self) -> Vec4 {
        Vec4::new(self.normal.x, self.normal.y, self.normal.z, self.distance)
    }

    /// Signed distance of a view-space point; positive on the kept side
    pub fn evaluate(&self, point: &Vec3) -> f32 {
        self.normal.dot(point) + self.distance
    }
}

/// Symmetric perspective from the near-plane half extents
fn frustum(right: f32, top: f32, near: f32, far: f32) -> Mat4 {
    let depth = far - near;
    Mat4::new(
        near / right, 0.0, 0.0, 0.0,
        0.0, near / top, 0.0, 0.0,
        0.0, 0.0, -(far + near) / depth, -2.0 * far * near / depth,
        0.0, 0.0, -1.0, 0.0,
    )
}

fn check_parameters(fov: f32, aspect: f32, near: f32, far: f32) -> Result<(), ProjectionError> {
    let valid = fov > 0.0 && fov < std::f32::consts::PI && aspect > 0.0 && near > 0.0 && far > near;
    if !valid {
        return Err(ProjectionError::InvalidParameters { fov, aspect, near, far });
    }
    Ok(())
}

/// Perspective projection with a vertical field of view (radians)
pub fn perspective_vertical(fov_y: f32, aspect: f32, near: f32, far: f32) -> Result<Mat4, ProjectionError> {
    check_parameters(fov_y, aspect, near, far)?;
    let top = near * (fov_y * 0.5).tan();
    Ok(frustum(top * aspect, top, near, far))
}

/// Perspective projection with a horizontal field of view (radians)
pub fn perspective_horizontal(fov_x: f32, aspect: f32, near: f32, far: f32) -> Result<Mat4, ProjectionError> {
    check_parameters(fov_x, aspect, near, far)?;
    let right = near * (fov_x * 0.5).tan();
    Ok(frustum(right, right / aspect, near, far))
}

/// Perspective projection for a viewport: `fov` is vertical on portrait
/// viewports (`height ≥ width`) and horizontal otherwise
pub fn perspective_for_viewport(fov: f32, width: u32, height: u32, near: f32, far: f32) -> Result<Mat4, ProjectionError> {
    let aspect = aspect_ratio(width, height);
    if height >= width {
        perspective_vertical(fov, aspect, near, far)
    } else {
        perspective_horizontal(fov, aspect, near, far)
    }
}

/// Oblique perspective with a vertical field of view (radians)
pub fn oblique_perspective_vertical(
    fov_y: f32,
    aspect: f32,
    near: f32,
    far: f32,
    plane: &ClipPlane,
) -> Result<Mat4, ProjectionError> {
    apply_oblique_clip(perspective_vertical(fov_y, aspect, near, far)?, plane)
}

/// Oblique perspective with a horizontal field of view (radians)
pub fn oblique_perspective_horizontal(
    fov_x: f32,
    aspect: f32,
    near: f32,
    far: f32,
    plane: &ClipPlane,
) -> Result<Mat4, ProjectionError> {
    apply_oblique_clip(perspective_horizontal(fov_x, aspect, near, far)?, plane)
}

/// Oblique perspective for a viewport, choosing the field of view axis like
/// [`perspective_for_viewport`]
pub fn oblique_perspective_for_viewport(
    fov: f32,
    width: u32,
    height: u32,
    near: f32,
    far: f32,
    plane: &ClipPlane,
) -> Result<Mat4, ProjectionError> {
    apply_oblique_clip(perspective_for_viewport(fov, width, height, near, far)?, plane)
}

/// Width over height; zero-sized viewports yield 0 and are rejected later
pub fn aspect_ratio(width: u32, height: u32) -> f32 {
    if height == 0 {
        return 0.0;
    }
    width as f32 / height as f32
}

fn sign(value: f32) -> f32 {
    if value > 0.0 {
        1.0
    } else if value < 0.0 {
        -1.0
    } else {
        0.0
    }
}

/// Replace the near plane of a symmetric perspective matrix with `plane`
pub fn apply_oblique_clip(projection: Mat4, plane: &ClipPlane) -> Result<Mat4, ProjectionError> {
    let c = plane.as_vec4();
    let m = projection;

    let q = Vec4::new(
        (sign(c.x) + m[(0, 2)]) / m[(0, 0)],
        (sign(c.y) + m[(1, 2)]) / m[(1, 1)],
        -1.0,
        (1.0 + m[(2, 2)]) / m[(2, 3)],
    );

    let denominator = c.dot(&q);
    if denominator.abs() < DEGENERATE_PLANE_EPSILON {
        return Err(ProjectionError::DegenerateClipPlane {
            x: c.x,
            y: c.y,
            z: c.z,
            w: c.w,
        });
    }

    let scaled = c * (2.0 / denominator);
    let mut oblique = m;
    for column in 0..4 {
        oblique[(2, column)] = scaled[column] - m[(3, column)];
    }
    Ok(oblique)
}
