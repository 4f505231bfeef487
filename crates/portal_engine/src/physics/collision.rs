//! Ground-plane collision primitives
//!
//! Collision is deliberately approximate: the player is a circle on the
//! ground plane and obstacles are circles (columns) or portal backing boxes.
//! Corrections push the player out along the cheapest direction.

use crate::foundation::math::{utils, Vec2};
use crate::scene::{Portal, StaticObstacles};

/// A circle on the ground plane
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Circle {
    /// Centre on the ground plane
    pub center: Vec2,
    /// Radius
    pub radius: f32,
}

impl Circle {
    /// Create a circle
    pub fn new(center: Vec2, radius: f32) -> Self {
        Self { center, radius }
    }

    /// Check if this circle overlaps another
    pub fn intersects(&self, other: &Circle) -> bool {
        let radius_sum = self.radius + other.radius;
        (self.center - other.center).magnitude_squared() < radius_sum * radius_sum
    }

    /// Get the penetration depth if overlapping (0.0 if not)
    pub fn penetration_depth(&self, other: &Circle) -> f32 {
        let distance = (self.center - other.center).magnitude();
        let radius_sum = self.radius + other.radius;
        if distance < radius_sum {
            radius_sum - distance
        } else {
            0.0
        }
    }

    /// Move `other` out of this circle along the line between the centres.
    /// Returns the corrected centre of `other`, or `None` if they do not overlap.
    pub fn push_out(&self, other: &Circle) -> Option<Vec2> {
        if !self.intersects(other) {
            return None;
        }
        // Coincident centres have no preferred direction; pick +X
        let direction = utils::try_normalize_2d(other.center - self.center).unwrap_or_else(|_| Vec2::x());
        Some(self.center + direction * (self.radius + other.radius))
    }
}

/// A line segment on the ground plane
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    /// Start point
    pub start: Vec2,
    /// End point
    pub end: Vec2,
}

impl Segment {
    /// Create a segment
    pub fn new(start: Vec2, end: Vec2) -> Self {
        Self { start, end }
    }

    /// Whether two segments touch or cross
    ///
    /// Collinear overlaps are not reported; a move sliding along a portal's
    /// threshold does not cross it.
    pub fn intersects(&self, other: &Segment) -> bool {
        let d1 = self.end - self.start;
        let d2 = other.end - other.start;
        let denom = utils::cross_2d(d1, d2);
        if denom.abs() < f32::EPSILON {
            return false;
        }
        let offset = other.start - self.start;
        let t = utils::cross_2d(offset, d2) / denom;
        let u = utils::cross_2d(offset, d1) / denom;
        (0.0..=1.0).contains(&t) && (0.0..=1.0).contains(&u)
    }
}

/// The solid box behind a portal's front face, grown by a buffer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BackingBox {
    center: Vec2,
    normal: Vec2,
    side: Vec2,
    half_width: f32,
    depth: f32,
    buffer: f32,
}

impl BackingBox {
    /// Backing box of a portal with the given collision margin
    pub fn from_portal(portal: &Portal, buffer: f32) -> Self {
        Self {
            center: portal.ground_center(),
            normal: portal.normal(),
            side: portal.side(),
            half_width: portal.width() * 0.5,
            depth: portal.depth(),
            buffer,
        }
    }

    /// Whether a point is inside the grown box
    pub fn contains(&self, point: Vec2) -> bool {
        let (forward, lateral) = self.local(point);
        forward < self.buffer
            && forward > -(self.depth + self.buffer)
            && lateral.abs() < self.half_width + self.buffer
    }

    /// Push a point out of the box through its rear or its nearest side,
    /// whichever is the smaller correction. Returns `None` if outside.
    pub fn push_out(&self, point: Vec2) -> Option<Vec2> {
        if !self.contains(point) {
            return None;
        }
        let (forward, lateral) = self.local(point);

        let rear = -(self.depth + self.buffer);
        let forward_correction = rear - forward;

        let side_limit = self.half_width + self.buffer;
        let lateral_target = if lateral < 0.0 { -side_limit } else { side_limit };
        let lateral_correction = lateral_target - lateral;

        if forward_correction.abs() <= lateral_correction.abs() {
            Some(point + self.normal * forward_correction)
        } else {
            Some(point + self.side * lateral_correction)
        }
    }

    fn local(&self, point: Vec2) -> (f32, f32) {
        let offset = point - self.center;
        (offset.dot(&self.normal), offset.dot(&self.side))
    }
}

/// Push a player circle out of a quadrant-symmetric column set
///
/// The point is folded into the first quadrant, corrected against the listed
/// columns, then mirrored back into its original quadrant.
pub fn correct_against_columns(obstacles: &StaticObstacles, point: Vec2, player_radius: f32) -> Vec2 {
    let sign_x = if point.x < 0.0 { -1.0 } else { 1.0 };
    let sign_y = if point.y < 0.0 { -1.0 } else { 1.0 };
    let mut folded = Vec2::new(point.x.abs(), point.y.abs());

    for center in obstacles.column_centers() {
        let column = Circle::new(center, obstacles.column_radius);
        if let Some(corrected) = column.push_out(&Circle::new(folded, player_radius)) {
            log::trace!("Column at ({:.2}, {:.2}) pushed player out", center.x, center.y);
            folded = corrected;
        }
    }

    Vec2::new(folded.x * sign_x, folded.y * sign_y)
}
