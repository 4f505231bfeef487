//! Portals connecting scenes
//!
//! A portal is a vertical rectangle standing on the ground plane. Its 2D
//! normal points out of the front face: players on the front side can walk
//! through it and see the destination scene inside its frame. The space
//! behind the front face, `depth` deep, is the portal's backing volume; when
//! the portal has a backing model that volume is solid from behind.

use serde::{Deserialize, Serialize};

use super::resources::{ModelHandle, ShaderHandle};
use super::SceneIndex;
use crate::foundation::math::{utils, MathError, Mat4, Vec2, Vec3, Vec4};

/// Model and shader used to draw a portal's solid rear face
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortalBacking {
    /// Backing model
    pub model: ModelHandle,
    /// Backing shader
    pub shader: ShaderHandle,
}

/// Declarative portal geometry, before the destination is resolved
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PortalInfo {
    /// Ground-plane normal; need not be normalized but must not be zero
    pub normal: Vec2,
    /// Centre of the portal rectangle
    pub center: Vec3,
    /// Extent along the ground, perpendicular to the normal
    pub width: f32,
    /// Depth of the backing volume behind the front face
    pub depth: f32,
    /// Vertical extent
    pub height: f32,
    /// Crossing creates a temporary way back instead of a permanent one
    pub one_way: bool,
    /// Optional rear-face rendering
    pub backing: Option<PortalBacking>,
}

/// Where a portal lives in its scene
///
/// Transient portals have a dedicated slot instead of relying on list order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PortalSlot {
    /// Index into the scene's permanent portal list
    Permanent(usize),
    /// The scene's transient portal
    Transient,
}

/// A resolved portal
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Portal {
    normal: Vec2,
    center: Vec3,
    width: f32,
    depth: f32,
    height: f32,
    destination: SceneIndex,
    one_way: bool,
    transient: bool,
    backing: Option<PortalBacking>,
}

impl Portal {
    /// Resolve a portal description against its destination
    pub fn new(info: &PortalInfo, destination: SceneIndex, transient: bool) -> Result<Self, MathError> {
        Ok(Self {
            normal: utils::try_normalize_2d(info.normal)?,
            center: info.center,
            width: info.width,
            depth: info.depth,
            height: info.height,
            destination,
            one_way: info.one_way,
            transient,
            backing: info.backing,
        })
    }

    /// The transient portal placed in the destination when this portal is
    /// crossed one-way: same frame, facing the other way, leading back.
    pub fn reversed(&self, back_to: SceneIndex) -> Self {
        Self {
            normal: -self.normal,
            destination: back_to,
            one_way: false,
            transient: true,
            backing: None,
            ..*self
        }
    }

    /// Unit ground-plane normal
    pub fn normal(&self) -> Vec2 {
        self.normal
    }

    /// Centre of the portal rectangle
    pub fn center(&self) -> Vec3 {
        self.center
    }

    /// Width along the ground
    pub fn width(&self) -> f32 {
        self.width
    }

    /// Depth of the backing volume
    pub fn depth(&self) -> f32 {
        self.depth
    }

    /// Vertical extent
    pub fn height(&self) -> f32 {
        self.height
    }

    /// Scene reached by crossing
    pub fn destination(&self) -> SceneIndex {
        self.destination
    }

    /// Whether crossing synthesizes a transient way back
    pub fn is_one_way(&self) -> bool {
        self.one_way
    }

    /// Whether this portal was synthesized during play
    pub fn is_transient(&self) -> bool {
        self.transient
    }

    /// Rear-face rendering, if any
    pub fn backing(&self) -> Option<&PortalBacking> {
        self.backing.as_ref()
    }

    /// Unit vector along the portal's width (normal rotated +90°)
    pub fn side(&self) -> Vec2 {
        utils::perp(self.normal)
    }

    /// Centre projected onto the ground plane
    pub fn ground_center(&self) -> Vec2 {
        utils::ground(&self.center)
    }

    /// The portal's threshold on the ground plane
    pub fn edge(&self) -> (Vec2, Vec2) {
        let half = self.side() * (self.width * 0.5);
        let c = self.ground_center();
        (c + half, c - half)
    }

    /// Signed distance of a ground point from the portal plane; positive in front
    pub fn signed_distance(&self, point: Vec2) -> f32 {
        (point - self.ground_center()).dot(&self.normal)
    }

    /// Whether a ground point lies strictly on the front side
    pub fn is_in_front(&self, point: Vec2) -> bool {
        self.signed_distance(point) > 0.0
    }

    /// Offset of a ground point along the portal's width from its centre
    pub fn lateral_offset(&self, point: Vec2) -> f32 {
        (point - self.ground_center()).dot(&self.side())
    }

    /// Whether a ground point is within the portal's width
    pub fn is_within_width(&self, point: Vec2) -> bool {
        self.lateral_offset(point).abs() <= self.width * 0.5
    }

    /// World-space plane `(n, w)` containing the portal whose positive side
    /// is away from `viewer`. Points with `n·p + w ≥ 0` are kept when it is
    /// used as a clip plane.
    pub fn clip_plane_facing_away(&self, viewer: Vec2) -> Vec4 {
        let n = if self.is_in_front(viewer) { -self.normal } else { self.normal };
        let n3 = Vec3::new(n.x, n.y, 0.0);
        Vec4::new(n3.x, n3.y, n3.z, -n3.dot(&self.center))
    }

    /// Transform mapping the unit square `[-0.5, 0.5]²` in the local XZ plane
    /// onto the portal's front face (local +Y is the portal normal)
    pub fn quad_transform(&self) -> Mat4 {
        self.frame_transform(Vec3::new(self.width, 0.0, self.height), 0.0)
    }

    /// Transform mapping the unit cube `[-0.5, 0.5]³` onto a box straddling
    /// the front face, `thickness` deep
    pub fn volume_transform(&self, thickness: f32) -> Mat4 {
        self.frame_transform(Vec3::new(self.width, thickness, self.height), 0.0)
    }

    /// Transform mapping the unit cube onto the backing volume behind the face
    pub fn backing_transform(&self) -> Mat4 {
        self.frame_transform(Vec3::new(self.width, self.depth, self.height), -self.depth * 0.5)
    }

    fn frame_transform(&self, size: Vec3, forward_offset: f32) -> Mat4 {
        let side = self.side();
        let origin = self.center + Vec3::new(self.normal.x, self.normal.y, 0.0) * forward_offset;
        Mat4::new(
            side.x * size.x, self.normal.x * size.y, 0.0, origin.x,
            side.y * size.x, self.normal.y * size.y, 0.0, origin.y,
            0.0, 0.0, size.z, origin.z,
            0.0, 0.0, 0.0, 1.0,
        )
    }
}
