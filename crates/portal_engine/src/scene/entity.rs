//! Renderable scene entities

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use super::resources::{ModelHandle, ShaderHandle};
use crate::foundation::math::{Mat4, Mat4Ext, Vec3};

/// Yaw speed of entities flagged [`EntityFlags::ROTATING`], radians per second
pub const ROTATION_SPEED: f32 = 0.5;

bitflags! {
    /// Per-entity render behaviour
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct EntityFlags: u32 {
        /// Spins about the vertical axis over time
        const ROTATING = 1 << 0;
        /// Drawn as wireframe
        const WIREFRAME = 1 << 1;
    }
}

/// Placement of an entity in its scene
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EntityTransform {
    /// Position in world space
    pub position: Vec3,
    /// Per-axis scale
    pub scale: Vec3,
    /// Rotation about the vertical axis in radians
    pub yaw: f32,
}

impl EntityTransform {
    /// Create a transform from its parts
    pub fn new(position: Vec3, scale: Vec3, yaw: f32) -> Self {
        Self { position, scale, yaw }
    }

    /// Unscaled, unrotated transform at a position
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }
}

impl Default for EntityTransform {
    fn default() -> Self {
        Self {
            position: Vec3::zeros(),
            scale: Vec3::new(1.0, 1.0, 1.0),
            yaw: 0.0,
        }
    }
}

/// A model drawn with a shader at a fixed placement
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    /// Model to draw
    pub model: ModelHandle,
    /// Shader program to draw it with
    pub shader: ShaderHandle,
    /// Placement
    pub transform: EntityTransform,
    /// Behaviour flags
    pub flags: EntityFlags,
}

impl Entity {
    /// Create an entity
    pub fn new(model: ModelHandle, shader: ShaderHandle, transform: EntityTransform, flags: EntityFlags) -> Self {
        Self {
            model,
            shader,
            transform,
            flags,
        }
    }

    /// Yaw at the given simulation time
    pub fn yaw_at(&self, time: f32) -> f32 {
        if self.flags.contains(EntityFlags::ROTATING) {
            self.transform.yaw + time * ROTATION_SPEED
        } else {
            self.transform.yaw
        }
    }

    /// Model matrix at the given simulation time
    pub fn model_matrix(&self, time: f32) -> Mat4 {
        Mat4::new_translation(&self.transform.position)
            * Mat4::rotation_z(self.yaw_at(time))
            * Mat4::new_nonuniform_scaling(&self.transform.scale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Point3;
    use approx::assert_relative_eq;

    #[test]
    fn test_static_entity_ignores_time() {
        let entity = Entity::new(
            ModelHandle(0),
            ShaderHandle(0),
            EntityTransform::new(Vec3::new(1.0, 2.0, 0.0), Vec3::new(2.0, 2.0, 2.0), 0.0),
            EntityFlags::empty(),
        );
        assert_relative_eq!(entity.model_matrix(0.0), entity.model_matrix(10.0));

        let p = entity.model_matrix(0.0).transform_point(&Point3::new(1.0, 0.0, 0.0));
        assert_relative_eq!(p.coords, Vec3::new(3.0, 2.0, 0.0), epsilon = 1e-6);
    }

    #[test]
    fn test_rotating_entity_spins_about_z() {
        let entity = Entity::new(
            ModelHandle(0),
            ShaderHandle(0),
            EntityTransform::default(),
            EntityFlags::ROTATING | EntityFlags::WIREFRAME,
        );
        let quarter_turn = std::f32::consts::FRAC_PI_2 / ROTATION_SPEED;
        let p = entity.model_matrix(quarter_turn).transform_point(&Point3::new(1.0, 0.0, 0.0));
        assert_relative_eq!(p.coords, Vec3::new(0.0, 1.0, 0.0), epsilon = 1e-5);
    }
}
