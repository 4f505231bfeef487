//! Scene lighting
//!
//! Each scene owns one fixed-size light array shared by both light kinds:
//! directional lights fill it from the front, positional lights from the
//! back. Shaders consume the two halves as separate uniform ranges.

use serde::{Deserialize, Serialize};

use super::{CapacityKind, SceneError};
use crate::foundation::math::{utils, Vec3, Vec4};

/// Light kinds
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LightKind {
    /// Directional light (like sunlight); direction is normalized
    Directional {
        /// Direction the light travels
        direction: Vec3,
    },
    /// Positional light (like a lightbulb)
    Positional {
        /// Light position in world space
        position: Vec3,
    },
}

/// Light source
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Light {
    /// RGB colour in `xyz`, power in `w`
    pub color_and_power: Vec4,
    /// Kind and its geometric parameter
    pub kind: LightKind,
}

impl Light {
    /// Create a directional light, normalizing the direction
    pub fn directional(color_and_power: Vec4, direction: Vec3) -> Result<Self, SceneError> {
        Ok(Self {
            color_and_power,
            kind: LightKind::Directional {
                direction: utils::try_normalize(direction)?,
            },
        })
    }

    /// Create a positional light
    pub fn positional(color_and_power: Vec4, position: Vec3) -> Self {
        Self {
            color_and_power,
            kind: LightKind::Positional { position },
        }
    }
}

/// Ambient light of a scene
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AmbientLight {
    /// RGB colour
    pub color: [f32; 3],
    /// Intensity multiplier
    pub intensity: f32,
}

impl Default for AmbientLight {
    fn default() -> Self {
        Self {
            color: [1.0, 1.0, 1.0],
            intensity: 0.1,
        }
    }
}

/// Shared light array of a scene
#[derive(Debug, Clone)]
pub struct LightStack {
    slots: Vec<Option<Light>>,
    directional_count: usize,
    positional_count: usize,
}

impl LightStack {
    /// Create an empty stack with `capacity` slots
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: vec![None; capacity],
            directional_count: 0,
            positional_count: 0,
        }
    }

    /// Total number of slots
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of directional lights
    pub fn directional_count(&self) -> usize {
        self.directional_count
    }

    /// Number of positional lights
    pub fn positional_count(&self) -> usize {
        self.positional_count
    }

    /// Whether every slot is taken
    pub fn is_full(&self) -> bool {
        self.directional_count + self.positional_count >= self.slots.len()
    }

    /// Append a directional light from the front; returns its slot
    pub fn push_directional(&mut self, light: Light, owner: &str) -> Result<usize, SceneError> {
        self.ensure_room(owner)?;
        let slot = self.directional_count;
        self.slots[slot] = Some(light);
        self.directional_count += 1;
        Ok(slot)
    }

    /// Append a positional light from the back; returns its slot
    pub fn push_positional(&mut self, light: Light, owner: &str) -> Result<usize, SceneError> {
        self.ensure_room(owner)?;
        let slot = self.slots.len() - 1 - self.positional_count;
        self.slots[slot] = Some(light);
        self.positional_count += 1;
        Ok(slot)
    }

    /// Directional lights in insertion order
    pub fn directional(&self) -> impl Iterator<Item = &Light> {
        self.slots[..self.directional_count].iter().flatten()
    }

    /// Positional lights in insertion order
    pub fn positional(&self) -> impl Iterator<Item = &Light> {
        let start = self.slots.len() - self.positional_count;
        self.slots[start..].iter().rev().flatten()
    }

    /// Raw slot view, as uploaded to shaders
    pub fn slots(&self) -> &[Option<Light>] {
        &self.slots
    }

    fn ensure_room(&self, owner: &str) -> Result<(), SceneError> {
        if self.is_full() {
            return Err(SceneError::CapacityExceeded {
                kind: CapacityKind::Lights,
                limit: self.slots.len(),
                owner: owner.to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn white() -> Vec4 {
        Vec4::new(1.0, 1.0, 1.0, 1.0)
    }

    #[test]
    fn test_kinds_fill_from_opposite_ends() {
        let mut stack = LightStack::new(8);
        let sun = Light::directional(white(), Vec3::new(0.0, 0.0, -2.0)).unwrap();
        assert_eq!(stack.push_directional(sun, "hall").unwrap(), 0);
        assert_eq!(stack.push_directional(sun, "hall").unwrap(), 1);
        assert_eq!(stack.push_positional(Light::positional(white(), Vec3::zeros()), "hall").unwrap(), 7);
        assert_eq!(stack.push_positional(Light::positional(white(), Vec3::x()), "hall").unwrap(), 6);

        assert_eq!(stack.directional().count(), 2);
        let positions: Vec<_> = stack
            .positional()
            .map(|l| match l.kind {
                LightKind::Positional { position } => position,
                LightKind::Directional { .. } => unreachable!(),
            })
            .collect();
        assert_eq!(positions, vec![Vec3::zeros(), Vec3::x()]);
    }

    #[test]
    fn test_combined_count_never_exceeds_capacity() {
        let mut stack = LightStack::new(8);
        let sun = Light::directional(white(), Vec3::z()).unwrap();
        let bulb = Light::positional(white(), Vec3::zeros());

        for i in 0..20 {
            let result = if i % 3 == 0 {
                stack.push_positional(bulb, "hall")
            } else {
                stack.push_directional(sun, "hall")
            };
            assert!(stack.directional_count() + stack.positional_count() <= 8);
            if i >= 8 {
                assert!(matches!(
                    result,
                    Err(SceneError::CapacityExceeded { kind: CapacityKind::Lights, limit: 8, .. })
                ));
            }
        }
        assert!(stack.is_full());
        assert_eq!(stack.slots().iter().filter(|s| s.is_some()).count(), 8);
    }

    #[test]
    fn test_zero_direction_is_rejected() {
        assert!(matches!(
            Light::directional(white(), Vec3::zeros()),
            Err(SceneError::Math(_))
        ));
    }
}
