//! A single scene: entities, lights, portals and static obstacles

use serde::{Deserialize, Serialize};

use super::entity::Entity;
use super::lighting::{AmbientLight, LightStack};
use super::portal::{Portal, PortalSlot};
use super::resources::TextureHandle;
use super::{CapacityKind, SceneError};
use crate::core::config::CapacityConfig;
use crate::foundation::math::Vec2;

/// Quadrant-symmetric set of round columns
///
/// Only the columns of the first quadrant (`x ≥ 0, y ≥ 0`) are listed; the
/// set is mirrored across both axes, so collision is tested once against
/// folded coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaticObstacles {
    /// Radius shared by every column
    pub column_radius: f32,
    /// First-quadrant column centres on the ground plane
    pub columns: Vec<[f32; 2]>,
}

impl StaticObstacles {
    /// First-quadrant column centres as vectors
    pub fn column_centers(&self) -> impl Iterator<Item = Vec2> + '_ {
        self.columns.iter().map(|c| Vec2::new(c[0], c[1]))
    }
}

/// A scene in the portal world
#[derive(Debug, Clone)]
pub struct Scene {
    title: String,
    stencil_mask: u8,
    entities: Vec<Entity>,
    portals: Vec<Portal>,
    transient_portal: Option<Portal>,
    lights: LightStack,
    /// Ambient light colour and intensity
    pub ambient: AmbientLight,
    /// Cubemap drawn behind everything, if any
    pub skybox: Option<TextureHandle>,
    /// Static obstacles the player collides with
    pub obstacles: Option<StaticObstacles>,
    max_entities: usize,
    max_portals: usize,
}

impl Scene {
    pub(crate) fn new(title: impl Into<String>, stencil_mask: u8, capacity: &CapacityConfig) -> Self {
        Self {
            title: title.into(),
            stencil_mask,
            entities: Vec::with_capacity(capacity.max_entities_per_scene),
            portals: Vec::with_capacity(capacity.max_portals_per_scene),
            transient_portal: None,
            lights: LightStack::new(capacity.max_lights_per_scene),
            ambient: AmbientLight::default(),
            skybox: None,
            obstacles: None,
            max_entities: capacity.max_entities_per_scene,
            max_portals: capacity.max_portals_per_scene,
        }
    }

    /// Scene title
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Single-bit stencil mask unique to this scene
    pub fn stencil_mask(&self) -> u8 {
        self.stencil_mask
    }

    /// Entities in draw order
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    /// Light array
    pub fn lights(&self) -> &LightStack {
        &self.lights
    }

    pub(crate) fn lights_mut(&mut self) -> &mut LightStack {
        &mut self.lights
    }

    /// Permanent portals in definition order
    pub fn permanent_portals(&self) -> &[Portal] {
        &self.portals
    }

    /// The transient portal, if one exists
    pub fn transient_portal(&self) -> Option<&Portal> {
        self.transient_portal.as_ref()
    }

    /// All portals: permanent ones first, then the transient one
    pub fn portals(&self) -> impl Iterator<Item = (PortalSlot, &Portal)> {
        self.portals
            .iter()
            .enumerate()
            .map(|(i, p)| (PortalSlot::Permanent(i), p))
            .chain(self.transient_portal.iter().map(|p| (PortalSlot::Transient, p)))
    }

    /// Look up a portal by slot
    pub fn portal(&self, slot: PortalSlot) -> Option<&Portal> {
        match slot {
            PortalSlot::Permanent(i) => self.portals.get(i),
            PortalSlot::Transient => self.transient_portal.as_ref(),
        }
    }

    /// Number of portals including the transient one
    pub fn portal_count(&self) -> usize {
        self.portals.len() + usize::from(self.transient_portal.is_some())
    }

    pub(crate) fn push_entity(&mut self, entity: Entity) -> Result<usize, SceneError> {
        if self.entities.len() >= self.max_entities {
            return Err(self.capacity_error(CapacityKind::Entities, self.max_entities));
        }
        self.entities.push(entity);
        Ok(self.entities.len() - 1)
    }

    pub(crate) fn push_portal(&mut self, portal: Portal) -> Result<PortalSlot, SceneError> {
        if portal.is_transient() {
            if self.transient_portal.replace(portal).is_some() {
                log::debug!("Replaced transient portal in '{}'", self.title);
            }
            return Ok(PortalSlot::Transient);
        }
        if self.portals.len() >= self.max_portals {
            return Err(self.capacity_error(CapacityKind::Portals, self.max_portals));
        }
        self.portals.push(portal);
        Ok(PortalSlot::Permanent(self.portals.len() - 1))
    }

    pub(crate) fn take_transient_portal(&mut self) -> Option<Portal> {
        self.transient_portal.take()
    }

    fn capacity_error(&self, kind: CapacityKind, limit: usize) -> SceneError {
        SceneError::CapacityExceeded {
            kind,
            limit,
            owner: format!("scene '{}'", self.title),
        }
    }
}
