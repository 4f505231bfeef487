//! The world: scene registry plus player state
//!
//! `World` is the explicit context object threaded through the resolver and
//! the portal traversal. It is constructed once, populated at load time and
//! then owned and mutated by the single simulation thread.

use super::entity::{Entity, EntityFlags, EntityTransform};
use super::lighting::{AmbientLight, Light};
use super::portal::{Portal, PortalInfo, PortalSlot};
use super::resources::{ModelHandle, ResourceRegistry, ShaderHandle, TextureHandle};
use super::scene::{Scene, StaticObstacles};
use super::{CapacityKind, SceneError, SceneIndex};
use crate::core::config::{CapacityConfig, MotionConfig};
use crate::foundation::math::{constants, Vec3, Vec4};
use crate::foundation::time::SimulationClock;
use crate::physics::player::{PlayerPosition, PlayerState};

/// Scene registry, collaborator handle registries and player state
#[derive(Debug, Clone)]
pub struct World {
    capacity: CapacityConfig,
    scenes: Vec<Scene>,
    models: ResourceRegistry<ModelHandle>,
    shaders: ResourceRegistry<ShaderHandle>,
    textures: ResourceRegistry<TextureHandle>,
    current_scene: SceneIndex,
    player: PlayerState,
    clock: SimulationClock,
}

impl World {
    /// Create an empty world
    ///
    /// The player starts facing the origin from the -Y side, halfway out to
    /// the outer bound. Scene and light limits beyond the stencil bits and the
    /// uniform light array are lowered to fit, so content past them is
    /// rejected when added instead of being dropped at draw time.
    pub fn new(capacity: CapacityConfig, motion: &MotionConfig) -> Self {
        let bounded = capacity.bounded();
        if bounded != capacity {
            log::warn!(
                "Capacity lowered to {} scenes and {} lights per scene",
                bounded.max_scenes,
                bounded.max_lights_per_scene
            );
        }
        let capacity = bounded;
        let start = PlayerPosition::from_polar(
            constants::PI * 1.5,
            motion.outer_bounding_radius * 0.5,
            motion.eye_height,
        );
        Self {
            scenes: Vec::with_capacity(capacity.max_scenes),
            capacity,
            models: ResourceRegistry::new(),
            shaders: ResourceRegistry::new(),
            textures: ResourceRegistry::new(),
            current_scene: SceneIndex(0),
            player: PlayerState::new(start, motion),
            clock: SimulationClock::new(motion.tick_seconds),
        }
    }

    /// Registry limits this world was created with
    pub fn capacity(&self) -> &CapacityConfig {
        &self.capacity
    }

    /// Append a scene; its stencil mask is the bit of its index
    pub fn add_scene(&mut self, title: impl Into<String>) -> Result<SceneIndex, SceneError> {
        let index = self.scenes.len();
        if index >= self.capacity.max_scenes {
            return Err(SceneError::CapacityExceeded {
                kind: CapacityKind::Scenes,
                limit: self.capacity.max_scenes,
                owner: "world".to_string(),
            });
        }
        // max_scenes ≤ 8 is enforced by World::new
        let mask = 1u8.checked_shl(u32::try_from(index).unwrap_or(u32::MAX)).ok_or_else(|| {
            SceneError::CapacityExceeded {
                kind: CapacityKind::Scenes,
                limit: crate::core::config::STENCIL_BITS,
                owner: "stencil buffer".to_string(),
            }
        })?;
        let scene = Scene::new(title, mask, &self.capacity);
        log::debug!("Added scene '{}' as #{} (stencil mask {:#010b})", scene.title(), index, mask);
        self.scenes.push(scene);
        Ok(SceneIndex(index))
    }

    /// Append an entity to a scene; returns its index within the scene
    pub fn add_entity(
        &mut self,
        scene: SceneIndex,
        model: ModelHandle,
        shader: ShaderHandle,
        transform: EntityTransform,
        flags: EntityFlags,
    ) -> Result<usize, SceneError> {
        self.scene_mut(scene)?
            .push_entity(Entity::new(model, shader, transform, flags))
    }

    /// Append a directional light; returns its slot in the light array
    pub fn add_directional_light(
        &mut self,
        scene: SceneIndex,
        color_and_power: Vec4,
        direction: Vec3,
    ) -> Result<usize, SceneError> {
        let light = Light::directional(color_and_power, direction)?;
        let target = self.scene_mut(scene)?;
        let owner = format!("scene '{}'", target.title());
        target.lights_mut().push_directional(light, &owner)
    }

    /// Append a positional light; returns its slot in the light array
    pub fn add_positional_light(
        &mut self,
        scene: SceneIndex,
        color_and_power: Vec4,
        position: Vec3,
    ) -> Result<usize, SceneError> {
        let light = Light::positional(color_and_power, position);
        let target = self.scene_mut(scene)?;
        let owner = format!("scene '{}'", target.title());
        target.lights_mut().push_positional(light, &owner)
    }

    /// Add a portal in `source` leading to `destination`
    ///
    /// Transient portals occupy the scene's dedicated transient slot,
    /// replacing any previous one, and do not count against the portal limit.
    pub fn add_portal(
        &mut self,
        source: SceneIndex,
        destination: SceneIndex,
        info: &PortalInfo,
        transient: bool,
    ) -> Result<PortalSlot, SceneError> {
        self.scene(destination)?;
        if info.width <= 0.0 || info.height <= 0.0 || info.depth < 0.0 {
            return Err(SceneError::InvalidPortal(format!(
                "portal from {source} to {destination} has non-positive size {}x{}x{}",
                info.width, info.depth, info.height
            )));
        }
        let portal = Portal::new(info, destination, transient)?;
        self.scene_mut(source)?.push_portal(portal)
    }

    pub(crate) fn install_transient_portal(&mut self, scene: SceneIndex, portal: Portal) -> Result<(), SceneError> {
        debug_assert!(portal.is_transient());
        self.scene(portal.destination())?;
        self.scene_mut(scene)?.push_portal(portal)?;
        Ok(())
    }

    /// Remove and return the transient portal of a scene
    pub fn remove_transient_portal(&mut self, scene: SceneIndex) -> Result<Option<Portal>, SceneError> {
        Ok(self.scene_mut(scene)?.take_transient_portal())
    }

    /// Set a scene's ambient light
    pub fn set_ambient(&mut self, scene: SceneIndex, ambient: AmbientLight) -> Result<(), SceneError> {
        self.scene_mut(scene)?.ambient = ambient;
        Ok(())
    }

    /// Set a scene's skybox
    pub fn set_skybox(&mut self, scene: SceneIndex, skybox: Option<TextureHandle>) -> Result<(), SceneError> {
        self.scene_mut(scene)?.skybox = skybox;
        Ok(())
    }

    /// Set a scene's static obstacles
    pub fn set_obstacles(&mut self, scene: SceneIndex, obstacles: Option<StaticObstacles>) -> Result<(), SceneError> {
        self.scene_mut(scene)?.obstacles = obstacles;
        Ok(())
    }

    /// Register a model name with the model collaborator's handle space
    pub fn register_model(&mut self, name: impl Into<String>) -> ModelHandle {
        self.models.register(name)
    }

    /// Register a shader name
    pub fn register_shader(&mut self, name: impl Into<String>) -> ShaderHandle {
        self.shaders.register(name)
    }

    /// Register a texture name
    pub fn register_texture(&mut self, name: impl Into<String>) -> TextureHandle {
        self.textures.register(name)
    }

    /// Model registry
    pub fn models(&self) -> &ResourceRegistry<ModelHandle> {
        &self.models
    }

    /// Shader registry
    pub fn shaders(&self) -> &ResourceRegistry<ShaderHandle> {
        &self.shaders
    }

    /// Texture registry
    pub fn textures(&self) -> &ResourceRegistry<TextureHandle> {
        &self.textures
    }

    /// Look up a scene
    pub fn scene(&self, index: SceneIndex) -> Result<&Scene, SceneError> {
        self.scenes.get(index.0).ok_or(SceneError::InvalidScene {
            index,
            count: self.scenes.len(),
        })
    }

    fn scene_mut(&mut self, index: SceneIndex) -> Result<&mut Scene, SceneError> {
        let count = self.scenes.len();
        self.scenes
            .get_mut(index.0)
            .ok_or(SceneError::InvalidScene { index, count })
    }

    /// All scenes in index order
    pub fn scenes(&self) -> &[Scene] {
        &self.scenes
    }

    /// Index of the scene the player occupies
    pub fn current_scene_index(&self) -> SceneIndex {
        self.current_scene
    }

    /// The scene the player occupies
    pub fn current_scene(&self) -> Result<&Scene, SceneError> {
        self.scene(self.current_scene)
    }

    /// Move the player into another scene
    pub fn set_current_scene(&mut self, index: SceneIndex) -> Result<(), SceneError> {
        self.scene(index)?;
        self.current_scene = index;
        Ok(())
    }

    /// Player state
    pub fn player(&self) -> &PlayerState {
        &self.player
    }

    /// Mutable player state
    pub fn player_mut(&mut self) -> &mut PlayerState {
        &mut self.player
    }

    /// Simulation clock
    pub fn clock(&self) -> &SimulationClock {
        &self.clock
    }

    pub(crate) fn clock_mut(&mut self) -> &mut SimulationClock {
        &mut self.clock
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Vec2;

    fn world() -> World {
        World::new(CapacityConfig::default(), &MotionConfig::default())
    }

    fn doorway() -> PortalInfo {
        PortalInfo {
            normal: Vec2::new(0.0, -1.0),
            center: Vec3::new(0.0, -1.5, 1.5),
            width: 3.0,
            depth: 0.5,
            height: 3.0,
            one_way: false,
            backing: None,
        }
    }

    #[test]
    fn test_stencil_masks_are_unique_single_bits() {
        let mut world = world();
        for i in 0..8 {
            world.add_scene(format!("room {i}")).unwrap();
        }
        let masks: Vec<u8> = world.scenes().iter().map(Scene::stencil_mask).collect();
        for (i, mask) in masks.iter().enumerate() {
            assert!(mask.is_power_of_two());
            assert!(masks[i + 1..].iter().all(|other| other != mask));
        }
    }

    #[test]
    fn test_oversized_light_limit_rejects_extra_lights() {
        let capacity = CapacityConfig {
            max_lights_per_scene: 12,
            ..CapacityConfig::default()
        };
        let mut world = World::new(capacity, &MotionConfig::default());
        assert_eq!(world.capacity().max_lights_per_scene, crate::core::config::MAX_LIGHTS_PER_SCENE);

        let hall = world.add_scene("hall").unwrap();
        for i in 0..crate::core::config::MAX_LIGHTS_PER_SCENE {
            world
                .add_positional_light(hall, Vec4::new(1.0, 1.0, 1.0, 1.0), Vec3::new(i as f32, 0.0, 2.0))
                .unwrap();
        }
        let err = world
            .add_positional_light(hall, Vec4::new(1.0, 1.0, 1.0, 1.0), Vec3::new(0.0, 0.0, 3.0))
            .unwrap_err();
        assert!(matches!(err, SceneError::CapacityExceeded { kind: CapacityKind::Lights, limit: 8, .. }));
    }

    #[test]
    fn test_ninth_scene_is_rejected() {
        let mut world = world();
        for i in 0..8 {
            world.add_scene(format!("room {i}")).unwrap();
        }
        let err = world.add_scene("attic").unwrap_err();
        assert!(matches!(err, SceneError::CapacityExceeded { kind: CapacityKind::Scenes, limit: 8, .. }));
    }

    #[test]
    fn test_ninth_portal_fails_fast() {
        let mut world = world();
        let hall = world.add_scene("hall").unwrap();
        let garden = world.add_scene("garden").unwrap();
        for _ in 0..8 {
            world.add_portal(hall, garden, &doorway(), false).unwrap();
        }
        let err = world.add_portal(hall, garden, &doorway(), false).unwrap_err();
        assert!(matches!(err, SceneError::CapacityExceeded { kind: CapacityKind::Portals, limit: 8, .. }));
        assert_eq!(world.scene(hall).unwrap().permanent_portals().len(), 8);
    }

    #[test]
    fn test_transient_portal_does_not_use_permanent_capacity() {
        let mut world = world();
        let hall = world.add_scene("hall").unwrap();
        let garden = world.add_scene("garden").unwrap();
        for _ in 0..8 {
            world.add_portal(hall, garden, &doorway(), false).unwrap();
        }
        let slot = world.add_portal(hall, garden, &doorway(), true).unwrap();
        assert_eq!(slot, PortalSlot::Transient);
        assert_eq!(world.scene(hall).unwrap().portal_count(), 9);

        let (last_slot, _) = world.scene(hall).unwrap().portals().last().unwrap();
        assert_eq!(last_slot, PortalSlot::Transient);

        assert!(world.remove_transient_portal(hall).unwrap().is_some());
        assert!(world.remove_transient_portal(hall).unwrap().is_none());
    }

    #[test]
    fn test_portal_to_missing_scene_is_rejected() {
        let mut world = world();
        let hall = world.add_scene("hall").unwrap();
        let err = world.add_portal(hall, SceneIndex(3), &doorway(), false).unwrap_err();
        assert_eq!(err, SceneError::InvalidScene { index: SceneIndex(3), count: 1 });
    }

    #[test]
    fn test_entity_capacity() {
        let mut world = world();
        let hall = world.add_scene("hall").unwrap();
        let model = world.register_model("bust");
        let shader = world.register_shader("lit");
        for i in 0..16 {
            let index = world
                .add_entity(hall, model, shader, EntityTransform::default(), EntityFlags::empty())
                .unwrap();
            assert_eq!(index, i);
        }
        assert!(world
            .add_entity(hall, model, shader, EntityTransform::default(), EntityFlags::empty())
            .is_err());
    }

    #[test]
    fn test_lights_through_world() {
        let mut world = world();
        let hall = world.add_scene("hall").unwrap();
        let warm = Vec4::new(1.0, 0.9, 0.8, 2.0);
        assert_eq!(world.add_directional_light(hall, warm, -Vec3::z()).unwrap(), 0);
        assert_eq!(world.add_positional_light(hall, warm, Vec3::new(0.0, 0.0, 3.0)).unwrap(), 7);
        assert!(world.add_directional_light(hall, warm, Vec3::zeros()).is_err());
        let lights = world.scene(hall).unwrap().lights();
        assert_eq!(lights.directional_count() + lights.positional_count(), 2);
    }
}
