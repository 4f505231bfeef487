//! Declarative world descriptions
//!
//! A world is authored as a RON document: resource names, scenes with their
//! content, and portals connecting scenes by index. Loading resolves every
//! name to a handle and every index to a scene, and reports the first broken
//! reference or exceeded limit instead of building a partial world.
//!
//! ```ron
//! (
//!     models: ["pedestal", "frame"],
//!     shaders: ["lit"],
//!     scenes: [
//!         (
//!             title: "hall",
//!             entities: [(model: "pedestal", shader: "lit", position: (0.0, 2.0, 0.0))],
//!             lights: [Directional(color: (1.0, 1.0, 1.0), power: 0.8, direction: (0.0, 0.3, -1.0))],
//!         ),
//!         (title: "garden"),
//!     ],
//!     portals: [
//!         (source: 0, destination: 1, normal: (0.0, -1.0), center: (0.0, -1.5, 1.5)),
//!     ],
//! )
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::entity::{EntityFlags, EntityTransform};
use super::lighting::AmbientLight;
use super::portal::{PortalBacking, PortalInfo};
use super::scene::StaticObstacles;
use super::world::World;
use super::{SceneError, SceneIndex};
use crate::core::config::{CapacityConfig, MotionConfig};
use crate::foundation::math::{utils, Vec2, Vec3, Vec4};
use crate::physics::PlayerPosition;

/// World loading errors
#[derive(Error, Debug)]
pub enum WorldLoadError {
    /// The description file could not be read
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The description is not valid RON for this schema
    #[error("Parse error: {0}")]
    Parse(String),

    /// A model name was never declared
    #[error("Unknown model '{name}' referenced by {context}")]
    UnknownModel {
        /// Missing name
        name: String,
        /// Where it was referenced
        context: String,
    },

    /// A shader name was never declared
    #[error("Unknown shader '{name}' referenced by {context}")]
    UnknownShader {
        /// Missing name
        name: String,
        /// Where it was referenced
        context: String,
    },

    /// A texture name was never declared
    #[error("Unknown texture '{name}' referenced by {context}")]
    UnknownTexture {
        /// Missing name
        name: String,
        /// Where it was referenced
        context: String,
    },

    /// A scene index is out of range
    #[error("{context} refers to scene {index}, but only {count} scenes are declared")]
    InvalidReference {
        /// Where it was referenced
        context: String,
        /// Offending index
        index: usize,
        /// Declared scene count
        count: usize,
    },

    /// A portal backing names a model without a shader or vice versa
    #[error("Portal {index} needs both backing_model and backing_shader")]
    IncompleteBacking {
        /// Portal position in the description
        index: usize,
    },

    /// The registry rejected the content
    #[error(transparent)]
    Scene(#[from] SceneError),
}

fn default_scale() -> [f32; 3] {
    [1.0, 1.0, 1.0]
}

/// An entity in a scene description
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityDescription {
    /// Model name
    pub model: String,
    /// Shader name
    pub shader: String,
    /// World position
    #[serde(default)]
    pub position: [f32; 3],
    /// Per-axis scale
    #[serde(default = "default_scale")]
    pub scale: [f32; 3],
    /// Initial yaw in degrees
    #[serde(default)]
    pub yaw_degrees: f32,
    /// Behaviour flags
    #[serde(default)]
    pub flags: EntityFlags,
}

/// A light in a scene description
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LightDescription {
    /// Directional light
    Directional {
        /// RGB colour
        color: [f32; 3],
        /// Power
        power: f32,
        /// Direction of travel; normalized on load
        direction: [f32; 3],
    },
    /// Positional light
    Positional {
        /// RGB colour
        color: [f32; 3],
        /// Power
        power: f32,
        /// World position
        position: [f32; 3],
    },
}

/// A scene description
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneDescription {
    /// Human readable title
    pub title: String,
    /// Entities
    pub entities: Vec<EntityDescription>,
    /// Lights, inserted in order
    pub lights: Vec<LightDescription>,
    /// Ambient light
    pub ambient: AmbientLight,
    /// Skybox texture name
    pub skybox: Option<String>,
    /// Column obstacles
    pub obstacles: Option<StaticObstacles>,
}

fn default_portal_width() -> f32 {
    3.0
}

fn default_portal_height() -> f32 {
    3.0
}

fn default_portal_depth() -> f32 {
    0.5
}

/// A portal description
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortalDescription {
    /// Index of the scene the portal stands in
    pub source: usize,
    /// Index of the scene it leads to
    pub destination: usize,
    /// Ground-plane normal of the front face
    pub normal: [f32; 2],
    /// Centre of the rectangle
    pub center: [f32; 3],
    /// Extent along the ground
    #[serde(default = "default_portal_width")]
    pub width: f32,
    /// Depth of the backing volume
    #[serde(default = "default_portal_depth")]
    pub depth: f32,
    /// Vertical extent
    #[serde(default = "default_portal_height")]
    pub height: f32,
    /// Crossing creates only a temporary way back
    #[serde(default)]
    pub one_way: bool,
    /// Model drawn for the solid rear face
    #[serde(default)]
    pub backing_model: Option<String>,
    /// Shader for the rear face
    #[serde(default)]
    pub backing_shader: Option<String>,
}

/// Where the player starts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StartDescription {
    /// Starting scene index
    pub scene: usize,
    /// Angle around the origin in degrees
    pub theta_degrees: f32,
    /// Distance from the origin; halfway to the outer bound when absent
    pub radius: Option<f32>,
}

impl Default for StartDescription {
    fn default() -> Self {
        Self {
            scene: 0,
            theta_degrees: 270.0,
            radius: None,
        }
    }
}

/// Complete world description
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldDescription {
    /// Model names, registered in order
    pub models: Vec<String>,
    /// Shader names, registered in order
    pub shaders: Vec<String>,
    /// Texture names, registered in order
    pub textures: Vec<String>,
    /// Scenes; their position is their index
    pub scenes: Vec<SceneDescription>,
    /// Portals between scenes
    pub portals: Vec<PortalDescription>,
    /// Player start
    pub start: StartDescription,
}

impl WorldDescription {
    /// Parse a RON document
    pub fn from_ron_str(text: &str) -> Result<Self, WorldLoadError> {
        ron::from_str(text).map_err(|e| WorldLoadError::Parse(e.to_string()))
    }

    /// Read and parse a RON file
    pub fn load_from_file(path: &str) -> Result<Self, WorldLoadError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_ron_str(&text)
    }

    fn check_scene(&self, index: usize, context: impl FnOnce() -> String) -> Result<SceneIndex, WorldLoadError> {
        if index < self.scenes.len() {
            Ok(SceneIndex(index))
        } else {
            Err(WorldLoadError::InvalidReference {
                context: context(),
                index,
                count: self.scenes.len(),
            })
        }
    }
}

fn vec3(v: [f32; 3]) -> Vec3 {
    Vec3::new(v[0], v[1], v[2])
}

fn color_and_power(color: [f32; 3], power: f32) -> Vec4 {
    Vec4::new(color[0], color[1], color[2], power)
}

impl World {
    /// Build a world from a description, validating every reference
    pub fn from_description(
        description: &WorldDescription,
        capacity: CapacityConfig,
        motion: &MotionConfig,
    ) -> Result<Self, WorldLoadError> {
        let mut world = World::new(capacity, motion);

        for name in &description.models {
            world.register_model(name.as_str());
        }
        for name in &description.shaders {
            world.register_shader(name.as_str());
        }
        for name in &description.textures {
            world.register_texture(name.as_str());
        }

        for scene_desc in &description.scenes {
            let scene = world.add_scene(scene_desc.title.as_str())?;
            world.populate_scene(scene, scene_desc)?;
        }

        for (index, portal_desc) in description.portals.iter().enumerate() {
            let source = description.check_scene(portal_desc.source, || format!("portal {index} source"))?;
            let destination =
                description.check_scene(portal_desc.destination, || format!("portal {index} destination"))?;
            let backing = world.resolve_backing(index, portal_desc)?;
            let info = PortalInfo {
                normal: Vec2::new(portal_desc.normal[0], portal_desc.normal[1]),
                center: vec3(portal_desc.center),
                width: portal_desc.width,
                depth: portal_desc.depth,
                height: portal_desc.height,
                one_way: portal_desc.one_way,
                backing,
            };
            world.add_portal(source, destination, &info, false)?;
        }

        if !description.scenes.is_empty() {
            let start = description.check_scene(description.start.scene, || "start".to_string())?;
            world.set_current_scene(start)?;
        }
        let radius = description
            .start
            .radius
            .unwrap_or(motion.outer_bounding_radius * 0.5);
        world.player_mut().position = PlayerPosition::from_polar(
            utils::deg_to_rad(description.start.theta_degrees),
            radius,
            motion.eye_height,
        );

        log::info!(
            "Loaded world: {} scenes, {} portals, {} models, {} shaders",
            world.scenes().len(),
            description.portals.len(),
            world.models().len(),
            world.shaders().len()
        );
        Ok(world)
    }

    /// Read, parse and build a world from a RON file
    pub fn load_from_file(path: &str, capacity: CapacityConfig, motion: &MotionConfig) -> Result<Self, WorldLoadError> {
        let description = WorldDescription::load_from_file(path)?;
        log::debug!("Parsed world description {}", path);
        Self::from_description(&description, capacity, motion)
    }

    fn populate_scene(&mut self, scene: SceneIndex, desc: &SceneDescription) -> Result<(), WorldLoadError> {
        for (i, entity) in desc.entities.iter().enumerate() {
            let context = || format!("entity {i} of '{}'", desc.title);
            let model = self.models().get(&entity.model).ok_or_else(|| WorldLoadError::UnknownModel {
                name: entity.model.clone(),
                context: context(),
            })?;
            let shader = self.shaders().get(&entity.shader).ok_or_else(|| WorldLoadError::UnknownShader {
                name: entity.shader.clone(),
                context: context(),
            })?;
            let transform = EntityTransform::new(
                vec3(entity.position),
                vec3(entity.scale),
                utils::deg_to_rad(entity.yaw_degrees),
            );
            self.add_entity(scene, model, shader, transform, entity.flags)?;
        }

        for light in &desc.lights {
            match *light {
                LightDescription::Directional { color, power, direction } => {
                    self.add_directional_light(scene, color_and_power(color, power), vec3(direction))?;
                }
                LightDescription::Positional { color, power, position } => {
                    self.add_positional_light(scene, color_and_power(color, power), vec3(position))?;
                }
            }
        }

        let skybox = match &desc.skybox {
            Some(name) => Some(self.textures().get(name).ok_or_else(|| WorldLoadError::UnknownTexture {
                name: name.clone(),
                context: format!("skybox of '{}'", desc.title),
            })?),
            None => None,
        };
        self.set_skybox(scene, skybox)?;
        self.set_ambient(scene, desc.ambient)?;
        self.set_obstacles(scene, desc.obstacles.clone())?;
        Ok(())
    }

    fn resolve_backing(&self, index: usize, desc: &PortalDescription) -> Result<Option<PortalBacking>, WorldLoadError> {
        match (&desc.backing_model, &desc.backing_shader) {
            (None, None) => Ok(None),
            (Some(model), Some(shader)) => {
                let context = || format!("backing of portal {index}");
                Ok(Some(PortalBacking {
                    model: self.models().get(model).ok_or_else(|| WorldLoadError::UnknownModel {
                        name: model.clone(),
                        context: context(),
                    })?,
                    shader: self.shaders().get(shader).ok_or_else(|| WorldLoadError::UnknownShader {
                        name: shader.clone(),
                        context: context(),
                    })?,
                }))
            }
            _ => Err(WorldLoadError::IncompleteBacking { index }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::CapacityKind;
    use approx::assert_relative_eq;

    const GALLERY: &str = r#"
        (
            models: ["pedestal", "frame"],
            shaders: ["lit", "flat"],
            textures: ["dusk"],
            scenes: [
                (
                    title: "hall",
                    entities: [
                        (model: "pedestal", shader: "lit", position: (0.0, 2.0, 0.0), flags: "ROTATING"),
                    ],
                    lights: [
                        Directional(color: (1.0, 1.0, 1.0), power: 0.8, direction: (0.0, 0.0, -2.0)),
                        Positional(color: (1.0, 0.8, 0.6), power: 3.0, position: (0.0, 0.0, 2.5)),
                    ],
                    skybox: Some("dusk"),
                    obstacles: Some((column_radius: 0.3, columns: [(2.0, 2.0)])),
                ),
                (title: "garden", ambient: (color: (0.2, 0.3, 0.2), intensity: 0.4)),
            ],
            portals: [
                (
                    source: 0, destination: 1, normal: (0.0, -1.0), center: (0.0, -1.5, 1.5),
                    backing_model: Some("frame"), backing_shader: Some("flat"),
                ),
                (source: 1, destination: 0, normal: (0.0, 1.0), center: (0.0, -1.5, 1.5), one_way: true),
            ],
            start: (scene: 0, theta_degrees: 270.0, radius: Some(3.0)),
        )
    "#;

    fn load(text: &str) -> Result<World, WorldLoadError> {
        let description = WorldDescription::from_ron_str(text)?;
        World::from_description(&description, CapacityConfig::default(), &MotionConfig::default())
    }

    #[test]
    fn test_loads_gallery() {
        let world = load(GALLERY).unwrap();
        assert_eq!(world.scenes().len(), 2);

        let hall = world.scene(SceneIndex(0)).unwrap();
        assert_eq!(hall.title(), "hall");
        assert_eq!(hall.entities().len(), 1);
        assert!(hall.entities()[0].flags.contains(EntityFlags::ROTATING));
        assert_eq!(hall.lights().directional_count(), 1);
        assert_eq!(hall.lights().positional_count(), 1);
        assert_eq!(hall.skybox, world.textures().get("dusk"));
        assert!(hall.obstacles.is_some());
        assert!(hall.permanent_portals()[0].backing().is_some());

        let garden = world.scene(SceneIndex(1)).unwrap();
        assert!(garden.permanent_portals()[0].is_one_way());
        assert_relative_eq!(garden.ambient.intensity, 0.4);

        assert_relative_eq!(world.player().position.radius(), 3.0, epsilon = 1e-5);
        assert_eq!(world.current_scene_index(), SceneIndex(0));
    }

    #[test]
    fn test_rejects_dangling_destination() {
        let text = r#"(scenes: [(title: "only")], portals: [(source: 0, destination: 3, normal: (0.0, 1.0), center: (0.0, 0.0, 1.0))])"#;
        match load(text) {
            Err(WorldLoadError::InvalidReference { index: 3, count: 1, .. }) => {}
            other => panic!("expected dangling reference error, got {other:?}"),
        }
    }

    #[test]
    fn test_rejects_unknown_model() {
        let text = r#"(shaders: ["lit"], scenes: [(title: "a", entities: [(model: "ghost", shader: "lit")])])"#;
        assert!(matches!(load(text), Err(WorldLoadError::UnknownModel { .. })));
    }

    #[test]
    fn test_rejects_half_specified_backing() {
        let text = r#"(
            models: ["frame"],
            scenes: [(title: "a"), (title: "b")],
            portals: [(source: 0, destination: 1, normal: (0.0, 1.0), center: (0.0, 0.0, 1.0), backing_model: Some("frame"))],
        )"#;
        assert!(matches!(load(text), Err(WorldLoadError::IncompleteBacking { index: 0 })));
    }

    #[test]
    fn test_capacity_errors_surface() {
        let scenes: Vec<String> = (0..9).map(|i| format!("(title: \"s{i}\")")).collect();
        let text = format!("(scenes: [{}])", scenes.join(", "));
        match load(&text) {
            Err(WorldLoadError::Scene(SceneError::CapacityExceeded { kind, limit, .. })) => {
                assert_eq!(kind, CapacityKind::Scenes);
                assert_eq!(limit, 8);
            }
            other => panic!("expected capacity error, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_error_is_reported() {
        assert!(matches!(load("(scenes: [("), Err(WorldLoadError::Parse(_))));
    }
}
