//! Scene graph and portal registry
//!
//! A [`World`] owns a small, bounded set of [`Scene`]s. Scenes share one
//! coordinate space and are connected by [`Portal`]s; each scene carries a
//! unique single-bit stencil mask identifying it during portal rendering.
//!
//! Content is appended once at load time (see [`loader`]); every append is
//! capacity checked and reports a [`SceneError`] instead of truncating.

pub mod entity;
pub mod lighting;
pub mod loader;
pub mod portal;
pub mod resources;
#[allow(clippy::module_inception)]
pub mod scene;
pub mod world;

pub use entity::{Entity, EntityFlags, EntityTransform};
pub use lighting::{AmbientLight, Light, LightKind, LightStack};
pub use loader::{WorldDescription, WorldLoadError};
pub use portal::{Portal, PortalBacking, PortalInfo, PortalSlot};
pub use resources::{ModelHandle, ResourceRegistry, ShaderHandle, TextureHandle};
pub use scene::{Scene, StaticObstacles};
pub use world::World;

use crate::foundation::math::MathError;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Index of a scene inside its [`World`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SceneIndex(pub usize);

impl fmt::Display for SceneIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "scene #{}", self.0)
    }
}

/// Which bounded collection overflowed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapacityKind {
    /// World scene registry
    Scenes,
    /// Permanent portals of one scene
    Portals,
    /// Entities of one scene
    Entities,
    /// Shared light array of one scene
    Lights,
}

impl fmt::Display for CapacityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Scenes => "scenes",
            Self::Portals => "portals",
            Self::Entities => "entities",
            Self::Lights => "lights",
        };
        f.write_str(name)
    }
}

/// Scene registry errors
///
/// All of these are content/configuration errors surfaced while the world is
/// being populated; none can occur once loading has succeeded.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SceneError {
    /// A bounded collection is full
    #[error("Too many {kind} in {owner}: limit is {limit}")]
    CapacityExceeded {
        /// Collection that overflowed
        kind: CapacityKind,
        /// Configured limit
        limit: usize,
        /// Human readable owner ("world" or the scene title)
        owner: String,
    },

    /// A scene index does not refer to an existing scene
    #[error("{index} does not exist (world has {count} scenes)")]
    InvalidScene {
        /// Offending index
        index: SceneIndex,
        /// Number of scenes in the world
        count: usize,
    },

    /// A portal definition is malformed
    #[error("Invalid portal: {0}")]
    InvalidPortal(String),

    /// A direction or normal could not be normalized
    #[error("Degenerate geometry: {0}")]
    Math(#[from] MathError),
}
