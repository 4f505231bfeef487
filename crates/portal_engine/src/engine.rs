//! Engine facade
//!
//! Bundles the configuration, the world and the renderer, so an application
//! only needs to feed one input sample and one backend per frame.

use crate::config::ConfigError;
use crate::core::config::{Config, EngineConfig};
use crate::input::InputSample;
use crate::render::{FrameStats, GraphicsBackend, RenderError, Renderer, Viewport};
use crate::scene::{World, WorldDescription, WorldLoadError};
use thiserror::Error;

/// Main engine struct
///
/// Owns the world for its whole lifetime; everything runs on the caller's
/// thread, one frame at a time.
#[derive(Debug)]
pub struct Engine {
    world: World,
    renderer: Renderer,
}

impl Engine {
    /// Create an engine over an already built world
    pub fn new(config: EngineConfig, world: World) -> Result<Self, EngineError> {
        log::info!("Initializing engine...");
        let renderer = Renderer::new(config)?;
        Ok(Self { world, renderer })
    }

    /// Build an engine from a world description
    pub fn from_description(config: EngineConfig, description: &WorldDescription) -> Result<Self, EngineError> {
        config.validate()?;
        let world = World::from_description(description, config.capacity.clone(), &config.motion)?;
        Self::new(config, world)
    }

    /// Load the configuration (`.toml` or `.ron`) and the world (`.ron`) from disk
    pub fn load(config_path: &str, world_path: &str) -> Result<Self, EngineError> {
        let config = EngineConfig::load_from_file(config_path)?;
        config.validate()?;
        log::info!("Loaded configuration from {}", config_path);
        let world = World::load_from_file(world_path, config.capacity.clone(), &config.motion)?;
        Self::new(config, world)
    }

    /// Resolve one tick of input and draw the frame
    pub fn frame<B: GraphicsBackend + ?Sized>(
        &mut self,
        input: &InputSample,
        viewport: Viewport,
        backend: &mut B,
    ) -> Result<FrameStats, EngineError> {
        Ok(self.renderer.render_frame(&mut self.world, input, viewport, backend)?)
    }

    /// The world
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Mutable access to the world
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    /// The renderer
    pub fn renderer(&self) -> &Renderer {
        &self.renderer
    }

    /// Active configuration
    pub fn config(&self) -> &EngineConfig {
        self.renderer.config()
    }
}

/// Engine errors
#[derive(Error, Debug)]
pub enum EngineError {
    /// Configuration could not be loaded or was rejected
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The world description could not be loaded
    #[error("World loading failed: {0}")]
    WorldLoad(#[from] WorldLoadError),

    /// A frame could not be rendered
    #[error("Rendering error: {0}")]
    Render(#[from] RenderError),
}
