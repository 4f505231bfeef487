//! # Portal Engine
//!
//! Core of a walkable gallery of scenes connected by portals.
//!
//! ## Features
//!
//! - **Scene Registry**: bounded scenes with entities, lights and portals
//! - **Portal Rendering**: recursive stencil-masked traversal emitting draw commands
//! - **Oblique Projection**: near planes aligned to portal surfaces
//! - **Movement**: polar player motion with fling, collision and scene transitions
//! - **Data Driven**: TOML/RON configuration and RON world descriptions
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use portal_engine::prelude::*;
//!
//! fn run(backend: &mut dyn GraphicsBackend) -> Result<(), EngineError> {
//!     let mut engine = Engine::load("engine.toml", "gallery.ron")?;
//!     let stats = engine.frame(&InputSample::pan(0.0, 0.02), Viewport::new(1280, 720), backend)?;
//!     log::info!("{} scenes drawn", stats.scenes_drawn);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

// Core engine modules
pub mod core;

pub mod config;
pub mod foundation;
pub mod input;
pub mod physics;
pub mod render;
pub mod scene;

mod engine;

pub use engine::{Engine, EngineError};

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        core::config::{CapacityConfig, Config, EngineConfig, MotionConfig, RenderConfig},
        foundation::math::{Mat4, Vec2, Vec3, Vec4},
        input::InputSample,
        physics::{PlayerPosition, SceneTransition, TickOutcome},
        render::{
            DrawCommand, DrawList, FrameStats, GraphicsBackend, PipelineState, PortalDraw, RenderError, Renderer,
            SceneDraw, Viewport,
        },
        scene::{PortalInfo, SceneError, SceneIndex, World, WorldDescription, WorldLoadError},
        Engine, EngineError,
    };
}
