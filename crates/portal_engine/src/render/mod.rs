//! # Rendering
//!
//! Stencil-masked portal rendering, expressed as data.
//!
//! ## Architecture
//!
//! - **Camera**: player-following perspective camera
//! - **Projection**: perspective and oblique-near-plane matrices
//! - **Traversal**: recursive portal visibility producing a [`DrawList`]
//! - **Renderer**: per-frame driver replaying the list on a [`GraphicsBackend`]
//!
//! The traversal is pure: it reads the [`World`](crate::scene::World) and
//! returns commands, so frames can be planned and checked without a GPU.

pub mod camera;
pub mod commands;
pub mod portal_traversal;
pub mod projection;
pub mod renderer;

pub use camera::{PlayerCamera, Viewport};
pub use commands::{
    CompareFunc, DepthState, DrawCommand, DrawList, PipelineState, PortalGeometry, PortalRef, StencilError,
    StencilOp, StencilState,
};
pub use portal_traversal::{build_draw_list, is_portal_visible, select_geometry};
pub use projection::{ClipPlane, ProjectionError};
pub use renderer::{
    FrameStats, FrameUniforms, GraphicsBackend, LightUniform, ObjectDraw, ObjectUniforms, PortalDraw, PortalPass,
    Renderer, SceneDraw,
};

use thiserror::Error;

use crate::config::ConfigError;
use crate::foundation::math::MathError;
use crate::scene::SceneError;

/// Rendering system errors
#[derive(Error, Debug)]
pub enum RenderError {
    /// Renderer configuration was rejected
    #[error("Renderer configuration invalid: {0}")]
    Config(#[from] ConfigError),

    /// The world referenced something that does not exist
    #[error("Scene error: {0}")]
    Scene(#[from] SceneError),

    /// A projection matrix could not be built
    #[error("Projection error: {0}")]
    Projection(#[from] ProjectionError),

    /// Camera geometry was degenerate
    #[error("Camera error: {0}")]
    Math(#[from] MathError),

    /// A draw list broke stencil bookkeeping
    #[error("Stencil error: {0}")]
    Stencil(#[from] StencilError),

    /// A rendering operation failed during execution
    ///
    /// Backends report their own failures through this variant.
    #[error("Rendering failed: {0}")]
    RenderingFailed(String),
}
