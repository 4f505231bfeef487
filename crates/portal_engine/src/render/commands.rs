//! Draw command list produced by the portal traversal
//!
//! The traversal never talks to a graphics API. It emits an ordered
//! [`DrawList`] that a backend replays; every command carries the exact
//! stencil reference it must be issued under, so the whole frame's stencil
//! bookkeeping can be verified without a GPU via [`DrawList::stencil_balance`].

use thiserror::Error;

use crate::foundation::math::Mat4;
use crate::scene::{PortalSlot, SceneIndex};

/// Identifies a portal by owning scene and slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PortalRef {
    /// Scene the portal stands in
    pub scene: SceneIndex,
    /// Slot inside that scene
    pub slot: PortalSlot,
}

/// Shape rasterized for a portal's stencil and depth passes
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PortalGeometry {
    /// The flat portal rectangle
    Quad,
    /// A box straddling the portal face, used while the player stands in the
    /// threshold so the near plane cannot slice the quad away
    Volume {
        /// Depth of the box along the portal normal
        thickness: f32,
    },
}

/// Comparison used for stencil and depth tests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareFunc {
    /// Always passes
    Always,
    /// Passes when equal to the reference
    Equal,
    /// Passes when closer than the stored depth
    Less,
}

/// Stencil update on pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StencilOp {
    /// Leave the stored value
    Keep,
    /// Add one, saturating
    Increment,
    /// Subtract one, saturating
    Decrement,
}

/// Stencil configuration of one draw
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StencilState {
    /// Test against the reference
    pub compare: CompareFunc,
    /// Reference value
    pub reference: u8,
    /// Update applied where both stencil and depth pass
    pub pass_op: StencilOp,
}

/// Depth configuration of one draw
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DepthState {
    /// Depth test
    pub compare: CompareFunc,
    /// Depth writes enabled
    pub write: bool,
}

/// Complete fixed-function state for one draw
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineState {
    /// Stencil test and update
    pub stencil: StencilState,
    /// Depth test and writes
    pub depth: DepthState,
    /// Colour writes enabled
    pub color_write: bool,
}

/// One step of a frame
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    /// Draw every entity of a scene where the stencil equals `stencil_ref`
    DrawScene {
        /// Scene to draw
        scene: SceneIndex,
        /// Portal nesting depth; 0 is the player's own scene
        depth: u8,
        /// Stencil reference the scene is masked to
        stencil_ref: u8,
        /// Projection to draw with, oblique-clipped for nested scenes
        projection: Mat4,
    },
    /// Increment the stencil inside the visible portal silhouette
    MarkPortal {
        /// Portal being entered
        portal: PortalRef,
        /// Shape rasterized
        geometry: PortalGeometry,
        /// Model transform of the shape
        transform: Mat4,
        /// Parent reference tested against
        stencil_ref: u8,
    },
    /// Reset depth to the far plane inside the marked silhouette
    ClearPortalDepth {
        /// Portal being entered
        portal: PortalRef,
        /// Shape rasterized
        geometry: PortalGeometry,
        /// Model transform of the shape
        transform: Mat4,
        /// Child reference tested against
        stencil_ref: u8,
    },
    /// Decrement the stencil back to the parent reference
    UnmarkPortal {
        /// Portal being left
        portal: PortalRef,
        /// Shape rasterized
        geometry: PortalGeometry,
        /// Model transform of the shape
        transform: Mat4,
        /// Child reference tested against
        stencil_ref: u8,
    },
}

impl DrawCommand {
    /// Stencil reference this command is issued under
    pub fn stencil_ref(&self) -> u8 {
        match self {
            Self::DrawScene { stencil_ref, .. }
            | Self::MarkPortal { stencil_ref, .. }
            | Self::ClearPortalDepth { stencil_ref, .. }
            | Self::UnmarkPortal { stencil_ref, .. } => *stencil_ref,
        }
    }

    /// Fixed-function state a backend must set before executing the command
    pub fn pipeline_state(&self) -> PipelineState {
        let reference = self.stencil_ref();
        let stencil = |pass_op| StencilState {
            compare: CompareFunc::Equal,
            reference,
            pass_op,
        };
        match self {
            Self::DrawScene { .. } => PipelineState {
                stencil: stencil(StencilOp::Keep),
                depth: DepthState {
                    compare: CompareFunc::Less,
                    write: true,
                },
                color_write: true,
            },
            // Only the unoccluded part of the portal is marked
            Self::MarkPortal { .. } => PipelineState {
                stencil: stencil(StencilOp::Increment),
                depth: DepthState {
                    compare: CompareFunc::Less,
                    write: false,
                },
                color_write: false,
            },
            Self::ClearPortalDepth { .. } => PipelineState {
                stencil: stencil(StencilOp::Keep),
                depth: DepthState {
                    compare: CompareFunc::Always,
                    write: true,
                },
                color_write: false,
            },
            // Writes the portal surface's depth so later siblings are
            // occluded by it as by an opaque wall
            Self::UnmarkPortal { .. } => PipelineState {
                stencil: stencil(StencilOp::Decrement),
                depth: DepthState {
                    compare: CompareFunc::Always,
                    write: true,
                },
                color_write: false,
            },
        }
    }
}

/// Stencil bookkeeping violations found in a draw list
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StencilError {
    /// A command was issued under a reference other than the current one
    #[error("Command {index} uses stencil reference {found}, expected {expected}")]
    ReferenceMismatch {
        /// Position in the list
        index: usize,
        /// Reference in effect at that point
        expected: u8,
        /// Reference the command carries
        found: u8,
    },

    /// An unmark without a matching mark
    #[error("Command {index} unmarks below the top-level reference")]
    Underflow {
        /// Position in the list
        index: usize,
    },

    /// Marks left open at the end of the frame
    #[error("{open} portal marks were never undone")]
    Unbalanced {
        /// Number of unmatched marks
        open: usize,
    },
}

/// Ordered draw commands for one frame
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DrawList {
    commands: Vec<DrawCommand>,
}

impl DrawList {
    /// Create an empty list
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, command: DrawCommand) {
        log::trace!("Queued {} (ref {})", command_name(&command), command.stencil_ref());
        self.commands.push(command);
    }

    /// Commands in execution order
    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Iterate over the commands in execution order
    pub fn iter(&self) -> std::slice::Iter<'_, DrawCommand> {
        self.commands.iter()
    }

    /// Number of commands
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Whether the list is empty
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Deepest nesting at which a scene is drawn
    pub fn max_depth(&self) -> u8 {
        self.commands
            .iter()
            .filter_map(|command| match command {
                DrawCommand::DrawScene { depth, .. } => Some(*depth),
                _ => None,
            })
            .max()
            .unwrap_or(0)
    }

    /// Number of scene draws, counting repeated scenes each time
    pub fn scene_draw_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|command| matches!(command, DrawCommand::DrawScene { .. }))
            .count()
    }

    /// Replay the logical stencil value and check every command is issued
    /// under the reference in effect, every mark is undone, and the frame
    /// ends at the top-level reference 0
    pub fn stencil_balance(&self) -> Result<(), StencilError> {
        let mut stack: Vec<u8> = vec![0];

        for (index, command) in self.commands.iter().enumerate() {
            let expected = stack.last().copied().ok_or(StencilError::Underflow { index })?;
            let found = command.stencil_ref();
            if found != expected {
                return Err(StencilError::ReferenceMismatch { index, expected, found });
            }
            match command {
                DrawCommand::MarkPortal { .. } => stack.push(found.saturating_add(1)),
                DrawCommand::UnmarkPortal { .. } => {
                    stack.pop();
                    if stack.is_empty() {
                        return Err(StencilError::Underflow { index });
                    }
                }
                DrawCommand::DrawScene { .. } | DrawCommand::ClearPortalDepth { .. } => {}
            }
        }

        match stack.len() {
            1 => Ok(()),
            n => Err(StencilError::Unbalanced { open: n - 1 }),
        }
    }
}

impl<'a> IntoIterator for &'a DrawList {
    type Item = &'a DrawCommand;
    type IntoIter = std::slice::Iter<'a, DrawCommand>;

    fn into_iter(self) -> Self::IntoIter {
        self.commands.iter()
    }
}

fn command_name(command: &DrawCommand) -> &'static str {
    match command {
        DrawCommand::DrawScene { .. } => "DrawScene",
        DrawCommand::MarkPortal { .. } => "MarkPortal",
        DrawCommand::ClearPortalDepth { .. } => "ClearPortalDepth",
        DrawCommand::UnmarkPortal { .. } => "UnmarkPortal",
    }
}
