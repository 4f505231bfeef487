//! Player movement on the ground plane
//!
//! The player's position is owned by [`World`](crate::scene::World) and only
//! changes through [`resolver::resolve_tick`], which runs before each frame.

pub mod collision;
pub mod motion;
pub mod player;
pub mod resolver;

pub use collision::{correct_against_columns, BackingBox, Circle, Segment};
pub use motion::{polar_delta, PlayerMotion};
pub use player::{PlayerPosition, PlayerState};
pub use resolver::{resolve_move, resolve_tick, SceneTransition, TickOutcome};
