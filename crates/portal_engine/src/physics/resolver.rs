//! Collision and scene-transition resolver
//!
//! Runs once per simulation tick, before rendering, and is the only place the
//! player's position and current scene change during play:
//!
//! 1. input (or fling) becomes a proposed polar move
//! 2. static column obstacles push the proposal out
//! 3. the radius is clamped into the walkable ring
//! 4. portal backing volumes push the proposal out when approached from behind
//! 5. crossing a portal threshold from the front switches scenes
//!
//! Angles stay wrapped into `[0, 2π)` throughout because positions are only
//! ever built through [`PlayerPosition`]'s constructors.

use super::collision::{correct_against_columns, BackingBox, Segment};
use super::motion::polar_delta;
use super::player::PlayerPosition;
use crate::core::config::MotionConfig;
use crate::foundation::math::NORMALIZE_EPSILON;
use crate::input::InputSample;
use crate::scene::{Portal, PortalSlot, SceneError, SceneIndex, World};

/// A completed walk through a portal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SceneTransition {
    /// Scene the player left
    pub from: SceneIndex,
    /// Scene the player entered
    pub to: SceneIndex,
    /// Portal crossed, in the departed scene
    pub portal: PortalSlot,
    /// A transient way back was created in the destination
    pub synthesized_transient: bool,
    /// The departed scene's transient portal was dropped
    pub removed_transient: bool,
}

/// Result of one resolver tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickOutcome {
    /// Player position after all corrections
    pub position: PlayerPosition,
    /// Scene change caused by this tick, if any
    pub transition: Option<SceneTransition>,
}

/// Advance the player by one tick of input
pub fn resolve_tick(world: &mut World, input: &InputSample, config: &MotionConfig) -> Result<TickOutcome, SceneError> {
    world.clock_mut().tick();

    let start = world.player().position;
    let delta = world.player_mut().motion.next_delta(input, config);
    let (d_theta, d_radius) = polar_delta(delta, start.radius(), config);

    resolve_move(world, start.offset(d_theta, d_radius), config)
}

/// Move the player from its current position towards `proposed`, applying
/// collision corrections and portal transitions
pub fn resolve_move(
    world: &mut World,
    proposed: PlayerPosition,
    config: &MotionConfig,
) -> Result<TickOutcome, SceneError> {
    let start = world.player().position;
    let prior = start.ground();
    let eye_height = start.eye_height();
    let scene_index = world.current_scene_index();
    let scene = world.scene(scene_index)?;

    let mut point = proposed.ground();
    if let Some(obstacles) = &scene.obstacles {
        point = correct_against_columns(obstacles, point, config.player_radius);
    }

    // Keep the proposed heading when a correction lands on the origin itself
    let corrected = if point.magnitude() > NORMALIZE_EPSILON {
        PlayerPosition::from_ground(point, eye_height)
    } else {
        PlayerPosition::from_polar(proposed.theta(), 0.0, eye_height)
    };
    point = corrected
        .clamp_radius(config.inner_bounding_radius, config.outer_bounding_radius)
        .ground();

    for (_, portal) in scene.portals() {
        if portal.backing().is_none() || portal.is_in_front(prior) {
            continue;
        }
        if let Some(pushed) = BackingBox::from_portal(portal, config.collision_buffer).push_out(point) {
            log::trace!("Backing volume of portal to {} pushed player out", portal.destination());
            point = pushed;
        }
    }

    // Ending on the plane is not a crossing: the way back only opens from
    // strictly in front of it
    let path = Segment::new(prior, point);
    let crossing: Option<(PortalSlot, Portal)> = scene
        .portals()
        .find(|(_, portal)| {
            portal.is_in_front(prior) && portal.signed_distance(point) < 0.0 && path.intersects(&threshold(portal))
        })
        .map(|(slot, portal)| (slot, *portal));

    let position = PlayerPosition::from_ground(point, eye_height);
    world.player_mut().position = position;

    let transition = match crossing {
        Some((slot, portal)) => Some(cross_portal(world, scene_index, slot, &portal)?),
        None => None,
    };

    log::trace!(
        "Player at θ={:.3} r={:.3} in {}",
        position.theta(),
        position.radius(),
        world.current_scene_index()
    );

    Ok(TickOutcome { position, transition })
}

fn threshold(portal: &Portal) -> Segment {
    let (a, b) = portal.edge();
    Segment::new(a, b)
}

fn cross_portal(
    world: &mut World,
    from: SceneIndex,
    slot: PortalSlot,
    portal: &Portal,
) -> Result<SceneTransition, SceneError> {
    let to = portal.destination();

    let synthesized_transient = portal.is_one_way();
    if synthesized_transient {
        world.install_transient_portal(to, portal.reversed(from))?;
    }
    let removed_transient = world.remove_transient_portal(from)?.is_some();
    world.set_current_scene(to)?;

    log::info!(
        "Crossed into '{}' ({} -> {}){}",
        world.scene(to)?.title(),
        from,
        to,
        if synthesized_transient { ", way back is transient" } else { "" }
    );

    Ok(SceneTransition {
        from,
        to,
        portal: slot,
        synthesized_transient,
        removed_transient,
    })
}
