//! Portal visibility and stencil recursion
//!
//! Starting from the player's scene, every plausibly visible portal is
//! processed to completion before its next sibling:
//!
//! ```text
//! MarkPortal(ref d) -> ClearPortalDepth(ref d+1) -> DrawScene(dest, ref d+1)
//!     -> portals of dest, recursively -> UnmarkPortal(ref d+1)
//! ```
//!
//! The nesting depth is the stencil reference. Recursion stops at the
//! configured maximum depth, so cyclic portal graphs terminate.

use super::camera::PlayerCamera;
use super::commands::{DrawCommand, DrawList, PortalGeometry, PortalRef};
use super::projection::{ClipPlane, ProjectionError};
use super::RenderError;
use crate::core::config::RenderConfig;
use crate::foundation::math::{Mat4, Vec2, Vec4};
use crate::scene::{Portal, SceneIndex, World};

/// Cheap visibility test: the vantage point is in front of the portal and
/// the view direction points towards at least one of its lateral edges.
///
/// May accept portals that end up fully occluded or off-screen; never
/// rejects one that is actually visible from in front.
pub fn is_portal_visible(portal: &Portal, vantage: Vec2, view_direction: Vec2) -> bool {
    if !portal.is_in_front(vantage) {
        return false;
    }
    let (a, b) = portal.edge();
    (a - vantage).dot(&view_direction) > 0.0 || (b - vantage).dot(&view_direction) > 0.0
}

/// Pick the silhouette drawn for a portal's stencil and depth passes
///
/// A player standing in the threshold of a portal in their own scene would
/// have the flat quad cut by the near plane, so a thin volume is used instead.
pub fn select_geometry(
    portal: &Portal,
    owner: SceneIndex,
    current_scene: SceneIndex,
    player: Vec2,
    thickness: f32,
) -> PortalGeometry {
    if owner == current_scene && portal.is_within_width(player) {
        PortalGeometry::Volume { thickness }
    } else {
        PortalGeometry::Quad
    }
}

struct Traversal<'a> {
    world: &'a World,
    camera: &'a PlayerCamera,
    config: &'a RenderConfig,
    view: Mat4,
    view_direction: Vec2,
    eye: Vec2,
    list: DrawList,
}

impl Traversal<'_> {
    fn visit(&mut self, scene: SceneIndex, vantage: Vec2, depth: u8) -> Result<(), RenderError> {
        if depth >= self.config.max_recursion_depth {
            return Ok(());
        }

        let world = self.world;
        for (slot, portal) in world.scene(scene)?.portals() {
            if !is_portal_visible(portal, vantage, self.view_direction) {
                log::trace!("Portal {:?} of {} culled at depth {}", slot, scene, depth);
                continue;
            }

            let geometry = select_geometry(
                portal,
                scene,
                world.current_scene_index(),
                self.eye,
                self.config.portal_volume_thickness,
            );
            let transform = match geometry {
                PortalGeometry::Quad => portal.quad_transform(),
                PortalGeometry::Volume { thickness } => portal.volume_transform(thickness),
            };
            let portal_ref = PortalRef { scene, slot };
            let child = depth + 1;

            self.list.push(DrawCommand::MarkPortal {
                portal: portal_ref,
                geometry,
                transform,
                stencil_ref: depth,
            });
            self.list.push(DrawCommand::ClearPortalDepth {
                portal: portal_ref,
                geometry,
                transform,
                stencil_ref: child,
            });

            let destination = portal.destination();
            let projection = clipped_projection(
                self.camera,
                &self.view,
                portal.clip_plane_facing_away(self.eye),
                destination,
            )?;
            self.list.push(DrawCommand::DrawScene {
                scene: destination,
                depth: child,
                stencil_ref: child,
                projection,
            });

            self.visit(destination, portal.ground_center(), child)?;

            self.list.push(DrawCommand::UnmarkPortal {
                portal: portal_ref,
                geometry,
                transform,
                stencil_ref: child,
            });
        }
        Ok(())
    }
}

/// Projection for drawing the scene behind a portal: `world_plane` replaces
/// the near plane. A plane that gives no usable oblique frustum is logged and
/// the unclipped projection is used instead.
pub fn clipped_projection(
    camera: &PlayerCamera,
    view: &Mat4,
    world_plane: Vec4,
    destination: SceneIndex,
) -> Result<Mat4, RenderError> {
    let oblique = ClipPlane::from_world(world_plane, view).and_then(|plane| camera.oblique_projection(&plane));
    match oblique {
        Ok(projection) => Ok(projection),
        Err(err @ (ProjectionError::DegenerateClipPlane { .. } | ProjectionError::ZeroNormal)) => {
            log::warn!("Portal to {} gives no usable clip plane ({}); drawing it unclipped", destination, err);
            Ok(camera.projection()?)
        }
        Err(err) => Err(err.into()),
    }
}

/// Build the draw list for one frame as seen by `camera`
pub fn build_draw_list(world: &World, camera: &PlayerCamera, config: &RenderConfig) -> Result<DrawList, RenderError> {
    let mut traversal = Traversal {
        world,
        camera,
        config,
        view: camera.view_matrix()?,
        view_direction: camera.view_direction()?,
        eye: camera.ground_position(),
        list: DrawList::new(),
    };

    let current = world.current_scene_index();
    traversal.list.push(DrawCommand::DrawScene {
        scene: current,
        depth: 0,
        stencil_ref: 0,
        projection: camera.projection()?,
    });
    traversal.visit(current, traversal.eye, 0)?;

    let list = traversal.list;
    log::debug!(
        "Planned {} commands, {} scene draws, depth {}",
        list.len(),
        list.scene_draw_count(),
        list.max_depth()
    );
    Ok(list)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::{CapacityConfig, MotionConfig};
    use crate::foundation::math::constants::PI;
    use crate::foundation::math::Vec3;
    use crate::physics::PlayerPosition;
    use crate::render::Viewport;
    use crate::scene::{PortalInfo, PortalSlot};
    use approx::assert_relative_eq;

    fn ndc_depth(projection: &Mat4, view: &Mat4, point: Vec3) -> f32 {
        let clip = projection * view * Vec4::new(point.x, point.y, point.z, 1.0);
        clip.z / clip.w
    }

    fn wall(center: Vec3, normal: Vec2) -> PortalInfo {
        PortalInfo {
            normal,
            center,
            width: 10.0,
            depth: 0.5,
            height: 3.0,
            one_way: false,
            backing: None,
        }
    }

    /// Two scenes whose portals lead into each other forever
    fn mirror_hall() -> World {
        let mut world = World::new(CapacityConfig::default(), &MotionConfig::default());
        let a = world.add_scene("a").unwrap();
        let b = world.add_scene("b").unwrap();
        world
            .add_portal(a, b, &wall(Vec3::new(0.0, -1.0, 1.5), Vec2::new(0.0, -1.0)), false)
            .unwrap();
        world
            .add_portal(b, a, &wall(Vec3::new(0.0, -1.2, 1.5), Vec2::new(0.0, 1.0)), false)
            .unwrap();
        world.player_mut().position = PlayerPosition::from_polar(PI * 1.25, 2.5 * 2.0_f32.sqrt(), 1.5);
        world
    }

    fn camera(world: &World, config: &RenderConfig) -> PlayerCamera {
        PlayerCamera::from_player(&world.player().position, Viewport::new(640, 480), config)
    }

    #[test]
    fn test_cyclic_graph_respects_depth_bound() {
        let world = mirror_hall();
        for depth in [0u8, 1, 2, 3, 5] {
            let config = RenderConfig::default().with_max_recursion_depth(depth);
            let list = build_draw_list(&world, &camera(&world, &config), &config).unwrap();
            assert_eq!(list.max_depth(), depth);
            assert_eq!(list.scene_draw_count(), usize::from(depth) + 1);
            assert_eq!(list.stencil_balance(), Ok(()));
        }
    }

    #[test]
    fn test_child_follows_mark_and_clear() {
        let world = mirror_hall();
        let config = RenderConfig::default();
        let list = build_draw_list(&world, &camera(&world, &config), &config).unwrap();
        let commands = list.commands();

        assert!(matches!(commands[0], DrawCommand::DrawScene { depth: 0, .. }));
        assert!(matches!(commands[1], DrawCommand::MarkPortal { stencil_ref: 0, .. }));
        assert!(matches!(commands[2], DrawCommand::ClearPortalDepth { stencil_ref: 1, .. }));
        assert!(matches!(
            commands[3],
            DrawCommand::DrawScene {
                scene: SceneIndex(1),
                depth: 1,
                ..
            }
        ));
        assert!(matches!(commands.last(), Some(DrawCommand::UnmarkPortal { stencil_ref: 1, .. })));
    }

    #[test]
    fn test_portal_behind_player_draws_only_own_scene() {
        let mut world = mirror_hall();
        // Behind the scene-0 portal's plane
        world.player_mut().position = PlayerPosition::from_polar(PI * 0.5, 2.0, 1.5);
        let config = RenderConfig::default();
        let list = build_draw_list(&world, &camera(&world, &config), &config).unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list.stencil_balance(), Ok(()));
    }

    #[test]
    fn test_visibility_heuristic() {
        let info = PortalInfo {
            normal: Vec2::new(0.0, -1.0),
            center: Vec3::new(0.0, -1.5, 1.5),
            width: 3.0,
            depth: 0.5,
            height: 3.0,
            one_way: false,
            backing: None,
        };
        let portal = Portal::new(&info, SceneIndex(1), false).unwrap();
        let vantage = Vec2::new(0.0, -3.0);

        assert!(is_portal_visible(&portal, vantage, Vec2::new(0.0, 1.0)));
        // Looking sideways still sees one edge
        assert!(is_portal_visible(&portal, vantage, Vec2::new(1.0, 0.0)));
        assert!(!is_portal_visible(&portal, vantage, Vec2::new(0.0, -1.0)));
        assert!(!is_portal_visible(&portal, Vec2::new(0.0, 0.0), Vec2::new(0.0, -1.0)));
    }

    #[test]
    fn test_volume_only_in_threshold_of_current_scene() {
        let info = wall(Vec3::new(0.0, -1.0, 1.5), Vec2::new(0.0, -1.0));
        let portal = Portal::new(&info, SceneIndex(1), false).unwrap();
        let inside = Vec2::new(1.0, -1.1);
        let outside = Vec2::new(6.0, -1.1);

        assert_eq!(
            select_geometry(&portal, SceneIndex(0), SceneIndex(0), inside, 0.25),
            PortalGeometry::Volume { thickness: 0.25 }
        );
        assert_eq!(select_geometry(&portal, SceneIndex(0), SceneIndex(0), outside, 0.25), PortalGeometry::Quad);
        assert_eq!(select_geometry(&portal, SceneIndex(1), SceneIndex(0), inside, 0.25), PortalGeometry::Quad);
    }

    #[test]
    fn test_transient_portal_is_traversed() {
        let mut world = World::new(CapacityConfig::default(), &MotionConfig::default());
        let a = world.add_scene("a").unwrap();
        let b = world.add_scene("b").unwrap();
        world
            .add_portal(a, b, &wall(Vec3::new(0.0, -1.0, 1.5), Vec2::new(0.0, -1.0)), true)
            .unwrap();
        world.player_mut().position = PlayerPosition::from_polar(PI * 1.5, 3.0, 1.5);

        let config = RenderConfig::default();
        let list = build_draw_list(&world, &camera(&world, &config), &config).unwrap();
        let marked = list.iter().any(|command| {
            matches!(
                command,
                DrawCommand::MarkPortal {
                    portal: PortalRef {
                        slot: PortalSlot::Transient,
                        ..
                    },
                    ..
                }
            )
        });
        assert!(marked);
    }

    #[test]
    fn test_nested_scene_is_clipped_at_portal_plane() {
        let world = mirror_hall();
        let config = RenderConfig::default().with_max_recursion_depth(1);
        let camera = camera(&world, &config);
        let view = camera.view_matrix().unwrap();
        let list = build_draw_list(&world, &camera, &config).unwrap();

        let projection = list
            .iter()
            .find_map(|command| match command {
                DrawCommand::DrawScene {
                    depth: 1, projection, ..
                } => Some(*projection),
                _ => None,
            })
            .unwrap();

        // Portal of scene 0 sits on y = -1; the player stands at (-2.5, -2.5)
        assert_relative_eq!(ndc_depth(&projection, &view, Vec3::new(0.0, -1.0, 1.5)), -1.0, epsilon = 1e-3);
        assert!(ndc_depth(&projection, &view, Vec3::new(-1.25, -1.75, 1.5)) < -1.0);
        let beyond = ndc_depth(&projection, &view, Vec3::new(0.5, 0.5, 1.5));
        assert!(beyond > -1.0 && beyond < 1.0);

        // The unclipped camera keeps the point in front of the portal
        let unclipped = camera.projection().unwrap();
        assert!(ndc_depth(&unclipped, &view, Vec3::new(-1.25, -1.75, 1.5)) > -1.0);
    }

    #[test]
    fn test_unusable_clip_plane_falls_back_to_camera_projection() {
        let world = mirror_hall();
        let config = RenderConfig::default();
        let camera = camera(&world, &config);
        let unclipped = camera.projection().unwrap();

        let zero = clipped_projection(&camera, &camera.view_matrix().unwrap(), Vec4::zeros(), SceneIndex(1)).unwrap();
        assert_eq!(zero, unclipped);

        // With an identity view, the far plane z = -far meets the frustum's far
        // corner and leaves no oblique frustum
        let w = (1.0 + unclipped[(2, 2)]) / unclipped[(2, 3)];
        let far_plane = Vec4::new(0.0, 0.0, 1.0, 1.0 / w);
        let degenerate = clipped_projection(&camera, &Mat4::identity(), far_plane, SceneIndex(1)).unwrap();
        assert_eq!(degenerate, unclipped);
    }
}
