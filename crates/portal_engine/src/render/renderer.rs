//! Frame orchestration
//!
//! [`Renderer::render_frame`] is the per-frame entry point: it advances the
//! player through the resolver, derives the camera, plans the portal draw list
//! and replays it against a [`GraphicsBackend`]. The backend owns every GPU
//! resource; it only ever receives explicit pipeline state and plain uniform
//! blocks.

use bytemuck::{Pod, Zeroable};

use super::camera::{PlayerCamera, Viewport};
use super::commands::{DrawCommand, DrawList, PipelineState, PortalGeometry, PortalRef};
use super::portal_traversal::build_draw_list;
use super::RenderError;
use crate::core::config::{EngineConfig, MAX_LIGHTS_PER_SCENE};
use crate::foundation::math::{Mat4, Vec3};
use crate::input::InputSample;
use crate::physics::{resolve_tick, SceneTransition};
use crate::scene::{EntityFlags, LightKind, ModelHandle, Scene, SceneIndex, ShaderHandle, TextureHandle, World};

/// One light as uploaded to shaders
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct LightUniform {
    /// RGB colour and power
    pub color_and_power: [f32; 4],
    /// Direction (`w = 0`) or position (`w = 1`)
    pub vector: [f32; 4],
}

/// Per scene-draw uniform block
///
/// Lights are packed like a scene's light array: directional lights from
/// index 0 upward, positional lights from the last index downward.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct FrameUniforms {
    /// World to view transform
    pub view: [[f32; 4]; 4],
    /// View to clip transform, oblique for nested scenes
    pub projection: [[f32; 4]; 4],
    /// Camera position (`w = 1`)
    pub camera_position: [f32; 4],
    /// Ambient colour and intensity
    pub ambient: [f32; 4],
    /// Shared light array
    pub lights: [LightUniform; MAX_LIGHTS_PER_SCENE],
    /// Number of directional lights
    pub directional_count: u32,
    /// Number of positional lights
    pub positional_count: u32,
    /// Stencil reference of this draw
    pub stencil_ref: u32,
    /// Simulation time in seconds
    pub time: f32,
}

impl FrameUniforms {
    fn for_scene(scene: &Scene, view: &Mat4, projection: &Mat4, eye: Vec3, stencil_ref: u8, time: f32) -> Self {
        let mut uniforms = Self {
            view: (*view).into(),
            projection: (*projection).into(),
            camera_position: [eye.x, eye.y, eye.z, 1.0],
            ambient: [
                scene.ambient.color[0],
                scene.ambient.color[1],
                scene.ambient.color[2],
                scene.ambient.intensity,
            ],
            stencil_ref: u32::from(stencil_ref),
            time,
            ..Self::zeroed()
        };

        let lights = scene.lights();
        for (slot, light) in lights.directional().take(MAX_LIGHTS_PER_SCENE).enumerate() {
            uniforms.lights[slot] = light_uniform(light.color_and_power.into(), light.kind);
            uniforms.directional_count += 1;
        }
        let room = MAX_LIGHTS_PER_SCENE - uniforms.directional_count as usize;
        for (i, light) in lights.positional().take(room).enumerate() {
            uniforms.lights[MAX_LIGHTS_PER_SCENE - 1 - i] = light_uniform(light.color_and_power.into(), light.kind);
            uniforms.positional_count += 1;
        }
        uniforms
    }
}

fn light_uniform(color_and_power: [f32; 4], kind: LightKind) -> LightUniform {
    let vector = match kind {
        LightKind::Directional { direction } => [direction.x, direction.y, direction.z, 0.0],
        LightKind::Positional { position } => [position.x, position.y, position.z, 1.0],
    };
    LightUniform { color_and_power, vector }
}

/// Per-object uniform block
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct ObjectUniforms {
    /// Object to world transform
    pub model: [[f32; 4]; 4],
    /// `EntityFlags` bits
    pub flags: u32,
    /// Padding to a 16-byte multiple
    pub _padding: [u32; 3],
}

impl ObjectUniforms {
    fn new(model: &Mat4, flags: EntityFlags) -> Self {
        Self {
            model: (*model).into(),
            flags: flags.bits(),
            _padding: [0; 3],
        }
    }
}

/// One model instance inside a scene draw
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObjectDraw {
    /// Model to draw
    pub model: ModelHandle,
    /// Shader to draw it with
    pub shader: ShaderHandle,
    /// Per-object uniforms
    pub uniforms: ObjectUniforms,
}

/// Everything a backend needs to draw one scene
#[derive(Debug, Clone, PartialEq)]
pub struct SceneDraw {
    /// Scene drawn
    pub scene: SceneIndex,
    /// Portal nesting depth
    pub depth: u8,
    /// Skybox cubemap, drawn first when present
    pub skybox: Option<TextureHandle>,
    /// Scene-wide uniforms
    pub uniforms: FrameUniforms,
    /// Entities followed by portal backings
    pub objects: Vec<ObjectDraw>,
}

/// Which portal pass a [`PortalDraw`] belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortalPass {
    /// Stencil increment
    Mark,
    /// Far-depth write
    ClearDepth,
    /// Stencil decrement
    Unmark,
}

/// One portal silhouette draw
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PortalDraw {
    /// Portal drawn
    pub portal: PortalRef,
    /// Pass this draw belongs to
    pub pass: PortalPass,
    /// Shape to rasterize
    pub geometry: PortalGeometry,
    /// View to clip transform of the enclosing scene
    pub projection: [[f32; 4]; 4],
    /// World to view transform
    pub view: [[f32; 4]; 4],
    /// Shape to world transform
    pub model: [[f32; 4]; 4],
}

/// Graphics API collaborator
///
/// Implementations translate pipeline state into their API's stencil, depth
/// and colour-mask settings and rasterize the requested draws. Calls arrive in
/// draw-list order between `begin_frame` and `end_frame`.
pub trait GraphicsBackend {
    /// Start a frame: clear colour, depth to far and stencil to 0
    fn begin_frame(&mut self, viewport: Viewport) -> Result<(), RenderError>;

    /// Apply fixed-function state for the next draw
    fn set_pipeline_state(&mut self, state: &PipelineState) -> Result<(), RenderError>;

    /// Draw a scene's skybox and objects
    fn draw_scene(&mut self, draw: &SceneDraw) -> Result<(), RenderError>;

    /// Rasterize a portal silhouette
    fn draw_portal(&mut self, draw: &PortalDraw) -> Result<(), RenderError>;

    /// Finish and present the frame
    fn end_frame(&mut self) -> Result<(), RenderError>;
}

/// Summary of one rendered frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Draw commands executed
    pub commands: usize,
    /// Scene draws, counting repeats
    pub scenes_drawn: usize,
    /// Deepest portal nesting drawn
    pub max_depth: u8,
    /// Scene change caused by this frame's movement
    pub transition: Option<SceneTransition>,
}

/// Per-frame driver of resolver, traversal and backend
#[derive(Debug, Clone)]
pub struct Renderer {
    config: EngineConfig,
    frames: u64,
}

impl Renderer {
    /// Create a renderer, rejecting invalid configuration
    pub fn new(config: EngineConfig) -> Result<Self, RenderError> {
        config.validate()?;
        log::info!(
            "Renderer ready: recursion depth {}, fov {}°",
            config.render.max_recursion_depth,
            config.render.fov_degrees
        );
        Ok(Self { config, frames: 0 })
    }

    /// Active configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Frames rendered so far
    pub fn frame_count(&self) -> u64 {
        self.frames
    }

    /// Camera for the player's current position
    pub fn camera(&self, world: &World, viewport: Viewport) -> PlayerCamera {
        PlayerCamera::from_player(&world.player().position, viewport, &self.config.render)
    }

    /// Plan the current frame without moving the player or drawing
    pub fn plan_frame(&self, world: &World, viewport: Viewport) -> Result<DrawList, RenderError> {
        build_draw_list(world, &self.camera(world, viewport), &self.config.render)
    }

    /// Advance the player by `input`, then draw the frame through `backend`
    pub fn render_frame<B: GraphicsBackend + ?Sized>(
        &mut self,
        world: &mut World,
        input: &InputSample,
        viewport: Viewport,
        backend: &mut B,
    ) -> Result<FrameStats, RenderError> {
        let outcome = resolve_tick(world, input, &self.config.motion)?;

        let camera = self.camera(world, viewport);
        let list = build_draw_list(world, &camera, &self.config.render)?;
        self.execute(world, &camera, &list, backend)?;
        self.frames += 1;

        Ok(FrameStats {
            commands: list.len(),
            scenes_drawn: list.scene_draw_count(),
            max_depth: list.max_depth(),
            transition: outcome.transition,
        })
    }

    /// Replay a planned draw list against `backend`
    pub fn execute<B: GraphicsBackend + ?Sized>(
        &self,
        world: &World,
        camera: &PlayerCamera,
        list: &DrawList,
        backend: &mut B,
    ) -> Result<(), RenderError> {
        if cfg!(debug_assertions) {
            list.stencil_balance()?;
        }
        let view = camera.view_matrix()?;
        let time = world.clock().total_time();

        // Portal passes are drawn with the projection of the scene they stand in
        let mut projections: Vec<Mat4> = Vec::new();

        backend.begin_frame(camera.viewport)?;
        for command in list {
            backend.set_pipeline_state(&command.pipeline_state())?;
            match command {
                DrawCommand::DrawScene {
                    scene,
                    depth,
                    stencil_ref,
                    projection,
                } => {
                    projections.truncate(usize::from(*depth));
                    projections.push(*projection);
                    let draw = scene_draw(world.scene(*scene)?, *scene, *depth, *stencil_ref, &view, projection, camera, time);
                    log::trace!("Drawing {} at depth {} ({} objects)", scene, depth, draw.objects.len());
                    backend.draw_scene(&draw)?;
                }
                DrawCommand::MarkPortal { portal, geometry, transform, stencil_ref } => {
                    let projection = enclosing_projection(&projections, *stencil_ref)?;
                    backend.draw_portal(&portal_draw(*portal, PortalPass::Mark, *geometry, &view, &projection, transform))?;
                }
                DrawCommand::ClearPortalDepth { portal, geometry, transform, stencil_ref }
                | DrawCommand::UnmarkPortal { portal, geometry, transform, stencil_ref } => {
                    let pass = if matches!(command, DrawCommand::ClearPortalDepth { .. }) {
                        PortalPass::ClearDepth
                    } else {
                        PortalPass::Unmark
                    };
                    let parent = stencil_ref.saturating_sub(1);
                    let projection = enclosing_projection(&projections, parent)?;
                    backend.draw_portal(&portal_draw(*portal, pass, *geometry, &view, &projection, transform))?;
                }
            }
        }
        backend.end_frame()
    }
}

fn enclosing_projection(projections: &[Mat4], depth: u8) -> Result<Mat4, RenderError> {
    projections
        .get(usize::from(depth))
        .copied()
        .ok_or_else(|| RenderError::RenderingFailed(format!("portal pass at depth {depth} before its scene was drawn")))
}

fn portal_draw(
    portal: PortalRef,
    pass: PortalPass,
    geometry: PortalGeometry,
    view: &Mat4,
    projection: &Mat4,
    model: &Mat4,
) -> PortalDraw {
    PortalDraw {
        portal,
        pass,
        geometry,
        projection: (*projection).into(),
        view: (*view).into(),
        model: (*model).into(),
    }
}

fn scene_draw(
    scene: &Scene,
    index: SceneIndex,
    depth: u8,
    stencil_ref: u8,
    view: &Mat4,
    projection: &Mat4,
    camera: &PlayerCamera,
    time: f32,
) -> SceneDraw {
    let entities = scene.entities().iter().map(|entity| ObjectDraw {
        model: entity.model,
        shader: entity.shader,
        uniforms: ObjectUniforms::new(&entity.model_matrix(time), entity.flags),
    });
    let backings = scene.portals().filter_map(|(_, portal)| {
        portal.backing().map(|backing| ObjectDraw {
            model: backing.model,
            shader: backing.shader,
            uniforms: ObjectUniforms::new(&portal.backing_transform(), EntityFlags::empty()),
        })
    });

    SceneDraw {
        scene: index,
        depth,
        skybox: scene.skybox,
        uniforms: FrameUniforms::for_scene(scene, view, projection, camera.position, stencil_ref, time),
        objects: entities.chain(backings).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::{CapacityConfig, MotionConfig, RenderConfig};
    use crate::foundation::math::constants::PI;
    use crate::foundation::math::{Vec2, Vec4};
    use crate::physics::PlayerPosition;
    use crate::render::commands::StencilOp;
    use crate::scene::{EntityTransform, PortalInfo};

    /// Backend that records calls and simulates one stencil value per portal
    /// nesting level
    #[derive(Default)]
    struct RecordingBackend {
        began: bool,
        ended: bool,
        stencil: i32,
        stencil_low_water: i32,
        scenes: Vec<(SceneIndex, u8)>,
        portal_passes: Vec<PortalPass>,
        last_state: Option<PipelineState>,
    }

    impl GraphicsBackend for RecordingBackend {
        fn begin_frame(&mut self, _viewport: Viewport) -> Result<(), RenderError> {
            self.began = true;
            Ok(())
        }

        fn set_pipeline_state(&mut self, state: &PipelineState) -> Result<(), RenderError> {
            self.last_state = Some(*state);
            Ok(())
        }

        fn draw_scene(&mut self, draw: &SceneDraw) -> Result<(), RenderError> {
            assert_eq!(draw.uniforms.stencil_ref as i32, self.stencil);
            self.scenes.push((draw.scene, draw.depth));
            Ok(())
        }

        fn draw_portal(&mut self, draw: &PortalDraw) -> Result<(), RenderError> {
            let state = self.last_state.expect("state set before draw");
            match state.stencil.pass_op {
                StencilOp::Increment => self.stencil += 1,
                StencilOp::Decrement => self.stencil -= 1,
                StencilOp::Keep => {}
            }
            self.stencil_low_water = self.stencil_low_water.min(self.stencil);
            self.portal_passes.push(draw.pass);
            Ok(())
        }

        fn end_frame(&mut self) -> Result<(), RenderError> {
            self.ended = true;
            Ok(())
        }
    }

    fn gallery() -> World {
        let mut world = World::new(CapacityConfig::default(), &MotionConfig::default());
        let hall = world.add_scene("hall").unwrap();
        let garden = world.add_scene("garden").unwrap();
        let cube = world.register_model("cube");
        let lit = world.register_shader("lit");
        world
            .add_entity(hall, cube, lit, EntityTransform::default(), EntityFlags::ROTATING)
            .unwrap();
        world
            .add_directional_light(hall, Vec4::new(1.0, 1.0, 1.0, 0.8), Vec3::new(0.0, 0.0, -1.0))
            .unwrap();
        world
            .add_positional_light(hall, Vec4::new(1.0, 0.5, 0.2, 2.0), Vec3::new(1.0, 1.0, 2.0))
            .unwrap();

        let doorway = |normal: Vec2| PortalInfo {
            normal,
            center: Vec3::new(0.0, -1.5, 1.5),
            width: 3.0,
            depth: 0.5,
            height: 3.0,
            one_way: false,
            backing: None,
        };
        world.add_portal(hall, garden, &doorway(Vec2::new(0.0, -1.0)), false).unwrap();
        world.add_portal(garden, hall, &doorway(Vec2::new(0.0, 1.0)), false).unwrap();
        world.player_mut().position = PlayerPosition::from_polar(PI * 1.5, 3.0, 1.5);
        world
    }

    #[test]
    fn test_render_frame_restores_stencil() {
        let mut world = gallery();
        let mut renderer = Renderer::new(EngineConfig::default()).unwrap();
        let mut backend = RecordingBackend::default();

        let stats = renderer
            .render_frame(&mut world, &InputSample::idle(), Viewport::new(1280, 720), &mut backend)
            .unwrap();

        assert!(backend.began && backend.ended);
        assert_eq!(backend.stencil, 0);
        assert_eq!(backend.stencil_low_water, 0);
        assert_eq!(backend.scenes[0], (SceneIndex(0), 0));
        assert_eq!(backend.scenes[1], (SceneIndex(1), 1));
        assert_eq!(stats.scenes_drawn, backend.scenes.len());
        assert_eq!(stats.commands, backend.scenes.len() + backend.portal_passes.len());
        assert!(stats.max_depth >= 1);
        assert_eq!(renderer.frame_count(), 1);
    }

    #[test]
    fn test_render_frame_runs_resolver_first() {
        let mut world = gallery();
        let mut renderer = Renderer::new(EngineConfig::default()).unwrap();
        let mut backend = RecordingBackend::default();

        // Pull the view forward through the hall's doorway
        let stats = renderer
            .render_frame(&mut world, &InputSample::pan(0.0, 0.6), Viewport::new(720, 1280), &mut backend)
            .unwrap();

        let transition = stats.transition.expect("player crossed the doorway");
        assert_eq!(transition.to, SceneIndex(1));
        assert_eq!(backend.scenes[0], (SceneIndex(1), 0));
        assert_eq!(world.clock().tick_count(), 1);
    }

    #[test]
    fn test_plan_frame_does_not_move_player() {
        let world = gallery();
        let renderer = Renderer::new(EngineConfig::default()).unwrap();
        let before = world.player().position;
        let list = renderer.plan_frame(&world, Viewport::new(800, 800)).unwrap();
        assert_eq!(list.stencil_balance(), Ok(()));
        assert_eq!(world.player().position, before);
    }

    #[test]
    #[cfg(debug_assertions)]
    fn test_unbalanced_list_is_refused_before_drawing() {
        let world = gallery();
        let renderer = Renderer::new(EngineConfig::default()).unwrap();
        let config = RenderConfig::default();
        let camera = PlayerCamera::from_player(&world.player().position, Viewport::new(640, 480), &config);

        let mut list = DrawList::new();
        list.push(DrawCommand::DrawScene {
            scene: SceneIndex(1),
            depth: 1,
            stencil_ref: 1,
            projection: Mat4::identity(),
        });

        let mut backend = RecordingBackend::default();
        let result = renderer.execute(&world, &camera, &list, &mut backend);
        assert!(matches!(result, Err(RenderError::Stencil(_))));
        assert!(!backend.began);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = EngineConfig::default().with_render(RenderConfig::default().with_clip_distances(0.0, 1.0));
        assert!(matches!(Renderer::new(config), Err(RenderError::Config(_))));
    }

    #[test]
    fn test_uniforms_pack_lights() {
        let world = gallery();
        let scene = world.scene(SceneIndex(0)).unwrap();
        let uniforms = FrameUniforms::for_scene(scene, &Mat4::identity(), &Mat4::identity(), Vec3::zeros(), 1, 0.5);

        assert_eq!(uniforms.directional_count, 1);
        assert_eq!(uniforms.positional_count, 1);
        assert_eq!(uniforms.lights[0].vector, [0.0, 0.0, -1.0, 0.0]);
        assert_eq!(uniforms.lights[MAX_LIGHTS_PER_SCENE - 1].vector, [1.0, 1.0, 2.0, 1.0]);
        assert_eq!(uniforms.stencil_ref, 1);

        let bytes = bytemuck::bytes_of(&uniforms);
        assert_eq!(bytes.len(), std::mem::size_of::<FrameUniforms>());
        assert_eq!(bytes.len() % 16, 0);
    }
}
