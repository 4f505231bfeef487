//! Gallery walk demo
//!
//! Loads the bundled gallery, then replays a scripted gesture sequence
//! through the engine against a backend that only logs what it would draw.
//! Useful for watching portal traversal and scene transitions in the log:
//!
//! ```text
//! RUST_LOG=debug cargo run --bin gallery_walk
//! ```

use portal_engine::foundation::logging;
use portal_engine::prelude::*;
use portal_engine::render::PortalPass;
use thiserror::Error;

const DEFAULT_CONFIG: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/resources/engine.toml");
const DEFAULT_WORLD: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/resources/worlds/gallery.ron");

#[derive(Error, Debug)]
enum GalleryError {
    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("Configuration error: {0}")]
    Config(#[from] portal_engine::core::config::ConfigError),

    #[error("World error: {0}")]
    World(#[from] WorldLoadError),

    #[error("Scene error: {0}")]
    Scene(#[from] SceneError),
}

/// Backend that records draw counts and logs every call
#[derive(Default)]
struct LoggingBackend {
    frame_scene_draws: usize,
    frame_portal_draws: usize,
    total_objects: usize,
}

impl GraphicsBackend for LoggingBackend {
    fn begin_frame(&mut self, viewport: Viewport) -> Result<(), RenderError> {
        log::trace!("begin frame {}x{}", viewport.width, viewport.height);
        self.frame_scene_draws = 0;
        self.frame_portal_draws = 0;
        Ok(())
    }

    fn set_pipeline_state(&mut self, state: &PipelineState) -> Result<(), RenderError> {
        log::trace!(
            "stencil {:?} ref {} op {:?}, depth {:?} write {}, colour {}",
            state.stencil.compare,
            state.stencil.reference,
            state.stencil.pass_op,
            state.depth.compare,
            state.depth.write,
            state.color_write
        );
        Ok(())
    }

    fn draw_scene(&mut self, draw: &SceneDraw) -> Result<(), RenderError> {
        log::debug!(
            "draw {} at depth {}: {} objects, {} lights",
            draw.scene,
            draw.depth,
            draw.objects.len(),
            draw.uniforms.directional_count + draw.uniforms.positional_count
        );
        self.frame_scene_draws += 1;
        self.total_objects += draw.objects.len();
        Ok(())
    }

    fn draw_portal(&mut self, draw: &PortalDraw) -> Result<(), RenderError> {
        if draw.pass == PortalPass::Mark {
            log::debug!("enter portal {:?} of {} as {:?}", draw.portal.slot, draw.portal.scene, draw.geometry);
        }
        self.frame_portal_draws += 1;
        Ok(())
    }

    fn end_frame(&mut self) -> Result<(), RenderError> {
        log::trace!(
            "end frame: {} scene draws, {} portal passes",
            self.frame_scene_draws,
            self.frame_portal_draws
        );
        Ok(())
    }
}

/// One gesture held for a number of ticks
struct Gesture {
    sample: InputSample,
    ticks: usize,
    label: &'static str,
}

fn script() -> Vec<Gesture> {
    vec![
        Gesture { sample: InputSample::idle(), ticks: 10, label: "look around the atrium" },
        Gesture { sample: InputSample::pan(0.0, 0.04), ticks: 25, label: "walk into the garden" },
        Gesture { sample: InputSample::idle(), ticks: 40, label: "coast" },
        Gesture { sample: InputSample::pan(0.0, -0.05), ticks: 20, label: "back out to the atrium" },
        Gesture { sample: InputSample::pan(-0.02, 0.0), ticks: 40, label: "circle towards the vault door" },
        Gesture { sample: InputSample::pinch(0.05), ticks: 30, label: "step through the vault door" },
        Gesture { sample: InputSample::pinch(-0.05), ticks: 20, label: "leave the vault" },
    ]
}

fn run(config_path: &str, world_path: &str) -> Result<(), GalleryError> {
    let config = EngineConfig::load_from_file(config_path)?;
    logging::init(config.log_filter());
    log::info!("Starting gallery walk");

    let description = WorldDescription::load_from_file(world_path)?;
    let mut engine = Engine::from_description(config, &description)?;
    let mut backend = LoggingBackend::default();
    let viewport = Viewport::new(1280, 720);

    let mut frames = 0usize;
    let mut transitions = 0usize;
    for gesture in script() {
        log::info!("{}", gesture.label);
        for _ in 0..gesture.ticks {
            let stats = engine.frame(&gesture.sample, viewport, &mut backend)?;
            frames += 1;
            if let Some(transition) = stats.transition {
                transitions += 1;
                log::info!(
                    "frame {}: {} -> {}{}",
                    frames,
                    transition.from,
                    transition.to,
                    if transition.synthesized_transient { " (one way)" } else { "" }
                );
            }
        }
        let position = engine.world().player().position;
        log::info!(
            "now in '{}' at θ={:.1}° r={:.2}",
            engine.world().current_scene()?.title(),
            position.theta().to_degrees(),
            position.radius()
        );
    }

    log::info!(
        "Gallery walk finished: {} frames, {} transitions, {} objects submitted",
        frames,
        transitions,
        backend.total_objects
    );
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = std::env::args().skip(1);
    let config_path = args.next().unwrap_or_else(|| DEFAULT_CONFIG.to_string());
    let world_path = args.next().unwrap_or_else(|| DEFAULT_WORLD.to_string());

    match run(&config_path, &world_path) {
        Ok(()) => Ok(()),
        Err(e) => {
            log::error!("Gallery walk failed: {}", e);
            Err(e.into())
        }
    }
}
