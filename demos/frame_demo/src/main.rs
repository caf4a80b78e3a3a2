//! Headless frame demo
//!
//! Builds a small scene on the recording device, renders a few frames with
//! each pipeline and logs the statistics. An optional first argument names a
//! TOML or RON settings file.

use scene_renderer::config::{Config, ConfigError};
use scene_renderer::foundation::logging;
use scene_renderer::prelude::*;
use scene_renderer::render::TimerRegion;
use thiserror::Error;

const FRAMES: u32 = 3;

#[derive(Error, Debug)]
enum DemoError {
    #[error("settings: {0}")]
    Settings(#[from] ConfigError),

    #[error("renderer: {0}")]
    Render(#[from] RenderError),
}

struct DemoScene {
    spinner: Handle<Object>,
    label: Handle<Text>,
}

fn build_scene(renderer: &mut Renderer<RecordingDevice>) -> Result<DemoScene, DemoError> {
    let cube = renderer.add_mesh(Mesh::cube());
    let checker = renderer.add_texture(Texture::new(
        2,
        2,
        vec![
            255, 255, 255, 255, 40, 40, 40, 255, //
            40, 40, 40, 255, 255, 255, 255, 255,
        ],
    )?);
    let glass = renderer.add_texture_from_image(ImageData::solid_color(1, 1, [120, 180, 255, 96]))?;

    let spinner = renderer.add_object(Object::new(cube, Some(checker)))?;
    renderer.set_object_location(spinner, Vec3::new(0.0, 0.0, 6.0))?;

    let pane = renderer.add_object(Object::new(cube, Some(glass)))?;
    renderer.set_object_location(pane, Vec3::new(2.5, 0.0, 4.0))?;
    renderer.set_object_scale(pane, Vec3::new(1.0, 1.0, 0.1))?;

    let marker = renderer.add_object(Object::new(cube, None))?;
    renderer.set_object_location(marker, Vec3::new(-2.5, 0.0, 8.0))?;
    renderer.set_object_shaded(marker, false)?;

    renderer.add_point_light(PointLight::new(Vec3::new(0.0, 3.0, 4.0), Vec3::new(1.0, 0.9, 0.7), 2.0, 12.0))?;
    renderer.set_sun_angles(0.6, 0.9)?;
    renderer.set_sun_shadow(true);

    let camera = renderer.add_camera(Camera::new(Vec3::new(0.0, 0.0, 6.0), 0.4, 0.2, 10.0, 1.0))?;
    renderer.set_active_camera(camera)?;

    let panel = renderer.add_flat_mesh(FlatMesh::rectangle(180.0, 40.0));
    let backdrop = renderer.add_ui_element(UiElement::new(
        panel,
        None,
        Position::new(-10.0, 10.0, Anchor::TopRight, Anchor::TopRight),
        0,
    ))?;
    renderer.set_ui_element_color(backdrop, [0.0, 0.0, 0.0, 0.6])?;

    let label = renderer.add_text(Text::new(
        "frame 0",
        FontDesc::new(FontId(0), 18.0),
        [1.0, 1.0, 1.0, 1.0],
        Position::new(-20.0, 20.0, Anchor::TopRight, Anchor::TopRight),
        0,
        0,
    ))?;

    Ok(DemoScene { spinner, label })
}

fn run(renderer: &mut Renderer<RecordingDevice>, scene: &DemoScene) -> Result<(), DemoError> {
    for frame in 0..FRAMES {
        renderer.set_object_rotation(scene.spinner, Vec3::new(0.0, frame as f32 * 0.3, 0.0))?;
        renderer.set_text_string(scene.label, format!("frame {frame}"))?;
        renderer.render_all()?;

        let stats = renderer.stats();
        log::info!("{stats}");
        for region in TimerRegion::ALL {
            log::debug!("  {region:?}: {} primitives", stats.primitives.get(region));
        }
    }
    Ok(())
}

fn main() -> Result<(), DemoError> {
    logging::init_with_level(log::LevelFilter::Info);

    let settings = match std::env::args().nth(1) {
        Some(path) => {
            log::info!("Loading settings from {path}");
            Settings::load_from_file(&path)?
        }
        None => Settings::default(),
    };

    let mut renderer = Renderer::new(RecordingDevice::new(), Box::new(MonospaceRasterizer::new()), settings)?;
    renderer.initialize(1280, 720)?;
    let scene = build_scene(&mut renderer)?;

    for renderer_type in [RendererType::Deferred, RendererType::Forward] {
        log::info!("Rendering {FRAMES} frames with the {renderer_type:?} pipeline");
        renderer.set_renderer_type(renderer_type)?;
        run(&mut renderer, &scene)?;
    }

    renderer.set_text_quality(TextQuality::Low)?;
    renderer.resize(800, 600)?;
    run(&mut renderer, &scene)?;

    log::info!(
        "Presented {} frames, {} draw calls recorded",
        renderer.device().frames_presented(),
        renderer.device().draw_sequence().len()
    );
    renderer.deinitialize();
    Ok(())
}
