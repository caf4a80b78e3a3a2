//! End-to-end frames on the recording device

use approx::assert_relative_eq;
use scene_renderer::prelude::*;
use scene_renderer::render::{DeviceCall, ResourceKind, Scene, TimerRegion};

fn renderer(settings: Settings) -> Renderer<RecordingDevice> {
    let mut renderer = Renderer::new(RecordingDevice::new(), Box::new(MonospaceRasterizer::new()), settings)
        .expect("valid settings");
    renderer.initialize(320, 240).expect("initialize");
    renderer
}

fn forward() -> Settings {
    Settings { renderer_type: RendererType::Forward, ..Settings::default() }
}

/// Calls recorded between the begin and end of one timer region
fn region_calls(device: &RecordingDevice, region: TimerRegion) -> Vec<DeviceCall> {
    let calls = device.calls();
    let begin = calls.iter().position(|c| *c == DeviceCall::BeginQuery(region)).expect("region begun");
    let end = calls.iter().position(|c| *c == DeviceCall::EndQuery(region)).expect("region ended");
    calls[begin + 1..end].to_vec()
}

fn draws_in(device: &RecordingDevice, region: TimerRegion) -> Vec<String> {
    region_calls(device, region)
        .into_iter()
        .filter_map(|c| match c {
            DeviceCall::DrawIndexed { program, .. } => Some(program),
            _ => None,
        })
        .collect()
}

fn translucent_texture() -> Texture {
    Texture::new(1, 1, vec![255, 255, 255, 128]).expect("valid pixels")
}

#[test]
fn test_cube_frame_end_to_end() {
    let mut renderer = renderer(Settings::default());
    let mesh = renderer.add_mesh(Mesh::cube());
    let paint = renderer.add_texture_from_image(ImageData::solid_color(4, 4, [200, 40, 40, 255])).unwrap();
    let object = renderer.add_object(Object::new(mesh, Some(paint))).unwrap();

    renderer.render_all().unwrap();

    assert!(!renderer.get(paint).unwrap().has_transparency());
    let cube = renderer.get(mesh).unwrap();
    assert!(cube.normals_valid());
    assert!(cube.uploaded());
    assert_eq!(cube.normals().len(), 8);
    for normal in cube.normals() {
        assert_relative_eq!(normal.norm(), 1.0, epsilon = 1e-5);
    }
    // Corner normals point away from the centre.
    let corner = cube.normals()[2];
    assert!(corner.x > 0.0 && corner.y > 0.0 && corner.z > 0.0);

    let placed = renderer.get(object).unwrap();
    assert!(placed.matrix_valid());
    assert_relative_eq!(*placed.transform(), Mat4::identity());

    assert_eq!(renderer.device().draw_sequence(), vec!["geometry", "lighting", "tonemap"]);
    assert_eq!(renderer.device().frames_presented(), 1);

    let stats = renderer.stats();
    assert_eq!(stats.frames, 1);
    assert_eq!(stats.counts.objects, 1);
    assert_eq!(stats.counts.objects_rendered, 1);
    assert_eq!(stats.primitives.get(TimerRegion::Geometry), 12);
}

#[test]
fn test_stages_run_in_order() {
    let mut renderer = renderer(Settings::default());
    renderer.render_all().unwrap();

    let begun: Vec<TimerRegion> = renderer
        .device()
        .calls()
        .iter()
        .filter_map(|c| match c {
            DeviceCall::BeginQuery(region) => Some(*region),
            _ => None,
        })
        .collect();
    assert_eq!(
        begun,
        vec![
            TimerRegion::GcAndUpdate,
            TimerRegion::TextCopy,
            TimerRegion::Geometry,
            TimerRegion::Lighting,
            TimerRegion::Transparent,
            TimerRegion::HdrResolve,
            TimerRegion::Overlay,
        ]
    );
    assert_eq!(renderer.device().calls().last(), Some(&DeviceCall::Present));
}

#[test]
fn test_forward_frame_still_times_lighting() {
    let mut renderer = renderer(forward());
    let mesh = renderer.add_mesh(Mesh::cube());
    renderer.add_object(Object::new(mesh, None)).unwrap();
    renderer.render_all().unwrap();

    let device = renderer.device();
    assert!(draws_in(device, TimerRegion::Lighting).is_empty());
    assert_eq!(draws_in(device, TimerRegion::Geometry), vec!["forward_shaded"]);
    // Multisampled forward frames resolve before the tonemap.
    assert!(region_calls(device, TimerRegion::HdrResolve)
        .iter()
        .any(|c| matches!(c, DeviceCall::BlitFramebuffer { destination: Some(_), .. })));
}

#[test]
fn test_ui_draws_before_text_at_equal_depth() {
    let mut renderer = renderer(Settings::default());
    let font = FontDesc::new(FontId(0), 16.0);
    // Text first, so slot order alone would put it ahead.
    renderer.add_text(Text::new("hud", font, [1.0; 4], Position::top_left(0.0, 0.0), 0, 0)).unwrap();
    renderer.add_text(Text::new("back", font, [1.0; 4], Position::top_left(0.0, 20.0), 0, -1)).unwrap();
    let quad = renderer.add_flat_mesh(FlatMesh::rectangle(32.0, 32.0));
    renderer.add_ui_element(UiElement::new(quad, None, Position::top_left(8.0, 8.0), 0)).unwrap();

    renderer.render_all().unwrap();

    assert_eq!(draws_in(renderer.device(), TimerRegion::Overlay), vec!["text", "ui", "text"]);
    let switches = region_calls(renderer.device(), TimerRegion::Overlay)
        .iter()
        .filter(|c| matches!(c, DeviceCall::UseProgram(_)))
        .count();
    assert_eq!(switches, 3);
    assert_eq!(renderer.stats().counts.texts_rendered, 2);
    assert_eq!(renderer.stats().counts.ui_elements_rendered, 1);
}

#[test]
fn test_blanked_text_is_not_drawn() {
    let mut renderer = renderer(Settings::default());
    let font = FontDesc::new(FontId(0), 16.0);
    let text = renderer.add_text(Text::new("hud", font, [1.0; 4], Position::top_left(0.0, 0.0), 0, 0)).unwrap();
    renderer.render_all().unwrap();
    let textures = renderer.device().live(ResourceKind::Texture);
    assert_eq!(renderer.stats().counts.texts_rendered, 1);

    renderer.set_text_string(text, "").unwrap();
    renderer.device_mut().clear_calls();
    renderer.render_all().unwrap();

    assert!(draws_in(renderer.device(), TimerRegion::Overlay).is_empty());
    assert_eq!(renderer.stats().counts.texts_rendered, 0);
    assert_eq!(renderer.device().live(ResourceKind::Texture), textures - 1);

    renderer.set_text_string(text, "back").unwrap();
    renderer.device_mut().clear_calls();
    renderer.render_all().unwrap();
    assert_eq!(draws_in(renderer.device(), TimerRegion::Overlay), vec!["text"]);
    assert_eq!(renderer.device().live(ResourceKind::Texture), textures);
}

#[test]
fn test_sun_shadow_pass_draws_opaque_shaded_objects() {
    let mut renderer = renderer(Settings::default());
    let mesh = renderer.add_mesh(Mesh::cube());
    let glass = renderer.add_texture(translucent_texture());
    renderer.add_object(Object::new(mesh, None)).unwrap();
    let unlit = renderer.add_object(Object::new(mesh, None)).unwrap();
    renderer.set_object_shaded(unlit, false).unwrap();
    renderer.add_object(Object::new(mesh, Some(glass))).unwrap();

    renderer.render_all().unwrap();
    assert!(!draws_in(renderer.device(), TimerRegion::Geometry).contains(&"shadow".to_string()));

    renderer.set_sun_shadow(true);
    renderer.device_mut().clear_calls();
    renderer.render_all().unwrap();

    assert_eq!(draws_in(renderer.device(), TimerRegion::Geometry), vec!["shadow", "geometry"]);
    let sun = renderer.scene().sun();
    assert!(sun.matrix_valid());
    assert_ne!(*sun.shadow_matrix(), Mat4::identity());
}

#[test]
fn test_program_switches_only_between_runs() {
    let mut renderer = renderer(Settings::default());
    let mesh = renderer.add_mesh(Mesh::cube());
    for z in [4.0, 8.0, 12.0] {
        let object = renderer.add_object(Object::new(mesh, None)).unwrap();
        renderer.set_object_location(object, Vec3::new(0.0, 0.0, z)).unwrap();
    }
    renderer.render_all().unwrap();

    let geometry = region_calls(renderer.device(), TimerRegion::Geometry);
    let uses: Vec<_> = geometry.iter().filter(|c| matches!(c, DeviceCall::UseProgram(_))).collect();
    assert_eq!(uses, vec![&DeviceCall::UseProgram("geometry".to_string())]);
    assert_eq!(draws_in(renderer.device(), TimerRegion::Geometry).len(), 3);
    // geometry, lighting, tonemap
    assert_eq!(renderer.stats().program_switches, 3);
}

#[test]
fn test_deferred_routes_unshaded_and_transparent_objects() {
    let mut renderer = renderer(Settings::default());
    let mesh = renderer.add_mesh(Mesh::cube());
    let glass = renderer.add_texture(translucent_texture());

    renderer.add_object(Object::new(mesh, None)).unwrap();
    let unlit = renderer.add_object(Object::new(mesh, None)).unwrap();
    renderer.set_object_shaded(unlit, false).unwrap();
    renderer.add_object(Object::new(mesh, Some(glass))).unwrap();

    renderer.render_all().unwrap();

    let device = renderer.device();
    assert_eq!(draws_in(device, TimerRegion::Geometry), vec!["geometry"]);
    let mut transparent = draws_in(device, TimerRegion::Transparent);
    transparent.sort();
    assert_eq!(transparent, vec!["forward_shaded", "forward_unshaded"]);
    assert_eq!(renderer.stats().counts.objects_rendered, 3);
}

#[test]
fn test_transparent_objects_draw_back_to_front() {
    let mut renderer = renderer(forward());
    let mesh = renderer.add_mesh(Mesh::cube());
    let glass = renderer.add_texture(translucent_texture());

    let near = renderer.add_object(Object::new(mesh, Some(glass))).unwrap();
    renderer.set_object_location(near, Vec3::new(0.0, 0.0, 1.0)).unwrap();
    let far = renderer.add_object(Object::new(mesh, Some(glass))).unwrap();
    renderer.set_object_location(far, Vec3::new(0.0, 0.0, 50.0)).unwrap();

    renderer.render_all().unwrap();

    let models: Vec<[f32; 16]> = region_calls(renderer.device(), TimerRegion::Transparent)
        .into_iter()
        .filter_map(|c| match c {
            DeviceCall::SetUniform { name, value: scene_renderer::render::api::UniformValue::Mat4(m) } if name == "u_model" => {
                Some(m)
            }
            _ => None,
        })
        .collect();
    assert_eq!(models.len(), 2);
    // Translation lives in the last column; the starting camera sits at the origin.
    assert_relative_eq!(models[0][14], 50.0);
    assert_relative_eq!(models[1][14], 1.0);
    assert!(draws_in(renderer.device(), TimerRegion::Geometry).is_empty());
}

#[test]
fn test_second_prepare_uploads_nothing() {
    let mut renderer = renderer(Settings::default());
    let mesh = renderer.add_mesh(Mesh::cube());
    let texture = renderer.add_texture(Texture::new(2, 1, vec![255; 8]).unwrap());
    renderer.add_object(Object::new(mesh, Some(texture))).unwrap();

    renderer.prepare_for_render().unwrap();
    renderer.device_mut().clear_calls();
    renderer.prepare_for_render().unwrap();

    assert!(!renderer.device().calls().iter().any(|c| matches!(
        c,
        DeviceCall::UploadGeometry { .. } | DeviceCall::UploadTexture { .. } | DeviceCall::CreateBuffers(_)
    )));
}

#[test]
fn test_garbage_collection_frees_unreferenced_resources() {
    let mut renderer = renderer(Settings::default());
    let kept = renderer.add_mesh(Mesh::cube());
    let dropped = renderer.add_mesh(Mesh::cube());
    renderer.set_mesh_collectable(kept, true).unwrap();
    renderer.set_mesh_collectable(dropped, true).unwrap();
    renderer.add_object(Object::new(kept, None)).unwrap();

    renderer.render_all().unwrap();

    assert_eq!(renderer.stats().collected, 1);
    assert!(renderer.is_valid(kept));
    assert!(!renderer.is_valid(dropped));
}

#[test]
fn test_collections_before_a_frame_are_reported_with_it() {
    let mut renderer = renderer(Settings::default());
    for _ in 0..2 {
        let mesh = renderer.add_mesh(Mesh::cube());
        renderer.set_mesh_collectable(mesh, true).unwrap();
    }

    renderer.prepare_for_render().unwrap();
    let texture = renderer.add_texture(Texture::new(1, 1, vec![255; 4]).unwrap());
    renderer.set_texture_collectable(texture, true).unwrap();
    renderer.render_all().unwrap();
    assert_eq!(renderer.stats().collected, 3);

    renderer.render_all().unwrap();
    assert_eq!(renderer.stats().collected, 0);
}

#[test]
fn test_incomplete_framebuffer_is_fatal() {
    let mut device = RecordingDevice::new();
    device.fail_framebuffer("gbuffer");
    let mut renderer = Renderer::new(device, Box::new(MonospaceRasterizer::new()), Settings::default()).unwrap();

    let err = renderer.initialize(320, 240).unwrap_err();
    assert!(err.is_fatal());
    assert!(!renderer.is_initialized());
    assert_eq!(renderer.device().live(ResourceKind::Framebuffer), 0);
    assert_eq!(renderer.device().live(ResourceKind::Program), 0);
}

#[test]
fn test_camera_switch_recomputes_normal_matrices() {
    let mut renderer = renderer(Settings::default());
    let mesh = renderer.add_mesh(Mesh::cube());
    let object = renderer.add_object(Object::new(mesh, None)).unwrap();
    renderer.render_all().unwrap();
    let before = *renderer.get(object).unwrap().normal_matrix();

    let side = renderer.add_camera(Camera::new(Vec3::zeros(), 1.2, 0.0, 10.0, 1.0)).unwrap();
    renderer.set_active_camera(side).unwrap();
    assert!(!renderer.get(object).unwrap().inverse_model_view_valid());

    renderer.render_all().unwrap();
    let after = renderer.get(object).unwrap();
    assert!(after.inverse_model_view_valid());
    assert!((after.normal_matrix() - before).norm() > 1e-3);

    renderer.delete_camera(side).unwrap();
    assert_eq!(renderer.scene().active_camera(), Scene::STARTING_CAMERA);
}
