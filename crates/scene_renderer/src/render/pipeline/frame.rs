//! Frame composition
//!
//! A frame runs in a fixed order, each stage consuming what the previous one
//! produced:
//!
//! 1. garbage collection
//! 2. derived-state updates, in dependency order
//! 3. GPU allocation and upload
//! 4. shadow and geometry passes
//! 5. deferred lighting
//! 6. transparent / forward pass
//! 7. multisample resolve and tonemap
//! 8. UI and text overlay, then blit and present
//!
//! Stages 1-3 form [`prepare`]; stages 4-8 form [`render`]. Every stage is
//! wrapped in the timer query of its region.

use crate::config::{RendererType, Settings};
use crate::foundation::math::{utils, Mat4, Vec2, Vec3};
use crate::foundation::time::Stopwatch;
use crate::render::api::{
    BufferId, ClearFlags, DeviceError, GraphicsDevice, RenderState, TextureId, TextureParams, TimerRegion,
    UniformValue, VertexArrayId, VertexLayout,
};
use crate::render::primitives::{FlatMesh, MeshGpu, Object, Texture};
use crate::render::registry::Handle;
use crate::render::resources::{gpu, Framebuffers, ProgramKind, ProgramSet, SHADOW_MAP_SIZE};
use crate::render::scene::Scene;
use crate::render::systems::{
    rasterize_texts, update_cameras, update_cone_lights, update_inverse_model_view, update_normals,
    update_object_matrices, update_sun, update_text_layouts, update_ui_elements,
};
use crate::render::systems::text::FontRasterizer;
use crate::render::RenderResult;
use super::gc::collect_garbage;
use super::queue::{merge_overlay, sort_back_to_front, DrawItem, OverlayKind};
use super::stats::Statistics;

/// Point lights fed to the lit programs
pub const MAX_POINT_LIGHTS: usize = 16;

/// Cone lights fed to the lit programs
pub const MAX_CONE_LIGHTS: usize = 8;

/// Fixed tonemap exposure
pub const EXPOSURE: f32 = 1.0;

const QUAD_INDEX_COUNT: u32 = 6;

/// Device objects that live from `initialize` to `deinitialize`
#[derive(Debug)]
pub(crate) struct FrameResources {
    pub programs: ProgramSet,
    pub framebuffers: Framebuffers,
    pub default_texture: TextureId,
    pub screen_quad: MeshGpu,
}

impl FrameResources {
    /// Compile programs, build render targets and the shared screen quad
    /// and default texture; nothing is left allocated on failure
    pub fn create<D: GraphicsDevice + ?Sized>(
        device: &mut D,
        settings: &Settings,
        window_size: (u32, u32),
    ) -> RenderResult<Self> {
        let programs = ProgramSet::compile(device)?;
        let framebuffers = match Framebuffers::build(device, settings, window_size.0, window_size.1) {
            Ok(framebuffers) => framebuffers,
            Err(e) => {
                programs.delete(device);
                return Err(e);
            }
        };

        match create_shared(device, settings) {
            Ok((default_texture, screen_quad)) => Ok(Self { programs, framebuffers, default_texture, screen_quad }),
            Err(e) => {
                framebuffers.destroy(device);
                programs.delete(device);
                Err(e)
            }
        }
    }

    /// Free everything
    pub fn destroy<D: GraphicsDevice + ?Sized>(self, device: &mut D) {
        self.programs.delete(device);
        self.framebuffers.destroy(device);
        device.delete_textures(&[self.default_texture]);
        device.delete_vertex_arrays(&[self.screen_quad.vao]);
        device.delete_buffers(&[self.screen_quad.vertex_buffer, self.screen_quad.index_buffer]);
    }
}

fn single<T>(mut ids: Vec<T>, what: &str) -> RenderResult<T> {
    ids.pop()
        .ok_or_else(|| DeviceError::InvalidState(format!("{what} allocation returned nothing")).into())
}

/// 1x1 white texture and a unit quad
fn create_shared<D: GraphicsDevice + ?Sized>(device: &mut D, settings: &Settings) -> RenderResult<(TextureId, MeshGpu)> {
    let texture = single(device.create_textures(1)?, "texture")?;
    let params = TextureParams { generate_mipmaps: false, ..gpu::texture_params(settings.texture_filtering) };
    if let Err(e) = device.upload_texture(texture, 1, 1, &[u8::MAX; 4], &params) {
        device.delete_textures(&[texture]);
        return Err(e.into());
    }

    let quad = match create_screen_quad(device) {
        Ok(quad) => quad,
        Err(e) => {
            device.delete_textures(&[texture]);
            return Err(e);
        }
    };
    Ok((texture, quad))
}

fn create_screen_quad<D: GraphicsDevice + ?Sized>(device: &mut D) -> RenderResult<MeshGpu> {
    let vao: VertexArrayId = single(device.create_vertex_arrays(1)?, "vertex array")?;
    let buffers: Vec<BufferId> = device.create_buffers(2)?;
    let [vertex_buffer, index_buffer] = buffers[..] else {
        device.delete_vertex_arrays(&[vao]);
        device.delete_buffers(&buffers);
        return Err(DeviceError::InvalidState("buffer allocation returned the wrong count".to_string()).into());
    };
    let quad = MeshGpu { vao, vertex_buffer, index_buffer };

    let unit = FlatMesh::rectangle(1.0, 1.0);
    if let Err(e) = device.upload_geometry(
        vao,
        vertex_buffer,
        index_buffer,
        VertexLayout::Flat,
        bytemuck::cast_slice(unit.vertices()),
        unit.indices(),
    ) {
        device.delete_vertex_arrays(&[vao]);
        device.delete_buffers(&[vertex_buffer, index_buffer]);
        return Err(e.into());
    }
    Ok(quad)
}

fn timed<D: GraphicsDevice + ?Sized, T>(
    device: &mut D,
    region: TimerRegion,
    stage: impl FnOnce(&mut D) -> RenderResult<T>,
) -> RenderResult<T> {
    device.begin_query(region)?;
    let result = stage(device);
    device.end_query(region)?;
    result
}

/// Stages 1-3: collect garbage, refresh derived state, realize it on the GPU
pub(crate) fn prepare<D: GraphicsDevice + ?Sized>(
    device: &mut D,
    scene: &mut Scene,
    settings: &Settings,
    window_size: (u32, u32),
    rasterizer: &mut dyn FontRasterizer,
    stats: &mut Statistics,
) -> RenderResult<()> {
    timed(device, TimerRegion::GcAndUpdate, |device| {
        let stopwatch = Stopwatch::start_new();
        let collected = collect_garbage(device, scene);
        stats.record_collection(collected, stopwatch.elapsed());

        update_derived(scene, settings, window_size, rasterizer)?;
        upload_scene(device, scene, settings)
    })?;

    timed(device, TimerRegion::TextCopy, |device| {
        let range = scene.texts.full_range();
        gpu::ensure_text_textures_allocated(device, &mut scene.texts, range.clone())?;
        gpu::upload_text_textures(device, &mut scene.texts, range, settings.texture_filtering)?;
        Ok(())
    })
}

/// Every update system over its kind's full range, in dependency order
fn update_derived(
    scene: &mut Scene,
    settings: &Settings,
    window_size: (u32, u32),
    rasterizer: &mut dyn FontRasterizer,
) -> RenderResult<()> {
    let window = Vec2::new(window_size.0 as f32, window_size.1 as f32);
    let aspect = window.x / window.y;

    let range = scene.meshes.full_range();
    update_normals(&mut scene.meshes, range)?;

    let range = scene.objects.full_range();
    update_object_matrices(&mut scene.objects, range)?;

    let range = scene.cameras.full_range();
    update_cameras(&mut scene.cameras, range, aspect, settings.view_distance)?;

    let camera = scene.camera()?;
    let view = *camera.view();
    let focal_point = camera.focal_point();

    let range = scene.objects.full_range();
    update_inverse_model_view(&mut scene.objects, range, &view)?;

    update_sun(&mut scene.sun, focal_point);

    let range = scene.cone_lights.full_range();
    update_cone_lights(&mut scene.cone_lights, range, settings.view_distance)?;

    let range = scene.texts.full_range();
    rasterize_texts(&mut scene.texts, range.clone(), rasterizer, settings.text_rendering_quality.into())?;
    update_text_layouts(&mut scene.texts, range, window)?;

    let range = scene.ui_elements.full_range();
    update_ui_elements(&mut scene.ui_elements, &scene.flat_meshes, range, window)?;
    Ok(())
}

fn upload_scene<D: GraphicsDevice + ?Sized>(device: &mut D, scene: &mut Scene, settings: &Settings) -> RenderResult<()> {
    let range = scene.meshes.full_range();
    gpu::ensure_meshes_allocated(device, &mut scene.meshes, range.clone())?;
    gpu::upload_meshes(device, &mut scene.meshes, range)?;

    let range = scene.textures.full_range();
    gpu::ensure_textures_allocated(device, &mut scene.textures, range.clone())?;
    gpu::upload_textures(device, &mut scene.textures, range, settings.texture_filtering)?;

    let range = scene.flat_meshes.full_range();
    gpu::ensure_flat_meshes_allocated(device, &mut scene.flat_meshes, range.clone())?;
    gpu::upload_flat_meshes(device, &mut scene.flat_meshes, range)?;
    Ok(())
}

/// Objects sorted into passes
#[derive(Debug, Default)]
struct Queues {
    shadow_casters: Vec<usize>,
    deferred: Vec<usize>,
    opaque: Vec<DrawItem>,
    transparent: Vec<DrawItem>,
}

impl Queues {
    fn build(scene: &Scene, renderer_type: RendererType, eye: Vec3) -> Self {
        let mut queues = Self::default();
        for (slot, object) in scene.objects.slots().iter().enumerate() {
            let Some(object) = object.as_ref().filter(|o| o.visible) else { continue };
            let drawable = scene
                .meshes
                .get(object.mesh)
                .is_ok_and(|mesh| mesh.uploaded() && !mesh.indices.is_empty());
            if !drawable {
                continue;
            }

            let transparent = object
                .texture
                .and_then(|handle| scene.textures.get(handle).ok())
                .is_some_and(|texture| texture.has_transparency);
            let item = DrawItem { slot, distance: (object.location - eye).norm(), shaded: object.shaded };

            if object.shaded && !transparent {
                queues.shadow_casters.push(slot);
            }
            match (renderer_type, transparent) {
                (_, true) => queues.transparent.push(item),
                (RendererType::Deferred, false) if object.shaded => queues.deferred.push(slot),
                (RendererType::Deferred, false) => queues.transparent.push(item),
                (RendererType::Forward, false) => queues.opaque.push(item),
            }
        }
        sort_back_to_front(&mut queues.opaque);
        sort_back_to_front(&mut queues.transparent);
        queues
    }

    fn drawn(&self) -> usize {
        self.deferred.len() + self.opaque.len() + self.transparent.len()
    }
}

/// Per-frame pass state
struct Passes<'a, D: GraphicsDevice + ?Sized> {
    device: &'a mut D,
    scene: &'a Scene,
    resources: &'a FrameResources,
    settings: &'a Settings,
    window_size: (u32, u32),
    view: Mat4,
    view_projection: Mat4,
    inverse_projection: Mat4,
    current: Option<ProgramKind>,
    switches: usize,
}

/// Stages 4-8: draw every pass into the display target and present it
pub(crate) fn render<D: GraphicsDevice + ?Sized>(
    device: &mut D,
    scene: &Scene,
    resources: &FrameResources,
    settings: &Settings,
    window_size: (u32, u32),
    stats: &mut Statistics,
) -> RenderResult<()> {
    let camera = scene.camera()?;
    let queues = Queues::build(scene, settings.renderer_type, camera.eye());

    let mut passes = Passes {
        device,
        scene,
        resources,
        settings,
        window_size,
        view: *camera.view(),
        view_projection: *camera.view_projection(),
        inverse_projection: *camera.inverse_projection(),
        current: None,
        switches: 0,
    };

    passes.timed(TimerRegion::Geometry, |p| {
        p.shadow_pass(&queues.shadow_casters)?;
        match settings.renderer_type {
            RendererType::Deferred => p.geometry_pass(&queues.deferred),
            RendererType::Forward => p.forward_opaque_pass(&queues.opaque),
        }
    })?;
    passes.timed(TimerRegion::Lighting, |p| match settings.renderer_type {
        RendererType::Deferred => p.lighting_pass(),
        RendererType::Forward => Ok(()),
    })?;
    passes.timed(TimerRegion::Transparent, |p| p.transparent_pass(&queues.transparent))?;
    passes.timed(TimerRegion::HdrResolve, Passes::resolve_pass)?;
    let (ui_drawn, texts_drawn) = passes.timed(TimerRegion::Overlay, Passes::overlay_pass)?;

    let display = &resources.framebuffers.display;
    passes.device.blit_framebuffer(display.id, None, display.size, window_size)?;
    passes.device.present()?;

    stats.program_switches = passes.switches;
    stats.counts = scene.counts();
    stats.counts.objects_rendered = queues.drawn();
    stats.counts.ui_elements_rendered = ui_drawn;
    stats.counts.texts_rendered = texts_drawn;
    for region in TimerRegion::ALL {
        if let Some(result) = passes.device.query_result(region) {
            stats.set_region_time(region, result.elapsed);
            stats.primitives.set(region, result.primitives);
        }
    }
    Ok(())
}

impl<'a, D: GraphicsDevice + ?Sized> Passes<'a, D> {
    fn timed<T>(&mut self, region: TimerRegion, stage: impl FnOnce(&mut Self) -> RenderResult<T>) -> RenderResult<T> {
        self.device.begin_query(region)?;
        let result = stage(self);
        self.device.end_query(region)?;
        result
    }

    fn scene_size(&self) -> (u32, u32) {
        self.resources.framebuffers.scene.size
    }

    /// Switch programs only when the kind changes; returns whether it did
    fn use_program(&mut self, kind: ProgramKind) -> RenderResult<bool> {
        if self.current == Some(kind) {
            return Ok(false);
        }
        self.device.use_program(self.resources.programs.get(kind))?;
        self.current = Some(kind);
        self.switches += 1;
        Ok(true)
    }

    fn uniform(&mut self, name: &str, value: UniformValue) -> RenderResult<()> {
        self.device.set_uniform(name, value)?;
        Ok(())
    }

    fn shadow_pass(&mut self, casters: &[usize]) -> RenderResult<()> {
        let (scene, resources) = (self.scene, self.resources);
        let sun = &scene.sun;
        if !sun.shadow {
            return Ok(());
        }

        let shadow = &resources.framebuffers.shadow;
        self.device.bind_framebuffer(Some(shadow.id))?;
        self.device.set_viewport(SHADOW_MAP_SIZE, SHADOW_MAP_SIZE);
        self.device.set_render_state(RenderState::OPAQUE);
        self.device.clear(ClearFlags::DEPTH, [0.0; 4]);

        self.use_program(ProgramKind::Shadow)?;
        self.uniform("u_sun_shadow_matrix", UniformValue::Mat4(utils::mat4_to_array(&sun.shadow_matrix)))?;
        for &slot in casters {
            if let Some(object) = self.object(slot) {
                self.draw_object(object, false)?;
            }
        }
        Ok(())
    }

    fn geometry_pass(&mut self, slots: &[usize]) -> RenderResult<()> {
        let resources = self.resources;
        let Some(gbuffer) = &resources.framebuffers.gbuffer else {
            return Err(DeviceError::InvalidState("deferred frame without a geometry buffer".to_string()).into());
        };
        self.device.bind_framebuffer(Some(gbuffer.id))?;
        let (width, height) = gbuffer.size;
        self.device.set_viewport(width, height);
        self.device.set_render_state(RenderState::OPAQUE.with_wireframe(self.settings.wireframe));
        self.device.clear(ClearFlags::COLOR | ClearFlags::DEPTH, [0.0; 4]);

        for &slot in slots {
            if let Some(object) = self.object(slot) {
                if self.use_program(ProgramKind::Geometry)? {
                    self.mesh_program_uniforms(ProgramKind::Geometry)?;
                }
                self.draw_object(object, true)?;
            }
        }
        Ok(())
    }

    fn lighting_pass(&mut self) -> RenderResult<()> {
        let resources = self.resources;
        let framebuffers = &resources.framebuffers;
        let Some(gbuffer) = &framebuffers.gbuffer else {
            return Err(DeviceError::InvalidState("deferred frame without a geometry buffer".to_string()).into());
        };
        let (normals, albedo, depth) = match (&gbuffer.color[..], gbuffer.depth) {
            ([normals, albedo], Some(depth)) => (*normals, *albedo, depth),
            _ => return Err(DeviceError::InvalidState("geometry buffer attachments are incomplete".to_string()).into()),
        };

        self.device.bind_framebuffer(Some(framebuffers.scene.id))?;
        let (width, height) = self.scene_size();
        self.device.set_viewport(width, height);
        let [r, g, b] = self.settings.clear_color;
        self.device.clear(ClearFlags::COLOR, [r, g, b, 1.0]);
        self.device.set_render_state(RenderState::OVERLAY);

        self.use_program(ProgramKind::Lighting)?;
        for (unit, (name, texture)) in
            [("u_normal_buffer", normals), ("u_albedo_buffer", albedo), ("u_depth_buffer", depth)].into_iter().enumerate()
        {
            let unit = unit as u32;
            self.device.bind_texture(unit, texture)?;
            self.uniform(name, UniformValue::Int(unit as i32))?;
        }
        self.uniform("u_inverse_projection", UniformValue::Mat4(utils::mat4_to_array(&self.inverse_projection)))?;
        self.light_uniforms()?;
        self.draw_screen_quad()
    }

    fn forward_opaque_pass(&mut self, items: &[DrawItem]) -> RenderResult<()> {
        self.device.bind_framebuffer(Some(self.resources.framebuffers.scene.id))?;
        let (width, height) = self.scene_size();
        self.device.set_viewport(width, height);
        let [r, g, b] = self.settings.clear_color;
        self.device.clear(ClearFlags::COLOR | ClearFlags::DEPTH, [r, g, b, 1.0]);
        self.device.set_render_state(RenderState::OPAQUE.with_wireframe(self.settings.wireframe));
        self.draw_items(items)
    }

    fn transparent_pass(&mut self, items: &[DrawItem]) -> RenderResult<()> {
        self.device.bind_framebuffer(Some(self.resources.framebuffers.scene.id))?;
        let (width, height) = self.scene_size();
        self.device.set_viewport(width, height);
        self.device.set_render_state(RenderState::TRANSPARENT.with_wireframe(self.settings.wireframe));
        self.draw_items(items)
    }

    /// Draw sorted items, switching permutation only between runs
    fn draw_items(&mut self, items: &[DrawItem]) -> RenderResult<()> {
        for item in items {
            let Some(object) = self.object(item.slot) else { continue };
            let kind = if item.shaded { ProgramKind::ForwardShaded } else { ProgramKind::ForwardUnshaded };
            if self.use_program(kind)? {
                self.mesh_program_uniforms(kind)?;
            }
            self.draw_object(object, true)?;
        }
        Ok(())
    }

    fn resolve_pass(&mut self) -> RenderResult<()> {
        let resources = self.resources;
        let framebuffers = &resources.framebuffers;
        if let Some(resolve) = &framebuffers.resolve {
            self.device
                .blit_framebuffer(framebuffers.scene.id, Some(resolve.id), framebuffers.scene.size, resolve.size)?;
        }

        self.device.bind_framebuffer(Some(framebuffers.display.id))?;
        self.device.set_viewport(self.window_size.0, self.window_size.1);
        self.device.set_render_state(RenderState::FULLSCREEN);

        self.use_program(ProgramKind::Tonemap)?;
        self.device.bind_texture(0, framebuffers.hdr_source())?;
        self.uniform("u_hdr_buffer", UniformValue::Int(0))?;
        self.uniform("u_exposure", UniformValue::Float(EXPOSURE))?;
        self.draw_screen_quad()
    }

    /// Returns how many UI elements and texts were drawn
    fn overlay_pass(&mut self) -> RenderResult<(usize, usize)> {
        let scene = self.scene;
        let ui = scene
            .ui_elements
            .slots()
            .iter()
            .enumerate()
            .filter_map(|(slot, e)| e.as_ref().filter(|e| e.visible).map(|e| (slot, e.depth)));
        let text = scene
            .texts
            .slots()
            .iter()
            .enumerate()
            .filter_map(|(slot, t)| {
                t.as_ref()
                    .filter(|t| t.visible && !t.is_blank() && t.state.uploaded() && t.gpu.is_some() && t.layout_valid)
                    .map(|t| (slot, t.depth))
            });
        let items = merge_overlay(ui, text);

        self.device.set_render_state(RenderState::OVERLAY);
        let mut drawn = (0, 0);
        for item in items {
            match item.kind {
                OverlayKind::Ui => {
                    if self.draw_ui_element(item.slot)? {
                        drawn.0 += 1;
                    }
                }
                OverlayKind::Text => {
                    if self.draw_text(item.slot)? {
                        drawn.1 += 1;
                    }
                }
            }
        }
        Ok(drawn)
    }

    fn draw_ui_element(&mut self, slot: usize) -> RenderResult<bool> {
        let scene = self.scene;
        let Some(Some(element)) = scene.ui_elements.slots().get(slot) else { return Ok(false) };
        let mesh = scene.flat_meshes.get(element.flat_mesh)?;
        let (Some(gpu), true) = (mesh.gpu, mesh.uploaded) else { return Ok(false) };

        if self.use_program(ProgramKind::Ui)? {
            self.uniform("u_texture", UniformValue::Int(0))?;
            let (width, height) = self.window_size;
            self.uniform("u_window_size", UniformValue::Vec2([width as f32, height as f32]))?;
        }
        let transform = element.transform;
        self.uniform("u_rotation", UniformValue::Mat2(utils::mat2_to_array(&transform.rotation)))?;
        self.uniform("u_scale", UniformValue::Vec2(transform.scale.into()))?;
        self.uniform("u_translate", UniformValue::Vec2(transform.translate.into()))?;
        self.uniform("u_color", UniformValue::Vec4(element.color))?;

        let texture = self.texture_or_default(element.texture);
        self.device.bind_texture(0, texture)?;
        self.device.bind_vertex_array(gpu.vao)?;
        self.device.draw_indexed(mesh.indices.len() as u32)?;
        Ok(true)
    }

    fn draw_text(&mut self, slot: usize) -> RenderResult<bool> {
        let scene = self.scene;
        let Some(Some(text)) = scene.texts.slots().get(slot) else { return Ok(false) };
        let Some(texture) = text.gpu else { return Ok(false) };

        if self.use_program(ProgramKind::Text)? {
            self.uniform("u_texture", UniformValue::Int(0))?;
        }
        self.uniform("u_origin", UniformValue::Vec2(text.layout.origin.into()))?;
        self.uniform("u_size", UniformValue::Vec2(text.layout.size.into()))?;
        self.uniform("u_color", UniformValue::Vec4(text.color))?;
        self.device.bind_texture(0, texture)?;
        self.draw_screen_quad()?;
        Ok(true)
    }

    fn object(&self, slot: usize) -> Option<&'a Object> {
        let scene: &'a Scene = self.scene;
        scene.objects.slots().get(slot)?.as_ref()
    }

    fn texture_or_default(&self, handle: Option<Handle<Texture>>) -> TextureId {
        handle
            .and_then(|h| self.scene.textures.get(h).ok())
            .and_then(|t| t.gpu.filter(|_| t.uploaded))
            .unwrap_or(self.resources.default_texture)
    }

    /// Uniforms shared by every draw of a mesh program, set once per switch
    fn mesh_program_uniforms(&mut self, kind: ProgramKind) -> RenderResult<()> {
        self.uniform("u_view", UniformValue::Mat4(utils::mat4_to_array(&self.view)))?;
        self.uniform("u_view_projection", UniformValue::Mat4(utils::mat4_to_array(&self.view_projection)))?;
        self.uniform("u_texture", UniformValue::Int(0))?;
        if kind == ProgramKind::ForwardUnshaded {
            return Ok(());
        }

        let (scene, resources) = (self.scene, self.resources);
        let sun = &scene.sun;
        self.uniform("u_sun_shadow_matrix", UniformValue::Mat4(utils::mat4_to_array(&sun.shadow_matrix)))?;
        self.uniform("u_sun_shadow", UniformValue::Int(i32::from(sun.shadow)))?;
        if let Some(depth) = resources.framebuffers.shadow.depth {
            self.device.bind_texture(1, depth)?;
            self.uniform("u_sun_shadow_map", UniformValue::Int(1))?;
        }
        if kind == ProgramKind::ForwardShaded {
            self.light_uniforms()?;
        }
        Ok(())
    }

    /// Sun and light parameters in view space
    fn light_uniforms(&mut self) -> RenderResult<()> {
        let scene = self.scene;
        let view = self.view;
        let rotation = utils::upper_3x3(&view);
        let to_view = |p: Vec3| (view * p.push(1.0)).xyz();

        let sun = &scene.sun;
        self.uniform("u_sun_direction", UniformValue::Vec3((rotation * sun.direction).normalize().into()))?;
        self.uniform("u_sun_color", UniformValue::Vec3(sun.color.into()))?;
        self.uniform("u_sun_brightness", UniformValue::Float(sun.brightness))?;

        let points: Vec<_> = scene.point_lights.iter().map(|(_, l)| l).take(MAX_POINT_LIGHTS).collect();
        self.uniform("u_point_light_count", UniformValue::Int(points.len() as i32))?;
        for (i, light) in points.into_iter().enumerate() {
            self.uniform(&format!("u_point_light_position[{i}]"), UniformValue::Vec3(to_view(light.location).into()))?;
            self.uniform(&format!("u_point_light_color[{i}]"), UniformValue::Vec3(light.color.into()))?;
            self.uniform(&format!("u_point_light_params[{i}]"), UniformValue::Vec2([light.brightness, light.radius]))?;
        }

        let cones: Vec<_> = scene.cone_lights.iter().map(|(_, l)| l).take(MAX_CONE_LIGHTS).collect();
        self.uniform("u_cone_light_count", UniformValue::Int(cones.len() as i32))?;
        for (i, light) in cones.into_iter().enumerate() {
            let direction = (rotation * light.direction).normalize();
            self.uniform(&format!("u_cone_light_position[{i}]"), UniformValue::Vec3(to_view(light.location).into()))?;
            self.uniform(&format!("u_cone_light_direction[{i}]"), UniformValue::Vec3(direction.into()))?;
            self.uniform(&format!("u_cone_light_color[{i}]"), UniformValue::Vec3(light.color.into()))?;
            self.uniform(&format!("u_cone_light_params[{i}]"), UniformValue::Vec2([light.brightness, light.fov]))?;
        }
        Ok(())
    }

    /// Draw an object with the current program; `textured` also binds its
    /// texture and normal matrix
    fn draw_object(&mut self, object: &Object, textured: bool) -> RenderResult<()> {
        let scene = self.scene;
        let mesh = scene.meshes.get(object.mesh)?;
        let Some(gpu) = mesh.gpu else { return Ok(()) };

        self.uniform("u_model", UniformValue::Mat4(utils::mat4_to_array(&object.transform)))?;
        if textured {
            self.uniform("u_normal_matrix", UniformValue::Mat3(utils::mat3_to_array(&object.normal_matrix)))?;
            let texture = self.texture_or_default(object.texture);
            self.device.bind_texture(0, texture)?;
        }
        self.device.bind_vertex_array(gpu.vao)?;
        self.device.draw_indexed(mesh.indices.len() as u32)?;
        Ok(())
    }

    fn draw_screen_quad(&mut self) -> RenderResult<()> {
        self.device.bind_vertex_array(self.resources.screen_quad.vao)?;
        self.device.draw_indexed(QUAD_INDEX_COUNT)?;
        Ok(())
    }
}
