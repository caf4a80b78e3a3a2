//! # Renderer facade
//!
//! The one object an application talks to. It owns the device, the font
//! rasterizer, the settings and every entity store, so several independent
//! renderers can coexist in one process.
//!
//! ## Lifecycle
//!
//! ```text
//! new -> initialize(w, h) -> { resize | prepare_for_render | render_all }* -> deinitialize
//! ```
//!
//! Entities can be added before `initialize` and survive `deinitialize`;
//! only their GPU copies are tied to the device lifetime.

mod entities;

use crate::config::{AntiAliasing, RendererType, Settings, TextQuality, TextureFiltering};
use crate::foundation::time::Stopwatch;
use crate::render::api::GraphicsDevice;
use crate::render::pipeline::frame::{self, FrameResources};
use crate::render::pipeline::Statistics;
use crate::render::registry::Handle;
use crate::render::resources::{gpu, Framebuffers};
use crate::render::scene::{Scene, Stored};
use crate::render::systems::text::FontRasterizer;
use crate::render::{RenderError, RenderResult};

/// Scene-graph and render-resource manager
pub struct Renderer<D: GraphicsDevice> {
    device: D,
    rasterizer: Box<dyn FontRasterizer>,
    settings: Settings,
    scene: Scene,
    resources: Option<FrameResources>,
    window_size: (u32, u32),
    stats: Statistics,
}

impl<D: GraphicsDevice> Renderer<D> {
    /// Create a renderer with the starting camera; no device work happens
    /// until [`Renderer::initialize`]
    pub fn new(device: D, rasterizer: Box<dyn FontRasterizer>, settings: Settings) -> RenderResult<Self> {
        settings.validate()?;
        Ok(Self {
            device,
            rasterizer,
            settings,
            scene: Scene::new(),
            resources: None,
            window_size: (1, 1),
            stats: Statistics::default(),
        })
    }

    /// Compile programs and build render targets for a `width x height` window
    pub fn initialize(&mut self, width: u32, height: u32) -> RenderResult<()> {
        check_window_size(width, height)?;
        if self.resources.is_some() {
            log::warn!("Renderer initialized twice; releasing the previous device state");
            self.deinitialize();
        }

        let resources = FrameResources::create(&mut self.device, &self.settings, (width, height))?;
        self.resources = Some(resources);
        self.window_size = (width, height);
        self.scene.invalidate_window_dependents();
        self.stats = Statistics::default();

        log::info!(
            "Renderer initialized: {}x{}, {:?}, scene AA {:?}",
            width,
            height,
            self.settings.renderer_type,
            self.settings.scene_aa()
        );
        Ok(())
    }

    /// Whether device resources exist
    pub const fn is_initialized(&self) -> bool {
        self.resources.is_some()
    }

    /// Adapt to a new window size
    pub fn resize(&mut self, width: u32, height: u32) -> RenderResult<()> {
        check_window_size(width, height)?;
        if (width, height) == self.window_size {
            return Ok(());
        }

        self.window_size = (width, height);
        self.scene.invalidate_window_dependents();
        self.rebuild_framebuffers()?;
        log::info!("Renderer resized to {width}x{height}");
        Ok(())
    }

    /// Run garbage collection, every update system and every upload
    ///
    /// `render_all` does this itself; calling it separately only moves the
    /// work earlier.
    pub fn prepare_for_render(&mut self) -> RenderResult<()> {
        if self.resources.is_none() {
            return Err(RenderError::NotInitialized);
        }
        frame::prepare(
            &mut self.device,
            &mut self.scene,
            &self.settings,
            self.window_size,
            self.rasterizer.as_mut(),
            &mut self.stats,
        )
    }

    /// Render and present one frame
    pub fn render_all(&mut self) -> RenderResult<()> {
        let stopwatch = Stopwatch::start_new();
        self.prepare_for_render()?;

        let resources = self.resources.as_ref().ok_or(RenderError::NotInitialized)?;
        frame::render(&mut self.device, &self.scene, resources, &self.settings, self.window_size, &mut self.stats)?;

        self.stats.close_frame(stopwatch.elapsed());
        log::trace!("Frame {} took {:?}", self.stats.frames, self.stats.frame_time);
        Ok(())
    }

    /// Free every device resource; entity data is kept and re-uploaded by
    /// the next `initialize`
    pub fn deinitialize(&mut self) {
        let Some(resources) = self.resources.take() else { return };

        for mesh in self.scene.meshes.records_mut() {
            gpu::release_mesh(&mut self.device, mesh);
            mesh.gpu = None;
            mesh.state.invalidate_upload();
        }
        for texture in self.scene.textures.records_mut() {
            gpu::release_texture(&mut self.device, texture);
            texture.gpu = None;
            texture.uploaded = false;
        }
        for mesh in self.scene.flat_meshes.records_mut() {
            gpu::release_flat_mesh(&mut self.device, mesh);
            mesh.gpu = None;
            mesh.uploaded = false;
        }
        for text in self.scene.texts.records_mut() {
            gpu::release_text(&mut self.device, text);
            text.gpu = None;
            text.state.invalidate_upload();
        }
        resources.destroy(&mut self.device);
        log::info!("Renderer deinitialized");
    }

    fn rebuild_framebuffers(&mut self) -> RenderResult<()> {
        let Some(resources) = self.resources.as_mut() else { return Ok(()) };
        let (width, height) = self.window_size;
        let fresh = Framebuffers::build(&mut self.device, &self.settings, width, height)?;
        let stale = std::mem::replace(&mut resources.framebuffers, fresh);
        stale.destroy(&mut self.device);
        Ok(())
    }

    // Settings

    /// Current settings
    pub const fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Validate and apply a complete settings value
    ///
    /// Nothing changes if validation fails. Only the state that depends on
    /// a changed option is invalidated.
    pub fn apply_settings(&mut self, settings: Settings) -> RenderResult<()> {
        settings.validate()?;
        let previous = std::mem::replace(&mut self.settings, settings);
        let current = &self.settings;

        let view_distance_changed = previous.view_distance.to_bits() != current.view_distance.to_bits();
        let targets_changed = previous.renderer_type != current.renderer_type
            || previous.scene_aa() != current.scene_aa()
            || previous.ui_aa != current.ui_aa;
        let filtering_changed = previous.texture_filtering != current.texture_filtering;
        let quality_changed = previous.text_rendering_quality != current.text_rendering_quality;

        if view_distance_changed {
            self.scene.invalidate_cameras();
            for light in self.scene.cone_lights.records_mut() {
                light.matrix_valid = false;
            }
        }
        if quality_changed {
            for text in self.scene.texts.records_mut() {
                text.invalidate_texture();
            }
        }
        if filtering_changed && self.resources.is_some() {
            gpu::apply_texture_filtering(&mut self.device, &self.scene.textures, self.settings.texture_filtering)?;
        }
        if targets_changed {
            self.rebuild_framebuffers()?;
        }

        log::info!("Applied renderer settings: {:?}", self.settings);
        Ok(())
    }

    fn edit_settings(&mut self, edit: impl FnOnce(&mut Settings)) -> RenderResult<()> {
        let mut settings = self.settings.clone();
        edit(&mut settings);
        self.apply_settings(settings)
    }

    /// Far clip plane of every camera; must exceed 1
    pub fn set_view_distance(&mut self, view_distance: f32) -> RenderResult<()> {
        self.edit_settings(|s| s.view_distance = view_distance)
    }

    /// Forward or deferred shading
    pub fn set_renderer_type(&mut self, renderer_type: RendererType) -> RenderResult<()> {
        self.edit_settings(|s| s.renderer_type = renderer_type)
    }

    /// Anti-aliasing of the forward renderer
    pub fn set_forward_aa(&mut self, aa: AntiAliasing) -> RenderResult<()> {
        self.edit_settings(|s| s.forward_aa = aa)
    }

    /// Anti-aliasing of the deferred renderer; supersampling only
    pub fn set_deferred_aa(&mut self, aa: AntiAliasing) -> RenderResult<()> {
        self.edit_settings(|s| s.deferred_aa = aa)
    }

    /// Anti-aliasing of the overlay; multisampling only
    pub fn set_ui_aa(&mut self, aa: AntiAliasing) -> RenderResult<()> {
        self.edit_settings(|s| s.ui_aa = aa)
    }

    /// Texture sampling filter
    pub fn set_texture_filtering(&mut self, filtering: TextureFiltering) -> RenderResult<()> {
        self.edit_settings(|s| s.texture_filtering = filtering)
    }

    /// Text rasterization quality
    pub fn set_text_quality(&mut self, quality: TextQuality) -> RenderResult<()> {
        self.edit_settings(|s| s.text_rendering_quality = quality)
    }

    /// Draw scene geometry as outlines
    pub fn set_wireframe(&mut self, wireframe: bool) -> RenderResult<()> {
        self.edit_settings(|s| s.wireframe = wireframe)
    }

    /// Background colour
    pub fn set_clear_color(&mut self, color: [f32; 3]) -> RenderResult<()> {
        self.edit_settings(|s| s.clear_color = color)
    }

    // Inspection

    /// Statistics of the last frame
    pub const fn stats(&self) -> &Statistics {
        &self.stats
    }

    /// Entity stores
    pub const fn scene(&self) -> &Scene {
        &self.scene
    }

    /// Current window size
    pub const fn window_size(&self) -> (u32, u32) {
        self.window_size
    }

    /// Borrow any live entity
    pub fn get<T: Stored>(&self, handle: Handle<T>) -> RenderResult<&T> {
        self.scene.store::<T>().get(handle)
    }

    /// Whether a handle still refers to a live entity
    pub fn is_valid<T: Stored>(&self, handle: Handle<T>) -> bool {
        self.scene.store::<T>().is_valid(handle)
    }

    /// The graphics device
    pub const fn device(&self) -> &D {
        &self.device
    }

    /// The graphics device, mutably
    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }
}

fn check_window_size(width: u32, height: u32) -> RenderResult<()> {
    if width == 0 || height == 0 {
        return Err(RenderError::InvalidArgument(format!("window size {width}x{height} has no area")));
    }
    Ok(())
}

/// Reject a parameter unless `valid`
pub(crate) fn require(valid: bool, describe: impl FnOnce() -> String) -> RenderResult<()> {
    if valid {
        Ok(())
    } else {
        Err(RenderError::InvalidArgument(describe()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Vec3;
    use crate::render::backends::{DeviceCall, RecordingDevice, ResourceKind};
    use crate::render::primitives::{Camera, ConeLight, Text, Texture};
    use crate::render::systems::text::{FontDesc, FontId, MonospaceRasterizer};
    use crate::render::systems::ui::Position;

    fn renderer(settings: Settings) -> Renderer<RecordingDevice> {
        Renderer::new(RecordingDevice::new(), Box::new(MonospaceRasterizer::new()), settings).unwrap()
    }

    #[test]
    fn test_frame_before_initialize_fails() {
        let mut renderer = renderer(Settings::default());
        assert!(matches!(renderer.render_all(), Err(RenderError::NotInitialized)));
        assert!(matches!(renderer.prepare_for_render(), Err(RenderError::NotInitialized)));
    }

    #[test]
    fn test_invalid_settings_change_nothing() {
        let mut renderer = renderer(Settings::default());
        let before = renderer.settings().clone();
        assert!(matches!(renderer.set_view_distance(0.5), Err(RenderError::Config(_))));
        assert!(renderer.set_deferred_aa(AntiAliasing::Msaa2).is_err());
        assert_eq!(renderer.settings(), &before);
    }

    #[test]
    fn test_aa_change_rebuilds_targets() {
        let mut renderer = renderer(Settings { renderer_type: RendererType::Forward, ..Settings::default() });
        renderer.initialize(320, 240).unwrap();
        let framebuffers = renderer.device().live(ResourceKind::Framebuffer);

        renderer.set_forward_aa(AntiAliasing::None).unwrap();
        // The resolve target goes away with multisampling.
        assert_eq!(renderer.device().live(ResourceKind::Framebuffer), framebuffers - 1);
    }

    #[test]
    fn test_view_distance_change_invalidates_projections() {
        let mut renderer = renderer(Settings::default());
        let cone = renderer
            .add_cone_light(ConeLight::new(Vec3::zeros(), Vec3::new(0.0, 0.0, 1.0), Vec3::new(1.0, 1.0, 1.0), 1.0, 0.8, true))
            .unwrap();
        renderer.initialize(64, 64).unwrap();
        renderer.prepare_for_render().unwrap();
        assert!(renderer.get::<Camera>(Scene::STARTING_CAMERA).unwrap().matrix_valid());
        assert!(renderer.get(cone).unwrap().matrix_valid());

        renderer.set_view_distance(500.0).unwrap();
        assert!(!renderer.get::<Camera>(Scene::STARTING_CAMERA).unwrap().matrix_valid());
        assert!(!renderer.get(cone).unwrap().matrix_valid());

        renderer.prepare_for_render().unwrap();
        assert!(renderer.get(cone).unwrap().matrix_valid());
    }

    #[test]
    fn test_filtering_change_reaches_uploaded_textures_only() {
        let mut renderer = renderer(Settings::default());
        renderer.add_texture(Texture::new(2, 1, vec![255; 8]).unwrap());
        renderer.initialize(64, 64).unwrap();
        renderer.prepare_for_render().unwrap();
        // Registered after the upload, so it has no device copy yet.
        renderer.add_texture(Texture::new(1, 1, vec![255; 4]).unwrap());
        renderer.device_mut().clear_calls();

        renderer.set_texture_filtering(TextureFiltering::Nearest).unwrap();
        let refiltered = renderer
            .device()
            .calls()
            .iter()
            .filter(|c| matches!(c, DeviceCall::SetTextureFiltering { filtering: TextureFiltering::Nearest, .. }))
            .count();
        assert_eq!(refiltered, 1);

        renderer.device_mut().clear_calls();
        renderer.set_texture_filtering(TextureFiltering::Nearest).unwrap();
        assert!(renderer.device().calls().is_empty());
    }

    #[test]
    fn test_text_quality_change_rerasterizes_texts() {
        let mut renderer = renderer(Settings::default());
        let font = FontDesc::new(FontId(0), 16.0);
        let text = renderer
            .add_text(Text::new("fps", font, [1.0; 4], Position::top_left(0.0, 0.0), 0, 0))
            .unwrap();
        renderer.initialize(64, 64).unwrap();
        renderer.prepare_for_render().unwrap();
        assert!(renderer.get(text).unwrap().uploaded());

        renderer.set_text_quality(TextQuality::Low).unwrap();
        assert!(!renderer.get(text).unwrap().texture_ready());
        assert!(!renderer.get(text).unwrap().uploaded());

        renderer.prepare_for_render().unwrap();
        assert!(renderer.get(text).unwrap().uploaded());
    }

    #[test]
    fn test_deinitialize_frees_device_state() {
        let mut renderer = renderer(Settings::default());
        renderer.initialize(64, 64).unwrap();
        renderer.render_all().unwrap();
        renderer.deinitialize();

        for kind in [
            ResourceKind::Buffer,
            ResourceKind::Texture,
            ResourceKind::VertexArray,
            ResourceKind::Program,
            ResourceKind::Framebuffer,
        ] {
            assert_eq!(renderer.device().live(kind), 0, "{kind:?} leaked");
        }
        assert!(!renderer.is_initialized());
    }

    #[test]
    fn test_resize_to_same_size_is_free() {
        let mut renderer = renderer(Settings::default());
        renderer.initialize(64, 64).unwrap();
        renderer.device_mut().clear_calls();
        renderer.resize(64, 64).unwrap();
        assert!(renderer.device().calls().is_empty());

        renderer.resize(128, 64).unwrap();
        assert!(renderer.device().calls().iter().any(|c| matches!(c, DeviceCall::CreateFramebuffer { .. })));
        assert!(renderer.resize(0, 64).is_err());
    }
}
