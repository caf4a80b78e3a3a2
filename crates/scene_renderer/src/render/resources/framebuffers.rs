//! Render targets
//!
//! The framebuffer chain for the current settings and window size:
//!
//! - `shadow`: depth-only sun shadow map
//! - `gbuffer`: view-space normals and albedo plus depth (deferred only)
//! - `scene`: HDR colour the lighting and transparent passes write, sharing
//!   the geometry depth in deferred mode
//! - `resolve`: single-sampled copy of a multisampled `scene`
//! - `display`: display-resolution LDR target the tonemap and the overlay
//!   write, multisampled for UI anti-aliasing
//!
//! Every framebuffer is checked for completeness right after construction;
//! an incomplete one is a fatal device error.

use crate::config::{RendererType, Settings};
use crate::render::api::{
    DeviceError, FramebufferDesc, FramebufferId, FramebufferStatus, GraphicsDevice,
    RenderTargetDesc, TextureFormat, TextureId,
};
use crate::render::RenderResult;

/// Edge length of the square sun shadow map
pub const SHADOW_MAP_SIZE: u32 = 2048;

/// One framebuffer and its attachments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    /// Framebuffer
    pub id: FramebufferId,
    /// Colour attachments
    pub color: Vec<TextureId>,
    /// Depth attachment
    pub depth: Option<TextureId>,
    /// Size in pixels
    pub size: (u32, u32),
}

/// Framebuffer chain for one configuration
#[derive(Debug)]
pub struct Framebuffers {
    /// Sun shadow map
    pub shadow: Target,
    /// Geometry buffer, deferred mode only
    pub gbuffer: Option<Target>,
    /// HDR scene colour
    pub scene: Target,
    /// Resolve target of a multisampled scene
    pub resolve: Option<Target>,
    /// Display-resolution composition target
    pub display: Target,
    textures: Vec<TextureId>,
}

struct Builder<'a, D: GraphicsDevice + ?Sized> {
    device: &'a mut D,
    textures: Vec<TextureId>,
    framebuffers: Vec<FramebufferId>,
}

impl<'a, D: GraphicsDevice + ?Sized> Builder<'a, D> {
    fn attachment(&mut self, size: (u32, u32), format: TextureFormat, samples: u32) -> RenderResult<TextureId> {
        let id = self
            .device
            .create_textures(1)?
            .pop()
            .ok_or_else(|| DeviceError::InvalidState("texture allocation returned nothing".to_string()))?;
        self.textures.push(id);
        self.device.allocate_render_target(
            id,
            &RenderTargetDesc { width: size.0, height: size.1, format, samples },
        )?;
        Ok(id)
    }

    fn framebuffer(
        &mut self,
        label: &'static str,
        color: Vec<TextureId>,
        depth: Option<TextureId>,
        size: (u32, u32),
    ) -> RenderResult<Target> {
        let id = self.device.create_framebuffer(&FramebufferDesc { label, color: color.clone(), depth })?;
        self.framebuffers.push(id);

        if let FramebufferStatus::Incomplete(reason) = self.device.framebuffer_status(id) {
            log::error!("Framebuffer '{label}' is incomplete: {reason}");
            return Err(DeviceError::IncompleteFramebuffer { label, reason }.into());
        }
        Ok(Target { id, color, depth, size })
    }

    fn build(&mut self, settings: &Settings, width: u32, height: u32) -> RenderResult<Framebuffers> {
        let aa = settings.scene_aa();
        let display_size = (width, height);
        let scene_size = (width * aa.scale(), height * aa.scale());
        let samples = aa.samples();

        let shadow_depth = self.attachment((SHADOW_MAP_SIZE, SHADOW_MAP_SIZE), TextureFormat::Depth24, 1)?;
        let shadow = self.framebuffer("shadow", Vec::new(), Some(shadow_depth), (SHADOW_MAP_SIZE, SHADOW_MAP_SIZE))?;

        let depth = self.attachment(scene_size, TextureFormat::Depth24, samples)?;
        let gbuffer = match settings.renderer_type {
            RendererType::Deferred => {
                let normals = self.attachment(scene_size, TextureFormat::Rgba16F, samples)?;
                let albedo = self.attachment(scene_size, TextureFormat::Rgba8, samples)?;
                Some(self.framebuffer("gbuffer", vec![normals, albedo], Some(depth), scene_size)?)
            }
            RendererType::Forward => None,
        };

        let hdr = self.attachment(scene_size, TextureFormat::Rgba16F, samples)?;
        let scene = self.framebuffer("scene", vec![hdr], Some(depth), scene_size)?;

        let resolve = if samples > 1 {
            let resolved = self.attachment(scene_size, TextureFormat::Rgba16F, 1)?;
            Some(self.framebuffer("resolve", vec![resolved], None, scene_size)?)
        } else {
            None
        };

        let display_color = self.attachment(display_size, TextureFormat::Rgba8, settings.ui_aa.samples())?;
        let display = self.framebuffer("display", vec![display_color], None, display_size)?;

        Ok(Framebuffers {
            shadow,
            gbuffer,
            scene,
            resolve,
            display,
            textures: std::mem::take(&mut self.textures),
        })
    }

    fn abandon(&mut self) {
        for id in self.framebuffers.drain(..) {
            self.device.delete_framebuffer(id);
        }
        if !self.textures.is_empty() {
            self.device.delete_textures(&self.textures);
            self.textures.clear();
        }
    }
}

impl Framebuffers {
    /// Build the chain for `settings` at a `width x height` display
    ///
    /// On failure everything created so far is freed again.
    pub fn build<D: GraphicsDevice + ?Sized>(
        device: &mut D,
        settings: &Settings,
        width: u32,
        height: u32,
    ) -> RenderResult<Self> {
        let mut builder = Builder { device, textures: Vec::new(), framebuffers: Vec::new() };
        let result = builder.build(settings, width, height);
        if result.is_err() {
            builder.abandon();
        } else {
            log::debug!("Built framebuffers for {width}x{height}");
        }
        result
    }

    /// Colour texture the tonemap reads
    pub fn hdr_source(&self) -> TextureId {
        let target = self.resolve.as_ref().unwrap_or(&self.scene);
        target.color[0]
    }

    /// Free every framebuffer and attachment
    pub fn destroy<D: GraphicsDevice + ?Sized>(self, device: &mut D) {
        let targets = [Some(self.shadow), self.gbuffer, Some(self.scene), self.resolve, Some(self.display)];
        for target in targets.into_iter().flatten() {
            device.delete_framebuffer(target.id);
        }
        device.delete_textures(&self.textures);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AntiAliasing;
    use crate::render::backends::{RecordingDevice, ResourceKind};
    use crate::render::RenderError;

    #[test]
    fn test_deferred_chain() {
        let mut device = RecordingDevice::new();
        let settings = Settings { deferred_aa: AntiAliasing::Ssaa2, ..Settings::default() };
        let framebuffers = Framebuffers::build(&mut device, &settings, 640, 480).unwrap();

        let gbuffer = framebuffers.gbuffer.as_ref().unwrap();
        assert_eq!(gbuffer.size, (1280, 960));
        assert_eq!(gbuffer.depth, framebuffers.scene.depth);
        assert!(framebuffers.resolve.is_none());
        assert_eq!(framebuffers.display.size, (640, 480));
        assert_eq!(framebuffers.hdr_source(), framebuffers.scene.color[0]);

        framebuffers.destroy(&mut device);
        assert_eq!(device.live(ResourceKind::Framebuffer), 0);
        assert_eq!(device.live(ResourceKind::Texture), 0);
    }

    #[test]
    fn test_multisampled_forward_chain_resolves() {
        let mut device = RecordingDevice::new();
        let settings = Settings {
            renderer_type: RendererType::Forward,
            forward_aa: AntiAliasing::Msaa4,
            ..Settings::default()
        };
        let framebuffers = Framebuffers::build(&mut device, &settings, 320, 200).unwrap();

        assert!(framebuffers.gbuffer.is_none());
        let resolve = framebuffers.resolve.as_ref().unwrap();
        assert_eq!(framebuffers.hdr_source(), resolve.color[0]);
    }

    #[test]
    fn test_incomplete_framebuffer_is_fatal() {
        let mut device = RecordingDevice::new();
        device.fail_framebuffer("scene");
        let err = Framebuffers::build(&mut device, &Settings::default(), 64, 64).unwrap_err();

        assert!(err.is_fatal());
        assert!(matches!(
            err,
            RenderError::Device(DeviceError::IncompleteFramebuffer { label: "scene", .. })
        ));
        assert_eq!(device.live(ResourceKind::Framebuffer), 0);
        assert_eq!(device.live(ResourceKind::Texture), 0);
    }
}
