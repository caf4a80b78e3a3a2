//! Texture records
//!
//! RGBA8 pixel data plus the transparency classification used to route
//! objects into the opaque or the transparent pass.

use crate::assets::ImageData;
use crate::render::api::TextureId;
use crate::render::registry::Entity;
use crate::render::{RenderError, RenderResult};

/// RGBA8 texture
#[derive(Debug, Clone)]
pub struct Texture {
    pub(crate) pixels: Vec<u8>,
    pub(crate) width: u32,
    pub(crate) height: u32,
    pub(crate) has_transparency: bool,
    pub(crate) uploaded: bool,
    pub(crate) gpu: Option<TextureId>,
    pub(crate) collectable: bool,
}

impl Entity for Texture {
    const KIND: &'static str = "texture";
}

impl Texture {
    /// Create a texture from tightly packed RGBA8 pixels
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> RenderResult<Self> {
        validate_pixels(width, height, &pixels)?;
        Ok(Self {
            has_transparency: detect_transparency(&pixels),
            pixels,
            width,
            height,
            uploaded: false,
            gpu: None,
            collectable: false,
        })
    }

    /// Create a texture from decoded image data
    pub fn from_image(image: ImageData) -> RenderResult<Self> {
        Self::new(image.width, image.height, image.data)
    }

    /// Replace the pixels; transparency is classified again from scratch
    pub fn set_pixels(&mut self, width: u32, height: u32, pixels: Vec<u8>) -> RenderResult<()> {
        validate_pixels(width, height, &pixels)?;
        self.has_transparency = detect_transparency(&pixels);
        self.pixels = pixels;
        self.width = width;
        self.height = height;
        self.uploaded = false;
        Ok(())
    }

    /// Pixel data
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Width in pixels
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Any pixel has alpha below 255
    pub const fn has_transparency(&self) -> bool {
        self.has_transparency
    }

    /// GPU copy matches the pixels
    pub const fn uploaded(&self) -> bool {
        self.uploaded
    }

    /// GPU texture, once allocated
    pub const fn gpu(&self) -> Option<TextureId> {
        self.gpu
    }

    /// Whether unreferenced instances may be garbage collected
    pub const fn collectable(&self) -> bool {
        self.collectable
    }
}

/// True iff any pixel's alpha is below 255
pub fn detect_transparency(pixels: &[u8]) -> bool {
    pixels.chunks_exact(4).any(|p| p[3] < u8::MAX)
}

fn validate_pixels(width: u32, height: u32, pixels: &[u8]) -> RenderResult<()> {
    let expected = width as usize * height as usize * 4;
    if width == 0 || height == 0 || pixels.len() != expected {
        return Err(RenderError::InvalidArgument(format!(
            "{width}x{height} texture needs {expected} bytes, got {}",
            pixels.len()
        )));
    }
    Ok(())
}
