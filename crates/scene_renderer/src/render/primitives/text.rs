//! Screen-space text
//!
//! Text goes through two lazy stages: rasterization into a CPU pixel buffer
//! (`Dirty -> CpuReady`) and upload of that buffer into a texture
//! (`CpuReady -> GpuUploaded`). Its screen layout depends on the rasterized
//! size and the window size and is cached separately.

use crate::foundation::math::Vec2;
use crate::render::api::TextureId;
use crate::render::registry::Entity;
use crate::render::systems::text::FontDesc;
use crate::render::systems::ui::Position;
use super::Realization;

/// Normalized screen rectangle of a text quad
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TextLayout {
    /// Top-left corner, 0..1 from the window's top-left
    pub origin: Vec2,
    /// Extent as a fraction of the window
    pub size: Vec2,
}

/// Text overlay entry
#[derive(Debug, Clone)]
pub struct Text {
    pub(crate) string: String,
    pub(crate) font: FontDesc,
    pub(crate) color: [f32; 4],
    pub(crate) position: Position,
    pub(crate) max_width: u32,
    pub(crate) depth: i32,
    pub(crate) visible: bool,
    pub(crate) pixels: Vec<u8>,
    pub(crate) width: u32,
    pub(crate) height: u32,
    pub(crate) state: Realization,
    pub(crate) layout: TextLayout,
    pub(crate) layout_valid: bool,
    pub(crate) gpu: Option<TextureId>,
}

impl Entity for Text {
    const KIND: &'static str = "text";
}

impl Text {
    /// Create a text entry; nothing is rasterized until the next update
    pub fn new(string: impl Into<String>, font: FontDesc, color: [f32; 4], position: Position, max_width: u32, depth: i32) -> Self {
        Self {
            string: string.into(),
            font,
            color,
            position,
            max_width,
            depth,
            visible: true,
            pixels: Vec::new(),
            width: 0,
            height: 0,
            state: Realization::Dirty,
            layout: TextLayout::default(),
            layout_valid: false,
            gpu: None,
        }
    }

    /// Rasterized content is stale
    pub fn invalidate_texture(&mut self) {
        self.state.invalidate();
        self.layout_valid = false;
    }

    /// Displayed string
    pub fn string(&self) -> &str {
        &self.string
    }

    /// Font
    pub const fn font(&self) -> &FontDesc {
        &self.font
    }

    /// RGBA tint
    pub const fn color(&self) -> [f32; 4] {
        self.color
    }

    /// Anchored screen position
    pub const fn position(&self) -> Position {
        self.position
    }

    /// Wrap width in pixels, 0 for no wrapping
    pub const fn max_width(&self) -> u32 {
        self.max_width
    }

    /// Overlay z-order, higher on top
    pub const fn depth(&self) -> i32 {
        self.depth
    }

    /// Whether the text is drawn
    pub const fn visible(&self) -> bool {
        self.visible
    }

    /// Rasterized RGBA pixels
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Rasterized size in pixels
    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width as f32, self.height as f32)
    }

    /// CPU rasterization is current
    pub const fn texture_ready(&self) -> bool {
        self.state.cpu_ready()
    }

    /// GPU texture is current
    pub const fn uploaded(&self) -> bool {
        self.state.uploaded()
    }

    /// Cached layout; current only when [`Text::layout_valid`]
    pub const fn layout(&self) -> TextLayout {
        self.layout
    }

    /// Layout is current for the window size
    pub const fn layout_valid(&self) -> bool {
        self.layout_valid
    }

    /// Nothing to draw after rasterization
    pub(crate) const fn is_blank(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}
