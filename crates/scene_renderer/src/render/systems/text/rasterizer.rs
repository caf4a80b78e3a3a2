//! Font rasterizer boundary
//!
//! The renderer never calls a font library directly. It asks a
//! [`FontRasterizer`] for the pixel size of a string and then for an ARGB
//! bitmap of exactly that size.

use crate::config::TextQuality;

/// Result type for font operations
pub type FontResult<T> = Result<T, FontError>;

/// Errors that can occur during font operations
#[derive(Debug, thiserror::Error)]
pub enum FontError {
    /// Failed to load font from file or data
    #[error("Failed to load font: {0}")]
    LoadError(String),

    /// The font id was never registered with the rasterizer
    #[error("Unknown font {0}")]
    UnknownFont(usize),

    /// The rasterizer produced a bitmap of the wrong size
    #[error("Bitmap has {actual} pixels, expected {expected}")]
    SizeMismatch {
        /// `width * height` that was requested
        expected: usize,
        /// Pixels returned
        actual: usize,
    },
}

/// Font face registered with a rasterizer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FontId(pub usize);

/// Font face plus size
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FontDesc {
    /// Face
    pub face: FontId,
    /// Nominal glyph height in pixels
    pub pixel_size: f32,
}

impl FontDesc {
    /// Create a font description
    pub const fn new(face: FontId, pixel_size: f32) -> Self {
        Self { face, pixel_size }
    }
}

/// Rasterization switches derived from the text quality setting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RasterOptions {
    /// Keep glyph coverage instead of thresholding it
    pub antialiased: bool,
    /// Rasterize at this multiple of the target size, then box-downsample
    pub oversample: u32,
}

impl From<TextQuality> for RasterOptions {
    fn from(quality: TextQuality) -> Self {
        Self {
            antialiased: quality.antialiased(),
            oversample: quality.oversample(),
        }
    }
}

/// Text measurement and rasterization
pub trait FontRasterizer {
    /// Pixel extent of `text`, word-wrapped at `max_width` when non-zero
    fn measure(&mut self, text: &str, font: &FontDesc, max_width: u32, options: RasterOptions) -> FontResult<(u32, u32)>;

    /// Rasterize `text` into a `size` bitmap of ARGB words, row-major, top row first
    ///
    /// Glyphs are white; coverage is carried in the alpha byte.
    fn rasterize(
        &mut self,
        text: &str,
        font: &FontDesc,
        max_width: u32,
        size: (u32, u32),
        options: RasterOptions,
    ) -> FontResult<Vec<u32>>;
}

/// ARGB word for white at the given coverage
pub(crate) const fn white_argb(coverage: u8) -> u32 {
    ((coverage as u32) << 24) | 0x00FF_FFFF
}

/// Unpack ARGB words into RGBA bytes
pub fn argb_to_rgba(words: &[u32]) -> Vec<u8> {
    words
        .iter()
        .flat_map(|&argb| {
            let [a, r, g, b] = argb.to_be_bytes();
            [r, g, b, a]
        })
        .collect()
}
