//! Font rasterizer backed by `fontdue`
//!
//! Pure Rust TrueType/OpenType rasterization. Word-wrapping comes from
//! fontdue's layout engine; oversampled quality levels lay out and rasterize
//! at a multiple of the requested size and box-downsample the coverage.

use std::path::Path;

use fontdue::layout::{CoordinateSystem, Layout, LayoutSettings, TextStyle};
use fontdue::{Font, FontSettings};

use super::rasterizer::{white_argb, FontDesc, FontError, FontId, FontRasterizer, FontResult, RasterOptions};

/// Production font rasterizer
pub struct FontdueRasterizer {
    fonts: Vec<Font>,
    layout: Layout<()>,
}

impl Default for FontdueRasterizer {
    fn default() -> Self {
        Self::new()
    }
}

impl FontdueRasterizer {
    /// Create a rasterizer with no faces registered
    pub fn new() -> Self {
        Self {
            fonts: Vec::new(),
            layout: Layout::new(CoordinateSystem::PositiveYDown),
        }
    }

    /// Register a face from TrueType/OpenType bytes
    pub fn add_font(&mut self, font_data: &[u8]) -> FontResult<FontId> {
        let font = Font::from_bytes(font_data, FontSettings::default())
            .map_err(|e| FontError::LoadError(format!("fontdue error: {e}")))?;

        self.fonts.push(font);
        let id = FontId(self.fonts.len() - 1);
        log::info!("Registered font face {}", id.0);
        Ok(id)
    }

    /// Register a face from a font file
    pub fn load_font<P: AsRef<Path>>(&mut self, path: P) -> FontResult<FontId> {
        let data = std::fs::read(path.as_ref())
            .map_err(|e| FontError::LoadError(format!("{}: {e}", path.as_ref().display())))?;
        self.add_font(&data)
    }

    /// Run the layout engine at `scale` times the nominal size, returning the
    /// covered pixel extent
    fn lay_out(&mut self, text: &str, font: &FontDesc, max_width: u32, scale: u32) -> FontResult<(u32, u32)> {
        let face = self
            .fonts
            .get(font.face.0)
            .ok_or(FontError::UnknownFont(font.face.0))?;

        let settings = LayoutSettings {
            max_width: (max_width > 0).then(|| (max_width * scale) as f32),
            ..LayoutSettings::default()
        };
        self.layout.reset(&settings);
        self.layout.append(
            std::slice::from_ref(face),
            &TextStyle::new(text, font.pixel_size * scale as f32, 0),
        );

        let glyphs = self.layout.glyphs();
        if glyphs.is_empty() {
            return Ok((0, 0));
        }
        let width = glyphs
            .iter()
            .map(|g| g.x + g.width as f32)
            .fold(0.0_f32, f32::max);
        Ok((width.ceil() as u32, self.layout.height().ceil() as u32))
    }
}

impl FontRasterizer for FontdueRasterizer {
    fn measure(&mut self, text: &str, font: &FontDesc, max_width: u32, options: RasterOptions) -> FontResult<(u32, u32)> {
        let scale = options.oversample.max(1);
        let (width, height) = self.lay_out(text, font, max_width, scale)?;
        Ok((width.div_ceil(scale), height.div_ceil(scale)))
    }

    fn rasterize(
        &mut self,
        text: &str,
        font: &FontDesc,
        max_width: u32,
        size: (u32, u32),
        options: RasterOptions,
    ) -> FontResult<Vec<u32>> {
        let scale = options.oversample.max(1);
        self.lay_out(text, font, max_width, scale)?;
        let face = self
            .fonts
            .get(font.face.0)
            .ok_or(FontError::UnknownFont(font.face.0))?;

        let canvas_width = (size.0 * scale) as usize;
        let canvas_height = (size.1 * scale) as usize;
        let mut canvas = vec![0_u8; canvas_width * canvas_height];

        for glyph in self.layout.glyphs() {
            if glyph.width == 0 || glyph.height == 0 {
                continue;
            }
            let (metrics, bitmap) = face.rasterize_config(glyph.key);
            let left = glyph.x.floor() as i64;
            let top = glyph.y.floor() as i64;

            for row in 0..metrics.height {
                let y = top + row as i64;
                if y < 0 || y >= canvas_height as i64 {
                    continue;
                }
                for col in 0..metrics.width {
                    let x = left + col as i64;
                    if x < 0 || x >= canvas_width as i64 {
                        continue;
                    }
                    let target = &mut canvas[y as usize * canvas_width + x as usize];
                    *target = (*target).max(bitmap[row * metrics.width + col]);
                }
            }
        }

        if !options.antialiased {
            for coverage in &mut canvas {
                *coverage = if *coverage >= 128 { u8::MAX } else { 0 };
            }
        }

        Ok(downsample(&canvas, canvas_width, size, scale as usize))
    }
}

/// Box-filter a `scale`-times oversampled coverage canvas down to `size`
fn downsample(canvas: &[u8], canvas_width: usize, size: (u32, u32), scale: usize) -> Vec<u32> {
    let (width, height) = (size.0 as usize, size.1 as usize);
    let area = (scale * scale) as u32;
    let mut out = Vec::with_capacity(width * height);

    for y in 0..height {
        for x in 0..width {
            let mut sum = 0_u32;
            for sy in 0..scale {
                let row = (y * scale + sy) * canvas_width;
                for sx in 0..scale {
                    sum += u32::from(canvas[row + x * scale + sx]);
                }
            }
            out.push(white_argb((sum / area) as u8));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_font_is_reported() {
        let mut rasterizer = FontdueRasterizer::new();
        let font = FontDesc::new(FontId(3), 12.0);
        let options = RasterOptions { antialiased: true, oversample: 1 };
        assert!(matches!(
            rasterizer.measure("abc", &font, 0, options),
            Err(FontError::UnknownFont(3))
        ));
    }

    #[test]
    fn test_garbage_font_data_is_rejected() {
        let mut rasterizer = FontdueRasterizer::new();
        assert!(matches!(rasterizer.add_font(&[0, 1, 2, 3]), Err(FontError::LoadError(_))));
    }

    #[test]
    fn test_downsample_averages_blocks() {
        // 4x2 canvas, scale 2 -> 2x1 output.
        let canvas = [255, 255, 0, 0, 255, 255, 0, 255];
        let out = downsample(&canvas, 4, (2, 1), 2);
        assert_eq!(out, vec![white_argb(255), white_argb(63)]);
    }
}
