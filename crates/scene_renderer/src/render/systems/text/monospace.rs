//! Fixed-cell rasterizer
//!
//! Every character occupies a `pixel_size / 2` by `pixel_size` cell and
//! non-blank characters render as a solid block. Needs no font file, which
//! makes it the rasterizer of choice for headless runs and tests.

use super::rasterizer::{white_argb, FontDesc, FontRasterizer, FontResult, RasterOptions};

/// Font-less rasterizer with fixed glyph cells
#[derive(Debug, Clone, Copy, Default)]
pub struct MonospaceRasterizer;

impl MonospaceRasterizer {
    /// Create the rasterizer
    pub const fn new() -> Self {
        Self
    }

    fn cell(font: &FontDesc) -> (u32, u32) {
        let height = font.pixel_size.ceil().max(1.0) as u32;
        (height.div_ceil(2), height)
    }

    /// Greedy word wrap into lines of at most `max_columns` characters
    fn wrap(text: &str, max_columns: Option<usize>) -> Vec<String> {
        let mut lines = Vec::new();
        for paragraph in text.split('\n') {
            let Some(limit) = max_columns else {
                lines.push(paragraph.to_string());
                continue;
            };

            let mut line = String::new();
            for word in paragraph.split_whitespace() {
                let mut word: Vec<char> = word.chars().collect();
                let used = line.chars().count();
                if used > 0 && used + 1 + word.len() > limit {
                    lines.push(std::mem::take(&mut line));
                }
                // Words longer than a whole line are split hard.
                while word.len() > limit {
                    let rest = word.split_off(limit);
                    if !line.is_empty() {
                        lines.push(std::mem::take(&mut line));
                    }
                    lines.push(word.into_iter().collect());
                    word = rest;
                }
                if !line.is_empty() {
                    line.push(' ');
                }
                line.extend(word);
            }
            lines.push(line);
        }
        lines
    }

    fn lines(text: &str, font: &FontDesc, max_width: u32) -> Vec<String> {
        let (cell_width, _) = Self::cell(font);
        let max_columns = (max_width > 0).then(|| ((max_width / cell_width) as usize).max(1));
        Self::wrap(text, max_columns)
    }
}

impl FontRasterizer for MonospaceRasterizer {
    fn measure(&mut self, text: &str, font: &FontDesc, max_width: u32, _options: RasterOptions) -> FontResult<(u32, u32)> {
        let (cell_width, cell_height) = Self::cell(font);
        let lines = Self::lines(text, font, max_width);
        let columns = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0) as u32;
        if columns == 0 {
            return Ok((0, 0));
        }
        Ok((columns * cell_width, lines.len() as u32 * cell_height))
    }

    fn rasterize(
        &mut self,
        text: &str,
        font: &FontDesc,
        max_width: u32,
        size: (u32, u32),
        _options: RasterOptions,
    ) -> FontResult<Vec<u32>> {
        let (cell_width, cell_height) = Self::cell(font);
        let (width, height) = (size.0 as usize, size.1 as usize);
        let mut pixels = vec![white_argb(0); width * height];

        for (row, line) in Self::lines(text, font, max_width).iter().enumerate() {
            for (column, ch) in line.chars().enumerate() {
                if ch.is_whitespace() {
                    continue;
                }
                let left = column * cell_width as usize;
                let top = row * cell_height as usize;
                for y in top..(top + cell_height as usize).min(height) {
                    for x in left..(left + cell_width as usize).min(width) {
                        pixels[y * width + x] = white_argb(u8::MAX);
                    }
                }
            }
        }
        Ok(pixels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::systems::text::FontId;

    const FONT: FontDesc = FontDesc::new(FontId(0), 10.0);
    const OPTIONS: RasterOptions = RasterOptions { antialiased: true, oversample: 1 };

    #[test]
    fn test_measure_single_line() {
        let mut rasterizer = MonospaceRasterizer::new();
        assert_eq!(rasterizer.measure("hello", &FONT, 0, OPTIONS).unwrap(), (25, 10));
        assert_eq!(rasterizer.measure("", &FONT, 0, OPTIONS).unwrap(), (0, 0));
    }

    #[test]
    fn test_wraps_at_max_width() {
        let mut rasterizer = MonospaceRasterizer::new();
        // 30px holds 6 columns: "hello" / "world"
        assert_eq!(rasterizer.measure("hello world", &FONT, 30, OPTIONS).unwrap(), (25, 20));
    }

    #[test]
    fn test_long_words_split_hard() {
        let lines = MonospaceRasterizer::wrap("abcdefgh ij", Some(3));
        assert_eq!(lines, vec!["abc", "def", "gh", "ij"]);
    }

    #[test]
    fn test_blocks_cover_glyph_cells() {
        let mut rasterizer = MonospaceRasterizer::new();
        let size = rasterizer.measure("a b", &FONT, 0, OPTIONS).unwrap();
        let pixels = rasterizer.rasterize("a b", &FONT, 0, size, OPTIONS).unwrap();
        assert_eq!(pixels.len(), 15 * 10);
        assert_eq!(pixels[0], white_argb(255));
        assert_eq!(pixels[7], white_argb(0));
        assert_eq!(pixels[14], white_argb(255));
    }
}
