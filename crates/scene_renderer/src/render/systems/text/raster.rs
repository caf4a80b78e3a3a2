//! CPU rasterization of text entries
//!
//! The first of the two lazy text stages: a `Dirty` text is measured,
//! rasterized at exactly the measured size and repacked from the
//! rasterizer's ARGB words into RGBA bytes.

use std::ops::Range;

use crate::render::primitives::Text;
use crate::render::registry::Store;
use crate::render::RenderResult;
use super::rasterizer::{argb_to_rgba, FontError, FontRasterizer, RasterOptions};

/// Rasterize every `Dirty` text in a slot range
///
/// Returns how many texts were rasterized. A rasterizer failure aborts the
/// batch; texts earlier in the range keep their new pixels.
pub fn rasterize_texts(
    texts: &mut Store<Text>,
    range: Range<usize>,
    rasterizer: &mut dyn FontRasterizer,
    options: RasterOptions,
) -> RenderResult<usize> {
    let mut rasterized = 0;
    for text in texts.slots_mut(range)?.iter_mut().flatten() {
        if text.state.cpu_ready() {
            continue;
        }

        let (width, height) = rasterizer.measure(&text.string, &text.font, text.max_width, options)?;
        if width == 0 || height == 0 {
            log::trace!("Text {:?} rasterizes to nothing", text.string);
            text.pixels.clear();
        } else {
            let words = rasterizer.rasterize(&text.string, &text.font, text.max_width, (width, height), options)?;
            let expected = width as usize * height as usize;
            if words.len() != expected {
                return Err(FontError::SizeMismatch { expected, actual: words.len() }.into());
            }
            text.pixels = argb_to_rgba(&words);
        }

        text.width = width;
        text.height = height;
        text.layout_valid = false;
        text.state.mark_cpu_ready();
        rasterized += 1;
    }
    Ok(rasterized)
}
