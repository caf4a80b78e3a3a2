//! Text rendering system
//!
//! The font rasterizer boundary, two rasterizer implementations and the
//! CPU rasterization stage of text entries.

pub mod rasterizer;
pub mod fontdue_rasterizer;
pub mod monospace;
pub mod raster;

pub use rasterizer::{
    argb_to_rgba, FontDesc, FontError, FontId, FontRasterizer, FontResult, RasterOptions,
};
pub use fontdue_rasterizer::FontdueRasterizer;
pub use monospace::MonospaceRasterizer;
pub use raster::rasterize_texts;
