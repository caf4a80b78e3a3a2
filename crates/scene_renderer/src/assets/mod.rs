//! Asset decoding
//!
//! Only texture images are decoded here; mesh formats are parsed by the
//! embedding application and handed over as vertex and index lists.

pub mod image_loader;

pub use image_loader::ImageData;

use thiserror::Error;

/// Asset loading errors
#[derive(Error, Debug)]
pub enum AssetError {
    /// File could not be read
    #[error("Asset not found: {0}")]
    NotFound(String),

    /// Decoder rejected the data
    #[error("Failed to load asset: {0}")]
    LoadFailed(String),

    /// Decoded data is unusable
    #[error("Invalid data: {0}")]
    InvalidData(String),
}
