//! Device backends
//!
//! Implementations of [`crate::render::api::GraphicsDevice`]. The recording
//! backend is headless and ships with the crate; driver backends live with
//! the embedding application.

pub mod recording;

pub use recording::{DeviceCall, RecordingDevice, ResourceKind};
