//! Render resources
//!
//! The translation layer between CPU entity data and the graphics device:
//! per-entity GPU objects, shader programs and render targets.

pub mod gpu;
pub mod shaders;
pub mod framebuffers;

pub use shaders::{ProgramKind, ProgramSet};
pub use framebuffers::{Framebuffers, Target, SHADOW_MAP_SIZE};
