//! UI system
//!
//! Anchored positioning and the screen layout of UI elements and text.

pub mod position;
pub mod layout;

pub use position::{Anchor, Position};
pub use layout::{update_ui_elements, update_text_layouts};
