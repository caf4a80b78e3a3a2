//! Update systems
//!
//! Range-based algorithms that recompute derived entity state. Every batch
//! entry point checks `start <= end <= slot_count` before touching a slot,
//! then skips free slots and records whose flag says they are already
//! current. Running a system twice over the same range is therefore a no-op
//! the second time, and overlapping ranges are safe.

pub mod normals;
pub mod transforms;
pub mod camera;
pub mod lights;
pub mod text;
pub mod ui;

pub use normals::update_normals;
pub use transforms::{update_object_matrices, update_inverse_model_view};
pub use camera::update_cameras;
pub use lights::{update_sun, update_cone_lights, sun_direction};
pub use text::rasterize_texts;
pub use ui::{update_ui_elements, update_text_layouts};
