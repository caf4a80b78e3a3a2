//! # Scene Renderer
//!
//! A handle-based scene-graph and render-resource manager with a staged
//! deferred/forward frame pipeline.
//!
//! ## Features
//!
//! - **Stable handles**: typed ids that survive slot reuse and fail loudly after delete
//! - **Lazy derived state**: normals, matrices and text rasters recomputed only when dirty
//! - **Batched GPU upload**: per-kind allocation and upload behind a device trait
//! - **Frame composer**: shadow, geometry, lighting, transparency, HDR resolve and overlay
//! - **Statistics**: per-stage timer queries, primitive counts and GC figures
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use scene_renderer::prelude::*;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut renderer = Renderer::new(
//!         RecordingDevice::new(),
//!         Box::new(MonospaceRasterizer::new()),
//!         Settings::default(),
//!     )?;
//!     renderer.initialize(1280, 720)?;
//!
//!     let cube = renderer.add_mesh(Mesh::cube());
//!     let object = renderer.add_object(Object::new(cube, None))?;
//!     renderer.set_object_location(object, Vec3::new(0.0, 0.0, 5.0))?;
//!
//!     renderer.render_all()?;
//!     println!("{}", renderer.stats());
//!     Ok(())
//! }
//! ```

pub mod foundation;
pub mod config;
pub mod assets;
pub mod render;

/// Common imports for renderer users
pub mod prelude {
    pub use crate::{
        assets::{AssetError, ImageData},
        config::{AntiAliasing, RendererType, Settings, TextQuality, TextureFiltering},
        foundation::math::{Mat4, Vec2, Vec3},
        render::{
            Anchor, Camera, ConeLight, FlatMesh, FlatVertex, FontDesc, FontId, FontRasterizer,
            FontdueRasterizer, GraphicsDevice, Handle, Mesh, MonospaceRasterizer, Object, PointLight,
            Position, RecordingDevice, RenderError, RenderResult, Renderer, Statistics, Text, Texture,
            UiElement, Vertex,
        },
    };
}
