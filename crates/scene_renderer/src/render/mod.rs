//! # Rendering System
//!
//! The scene-graph and render-resource manager. Applications talk to the
//! [`Renderer`] facade; everything else is organised leaves first:
//!
//! - **Registry**: typed handles with id to slot translation
//! - **Primitives**: the per-kind entity records and their dirty flags
//! - **Scene**: one store per entity kind and cross-kind invalidation
//! - **Systems**: range-based update algorithms that recompute derived state
//! - **Resources**: GPU allocation and upload of entity data, shader programs,
//!   render targets
//! - **Pipeline**: per-frame ordering, pass execution and statistics
//!
//! The graphics driver sits behind the [`GraphicsDevice`] trait; a headless
//! [`RecordingDevice`] ships for tests and tooling.

pub mod api;
pub mod backends;
pub mod registry;
pub mod primitives;
pub mod systems;
pub mod resources;
pub mod scene;
pub mod pipeline;

mod renderer;

pub use api::{GraphicsDevice, DeviceError, TimerRegion};
pub use backends::{RecordingDevice, DeviceCall, ResourceKind};
pub use registry::{Handle, Store, Entity};
pub use scene::{Scene, Stored};
pub use primitives::{
    Mesh, Vertex, Texture, Object, Camera, ConeLight, PointLight, Sun, Text,
    FlatMesh, FlatVertex, UiElement, Realization,
};
pub use systems::ui::{Anchor, Position};
pub use systems::text::{FontRasterizer, FontDesc, FontId, FontError, RasterOptions, FontdueRasterizer, MonospaceRasterizer};
pub use pipeline::stats::{Statistics, EntityCounts, PassPrimitives};
pub use renderer::Renderer;

use thiserror::Error;

use crate::config::ConfigError;

/// Errors raised by the renderer core
#[derive(Error, Debug)]
pub enum RenderError {
    /// A batch range violated `start <= end <= count`
    ///
    /// Always a caller bug; the batch is rejected before any slot is touched.
    #[error("Invalid range {start}..{end} for {count} slots")]
    InvalidRange {
        /// Range start
        start: usize,
        /// Range end
        end: usize,
        /// Slot count of the store
        count: usize,
    },

    /// A handle that was never issued or has been deleted
    #[error("Invalid {kind} handle {id}")]
    InvalidHandle {
        /// Entity kind
        kind: &'static str,
        /// Handle id
        id: u64,
    },

    /// The starting camera cannot be deleted
    #[error("The starting camera cannot be deleted")]
    StartingCamera,

    /// A resource cannot be deleted while other entities draw it
    #[error("{kind} is still used by {users} entities")]
    InUse {
        /// Entity kind
        kind: &'static str,
        /// Entities referencing it
        users: usize,
    },

    /// An entity parameter was rejected by its setter
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A frame was requested before `initialize`
    #[error("Renderer is not initialized")]
    NotInitialized,

    /// A matrix that must be invertible was not
    #[error("Singular {0} matrix")]
    SingularMatrix(&'static str),

    /// The graphics device failed; the renderer is unusable
    #[error("Fatal device error: {0}")]
    Device(#[from] DeviceError),

    /// The font collaborator failed
    #[error("Text rasterization failed: {0}")]
    Text(#[from] FontError),

    /// A setting was rejected
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl RenderError {
    /// Whether the error leaves the renderer unusable
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::Device(_))
    }
}

/// Result type for rendering operations
pub type RenderResult<T> = Result<T, RenderError>;
