//! Entity records
//!
//! One record type per entity kind. Each carries its raw data, the derived
//! state recomputed by the update systems, and the flags that gate that
//! recomputation. Setters only ever clear flags; the systems set them again.

pub mod mesh;
pub mod texture;
pub mod object;
pub mod camera;
pub mod light;
pub mod text;
pub mod flat;

pub use mesh::{Mesh, Vertex, MeshGpu};
pub use texture::Texture;
pub use object::Object;
pub use camera::Camera;
pub use light::{ConeLight, PointLight, Sun};
pub use text::{Text, TextLayout};
pub use flat::{FlatMesh, FlatVertex, UiElement, UiTransform};

/// Lazy realization stage of data that is first derived on the CPU and then
/// uploaded to the GPU
///
/// Transitions only move forward (`Dirty -> CpuReady -> GpuUploaded`) except
/// through [`Realization::invalidate`] and [`Realization::invalidate_upload`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Realization {
    /// Derived CPU data is stale
    #[default]
    Dirty,
    /// Derived CPU data is current, the GPU copy is not
    CpuReady,
    /// GPU copy matches the CPU data
    GpuUploaded,
}

impl Realization {
    /// Derived CPU data is current
    pub const fn cpu_ready(self) -> bool {
        !matches!(self, Self::Dirty)
    }

    /// GPU copy is current
    pub const fn uploaded(self) -> bool {
        matches!(self, Self::GpuUploaded)
    }

    /// Underlying data changed
    pub fn invalidate(&mut self) {
        *self = Self::Dirty;
    }

    /// GPU copy lost, CPU data still valid
    pub fn invalidate_upload(&mut self) {
        if *self == Self::GpuUploaded {
            *self = Self::CpuReady;
        }
    }

    /// CPU derivation finished
    pub fn mark_cpu_ready(&mut self) {
        if *self == Self::Dirty {
            *self = Self::CpuReady;
        }
    }

    /// Upload finished
    pub fn mark_uploaded(&mut self) {
        if *self == Self::CpuReady {
            *self = Self::GpuUploaded;
        }
    }
}
