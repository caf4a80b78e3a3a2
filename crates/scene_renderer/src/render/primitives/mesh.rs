//! Mesh representation for 3D models
//!
//! A mesh holds the geometry as supplied by the asset loaders: positions and
//! texture coordinates plus a triangle index list. Vertex normals are derived
//! state, kept in a parallel list and only interleaved with the rest of the
//! vertex data when the mesh is uploaded.

use bytemuck::{Pod, Zeroable};

use crate::foundation::math::{Vec2, Vec3};
use crate::render::api::{BufferId, VertexArrayId};
use crate::render::registry::Entity;
use crate::render::{RenderError, RenderResult};
use super::Realization;

/// Input vertex: position and texture coordinate
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    /// Position in object space
    pub position: Vec3,
    /// Texture coordinate
    pub tex_coord: Vec2,
}

impl Vertex {
    /// Create a new vertex
    pub fn new(position: [f32; 3], tex_coord: [f32; 2]) -> Self {
        Self {
            position: Vec3::from(position),
            tex_coord: Vec2::from(tex_coord),
        }
    }
}

/// Upload layout matching [`crate::render::api::VertexLayout::Mesh`]
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub(crate) struct InterleavedVertex {
    pub position: [f32; 3],
    pub tex_coord: [f32; 2],
    pub normal: [f32; 3],
}

/// GPU objects owned by an uploaded mesh
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeshGpu {
    /// Vertex-array object
    pub vao: VertexArrayId,
    /// Interleaved vertex buffer
    pub vertex_buffer: BufferId,
    /// Index buffer
    pub index_buffer: BufferId,
}

/// Triangle mesh with lazily derived normals
#[derive(Debug, Clone)]
pub struct Mesh {
    pub(crate) vertices: Vec<Vertex>,
    pub(crate) indices: Vec<u32>,
    pub(crate) normals: Vec<Vec3>,
    pub(crate) state: Realization,
    pub(crate) gpu: Option<MeshGpu>,
    pub(crate) collectable: bool,
}

impl Entity for Mesh {
    const KIND: &'static str = "mesh";
}

impl Mesh {
    /// Create a mesh, validating the index list against the vertex list
    pub fn new(vertices: Vec<Vertex>, indices: Vec<u32>) -> RenderResult<Self> {
        validate_geometry(vertices.len(), &indices)?;
        Ok(Self {
            vertices,
            indices,
            normals: Vec::new(),
            state: Realization::Dirty,
            gpu: None,
            collectable: false,
        })
    }

    /// Replace the geometry; normals and the GPU copy become stale
    pub fn set_geometry(&mut self, vertices: Vec<Vertex>, indices: Vec<u32>) -> RenderResult<()> {
        validate_geometry(vertices.len(), &indices)?;
        self.vertices = vertices;
        self.indices = indices;
        self.state.invalidate();
        Ok(())
    }

    /// Vertex list
    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    /// Index list, three per triangle
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Derived vertex normals; only meaningful when [`Mesh::normals_valid`]
    pub fn normals(&self) -> &[Vec3] {
        &self.normals
    }

    /// Normals match the current geometry
    pub const fn normals_valid(&self) -> bool {
        self.state.cpu_ready()
    }

    /// GPU buffers match the current geometry
    pub const fn uploaded(&self) -> bool {
        self.state.uploaded()
    }

    /// Realization stage
    pub const fn realization(&self) -> Realization {
        self.state
    }

    /// GPU objects, once allocated
    pub const fn gpu(&self) -> Option<MeshGpu> {
        self.gpu
    }

    /// Number of triangles
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Whether unreferenced instances may be garbage collected
    pub const fn collectable(&self) -> bool {
        self.collectable
    }

    /// Interleave position, texcoord and normal for upload
    pub(crate) fn interleaved(&self) -> Vec<InterleavedVertex> {
        self.vertices
            .iter()
            .enumerate()
            .map(|(i, v)| InterleavedVertex {
                position: v.position.into(),
                tex_coord: v.tex_coord.into(),
                normal: self.normals.get(i).copied().unwrap_or_else(Vec3::zeros).into(),
            })
            .collect()
    }

    /// Unit cube centred at the origin: 8 shared vertices, 12 triangles
    pub fn cube() -> Self {
        let vertices = vec![
            // Front face
            Vertex::new([-1.0, -1.0, 1.0], [0.0, 0.0]),
            Vertex::new([1.0, -1.0, 1.0], [1.0, 0.0]),
            Vertex::new([1.0, 1.0, 1.0], [1.0, 1.0]),
            Vertex::new([-1.0, 1.0, 1.0], [0.0, 1.0]),
            // Back face
            Vertex::new([-1.0, -1.0, -1.0], [1.0, 0.0]),
            Vertex::new([-1.0, 1.0, -1.0], [1.0, 1.0]),
            Vertex::new([1.0, 1.0, -1.0], [0.0, 1.0]),
            Vertex::new([1.0, -1.0, -1.0], [0.0, 0.0]),
        ];

        let indices = vec![
            // Front
            0, 1, 2, 2, 3, 0,
            // Back
            4, 5, 6, 6, 7, 4,
            // Left
            4, 0, 3, 3, 5, 4,
            // Right
            1, 7, 6, 6, 2, 1,
            // Top
            3, 2, 6, 6, 5, 3,
            // Bottom
            4, 7, 1, 1, 0, 4,
        ];

        Self {
            vertices,
            indices,
            normals: Vec::new(),
            state: Realization::Dirty,
            gpu: None,
            collectable: false,
        }
    }
}

fn validate_geometry(vertex_count: usize, indices: &[u32]) -> RenderResult<()> {
    if indices.len() % 3 != 0 {
        return Err(RenderError::InvalidArgument(format!(
            "index count {} is not a multiple of 3",
            indices.len()
        )));
    }
    if let Some(bad) = indices.iter().find(|&&i| i as usize >= vertex_count) {
        return Err(RenderError::InvalidArgument(format!(
            "index {bad} out of bounds for {vertex_count} vertices"
        )));
    }
    Ok(())
}
