//! Screen-space quads
//!
//! `FlatMesh` is the 2D analog of [`super::Mesh`], with pixel-space vertex
//! positions measured from the element's top-left corner. `UiElement`
//! places a flat mesh on screen the way an object places a mesh in the world.

use bytemuck::{Pod, Zeroable};

use crate::foundation::math::{Mat2, Vec2};
use crate::render::registry::{Entity, Handle};
use crate::render::systems::ui::Position;
use crate::render::{RenderError, RenderResult};
use super::{MeshGpu, Texture};

/// 2D vertex, pixel position and texture coordinate
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct FlatVertex {
    /// Position in pixels from the element's top-left corner
    pub position: [f32; 2],
    /// Texture coordinate
    pub tex_coord: [f32; 2],
}

impl FlatVertex {
    /// Create a new vertex
    pub const fn new(position: [f32; 2], tex_coord: [f32; 2]) -> Self {
        Self { position, tex_coord }
    }
}

/// 2D triangle mesh
#[derive(Debug, Clone)]
pub struct FlatMesh {
    pub(crate) vertices: Vec<FlatVertex>,
    pub(crate) indices: Vec<u32>,
    pub(crate) extent: Vec2,
    pub(crate) uploaded: bool,
    pub(crate) gpu: Option<MeshGpu>,
    pub(crate) collectable: bool,
}

impl Entity for FlatMesh {
    const KIND: &'static str = "flat mesh";
}

impl FlatMesh {
    /// Create a flat mesh, validating the index list
    pub fn new(vertices: Vec<FlatVertex>, indices: Vec<u32>) -> RenderResult<Self> {
        validate(&vertices, &indices)?;
        Ok(Self {
            extent: extent_of(&vertices),
            vertices,
            indices,
            uploaded: false,
            gpu: None,
            collectable: false,
        })
    }

    /// Axis-aligned `width x height` rectangle with full texture coverage
    pub fn rectangle(width: f32, height: f32) -> Self {
        let vertices = vec![
            FlatVertex::new([0.0, 0.0], [0.0, 0.0]),
            FlatVertex::new([width, 0.0], [1.0, 0.0]),
            FlatVertex::new([width, height], [1.0, 1.0]),
            FlatVertex::new([0.0, height], [0.0, 1.0]),
        ];
        Self {
            extent: extent_of(&vertices),
            vertices,
            indices: vec![0, 1, 2, 2, 3, 0],
            uploaded: false,
            gpu: None,
            collectable: false,
        }
    }

    /// Replace the geometry; the GPU copy becomes stale
    pub fn set_geometry(&mut self, vertices: Vec<FlatVertex>, indices: Vec<u32>) -> RenderResult<()> {
        validate(&vertices, &indices)?;
        self.extent = extent_of(&vertices);
        self.vertices = vertices;
        self.indices = indices;
        self.uploaded = false;
        Ok(())
    }

    /// Vertex list
    pub fn vertices(&self) -> &[FlatVertex] {
        &self.vertices
    }

    /// Index list
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Largest x and y of any vertex, the unscaled size used for anchoring
    pub const fn extent(&self) -> Vec2 {
        self.extent
    }

    /// GPU copy matches the geometry
    pub const fn uploaded(&self) -> bool {
        self.uploaded
    }

    /// GPU objects, once allocated
    pub const fn gpu(&self) -> Option<MeshGpu> {
        self.gpu
    }

    /// Whether unreferenced instances may be garbage collected
    pub const fn collectable(&self) -> bool {
        self.collectable
    }
}

fn extent_of(vertices: &[FlatVertex]) -> Vec2 {
    vertices.iter().fold(Vec2::zeros(), |acc, v| {
        Vec2::new(acc.x.max(v.position[0]), acc.y.max(v.position[1]))
    })
}

fn validate(vertices: &[FlatVertex], indices: &[u32]) -> RenderResult<()> {
    if indices.len() % 3 != 0 || indices.iter().any(|&i| i as usize >= vertices.len()) {
        return Err(RenderError::InvalidArgument(format!(
            "{} indices do not form valid triangles over {} vertices",
            indices.len(),
            vertices.len()
        )));
    }
    Ok(())
}

/// Shader parameters of a UI element: `translate + rotation * (scale * vertex)`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UiTransform {
    /// Rotation about the element's top-left corner
    pub rotation: Mat2,
    /// Per-axis scale
    pub scale: Vec2,
    /// Top-left corner in window pixels
    pub translate: Vec2,
}

impl Default for UiTransform {
    fn default() -> Self {
        Self {
            rotation: Mat2::identity(),
            scale: Vec2::new(1.0, 1.0),
            translate: Vec2::zeros(),
        }
    }
}

/// Flat mesh placed on screen
#[derive(Debug, Clone)]
pub struct UiElement {
    pub(crate) flat_mesh: Handle<FlatMesh>,
    pub(crate) texture: Option<Handle<Texture>>,
    pub(crate) color: [f32; 4],
    pub(crate) position: Position,
    pub(crate) scale: Vec2,
    pub(crate) rotation: f32,
    pub(crate) depth: i32,
    pub(crate) visible: bool,
    pub(crate) transform: UiTransform,
    pub(crate) matrix_valid: bool,
}

impl Entity for UiElement {
    const KIND: &'static str = "ui element";
}

impl UiElement {
    /// Create a visible, unrotated, unit-scale element
    pub fn new(flat_mesh: Handle<FlatMesh>, texture: Option<Handle<Texture>>, position: Position, depth: i32) -> Self {
        Self {
            flat_mesh,
            texture,
            color: [1.0, 1.0, 1.0, 1.0],
            position,
            scale: Vec2::new(1.0, 1.0),
            rotation: 0.0,
            depth,
            visible: true,
            transform: UiTransform::default(),
            matrix_valid: false,
        }
    }

    /// Flat mesh drawn by this element
    pub const fn flat_mesh(&self) -> Handle<FlatMesh> {
        self.flat_mesh
    }

    /// Texture sampled by this element
    pub const fn texture(&self) -> Option<Handle<Texture>> {
        self.texture
    }

    /// RGBA tint
    pub const fn color(&self) -> [f32; 4] {
        self.color
    }

    /// Anchored screen position
    pub const fn position(&self) -> Position {
        self.position
    }

    /// Per-axis scale
    pub const fn scale(&self) -> Vec2 {
        self.scale
    }

    /// Rotation in radians, clockwise on screen
    pub const fn rotation(&self) -> f32 {
        self.rotation
    }

    /// Overlay z-order, higher on top
    pub const fn depth(&self) -> i32 {
        self.depth
    }

    /// Whether the element is drawn
    pub const fn visible(&self) -> bool {
        self.visible
    }

    /// Cached shader transform
    pub const fn transform(&self) -> &UiTransform {
        &self.transform
    }

    /// Cached transform is current for the window size
    pub const fn matrix_valid(&self) -> bool {
        self.matrix_valid
    }
}
