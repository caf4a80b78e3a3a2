//! Scene objects
//!
//! An object places a mesh in the world. It caches two matrices with
//! independent validity: the world transform, which depends only on the
//! object, and the normal matrix, which also depends on the active camera's
//! view and is therefore invalidated by camera changes as well.

use crate::foundation::math::{Mat3, Mat4, Vec3};
use crate::render::registry::{Entity, Handle};
use super::{Mesh, Texture};

/// Mesh instance in the world
#[derive(Debug, Clone)]
pub struct Object {
    pub(crate) mesh: Handle<Mesh>,
    pub(crate) texture: Option<Handle<Texture>>,
    pub(crate) visible: bool,
    pub(crate) shaded: bool,
    pub(crate) location: Vec3,
    pub(crate) rotation: Vec3,
    pub(crate) scale: Vec3,
    pub(crate) transform: Mat4,
    pub(crate) normal_matrix: Mat3,
    pub(crate) matrix_valid: bool,
    pub(crate) inverse_model_view_valid: bool,
}

impl Entity for Object {
    const KIND: &'static str = "object";
}

impl Object {
    /// Visible, shaded object at the origin with unit scale
    pub fn new(mesh: Handle<Mesh>, texture: Option<Handle<Texture>>) -> Self {
        Self {
            mesh,
            texture,
            visible: true,
            shaded: true,
            location: Vec3::zeros(),
            rotation: Vec3::zeros(),
            scale: Vec3::new(1.0, 1.0, 1.0),
            transform: Mat4::identity(),
            normal_matrix: Mat3::identity(),
            matrix_valid: false,
            inverse_model_view_valid: false,
        }
    }

    /// Both cached matrices are stale
    pub fn invalidate_matrices(&mut self) {
        self.matrix_valid = false;
        self.inverse_model_view_valid = false;
    }

    /// Only the camera-dependent normal matrix is stale
    pub fn invalidate_inverse_model_view(&mut self) {
        self.inverse_model_view_valid = false;
    }

    /// Mesh drawn by this object
    pub const fn mesh(&self) -> Handle<Mesh> {
        self.mesh
    }

    /// Texture sampled by this object
    pub const fn texture(&self) -> Option<Handle<Texture>> {
        self.texture
    }

    /// Whether the object is drawn
    pub const fn visible(&self) -> bool {
        self.visible
    }

    /// Whether the object is lit
    pub const fn shaded(&self) -> bool {
        self.shaded
    }

    /// World position
    pub const fn location(&self) -> Vec3 {
        self.location
    }

    /// XYZ Euler angles in radians
    pub const fn rotation(&self) -> Vec3 {
        self.rotation
    }

    /// Per-axis scale
    pub const fn scale(&self) -> Vec3 {
        self.scale
    }

    /// Cached world transform; current only when [`Object::matrix_valid`]
    pub const fn transform(&self) -> &Mat4 {
        &self.transform
    }

    /// Cached view-space normal matrix
    pub const fn normal_matrix(&self) -> &Mat3 {
        &self.normal_matrix
    }

    /// World transform is current
    pub const fn matrix_valid(&self) -> bool {
        self.matrix_valid
    }

    /// Normal matrix is current for the active camera
    pub const fn inverse_model_view_valid(&self) -> bool {
        self.inverse_model_view_valid
    }
}
