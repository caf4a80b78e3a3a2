//! # Orbit camera
//!
//! The camera orbits a focal point: yaw and pitch rotate a base offset, and
//! `distance` scales it to place the eye. View and projection are cached
//! together with their product and the inverse projection, and recomputed by
//! the camera update system only after a setter cleared `matrix_valid`.

use crate::foundation::math::{Mat4, Vec3};
use crate::render::registry::Entity;

/// Default vertical field of view, in radians
pub const DEFAULT_FOV: f32 = std::f32::consts::FRAC_PI_4;

/// Orbit camera record
#[derive(Debug, Clone)]
pub struct Camera {
    pub(crate) focal_point: Vec3,
    pub(crate) yaw: f32,
    pub(crate) pitch: f32,
    pub(crate) distance: f32,
    pub(crate) fov: f32,
    pub(crate) eye: Vec3,
    pub(crate) view: Mat4,
    pub(crate) projection: Mat4,
    pub(crate) view_projection: Mat4,
    pub(crate) inverse_projection: Mat4,
    pub(crate) matrix_valid: bool,
}

impl Entity for Camera {
    const KIND: &'static str = "camera";
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(Vec3::zeros(), 0.0, 0.0, 0.0, DEFAULT_FOV)
    }
}

impl Camera {
    /// Create a camera; matrices are computed on the next update
    pub fn new(focal_point: Vec3, yaw: f32, pitch: f32, distance: f32, fov: f32) -> Self {
        Self {
            focal_point,
            yaw,
            pitch,
            distance,
            fov,
            eye: focal_point,
            view: Mat4::identity(),
            projection: Mat4::identity(),
            view_projection: Mat4::identity(),
            inverse_projection: Mat4::identity(),
            matrix_valid: false,
        }
    }

    /// Point the camera orbits and looks at
    pub const fn focal_point(&self) -> Vec3 {
        self.focal_point
    }

    /// Rotation about Y, radians
    pub const fn yaw(&self) -> f32 {
        self.yaw
    }

    /// Rotation about X, radians
    pub const fn pitch(&self) -> f32 {
        self.pitch
    }

    /// Eye distance from the focal point
    pub const fn distance(&self) -> f32 {
        self.distance
    }

    /// Vertical field of view, radians
    pub const fn fov(&self) -> f32 {
        self.fov
    }

    /// Eye position from the last update
    pub const fn eye(&self) -> Vec3 {
        self.eye
    }

    /// Cached view matrix
    pub const fn view(&self) -> &Mat4 {
        &self.view
    }

    /// Cached projection matrix
    pub const fn projection(&self) -> &Mat4 {
        &self.projection
    }

    /// Cached `projection * view`
    pub const fn view_projection(&self) -> &Mat4 {
        &self.view_projection
    }

    /// Cached inverse projection
    pub const fn inverse_projection(&self) -> &Mat4 {
        &self.inverse_projection
    }

    /// Cached matrices are current
    pub const fn matrix_valid(&self) -> bool {
        self.matrix_valid
    }
}
