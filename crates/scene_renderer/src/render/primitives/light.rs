//! Light records
//!
//! The lighting model is fixed: one sun plus any number of point and cone
//! lights. Shadow-casting lights cache a light-space transform.

use crate::foundation::math::{Mat4, Vec3};
use crate::render::registry::Entity;

/// Spot light with a cone of influence
#[derive(Debug, Clone)]
pub struct ConeLight {
    pub(crate) location: Vec3,
    pub(crate) direction: Vec3,
    pub(crate) color: Vec3,
    pub(crate) brightness: f32,
    pub(crate) fov: f32,
    pub(crate) shadow: bool,
    pub(crate) shadow_matrix: Mat4,
    pub(crate) matrix_valid: bool,
}

impl Entity for ConeLight {
    const KIND: &'static str = "cone light";
}

impl ConeLight {
    /// Create a cone light; `direction` is normalized
    pub fn new(location: Vec3, direction: Vec3, color: Vec3, brightness: f32, fov: f32, shadow: bool) -> Self {
        Self {
            location,
            direction: direction.try_normalize(f32::EPSILON).unwrap_or_else(|| Vec3::new(0.0, 0.0, 1.0)),
            color,
            brightness,
            fov,
            shadow,
            shadow_matrix: Mat4::identity(),
            matrix_valid: false,
        }
    }

    /// World position
    pub const fn location(&self) -> Vec3 {
        self.location
    }

    /// Unit direction of the cone axis
    pub const fn direction(&self) -> Vec3 {
        self.direction
    }

    /// Light colour
    pub const fn color(&self) -> Vec3 {
        self.color
    }

    /// Intensity multiplier
    pub const fn brightness(&self) -> f32 {
        self.brightness
    }

    /// Full cone angle, radians
    pub const fn fov(&self) -> f32 {
        self.fov
    }

    /// Whether the light casts shadows
    pub const fn shadow(&self) -> bool {
        self.shadow
    }

    /// Light-space transform; current only when [`ConeLight::matrix_valid`]
    pub const fn shadow_matrix(&self) -> &Mat4 {
        &self.shadow_matrix
    }

    /// Shadow transform is current
    pub const fn matrix_valid(&self) -> bool {
        self.matrix_valid
    }
}

/// Omnidirectional light
#[derive(Debug, Clone)]
pub struct PointLight {
    pub(crate) location: Vec3,
    pub(crate) color: Vec3,
    pub(crate) brightness: f32,
    pub(crate) radius: f32,
}

impl Entity for PointLight {
    const KIND: &'static str = "point light";
}

impl PointLight {
    /// Create a point light
    pub const fn new(location: Vec3, color: Vec3, brightness: f32, radius: f32) -> Self {
        Self { location, color, brightness, radius }
    }

    /// World position
    pub const fn location(&self) -> Vec3 {
        self.location
    }

    /// Light colour
    pub const fn color(&self) -> Vec3 {
        self.color
    }

    /// Intensity multiplier
    pub const fn brightness(&self) -> f32 {
        self.brightness
    }

    /// Distance at which the contribution reaches zero
    pub const fn radius(&self) -> f32 {
        self.radius
    }
}

/// The single directional light
///
/// Its direction derives from azimuth and elevation; its shadow transform
/// follows the active camera's focal point.
#[derive(Debug, Clone)]
pub struct Sun {
    pub(crate) azimuth: f32,
    pub(crate) elevation: f32,
    pub(crate) color: Vec3,
    pub(crate) brightness: f32,
    pub(crate) shadow: bool,
    pub(crate) direction: Vec3,
    pub(crate) shadow_matrix: Mat4,
    pub(crate) matrix_valid: bool,
}

impl Default for Sun {
    fn default() -> Self {
        Self {
            azimuth: 0.0,
            elevation: std::f32::consts::FRAC_PI_4,
            color: Vec3::new(1.0, 1.0, 1.0),
            brightness: 1.0,
            shadow: false,
            direction: Vec3::new(0.0, 0.0, 1.0),
            shadow_matrix: Mat4::identity(),
            matrix_valid: false,
        }
    }
}

impl Sun {
    /// Angle about the world Y axis, radians
    pub const fn azimuth(&self) -> f32 {
        self.azimuth
    }

    /// Angle above the horizon, radians
    pub const fn elevation(&self) -> f32 {
        self.elevation
    }

    /// Light colour
    pub const fn color(&self) -> Vec3 {
        self.color
    }

    /// Intensity multiplier
    pub const fn brightness(&self) -> f32 {
        self.brightness
    }

    /// Whether the sun casts shadows
    pub const fn shadow(&self) -> bool {
        self.shadow
    }

    /// Unit vector pointing from the scene towards the sun
    pub const fn direction(&self) -> Vec3 {
        self.direction
    }

    /// Light-space transform
    pub const fn shadow_matrix(&self) -> &Mat4 {
        &self.shadow_matrix
    }

    /// Direction and shadow transform are current
    pub const fn matrix_valid(&self) -> bool {
        self.matrix_valid
    }
}
