//! Math utilities and types
//!
//! Provides the fundamental math types used by the entity stores and the
//! update algorithms. All matrices are column-major and act on column vectors.

pub use nalgebra::{
    Vector2, Vector3, Vector4,
    Matrix2, Matrix3, Matrix4,
    Quaternion,
    Unit,
};

/// 2D vector type
pub type Vec2 = Vector2<f32>;

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4D vector type
pub type Vec4 = Vector4<f32>;

/// 2x2 matrix type
pub type Mat2 = Matrix2<f32>;

/// 3x3 matrix type
pub type Mat3 = Matrix3<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// 3D point type
pub type Point3 = nalgebra::Point3<f32>;

/// Quaternion type for rotations
pub type Quat = nalgebra::UnitQuaternion<f32>;

/// World up axis shared by every look-at in the renderer
pub const WORLD_UP: Vec3 = Vec3::new(0.0, 1.0, 0.0);

/// Math utility functions
pub mod utils {
    use super::{Mat2, Mat3, Mat4};

    /// Upper-left 3x3 block of a 4x4 matrix
    pub fn upper_3x3(matrix: &Mat4) -> Mat3 {
        matrix.fixed_view::<3, 3>(0, 0).into_owned()
    }

    /// Column-major float array for uniform upload
    pub fn mat4_to_array(matrix: &Mat4) -> [f32; 16] {
        let mut out = [0.0; 16];
        out.copy_from_slice(matrix.as_slice());
        out
    }

    /// Column-major float array for uniform upload
    pub fn mat2_to_array(matrix: &Mat2) -> [f32; 4] {
        let mut out = [0.0; 4];
        out.copy_from_slice(matrix.as_slice());
        out
    }

    /// Column-major float array for uniform upload
    pub fn mat3_to_array(matrix: &Mat3) -> [f32; 9] {
        let mut out = [0.0; 9];
        out.copy_from_slice(matrix.as_slice());
        out
    }
}

/// Extension trait for Mat4 with the constructors the update algorithms need
pub trait Mat4Ext {
    /// Create an OpenGL-style perspective projection matrix
    fn perspective(fov_y: f32, aspect: f32, near: f32, far: f32) -> Mat4;

    /// Create an orthographic projection matrix
    fn orthographic(half_width: f32, half_height: f32, near: f32, far: f32) -> Mat4;

    /// Create a right-handed look-at view matrix
    fn look_at(eye: Vec3, target: Vec3, up: Vec3) -> Mat4;

    /// Build `translation * rotation * scale`, with the rotation taken from
    /// XYZ Euler angles through a quaternion
    fn scale_rotate_translate(scale: &Vec3, euler: &Vec3, translation: &Vec3) -> Mat4;
}

impl Mat4Ext for Mat4 {
    fn perspective(fov_y: f32, aspect: f32, near: f32, far: f32) -> Mat4 {
        Mat4::new_perspective(aspect, fov_y, near, far)
    }

    fn orthographic(half_width: f32, half_height: f32, near: f32, far: f32) -> Mat4 {
        Mat4::new_orthographic(-half_width, half_width, -half_height, half_height, near, far)
    }

    fn look_at(eye: Vec3, target: Vec3, up: Vec3) -> Mat4 {
        Mat4::look_at_rh(&Point3::from(eye), &Point3::from(target), &up)
    }

    fn scale_rotate_translate(scale: &Vec3, euler: &Vec3, translation: &Vec3) -> Mat4 {
        let rotation = Quat::from_euler_angles(euler.x, euler.y, euler.z);
        Mat4::new_translation(translation)
            * rotation.to_homogeneous()
            * Mat4::new_nonuniform_scaling(scale)
    }
}

/// Rotate a vector about X by `x_angle`, then about Y by `y_angle`
pub fn rotate_x_then_y(vector: &Vec3, x_angle: f32, y_angle: f32) -> Vec3 {
    let about_x = nalgebra::Rotation3::from_axis_angle(&Vec3::x_axis(), x_angle);
    let about_y = nalgebra::Rotation3::from_axis_angle(&Vec3::y_axis(), y_angle);
    about_y * (about_x * vector)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_identity_components_build_identity() {
        let m = Mat4::scale_rotate_translate(&Vec3::new(1.0, 1.0, 1.0), &Vec3::zeros(), &Vec3::zeros());
        assert_relative_eq!(m, Mat4::identity(), epsilon = 1e-6);
    }

    #[test]
    fn test_scale_applies_before_translation() {
        let m = Mat4::scale_rotate_translate(
            &Vec3::new(2.0, 2.0, 2.0),
            &Vec3::zeros(),
            &Vec3::new(1.0, 0.0, 0.0),
        );
        let p = m.transform_point(&Point3::new(1.0, 0.0, 0.0));
        assert_relative_eq!(p.x, 3.0, epsilon = 1e-6);
    }

    #[test]
    fn test_rotation_order_pitch_then_yaw() {
        let half_pi = std::f32::consts::FRAC_PI_2;
        // Pitch first leaves +Z pointing down, then yaw cannot move a vertical vector.
        let v = rotate_x_then_y(&Vec3::new(0.0, 0.0, 1.0), half_pi, half_pi);
        assert_relative_eq!(v, Vec3::new(0.0, -1.0, 0.0), epsilon = 1e-6);
    }
}
