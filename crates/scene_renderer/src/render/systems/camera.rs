//! Camera matrices
//!
//! Eye placement: the base offset `(0, 0, -distance)` is pitched about X,
//! then yawed about Y, and added to the focal point. The view looks from the
//! eye along that same direction, which stays defined at zero distance.

use std::ops::Range;

use crate::foundation::math::{rotate_x_then_y, Mat4, Mat4Ext, Vec3, WORLD_UP};
use crate::render::primitives::Camera;
use crate::render::registry::Store;
use crate::render::{RenderError, RenderResult};

/// Near clip plane shared by every camera
pub const NEAR_PLANE: f32 = 0.1;

/// Recompute stale camera matrices over a slot range
///
/// `aspect` is the window's width over height; `view_distance` is the far
/// clip plane.
pub fn update_cameras(
    cameras: &mut Store<Camera>,
    range: Range<usize>,
    aspect: f32,
    view_distance: f32,
) -> RenderResult<usize> {
    let mut updated = 0;
    for camera in cameras.slots_mut(range)?.iter_mut().flatten() {
        if camera.matrix_valid {
            continue;
        }
        refresh(camera, aspect, view_distance)?;
        updated += 1;
    }
    Ok(updated)
}

fn refresh(camera: &mut Camera, aspect: f32, view_distance: f32) -> RenderResult<()> {
    let forward = rotate_x_then_y(&Vec3::new(0.0, 0.0, 1.0), camera.pitch, camera.yaw);
    camera.eye = camera.focal_point - forward * camera.distance;

    // Looking straight up or down, fall back to the camera's own up axis.
    let up = if forward.dot(&WORLD_UP).abs() > 0.999 {
        rotate_x_then_y(&WORLD_UP, camera.pitch, camera.yaw)
    } else {
        WORLD_UP
    };

    camera.view = Mat4::look_at(camera.eye, camera.eye + forward, up);
    camera.projection = Mat4::perspective(camera.fov, aspect, NEAR_PLANE, view_distance);
    camera.view_projection = camera.projection * camera.view;
    camera.inverse_projection = camera
        .projection
        .try_inverse()
        .ok_or(RenderError::SingularMatrix("projection"))?;
    camera.matrix_valid = true;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::{Point3, Vec4};
    use crate::render::primitives::camera::DEFAULT_FOV;
    use approx::assert_relative_eq;

    #[test]
    fn test_eye_behind_focal_point() {
        let mut cameras = Store::new();
        let handle = cameras.add(Camera::new(Vec3::new(1.0, 2.0, 3.0), 0.0, 0.0, 10.0, DEFAULT_FOV));
        let range = cameras.full_range();
        update_cameras(&mut cameras, range, 4.0 / 3.0, 1000.0).unwrap();

        let camera = cameras.get(handle).unwrap();
        assert_relative_eq!(camera.eye(), Vec3::new(1.0, 2.0, -7.0), epsilon = 1e-5);

        // The focal point sits straight ahead, 10 units down -Z in view space.
        let focal = camera.view().transform_point(&Point3::new(1.0, 2.0, 3.0));
        assert_relative_eq!(focal, Point3::new(0.0, 0.0, -10.0), epsilon = 1e-4);
    }

    #[test]
    fn test_pitch_then_yaw_placement() {
        let mut cameras = Store::new();
        let pitch = -std::f32::consts::FRAC_PI_4;
        let yaw = std::f32::consts::FRAC_PI_2;
        let handle = cameras.add(Camera::new(Vec3::zeros(), yaw, pitch, 2.0_f32.sqrt(), DEFAULT_FOV));
        let range = cameras.full_range();
        update_cameras(&mut cameras, range, 1.0, 100.0).unwrap();

        // Forward after pitching up and yawing onto +X is (1, 1, 0)/sqrt(2); the eye sits opposite.
        let eye = cameras.get(handle).unwrap().eye();
        assert_relative_eq!(eye, Vec3::new(-1.0, -1.0, 0.0), epsilon = 1e-5);
    }

    #[test]
    fn test_cached_products() {
        let mut cameras = Store::new();
        let handle = cameras.add(Camera::new(Vec3::zeros(), 0.3, 0.2, 5.0, DEFAULT_FOV));
        let range = cameras.full_range();
        update_cameras(&mut cameras, range, 16.0 / 9.0, 500.0).unwrap();

        let camera = cameras.get(handle).unwrap();
        assert!(camera.matrix_valid());
        assert_relative_eq!(*camera.view_projection(), camera.projection() * camera.view(), epsilon = 1e-5);
        assert_relative_eq!(camera.inverse_projection() * camera.projection(), Mat4::identity(), epsilon = 1e-4);

        // A point on the far plane maps to depth 1.
        let far = camera.projection() * Vec4::new(0.0, 0.0, -500.0, 1.0);
        assert_relative_eq!(far.z / far.w, 1.0, epsilon = 1e-4);
    }

    #[test]
    fn test_zero_distance_and_vertical_look_stay_finite() {
        let mut cameras = Store::new();
        let a = cameras.add(Camera::default());
        let b = cameras.add(Camera::new(Vec3::zeros(), 0.0, std::f32::consts::FRAC_PI_2, 3.0, DEFAULT_FOV));
        let range = cameras.full_range();
        update_cameras(&mut cameras, range, 1.0, 100.0).unwrap();

        for handle in [a, b] {
            assert!(cameras.get(handle).unwrap().view().iter().all(|v| v.is_finite()));
        }
    }

    #[test]
    fn test_valid_cameras_are_skipped() {
        let mut cameras = Store::new();
        cameras.add(Camera::default());
        let range = cameras.full_range();
        assert_eq!(update_cameras(&mut cameras, range, 1.0, 100.0).unwrap(), 1);
        let range = cameras.full_range();
        assert_eq!(update_cameras(&mut cameras, range, 1.0, 100.0).unwrap(), 0);
    }
}
