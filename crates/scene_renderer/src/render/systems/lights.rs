//! Light shadow transforms
//!
//! The sun uses an orthographic box that follows the active camera's focal
//! point. Cone lights use a perspective frustum matching their cone.

use std::ops::Range;

use crate::foundation::math::{rotate_x_then_y, Mat4, Mat4Ext, Vec3, WORLD_UP};
use crate::render::primitives::{ConeLight, Sun};
use crate::render::registry::Store;
use crate::render::RenderResult;
use super::camera::NEAR_PLANE;

/// Half extent of the sun's orthographic shadow box
pub const SUN_SHADOW_HALF_EXTENT: f32 = 100.0;

/// Far plane of the sun's shadow box
pub const SUN_SHADOW_FAR: f32 = 1000.0;

/// Distance of the virtual sun position from the focal point
pub const SUN_SHADOW_DISTANCE: f32 = 500.0;

/// Unit vector towards the sun for the given angles
pub fn sun_direction(azimuth: f32, elevation: f32) -> Vec3 {
    rotate_x_then_y(&Vec3::new(0.0, 0.0, 1.0), -elevation, azimuth).normalize()
}

/// Look-at up vector that is never parallel to `direction`
fn up_for(direction: &Vec3) -> Vec3 {
    if direction.dot(&WORLD_UP).abs() > 0.999 {
        Vec3::new(0.0, 0.0, 1.0)
    } else {
        WORLD_UP
    }
}

/// Recompute the sun's direction and shadow transform if stale
///
/// Returns whether anything was recomputed.
pub fn update_sun(sun: &mut Sun, focal_point: Vec3) -> bool {
    if sun.matrix_valid {
        return false;
    }

    sun.direction = sun_direction(sun.azimuth, sun.elevation);
    let position = focal_point + sun.direction * SUN_SHADOW_DISTANCE;
    let view = Mat4::look_at(position, focal_point, up_for(&sun.direction));
    let projection = Mat4::orthographic(SUN_SHADOW_HALF_EXTENT, SUN_SHADOW_HALF_EXTENT, 0.0, SUN_SHADOW_FAR);

    sun.shadow_matrix = projection * view;
    sun.matrix_valid = true;
    true
}

/// Recompute stale cone-light shadow transforms over a slot range
///
/// Lights without shadows keep an identity transform.
pub fn update_cone_lights(lights: &mut Store<ConeLight>, range: Range<usize>, view_distance: f32) -> RenderResult<usize> {
    let mut updated = 0;
    for light in lights.slots_mut(range)?.iter_mut().flatten() {
        if light.matrix_valid {
            continue;
        }

        light.shadow_matrix = if light.shadow {
            let view = Mat4::look_at(light.location, light.location + light.direction, up_for(&light.direction));
            Mat4::perspective(light.fov, 1.0, NEAR_PLANE, view_distance) * view
        } else {
            Mat4::identity()
        };
        light.matrix_valid = true;
        updated += 1;
    }
    Ok(updated)
}
