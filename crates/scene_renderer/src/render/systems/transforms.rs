//! Object matrices
//!
//! The world transform depends only on the object. The normal matrix also
//! depends on the active camera's view, so it has its own validity flag and
//! is recomputed after the cameras.

use std::ops::Range;

use crate::foundation::math::{utils, Mat4, Mat4Ext};
use crate::render::primitives::Object;
use crate::render::registry::Store;
use crate::render::{RenderError, RenderResult};

/// Recompute stale world transforms over a slot range
pub fn update_object_matrices(objects: &mut Store<Object>, range: Range<usize>) -> RenderResult<usize> {
    let mut updated = 0;
    for object in objects.slots_mut(range)?.iter_mut().flatten() {
        if object.matrix_valid {
            continue;
        }
        refresh_world(object);
        updated += 1;
    }
    Ok(updated)
}

/// Recompute stale view-space normal matrices over a slot range
///
/// An object whose world transform is stale as well gets that recomputed
/// first.
pub fn update_inverse_model_view(objects: &mut Store<Object>, range: Range<usize>, view: &Mat4) -> RenderResult<usize> {
    let mut updated = 0;
    for object in objects.slots_mut(range)?.iter_mut().flatten() {
        if object.inverse_model_view_valid {
            continue;
        }
        if !object.matrix_valid {
            refresh_world(object);
        }

        let inverse = (view * object.transform)
            .try_inverse()
            .ok_or(RenderError::SingularMatrix("model-view"))?;
        object.normal_matrix = utils::upper_3x3(&inverse.transpose());
        object.inverse_model_view_valid = true;
        updated += 1;
    }
    Ok(updated)
}

fn refresh_world(object: &mut Object) {
    object.transform = Mat4::scale_rotate_translate(&object.scale, &object.rotation, &object.location);
    object.matrix_valid = true;
}
