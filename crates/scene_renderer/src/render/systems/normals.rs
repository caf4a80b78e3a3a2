//! Vertex normal generation
//!
//! Face normals are accumulated unnormalized, so larger faces weigh more in
//! the shared vertex normal. With the `cross(v2 - v1, v2 - v3)` convention a
//! counter-clockwise face yields an inward vector, which is flipped at the end.

use std::ops::Range;

use crate::foundation::math::Vec3;
use crate::render::primitives::Mesh;
use crate::render::registry::Store;
use crate::render::RenderResult;

/// Recompute normals of every `Dirty` mesh in a slot range
///
/// Returns how many meshes were recomputed.
pub fn update_normals(meshes: &mut Store<Mesh>, range: Range<usize>) -> RenderResult<usize> {
    let mut updated = 0;
    for mesh in meshes.slots_mut(range)?.iter_mut().flatten() {
        if mesh.state.cpu_ready() {
            continue;
        }
        compute_normals(mesh);
        mesh.state.mark_cpu_ready();
        updated += 1;
    }
    Ok(updated)
}

fn compute_normals(mesh: &mut Mesh) {
    mesh.normals.clear();
    mesh.normals.resize(mesh.vertices.len(), Vec3::zeros());

    for face in mesh.indices.chunks_exact(3) {
        let [a, b, c] = [face[0] as usize, face[1] as usize, face[2] as usize];
        let v1 = mesh.vertices[a].position;
        let v2 = mesh.vertices[b].position;
        let v3 = mesh.vertices[c].position;

        let normal = (v2 - v1).cross(&(v2 - v3));
        mesh.normals[a] += normal;
        mesh.normals[b] += normal;
        mesh.normals[c] += normal;
    }

    let mut degenerate = 0;
    for normal in &mut mesh.normals {
        match normal.try_normalize(f32::EPSILON) {
            Some(unit) => *normal = -unit,
            None => {
                *normal = Vec3::zeros();
                degenerate += 1;
            }
        }
    }
    if degenerate > 0 {
        log::warn!("{degenerate} vertices have no usable face normal");
    }
}
