//! Garbage collection of shared resources
//!
//! Meshes, textures and flat meshes flagged collectable are deleted once no
//! live object or UI element references them. Unflagged resources stay alive
//! until deleted explicitly.

use std::collections::HashSet;

use crate::render::api::GraphicsDevice;
use crate::render::registry::{Entity, Handle, Store};
use crate::render::resources::gpu;
use crate::render::scene::Scene;

fn unreferenced<T: Entity>(
    store: &Store<T>,
    collectable: impl Fn(&T) -> bool,
    referenced: &HashSet<Handle<T>>,
) -> Vec<Handle<T>> {
    store
        .iter()
        .filter(|(handle, record)| collectable(record) && !referenced.contains(handle))
        .map(|(handle, _)| handle)
        .collect()
}

/// Delete unreferenced collectable resources, returning how many went
pub fn collect_garbage<D: GraphicsDevice + ?Sized>(device: &mut D, scene: &mut Scene) -> usize {
    let mut meshes = HashSet::new();
    let mut textures = HashSet::new();
    let mut flat_meshes = HashSet::new();
    for (_, object) in scene.objects.iter() {
        meshes.insert(object.mesh);
        textures.extend(object.texture);
    }
    for (_, element) in scene.ui_elements.iter() {
        flat_meshes.insert(element.flat_mesh);
        textures.extend(element.texture);
    }

    let mut collected = 0;
    for handle in unreferenced(&scene.meshes, |m| m.collectable, &meshes) {
        if let Ok(mesh) = scene.meshes.remove(handle) {
            gpu::release_mesh(device, &mesh);
            collected += 1;
        }
    }
    for handle in unreferenced(&scene.textures, |t| t.collectable, &textures) {
        if let Ok(texture) = scene.textures.remove(handle) {
            gpu::release_texture(device, &texture);
            collected += 1;
        }
    }
    for handle in unreferenced(&scene.flat_meshes, |m| m.collectable, &flat_meshes) {
        if let Ok(mesh) = scene.flat_meshes.remove(handle) {
            gpu::release_flat_mesh(device, &mesh);
            collected += 1;
        }
    }

    if collected > 0 {
        log::debug!("Garbage collected {collected} resources");
    }
    collected
}
