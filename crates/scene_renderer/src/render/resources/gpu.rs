//! GPU realization of entity data
//!
//! Per entity kind: `ensure_*_allocated` creates the missing device objects
//! of a range in one batched call per object type, `upload_*` pushes CPU data
//! for entities whose GPU copy is stale and marks them uploaded, and
//! `release_*` frees what a deleted entity owned.

use std::ops::Range;

use crate::config::TextureFiltering;
use crate::render::api::{GraphicsDevice, TextureId, TextureParams, VertexLayout};
use crate::render::primitives::{FlatMesh, Mesh, MeshGpu, Realization, Text, Texture};
use crate::render::registry::Store;
use crate::render::RenderResult;

/// Sampling parameters for every texture upload
pub const fn texture_params(filtering: TextureFiltering) -> TextureParams {
    TextureParams {
        filtering,
        generate_mipmaps: true,
        clamp_to_edge: true,
    }
}

/// Allocate vertex arrays and buffer pairs for `count` meshes
fn allocate_mesh_objects<D: GraphicsDevice + ?Sized>(device: &mut D, count: usize) -> RenderResult<Vec<MeshGpu>> {
    if count == 0 {
        return Ok(Vec::new());
    }
    let arrays = device.create_vertex_arrays(count)?;
    let buffers = device.create_buffers(count * 2)?;
    log::debug!("Allocated GPU objects for {count} meshes");

    Ok(arrays
        .into_iter()
        .zip(buffers.chunks_exact(2))
        .map(|(vao, pair)| MeshGpu { vao, vertex_buffer: pair[0], index_buffer: pair[1] })
        .collect())
}

fn free_mesh_objects<D: GraphicsDevice + ?Sized>(device: &mut D, gpu: MeshGpu) {
    device.delete_vertex_arrays(&[gpu.vao]);
    device.delete_buffers(&[gpu.vertex_buffer, gpu.index_buffer]);
}

fn allocate_textures<D: GraphicsDevice + ?Sized>(device: &mut D, count: usize) -> RenderResult<Vec<TextureId>> {
    if count == 0 {
        return Ok(Vec::new());
    }
    let ids = device.create_textures(count)?;
    log::debug!("Allocated {count} textures");
    Ok(ids)
}

// Meshes

/// Allocate device objects for meshes in range that have none
pub fn ensure_meshes_allocated<D: GraphicsDevice + ?Sized>(
    device: &mut D,
    meshes: &mut Store<Mesh>,
    range: Range<usize>,
) -> RenderResult<usize> {
    let slots = meshes.slots_mut(range)?;
    let missing = slots.iter().flatten().filter(|m| m.gpu.is_none()).count();
    let mut fresh = allocate_mesh_objects(device, missing)?.into_iter();

    for mesh in slots.iter_mut().flatten().filter(|m| m.gpu.is_none()) {
        mesh.gpu = fresh.next();
    }
    Ok(missing)
}

/// Upload meshes in range whose normals are current but whose GPU copy is not
///
/// Vertices are interleaved with their normals here, not at edit time.
pub fn upload_meshes<D: GraphicsDevice + ?Sized>(
    device: &mut D,
    meshes: &mut Store<Mesh>,
    range: Range<usize>,
) -> RenderResult<usize> {
    let mut uploaded = 0;
    for mesh in meshes.slots_mut(range)?.iter_mut().flatten() {
        if mesh.state != Realization::CpuReady {
            continue;
        }
        let Some(gpu) = mesh.gpu else { continue };

        let vertices = mesh.interleaved();
        device.upload_geometry(
            gpu.vao,
            gpu.vertex_buffer,
            gpu.index_buffer,
            VertexLayout::Mesh,
            bytemuck::cast_slice(&vertices),
            &mesh.indices,
        )?;
        mesh.state.mark_uploaded();
        uploaded += 1;
    }
    Ok(uploaded)
}

/// Free the device objects of a mesh
pub fn release_mesh<D: GraphicsDevice + ?Sized>(device: &mut D, mesh: &Mesh) {
    if let Some(gpu) = mesh.gpu {
        free_mesh_objects(device, gpu);
    }
}

// Textures

/// Allocate device textures for textures in range that have none
pub fn ensure_textures_allocated<D: GraphicsDevice + ?Sized>(
    device: &mut D,
    textures: &mut Store<Texture>,
    range: Range<usize>,
) -> RenderResult<usize> {
    let slots = textures.slots_mut(range)?;
    let missing = slots.iter().flatten().filter(|t| t.gpu.is_none()).count();
    let mut fresh = allocate_textures(device, missing)?.into_iter();

    for texture in slots.iter_mut().flatten().filter(|t| t.gpu.is_none()) {
        texture.gpu = fresh.next();
    }
    Ok(missing)
}

/// Upload textures in range whose GPU copy is stale
pub fn upload_textures<D: GraphicsDevice + ?Sized>(
    device: &mut D,
    textures: &mut Store<Texture>,
    range: Range<usize>,
    filtering: TextureFiltering,
) -> RenderResult<usize> {
    let params = texture_params(filtering);
    let mut uploaded = 0;
    for texture in textures.slots_mut(range)?.iter_mut().flatten() {
        if texture.uploaded {
            continue;
        }
        let Some(id) = texture.gpu else { continue };

        device.upload_texture(id, texture.width, texture.height, &texture.pixels, &params)?;
        texture.uploaded = true;
        uploaded += 1;
    }
    Ok(uploaded)
}

/// Re-apply a filter to every uploaded texture
pub fn apply_texture_filtering<D: GraphicsDevice + ?Sized>(
    device: &mut D,
    textures: &Store<Texture>,
    filtering: TextureFiltering,
) -> RenderResult<()> {
    for (_, texture) in textures.iter() {
        if let (true, Some(id)) = (texture.uploaded, texture.gpu) {
            device.set_texture_filtering(id, filtering)?;
        }
    }
    Ok(())
}

/// Free the device texture of a texture
pub fn release_texture<D: GraphicsDevice + ?Sized>(device: &mut D, texture: &Texture) {
    if let Some(id) = texture.gpu {
        device.delete_textures(&[id]);
    }
}

// Flat meshes

/// Allocate device objects for flat meshes in range that have none
pub fn ensure_flat_meshes_allocated<D: GraphicsDevice + ?Sized>(
    device: &mut D,
    flat_meshes: &mut Store<FlatMesh>,
    range: Range<usize>,
) -> RenderResult<usize> {
    let slots = flat_meshes.slots_mut(range)?;
    let missing = slots.iter().flatten().filter(|m| m.gpu.is_none()).count();
    let mut fresh = allocate_mesh_objects(device, missing)?.into_iter();

    for mesh in slots.iter_mut().flatten().filter(|m| m.gpu.is_none()) {
        mesh.gpu = fresh.next();
    }
    Ok(missing)
}

/// Upload flat meshes in range whose GPU copy is stale
pub fn upload_flat_meshes<D: GraphicsDevice + ?Sized>(
    device: &mut D,
    flat_meshes: &mut Store<FlatMesh>,
    range: Range<usize>,
) -> RenderResult<usize> {
    let mut uploaded = 0;
    for mesh in flat_meshes.slots_mut(range)?.iter_mut().flatten() {
        if mesh.uploaded {
            continue;
        }
        let Some(gpu) = mesh.gpu else { continue };

        device.upload_geometry(
            gpu.vao,
            gpu.vertex_buffer,
            gpu.index_buffer,
            VertexLayout::Flat,
            bytemuck::cast_slice(&mesh.vertices),
            &mesh.indices,
        )?;
        mesh.uploaded = true;
        uploaded += 1;
    }
    Ok(uploaded)
}

/// Free the device objects of a flat mesh
pub fn release_flat_mesh<D: GraphicsDevice + ?Sized>(device: &mut D, mesh: &FlatMesh) {
    if let Some(gpu) = mesh.gpu {
        free_mesh_objects(device, gpu);
    }
}

// Text textures

/// Allocate device textures for rasterized texts in range that have none
pub fn ensure_text_textures_allocated<D: GraphicsDevice + ?Sized>(
    device: &mut D,
    texts: &mut Store<Text>,
    range: Range<usize>,
) -> RenderResult<usize> {
    let needs_texture = |t: &Text| t.gpu.is_none() && t.state.cpu_ready() && !t.is_blank();

    let slots = texts.slots_mut(range)?;
    let missing = slots.iter().flatten().filter(|t| needs_texture(t)).count();
    let mut fresh = allocate_textures(device, missing)?.into_iter();

    for text in slots.iter_mut().flatten().filter(|t| needs_texture(t)) {
        text.gpu = fresh.next();
    }
    Ok(missing)
}

/// Upload rasterized texts in range whose texture is stale
///
/// Blank texts have nothing to upload, count as uploaded and give back any
/// texture left from an earlier string.
pub fn upload_text_textures<D: GraphicsDevice + ?Sized>(
    device: &mut D,
    texts: &mut Store<Text>,
    range: Range<usize>,
    filtering: TextureFiltering,
) -> RenderResult<usize> {
    let params = texture_params(filtering);
    let mut uploaded = 0;
    for text in texts.slots_mut(range)?.iter_mut().flatten() {
        if text.state != Realization::CpuReady {
            continue;
        }
        if text.is_blank() {
            if let Some(stale) = text.gpu.take() {
                device.delete_textures(&[stale]);
            }
        } else {
            let Some(id) = text.gpu else { continue };
            device.upload_texture(id, text.width, text.height, &text.pixels, &params)?;
            uploaded += 1;
        }
        text.state.mark_uploaded();
    }
    Ok(uploaded)
}

/// Free the device texture of a text
pub fn release_text<D: GraphicsDevice + ?Sized>(device: &mut D, text: &Text) {
    if let Some(id) = text.gpu {
        device.delete_textures(&[id]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::backends::{DeviceCall, RecordingDevice, ResourceKind};
    use crate::render::systems::update_normals;

    #[test]
    fn test_mesh_allocation_is_batched() {
        let mut device = RecordingDevice::new();
        let mut meshes = Store::new();
        for _ in 0..3 {
            meshes.add(Mesh::cube());
        }

        let range = meshes.full_range();
        assert_eq!(ensure_meshes_allocated(&mut device, &mut meshes, range).unwrap(), 3);
        assert_eq!(
            device.calls(),
            &[DeviceCall::CreateVertexArrays(3), DeviceCall::CreateBuffers(6)]
        );

        // Second pass has nothing to allocate and issues no calls.
        device.clear_calls();
        let range = meshes.full_range();
        assert_eq!(ensure_meshes_allocated(&mut device, &mut meshes, range).unwrap(), 0);
        assert!(device.calls().is_empty());
    }

    #[test]
    fn test_mesh_upload_waits_for_normals_and_runs_once() {
        let mut device = RecordingDevice::new();
        let mut meshes = Store::new();
        let handle = meshes.add(Mesh::cube());
        let range = meshes.full_range();
        ensure_meshes_allocated(&mut device, &mut meshes, range.clone()).unwrap();

        assert_eq!(upload_meshes(&mut device, &mut meshes, range.clone()).unwrap(), 0);

        update_normals(&mut meshes, range.clone()).unwrap();
        assert_eq!(upload_meshes(&mut device, &mut meshes, range.clone()).unwrap(), 1);
        assert_eq!(upload_meshes(&mut device, &mut meshes, range).unwrap(), 0);
        assert!(meshes.get(handle).unwrap().uploaded());

        let uploads: Vec<_> = device
            .calls()
            .iter()
            .filter_map(|c| match c {
                DeviceCall::UploadGeometry { vertex_bytes, index_count, .. } => Some((*vertex_bytes, *index_count)),
                _ => None,
            })
            .collect();
        assert_eq!(uploads, vec![(8 * 32, 36)]);
    }

    #[test]
    fn test_texture_upload_params() {
        let mut device = RecordingDevice::new();
        let mut textures = Store::new();
        textures.add(Texture::new(1, 1, vec![255; 4]).unwrap());
        let range = textures.full_range();
        ensure_textures_allocated(&mut device, &mut textures, range.clone()).unwrap();
        upload_textures(&mut device, &mut textures, range, TextureFiltering::Bilinear).unwrap();

        let params = device.calls().iter().find_map(|c| match c {
            DeviceCall::UploadTexture { params, .. } => Some(*params),
            _ => None,
        });
        assert_eq!(
            params,
            Some(TextureParams { filtering: TextureFiltering::Bilinear, generate_mipmaps: true, clamp_to_edge: true })
        );
    }

    #[test]
    fn test_release_frees_everything() {
        let mut device = RecordingDevice::new();
        let mut meshes = Store::new();
        let handle = meshes.add(Mesh::cube());
        let range = meshes.full_range();
        ensure_meshes_allocated(&mut device, &mut meshes, range).unwrap();

        let mesh = meshes.remove(handle).unwrap();
        release_mesh(&mut device, &mesh);
        assert_eq!(device.live(ResourceKind::VertexArray), 0);
        assert_eq!(device.live(ResourceKind::Buffer), 0);
    }

    #[test]
    fn test_range_is_checked_before_allocating() {
        let mut device = RecordingDevice::new();
        let mut meshes = Store::new();
        meshes.add(Mesh::cube());
        assert!(ensure_meshes_allocated(&mut device, &mut meshes, 0..5).is_err());
        assert!(device.calls().is_empty());
    }
}
