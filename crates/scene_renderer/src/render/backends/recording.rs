//! Headless recording device
//!
//! Implements [`GraphicsDevice`] without a GPU. Every call is appended to a
//! log that tests and tools inspect, and the device enforces the ordering
//! rules a real driver would trip over: ids must be allocated before they are
//! used, vertex data and textures must be uploaded before a draw reads them,
//! framebuffers must be complete to be bound and timer queries must nest
//! properly.

use std::time::Instant;

use slotmap::{new_key_type, Key, KeyData, SlotMap};

use crate::config::TextureFiltering;
use crate::render::api::{
    BufferId, ClearFlags, DeviceError, DeviceResult, FramebufferDesc, FramebufferId,
    FramebufferStatus, GraphicsDevice, ProgramId, QueryResult, RenderState, RenderTargetDesc,
    TextureId, TextureParams, TimerRegion, UniformValue, VertexArrayId, VertexLayout,
};

new_key_type! {
    struct ResourceKey;
}

/// Kind of a device resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    /// Vertex or index buffer
    Buffer,
    /// Texture
    Texture,
    /// Vertex array
    VertexArray,
    /// Shader program
    Program,
    /// Framebuffer
    Framebuffer,
}

impl ResourceKind {
    const fn name(self) -> &'static str {
        match self {
            Self::Buffer => "buffer",
            Self::Texture => "texture",
            Self::VertexArray => "vertex array",
            Self::Program => "program",
            Self::Framebuffer => "framebuffer",
        }
    }
}

#[derive(Debug)]
struct Resource {
    kind: ResourceKind,
    label: String,
    /// Holds data: uploaded buffer/texture, render-target storage, linked program
    ready: bool,
    status: FramebufferStatus,
}

impl Resource {
    fn new(kind: ResourceKind) -> Self {
        Self {
            kind,
            label: String::new(),
            ready: false,
            status: FramebufferStatus::Complete,
        }
    }
}

/// One recorded device call
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceCall {
    /// Buffers allocated in one batch
    CreateBuffers(usize),
    /// Textures allocated in one batch
    CreateTextures(usize),
    /// Vertex arrays allocated in one batch
    CreateVertexArrays(usize),
    /// Buffers freed
    DeleteBuffers(Vec<BufferId>),
    /// Textures freed
    DeleteTextures(Vec<TextureId>),
    /// Vertex arrays freed
    DeleteVertexArrays(Vec<VertexArrayId>),
    /// Geometry uploaded into a vertex array
    UploadGeometry {
        /// Target vertex array
        vao: VertexArrayId,
        /// Vertex format
        layout: VertexLayout,
        /// Vertex byte count
        vertex_bytes: usize,
        /// Index count
        index_count: usize,
    },
    /// Pixels uploaded into a texture
    UploadTexture {
        /// Target texture
        id: TextureId,
        /// Width in pixels
        width: u32,
        /// Height in pixels
        height: u32,
        /// Sampling parameters
        params: TextureParams,
    },
    /// Filter changed on an uploaded texture
    SetTextureFiltering {
        /// Target texture
        id: TextureId,
        /// New filter
        filtering: TextureFiltering,
    },
    /// Render-target storage allocated
    AllocateRenderTarget {
        /// Target texture
        id: TextureId,
        /// Storage description
        desc: RenderTargetDesc,
    },
    /// Framebuffer created
    CreateFramebuffer {
        /// Debug label
        label: &'static str,
        /// New id
        id: FramebufferId,
    },
    /// Framebuffer freed
    DeleteFramebuffer(FramebufferId),
    /// Draw target changed; label `"backbuffer"` for the default target
    BindFramebuffer(String),
    /// Colour copied between framebuffers
    BlitFramebuffer {
        /// Source
        source: FramebufferId,
        /// Destination, `None` for the backbuffer
        destination: Option<FramebufferId>,
    },
    /// Program compiled and linked
    CompileProgram(String),
    /// Program freed
    DeleteProgram(ProgramId),
    /// Program made current
    UseProgram(String),
    /// Uniform set on the current program
    SetUniform {
        /// Uniform name
        name: String,
        /// Value
        value: UniformValue,
    },
    /// Texture bound to a unit
    BindTexture {
        /// Sampler unit
        unit: u32,
        /// Texture
        id: TextureId,
    },
    /// Vertex array bound
    BindVertexArray(VertexArrayId),
    /// Viewport set
    SetViewport(u32, u32),
    /// Fixed-function state set
    SetRenderState(RenderState),
    /// Bound target cleared
    Clear(ClearFlags),
    /// Indexed draw with the current program
    DrawIndexed {
        /// Label of the program that drew
        program: String,
        /// Index count
        index_count: u32,
    },
    /// Timer query started
    BeginQuery(TimerRegion),
    /// Timer query stopped
    EndQuery(TimerRegion),
    /// Frame presented
    Present,
}

struct ActiveQuery {
    region: TimerRegion,
    started: Instant,
    primitives: u64,
}

/// Graphics device that records instead of rendering
pub struct RecordingDevice {
    resources: SlotMap<ResourceKey, Resource>,
    calls: Vec<DeviceCall>,
    current_program: Option<ResourceKey>,
    current_vertex_array: Option<ResourceKey>,
    active_query: Option<ActiveQuery>,
    query_results: [Option<QueryResult>; TimerRegion::ALL.len()],
    frames_presented: u64,
    failing_framebuffer: Option<&'static str>,
    failing_program: Option<String>,
}

impl Default for RecordingDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingDevice {
    /// Create an empty device
    pub fn new() -> Self {
        Self {
            resources: SlotMap::with_key(),
            calls: Vec::new(),
            current_program: None,
            current_vertex_array: None,
            active_query: None,
            query_results: [None; TimerRegion::ALL.len()],
            frames_presented: 0,
            failing_framebuffer: None,
            failing_program: None,
        }
    }

    /// Report the framebuffer with this label as incomplete
    pub fn fail_framebuffer(&mut self, label: &'static str) {
        self.failing_framebuffer = Some(label);
    }

    /// Fail compilation of the program with this label
    pub fn fail_program(&mut self, label: impl Into<String>) {
        self.failing_program = Some(label.into());
    }

    /// Every call since creation or the last [`RecordingDevice::clear_calls`]
    pub fn calls(&self) -> &[DeviceCall] {
        &self.calls
    }

    /// Forget the recorded calls; resources stay alive
    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    /// Program labels of the recorded draws, in order
    pub fn draw_sequence(&self) -> Vec<&str> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                DeviceCall::DrawIndexed { program, .. } => Some(program.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Number of live resources of one kind
    pub fn live(&self, kind: ResourceKind) -> usize {
        self.resources.values().filter(|r| r.kind == kind).count()
    }

    /// Frames presented so far
    pub const fn frames_presented(&self) -> u64 {
        self.frames_presented
    }

    fn allocate(&mut self, kind: ResourceKind, count: usize) -> Vec<u64> {
        (0..count)
            .map(|_| self.resources.insert(Resource::new(kind)).data().as_ffi())
            .collect()
    }

    fn key(id: u64) -> ResourceKey {
        ResourceKey::from(KeyData::from_ffi(id))
    }

    fn lookup(&self, kind: ResourceKind, id: u64) -> DeviceResult<&Resource> {
        self.resources
            .get(Self::key(id))
            .filter(|r| r.kind == kind)
            .ok_or(DeviceError::UnknownResource { kind: kind.name(), id })
    }

    fn lookup_mut(&mut self, kind: ResourceKind, id: u64) -> DeviceResult<&mut Resource> {
        self.resources
            .get_mut(Self::key(id))
            .filter(|r| r.kind == kind)
            .ok_or(DeviceError::UnknownResource { kind: kind.name(), id })
    }

    fn release(&mut self, kind: ResourceKind, ids: impl IntoIterator<Item = u64>) {
        for id in ids {
            let key = Self::key(id);
            if self.resources.get(key).is_some_and(|r| r.kind == kind) {
                self.resources.remove(key);
            } else {
                log::warn!("Deleting unknown {} {}", kind.name(), id);
            }
            if self.current_program == Some(key) {
                self.current_program = None;
            }
            if self.current_vertex_array == Some(key) {
                self.current_vertex_array = None;
            }
        }
    }
}

impl GraphicsDevice for RecordingDevice {
    fn create_buffers(&mut self, count: usize) -> DeviceResult<Vec<BufferId>> {
        self.calls.push(DeviceCall::CreateBuffers(count));
        Ok(self.allocate(ResourceKind::Buffer, count).into_iter().map(BufferId).collect())
    }

    fn create_textures(&mut self, count: usize) -> DeviceResult<Vec<TextureId>> {
        self.calls.push(DeviceCall::CreateTextures(count));
        Ok(self.allocate(ResourceKind::Texture, count).into_iter().map(TextureId).collect())
    }

    fn create_vertex_arrays(&mut self, count: usize) -> DeviceResult<Vec<VertexArrayId>> {
        self.calls.push(DeviceCall::CreateVertexArrays(count));
        Ok(self.allocate(ResourceKind::VertexArray, count).into_iter().map(VertexArrayId).collect())
    }

    fn delete_buffers(&mut self, ids: &[BufferId]) {
        self.calls.push(DeviceCall::DeleteBuffers(ids.to_vec()));
        self.release(ResourceKind::Buffer, ids.iter().map(|id| id.0));
    }

    fn delete_textures(&mut self, ids: &[TextureId]) {
        self.calls.push(DeviceCall::DeleteTextures(ids.to_vec()));
        self.release(ResourceKind::Texture, ids.iter().map(|id| id.0));
    }

    fn delete_vertex_arrays(&mut self, ids: &[VertexArrayId]) {
        self.calls.push(DeviceCall::DeleteVertexArrays(ids.to_vec()));
        self.release(ResourceKind::VertexArray, ids.iter().map(|id| id.0));
    }

    fn upload_geometry(
        &mut self,
        vao: VertexArrayId,
        vertex_buffer: BufferId,
        index_buffer: BufferId,
        layout: VertexLayout,
        vertices: &[u8],
        indices: &[u32],
    ) -> DeviceResult<()> {
        if vertices.len() % layout.stride() != 0 {
            return Err(DeviceError::InvalidState(format!(
                "{} vertex bytes do not divide into {:?} vertices",
                vertices.len(),
                layout
            )));
        }
        self.lookup_mut(ResourceKind::Buffer, vertex_buffer.0)?.ready = true;
        self.lookup_mut(ResourceKind::Buffer, index_buffer.0)?.ready = true;
        self.lookup_mut(ResourceKind::VertexArray, vao.0)?.ready = true;

        self.calls.push(DeviceCall::UploadGeometry {
            vao,
            layout,
            vertex_bytes: vertices.len(),
            index_count: indices.len(),
        });
        Ok(())
    }

    fn upload_texture(
        &mut self,
        id: TextureId,
        width: u32,
        height: u32,
        rgba: &[u8],
        params: &TextureParams,
    ) -> DeviceResult<()> {
        if rgba.len() != width as usize * height as usize * 4 {
            return Err(DeviceError::InvalidState(format!(
                "{} bytes for a {width}x{height} RGBA texture",
                rgba.len()
            )));
        }
        self.lookup_mut(ResourceKind::Texture, id.0)?.ready = true;
        self.calls.push(DeviceCall::UploadTexture { id, width, height, params: *params });
        Ok(())
    }

    fn set_texture_filtering(&mut self, id: TextureId, filtering: TextureFiltering) -> DeviceResult<()> {
        if !self.lookup(ResourceKind::Texture, id.0)?.ready {
            return Err(DeviceError::InvalidState(format!("texture {} has no storage", id.0)));
        }
        self.calls.push(DeviceCall::SetTextureFiltering { id, filtering });
        Ok(())
    }

    fn allocate_render_target(&mut self, id: TextureId, desc: &RenderTargetDesc) -> DeviceResult<()> {
        if desc.width == 0 || desc.height == 0 {
            return Err(DeviceError::InvalidState(format!(
                "render target {}x{} has no area",
                desc.width, desc.height
            )));
        }
        self.lookup_mut(ResourceKind::Texture, id.0)?.ready = true;
        self.calls.push(DeviceCall::AllocateRenderTarget { id, desc: *desc });
        Ok(())
    }

    fn create_framebuffer(&mut self, desc: &FramebufferDesc) -> DeviceResult<FramebufferId> {
        let attachments = desc.color.iter().copied().chain(desc.depth);
        let mut status = FramebufferStatus::Complete;
        for attachment in attachments {
            if !self.lookup(ResourceKind::Texture, attachment.0)?.ready {
                status = FramebufferStatus::Incomplete(format!("attachment {} has no storage", attachment.0));
            }
        }
        if desc.color.is_empty() && desc.depth.is_none() {
            status = FramebufferStatus::Incomplete("no attachments".to_string());
        }
        if self.failing_framebuffer == Some(desc.label) {
            status = FramebufferStatus::Incomplete("forced failure".to_string());
        }

        let mut resource = Resource::new(ResourceKind::Framebuffer);
        resource.label = desc.label.to_string();
        resource.ready = status == FramebufferStatus::Complete;
        resource.status = status;
        let id = FramebufferId(self.resources.insert(resource).data().as_ffi());

        self.calls.push(DeviceCall::CreateFramebuffer { label: desc.label, id });
        Ok(id)
    }

    fn framebuffer_status(&self, id: FramebufferId) -> FramebufferStatus {
        self.lookup(ResourceKind::Framebuffer, id.0)
            .map_or_else(|e| FramebufferStatus::Incomplete(e.to_string()), |r| r.status.clone())
    }

    fn delete_framebuffer(&mut self, id: FramebufferId) {
        self.calls.push(DeviceCall::DeleteFramebuffer(id));
        self.release(ResourceKind::Framebuffer, [id.0]);
    }

    fn bind_framebuffer(&mut self, target: Option<FramebufferId>) -> DeviceResult<()> {
        let label = match target {
            Some(id) => {
                let resource = self.lookup(ResourceKind::Framebuffer, id.0)?;
                if !resource.ready {
                    return Err(DeviceError::InvalidState(format!(
                        "framebuffer '{}' is incomplete",
                        resource.label
                    )));
                }
                resource.label.clone()
            }
            None => "backbuffer".to_string(),
        };
        self.calls.push(DeviceCall::BindFramebuffer(label));
        Ok(())
    }

    fn blit_framebuffer(
        &mut self,
        source: FramebufferId,
        destination: Option<FramebufferId>,
        _source_size: (u32, u32),
        _destination_size: (u32, u32),
    ) -> DeviceResult<()> {
        self.lookup(ResourceKind::Framebuffer, source.0)?;
        if let Some(destination) = destination {
            self.lookup(ResourceKind::Framebuffer, destination.0)?;
        }
        self.calls.push(DeviceCall::BlitFramebuffer { source, destination });
        Ok(())
    }

    fn compile_program(&mut self, label: &str, vertex_source: &str, fragment_source: &str) -> DeviceResult<ProgramId> {
        if self.failing_program.as_deref() == Some(label) {
            return Err(DeviceError::ShaderCompilation {
                label: label.to_string(),
                log: "forced failure".to_string(),
            });
        }
        if vertex_source.trim().is_empty() || fragment_source.trim().is_empty() {
            return Err(DeviceError::ShaderCompilation {
                label: label.to_string(),
                log: "empty shader source".to_string(),
            });
        }

        let mut resource = Resource::new(ResourceKind::Program);
        resource.label = label.to_string();
        resource.ready = true;
        let id = ProgramId(self.resources.insert(resource).data().as_ffi());

        self.calls.push(DeviceCall::CompileProgram(label.to_string()));
        Ok(id)
    }

    fn delete_program(&mut self, id: ProgramId) {
        self.calls.push(DeviceCall::DeleteProgram(id));
        self.release(ResourceKind::Program, [id.0]);
    }

    fn use_program(&mut self, id: ProgramId) -> DeviceResult<()> {
        let label = self.lookup(ResourceKind::Program, id.0)?.label.clone();
        self.current_program = Some(Self::key(id.0));
        self.calls.push(DeviceCall::UseProgram(label));
        Ok(())
    }

    fn set_uniform(&mut self, name: &str, value: UniformValue) -> DeviceResult<()> {
        if self.current_program.is_none() {
            return Err(DeviceError::InvalidState(format!("uniform '{name}' set without a program")));
        }
        self.calls.push(DeviceCall::SetUniform { name: name.to_string(), value });
        Ok(())
    }

    fn bind_texture(&mut self, unit: u32, id: TextureId) -> DeviceResult<()> {
        if !self.lookup(ResourceKind::Texture, id.0)?.ready {
            return Err(DeviceError::InvalidState(format!("texture {} bound before upload", id.0)));
        }
        self.calls.push(DeviceCall::BindTexture { unit, id });
        Ok(())
    }

    fn bind_vertex_array(&mut self, id: VertexArrayId) -> DeviceResult<()> {
        self.lookup(ResourceKind::VertexArray, id.0)?;
        self.current_vertex_array = Some(Self::key(id.0));
        self.calls.push(DeviceCall::BindVertexArray(id));
        Ok(())
    }

    fn set_viewport(&mut self, width: u32, height: u32) {
        self.calls.push(DeviceCall::SetViewport(width, height));
    }

    fn set_render_state(&mut self, state: RenderState) {
        self.calls.push(DeviceCall::SetRenderState(state));
    }

    fn clear(&mut self, flags: ClearFlags, _color: [f32; 4]) {
        self.calls.push(DeviceCall::Clear(flags));
    }

    fn draw_indexed(&mut self, index_count: u32) -> DeviceResult<()> {
        let program = self
            .current_program
            .and_then(|key| self.resources.get(key))
            .map(|r| r.label.clone())
            .ok_or_else(|| DeviceError::InvalidState("draw without a program".to_string()))?;
        let geometry_ready = self
            .current_vertex_array
            .and_then(|key| self.resources.get(key))
            .is_some_and(|r| r.ready);
        if !geometry_ready {
            return Err(DeviceError::InvalidState(format!("'{program}' drew before geometry upload")));
        }

        if let Some(query) = &mut self.active_query {
            query.primitives += u64::from(index_count / 3);
        }
        self.calls.push(DeviceCall::DrawIndexed { program, index_count });
        Ok(())
    }

    fn begin_query(&mut self, region: TimerRegion) -> DeviceResult<()> {
        if let Some(active) = &self.active_query {
            return Err(DeviceError::QueryMismatch(format!(
                "'{}' began while '{}' is active",
                region.name(),
                active.region.name()
            )));
        }
        self.active_query = Some(ActiveQuery { region, started: Instant::now(), primitives: 0 });
        self.calls.push(DeviceCall::BeginQuery(region));
        Ok(())
    }

    fn end_query(&mut self, region: TimerRegion) -> DeviceResult<()> {
        match self.active_query.take() {
            Some(active) if active.region == region => {
                self.query_results[region.index()] = Some(QueryResult {
                    elapsed: active.started.elapsed(),
                    primitives: active.primitives,
                });
                self.calls.push(DeviceCall::EndQuery(region));
                Ok(())
            }
            Some(active) => {
                let message = format!("'{}' ended while '{}' is active", region.name(), active.region.name());
                self.active_query = Some(active);
                Err(DeviceError::QueryMismatch(message))
            }
            None => Err(DeviceError::QueryMismatch(format!("'{}' ended without a begin", region.name()))),
        }
    }

    fn query_result(&mut self, region: TimerRegion) -> Option<QueryResult> {
        self.query_results[region.index()]
    }

    fn present(&mut self) -> DeviceResult<()> {
        if let Some(active) = &self.active_query {
            return Err(DeviceError::QueryMismatch(format!(
                "presented with '{}' still active",
                active.region.name()
            )));
        }
        self.frames_presented += 1;
        self.calls.push(DeviceCall::Present);
        Ok(())
    }
}

impl std::fmt::Debug for RecordingDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordingDevice")
            .field("resources", &self.resources.len())
            .field("calls", &self.calls.len())
            .field("frames_presented", &self.frames_presented)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::api::TextureFormat;

    #[test]
    fn test_ids_are_distinct_across_kinds() {
        let mut device = RecordingDevice::new();
        let buffers = device.create_buffers(2).unwrap();
        let textures = device.create_textures(1).unwrap();
        assert_ne!(buffers[0].0, buffers[1].0);
        assert_ne!(buffers[0].0, textures[0].0);
        assert_eq!(device.live(ResourceKind::Buffer), 2);
        assert_eq!(device.calls()[0], DeviceCall::CreateBuffers(2));
    }

    #[test]
    fn test_wrong_kind_is_unknown() {
        let mut device = RecordingDevice::new();
        let buffer = device.create_buffers(1).unwrap()[0];
        let err = device.bind_texture(0, TextureId(buffer.0)).unwrap_err();
        assert!(matches!(err, DeviceError::UnknownResource { kind: "texture", .. }));
    }

    #[test]
    fn test_deleted_ids_are_unknown() {
        let mut device = RecordingDevice::new();
        let vao = device.create_vertex_arrays(1).unwrap()[0];
        device.delete_vertex_arrays(&[vao]);
        assert!(device.bind_vertex_array(vao).is_err());
        assert_eq!(device.live(ResourceKind::VertexArray), 0);
    }

    #[test]
    fn test_draw_requires_uploaded_geometry() {
        let mut device = RecordingDevice::new();
        let program = device.compile_program("p", "void main() {}", "void main() {}").unwrap();
        let vao = device.create_vertex_arrays(1).unwrap()[0];
        let buffers = device.create_buffers(2).unwrap();
        device.use_program(program).unwrap();
        device.bind_vertex_array(vao).unwrap();
        assert!(device.draw_indexed(3).is_err());

        device
            .upload_geometry(vao, buffers[0], buffers[1], VertexLayout::Flat, &[0; 48], &[0, 1, 2])
            .unwrap();
        device.draw_indexed(3).unwrap();
        assert_eq!(device.draw_sequence(), vec!["p"]);
    }

    #[test]
    fn test_queries_must_pair() {
        let mut device = RecordingDevice::new();
        assert!(device.end_query(TimerRegion::Geometry).is_err());
        device.begin_query(TimerRegion::Geometry).unwrap();
        assert!(device.begin_query(TimerRegion::Lighting).is_err());
        assert!(device.end_query(TimerRegion::Lighting).is_err());
        assert!(device.present().is_err());
        device.end_query(TimerRegion::Geometry).unwrap();
        assert!(device.query_result(TimerRegion::Geometry).is_some());
        assert!(device.query_result(TimerRegion::Lighting).is_none());
        device.present().unwrap();
        assert_eq!(device.frames_presented(), 1);
    }

    #[test]
    fn test_framebuffer_completeness() {
        let mut device = RecordingDevice::new();
        let textures = device.create_textures(2).unwrap();
        let desc = RenderTargetDesc { width: 4, height: 4, format: TextureFormat::Rgba8, samples: 1 };
        device.allocate_render_target(textures[0], &desc).unwrap();

        let complete = device
            .create_framebuffer(&FramebufferDesc { label: "ok", color: vec![textures[0]], depth: None })
            .unwrap();
        let incomplete = device
            .create_framebuffer(&FramebufferDesc { label: "bad", color: vec![textures[1]], depth: None })
            .unwrap();

        assert_eq!(device.framebuffer_status(complete), FramebufferStatus::Complete);
        assert!(matches!(device.framebuffer_status(incomplete), FramebufferStatus::Incomplete(_)));
        assert!(device.bind_framebuffer(Some(incomplete)).is_err());
        device.bind_framebuffer(Some(complete)).unwrap();
    }
}
