//! Graphics device abstraction
//!
//! This module defines the opaque device the renderer core talks to. The
//! core never sees driver objects, only the small id newtypes below. A device
//! implementation must honour three orderings: resources are allocated before
//! they are bound, data is uploaded before the first draw that reads it, and
//! every `begin_query` is paired with an `end_query` for the same region.

use std::time::Duration;

use bitflags::bitflags;
use thiserror::Error;

use crate::config::TextureFiltering;

/// Result type for device operations
pub type DeviceResult<T> = Result<T, DeviceError>;

macro_rules! device_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub struct $name(pub u64);
    };
}

device_id!(
    /// Vertex or index buffer object
    BufferId
);
device_id!(
    /// Texture object, sampled or used as a render-target attachment
    TextureId
);
device_id!(
    /// Vertex-attribute array object binding a vertex and an index buffer
    VertexArrayId
);
device_id!(
    /// Linked shader program
    ProgramId
);
device_id!(
    /// Framebuffer object
    FramebufferId
);

bitflags! {
    /// Buffers cleared by [`GraphicsDevice::clear`]
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ClearFlags: u32 {
        /// Colour attachments
        const COLOR = 0b01;
        /// Depth attachment
        const DEPTH = 0b10;
    }
}

/// Interleaved vertex formats understood by the device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VertexLayout {
    /// position (3 floats), texcoord (2 floats), normal (3 floats)
    Mesh,
    /// position (2 floats), texcoord (2 floats)
    Flat,
}

impl VertexLayout {
    /// Byte stride of one vertex
    pub const fn stride(self) -> usize {
        match self {
            Self::Mesh => 32,
            Self::Flat => 16,
        }
    }
}

/// Pixel format of a render target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureFormat {
    /// 8-bit RGBA
    Rgba8,
    /// Half-float RGBA for HDR colour
    Rgba16F,
    /// 24-bit depth
    Depth24,
}

/// Sampling parameters applied at texture upload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureParams {
    /// Filter mode
    pub filtering: TextureFiltering,
    /// Generate a full mip chain after the upload
    pub generate_mipmaps: bool,
    /// Clamp texture coordinates to the edge instead of repeating
    pub clamp_to_edge: bool,
}

/// Storage description of a render-target texture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderTargetDesc {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Pixel format
    pub format: TextureFormat,
    /// Multisample count, 1 for single-sampled
    pub samples: u32,
}

/// Attachment list of a framebuffer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FramebufferDesc {
    /// Debug label
    pub label: &'static str,
    /// Colour attachments in location order
    pub color: Vec<TextureId>,
    /// Depth attachment
    pub depth: Option<TextureId>,
}

/// Completeness of a framebuffer after construction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FramebufferStatus {
    /// Usable
    Complete,
    /// Unusable, with the driver's reason
    Incomplete(String),
}

/// Blend equation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlendMode {
    /// Overwrite
    Opaque,
    /// Source-alpha over
    Alpha,
}

/// Fixed-function state for the following draws
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderState {
    /// Depth test enabled
    pub depth_test: bool,
    /// Depth writes enabled
    pub depth_write: bool,
    /// Blend equation
    pub blend: BlendMode,
    /// Polygons drawn as outlines
    pub wireframe: bool,
}

impl RenderState {
    /// Depth-tested, depth-writing, opaque
    pub const OPAQUE: Self = Self {
        depth_test: true,
        depth_write: true,
        blend: BlendMode::Opaque,
        wireframe: false,
    };

    /// Depth-tested, alpha-blended
    pub const TRANSPARENT: Self = Self {
        depth_test: true,
        depth_write: true,
        blend: BlendMode::Alpha,
        wireframe: false,
    };

    /// No depth, alpha-blended
    pub const OVERLAY: Self = Self {
        depth_test: false,
        depth_write: false,
        blend: BlendMode::Alpha,
        wireframe: false,
    };

    /// No depth, opaque
    pub const FULLSCREEN: Self = Self {
        depth_test: false,
        depth_write: false,
        blend: BlendMode::Opaque,
        wireframe: false,
    };

    /// Same state with the wireframe switch applied
    pub const fn with_wireframe(mut self, wireframe: bool) -> Self {
        self.wireframe = wireframe;
        self
    }
}

/// Uniform values accepted by [`GraphicsDevice::set_uniform`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    /// Scalar int / sampler unit
    Int(i32),
    /// Scalar float
    Float(f32),
    /// vec2
    Vec2([f32; 2]),
    /// vec3
    Vec3([f32; 3]),
    /// vec4
    Vec4([f32; 4]),
    /// mat2, column-major
    Mat2([f32; 4]),
    /// mat3, column-major
    Mat3([f32; 9]),
    /// mat4, column-major
    Mat4([f32; 16]),
}

/// Named GPU-timed regions of a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerRegion {
    /// Garbage collection, derived-state updates and resource uploads
    GcAndUpdate,
    /// Shadow and geometry passes
    Geometry,
    /// Deferred screen-space lighting
    Lighting,
    /// Transparent / forward pass
    Transparent,
    /// Anti-aliasing resolve and tonemap
    HdrResolve,
    /// UI and text composition
    Overlay,
    /// Text texture uploads
    TextCopy,
}

impl TimerRegion {
    /// Every region, in frame order of first use
    pub const ALL: [Self; 7] = [
        Self::GcAndUpdate,
        Self::TextCopy,
        Self::Geometry,
        Self::Lighting,
        Self::Transparent,
        Self::HdrResolve,
        Self::Overlay,
    ];

    /// Dense index for per-region tables
    pub const fn index(self) -> usize {
        match self {
            Self::GcAndUpdate => 0,
            Self::TextCopy => 1,
            Self::Geometry => 2,
            Self::Lighting => 3,
            Self::Transparent => 4,
            Self::HdrResolve => 5,
            Self::Overlay => 6,
        }
    }

    /// Human readable region name
    pub const fn name(self) -> &'static str {
        match self {
            Self::GcAndUpdate => "gc/update",
            Self::TextCopy => "text copy",
            Self::Geometry => "geometry",
            Self::Lighting => "lighting",
            Self::Transparent => "transparent",
            Self::HdrResolve => "hdr resolve",
            Self::Overlay => "text/ui",
        }
    }
}

/// Result of a finished timer query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct QueryResult {
    /// GPU time spent inside the region
    pub elapsed: Duration,
    /// Primitives generated inside the region
    pub primitives: u64,
}

/// Errors raised by a graphics device
///
/// Every device error leaves the device unusable; the renderer does not retry.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeviceError {
    /// Framebuffer failed its completeness check
    #[error("Framebuffer '{label}' is incomplete: {reason}")]
    IncompleteFramebuffer {
        /// Framebuffer label
        label: &'static str,
        /// Driver reason
        reason: String,
    },

    /// Shader compilation or linking failed
    #[error("Shader program '{label}' failed to build: {log}")]
    ShaderCompilation {
        /// Program label
        label: String,
        /// Compiler log
        log: String,
    },

    /// An id that was never allocated, or was already deleted
    #[error("Unknown {kind} resource {id}")]
    UnknownResource {
        /// Resource kind
        kind: &'static str,
        /// Offending id
        id: u64,
    },

    /// Begin/end query pairing violated
    #[error("Query mismatch: {0}")]
    QueryMismatch(String),

    /// A call was issued without the state it requires
    #[error("Invalid device state: {0}")]
    InvalidState(String),

    /// The device stopped responding
    #[error("Device lost: {0}")]
    DeviceLost(String),
}

/// Opaque graphics device
///
/// All calls are issued from the thread that owns the renderer.
pub trait GraphicsDevice {
    /// Allocate `count` buffer objects in one call
    fn create_buffers(&mut self, count: usize) -> DeviceResult<Vec<BufferId>>;

    /// Allocate `count` texture objects in one call
    fn create_textures(&mut self, count: usize) -> DeviceResult<Vec<TextureId>>;

    /// Allocate `count` vertex-array objects in one call
    fn create_vertex_arrays(&mut self, count: usize) -> DeviceResult<Vec<VertexArrayId>>;

    /// Free buffer objects
    fn delete_buffers(&mut self, ids: &[BufferId]);

    /// Free texture objects
    fn delete_textures(&mut self, ids: &[TextureId]);

    /// Free vertex-array objects
    fn delete_vertex_arrays(&mut self, ids: &[VertexArrayId]);

    /// Fill a vertex and an index buffer and record their layout in `vao`
    fn upload_geometry(
        &mut self,
        vao: VertexArrayId,
        vertex_buffer: BufferId,
        index_buffer: BufferId,
        layout: VertexLayout,
        vertices: &[u8],
        indices: &[u32],
    ) -> DeviceResult<()>;

    /// Upload RGBA8 pixels into a texture
    fn upload_texture(
        &mut self,
        id: TextureId,
        width: u32,
        height: u32,
        rgba: &[u8],
        params: &TextureParams,
    ) -> DeviceResult<()>;

    /// Change the sampling filter of an uploaded texture
    fn set_texture_filtering(&mut self, id: TextureId, filtering: TextureFiltering) -> DeviceResult<()>;

    /// Give a texture render-target storage
    fn allocate_render_target(&mut self, id: TextureId, desc: &RenderTargetDesc) -> DeviceResult<()>;

    /// Create a framebuffer from allocated attachments
    fn create_framebuffer(&mut self, desc: &FramebufferDesc) -> DeviceResult<FramebufferId>;

    /// Completeness of a framebuffer
    fn framebuffer_status(&self, id: FramebufferId) -> FramebufferStatus;

    /// Free a framebuffer (attachments are freed separately)
    fn delete_framebuffer(&mut self, id: FramebufferId);

    /// Bind a framebuffer for drawing, `None` for the backbuffer
    fn bind_framebuffer(&mut self, target: Option<FramebufferId>) -> DeviceResult<()>;

    /// Copy colour from one framebuffer to another, resolving samples;
    /// `None` targets the backbuffer
    fn blit_framebuffer(
        &mut self,
        source: FramebufferId,
        destination: Option<FramebufferId>,
        source_size: (u32, u32),
        destination_size: (u32, u32),
    ) -> DeviceResult<()>;

    /// Compile and link a program from source text
    fn compile_program(&mut self, label: &str, vertex_source: &str, fragment_source: &str) -> DeviceResult<ProgramId>;

    /// Free a program
    fn delete_program(&mut self, id: ProgramId);

    /// Make a program current
    fn use_program(&mut self, id: ProgramId) -> DeviceResult<()>;

    /// Set a uniform on the current program
    fn set_uniform(&mut self, name: &str, value: UniformValue) -> DeviceResult<()>;

    /// Bind a texture to a sampler unit
    fn bind_texture(&mut self, unit: u32, id: TextureId) -> DeviceResult<()>;

    /// Bind a vertex array for drawing
    fn bind_vertex_array(&mut self, id: VertexArrayId) -> DeviceResult<()>;

    /// Set the viewport size
    fn set_viewport(&mut self, width: u32, height: u32);

    /// Set fixed-function state
    fn set_render_state(&mut self, state: RenderState);

    /// Clear the bound framebuffer
    fn clear(&mut self, flags: ClearFlags, color: [f32; 4]);

    /// Draw indexed triangles from the bound program and vertex array
    fn draw_indexed(&mut self, index_count: u32) -> DeviceResult<()>;

    /// Start timing a region
    fn begin_query(&mut self, region: TimerRegion) -> DeviceResult<()>;

    /// Stop timing a region
    fn end_query(&mut self, region: TimerRegion) -> DeviceResult<()>;

    /// Latest finished result for a region, if any
    fn query_result(&mut self, region: TimerRegion) -> Option<QueryResult>;

    /// Present the backbuffer
    fn present(&mut self) -> DeviceResult<()>;
}
