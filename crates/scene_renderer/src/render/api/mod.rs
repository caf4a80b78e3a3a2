//! Public rendering API
//!
//! The device boundary the renderer core is written against.

pub mod device;

pub use device::{
    GraphicsDevice, DeviceError, DeviceResult,
    BufferId, TextureId, VertexArrayId, ProgramId, FramebufferId,
    ClearFlags, VertexLayout, TextureFormat, TextureParams, RenderTargetDesc,
    FramebufferDesc, FramebufferStatus, BlendMode, RenderState, UniformValue,
    TimerRegion, QueryResult,
};
