//! Frame pipeline
//!
//! Per-frame ordering and pass execution: garbage collection, draw-order
//! queues, the staged frame itself and the statistics it leaves behind.

pub mod stats;
pub mod queue;
pub mod gc;
pub(crate) mod frame;

pub use stats::{Statistics, EntityCounts, PassPrimitives};
pub use queue::{DrawItem, OverlayItem, OverlayKind, sort_back_to_front, merge_overlay};
pub use frame::{MAX_POINT_LIGHTS, MAX_CONE_LIGHTS, EXPOSURE};
