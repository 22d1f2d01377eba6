//! Per-frame data shared by every task.

use std::time::Duration;

use crate::resources::MemoryObject;

/// Frame-global context passed to tasks during execution.
#[derive(Debug, Clone)]
pub struct FrameContext {
    /// Monotonic frame counter.
    pub frame_index: u64,
    /// The swap-chain image this frame renders to.
    pub back_buffer: MemoryObject,
    /// Time elapsed since the previous frame.
    pub frame_time: Duration,
}
