//! Device abstraction boundary.
//!
//! The scheduler consumes the GPU through a narrow capability trait,
//! [`RenderDevice`]: create committed resources from value-typed
//! descriptors, create fences, and submit recorded command lists. It never
//! depends on a concrete backend type; native command queues, allocators,
//! descriptor heaps and pipeline-state objects all live behind this
//! boundary.
//!
//! # Available implementations
//!
//! - [`NullDevice`] records submissions for inspection and completes all
//!   work instantly. Backs the test suite and development without GPU
//!   hardware.
//!
//! Real backends (Vulkan, D3D12) plug in by implementing [`RenderDevice`]
//! and translating the portable [`Command`] stream at submission time.

mod command;
mod null;
mod sync;

pub use command::{BarrierSplit, Command, CommandAllocator, CommandList, ResourceBarrier};
pub use null::{NullDevice, Submission};
pub use sync::{Fence, FenceStatus};

use crate::error::GraphicsError;
use crate::types::ResourceDescriptor;

/// Opaque handle to a device-owned resource.
///
/// Handles are plain identifiers; the device owns the native object and
/// frees it when the handle's [`MemoryObject`](crate::resources::MemoryObject)
/// is released.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GpuResourceHandle(pub u64);

/// Capability trait for GPU device backends.
pub trait RenderDevice: Send + Sync {
    /// Backend name for logging.
    fn name(&self) -> &'static str;

    /// Create a committed resource from a value-typed descriptor.
    fn create_resource(
        &self,
        descriptor: &ResourceDescriptor,
    ) -> Result<GpuResourceHandle, GraphicsError>;

    /// Destroy a resource previously created with
    /// [`create_resource`](Self::create_resource).
    ///
    /// The caller guarantees the GPU no longer references the resource.
    fn destroy_resource(&self, handle: GpuResourceHandle);

    /// Create a fence.
    fn create_fence(&self, signaled: bool) -> Fence;

    /// Submit a recorded command list to its target queue.
    ///
    /// The queue waits on every fence in `wait` before executing the list
    /// and signals `signal` when the list completes on the GPU.
    fn submit(
        &self,
        list: &CommandList,
        wait: &[Fence],
        signal: &Fence,
    ) -> Result<(), GraphicsError>;
}
