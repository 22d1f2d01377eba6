//! Task trait and the contexts handed to tasks.
//!
//! A task runs in two phases each frame. `setup` declares every resource
//! the task will touch and the synchronization states it needs them in;
//! nothing is recorded yet. `execute` then records commands into a
//! command list whose barriers were already injected from those
//! declarations, so tasks never issue barriers themselves.

use crate::backend::CommandList;
use crate::error::{GraphError, GraphicsError};
use crate::frame::FrameContext;
use crate::pool::{DescriptorHeap, ScratchSpace};
use crate::resources::MemoryObject;
use crate::types::{QueueType, ResourceState, SUBRESOURCE_ALL};

/// A single declared use of a resource by one task.
#[derive(Debug, Clone)]
pub struct UsedResource {
    /// The resource being used.
    pub resource: MemoryObject,
    /// Subresource index, or [`SUBRESOURCE_ALL`] for the whole resource.
    pub subresource: u32,
    /// State the resource must be in when the task starts.
    pub first_state: ResourceState,
    /// State the resource is left in when the task finishes.
    pub last_state: ResourceState,
    /// Whether the task declared this subresource more than once.
    ///
    /// Multiple uses within one task may transition the subresource
    /// internally, so the parallelism analysis must treat it as opaque.
    pub multiple_use: bool,
}

/// Context for the declaration phase.
///
/// Collects a task's resource usages and scratch-memory needs. Usages
/// come out sorted by `(resource id, subresource)` so downstream
/// analysis can merge-scan two tasks' lists in linear time.
pub struct SetupContext {
    usages: Vec<UsedResource>,
    scratch_bytes: u64,
}

impl SetupContext {
    pub(crate) fn new() -> Self {
        Self {
            usages: Vec::new(),
            scratch_bytes: 0,
        }
    }

    /// Declare that the task uses `subresource` of `resource`, expecting
    /// it in `first_state` and leaving it in `last_state`.
    ///
    /// Pass [`SUBRESOURCE_ALL`] to cover every subresource at once. A
    /// whole-resource declaration and a specific-subresource declaration
    /// of the same resource are tracked as distinct usages.
    ///
    /// Redeclaring the same subresource with identical states marks the
    /// usage as multiple-use. Redeclaring it with different states is a
    /// contradiction the task author must resolve, and fails the frame.
    pub fn declare(
        &mut self,
        resource: &MemoryObject,
        subresource: u32,
        first_state: ResourceState,
        last_state: ResourceState,
    ) -> Result<(), GraphError> {
        if subresource != SUBRESOURCE_ALL && subresource >= resource.subresource_count() {
            return Err(GraphError::SubresourceOutOfRange {
                resource: resource.id(),
                subresource,
                count: resource.subresource_count(),
            });
        }

        if let Some(existing) = self
            .usages
            .iter_mut()
            .find(|u| u.resource.id() == resource.id() && u.subresource == subresource)
        {
            if existing.first_state != first_state || existing.last_state != last_state {
                return Err(GraphError::ConflictingStates {
                    resource: resource.id(),
                    subresource,
                });
            }
            existing.multiple_use = true;
            return Ok(());
        }

        self.usages.push(UsedResource {
            resource: resource.clone(),
            subresource,
            first_state,
            last_state,
            multiple_use: false,
        });
        Ok(())
    }

    /// Shorthand for a use whose state does not change across the task.
    pub fn declare_read(
        &mut self,
        resource: &MemoryObject,
        subresource: u32,
        state: ResourceState,
    ) -> Result<(), GraphError> {
        self.declare(resource, subresource, state, state)
    }

    /// Request `bytes` of per-frame scratch memory for the execute phase.
    pub fn request_scratch(&mut self, bytes: u64) {
        self.scratch_bytes += bytes;
    }

    /// Finish the declaration phase: usages sorted for merge-scanning,
    /// plus the total scratch request.
    pub(crate) fn into_usages(mut self) -> (Vec<UsedResource>, u64) {
        self.usages
            .sort_by_key(|u| (u.resource.id(), u.subresource));
        (self.usages, self.scratch_bytes)
    }
}

/// Context for the execute phase.
///
/// Gives a task its command list, frame data, and the pooled transient
/// allocations its `setup` requested.
pub struct RenderContext<'a> {
    list: &'a mut CommandList,
    frame: &'a FrameContext,
    scratch: &'a mut ScratchSpace,
    volatile_heap: &'a mut DescriptorHeap,
}

impl<'a> RenderContext<'a> {
    pub(crate) fn new(
        list: &'a mut CommandList,
        frame: &'a FrameContext,
        scratch: &'a mut ScratchSpace,
        volatile_heap: &'a mut DescriptorHeap,
    ) -> Self {
        Self {
            list,
            frame,
            scratch,
            volatile_heap,
        }
    }

    /// The command list to record into.
    pub fn command_list(&mut self) -> &mut CommandList {
        self.list
    }

    /// Frame-global data: frame index, back buffer, timing.
    pub fn frame(&self) -> &FrameContext {
        self.frame
    }

    /// Allocate transient CPU-visible memory, valid until the frame's
    /// fence signals.
    pub fn allocate_scratch(&mut self, bytes: u64) -> Result<&mut [u8], GraphicsError> {
        self.scratch.allocate(bytes).ok_or_else(|| {
            GraphicsError::InvalidParameter(format!(
                "scratch request of {} bytes exceeds the amount declared in setup",
                bytes
            ))
        })
    }

    /// Reserve volatile descriptor slots, returning the first slot index.
    pub fn allocate_descriptors(&mut self, count: u32) -> Result<u32, GraphicsError> {
        self.volatile_heap
            .allocate(count)
            .ok_or(GraphicsError::OutOfMemory)
    }
}

/// A node in the frame graph.
///
/// Implementations are driven by the scheduler once per frame: `setup`
/// first, then `execute` in dependency order.
pub trait GraphicsTask: Send {
    /// Declare resource usages and transient-memory needs for this frame.
    ///
    /// Tasks that allocate resources here report failures as
    /// [`GraphicsError`]; recoverable ones degrade the frame to the
    /// failure screen instead of crashing it.
    fn setup(&mut self, ctx: &mut SetupContext) -> Result<(), GraphicsError>;

    /// Record this frame's commands.
    fn execute(&mut self, ctx: &mut RenderContext<'_>) -> Result<(), GraphicsError>;

    /// Drop references to long-lived resources.
    ///
    /// Called when the pipeline is released or the swap chain is resized;
    /// tasks holding cached [`MemoryObject`]s must let go of them here so
    /// the device memory can be reclaimed.
    fn release_resources(&mut self) {}

    /// Queue this task's commands should run on.
    fn queue(&self) -> QueueType {
        QueueType::Graphics
    }
}
