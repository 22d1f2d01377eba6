//! Pooling of command allocators.

use crate::backend::{CommandAllocator, CommandList, Fence};
use crate::types::QueueType;

use super::{PoolItem, RecyclePool};

impl PoolItem for CommandAllocator {
    fn reset(&mut self) {
        CommandAllocator::reset(self);
    }
}

/// Pool of command allocators, recycled once their submission's fence
/// signals.
///
/// Allocator backing storage survives recycling, so steady-state frames
/// record into already-sized buffers instead of reallocating.
pub struct CommandListPool {
    allocators: RecyclePool<CommandAllocator>,
}

impl CommandListPool {
    pub fn new() -> Self {
        Self {
            allocators: RecyclePool::new("command allocator"),
        }
    }

    /// Begin a command list on `queue` backed by a pooled allocator.
    pub fn begin_list(&mut self, queue: QueueType) -> CommandList {
        let allocator = self.allocators.acquire_with(CommandAllocator::new);
        CommandList::begin(queue, allocator)
    }

    /// Park a finished list's allocator until `fence` signals.
    pub fn retire(&mut self, fence: Fence, allocator: CommandAllocator) {
        self.allocators.retire(fence, vec![allocator]);
    }

    /// Take back a list that was recorded but never submitted.
    pub fn recycle_unsubmitted(&mut self, list: CommandList) {
        self.allocators.recycle_unsubmitted(list.finish());
    }

    /// Return allocators whose fences have signaled to the free list.
    pub fn reclaim_completed(&mut self) {
        self.allocators.reclaim_completed();
    }

    /// Wait for all pending fences and reclaim everything.
    pub fn drain(&mut self) {
        self.allocators.drain();
    }

    pub fn free_count(&self) -> usize {
        self.allocators.free_count()
    }

    pub fn created_count(&self) -> usize {
        self.allocators.created_count()
    }
}

impl Default for CommandListPool {
    fn default() -> Self {
        Self::new()
    }
}
