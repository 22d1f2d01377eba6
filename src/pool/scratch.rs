//! Pooled scratch memory and volatile descriptor heaps.

use crate::backend::Fence;

use super::{PoolItem, RecyclePool};

/// CPU-visible scratch buffer handed to tasks for per-frame transient
/// data (constants, staging copies).
///
/// Allocation is a bump cursor; the whole space is recycled at once when
/// its frame's fence signals.
#[derive(Debug)]
pub struct ScratchSpace {
    data: Vec<u8>,
    cursor: usize,
}

impl ScratchSpace {
    /// Create a scratch space of `size` bytes.
    pub fn new(size: u64) -> Self {
        Self {
            data: vec![0; size as usize],
            cursor: 0,
        }
    }

    /// Total capacity in bytes.
    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }

    /// Bytes handed out so far this frame.
    pub fn used(&self) -> u64 {
        self.cursor as u64
    }

    /// Bump-allocate `len` bytes. Returns `None` when the space is full.
    pub fn allocate(&mut self, len: u64) -> Option<&mut [u8]> {
        let len = len as usize;
        let end = self.cursor.checked_add(len)?;
        if end > self.data.len() {
            return None;
        }
        let slice = &mut self.data[self.cursor..end];
        self.cursor = end;
        Some(slice)
    }
}

impl PoolItem for ScratchSpace {
    fn reset(&mut self) {
        self.cursor = 0;
    }
}

/// Pool of [`ScratchSpace`]s, matched by capacity.
pub struct ScratchSpacePool {
    spaces: RecyclePool<ScratchSpace>,
}

impl ScratchSpacePool {
    /// Spaces are allocated in multiples of this granularity so nearby
    /// request sizes share a size class.
    const GRANULARITY: u64 = 64 * 1024;

    pub fn new() -> Self {
        Self {
            spaces: RecyclePool::new("scratch space"),
        }
    }

    /// Acquire a scratch space of at least `min_size` bytes.
    pub fn acquire(&mut self, min_size: u64) -> ScratchSpace {
        let rounded = min_size
            .max(1)
            .div_ceil(Self::GRANULARITY)
            .saturating_mul(Self::GRANULARITY);
        self.spaces
            .acquire_matching(|s| s.size() >= min_size, || ScratchSpace::new(rounded))
    }

    /// Park used spaces until `fence` signals.
    pub fn retire(&mut self, fence: Fence, spaces: Vec<ScratchSpace>) {
        self.spaces.retire(fence, spaces);
    }

    /// Return a space that was never part of a submission.
    pub fn recycle_unsubmitted(&mut self, space: ScratchSpace) {
        self.spaces.recycle_unsubmitted(space);
    }

    pub fn reclaim_completed(&mut self) {
        self.spaces.reclaim_completed();
    }

    pub fn drain(&mut self) {
        self.spaces.drain();
    }

    pub fn free_count(&self) -> usize {
        self.spaces.free_count()
    }

    pub fn created_count(&self) -> usize {
        self.spaces.created_count()
    }
}

impl Default for ScratchSpacePool {
    fn default() -> Self {
        Self::new()
    }
}

/// Shader-visible descriptor heap for volatile (per-frame) bindings.
#[derive(Debug)]
pub struct DescriptorHeap {
    capacity: u32,
    used: u32,
}

impl DescriptorHeap {
    pub fn new(capacity: u32) -> Self {
        Self { capacity, used: 0 }
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn used(&self) -> u32 {
        self.used
    }

    /// Reserve `count` descriptor slots, returning the first slot index.
    pub fn allocate(&mut self, count: u32) -> Option<u32> {
        let end = self.used.checked_add(count)?;
        if end > self.capacity {
            return None;
        }
        let first = self.used;
        self.used = end;
        Some(first)
    }
}

impl PoolItem for DescriptorHeap {
    fn reset(&mut self) {
        self.used = 0;
    }
}

/// Pool of volatile descriptor heaps.
pub struct VolatileHeapPool {
    heaps: RecyclePool<DescriptorHeap>,
    heap_capacity: u32,
}

impl VolatileHeapPool {
    const DEFAULT_HEAP_CAPACITY: u32 = 1024;

    pub fn new() -> Self {
        Self {
            heaps: RecyclePool::new("volatile descriptor heap"),
            heap_capacity: Self::DEFAULT_HEAP_CAPACITY,
        }
    }

    /// Acquire a heap with all slots free.
    pub fn acquire(&mut self) -> DescriptorHeap {
        let capacity = self.heap_capacity;
        self.heaps.acquire_with(|| DescriptorHeap::new(capacity))
    }

    /// Park used heaps until `fence` signals.
    pub fn retire(&mut self, fence: Fence, heaps: Vec<DescriptorHeap>) {
        self.heaps.retire(fence, heaps);
    }

    /// Return a heap that was never part of a submission.
    pub fn recycle_unsubmitted(&mut self, heap: DescriptorHeap) {
        self.heaps.recycle_unsubmitted(heap);
    }

    pub fn reclaim_completed(&mut self) {
        self.heaps.reclaim_completed();
    }

    pub fn drain(&mut self) {
        self.heaps.drain();
    }

    pub fn free_count(&self) -> usize {
        self.heaps.free_count()
    }

    pub fn created_count(&self) -> usize {
        self.heaps.created_count()
    }
}

impl Default for VolatileHeapPool {
    fn default() -> Self {
        Self::new()
    }
}
