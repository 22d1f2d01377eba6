//! Fence-gated object pools.
//!
//! GPU commands execute asynchronously: the CPU runs ahead while the GPU
//! processes submitted lists. Objects used by a submission (command
//! allocators, scratch spaces, volatile descriptor heaps) cannot be
//! reused the moment the CPU is done with them, only once the submission's
//! fence confirms GPU completion.
//!
//! [`RecyclePool`] captures that lifecycle: `acquire` hands out a free
//! object, creating one when the pool is exhausted; `retire` parks used
//! objects behind a fence; `reclaim_completed` moves objects whose fence
//! has signaled back to the free list after resetting them.

mod command_list;
mod scratch;

pub use command_list::CommandListPool;
pub use scratch::{DescriptorHeap, ScratchSpace, ScratchSpacePool, VolatileHeapPool};

use crate::backend::Fence;

/// Trait for objects that can live in a [`RecyclePool`].
pub trait PoolItem {
    /// Clear the object for reuse, preserving allocated capacity.
    fn reset(&mut self);
}

/// A pool whose returns are gated on GPU fence completion.
pub struct RecyclePool<T: PoolItem> {
    label: &'static str,
    free: Vec<T>,
    pending: Vec<(Fence, Vec<T>)>,
    created: usize,
}

impl<T: PoolItem> RecyclePool<T> {
    /// Create an empty pool. `label` is used for growth logging.
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            free: Vec::new(),
            pending: Vec::new(),
            created: 0,
        }
    }

    /// Acquire a free object, creating a fresh one if the pool is empty.
    pub fn acquire_with(&mut self, create: impl FnOnce() -> T) -> T {
        match self.free.pop() {
            Some(item) => item,
            None => {
                self.created += 1;
                log::debug!("{} pool exhausted, growing to {}", self.label, self.created);
                create()
            }
        }
    }

    /// Acquire the first free object matching `matches`, creating a fresh
    /// one if none does.
    ///
    /// Used by size-classed pools (scratch spaces) where not every free
    /// object can serve every request.
    pub fn acquire_matching(
        &mut self,
        matches: impl Fn(&T) -> bool,
        create: impl FnOnce() -> T,
    ) -> T {
        match self.free.iter().position(|item| matches(item)) {
            Some(index) => self.free.swap_remove(index),
            None => {
                self.created += 1;
                log::debug!("{} pool exhausted, growing to {}", self.label, self.created);
                create()
            }
        }
    }

    /// Park used objects behind `fence`.
    ///
    /// They become reusable only after the fence signals and
    /// [`reclaim_completed`](Self::reclaim_completed) runs.
    pub fn retire(&mut self, fence: Fence, items: Vec<T>) {
        if !items.is_empty() {
            self.pending.push((fence, items));
        }
    }

    /// Return an object that was never submitted directly to the free list.
    ///
    /// Safe only for objects the GPU has never seen (e.g. a command list
    /// recorded for an aborted frame).
    pub fn recycle_unsubmitted(&mut self, mut item: T) {
        item.reset();
        self.free.push(item);
    }

    /// Move objects whose fence has signaled back to the free list.
    pub fn reclaim_completed(&mut self) {
        let mut reclaimed = 0;
        let mut i = 0;
        while i < self.pending.len() {
            if self.pending[i].0.is_signaled() {
                let (_, items) = self.pending.swap_remove(i);
                for mut item in items {
                    item.reset();
                    reclaimed += 1;
                    self.free.push(item);
                }
            } else {
                i += 1;
            }
        }
        if reclaimed > 0 {
            log::trace!("{} pool reclaimed {} objects", self.label, reclaimed);
        }
    }

    /// Block until every pending fence signals, then reclaim everything.
    ///
    /// Used before swap-chain resizes and shutdown, when all pooled
    /// objects must be provably idle.
    pub fn drain(&mut self) {
        for (fence, _) in &self.pending {
            fence.wait();
        }
        self.reclaim_completed();
        debug_assert!(self.pending.is_empty());
    }

    /// Drop all pooled objects, free and pending alike.
    ///
    /// Callers must ensure the GPU is idle first (see [`drain`](Self::drain)).
    pub fn clear(&mut self) {
        self.free.clear();
        self.pending.clear();
    }

    /// Number of objects currently free.
    pub fn free_count(&self) -> usize {
        self.free.len()
    }

    /// Number of retire batches awaiting their fence.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Total objects this pool has ever created.
    pub fn created_count(&self) -> usize {
        self.created
    }
}
