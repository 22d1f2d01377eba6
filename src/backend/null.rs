//! Null device backend for testing and development.
//!
//! The null device performs no GPU work. It hands out resource handles
//! from a counter, signals fences at submission time, and retains every
//! submitted command stream so tests can assert on exactly what a frame
//! produced.

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};

use parking_lot::Mutex;

use crate::error::GraphicsError;
use crate::types::{QueueType, ResourceDescriptor};

use super::{Command, CommandList, Fence, GpuResourceHandle, RenderDevice};

/// A submission retained by the null device.
#[derive(Debug, Clone)]
pub struct Submission {
    /// Queue the list was submitted to.
    pub queue: QueueType,
    /// The recorded command stream.
    pub commands: Vec<Command>,
    /// Number of fences the submission waited on.
    pub wait_count: usize,
}

/// Device backend that completes all work instantly.
#[derive(Debug, Default)]
pub struct NullDevice {
    next_handle: AtomicU64,
    submissions: Mutex<Vec<Submission>>,
    live_resources: AtomicU64,
    /// Number of upcoming resource creations that should fail.
    fail_creates: AtomicU32,
    /// When set, submissions fail with `DeviceLost`.
    device_lost: AtomicBool,
}

impl NullDevice {
    /// Create a new null device.
    pub fn new() -> Self {
        Self::default()
    }

    /// All submissions so far, in submission order.
    pub fn submissions(&self) -> Vec<Submission> {
        self.submissions.lock().clone()
    }

    /// Number of submissions so far.
    pub fn submission_count(&self) -> usize {
        self.submissions.lock().len()
    }

    /// Drop retained submissions.
    pub fn clear_submissions(&self) {
        self.submissions.lock().clear();
    }

    /// Number of resources currently alive on the device.
    pub fn live_resource_count(&self) -> u64 {
        self.live_resources.load(Ordering::Acquire)
    }

    /// Make the next `count` resource creations fail with
    /// [`GraphicsError::OutOfMemory`].
    pub fn fail_next_creates(&self, count: u32) {
        self.fail_creates.store(count, Ordering::Release);
    }

    /// Simulate device removal: all further submissions fail.
    pub fn simulate_device_loss(&self) {
        self.device_lost.store(true, Ordering::Release);
    }
}

impl RenderDevice for NullDevice {
    fn name(&self) -> &'static str {
        "null"
    }

    fn create_resource(
        &self,
        descriptor: &ResourceDescriptor,
    ) -> Result<GpuResourceHandle, GraphicsError> {
        if self
            .fail_creates
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err(GraphicsError::OutOfMemory);
        }

        let handle = self.next_handle.fetch_add(1, Ordering::Relaxed);
        self.live_resources.fetch_add(1, Ordering::AcqRel);
        log::trace!(
            "null device: created resource {:?} ({:?})",
            handle,
            descriptor.label
        );
        Ok(GpuResourceHandle(handle))
    }

    fn destroy_resource(&self, handle: GpuResourceHandle) {
        self.live_resources.fetch_sub(1, Ordering::AcqRel);
        log::trace!("null device: destroyed resource {:?}", handle.0);
    }

    fn create_fence(&self, signaled: bool) -> Fence {
        if signaled {
            Fence::new_signaled()
        } else {
            Fence::new_unsignaled()
        }
    }

    fn submit(
        &self,
        list: &CommandList,
        wait: &[Fence],
        signal: &Fence,
    ) -> Result<(), GraphicsError> {
        if self.device_lost.load(Ordering::Acquire) {
            return Err(GraphicsError::DeviceLost);
        }

        log::trace!(
            "null device: submit {} commands to {:?} queue (waits: {})",
            list.commands().len(),
            list.queue(),
            wait.len()
        );

        self.submissions.lock().push(Submission {
            queue: list.queue(),
            commands: list.commands().to_vec(),
            wait_count: wait.len(),
        });

        // No real GPU: work completes at submission time.
        signal.signal();
        Ok(())
    }
}
