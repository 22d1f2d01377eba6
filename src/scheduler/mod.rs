//! Frame scheduler.
//!
//! Owns the active pipeline and drives it through two passes each frame:
//! an analysis pass that orders tasks and derives barriers without
//! touching the device, and a serial execution pass that records and
//! submits command lists. Pooled transients (allocators, scratch spaces,
//! descriptor heaps) cycle through the scheduler's fence-gated pools.

mod analysis;
mod execute;

pub use analysis::{can_execute_parallel, make_schedule};

use std::sync::Arc;

use crate::backend::{CommandAllocator, Fence, RenderDevice};
use crate::error::GraphicsError;
use crate::frame::FrameContext;
use crate::graph::Pipeline;
use crate::pool::{CommandListPool, ScratchSpacePool, VolatileHeapPool};
use crate::upload::UploadManager;

/// Drives a [`Pipeline`] through per-frame analysis and execution.
pub struct Scheduler {
    device: Arc<dyn RenderDevice>,
    pipeline: Pipeline,
    uploads: Arc<UploadManager>,
    command_lists: CommandListPool,
    scratch: ScratchSpacePool,
    volatile_heaps: VolatileHeapPool,
    /// Fence of the most recent submission, if any.
    last_fence: Option<Fence>,
    /// Allocator reserved for the failure screen. Never pooled, so the
    /// failure path cannot be starved by a frame that exhausted the pools.
    emergency_allocator: Option<CommandAllocator>,
}

impl Scheduler {
    pub fn new(device: Arc<dyn RenderDevice>) -> Self {
        Self {
            device,
            pipeline: Pipeline::empty(),
            uploads: Arc::new(UploadManager::new()),
            command_lists: CommandListPool::new(),
            scratch: ScratchSpacePool::new(),
            volatile_heaps: VolatileHeapPool::new(),
            last_fence: None,
            emergency_allocator: Some(CommandAllocator::new()),
        }
    }

    /// Install the pipeline to execute each frame.
    pub fn set_pipeline(&mut self, pipeline: Pipeline) {
        log::info!("pipeline installed ({} tasks)", pipeline.task_count());
        self.pipeline = pipeline;
    }

    /// The active pipeline.
    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// Take the active pipeline back, leaving an empty one installed.
    ///
    /// Frames executed afterwards are no-ops until a new pipeline is set.
    pub fn release_pipeline(&mut self) -> Pipeline {
        log::info!("pipeline released");
        std::mem::replace(&mut self.pipeline, Pipeline::empty())
    }

    /// Upload staging queue, drained at the start of each frame.
    pub fn upload_manager(&self) -> &Arc<UploadManager> {
        &self.uploads
    }

    /// Execute one frame.
    ///
    /// Frame-recoverable failures (resource creation, transient memory)
    /// are downgraded to a failure screen so the application keeps
    /// presenting. Graph errors and device loss propagate; neither can be
    /// fixed by retrying the frame.
    pub fn execute(&mut self, frame: &FrameContext) -> Result<(), GraphicsError> {
        self.command_lists.reclaim_completed();
        self.scratch.reclaim_completed();
        self.volatile_heaps.reclaim_completed();

        let uploads = self.uploads.take_pending();
        let result = analysis::plan_frame(&mut self.pipeline, &uploads)
            .and_then(|plan| self.run_plan(plan, &uploads, frame));

        match result {
            Ok(()) => Ok(()),
            Err(error) if error.is_frame_recoverable() => {
                log::error!("frame {} failed: {}", frame.frame_index, error);
                self.render_failure_screen(frame)
            }
            Err(error) => Err(error),
        }
    }

    /// Wait for in-flight work, release task resources, and empty the
    /// transient pools.
    ///
    /// Called before swap-chain resizes and shutdown so device memory can
    /// actually be reclaimed.
    pub fn release_resources(&mut self) {
        log::info!("releasing scheduler resources");
        self.command_lists.drain();
        self.scratch.drain();
        self.volatile_heaps.drain();
        self.last_fence = None;

        for node in self.pipeline.nodes_mut() {
            node.task.release_resources();
        }
    }
}
