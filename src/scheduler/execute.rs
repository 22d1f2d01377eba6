//! Serial execution pass: record, submit, recycle.

use crate::backend::{
    BarrierSplit, CommandList, Fence, ResourceBarrier,
};
use crate::error::{GraphError, GraphicsError};
use crate::frame::FrameContext;
use crate::graph::RenderContext;
use crate::pool::{DescriptorHeap, ScratchSpace};
use crate::types::{QueueType, ResourceState};
use crate::upload::UploadDescription;

use super::analysis::{FramePlan, ScheduledItem, SegmentPlan};
use super::Scheduler;

/// Clear color of the failure screen.
const FAILURE_COLOR: [f32; 4] = [0.35, 0.0, 0.0, 1.0];

impl Scheduler {
    /// Record and submit every planned segment, in plan order.
    ///
    /// Stops at the first failing segment; nothing of the failed segment
    /// reaches the device, and everything already submitted stays
    /// submitted.
    pub(crate) fn run_plan(
        &mut self,
        plan: FramePlan,
        uploads: &[UploadDescription],
        frame: &FrameContext,
    ) -> Result<(), GraphicsError> {
        for segment in plan.segments {
            self.run_segment(segment, uploads, frame)?;
        }
        Ok(())
    }

    fn run_segment(
        &mut self,
        segment: SegmentPlan,
        uploads: &[UploadDescription],
        frame: &FrameContext,
    ) -> Result<(), GraphicsError> {
        let mut list = self.command_lists.begin_list(segment.queue);
        for barrier in &segment.barriers {
            list.transition(*barrier);
        }

        let mut transients: Option<(ScratchSpace, DescriptorHeap)> = None;
        let recorded = match segment.item {
            ScheduledItem::Upload => {
                log::trace!("recording {} uploads", uploads.len());
                for upload in uploads {
                    list.upload(
                        upload.destination.id(),
                        upload.subresource,
                        upload.data.len() as u64,
                    );
                }
                Ok(())
            }
            ScheduledItem::Task(handle) => {
                let mut scratch = self.scratch.acquire(segment.scratch_bytes);
                let mut heap = self.volatile_heaps.acquire();
                let result = match self.pipeline.node_mut(handle) {
                    Some(node) => {
                        log::trace!("executing task {:?} ({})", handle, node.name);
                        let mut ctx =
                            RenderContext::new(&mut list, frame, &mut scratch, &mut heap);
                        node.task.execute(&mut ctx)
                    }
                    None => Err(GraphError::InvalidTaskHandle(handle).into()),
                };
                transients = Some((scratch, heap));
                result
            }
        };

        if let Err(error) = recorded {
            // Abort: the partial list never reaches the device.
            self.command_lists.recycle_unsubmitted(list);
            if let Some((scratch, heap)) = transients {
                self.scratch.recycle_unsubmitted(scratch);
                self.volatile_heaps.recycle_unsubmitted(heap);
            }
            return Err(error);
        }

        let fence = self.device.create_fence(false);
        let waits: Vec<Fence> = if segment.wait_previous {
            self.last_fence.clone().into_iter().collect()
        } else {
            Vec::new()
        };

        match self.device.submit(&list, &waits, &fence) {
            Ok(()) => {
                self.command_lists.retire(fence.clone(), list.finish());
                if let Some((scratch, heap)) = transients {
                    self.scratch.retire(fence.clone(), vec![scratch]);
                    self.volatile_heaps.retire(fence.clone(), vec![heap]);
                }
                self.last_fence = Some(fence);
                Ok(())
            }
            Err(error) => {
                // The device rejected the list, so its transients are idle.
                self.command_lists.recycle_unsubmitted(list);
                if let Some((scratch, heap)) = transients {
                    self.scratch.recycle_unsubmitted(scratch);
                    self.volatile_heaps.recycle_unsubmitted(heap);
                }
                Err(error)
            }
        }
    }

    /// Present a solid error color instead of the failed frame.
    ///
    /// Records into the reserved emergency allocator and waits for the
    /// submission on the spot; the failure path trades throughput for
    /// never competing with the pools that may have just run dry.
    pub(crate) fn render_failure_screen(
        &mut self,
        frame: &FrameContext,
    ) -> Result<(), GraphicsError> {
        log::warn!("presenting failure screen for frame {}", frame.frame_index);

        let allocator = self.emergency_allocator.take().unwrap_or_default();
        let mut list = CommandList::begin(QueueType::Graphics, allocator);

        let back_buffer = &frame.back_buffer;
        let current = back_buffer.read_state(0);
        if current != ResourceState::RENDER_TARGET {
            list.transition(ResourceBarrier {
                resource: back_buffer.id(),
                subresource: 0,
                from: current,
                to: ResourceState::RENDER_TARGET,
                split: BarrierSplit::Whole,
            });
        }
        list.marker("failure screen");
        list.clear_target(back_buffer.id(), FAILURE_COLOR);
        list.transition(ResourceBarrier {
            resource: back_buffer.id(),
            subresource: 0,
            from: ResourceState::RENDER_TARGET,
            to: ResourceState::PRESENT,
            split: BarrierSplit::Whole,
        });

        let fence = self.device.create_fence(false);
        let waits: Vec<Fence> = self.last_fence.clone().into_iter().collect();
        let submitted = self.device.submit(&list, &waits, &fence);
        let mut allocator = list.finish();

        match submitted {
            Ok(()) => {
                back_buffer.record_state(0, ResourceState::PRESENT);
                fence.wait();
                allocator.reset();
                self.emergency_allocator = Some(allocator);
                self.last_fence = Some(fence);
                Ok(())
            }
            Err(error) => {
                allocator.reset();
                self.emergency_allocator = Some(allocator);
                Err(error)
            }
        }
    }
}
