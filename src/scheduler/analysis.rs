//! Frame analysis: ordering, parallelism, and barrier computation.
//!
//! The analysis pass runs before any command is recorded. It orders the
//! pipeline's tasks, runs their declaration phase, decides which
//! neighboring segments could overlap on the GPU, computes the exact
//! transition barriers each segment needs, and commits the resulting
//! resource states. The later execution pass only records and submits.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use crate::backend::{BarrierSplit, ResourceBarrier};
use crate::error::{GraphError, GraphicsError};
use crate::graph::{Pipeline, SetupContext, TaskHandle, UsedResource};
use crate::types::{QueueType, ResourceState, SUBRESOURCE_ALL};
use crate::upload::UploadDescription;

/// Compute a deterministic topological order of the task graph.
///
/// Kahn's algorithm with a min-heap of ready tasks: among tasks whose
/// dependencies are all satisfied, the one declared earliest runs first.
/// The same graph therefore always yields the same schedule.
pub fn make_schedule(
    task_count: usize,
    dependencies: &[Vec<TaskHandle>],
) -> Result<Vec<TaskHandle>, GraphError> {
    debug_assert_eq!(task_count, dependencies.len());

    let mut indegree = vec![0u32; task_count];
    let mut dependents: Vec<Vec<u32>> = vec![Vec::new(); task_count];
    for (task, deps) in dependencies.iter().enumerate() {
        for dep in deps {
            if dep.index() >= task_count {
                return Err(GraphError::InvalidTaskHandle(*dep));
            }
            indegree[task] += 1;
            dependents[dep.index()].push(task as u32);
        }
    }

    let mut ready: BinaryHeap<Reverse<u32>> = indegree
        .iter()
        .enumerate()
        .filter(|(_, &d)| d == 0)
        .map(|(i, _)| Reverse(i as u32))
        .collect();

    let mut schedule = Vec::with_capacity(task_count);
    while let Some(Reverse(task)) = ready.pop() {
        schedule.push(TaskHandle(task));
        for &dependent in &dependents[task as usize] {
            indegree[dependent as usize] -= 1;
            if indegree[dependent as usize] == 0 {
                ready.push(Reverse(dependent));
            }
        }
    }

    if schedule.len() != task_count {
        return Err(GraphError::CyclicDependency);
    }
    Ok(schedule)
}

fn subresources_overlap(a: u32, b: u32) -> bool {
    a == b || a == SUBRESOURCE_ALL || b == SUBRESOURCE_ALL
}

/// Whether two tasks' declared usages permit overlapped GPU execution.
///
/// Both lists must be sorted by `(resource id, subresource)`, which the
/// declaration phase guarantees; the check is then a linear merge scan.
///
/// Overlap is allowed only when every shared subresource is used in the
/// same state by both tasks, that state does not change across either
/// task, and neither task uses the subresource multiple times. Anything
/// else could need a barrier between the two tasks, which forces serial
/// execution. The test errs on the side of serializing.
pub fn can_execute_parallel(first: &[UsedResource], second: &[UsedResource]) -> bool {
    let mut i = 0;
    let mut j = 0;
    while i < first.len() && j < second.len() {
        let a = &first[i];
        let b = &second[j];
        if a.resource.id() < b.resource.id() {
            i += 1;
        } else if b.resource.id() < a.resource.id() {
            j += 1;
        } else {
            // Same resource: compare every overlapping subresource pair.
            // Entry counts per resource are tiny, so the nested walk is
            // cheaper than anything smarter.
            let i_end = first[i..]
                .iter()
                .position(|u| u.resource.id() != a.resource.id())
                .map_or(first.len(), |p| i + p);
            let j_end = second[j..]
                .iter()
                .position(|u| u.resource.id() != b.resource.id())
                .map_or(second.len(), |p| j + p);

            for ua in &first[i..i_end] {
                for ub in &second[j..j_end] {
                    if !subresources_overlap(ua.subresource, ub.subresource) {
                        continue;
                    }
                    let stable = ua.first_state == ua.last_state
                        && ub.first_state == ub.last_state
                        && ua.first_state == ub.first_state;
                    if !stable || ua.multiple_use || ub.multiple_use {
                        return false;
                    }
                }
            }
            i = i_end;
            j = j_end;
        }
    }
    true
}

/// Compute the transition barriers a segment needs before it runs.
///
/// A barrier is emitted only where the last-known subresource state
/// differs from the declared first state; matching states cost nothing.
/// Whole-resource usages expand to one barrier per mismatching
/// subresource. Resources created with split barriers get a begin/end
/// pair instead of a whole barrier.
pub(crate) fn compute_barriers(usages: &[UsedResource]) -> Vec<ResourceBarrier> {
    let mut barriers = Vec::new();
    for usage in usages {
        let split = usage.resource.descriptor().split_barriers;
        let mut push = |subresource: u32, from: ResourceState| {
            let barrier = ResourceBarrier {
                resource: usage.resource.id(),
                subresource,
                from,
                to: usage.first_state,
                split: BarrierSplit::Whole,
            };
            if split {
                barriers.push(ResourceBarrier {
                    split: BarrierSplit::Begin,
                    ..barrier
                });
                barriers.push(ResourceBarrier {
                    split: BarrierSplit::End,
                    ..barrier
                });
            } else {
                barriers.push(barrier);
            }
        };

        if usage.subresource == SUBRESOURCE_ALL {
            for sub in 0..usage.resource.subresource_count() {
                let current = usage.resource.read_state(sub);
                if current != usage.first_state {
                    push(sub, current);
                }
            }
        } else {
            let current = usage.resource.read_state(usage.subresource);
            if current != usage.first_state {
                push(usage.subresource, current);
            }
        }
    }
    barriers
}

/// Commit the states a segment leaves its resources in.
///
/// Runs during analysis, immediately after the segment's barriers are
/// computed, so the next segment's barriers are derived from up-to-date
/// states. Analysis is single-threaded, which keeps this the only writer.
pub(crate) fn update_resource_states(usages: &[UsedResource]) {
    for usage in usages {
        if usage.subresource == SUBRESOURCE_ALL {
            usage.resource.record_state_all(usage.last_state);
        } else {
            usage.resource.record_state(usage.subresource, usage.last_state);
        }
    }
}

/// What a segment executes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ScheduledItem {
    /// The frame's staged uploads, copied before any task runs.
    Upload,
    /// One pipeline task.
    Task(TaskHandle),
}

/// One command list's worth of planned work.
pub(crate) struct SegmentPlan {
    pub(crate) item: ScheduledItem,
    pub(crate) queue: QueueType,
    pub(crate) usages: Vec<UsedResource>,
    pub(crate) scratch_bytes: u64,
    pub(crate) barriers: Vec<ResourceBarrier>,
    /// Whether this segment must wait for the previous one's fence.
    pub(crate) wait_previous: bool,
}

/// The full analysis result for one frame.
pub(crate) struct FramePlan {
    pub(crate) segments: Vec<SegmentPlan>,
}

/// Run the analysis pass.
///
/// Orders the tasks, runs every task's declaration phase, derives
/// barriers, commits states, and decides the fence chain. No commands
/// are recorded and nothing touches the device.
pub(crate) fn plan_frame(
    pipeline: &mut Pipeline,
    uploads: &[UploadDescription],
) -> Result<FramePlan, GraphicsError> {
    let schedule = make_schedule(pipeline.task_count(), &pipeline.dependency_table())?;

    let mut segments: Vec<SegmentPlan> = Vec::with_capacity(schedule.len() + 1);

    if !uploads.is_empty() {
        let mut ctx = SetupContext::new();
        for upload in uploads {
            ctx.declare(
                &upload.destination,
                upload.subresource,
                ResourceState::COPY_DEST,
                ResourceState::COPY_DEST,
            )?;
        }
        let (usages, _) = ctx.into_usages();
        segments.push(SegmentPlan {
            item: ScheduledItem::Upload,
            queue: QueueType::Graphics,
            usages,
            scratch_bytes: 0,
            barriers: Vec::new(),
            wait_previous: false,
        });
    }

    for handle in schedule {
        let node = pipeline
            .node_mut(handle)
            .ok_or(GraphError::InvalidTaskHandle(handle))?;
        let mut ctx = SetupContext::new();
        node.task.setup(&mut ctx)?;
        let (usages, scratch_bytes) = ctx.into_usages();
        segments.push(SegmentPlan {
            item: ScheduledItem::Task(handle),
            queue: node.task.queue(),
            usages,
            scratch_bytes,
            barriers: Vec::new(),
            wait_previous: false,
        });
    }

    // Barriers derive from committed states, so compute and commit in
    // submission order.
    for index in 0..segments.len() {
        if index > 0 {
            let (before, after) = segments.split_at_mut(index);
            let prev = &before[index - 1];
            let cur = &mut after[0];
            cur.wait_previous = prev.queue != cur.queue
                || !can_execute_parallel(&prev.usages, &cur.usages);
        }
        let segment = &mut segments[index];
        segment.barriers = compute_barriers(&segment.usages);
        update_resource_states(&segment.usages);
    }

    log::trace!("planned frame with {} segments", segments.len());
    Ok(FramePlan { segments })
}
