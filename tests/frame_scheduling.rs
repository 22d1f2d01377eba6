//! End-to-end frame scheduling tests against the null device.

use std::sync::Arc;
use std::time::Duration;

use vermilion_graphics::{
    Command, FrameContext, GraphError, GraphicsError, GraphicsTask, MemoryObject, NullDevice,
    PipelineBuilder, QueueType, RenderContext, ResourceDescriptor, ResourceRegistry,
    ResourceState, Scheduler, SetupContext, TextureFormat, SUBRESOURCE_ALL,
};

/// Task that declares one usage and records one draw.
struct UseTask {
    target: MemoryObject,
    subresource: u32,
    first_state: ResourceState,
    last_state: ResourceState,
    queue: QueueType,
    label: &'static str,
}

impl UseTask {
    fn reading(target: &MemoryObject, state: ResourceState, label: &'static str) -> Box<Self> {
        Box::new(Self {
            target: target.clone(),
            subresource: 0,
            first_state: state,
            last_state: state,
            queue: QueueType::Graphics,
            label,
        })
    }
}

impl GraphicsTask for UseTask {
    fn setup(&mut self, ctx: &mut SetupContext) -> Result<(), GraphicsError> {
        ctx.declare(&self.target, self.subresource, self.first_state, self.last_state)?;
        Ok(())
    }

    fn execute(&mut self, ctx: &mut RenderContext<'_>) -> Result<(), GraphicsError> {
        ctx.command_list().draw(self.label);
        Ok(())
    }

    fn queue(&self) -> QueueType {
        self.queue
    }
}

struct Harness {
    device: Arc<NullDevice>,
    registry: ResourceRegistry,
    scheduler: Scheduler,
}

impl Harness {
    fn new() -> Self {
        let _ = env_logger::builder().is_test(true).try_init();
        let device = Arc::new(NullDevice::new());
        Self {
            registry: ResourceRegistry::new(device.clone()),
            scheduler: Scheduler::new(device.clone()),
            device,
        }
    }

    fn frame(&self, index: u64) -> FrameContext {
        let back_buffer = self
            .registry
            .create(
                ResourceDescriptor::texture_2d(16, 16, TextureFormat::Bgra8Unorm)
                    .with_label("back buffer"),
            )
            .unwrap();
        FrameContext {
            frame_index: index,
            back_buffer,
            frame_time: Duration::from_millis(16),
        }
    }

    fn texture(&self, mips: u32) -> MemoryObject {
        self.registry
            .create(
                ResourceDescriptor::texture_2d(16, 16, TextureFormat::Rgba8Unorm)
                    .with_mip_levels(mips),
            )
            .unwrap()
    }
}

fn barrier_count(commands: &[Command]) -> usize {
    commands
        .iter()
        .filter(|c| matches!(c, Command::Transition(_)))
        .count()
}

#[test]
fn shared_readers_run_without_fence_waits() {
    let mut h = Harness::new();
    let texture = h.texture(1);
    // Settle the texture into the shared read state up front.
    let mut builder = PipelineBuilder::new();
    builder.add_task(
        "settle",
        UseTask::reading(&texture, ResourceState::SHADER_RESOURCE, "settle"),
    );
    builder.add_task(
        "read a",
        UseTask::reading(&texture, ResourceState::SHADER_RESOURCE, "read a"),
    );
    builder.add_task(
        "read b",
        UseTask::reading(&texture, ResourceState::SHADER_RESOURCE, "read b"),
    );
    h.scheduler.set_pipeline(builder.build().unwrap());

    h.scheduler.execute(&h.frame(0)).unwrap();

    let submissions = h.device.submissions();
    assert_eq!(submissions.len(), 3);
    // Only the first use transitions out of COMMON.
    assert_eq!(barrier_count(&submissions[0].commands), 1);
    assert_eq!(barrier_count(&submissions[1].commands), 0);
    assert_eq!(barrier_count(&submissions[2].commands), 0);
    // The two pure readers need no fence between them.
    assert_eq!(submissions[1].wait_count, 0);
    assert_eq!(submissions[2].wait_count, 0);
}

#[test]
fn write_then_read_injects_one_barrier_and_serializes() {
    let mut h = Harness::new();
    let texture = h.texture(1);

    let mut builder = PipelineBuilder::new();
    let write = builder.add_task(
        "write",
        UseTask::reading(&texture, ResourceState::RENDER_TARGET, "write"),
    );
    let read = builder.add_task(
        "read",
        UseTask::reading(&texture, ResourceState::SHADER_RESOURCE, "read"),
    );
    builder.add_dependency(read, write).unwrap();
    h.scheduler.set_pipeline(builder.build().unwrap());

    h.scheduler.execute(&h.frame(0)).unwrap();

    let submissions = h.device.submissions();
    assert_eq!(submissions.len(), 2);
    assert_eq!(barrier_count(&submissions[1].commands), 1);
    match &submissions[1].commands[0] {
        Command::Transition(barrier) => {
            assert_eq!(barrier.from, ResourceState::RENDER_TARGET);
            assert_eq!(barrier.to, ResourceState::SHADER_RESOURCE);
        }
        other => panic!("expected transition, got {other:?}"),
    }
    assert_eq!(submissions[1].wait_count, 1);
}

#[test]
fn states_persist_across_frames() {
    let mut h = Harness::new();
    let texture = h.texture(1);

    let mut builder = PipelineBuilder::new();
    builder.add_task(
        "read",
        UseTask::reading(&texture, ResourceState::SHADER_RESOURCE, "read"),
    );
    h.scheduler.set_pipeline(builder.build().unwrap());

    h.scheduler.execute(&h.frame(0)).unwrap();
    h.scheduler.execute(&h.frame(1)).unwrap();

    let submissions = h.device.submissions();
    assert_eq!(submissions.len(), 2);
    // Frame 0 transitions from COMMON; frame 1 finds the state in place.
    assert_eq!(barrier_count(&submissions[0].commands), 1);
    assert_eq!(barrier_count(&submissions[1].commands), 0);
}

#[test]
fn whole_resource_usage_expands_per_subresource() {
    let mut h = Harness::new();
    let texture = h.texture(3);

    let mut builder = PipelineBuilder::new();
    builder.add_task(
        "read all",
        Box::new(UseTask {
            target: texture.clone(),
            subresource: SUBRESOURCE_ALL,
            first_state: ResourceState::SHADER_RESOURCE,
            last_state: ResourceState::SHADER_RESOURCE,
            queue: QueueType::Graphics,
            label: "read all",
        }),
    );
    h.scheduler.set_pipeline(builder.build().unwrap());

    h.scheduler.execute(&h.frame(0)).unwrap();

    let submissions = h.device.submissions();
    // One barrier per mip, each with a concrete subresource index.
    assert_eq!(barrier_count(&submissions[0].commands), 3);
    for command in &submissions[0].commands {
        if let Command::Transition(barrier) = command {
            assert_ne!(barrier.subresource, SUBRESOURCE_ALL);
        }
    }
    for sub in 0..3 {
        assert_eq!(texture.read_state(sub), ResourceState::SHADER_RESOURCE);
    }
}

#[test]
fn schedule_ties_break_by_declaration_order() {
    let mut h = Harness::new();
    let a = h.texture(1);
    let b = h.texture(1);
    let c = h.texture(1);

    // Diamond: root feeds two independent readers, then a join.
    let mut builder = PipelineBuilder::new();
    let root = builder.add_task("root", UseTask::reading(&a, ResourceState::RENDER_TARGET, "root"));
    let left = builder.add_task("left", UseTask::reading(&b, ResourceState::RENDER_TARGET, "left"));
    let right =
        builder.add_task("right", UseTask::reading(&c, ResourceState::RENDER_TARGET, "right"));
    let join = builder.add_task("join", UseTask::reading(&a, ResourceState::RENDER_TARGET, "join"));
    builder.add_dependency(left, root).unwrap();
    builder.add_dependency(right, root).unwrap();
    builder.add_dependency(join, left).unwrap();
    builder.add_dependency(join, right).unwrap();
    h.scheduler.set_pipeline(builder.build().unwrap());

    h.scheduler.execute(&h.frame(0)).unwrap();

    let labels: Vec<String> = h
        .device
        .submissions()
        .iter()
        .flat_map(|s| s.commands.iter())
        .filter_map(|c| match c {
            Command::Draw { label } => Some(label.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(labels, vec!["root", "left", "right", "join"]);
}

#[test]
fn cross_queue_segments_wait_on_fences() {
    let mut h = Harness::new();
    let a = h.texture(1);
    let b = h.texture(1);

    let mut builder = PipelineBuilder::new();
    builder.add_task("draw", UseTask::reading(&a, ResourceState::RENDER_TARGET, "draw"));
    builder.add_task(
        "compute",
        Box::new(UseTask {
            target: b,
            subresource: 0,
            first_state: ResourceState::UNORDERED_ACCESS,
            last_state: ResourceState::UNORDERED_ACCESS,
            queue: QueueType::Compute,
            label: "compute",
        }),
    );
    h.scheduler.set_pipeline(builder.build().unwrap());

    h.scheduler.execute(&h.frame(0)).unwrap();

    let submissions = h.device.submissions();
    assert_eq!(submissions.len(), 2);
    assert_eq!(submissions[0].queue, QueueType::Graphics);
    assert_eq!(submissions[1].queue, QueueType::Compute);
    // Disjoint resources, but the queue switch still fences.
    assert_eq!(submissions[1].wait_count, 1);
}

#[test]
fn cyclic_pipeline_fails_at_build() {
    let h = Harness::new();
    let texture = h.texture(1);

    let mut builder = PipelineBuilder::new();
    let a = builder.add_task("a", UseTask::reading(&texture, ResourceState::RENDER_TARGET, "a"));
    let b = builder.add_task("b", UseTask::reading(&texture, ResourceState::RENDER_TARGET, "b"));
    builder.add_dependency(a, b).unwrap();
    builder.add_dependency(b, a).unwrap();

    assert_eq!(builder.build().unwrap_err(), GraphError::CyclicDependency);
}

#[test]
fn uploads_run_before_their_consumers() {
    let mut h = Harness::new();
    let mesh = h.registry.create(ResourceDescriptor::buffer(1024)).unwrap();

    let mut builder = PipelineBuilder::new();
    builder.add_task(
        "draw mesh",
        Box::new(UseTask {
            target: mesh.clone(),
            subresource: 0,
            first_state: ResourceState::VERTEX_AND_CONSTANT_BUFFER,
            last_state: ResourceState::VERTEX_AND_CONSTANT_BUFFER,
            queue: QueueType::Graphics,
            label: "draw mesh",
        }),
    );
    h.scheduler.set_pipeline(builder.build().unwrap());

    h.scheduler
        .upload_manager()
        .stage(&mesh, 0, vec![0xABu8; 512])
        .unwrap();
    h.scheduler.execute(&h.frame(0)).unwrap();

    let submissions = h.device.submissions();
    assert_eq!(submissions.len(), 2);
    assert!(submissions[0].commands.contains(&Command::Upload {
        destination: mesh.id(),
        subresource: 0,
        bytes: 512,
    }));
    // The consumer transitions the buffer out of the upload state and
    // must wait for the copy.
    assert_eq!(barrier_count(&submissions[1].commands), 1);
    assert_eq!(submissions[1].wait_count, 1);
}

#[test]
fn conflicting_declarations_fail_the_frame() {
    struct ConflictedTask {
        target: MemoryObject,
    }

    impl GraphicsTask for ConflictedTask {
        fn setup(&mut self, ctx: &mut SetupContext) -> Result<(), GraphicsError> {
            ctx.declare_read(&self.target, 0, ResourceState::RENDER_TARGET)?;
            ctx.declare_read(&self.target, 0, ResourceState::SHADER_RESOURCE)?;
            Ok(())
        }

        fn execute(&mut self, _ctx: &mut RenderContext<'_>) -> Result<(), GraphicsError> {
            Ok(())
        }
    }

    let mut h = Harness::new();
    let texture = h.texture(1);

    let mut builder = PipelineBuilder::new();
    builder.add_task("conflicted", Box::new(ConflictedTask { target: texture }));
    h.scheduler.set_pipeline(builder.build().unwrap());

    // Graph errors propagate instead of degrading to the failure screen.
    let err = h.scheduler.execute(&h.frame(0)).unwrap_err();
    assert!(matches!(
        err,
        GraphicsError::Graph(GraphError::ConflictingStates { .. })
    ));
    assert_eq!(h.device.submission_count(), 0);
}

#[test]
fn recoverable_failure_presents_failure_screen() {
    struct OutOfMemoryTask;

    impl GraphicsTask for OutOfMemoryTask {
        // Setup-time allocation failure: recoverable at frame granularity.
        fn setup(&mut self, _ctx: &mut SetupContext) -> Result<(), GraphicsError> {
            Err(GraphicsError::OutOfMemory)
        }

        fn execute(&mut self, _ctx: &mut RenderContext<'_>) -> Result<(), GraphicsError> {
            Ok(())
        }
    }

    let mut h = Harness::new();
    let mut builder = PipelineBuilder::new();
    builder.add_task("oom", Box::new(OutOfMemoryTask));
    h.scheduler.set_pipeline(builder.build().unwrap());

    let frame = h.frame(0);
    h.scheduler.execute(&frame).unwrap();

    let submissions = h.device.submissions();
    assert_eq!(submissions.len(), 1);
    assert!(submissions[0]
        .commands
        .contains(&Command::Marker("failure screen".into())));
    assert_eq!(frame.back_buffer.read_state(0), ResourceState::PRESENT);
}

#[test]
fn empty_pipeline_is_a_noop_frame() {
    let mut h = Harness::new();
    h.scheduler.execute(&h.frame(0)).unwrap();
    assert_eq!(h.device.submission_count(), 0);
}

#[test]
fn release_resources_allows_full_reclaim() {
    struct CachingTask {
        cached: Option<MemoryObject>,
    }

    impl GraphicsTask for CachingTask {
        fn setup(&mut self, ctx: &mut SetupContext) -> Result<(), GraphicsError> {
            if let Some(cached) = &self.cached {
                ctx.declare_read(cached, 0, ResourceState::SHADER_RESOURCE)?;
            }
            Ok(())
        }

        fn execute(&mut self, _ctx: &mut RenderContext<'_>) -> Result<(), GraphicsError> {
            Ok(())
        }

        fn release_resources(&mut self) {
            self.cached = None;
        }
    }

    let mut h = Harness::new();
    let cached = h.texture(1);
    let baseline = h.device.live_resource_count();

    let mut builder = PipelineBuilder::new();
    builder.add_task("caching", Box::new(CachingTask { cached: Some(cached.clone()) }));
    h.scheduler.set_pipeline(builder.build().unwrap());

    h.scheduler.execute(&h.frame(0)).unwrap();
    drop(cached);
    // The task still holds its clone, so the device resource survives.
    assert_eq!(h.device.live_resource_count(), baseline);

    h.scheduler.release_resources();
    assert_eq!(h.device.live_resource_count(), baseline - 1);

    // A fresh pipeline schedules normally afterwards.
    let replacement = h.texture(1);
    let mut builder = PipelineBuilder::new();
    builder.add_task(
        "fresh",
        UseTask::reading(&replacement, ResourceState::SHADER_RESOURCE, "fresh"),
    );
    h.scheduler.set_pipeline(builder.build().unwrap());
    h.scheduler.execute(&h.frame(1)).unwrap();
}
