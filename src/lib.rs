//! Frame-graph scheduling core for the Vermilion rendering engine.
//!
//! The crate turns a declared graph of rendering tasks into ordered,
//! minimally-synchronized GPU submissions:
//!
//! * [`graph`] holds the task graph: [`GraphicsTask`] implementations
//!   assembled into a validated [`Pipeline`].
//! * [`scheduler`] drives a pipeline each frame through an analysis pass
//!   (ordering, parallelism, barrier derivation) and a serial execution
//!   pass (recording and submission).
//! * [`resources`] tracks every GPU resource's per-subresource
//!   synchronization state across frames.
//! * [`pool`] recycles command allocators, scratch memory, and volatile
//!   descriptor heaps behind GPU fences.
//! * [`backend`] is the narrow device boundary, with a [`NullDevice`]
//!   backend for tests and headless use.
//!
//! ```
//! use std::sync::Arc;
//! use vermilion_graphics::{
//!     GraphicsError, GraphicsTask, NullDevice, PipelineBuilder, RenderContext,
//!     ResourceDescriptor, ResourceRegistry, ResourceState, Scheduler,
//!     SetupContext,
//! };
//!
//! struct ClearTask {
//!     target: vermilion_graphics::MemoryObject,
//! }
//!
//! impl GraphicsTask for ClearTask {
//!     fn setup(&mut self, ctx: &mut SetupContext) -> Result<(), GraphicsError> {
//!         ctx.declare_read(&self.target, 0, ResourceState::RENDER_TARGET)?;
//!         Ok(())
//!     }
//!
//!     fn execute(&mut self, ctx: &mut RenderContext<'_>) -> Result<(), GraphicsError> {
//!         let id = self.target.id();
//!         ctx.command_list().clear_target(id, [0.0, 0.0, 0.0, 1.0]);
//!         Ok(())
//!     }
//! }
//!
//! # fn main() -> Result<(), GraphicsError> {
//! let device = Arc::new(NullDevice::new());
//! let registry = ResourceRegistry::new(device.clone());
//! let target = registry.create(ResourceDescriptor::texture_2d(
//!     1280,
//!     720,
//!     Default::default(),
//! ))?;
//!
//! let mut builder = PipelineBuilder::new();
//! builder.add_task("clear", Box::new(ClearTask { target }));
//!
//! let mut scheduler = Scheduler::new(device);
//! scheduler.set_pipeline(builder.build()?);
//! # Ok(())
//! # }
//! ```

pub mod backend;
pub mod error;
pub mod frame;
pub mod graph;
pub mod pool;
pub mod resources;
pub mod scheduler;
pub mod types;
pub mod upload;

pub use backend::{
    BarrierSplit, Command, CommandAllocator, CommandList, Fence, FenceStatus, GpuResourceHandle,
    NullDevice, RenderDevice, ResourceBarrier, Submission,
};
pub use error::{GraphError, GraphicsError};
pub use frame::FrameContext;
pub use graph::{
    GraphicsTask, Pipeline, PipelineBuilder, RenderContext, SetupContext, TaskHandle, UsedResource,
};
pub use resources::{MemoryObject, ResourceId, ResourceRegistry};
pub use scheduler::Scheduler;
pub use types::{
    QueueType, ResourceDescriptor, ResourceKind, ResourceState, TextureFormat, SUBRESOURCE_ALL,
};
pub use upload::{UploadDescription, UploadManager};

/// Crate version, for logging at engine startup.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
