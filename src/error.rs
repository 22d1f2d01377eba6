//! Graphics error types.
//!
//! Errors are split into two layers: [`GraphError`] covers task-graph
//! construction problems that make scheduling impossible (never retried),
//! while [`GraphicsError`] covers device and per-frame failures that the
//! frame driver may recover from.

use thiserror::Error;

use crate::graph::TaskHandle;
use crate::resources::ResourceId;

/// Errors that make a task graph unusable.
///
/// These are construction-time errors: a pipeline that produces one of
/// these cannot be scheduled and the error is reported immediately.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    /// The task graph contains a cyclic dependency.
    ///
    /// Task graphs must be directed acyclic graphs. A cycle means tasks
    /// depend on each other in a way that makes execution impossible.
    #[error("task graph contains cyclic dependency")]
    CyclicDependency,

    /// An invalid task handle was encountered.
    #[error("invalid task handle: {0:?}")]
    InvalidTaskHandle(TaskHandle),

    /// A task declared two incompatible states for the same subresource.
    #[error("conflicting states declared for resource {resource:?} subresource {subresource}")]
    ConflictingStates {
        /// The resource with conflicting declarations.
        resource: ResourceId,
        /// The subresource index (or [`SUBRESOURCE_ALL`](crate::types::SUBRESOURCE_ALL)).
        subresource: u32,
    },

    /// A declared subresource index is out of range for the resource.
    #[error("subresource {subresource} out of range for resource {resource:?} ({count} subresources)")]
    SubresourceOutOfRange {
        /// The resource being declared.
        resource: ResourceId,
        /// The out-of-range index.
        subresource: u32,
        /// Actual number of subresources.
        count: u32,
    },
}

/// Errors that can occur in the graphics system at frame time.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphicsError {
    /// A task-graph construction error surfaced during setup.
    ///
    /// Fatal to the current pipeline; propagated to the caller instead of
    /// falling back to the failure screen.
    #[error(transparent)]
    Graph(#[from] GraphError),

    /// Failed to create a resource.
    #[error("resource creation failed: {0}")]
    ResourceCreationFailed(String),

    /// Out of GPU memory.
    #[error("out of GPU memory")]
    OutOfMemory,

    /// The GPU device was lost.
    ///
    /// Not recoverable by this subsystem; must be surfaced to a
    /// higher-level restart mechanism.
    #[error("GPU device lost")]
    DeviceLost,

    /// An invalid parameter was provided.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// An internal error occurred.
    #[error("internal error: {0}")]
    Internal(String),
}

impl GraphicsError {
    /// Whether the frame driver may fall back to the failure-rendering
    /// path instead of propagating this error.
    ///
    /// Graph-construction errors and device loss are never recoverable
    /// at frame granularity.
    pub fn is_frame_recoverable(&self) -> bool {
        !matches!(self, Self::Graph(_) | Self::DeviceLost)
    }
}
