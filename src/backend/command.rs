//! Host-side command recording.
//!
//! A [`CommandList`] is a CPU-side buffer of portable [`Command`]s recorded
//! by tasks and the scheduler. The device boundary translates recorded
//! commands at submission time; the scheduler itself never touches a native
//! command-list object.
//!
//! A [`CommandAllocator`] owns the backing storage a list records into.
//! Allocators outlive the lists recorded from them and are recycled through
//! the [`CommandListPool`](crate::pool::CommandListPool) once the GPU has
//! finished with the submission.

use crate::resources::ResourceId;
use crate::types::{QueueType, ResourceState};

/// How a state-transition barrier is split.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BarrierSplit {
    /// Single whole barrier at the transition point (default).
    #[default]
    Whole,
    /// Begin half of a split barrier.
    Begin,
    /// End half of a split barrier.
    End,
}

/// A resource state-transition barrier.
///
/// Transitions one subresource from `from` to `to`. Produced by the
/// scheduler's dry-run analysis and recorded at the head of the command
/// list that first uses the resource in the new state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceBarrier {
    /// The resource being transitioned.
    pub resource: ResourceId,
    /// Subresource index. Always a concrete index; the
    /// [`SUBRESOURCE_ALL`](crate::types::SUBRESOURCE_ALL) sentinel is
    /// expanded before barriers are emitted.
    pub subresource: u32,
    /// State the subresource is currently in.
    pub from: ResourceState,
    /// State the subresource must be in.
    pub to: ResourceState,
    /// Split mode.
    pub split: BarrierSplit,
}

/// A single recorded GPU command.
///
/// The vocabulary is deliberately small: enough for tasks to express draws,
/// dispatches, clears and uploads, and for tests to assert on the exact
/// command stream a frame produced.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// State-transition barrier.
    Transition(ResourceBarrier),
    /// Clear a render target to a solid color.
    ClearTarget {
        /// The target resource.
        resource: ResourceId,
        /// RGBA clear color.
        color: [f32; 4],
    },
    /// Draw call batch recorded by a task.
    Draw {
        /// Debug label.
        label: String,
    },
    /// Compute dispatch recorded by a task.
    Dispatch {
        /// Debug label.
        label: String,
    },
    /// Copy staged bytes into a resource.
    Upload {
        /// Destination resource.
        destination: ResourceId,
        /// Destination subresource.
        subresource: u32,
        /// Number of bytes copied.
        bytes: u64,
    },
    /// Debug marker.
    Marker(String),
}

/// Backing storage for command recording.
///
/// The allocator owns the command buffer memory. Resetting clears recorded
/// commands but preserves the allocation, so recycled allocators record
/// without reallocating.
#[derive(Debug, Default)]
pub struct CommandAllocator {
    commands: Vec<Command>,
}

impl CommandAllocator {
    /// Create a new empty allocator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear recorded commands, preserving capacity.
    pub fn reset(&mut self) {
        self.commands.clear();
    }

    /// Number of commands currently recorded.
    pub fn command_count(&self) -> usize {
        self.commands.len()
    }
}

/// A command list recording into a pooled allocator.
///
/// Created by the scheduler for each command-list segment. Finishing the
/// list returns the allocator (with its recorded commands) so it can be
/// submitted and later recycled.
#[derive(Debug)]
pub struct CommandList {
    queue: QueueType,
    allocator: CommandAllocator,
}

impl CommandList {
    /// Begin recording into `allocator` for submission to `queue`.
    pub fn begin(queue: QueueType, allocator: CommandAllocator) -> Self {
        Self { queue, allocator }
    }

    /// The queue this list targets.
    pub fn queue(&self) -> QueueType {
        self.queue
    }

    /// Record a state-transition barrier.
    pub fn transition(&mut self, barrier: ResourceBarrier) {
        self.allocator.commands.push(Command::Transition(barrier));
    }

    /// Record a render-target clear.
    pub fn clear_target(&mut self, resource: ResourceId, color: [f32; 4]) {
        self.allocator
            .commands
            .push(Command::ClearTarget { resource, color });
    }

    /// Record a draw batch.
    pub fn draw(&mut self, label: impl Into<String>) {
        self.allocator.commands.push(Command::Draw {
            label: label.into(),
        });
    }

    /// Record a compute dispatch.
    pub fn dispatch(&mut self, label: impl Into<String>) {
        self.allocator.commands.push(Command::Dispatch {
            label: label.into(),
        });
    }

    /// Record an upload copy.
    pub fn upload(&mut self, destination: ResourceId, subresource: u32, bytes: u64) {
        self.allocator.commands.push(Command::Upload {
            destination,
            subresource,
            bytes,
        });
    }

    /// Record a debug marker.
    pub fn marker(&mut self, label: impl Into<String>) {
        self.allocator.commands.push(Command::Marker(label.into()));
    }

    /// Recorded commands so far.
    pub fn commands(&self) -> &[Command] {
        &self.allocator.commands
    }

    /// Finish recording, returning the allocator with the recorded commands.
    pub fn finish(self) -> CommandAllocator {
        self.allocator
    }
}
