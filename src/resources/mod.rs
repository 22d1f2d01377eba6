//! GPU resource handles and synchronization-state tracking.
//!
//! Every GPU-visible resource is wrapped in a [`MemoryObject`]: a
//! cheap-to-clone handle carrying the device resource, its descriptor, a
//! stable totally-ordered [`ResourceId`], and the last-known
//! synchronization state of each subresource. States persist between
//! frames so the next frame's first use observes the resource's actual
//! state.

mod memory;
mod registry;

pub use memory::MemoryObject;
pub use registry::ResourceRegistry;

/// Stable, totally-ordered identity of a GPU resource.
///
/// Assigned monotonically at resource creation. Used to sort resource
/// usages for the scheduler's merge-scan comparisons; never reused, so
/// identity survives allocator and pool recycling (unlike pointer-based
/// identity).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ResourceId(pub(crate) u64);

impl ResourceId {
    /// Raw numeric value, for logging.
    pub fn raw(self) -> u64 {
        self.0
    }
}
