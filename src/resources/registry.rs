//! Resource registry: creation and identity assignment.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::backend::RenderDevice;
use crate::error::GraphicsError;
use crate::types::ResourceDescriptor;

use super::{MemoryObject, ResourceId};

/// Creates GPU resources and assigns their stable identity keys.
///
/// The registry is the only path to a [`MemoryObject`]; every resource it
/// hands out carries a monotonically increasing [`ResourceId`], giving the
/// scheduler a total order over resources without hashing or pointer
/// comparisons.
pub struct ResourceRegistry {
    device: Arc<dyn RenderDevice>,
    next_id: AtomicU64,
}

impl ResourceRegistry {
    /// Create a registry backed by `device`.
    pub fn new(device: Arc<dyn RenderDevice>) -> Self {
        Self {
            device,
            next_id: AtomicU64::new(0),
        }
    }

    /// Create a committed resource.
    ///
    /// Creation failures (out of memory, invalid descriptor) propagate to
    /// the frame driver; they are recoverable via the failure-rendering
    /// path.
    pub fn create(&self, descriptor: ResourceDescriptor) -> Result<MemoryObject, GraphicsError> {
        let handle = self.device.create_resource(&descriptor)?;
        let id = ResourceId(self.next_id.fetch_add(1, Ordering::Relaxed));
        log::debug!(
            "created resource {:?} ({:?}, {} subresources)",
            id,
            descriptor.label,
            descriptor.subresource_count()
        );
        Ok(MemoryObject::new(id, handle, descriptor, self.device.clone()))
    }

    /// The device this registry creates resources on.
    pub fn device(&self) -> &Arc<dyn RenderDevice> {
        &self.device
    }
}
