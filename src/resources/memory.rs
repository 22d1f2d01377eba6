//! Resource handle with per-subresource state tracking.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::backend::{GpuResourceHandle, RenderDevice};
use crate::types::{ResourceDescriptor, ResourceState, SUBRESOURCE_ALL};

struct MemoryInner {
    id: super::ResourceId,
    handle: GpuResourceHandle,
    descriptor: ResourceDescriptor,
    /// Last-known synchronization state per subresource.
    ///
    /// Mutated only by the scheduler's analysis pass (single-writer);
    /// tasks read declared intents and record commands, never this table.
    states: Mutex<Vec<ResourceState>>,
    device: Arc<dyn RenderDevice>,
}

impl Drop for MemoryInner {
    fn drop(&mut self) {
        self.device.destroy_resource(self.handle);
    }
}

/// Handle to a GPU resource plus its synchronization-state table.
///
/// Clones share the underlying resource and state table. The device
/// resource is destroyed when the last clone drops.
#[derive(Clone)]
pub struct MemoryObject {
    inner: Arc<MemoryInner>,
}

impl MemoryObject {
    pub(crate) fn new(
        id: super::ResourceId,
        handle: GpuResourceHandle,
        descriptor: ResourceDescriptor,
        device: Arc<dyn RenderDevice>,
    ) -> Self {
        let count = descriptor.subresource_count() as usize;
        Self {
            inner: Arc::new(MemoryInner {
                id,
                handle,
                descriptor,
                // New resources start in COMMON: barrier logic never
                // guesses, so the first real use pays a full transition.
                states: Mutex::new(vec![ResourceState::COMMON; count]),
                device,
            }),
        }
    }

    /// Stable identity key.
    pub fn id(&self) -> super::ResourceId {
        self.inner.id
    }

    /// The device handle backing this resource.
    pub fn handle(&self) -> GpuResourceHandle {
        self.inner.handle
    }

    /// The descriptor this resource was created from.
    pub fn descriptor(&self) -> &ResourceDescriptor {
        &self.inner.descriptor
    }

    /// Number of individually-stateful subresources.
    pub fn subresource_count(&self) -> u32 {
        self.inner.descriptor.subresource_count()
    }

    /// Last-known state of a subresource.
    ///
    /// Out-of-range indices report [`ResourceState::COMMON`], the
    /// safe-by-default assumption for unknown state.
    pub fn read_state(&self, subresource: u32) -> ResourceState {
        debug_assert_ne!(subresource, SUBRESOURCE_ALL, "read_state needs a concrete index");
        self.inner
            .states
            .lock()
            .get(subresource as usize)
            .copied()
            .unwrap_or(ResourceState::COMMON)
    }

    /// Commit a new state for a subresource.
    ///
    /// Only the scheduler's analysis pass calls this, after a segment's
    /// barriers have been decided.
    pub(crate) fn record_state(&self, subresource: u32, state: ResourceState) {
        let mut states = self.inner.states.lock();
        if let Some(slot) = states.get_mut(subresource as usize) {
            *slot = state;
        }
    }

    /// Commit a new state for every subresource.
    pub(crate) fn record_state_all(&self, state: ResourceState) {
        for slot in self.inner.states.lock().iter_mut() {
            *slot = state;
        }
    }
}

impl PartialEq for MemoryObject {
    fn eq(&self, other: &Self) -> bool {
        self.inner.id == other.inner.id
    }
}

impl Eq for MemoryObject {}

impl std::fmt::Debug for MemoryObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryObject")
            .field("id", &self.inner.id)
            .field("label", &self.inner.descriptor.label)
            .field("subresources", &self.subresource_count())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::NullDevice;
    use crate::resources::ResourceRegistry;
    use crate::types::TextureFormat;

    fn registry() -> (Arc<NullDevice>, ResourceRegistry) {
        let device = Arc::new(NullDevice::new());
        let registry = ResourceRegistry::new(device.clone());
        (device, registry)
    }

    #[test]
    fn test_states_start_common() {
        let (_device, registry) = registry();
        let tex = registry
            .create(
                ResourceDescriptor::texture_2d(16, 16, TextureFormat::Rgba8Unorm)
                    .with_mip_levels(3),
            )
            .unwrap();

        assert_eq!(tex.subresource_count(), 3);
        for sub in 0..3 {
            assert_eq!(tex.read_state(sub), ResourceState::COMMON);
        }
    }

    #[test]
    fn test_record_and_read_state() {
        let (_device, registry) = registry();
        let tex = registry
            .create(
                ResourceDescriptor::texture_2d(16, 16, TextureFormat::Rgba8Unorm)
                    .with_mip_levels(2),
            )
            .unwrap();

        tex.record_state(1, ResourceState::SHADER_RESOURCE);
        assert_eq!(tex.read_state(0), ResourceState::COMMON);
        assert_eq!(tex.read_state(1), ResourceState::SHADER_RESOURCE);

        tex.record_state_all(ResourceState::COPY_SOURCE);
        assert_eq!(tex.read_state(0), ResourceState::COPY_SOURCE);
        assert_eq!(tex.read_state(1), ResourceState::COPY_SOURCE);
    }

    #[test]
    fn test_clones_share_state() {
        let (_device, registry) = registry();
        let buf = registry.create(ResourceDescriptor::buffer(256)).unwrap();
        let clone = buf.clone();

        buf.record_state(0, ResourceState::COPY_DEST);
        assert_eq!(clone.read_state(0), ResourceState::COPY_DEST);
        assert_eq!(buf, clone);
    }

    #[test]
    #[should_panic]
    fn test_read_state_rejects_all_sentinel() {
        let (_device, registry) = registry();
        let buf = registry.create(ResourceDescriptor::buffer(256)).unwrap();
        let _ = buf.read_state(SUBRESOURCE_ALL);
    }

    #[test]
    fn test_out_of_range_reads_common() {
        let (_device, registry) = registry();
        let buf = registry.create(ResourceDescriptor::buffer(256)).unwrap();
        assert_eq!(buf.read_state(7), ResourceState::COMMON);
    }

    #[test]
    fn test_drop_destroys_device_resource() {
        let (device, registry) = registry();
        let buf = registry.create(ResourceDescriptor::buffer(256)).unwrap();
        let clone = buf.clone();
        assert_eq!(device.live_resource_count(), 1);

        drop(buf);
        assert_eq!(device.live_resource_count(), 1);
        drop(clone);
        assert_eq!(device.live_resource_count(), 0);
    }
}
