//! Staging of CPU data for GPU upload.
//!
//! Game code can request uploads at any time between frames. The manager
//! queues them; at the start of the next frame the scheduler drains the
//! queue and copies the data before any task that reads the destinations
//! runs.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::GraphicsError;
use crate::resources::MemoryObject;
use crate::types::SUBRESOURCE_ALL;

/// One queued upload.
#[derive(Debug, Clone)]
pub struct UploadDescription {
    /// Bytes to copy. Shared so staging never duplicates the payload.
    pub data: Arc<[u8]>,
    /// Resource the data is copied into.
    pub destination: MemoryObject,
    /// Destination subresource.
    pub subresource: u32,
}

/// Collects upload requests between frames.
#[derive(Default)]
pub struct UploadManager {
    pending: Mutex<Vec<UploadDescription>>,
}

impl UploadManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `data` for upload into `destination` at the start of the
    /// next frame.
    pub fn stage(
        &self,
        destination: &MemoryObject,
        subresource: u32,
        data: impl Into<Arc<[u8]>>,
    ) -> Result<(), GraphicsError> {
        if subresource != SUBRESOURCE_ALL && subresource >= destination.subresource_count() {
            return Err(GraphicsError::InvalidParameter(format!(
                "upload subresource {} out of range for resource with {} subresources",
                subresource,
                destination.subresource_count()
            )));
        }
        let data = data.into();
        if data.is_empty() {
            return Err(GraphicsError::InvalidParameter(
                "upload payload is empty".into(),
            ));
        }

        log::trace!(
            "staged {} byte upload to {:?} subresource {}",
            data.len(),
            destination.id(),
            subresource
        );
        self.pending.lock().push(UploadDescription {
            data,
            destination: destination.clone(),
            subresource,
        });
        Ok(())
    }

    /// Drain all queued uploads, in staging order.
    pub(crate) fn take_pending(&self) -> Vec<UploadDescription> {
        std::mem::take(&mut *self.pending.lock())
    }

    /// Number of uploads currently queued.
    pub fn pending_count(&self) -> usize {
        self.pending.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::NullDevice;
    use crate::resources::ResourceRegistry;
    use crate::types::ResourceDescriptor;

    fn buffer() -> MemoryObject {
        let registry = ResourceRegistry::new(Arc::new(NullDevice::new()));
        registry.create(ResourceDescriptor::buffer(64)).unwrap()
    }

    #[test]
    fn test_stage_and_drain_preserves_order() {
        let manager = UploadManager::new();
        let buf = buffer();

        manager.stage(&buf, 0, vec![1u8]).unwrap();
        manager.stage(&buf, 0, vec![2u8]).unwrap();
        assert_eq!(manager.pending_count(), 2);

        let drained = manager.take_pending();
        assert_eq!(drained.len(), 2);
        assert_eq!(&*drained[0].data, &[1]);
        assert_eq!(&*drained[1].data, &[2]);
        assert_eq!(manager.pending_count(), 0);
    }

    #[test]
    fn test_stage_rejects_bad_subresource() {
        let manager = UploadManager::new();
        let buf = buffer();
        let err = manager.stage(&buf, 3, vec![1u8]).unwrap_err();
        assert!(matches!(err, GraphicsError::InvalidParameter(_)));
    }

    #[test]
    fn test_stage_rejects_empty_payload() {
        let manager = UploadManager::new();
        let buf = buffer();
        let err = manager.stage(&buf, 0, Vec::new()).unwrap_err();
        assert!(matches!(err, GraphicsError::InvalidParameter(_)));
    }
}
