use std::collections::BTreeMap;
use std::sync::Arc;

/// Opaque reference to an in-memory image blob, usable for display or
/// download. Handles are owned by the job that created them and must be
/// released explicitly, mirroring object-URL lifetimes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct HandleId(u64);

/// Raw image bytes plus media type. Cheap to clone; the payload is shared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageBlob {
    pub bytes: Arc<Vec<u8>>,
    pub media_type: String,
}

impl ImageBlob {
    pub fn new(bytes: impl Into<Vec<u8>>, media_type: impl Into<String>) -> Self {
        Self {
            bytes: Arc::new(bytes.into()),
            media_type: media_type.into(),
        }
    }

    pub fn len(&self) -> u64 {
        self.bytes.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Registry of live renderable handles.
///
/// Handle ids are never reused, so a stale id from a removed job resolves to
/// nothing rather than someone else's image.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HandleRegistry {
    next: u64,
    blobs: BTreeMap<HandleId, ImageBlob>,
}

impl HandleRegistry {
    /// Registers a blob and returns its handle.
    pub fn create(&mut self, blob: ImageBlob) -> HandleId {
        self.next += 1;
        let id = HandleId(self.next);
        self.blobs.insert(id, blob);
        id
    }

    /// Drops the blob behind `id`. Releasing an unknown id is a no-op.
    pub fn release(&mut self, id: HandleId) {
        self.blobs.remove(&id);
    }

    pub fn get(&self, id: HandleId) -> Option<&ImageBlob> {
        self.blobs.get(&id)
    }

    /// Number of live handles. Zero once every job released its images.
    pub fn live_count(&self) -> usize {
        self.blobs.len()
    }
}

#[cfg(test)]
mod tests {
    use super::{HandleRegistry, ImageBlob};

    #[test]
    fn released_handles_are_gone_and_ids_are_not_reused() {
        let mut registry = HandleRegistry::default();
        let first = registry.create(ImageBlob::new(vec![1u8], "image/png"));
        registry.release(first);
        assert!(registry.get(first).is_none());

        let second = registry.create(ImageBlob::new(vec![2u8], "image/png"));
        assert_ne!(first, second);
        assert_eq!(registry.live_count(), 1);
    }

    #[test]
    fn release_of_unknown_id_is_noop() {
        let mut registry = HandleRegistry::default();
        let id = registry.create(ImageBlob::new(vec![1u8], "image/png"));
        registry.release(id);
        registry.release(id);
        assert_eq!(registry.live_count(), 0);
    }
}
