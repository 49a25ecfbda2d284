//! Blob store seam for attachment content.
//!
//! Staging a file hands its bytes to the blob collaborator and keeps only an
//! opaque `ContentRef` in the staged attachment and, later, the message.
//! References live at most for the conversation session; the controller
//! releases them all at shutdown.

use std::collections::HashMap;
use std::sync::Mutex;

use confab_core::types::{ContentRef, FileUpload};

/// Stores attachment bytes behind opaque session-lifetime handles.
pub trait BlobStore: Send + Sync {
    /// Stage a file's content and return a handle resolvable until release.
    fn stage(&self, file: &FileUpload) -> ContentRef;

    /// Resolve a handle back to its bytes, if still staged.
    fn resolve(&self, content_ref: ContentRef) -> Option<Vec<u8>>;

    /// Release a single handle. Releasing an unknown handle is a no-op.
    fn release(&self, content_ref: ContentRef);

    /// Release every handle. Called at session end.
    fn release_all(&self);

    /// Number of live handles.
    fn count(&self) -> usize;
}

/// In-memory blob store keyed by the handle's uuid.
#[derive(Default)]
pub struct MemoryBlobStore {
    blobs: Mutex<HashMap<ContentRef, Vec<u8>>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BlobStore for MemoryBlobStore {
    fn stage(&self, file: &FileUpload) -> ContentRef {
        let content_ref = ContentRef::new();
        self.blobs
            .lock()
            .expect("blob map mutex poisoned")
            .insert(content_ref, file.bytes.clone());
        tracing::debug!(name = %file.name, bytes = file.bytes.len(), "Blob staged");
        content_ref
    }

    fn resolve(&self, content_ref: ContentRef) -> Option<Vec<u8>> {
        self.blobs
            .lock()
            .expect("blob map mutex poisoned")
            .get(&content_ref)
            .cloned()
    }

    fn release(&self, content_ref: ContentRef) {
        self.blobs
            .lock()
            .expect("blob map mutex poisoned")
            .remove(&content_ref);
    }

    fn release_all(&self) {
        let mut blobs = self.blobs.lock().expect("blob map mutex poisoned");
        let released = blobs.len();
        blobs.clear();
        if released > 0 {
            tracing::debug!(released, "All blob references released");
        }
    }

    fn count(&self) -> usize {
        self.blobs.lock().expect("blob map mutex poisoned").len()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn upload(name: &str, bytes: &[u8]) -> FileUpload {
        FileUpload::new(name, "application/octet-stream", bytes.to_vec())
    }

    #[test]
    fn test_stage_and_resolve() {
        let store = MemoryBlobStore::new();
        let content_ref = store.stage(&upload("a.bin", &[1, 2, 3]));
        assert_eq!(store.resolve(content_ref), Some(vec![1, 2, 3]));
        assert_eq!(store.count(), 1);
    }

    #[test]
    fn test_distinct_refs_per_stage() {
        let store = MemoryBlobStore::new();
        let file = upload("a.bin", &[1]);
        let r1 = store.stage(&file);
        let r2 = store.stage(&file);
        assert_ne!(r1, r2);
        assert_eq!(store.count(), 2);
    }

    #[test]
    fn test_release_removes_handle() {
        let store = MemoryBlobStore::new();
        let content_ref = store.stage(&upload("a.bin", &[1]));
        store.release(content_ref);
        assert_eq!(store.resolve(content_ref), None);
        assert_eq!(store.count(), 0);
    }

    #[test]
    fn test_release_unknown_is_noop() {
        let store = MemoryBlobStore::new();
        store.release(ContentRef::new());
        assert_eq!(store.count(), 0);
    }

    #[test]
    fn test_release_all() {
        let store = MemoryBlobStore::new();
        store.stage(&upload("a.bin", &[1]));
        store.stage(&upload("b.bin", &[2]));
        store.release_all();
        assert_eq!(store.count(), 0);
    }
}
