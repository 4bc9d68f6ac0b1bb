//! In-process blob backend.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;
use uuid::Uuid;

use homedrive_core::error::AppError;
use homedrive_core::result::AppResult;
use homedrive_core::traits::storage::{BlobHandle, BlobStore};

/// Blob backend over a concurrent map. Clones share the same blobs.
///
/// Writes and deletes can be made to fail on demand so callers can observe
/// how backend outages are handled.
#[derive(Debug, Clone, Default)]
pub struct MemoryBlobStore {
    blobs: Arc<DashMap<String, Bytes>>,
    fail_writes: Arc<AtomicBool>,
    fail_deletes: Arc<AtomicBool>,
}

impl MemoryBlobStore {
    /// Create an empty backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of blobs currently held.
    pub fn len(&self) -> usize {
        self.blobs.len()
    }

    /// Whether no blobs are held.
    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }

    /// Whether a blob exists.
    pub fn contains(&self, handle: &BlobHandle) -> bool {
        self.blobs.contains_key(handle.as_str())
    }

    /// Make every subsequent write fail until switched off.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Make every subsequent delete fail until switched off.
    pub fn set_fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    fn provider_type(&self) -> &str {
        "memory"
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(true)
    }

    async fn write(&self, data: Bytes) -> AppResult<BlobHandle> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(AppError::storage("Blob backend refused the write"));
        }
        let handle = BlobHandle::new(Uuid::new_v4().to_string());
        self.blobs.insert(handle.as_str().to_string(), data);
        Ok(handle)
    }

    async fn read(&self, handle: &BlobHandle) -> AppResult<Bytes> {
        self.blobs
            .get(handle.as_str())
            .map(|entry| entry.value().clone())
            .ok_or_else(|| AppError::storage(format!("Blob {handle} is missing")))
    }

    async fn delete(&self, handle: &BlobHandle) -> AppResult<()> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(AppError::storage(format!("Blob backend refused to delete {handle}")));
        }
        self.blobs.remove(handle.as_str());
        Ok(())
    }

    async fn size(&self, handle: &BlobHandle) -> AppResult<u64> {
        self.blobs
            .get(handle.as_str())
            .map(|entry| entry.value().len() as u64)
            .ok_or_else(|| AppError::storage(format!("Blob {handle} is missing")))
    }
}
