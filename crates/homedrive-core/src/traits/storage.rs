//! Blob backend trait for the physical bytes of file content.
//!
//! The folder-hierarchy engine never interprets file bytes. It only needs
//! to place a blob, measure it, read it back for downloads, and release it
//! when the owning file record is destroyed.

use std::fmt;

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::result::AppResult;

/// Opaque handle identifying a stored blob.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlobHandle(pub String);

impl BlobHandle {
    /// Wrap a backend-specific handle string.
    pub fn new(handle: impl Into<String>) -> Self {
        Self(handle.into())
    }

    /// Return the handle as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BlobHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Trait for blob storage backends.
///
/// Implementations exist for the local filesystem and for memory. The
/// trait is defined here in `homedrive-core` and implemented in
/// `homedrive-storage`.
#[async_trait]
pub trait BlobStore: Send + Sync + fmt::Debug + 'static {
    /// Return the backend type name (e.g., "local", "memory").
    fn provider_type(&self) -> &str;

    /// Check whether the backend is healthy and reachable.
    async fn health_check(&self) -> AppResult<bool>;

    /// Store a blob and return its handle.
    async fn write(&self, data: Bytes) -> AppResult<BlobHandle>;

    /// Read a blob back into memory.
    async fn read(&self, handle: &BlobHandle) -> AppResult<Bytes>;

    /// Release a blob. Releasing an absent blob succeeds.
    async fn delete(&self, handle: &BlobHandle) -> AppResult<()>;

    /// Size of a stored blob in bytes.
    async fn size(&self, handle: &BlobHandle) -> AppResult<u64>;
}
