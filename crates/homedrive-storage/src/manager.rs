//! Blob backend selected from configuration.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use tracing::info;

use homedrive_core::config::StorageConfig;
use homedrive_core::error::AppError;
use homedrive_core::result::AppResult;
use homedrive_core::traits::storage::{BlobHandle, BlobStore};

use crate::providers::{LocalBlobStore, MemoryBlobStore};

/// Wraps the configured blob backend.
#[derive(Debug, Clone)]
pub struct StorageManager {
    inner: Arc<dyn BlobStore>,
}

impl StorageManager {
    /// Build the backend named by `config.provider`.
    pub async fn new(config: &StorageConfig) -> AppResult<Self> {
        let inner: Arc<dyn BlobStore> = match config.provider.as_str() {
            "local" => {
                info!(root = %config.local.root_path, "Initializing local blob storage");
                Arc::new(LocalBlobStore::new(&config.local.root_path).await?)
            }
            "memory" => {
                info!("Initializing in-memory blob storage");
                Arc::new(MemoryBlobStore::new())
            }
            other => {
                return Err(AppError::configuration(format!(
                    "Unknown storage provider: '{other}'. Supported: local, memory"
                )));
            }
        };

        Ok(Self { inner })
    }

    /// Wrap an existing backend (for testing).
    pub fn from_provider(provider: Arc<dyn BlobStore>) -> Self {
        Self { inner: provider }
    }
}

#[async_trait]
impl BlobStore for StorageManager {
    fn provider_type(&self) -> &str {
        self.inner.provider_type()
    }

    async fn health_check(&self) -> AppResult<bool> {
        self.inner.health_check().await
    }

    async fn write(&self, data: Bytes) -> AppResult<BlobHandle> {
        self.inner.write(data).await
    }

    async fn read(&self, handle: &BlobHandle) -> AppResult<Bytes> {
        self.inner.read(handle).await
    }

    async fn delete(&self, handle: &BlobHandle) -> AppResult<()> {
        self.inner.delete(handle).await
    }

    async fn size(&self, handle: &BlobHandle) -> AppResult<u64> {
        self.inner.size(handle).await
    }
}
