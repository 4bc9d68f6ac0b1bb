//! Local filesystem blob backend.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::fs;
use tracing::debug;
use uuid::Uuid;

use homedrive_core::error::{AppError, ErrorKind};
use homedrive_core::result::AppResult;
use homedrive_core::traits::storage::{BlobHandle, BlobStore};

/// Stores each blob as one file under `root/ab/cd/<uuid>`.
#[derive(Debug, Clone)]
pub struct LocalBlobStore {
    /// Root directory for all stored blobs.
    root: PathBuf,
}

impl LocalBlobStore {
    /// Create a new local backend rooted at the given path.
    pub async fn new(root_path: &str) -> AppResult<Self> {
        let root = PathBuf::from(root_path);
        fs::create_dir_all(&root).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to create storage root: {}", root.display()),
                e,
            )
        })?;
        Ok(Self { root })
    }

    /// Map a handle onto its sharded location. Handles that are not
    /// UUIDs never name a blob.
    fn resolve(&self, handle: &BlobHandle) -> AppResult<PathBuf> {
        let id = Uuid::parse_str(handle.as_str())
            .map_err(|_| AppError::storage(format!("Malformed blob handle: {handle}")))?;
        let name = id.simple().to_string();
        Ok(self.root.join(&name[0..2]).join(&name[2..4]).join(name))
    }

    /// Ensure the parent directory of a path exists.
    async fn ensure_parent(&self, path: &Path) -> AppResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                AppError::with_source(
                    ErrorKind::Storage,
                    format!("Failed to create shard directory: {}", parent.display()),
                    e,
                )
            })?;
        }
        Ok(())
    }
}

fn missing_or_storage(e: std::io::Error, action: &str, handle: &BlobHandle) -> AppError {
    if e.kind() == std::io::ErrorKind::NotFound {
        AppError::storage(format!("Blob {handle} is missing"))
    } else {
        AppError::with_source(ErrorKind::Storage, format!("Failed to {action} blob {handle}"), e)
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    fn provider_type(&self) -> &str {
        "local"
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(fs::metadata(&self.root)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false))
    }

    async fn write(&self, data: Bytes) -> AppResult<BlobHandle> {
        let handle = BlobHandle::new(Uuid::new_v4().to_string());
        let full_path = self.resolve(&handle)?;
        self.ensure_parent(&full_path).await?;

        fs::write(&full_path, &data).await.map_err(|e| {
            AppError::with_source(ErrorKind::Storage, format!("Failed to write blob {handle}"), e)
        })?;

        debug!(%handle, bytes = data.len(), "Wrote blob");
        Ok(handle)
    }

    async fn read(&self, handle: &BlobHandle) -> AppResult<Bytes> {
        let full_path = self.resolve(handle)?;
        let data = fs::read(&full_path)
            .await
            .map_err(|e| missing_or_storage(e, "read", handle))?;
        Ok(Bytes::from(data))
    }

    async fn delete(&self, handle: &BlobHandle) -> AppResult<()> {
        let full_path = self.resolve(handle)?;
        match fs::remove_file(&full_path).await {
            Ok(()) => {
                debug!(%handle, "Deleted blob");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to delete blob {handle}"),
                e,
            )),
        }
    }

    async fn size(&self, handle: &BlobHandle) -> AppResult<u64> {
        let full_path = self.resolve(handle)?;
        let meta = fs::metadata(&full_path)
            .await
            .map_err(|e| missing_or_storage(e, "stat", handle))?;
        Ok(meta.len())
    }
}
