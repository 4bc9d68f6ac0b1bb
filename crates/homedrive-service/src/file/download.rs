//! File content retrieval.

use std::sync::Arc;

use bytes::Bytes;
use uuid::Uuid;

use homedrive_core::error::AppError;
use homedrive_core::result::AppResult;
use homedrive_core::traits::storage::BlobStore;
use homedrive_database::DriveStore;
use homedrive_entity::file::File;

use crate::context::RequestContext;
use crate::lookup;

/// Reads file content back from the blob backend.
#[derive(Debug, Clone)]
pub struct DownloadService {
    store: Arc<dyn DriveStore>,
    blobs: Arc<dyn BlobStore>,
}

/// File metadata with its content.
#[derive(Debug)]
pub struct DownloadResult {
    /// File metadata.
    pub file: File,
    /// File content bytes.
    pub data: Bytes,
}

impl DownloadService {
    /// Creates a new download service.
    pub fn new(store: Arc<dyn DriveStore>, blobs: Arc<dyn BlobStore>) -> Self {
        Self { store, blobs }
    }

    /// Open a file that is not in trash.
    pub async fn open_file(&self, ctx: &RequestContext, file_id: Uuid) -> AppResult<DownloadResult> {
        let file = {
            let mut tx = self.store.begin().await?;
            let file = lookup::load_file(tx.as_mut(), ctx, file_id).await?;
            let parent = lookup::file_parent(tx.as_mut(), &file).await?;
            if file.is_removed || parent.is_some_and(|p| p.is_removed) {
                return Err(AppError::not_found(format!("File {file_id} is in trash")));
            }
            file
        };

        let data = self.blobs.read(&file.handle()).await?;
        Ok(DownloadResult { file, data })
    }
}
