//! Shared helpers for engine scenario tests.

#![allow(dead_code)]

use std::sync::Arc;

use bytes::Bytes;
use uuid::Uuid;

use homedrive_core::config::DriveConfig;
use homedrive_database::{DriveStore, MemoryStore};
use homedrive_entity::drive::Drive;
use homedrive_entity::file::File;
use homedrive_entity::folder::{Folder, RemovalState};
use homedrive_entity::node::NodeRef;
use homedrive_service::{DriveEngine, RequestContext};
use homedrive_storage::providers::MemoryBlobStore;

/// An engine over in-memory backends with one provisioned owner.
pub struct TestApp {
    /// The engine under test.
    pub engine: DriveEngine,
    /// Record store, for direct inspection and fault injection.
    pub store: MemoryStore,
    /// Blob backend, for direct inspection and fault injection.
    pub blobs: MemoryBlobStore,
    /// The provisioned owner.
    pub ctx: RequestContext,
    /// The owner's drive.
    pub drive: Drive,
}

impl TestApp {
    /// Create an app with the default quota.
    pub async fn new() -> Self {
        Self::with_quota(DriveConfig::default().initial_quota_bytes).await
    }

    /// Create an app whose drive holds `quota_bytes`.
    pub async fn with_quota(quota_bytes: i64) -> Self {
        let store = MemoryStore::new();
        let blobs = MemoryBlobStore::new();
        let config = DriveConfig {
            initial_quota_bytes: quota_bytes,
            ..DriveConfig::default()
        };
        let engine = DriveEngine::new(Arc::new(store.clone()), Arc::new(blobs.clone()), config);

        let ctx = RequestContext::new(Uuid::new_v4());
        let drive = engine
            .provision_drive(ctx.owner_id)
            .await
            .expect("Failed to provision drive");

        Self {
            engine,
            store,
            blobs,
            ctx,
            drive,
        }
    }

    /// Provision a second owner sharing the same backends.
    pub async fn other_owner(&self) -> (RequestContext, Drive) {
        let ctx = RequestContext::new(Uuid::new_v4());
        let drive = self
            .engine
            .provision_drive(ctx.owner_id)
            .await
            .expect("Failed to provision drive");
        (ctx, drive)
    }

    /// Create a folder, panicking on failure.
    pub async fn folder(&self, parent: NodeRef, name: &str) -> Folder {
        self.engine
            .create_folder(&self.ctx, self.drive.id, parent, name)
            .await
            .unwrap_or_else(|e| panic!("Failed to create folder {name}: {e}"))
    }

    /// Create a file of `size` bytes, panicking on failure.
    pub async fn file(&self, parent: NodeRef, name: &str, size: usize) -> File {
        self.engine
            .create_file(&self.ctx, self.drive.id, parent, name, Bytes::from(vec![7u8; size]))
            .await
            .unwrap_or_else(|e| panic!("Failed to create file {name}: {e}"))
    }

    /// Fetch a folder row straight from the store.
    pub async fn stored_folder(&self, id: Uuid) -> Option<Folder> {
        let mut tx = self.store.begin().await.expect("begin");
        tx.find_folder(id).await.expect("find folder")
    }

    /// Removal state of a stored folder.
    pub async fn removal_state(&self, id: Uuid) -> RemovalState {
        self.stored_folder(id)
            .await
            .expect("folder exists")
            .removal_state()
    }

    /// Fetch a file row straight from the store.
    pub async fn stored_file(&self, id: Uuid) -> Option<File> {
        let mut tx = self.store.begin().await.expect("begin");
        tx.find_file(id).await.expect("find file")
    }

    /// Current `space_used` of the drive.
    pub async fn space_used(&self) -> i64 {
        let mut tx = self.store.begin().await.expect("begin");
        tx.find_drive(self.drive.id)
            .await
            .expect("find drive")
            .expect("drive exists")
            .space_used
    }

    /// Every folder of the owner, sorted by path.
    pub async fn all_folders(&self) -> Vec<Folder> {
        let mut tx = self.store.begin().await.expect("begin");
        tx.find_descendant_folders(self.ctx.owner_id, "/home")
            .await
            .expect("list folders")
    }

    /// Every folder path of the owner, sorted.
    pub async fn all_paths(&self) -> Vec<String> {
        self.all_folders()
            .await
            .into_iter()
            .map(|f| f.absolute_path)
            .collect()
    }

    /// Assert that every folder's path is its parent's path plus its name.
    pub async fn assert_path_invariant(&self) {
        let folders = self.all_folders().await;
        for folder in &folders {
            let parent_path = match folder.parent_id {
                None => "/home".to_string(),
                Some(parent_id) => folders
                    .iter()
                    .find(|f| f.id == parent_id)
                    .map(|f| f.absolute_path.clone())
                    .unwrap_or_else(|| panic!("{} has no parent row", folder.absolute_path)),
            };
            assert_eq!(
                folder.absolute_path,
                format!("{parent_path}/{}", folder.name),
                "path invariant broken for folder {}",
                folder.id
            );
        }
    }
}
