//! In-process [`DriveStore`] with the same transactional contract as the
//! PostgreSQL store.
//!
//! Units of work are serialized by a single async mutex. Each transaction
//! mutates a private copy of the state and publishes it on commit, so an
//! uncommitted or failed unit of work leaves nothing behind.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::warn;
use uuid::Uuid;

use homedrive_core::error::AppError;
use homedrive_core::result::AppResult;
use homedrive_core::types::path;
use homedrive_entity::bookmark::Bookmark;
use homedrive_entity::drive::{CreateDrive, Drive};
use homedrive_entity::file::{CreateFile, File};
use homedrive_entity::folder::{CreateFolder, Folder};

use crate::store::{DriveStore, StoreTransaction};

/// Fault switch value meaning "never fail".
const FAULTS_DISABLED: i64 = -1;

#[derive(Debug, Clone, Default)]
struct StoreState {
    drives: HashMap<Uuid, Drive>,
    folders: HashMap<Uuid, Folder>,
    files: HashMap<Uuid, File>,
    bookmarks: BTreeMap<(Uuid, Uuid), Bookmark>,
}

/// Row counts of a [`MemoryStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MemoryStats {
    pub drives: usize,
    pub folders: usize,
    pub files: usize,
    pub bookmarks: usize,
}

/// Transactional in-memory store.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    state: Arc<Mutex<StoreState>>,
    commits_until_failure: Arc<AtomicI64>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(StoreState::default())),
            commits_until_failure: Arc::new(AtomicI64::new(FAULTS_DISABLED)),
        }
    }

    /// Let `successful_commits` more commits through, then fail the next
    /// one. The fault trips once and disarms itself.
    pub fn fail_commit_after(&self, successful_commits: u32) {
        self.commits_until_failure
            .store(i64::from(successful_commits), Ordering::SeqCst);
    }

    /// Current row counts.
    pub async fn stats(&self) -> MemoryStats {
        let state = self.state.lock().await;
        MemoryStats {
            drives: state.drives.len(),
            folders: state.folders.len(),
            files: state.files.len(),
            bookmarks: state.bookmarks.len(),
        }
    }

    /// Consume one tick of the fault countdown. Returns true if this commit
    /// must fail.
    fn commit_fault_tripped(counter: &AtomicI64) -> bool {
        let previous = counter.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| match n {
            n if n < 0 => None,
            0 => Some(FAULTS_DISABLED),
            n => Some(n - 1),
        });
        matches!(previous, Ok(0))
    }
}

#[async_trait]
impl DriveStore for MemoryStore {
    async fn begin(&self) -> AppResult<Box<dyn StoreTransaction>> {
        let guard = Arc::clone(&self.state).lock_owned().await;
        let working = guard.clone();
        Ok(Box::new(MemoryTransaction {
            guard,
            working,
            commits_until_failure: Arc::clone(&self.commits_until_failure),
        }))
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(true)
    }
}

/// A unit of work over a [`MemoryStore`]. Holds the store lock until it is
/// committed, rolled back, or dropped.
pub struct MemoryTransaction {
    guard: OwnedMutexGuard<StoreState>,
    working: StoreState,
    commits_until_failure: Arc<AtomicI64>,
}

impl MemoryTransaction {
    fn folder_path_taken(&self, owner_id: Uuid, path: &str, except: Option<Uuid>) -> bool {
        self.working.folders.values().any(|f| {
            f.owner_id == owner_id && f.absolute_path == path && Some(f.id) != except
        })
    }

    fn file_name_taken(
        &self,
        owner_id: Uuid,
        parent_id: Option<Uuid>,
        name: &str,
        except: Option<Uuid>,
    ) -> bool {
        self.working.files.values().any(|f| {
            f.owner_id == owner_id
                && f.parent_id == parent_id
                && f.name == name
                && Some(f.id) != except
        })
    }
}

#[async_trait]
impl StoreTransaction for MemoryTransaction {
    async fn find_drive(&mut self, id: Uuid) -> AppResult<Option<Drive>> {
        Ok(self.working.drives.get(&id).cloned())
    }

    async fn find_drive_by_owner(&mut self, owner_id: Uuid) -> AppResult<Option<Drive>> {
        Ok(self
            .working
            .drives
            .values()
            .find(|d| d.owner_id == owner_id)
            .cloned())
    }

    async fn insert_drive(&mut self, data: &CreateDrive) -> AppResult<Drive> {
        if self.working.drives.values().any(|d| d.owner_id == data.owner_id) {
            return Err(AppError::conflict(format!(
                "Owner {} already has a drive",
                data.owner_id
            )));
        }
        let drive = Drive {
            id: Uuid::new_v4(),
            owner_id: data.owner_id,
            space_total: data.space_total,
            space_used: 0,
            created_at: Utc::now(),
        };
        self.working.drives.insert(drive.id, drive.clone());
        Ok(drive)
    }

    async fn reserve_space(&mut self, drive_id: Uuid, bytes: i64) -> AppResult<Option<Drive>> {
        let Some(drive) = self.working.drives.get_mut(&drive_id) else {
            return Ok(None);
        };
        match drive.space_used.checked_add(bytes) {
            Some(next) if next <= drive.space_total => {
                drive.space_used = next;
                Ok(Some(drive.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn release_space(&mut self, drive_id: Uuid, bytes: i64) -> AppResult<Option<Drive>> {
        let Some(drive) = self.working.drives.get_mut(&drive_id) else {
            return Ok(None);
        };
        drive.space_used = drive.space_used.saturating_sub(bytes).max(0);
        Ok(Some(drive.clone()))
    }

    async fn find_folder(&mut self, id: Uuid) -> AppResult<Option<Folder>> {
        Ok(self.working.folders.get(&id).cloned())
    }

    async fn lock_folders(&mut self, ids: &[Uuid]) -> AppResult<Vec<Folder>> {
        // The store mutex already serializes units of work.
        let mut locked: Vec<Folder> = ids
            .iter()
            .filter_map(|id| self.working.folders.get(id).cloned())
            .collect();
        locked.sort_by_key(|f| f.id);
        locked.dedup_by_key(|f| f.id);
        Ok(locked)
    }

    async fn find_folder_by_path(
        &mut self,
        owner_id: Uuid,
        path: &str,
    ) -> AppResult<Option<Folder>> {
        Ok(self
            .working
            .folders
            .values()
            .find(|f| f.owner_id == owner_id && f.absolute_path == path)
            .cloned())
    }

    async fn find_descendant_folders(
        &mut self,
        owner_id: Uuid,
        ancestor: &str,
    ) -> AppResult<Vec<Folder>> {
        let mut found: Vec<Folder> = self
            .working
            .folders
            .values()
            .filter(|f| {
                f.owner_id == owner_id && path::is_strict_descendant(&f.absolute_path, ancestor)
            })
            .cloned()
            .collect();
        found.sort_by(|a, b| a.absolute_path.cmp(&b.absolute_path));
        Ok(found)
    }

    async fn find_child_folders(
        &mut self,
        owner_id: Uuid,
        parent_id: Option<Uuid>,
    ) -> AppResult<Vec<Folder>> {
        let mut children: Vec<_> = self
            .working
            .folders
            .values()
            .filter(|f| f.owner_id == owner_id && f.parent_id == parent_id)
            .cloned()
            .collect();
        children.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(children)
    }

    async fn find_folders_by_parents(&mut self, parent_ids: &[Uuid]) -> AppResult<Vec<Folder>> {
        Ok(self
            .working
            .folders
            .values()
            .filter(|f| f.parent_id.is_some_and(|p| parent_ids.contains(&p)))
            .cloned()
            .collect())
    }

    async fn find_trashed_folders(&mut self, owner_id: Uuid) -> AppResult<Vec<Folder>> {
        let mut trashed: Vec<_> = self
            .working
            .folders
            .values()
            .filter(|f| f.owner_id == owner_id && f.is_removed && !f.is_removed_as_child)
            .cloned()
            .collect();
        trashed.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(trashed)
    }

    async fn insert_folder(&mut self, data: &CreateFolder) -> AppResult<Folder> {
        if self.folder_path_taken(data.owner_id, &data.absolute_path, None) {
            return Err(AppError::conflict(format!(
                "Folder path '{}' already exists",
                data.absolute_path
            )));
        }
        let now = Utc::now();
        let folder = Folder {
            id: Uuid::new_v4(),
            owner_id: data.owner_id,
            drive_id: data.drive_id,
            parent_id: data.parent_id,
            name: data.name.clone(),
            absolute_path: data.absolute_path.clone(),
            is_removed: false,
            is_removed_as_child: false,
            created_at: now,
            modified_at: now,
        };
        self.working.folders.insert(folder.id, folder.clone());
        Ok(folder)
    }

    async fn update_folder(&mut self, folder: &Folder) -> AppResult<Folder> {
        if !self.working.folders.contains_key(&folder.id) {
            return Err(AppError::not_found(format!("Folder {} not found", folder.id)));
        }
        if self.folder_path_taken(folder.owner_id, &folder.absolute_path, Some(folder.id)) {
            return Err(AppError::conflict(format!(
                "Folder path '{}' already exists",
                folder.absolute_path
            )));
        }
        let Some(stored) = self.working.folders.get_mut(&folder.id) else {
            return Err(AppError::not_found(format!("Folder {} not found", folder.id)));
        };
        stored.parent_id = folder.parent_id;
        stored.name = folder.name.clone();
        stored.absolute_path = folder.absolute_path.clone();
        stored.is_removed = folder.is_removed;
        stored.is_removed_as_child = folder.is_removed_as_child;
        stored.modified_at = folder.modified_at;
        Ok(stored.clone())
    }

    async fn delete_folders(&mut self, ids: &[Uuid]) -> AppResult<u64> {
        let removed = ids
            .iter()
            .filter(|id| self.working.folders.remove(*id).is_some())
            .count();
        Ok(removed as u64)
    }

    async fn find_file(&mut self, id: Uuid) -> AppResult<Option<File>> {
        Ok(self.working.files.get(&id).cloned())
    }

    async fn find_file_by_name(
        &mut self,
        owner_id: Uuid,
        parent_id: Option<Uuid>,
        name: &str,
    ) -> AppResult<Option<File>> {
        Ok(self
            .working
            .files
            .values()
            .find(|f| f.owner_id == owner_id && f.parent_id == parent_id && f.name == name)
            .cloned())
    }

    async fn find_child_files(
        &mut self,
        owner_id: Uuid,
        parent_id: Option<Uuid>,
    ) -> AppResult<Vec<File>> {
        let mut children: Vec<_> = self
            .working
            .files
            .values()
            .filter(|f| f.owner_id == owner_id && f.parent_id == parent_id)
            .cloned()
            .collect();
        children.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(children)
    }

    async fn find_files_by_parents(&mut self, parent_ids: &[Uuid]) -> AppResult<Vec<File>> {
        Ok(self
            .working
            .files
            .values()
            .filter(|f| f.parent_id.is_some_and(|p| parent_ids.contains(&p)))
            .cloned()
            .collect())
    }

    async fn find_trashed_files(&mut self, owner_id: Uuid) -> AppResult<Vec<File>> {
        let mut trashed: Vec<_> = self
            .working
            .files
            .values()
            .filter(|f| f.owner_id == owner_id && f.is_removed)
            .cloned()
            .collect();
        trashed.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(trashed)
    }

    async fn insert_file(&mut self, data: &CreateFile) -> AppResult<File> {
        if self.file_name_taken(data.owner_id, data.parent_id, &data.name, None) {
            return Err(AppError::conflict(format!(
                "File '{}' already exists in this folder",
                data.name
            )));
        }
        let now = Utc::now();
        let file = File {
            id: Uuid::new_v4(),
            owner_id: data.owner_id,
            drive_id: data.drive_id,
            parent_id: data.parent_id,
            name: data.name.clone(),
            size_bytes: data.size_bytes,
            storage_handle: data.storage_handle.clone(),
            is_removed: false,
            created_at: now,
            modified_at: now,
        };
        self.working.files.insert(file.id, file.clone());
        Ok(file)
    }

    async fn update_file(&mut self, file: &File) -> AppResult<File> {
        if self.file_name_taken(file.owner_id, file.parent_id, &file.name, Some(file.id)) {
            return Err(AppError::conflict(format!(
                "File '{}' already exists in this folder",
                file.name
            )));
        }
        let Some(stored) = self.working.files.get_mut(&file.id) else {
            return Err(AppError::not_found(format!("File {} not found", file.id)));
        };
        stored.parent_id = file.parent_id;
        stored.name = file.name.clone();
        stored.is_removed = file.is_removed;
        stored.modified_at = file.modified_at;
        Ok(stored.clone())
    }

    async fn delete_files(&mut self, ids: &[Uuid]) -> AppResult<u64> {
        let removed = ids
            .iter()
            .filter(|id| self.working.files.remove(*id).is_some())
            .count();
        Ok(removed as u64)
    }

    async fn find_bookmarks(&mut self, owner_id: Uuid) -> AppResult<Vec<Bookmark>> {
        let mut found: Vec<Bookmark> = self
            .working
            .bookmarks
            .range((owner_id, Uuid::nil())..=(owner_id, Uuid::from_u128(u128::MAX)))
            .map(|(_, b)| b.clone())
            .collect();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(found)
    }

    async fn insert_bookmark(&mut self, owner_id: Uuid, folder_id: Uuid) -> AppResult<Bookmark> {
        let key = (owner_id, folder_id);
        if self.working.bookmarks.contains_key(&key) {
            return Err(AppError::conflict(format!(
                "Folder {folder_id} is already bookmarked"
            )));
        }
        let bookmark = Bookmark {
            owner_id,
            folder_id,
            created_at: Utc::now(),
        };
        self.working.bookmarks.insert(key, bookmark.clone());
        Ok(bookmark)
    }

    async fn delete_bookmarks(&mut self, owner_id: Uuid, folder_ids: &[Uuid]) -> AppResult<u64> {
        let removed = folder_ids
            .iter()
            .filter(|folder_id| self.working.bookmarks.remove(&(owner_id, **folder_id)).is_some())
            .count();
        Ok(removed as u64)
    }

    async fn commit(self: Box<Self>) -> AppResult<()> {
        let MemoryTransaction {
            mut guard,
            working,
            commits_until_failure,
        } = *self;
        if MemoryStore::commit_fault_tripped(&commits_until_failure) {
            warn!("Injected commit failure, discarding unit of work");
            return Err(AppError::database("Injected commit failure"));
        }
        *guard = working;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> AppResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use homedrive_core::error::ErrorKind;

    async fn store_with_drive(space_total: i64) -> (MemoryStore, Drive) {
        let store = MemoryStore::new();
        let mut tx = store.begin().await.unwrap();
        let drive = tx
            .insert_drive(&CreateDrive {
                owner_id: Uuid::new_v4(),
                space_total,
            })
            .await
            .unwrap();
        tx.commit().await.unwrap();
        (store, drive)
    }

    fn folder_data(drive: &Drive, parent_id: Option<Uuid>, path: &str) -> CreateFolder {
        CreateFolder {
            owner_id: drive.owner_id,
            drive_id: drive.id,
            parent_id,
            name: path.rsplit('/').next().unwrap().to_string(),
            absolute_path: path.to_string(),
        }
    }

    #[tokio::test]
    async fn test_lock_folders_orders_by_id_and_skips_missing() {
        let (store, drive) = store_with_drive(100).await;
        let mut tx = store.begin().await.unwrap();
        let a = tx
            .insert_folder(&folder_data(&drive, None, "/home/A"))
            .await
            .unwrap();
        let b = tx
            .insert_folder(&folder_data(&drive, None, "/home/B"))
            .await
            .unwrap();

        let locked = tx
            .lock_folders(&[b.id, Uuid::new_v4(), a.id, b.id])
            .await
            .unwrap();
        let mut expected = vec![a.id, b.id];
        expected.sort();
        assert_eq!(locked.iter().map(|f| f.id).collect::<Vec<_>>(), expected);
    }

    #[tokio::test]
    async fn test_dropped_transaction_discards_writes() {
        let (store, drive) = store_with_drive(100).await;
        {
            let mut tx = store.begin().await.unwrap();
            tx.insert_folder(&folder_data(&drive, None, "/home/A"))
                .await
                .unwrap();
        }
        assert_eq!(store.stats().await.folders, 0);

        let mut tx = store.begin().await.unwrap();
        tx.insert_folder(&folder_data(&drive, None, "/home/A"))
            .await
            .unwrap();
        tx.rollback().await.unwrap();
        assert_eq!(store.stats().await.folders, 0);
    }

    #[tokio::test]
    async fn test_reserve_refuses_beyond_total() {
        let (store, drive) = store_with_drive(100).await;
        let mut tx = store.begin().await.unwrap();
        assert_eq!(
            tx.reserve_space(drive.id, 60).await.unwrap().unwrap().space_used,
            60
        );
        assert!(tx.reserve_space(drive.id, 41).await.unwrap().is_none());
        assert_eq!(
            tx.reserve_space(drive.id, 40).await.unwrap().unwrap().space_used,
            100
        );
        assert_eq!(
            tx.release_space(drive.id, 500).await.unwrap().unwrap().space_used,
            0
        );
        assert!(tx.reserve_space(Uuid::new_v4(), 1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_folder_path_conflicts() {
        let (store, drive) = store_with_drive(100).await;
        let mut tx = store.begin().await.unwrap();
        tx.insert_folder(&folder_data(&drive, None, "/home/A"))
            .await
            .unwrap();
        let err = tx
            .insert_folder(&folder_data(&drive, None, "/home/A"))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Conflict);
    }

    #[tokio::test]
    async fn test_descendants_are_segment_bounded() {
        let (store, drive) = store_with_drive(100).await;
        let mut tx = store.begin().await.unwrap();
        let a = tx
            .insert_folder(&folder_data(&drive, None, "/home/A"))
            .await
            .unwrap();
        tx.insert_folder(&folder_data(&drive, Some(a.id), "/home/A/B"))
            .await
            .unwrap();
        tx.insert_folder(&folder_data(&drive, None, "/home/AB"))
            .await
            .unwrap();

        let found = tx
            .find_descendant_folders(drive.owner_id, "/home/A")
            .await
            .unwrap();
        let paths: Vec<_> = found.iter().map(|f| f.absolute_path.as_str()).collect();
        assert_eq!(paths, vec!["/home/A/B"]);
    }

    #[tokio::test]
    async fn test_fail_commit_after_trips_once() {
        let (store, drive) = store_with_drive(100).await;
        store.fail_commit_after(1);

        let mut tx = store.begin().await.unwrap();
        tx.insert_folder(&folder_data(&drive, None, "/home/A"))
            .await
            .unwrap();
        tx.commit().await.unwrap();

        let mut tx = store.begin().await.unwrap();
        tx.insert_folder(&folder_data(&drive, None, "/home/B"))
            .await
            .unwrap();
        let err = tx.commit().await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Database);
        assert_eq!(store.stats().await.folders, 1);

        let mut tx = store.begin().await.unwrap();
        tx.insert_folder(&folder_data(&drive, None, "/home/B"))
            .await
            .unwrap();
        tx.commit().await.unwrap();
        assert_eq!(store.stats().await.folders, 2);
    }

    #[tokio::test]
    async fn test_bookmarks_are_scoped_to_owner() {
        let (store, drive) = store_with_drive(100).await;
        let other_owner = Uuid::new_v4();
        let folder_id = Uuid::new_v4();

        let mut tx = store.begin().await.unwrap();
        tx.insert_bookmark(drive.owner_id, folder_id).await.unwrap();
        tx.insert_bookmark(other_owner, folder_id).await.unwrap();
        let err = tx
            .insert_bookmark(drive.owner_id, folder_id)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Conflict);

        assert_eq!(tx.find_bookmarks(drive.owner_id).await.unwrap().len(), 1);
        assert_eq!(
            tx.delete_bookmarks(drive.owner_id, &[folder_id]).await.unwrap(),
            1
        );
        assert_eq!(tx.find_bookmarks(other_owner).await.unwrap().len(), 1);
    }
}
