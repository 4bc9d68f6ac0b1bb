//! Owner-scoped record lookups shared by the services.
//!
//! All helpers run inside the caller's unit of work.

use uuid::Uuid;

use homedrive_core::error::AppError;
use homedrive_core::result::AppResult;
use homedrive_core::types::path;
use homedrive_database::StoreTransaction;
use homedrive_entity::drive::Drive;
use homedrive_entity::file::File;
use homedrive_entity::folder::Folder;

use crate::context::RequestContext;

/// Load the drive `drive_id`, which must belong to the caller.
pub(crate) async fn load_drive(
    tx: &mut dyn StoreTransaction,
    ctx: &RequestContext,
    drive_id: Uuid,
) -> AppResult<Drive> {
    tx.find_drive(drive_id)
        .await?
        .filter(|d| ctx.owns(d.owner_id))
        .ok_or_else(|| AppError::not_found(format!("Drive {drive_id} not found")))
}

/// Load a folder owned by the caller, in any trash state.
pub(crate) async fn load_folder(
    tx: &mut dyn StoreTransaction,
    ctx: &RequestContext,
    folder_id: Uuid,
) -> AppResult<Folder> {
    tx.find_folder(folder_id)
        .await?
        .filter(|f| ctx.owns(f.owner_id))
        .ok_or_else(|| AppError::not_found(format!("Folder {folder_id} not found")))
}

/// Like [`load_folder`], but row-locks the folder for the rest of the unit
/// of work. Use it before writing to the folder or below it.
pub(crate) async fn lock_folder(
    tx: &mut dyn StoreTransaction,
    ctx: &RequestContext,
    folder_id: Uuid,
) -> AppResult<Folder> {
    tx.lock_folders(&[folder_id])
        .await?
        .into_iter()
        .find(|f| f.id == folder_id && ctx.owns(f.owner_id))
        .ok_or_else(|| AppError::not_found(format!("Folder {folder_id} not found")))
}

/// Load a file owned by the caller, in any trash state.
pub(crate) async fn load_file(
    tx: &mut dyn StoreTransaction,
    ctx: &RequestContext,
    file_id: Uuid,
) -> AppResult<File> {
    tx.find_file(file_id)
        .await?
        .filter(|f| ctx.owns(f.owner_id))
        .ok_or_else(|| AppError::not_found(format!("File {file_id} not found")))
}

/// The parent folder of a file, or `None` when it sits directly in home.
pub(crate) async fn file_parent(
    tx: &mut dyn StoreTransaction,
    file: &File,
) -> AppResult<Option<Folder>> {
    match file.parent_id {
        Some(parent_id) => Ok(tx.find_folder(parent_id).await?),
        None => Ok(None),
    }
}

/// Fail with `Conflict` if `name` is taken under the parent by a folder or
/// a file other than `except`.
pub(crate) async fn ensure_name_free(
    tx: &mut dyn StoreTransaction,
    owner_id: Uuid,
    parent_id: Option<Uuid>,
    parent_path: &str,
    name: &str,
    except: Option<Uuid>,
) -> AppResult<()> {
    let target = path::join(parent_path, name);
    if let Some(folder) = tx.find_folder_by_path(owner_id, &target).await? {
        if Some(folder.id) != except {
            return Err(AppError::conflict(format!(
                "A folder at path '{target}' already exists"
            )));
        }
    }
    if let Some(file) = tx.find_file_by_name(owner_id, parent_id, name).await? {
        if Some(file.id) != except {
            return Err(AppError::conflict(format!(
                "A file at path '{target}' already exists"
            )));
        }
    }
    Ok(())
}
