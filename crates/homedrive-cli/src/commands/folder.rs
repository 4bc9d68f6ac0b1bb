//! Folder management commands.

use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;

use homedrive_core::result::AppResult;
use homedrive_entity::file::FileEntry;
use homedrive_entity::folder::{Folder, RemovalState};
use homedrive_entity::node::DirectoryListing;

use super::{Session, parse_id};
use crate::output::{self, OutputFormat};

/// Arguments for folder commands
#[derive(Debug, Args)]
pub struct FolderArgs {
    /// Folder subcommand
    #[command(subcommand)]
    pub command: FolderCommand,
}

/// Folder subcommands
#[derive(Debug, Subcommand)]
pub enum FolderCommand {
    /// List the contents of a folder, `home`, or `trash`
    Ls {
        /// Path or folder id
        #[arg(default_value = "/home")]
        node: String,
    },
    /// Create a folder
    Create {
        /// Parent path or folder id
        parent: String,
        /// Folder name
        name: String,
    },
    /// Rename a folder
    Rename {
        /// Path or folder id
        folder: String,
        /// New name
        name: String,
    },
    /// Move a folder under another parent
    Mv {
        /// Path or folder id
        folder: String,
        /// Destination path or folder id
        destination: String,
    },
    /// Move a folder to trash
    Rm {
        /// Path or folder id
        folder: String,
    },
    /// Restore a folder from trash
    Recover {
        /// Folder id
        id: String,
    },
    /// Permanently delete a folder and its subtree
    Purge {
        /// Folder id
        id: String,
    },
}

/// Folder display row
#[derive(Debug, Serialize, Tabled)]
pub(crate) struct FolderRow {
    /// Folder ID
    id: String,
    /// Name
    name: String,
    /// Absolute path
    path: String,
    /// Trash state
    state: String,
    /// Last modified
    modified: String,
}

impl From<&Folder> for FolderRow {
    fn from(folder: &Folder) -> Self {
        let state = match folder.removal_state() {
            RemovalState::Active => "active",
            RemovalState::Trashed => "trashed",
            RemovalState::TrashedWithAncestor => "trashed (parent)",
        };
        Self {
            id: folder.id.to_string(),
            name: folder.name.clone(),
            path: folder.absolute_path.clone(),
            state: state.to_string(),
            modified: folder.modified_at.format("%Y-%m-%d %H:%M").to_string(),
        }
    }
}

/// File display row
#[derive(Debug, Serialize, Tabled)]
pub(crate) struct FileRow {
    /// File ID
    id: String,
    /// Effective path
    path: String,
    /// Size
    size: String,
    /// Last modified
    modified: String,
}

impl From<&FileEntry> for FileRow {
    fn from(entry: &FileEntry) -> Self {
        Self {
            id: entry.file.id.to_string(),
            path: entry.absolute_path.clone(),
            size: output::human_bytes(entry.file.size_bytes),
            modified: entry.file.modified_at.format("%Y-%m-%d %H:%M").to_string(),
        }
    }
}

/// Print a listing as a folder table followed by a file table.
pub(crate) fn print_listing(listing: &DirectoryListing, format: OutputFormat) {
    match format {
        OutputFormat::Json => output::print_item(listing, format),
        OutputFormat::Table => {
            println!("{}", listing.absolute_path);
            let folders: Vec<FolderRow> = listing.folders.iter().map(FolderRow::from).collect();
            let files: Vec<FileRow> = listing.files.iter().map(FileRow::from).collect();
            output::print_list(&folders, format);
            output::print_list(&files, format);
        }
    }
}

/// Execute folder commands
pub async fn execute(args: &FolderArgs, session: Session, format: OutputFormat) -> AppResult<()> {
    let Session { engine, ctx } = &session;

    match &args.command {
        FolderCommand::Ls { node } => {
            let node = session.node(node).await?;
            let listing = engine.list_children(ctx, node).await?;
            print_listing(&listing, format);
        }
        FolderCommand::Create { parent, name } => {
            let drive = session.drive().await?;
            let parent = session.node(parent).await?;
            let folder = engine.create_folder(ctx, drive.id, parent, name).await?;
            output::print_success(&format!(
                "Folder '{}' created (id: {})",
                folder.absolute_path, folder.id
            ));
        }
        FolderCommand::Rename { folder, name } => {
            let id = session.folder_id(folder).await?;
            let folder = engine.rename_folder(ctx, id, name).await?;
            output::print_success(&format!("Folder renamed to '{}'", folder.absolute_path));
        }
        FolderCommand::Mv {
            folder,
            destination,
        } => {
            let id = session.folder_id(folder).await?;
            let destination = session.node(destination).await?;
            let folder = engine.move_folder(ctx, id, destination).await?;
            output::print_success(&format!("Folder moved to '{}'", folder.absolute_path));
        }
        FolderCommand::Rm { folder } => {
            let id = session.folder_id(folder).await?;
            let folder = engine.soft_delete_folder(ctx, id).await?;
            output::print_success(&format!("'{}' moved to trash", folder.absolute_path));
        }
        FolderCommand::Recover { id } => {
            let folder = engine.recover_folder(ctx, parse_id(id)?).await?;
            output::print_success(&format!("'{}' recovered", folder.absolute_path));
        }
        FolderCommand::Purge { id } => {
            let drive = session.drive().await?;
            let report = engine.hard_delete_folder(ctx, parse_id(id)?, drive.id).await?;
            match format {
                OutputFormat::Json => output::print_item(&report, format),
                OutputFormat::Table => {
                    output::print_success("Folder permanently deleted");
                    output::print_kv("Folders", &report.folders_deleted.to_string());
                    output::print_kv("Files", &report.files_deleted.to_string());
                    output::print_kv("Bookmarks", &report.bookmarks_deleted.to_string());
                    output::print_kv("Freed", &output::human_bytes(report.freed_bytes));
                }
            }
            if report.blobs_leaked > 0 {
                output::print_warning(&format!(
                    "{} blob(s) could not be released from storage",
                    report.blobs_leaked
                ));
            }
        }
    }
    Ok(())
}
