//! Trash commands.

use clap::{Args, Subcommand};
use uuid::Uuid;

use homedrive_core::result::AppResult;
use homedrive_service::{DriveEngine, RequestContext};

use super::Session;
use super::folder::print_listing;
use crate::output::{self, OutputFormat};

/// Arguments for trash commands
#[derive(Debug, Args)]
pub struct TrashArgs {
    /// Trash subcommand
    #[command(subcommand)]
    pub command: TrashCommand,
}

/// Trash subcommands
#[derive(Debug, Subcommand)]
pub enum TrashCommand {
    /// List top-level trashed folders and trashed files
    Ls,
    /// Permanently delete everything in trash
    Empty,
}

/// Execute trash commands
pub async fn execute(args: &TrashArgs, session: Session, format: OutputFormat) -> AppResult<()> {
    let Session { engine, ctx } = &session;

    match &args.command {
        TrashCommand::Ls => {
            let listing = engine.list_trash(ctx).await?;
            print_listing(&listing, format);
        }
        TrashCommand::Empty => {
            let drive = session.drive().await?;
            let emptied = empty_trash(engine, ctx, drive.id).await?;
            output::print_success(&format!(
                "Trash emptied: {} folder(s), {} file(s), {} freed",
                emptied.folders,
                emptied.files,
                output::human_bytes(emptied.freed_bytes)
            ));
        }
    }
    Ok(())
}

/// Totals of an emptied trash.
#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct TrashEmptied {
    pub folders: u64,
    pub files: u64,
    pub freed_bytes: i64,
}

/// Permanently delete every top-level trash item.
pub(crate) async fn empty_trash(
    engine: &DriveEngine,
    ctx: &RequestContext,
    drive_id: Uuid,
) -> AppResult<TrashEmptied> {
    let listing = engine.list_trash(ctx).await?;
    let mut emptied = TrashEmptied::default();

    // Listed files may sit inside listed folders. Deleting them first
    // keeps each one counted once.
    for entry in &listing.files {
        emptied.freed_bytes += engine.hard_delete_file(ctx, entry.file.id).await?;
        emptied.files += 1;
    }
    for folder in &listing.folders {
        let report = engine.hard_delete_folder(ctx, folder.id, drive_id).await?;
        emptied.folders += report.folders_deleted;
        emptied.files += report.files_deleted;
        emptied.freed_bytes += report.freed_bytes;
    }
    Ok(emptied)
}
