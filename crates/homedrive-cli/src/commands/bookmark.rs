//! Bookmark commands.

use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;

use homedrive_core::result::AppResult;
use homedrive_entity::bookmark::BookmarkEntry;

use super::{Session, parse_id};
use crate::output::{self, OutputFormat};

/// Arguments for bookmark commands
#[derive(Debug, Args)]
pub struct BookmarkArgs {
    /// Bookmark subcommand
    #[command(subcommand)]
    pub command: BookmarkCommand,
}

/// Bookmark subcommands
#[derive(Debug, Subcommand)]
pub enum BookmarkCommand {
    /// List bookmarked folders
    Ls,
    /// Bookmark a folder
    Add {
        /// Path or folder id
        folder: String,
    },
    /// Remove a bookmark
    Rm {
        /// Folder id
        id: String,
    },
}

#[derive(Debug, Serialize, Tabled)]
struct BookmarkRow {
    folder_id: String,
    path: String,
    created_at: String,
}

impl From<&BookmarkEntry> for BookmarkRow {
    fn from(entry: &BookmarkEntry) -> Self {
        Self {
            folder_id: entry.folder.id.to_string(),
            path: entry.folder.absolute_path.clone(),
            created_at: entry.bookmark.created_at.format("%Y-%m-%d %H:%M").to_string(),
        }
    }
}

/// Execute bookmark commands
pub async fn execute(args: &BookmarkArgs, session: Session, format: OutputFormat) -> AppResult<()> {
    let Session { engine, ctx } = &session;

    match &args.command {
        BookmarkCommand::Ls => {
            let entries = engine.list_bookmarks(ctx).await?;
            let rows: Vec<BookmarkRow> = entries.iter().map(BookmarkRow::from).collect();
            output::print_list(&rows, format);
        }
        BookmarkCommand::Add { folder } => {
            let id = session.folder_id(folder).await?;
            engine.add_bookmark(ctx, id).await?;
            output::print_success(&format!("Folder {id} bookmarked"));
        }
        BookmarkCommand::Rm { id } => {
            if engine.remove_bookmark(ctx, parse_id(id)?).await? {
                output::print_success("Bookmark removed");
            } else {
                output::print_warning("No bookmark for that folder");
            }
        }
    }
    Ok(())
}
