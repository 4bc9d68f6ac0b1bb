//! File management commands.

use std::path::PathBuf;

use bytes::Bytes;
use clap::{Args, Subcommand};

use homedrive_core::error::AppError;
use homedrive_core::result::AppResult;

use super::{Session, parse_id};
use crate::output::{self, OutputFormat};

/// Arguments for file commands
#[derive(Debug, Args)]
pub struct FileArgs {
    /// File subcommand
    #[command(subcommand)]
    pub command: FileCommand,
}

/// File subcommands
#[derive(Debug, Subcommand)]
pub enum FileCommand {
    /// Upload a local file into a folder
    Upload {
        /// Local file to upload
        source: PathBuf,
        /// Destination path or folder id
        #[arg(default_value = "/home")]
        parent: String,
        /// Override the stored file name
        #[arg(short, long)]
        name: Option<String>,
    },
    /// Download a file to a local path
    Download {
        /// File id
        id: String,
        /// Local destination
        target: PathBuf,
    },
    /// Rename a file
    Rename {
        /// File id
        id: String,
        /// New name
        name: String,
    },
    /// Move a file under another folder
    Mv {
        /// File id
        id: String,
        /// Destination path or folder id
        destination: String,
    },
    /// Move a file to trash
    Rm {
        /// File id
        id: String,
    },
    /// Restore a file from trash
    Recover {
        /// File id
        id: String,
    },
    /// Permanently delete a file
    Purge {
        /// File id
        id: String,
    },
}

/// Execute file commands
pub async fn execute(args: &FileArgs, session: Session, format: OutputFormat) -> AppResult<()> {
    let Session { engine, ctx } = &session;

    match &args.command {
        FileCommand::Upload {
            source,
            parent,
            name,
        } => {
            let name = match name {
                Some(name) => name.clone(),
                None => source
                    .file_name()
                    .and_then(|n| n.to_str())
                    .map(str::to_string)
                    .ok_or_else(|| {
                        AppError::invalid_path(format!("Cannot name '{}'", source.display()))
                    })?,
            };
            let content = tokio::fs::read(source).await?;

            let drive = session.drive().await?;
            let parent = session.node(parent).await?;
            let file = engine
                .create_file(ctx, drive.id, parent, &name, Bytes::from(content))
                .await?;

            match format {
                OutputFormat::Json => output::print_item(&file, format),
                OutputFormat::Table => output::print_success(&format!(
                    "File '{}' uploaded (id: {}, {})",
                    file.name,
                    file.id,
                    output::human_bytes(file.size_bytes)
                )),
            }
        }
        FileCommand::Download { id, target } => {
            let download = engine.open_file(ctx, parse_id(id)?).await?;
            tokio::fs::write(target, &download.data).await?;
            output::print_success(&format!(
                "'{}' written to {} ({})",
                download.file.name,
                target.display(),
                output::human_bytes(download.file.size_bytes)
            ));
        }
        FileCommand::Rename { id, name } => {
            let file = engine.rename_file(ctx, parse_id(id)?, name).await?;
            output::print_success(&format!("File renamed to '{}'", file.name));
        }
        FileCommand::Mv { id, destination } => {
            let destination = session.node(destination).await?;
            let file = engine.move_file(ctx, parse_id(id)?, destination).await?;
            output::print_success(&format!("File '{}' moved to {destination}", file.name));
        }
        FileCommand::Rm { id } => {
            let file = engine.soft_delete_file(ctx, parse_id(id)?).await?;
            output::print_success(&format!("'{}' moved to trash", file.name));
        }
        FileCommand::Recover { id } => {
            let file = engine.recover_file(ctx, parse_id(id)?).await?;
            output::print_success(&format!("'{}' recovered", file.name));
        }
        FileCommand::Purge { id } => {
            let freed = engine.hard_delete_file(ctx, parse_id(id)?).await?;
            output::print_success(&format!(
                "File permanently deleted, {} freed",
                output::human_bytes(freed)
            ));
        }
    }
    Ok(())
}
