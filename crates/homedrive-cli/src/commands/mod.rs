//! CLI command definitions and dispatch.

pub mod bookmark;
pub mod drive;
pub mod file;
pub mod folder;
pub mod migrate;
pub mod trash;

use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::debug;
use uuid::Uuid;

use homedrive_core::config::AppConfig;
use homedrive_core::error::AppError;
use homedrive_core::result::AppResult;
use homedrive_database::{DatabasePool, PgDriveStore};
use homedrive_entity::drive::Drive;
use homedrive_entity::node::NodeRef;
use homedrive_service::{DriveEngine, RequestContext};
use homedrive_storage::StorageManager;

use crate::output::OutputFormat;

/// HomeDrive: per-user folder hierarchy with trash and quotas
#[derive(Debug, Parser)]
#[command(name = "homedrive", version, about, long_about = None)]
pub struct Cli {
    /// Directory holding `default.toml` and environment overlays
    #[arg(short, long, default_value = "config")]
    pub config_dir: String,

    /// Environment overlay to load on top of the defaults
    #[arg(short, long, default_value = "development")]
    pub env: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Owner to act as
    #[arg(short, long, global = true)]
    pub owner: Option<Uuid>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Database migration management
    Migrate(migrate::MigrateArgs),
    /// Drive provisioning and usage
    Drive(drive::DriveArgs),
    /// Folder management
    Folder(folder::FolderArgs),
    /// File management
    File(file::FileArgs),
    /// List or empty the trash
    Trash(trash::TrashArgs),
    /// Folder bookmarks
    Bookmark(bookmark::BookmarkArgs),
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        match &self.command {
            Commands::Migrate(args) => migrate::execute(args, config).await,
            Commands::Drive(args) => drive::execute(args, self.session(config).await?, self.format).await,
            Commands::Folder(args) => {
                folder::execute(args, self.session(config).await?, self.format).await
            }
            Commands::File(args) => file::execute(args, self.session(config).await?, self.format).await,
            Commands::Trash(args) => trash::execute(args, self.session(config).await?, self.format).await,
            Commands::Bookmark(args) => {
                bookmark::execute(args, self.session(config).await?, self.format).await
            }
        }
    }

    async fn session(&self, config: &AppConfig) -> AppResult<Session> {
        let owner_id = self
            .owner
            .ok_or_else(|| AppError::configuration("This command needs --owner <UUID>"))?;
        Session::open(config, owner_id).await
    }
}

/// An engine wired to the configured backends, acting for one owner.
pub struct Session {
    /// The engine.
    pub engine: DriveEngine,
    /// Caller context for every engine call.
    pub ctx: RequestContext,
}

impl Session {
    /// Connect to the record store and blob backend named in `config`.
    pub async fn open(config: &AppConfig, owner_id: Uuid) -> AppResult<Self> {
        let pool = DatabasePool::connect(&config.database).await?;
        let store = PgDriveStore::from(pool);
        let blobs = StorageManager::new(&config.storage).await?;
        debug!(
            owner_id = %owner_id,
            storage = %config.storage.provider,
            "Opening engine session"
        );
        let engine = DriveEngine::new(Arc::new(store), Arc::new(blobs), config.drive.clone());

        Ok(Self {
            engine,
            ctx: RequestContext::new(owner_id),
        })
    }

    /// The owner's drive.
    pub async fn drive(&self) -> AppResult<Drive> {
        self.engine.get_drive(&self.ctx).await
    }

    /// Resolve a CLI node argument: an absolute path, `home`, `trash`,
    /// or a folder id.
    pub async fn node(&self, arg: &str) -> AppResult<NodeRef> {
        if arg.starts_with('/') {
            return self.engine.resolve_path(&self.ctx, arg).await;
        }
        arg.parse()
    }

    /// Resolve a CLI argument that must name a folder, by path or by id.
    pub async fn folder_id(&self, arg: &str) -> AppResult<Uuid> {
        match self.node(arg).await? {
            NodeRef::Folder(id) => Ok(id),
            root => Err(AppError::invalid_path(format!("'{root}' is not a folder"))),
        }
    }
}

/// Parse a UUID argument.
pub fn parse_id(arg: &str) -> AppResult<Uuid> {
    Uuid::parse_str(arg).map_err(|e| AppError::invalid_path(format!("Invalid id '{arg}': {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_id() {
        let id = Uuid::new_v4();
        assert_eq!(parse_id(&id.to_string()).unwrap(), id);
        assert!(parse_id("not-an-id").is_err());
    }

    #[test]
    fn test_cli_parses_global_owner() {
        let owner = Uuid::new_v4();
        let cli = Cli::try_parse_from([
            "homedrive",
            "folder",
            "ls",
            "/home",
            "--owner",
            &owner.to_string(),
        ])
        .unwrap();
        assert_eq!(cli.owner, Some(owner));
        assert_eq!(cli.format, OutputFormat::Table);
    }
}
