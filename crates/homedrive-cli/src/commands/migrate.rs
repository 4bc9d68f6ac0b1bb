//! Database migration commands.

use clap::{Args, Subcommand};

use homedrive_core::config::AppConfig;
use homedrive_core::result::AppResult;
use homedrive_database::migration;
use homedrive_database::{DatabasePool, DriveStore, PgDriveStore};

use crate::output;

/// Arguments for the migrate command
#[derive(Debug, Args)]
pub struct MigrateArgs {
    /// Migration subcommand
    #[command(subcommand)]
    pub command: MigrateCommand,
}

/// Migration subcommands
#[derive(Debug, Subcommand)]
pub enum MigrateCommand {
    /// Run all pending migrations
    Run,
    /// Check that the record store answers
    Check,
}

/// Execute migration commands
pub async fn execute(args: &MigrateArgs, config: &AppConfig) -> AppResult<()> {
    let pool = DatabasePool::connect(&config.database).await?;

    match &args.command {
        MigrateCommand::Run => {
            let known = migration::run_migrations(pool.pool()).await?;
            output::print_success(&format!("Schema up to date ({known} migrations)."));
        }
        MigrateCommand::Check => {
            let store = PgDriveStore::new(pool.pool().clone());
            if store.health_check().await? {
                output::print_success("Record store is reachable.");
            } else {
                output::print_warning("Record store did not answer.");
            }
        }
    }

    pool.close().await;
    Ok(())
}
