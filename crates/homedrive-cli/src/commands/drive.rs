//! Drive provisioning and usage commands.

use clap::{Args, Subcommand};

use homedrive_core::result::AppResult;

use super::Session;
use crate::output::{self, OutputFormat};

/// Arguments for drive commands
#[derive(Debug, Args)]
pub struct DriveArgs {
    /// Drive subcommand
    #[command(subcommand)]
    pub command: DriveCommand,
}

/// Drive subcommands
#[derive(Debug, Subcommand)]
pub enum DriveCommand {
    /// Create the owner's drive with the configured initial quota
    Provision,
    /// Show the owner's drive and quota usage
    Show,
}

/// Execute drive commands
pub async fn execute(args: &DriveArgs, session: Session, format: OutputFormat) -> AppResult<()> {
    match &args.command {
        DriveCommand::Provision => {
            let drive = session.engine.provision_drive(session.ctx.owner_id).await?;
            output::print_success(&format!(
                "Drive {} provisioned with {}",
                drive.id,
                output::human_bytes(drive.space_total)
            ));
        }
        DriveCommand::Show => {
            let drive = session.drive().await?;
            let quota = drive.quota();
            match format {
                OutputFormat::Json => output::print_item(&quota, format),
                OutputFormat::Table => {
                    output::print_kv("Drive", &drive.id.to_string());
                    output::print_kv("Owner", &drive.owner_id.to_string());
                    output::print_kv("Total", &output::human_bytes(quota.total_bytes));
                    output::print_kv("Used", &output::human_bytes(quota.used_bytes));
                    output::print_kv("Available", &output::human_bytes(quota.available_bytes));
                    output::print_kv("Usage", &format!("{:.1}%", quota.usage_percent));
                }
            }
        }
    }
    Ok(())
}
