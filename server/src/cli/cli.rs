// server/src/cli/cli.rs

// Entry point of the claimdesk CLI: parses arguments, loads configuration,
// opens the claim store and dispatches to the command handlers.

use anyhow::{Context, Result};
use clap::Parser;
use log::{debug, info};

use claims_lib::{create_storage, load_config, ClaimsConfig, StorageEngineType};

use crate::cli::commands::{ClaimDeskCommands, CliArgs};
use crate::cli::handlers::{
    handle_clear, handle_edit, handle_flag, handle_list, handle_load, handle_note, handle_show, handle_stats, CliContext,
};

/// Command-line flags take precedence over file and environment settings.
pub fn apply_overrides(mut config: ClaimsConfig, args: &CliArgs) -> ClaimsConfig {
    if let Some(dir) = &args.data_directory {
        config.storage.data_directory = dir.clone();
    }
    if args.in_memory {
        config.storage.engine = StorageEngineType::InMemory;
    }
    config
}

pub async fn start_cli() -> Result<()> {
    let args = CliArgs::parse();
    let config = load_config(args.config.as_deref()).context("Failed to load configuration")?;
    let config = apply_overrides(config, &args);
    debug!("Effective configuration: {:?}", config);

    let storage = create_storage(&config.storage)?;
    info!("Opened {} claim store", storage.get_type());
    let ctx = CliContext { storage, config, json: args.json };

    match args.command {
        ClaimDeskCommands::Load { file } => handle_load(&ctx, &file).await,
        ClaimDeskCommands::Clear { table } => handle_clear(&ctx, &table).await,
        ClaimDeskCommands::List(list_args) => handle_list(&ctx, list_args).await,
        ClaimDeskCommands::Show { id } => handle_show(&ctx, id).await,
        ClaimDeskCommands::Edit(edit_args) => handle_edit(&ctx, edit_args).await,
        ClaimDeskCommands::Note { id, text, author } => handle_note(&ctx, id, &text, author.as_deref()).await,
        ClaimDeskCommands::Flag(wrapper) => handle_flag(&ctx, wrapper.command).await,
        ClaimDeskCommands::Stats => handle_stats(&ctx).await,
    }
}
