// server/src/cli/commands.rs

// Command-line arguments and subcommands for the claimdesk CLI, built with `clap`.
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "claimdesk-cli")]
#[command(version = "0.1.0")]
#[command(about = "Review, edit and maintain insurance claims")]
pub struct CliArgs {
    /// Configuration file (defaults to ./claimdesk.toml when present)
    #[arg(long, global = true, value_hint = clap::ValueHint::FilePath, env = "CLAIMDESK_CONFIG")]
    pub config: Option<PathBuf>,
    /// Directory holding the claim store
    #[arg(long, global = true, value_hint = clap::ValueHint::DirPath)]
    pub data_directory: Option<PathBuf>,
    /// Use a throwaway in-memory store
    #[arg(long, global = true)]
    pub in_memory: bool,
    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,
    #[command(subcommand)]
    pub command: ClaimDeskCommands,
}

#[derive(Debug, Subcommand)]
pub enum ClaimDeskCommands {
    /// Create or update claims from a JSON (or JSON-lines) export
    Load {
        #[arg(value_name = "FILE", value_hint = clap::ValueHint::FilePath)]
        file: PathBuf,
    },
    /// Delete every row of a table and reset its ids (e.g. `notes` or `claims.Note`)
    Clear {
        #[arg(value_name = "TABLE")]
        table: String,
    },
    /// List claims, filtered and paginated
    List(ListArgs),
    /// Show a claim with its detail, notes and flags
    Show {
        #[arg(value_name = "ID")]
        id: u64,
    },
    /// Edit a claim and sync the mirror files
    Edit(EditArgs),
    /// Add a note to a claim
    Note {
        #[arg(value_name = "ID")]
        id: u64,
        #[arg(value_name = "TEXT")]
        text: String,
        #[arg(long)]
        author: Option<String>,
    },
    /// Raise or clear the review flag of a claim
    Flag(FlagCommandWrapper),
    /// Portfolio totals
    Stats,
}

#[derive(Debug, Args, Default)]
pub struct ListArgs {
    #[arg(long)]
    pub status: Option<String>,
    #[arg(long)]
    pub insurer: Option<String>,
    /// Substring of patient name, insurer or claim number
    #[arg(long, short = 's')]
    pub search: Option<String>,
    /// Only flagged claims
    #[arg(long)]
    pub flagged: bool,
    #[arg(long, short = 'p')]
    pub page: Option<String>,
    #[arg(long)]
    pub per_page: Option<usize>,
}

/// Unset direct fields keep their stored value.
#[derive(Debug, Args, Default)]
pub struct EditArgs {
    #[arg(value_name = "ID")]
    pub id: u64,
    /// Claim number; must match the stored claim
    #[arg(long)]
    pub claim_id: Option<String>,
    #[arg(long)]
    pub patient_name: Option<String>,
    #[arg(long)]
    pub billed_amount: Option<String>,
    #[arg(long)]
    pub paid_amount: Option<String>,
    #[arg(long)]
    pub status: Option<String>,
    #[arg(long)]
    pub insurer_name: Option<String>,
    /// YYYY-MM-DD
    #[arg(long)]
    pub discharge_date: Option<String>,
    #[arg(long)]
    pub cpt_codes: Option<String>,
    /// overwrite (default) or append
    #[arg(long)]
    pub cpt_mode: Option<String>,
    #[arg(long)]
    pub denial_reason: Option<String>,
    /// overwrite (default) or append
    #[arg(long)]
    pub denial_mode: Option<String>,
}

#[derive(Debug, Args)]
pub struct FlagCommandWrapper {
    #[clap(subcommand)]
    pub command: FlagAction,
}

#[derive(Debug, Subcommand, PartialEq)]
pub enum FlagAction {
    Raise {
        #[arg(value_name = "ID")]
        id: u64,
        #[arg(long, short = 'm')]
        message: Option<String>,
    },
    Clear {
        #[arg(value_name = "ID")]
        id: u64,
    },
}
