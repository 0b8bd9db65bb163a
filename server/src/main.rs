// server/src/main.rs

// Entry point of the claimdesk command line tool.

use anyhow::Result;
use claimdesk_server::cli::start_cli;

#[tokio::main]
async fn main() -> Result<()> {
    // RUST_LOG controls verbosity
    env_logger::init();
    start_cli().await
}
