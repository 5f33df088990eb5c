//! Lakehold CLI - attach lakes from the command line.
//!
//! The main entry point for the `lakehold` CLI binary.

use anyhow::Result;
use clap::Parser;

use lakehold_cli::{Cli, Commands};

fn main() -> Result<()> {
    let cli = Cli::parse();
    lakehold_core::observability::init_logging_with_default(cli.log_format.into(), "warn");
    lakehold_catalog::metrics::register_metrics();

    let config = cli.config();

    // Create runtime and execute
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async {
        match cli.command {
            Commands::Attach(args) => lakehold_cli::commands::attach::execute(args, &config).await,
        }
    })
}
