//! KeywordScout CLI — keyword discovery and clustering from the terminal.
//!
//! Expands seed phrases through autocomplete/SERP/competitor signals into a
//! ranked, deduplicated list of keyword opportunities.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
