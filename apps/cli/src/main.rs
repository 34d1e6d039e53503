//! lessonpress CLI — course transcript publishing tool.
//!
//! Extracts lesson transcripts into a single collection, deploys them to a
//! remote content API, and assembles combined Markdown/PDF course documents.

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
