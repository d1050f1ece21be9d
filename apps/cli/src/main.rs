//! interbuild CLI — composite build context tool.
//!
//! Combines independent build trees into one composite session and builds
//! the shared registry of project components they expose to each other.

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
