//! LessonForge CLI: generate interactive coding assignments from a topic.
//!
//! Wraps the authoring pipeline with config loading, progress output, and
//! helpers for inspecting code templates.

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
