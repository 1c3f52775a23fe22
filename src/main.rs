mod cli;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Command};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so they never interleave with the board on stdout
    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let (settings, path) = cli.resolve_settings()?;
    info!("[CLI] Settings from {}", path.display());

    match cli.command {
        Command::Play { mode, color } => cli::run_play(&settings, mode, color).await,
        Command::Analyze { fen, pgn, timeout } => {
            cli::run_analyze(&settings, fen, pgn, timeout).await
        }
        Command::Review { pgn } => cli::run_review(&settings, &pgn).await,
    }
}
