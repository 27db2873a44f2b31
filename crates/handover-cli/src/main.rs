//! Handover CLI entry point.

mod cli;
mod commands;
mod fixture;

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt};

use crate::cli::Cli;

#[tokio::main]
async fn main() {
    // Load .env.local, then .env, if present
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    // Initialize tracing (stderr keeps stdout clean for JSON output)
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cli.log_level().to_string()));
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = commands::execute(cli.command, &cli.fixture, cli.save).await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}
