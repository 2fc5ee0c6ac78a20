//! CLI module for wagate
//!
//! - `serve`: Start the HTTP server (default)
//! - `migrate`: Apply store migrations and exit

use clap::{Parser, Subcommand};

/// Multi-tenant WhatsApp messaging backend
#[derive(Parser, Debug)]
#[command(name = "wagate")]
#[command(about = "Multi-tenant WhatsApp messaging backend")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the server (default)
    Serve,
    /// Apply database migrations and exit
    Migrate,
}

/// Run the CLI command
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => crate::server::run().await,
        Commands::Migrate => crate::server::migrate().await,
    }
}
