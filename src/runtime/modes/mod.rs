//! Mode routing
//!
//! - Server mode (HTTP server, default)
//! - CLI mode (one-shot commands)

pub mod cli;
pub mod server;

pub use cli::{archive_expired, generate_config};
pub use server::run_server;

use crate::cli::Commands;

/// Run the selected command
pub async fn run(command: Option<Commands>) -> anyhow::Result<()> {
    match command.unwrap_or(Commands::Serve) {
        Commands::Serve => run_server().await,
        Commands::ConfigGen { path } => generate_config(&path),
        Commands::ArchiveExpired => archive_expired().await,
    }
}
