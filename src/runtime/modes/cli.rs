//! One-shot CLI commands

use anyhow::{Context, Result};
use colored::Colorize;

use crate::config::StaticConfig;
use crate::runtime::lifetime::startup::prepare_storage;
use crate::services::ArchiveTask;

/// `dealdrop config-gen [path]`
pub fn generate_config(path: &str) -> Result<()> {
    StaticConfig::default()
        .save_to_file(path)
        .with_context(|| format!("Failed to write {}", path))?;
    println!("{} Sample configuration written to {}", "✓".green(), path.bold());
    Ok(())
}

/// `dealdrop archive-expired`
pub async fn archive_expired() -> Result<()> {
    let storage = prepare_storage().await?;
    let count = ArchiveTask::new(storage)
        .run_once()
        .await
        .context("Failed to archive expired deals")?;
    println!("{} Archived {} expired deals", "✓".green(), count);
    Ok(())
}
