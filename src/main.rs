use clap::Parser;
use colored::Colorize;

use dealdrop::cli::{Cli, Commands};
use dealdrop::config::{StaticConfig, get_config, init_config, replace_config};
use dealdrop::runtime::modes;
use dealdrop::system::init_logging;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match cli.config.as_deref() {
        Some(path) => replace_config(StaticConfig::load_from(path)),
        None => init_config(),
    }

    // config-gen 不需要日志
    if let Some(Commands::ConfigGen { path }) = &cli.command {
        if let Err(e) = modes::generate_config(path) {
            eprintln!("{} {:#}", "[ERROR]".red().bold(), e);
            std::process::exit(1);
        }
        return;
    }

    let config = get_config();
    let _guard = match init_logging(&config.logging) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("{} Failed to initialize logging: {:#}", "[ERROR]".red().bold(), e);
            std::process::exit(1);
        }
    };

    if let Err(e) = modes::run(cli.command).await {
        tracing::error!("{:#}", e);
        eprintln!("{} {:#}", "[ERROR]".red().bold(), e);
        std::process::exit(1);
    }
}
