//! Command-line interface definitions using clap

use clap::{Parser, Subcommand};

/// Dealdrop - deal and coupon sharing backend
#[derive(Parser, Debug)]
#[command(name = "dealdrop")]
#[command(version)]
#[command(about = "Deal and coupon sharing backend", long_about = None)]
pub struct Cli {
    /// Path to config.toml
    #[arg(long, short = 'c', global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Start the HTTP server (default)
    Serve,

    /// Write a sample configuration file
    ConfigGen {
        /// Output path
        #[arg(default_value = "config.example.toml")]
        path: String,
    },

    /// Archive expired deals once and exit
    ArchiveExpired,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_serve() {
        let cli = Cli::parse_from(["dealdrop"]);
        assert!(cli.command.is_none());
        assert!(cli.config.is_none());
    }

    #[test]
    fn test_config_gen_path() {
        let cli = Cli::parse_from(["dealdrop", "config-gen", "out.toml"]);
        assert_eq!(
            cli.command,
            Some(Commands::ConfigGen {
                path: "out.toml".to_string()
            })
        );
    }

    #[test]
    fn test_global_config_flag() {
        let cli = Cli::parse_from(["dealdrop", "archive-expired", "--config", "prod.toml"]);
        assert_eq!(cli.command, Some(Commands::ArchiveExpired));
        assert_eq!(cli.config.as_deref(), Some("prod.toml"));
    }
}
