//! CLI module - Command-line interface for opsdesk

use clap::{Parser, Subcommand};

/// opsdesk - Administrative backend with token auth and runtime settings
#[derive(Debug, Parser)]
#[command(name = "opsdesk")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Subcommand)]
pub enum Commands {
    /// Start the HTTP API server (default)
    #[command(alias = "daemon")]
    Serve,

    /// Create default config file
    #[command(alias = "--init")]
    Init,
}

impl Cli {
    #[must_use]
    pub fn command(&self) -> Commands {
        self.command.unwrap_or(Commands::Serve)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serve_is_the_default() {
        let cli = Cli::try_parse_from(["opsdesk"]).unwrap();
        assert_eq!(cli.command(), Commands::Serve);
    }

    #[test]
    fn init_subcommand() {
        let cli = Cli::try_parse_from(["opsdesk", "init"]).unwrap();
        assert_eq!(cli.command(), Commands::Init);
    }

    #[test]
    fn unknown_subcommand_is_rejected() {
        assert!(Cli::try_parse_from(["opsdesk", "frobnicate"]).is_err());
    }
}
