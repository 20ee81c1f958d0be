//! CLI module for netbaseline
//!
//! This module provides the command-line interface for netbaseline,
//! including argument parsing, configuration loading, and subcommand handling.

pub mod commands;
pub mod output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// netbaseline - Before/after audit of network device state
///
/// Compares command output captured before and after a change against
/// declarative test rules and reports unexpected deltas.
#[derive(Parser, Debug, Clone)]
#[command(name = "netbaseline")]
#[command(author = "netbaseline Contributors")]
#[command(version)]
#[command(about = "Before/after audit of network device state", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (-v shows passing lines, -vv and up raise log detail)
    #[arg(short = 'v', long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(long, global = true, env = "NETBASELINE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Audit the devices of a manifest
    Check(commands::check::CheckArgs),

    /// Load rule files and report the ones that do not parse
    Validate(commands::validate::ValidateArgs),
}

impl Cli {
    /// Parse command-line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }

    /// Get the effective verbosity level (0-4)
    pub fn verbosity(&self) -> u8 {
        self.verbose.min(4)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "netbaseline",
            "check",
            "-m",
            "devices.yml",
            "-vv",
            "--no-color",
        ])
        .unwrap();
        assert_eq!(cli.verbosity(), 2);
        assert!(cli.no_color);
        assert!(matches!(cli.command, Commands::Check(_)));
    }

    #[test]
    fn test_validate_subcommand() {
        let cli = Cli::try_parse_from(["netbaseline", "validate", "rules", "--platform", "junos"])
            .unwrap();
        match cli.command {
            Commands::Validate(args) => {
                assert_eq!(args.rules_dir, PathBuf::from("rules"));
                assert_eq!(args.platform.as_deref(), Some("junos"));
            }
            Commands::Check(_) => panic!("expected validate"),
        }
    }
}
