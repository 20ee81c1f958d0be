//! Subcommands module for netbaseline CLI
//!
//! This module contains all the subcommand implementations.

pub mod check;
pub mod validate;

use crate::cli::output::OutputFormatter;
use netbaseline::config::Config;
use netbaseline::report::Verbosity;

/// Exit code when every device passed
pub const EXIT_OK: i32 = 0;
/// Exit code when any check failed or could not run
pub const EXIT_FAILURES: i32 = 2;

/// Common context shared between commands
pub struct CommandContext {
    /// Configuration
    pub config: Config,
    /// Output formatter
    pub output: OutputFormatter,
    /// Verbosity level
    pub verbosity: u8,
    /// Colour report lines
    pub color: bool,
}

impl CommandContext {
    /// Create a new command context from CLI arguments
    pub fn new(cli: &crate::cli::Cli, config: Config) -> Self {
        let output = OutputFormatter::new(!cli.no_color && config.output.color, cli.verbosity());

        Self {
            config,
            color: output.use_color(),
            output,
            verbosity: cli.verbosity(),
        }
    }

    /// Report verbosity from the flags of a command
    pub fn report_verbosity(&self, quiet: bool, summary: bool) -> Verbosity {
        if summary {
            Verbosity::Summary
        } else if quiet {
            Verbosity::Quiet
        } else if self.verbosity >= 1 {
            Verbosity::Verbose
        } else {
            Verbosity::Normal
        }
    }
}
