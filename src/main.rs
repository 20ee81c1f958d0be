//! netbaseline - Before/after audit of network device state
//!
//! This is the main entry point for the netbaseline CLI.
//!
//! Exit codes: 0 when every device passed, 2 when any check failed or could
//! not run, 1 on setup errors (bad manifest, bad configuration).

mod cli;

use anyhow::Result;
use cli::commands::CommandContext;
use cli::{Cli, Commands};
use netbaseline::config::Config;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Application version information
const VERSION: &str = env!("CARGO_PKG_VERSION");

fn main() {
    let code = match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            1
        }
    };
    std::process::exit(code);
}

fn run() -> Result<i32> {
    // Parse command line arguments
    let cli = Cli::parse_args();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());
    tracing::debug!(version = VERSION, "starting netbaseline");

    // Load configuration
    let config = Config::load(cli.config.as_ref())?;

    // Create command context
    let mut ctx = CommandContext::new(&cli, config);

    // Execute the appropriate command
    match &cli.command {
        Commands::Check(args) => args.execute(&mut ctx),
        Commands::Validate(args) => args.execute(&mut ctx),
    }
}

/// Initialize logging based on verbosity level
fn init_logging(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    // Diagnostics go to stderr; stdout carries the report
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(verbosity >= 3),
        )
        .with(env_filter)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
