//! Output formatting module for netbaseline
//!
//! Messages about the run itself (banners, warnings, errors). Audit results
//! go through `netbaseline::report` instead.

use colored::Colorize;

/// Output formatter for CLI messages
pub struct OutputFormatter {
    /// Use colored output
    use_color: bool,
    /// Verbosity level
    verbosity: u8,
}

impl OutputFormatter {
    /// Create a new output formatter
    pub fn new(use_color: bool, verbosity: u8) -> Self {
        // Respect NO_COLOR environment variable
        let use_color = use_color && std::env::var("NO_COLOR").is_err();

        Self {
            use_color,
            verbosity,
        }
    }

    /// Whether colour is enabled
    pub fn use_color(&self) -> bool {
        self.use_color
    }

    /// Print a banner/header
    pub fn banner(&self, title: &str) {
        let line = "=".repeat(title.len() + 4);
        if self.use_color {
            println!("\n{}", line.bright_blue());
            println!("{}", format!("  {title}  ").bright_blue().bold());
            println!("{}\n", line.bright_blue());
        } else {
            println!("\n{line}");
            println!("  {title}  ");
            println!("{line}\n");
        }
    }

    /// Print a section header
    pub fn section(&self, title: &str) {
        if self.use_color {
            println!("\n{}", title.cyan().bold());
            println!("{}", "-".repeat(title.len()).cyan());
        } else {
            println!("\n{title}");
            println!("{}", "-".repeat(title.len()));
        }
    }

    /// Print an error message
    pub fn error(&self, message: &str) {
        if self.use_color {
            eprintln!("{} {}", "ERROR:".red().bold(), message);
        } else {
            eprintln!("ERROR: {message}");
        }
    }

    /// Print a warning message
    pub fn warning(&self, message: &str) {
        if self.use_color {
            eprintln!("{} {}", "WARNING:".yellow().bold(), message);
        } else {
            eprintln!("WARNING: {message}");
        }
    }

    /// Print an informational message
    pub fn info(&self, message: &str) {
        if self.use_color {
            println!("{} {}", "INFO:".blue(), message);
        } else {
            println!("INFO: {message}");
        }
    }

    /// Print a success message
    pub fn ok(&self, message: &str) {
        if self.use_color {
            println!("{} {}", "OK:".green(), message);
        } else {
            println!("OK: {message}");
        }
    }

    /// Print a debug message (only at -v and above)
    pub fn debug(&self, message: &str) {
        if self.verbosity < 1 {
            return;
        }
        if self.use_color {
            println!("{} {}", "DEBUG:".dimmed(), message.dimmed());
        } else {
            println!("DEBUG: {message}");
        }
    }
}
