//! Error types for netbaseline.
//!
//! Every error here is local to the command or device being audited. The
//! audit driver turns them into visible report entries instead of letting
//! them abort a batch run.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for netbaseline operations.
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for netbaseline.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Rule Errors
    // ========================================================================
    /// A rule file could not be read or is malformed.
    #[error("Could not load {}: {message}", path.display())]
    RuleLoad {
        /// Path to the rule file
        path: PathBuf,
        /// Error message
        message: String,
    },

    /// A message template references something other than the five
    /// supported placeholders, or does not parse.
    #[error("Invalid message template '{template}': {message}")]
    TemplateSyntax {
        /// Template source
        template: String,
        /// Error message
        message: String,
    },

    // ========================================================================
    // Capture Errors
    // ========================================================================
    /// Command missing from the before or after snapshot.
    #[error("{command} not found in the baseline")]
    CommandNotCaptured {
        /// Command name
        command: String,
    },

    /// No prompt or format mapping exists for the device OS.
    #[error("{host} OS not found or not yet supported ({os})")]
    UnsupportedPlatform {
        /// Device hostname
        host: String,
        /// The OS string that was not recognized
        os: String,
    },

    /// Neither the flat config captures nor the config command are available.
    #[error("{command} not found in {host} baseline")]
    ConfigUnavailable {
        /// Device hostname
        host: String,
        /// The platform configuration command that was looked up
        command: String,
    },

    /// A capture file for a device is missing.
    #[error("Missing baseline for {host}: {message}")]
    MissingBaseline {
        /// Device hostname
        host: String,
        /// Error message
        message: String,
    },

    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    // ========================================================================
    // IO and Serialization Errors
    // ========================================================================
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error.
    #[error("YAML parse error: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    /// JSON parsing error.
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// Template rendering error.
    #[error("Template error: {0}")]
    Template(#[from] minijinja::Error),

    /// Generic error with source.
    #[error("{message}")]
    Other {
        /// Error message
        message: String,
        /// Source error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl Error {
    /// Creates a new rule load error.
    pub fn rule_load(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::RuleLoad {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates a new template syntax error.
    pub fn template_syntax(template: impl Into<String>, message: impl Into<String>) -> Self {
        Self::TemplateSyntax {
            template: template.into(),
            message: message.into(),
        }
    }

    /// Creates a new command-not-captured error.
    pub fn command_not_captured(command: impl Into<String>) -> Self {
        Self::CommandNotCaptured {
            command: command.into(),
        }
    }

    /// Creates a new unsupported platform error.
    pub fn unsupported_platform(host: impl Into<String>, os: impl Into<String>) -> Self {
        Self::UnsupportedPlatform {
            host: host.into(),
            os: os.into(),
        }
    }
}

/// Extension trait for adding context to errors.
pub trait ErrorContext<T> {
    /// Adds context to an error.
    fn context(self, message: impl Into<String>) -> Result<T>;

    /// Adds context with a closure that is only evaluated on error.
    fn with_context<F, S>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> S,
        S: Into<String>;
}

impl<T, E> ErrorContext<T> for std::result::Result<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn context(self, message: impl Into<String>) -> Result<T> {
        self.map_err(|e| Error::Other {
            message: message.into(),
            source: Some(Box::new(e)),
        })
    }

    fn with_context<F, S>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> S,
        S: Into<String>,
    {
        self.map_err(|e| Error::Other {
            message: f().into(),
            source: Some(Box::new(e)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rule_load_message() {
        let err = Error::rule_load("/rules/junos/test_bgp.yml", "missing field `tests`");
        assert_eq!(
            err.to_string(),
            "Could not load /rules/junos/test_bgp.yml: missing field `tests`"
        );
    }

    #[test]
    fn test_config_unavailable_message() {
        let err = Error::ConfigUnavailable {
            host: "r1".into(),
            command: "show run".into(),
        };
        assert_eq!(err.to_string(), "show run not found in r1 baseline");
    }

    #[test]
    fn test_unsupported_platform_names_os() {
        let err = Error::unsupported_platform("edge9", "arista_eos");
        assert_eq!(
            err.to_string(),
            "edge9 OS not found or not yet supported (arista_eos)"
        );
    }

    #[test]
    fn test_context_wraps_source() {
        let res: std::result::Result<(), std::io::Error> =
            Err(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"));
        let err = res.context("reading manifest").unwrap_err();
        assert_eq!(err.to_string(), "reading manifest");
        assert!(std::error::Error::source(&err).is_some());
    }
}
