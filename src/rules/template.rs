//! Pass/fail message templates.
//!
//! Templates use Jinja syntax but may only reference five values:
//! `device`, `pre`, `post`, `delta` and `section_id`. Anything else is
//! rejected when the rule is loaded, so a typo never turns into an empty
//! field at report time.

use minijinja::Environment;
use once_cell::sync::Lazy;
use serde::Serialize;

use crate::error::{Error, Result};

/// Names a message template may reference
pub const PLACEHOLDERS: [&str; 5] = ["device", "pre", "post", "delta", "section_id"];

/// Globals minijinja provides that are harmless in a message
const BUILTIN_GLOBALS: [&str; 3] = ["range", "dict", "namespace"];

static ENV: Lazy<Environment<'static>> = Lazy::new(Environment::new);

/// Identity of the device a message is about
#[derive(Debug, Clone, Serialize)]
pub struct DeviceRef<'a> {
    /// Device hostname
    pub hostname: &'a str,
    /// Platform name (`juniper_junos`, ...)
    pub os_type: &'a str,
}

/// The values substituted into a message
#[derive(Debug, Clone, Serialize)]
pub struct MessageFields<'a> {
    /// The device under test
    pub device: DeviceRef<'a>,
    /// Tokens of the before line
    pub pre: &'a [String],
    /// Tokens of the after line
    pub post: &'a [String],
    /// Delta between the compared values
    pub delta: String,
    /// Section the line belongs to, empty when unscoped
    pub section_id: &'a str,
}

/// A validated message template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageTemplate {
    source: String,
}

impl MessageTemplate {
    /// Parse and validate a template.
    pub fn parse(source: impl Into<String>) -> Result<Self> {
        let source = source.into();
        let template = ENV
            .template_from_str(&source)
            .map_err(|e| Error::template_syntax(&source, e.to_string()))?;

        let mut unknown: Vec<String> = template
            .undeclared_variables(false)
            .into_iter()
            .filter(|name| {
                !PLACEHOLDERS.contains(&name.as_str()) && !BUILTIN_GLOBALS.contains(&name.as_str())
            })
            .collect();
        if !unknown.is_empty() {
            unknown.sort();
            return Err(Error::template_syntax(
                &source,
                format!(
                    "unknown placeholder(s) {}; allowed: {}",
                    unknown.join(", "),
                    PLACEHOLDERS.join(", ")
                ),
            ));
        }

        Ok(Self { source })
    }

    /// The template text as written in the rule
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Render the template with the given fields
    pub fn render(&self, fields: &MessageFields<'_>) -> Result<String> {
        Ok(ENV.render_str(&self.source, fields)?)
    }
}
