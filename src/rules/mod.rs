//! Declarative test rules.
//!
//! A rule file describes how the output of one command is tested: which
//! lines are relevant, how before and after lines are paired, and how the
//! verdicts are worded. Rule files are YAML, one per command:
//!
//! ```yaml
//! - command: show bgp summary
//!   blacklist: [Groups, Peer]
//!   iterate: [all]
//!   section: ["routing-instance "]
//!   tests:
//!     - no-diff: [0, 1]
//!       err: "FAILED! {{ device.hostname }} peer {{ pre[0] }} is {{ post[1] }}"
//!       info: "PASSED! peer {{ pre[0] }}"
//!   ignore-null: true
//! ```

mod store;
mod template;

pub use store::{RuleEntry, RuleSet, RuleStore, PING_RULE_FILE};
pub use template::{DeviceRef, MessageFields, MessageTemplate, PLACEHOLDERS};

use serde::Deserialize;
use serde_yaml::{Mapping, Value};

use crate::error::{Error, Result};

const DEFAULT_PASS_TEMPLATE: &str = "PASSED! {{ pre | join(' ') }}";
const DEFAULT_FAIL_TEMPLATE: &str = "FAILED! {{ pre | join(' ') }} => {{ post | join(' ') }}";

/// How before lines are tested against after lines
#[derive(Debug, Clone, PartialEq)]
pub enum TestMode {
    /// Tokens at every index must be identical; the first index pairs lines
    NoDiff {
        /// Token indices to compare, the first one being the pairing key
        indices: Vec<usize>,
    },
    /// A numeric token may drift by at most a fraction of its before value
    Delta {
        /// Token index pairing before and after lines
        key: usize,
        /// Token index holding the value
        value: usize,
        /// Allowed drift as a fraction (0.05 = 5%)
        max_percent: f64,
    },
    /// At least one line must survive filtering
    Exists,
    /// No line may survive filtering
    NotExists,
}

impl TestMode {
    /// Token index used to pair before and after lines
    pub fn key_index(&self) -> Option<usize> {
        match self {
            TestMode::NoDiff { indices } => indices.first().copied(),
            TestMode::Delta { key, .. } => Some(*key),
            TestMode::Exists | TestMode::NotExists => None,
        }
    }

    /// Whether this mode judges presence rather than pairing lines
    pub fn is_presence(&self) -> bool {
        matches!(self, TestMode::Exists | TestMode::NotExists)
    }

    fn from_test_entry(entry: &Mapping) -> std::result::Result<Self, String> {
        if let Some(value) = entry.get("no-diff") {
            let indices: Vec<usize> = serde_yaml::from_value(value.clone())
                .map_err(|e| format!("no-diff expects a list of indices: {e}"))?;
            if indices.is_empty() {
                return Err("no-diff needs at least one index".into());
            }
            return Ok(TestMode::NoDiff { indices });
        }
        if let Some(value) = entry.get("delta") {
            let params = value
                .as_sequence()
                .filter(|seq| seq.len() == 3)
                .ok_or("delta expects [key_index, value_index, max_percent]")?;
            let index = |v: &Value| {
                v.as_u64()
                    .map(|n| n as usize)
                    .ok_or_else(|| format!("delta index must be a non-negative integer, got {v:?}"))
            };
            let max_percent = params[2]
                .as_f64()
                .filter(|p| p.is_finite() && *p >= 0.0)
                .ok_or("delta max_percent must be a non-negative number")?;
            return Ok(TestMode::Delta {
                key: index(&params[0])?,
                value: index(&params[1])?,
                max_percent,
            });
        }
        if entry.contains_key("exists") {
            return Ok(TestMode::Exists);
        }
        if entry.contains_key("not-exists") {
            return Ok(TestMode::NotExists);
        }
        Err("test must be one of no-diff, delta, exists, not-exists".into())
    }
}

/// Which lines are considered at all
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IncludeFilter {
    /// Every line
    All,
    /// Lines containing at least one of these keywords
    Keywords(Vec<String>),
}

impl IncludeFilter {
    /// Whether a line passes the filter
    pub fn admits(&self, line: &str) -> bool {
        match self {
            IncludeFilter::All => true,
            IncludeFilter::Keywords(words) => words.iter().any(|w| line.contains(w.as_str())),
        }
    }
}

/// Test specification for one command
#[derive(Debug, Clone)]
pub struct TestSpec {
    /// Command whose output is tested
    pub command: String,
    /// Lines containing any of these substrings are dropped
    pub denylist: Vec<String>,
    /// Lines must satisfy this filter to be kept
    pub include: IncludeFilter,
    /// Line prefixes that start a new section
    pub section_markers: Vec<String>,
    /// How lines are tested
    pub mode: TestMode,
    /// Count a command without any output as passed
    pub ignore_null: bool,
    /// Message for passing lines
    pub pass_template: MessageTemplate,
    /// Message for failing lines
    pub fail_template: MessageTemplate,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawCommand {
    Single(String),
    Many(Vec<String>),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct RawRule {
    command: RawCommand,
    #[serde(default)]
    blacklist: Option<Vec<String>>,
    #[serde(default)]
    iterate: Option<Vec<String>>,
    #[serde(default)]
    section: Option<Vec<String>>,
    #[serde(default)]
    tests: Vec<Mapping>,
    #[serde(default)]
    err: Option<String>,
    #[serde(default)]
    info: Option<String>,
    #[serde(default)]
    ignore_null: Option<bool>,
}

/// What a rule document turned out to be
#[derive(Debug, Clone)]
pub enum ParsedRule {
    /// A testable single-command rule
    Spec(TestSpec),
    /// A multi-command capture rule that carries nothing to test
    CaptureOnly(Vec<String>),
}

impl TestSpec {
    /// Parse a rule document.
    ///
    /// The document is either a one-element list (the usual layout) or a
    /// bare mapping. `origin` names the source in error messages.
    pub fn parse(content: &str, origin: &str) -> Result<ParsedRule> {
        let fail = |message: String| Error::rule_load(origin, message);

        let doc: Value = serde_yaml::from_str(content).map_err(|e| fail(e.to_string()))?;
        let rule_value = match doc {
            Value::Sequence(items) => items
                .into_iter()
                .next()
                .ok_or_else(|| fail("empty rule document".into()))?,
            mapping @ Value::Mapping(_) => mapping,
            _ => return Err(fail("expected a rule mapping or a list holding one".into())),
        };
        let raw: RawRule = serde_yaml::from_value(rule_value).map_err(|e| fail(e.to_string()))?;

        let command = match raw.command {
            RawCommand::Single(command) => command,
            RawCommand::Many(commands) => return Ok(ParsedRule::CaptureOnly(commands)),
        };

        let test = raw
            .tests
            .first()
            .ok_or_else(|| fail(format!("{command}: no tests defined")))?;
        let mode = TestMode::from_test_entry(test).map_err(|e| fail(format!("{command}: {e}")))?;

        let template_text = |key: &str, top_level: Option<String>, default: &str| {
            test.get(key)
                .and_then(Value::as_str)
                .map(str::to_string)
                .or(top_level)
                .unwrap_or_else(|| default.to_string())
        };
        let pass_template =
            MessageTemplate::parse(template_text("info", raw.info, DEFAULT_PASS_TEMPLATE))
                .map_err(|e| fail(e.to_string()))?;
        let fail_template =
            MessageTemplate::parse(template_text("err", raw.err, DEFAULT_FAIL_TEMPLATE))
                .map_err(|e| fail(e.to_string()))?;

        let include = match raw.iterate {
            None => IncludeFilter::All,
            Some(words) if words.is_empty() || words == ["all"] => IncludeFilter::All,
            Some(words) => IncludeFilter::Keywords(words),
        };

        Ok(ParsedRule::Spec(TestSpec {
            command,
            denylist: raw.blacklist.unwrap_or_default(),
            include,
            section_markers: raw.section.unwrap_or_default(),
            mode,
            ignore_null: raw.ignore_null.unwrap_or(false),
            pass_template,
            fail_template,
        }))
    }

    /// If `line` opens a section, the section id that follows the marker
    pub fn section_start<'a>(&self, line: &'a str) -> Option<&'a str> {
        self.section_markers
            .iter()
            .find_map(|marker| line.strip_prefix(marker.as_str()))
    }

    /// Whether sections are configured for this command
    pub fn is_sectioned(&self) -> bool {
        !self.section_markers.is_empty()
    }
}
