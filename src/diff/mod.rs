//! Configuration diff between the before and after captures.
//!
//! The full configuration is diffed as a unified diff. Changed lines that
//! carry no meaning (comments, timestamps, SR OS `configure`/`exit`
//! scaffolding) are suppressed; every remaining added or removed line is
//! one configuration failure.
//!
//! # Example
//!
//! ```rust
//! use netbaseline::diff::diff_config;
//! use netbaseline::platform::Platform;
//!
//! let before = ["hostname r1", "interface Gi0/0", " shutdown"];
//! let after = ["hostname r1", "interface Gi0/0", " no shutdown"];
//! let diff = diff_config(Platform::CiscoIos, &before, &after);
//! assert_eq!(diff.changes(), 2);
//! ```

mod noise;
mod stats;

pub use noise::NoiseProfile;
pub use stats::DiffStats;

use similar::{ChangeTag, TextDiff};

use crate::error::{Error, Result};
use crate::platform::Platform;
use crate::snapshot::Snapshot;

/// Rendered diff output is cut off after this many lines
pub const MAX_RENDERED_LINES: usize = 100;

/// Synthetic command name configuration results are reported under
pub const CONFIG_COMMAND: &str = "show configuration";

const HUNK_SEPARATOR_WIDTH: usize = 36;

/// Type of change in a diff line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeType {
    /// Line was inserted
    Insert,
    /// Line was deleted
    Delete,
}

impl ChangeType {
    fn sign(self) -> char {
        match self {
            ChangeType::Insert => '+',
            ChangeType::Delete => '-',
        }
    }
}

/// One kept change
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffLine {
    /// The content of the line, without its sign
    pub content: String,
    /// The type of change
    pub change_type: ChangeType,
}

impl std::fmt::Display for DiffLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.change_type.sign(), self.content)
    }
}

/// Where the compared configuration came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSource {
    /// Flattened configuration files supplied with the device
    Flat,
    /// The platform's configuration command in the snapshot
    Command(&'static str),
}

impl ConfigSource {
    /// Heading used in reports
    pub fn label(&self) -> &'static str {
        match self {
            ConfigSource::Flat => "Flat Config Diff",
            ConfigSource::Command(command) => *command,
        }
    }
}

/// Result of a configuration diff
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigDiff {
    /// Hunks of kept changes, in diff order
    pub hunks: Vec<Vec<DiffLine>>,
    /// Statistics about the diff
    pub stats: DiffStats,
}

impl ConfigDiff {
    /// Number of configuration failures
    pub fn changes(&self) -> usize {
        self.stats.total_changes()
    }

    /// True when nothing but noise changed
    pub fn is_clean(&self) -> bool {
        !self.stats.has_changes()
    }

    /// Report lines: hunk separators and signed changes, capped
    pub fn rendered(&self) -> Vec<String> {
        let separator = "=".repeat(HUNK_SEPARATOR_WIDTH);
        self.hunks
            .iter()
            .flat_map(|hunk| {
                std::iter::once(separator.clone()).chain(hunk.iter().map(DiffLine::to_string))
            })
            .take(MAX_RENDERED_LINES)
            .collect()
    }
}

fn join_lines<S: AsRef<str>>(lines: &[S]) -> String {
    let mut text = String::new();
    for line in lines {
        text.push_str(line.as_ref());
        text.push('\n');
    }
    text
}

/// Diff two configurations, suppressing the platform's noise.
pub fn diff_config<S: AsRef<str>>(platform: Platform, before: &[S], after: &[S]) -> ConfigDiff {
    let before = join_lines(before);
    let after = join_lines(after);
    let noise = NoiseProfile::for_platform(platform);

    let text_diff = TextDiff::from_lines(&before, &after);
    let unified = text_diff.unified_diff();

    let mut stats = DiffStats::new();
    let mut hunks = Vec::new();

    for hunk in unified.iter_hunks() {
        let mut lines = Vec::new();
        for change in hunk.iter_changes() {
            let change_type = match change.tag() {
                ChangeTag::Insert => ChangeType::Insert,
                ChangeTag::Delete => ChangeType::Delete,
                ChangeTag::Equal => continue,
            };
            let content = change.value().trim_end_matches(['\n', '\r']);
            if noise.is_noise(content) {
                stats.suppressed += 1;
                continue;
            }
            match change_type {
                ChangeType::Insert => stats.insertions += 1,
                ChangeType::Delete => stats.deletions += 1,
            }
            lines.push(DiffLine {
                content: content.to_string(),
                change_type,
            });
        }
        if !lines.is_empty() {
            stats.hunks += 1;
            hunks.push(lines);
        }
    }

    ConfigDiff { hunks, stats }
}

/// Pick the configuration to compare: flat files first, then the
/// platform's configuration command from the snapshot.
pub fn config_sources<'a>(
    platform: Platform,
    hostname: &str,
    snapshot: &'a Snapshot,
    flat: Option<(&'a [String], &'a [String])>,
) -> Result<(ConfigSource, &'a [String], &'a [String])> {
    if let Some((before, after)) = flat.filter(|(b, a)| !b.is_empty() && !a.is_empty()) {
        return Ok((ConfigSource::Flat, before, after));
    }
    let command = platform.config_command();
    snapshot
        .command(command)
        .map(|(before, after)| (ConfigSource::Command(command), before, after))
        .map_err(|_| Error::ConfigUnavailable {
            host: hostname.to_string(),
            command: command.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_configs_are_clean() {
        let config = ["set system host-name r1", "set interfaces ge-0/0/0 unit 0"];
        let diff = diff_config(Platform::JuniperJunos, &config, &config);
        assert!(diff.is_clean());
        assert!(diff.rendered().is_empty());
    }

    #[test]
    fn test_changes_counted_and_rendered() {
        let before = ["hostname r1", "!", "interface Gi0/0", " shutdown"];
        let after = ["hostname r1", "! changed", "interface Gi0/0", " no shutdown"];
        let diff = diff_config(Platform::CiscoIos, &before, &after);
        assert_eq!(diff.changes(), 2);
        assert_eq!(diff.stats.suppressed, 2);
        assert_eq!(
            diff.rendered(),
            vec!["=".repeat(36), "- shutdown".to_string(), "+ no shutdown".to_string()]
        );
    }

    #[test]
    fn test_added_blank_line_is_a_change() {
        let before = ["set system host-name r1"];
        let after = ["set system host-name r1", ""];
        let diff = diff_config(Platform::JuniperJunos, &before, &after);
        assert_eq!(diff.changes(), 1);
        assert_eq!(diff.stats.suppressed, 0);

        let sros = diff_config(Platform::NokiaSros, &before, &after);
        assert!(sros.is_clean());
    }

    #[test]
    fn test_sros_scaffolding_suppressed() {
        let before = ["configure", "    router", "    exit", "exit all"];
        let after = [
            "configure",
            "    router",
            "        interface \"x\"",
            "        exit",
            "    exit",
            "exit all",
        ];
        let diff = diff_config(Platform::NokiaSros, &before, &after);
        assert_eq!(diff.changes(), 1);
        assert_eq!(diff.hunks[0][0].content, "        interface \"x\"");
    }

    #[test]
    fn test_rendered_output_capped() {
        let before: Vec<String> = Vec::new();
        let after: Vec<String> = (0..250).map(|i| format!("set vlan {i}")).collect();
        let diff = diff_config(Platform::JuniperJunos, &before, &after);
        assert_eq!(diff.changes(), 250);
        assert_eq!(diff.rendered().len(), MAX_RENDERED_LINES);
    }

    #[test]
    fn test_config_sources_fallbacks() {
        let mut snapshot = Snapshot::default();
        let err = config_sources(Platform::CiscoIos, "r1", &snapshot, None).unwrap_err();
        assert_eq!(err.to_string(), "show run not found in r1 baseline");

        snapshot.before.insert("show run".into(), vec!["a".into()]);
        snapshot.after.insert("show run".into(), vec!["b".into()]);
        let (source, before, _) = config_sources(Platform::CiscoIos, "r1", &snapshot, None).unwrap();
        assert_eq!(source, ConfigSource::Command("show run"));
        assert_eq!(before, ["a".to_string()]);

        let flat = vec!["flat".to_string()];
        let (source, ..) =
            config_sources(Platform::CiscoIos, "r1", &snapshot, Some((flat.as_slice(), flat.as_slice()))).unwrap();
        assert_eq!(source, ConfigSource::Flat);
    }
}
