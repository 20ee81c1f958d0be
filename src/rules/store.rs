//! Loading rule files from disk, one rule set per platform.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::{ParsedRule, TestSpec};
use crate::error::{Error, Result};
use crate::platform::Platform;

/// Ping commands are tested without a rule; this file only lists them
pub const PING_RULE_FILE: &str = "test_pings.yml";

/// One rule file as it ended up after loading
#[derive(Debug, Clone)]
pub enum RuleEntry {
    /// A rule ready to test
    Spec {
        /// File the rule came from
        file: String,
        /// The parsed rule
        spec: TestSpec,
    },
    /// A capture-only rule with nothing to test
    Skipped {
        /// File the rule came from
        file: String,
        /// Why it is skipped
        reason: String,
    },
    /// The rule could not be loaded
    Failed {
        /// File the rule came from
        file: String,
        /// Load error, already formatted
        message: String,
    },
}

impl RuleEntry {
    /// Name of the rule file
    pub fn file(&self) -> &str {
        match self {
            RuleEntry::Spec { file, .. }
            | RuleEntry::Skipped { file, .. }
            | RuleEntry::Failed { file, .. } => file,
        }
    }
}

/// All rules for one platform, in file order
#[derive(Debug, Clone)]
pub struct RuleSet {
    platform: Platform,
    entries: Vec<RuleEntry>,
}

impl RuleSet {
    /// Create an empty rule set
    pub fn new(platform: Platform) -> Self {
        Self {
            platform,
            entries: Vec::new(),
        }
    }

    /// Platform these rules apply to
    pub fn platform(&self) -> Platform {
        self.platform
    }

    /// Every entry, including failed and skipped ones
    pub fn entries(&self) -> &[RuleEntry] {
        &self.entries
    }

    /// Testable rules only
    pub fn specs(&self) -> impl Iterator<Item = &TestSpec> {
        self.entries.iter().filter_map(|entry| match entry {
            RuleEntry::Spec { spec, .. } => Some(spec),
            _ => None,
        })
    }

    /// Number of entries that failed to load
    pub fn failed_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| matches!(e, RuleEntry::Failed { .. }))
            .count()
    }

    /// Add a rule, refusing a second rule for the same command
    pub fn push_spec(&mut self, file: impl Into<String>, spec: TestSpec) {
        let file = file.into();
        let duplicate = self.entries.iter().find_map(|entry| match entry {
            RuleEntry::Spec {
                file: first,
                spec: existing,
            } if existing.command == spec.command => Some(first.clone()),
            _ => None,
        });
        match duplicate {
            Some(first) => self.entries.push(RuleEntry::Failed {
                message: format!(
                    "duplicate rule for '{}' (already defined in {})",
                    spec.command, first
                ),
                file,
            }),
            None => self.entries.push(RuleEntry::Spec { file, spec }),
        }
    }

    /// Load one rule file into the set; problems become entries, not errors
    pub fn load_file(&mut self, path: &Path) {
        let file = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        let parsed = std::fs::read_to_string(path)
            .map_err(|e| Error::rule_load(path, e.to_string()))
            .and_then(|content| TestSpec::parse(&content, &path.display().to_string()));

        match parsed {
            Ok(ParsedRule::Spec(spec)) => {
                debug!(file = %file, command = %spec.command, "loaded rule");
                self.push_spec(file, spec);
            }
            Ok(ParsedRule::CaptureOnly(commands)) => {
                debug!(file = %file, "skipping capture-only rule");
                self.entries.push(RuleEntry::Skipped {
                    file,
                    reason: format!("capture-only rule for {} commands", commands.len()),
                });
            }
            Err(e) => {
                warn!(file = %file, error = %e, "rule failed to load");
                self.entries.push(RuleEntry::Failed {
                    file,
                    message: e.to_string(),
                });
            }
        }
    }
}

/// Rule sets for every platform in use
#[derive(Debug, Clone, Default)]
pub struct RuleStore {
    sets: HashMap<Platform, RuleSet>,
}

impl RuleStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the rules of one platform from `<root>/<platform>/`.
    ///
    /// With an explicit file list only those files are read, in that order;
    /// otherwise every `*.yml`/`*.yaml` in the directory, sorted by name.
    pub fn load_platform(
        &mut self,
        root: &Path,
        platform: Platform,
        files: Option<&[String]>,
    ) -> Result<&RuleSet> {
        let dir = root.join(platform.as_str());
        let paths: Vec<PathBuf> = match files {
            Some(files) => files.iter().map(|f| dir.join(f)).collect(),
            None => discover_rule_files(&dir)?,
        };

        let mut set = RuleSet::new(platform);
        for path in paths {
            if path.file_name().is_some_and(|n| n == PING_RULE_FILE) {
                continue;
            }
            set.load_file(&path);
        }
        if set.entries().is_empty() {
            warn!(platform = %platform, dir = %dir.display(), "no rule files found");
        }

        self.sets.insert(platform, set);
        Ok(&self.sets[&platform])
    }

    /// Insert a rule set built elsewhere
    pub fn insert(&mut self, set: RuleSet) {
        self.sets.insert(set.platform(), set);
    }

    /// Rules for a platform, if loaded
    pub fn get(&self, platform: Platform) -> Option<&RuleSet> {
        self.sets.get(&platform)
    }
}

fn discover_rule_files(dir: &Path) -> Result<Vec<PathBuf>> {
    // The directory is literal; only the file name is a pattern
    let base = glob::Pattern::escape(&dir.to_string_lossy());
    let mut paths = Vec::new();
    for ext in ["yml", "yaml"] {
        let pattern = format!("{base}{}*.{ext}", std::path::MAIN_SEPARATOR);
        let entries = glob::glob(&pattern)
            .map_err(|e| Error::Config(format!("bad rule path {}: {}", dir.display(), e)))?;
        paths.extend(entries.filter_map(std::result::Result::ok));
    }
    paths.sort();
    Ok(paths)
}
