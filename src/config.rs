//! Configuration module for netbaseline
//!
//! Handles loading and merging configuration from multiple sources:
//! - Default values
//! - User configuration (~/.netbaseline.toml)
//! - Project configuration (./netbaseline.toml)
//! - The file named by `NETBASELINE_CONFIG`
//! - Environment variables
//! - Command-line arguments (applied by the binary)

use anyhow::{bail, Context, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::audit::{AuditConfig, DEFAULT_FORKS};
use crate::platform::Platform;

const DEFAULT_RULES_PATH: &str = "rules";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Default settings
    pub defaults: Defaults,

    /// Output settings
    pub output: OutputConfig,

    /// Rule files per platform, e.g. `juniper_junos = ["test_bgp.yml"]`
    pub rules: IndexMap<String, Vec<String>>,
}

/// Default configuration values
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Defaults {
    /// Directory holding one rule directory per platform
    pub rules_path: PathBuf,

    /// Number of devices audited in parallel
    pub forks: usize,

    /// Manifest used when none is given on the command line
    pub manifest: Option<PathBuf>,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            rules_path: PathBuf::from(DEFAULT_RULES_PATH),
            forks: DEFAULT_FORKS,
            manifest: None,
        }
    }
}

/// Output settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OutputConfig {
    /// Colour pass/fail lines
    pub color: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { color: true }
    }
}

impl Config {
    /// Load configuration from all sources
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        let mut config = Config::default();

        for path in Self::get_config_paths(config_path) {
            if path.exists() {
                config = config.merge_from_file(&path)?;
            } else if config_path == Some(&path) {
                bail!("Config file not found: {}", path.display());
            }
        }

        config.apply_env_overrides();
        Ok(config)
    }

    /// Configuration file paths, lowest precedence first
    fn get_config_paths(explicit_path: Option<&PathBuf>) -> Vec<PathBuf> {
        // Explicit path takes priority
        if let Some(path) = explicit_path {
            return vec![path.clone()];
        }

        let mut paths = Vec::new();
        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".netbaseline.toml"));
        }
        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("netbaseline").join("config.toml"));
        }
        paths.push(PathBuf::from("netbaseline.toml"));

        if let Ok(env_config) = std::env::var("NETBASELINE_CONFIG") {
            paths.push(PathBuf::from(env_config));
        }
        paths
    }

    /// Merge configuration from a file
    fn merge_from_file(&self, path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        // Determine format based on extension
        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");

        let file_config: Config = match extension {
            "yml" | "yaml" => serde_yaml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?,
            "json" => serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?,
            _ => toml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?,
        };

        Ok(self.merge(file_config))
    }

    /// Merge another config into this one; non-default values in `other` win
    fn merge(&self, other: Config) -> Config {
        let defaults = Defaults::default();
        let mut rules = self.rules.clone();
        rules.extend(other.rules);

        Config {
            defaults: Defaults {
                rules_path: if other.defaults.rules_path != defaults.rules_path {
                    other.defaults.rules_path
                } else {
                    self.defaults.rules_path.clone()
                },
                forks: if other.defaults.forks != defaults.forks {
                    other.defaults.forks
                } else {
                    self.defaults.forks
                },
                manifest: other
                    .defaults
                    .manifest
                    .or_else(|| self.defaults.manifest.clone()),
            },
            output: OutputConfig {
                color: self.output.color && other.output.color,
            },
            rules,
        }
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        // NETBASELINE_RULES_PATH
        if let Ok(path) = std::env::var("NETBASELINE_RULES_PATH") {
            self.defaults.rules_path = PathBuf::from(path);
        }

        // NETBASELINE_FORKS
        if let Ok(forks) = std::env::var("NETBASELINE_FORKS") {
            if let Ok(n) = forks.parse() {
                self.defaults.forks = n;
            }
        }

        // NO_COLOR
        if std::env::var("NO_COLOR").is_ok() {
            self.output.color = false;
        }
    }

    /// Rules directory with `~` and environment variables expanded
    pub fn rules_path(&self) -> PathBuf {
        expand_path(&self.defaults.rules_path)
    }

    /// Explicit rule file lists, keyed by platform
    pub fn rule_files(&self) -> Result<HashMap<Platform, Vec<String>>> {
        self.rules
            .iter()
            .map(|(name, files)| {
                let platform = name
                    .parse::<Platform>()
                    .map_err(anyhow::Error::msg)
                    .with_context(|| format!("Invalid [rules] entry '{name}'"))?;
                Ok((platform, files.clone()))
            })
            .collect()
    }

    /// Settings for the audit driver
    pub fn audit_config(&self) -> Result<AuditConfig> {
        Ok(AuditConfig {
            forks: self.defaults.forks.max(1),
            config_only: false,
            rules_path: self.rules_path(),
            rule_files: self.rule_files()?,
        })
    }

    /// Load from a specific file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        Config::default().merge_from_file(path.as_ref())
    }
}

fn expand_path(path: &Path) -> PathBuf {
    let raw = path.to_string_lossy();
    let expanded = shellexpand::full(&raw).unwrap_or_else(|_| shellexpand::tilde(&raw));
    PathBuf::from(expanded.as_ref())
}
