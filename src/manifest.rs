//! Device manifest: which devices to audit and where their captures are.
//!
//! ```yaml
//! devices:
//!   - hostname: r1
//!     platform: juniper_junos
//!     before: captures/r1_pre.log
//!     after: captures/r1_post.log
//!   - hostname: r2
//!     platform: cisco_ios
//!     snapshot: r2.json
//!     before_config: r2_flat_pre.cfg
//!     after_config: r2_flat_post.cfg
//! ```
//!
//! Relative paths are resolved against the manifest's directory.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Error, ErrorContext, Result};
use crate::snapshot::Snapshot;

/// Where a device's captures come from
#[derive(Debug, Clone, PartialEq)]
pub enum CaptureSource {
    /// Already split output
    Snapshot(Snapshot),
    /// A JSON snapshot on disk
    SnapshotFile(PathBuf),
    /// Raw transcripts held in memory
    Transcripts {
        /// Transcript captured before the change
        before: String,
        /// Transcript captured after the change
        after: String,
    },
    /// Raw transcripts on disk
    TranscriptFiles {
        /// Transcript captured before the change
        before: PathBuf,
        /// Transcript captured after the change
        after: PathBuf,
    },
    /// Nothing usable was configured
    Missing(String),
}

/// One device to audit
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceInput {
    /// Device hostname, as it appears in the CLI prompt
    pub hostname: String,
    /// Platform name as configured; parsed when the device is audited
    pub platform: String,
    /// Captured command output
    pub captures: CaptureSource,
    /// Flattened configuration files, before and after
    pub flat_config: Option<(PathBuf, PathBuf)>,
}

impl DeviceInput {
    /// Device with an in-memory snapshot
    pub fn from_snapshot(hostname: impl Into<String>, platform: impl Into<String>, snapshot: Snapshot) -> Self {
        Self {
            hostname: hostname.into(),
            platform: platform.into(),
            captures: CaptureSource::Snapshot(snapshot),
            flat_config: None,
        }
    }

    /// Device with in-memory transcripts
    pub fn from_transcripts(
        hostname: impl Into<String>,
        platform: impl Into<String>,
        before: impl Into<String>,
        after: impl Into<String>,
    ) -> Self {
        Self {
            hostname: hostname.into(),
            platform: platform.into(),
            captures: CaptureSource::Transcripts {
                before: before.into(),
                after: after.into(),
            },
            flat_config: None,
        }
    }
}

/// A manifest entry as written in YAML
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeviceEntry {
    /// Device hostname
    pub hostname: String,
    /// Platform name (`juniper_junos`, `cisco_ios`, ...)
    pub platform: String,
    /// Transcript captured before the change
    #[serde(default)]
    pub before: Option<PathBuf>,
    /// Transcript captured after the change
    #[serde(default)]
    pub after: Option<PathBuf>,
    /// JSON snapshot, used instead of transcripts
    #[serde(default)]
    pub snapshot: Option<PathBuf>,
    /// Flattened configuration before the change
    #[serde(default)]
    pub before_config: Option<PathBuf>,
    /// Flattened configuration after the change
    #[serde(default)]
    pub after_config: Option<PathBuf>,
}

impl DeviceEntry {
    fn into_input(self, base: &Path) -> DeviceInput {
        let resolve = |p: PathBuf| if p.is_absolute() { p } else { base.join(p) };

        let captures = match (self.snapshot, self.before, self.after) {
            (Some(snapshot), _, _) => CaptureSource::SnapshotFile(resolve(snapshot)),
            (None, Some(before), Some(after)) => CaptureSource::TranscriptFiles {
                before: resolve(before),
                after: resolve(after),
            },
            (None, before, after) => CaptureSource::Missing(format!(
                "no {} capture configured",
                if before.is_none() { "before" } else if after.is_none() { "after" } else { "" }
            )),
        };

        let flat_config = match (self.before_config, self.after_config) {
            (Some(before), Some(after)) => Some((resolve(before), resolve(after))),
            _ => None,
        };

        DeviceInput {
            hostname: self.hostname,
            platform: self.platform,
            captures,
            flat_config,
        }
    }
}

/// The device manifest
#[derive(Debug, Clone, Deserialize)]
pub struct Manifest {
    /// Devices in audit order
    pub devices: Vec<DeviceEntry>,
}

impl Manifest {
    /// Parse a manifest
    pub fn from_str(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Load a manifest and resolve its paths
    pub fn load(path: impl AsRef<Path>) -> Result<Vec<DeviceInput>> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read manifest {}", path.display()))?;
        let manifest = Self::from_str(&content)?;
        if manifest.devices.is_empty() {
            return Err(Error::Config(format!(
                "manifest {} lists no devices",
                path.display()
            )));
        }
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        Ok(manifest.into_inputs(base))
    }

    /// Resolve every entry against `base`
    pub fn into_inputs(self, base: &Path) -> Vec<DeviceInput> {
        self.devices
            .into_iter()
            .map(|entry| entry.into_input(base))
            .collect()
    }
}
