//! Before/after command output captured from one device.

use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{Error, ErrorContext, Result};

/// Command name → captured output lines, in capture order
pub type CommandOutputs = IndexMap<String, Vec<String>>;

/// Which side of the change a capture belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Captured before the change
    Before,
    /// Captured after the change
    After,
}

impl Phase {
    /// Both phases, before first
    pub const BOTH: [Phase; 2] = [Phase::Before, Phase::After];
}

/// The before and after captures of one device
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Output captured before the change
    #[serde(default)]
    pub before: CommandOutputs,
    /// Output captured after the change
    #[serde(default)]
    pub after: CommandOutputs,
}

impl Snapshot {
    /// Create a snapshot from the two sides
    pub fn new(before: CommandOutputs, after: CommandOutputs) -> Self {
        Self { before, after }
    }

    /// Parse a `{"before": {...}, "after": {...}}` document
    pub fn from_json_str(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Load a JSON snapshot from disk
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read snapshot {}", path.display()))?;
        Self::from_json_str(&content)
    }

    /// Outputs for one phase
    pub fn side(&self, phase: Phase) -> &CommandOutputs {
        match phase {
            Phase::Before => &self.before,
            Phase::After => &self.after,
        }
    }

    /// Mutable outputs for one phase
    pub fn side_mut(&mut self, phase: Phase) -> &mut CommandOutputs {
        match phase {
            Phase::Before => &mut self.before,
            Phase::After => &mut self.after,
        }
    }

    /// Before and after output of one command; both sides must be present
    pub fn command(&self, command: &str) -> Result<(&[String], &[String])> {
        match (self.before.get(command), self.after.get(command)) {
            (Some(before), Some(after)) => Ok((before.as_slice(), after.as_slice())),
            _ => Err(Error::command_not_captured(command)),
        }
    }

    /// Commands captured before the change whose name starts with `ping`
    pub fn ping_commands(&self) -> impl Iterator<Item = &str> {
        self.before
            .keys()
            .map(String::as_str)
            .filter(|cmd| cmd.starts_with("ping"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_json_preserves_order() {
        let snapshot = Snapshot::from_json_str(
            r#"{"before": {"show b": ["x"], "show a": ["y"]}, "after": {"show b": []}}"#,
        )
        .unwrap();
        let keys: Vec<_> = snapshot.before.keys().cloned().collect();
        assert_eq!(keys, vec!["show b", "show a"]);
    }

    #[test]
    fn test_command_requires_both_sides() {
        let snapshot = Snapshot::from_json_str(
            r#"{"before": {"show b": ["x"], "show a": ["y"]}, "after": {"show b": []}}"#,
        )
        .unwrap();
        assert!(snapshot.command("show b").is_ok());
        let err = snapshot.command("show a").unwrap_err();
        assert!(matches!(err, Error::CommandNotCaptured { .. }));
    }

    #[test]
    fn test_ping_commands() {
        let mut snapshot = Snapshot::default();
        snapshot.before.insert("ping 10.0.0.1 count 5".into(), vec![]);
        snapshot.before.insert("show version".into(), vec![]);
        let pings: Vec<_> = snapshot.ping_commands().collect();
        assert_eq!(pings, vec!["ping 10.0.0.1 count 5"]);
    }
}
