//! Splits raw capture transcripts into per-command output.
//!
//! A transcript is the text of an interactive session: every prompt line
//! starts a new command, and lines up to the next prompt are its output.
//! Lines of the form `[COMMAND] <cmd>` start a command as well, for
//! captures taken by tools that do not echo the device prompt.

use std::path::Path;

use regex::Regex;
use tracing::debug;

use crate::error::{Error, Result};
use crate::platform::Platform;
use crate::snapshot::{CommandOutputs, Snapshot};

const COMMAND_MARKER: &str = "[COMMAND]";

/// Split one transcript into `command → lines`.
pub fn extract(transcript: &str, prompt: &Regex) -> CommandOutputs {
    let mut commands = CommandOutputs::new();
    let mut current: Option<String> = None;

    for raw in transcript.lines() {
        let line = raw.trim_end();

        if prompt.is_match(line) || line.starts_with(COMMAND_MARKER) {
            // A bare prompt carries no command
            if line.ends_with('>') || line.ends_with('#') {
                continue;
            }
            let command = prompt.replace(line, "");
            let command = command
                .strip_prefix(COMMAND_MARKER)
                .unwrap_or(&*command)
                .trim()
                .to_string();
            commands.insert(command.clone(), Vec::new());
            current = Some(command);
            continue;
        }

        let Some(ref command) = current else {
            continue;
        };
        if line.is_empty() || line.starts_with("{master") || line == "[]" {
            continue;
        }
        if let Some(lines) = commands.get_mut(command) {
            lines.push(line.to_string());
        }
    }

    debug!(commands = commands.len(), "extracted commands from transcript");
    commands
}

/// Build a snapshot from a before and an after transcript.
pub fn snapshot_from_transcripts(
    platform: Platform,
    hostname: &str,
    before: &str,
    after: &str,
) -> Result<Snapshot> {
    let prompt = platform.prompt_regex(hostname)?;
    Ok(Snapshot::new(
        extract(before, &prompt),
        extract(after, &prompt),
    ))
}

/// Read a transcript from disk.
///
/// Captures are taken from devices that may emit stray bytes, so invalid
/// UTF-8 is replaced rather than rejected.
pub fn read_transcript(hostname: &str, path: &Path) -> Result<String> {
    std::fs::read(path)
        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
        .map_err(|e| Error::MissingBaseline {
            host: hostname.to_string(),
            message: format!("{}: {}", path.display(), e),
        })
}
