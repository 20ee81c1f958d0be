//! Report output.
//!
//! Components never print. They append [`ReportLine`]s to a per-device
//! [`DeviceLog`], and the [`ReportContext`] decides what reaches the sink:
//! which severities the verbosity admits, whether lines are coloured, and
//! whether the run produces human text or one JSON document.

use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use colored::Colorize;

/// How much of the human report is shown
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Verbosity {
    /// Only the device totals
    Summary,
    /// Failures and totals
    Quiet,
    /// Headers, failures and totals
    Normal,
    /// Everything, passing lines included
    Verbose,
}

impl Verbosity {
    /// Lowest severity shown at this verbosity
    pub fn threshold(self) -> Severity {
        match self {
            Verbosity::Summary => Severity::Error,
            Verbosity::Quiet => Severity::Warn,
            Verbosity::Normal => Severity::Info,
            Verbosity::Verbose => Severity::Debug,
        }
    }
}

/// Human text or one structured document per run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Line-oriented log
    Human,
    /// `{hostname: {command: [failures]}}`
    Json,
}

/// Importance of a report line
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// Passing details
    Debug,
    /// Headers and per-command totals
    Info,
    /// Failures
    Warn,
    /// Device totals and errors
    Error,
}

/// How a line is coloured
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    /// Passing result
    Pass,
    /// Failing result or error
    Fail,
    /// Anything else
    Plain,
}

/// One line of the human report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportLine {
    /// Importance
    pub severity: Severity,
    /// Colouring
    pub kind: LineKind,
    /// Text without colour codes
    pub text: String,
}

/// Report lines collected for one device
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceLog {
    lines: Vec<ReportLine>,
}

impl DeviceLog {
    /// Create an empty log
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a line
    pub fn push(&mut self, severity: Severity, kind: LineKind, text: impl Into<String>) {
        self.lines.push(ReportLine {
            severity,
            kind,
            text: text.into(),
        });
    }

    /// Plain informational line
    pub fn info(&mut self, text: impl Into<String>) {
        self.push(Severity::Info, LineKind::Plain, text);
    }

    /// Passing result, shown only when verbose
    pub fn pass(&mut self, text: impl Into<String>) {
        self.push(Severity::Debug, LineKind::Pass, text);
    }

    /// Passing result that is always worth showing
    pub fn pass_info(&mut self, text: impl Into<String>) {
        self.push(Severity::Info, LineKind::Pass, text);
    }

    /// Failing result
    pub fn fail(&mut self, text: impl Into<String>) {
        self.push(Severity::Warn, LineKind::Fail, text);
    }

    /// Error entry
    pub fn error(&mut self, text: impl Into<String>) {
        self.push(Severity::Error, LineKind::Fail, text);
    }

    /// Collected lines in order
    pub fn lines(&self) -> &[ReportLine] {
        &self.lines
    }
}

/// Destination of rendered report text
pub trait ReportSink: Send {
    /// Write one rendered line
    fn write_line(&mut self, line: &str) -> io::Result<()>;

    /// Flush buffered output
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Writes to standard output
#[derive(Debug, Default)]
pub struct StdoutSink;

impl ReportSink for StdoutSink {
    fn write_line(&mut self, line: &str) -> io::Result<()> {
        let mut out = io::stdout().lock();
        writeln!(out, "{line}")
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stdout().flush()
    }
}

/// Keeps lines in memory; clones share the same buffer
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    lines: Arc<Mutex<Vec<String>>>,
}

impl MemorySink {
    /// Create an empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Lines written so far
    pub fn lines(&self) -> Vec<String> {
        self.lines
            .lock()
            .map(|lines| lines.clone())
            .unwrap_or_default()
    }

    /// All lines joined with newlines
    pub fn contents(&self) -> String {
        self.lines().join("\n")
    }
}

impl ReportSink for MemorySink {
    fn write_line(&mut self, line: &str) -> io::Result<()> {
        self.lines
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "report buffer poisoned"))?
            .push(line.to_string());
        Ok(())
    }
}

/// Reporting settings and the sink they write to
pub struct ReportContext {
    /// How much is shown
    pub verbosity: Verbosity,
    /// Human or JSON output
    pub mode: OutputMode,
    /// Colour pass/fail lines
    pub color: bool,
    sink: Box<dyn ReportSink>,
}

impl std::fmt::Debug for ReportContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReportContext")
            .field("verbosity", &self.verbosity)
            .field("mode", &self.mode)
            .field("color", &self.color)
            .finish_non_exhaustive()
    }
}

impl ReportContext {
    /// Create a context writing to `sink`
    pub fn new(verbosity: Verbosity, mode: OutputMode, color: bool, sink: Box<dyn ReportSink>) -> Self {
        // JSON output is never coloured
        let color = color && mode == OutputMode::Human;
        Self {
            verbosity,
            mode,
            color,
            sink,
        }
    }

    /// Context writing human text to stdout
    pub fn stdout(verbosity: Verbosity, mode: OutputMode, color: bool) -> Self {
        Self::new(verbosity, mode, color, Box::new(StdoutSink))
    }

    /// Whether the run produces a JSON document
    pub fn is_json(&self) -> bool {
        self.mode == OutputMode::Json
    }

    /// Whether a line passes the verbosity filter
    pub fn admits(&self, line: &ReportLine) -> bool {
        line.severity >= self.verbosity.threshold()
    }

    /// Apply colour to a line
    pub fn render(&self, line: &ReportLine) -> String {
        if !self.color {
            return line.text.clone();
        }
        match line.kind {
            LineKind::Pass => line.text.green().to_string(),
            LineKind::Fail => line.text.bright_red().to_string(),
            LineKind::Plain => line.text.clone(),
        }
    }

    /// Write a device's log; nothing is written in JSON mode
    pub fn publish(&mut self, log: &DeviceLog) -> io::Result<()> {
        if self.is_json() {
            return Ok(());
        }
        for line in log.lines() {
            if self.admits(line) {
                let rendered = self.render(line);
                self.sink.write_line(&rendered)?;
            }
        }
        self.sink.flush()
    }

    /// Write the structured document
    pub fn publish_json(&mut self, value: &serde_json::Value) -> io::Result<()> {
        let text = serde_json::to_string_pretty(value)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        self.sink.write_line(&text)?;
        self.sink.flush()
    }
}
