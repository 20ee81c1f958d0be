//! Per-device result aggregation.
//!
//! The [`SummaryAggregator`] collects every verdict, configuration diff,
//! ping result and error for one device. It writes the human report lines
//! as it goes and produces a [`DeviceReport`] holding the per-command
//! tallies and failure messages for structured output.

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::diff::{ConfigDiff, ConfigSource, CONFIG_COMMAND};
use crate::error::Error;
use crate::matcher::{Status, Verdict};
use crate::ping::{PingReport, PING_COMMAND};
use crate::report::{DeviceLog, LineKind, Severity};

const RULER_WIDTH: usize = 64;

/// Pass/fail counts and failure messages of one command
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CommandTally {
    /// Passing verdicts
    pub pass: usize,
    /// Failing verdicts
    pub fail: usize,
    /// Rendered failure messages, in order
    pub failures: Vec<String>,
}

impl CommandTally {
    fn record(&mut self, status: Status, message: Option<&str>) {
        match status {
            Status::Pass => self.pass += 1,
            Status::Fail => {
                self.fail += 1;
                if let Some(message) = message {
                    self.failures.push(message.to_string());
                }
            }
        }
    }
}

/// Device totals as printed at the end of a device's report
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DeviceTotals {
    /// Commands with at least one passing verdict
    pub passed: usize,
    /// Commands with at least one failing verdict
    pub failed: usize,
    /// Changed configuration lines
    pub config: usize,
}

/// Everything found for one device
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceReport {
    /// Device hostname
    pub hostname: String,
    /// Tallies per command, in evaluation order
    pub commands: IndexMap<String, CommandTally>,
    /// Entries that are not verdicts (unloadable rules, missing output)
    pub errors: IndexMap<String, Vec<String>>,
    /// Human report lines
    pub log: DeviceLog,
}

impl DeviceReport {
    /// Device totals
    pub fn totals(&self) -> DeviceTotals {
        DeviceTotals {
            passed: self.commands.values().filter(|t| t.pass > 0).count(),
            failed: self.commands.values().filter(|t| t.fail > 0).count(),
            config: self.commands.get(CONFIG_COMMAND).map_or(0, |t| t.fail),
        }
    }

    /// Commands with failures and their failure counts
    pub fn failing_commands(&self) -> impl Iterator<Item = (&str, usize)> {
        self.commands
            .iter()
            .filter(|(_, t)| t.fail > 0)
            .map(|(cmd, t)| (cmd.as_str(), t.fail))
    }

    /// Whether anything failed or could not be checked
    pub fn has_failures(&self) -> bool {
        !self.errors.is_empty() || self.commands.values().any(|t| t.fail > 0)
    }

    /// `{command: [failure, ...]}`, keys sorted
    pub fn to_json(&self) -> Value {
        let mut map = Map::new();
        for (command, tally) in &self.commands {
            map.insert(command.clone(), Value::from(tally.failures.clone()));
        }
        for (key, messages) in &self.errors {
            let entry = map
                .entry(key.clone())
                .or_insert_with(|| Value::Array(Vec::new()));
            if let Value::Array(items) = entry {
                items.extend(messages.iter().cloned().map(Value::from));
            }
        }
        Value::Object(map)
    }
}

/// `{hostname: {command: [failure, ...]}}` for many devices
pub fn reports_to_json<'a>(reports: impl IntoIterator<Item = &'a DeviceReport>) -> Value {
    let mut map = Map::new();
    for report in reports {
        map.insert(report.hostname.clone(), report.to_json());
    }
    Value::Object(map)
}

/// Builds a [`DeviceReport`] step by step
#[derive(Debug)]
pub struct SummaryAggregator {
    report: DeviceReport,
}

impl SummaryAggregator {
    /// Start the report of one device
    pub fn new(hostname: impl Into<String>) -> Self {
        let hostname = hostname.into();
        let mut log = DeviceLog::new();
        log.push(Severity::Warn, LineKind::Plain, format!("Running {hostname}:"));
        log.push(Severity::Warn, LineKind::Plain, "-".repeat(RULER_WIDTH));
        let mut report = DeviceReport {
            hostname,
            log,
            ..Default::default()
        };
        report
            .commands
            .insert(CONFIG_COMMAND.to_string(), CommandTally::default());
        Self { report }
    }

    /// Hostname of the device being summarized
    pub fn hostname(&self) -> &str {
        &self.report.hostname
    }

    /// Mutable access to the report log
    pub fn log(&mut self) -> &mut DeviceLog {
        &mut self.report.log
    }

    fn error_entry(&mut self, key: &str, message: String) {
        self.report.log.error(message.clone());
        self.report
            .errors
            .entry(key.to_string())
            .or_default()
            .push(message);
    }

    /// A rule file that could not be loaded
    pub fn rule_error(&mut self, file: &str, message: &str) {
        self.error_entry(file, format!("ERROR: {message}"));
    }

    /// A command whose output was not captured on both sides
    pub fn command_error(&mut self, command: &str, error: &Error) {
        self.report
            .log
            .info(format!("******** Command: {command} ********"));
        self.error_entry(command, format!("ERROR: {error}"));
    }

    /// A problem that stops checks for the whole device
    pub fn device_error(&mut self, error: &Error) {
        let message = match error {
            Error::UnsupportedPlatform { host, .. } => {
                format!("ERROR: {host} OS not found or not yet supported")
            }
            other => format!("ERROR: {other}"),
        };
        let key = self.report.hostname.clone();
        self.error_entry(&key, message);
    }

    /// Record the rendered verdicts of one command
    pub fn command_verdicts(&mut self, command: &str, verdicts: &[Verdict], ignore_null: bool) {
        let log = &mut self.report.log;
        log.info(format!("******** Command: {command} ********"));

        let tally = self
            .report
            .commands
            .entry(command.to_string())
            .or_default();

        for verdict in verdicts {
            match verdict.status {
                Status::Fail => log.fail(verdict.message.clone()),
                Status::Pass if verdict.after_only => log.pass_info(verdict.message.clone()),
                Status::Pass => log.pass(verdict.message.clone()),
            }
            tally.record(verdict.status, Some(&verdict.message));
        }

        if verdicts.is_empty() {
            if ignore_null {
                log.pass_info("PASS! No output matched");
                tally.record(Status::Pass, None);
            } else {
                let message = format!("FAIL! No output matched for {command}");
                log.fail(message.clone());
                tally.record(Status::Fail, Some(&message));
            }
        } else if tally.fail == 0 {
            log.pass_info(format!("PASS! All {} tests passed!", tally.pass));
        } else {
            log.info(format!(
                "FAIL! {} tests passed, {} tests failed!",
                tally.pass, tally.fail
            ));
        }
    }

    /// Record the configuration diff, or why there is none
    pub fn config_diff(&mut self, source: ConfigSource, diff: &ConfigDiff) {
        let hostname = self.report.hostname.clone();
        let log = &mut self.report.log;
        log.info(format!("******** Command: {} ********", source.label()));

        let Some(tally) = self.report.commands.get_mut(CONFIG_COMMAND) else {
            return;
        };
        if diff.is_clean() {
            log.pass_info(format!("PASS! No changes in {hostname} configuration"));
            tally.pass += 1;
            return;
        }

        let headline = format!("FAILED! Configuration changed for {hostname}");
        log.fail(headline.clone());
        tally.failures.push(headline);
        for line in diff.rendered() {
            log.fail(line.clone());
            tally.failures.push(line);
        }
        tally.fail += diff.changes();
    }

    /// Record the ping comparison
    pub fn pings(&mut self, pings: &PingReport) {
        let log = &mut self.report.log;
        log.info("******** Testing ping commands ********");
        let tally = self
            .report
            .commands
            .entry(PING_COMMAND.to_string())
            .or_default();

        for outcome in &pings.outcomes {
            match outcome.status() {
                Some(Status::Fail) => {
                    log.fail(outcome.message());
                    tally.failures.push(outcome.message());
                }
                Some(Status::Pass) => log.pass(outcome.message()),
                None => log.push(Severity::Debug, LineKind::Plain, outcome.message()),
            }
        }

        if pings.failed() == 0 {
            tally.pass = pings.passed();
            log.pass_info(format!(
                "PASS! {} ping checks passed! ({} skipped)",
                pings.passed(),
                pings.skipped()
            ));
        } else {
            tally.fail = pings.failed();
            log.info(format!(
                "FAIL! {} tests passed, {} tests failed!",
                pings.passed(),
                pings.failed()
            ));
        }
    }

    /// Write the device totals and hand over the report
    pub fn finish(mut self) -> DeviceReport {
        let totals = self.report.totals();
        let failing: Vec<(String, usize)> = self
            .report
            .failing_commands()
            .map(|(cmd, n)| (cmd.to_string(), n))
            .collect();

        let log = &mut self.report.log;
        log.push(Severity::Warn, LineKind::Plain, "-".repeat(RULER_WIDTH));
        log.push(
            Severity::Error,
            LineKind::Plain,
            format!(
                "{} totals:  PASSED: {}  FAILED: {}  CONFIG: {}",
                self.report.hostname, totals.passed, totals.failed, totals.config
            ),
        );
        log.info("-".repeat(RULER_WIDTH));
        for (command, count) in failing {
            log.info(format!("  Failed - {count} lines - {command}"));
        }
        self.report
    }
}
