//! Ping health comparison.
//!
//! Ping commands need no rule file: every captured command starting with
//! `ping` is compared by its summary line. Junos and Nokia report packet
//! loss, Cisco reports success rate; loss is converted so that messages
//! always speak of success.

use tracing::debug;

use crate::matcher::Status;
use crate::platform::{PingFormat, Platform};
use crate::snapshot::Snapshot;

/// Synthetic command name ping results are reported under
pub const PING_COMMAND: &str = "ping checks";

/// Outcome of one ping command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PingOutcome {
    /// Metric unchanged
    Pass {
        /// Ping command
        command: String,
        /// Success rate, in percent
        success: String,
    },
    /// Metric changed or missing after the change
    Fail {
        /// Ping command
        command: String,
        /// Message describing the failure
        message: String,
    },
    /// Nothing to compare
    Skip {
        /// Ping command
        command: String,
    },
}

impl PingOutcome {
    /// Pass/fail status, `None` for skipped pings
    pub fn status(&self) -> Option<Status> {
        match self {
            PingOutcome::Pass { .. } => Some(Status::Pass),
            PingOutcome::Fail { .. } => Some(Status::Fail),
            PingOutcome::Skip { .. } => None,
        }
    }

    /// Report line for this outcome
    pub fn message(&self) -> String {
        match self {
            PingOutcome::Pass { command, success } => {
                format!("PASSED! {command} {success}% success before and after")
            }
            PingOutcome::Fail { message, .. } => message.clone(),
            PingOutcome::Skip { command } => format!("SKIPPED! {command}"),
        }
    }
}

/// Totals over all ping commands of a device
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PingReport {
    /// Per-command outcomes in capture order
    pub outcomes: Vec<PingOutcome>,
}

impl PingReport {
    fn count(&self, status: Option<Status>) -> usize {
        self.outcomes.iter().filter(|o| o.status() == status).count()
    }

    /// Pings whose metric did not change
    pub fn passed(&self) -> usize {
        self.count(Some(Status::Pass))
    }

    /// Pings that changed or vanished
    pub fn failed(&self) -> usize {
        self.count(Some(Status::Fail))
    }

    /// Pings with nothing to compare
    pub fn skipped(&self) -> usize {
        self.count(None)
    }
}

/// The metric field of the first summary line
fn metric<'a>(lines: &'a [String], format: &PingFormat) -> Option<&'a str> {
    lines
        .iter()
        .find(|line| line.contains(format.marker))
        .and_then(|line| line.split_whitespace().nth(format.field))
}

/// Success rate in percent, as printed in messages
fn success_rate(raw: &str, format: &PingFormat) -> String {
    if !format.reports_loss {
        return raw.trim_end_matches('%').to_string();
    }
    let loss = raw.replace('%', "");
    let whole = loss.split('.').next().unwrap_or_default();
    match whole.parse::<i64>() {
        Ok(loss) => (100 - loss).to_string(),
        Err(_) => raw.to_string(),
    }
}

/// Compare one ping command.
pub fn check_ping(
    platform: Platform,
    command: &str,
    before: &[String],
    after: Option<&[String]>,
) -> PingOutcome {
    let format = platform.ping_format();
    let skip = || PingOutcome::Skip {
        command: command.to_string(),
    };

    let Some(after) = after else {
        return skip();
    };
    let Some(before_metric) = metric(before, &format) else {
        return skip();
    };
    let Some(after_metric) = metric(after, &format) else {
        return PingOutcome::Fail {
            command: command.to_string(),
            message: format!("FAILED! {command} not found in the after baseline"),
        };
    };

    let before_rate = success_rate(before_metric, &format);
    if before_metric == after_metric {
        PingOutcome::Pass {
            command: command.to_string(),
            success: before_rate,
        }
    } else {
        let after_rate = success_rate(after_metric, &format);
        PingOutcome::Fail {
            command: command.to_string(),
            message: format!("FAILED! {command} pre={before_rate}% post={after_rate}% success"),
        }
    }
}

/// Compare every ping command captured before the change.
pub fn check_pings(platform: Platform, snapshot: &Snapshot) -> PingReport {
    let outcomes: Vec<PingOutcome> = snapshot
        .ping_commands()
        .map(|command| {
            let before = &snapshot.before[command];
            let after = snapshot.after.get(command).map(Vec::as_slice);
            check_ping(platform, command, before, after)
        })
        .collect();
    debug!(pings = outcomes.len(), "checked ping commands");
    PingReport { outcomes }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn junos(loss: &str) -> Vec<String> {
        vec![
            "--- 10.0.0.1 ping statistics ---".to_string(),
            format!("5 packets transmitted, 5 packets received, {loss} packet loss"),
        ]
    }

    #[test]
    fn test_junos_same_loss_passes() {
        let after = junos("2%");
        let outcome = check_ping(
            Platform::JuniperJunos,
            "ping 10.0.0.1",
            &junos("2%"),
            Some(after.as_slice()),
        );
        assert_eq!(
            outcome.message(),
            "PASSED! ping 10.0.0.1 98% success before and after"
        );
    }

    #[test]
    fn test_junos_changed_loss_fails() {
        let after = junos("5%");
        let outcome = check_ping(
            Platform::JuniperJunos,
            "ping 10.0.0.1",
            &junos("2%"),
            Some(after.as_slice()),
        );
        assert_eq!(outcome.status(), Some(Status::Fail));
        assert_eq!(
            outcome.message(),
            "FAILED! ping 10.0.0.1 pre=98% post=95% success"
        );
    }

    #[test]
    fn test_cisco_success_rate() {
        let before =
            vec!["Success rate is 100 percent (5/5), round-trip min/avg/max = 1/1/2 ms".to_string()];
        let after =
            vec!["Success rate is 60 percent (3/5), round-trip min/avg/max = 1/1/2 ms".to_string()];
        let outcome = check_ping(Platform::CiscoIos, "ping 10.0.0.1", &before, Some(&after[..]));
        assert_eq!(
            outcome.message(),
            "FAILED! ping 10.0.0.1 pre=100% post=60% success"
        );
    }

    #[test]
    fn test_missing_markers() {
        let empty: Vec<String> = Vec::new();
        let clean = junos("0%");
        let outcome = check_ping(Platform::JuniperJunos, "ping x", &empty, Some(&clean[..]));
        assert_eq!(outcome.status(), None);

        let outcome = check_ping(Platform::JuniperJunos, "ping x", &clean, Some(&empty[..]));
        assert_eq!(outcome.message(), "FAILED! ping x not found in the after baseline");

        let outcome = check_ping(Platform::JuniperJunos, "ping x", &junos("0%"), None);
        assert_eq!(outcome.status(), None);
    }

    #[test]
    fn test_check_pings_over_snapshot() {
        let mut snapshot = Snapshot::default();
        snapshot.before.insert("ping a".into(), junos("0%"));
        snapshot.after.insert("ping a".into(), junos("0%"));
        snapshot.before.insert("ping b".into(), junos("0%"));
        snapshot.before.insert("show version".into(), vec![]);
        let report = check_pings(Platform::NokiaSros, &snapshot);
        assert_eq!((report.passed(), report.failed(), report.skipped()), (1, 0, 1));
    }
}
