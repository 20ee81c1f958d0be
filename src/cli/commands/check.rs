//! Check command - audit the devices of a manifest
//!
//! Loads the manifest, audits every device and writes either the human
//! report or one JSON document.

use super::{CommandContext, EXIT_FAILURES, EXIT_OK};
use anyhow::{Context, Result};
use clap::Parser;
use netbaseline::audit::Auditor;
use netbaseline::manifest::Manifest;
use netbaseline::report::{OutputMode, ReportContext};
use netbaseline::summary::reports_to_json;
use std::path::PathBuf;

/// Arguments for the check command
#[derive(Parser, Debug, Clone)]
pub struct CheckArgs {
    /// Device manifest (YAML)
    #[arg(short = 'm', long)]
    pub manifest: Option<PathBuf>,

    /// Print one JSON document instead of the human report
    #[arg(short = 'j', long)]
    pub json: bool,

    /// Show only failures and device totals
    #[arg(short = 'q', long, conflicts_with = "summary")]
    pub quiet: bool,

    /// Show only device totals
    #[arg(short = 's', long)]
    pub summary: bool,

    /// Only compare configurations
    #[arg(short = 'c', long = "config-only")]
    pub config_only: bool,

    /// Number of devices audited in parallel
    #[arg(short = 'f', long, env = "NETBASELINE_FORKS")]
    pub forks: Option<usize>,

    /// Rules directory (one subdirectory per platform)
    #[arg(long, env = "NETBASELINE_RULES_PATH")]
    pub rules: Option<PathBuf>,
}

impl CheckArgs {
    /// Execute the check command
    pub fn execute(&self, ctx: &mut CommandContext) -> Result<i32> {
        let manifest = self
            .manifest
            .clone()
            .or_else(|| ctx.config.defaults.manifest.clone())
            .context("No manifest given; pass -m <file> or set defaults.manifest")?;

        let devices = Manifest::load(&manifest)
            .with_context(|| format!("Failed to load manifest {}", manifest.display()))?;

        let mut audit_config = ctx.config.audit_config()?;
        audit_config.config_only = self.config_only;
        if let Some(forks) = self.forks {
            audit_config.forks = forks.max(1);
        }
        if let Some(rules) = &self.rules {
            audit_config.rules_path = rules.clone();
        }
        if !self.config_only && !audit_config.rules_path.is_dir() {
            ctx.output.warning(&format!(
                "Rules directory {} not found; only configuration and pings are checked",
                audit_config.rules_path.display()
            ));
        }

        let mut auditor = Auditor::new(audit_config);
        let reports = auditor
            .audit_devices(&devices)
            .context("Failed to run audit")?;

        let mode = if self.json {
            OutputMode::Json
        } else {
            OutputMode::Human
        };
        let verbosity = ctx.report_verbosity(self.quiet, self.summary);
        let mut report = ReportContext::stdout(verbosity, mode, ctx.color);

        if report.is_json() {
            report.publish_json(&reports_to_json(&reports))?;
        } else {
            for device in &reports {
                report.publish(&device.log)?;
            }
        }

        if reports.iter().any(|r| r.has_failures()) {
            Ok(EXIT_FAILURES)
        } else {
            Ok(EXIT_OK)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_args_parsing() {
        let args = CheckArgs::try_parse_from(["check", "-m", "devices.yml", "-j", "-c", "-f", "8"])
            .unwrap();
        assert_eq!(args.manifest, Some(PathBuf::from("devices.yml")));
        assert!(args.json);
        assert!(args.config_only);
        assert_eq!(args.forks, Some(8));
    }

    #[test]
    fn test_quiet_conflicts_with_summary() {
        assert!(CheckArgs::try_parse_from(["check", "-q", "-s"]).is_err());
    }
}
