//! Validate command - load rule files and report the broken ones

use super::{CommandContext, EXIT_FAILURES, EXIT_OK};
use anyhow::{bail, Result};
use clap::Parser;
use netbaseline::platform::Platform;
use netbaseline::rules::{RuleEntry, RuleStore};
use std::path::PathBuf;

/// Arguments for the validate command
#[derive(Parser, Debug, Clone)]
pub struct ValidateArgs {
    /// Rules directory (one subdirectory per platform)
    pub rules_dir: PathBuf,

    /// Only validate this platform's rules
    #[arg(long)]
    pub platform: Option<String>,
}

impl ValidateArgs {
    /// Execute the validate command
    pub fn execute(&self, ctx: &mut CommandContext) -> Result<i32> {
        if !self.rules_dir.is_dir() {
            bail!("Rules directory not found: {}", self.rules_dir.display());
        }

        let platforms: Vec<Platform> = match &self.platform {
            Some(name) => vec![name.parse().map_err(anyhow::Error::msg)?],
            None => Platform::ALL
                .into_iter()
                .filter(|p| self.rules_dir.join(p.as_str()).is_dir())
                .collect(),
        };

        ctx.output.banner("RULE VALIDATION");

        let mut store = RuleStore::new();
        let (mut valid, mut skipped, mut failed) = (0, 0, 0);
        for platform in platforms {
            ctx.output.section(platform.as_str());
            let set = store.load_platform(&self.rules_dir, platform, None)?;
            for entry in set.entries() {
                match entry {
                    RuleEntry::Spec { file, spec } => {
                        valid += 1;
                        ctx.output.ok(&format!("{file}: {}", spec.command));
                    }
                    RuleEntry::Skipped { file, reason } => {
                        skipped += 1;
                        ctx.output.debug(&format!("{file}: {reason}"));
                    }
                    RuleEntry::Failed { file, message } => {
                        failed += 1;
                        ctx.output.error(&format!("{file}: {message}"));
                    }
                }
            }
        }

        ctx.output.section("Validation Results");
        ctx.output.info(&format!(
            "{valid} valid, {skipped} skipped, {failed} failed"
        ));
        Ok(if failed == 0 { EXIT_OK } else { EXIT_FAILURES })
    }
}
