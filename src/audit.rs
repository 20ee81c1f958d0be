//! Audit driver.
//!
//! [`Auditor::audit_device`] runs every check for one device: it builds the
//! snapshot, applies the output transformers, evaluates each rule, diffs
//! the configuration and compares pings. Nothing that goes wrong for one
//! device stops the others; every problem ends up as an entry in that
//! device's [`DeviceReport`].
//!
//! [`Auditor::audit_devices`] runs many devices on a bounded worker pool
//! and returns their reports in input order.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::capture::{read_transcript, snapshot_from_transcripts};
use crate::diff::{config_sources, diff_config, CONFIG_COMMAND};
use crate::error::{Error, Result};
use crate::manifest::{CaptureSource, DeviceInput};
use crate::matcher::evaluate;
use crate::ping::check_pings;
use crate::platform::Platform;
use crate::rules::{DeviceRef, RuleEntry, RuleStore, TestSpec};
use crate::snapshot::Snapshot;
use crate::summary::{DeviceReport, SummaryAggregator};
use crate::transform::TransformRegistry;

/// Default number of devices audited at once
pub const DEFAULT_FORKS: usize = 5;

/// Settings for an audit run
#[derive(Debug, Clone)]
pub struct AuditConfig {
    /// Maximum number of devices audited in parallel
    pub forks: usize,
    /// Only diff configurations; skip rules and pings
    pub config_only: bool,
    /// Directory holding one rule directory per platform
    pub rules_path: PathBuf,
    /// Explicit rule files per platform; all files in the directory otherwise
    pub rule_files: HashMap<Platform, Vec<String>>,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            forks: DEFAULT_FORKS,
            config_only: false,
            rules_path: PathBuf::from("rules"),
            rule_files: HashMap::new(),
        }
    }
}

/// Runs audits with one set of rules and transformers
#[derive(Debug)]
pub struct Auditor {
    config: AuditConfig,
    rules: RuleStore,
    transforms: TransformRegistry,
}

impl Auditor {
    /// Create an auditor with the built-in transformers and no rules loaded
    pub fn new(config: AuditConfig) -> Self {
        Self {
            config,
            rules: RuleStore::new(),
            transforms: TransformRegistry::with_builtins(),
        }
    }

    /// Replace the transformer registry
    pub fn with_transforms(mut self, transforms: TransformRegistry) -> Self {
        self.transforms = transforms;
        self
    }

    /// Use rules that were loaded elsewhere
    pub fn with_rules(mut self, rules: RuleStore) -> Self {
        self.rules = rules;
        self
    }

    /// Settings of this auditor
    pub fn config(&self) -> &AuditConfig {
        &self.config
    }

    /// Loaded rules
    pub fn rules(&self) -> &RuleStore {
        &self.rules
    }

    /// Load the rules of every platform not loaded yet.
    ///
    /// Nokia devices are told apart only once their transcript is read, so
    /// both Nokia rule sets are loaded when either is requested.
    pub fn load_rules(&mut self, platforms: impl IntoIterator<Item = Platform>) -> Result<()> {
        let mut wanted = Vec::new();
        for platform in platforms {
            match platform {
                Platform::NokiaSros | Platform::NokiaMdcli => {
                    wanted.extend([Platform::NokiaSros, Platform::NokiaMdcli]);
                }
                other => wanted.push(other),
            }
        }

        for platform in wanted {
            if self.rules.get(platform).is_some() {
                continue;
            }
            let files = self.config.rule_files.get(&platform).map(Vec::as_slice);
            let set = self
                .rules
                .load_platform(&self.config.rules_path, platform, files)?;
            info!(
                platform = %platform,
                rules = set.specs().count(),
                failed = set.failed_count(),
                "loaded rules"
            );
        }
        Ok(())
    }

    /// Audit many devices on a pool of `forks` workers.
    ///
    /// Rules for every platform in `inputs` are loaded first. Reports come
    /// back in the order of `inputs`.
    pub fn audit_devices(&mut self, inputs: &[DeviceInput]) -> Result<Vec<DeviceReport>> {
        if !self.config.config_only {
            let platforms: Vec<Platform> = inputs
                .iter()
                .filter_map(|input| input.platform.parse().ok())
                .collect();
            self.load_rules(platforms)?;
        }

        let forks = self.config.forks.max(1);
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(forks)
            .thread_name(|i| format!("netbaseline-audit-{i}"))
            .build()
            .map_err(|e| Error::Config(format!("could not start worker pool: {e}")))?;

        debug!(devices = inputs.len(), forks, "starting audit");
        let auditor = &*self;
        Ok(pool.install(|| {
            inputs
                .par_iter()
                .map(|input| auditor.audit_device(input))
                .collect()
        }))
    }

    /// Run every check for one device
    pub fn audit_device(&self, input: &DeviceInput) -> DeviceReport {
        let hostname = input.hostname.as_str();
        let mut summary = SummaryAggregator::new(hostname);

        let platform = match input.platform.parse::<Platform>() {
            Ok(platform) => platform,
            Err(_) => {
                warn!(host = hostname, os = %input.platform, "unsupported platform");
                summary.device_error(&Error::unsupported_platform(hostname, &input.platform));
                return summary.finish();
            }
        };

        let (platform, mut snapshot) = match load_snapshot(input, platform) {
            Ok(loaded) => loaded,
            Err(e) => {
                warn!(host = hostname, error = %e, "no usable captures");
                summary.device_error(&e);
                return summary.finish();
            }
        };
        info!(host = hostname, platform = %platform, "auditing device");

        let rewritten = self.transforms.apply(platform, &mut snapshot);
        debug!(host = hostname, rewritten, "applied transformers");

        let device = DeviceRef {
            hostname,
            os_type: platform.as_str(),
        };

        if !self.config.config_only {
            self.run_rules(&mut summary, platform, &snapshot, &device);
        }

        let flat = read_flat_config(input);
        let flat_refs = flat
            .as_ref()
            .map(|(before, after)| (before.as_slice(), after.as_slice()));
        match config_sources(platform, hostname, &snapshot, flat_refs) {
            Ok((source, before, after)) => {
                let diff = diff_config(platform, before, after);
                debug!(host = hostname, stats = %diff.stats, "configuration diff");
                summary.config_diff(source, &diff);
            }
            Err(e) => summary.command_error(CONFIG_COMMAND, &e),
        }

        if !self.config.config_only {
            let pings = check_pings(platform, &snapshot);
            if !pings.outcomes.is_empty() {
                summary.pings(&pings);
            }
        }

        summary.finish()
    }

    fn run_rules(
        &self,
        summary: &mut SummaryAggregator,
        platform: Platform,
        snapshot: &Snapshot,
        device: &DeviceRef<'_>,
    ) {
        let Some(rules) = self.rules.get(platform) else {
            warn!(platform = %platform, "no rules loaded");
            return;
        };

        for entry in rules.entries() {
            match entry {
                RuleEntry::Spec { spec, .. } => run_rule(summary, spec, snapshot, device),
                RuleEntry::Skipped { file, reason } => {
                    debug!(file = %file, reason = %reason, "rule skipped");
                }
                RuleEntry::Failed { file, message } => summary.rule_error(file, message),
            }
        }
    }
}

fn run_rule(
    summary: &mut SummaryAggregator,
    spec: &TestSpec,
    snapshot: &Snapshot,
    device: &DeviceRef<'_>,
) {
    let (before, after) = match snapshot.command(&spec.command) {
        Ok(outputs) => outputs,
        Err(e) => {
            debug!(command = %spec.command, "command not captured");
            summary.command_error(&spec.command, &e);
            return;
        }
    };

    let evaluation = evaluate(spec, before, after);
    match evaluation.render(spec, device) {
        Ok(verdicts) => summary.command_verdicts(&spec.command, &verdicts, spec.ignore_null),
        Err(e) => summary.command_error(&spec.command, &e),
    }
}

fn load_snapshot(input: &DeviceInput, platform: Platform) -> Result<(Platform, Snapshot)> {
    let hostname = input.hostname.as_str();
    match &input.captures {
        CaptureSource::Snapshot(snapshot) => Ok((platform, snapshot.clone())),
        CaptureSource::SnapshotFile(path) => {
            let snapshot = Snapshot::from_json_file(path).map_err(|e| Error::MissingBaseline {
                host: hostname.to_string(),
                message: format!("{}: {}", path.display(), e),
            })?;
            Ok((platform, snapshot))
        }
        CaptureSource::Transcripts { before, after } => {
            split_transcripts(platform, hostname, before, after)
        }
        CaptureSource::TranscriptFiles { before, after } => {
            let before = read_transcript(hostname, before)?;
            let after = read_transcript(hostname, after)?;
            split_transcripts(platform, hostname, &before, &after)
        }
        CaptureSource::Missing(message) => Err(Error::MissingBaseline {
            host: hostname.to_string(),
            message: message.clone(),
        }),
    }
}

fn split_transcripts(
    platform: Platform,
    hostname: &str,
    before: &str,
    after: &str,
) -> Result<(Platform, Snapshot)> {
    let platform = platform.refine_nokia(hostname, before);
    let snapshot = snapshot_from_transcripts(platform, hostname, before, after)?;
    Ok((platform, snapshot))
}

/// Flat configuration files, when both can be read
fn read_flat_config(input: &DeviceInput) -> Option<(Vec<String>, Vec<String>)> {
    let (before, after) = input.flat_config.as_ref()?;
    let read = |path: &Path| match std::fs::read_to_string(path) {
        Ok(text) => Some(text.lines().map(str::to_string).collect::<Vec<_>>()),
        Err(e) => {
            warn!(
                host = %input.hostname,
                path = %path.display(),
                error = %e,
                "flat configuration unreadable, using the configuration command"
            );
            None
        }
    };
    Some((read(before)?, read(after)?))
}
