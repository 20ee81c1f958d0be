//! # netbaseline - Before/After Audit of Network Device State
//!
//! netbaseline compares two captures of a device's command output, one taken
//! before a change and one after, and reports what changed unexpectedly.
//! Declarative YAML rules say how each command is tested; the configuration
//! and ping results are checked without rules.
//!
//! ## Core Concepts
//!
//! - **Snapshots**: the per-command output of a device, before and after
//! - **Rules**: one YAML file per command, naming the filter, the test mode
//!   and the pass/fail message templates
//! - **Verdicts**: a pass or fail per line of output
//! - **Transformers**: rewrite awkward multi-line output into one line per
//!   entity before rules run
//! - **Reports**: a line-oriented human log or one JSON document per run
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                           CLI Interface                          │
//! │               (manifest, config, verbosity, forks)               │
//! └──────────────────────────────────────────────────────────────────┘
//!                                  │
//!                                  ▼
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                           Audit Driver                           │
//! │                (one worker per device, rayon pool)               │
//! └──────────────────────────────────────────────────────────────────┘
//!                                  │
//!     ┌───────────────┬────────────┼──────────────┬───────────────┐
//!     ▼               ▼            ▼              ▼               ▼
//! ┌─────────┐   ┌───────────┐ ┌─────────┐   ┌──────────┐   ┌──────────┐
//! │ Capture │ → │ Transform │ │  Rules  │ → │  Filter  │ → │ Matcher  │
//! └─────────┘   └───────────┘ └─────────┘   └──────────┘   └──────────┘
//!                                                               │
//!              ┌──────────────┐   ┌──────────────┐              │
//!              │ Config Diff  │   │     Ping     │              │
//!              └──────────────┘   └──────────────┘              │
//!                      │                  │                     │
//!                      └──────────────────┼─────────────────────┘
//!                                         ▼
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                  Summary Aggregator → Report Sink                │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Example
//!
//! ```rust,no_run
//! use netbaseline::prelude::*;
//!
//! fn main() -> Result<()> {
//!     let devices = Manifest::load("devices.yml")?;
//!     let mut auditor = Auditor::new(AuditConfig::default());
//!     let reports = auditor.audit_devices(&devices)?;
//!
//!     let mut ctx = ReportContext::stdout(Verbosity::Normal, OutputMode::Human, true);
//!     for report in &reports {
//!         ctx.publish(&report.log)?;
//!     }
//!     Ok(())
//! }
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Re-export commonly used items in prelude
pub mod prelude {
    //! Convenient re-exports of commonly used types.
    //!
    //! ```rust,no_run
    //! use netbaseline::prelude::*;
    //!
    //! # fn main() -> Result<()> {
    //! let snapshot = Snapshot::from_json_file("r1.json")?;
    //! let device = DeviceInput::from_snapshot("r1", "juniper_junos", snapshot);
    //! let report = Auditor::new(AuditConfig::default()).audit_device(&device);
    //! println!("{}", report.to_json());
    //! # Ok(())
    //! # }
    //! ```

    // Error handling
    pub use crate::error::{Error, ErrorContext, Result};

    // Audit driver
    pub use crate::audit::{AuditConfig, Auditor};
    pub use crate::manifest::{CaptureSource, DeviceInput, Manifest};

    // Inputs
    pub use crate::platform::Platform;
    pub use crate::snapshot::{Phase, Snapshot};

    // Rules and matching
    pub use crate::matcher::{evaluate, Evaluation, Status, Verdict};
    pub use crate::rules::{ParsedRule, RuleSet, RuleStore, TestMode, TestSpec};

    // Transformers
    pub use crate::transform::{OutputTransformer, TransformRegistry};

    // Reporting
    pub use crate::report::{OutputMode, ReportContext, ReportSink, Verbosity};
    pub use crate::summary::{reports_to_json, DeviceReport};
}

// ============================================================================
// Core Modules
// ============================================================================

/// Error types and result aliases for netbaseline operations.
///
/// The [`Error`](error::Error) enum separates problems local to one rule,
/// command or device from fatal setup errors.
pub mod error;

/// Supported device platforms and their per-platform constants.
pub mod platform;

/// Per-command output captured before and after a change.
pub mod snapshot;

/// Splitting raw session transcripts into per-command output.
pub mod capture;

// ============================================================================
// Testing Components
// ============================================================================

/// Declarative test rules and their message templates.
pub mod rules;

/// Line filtering ahead of matching.
pub mod filter;

/// Pairing before and after lines and deciding verdicts.
pub mod matcher;

/// Output transformers applied before any rule runs.
pub mod transform;

/// Configuration diff with platform noise suppression.
pub mod diff;

/// Ping success comparison.
pub mod ping;

// ============================================================================
// Execution
// ============================================================================

/// Device manifest loading.
pub mod manifest;

/// The audit driver: all checks for one device, and a worker pool for many.
pub mod audit;

// ============================================================================
// Configuration
// ============================================================================

/// Configuration management for netbaseline behavior.
///
/// Handles loading and merging configuration from multiple sources:
/// environment variables, config files, and command-line arguments.
pub mod config;

// ============================================================================
// Reporting and Output
// ============================================================================

/// Report lines, verbosity, colouring and output sinks.
pub mod report;

/// Per-device tallies, totals and structured results.
pub mod summary;

// ============================================================================
// Version Information
// ============================================================================

/// Returns the current version of netbaseline.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
