//! Output transformers.
//!
//! Some commands print output that cannot be tested line by line, such as
//! records spread over several lines. A transformer rewrites such output
//! into one line per entity before any rule runs. It either replaces the
//! command's output or adds a synthetic command next to it, on both the
//! before and the after side.
//!
//! Transformers are registered explicitly in a [`TransformRegistry`].

mod nokia;

pub use nokia::{SrosBgpSummary, SrosMultiChassisSync};

use std::sync::Arc;

use tracing::debug;

use crate::platform::Platform;
use crate::snapshot::{Phase, Snapshot};

/// Rewrites the output of one command on one platform
pub trait OutputTransformer: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Platform the transformer applies to
    fn platform(&self) -> Platform;

    /// Command whose output is read
    fn source_command(&self) -> &'static str;

    /// Command the result is stored under; the source itself by default
    fn target_command(&self) -> &'static str {
        self.source_command()
    }

    /// Rewrite the output. An empty result leaves the snapshot untouched.
    fn transform(&self, lines: &[String]) -> Vec<String>;
}

/// Ordered set of transformers
#[derive(Clone, Default)]
pub struct TransformRegistry {
    transforms: Vec<Arc<dyn OutputTransformer>>,
}

impl std::fmt::Debug for TransformRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.transforms.iter().map(|t| t.name()))
            .finish()
    }
}

impl TransformRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with all built-in transformers
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(SrosBgpSummary));
        registry.register(Arc::new(SrosMultiChassisSync));
        registry
    }

    /// Register a transformer; transformers run in registration order
    pub fn register(&mut self, transform: Arc<dyn OutputTransformer>) {
        self.transforms.push(transform);
    }

    /// Transformers for one platform
    pub fn for_platform(&self, platform: Platform) -> impl Iterator<Item = &Arc<dyn OutputTransformer>> {
        self.transforms
            .iter()
            .filter(move |t| t.platform() == platform)
    }

    /// Number of registered transformers
    pub fn len(&self) -> usize {
        self.transforms.len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }

    /// Apply every matching transformer to both sides of a snapshot.
    ///
    /// Returns how many outputs were rewritten.
    pub fn apply(&self, platform: Platform, snapshot: &mut Snapshot) -> usize {
        let mut rewritten = 0;
        for transform in self.for_platform(platform) {
            for phase in Phase::BOTH {
                let side = snapshot.side_mut(phase);
                let Some(lines) = side.get(transform.source_command()) else {
                    continue;
                };
                let output = transform.transform(lines);
                if output.is_empty() {
                    continue;
                }
                debug!(
                    transform = transform.name(),
                    phase = ?phase,
                    lines = output.len(),
                    "rewrote command output"
                );
                side.insert(transform.target_command().to_string(), output);
                rewritten += 1;
            }
        }
        rewritten
    }
}
