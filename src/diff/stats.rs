//! Diff statistics module.
//!
//! Counts what a configuration diff contained, before and after noise
//! suppression.

use std::fmt;

/// Statistics about a configuration diff
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiffStats {
    /// Number of added lines that were kept
    pub insertions: usize,
    /// Number of removed lines that were kept
    pub deletions: usize,
    /// Number of changed lines dropped as noise
    pub suppressed: usize,
    /// Number of hunks with at least one kept change
    pub hunks: usize,
}

impl DiffStats {
    /// Create a new empty stats instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if there are any changes
    pub fn has_changes(&self) -> bool {
        self.insertions > 0 || self.deletions > 0
    }

    /// Get total number of changed lines
    pub fn total_changes(&self) -> usize {
        self.insertions + self.deletions
    }
}

impl fmt::Display for DiffStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} insertion(s)(+), {} deletion(s)(-) in {} hunk(s)",
            self.insertions, self.deletions, self.hunks
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_default() {
        let stats = DiffStats::default();
        assert_eq!(stats.insertions, 0);
        assert_eq!(stats.deletions, 0);
        assert!(!stats.has_changes());
    }

    #[test]
    fn test_suppressed_is_not_a_change() {
        let stats = DiffStats {
            suppressed: 4,
            ..Default::default()
        };
        assert!(!stats.has_changes());
        assert_eq!(stats.total_changes(), 0);
    }

    #[test]
    fn test_stats_display() {
        let stats = DiffStats {
            insertions: 10,
            deletions: 5,
            suppressed: 2,
            hunks: 1,
        };
        assert_eq!(
            stats.to_string(),
            "10 insertion(s)(+), 5 deletion(s)(-) in 1 hunk(s)"
        );
        assert_eq!(stats.total_changes(), 15);
    }
}
