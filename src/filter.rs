//! Line filtering ahead of matching.
//!
//! Raw output lines go through the rule's denylist and include filter, and
//! soft-wrapped lines are glued back together. Junos in particular wraps a
//! long first column onto a line of its own:
//!
//! ```text
//! inet.0
//!                        12         10          0          0          0          0
//! ```
//!
//! which is repaired to `inet.0 12 10 0 0 0 0` before matching. Kept lines
//! retain their text so section markers can still be found by prefix.

use crate::rules::TestSpec;

/// Indentation marking a continuation line
const CONTINUATION_INDENT: &str = "    ";

/// Filter settings taken from a rule
#[derive(Debug, Clone, Copy)]
pub struct LineFilter<'a> {
    spec: &'a TestSpec,
}

impl<'a> LineFilter<'a> {
    /// Filter for the given rule
    pub fn new(spec: &'a TestSpec) -> Self {
        Self { spec }
    }

    fn keeps(&self, line: &str) -> bool {
        !self.spec.denylist.iter().any(|deny| line.contains(deny.as_str()))
            && self.spec.include.admits(line)
    }

    /// Filter raw lines, returning the survivors in order.
    pub fn apply<S: AsRef<str>>(&self, raw: &[S]) -> Vec<String> {
        let mut kept = Vec::new();
        let mut carry: Option<String> = None;

        for (i, line) in raw.iter().enumerate() {
            let line = line.as_ref();
            let joined;
            let line = match carry.take() {
                Some(head) => {
                    joined = format!("{} {}", head, line.trim_start());
                    joined.as_str()
                }
                None => line,
            };

            if !self.keeps(line) {
                continue;
            }

            let mut tokens = line.split_whitespace();
            match (tokens.next(), tokens.next()) {
                (None, _) => {}
                (Some(head), None)
                    if raw
                        .get(i + 1)
                        .is_some_and(|next| is_continuation(next.as_ref())) =>
                {
                    carry = Some(head.to_string());
                }
                _ => kept.push(line.to_string()),
            }
        }

        // A held token with nothing left to attach to stays on its own
        if let Some(head) = carry {
            kept.push(head);
        }
        kept
    }
}

fn is_continuation(line: &str) -> bool {
    line.starts_with(CONTINUATION_INDENT)
}

/// Convenience wrapper for one-off filtering
pub fn filter_lines<S: AsRef<str>>(spec: &TestSpec, raw: &[S]) -> Vec<String> {
    LineFilter::new(spec).apply(raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::ParsedRule;

    fn spec(extra: &str) -> TestSpec {
        let yaml = format!("- command: show x\n{extra}  tests:\n    - no-diff: [0]\n");
        match TestSpec::parse(&yaml, "inline").unwrap() {
            ParsedRule::Spec(spec) => spec,
            ParsedRule::CaptureOnly(_) => unreachable!(),
        }
    }

    #[test]
    fn test_wrap_repair() {
        let out = filter_lines(&spec(""), &["neighbor", "    10.0.0.1 up"]);
        assert_eq!(out, vec!["neighbor 10.0.0.1 up"]);
    }

    #[test]
    fn test_single_token_without_continuation_is_kept() {
        let out = filter_lines(&spec(""), &["neighbor", "10.0.0.1 up"]);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0], "neighbor");
    }

    #[test]
    fn test_denylist_and_include() {
        let s = spec("  blacklist: [Peer]\n  iterate: [Establ, Active]\n");
        let out = filter_lines(
            &s,
            &[
                "Peer AS State",
                "10.0.0.1 65001 Establ",
                "10.0.0.2 65002 Idle",
                "10.0.0.3 65003 Active",
            ],
        );
        assert_eq!(out, vec!["10.0.0.1 65001 Establ", "10.0.0.3 65003 Active"]);
    }

    #[test]
    fn test_blank_lines_dropped() {
        assert!(filter_lines(&spec(""), &["", "   ", "\t"]).is_empty());
        assert!(filter_lines::<&str>(&spec(""), &[]).is_empty());
    }

    #[test]
    fn test_denied_continuation_drops_joined_line() {
        let s = spec("  blacklist: [down]\n");
        let out = filter_lines(&s, &["ge-0/0/0", "     down down", "ge-0/0/1 up up"]);
        assert_eq!(out, vec!["ge-0/0/1 up up"]);
    }
}
