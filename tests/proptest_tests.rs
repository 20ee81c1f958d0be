//! Property-based tests for the matcher using proptest.
//!
//! Random before/after outputs are run through every test mode to check the
//! accounting that reports rely on.

use netbaseline::matcher::{evaluate, Origin, Status};
use netbaseline::rules::{ParsedRule, TestSpec};
use proptest::collection::vec;
use proptest::prelude::*;

// ============================================================================
// Strategies for generating test data
// ============================================================================

/// A line of one to four short tokens drawn from a small alphabet, so that
/// before and after lines collide often
fn output_line(tokens: std::ops::RangeInclusive<usize>) -> impl Strategy<Value = String> {
    vec(prop::sample::select(vec!["a", "b", "c", "10", "20", "1.5", "up", "down"]), tokens)
        .prop_map(|tokens| tokens.join(" "))
}

fn output() -> impl Strategy<Value = Vec<String>> {
    vec(output_line(1..=4), 0..12)
}

fn any_rule() -> impl Strategy<Value = TestSpec> {
    prop_oneof![
        Just("no-diff: [0, 1]"),
        Just("no-diff: [0]"),
        Just("delta: [0, 1, 0.1]"),
        Just("exists: {}"),
        Just("not-exists: {}"),
    ]
    .prop_map(|test| rule(&format!("- command: show x\n  tests:\n    - {test}\n")))
}

fn rule(yaml: &str) -> TestSpec {
    match TestSpec::parse(yaml, "proptest") {
        Ok(ParsedRule::Spec(spec)) => spec,
        other => panic!("bad rule {yaml}: {other:?}"),
    }
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    /// Every after line is either paired with a before line or reported on its own
    #[test]
    fn prop_after_lines_accounted_for(spec in any_rule(), before in output(), after in output()) {
        let eval = evaluate(&spec, &before, &after);
        prop_assert_eq!(eval.consumed + eval.after_only(), eval.after_total);
        prop_assert_eq!(eval.after_total, after.len());
    }

    /// Every before line yields exactly one outcome
    #[test]
    fn prop_one_outcome_per_before_line(spec in any_rule(), before in output(), after in output()) {
        let eval = evaluate(&spec, &before, &after);
        let from_before = eval
            .outcomes
            .iter()
            .filter(|o| o.origin == Origin::Before)
            .count();
        prop_assert_eq!(from_before, before.len());
    }

    /// Exists and not-exists give opposite verdicts line for line
    #[test]
    fn prop_presence_duality(before in output(), after in output()) {
        prop_assume!(!before.is_empty() || !after.is_empty());
        let exists = rule("- command: show x\n  tests:\n    - exists: {}\n");
        let not_exists = rule("- command: show x\n  tests:\n    - not-exists: {}\n");

        let a = evaluate(&exists, &before, &after);
        let b = evaluate(&not_exists, &before, &after);
        prop_assert_eq!(a.outcomes.len(), b.outcomes.len());
        for (x, y) in a.outcomes.iter().zip(&b.outcomes) {
            prop_assert_eq!(x.status.flipped(), y.status);
        }
    }

    /// Identical output never fails a comparison rule
    #[test]
    fn prop_identical_output_passes(lines in vec(output_line(4..=4), 0..12)) {
        let spec = rule("- command: show x\n  tests:\n    - no-diff: [0, 1, 2, 3]\n");
        let eval = evaluate(&spec, &lines, &lines);
        prop_assert!(eval.outcomes.iter().all(|o| o.status == Status::Pass));
    }
}
