//! The test engine: pairs before lines with after lines and judges them.
//!
//! Every filtered before line yields exactly one outcome. After lines that
//! are paired are consumed; whatever is left over on the after side is
//! judged on its own, so no after line ever disappears from the result:
//!
//! ```text
//! after_total == consumed + after_only
//! ```

use serde::Serialize;

use crate::error::Result;
use crate::filter::LineFilter;
use crate::rules::{DeviceRef, MessageFields, TestMode, TestSpec};

/// Width of the placeholder token list used for a missing side
pub const NULL_WIDTH: usize = 12;

const NULL_TOKEN: &str = "null";
const FULL_DELTA: &str = "100%";

/// Verdict of a single test
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Status {
    /// The line behaved as expected
    Pass,
    /// The line changed or went missing
    Fail,
}

impl Status {
    fn from_bool(pass: bool) -> Self {
        if pass {
            Status::Pass
        } else {
            Status::Fail
        }
    }

    /// The opposite verdict
    pub fn flipped(self) -> Self {
        match self {
            Status::Pass => Status::Fail,
            Status::Fail => Status::Pass,
        }
    }
}

/// Where an outcome came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// A before line, paired or not
    Before,
    /// An after line nothing was paired with
    AfterOnly,
    /// Neither side had any data
    Empty,
}

/// Result of testing one line
#[derive(Debug, Clone, PartialEq)]
pub struct MatchOutcome {
    /// Pass or fail
    pub status: Status,
    /// Tokens of the before line, null padded when absent
    pub pre: Vec<String>,
    /// Tokens of the after line, null padded when absent
    pub post: Vec<String>,
    /// Difference between the compared values
    pub delta: String,
    /// Section the line belongs to
    pub section_id: String,
    /// What produced the outcome
    pub origin: Origin,
}

/// A rendered outcome
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    /// Pass or fail
    pub status: Status,
    /// Message rendered from the rule's template
    pub message: String,
    /// Whether the line only exists after the change
    pub after_only: bool,
}

/// Every outcome for one command
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    /// Command that was tested
    pub command: String,
    /// Outcomes in evaluation order: before lines first, then after-only lines
    pub outcomes: Vec<MatchOutcome>,
    /// After data lines seen
    pub after_total: usize,
    /// After data lines paired with a before line
    pub consumed: usize,
}

impl Evaluation {
    /// Outcomes produced by unpaired after lines
    pub fn after_only(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.origin == Origin::AfterOnly)
            .count()
    }

    /// Number of passing outcomes
    pub fn passed(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.status == Status::Pass)
            .count()
    }

    /// Number of failing outcomes
    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.passed()
    }

    /// Render every outcome through the rule's pass/fail templates
    pub fn render(&self, spec: &TestSpec, device: &DeviceRef<'_>) -> Result<Vec<Verdict>> {
        self.outcomes
            .iter()
            .map(|outcome| {
                let template = match outcome.status {
                    Status::Pass => &spec.pass_template,
                    Status::Fail => &spec.fail_template,
                };
                let message = template.render(&MessageFields {
                    device: device.clone(),
                    pre: &outcome.pre,
                    post: &outcome.post,
                    delta: outcome.delta.clone(),
                    section_id: &outcome.section_id,
                })?;
                Ok(Verdict {
                    status: outcome.status,
                    message,
                    after_only: outcome.origin == Origin::AfterOnly,
                })
            })
            .collect()
    }
}

#[derive(Debug)]
struct DataLine {
    tokens: Vec<String>,
    section: String,
}

impl DataLine {
    fn token(&self, index: usize) -> Option<&str> {
        self.tokens.get(index).map(String::as_str)
    }
}

/// Drop section marker lines, tagging the rest with their section
fn data_lines(spec: &TestSpec, lines: Vec<String>) -> Vec<DataLine> {
    let mut section = String::new();
    let mut data = Vec::with_capacity(lines.len());
    for line in lines {
        if let Some(id) = spec.section_start(&line) {
            section = id.to_string();
            continue;
        }
        data.push(DataLine {
            tokens: line.split_whitespace().map(str::to_string).collect(),
            section: section.clone(),
        });
    }
    data
}

fn nulls() -> Vec<String> {
    vec![NULL_TOKEN.to_string(); NULL_WIDTH]
}

/// Digits with at most one decimal point
fn parse_number(value: &str) -> Option<f64> {
    let mut dots = 0;
    let mut digits = 0;
    for c in value.chars() {
        match c {
            '0'..='9' => digits += 1,
            '.' => dots += 1,
            _ => return None,
        }
    }
    if digits == 0 || dots > 1 {
        return None;
    }
    value.parse().ok()
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        value.to_string()
    }
}

/// Compare two values under a delta rule, returning status and delta text
fn compare_delta(before: &str, after: &str, max_percent: f64) -> (Status, String) {
    let before = before.replace('%', "");
    let after = after.replace('%', "");
    match (parse_number(&before), parse_number(&after)) {
        (Some(b), Some(a)) => {
            let delta = (b - a).abs();
            let threshold = (b * max_percent).ceil();
            (Status::from_bool(delta <= threshold), format_number(delta))
        }
        _ if before == after => (Status::Pass, "0".into()),
        _ => (Status::Fail, FULL_DELTA.into()),
    }
}

/// Pairing state for one command
struct Matcher<'a> {
    spec: &'a TestSpec,
    after: Vec<DataLine>,
    consumed: Vec<bool>,
}

impl<'a> Matcher<'a> {
    /// First unconsumed after line keyed like `line`, in the same section
    fn candidate(&self, line: &DataLine, key: usize) -> Option<usize> {
        let want = line.token(key)?;
        let sectioned = self.spec.is_sectioned();
        self.after.iter().enumerate().position(|(i, after)| {
            !self.consumed[i]
                && after.token(key) == Some(want)
                && (!sectioned || after.section == line.section)
        })
    }

    fn consume(&mut self, index: usize) -> Vec<String> {
        self.consumed[index] = true;
        self.after[index].tokens.clone()
    }

    fn no_diff(&mut self, line: &DataLine, indices: &[usize]) -> MatchOutcome {
        let candidate = indices
            .first()
            .and_then(|&key| self.candidate(line, key));
        let (status, post) = match candidate {
            Some(i) => {
                let after = &self.after[i];
                let same = indices
                    .iter()
                    .all(|&idx| matches!((line.token(idx), after.token(idx)), (Some(b), Some(a)) if b == a));
                (Status::from_bool(same), self.consume(i))
            }
            None => (Status::Fail, nulls()),
        };
        MatchOutcome {
            status,
            pre: line.tokens.clone(),
            post,
            delta: "0".into(),
            section_id: line.section.clone(),
            origin: Origin::Before,
        }
    }

    fn delta(
        &mut self,
        line: &DataLine,
        key: usize,
        value: usize,
        max_percent: f64,
    ) -> MatchOutcome {
        let (status, post, delta) = match self.candidate(line, key) {
            Some(i) => {
                let (status, delta) = match (line.token(value), self.after[i].token(value)) {
                    (Some(b), Some(a)) => compare_delta(b, a, max_percent),
                    _ => (Status::Fail, FULL_DELTA.into()),
                };
                (status, self.consume(i), delta)
            }
            None => {
                let delta = match line.token(value) {
                    Some(raw) if parse_number(raw).is_some() => raw.to_string(),
                    _ => FULL_DELTA.to_string(),
                };
                (Status::Fail, nulls(), delta)
            }
        };
        MatchOutcome {
            status,
            pre: line.tokens.clone(),
            post,
            delta,
            section_id: line.section.clone(),
            origin: Origin::Before,
        }
    }

    /// Presence of a before line; the identical after line is consumed
    fn presence(&mut self, line: &DataLine, expect_present: bool) -> MatchOutcome {
        if let Some(i) = self
            .after
            .iter()
            .enumerate()
            .position(|(i, after)| !self.consumed[i] && after.tokens == line.tokens)
        {
            self.consumed[i] = true;
        }
        MatchOutcome {
            status: Status::from_bool(expect_present),
            pre: line.tokens.clone(),
            post: line.tokens.clone(),
            delta: "0".into(),
            section_id: line.section.clone(),
            origin: Origin::Before,
        }
    }

    /// Judge an after line nothing was paired with
    fn after_only(&self, line: &DataLine) -> MatchOutcome {
        let (status, pre, delta) = match &self.spec.mode {
            TestMode::Exists => (Status::Pass, line.tokens.clone(), "0".to_string()),
            TestMode::NotExists => (Status::Fail, line.tokens.clone(), "0".to_string()),
            mode => {
                let mut pre = nulls();
                if let Some((key, token)) = mode
                    .key_index()
                    .and_then(|key| line.token(key).map(|t| (key, t)))
                {
                    if key < pre.len() {
                        pre[key] = token.to_string();
                    }
                }
                let delta = if matches!(mode, TestMode::Delta { .. }) {
                    FULL_DELTA
                } else {
                    "0"
                };
                (Status::Fail, pre, delta.to_string())
            }
        };
        let post = if self.spec.mode.is_presence() {
            nulls()
        } else {
            line.tokens.clone()
        };
        MatchOutcome {
            status,
            pre,
            post,
            delta,
            section_id: line.section.clone(),
            origin: Origin::AfterOnly,
        }
    }
}

/// Run a rule against one command's before and after output.
pub fn evaluate<S: AsRef<str>>(spec: &TestSpec, before: &[S], after: &[S]) -> Evaluation {
    let filter = LineFilter::new(spec);
    let before = data_lines(spec, filter.apply(before));
    let after = data_lines(spec, filter.apply(after));
    let after_total = after.len();

    let mut matcher = Matcher {
        spec,
        consumed: vec![false; after.len()],
        after,
    };

    let mut outcomes: Vec<MatchOutcome> = before
        .iter()
        .map(|line| match &spec.mode {
            TestMode::NoDiff { indices } => matcher.no_diff(line, indices),
            TestMode::Delta {
                key,
                value,
                max_percent,
            } => matcher.delta(line, *key, *value, *max_percent),
            TestMode::Exists => matcher.presence(line, true),
            TestMode::NotExists => matcher.presence(line, false),
        })
        .collect();

    let consumed = matcher.consumed.iter().filter(|c| **c).count();
    outcomes.extend(
        matcher
            .after
            .iter()
            .zip(&matcher.consumed)
            .filter(|(_, consumed)| !**consumed)
            .map(|(line, _)| matcher.after_only(line)),
    );

    if outcomes.is_empty() && spec.mode.is_presence() {
        let status = match spec.mode {
            TestMode::Exists => Status::from_bool(spec.ignore_null),
            _ => Status::Pass,
        };
        outcomes.push(MatchOutcome {
            status,
            pre: nulls(),
            post: nulls(),
            delta: "0".into(),
            section_id: String::new(),
            origin: Origin::Empty,
        });
    }

    Evaluation {
        command: spec.command.clone(),
        outcomes,
        after_total,
        consumed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::ParsedRule;

    fn spec(test: &str) -> TestSpec {
        let yaml = format!("- command: show x\n  tests:\n    - {test}\n");
        match TestSpec::parse(&yaml, "inline").unwrap() {
            ParsedRule::Spec(spec) => spec,
            ParsedRule::CaptureOnly(_) => unreachable!(),
        }
    }

    #[test]
    fn test_no_diff_indices() {
        let eval = evaluate(&spec("no-diff: [0, 1, 2]"), &["r1 10 20"], &["r1 10 21"]);
        assert_eq!(eval.outcomes[0].status, Status::Fail);
        let eval = evaluate(&spec("no-diff: [0, 1]"), &["r1 10 20"], &["r1 10 21"]);
        assert_eq!(eval.outcomes.len(), 1);
        assert_eq!(eval.outcomes[0].status, Status::Pass);
    }

    #[test]
    fn test_no_diff_missing_after_line() {
        let eval = evaluate(&spec("no-diff: [0]"), &["r1 up", "r2 up"], &["r2 up"]);
        assert_eq!(eval.outcomes[0].status, Status::Fail);
        assert_eq!(eval.outcomes[0].post, nulls());
        assert_eq!(eval.outcomes[1].status, Status::Pass);
    }

    #[test]
    fn test_no_diff_out_of_range_index_fails_and_consumes() {
        let eval = evaluate(&spec("no-diff: [0, 5]"), &["r1 up"], &["r1 up"]);
        assert_eq!(eval.outcomes.len(), 1);
        assert_eq!(eval.outcomes[0].status, Status::Fail);
        assert_eq!(eval.consumed, 1);
    }

    #[test]
    fn test_delta_threshold() {
        let s = spec("delta: [0, 1, 0.05]");
        let eval = evaluate(&s, &["inet.0 1000"], &["inet.0 1050"]);
        assert_eq!(eval.outcomes[0].status, Status::Pass);
        assert_eq!(eval.outcomes[0].delta, "50");
        let eval = evaluate(&s, &["inet.0 1000"], &["inet.0 1051"]);
        assert_eq!(eval.outcomes[0].status, Status::Fail);
        assert_eq!(eval.outcomes[0].delta, "51");
    }

    #[test]
    fn test_delta_strips_percent_and_compares_text() {
        let s = spec("delta: [0, 1, 0.1]");
        let eval = evaluate(&s, &["cpu 50%"], &["cpu 54%"]);
        assert_eq!(eval.outcomes[0].status, Status::Pass);
        let eval = evaluate(&s, &["fan ok"], &["fan ok"]);
        assert_eq!(eval.outcomes[0].delta, "0");
        let eval = evaluate(&s, &["fan ok"], &["fan failed"]);
        assert_eq!(eval.outcomes[0].status, Status::Fail);
        assert_eq!(eval.outcomes[0].delta, "100%");
    }

    #[test]
    fn test_delta_without_candidate() {
        let s = spec("delta: [0, 1, 0.1]");
        let eval = evaluate(&s, &["inet.0 1000", "fan ok"], &[]);
        assert_eq!(eval.outcomes[0].delta, "1000");
        assert_eq!(eval.outcomes[1].delta, "100%");
        assert!(eval.outcomes.iter().all(|o| o.status == Status::Fail));
    }

    #[test]
    fn test_after_only_lines_fail() {
        let eval = evaluate(&spec("delta: [0, 1, 0.1]"), &["a 1"], &["a 1", "b 2"]);
        assert_eq!(eval.outcomes.len(), 2);
        let extra = &eval.outcomes[1];
        assert_eq!(extra.origin, Origin::AfterOnly);
        assert_eq!(extra.status, Status::Fail);
        assert_eq!(extra.pre[0], "b");
        assert_eq!(extra.pre[1], "null");
        assert_eq!(extra.delta, "100%");
        assert_eq!(eval.consumed + eval.after_only(), eval.after_total);
    }

    #[test]
    fn test_sections_scope_pairing() {
        let yaml = "- command: show route summary\n  section: [\"Table \"]\n  tests:\n    - no-diff: [0, 1]\n";
        let s = match TestSpec::parse(yaml, "inline").unwrap() {
            ParsedRule::Spec(spec) => spec,
            ParsedRule::CaptureOnly(_) => unreachable!(),
        };
        let before = ["Table A", "direct 5", "Table B", "direct 7"];
        let after = ["Table B", "direct 7", "Table A", "direct 5"];
        let eval = evaluate(&s, &before, &after);
        assert_eq!(eval.outcomes.len(), 2);
        assert!(eval.outcomes.iter().all(|o| o.status == Status::Pass));
        assert_eq!(eval.outcomes[1].section_id, "B");
    }

    #[test]
    fn test_exists_and_not_exists() {
        let eval = evaluate(&spec("exists: {}"), &["alarm 1"], &["alarm 1"]);
        assert_eq!(eval.outcomes.len(), 1);
        assert_eq!(eval.outcomes[0].status, Status::Pass);

        let eval = evaluate(&spec("not-exists: {}"), &[], &["alarm 2"]);
        assert_eq!(eval.outcomes.len(), 1);
        assert_eq!(eval.outcomes[0].status, Status::Fail);
        assert_eq!(eval.outcomes[0].origin, Origin::AfterOnly);
    }

    #[test]
    fn test_presence_with_no_data() {
        let none: Vec<String> = Vec::new();
        let eval = evaluate(&spec("exists: {}"), &none, &none);
        assert_eq!(eval.outcomes[0].status, Status::Fail);
        let eval = evaluate(&spec("not-exists: {}"), &none, &none);
        assert_eq!(eval.outcomes[0].status, Status::Pass);
        assert_eq!(eval.outcomes[0].origin, Origin::Empty);
    }

    #[test]
    fn test_pairing_modes_with_no_data_yield_nothing() {
        let none: Vec<String> = Vec::new();
        let eval = evaluate(&spec("no-diff: [0]"), &none, &none);
        assert!(eval.outcomes.is_empty());
    }

    #[test]
    fn test_render_uses_templates() {
        let yaml = "- command: show x\n  tests:\n    - no-diff: [0, 1]\n      err: \"FAILED! {{ pre[0] }} {{ pre[1] }} -> {{ post[1] }}\"\n      info: \"PASSED! {{ pre[0] }}\"\n";
        let s = match TestSpec::parse(yaml, "inline").unwrap() {
            ParsedRule::Spec(spec) => spec,
            ParsedRule::CaptureOnly(_) => unreachable!(),
        };
        let eval = evaluate(&s, &["p1 up", "p2 up"], &["p1 up", "p2 down"]);
        let device = DeviceRef {
            hostname: "r1",
            os_type: "cisco_ios",
        };
        let verdicts = eval.render(&s, &device).unwrap();
        assert_eq!(verdicts[0].message, "PASSED! p1");
        assert_eq!(verdicts[1].message, "FAILED! p2 up -> down");
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number("12"), Some(12.0));
        assert_eq!(parse_number("1.5"), Some(1.5));
        assert_eq!(parse_number("1.2.3"), None);
        assert_eq!(parse_number("-1"), None);
        assert_eq!(parse_number(""), None);
        assert_eq!(parse_number("."), None);
    }
}
