use indexmap::IndexMap;

use crate::Outcome;

/// One recorded comparison.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Check {
    /// What was computed.
    pub observed: f64,
    /// What it should have been.
    pub expected: f64,
    /// Whether it was close enough.
    pub outcome: Outcome,
}

/// Every comparison made while verifying one or more solver runs,
/// in the order they were made, keyed by label.
///
/// A failing comparison never stops verification, so a report contains every discrepancy.
#[derive(Debug, Clone, Default)]
pub struct Report {
    checks: IndexMap<String, Check>,
}

impl Report {
    /// An empty report.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a comparison.
    ///
    /// If the label was already used, this check is stored under
    /// `"<label> #2"`, `"<label> #3"` and so on, so no result is lost.
    pub fn record(&mut self, label: impl Into<String>, check: Check) -> Outcome {
        let label = self.unique_label(label.into());
        match check.outcome {
            Outcome::Pass => tracing::debug!(%label, "PASS"),
            Outcome::Fail => tracing::warn!(
                %label,
                observed = check.observed,
                expected = check.expected,
                "FAIL"
            ),
            Outcome::SubnormalExpected => {
                tracing::warn!(%label, expected = check.expected, "FAIL: test uses subnormal value")
            }
        }
        self.checks.insert(label, check);
        check.outcome
    }

    fn unique_label(&self, label: String) -> String {
        if !self.checks.contains_key(&label) {
            return label;
        }
        let mut n = 2;
        loop {
            let candidate = format!("{label} #{n}");
            if !self.checks.contains_key(&candidate) {
                return candidate;
            }
            n += 1;
        }
    }

    /// Look up a check by label.
    pub fn get(&self, label: &str) -> Option<&Check> {
        self.checks.get(label)
    }

    /// All checks, in the order they were recorded.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Check)> {
        self.checks.iter().map(|(label, check)| (label.as_str(), check))
    }

    /// Only the checks which didn't pass.
    pub fn failures(&self) -> impl Iterator<Item = (&str, &Check)> {
        self.iter().filter(|(_, check)| !check.outcome.is_pass())
    }

    /// How many checks were recorded.
    pub fn len(&self) -> usize {
        self.checks.len()
    }

    /// Were no checks recorded at all?
    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }

    /// How many checks passed.
    pub fn passed(&self) -> usize {
        self.checks.values().filter(|c| c.outcome.is_pass()).count()
    }

    /// How many checks failed.
    pub fn failed(&self) -> usize {
        self.len() - self.passed()
    }

    /// True if every check passed. An empty report counts as passing.
    pub fn all_passed(&self) -> bool {
        self.failed() == 0
    }

    /// Append every check from `other`, e.g. when aggregating several problems or solvers.
    pub fn merge(&mut self, other: Report) {
        for (label, check) in other.checks {
            let label = self.unique_label(label);
            self.checks.insert(label, check);
        }
    }
}

impl Extend<(String, Check)> for Report {
    fn extend<T: IntoIterator<Item = (String, Check)>>(&mut self, iter: T) {
        for (label, check) in iter {
            self.record(label, check);
        }
    }
}

impl std::fmt::Display for Report {
    #[mutants::skip]
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (label, check) in self.iter() {
            match check.outcome {
                Outcome::Pass => writeln!(f, "PASS: {label}")?,
                Outcome::Fail => writeln!(
                    f,
                    "FAIL: {label} ({:.18e} observed vs {:.18e} expected)",
                    check.observed, check.expected
                )?,
                Outcome::SubnormalExpected => {
                    writeln!(f, "FAIL: {label} [test uses subnormal value]")?;
                }
            }
        }
        write!(f, "{} passed, {} failed", self.passed(), self.failed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(outcome: Outcome) -> Check {
        Check {
            observed: 1.5,
            expected: 1.0,
            outcome,
        }
    }

    #[test]
    fn counts() {
        let mut report = Report::new();
        assert!(report.is_empty());
        assert!(report.all_passed());
        report.record("a", check(Outcome::Pass));
        report.record("b", check(Outcome::Fail));
        report.record("c", check(Outcome::SubnormalExpected));
        assert_eq!(report.len(), 3);
        assert_eq!(report.passed(), 1);
        assert_eq!(report.failed(), 2);
        assert!(!report.all_passed());
        let failed: Vec<_> = report.failures().map(|(label, _)| label).collect();
        assert_eq!(failed, vec!["b", "c"]);
    }

    #[test]
    fn duplicate_labels_are_kept() {
        let mut report = Report::new();
        report.record("x", check(Outcome::Fail));
        report.record("x", check(Outcome::Pass));
        report.record("x", check(Outcome::Pass));
        let labels: Vec<_> = report.iter().map(|(label, _)| label).collect();
        assert_eq!(labels, vec!["x", "x #2", "x #3"]);
        assert_eq!(report.get("x").unwrap().outcome, Outcome::Fail);
    }

    #[test]
    fn merge_keeps_order() {
        let mut first = Report::new();
        first.record("lm/p sumsq", check(Outcome::Pass));
        let mut second = Report::new();
        second.record("dogleg/p sumsq", check(Outcome::Fail));
        second.record("lm/p sumsq", check(Outcome::Pass));
        first.merge(second);
        let labels: Vec<_> = first.iter().map(|(label, _)| label).collect();
        assert_eq!(labels, vec!["lm/p sumsq", "dogleg/p sumsq", "lm/p sumsq #2"]);
        assert_eq!(first.failed(), 1);
    }

    #[test]
    fn extend_records_each_check() {
        let mut report = Report::new();
        report.extend([
            ("a".to_owned(), check(Outcome::Pass)),
            ("a".to_owned(), check(Outcome::Fail)),
        ]);
        assert_eq!(report.len(), 2);
        assert_eq!(report.get("a #2").unwrap().outcome, Outcome::Fail);
    }

    #[test]
    fn display() {
        let mut report = Report::new();
        report.record("s/p sumsq", check(Outcome::Pass));
        report.record("s/p i=0", check(Outcome::Fail));
        report.record("s/p i=1", check(Outcome::SubnormalExpected));
        let text = report.to_string();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines[0], "PASS: s/p sumsq");
        assert!(lines[1].starts_with("FAIL: s/p i=0 ("));
        assert!(lines[1].ends_with("expected)"));
        assert_eq!(lines[2], "FAIL: s/p i=1 [test uses subnormal value]");
        assert_eq!(lines[3], "1 passed, 2 failed");
    }
}
