//! # Audit Results
//!
//! Per-rule outcomes and the run summary. A rule that could not be evaluated
//! is an [`Outcome::Error`] result, not an `Err`, so one broken rule never
//! stops the rest of the audit.

use serde::Serialize;

use crate::config::ConfigLine;
use crate::rules::{Rule, Severity};

/// Highest failure count reported through the exit code
pub const MAX_FAILURE_EXIT_CODE: usize = 250;

/// Result of evaluating one rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Outcome {
    #[serde(rename = "PASS")]
    Pass,
    #[serde(rename = "FAIL")]
    Fail,
    #[serde(rename = "N/A")]
    NotApplicable,
    #[serde(rename = "ERROR")]
    Error,
}

impl Outcome {
    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Pass => "PASS",
            Outcome::Fail => "FAIL",
            Outcome::NotApplicable => "N/A",
            Outcome::Error => "ERROR",
        }
    }

    /// Counts towards the failure total
    pub fn is_failure(&self) -> bool {
        matches!(self, Outcome::Fail | Outcome::Error)
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Owned copy of a configuration line
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchedLine {
    pub number: usize,
    pub text: String,
}

impl From<&ConfigLine> for MatchedLine {
    fn from(line: &ConfigLine) -> Self {
        Self {
            number: line.number(),
            text: line.raw().to_string(),
        }
    }
}

/// Lines behind an outcome, grouped by how they counted
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Evidence {
    pub pass: Vec<MatchedLine>,
    pub fail: Vec<MatchedLine>,
    pub not_applicable: Vec<MatchedLine>,
}

impl Evidence {
    pub fn passing(lines: Vec<MatchedLine>) -> Self {
        Self {
            pass: lines,
            ..Self::default()
        }
    }

    pub fn failing(lines: Vec<MatchedLine>) -> Self {
        Self {
            fail: lines,
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.pass.is_empty() && self.fail.is_empty() && self.not_applicable.is_empty()
    }

    /// Groups with their report labels: `pass`, `fail`, `na`
    pub fn groups(&self) -> [(&'static str, &[MatchedLine]); 3] {
        [
            ("pass", self.pass.as_slice()),
            ("fail", self.fail.as_slice()),
            ("na", self.not_applicable.as_slice()),
        ]
    }

    /// Every line, in source order
    pub fn lines(&self) -> Vec<&MatchedLine> {
        let mut lines: Vec<&MatchedLine> = self
            .pass
            .iter()
            .chain(&self.fail)
            .chain(&self.not_applicable)
            .collect();
        lines.sort_by_key(|l| l.number);
        lines
    }
}

/// What an executor reports back for one rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckOutcome {
    pub outcome: Outcome,
    pub evidence: Evidence,
    pub message: String,
}

impl CheckOutcome {
    pub fn new(outcome: Outcome, evidence: Evidence, message: impl Into<String>) -> Self {
        Self {
            outcome,
            evidence,
            message: message.into(),
        }
    }
}

/// Outcome of one rule in a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuditResult {
    pub rule_id: String,
    pub severity: Severity,
    pub description: String,
    pub outcome: Outcome,
    pub evidence: Evidence,
    pub detail: String,
}

impl AuditResult {
    pub fn from_check(rule: &Rule, check: CheckOutcome) -> Self {
        Self {
            rule_id: rule.id.clone(),
            severity: rule.severity,
            description: rule.description.clone(),
            outcome: check.outcome,
            evidence: check.evidence,
            detail: check.message,
        }
    }

    /// Result for a rule whose evaluation raised an error
    pub fn errored(rule: &Rule, error: &dyn std::error::Error) -> Self {
        Self {
            rule_id: rule.id.clone(),
            severity: rule.severity,
            description: rule.description.clone(),
            outcome: Outcome::Error,
            evidence: Evidence::default(),
            detail: error.to_string(),
        }
    }

    pub fn passed(&self) -> bool {
        self.outcome == Outcome::Pass
    }

    pub fn failed(&self) -> bool {
        self.outcome.is_failure()
    }

    pub fn matched_lines(&self) -> Vec<&MatchedLine> {
        self.evidence.lines()
    }
}

/// All results of a run, in rule order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AuditSummary {
    results: Vec<AuditResult>,
    skipped: usize,
    failures: usize,
}

impl AuditSummary {
    pub fn new(results: Vec<AuditResult>, skipped: usize) -> Self {
        let failures = results.iter().filter(|r| r.failed()).count();
        Self {
            results,
            skipped,
            failures,
        }
    }

    pub fn results(&self) -> &[AuditResult] {
        &self.results
    }

    pub fn iter(&self) -> std::slice::Iter<'_, AuditResult> {
        self.results.iter()
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Rules left out by the OS type or STIG filter
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Failed plus errored rules
    pub fn failure_count(&self) -> usize {
        self.failures
    }

    pub fn count(&self, outcome: Outcome) -> usize {
        self.results.iter().filter(|r| r.outcome == outcome).count()
    }

    /// Process exit code: the failure count, clamped to
    /// [`MAX_FAILURE_EXIT_CODE`]
    pub fn exit_code(&self) -> i32 {
        let clamped = self.failures.min(MAX_FAILURE_EXIT_CODE);
        i32::try_from(clamped).unwrap_or(i32::MAX)
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LinePattern;
    use crate::rules::Predicate;

    fn result(id: &str, outcome: Outcome) -> AuditResult {
        let rule = Rule::global(id, LinePattern::exact("x"), Predicate::MustExist);
        AuditResult::from_check(&rule, CheckOutcome::new(outcome, Evidence::default(), ""))
    }

    #[test]
    fn test_exit_code_counts_failures_and_errors() {
        let summary = AuditSummary::new(
            vec![
                result("V-1", Outcome::Pass),
                result("V-2", Outcome::Fail),
                result("V-3", Outcome::Pass),
                result("V-4", Outcome::Error),
                result("V-5", Outcome::NotApplicable),
            ],
            0,
        );
        assert_eq!(summary.failure_count(), 2);
        assert_eq!(summary.exit_code(), 2);
        assert_eq!(summary.count(Outcome::Pass), 2);
    }

    #[test]
    fn test_exit_code_clamped() {
        let results = (0..300)
            .map(|i| result(&format!("V-{i}"), Outcome::Fail))
            .collect();
        let summary = AuditSummary::new(results, 0);
        assert_eq!(summary.failure_count(), 300);
        assert_eq!(summary.exit_code(), 250);
    }

    #[test]
    fn test_empty_summary_is_compliant() {
        assert_eq!(AuditSummary::default().exit_code(), 0);
    }

    #[test]
    fn test_evidence_lines_in_source_order() {
        let evidence = Evidence {
            pass: vec![MatchedLine { number: 9, text: "b".into() }],
            fail: vec![MatchedLine { number: 2, text: "a".into() }],
            not_applicable: vec![],
        };
        let numbers: Vec<usize> = evidence.lines().iter().map(|l| l.number).collect();
        assert_eq!(numbers, vec![2, 9]);
    }
}
