//! # Global Check Executor
//!
//! Counts lines matching the rule pattern anywhere in the configuration and
//! applies the rule predicate to the count. Matches become pass evidence when
//! the predicate holds and fail evidence otherwise.

use crate::config::ParsedConfig;
use crate::results::{CheckOutcome, Evidence, MatchedLine, Outcome};
use crate::rules::{CheckKind, CheckSpec, Rule};

use super::{CheckExecutor, EvaluationError};

/// Executor for global (section-independent) checks
#[derive(Debug, Default, Clone, Copy)]
pub struct GlobalCheckExecutor;

impl GlobalCheckExecutor {
    pub fn new() -> Self {
        Self
    }
}

impl CheckExecutor for GlobalCheckExecutor {
    fn check_kind(&self) -> CheckKind {
        CheckKind::Global
    }

    fn execute(&self, rule: &Rule, config: &ParsedConfig) -> Result<CheckOutcome, EvaluationError> {
        let CheckSpec::Global { pattern, predicate } = &rule.check else {
            return Err(EvaluationError::UnsupportedCheck {
                executor: "global",
                kind: rule.check.kind(),
            });
        };

        let compiled = pattern.compile()?;
        let matches: Vec<MatchedLine> = config
            .find(&compiled)
            .into_iter()
            .map(MatchedLine::from)
            .collect();
        let count = matches.len();

        if predicate.is_satisfied(count) {
            Ok(CheckOutcome::new(
                Outcome::Pass,
                Evidence::passing(matches),
                format!("{} matching line(s) for {}, {}", count, pattern, predicate),
            ))
        } else {
            Ok(CheckOutcome::new(
                Outcome::Fail,
                Evidence::failing(matches),
                format!(
                    "{} matching line(s) for {}, expected {}",
                    count, pattern, predicate
                ),
            ))
        }
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{parse, LinePattern};
    use crate::rules::Predicate;

    fn run(rule: &Rule, text: &str) -> Result<CheckOutcome, EvaluationError> {
        GlobalCheckExecutor::new().execute(rule, &parse(text).unwrap())
    }

    #[test]
    fn test_required_line_present() {
        let rule = Rule::global("V-1", LinePattern::exact("ntp authenticate"), Predicate::MustExist);
        let outcome = run(&rule, "hostname R1\nntp authenticate\n").unwrap();

        assert_eq!(outcome.outcome, Outcome::Pass);
        assert_eq!(outcome.evidence.pass.len(), 1);
        assert_eq!(outcome.evidence.pass[0].text, "ntp authenticate");
        assert_eq!(outcome.evidence.pass[0].number, 2);
    }

    #[test]
    fn test_required_line_missing() {
        let rule = Rule::global("V-1", LinePattern::exact("ntp authenticate"), Predicate::MustExist);
        let outcome = run(&rule, "hostname R1\n").unwrap();

        assert_eq!(outcome.outcome, Outcome::Fail);
        assert!(outcome.evidence.is_empty());
    }

    #[test]
    fn test_forbidden_line() {
        let rule = Rule::global("V-2", LinePattern::regex("^ip http server"), Predicate::MustNotExist);

        let clean = run(&rule, "no ip http server\n").unwrap();
        assert_eq!(clean.outcome, Outcome::Pass);
        assert!(clean.evidence.is_empty());

        let dirty = run(&rule, "ip http server\nip http secure-server\n").unwrap();
        assert_eq!(dirty.outcome, Outcome::Fail);
        let lines: Vec<&str> = dirty.evidence.fail.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(lines, vec!["ip http server", "ip http secure-server"]);
    }

    #[test]
    fn test_exact_count() {
        let rule = Rule::global("V-3", LinePattern::prefix("logging host"), Predicate::Count(1));
        assert_eq!(run(&rule, "logging host 10.0.0.1\n").unwrap().outcome, Outcome::Pass);
        assert_eq!(
            run(&rule, "logging host 10.0.0.1\nlogging host 10.0.0.2\n").unwrap().outcome,
            Outcome::Fail
        );
    }

    #[test]
    fn test_bad_pattern_is_an_error() {
        let rule = Rule::global("V-4", LinePattern::regex("(unclosed"), Predicate::MustExist);
        assert!(matches!(run(&rule, "hostname R1\n"), Err(EvaluationError::Query(_))));
    }

    #[test]
    fn test_rejects_hierarchical_rule() {
        let rule = Rule::hierarchical(
            "V-5",
            LinePattern::regex("^line"),
            LinePattern::regex("exec-timeout"),
            Predicate::MustExist,
        );
        assert!(matches!(
            run(&rule, "line vty 0 4\n"),
            Err(EvaluationError::UnsupportedCheck { .. })
        ));
    }
}
