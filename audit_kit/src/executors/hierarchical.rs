//! # Hierarchical Check Executor
//!
//! Evaluates a check per parent section. For every line matching the parent
//! pattern:
//! - if the `when` pattern is set and no child matches it, the parent is not
//!   applicable
//! - otherwise children matching the rule pattern are counted and the
//!   predicate decides whether the parent passes or fails
//!
//! Evidence is the parent lines. The rule fails if any parent fails, is N/A
//! if no parent was tested, and passes otherwise (no parents at all is a
//! pass).

use crate::config::{CompiledPattern, ConfigLine, ParsedConfig};
use crate::results::{CheckOutcome, Evidence, MatchedLine, Outcome};
use crate::rules::{Applicability, CheckKind, CheckSpec, Predicate, Rule};

use super::{CheckExecutor, EvaluationError};

/// Executor for checks scoped to parent sections
#[derive(Debug, Default, Clone, Copy)]
pub struct HierarchicalCheckExecutor;

impl HierarchicalCheckExecutor {
    pub fn new() -> Self {
        Self
    }
}

/// How one parent section counted
enum SectionVerdict {
    Pass,
    Fail,
    NotApplicable,
}

fn judge_section(
    config: &ParsedConfig,
    parent: &ConfigLine,
    pattern: &CompiledPattern,
    when: Option<&CompiledPattern>,
    predicate: Predicate,
    recurse: bool,
) -> SectionVerdict {
    if let Some(when) = when {
        if config.children(parent, when, recurse).is_empty() {
            return SectionVerdict::NotApplicable;
        }
    }

    let count = config.children(parent, pattern, recurse).len();
    if predicate.is_satisfied(count) {
        SectionVerdict::Pass
    } else {
        SectionVerdict::Fail
    }
}

impl CheckExecutor for HierarchicalCheckExecutor {
    fn check_kind(&self) -> CheckKind {
        CheckKind::Hierarchical
    }

    fn execute(&self, rule: &Rule, config: &ParsedConfig) -> Result<CheckOutcome, EvaluationError> {
        let CheckSpec::Hierarchical {
            parent,
            pattern,
            predicate,
            when,
            recurse,
        } = &rule.check
        else {
            return Err(EvaluationError::UnsupportedCheck {
                executor: "hierarchical",
                kind: rule.check.kind(),
            });
        };

        let parent_pattern = parent.compile()?;
        let child_pattern = pattern.compile()?;
        let when_pattern = match when {
            Applicability::Always => None,
            Applicability::WhenChild(p) => Some(p.compile()?),
        };

        let mut evidence = Evidence::default();
        for section in config.find(&parent_pattern) {
            let verdict = judge_section(
                config,
                section,
                &child_pattern,
                when_pattern.as_ref(),
                *predicate,
                *recurse,
            );
            let bucket = match verdict {
                SectionVerdict::Pass => &mut evidence.pass,
                SectionVerdict::Fail => &mut evidence.fail,
                SectionVerdict::NotApplicable => &mut evidence.not_applicable,
            };
            bucket.push(MatchedLine::from(section));
        }

        let (pass, fail, na) = (
            evidence.pass.len(),
            evidence.fail.len(),
            evidence.not_applicable.len(),
        );
        let outcome = if fail > 0 {
            Outcome::Fail
        } else if na > 0 && pass == 0 {
            Outcome::NotApplicable
        } else {
            Outcome::Pass
        };

        let message = format!(
            "{} section(s) matching {}: {} pass, {} fail, {} n/a ({} {})",
            pass + fail + na,
            parent,
            pass,
            fail,
            na,
            pattern,
            predicate
        );

        Ok(CheckOutcome::new(outcome, evidence, message))
    }
}
