//! # Audit Engine
//!
//! Runs a [`RuleSet`] against a [`ParsedConfig`]:
//! 1. Drop rules outside the OS type / STIG selection
//! 2. Dispatch each remaining rule to the executor for its check kind
//! 3. Collect one [`AuditResult`] per rule, in rule order
//!
//! Evaluation never fails as a whole. A rule that cannot be evaluated
//! becomes an [`Outcome::Error`](crate::results::Outcome::Error) result.

use crate::config::ParsedConfig;
use crate::executors::EvaluationError;
use crate::registry::{create_default_registry, ExecutorRegistry, RegistryError};
use crate::results::{AuditResult, AuditSummary};
use crate::rules::{OsType, Rule, RuleSet};

/// Which rules take part in a run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuditFilter {
    pub os_type: Option<OsType>,
    pub stigs: Vec<String>,
}

impl AuditFilter {
    /// Filter that keeps every rule
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_os_type(mut self, os_type: Option<OsType>) -> Self {
        self.os_type = os_type;
        self
    }

    pub fn with_stigs<I, S>(mut self, stigs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.stigs = stigs.into_iter().map(Into::into).collect();
        self
    }

    /// Whether `rule` is evaluated under this filter
    ///
    /// Rules without STIG tags are part of every STIG.
    pub fn includes(&self, rule: &Rule) -> bool {
        if let Some(target) = self.os_type {
            if !rule.os_type.applies_to(target) {
                return false;
            }
        }

        self.stigs.is_empty()
            || rule.stigs.is_empty()
            || rule.stigs.iter().any(|s| self.stigs.contains(s))
    }
}

pub struct AuditEngine {
    registry: ExecutorRegistry,
    filter: AuditFilter,
}

impl AuditEngine {
    pub fn new(registry: ExecutorRegistry, filter: AuditFilter) -> Self {
        Self { registry, filter }
    }

    /// Engine with every built-in executor registered
    pub fn with_default_registry(filter: AuditFilter) -> Result<Self, RegistryError> {
        Ok(Self::new(create_default_registry()?, filter))
    }

    pub fn filter(&self) -> &AuditFilter {
        &self.filter
    }

    /// Evaluate every selected rule against `config`
    pub fn evaluate(&self, rules: &RuleSet, config: &ParsedConfig) -> AuditSummary {
        let mut results = Vec::with_capacity(rules.len());
        let mut skipped = 0;

        for rule in rules {
            if !self.filter.includes(rule) {
                log::debug!("Skipping {} (os_type={}, stigs={:?})", rule.id, rule.os_type, rule.stigs);
                skipped += 1;
                continue;
            }
            results.push(self.evaluate_rule(rule, config));
        }

        log::debug!(
            "Evaluated {} rules, skipped {}",
            results.len(),
            skipped
        );
        AuditSummary::new(results, skipped)
    }

    /// Evaluate a single rule, ignoring the filter
    pub fn evaluate_rule(&self, rule: &Rule, config: &ParsedConfig) -> AuditResult {
        let kind = rule.check.kind();
        let outcome = self
            .registry
            .get(kind)
            .ok_or(EvaluationError::NoExecutor { kind })
            .and_then(|executor| executor.execute(rule, config));

        match outcome {
            Ok(check) => AuditResult::from_check(rule, check),
            Err(e) => {
                log::warn!("Rule {} could not be evaluated: {}", rule.id, e);
                AuditResult::errored(rule, &e)
            }
        }
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{parse, LinePattern};
    use crate::executors::GlobalCheckExecutor;
    use crate::results::Outcome;
    use crate::rules::Predicate;
    use std::collections::HashSet;

    const CONFIG: &str = "\
hostname R1
ntp authenticate
ip http server
interface GigabitEthernet0/1
 ip address 10.0.0.1 255.255.255.0
";

    fn engine(filter: AuditFilter) -> AuditEngine {
        AuditEngine::with_default_registry(filter).unwrap()
    }

    fn ntp_rule() -> Rule {
        Rule::global("V-215807", LinePattern::exact("ntp authenticate"), Predicate::MustExist)
            .with_description("The device must authenticate NTP sources")
    }

    fn sample_rules() -> RuleSet {
        RuleSet::new(
            None,
            vec![
                ntp_rule(),
                Rule::global("V-2", LinePattern::regex("^ip http server"), Predicate::MustNotExist)
                    .with_os_type(OsType::Ios),
                Rule::global("V-3", LinePattern::prefix("logging host"), Predicate::MustExist)
                    .with_os_type(OsType::Xr),
                Rule::hierarchical(
                    "V-4",
                    LinePattern::regex("^interface"),
                    LinePattern::exact("no ip proxy-arp"),
                    Predicate::MustExist,
                ),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_every_rule_reported_once() {
        let rules = sample_rules();
        let summary = engine(AuditFilter::new()).evaluate(&rules, &parse(CONFIG).unwrap());

        assert_eq!(summary.len(), rules.len());
        let ids: HashSet<&str> = summary.iter().map(|r| r.rule_id.as_str()).collect();
        assert_eq!(ids.len(), rules.len());
        assert!(summary.iter().all(|r| rules.get(&r.rule_id).is_some()));
        assert_eq!(summary.skipped(), 0);
    }

    #[test]
    fn test_os_type_filter() {
        let rules = sample_rules();
        let config = parse(CONFIG).unwrap();

        let xr = engine(AuditFilter::new().with_os_type(Some(OsType::Xr))).evaluate(&rules, &config);
        assert!(xr.iter().all(|r| r.rule_id != "V-2"));
        assert_eq!(xr.skipped(), 1);

        let ios = engine(AuditFilter::new().with_os_type(Some(OsType::Ios))).evaluate(&rules, &config);
        assert!(ios.iter().any(|r| r.rule_id == "V-2"));
        assert!(ios.iter().all(|r| r.rule_id != "V-3"));
    }

    #[test]
    fn test_stig_filter_keeps_untagged_rules() {
        let rules = RuleSet::new(
            None,
            vec![
                ntp_rule().with_stigs(["cisco_ios_ndm"]),
                Rule::global("V-2", LinePattern::exact("x"), Predicate::MustNotExist)
                    .with_stigs(["cisco_ios_rtr"]),
                Rule::global("V-3", LinePattern::exact("y"), Predicate::MustNotExist),
            ],
        )
        .unwrap();

        let summary = engine(AuditFilter::new().with_stigs(["cisco_ios_ndm"]))
            .evaluate(&rules, &parse(CONFIG).unwrap());
        let ids: Vec<&str> = summary.iter().map(|r| r.rule_id.as_str()).collect();
        assert_eq!(ids, vec!["V-215807", "V-3"]);
        assert_eq!(summary.skipped(), 1);
    }

    #[test]
    fn test_evaluation_is_repeatable() {
        let rules = sample_rules();
        let config = parse(CONFIG).unwrap();
        let engine = engine(AuditFilter::new());
        assert_eq!(engine.evaluate(&rules, &config), engine.evaluate(&rules, &config));
    }

    #[test]
    fn test_negative_rule() {
        let rules = RuleSet::new(
            None,
            vec![Rule::global("V-2", LinePattern::regex("^ip http server"), Predicate::MustNotExist)],
        )
        .unwrap();
        let engine = engine(AuditFilter::new());

        let clean = engine.evaluate(&rules, &parse("no ip http server\n").unwrap());
        assert_eq!(clean.results()[0].outcome, Outcome::Pass);

        let dirty = engine.evaluate(&rules, &parse(CONFIG).unwrap());
        let result = &dirty.results()[0];
        assert_eq!(result.outcome, Outcome::Fail);
        let lines: Vec<&str> = result.matched_lines().iter().map(|l| l.text.as_str()).collect();
        assert_eq!(lines, vec!["ip http server"]);
    }

    #[test]
    fn test_ntp_scenario() {
        let rules = RuleSet::new(None, vec![ntp_rule()]).unwrap();
        let engine = engine(AuditFilter::new());

        let present = engine.evaluate(&rules, &parse(CONFIG).unwrap());
        let result = &present.results()[0];
        assert!(result.passed());
        let lines: Vec<&str> = result.matched_lines().iter().map(|l| l.text.as_str()).collect();
        assert_eq!(lines, vec!["ntp authenticate"]);

        let absent = engine.evaluate(&rules, &parse("hostname R1\n").unwrap());
        let result = &absent.results()[0];
        assert_eq!(result.outcome, Outcome::Fail);
        assert!(result.matched_lines().is_empty());
        assert_eq!(absent.exit_code(), 1);
    }

    #[test]
    fn test_bad_rule_does_not_stop_the_run() {
        let rules = RuleSet::new(
            None,
            vec![
                Rule::global("V-1", LinePattern::regex("(unclosed"), Predicate::MustExist),
                ntp_rule(),
            ],
        )
        .unwrap();
        let summary = engine(AuditFilter::new()).evaluate(&rules, &parse(CONFIG).unwrap());

        assert_eq!(summary.results()[0].outcome, Outcome::Error);
        assert!(summary.results()[0].detail.contains("(unclosed"));
        assert_eq!(summary.results()[1].outcome, Outcome::Pass);
        assert_eq!(summary.failure_count(), 1);
    }

    #[test]
    fn test_missing_executor_is_an_error_result() {
        let mut registry = ExecutorRegistry::new();
        registry.register(Box::new(GlobalCheckExecutor::new())).unwrap();
        let engine = AuditEngine::new(registry, AuditFilter::new());

        let summary = engine.evaluate(&sample_rules(), &parse(CONFIG).unwrap());
        let hierarchical = summary.iter().find(|r| r.rule_id == "V-4").unwrap();
        assert_eq!(hierarchical.outcome, Outcome::Error);
        assert!(hierarchical.detail.contains("No executor"));
    }
}
