//! YAML rule definitions
//!
//! Shapes accepted from rule files, and their conversion into [`Rule`]. This
//! is the only place that knows YAML key names.

use serde::Deserialize;
use thiserror::Error;

use crate::config::{LinePattern, MatchKind};

use super::types::{Applicability, CheckSpec, OsType, Predicate, Rule, Severity};

/// A rule document: `stig`, `os_type` and a `rules` list
#[derive(Debug, Clone, Deserialize)]
pub struct RuleDocument {
    #[serde(default)]
    pub stig: Option<String>,
    #[serde(default)]
    pub os_type: Option<String>,
    pub rules: Vec<RuleDefinition>,
}

/// One rule entry
#[derive(Debug, Clone, Deserialize)]
pub struct RuleDefinition {
    #[serde(default, alias = "id")]
    pub vuln_id: Option<String>,
    #[serde(default)]
    pub severity: Option<String>,
    #[serde(default, alias = "description")]
    pub desc: Option<String>,
    #[serde(default)]
    pub os_type: Option<String>,
    #[serde(default)]
    pub part_of_stig: Vec<String>,
    pub check: CheckDefinition,
}

/// The `check` block of a rule
#[derive(Debug, Clone, Deserialize)]
pub struct CheckDefinition {
    pub text: String,
    #[serde(default)]
    pub text_cnt: Option<usize>,
    #[serde(default)]
    pub predicate: Option<PredicateKind>,
    #[serde(default, rename = "match")]
    pub match_kind: MatchKind,
    #[serde(default)]
    pub ignore_case: bool,
    #[serde(default)]
    pub parent: Option<ParentDefinition>,
    #[serde(default)]
    pub when: Option<WhenDefinition>,
    #[serde(default)]
    pub recurse: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PredicateKind {
    MustExist,
    MustNotExist,
}

/// `parent: false` (whole config) or `parent: '<regex>'`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ParentDefinition {
    Flag(bool),
    Pattern(String),
}

/// `when: true` or `when: '<regex>'`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum WhenDefinition {
    Flag(bool),
    Pattern(String),
}

/// Why a rule entry was rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleValidationError {
    #[error("missing required field 'vuln_id'")]
    MissingId,

    #[error("{0}")]
    OsType(String),

    #[error("{0}")]
    Severity(String),

    #[error("check.text must not be empty")]
    EmptyPattern,

    #[error("check.predicate and check.text_cnt are mutually exclusive")]
    ConflictingPredicate,

    #[error("check.parent: true names no parent; use a pattern, or false for the whole config")]
    ParentWithoutPattern,

    #[error("check.when pattern requires check.parent")]
    WhenWithoutParent,

    #[error("check.recurse requires check.parent")]
    RecurseWithoutParent,

    #[error("check.when: false would mark every parent not applicable")]
    WhenNeverApplies,

    #[error("check.when must not be an empty pattern")]
    EmptyWhen,
}

/// Values a rule inherits from its document
#[derive(Debug, Clone, Default)]
pub struct RuleDefaults {
    pub stig: Option<String>,
    pub os_type: Option<OsType>,
}

impl RuleDefinition {
    /// Validate and convert into a [`Rule`]
    ///
    /// `fallback_id` is used when the entry has no `vuln_id` (rule-per-file
    /// layouts name the rule after the file).
    pub fn into_rule(
        self,
        fallback_id: Option<&str>,
        defaults: &RuleDefaults,
    ) -> Result<Rule, RuleValidationError> {
        let id = self
            .vuln_id
            .filter(|id| !id.trim().is_empty())
            .or_else(|| fallback_id.map(str::to_string))
            .ok_or(RuleValidationError::MissingId)?;

        let os_type = match &self.os_type {
            Some(value) => value.parse::<OsType>().map_err(RuleValidationError::OsType)?,
            None => defaults.os_type.unwrap_or_default(),
        };

        let severity = match &self.severity {
            Some(value) => value.parse::<Severity>().map_err(RuleValidationError::Severity)?,
            None => Severity::default(),
        };

        let mut stigs = self.part_of_stig;
        if let Some(stig) = &defaults.stig {
            if !stigs.contains(stig) {
                stigs.push(stig.clone());
            }
        }

        Ok(Rule {
            id,
            os_type,
            severity,
            description: self.desc.unwrap_or_default(),
            stigs,
            check: self.check.into_spec()?,
        })
    }
}

impl CheckDefinition {
    fn into_spec(self) -> Result<CheckSpec, RuleValidationError> {
        if self.text.trim().is_empty() {
            return Err(RuleValidationError::EmptyPattern);
        }

        let predicate = match (self.predicate, self.text_cnt) {
            (Some(_), Some(_)) => return Err(RuleValidationError::ConflictingPredicate),
            (Some(PredicateKind::MustExist), None) | (None, None) => Predicate::MustExist,
            (Some(PredicateKind::MustNotExist), None) => Predicate::MustNotExist,
            (None, Some(n)) => Predicate::Count(n),
        };

        let pattern = LinePattern::new(self.text, self.match_kind).with_ignore_case(self.ignore_case);

        let parent = match self.parent {
            Some(ParentDefinition::Flag(true)) => {
                return Err(RuleValidationError::ParentWithoutPattern)
            }
            Some(ParentDefinition::Pattern(p)) if !p.trim().is_empty() => Some(p),
            _ => None,
        };

        // Whole-config checks never evaluate `when`; only a pattern is an error
        let Some(parent) = parent else {
            if matches!(self.when, Some(WhenDefinition::Pattern(_))) {
                return Err(RuleValidationError::WhenWithoutParent);
            }
            if self.recurse == Some(true) {
                return Err(RuleValidationError::RecurseWithoutParent);
            }
            return Ok(CheckSpec::Global { pattern, predicate });
        };

        let when = match self.when {
            None | Some(WhenDefinition::Flag(true)) => Applicability::Always,
            Some(WhenDefinition::Flag(false)) => return Err(RuleValidationError::WhenNeverApplies),
            Some(WhenDefinition::Pattern(p)) if p.trim().is_empty() => {
                return Err(RuleValidationError::EmptyWhen)
            }
            Some(WhenDefinition::Pattern(p)) => {
                Applicability::WhenChild(LinePattern::regex(p).with_ignore_case(self.ignore_case))
            }
        };

        Ok(CheckSpec::Hierarchical {
            parent: LinePattern::regex(parent).with_ignore_case(self.ignore_case),
            pattern,
            predicate,
            when,
            recurse: self.recurse.unwrap_or(false),
        })
    }
}
