//! Typed rule model
//!
//! Everything here is produced by the loader's validation pass; nothing in
//! the engine sees raw YAML.

use std::collections::HashSet;
use std::str::FromStr;

use serde::Serialize;

use crate::config::LinePattern;

use super::RuleLoadError;

/// Device operating system a rule applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OsType {
    Ios,
    Xr,
    Nxos,
    Asa,
    #[default]
    Any,
}

impl OsType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OsType::Ios => "ios",
            OsType::Xr => "xr",
            OsType::Nxos => "nxos",
            OsType::Asa => "asa",
            OsType::Any => "any",
        }
    }

    /// Whether a rule tagged `self` applies to a device of type `target`
    pub fn applies_to(&self, target: OsType) -> bool {
        *self == OsType::Any || target == OsType::Any || *self == target
    }
}

impl std::fmt::Display for OsType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OsType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ios" | "ios-xe" | "iosxe" => Ok(OsType::Ios),
            "xr" | "ios-xr" | "iosxr" => Ok(OsType::Xr),
            "nxos" | "nx-os" => Ok(OsType::Nxos),
            "asa" => Ok(OsType::Asa),
            "any" => Ok(OsType::Any),
            other => Err(format!(
                "unknown OS type '{}'. Use: ios, xr, nxos, asa, any",
                other
            )),
        }
    }
}

/// Rule severity (DISA CAT I/II/III)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    High,
    #[default]
    Medium,
    Low,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::High => write!(f, "high"),
            Severity::Medium => write!(f, "medium"),
            Severity::Low => write!(f, "low"),
        }
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace([' ', '-'], "_");
        match normalized.as_str() {
            "high" | "cat_i" | "cat1" => Ok(Severity::High),
            "medium" | "cat_ii" | "cat2" => Ok(Severity::Medium),
            "low" | "cat_iii" | "cat3" => Ok(Severity::Low),
            _ => Err(format!("unknown severity '{}'. Use: high, medium, low", s)),
        }
    }
}

/// Pass/fail policy applied to the number of matches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Predicate {
    /// At least one match
    MustExist,
    /// No matches
    MustNotExist,
    /// Exactly this many matches
    Count(usize),
}

impl Predicate {
    pub fn is_satisfied(&self, matches: usize) -> bool {
        match self {
            Predicate::MustExist => matches > 0,
            Predicate::MustNotExist => matches == 0,
            Predicate::Count(n) => matches == *n,
        }
    }
}

impl std::fmt::Display for Predicate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Predicate::MustExist => write!(f, "must exist"),
            Predicate::MustNotExist => write!(f, "must not exist"),
            Predicate::Count(n) => write!(f, "exactly {} match(es)", n),
        }
    }
}

/// When a parent section is tested by a hierarchical check
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Applicability {
    Always,
    /// Only parents with a child matching this pattern; others are N/A
    WhenChild(LinePattern),
}

/// Check kinds, one executor each
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckKind {
    Global,
    Hierarchical,
}

impl std::fmt::Display for CheckKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CheckKind::Global => write!(f, "global"),
            CheckKind::Hierarchical => write!(f, "hierarchical"),
        }
    }
}

/// What a rule looks for
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum CheckSpec {
    /// Count matching lines anywhere in the config
    Global {
        pattern: LinePattern,
        predicate: Predicate,
    },
    /// Count matching children under each matching parent
    Hierarchical {
        parent: LinePattern,
        pattern: LinePattern,
        predicate: Predicate,
        when: Applicability,
        recurse: bool,
    },
}

impl CheckSpec {
    pub fn kind(&self) -> CheckKind {
        match self {
            CheckSpec::Global { .. } => CheckKind::Global,
            CheckSpec::Hierarchical { .. } => CheckKind::Hierarchical,
        }
    }

    pub fn predicate(&self) -> Predicate {
        match self {
            CheckSpec::Global { predicate, .. } | CheckSpec::Hierarchical { predicate, .. } => {
                *predicate
            }
        }
    }
}

/// A single STIG rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rule {
    pub id: String,
    pub os_type: OsType,
    pub severity: Severity,
    pub description: String,
    /// STIGs this rule is part of
    pub stigs: Vec<String>,
    pub check: CheckSpec,
}

impl Rule {
    pub fn new(id: impl Into<String>, check: CheckSpec) -> Self {
        Self {
            id: id.into(),
            os_type: OsType::Any,
            severity: Severity::default(),
            description: String::new(),
            stigs: Vec::new(),
            check,
        }
    }

    /// Rule counting lines anywhere in the config
    pub fn global(id: impl Into<String>, pattern: LinePattern, predicate: Predicate) -> Self {
        Self::new(id, CheckSpec::Global { pattern, predicate })
    }

    /// Rule counting children under each `parent`, every parent tested
    pub fn hierarchical(
        id: impl Into<String>,
        parent: LinePattern,
        pattern: LinePattern,
        predicate: Predicate,
    ) -> Self {
        Self::new(
            id,
            CheckSpec::Hierarchical {
                parent,
                pattern,
                predicate,
                when: Applicability::Always,
                recurse: false,
            },
        )
    }

    pub fn with_os_type(mut self, os_type: OsType) -> Self {
        self.os_type = os_type;
        self
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
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

    /// Restrict a hierarchical check to parents with a matching child
    pub fn with_when(mut self, pattern: LinePattern) -> Self {
        if let CheckSpec::Hierarchical { when, .. } = &mut self.check {
            *when = Applicability::WhenChild(pattern);
        }
        self
    }
}

/// Ordered rules with unique ids
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RuleSet {
    stig: Option<String>,
    os_type: Option<OsType>,
    rules: Vec<Rule>,
}

impl RuleSet {
    /// Build a rule set, rejecting duplicate ids
    pub fn new(stig: Option<String>, rules: Vec<Rule>) -> Result<Self, RuleLoadError> {
        let mut seen = HashSet::new();
        for rule in &rules {
            if !seen.insert(rule.id.as_str()) {
                return Err(RuleLoadError::DuplicateRule {
                    rule: rule.id.clone(),
                });
            }
        }
        Ok(Self {
            stig,
            os_type: None,
            rules,
        })
    }

    pub fn with_os_type(mut self, os_type: Option<OsType>) -> Self {
        self.os_type = os_type;
        self
    }

    /// STIG named by the rule document, if any
    pub fn stig(&self) -> Option<&str> {
        self.stig.as_deref()
    }

    /// OS type named by the rule document, if any
    pub fn os_type(&self) -> Option<OsType> {
        self.os_type
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Rule> {
        self.rules.iter()
    }

    pub fn get(&self, id: &str) -> Option<&Rule> {
        self.rules.iter().find(|r| r.id == id)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl<'a> IntoIterator for &'a RuleSet {
    type Item = &'a Rule;
    type IntoIter = std::slice::Iter<'a, Rule>;

    fn into_iter(self) -> Self::IntoIter {
        self.rules.iter()
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_os_type_parsing() {
        assert_eq!("IOS".parse::<OsType>().unwrap(), OsType::Ios);
        assert_eq!("ios-xr".parse::<OsType>().unwrap(), OsType::Xr);
        assert_eq!("nx-os".parse::<OsType>().unwrap(), OsType::Nxos);
        assert!("junos".parse::<OsType>().is_err());
    }

    #[test]
    fn test_os_applicability() {
        assert!(OsType::Ios.applies_to(OsType::Ios));
        assert!(!OsType::Ios.applies_to(OsType::Xr));
        assert!(OsType::Any.applies_to(OsType::Xr));
    }

    #[test]
    fn test_severity_aliases() {
        assert_eq!("CAT I".parse::<Severity>().unwrap(), Severity::High);
        assert_eq!("cat-ii".parse::<Severity>().unwrap(), Severity::Medium);
        assert_eq!("low".parse::<Severity>().unwrap(), Severity::Low);
        assert!("severe".parse::<Severity>().is_err());
    }

    #[test]
    fn test_predicates() {
        assert!(Predicate::MustExist.is_satisfied(2));
        assert!(!Predicate::MustExist.is_satisfied(0));
        assert!(Predicate::MustNotExist.is_satisfied(0));
        assert!(!Predicate::MustNotExist.is_satisfied(1));
        assert!(Predicate::Count(1).is_satisfied(1));
        assert!(!Predicate::Count(1).is_satisfied(2));
    }

    #[test]
    fn test_rule_set_rejects_duplicates() {
        let rules = vec![
            Rule::global("V-1", LinePattern::exact("a"), Predicate::MustExist),
            Rule::global("V-1", LinePattern::exact("b"), Predicate::MustExist),
        ];
        let err = RuleSet::new(None, rules).unwrap_err();
        assert!(matches!(err, RuleLoadError::DuplicateRule { rule } if rule == "V-1"));
    }

    #[test]
    fn test_with_when_only_touches_hierarchical() {
        let rule = Rule::global("V-1", LinePattern::exact("a"), Predicate::MustExist)
            .with_when(LinePattern::regex("x"));
        assert!(matches!(rule.check, CheckSpec::Global { .. }));

        let rule = Rule::hierarchical(
            "V-2",
            LinePattern::regex("^interface"),
            LinePattern::regex("no ip proxy-arp"),
            Predicate::MustExist,
        )
        .with_when(LinePattern::regex(r"ip\s+address"));
        assert!(matches!(
            rule.check,
            CheckSpec::Hierarchical {
                when: Applicability::WhenChild(_),
                ..
            }
        ));
    }
}
