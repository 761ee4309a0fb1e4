//! Line patterns
//!
//! A [`LinePattern`] is what a rule asks for; a [`CompiledPattern`] is the
//! same thing turned into a `regex::Regex`. Every kind compiles to a regex
//! so matching has a single code path.
//!
//! `regex` patterns see the raw line, leading indentation included, which
//! lets a rule anchor on `^ ip address`. The literal kinds (`exact`,
//! `prefix`, `substring`) see the line with indentation stripped.

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::ConfigLine;

/// How a pattern's text is interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    /// Regular expression searched anywhere in the raw line
    #[default]
    Regex,
    /// Whole line equals the text
    Exact,
    /// Line starts with the text
    Prefix,
    /// Line contains the text
    Substring,
}

impl std::fmt::Display for MatchKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchKind::Regex => write!(f, "regex"),
            MatchKind::Exact => write!(f, "exact"),
            MatchKind::Prefix => write!(f, "prefix"),
            MatchKind::Substring => write!(f, "substring"),
        }
    }
}

/// Uncompiled line pattern as written in a rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinePattern {
    pub text: String,
    pub kind: MatchKind,
    pub ignore_case: bool,
}

impl LinePattern {
    pub fn new(text: impl Into<String>, kind: MatchKind) -> Self {
        Self {
            text: text.into(),
            kind,
            ignore_case: false,
        }
    }

    pub fn regex(text: impl Into<String>) -> Self {
        Self::new(text, MatchKind::Regex)
    }

    pub fn exact(text: impl Into<String>) -> Self {
        Self::new(text, MatchKind::Exact)
    }

    pub fn prefix(text: impl Into<String>) -> Self {
        Self::new(text, MatchKind::Prefix)
    }

    pub fn substring(text: impl Into<String>) -> Self {
        Self::new(text, MatchKind::Substring)
    }

    pub fn with_ignore_case(mut self, ignore_case: bool) -> Self {
        self.ignore_case = ignore_case;
        self
    }

    /// Compile into a matcher
    ///
    /// # Errors
    ///
    /// `QueryError::InvalidPattern` when a `regex` pattern does not compile.
    pub fn compile(&self) -> Result<CompiledPattern, QueryError> {
        let source = match self.kind {
            MatchKind::Regex => self.text.clone(),
            MatchKind::Exact => format!("^{}$", regex::escape(self.text.trim())),
            MatchKind::Prefix => format!("^{}", regex::escape(self.text.trim())),
            MatchKind::Substring => regex::escape(&self.text),
        };

        let regex = RegexBuilder::new(&source)
            .case_insensitive(self.ignore_case)
            .build()
            .map_err(|e| QueryError::InvalidPattern {
                pattern: self.text.clone(),
                reason: e.to_string(),
            })?;

        Ok(CompiledPattern {
            regex,
            kind: self.kind,
        })
    }
}

impl std::fmt::Display for LinePattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} '{}'", self.kind, self.text)?;
        if self.ignore_case {
            write!(f, " (ignore case)")?;
        }
        Ok(())
    }
}

/// A pattern ready to test lines
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    regex: Regex,
    kind: MatchKind,
}

impl CompiledPattern {
    pub fn is_match(&self, line: &ConfigLine) -> bool {
        match self.kind {
            MatchKind::Regex => self.regex.is_match(line.raw()),
            _ => self.regex.is_match(line.text()),
        }
    }

    pub fn kind(&self) -> MatchKind {
        self.kind
    }
}

/// Errors raised while querying a parsed configuration
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("Invalid pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse;

    fn first_child_line() -> ConfigLine {
        let config = parse("interface Gi0/1\n ip address 10.0.0.1 255.255.255.0\n").unwrap();
        config.lines()[1].clone()
    }

    #[test]
    fn test_regex_sees_indentation() {
        let line = first_child_line();
        assert!(LinePattern::regex(r"^ ip\s+address").compile().unwrap().is_match(&line));
        assert!(!LinePattern::regex(r"^ip address").compile().unwrap().is_match(&line));
    }

    #[test]
    fn test_literal_kinds_ignore_indentation() {
        let line = first_child_line();
        assert!(LinePattern::prefix("ip address").compile().unwrap().is_match(&line));
        assert!(LinePattern::substring("10.0.0.1").compile().unwrap().is_match(&line));
        assert!(LinePattern::exact(" ip address 10.0.0.1 255.255.255.0")
            .compile()
            .unwrap()
            .is_match(&line));
        assert!(!LinePattern::exact("ip address").compile().unwrap().is_match(&line));
    }

    #[test]
    fn test_literal_text_is_not_a_regex() {
        let config = parse("snmp-server community a.b RO\n").unwrap();
        let line = &config.lines()[0];
        assert!(LinePattern::substring("a.b").compile().unwrap().is_match(line));
        assert!(!LinePattern::substring("a*b").compile().unwrap().is_match(line));
    }

    #[test]
    fn test_case_sensitivity() {
        let config = parse("NTP authenticate\n").unwrap();
        let line = &config.lines()[0];
        assert!(!LinePattern::exact("ntp authenticate").compile().unwrap().is_match(line));
        assert!(LinePattern::exact("ntp authenticate")
            .with_ignore_case(true)
            .compile()
            .unwrap()
            .is_match(line));
    }

    #[test]
    fn test_invalid_regex() {
        let err = LinePattern::regex("ip (address").compile().unwrap_err();
        let QueryError::InvalidPattern { pattern, .. } = err;
        assert_eq!(pattern, "ip (address");
    }
}
