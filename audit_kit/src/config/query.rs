//! Tree queries
//!
//! All lookups return lines in source order and never allocate new lines.

use std::collections::BTreeSet;

use super::{CompiledPattern, ConfigLine, LinePattern, ParsedConfig, QueryError};

/// Prefix of directive comments such as `!@#stig:cisco_ios_ndm`
pub const DIRECTIVE_PREFIX: &str = "!@#";

/// A line query, optionally scoped to the children of matching parents
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigQuery {
    pub pattern: LinePattern,
    pub parent: Option<LinePattern>,
    /// Search all descendants of a parent instead of direct children only
    pub recurse: bool,
}

impl ConfigQuery {
    pub fn new(pattern: LinePattern) -> Self {
        Self {
            pattern,
            parent: None,
            recurse: false,
        }
    }

    pub fn with_parent(mut self, parent: LinePattern) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn with_recurse(mut self, recurse: bool) -> Self {
        self.recurse = recurse;
        self
    }
}

impl ParsedConfig {
    /// Lines at any depth matching `pattern`
    pub fn find(&self, pattern: &CompiledPattern) -> Vec<&ConfigLine> {
        self.lines.iter().filter(|l| pattern.is_match(l)).collect()
    }

    /// Children of `line` matching `pattern`; all descendants when `recurse`
    pub fn children<'a>(
        &'a self,
        line: &'a ConfigLine,
        pattern: &CompiledPattern,
        recurse: bool,
    ) -> Vec<&'a ConfigLine> {
        if recurse {
            self.descendants_of(line)
                .into_iter()
                .filter(|l| pattern.is_match(l))
                .collect()
        } else {
            self.children_of(line).filter(|l| pattern.is_match(l)).collect()
        }
    }

    /// Run a query
    ///
    /// Without a parent this is [`find`](Self::find). With a parent, the
    /// result is every matching child under every matching parent, each line
    /// reported once.
    pub fn query(&self, query: &ConfigQuery) -> Result<Vec<&ConfigLine>, QueryError> {
        let pattern = query.pattern.compile()?;

        let Some(parent) = &query.parent else {
            return Ok(self.find(&pattern));
        };
        let parent = parent.compile()?;

        let mut seen = BTreeSet::new();
        for candidate in self.find(&parent) {
            for child in self.children(candidate, &pattern, query.recurse) {
                seen.insert(child.index);
            }
        }

        Ok(seen.into_iter().filter_map(|i| self.lines.get(i)).collect())
    }

    /// Values of `!@#key:value` directive comments, in source order
    pub fn directives(&self, key: &str) -> Vec<String> {
        self.lines
            .iter()
            .filter(|l| l.comment)
            .filter_map(|l| l.text().strip_prefix(DIRECTIVE_PREFIX))
            .filter_map(|d| d.split_once(':'))
            .filter(|(k, _)| k.trim() == key)
            .filter_map(|(_, v)| v.split_whitespace().next())
            .map(str::to_string)
            .collect()
    }
}
