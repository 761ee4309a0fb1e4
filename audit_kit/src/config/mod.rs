//! # Device Configuration
//!
//! Parses Cisco-style configuration text into an immutable line tree and
//! answers hierarchical queries against it.
//!
//! - `parser` - indentation parser producing [`ParsedConfig`]
//! - `pattern` - line patterns and their compiled form
//! - `query` - lookups over the tree (global, child-of, directives)
//!
//! ```ignore
//! use audit_kit::config::{parse, ConfigQuery, LinePattern};
//!
//! let config = parse(&text)?;
//! let query = ConfigQuery::new(LinePattern::regex(r"ip\s+proxy-arp"))
//!     .with_parent(LinePattern::regex("^interface"));
//! for line in config.query(&query)? {
//!     println!("{}: {}", line.number(), line.text());
//! }
//! ```

mod parser;
mod pattern;
mod query;

pub use parser::{parse, ConfigParseError};
pub use pattern::{CompiledPattern, LinePattern, MatchKind, QueryError};
pub use query::{ConfigQuery, DIRECTIVE_PREFIX};

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::audit_error;
use crate::logging::AuditLog;

/// One line of configuration and its place in the tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigLine {
    index: usize,
    number: usize,
    indent: usize,
    raw: String,
    comment: bool,
    parent: Option<usize>,
    children: Vec<usize>,
}

impl ConfigLine {
    /// Position in [`ParsedConfig::lines`]
    pub fn index(&self) -> usize {
        self.index
    }

    /// 1-based line number in the source text
    pub fn number(&self) -> usize {
        self.number
    }

    pub fn indent(&self) -> usize {
        self.indent
    }

    /// Line as written, trailing whitespace removed
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Line without its indentation
    pub fn text(&self) -> &str {
        self.raw.trim_start()
    }

    pub fn is_comment(&self) -> bool {
        self.comment
    }

    /// Index of the parent line, if any
    pub fn parent(&self) -> Option<usize> {
        self.parent
    }

    pub fn child_indices(&self) -> &[usize] {
        &self.children
    }
}

/// Parsed device configuration
///
/// Built once by [`parse`] and never mutated afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedConfig {
    lines: Vec<ConfigLine>,
}

impl ParsedConfig {
    pub(crate) fn from_lines(lines: Vec<ConfigLine>) -> Self {
        Self { lines }
    }

    /// Read and parse a configuration file
    ///
    /// Failures are written to `log` before being returned.
    pub fn from_file(path: impl AsRef<Path>, log: &dyn AuditLog) -> Result<Self, ConfigLoadError> {
        let path = path.as_ref();

        let result = std::fs::read_to_string(path)
            .map_err(|source| ConfigLoadError::Read {
                path: path.to_path_buf(),
                source,
            })
            .and_then(|text| {
                parse(&text).map_err(|source| ConfigLoadError::Parse {
                    path: path.to_path_buf(),
                    source,
                })
            });

        match &result {
            Ok(config) => {
                log::debug!("Parsed {} lines from {}", config.len(), path.display());
            }
            Err(e) => {
                audit_error!(
                    log,
                    "Error while parsing the config file",
                    "path" => path.display(),
                    "error" => e
                );
            }
        }

        result
    }

    /// All lines in source order
    pub fn lines(&self) -> &[ConfigLine] {
        &self.lines
    }

    pub fn line(&self, index: usize) -> Option<&ConfigLine> {
        self.lines.get(index)
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn parent_of(&self, line: &ConfigLine) -> Option<&ConfigLine> {
        line.parent.and_then(|p| self.lines.get(p))
    }

    /// Direct children in source order
    pub fn children_of<'a>(&'a self, line: &'a ConfigLine) -> impl Iterator<Item = &'a ConfigLine> + 'a {
        line.children.iter().filter_map(move |&c| self.lines.get(c))
    }

    /// All descendants in source order
    pub fn descendants_of<'a>(&'a self, line: &'a ConfigLine) -> Vec<&'a ConfigLine> {
        let mut found = Vec::new();
        let mut pending: Vec<usize> = line.children.iter().rev().copied().collect();
        while let Some(index) = pending.pop() {
            if let Some(child) = self.lines.get(index) {
                found.push(child);
                pending.extend(child.children.iter().rev().copied());
            }
        }
        found
    }
}

/// Errors loading a configuration file
#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: ConfigParseError,
    },
}
