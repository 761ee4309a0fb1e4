//! Rule loader
//!
//! Loads a [`RuleSet`] from either
//! - a rule document file (`stig`, `os_type`, `rules: [...]`), or
//! - a directory of one-rule files, each rule named after its file stem.
//!
//! Loading is all-or-nothing: any bad file fails the whole load.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::audit_error;
use crate::logging::AuditLog;

use super::definition::{RuleDefaults, RuleDefinition, RuleDocument, RuleValidationError};
use super::types::{OsType, Rule, RuleSet};

/// Errors loading rules; all are fatal to a run
#[derive(Debug, Error)]
pub enum RuleLoadError {
    #[error("Rule path not found: {path}")]
    NotFound { path: PathBuf },

    #[error("Failed to read rule file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed rule YAML in {path}: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Invalid rule '{rule}' in {path}: {reason}")]
    InvalidRule {
        path: PathBuf,
        rule: String,
        #[source]
        reason: RuleValidationError,
    },

    #[error("Duplicate rule id '{rule}'")]
    DuplicateRule { rule: String },

    #[error("No rule files (*.yml, *.yaml) found in {path}")]
    NoRuleFiles { path: PathBuf },
}

/// Load rules from a document file or a rule directory
///
/// Failures are written to `log` before being returned.
pub fn load(path: impl AsRef<Path>, log: &dyn AuditLog) -> Result<RuleSet, RuleLoadError> {
    let path = path.as_ref();
    let result = load_rules(path);

    match &result {
        Ok(rule_set) => {
            log::debug!("Loaded {} rules from {}", rule_set.len(), path.display());
        }
        Err(e) => {
            audit_error!(
                log,
                "Error while loading rules",
                "path" => path.display(),
                "error" => e
            );
        }
    }

    result
}

/// Load rules without logging
pub fn load_rules(path: &Path) -> Result<RuleSet, RuleLoadError> {
    if path.is_dir() {
        load_directory(path)
    } else if path.is_file() {
        let content = read(path)?;
        from_yaml(&content, path)
    } else {
        Err(RuleLoadError::NotFound {
            path: path.to_path_buf(),
        })
    }
}

/// Parse a rule document; `source` is only used in error messages
pub fn from_yaml(yaml: &str, source: &Path) -> Result<RuleSet, RuleLoadError> {
    let document: RuleDocument =
        serde_yaml::from_str(yaml).map_err(|e| RuleLoadError::Malformed {
            path: source.to_path_buf(),
            source: e,
        })?;

    let os_type = match &document.os_type {
        Some(value) => Some(value.parse::<OsType>().map_err(|message| {
            RuleLoadError::InvalidRule {
                path: source.to_path_buf(),
                rule: "<document>".to_string(),
                reason: RuleValidationError::OsType(message),
            }
        })?),
        None => None,
    };

    let defaults = RuleDefaults {
        stig: document.stig.clone(),
        os_type,
    };

    let rules = document
        .rules
        .into_iter()
        .enumerate()
        .map(|(position, definition)| {
            let label = definition
                .vuln_id
                .clone()
                .unwrap_or_else(|| format!("#{}", position + 1));
            definition
                .into_rule(None, &defaults)
                .map_err(|reason| RuleLoadError::InvalidRule {
                    path: source.to_path_buf(),
                    rule: label,
                    reason,
                })
        })
        .collect::<Result<Vec<Rule>, _>>()?;

    Ok(RuleSet::new(document.stig, rules)?.with_os_type(os_type))
}

/// Load every `*.yml`/`*.yaml` file in `dir` (non-recursive, sorted by name)
fn load_directory(dir: &Path) -> Result<RuleSet, RuleLoadError> {
    let entries = std::fs::read_dir(dir).map_err(|source| RuleLoadError::Read {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| RuleLoadError::Read {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        if path.is_file() && is_rule_file(&path) {
            files.push(path);
        }
    }
    files.sort();

    if files.is_empty() {
        return Err(RuleLoadError::NoRuleFiles {
            path: dir.to_path_buf(),
        });
    }

    let rules = files
        .iter()
        .map(|path| load_rule_file(path))
        .collect::<Result<Vec<Rule>, _>>()?;

    RuleSet::new(None, rules)
}

fn load_rule_file(path: &Path) -> Result<Rule, RuleLoadError> {
    let content = read(path)?;
    let definition: RuleDefinition =
        serde_yaml::from_str(&content).map_err(|e| RuleLoadError::Malformed {
            path: path.to_path_buf(),
            source: e,
        })?;

    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .map(str::to_string);

    let label = definition
        .vuln_id
        .clone()
        .or_else(|| stem.clone())
        .unwrap_or_default();

    definition
        .into_rule(stem.as_deref(), &RuleDefaults::default())
        .map_err(|reason| RuleLoadError::InvalidRule {
            path: path.to_path_buf(),
            rule: label,
            reason,
        })
}

fn is_rule_file(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yml" | "yaml")
    )
}

fn read(path: &Path) -> Result<String, RuleLoadError> {
    std::fs::read_to_string(path).map_err(|source| RuleLoadError::Read {
        path: path.to_path_buf(),
        source,
    })
}
