//! Audit target discovery
//!
//! Works out what to audit against when the command line leaves it open:
//! STIGs and OS type from `!@#` directives in the config, and the rule
//! location for the chosen OS type.

use std::path::{Path, PathBuf};

use audit_kit::audit_warn;
use audit_kit::config::ParsedConfig;
use audit_kit::logging::AuditLog;
use audit_kit::rules::OsType;

/// STIGs to audit: the command-line selection, else `!@#stig:` directives
pub fn discover_stigs(config: &ParsedConfig, selected: &[String]) -> Vec<String> {
    if !selected.is_empty() {
        return selected.to_vec();
    }

    let mut stigs: Vec<String> = Vec::new();
    for stig in config.directives("stig") {
        if !stigs.contains(&stig) {
            stigs.push(stig);
        }
    }
    stigs
}

/// OS type to audit: the command-line selection, else the first `!@#type:`
/// directive
///
/// An unrecognised directive is logged and ignored, which leaves the run
/// unfiltered by OS type.
pub fn discover_os_type(
    config: &ParsedConfig,
    selected: Option<OsType>,
    log: &dyn AuditLog,
) -> Option<OsType> {
    if selected.is_some() {
        return selected;
    }

    let directive = config.directives("type").into_iter().next()?;
    match directive.parse::<OsType>() {
        Ok(os_type) => Some(os_type),
        Err(reason) => {
            audit_warn!(
                log,
                "Ignoring OS type directive",
                "value" => directive,
                "reason" => reason
            );
            None
        }
    }
}

/// Resolve where rules are loaded from
///
/// A rule directory with a subdirectory named after the OS type resolves to
/// that subdirectory (`rules/ios`); anything else is used as given.
pub fn resolve_rule_path(base: &Path, os_type: Option<OsType>) -> Result<PathBuf, DiscoveryError> {
    if !base.exists() {
        return Err(DiscoveryError::InvalidPath(base.to_path_buf()));
    }

    if base.is_dir() {
        if let Some(os_type) = os_type {
            let os_dir = base.join(os_type.as_str());
            if os_dir.is_dir() {
                return Ok(os_dir);
            }
        }
    }

    Ok(base.to_path_buf())
}

/// Errors that can occur during rule discovery
#[derive(Debug)]
pub enum DiscoveryError {
    /// Rule path does not exist
    InvalidPath(PathBuf),
}

impl std::fmt::Display for DiscoveryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DiscoveryError::InvalidPath(p) => write!(f, "Rule path not found: {}", p.display()),
        }
    }
}

impl std::error::Error for DiscoveryError {}
