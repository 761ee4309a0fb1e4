//! Configuration types for the STIG agent
//!
//! Settings come from three layers, highest first: command-line flags, the
//! TOML settings file, built-in defaults.
//!
//! ```toml
//! rules_dir = "/etc/stig_audit/rules"
//! log_file = "/var/log/stig_audit.log"
//! verbosity = 1
//! fail_only = true
//! ```

use std::path::{Path, PathBuf};

use audit_kit::logging::DEFAULT_LOG_FILE;
use audit_kit::rules::OsType;
use serde::Deserialize;

use crate::cli::Cli;

/// Exit code for fatal errors (bad usage, unreadable rules or config, ...)
pub const EXIT_FATAL: i32 = 255;

/// Settings file picked up from the working directory
pub const SETTINGS_FILE: &str = "stig_audit.toml";

/// Rule location when neither flag nor settings name one
pub const DEFAULT_RULES_DIR: &str = "rules";

/// Console output layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    /// One line per rule
    #[default]
    Brief,
    /// A block per rule with evidence
    Detail,
    /// CSV rows
    Csv,
}

impl TryFrom<u8> for Verbosity {
    type Error = SettingsError;

    fn try_from(level: u8) -> Result<Self, Self::Error> {
        match level {
            0 => Ok(Verbosity::Brief),
            1 => Ok(Verbosity::Detail),
            2 => Ok(Verbosity::Csv),
            other => Err(SettingsError::InvalidVerbosity(other)),
        }
    }
}

/// Contents of the settings file; every field optional
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    pub rules_dir: Option<PathBuf>,
    pub log_file: Option<PathBuf>,
    pub verbosity: Option<u8>,
    #[serde(default)]
    pub fail_only: bool,
}

impl Settings {
    /// Load a settings file that must exist
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| SettingsError::Read(path.to_path_buf(), e))?;
        toml::from_str(&content).map_err(|e| SettingsError::Parse(path.to_path_buf(), e))
    }

    /// Find the settings to use
    ///
    /// An explicit path must exist. Otherwise `stig_audit.toml` in `dir` is
    /// used when present, else defaults.
    pub fn discover(explicit: Option<&Path>, dir: &Path) -> Result<Self, SettingsError> {
        if let Some(path) = explicit {
            return Self::load(path);
        }

        let candidate = dir.join(SETTINGS_FILE);
        if candidate.is_file() {
            log::debug!("Using settings from {}", candidate.display());
            Self::load(&candidate)
        } else {
            Ok(Self::default())
        }
    }
}

/// Configuration for an audit run
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Device configuration to audit
    pub config_file: PathBuf,

    /// STIGs selected on the command line (empty means use directives)
    pub stigs: Vec<String>,

    /// OS type selected on the command line (None means use the directive)
    pub os_type: Option<OsType>,

    /// Console layout
    pub verbosity: Verbosity,

    /// Only print failed and errored rules
    pub fail_only: bool,

    /// Rule file or rule directory root
    pub rules_path: PathBuf,

    /// Audit log file
    pub log_file: PathBuf,

    /// JSON report path (None means console only)
    pub output_file: Option<PathBuf>,

    /// Suppress console output
    pub quiet: bool,
}

impl ScanConfig {
    /// Merge command-line flags over settings
    pub fn resolve(cli: Cli, settings: Settings) -> Result<Self, SettingsError> {
        let verbosity = Verbosity::try_from(cli.verbosity.or(settings.verbosity).unwrap_or(0))?;

        Ok(Self {
            config_file: cli.config_file,
            stigs: cli.stigs,
            os_type: cli.os_type,
            verbosity,
            fail_only: cli.fail_only || settings.fail_only,
            rules_path: cli
                .rules
                .or(settings.rules_dir)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_RULES_DIR)),
            log_file: cli
                .log_file
                .or(settings.log_file)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_FILE)),
            output_file: cli.output,
            quiet: cli.quiet,
        })
    }
}

/// Errors loading or applying settings
#[derive(Debug)]
pub enum SettingsError {
    /// Failed to read the settings file
    Read(PathBuf, std::io::Error),
    /// Settings file is not valid TOML for [`Settings`]
    Parse(PathBuf, toml::de::Error),
    /// Verbosity outside 0..=2
    InvalidVerbosity(u8),
}

impl std::fmt::Display for SettingsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SettingsError::Read(p, e) => {
                write!(f, "Failed to read settings {}: {}", p.display(), e)
            }
            SettingsError::Parse(p, e) => {
                write!(f, "Invalid settings file {}: {}", p.display(), e)
            }
            SettingsError::InvalidVerbosity(level) => {
                write!(f, "Invalid verbosity {}. Use: 0, 1, 2", level)
            }
        }
    }
}

impl std::error::Error for SettingsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SettingsError::Read(_, e) => Some(e),
            SettingsError::Parse(_, e) => Some(e),
            SettingsError::InvalidVerbosity(_) => None,
        }
    }
}
