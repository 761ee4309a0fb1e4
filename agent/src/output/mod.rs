//! Output generation module
//!
//! Provides renderers for the console layouts and the JSON report:
//! - Brief: one line per rule
//! - Detail: a block per rule with its evidence
//! - CSV: one row per rule
//! - Report: JSON document for `--output`

mod console;
mod csv_rows;
mod report;

pub use console::{render_blocks, render_lines};
pub use csv_rows::render_rows;
pub use report::{build_report, hash_file, ReportTarget};

use audit_kit::results::{AuditResult, AuditSummary};

use crate::config::Verbosity;

/// Render results for the console
///
/// With `fail_only`, only failed and errored rules are rendered.
pub fn render(
    summary: &AuditSummary,
    verbosity: Verbosity,
    fail_only: bool,
) -> Result<String, OutputError> {
    let results: Vec<&AuditResult> = summary
        .iter()
        .filter(|r| !fail_only || r.failed())
        .collect();

    match verbosity {
        Verbosity::Brief => Ok(render_lines(&results)),
        Verbosity::Detail => Ok(render_blocks(&results)),
        Verbosity::Csv => render_rows(&results),
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Errors that can occur during output generation
#[derive(Debug)]
pub enum OutputError {
    /// Failed to write CSV rows
    Csv(String),
    /// Failed to serialize the report
    Serialization(String),
    /// Failed to read the config file for hashing
    Hash(String, std::io::Error),
}

impl std::fmt::Display for OutputError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputError::Csv(msg) => write!(f, "Failed to write CSV output: {}", msg),
            OutputError::Serialization(msg) => write!(f, "Failed to serialize report: {}", msg),
            OutputError::Hash(path, e) => write!(f, "Failed to hash {}: {}", path, e),
        }
    }
}

impl std::error::Error for OutputError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            OutputError::Hash(_, e) => Some(e),
            _ => None,
        }
    }
}
