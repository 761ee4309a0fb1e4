//! # Audit Log
//!
//! The audit trail written during a run: run start/end markers, rule load
//! failures and config parse failures.
//!
//! Components never write to a global logger for this. They receive a
//! `&dyn AuditLog` and record through it, so tests can hand in a
//! [`MemoryAuditLog`] and inspect what was written. Every record is also
//! forwarded to the `log` facade, which `env_logger` prints when `RUST_LOG`
//! asks for it.
//!
//! ```ignore
//! use audit_kit::audit_error;
//! use audit_kit::logging::FileAuditLog;
//!
//! let log = FileAuditLog::open("audit.log")?;
//! audit_error!(&log, "Error while loading rules", "path" => "rules/ios");
//! ```

use std::cell::RefCell;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub use log::Level;

/// Timestamp layout used for file entries, e.g. `10/16/2026 09:14:03 AM`
pub const TIMESTAMP_FORMAT: &str = "%m/%d/%Y %I:%M:%S %p";

/// Default audit log file name
pub const DEFAULT_LOG_FILE: &str = "audit.log";

/// Destination for audit trail records
pub trait AuditLog {
    /// Record one event with optional `key=value` fields
    fn record(&self, level: Level, message: &str, fields: &[(&str, String)]);
}

/// Record an event at an explicit level: `audit_event!(log, Level::Info, "msg", "key" => value)`
#[macro_export]
macro_rules! audit_event {
    ($log:expr, $level:expr, $msg:expr $(, $key:expr => $value:expr)* $(,)?) => {
        $crate::logging::AuditLog::record(
            $log,
            $level,
            $msg,
            &[$(($key, ($value).to_string())),*],
        )
    };
}

#[macro_export]
macro_rules! audit_info {
    ($log:expr, $msg:expr $(, $key:expr => $value:expr)* $(,)?) => {
        $crate::audit_event!($log, $crate::logging::Level::Info, $msg $(, $key => $value)*)
    };
}

#[macro_export]
macro_rules! audit_warn {
    ($log:expr, $msg:expr $(, $key:expr => $value:expr)* $(,)?) => {
        $crate::audit_event!($log, $crate::logging::Level::Warn, $msg $(, $key => $value)*)
    };
}

#[macro_export]
macro_rules! audit_error {
    ($log:expr, $msg:expr $(, $key:expr => $value:expr)* $(,)?) => {
        $crate::audit_event!($log, $crate::logging::Level::Error, $msg $(, $key => $value)*)
    };
}

/// Format an entry without its timestamp: `ERROR: message key=value`
pub fn format_entry(level: Level, message: &str, fields: &[(&str, String)]) -> String {
    let mut entry = format!("{}: {}", level, message);
    for (key, value) in fields {
        if value.contains(char::is_whitespace) {
            entry.push_str(&format!(" {}=\"{}\"", key, value));
        } else {
            entry.push_str(&format!(" {}={}", key, value));
        }
    }
    entry
}

fn forward(level: Level, message: &str, fields: &[(&str, String)]) {
    log::log!(target: "audit", level, "{}", format_entry(level, message, fields));
}

// ============================================================================
// File-backed log
// ============================================================================

/// Append-only audit log file
#[derive(Debug)]
pub struct FileAuditLog {
    path: PathBuf,
    file: File,
}

impl FileAuditLog {
    /// Open (or create) the log file for appending
    pub fn open(path: impl AsRef<Path>) -> Result<Self, LogError> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|source| LogError::Open {
                path: path.clone(),
                source,
            })?;
        Ok(Self { path, file })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl AuditLog for FileAuditLog {
    fn record(&self, level: Level, message: &str, fields: &[(&str, String)]) {
        forward(level, message, fields);

        let line = format!(
            "{} {}\n",
            chrono::Local::now().format(TIMESTAMP_FORMAT),
            format_entry(level, message, fields)
        );

        // A failed audit write must not abort the audit itself
        if let Err(e) = (&self.file).write_all(line.as_bytes()) {
            log::warn!("Failed to write audit log {}: {}", self.path.display(), e);
        }
    }
}

// ============================================================================
// In-memory and no-op logs
// ============================================================================

/// Keeps entries in memory (without timestamps)
#[derive(Debug, Default)]
pub struct MemoryAuditLog {
    entries: RefCell<Vec<String>>,
}

impl MemoryAuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the recorded entries
    pub fn entries(&self) -> Vec<String> {
        self.entries.borrow().clone()
    }

    /// Whether any entry contains `needle`
    pub fn contains(&self, needle: &str) -> bool {
        self.entries.borrow().iter().any(|e| e.contains(needle))
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

impl AuditLog for MemoryAuditLog {
    fn record(&self, level: Level, message: &str, fields: &[(&str, String)]) {
        forward(level, message, fields);
        self.entries
            .borrow_mut()
            .push(format_entry(level, message, fields));
    }
}

/// Forwards to the `log` facade only
#[derive(Debug, Default, Clone, Copy)]
pub struct NullAuditLog;

impl AuditLog for NullAuditLog {
    fn record(&self, level: Level, message: &str, fields: &[(&str, String)]) {
        forward(level, message, fields);
    }
}

/// Errors opening the audit log
#[derive(Debug, Error)]
pub enum LogError {
    #[error("Failed to open audit log {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
