//! # Audit Kit
//!
//! STIG compliance auditing for Cisco-style network device configurations.
//! Loads rules from YAML, parses a configuration into a line tree, and
//! evaluates every rule against it.
//!
//! ## Modules
//!
//! - `config` - configuration parser and tree queries
//! - `rules` - rule model and YAML loading
//! - `executors` - evaluation logic for each check kind
//! - `registry` - check kind to executor mapping
//! - `engine` - rule filtering, dispatch and aggregation
//! - `results` - per-rule outcomes and the run summary
//! - `logging` - the audit trail
//!
//! ## Usage
//!
//! ```rust,ignore
//! use audit_kit::config::ParsedConfig;
//! use audit_kit::engine::{AuditEngine, AuditFilter};
//! use audit_kit::logging::FileAuditLog;
//! use audit_kit::rules::{self, OsType};
//!
//! let log = FileAuditLog::open("audit.log")?;
//! let rule_set = rules::load("rules/ios", &log)?;
//! let config = ParsedConfig::from_file("router.cfg", &log)?;
//!
//! let engine = AuditEngine::with_default_registry(
//!     AuditFilter::new().with_os_type(Some(OsType::Ios)),
//! )?;
//! let summary = engine.evaluate(&rule_set, &config);
//! std::process::exit(summary.exit_code());
//! ```

pub mod config;
pub mod engine;
pub mod executors;
pub mod logging;
pub mod registry;
pub mod results;
pub mod rules;

pub use config::ParsedConfig;
pub use engine::{AuditEngine, AuditFilter};
pub use results::{AuditResult, AuditSummary, Outcome};
pub use rules::{Rule, RuleSet};
