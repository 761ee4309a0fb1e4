//! # STIG Audit Agent
//!
//! Audits a network device configuration against DISA STIG rules.
//!
//! ## Usage
//!
//! ```bash
//! # STIGs and OS type from the config's !@#stig: / !@#type: directives
//! stig_audit router.cfg
//!
//! # Explicit selection, detailed output, failures only
//! stig_audit --stig cisco_ios_ndm --os_type ios -v 1 -f router.cfg
//!
//! # CSV rows plus a JSON report
//! stig_audit -v 2 -o report.json router.cfg
//! ```
//!
//! ## Exit Codes
//!
//! - **0..=250**: number of failed rules (clamped at 250)
//! - **255**: fatal error (usage, settings, audit log, config, rules, report)

mod cli;
mod config;
mod discovery;
mod output;
mod scanner;

use std::path::Path;

use audit_kit::logging::{FileAuditLog, LogError};
use cli::{parse_args, Cli, CliResult};
use config::{ScanConfig, Settings, SettingsError, EXIT_FATAL};
use scanner::ScanError;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let exit_code = match parse_args(std::env::args_os()) {
        CliResult::Help(text) => {
            print!("{}", text);
            0
        }
        CliResult::Error(msg) => {
            eprint!("{}", msg);
            EXIT_FATAL
        }
        CliResult::Run(cli) => match run(*cli) {
            Ok(code) => code,
            Err(e) => {
                eprintln!("Error: {}", e);
                EXIT_FATAL
            }
        },
    };

    std::process::exit(exit_code);
}

/// Resolve settings, open the audit log and run the audit
fn run(cli: Cli) -> Result<i32, RunError> {
    let settings = Settings::discover(cli.settings.as_deref(), Path::new("."))?;
    let config = ScanConfig::resolve(cli, settings)?;
    let log = FileAuditLog::open(&config.log_file)?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    Ok(scanner::run_scan(&config, &log, &mut out)?)
}

/// Anything that stops a run before or during the audit
#[derive(Debug)]
enum RunError {
    Settings(SettingsError),
    Log(LogError),
    Scan(ScanError),
}

impl std::fmt::Display for RunError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunError::Settings(e) => write!(f, "{}", e),
            RunError::Log(e) => write!(f, "{}", e),
            RunError::Scan(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for RunError {}

impl From<SettingsError> for RunError {
    fn from(e: SettingsError) -> Self {
        RunError::Settings(e)
    }
}

impl From<LogError> for RunError {
    fn from(e: LogError) -> Self {
        RunError::Log(e)
    }
}

impl From<ScanError> for RunError {
    fn from(e: ScanError) -> Self {
        RunError::Scan(e)
    }
}
