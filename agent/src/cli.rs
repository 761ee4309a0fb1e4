//! Command-line interface parsing
//!
//! Argument definitions and the help/usage-error split. Parsing never exits
//! the process itself; `main` picks the exit code.

use std::ffi::OsString;
use std::path::PathBuf;

use audit_kit::rules::OsType;
use clap::error::ErrorKind;
use clap::Parser;

/// Audit a network device configuration against DISA STIG rules
#[derive(Debug, Clone, PartialEq, Eq, Parser)]
#[command(name = "stig_audit", version, about)]
pub struct Cli {
    /// Configuration text file to scan
    pub config_file: PathBuf,

    /// STIG to be used for the audit (repeatable). Defaults to the
    /// `!@#stig:` directives in the config file
    #[arg(long = "stig", value_name = "STIG")]
    pub stigs: Vec<String>,

    /// Operating system type: ios, xr, nxos, asa. Defaults to the
    /// `!@#type:` directive in the config file
    #[arg(long = "os_type", value_name = "OS", value_parser = parse_os_type)]
    pub os_type: Option<OsType>,

    /// 0 for brief, 1 for details, 2 for CSV rows
    #[arg(short, long, value_parser = clap::value_parser!(u8).range(0..=2))]
    pub verbosity: Option<u8>,

    /// Print failures only
    #[arg(short = 'f', long = "failonly")]
    pub fail_only: bool,

    /// Rule file or directory (default: `rules`)
    #[arg(long, value_name = "PATH")]
    pub rules: Option<PathBuf>,

    /// Audit log file (default: `audit.log`)
    #[arg(long = "log-file", value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Settings file (default: `stig_audit.toml` if present)
    #[arg(long, value_name = "PATH")]
    pub settings: Option<PathBuf>,

    /// Also write a JSON report to this file
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Suppress console output
    #[arg(short, long)]
    pub quiet: bool,
}

fn parse_os_type(value: &str) -> Result<OsType, String> {
    value.parse()
}

/// CLI parsing result
pub enum CliResult {
    /// Run an audit with these arguments
    Run(Box<Cli>),
    /// Help or version text; print and exit successfully
    Help(String),
    /// Usage error, already rendered by clap
    Error(String),
}

/// Parse command-line arguments (including the program name)
pub fn parse_args<I, T>(args: I) -> CliResult
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    match Cli::try_parse_from(args) {
        Ok(cli) => CliResult::Run(Box::new(cli)),
        Err(e) => match e.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => CliResult::Help(e.to_string()),
            _ => CliResult::Error(e.to_string()),
        },
    }
}
