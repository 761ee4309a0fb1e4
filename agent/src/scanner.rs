//! Core audit logic
//!
//! Runs one audit: parse the config, pick STIGs and OS type, load rules,
//! evaluate, print, and optionally write the JSON report. The run is
//! bracketed by "Audit started" / "Audit finished" records in the audit log;
//! a fatal error is recorded as "Audit aborted" instead of finished.

use std::io::Write;
use std::time::Instant;

use audit_kit::config::{ConfigLoadError, ParsedConfig};
use audit_kit::engine::{AuditEngine, AuditFilter};
use audit_kit::logging::AuditLog;
use audit_kit::registry::RegistryError;
use audit_kit::results::AuditSummary;
use audit_kit::rules::{self, RuleLoadError};
use audit_kit::{audit_error, audit_info};

use crate::config::ScanConfig;
use crate::discovery::{self, DiscoveryError};
use crate::output::{self, OutputError, ReportTarget};

/// Run an audit and return the process exit code
///
/// Console output goes to `out` unless the config is quiet.
pub fn run_scan(
    config: &ScanConfig,
    log: &dyn AuditLog,
    out: &mut dyn Write,
) -> Result<i32, ScanError> {
    let start = Instant::now();

    audit_info!(
        log,
        "Audit started",
        "config" => config.config_file.display(),
        "version" => env!("CARGO_PKG_VERSION")
    );

    match execute_audit(config, log, out) {
        Ok(summary) => {
            audit_info!(
                log,
                "Audit finished",
                "rules" => summary.len(),
                "failed" => summary.failure_count(),
                "skipped" => summary.skipped(),
                "duration_ms" => start.elapsed().as_millis()
            );
            Ok(summary.exit_code())
        }
        Err(e) => {
            audit_error!(log, "Audit aborted", "error" => e);
            Err(e)
        }
    }
}

fn execute_audit(
    config: &ScanConfig,
    log: &dyn AuditLog,
    out: &mut dyn Write,
) -> Result<AuditSummary, ScanError> {
    let device = ParsedConfig::from_file(&config.config_file, log)?;

    let stigs = discovery::discover_stigs(&device, &config.stigs);
    let os_type = discovery::discover_os_type(&device, config.os_type, log);
    if stigs.is_empty() {
        log::info!("No STIG selected; auditing against every rule");
    }

    let rules_path = discovery::resolve_rule_path(&config.rules_path, os_type)?;
    let rule_set = rules::load(&rules_path, log)?;
    log::info!(
        "Auditing {} against {} rule(s) from {}",
        config.config_file.display(),
        rule_set.len(),
        rules_path.display()
    );

    let filter = AuditFilter::new()
        .with_os_type(os_type)
        .with_stigs(stigs.iter().cloned());
    let engine = AuditEngine::with_default_registry(filter)?;
    let summary = engine.evaluate(&rule_set, &device);

    if !config.quiet {
        let text = output::render(&summary, config.verbosity, config.fail_only)?;
        out.write_all(text.as_bytes())
            .and_then(|()| out.flush())
            .map_err(|e| ScanError::WriteFile("console".to_string(), e))?;
    }

    if let Some(output_path) = &config.output_file {
        let target = ReportTarget {
            config_path: config.config_file.display().to_string(),
            config_sha256: output::hash_file(&config.config_file)?,
            os_type,
            stigs,
            rules_path: rules_path.display().to_string(),
        };
        let json = output::build_report(&summary, target).to_json()?;
        std::fs::write(output_path, json)
            .map_err(|e| ScanError::WriteFile(output_path.display().to_string(), e))?;
        log::info!("Report written to {}", output_path.display());
    }

    Ok(summary)
}

/// Errors that end a run
#[derive(Debug)]
pub enum ScanError {
    /// Config file unreadable or unparsable
    Config(ConfigLoadError),
    /// Rule path missing
    Discovery(DiscoveryError),
    /// Rules unreadable or invalid
    Rules(RuleLoadError),
    /// Failed to create the executor registry
    Registry(RegistryError),
    /// Failed to generate output
    Output(OutputError),
    /// Failed to write output
    WriteFile(String, std::io::Error),
}

impl std::fmt::Display for ScanError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScanError::Config(e) => write!(f, "{}", e),
            ScanError::Discovery(e) => write!(f, "{}", e),
            ScanError::Rules(e) => write!(f, "{}", e),
            ScanError::Registry(e) => write!(f, "Registry creation failed: {}", e),
            ScanError::Output(e) => write!(f, "Output generation failed: {}", e),
            ScanError::WriteFile(path, e) => write!(f, "Failed to write {}: {}", path, e),
        }
    }
}

impl std::error::Error for ScanError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ScanError::Config(e) => Some(e),
            ScanError::Discovery(e) => Some(e),
            ScanError::Rules(e) => Some(e),
            ScanError::Registry(e) => Some(e),
            ScanError::Output(e) => Some(e),
            ScanError::WriteFile(_, e) => Some(e),
        }
    }
}

impl From<ConfigLoadError> for ScanError {
    fn from(e: ConfigLoadError) -> Self {
        ScanError::Config(e)
    }
}

impl From<DiscoveryError> for ScanError {
    fn from(e: DiscoveryError) -> Self {
        ScanError::Discovery(e)
    }
}

impl From<RuleLoadError> for ScanError {
    fn from(e: RuleLoadError) -> Self {
        ScanError::Rules(e)
    }
}

impl From<RegistryError> for ScanError {
    fn from(e: RegistryError) -> Self {
        ScanError::Registry(e)
    }
}

impl From<OutputError> for ScanError {
    fn from(e: OutputError) -> Self {
        ScanError::Output(e)
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Verbosity;
    use audit_kit::logging::MemoryAuditLog;
    use std::fs;
    use std::path::PathBuf;

    const ROUTER: &str = "\
!@#stig:cisco_ios_ndm
!@#type:ios
hostname R1
ntp authenticate
ip http server
";

    const RULE_FILES: [(&str, &str); 3] = [
        (
            "V-215807.yml",
            "severity: medium\ndesc: NTP must be authenticated\npart_of_stig: [cisco_ios_ndm]\ncheck:\n  text: ntp authenticate\n  match: exact\n",
        ),
        (
            "V-215808.yml",
            "severity: high\ndesc: HTTP server must be disabled\npart_of_stig: [cisco_ios_ndm]\ncheck:\n  text: '^ip http server'\n  predicate: must_not_exist\n",
        ),
        (
            "V-220001.yml",
            "desc: XR only\nos_type: xr\npart_of_stig: [cisco_ios_ndm]\ncheck:\n  text: '^ssh server v2'\n",
        ),
    ];

    const RULE_DOCUMENT: &str = r#"
stig: cisco_ios_ndm
rules:
  - vuln_id: V-215807
    desc: NTP must be authenticated
    check:
      text: ntp authenticate
      match: exact
  - vuln_id: V-215808
    severity: high
    desc: HTTP server must be disabled
    check:
      text: '^ip http server'
      predicate: must_not_exist
"#;

    struct Fixture {
        dir: tempfile::TempDir,
        config: ScanConfig,
    }

    impl Fixture {
        fn write(&self, name: &str, content: &str) -> PathBuf {
            let path = self.dir.path().join(name);
            fs::write(&path, content).unwrap();
            path
        }
    }

    /// Router config plus a `rules/ios/` directory of one-rule files
    fn fixture(router: &str) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("rules/ios")).unwrap();
        for (name, content) in RULE_FILES {
            fs::write(root.join("rules/ios").join(name), content).unwrap();
        }
        fs::write(root.join("router.cfg"), router).unwrap();

        let config = ScanConfig {
            config_file: root.join("router.cfg"),
            stigs: Vec::new(),
            os_type: None,
            verbosity: Verbosity::Brief,
            fail_only: false,
            rules_path: root.join("rules"),
            log_file: root.join("audit.log"),
            output_file: None,
            quiet: false,
        };
        Fixture { dir, config }
    }

    fn run(config: &ScanConfig, log: &MemoryAuditLog) -> (Result<i32, ScanError>, String) {
        let mut out = Vec::new();
        let result = run_scan(config, log, &mut out);
        (result, String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_exit_code_counts_failures() {
        let fixture = fixture(ROUTER);
        let log = MemoryAuditLog::new();
        let (result, text) = run(&fixture.config, &log);

        assert_eq!(result.unwrap(), 1);
        assert_eq!(text.lines().count(), 2);
        assert!(text.contains("V-215808"));
        assert!(!text.contains("V-220001"));

        let entries = log.entries();
        assert!(entries[0].contains("Audit started"));
        assert!(entries.last().unwrap().contains("Audit finished"));
        assert!(log.contains("failed=1"));
        assert!(log.contains("skipped=1"));
    }

    #[test]
    fn test_fail_only_quiet_and_report() {
        let mut fixture = fixture(ROUTER);
        let report = fixture.config.config_file.with_file_name("report.json");
        fixture.config.fail_only = true;
        fixture.config.verbosity = Verbosity::Detail;
        fixture.config.output_file = Some(report.clone());

        let log = MemoryAuditLog::new();
        let (result, text) = run(&fixture.config, &log);
        assert_eq!(result.unwrap(), 1);
        assert_eq!(text.matches("Vuln ID:").count(), 1);

        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&report).unwrap()).unwrap();
        assert_eq!(value["counts"]["total"], 2);
        assert_eq!(value["target"]["stigs"][0], "cisco_ios_ndm");
        assert!(value["target"]["config_sha256"]
            .as_str()
            .unwrap()
            .starts_with("sha256:"));

        fixture.config.quiet = true;
        let (result, text) = run(&fixture.config, &MemoryAuditLog::new());
        assert_eq!(result.unwrap(), 1);
        assert!(text.is_empty());
    }

    #[test]
    fn test_command_line_selection_wins() {
        let mut fixture = fixture(ROUTER);
        fixture.config.stigs = vec!["cisco_ios_rtr".to_string()];

        let (result, text) = run(&fixture.config, &MemoryAuditLog::new());
        // every rule is tagged cisco_ios_ndm only
        assert_eq!(result.unwrap(), 0);
        assert!(text.is_empty());
    }

    #[test]
    fn test_malformed_rules_are_fatal() {
        let mut fixture = fixture(ROUTER);
        fixture.config.rules_path = fixture.write("bad.yml", "stig: x\nrules: not-a-list\n");
        let log = MemoryAuditLog::new();
        let (result, text) = run(&fixture.config, &log);

        assert!(matches!(result, Err(ScanError::Rules(RuleLoadError::Malformed { .. }))));
        assert!(text.is_empty());
        assert!(log.contains("Error while loading rules"));
        assert!(log.contains("Audit aborted"));
        assert!(!log.contains("Audit finished"));
    }

    #[test]
    fn test_unparsable_config_is_fatal() {
        let fixture = fixture("hostname R1\n\tbad indent\n");
        let log = MemoryAuditLog::new();
        let (result, _) = run(&fixture.config, &log);

        assert!(matches!(result, Err(ScanError::Config(_))));
        assert!(log.contains("Error while parsing the config file"));
    }

    #[test]
    fn test_missing_rule_path() {
        let mut fixture = fixture(ROUTER);
        fixture.config.rules_path = PathBuf::from("/nonexistent/rules");
        let (result, _) = run(&fixture.config, &MemoryAuditLog::new());
        assert!(matches!(result, Err(ScanError::Discovery(_))));
    }

    #[test]
    fn test_rule_file_used_directly() {
        let mut fixture = fixture(ROUTER);
        fixture.config.rules_path = fixture.write("ndm.yml", RULE_DOCUMENT);
        fixture.config.verbosity = Verbosity::Csv;

        let (result, text) = run(&fixture.config, &MemoryAuditLog::new());
        assert_eq!(result.unwrap(), 1);
        assert!(text.contains("V-215808,high,HTTP server must be disabled,FAIL,ip http server\n"));
    }
}
