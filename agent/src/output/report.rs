//! JSON report builder
//!
//! The `--output` document: who produced it, what was audited (config path
//! and SHA-256), against which STIGs, and every rule result.

use std::path::Path;

use audit_kit::results::{AuditResult, AuditSummary, Outcome};
use audit_kit::rules::OsType;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};

use super::OutputError;

const AGENT_NAME: &str = "stig_audit";

/// What the run was pointed at
#[derive(Debug, Clone, Serialize)]
pub struct ReportTarget {
    pub config_path: String,
    pub config_sha256: String,
    pub os_type: Option<OsType>,
    pub stigs: Vec<String>,
    pub rules_path: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AgentInfo {
    pub name: &'static str,
    pub version: &'static str,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct ReportCounts {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub not_applicable: usize,
    pub errors: usize,
    pub skipped: usize,
}

impl ReportCounts {
    fn from_summary(summary: &AuditSummary) -> Self {
        Self {
            total: summary.len(),
            passed: summary.count(Outcome::Pass),
            failed: summary.count(Outcome::Fail),
            not_applicable: summary.count(Outcome::NotApplicable),
            errors: summary.count(Outcome::Error),
            skipped: summary.skipped(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AuditReport<'a> {
    pub agent: AgentInfo,
    pub run_id: String,
    pub generated_at: DateTime<Utc>,
    pub target: ReportTarget,
    pub counts: ReportCounts,
    pub exit_code: i32,
    pub results: &'a [AuditResult],
}

/// Build the report for a finished run
pub fn build_report(summary: &AuditSummary, target: ReportTarget) -> AuditReport<'_> {
    AuditReport {
        agent: AgentInfo {
            name: AGENT_NAME,
            version: env!("CARGO_PKG_VERSION"),
        },
        run_id: uuid::Uuid::new_v4().to_string(),
        generated_at: Utc::now(),
        target,
        counts: ReportCounts::from_summary(summary),
        exit_code: summary.exit_code(),
        results: summary.results(),
    }
}

impl AuditReport<'_> {
    pub fn to_json(&self) -> Result<String, OutputError> {
        serde_json::to_string_pretty(self).map_err(|e| OutputError::Serialization(e.to_string()))
    }
}

/// `sha256:<hex>` digest of a file's contents
pub fn hash_file(path: &Path) -> Result<String, OutputError> {
    let bytes =
        std::fs::read(path).map_err(|e| OutputError::Hash(path.display().to_string(), e))?;
    Ok(format!("sha256:{}", hex::encode(Sha256::digest(&bytes))))
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::tests::sample_summary;

    fn target() -> ReportTarget {
        ReportTarget {
            config_path: "router.cfg".to_string(),
            config_sha256: "sha256:00".to_string(),
            os_type: Some(OsType::Ios),
            stigs: vec!["cisco_ios_ndm".to_string()],
            rules_path: "rules/ios".to_string(),
        }
    }

    #[test]
    fn test_report_json() {
        let summary = sample_summary();
        let json = build_report(&summary, target()).to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["agent"]["name"], "stig_audit");
        assert_eq!(value["target"]["os_type"], "ios");
        assert_eq!(value["counts"]["total"], 3);
        assert_eq!(value["counts"]["passed"], 2);
        assert_eq!(value["counts"]["failed"], 1);
        assert_eq!(value["exit_code"], 1);
        assert_eq!(value["results"][1]["rule_id"], "V-215808");
        assert_eq!(value["results"][1]["outcome"], "FAIL");
        assert_eq!(
            value["results"][1]["evidence"]["fail"][0]["text"],
            "ip http server"
        );
        assert_eq!(value["run_id"].as_str().unwrap().len(), 36);
    }

    #[test]
    fn test_run_ids_differ() {
        let summary = sample_summary();
        let first = build_report(&summary, target()).run_id;
        let second = build_report(&summary, target()).run_id;
        assert_ne!(first, second);
    }

    #[test]
    fn test_hash_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("r1.cfg");
        std::fs::write(&path, "abc").unwrap();
        assert_eq!(
            hash_file(&path).unwrap(),
            "sha256:ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert!(matches!(
            hash_file(&dir.path().join("missing.cfg")),
            Err(OutputError::Hash(..))
        ));
    }
}
