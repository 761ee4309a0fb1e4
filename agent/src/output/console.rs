//! Console output formatting
//!
//! Brief lines (verbosity 0) and per-rule blocks (verbosity 1).

use std::fmt::Write;

use audit_kit::results::{AuditResult, Outcome};

const SEPARATOR: &str =
    "----------------------------------------------------------------------";

/// One line per rule: id, description, outcome
pub fn render_lines(results: &[&AuditResult]) -> String {
    let mut out = String::new();
    for result in results {
        let _ = writeln!(
            out,
            "{:<10} {:<62} {}",
            result.rule_id, result.description, result.outcome
        );
    }
    out
}

/// A block per rule with its evidence grouped by pass/fail/na
pub fn render_blocks(results: &[&AuditResult]) -> String {
    let mut out = String::new();
    for result in results {
        write_block(&mut out, result);
    }
    out
}

fn write_block(out: &mut String, result: &AuditResult) {
    let _ = writeln!(out, "{}", SEPARATOR);
    let _ = writeln!(out, "Vuln ID:     {}", result.rule_id);
    let _ = writeln!(out, "Severity:    {}", result.severity);
    let _ = writeln!(out, "Description: {}", result.description);

    for (label, lines) in result.evidence.groups() {
        if lines.is_empty() {
            continue;
        }
        let _ = writeln!(out, "{} objects:", label);
        for line in lines {
            let _ = writeln!(out, "  - {}", line.text);
        }
    }

    if result.outcome == Outcome::Error {
        let _ = writeln!(out, "Error:       {}", result.detail);
    }
    let _ = writeln!(out, "Success:     {}", result.outcome);
}
