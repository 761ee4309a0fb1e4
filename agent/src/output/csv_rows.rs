//! CSV rows (verbosity 2)
//!
//! `id,severity,description,outcome,objects` per rule, no header. Objects are
//! `~`-joined within an evidence group and non-empty groups are
//! `,`-joined, so the last field is quoted whenever it holds more than one
//! group.

use audit_kit::results::AuditResult;
use csv::WriterBuilder;

use super::OutputError;

pub fn render_rows(results: &[&AuditResult]) -> Result<String, OutputError> {
    let mut writer = WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());

    for result in results {
        let severity = result.severity.to_string();
        let outcome = result.outcome.to_string();
        let objects = objects_field(result);
        writer
            .write_record([
                result.rule_id.as_str(),
                severity.as_str(),
                result.description.as_str(),
                outcome.as_str(),
                objects.as_str(),
            ])
            .map_err(|e| OutputError::Csv(e.to_string()))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| OutputError::Csv(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| OutputError::Csv(e.to_string()))
}

fn objects_field(result: &AuditResult) -> String {
    result
        .evidence
        .groups()
        .iter()
        .filter(|(_, lines)| !lines.is_empty())
        .map(|(_, lines)| {
            lines
                .iter()
                .map(|l| l.text.as_str())
                .collect::<Vec<_>>()
                .join("~")
        })
        .collect::<Vec<_>>()
        .join(",")
}
