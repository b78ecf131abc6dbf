//! Serialises report rows to the supported tabular encodings.

use crate::aggregate::ReportRow;
use bitaudit_common::{AuditError, ReportFormat, Result};

const CSV_HEADER: &str = "source_id,bit_id,bit_type,bit_text,fact,is_true,explanation";

/// Render the rows in the requested encoding.
pub fn render(rows: &[ReportRow], format: ReportFormat) -> Result<String> {
    match format {
        ReportFormat::Json => to_json(rows),
        ReportFormat::Csv => Ok(to_csv(rows)),
    }
}

pub fn to_json(rows: &[ReportRow]) -> Result<String> {
    serde_json::to_string_pretty(rows).map_err(|e| AuditError::Report(e.to_string()))
}

pub fn to_csv(rows: &[ReportRow]) -> String {
    let mut out = String::from(CSV_HEADER);
    out.push('\n');
    for row in rows {
        let fields = [
            row.source_id.as_str(),
            row.bit_id.as_str(),
            row.bit_type.as_str(),
            row.bit_text.as_str(),
            row.fact.as_str(),
            row.verdict.label(),
            row.verdict.explanation(),
        ];
        let line: Vec<String> = fields.iter().map(|f| csv_field(f)).collect();
        out.push_str(&line.join(","));
        out.push('\n');
    }
    out
}

/// Quote a field when it contains separators, quotes, or line breaks.
fn csv_field(raw: &str) -> String {
    if raw.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", raw.replace('"', "\"\""))
    } else {
        raw.to_string()
    }
}
