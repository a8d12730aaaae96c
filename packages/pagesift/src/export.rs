//! Export a batch result to JSON or CSV.
//!
//! Format is selected by the output path's extension. Rows are the
//! flattened per-URL view from [`ExtractionOutcome::to_json`]: payload
//! fields plus `url` for successes; `url`, `error`, `error_kind`, and any
//! raw diagnostic for failures.

use std::collections::BTreeSet;
use std::path::Path;

use serde_json::Value;

use crate::error::ExportError;
use crate::types::{BatchResult, ExtractionOutcome};

/// Supported export formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Csv,
}

impl ExportFormat {
    /// Infer the format from a path's extension.
    pub fn from_path(path: &Path) -> Result<Self, ExportError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();

        match extension.as_str() {
            "json" => Ok(ExportFormat::Json),
            "csv" => Ok(ExportFormat::Csv),
            other => Err(ExportError::UnsupportedFormat {
                extension: if other.is_empty() {
                    "(none)".to_string()
                } else {
                    format!(".{}", other)
                },
            }),
        }
    }
}

/// Write a batch result to `path`, choosing the format by extension.
pub fn export_results(result: &BatchResult, path: &Path) -> Result<(), ExportError> {
    let rendered = match ExportFormat::from_path(path)? {
        ExportFormat::Json => render_json(result)?,
        ExportFormat::Csv => render_csv(result),
    };
    std::fs::write(path, rendered)?;
    Ok(())
}

/// Render the result as a pretty-printed JSON array of per-URL rows.
pub fn render_json(result: &BatchResult) -> Result<String, ExportError> {
    let rows: Vec<Value> = result.iter().map(ExtractionOutcome::to_json).collect();
    Ok(serde_json::to_string_pretty(&rows)?)
}

/// Render the result as CSV.
///
/// The header is the sorted union of keys across all rows; complex values
/// are JSON-encoded into their cells, nulls become empty cells.
pub fn render_csv(result: &BatchResult) -> String {
    let rows: Vec<Value> = result.iter().map(ExtractionOutcome::to_json).collect();

    let mut columns: BTreeSet<String> = BTreeSet::new();
    for row in &rows {
        if let Value::Object(map) = row {
            columns.extend(map.keys().cloned());
        }
    }
    let columns: Vec<String> = columns.into_iter().collect();

    let mut out = String::new();
    out.push_str(
        &columns
            .iter()
            .map(|c| csv_cell(c))
            .collect::<Vec<_>>()
            .join(","),
    );
    out.push('\n');

    for row in &rows {
        let cells: Vec<String> = columns
            .iter()
            .map(|column| {
                let value = row.get(column).unwrap_or(&Value::Null);
                csv_cell(&csv_value(value))
            })
            .collect();
        out.push_str(&cells.join(","));
        out.push('\n');
    }

    out
}

/// Flatten a JSON value into CSV cell text.
fn csv_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        // Arrays and objects keep their JSON encoding inside the cell
        other => other.to_string(),
    }
}

/// Quote a cell when it contains a delimiter, quote, or newline.
fn csv_cell(text: &str) -> String {
    if text.contains(',') || text.contains('"') || text.contains('\n') || text.contains('\r') {
        format!("\"{}\"", text.replace('"', "\"\""))
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{FetchError, ItemError};
    use indexmap::IndexMap;
    use serde_json::json;

    fn sample_result() -> BatchResult {
        let mut fields = IndexMap::new();
        fields.insert("title".to_string(), json!("Widget, deluxe"));
        fields.insert("price".to_string(), json!(9.99));
        fields.insert("tags".to_string(), json!(["a", "b"]));

        BatchResult::new(vec![
            ExtractionOutcome::success("https://a.example", fields, false),
            ExtractionOutcome::failure(
                "https://b.example",
                ItemError::Fetch(FetchError::Status {
                    url: "https://b.example".into(),
                    status: 500,
                }),
                false,
            ),
        ])
    }

    #[test]
    fn format_from_path() {
        assert_eq!(
            ExportFormat::from_path(Path::new("out.json")).unwrap(),
            ExportFormat::Json
        );
        assert_eq!(
            ExportFormat::from_path(Path::new("out.CSV")).unwrap(),
            ExportFormat::Csv
        );
        assert!(matches!(
            ExportFormat::from_path(Path::new("out.xlsx")),
            Err(ExportError::UnsupportedFormat { .. })
        ));
        assert!(ExportFormat::from_path(Path::new("out")).is_err());
    }

    #[test]
    fn json_rows() {
        let rendered = render_json(&sample_result()).unwrap();
        let parsed: Vec<Value> = serde_json::from_str(&rendered).unwrap();

        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0]["title"], json!("Widget, deluxe"));
        assert_eq!(parsed[0]["url"], json!("https://a.example"));
        assert_eq!(parsed[1]["error_kind"], json!("fetch_error"));
    }

    #[test]
    fn csv_header_is_key_union() {
        let rendered = render_csv(&sample_result());
        let header = rendered.lines().next().unwrap();

        // Sorted union across success and failure rows
        assert_eq!(header, "error,error_kind,price,tags,title,url");
    }

    #[test]
    fn csv_quotes_and_encodes_complex_values() {
        let rendered = render_csv(&sample_result());
        let lines: Vec<&str> = rendered.lines().collect();

        // Success row: comma inside the title forces quoting, array is JSON
        assert!(lines[1].contains("\"Widget, deluxe\""));
        assert!(lines[1].contains("\"[\"\"a\"\",\"\"b\"\"]\""));
        // Failure row has empty payload cells and a populated error column
        assert!(lines[2].contains("fetch_error"));
    }

    #[test]
    fn export_writes_file() {
        let path = std::env::temp_dir().join(format!("pagesift-export-{}.json", std::process::id()));
        export_results(&sample_result(), &path).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("https://a.example"));
        std::fs::remove_file(&path).ok();
    }
}
