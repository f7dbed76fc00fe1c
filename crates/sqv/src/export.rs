//! Writing a result set to CSV or JSON.

use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde_json::{Map, Number, Value};
use tempfile::NamedTempFile;

use crate::db::CellValue;
use crate::error::ExportError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Json,
}

impl ExportFormat {
    pub fn parse(name: &str) -> Result<Self, ExportError> {
        match name.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            _ => Err(ExportError::UnsupportedFormat(name.to_string())),
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ExportFormat::Csv => "CSV",
            ExportFormat::Json => "JSON",
        })
    }
}

/// Serialize `rows` and write them to `path`, replacing any existing file.
/// Returns the number of rows written.
pub fn export_results(
    columns: &[String],
    rows: &[Vec<CellValue>],
    format: ExportFormat,
    path: &Path,
) -> Result<usize, ExportError> {
    if columns.is_empty() || rows.is_empty() {
        return Err(ExportError::NoData);
    }

    let content = match format {
        ExportFormat::Csv => to_csv(columns, rows),
        ExportFormat::Json => to_json(columns, rows),
    };

    write_atomic(path, content.as_bytes())?;
    tracing::info!(path = %path.display(), rows = rows.len(), %format, "exported results");
    Ok(rows.len())
}

/// `query_results_20240131_142500.csv` in the current directory.
pub fn default_export_path(format: ExportFormat) -> PathBuf {
    let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    PathBuf::from(format!("query_results_{}.{}", stamp, format.extension()))
}

/// Expand a leading `~/` to the home directory.
pub fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

pub fn to_csv(columns: &[String], rows: &[Vec<CellValue>]) -> String {
    let mut out = String::new();
    push_csv_record(&mut out, columns.iter().map(|c| escape_csv_field(c)));
    for row in rows {
        push_csv_record(&mut out, row.iter().map(csv_field));
    }
    out
}

fn push_csv_record(out: &mut String, fields: impl Iterator<Item = String>) {
    let fields: Vec<String> = fields.collect();
    out.push_str(&fields.join(","));
    out.push('\n');
}

fn csv_field(value: &CellValue) -> String {
    match value {
        CellValue::Null => String::new(),
        other => escape_csv_field(&other.to_string()),
    }
}

/// Quote a field if it contains a delimiter, quote or line break.
fn escape_csv_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

pub fn to_json(columns: &[String], rows: &[Vec<CellValue>]) -> String {
    let objects: Vec<Value> = rows
        .iter()
        .map(|row| {
            let mut obj = Map::with_capacity(columns.len());
            for (name, value) in columns.iter().zip(row) {
                obj.insert(name.clone(), json_value(value));
            }
            Value::Object(obj)
        })
        .collect();

    // Serializing a tree of plain values cannot fail.
    serde_json::to_string_pretty(&Value::Array(objects)).unwrap_or_else(|_| "[]".to_string())
}

fn json_value(value: &CellValue) -> Value {
    match value {
        CellValue::Null => Value::Null,
        CellValue::Integer(i) => Value::Number((*i).into()),
        CellValue::Real(f) => Number::from_f64(*f).map_or(Value::Null, Value::Number),
        CellValue::Text(s) => Value::String(s.clone()),
        CellValue::Blob(b) => Value::String(CellValue::blob_literal(b)),
    }
}

/// Temp file in the target directory, then rename over the target.
fn write_atomic(path: &Path, content: &[u8]) -> std::io::Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(parent)?;
    tmp.write_all(content)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
