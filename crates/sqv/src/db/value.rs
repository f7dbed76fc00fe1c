use std::fmt;

use rusqlite::types::ValueRef;

/// A single typed cell as returned by the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl CellValue {
    /// SQLite blob literal form (`X'00FF'`), used wherever a blob has to be
    /// written out as text without losing bytes.
    pub fn blob_literal(bytes: &[u8]) -> String {
        let mut out = String::with_capacity(bytes.len() * 2 + 3);
        out.push_str("X'");
        for b in bytes {
            out.push_str(&format!("{:02X}", b));
        }
        out.push('\'');
        out
    }
}

impl From<ValueRef<'_>> for CellValue {
    fn from(value: ValueRef<'_>) -> Self {
        match value {
            ValueRef::Null => CellValue::Null,
            ValueRef::Integer(i) => CellValue::Integer(i),
            ValueRef::Real(f) => CellValue::Real(f),
            ValueRef::Text(bytes) => CellValue::Text(String::from_utf8_lossy(bytes).into_owned()),
            ValueRef::Blob(bytes) => CellValue::Blob(bytes.to_vec()),
        }
    }
}

/// Default text form of a value. NULL prints as `NULL`, blobs as a literal.
impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Null => f.write_str("NULL"),
            CellValue::Integer(i) => write!(f, "{}", i),
            CellValue::Real(r) => f.write_str(&format_real(*r)),
            CellValue::Text(s) => f.write_str(s),
            CellValue::Blob(b) => f.write_str(&CellValue::blob_literal(b)),
        }
    }
}

/// Shortest round-trip form that always keeps a fractional part for
/// integral values (`3.0`, not `3`).
fn format_real(value: f64) -> String {
    let s = value.to_string();
    if value.is_finite() && !s.contains(['.', 'e', 'E']) {
        format!("{}.0", s)
    } else {
        s
    }
}

/// The outcome of one query: column names in display order plus typed rows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSet {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

impl ResultSet {
    /// Build a result set, making duplicate column names unique by suffixing
    /// `_2`, `_3`, ... so every column can be addressed by name.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<CellValue>>) -> Self {
        Self {
            columns: unique_column_names(columns),
            rows,
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Rows `[offset, offset + limit)`, clamped to what exists.
    pub fn window(&self, offset: usize, limit: usize) -> &[Vec<CellValue>] {
        let start = offset.min(self.rows.len());
        let end = offset.saturating_add(limit).min(self.rows.len());
        &self.rows[start..end]
    }
}

fn unique_column_names(columns: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(columns.len());
    for name in columns {
        if !out.contains(&name) {
            out.push(name);
            continue;
        }
        let mut n = 2;
        loop {
            let candidate = format!("{}_{}", name, n);
            if !out.contains(&candidate) {
                out.push(candidate);
                break;
            }
            n += 1;
        }
    }
    out
}
