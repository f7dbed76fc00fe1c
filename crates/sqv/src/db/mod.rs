//! Database access layer over a single SQLite connection.
//!
//! Every call runs synchronously on the caller's thread. The connection is
//! opened once at startup and closed once on shutdown.

mod value;

pub use value::{CellValue, ResultSet};

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use rusqlite::{Batch, Connection, OpenFlags, OptionalExtension, Statement};

use crate::error::{OpenError, QueryError};

/// Kinds of objects stored in `sqlite_master`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchemaKind {
    Table,
    Index,
    View,
    Trigger,
}

impl SchemaKind {
    pub const ALL: [SchemaKind; 4] = [
        SchemaKind::Table,
        SchemaKind::Index,
        SchemaKind::View,
        SchemaKind::Trigger,
    ];

    /// Value of the `type` column in `sqlite_master`.
    pub fn master_type(&self) -> &'static str {
        match self {
            SchemaKind::Table => "table",
            SchemaKind::Index => "index",
            SchemaKind::View => "view",
            SchemaKind::Trigger => "trigger",
        }
    }

    pub fn plural_label(&self) -> &'static str {
        match self {
            SchemaKind::Table => "Tables",
            SchemaKind::Index => "Indices",
            SchemaKind::View => "Views",
            SchemaKind::Trigger => "Triggers",
        }
    }
}

/// Column metadata as reported by `PRAGMA table_info`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnInfo {
    pub name: String,
    pub data_type: String,
    pub not_null: bool,
    pub default_value: Option<String>,
}

impl ColumnInfo {
    /// `name: TYPE NOT NULL DEFAULT x`, as shown in the structure tree.
    pub fn label(&self) -> String {
        let mut label = format!("{}: {}", self.name, self.data_type);
        if self.not_null {
            label.push_str(" NOT NULL");
        }
        if let Some(default) = self.default_value.as_deref().filter(|d| !d.is_empty()) {
            label.push_str(" DEFAULT ");
            label.push_str(default);
        }
        label
    }
}

/// A named schema object. Only tables carry columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaObject {
    pub kind: SchemaKind,
    pub name: String,
    pub columns: Vec<ColumnInfo>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }

    pub fn arrow(&self) -> &'static str {
        match self {
            SortDirection::Asc => "↑",
            SortDirection::Desc => "↓",
        }
    }
}

/// ORDER BY on a single column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSpec {
    pub column: String,
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn asc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            direction: SortDirection::Asc,
        }
    }

    /// Sort requested on `column`: re-selecting the current column flips the
    /// direction, any other column starts ascending.
    pub fn toggle(current: Option<&SortSpec>, column: &str) -> SortSpec {
        match current {
            Some(spec) if spec.column == column => SortSpec {
                column: spec.column.clone(),
                direction: match spec.direction {
                    SortDirection::Asc => SortDirection::Desc,
                    SortDirection::Desc => SortDirection::Asc,
                },
            },
            _ => SortSpec::asc(column),
        }
    }
}

/// Result of a raw statement plus the time the engine spent on it.
#[derive(Debug, Clone)]
pub struct Execution {
    pub result: ResultSet,
    pub elapsed: Duration,
}

/// Quote an identifier for SQLite, doubling embedded quotes.
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Build the windowed SELECT used by the browse view.
///
/// `filter` is inserted verbatim after `WHERE`. It is free-form SQL typed by
/// the only user of this local tool, so arbitrary predicates are allowed.
pub fn build_select(
    table: &str,
    offset: u64,
    limit: u64,
    sort: Option<&SortSpec>,
    filter: Option<&str>,
) -> String {
    let mut sql = format!("SELECT * FROM {}", quote_identifier(table));
    if let Some(filter) = filter.map(str::trim).filter(|f| !f.is_empty()) {
        sql.push_str(" WHERE ");
        sql.push_str(filter);
    }
    if let Some(sort) = sort {
        sql.push_str(&format!(
            " ORDER BY {} {}",
            quote_identifier(&sort.column),
            sort.direction.as_sql()
        ));
    }
    sql.push_str(&format!(" LIMIT {} OFFSET {}", limit, offset));
    sql
}

/// Owner of the one connection used by every view and tab.
#[derive(Debug)]
pub struct Database {
    conn: Connection,
    path: PathBuf,
}

impl Database {
    /// Open an existing database file. Never creates one.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, OpenError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(OpenError::FileNotFound(path.to_path_buf()));
        }

        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_URI
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;

        // SQLite opens lazily; touch the schema so a non-database file is
        // rejected here instead of on the first query.
        conn.query_row("SELECT COUNT(*) FROM sqlite_master", [], |row| {
            row.get::<_, i64>(0)
        })?;

        tracing::info!(path = %path.display(), "database opened");

        Ok(Self {
            conn,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Close the connection, reporting any error from the engine.
    pub fn close(self) -> Result<(), rusqlite::Error> {
        let path = self.path;
        self.conn.close().map_err(|(_, e)| e)?;
        tracing::info!(path = %path.display(), "database closed");
        Ok(())
    }

    /// Names of user objects of one kind, alphabetical.
    pub fn list_names(&self, kind: SchemaKind) -> Result<Vec<String>, QueryError> {
        let mut stmt = self.conn.prepare(
            "SELECT name FROM sqlite_master \
             WHERE type = ?1 AND name NOT LIKE 'sqlite_%' \
             ORDER BY name",
        )?;
        let names = stmt
            .query_map([kind.master_type()], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(names)
    }

    pub fn list_tables(&self) -> Result<Vec<String>, QueryError> {
        self.list_names(SchemaKind::Table)
    }

    pub fn list_indices(&self) -> Result<Vec<String>, QueryError> {
        self.list_names(SchemaKind::Index)
    }

    pub fn list_views(&self) -> Result<Vec<String>, QueryError> {
        self.list_names(SchemaKind::View)
    }

    pub fn list_triggers(&self) -> Result<Vec<String>, QueryError> {
        self.list_names(SchemaKind::Trigger)
    }

    /// All objects of one kind; tables come with their columns.
    pub fn objects(&self, kind: SchemaKind) -> Result<Vec<SchemaObject>, QueryError> {
        self.list_names(kind)?
            .into_iter()
            .map(|name| {
                let columns = if kind == SchemaKind::Table {
                    self.columns(&name)?
                } else {
                    Vec::new()
                };
                Ok(SchemaObject {
                    kind,
                    name,
                    columns,
                })
            })
            .collect()
    }

    /// Columns of `table` in declaration order.
    pub fn columns(&self, table: &str) -> Result<Vec<ColumnInfo>, QueryError> {
        let mut stmt = self.conn.prepare(
            "SELECT name, type, \"notnull\", dflt_value \
             FROM pragma_table_info(?1) ORDER BY cid",
        )?;
        let columns = stmt
            .query_map([table], |row| {
                Ok(ColumnInfo {
                    name: row.get(0)?,
                    data_type: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
                    not_null: row.get::<_, i64>(2)? != 0,
                    default_value: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(columns)
    }

    /// Stored CREATE statement, or an empty string when there is none.
    pub fn definition(&self, name: &str) -> Result<String, QueryError> {
        let sql = self
            .conn
            .query_row(
                "SELECT sql FROM sqlite_master WHERE name = ?1",
                [name],
                |row| row.get::<_, Option<String>>(0),
            )
            .optional()?
            .flatten();
        Ok(sql.unwrap_or_default())
    }

    /// Exact row count (full scan).
    pub fn row_count(&self, table: &str) -> Result<u64, QueryError> {
        let sql = format!("SELECT COUNT(*) FROM {}", quote_identifier(table));
        let count = self.conn.query_row(&sql, [], |row| row.get::<_, i64>(0))?;
        Ok(count.max(0) as u64)
    }

    /// Row count with the same raw WHERE fragment the browse view applies.
    pub fn count_where(&self, table: &str, filter: &str) -> Result<u64, QueryError> {
        let sql = format!(
            "SELECT COUNT(*) FROM {} WHERE {}",
            quote_identifier(table),
            filter
        );
        let count = self.conn.query_row(&sql, [], |row| row.get::<_, i64>(0))?;
        Ok(count.max(0) as u64)
    }

    /// One page of `table`, optionally filtered and sorted.
    pub fn fetch_rows(
        &self,
        table: &str,
        offset: u64,
        limit: u64,
        sort: Option<&SortSpec>,
        filter: Option<&str>,
    ) -> Result<ResultSet, QueryError> {
        let sql = build_select(table, offset, limit, sort, filter);
        let started = Instant::now();
        let mut stmt = self.conn.prepare(&sql).inspect_err(|e| {
            tracing::warn!(%sql, error = %e, "fetch failed");
        })?;
        let result = collect_rows(&mut stmt)?;
        tracing::debug!(
            %sql,
            rows = result.row_count(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "fetched page"
        );
        Ok(result)
    }

    /// Run exactly one statement typed by the user.
    ///
    /// Statements without a result set yield a single `rows_affected` column
    /// and any open transaction is committed.
    pub fn execute(&self, sql: &str) -> Result<Execution, QueryError> {
        let sql = sql.trim();
        if sql.is_empty() {
            return Err(QueryError::Empty);
        }

        let started = Instant::now();
        let outcome = self.execute_single(sql);
        let elapsed = started.elapsed();

        match &outcome {
            Ok(result) => tracing::debug!(
                %sql,
                rows = result.row_count(),
                elapsed_ms = elapsed.as_millis() as u64,
                "statement executed"
            ),
            Err(e) => tracing::warn!(%sql, error = %e, "statement failed"),
        }

        outcome.map(|result| Execution { result, elapsed })
    }

    fn execute_single(&self, sql: &str) -> Result<ResultSet, QueryError> {
        let mut batch = Batch::new(&self.conn, sql);
        let Some(mut stmt) = batch.next()? else {
            return Err(QueryError::Empty);
        };

        // Anything left over that is not whitespace or a comment is a second
        // statement, whether or not it would prepare on its own.
        match batch.next() {
            Ok(None) => {}
            Ok(Some(_)) | Err(_) => return Err(QueryError::MultipleStatements),
        }

        if stmt.column_count() > 0 {
            return Ok(collect_rows(&mut stmt)?);
        }

        // `changes()` still holds the count of the last INSERT/UPDATE/DELETE
        // after DDL, so only trust it when this statement changed something.
        let before = self.conn.total_changes();
        let reported = stmt.execute([])?;
        drop(stmt);
        let affected = if self.conn.total_changes() == before {
            0
        } else {
            reported
        };

        if !self.conn.is_autocommit() {
            self.conn.execute_batch("COMMIT")?;
        }

        Ok(ResultSet::new(
            vec!["rows_affected".to_string()],
            vec![vec![CellValue::Integer(affected as i64)]],
        ))
    }
}

fn collect_rows(stmt: &mut Statement<'_>) -> rusqlite::Result<ResultSet> {
    let columns: Vec<String> = stmt
        .column_names()
        .into_iter()
        .map(String::from)
        .collect();
    let width = columns.len();

    let mut rows = Vec::new();
    let mut cursor = stmt.query([])?;
    while let Some(row) = cursor.next()? {
        let mut cells = Vec::with_capacity(width);
        for idx in 0..width {
            cells.push(CellValue::from(row.get_ref(idx)?));
        }
        rows.push(cells);
    }

    Ok(ResultSet::new(columns, rows))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_identifier() {
        assert_eq!(quote_identifier("users"), "\"users\"");
        assert_eq!(quote_identifier("odd\"name"), "\"odd\"\"name\"");
        assert_eq!(quote_identifier("with space"), "\"with space\"");
    }

    #[test]
    fn test_build_select_plain() {
        assert_eq!(
            build_select("users", 0, 500, None, None),
            "SELECT * FROM \"users\" LIMIT 500 OFFSET 0"
        );
    }

    #[test]
    fn test_build_select_filter_and_sort() {
        let sort = SortSpec {
            column: "age".into(),
            direction: SortDirection::Desc,
        };
        assert_eq!(
            build_select("users", 100, 50, Some(&sort), Some("age > 30")),
            "SELECT * FROM \"users\" WHERE age > 30 ORDER BY \"age\" DESC LIMIT 50 OFFSET 100"
        );
    }

    #[test]
    fn test_build_select_blank_filter_ignored() {
        assert_eq!(
            build_select("t", 0, 10, None, Some("   ")),
            "SELECT * FROM \"t\" LIMIT 10 OFFSET 0"
        );
    }

    #[test]
    fn test_sort_toggle() {
        let first = SortSpec::toggle(None, "name");
        assert_eq!(first, SortSpec::asc("name"));

        let flipped = SortSpec::toggle(Some(&first), "name");
        assert_eq!(flipped.direction, SortDirection::Desc);

        let back = SortSpec::toggle(Some(&flipped), "name");
        assert_eq!(back.direction, SortDirection::Asc);

        let other = SortSpec::toggle(Some(&flipped), "age");
        assert_eq!(other, SortSpec::asc("age"));
    }

    #[test]
    fn test_column_label() {
        let col = ColumnInfo {
            name: "age".into(),
            data_type: "INTEGER".into(),
            not_null: true,
            default_value: Some("0".into()),
        };
        assert_eq!(col.label(), "age: INTEGER NOT NULL DEFAULT 0");

        let plain = ColumnInfo {
            name: "note".into(),
            data_type: "TEXT".into(),
            not_null: false,
            default_value: None,
        };
        assert_eq!(plain.label(), "note: TEXT");
    }
}
