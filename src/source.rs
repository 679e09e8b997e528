/// Catalog Store Access
///
/// Runs a read-only statement against the external store and returns the rows
/// as a uniform `Table`, column names preserved. The store is never mutated:
/// SQLite stores are opened read-only and any statement that could write is
/// rejected before it runs.

use crate::column::ColumnValue;
use crate::error::{DashboardError, Result};
use crate::table::Table;
use rusqlite::fallible_iterator::FallibleIterator;
use rusqlite::types::ValueRef;
use rusqlite::{Batch, Connection, ErrorCode, OpenFlags};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// SQLite VM instructions between deadline checks.
const PROGRESS_OPS: i32 = 1_000;

/// A queryable tabular store. Shared between sessions, so calls take `&self`.
pub trait DataSource: Send + Sync {
    /// Execute a read-only statement and return its rows.
    fn fetch(&self, query: &str) -> Result<Table>;

    /// The default statement: the whole catalog table, unfiltered.
    fn catalog_query(&self) -> String;

    fn fetch_catalog(&self) -> Result<Table> {
        self.fetch(&self.catalog_query())
    }

    /// Human-readable location, for logs.
    fn describe(&self) -> String;
}

/// Quote an SQL identifier, doubling embedded quotes.
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// A catalog held in a SQLite database file.
#[derive(Debug, Clone)]
pub struct SqliteSource {
    path: PathBuf,
    table: String,
    timeout: Duration,
}

impl SqliteSource {
    pub fn new<P: AsRef<Path>>(path: P, table: impl Into<String>, timeout: Duration) -> Self {
        SqliteSource {
            path: path.as_ref().to_path_buf(),
            table: table.into(),
            timeout,
        }
    }

    fn connect(&self) -> Result<Connection> {
        let conn = Connection::open_with_flags(
            &self.path,
            OpenFlags::SQLITE_OPEN_READ_ONLY
                | OpenFlags::SQLITE_OPEN_URI
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|e| {
            DashboardError::Connection(format!("cannot open {}: {}", self.path.display(), e))
        })?;

        conn.busy_timeout(self.timeout)
            .map_err(|e| self.map_error(e))?;

        let deadline = Instant::now() + self.timeout;
        conn.progress_handler(PROGRESS_OPS, Some(move || Instant::now() >= deadline));

        Ok(conn)
    }

    fn map_error(&self, err: rusqlite::Error) -> DashboardError {
        match err.sqlite_error_code() {
            Some(ErrorCode::OperationInterrupted)
            | Some(ErrorCode::DatabaseBusy)
            | Some(ErrorCode::DatabaseLocked) => DashboardError::Timeout(self.timeout),
            Some(ErrorCode::CannotOpen)
            | Some(ErrorCode::NotADatabase)
            | Some(ErrorCode::PermissionDenied)
            | Some(ErrorCode::SystemIoFailure) => {
                DashboardError::Connection(format!("{}: {}", self.path.display(), err))
            }
            _ => DashboardError::Query(err.to_string()),
        }
    }

    fn run(&self, conn: &Connection, query: &str) -> Result<Table> {
        let mut batch = Batch::new(conn, query);
        let mut stmt = batch
            .next()
            .map_err(|e| self.map_error(e))?
            .ok_or_else(|| DashboardError::Query("empty statement".to_string()))?;

        if batch.next().map_err(|e| self.map_error(e))?.is_some() {
            return Err(DashboardError::Query(
                "exactly one statement is accepted".to_string(),
            ));
        }

        if !stmt.readonly() {
            return Err(DashboardError::Query(
                "only read-only statements are accepted".to_string(),
            ));
        }

        let column_names: Vec<String> = stmt.column_names().iter().map(|s| s.to_string()).collect();
        let width = column_names.len();

        let mut rows = Vec::new();
        let mut cursor = stmt.query([]).map_err(|e| self.map_error(e))?;
        while let Some(row) = cursor.next().map_err(|e| self.map_error(e))? {
            let mut values = Vec::with_capacity(width);
            for i in 0..width {
                let value = row.get_ref(i).map_err(|e| self.map_error(e))?;
                values.push(value_from_sqlite(value));
            }
            rows.push(values);
        }

        Table::from_rows(&self.table, column_names, rows).map_err(DashboardError::Schema)
    }
}

impl DataSource for SqliteSource {
    fn fetch(&self, query: &str) -> Result<Table> {
        if query.trim().is_empty() {
            return Err(DashboardError::Query("empty statement".to_string()));
        }

        let started = Instant::now();
        let conn = self.connect()?;
        let table = self.run(&conn, query)?;
        log::debug!(
            "Fetched {} rows from {} in {:?}",
            table.len(),
            self.describe(),
            started.elapsed()
        );
        Ok(table)
    }

    fn catalog_query(&self) -> String {
        format!("SELECT * FROM {}", quote_identifier(&self.table))
    }

    fn describe(&self) -> String {
        format!("sqlite:{}#{}", self.path.display(), self.table)
    }
}

fn value_from_sqlite(value: ValueRef<'_>) -> ColumnValue {
    match value {
        ValueRef::Null => ColumnValue::Null,
        ValueRef::Integer(i) => ColumnValue::Int64(i),
        ValueRef::Real(f) => ColumnValue::Float64(f),
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => {
            ColumnValue::String(String::from_utf8_lossy(bytes).into_owned())
        }
    }
}

/// A catalog exported to a CSV file. It has no SQL engine, so only the
/// default catalog statement is accepted.
#[derive(Debug, Clone)]
pub struct CsvSource {
    path: PathBuf,
    table: String,
}

impl CsvSource {
    pub fn new<P: AsRef<Path>>(path: P, table: impl Into<String>) -> Self {
        CsvSource {
            path: path.as_ref().to_path_buf(),
            table: table.into(),
        }
    }
}

impl DataSource for CsvSource {
    fn fetch(&self, query: &str) -> Result<Table> {
        if query.trim() != self.catalog_query() {
            return Err(DashboardError::Query(format!(
                "CSV sources only answer the catalog statement `{}`",
                self.catalog_query()
            )));
        }

        let text = std::fs::read_to_string(&self.path).map_err(|e| {
            DashboardError::Connection(format!("cannot read {}: {}", self.path.display(), e))
        })?;

        Table::from_csv(&self.table, &text).map_err(DashboardError::Schema)
    }

    fn catalog_query(&self) -> String {
        format!("SELECT * FROM {}", quote_identifier(&self.table))
    }

    fn describe(&self) -> String {
        format!("csv:{}", self.path.display())
    }
}
