/// Configuration
///
/// Connection parameters come from the environment. Binaries may also accept
/// the same settings as command-line arguments.

use crate::error::{DashboardError, Result};
use crate::source::{CsvSource, DataSource, SqliteSource};
use std::path::PathBuf;
use std::time::Duration;

pub const ENV_SOURCE: &str = "CATALOG_SOURCE";
pub const ENV_DATABASE: &str = "CATALOG_DATABASE";
pub const ENV_TABLE: &str = "CATALOG_TABLE";
pub const ENV_QUERY_TIMEOUT_SECS: &str = "CATALOG_QUERY_TIMEOUT_SECS";
pub const ENV_PREVIEW_ROWS: &str = "CATALOG_PREVIEW_ROWS";

pub const DEFAULT_TABLE: &str = "netflix";
pub const DEFAULT_QUERY_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_PREVIEW_ROWS: usize = 10;

/// Kind of store holding the catalog table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum SourceKind {
    #[default]
    Sqlite,
    Csv,
}

impl SourceKind {
    /// Parse a source kind. Accepts: "sqlite", "csv"
    pub fn parse(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "sqlite" | "sqlite3" => Ok(SourceKind::Sqlite),
            "csv" => Ok(SourceKind::Csv),
            other => Err(DashboardError::Config(format!(
                "unknown source kind '{}'. Use 'sqlite' or 'csv'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub source: SourceKind,
    /// Database file (sqlite) or export file (csv)
    pub database: PathBuf,
    pub table: String,
    pub query_timeout: Duration,
    pub preview_rows: usize,
}

impl Config {
    pub fn new(source: SourceKind, database: impl Into<PathBuf>) -> Self {
        Config {
            source,
            database: database.into(),
            table: DEFAULT_TABLE.to_string(),
            query_timeout: Duration::from_secs(DEFAULT_QUERY_TIMEOUT_SECS),
            preview_rows: DEFAULT_PREVIEW_ROWS,
        }
    }

    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let source = match lookup(ENV_SOURCE) {
            Some(kind) => SourceKind::parse(&kind)?,
            None => SourceKind::default(),
        };

        let database = lookup(ENV_DATABASE)
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| DashboardError::Config(format!("{} must be set", ENV_DATABASE)))?;

        let mut config = Config::new(source, database);

        if let Some(table) = lookup(ENV_TABLE).filter(|s| !s.trim().is_empty()) {
            config.table = table;
        }
        if let Some(secs) = lookup(ENV_QUERY_TIMEOUT_SECS) {
            config.query_timeout =
                Duration::from_secs(parse_number(ENV_QUERY_TIMEOUT_SECS, &secs)?);
        }
        if let Some(rows) = lookup(ENV_PREVIEW_ROWS) {
            config.preview_rows = parse_number(ENV_PREVIEW_ROWS, &rows)?;
        }

        Ok(config)
    }

    /// Build the data source this config points at.
    pub fn open_source(&self) -> Box<dyn DataSource> {
        match self.source {
            SourceKind::Sqlite => Box::new(SqliteSource::new(
                &self.database,
                self.table.clone(),
                self.query_timeout,
            )),
            SourceKind::Csv => Box::new(CsvSource::new(&self.database, self.table.clone())),
        }
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| DashboardError::Config(format!("{} must be a number, got '{}'", key, value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&[(ENV_DATABASE, "/data/netflix.db")])).unwrap();
        assert_eq!(config.source, SourceKind::Sqlite);
        assert_eq!(config.database, PathBuf::from("/data/netflix.db"));
        assert_eq!(config.table, "netflix");
        assert_eq!(config.query_timeout, Duration::from_secs(30));
        assert_eq!(config.preview_rows, 10);
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup(&[
            (ENV_SOURCE, "CSV"),
            (ENV_DATABASE, "titles.csv"),
            (ENV_TABLE, "titles"),
            (ENV_QUERY_TIMEOUT_SECS, "5"),
            (ENV_PREVIEW_ROWS, " 25 "),
        ]))
        .unwrap();
        assert_eq!(config.source, SourceKind::Csv);
        assert_eq!(config.table, "titles");
        assert_eq!(config.query_timeout, Duration::from_secs(5));
        assert_eq!(config.preview_rows, 25);
        assert_eq!(config.open_source().describe(), "csv:titles.csv");
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            Config::from_lookup(lookup(&[])),
            Err(DashboardError::Config(_))
        ));
        assert!(matches!(
            Config::from_lookup(lookup(&[(ENV_DATABASE, "x.db"), (ENV_SOURCE, "mysql")])),
            Err(DashboardError::Config(_))
        ));
        assert!(matches!(
            Config::from_lookup(lookup(&[(ENV_DATABASE, "x.db"), (ENV_QUERY_TIMEOUT_SECS, "soon")])),
            Err(DashboardError::Config(_))
        ));
    }

    #[test]
    fn test_open_sqlite_source() {
        let config = Config::new(SourceKind::Sqlite, "catalog.db");
        assert_eq!(config.open_source().describe(), "sqlite:catalog.db#netflix");
    }
}
