/// Error taxonomy for the dashboard pipeline
///
/// Per-record anomalies (bad dates, missing optional fields) are never errors;
/// they degrade to sentinel values during normalization.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, DashboardError>;

#[derive(Error, Debug)]
pub enum DashboardError {
    /// The store is unreachable (missing file, bad credentials, network failure)
    #[error("Connection error: {0}")]
    Connection(String),

    /// The statement was malformed or rejected by the store
    #[error("Query error: {0}")]
    Query(String),

    /// The returned table does not have the shape the catalog needs
    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Query timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl DashboardError {
    /// True for errors that must halt the default catalog load before anything
    /// is rendered.
    pub fn is_fatal_for_load(&self) -> bool {
        !matches!(self, DashboardError::Config(_))
    }

    /// Short machine-readable kind, used in presentation payloads.
    pub fn kind(&self) -> &'static str {
        match self {
            DashboardError::Connection(_) => "connection",
            DashboardError::Query(_) => "query",
            DashboardError::Schema(_) => "schema",
            DashboardError::Timeout(_) => "timeout",
            DashboardError::Config(_) => "config",
        }
    }
}
