/// Message types exchanged with the presentation surface
use serde::{Deserialize, Serialize};

use crate::catalog::{CatalogSummary, FilterOptions};
use crate::dashboard::{DashboardSnapshot, QueryResult};
use crate::error::DashboardError;
use crate::filter::FilterSet;

/// Messages sent from client to server
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type")]
pub enum ClientMessage {
    /// Request selector values for every filterable column
    GetOptions,

    /// Recompute the dashboard for a filter selection
    ApplyFilters {
        #[serde(default)]
        filters: FilterSet,
    },

    /// Run an ad-hoc read-only statement
    RunQuery { sql: String },

    /// Re-run the catalog query and rebuild the normalized table
    Reload,
}

/// Messages sent from server to client
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum ServerMessage {
    Options(FilterOptions),

    Dashboard(DashboardSnapshot),

    QueryResult(QueryResult),

    /// The catalog was reloaded; sent to every connected client
    Reloaded { summary: CatalogSummary },

    Error { kind: String, message: String },
}

impl ServerMessage {
    pub fn error(kind: impl Into<String>, message: impl Into<String>) -> Self {
        ServerMessage::Error {
            kind: kind.into(),
            message: message.into(),
        }
    }

    pub fn to_json(&self) -> String {
        // Every payload is plain data; serialization cannot fail
        serde_json::to_string(self).unwrap_or_else(|e| {
            format!(r#"{{"type":"Error","kind":"internal","message":"{}"}}"#, e)
        })
    }
}

impl From<&DashboardError> for ServerMessage {
    fn from(err: &DashboardError) -> Self {
        ServerMessage::error(err.kind(), err.to_string())
    }
}

/// Body of `POST /api/query`
#[derive(Debug, Clone, Deserialize)]
pub struct QueryRequest {
    pub sql: String,
}
