/// Dashboard Context
///
/// Owns everything one dashboard session needs: the data source, the
/// normalized catalog and display settings. Every interaction goes through
/// this object instead of process-wide state, so the whole pipeline can be
/// driven without a live store.
///
/// The catalog sits behind an `Arc` and is only ever replaced wholesale on
/// reload. Snapshots computed from an older catalog stay consistent.

use crate::aggregate::{type_distribution, AggregationSet, CountTable};
use crate::catalog::{distinct_countries, normalize, CatalogSummary, FilterOptions, NormalizedTable};
use crate::config::Config;
use crate::error::Result;
use crate::filter::{FilterSet, FilteredView};
use crate::source::DataSource;
use crate::table::Table;
use serde::Serialize;
use serde_json::Value as JsonValue;
use std::sync::Arc;
use std::time::Instant;

/// Headline numbers for the current view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeyMetrics {
    pub total_titles: usize,
    pub per_type: CountTable<String>,
    pub distinct_countries: usize,
}

/// Display columns of one previewed record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PreviewRow {
    pub title: String,
    #[serde(rename = "type")]
    pub content_type: Option<String>,
    pub country: Option<String>,
    pub release_year: Option<i64>,
    pub rating: Option<String>,
    pub duration: Option<String>,
}

/// Everything the presentation surface renders for one filter selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardSnapshot {
    pub filters: FilterSet,
    pub metrics: KeyMetrics,
    pub aggregations: AggregationSet,
    pub preview: Vec<PreviewRow>,
}

/// Result of an ad-hoc statement, passed through in whatever shape it has.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<JsonValue>>,
}

impl QueryResult {
    pub fn from_table(table: &Table) -> Self {
        let columns: Vec<String> = table.column_names().iter().map(|s| s.to_string()).collect();
        let rows = (0..table.len())
            .map(|row| {
                (0..columns.len())
                    .map(|col| {
                        table
                            .get_value_by_index(row, col)
                            .map(|v| v.to_json())
                            .unwrap_or(JsonValue::Null)
                    })
                    .collect()
            })
            .collect();

        QueryResult { columns, rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

pub struct DashboardContext {
    source: Arc<dyn DataSource>,
    catalog: Arc<NormalizedTable>,
    preview_rows: usize,
}

impl DashboardContext {
    /// Run the default catalog query and normalize it. Any failure here is
    /// fatal: no context is produced.
    pub fn load(source: Box<dyn DataSource>, preview_rows: usize) -> Result<Self> {
        let catalog = load_catalog(source.as_ref())?;
        Ok(DashboardContext {
            source: Arc::from(source),
            catalog: Arc::new(catalog),
            preview_rows,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::load(config.open_source(), config.preview_rows)
    }

    /// Build a context around an already-normalized catalog.
    pub fn with_catalog(
        source: Box<dyn DataSource>,
        catalog: NormalizedTable,
        preview_rows: usize,
    ) -> Self {
        DashboardContext {
            source: Arc::from(source),
            catalog: Arc::new(catalog),
            preview_rows,
        }
    }

    /// Re-run the catalog query and swap in the new table. On failure the
    /// previous catalog stays in place.
    pub fn reload(&mut self) -> Result<CatalogSummary> {
        let catalog = load_catalog(self.source.as_ref())?;
        Ok(self.replace_catalog(catalog))
    }

    /// Swap in a freshly loaded catalog.
    pub fn replace_catalog(&mut self, catalog: NormalizedTable) -> CatalogSummary {
        let summary = catalog.summary();
        self.catalog = Arc::new(catalog);
        summary
    }

    /// Shared handle to the store, for calls made outside any lock on the
    /// context.
    pub fn source(&self) -> Arc<dyn DataSource> {
        Arc::clone(&self.source)
    }

    pub fn catalog(&self) -> Arc<NormalizedTable> {
        Arc::clone(&self.catalog)
    }

    pub fn preview_rows(&self) -> usize {
        self.preview_rows
    }

    pub fn summary(&self) -> CatalogSummary {
        self.catalog.summary()
    }

    pub fn filter_options(&self) -> FilterOptions {
        self.catalog.filter_options()
    }

    /// Filter the catalog and recompute every dashboard result.
    pub fn snapshot(&self, filters: &FilterSet) -> DashboardSnapshot {
        let started = Instant::now();
        let view = filters.apply(&self.catalog);
        let snapshot = build_snapshot(filters, &view, self.preview_rows);
        log::debug!(
            "Snapshot of {} records computed in {:?}",
            snapshot.metrics.total_titles,
            started.elapsed()
        );
        snapshot
    }

    /// Execute an ad-hoc read-only statement. Failures are returned to the
    /// caller and leave the loaded catalog untouched.
    pub fn run_query(&self, sql: &str) -> Result<QueryResult> {
        execute_query(self.source.as_ref(), sql)
    }
}

/// Fetch the whole catalog table from `source` and normalize it.
pub fn load_catalog(source: &dyn DataSource) -> Result<NormalizedTable> {
    let started = Instant::now();
    let result = source.fetch_catalog().and_then(|table| normalize(&table));
    match &result {
        Ok(catalog) => log::info!(
            "Loaded {} catalog records from {} in {:?}",
            catalog.len(),
            source.describe(),
            started.elapsed()
        ),
        Err(e) => log::error!("Loading catalog from {} failed: {}", source.describe(), e),
    }
    result
}

/// Run an ad-hoc statement against `source`.
pub fn execute_query(source: &dyn DataSource, sql: &str) -> Result<QueryResult> {
    match source.fetch(sql) {
        Ok(table) => {
            log::info!("Ad-hoc query returned {} rows", table.len());
            Ok(QueryResult::from_table(&table))
        }
        Err(e) => {
            log::warn!("Ad-hoc query failed: {}", e);
            Err(e)
        }
    }
}

/// Metrics, aggregations and preview for an already-filtered view.
pub fn build_snapshot(
    filters: &FilterSet,
    view: &FilteredView<'_>,
    preview_rows: usize,
) -> DashboardSnapshot {
    let metrics = KeyMetrics {
        total_titles: view.len(),
        per_type: type_distribution(view),
        distinct_countries: distinct_countries(view.iter()),
    };

    let preview = view
        .preview(preview_rows)
        .map(|r| PreviewRow {
            title: r.record.title.clone(),
            content_type: r.record.content_type.clone(),
            country: r.record.country.clone(),
            release_year: r.record.release_year,
            rating: r.record.rating.clone(),
            duration: r.record.duration.clone(),
        })
        .collect();

    DashboardSnapshot {
        filters: filters.clone(),
        metrics,
        aggregations: AggregationSet::compute(view),
        preview,
    }
}
