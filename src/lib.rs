/// Catalog Dashboard - Filter-and-Aggregate Pipeline
///
/// Loads a media catalog table from an external store, normalizes it once,
/// and recomputes a fixed set of aggregations over a filtered view on every
/// interaction. An optional actix server exposes the pipeline to a browser
/// dashboard.

pub mod error;
pub mod column;
pub mod table;
pub mod source;
pub mod config;
pub mod classify;
pub mod catalog;
pub mod filter;
pub mod aggregate;
pub mod dashboard;
pub mod messages;

pub use error::{DashboardError, Result};
pub use column::{Column, ColumnType, ColumnValue};
pub use table::{Schema, Table};
pub use source::{CsvSource, DataSource, SqliteSource};
pub use config::{Config, SourceKind};
pub use classify::{classify, classify_with, ContentCategory, KeywordSet, DEFAULT_KEYWORDS};
pub use catalog::{
    normalize, normalize_with, CatalogColumns, CatalogRecord, CatalogSummary, FilterOptions,
    NormalizedRecord, NormalizedTable,
};
pub use filter::{FilterSet, FilteredView};
pub use aggregate::{AggregationSet, CountRow, CountTable, CrossTab, MonthlyAdditions};
pub use dashboard::{DashboardContext, DashboardSnapshot, KeyMetrics, PreviewRow, QueryResult};

// WebSocket server modules - only when server feature is enabled
#[cfg(feature = "server")]
pub mod websocket;
#[cfg(feature = "server")]
pub mod server;

#[cfg(test)]
mod integration_tests {
    use super::*;
    use crate::aggregate::{top_genres, type_distribution, TOP_N};

    fn scenario_table() -> Table {
        Table::from_rows(
            "netflix",
            ["type", "title", "country", "release_year", "rating", "listed_in", "description", "date_added", "duration"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            vec![
                vec![
                    ColumnValue::String("Movie".to_string()),
                    ColumnValue::String("Homecoming".to_string()),
                    ColumnValue::String("India".to_string()),
                    ColumnValue::Int64(2020),
                    ColumnValue::String("PG".to_string()),
                    ColumnValue::String("Comedy, Drama".to_string()),
                    ColumnValue::String("a story of family and love".to_string()),
                    ColumnValue::String("March 3, 2021".to_string()),
                    ColumnValue::String("101 min".to_string()),
                ],
                vec![
                    ColumnValue::String("Movie".to_string()),
                    ColumnValue::String("Frontline".to_string()),
                    ColumnValue::String("India".to_string()),
                    ColumnValue::Int64(2021),
                    ColumnValue::String("R".to_string()),
                    ColumnValue::String("Action".to_string()),
                    ColumnValue::String("war and death".to_string()),
                    ColumnValue::Null,
                    ColumnValue::String("118 min".to_string()),
                ],
                vec![
                    ColumnValue::String("Series".to_string()),
                    ColumnValue::String("Main Street".to_string()),
                    ColumnValue::String("USA".to_string()),
                    ColumnValue::Int64(2020),
                    ColumnValue::String("PG".to_string()),
                    ColumnValue::String("Comedy".to_string()),
                    ColumnValue::Null,
                    ColumnValue::String("not a date".to_string()),
                    ColumnValue::String("1 Season".to_string()),
                ],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_complete_workflow() {
        let catalog = normalize(&scenario_table()).unwrap();
        assert_eq!(catalog.len(), 3);

        let categories: Vec<ContentCategory> = catalog.iter().map(|r| r.content_category).collect();
        assert_eq!(
            categories,
            vec![
                ContentCategory::FamilyFriendly,
                ContentCategory::Intense,
                ContentCategory::Neutral
            ]
        );

        let view = FilterSet::new().with_country("India").apply(&catalog);
        assert_eq!(view.len(), 2);

        assert_eq!(type_distribution(&view).to_pairs(), vec![("Movie".to_string(), 2)]);
        assert_eq!(
            top_genres(&view, TOP_N).to_pairs(),
            vec![
                ("Comedy".to_string(), 1),
                ("Drama".to_string(), 1),
                ("Action".to_string(), 1),
            ]
        );

        // Only the first record has a parseable date_added
        let aggregations = AggregationSet::compute(&view);
        assert_eq!(aggregations.monthly_additions.rows(), vec![(2021, "March", 1)]);
        assert_eq!(aggregations.rating_by_type.get("R", "Movie"), 1);
        assert_eq!(aggregations.rating_by_type.get("PG", "Series"), 0);
    }

    #[test]
    fn test_empty_view_yields_empty_results() {
        let catalog = normalize(&scenario_table()).unwrap();
        let view = FilterSet::new().with_release_year(9999).apply(&catalog);

        assert!(view.is_empty());
        let aggregations = AggregationSet::compute(&view);
        assert!(aggregations.is_empty());
        assert!(aggregations.rating_by_type.rows.is_empty());
        assert!(aggregations.monthly_additions.series.is_empty());
    }

    #[test]
    fn test_normalization_never_drops_records() {
        let catalog = normalize(&scenario_table()).unwrap();
        let unknown: Vec<&str> = catalog
            .iter()
            .filter(|r| r.year_added.is_none())
            .map(|r| r.record.title.as_str())
            .collect();
        assert_eq!(unknown, vec!["Frontline", "Main Street"]);
        assert_eq!(catalog.get(2).unwrap().year_added_label(), "unknown");
        assert_eq!(catalog.get(2).unwrap().month_name(), "unknown");
    }

    #[test]
    fn test_aggregations_ignore_row_order() {
        let forward = normalize(&scenario_table()).unwrap();

        let mut reversed_records: Vec<CatalogRecord> = forward.iter().map(|r| r.record.clone()).collect();
        reversed_records.reverse();
        let reversed = NormalizedTable::from_records(reversed_records);

        let a = AggregationSet::compute(&FilteredView::all(&forward));
        let b = AggregationSet::compute(&FilteredView::all(&reversed));

        assert_eq!(a.type_distribution, b.type_distribution);
        assert_eq!(a.year_trend, b.year_trend);
        assert_eq!(a.rating_distribution, b.rating_distribution);
        assert_eq!(a.monthly_additions, b.monthly_additions);
        assert_eq!(a.category_by_type, b.category_by_type);
        assert_eq!(a.rating_by_type, b.rating_by_type);
    }

    #[test]
    fn test_sqlite_to_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("netflix.db");
        let conn = rusqlite::Connection::open(&path).unwrap();
        conn.execute_batch(
            "CREATE TABLE netflix (title TEXT, type TEXT, country TEXT, release_year INTEGER,
                date_added TEXT, rating TEXT, listed_in TEXT, description TEXT, duration TEXT);
             INSERT INTO netflix VALUES
                ('Kota Factory', 'TV Show', 'India', 2019, 'April 16, 2019', 'TV-14',
                 'International TV Shows, TV Comedies', 'Students and friendship', '2 Seasons'),
                ('Jaws', 'Movie', 'United States', 1975, NULL, 'PG', 'Thrillers', 'A shark attack', '124 min');",
        )
        .unwrap();
        drop(conn);

        let config = Config::new(SourceKind::Sqlite, &path);
        let dashboard = DashboardContext::from_config(&config).unwrap();

        let snapshot = dashboard.snapshot(&FilterSet::new().with_title("kota"));
        assert_eq!(snapshot.metrics.total_titles, 1);
        assert_eq!(snapshot.preview[0].content_type.as_deref(), Some("TV Show"));

        let result = dashboard
            .run_query("SELECT type, COUNT(*) AS n FROM netflix GROUP BY type ORDER BY type")
            .unwrap();
        assert_eq!(result.columns, vec!["type", "n"]);
        assert_eq!(result.rows.len(), 2);

        assert!(dashboard.run_query("DELETE FROM netflix").is_err());
        assert_eq!(dashboard.run_query("SELECT COUNT(*) FROM netflix").unwrap().rows[0][0], 2);
    }
}
