/// Catalog records and normalization
///
/// `normalize` turns the raw catalog table into typed records with derived
/// fields (parsed date, year/month added, genre tokens, content category).
/// Only a missing column can fail: per-record anomalies degrade to "unknown",
/// an absent release year, an empty genre list or a Neutral category, so no
/// record is ever dropped.

use crate::classify::{classify_with, ContentCategory, KeywordSet, DEFAULT_KEYWORDS};
use crate::column::ColumnValue;
use crate::error::{DashboardError, Result};
use crate::table::Table;
use chrono::{Datelike, NaiveDate, NaiveDateTime};
use serde::Serialize;
use std::collections::{BTreeSet, HashSet};

/// Rendered in place of year/month when date-added could not be parsed.
pub const UNKNOWN: &str = "unknown";

const MONTH_NAMES: [&str; 12] = [
    "January", "February", "March", "April", "May", "June",
    "July", "August", "September", "October", "November", "December",
];

/// Accepted date-added layouts, tried in order.
const DATE_FORMATS: &[&str] = &[
    "%B %d, %Y", // September 25, 2021 (also accepts Sep 25, 2021)
    "%Y-%m-%d",
    "%d-%b-%y",
    "%d-%b-%Y",
    "%m/%d/%Y",
    "%d %B %Y",
    "%B %d %Y",
];

const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// Source column names of the catalog table.
#[derive(Debug, Clone)]
pub struct CatalogColumns {
    pub title: String,
    pub content_type: String,
    pub country: String,
    pub release_year: String,
    pub date_added: String,
    pub rating: String,
    pub genres: String,
    pub description: String,
    pub duration: String,
}

impl Default for CatalogColumns {
    fn default() -> Self {
        CatalogColumns {
            title: "title".to_string(),
            content_type: "type".to_string(),
            country: "country".to_string(),
            release_year: "release_year".to_string(),
            date_added: "date_added".to_string(),
            rating: "rating".to_string(),
            genres: "listed_in".to_string(),
            description: "description".to_string(),
            duration: "duration".to_string(),
        }
    }
}

/// One row of the catalog table with its raw fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CatalogRecord {
    pub title: String,
    pub content_type: Option<String>,
    pub country: Option<String>,
    pub release_year: Option<i64>,
    pub date_added: Option<String>,
    pub rating: Option<String>,
    pub listed_in: Option<String>,
    pub description: Option<String>,
    pub duration: Option<String>,
}

/// A catalog record plus the read-only fields derived at load time.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedRecord {
    pub record: CatalogRecord,
    pub date_added: Option<NaiveDate>,
    pub year_added: Option<i32>,
    /// Month number, 1-12
    pub month_added: Option<u32>,
    pub genre_list: Vec<String>,
    pub content_category: ContentCategory,
}

impl NormalizedRecord {
    pub fn from_record(record: CatalogRecord) -> Self {
        Self::from_record_with(record, &DEFAULT_KEYWORDS)
    }

    pub fn from_record_with(record: CatalogRecord, keywords: &KeywordSet) -> Self {
        let date_added = record.date_added.as_deref().and_then(parse_date_added);
        let genre_list = split_genres(record.listed_in.as_deref());
        let content_category = classify_with(keywords, record.description.as_deref());

        NormalizedRecord {
            year_added: date_added.map(|d| d.year()),
            month_added: date_added.map(|d| d.month()),
            date_added,
            genre_list,
            content_category,
            record,
        }
    }

    pub fn month_name(&self) -> &'static str {
        self.month_added.map_or(UNKNOWN, month_name)
    }

    pub fn year_added_label(&self) -> String {
        self.year_added.map_or_else(|| UNKNOWN.to_string(), |y| y.to_string())
    }
}

pub(crate) fn month_name(month: u32) -> &'static str {
    month
        .checked_sub(1)
        .and_then(|i| MONTH_NAMES.get(i as usize))
        .copied()
        .unwrap_or(UNKNOWN)
}

/// Tolerant date-added parser. Returns None when no known layout matches.
pub fn parse_date_added(raw: &str) -> Option<NaiveDate> {
    let text = raw.trim();
    if text.is_empty() {
        return None;
    }

    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
                .map(|dt| dt.date())
        })
}

/// Split a comma-separated genre listing into trimmed tokens.
/// Order of appearance and duplicates are preserved; empty tokens are dropped.
pub fn split_genres(listed_in: Option<&str>) -> Vec<String> {
    listed_in
        .map(|text| {
            text.split(',')
                .map(str::trim)
                .filter(|g| !g.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Totals over the full (unfiltered) catalog.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CatalogSummary {
    pub total_records: usize,
    pub release_year_min: Option<i64>,
    pub release_year_max: Option<i64>,
    pub unknown_date_added: usize,
}

/// Distinct values per filterable column, for populating selectors.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FilterOptions {
    pub types: Vec<String>,
    pub countries: Vec<String>,
    /// Newest first
    pub release_years: Vec<i64>,
    pub ratings: Vec<String>,
}

/// The normalized catalog. Built once per load and never patched in place.
#[derive(Debug, Clone, Default)]
pub struct NormalizedTable {
    records: Vec<NormalizedRecord>,
}

impl NormalizedTable {
    pub fn from_records(records: Vec<CatalogRecord>) -> Self {
        NormalizedTable {
            records: records.into_iter().map(NormalizedRecord::from_record).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&NormalizedRecord> {
        self.records.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, NormalizedRecord> {
        self.records.iter()
    }

    pub fn summary(&self) -> CatalogSummary {
        let years = self.records.iter().filter_map(|r| r.record.release_year);
        CatalogSummary {
            total_records: self.records.len(),
            release_year_min: years.clone().min(),
            release_year_max: years.max(),
            unknown_date_added: self.records.iter().filter(|r| r.year_added.is_none()).count(),
        }
    }

    pub fn filter_options(&self) -> FilterOptions {
        let distinct = |field: fn(&CatalogRecord) -> Option<&String>| -> Vec<String> {
            self.records
                .iter()
                .filter_map(|r| field(&r.record))
                .cloned()
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect()
        };

        let years: BTreeSet<i64> =
            self.records.iter().filter_map(|r| r.record.release_year).collect();

        FilterOptions {
            types: distinct(|r| r.content_type.as_ref()),
            countries: distinct(|r| r.country.as_ref()),
            release_years: years.into_iter().rev().collect(),
            ratings: distinct(|r| r.rating.as_ref()),
        }
    }
}

/// Normalize a raw catalog table using the default column names and keywords.
pub fn normalize(table: &Table) -> Result<NormalizedTable> {
    normalize_with(table, &CatalogColumns::default(), &DEFAULT_KEYWORDS)
}

/// Normalize a raw catalog table in a single pass.
///
/// Fails with `SchemaError` when a required column is missing or the release
/// year column is not numeric.
pub fn normalize_with(
    table: &Table,
    columns: &CatalogColumns,
    keywords: &KeywordSet,
) -> Result<NormalizedTable> {
    let layout = ColumnLayout::resolve(table, columns)?;

    let mut records = Vec::with_capacity(table.len());
    let mut bad_years = 0;
    for row in 0..table.len() {
        let (record, year_ok) = layout.read_record(table, row)?;
        if !year_ok {
            bad_years += 1;
        }
        records.push(NormalizedRecord::from_record_with(record, keywords));
    }

    let normalized = NormalizedTable { records };
    let summary = normalized.summary();
    log::info!(
        "Normalized {} catalog records from table '{}'",
        summary.total_records,
        table.name()
    );
    if bad_years > 0 {
        log::warn!(
            "{} records have a non-numeric {}, treated as absent",
            bad_years,
            columns.release_year
        );
    }
    if summary.unknown_date_added > 0 {
        log::warn!(
            "{} records have a missing or unparseable date_added",
            summary.unknown_date_added
        );
    }

    Ok(normalized)
}

/// Column indices resolved once per load.
struct ColumnLayout {
    title: usize,
    content_type: usize,
    country: usize,
    release_year: usize,
    date_added: usize,
    rating: usize,
    genres: usize,
    description: usize,
    duration: usize,
}

impl ColumnLayout {
    fn resolve(table: &Table, columns: &CatalogColumns) -> Result<Self> {
        let schema = table.schema();
        let index = |name: &str| {
            schema.get_column_index(name).ok_or_else(|| {
                DashboardError::Schema(format!(
                    "missing required column '{}' in table '{}'",
                    name,
                    table.name()
                ))
            })
        };

        Ok(ColumnLayout {
            title: index(&columns.title)?,
            content_type: index(&columns.content_type)?,
            country: index(&columns.country)?,
            release_year: index(&columns.release_year)?,
            date_added: index(&columns.date_added)?,
            rating: index(&columns.rating)?,
            genres: index(&columns.genres)?,
            description: index(&columns.description)?,
            duration: index(&columns.duration)?,
        })
    }

    /// Read one row. The flag is false when a release year was present but
    /// not numeric.
    fn read_record(&self, table: &Table, row: usize) -> Result<(CatalogRecord, bool)> {
        let value = |col: usize| {
            table
                .get_value_by_index(row, col)
                .map_err(DashboardError::Schema)
        };

        let raw_year = value(self.release_year)?;
        let release_year = year(raw_year);
        let year_ok = release_year.is_some() || text(raw_year).is_none();

        let record = CatalogRecord {
            title: text(value(self.title)?).unwrap_or_default(),
            content_type: text(value(self.content_type)?),
            country: text(value(self.country)?),
            release_year,
            date_added: text(value(self.date_added)?),
            rating: text(value(self.rating)?),
            listed_in: text(value(self.genres)?),
            description: text(value(self.description)?),
            duration: text(value(self.duration)?),
        };

        Ok((record, year_ok))
    }
}

/// Text rendering of a cell of any type; nulls and blank strings are absent.
fn text(value: &ColumnValue) -> Option<String> {
    match value {
        ColumnValue::Null => None,
        ColumnValue::String(s) if s.trim().is_empty() => None,
        ColumnValue::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Integer year from a numeric cell or numeric text (stores with untyped
/// columns hand everything over as text).
fn year(value: &ColumnValue) -> Option<i64> {
    match value {
        ColumnValue::Int64(v) => Some(*v),
        ColumnValue::Float64(v) => integral(*v),
        ColumnValue::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(integral))
        }
        _ => None,
    }
}

fn integral(v: f64) -> Option<i64> {
    if v.is_finite() && v.fract() == 0.0 {
        Some(v as i64)
    } else {
        None
    }
}

/// Number of distinct non-null countries among `records`.
pub(crate) fn distinct_countries<'a>(records: impl Iterator<Item = &'a NormalizedRecord>) -> usize {
    records
        .filter_map(|r| r.record.country.as_deref())
        .collect::<HashSet<_>>()
        .len()
}
