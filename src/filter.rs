/// Catalog filtering
///
/// A `FilterSet` is a conjunction of optional predicates. Applying it to the
/// normalized catalog yields a `FilteredView`: a read-only mapping from view
/// indices to catalog indices, rebuilt from scratch for every filter change.
///
/// # Examples
///
/// ```
/// use catalog_dashboard::{CatalogRecord, FilterSet, NormalizedTable};
///
/// let table = NormalizedTable::from_records(vec![
///     CatalogRecord { title: "Kota Factory".into(), country: Some("India".into()), ..Default::default() },
///     CatalogRecord { title: "Ozark".into(), country: Some("United States".into()), ..Default::default() },
/// ]);
///
/// let view = FilterSet::new().with_country("India").apply(&table);
/// assert_eq!(view.len(), 1);
/// assert_eq!(view.get(0).unwrap().record.title, "Kota Factory");
/// ```

use crate::catalog::{NormalizedRecord, NormalizedTable};
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};

/// Selector value meaning "no constraint".
pub const ALL: &str = "All";

/// User-selected constraints. `None` imposes no constraint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterSet {
    #[serde(rename = "type", alias = "content_type", deserialize_with = "selection")]
    pub content_type: Option<String>,
    #[serde(deserialize_with = "selection")]
    pub country: Option<String>,
    #[serde(deserialize_with = "year_selection")]
    pub release_year: Option<i64>,
    #[serde(deserialize_with = "selection")]
    pub rating: Option<String>,
    /// Case-insensitive title substring
    #[serde(alias = "title", deserialize_with = "selection")]
    pub title_contains: Option<String>,
}

impl FilterSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = parse_selection(content_type.into());
        self
    }

    pub fn with_country(mut self, country: impl Into<String>) -> Self {
        self.country = parse_selection(country.into());
        self
    }

    pub fn with_release_year(mut self, year: i64) -> Self {
        self.release_year = Some(year);
        self
    }

    pub fn with_rating(mut self, rating: impl Into<String>) -> Self {
        self.rating = parse_selection(rating.into());
        self
    }

    pub fn with_title(mut self, needle: impl Into<String>) -> Self {
        self.title_contains = parse_selection(needle.into());
        self
    }

    /// True when no predicate is present.
    pub fn is_unconstrained(&self) -> bool {
        *self == FilterSet::default()
    }

    /// Test a single record against every present predicate.
    pub fn matches(&self, record: &NormalizedRecord) -> bool {
        self.compile().matches(record)
    }

    /// Produce the filtered view of `table` in a single pass.
    pub fn apply<'a>(&self, table: &'a NormalizedTable) -> FilteredView<'a> {
        FilteredView::new(table, self)
    }

    fn compile(&self) -> CompiledFilter<'_> {
        CompiledFilter {
            filters: self,
            title_needle: self.title_contains.as_ref().map(|s| s.to_lowercase()),
        }
    }
}

/// Apply `filters` to `table`.
pub fn apply<'a>(table: &'a NormalizedTable, filters: &FilterSet) -> FilteredView<'a> {
    filters.apply(table)
}

/// Predicates with the title needle lower-cased once per application.
struct CompiledFilter<'f> {
    filters: &'f FilterSet,
    title_needle: Option<String>,
}

impl CompiledFilter<'_> {
    fn matches(&self, r: &NormalizedRecord) -> bool {
        let f = self.filters;
        equals(&f.content_type, &r.record.content_type)
            && equals(&f.country, &r.record.country)
            && equals(&f.rating, &r.record.rating)
            && f.release_year.map_or(true, |y| r.record.release_year == Some(y))
            && self
                .title_needle
                .as_ref()
                .map_or(true, |needle| r.record.title.to_lowercase().contains(needle.as_str()))
    }
}

/// An absent predicate accepts everything; a present one rejects null values.
fn equals(wanted: &Option<String>, actual: &Option<String>) -> bool {
    match wanted {
        None => true,
        Some(w) => actual.as_deref() == Some(w.as_str()),
    }
}

fn parse_selection(value: String) -> Option<String> {
    if value.is_empty() || value == ALL {
        None
    } else {
        Some(value)
    }
}

fn selection<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<String> = Option::deserialize(deserializer)?;
    Ok(value.and_then(parse_selection))
}

#[derive(Deserialize)]
#[serde(untagged)]
enum YearInput {
    Number(i64),
    Text(String),
}

fn year_selection<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<YearInput>::deserialize(deserializer)? {
        None => Ok(None),
        Some(YearInput::Number(year)) => Ok(Some(year)),
        Some(YearInput::Text(text)) => match parse_selection(text.trim().to_string()) {
            None => Ok(None),
            Some(year) => year
                .parse::<i64>()
                .map(Some)
                .map_err(|_| de::Error::custom(format!("invalid release year '{}'", year))),
        },
    }
}

/// The subset of catalog records that satisfy a `FilterSet`.
/// Maintains a mapping from view indices to catalog indices, in catalog order.
#[derive(Debug, Clone)]
pub struct FilteredView<'a> {
    table: &'a NormalizedTable,
    view_to_parent: Vec<usize>,
}

impl<'a> FilteredView<'a> {
    pub fn new(table: &'a NormalizedTable, filters: &FilterSet) -> Self {
        let compiled = filters.compile();
        let view_to_parent: Vec<usize> = table
            .iter()
            .enumerate()
            .filter(|(_, record)| compiled.matches(record))
            .map(|(i, _)| i)
            .collect();

        log::debug!(
            "Filter {:?} kept {} of {} records",
            filters,
            view_to_parent.len(),
            table.len()
        );

        FilteredView {
            table,
            view_to_parent,
        }
    }

    /// A view over every record, unchanged order.
    pub fn all(table: &'a NormalizedTable) -> Self {
        FilteredView {
            table,
            view_to_parent: (0..table.len()).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.view_to_parent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.view_to_parent.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&'a NormalizedRecord> {
        self.view_to_parent
            .get(index)
            .and_then(|&parent| self.table.get(parent))
    }

    pub fn get_parent_index(&self, view_index: usize) -> Option<usize> {
        self.view_to_parent.get(view_index).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a NormalizedRecord> + '_ {
        let table = self.table;
        self.view_to_parent.iter().filter_map(move |&i| table.get(i))
    }

    /// The first `n` matching records in catalog order.
    pub fn preview(&self, n: usize) -> impl Iterator<Item = &'a NormalizedRecord> + '_ {
        self.iter().take(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogRecord;

    fn record(
        title: &str,
        ty: &str,
        country: Option<&str>,
        year: i64,
        rating: Option<&str>,
    ) -> CatalogRecord {
        CatalogRecord {
            title: title.to_string(),
            content_type: Some(ty.to_string()),
            country: country.map(str::to_string),
            release_year: Some(year),
            rating: rating.map(str::to_string),
            ..Default::default()
        }
    }

    fn catalog() -> NormalizedTable {
        NormalizedTable::from_records(vec![
            record("Sacred Games", "TV Show", Some("India"), 2019, Some("TV-MA")),
            record("Jaws", "Movie", Some("United States"), 1975, Some("PG")),
            record("Delhi Crime", "TV Show", Some("India"), 2019, Some("TV-MA")),
            record("Untitled", "Movie", None, 2019, None),
        ])
    }

    fn titles(view: &FilteredView<'_>) -> Vec<String> {
        view.iter().map(|r| r.record.title.clone()).collect()
    }

    #[test]
    fn test_no_constraints_returns_all_in_order() {
        let table = catalog();
        let view = FilterSet::new().apply(&table);
        assert_eq!(view.len(), 4);
        assert_eq!(titles(&view), vec!["Sacred Games", "Jaws", "Delhi Crime", "Untitled"]);
        assert!(FilterSet::new().is_unconstrained());
    }

    #[test]
    fn test_each_predicate() {
        let table = catalog();

        assert_eq!(titles(&FilterSet::new().with_type("Movie").apply(&table)), vec!["Jaws", "Untitled"]);
        assert_eq!(
            titles(&FilterSet::new().with_country("India").apply(&table)),
            vec!["Sacred Games", "Delhi Crime"]
        );
        assert_eq!(FilterSet::new().with_release_year(2019).apply(&table).len(), 3);
        assert_eq!(titles(&FilterSet::new().with_rating("PG").apply(&table)), vec!["Jaws"]);
        assert_eq!(titles(&FilterSet::new().with_title("CRIME").apply(&table)), vec!["Delhi Crime"]);
    }

    #[test]
    fn test_predicates_compose_as_and() {
        let table = catalog();
        let filters = FilterSet::new().with_type("TV Show").with_release_year(2019).with_title("games");
        let view = filters.apply(&table);

        assert_eq!(titles(&view), vec!["Sacred Games"]);
        assert_eq!(view.get_parent_index(0), Some(0));

        // Survivors satisfy every predicate, the rest fail at least one
        for (i, r) in table.iter().enumerate() {
            let kept = (0..view.len()).any(|v| view.get_parent_index(v) == Some(i));
            assert_eq!(kept, filters.matches(r));
        }
    }

    #[test]
    fn test_all_sentinel_is_no_constraint() {
        let table = catalog();
        let filters = FilterSet::new().with_type(ALL).with_country("").with_rating("All");
        assert!(filters.is_unconstrained());
        assert_eq!(filters.apply(&table).len(), 4);
    }

    #[test]
    fn test_present_predicate_rejects_nulls() {
        let table = catalog();
        let view = FilterSet::new().with_type("Movie").with_country("United States").apply(&table);
        assert_eq!(titles(&view), vec!["Jaws"]);
        assert!(view.get(1).is_none());
    }

    #[test]
    fn test_empty_result_is_valid() {
        let table = catalog();
        let view = apply(&table, &FilterSet::new().with_release_year(9999));
        assert!(view.is_empty());
        assert_eq!(view.iter().count(), 0);
    }

    #[test]
    fn test_preview_takes_leading_matches() {
        let table = catalog();
        let view = FilterSet::new().with_release_year(2019).apply(&table);
        let preview: Vec<&str> = view.preview(2).map(|r| r.record.title.as_str()).collect();
        assert_eq!(preview, vec!["Sacred Games", "Delhi Crime"]);
        assert_eq!(view.preview(10).count(), 3);
        assert_eq!(view.preview(0).count(), 0);
    }

    #[test]
    fn test_view_all() {
        let table = catalog();
        assert_eq!(FilteredView::all(&table).len(), table.len());
    }

    #[test]
    fn test_deserialize_from_json() {
        let filters: FilterSet = serde_json::from_str(
            r#"{"type": "Movie", "country": "All", "release_year": "2019", "title": ""}"#,
        )
        .unwrap();
        assert_eq!(filters, FilterSet::new().with_type("Movie").with_release_year(2019));

        let filters: FilterSet = serde_json::from_str(r#"{"release_year": 1975, "rating": null}"#).unwrap();
        assert_eq!(filters.release_year, Some(1975));
        assert_eq!(filters.rating, None);

        let filters: FilterSet = serde_json::from_str(r#"{"release_year": "All"}"#).unwrap();
        assert!(filters.is_unconstrained());

        assert!(serde_json::from_str::<FilterSet>(r#"{"release_year": "soon"}"#).is_err());
    }
}
