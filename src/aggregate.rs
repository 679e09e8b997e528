/// Dashboard charts
///
/// Independent group-and-count summaries over a `FilteredView`. Each function
/// is pure and reads only the view, so they can run in any order. An empty
/// view yields empty results.
///
/// Null keys are not counted: a record with no rating contributes nothing to
/// the rating distribution, and so on.

use crate::catalog::month_name;
use crate::classify::ContentCategory;
use crate::filter::FilteredView;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::hash::Hash;

/// Row cap for the top-N aggregations.
pub const TOP_N: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CountRow<K> {
    pub key: K,
    pub count: usize,
}

/// A small (key, count) result table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CountTable<K> {
    pub rows: Vec<CountRow<K>>,
}

impl<K: PartialEq> CountTable<K> {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Count for `key`, zero when absent.
    pub fn count_of(&self, key: &K) -> usize {
        self.rows.iter().find(|r| &r.key == key).map_or(0, |r| r.count)
    }

    pub fn total(&self) -> usize {
        self.rows.iter().map(|r| r.count).sum()
    }
}

impl<K: Clone> CountTable<K> {
    pub fn to_pairs(&self) -> Vec<(K, usize)> {
        self.rows.iter().map(|r| (r.key.clone(), r.count)).collect()
    }
}

/// Counter that remembers the order in which keys were first seen.
struct OrderedCounter<K> {
    index: HashMap<K, usize>,
    entries: Vec<CountRow<K>>,
}

impl<K: Eq + Hash + Clone> OrderedCounter<K> {
    fn new() -> Self {
        OrderedCounter {
            index: HashMap::new(),
            entries: Vec::new(),
        }
    }

    fn add(&mut self, key: &K) {
        match self.index.get(key) {
            Some(&i) => self.entries[i].count += 1,
            None => {
                self.index.insert(key.clone(), self.entries.len());
                self.entries.push(CountRow { key: key.clone(), count: 1 });
            }
        }
    }

    /// Count-descending; the stable sort keeps first-seen order among ties.
    fn top(mut self, n: usize) -> CountTable<K> {
        self.entries.sort_by(|a, b| b.count.cmp(&a.count));
        self.entries.truncate(n);
        CountTable { rows: self.entries }
    }
}

/// Count-descending with ties broken by key, so the result does not depend
/// on row order.
fn by_count_then_key(counts: BTreeMap<String, usize>) -> CountTable<String> {
    let mut rows: Vec<CountRow<String>> = counts
        .into_iter()
        .map(|(key, count)| CountRow { key, count })
        .collect();
    // BTreeMap iteration is key-ascending, the stable sort keeps it among ties
    rows.sort_by(|a, b| b.count.cmp(&a.count));
    CountTable { rows }
}

fn count_keys<'a>(keys: impl Iterator<Item = &'a str>) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for key in keys {
        *counts.entry(key.to_string()).or_insert(0) += 1;
    }
    counts
}

/// Records per content type.
pub fn type_distribution(view: &FilteredView<'_>) -> CountTable<String> {
    by_count_then_key(count_keys(view.iter().filter_map(|r| r.record.content_type.as_deref())))
}

/// Records per release year, ascending by year.
pub fn year_trend(view: &FilteredView<'_>) -> CountTable<i64> {
    let mut counts: BTreeMap<i64, usize> = BTreeMap::new();
    for year in view.iter().filter_map(|r| r.record.release_year) {
        *counts.entry(year).or_insert(0) += 1;
    }
    CountTable {
        rows: counts.into_iter().map(|(key, count)| CountRow { key, count }).collect(),
    }
}

/// The `n` most frequent genres across every record's genre list.
pub fn top_genres(view: &FilteredView<'_>, n: usize) -> CountTable<String> {
    let mut counter = OrderedCounter::new();
    for genre in view.iter().flat_map(|r| r.genre_list.iter()) {
        counter.add(genre);
    }
    counter.top(n)
}

/// Records per rating, most frequent first.
pub fn rating_distribution(view: &FilteredView<'_>) -> CountTable<String> {
    by_count_then_key(count_keys(view.iter().filter_map(|r| r.record.rating.as_deref())))
}

/// The `n` most frequent raw country strings. Multi-country values such as
/// "India, United States" are their own key.
pub fn top_countries(view: &FilteredView<'_>, n: usize) -> CountTable<String> {
    let mut counter = OrderedCounter::new();
    for country in view.iter().filter_map(|r| r.record.country.as_ref()) {
        counter.add(country);
    }
    counter.top(n)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthCount {
    pub month: u32,
    pub month_name: &'static str,
    pub count: usize,
}

/// One line of the monthly-additions chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct YearSeries {
    pub year: i32,
    pub points: Vec<MonthCount>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MonthlyAdditions {
    pub series: Vec<YearSeries>,
}

impl MonthlyAdditions {
    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// Flat (year, month name, count) rows.
    pub fn rows(&self) -> Vec<(i32, &'static str, usize)> {
        self.series
            .iter()
            .flat_map(|s| s.points.iter().map(move |p| (s.year, p.month_name, p.count)))
            .collect()
    }
}

/// Records per (year added, month added), grouped into one series per year.
/// Years ascend and months follow the calendar. Records whose date-added is
/// unknown are excluded.
pub fn monthly_additions(view: &FilteredView<'_>) -> MonthlyAdditions {
    let mut counts: BTreeMap<i32, BTreeMap<u32, usize>> = BTreeMap::new();
    for r in view.iter() {
        if let (Some(year), Some(month)) = (r.year_added, r.month_added) {
            *counts.entry(year).or_default().entry(month).or_insert(0) += 1;
        }
    }

    MonthlyAdditions {
        series: counts
            .into_iter()
            .map(|(year, months)| YearSeries {
                year,
                points: months
                    .into_iter()
                    .map(|(month, count)| MonthCount {
                        month,
                        month_name: month_name(month),
                        count,
                    })
                    .collect(),
            })
            .collect(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeCategoryCount {
    #[serde(rename = "type")]
    pub content_type: String,
    pub category: ContentCategory,
    pub count: usize,
}

/// Records per (content type, content category), sorted by type then category.
pub fn category_by_type(view: &FilteredView<'_>) -> Vec<TypeCategoryCount> {
    let mut counts: BTreeMap<(String, ContentCategory), usize> = BTreeMap::new();
    for r in view.iter() {
        if let Some(ty) = &r.record.content_type {
            *counts.entry((ty.clone(), r.content_category)).or_insert(0) += 1;
        }
    }
    counts
        .into_iter()
        .map(|((content_type, category), count)| TypeCategoryCount {
            content_type,
            category,
            count,
        })
        .collect()
}

/// A 2D count matrix: `counts[row][column]`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CrossTab {
    pub rows: Vec<String>,
    pub columns: Vec<String>,
    pub counts: Vec<Vec<usize>>,
}

impl CrossTab {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, row: &str, column: &str) -> usize {
        let r = self.rows.iter().position(|x| x == row);
        let c = self.columns.iter().position(|x| x == column);
        match (r, c) {
            (Some(r), Some(c)) => self.counts[r][c],
            _ => 0,
        }
    }
}

/// Ratings as rows, content types as columns, both ascending. Records missing
/// either value are left out.
pub fn rating_by_type(view: &FilteredView<'_>) -> CrossTab {
    let pairs: Vec<(&str, &str)> = view
        .iter()
        .filter_map(|r| Some((r.record.rating.as_deref()?, r.record.content_type.as_deref()?)))
        .collect();

    let rows: Vec<String> = pairs
        .iter()
        .map(|(rating, _)| *rating)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect();
    let columns: Vec<String> = pairs
        .iter()
        .map(|(_, ty)| *ty)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect();

    let mut counts = vec![vec![0usize; columns.len()]; rows.len()];
    for (rating, ty) in pairs {
        // Both keys were collected from `pairs`, so the lookups always succeed
        if let (Ok(r), Ok(c)) = (
            rows.binary_search_by(|x| x.as_str().cmp(rating)),
            columns.binary_search_by(|x| x.as_str().cmp(ty)),
        ) {
            counts[r][c] += 1;
        }
    }

    CrossTab { rows, columns, counts }
}

/// Every dashboard aggregation for one filtered view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AggregationSet {
    pub type_distribution: CountTable<String>,
    pub year_trend: CountTable<i64>,
    pub top_genres: CountTable<String>,
    pub rating_distribution: CountTable<String>,
    pub top_countries: CountTable<String>,
    pub monthly_additions: MonthlyAdditions,
    pub category_by_type: Vec<TypeCategoryCount>,
    pub rating_by_type: CrossTab,
}

impl AggregationSet {
    pub fn compute(view: &FilteredView<'_>) -> Self {
        AggregationSet {
            type_distribution: type_distribution(view),
            year_trend: year_trend(view),
            top_genres: top_genres(view, TOP_N),
            rating_distribution: rating_distribution(view),
            top_countries: top_countries(view, TOP_N),
            monthly_additions: monthly_additions(view),
            category_by_type: category_by_type(view),
            rating_by_type: rating_by_type(view),
        }
    }

    /// True when every result is empty.
    pub fn is_empty(&self) -> bool {
        self.type_distribution.is_empty()
            && self.year_trend.is_empty()
            && self.top_genres.is_empty()
            && self.rating_distribution.is_empty()
            && self.top_countries.is_empty()
            && self.monthly_additions.is_empty()
            && self.category_by_type.is_empty()
            && self.rating_by_type.is_empty()
    }
}
