use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use catalog_dashboard::*;

const TYPES: [&str; 2] = ["Movie", "TV Show"];
const COUNTRIES: [&str; 5] = ["United States", "India", "United Kingdom", "Japan", "South Korea"];
const RATINGS: [&str; 4] = ["TV-MA", "TV-14", "PG-13", "R"];
const GENRES: [&str; 6] = [
    "Dramas",
    "Comedies",
    "International Movies",
    "Documentaries",
    "Action & Adventure",
    "Crime TV Shows",
];
const DESCRIPTIONS: [&str; 3] = [
    "A family road trip full of love and fun",
    "A detective hunts a killer after a brutal murder",
    "A chef opens a restaurant",
];
const MONTHS: [&str; 12] = [
    "January", "February", "March", "April", "May", "June", "July", "August", "September",
    "October", "November", "December",
];

fn generate_catalog(size: usize) -> Table {
    let columns = [
        "title", "type", "country", "release_year", "date_added", "rating", "listed_in", "description",
        "duration",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();

    let rows = (0..size)
        .map(|i| {
            let genres = format!("{}, {}", GENRES[i % GENRES.len()], GENRES[(i / 3) % GENRES.len()]);
            vec![
                ColumnValue::String(format!("Title {}", i)),
                ColumnValue::String(TYPES[i % TYPES.len()].to_string()),
                ColumnValue::String(COUNTRIES[i % COUNTRIES.len()].to_string()),
                ColumnValue::Int64(1990 + (i % 32) as i64),
                if i % 17 == 0 {
                    ColumnValue::Null
                } else {
                    ColumnValue::String(format!("{} {}, {}", MONTHS[i % 12], 1 + i % 28, 2015 + i % 7))
                },
                ColumnValue::String(RATINGS[i % RATINGS.len()].to_string()),
                ColumnValue::String(genres),
                ColumnValue::String(DESCRIPTIONS[i % DESCRIPTIONS.len()].to_string()),
                ColumnValue::String(format!("{} min", 80 + i % 60)),
            ]
        })
        .collect();

    Table::from_rows("netflix", columns, rows).unwrap()
}

fn bench_normalize(c: &mut Criterion) {
    let mut group = c.benchmark_group("normalize");

    for size in [1000, 10000].iter() {
        let table = generate_catalog(*size);
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| normalize(black_box(&table)).unwrap());
        });
    }
    group.finish();
}

fn bench_filter(c: &mut Criterion) {
    let mut group = c.benchmark_group("filter");
    let filters = FilterSet::new().with_country("India").with_title("1");

    for size in [1000, 10000].iter() {
        let catalog = normalize(&generate_catalog(*size)).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| black_box(&filters).apply(&catalog).len());
        });
    }
    group.finish();
}

fn bench_aggregate(c: &mut Criterion) {
    let mut group = c.benchmark_group("aggregate");

    for size in [1000, 10000].iter() {
        let catalog = normalize(&generate_catalog(*size)).unwrap();
        let view = FilteredView::all(&catalog);
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| AggregationSet::compute(black_box(&view)));
        });
    }
    group.finish();
}

fn bench_classify(c: &mut Criterion) {
    c.bench_function("classify", |b| {
        b.iter(|| {
            for d in DESCRIPTIONS.iter() {
                black_box(classify(Some(d)));
            }
        });
    });
}

criterion_group!(benches, bench_normalize, bench_filter, bench_aggregate, bench_classify);

criterion_main!(benches);
