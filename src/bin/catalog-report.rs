/// Catalog Report
///
/// One-shot command-line view of the dashboard: loads the catalog, applies
/// the filters given as flags and prints the snapshot as JSON.
///
/// ```bash
/// catalog-report --database netflix.db --country India --type Movie --pretty
/// catalog-report --database netflix.db --query "SELECT rating, COUNT(*) FROM netflix GROUP BY rating"
/// ```

use catalog_dashboard::{Config, DashboardContext, DashboardError, FilterSet, SourceKind};
use clap::Parser;
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "catalog-report")]
#[command(about = "Filter the media catalog and print the dashboard as JSON")]
struct Args {
    /// Kind of store holding the catalog
    #[arg(long, value_enum, env = "CATALOG_SOURCE", default_value = "sqlite")]
    source: SourceKind,

    /// Database file (sqlite) or export file (csv)
    #[arg(long, env = "CATALOG_DATABASE", value_name = "PATH")]
    database: PathBuf,

    #[arg(long, env = "CATALOG_TABLE", default_value = "netflix")]
    table: String,

    /// Query timeout (seconds)
    #[arg(long, env = "CATALOG_QUERY_TIMEOUT_SECS", default_value = "30")]
    timeout_secs: u64,

    #[arg(long, env = "CATALOG_PREVIEW_ROWS", default_value = "10")]
    preview_rows: usize,

    /// Content type, e.g. "Movie"
    #[arg(long = "type", value_name = "TYPE")]
    content_type: Option<String>,

    #[arg(long)]
    country: Option<String>,

    #[arg(long)]
    release_year: Option<i64>,

    #[arg(long)]
    rating: Option<String>,

    /// Case-insensitive title substring
    #[arg(long)]
    title: Option<String>,

    /// Print the selector values instead of a snapshot
    #[arg(long, conflicts_with = "query")]
    options: bool,

    /// Run an ad-hoc read-only statement and print its rows
    #[arg(long, value_name = "SQL")]
    query: Option<String>,

    /// Pretty-print JSON output
    #[arg(long)]
    pretty: bool,
}

impl Args {
    fn config(&self) -> Config {
        let mut config = Config::new(self.source, &self.database);
        config.table = self.table.clone();
        config.query_timeout = Duration::from_secs(self.timeout_secs);
        config.preview_rows = self.preview_rows;
        config
    }

    fn filters(&self) -> FilterSet {
        let mut filters = FilterSet::new();
        if let Some(t) = &self.content_type {
            filters = filters.with_type(t.as_str());
        }
        if let Some(c) = &self.country {
            filters = filters.with_country(c.as_str());
        }
        if let Some(y) = self.release_year {
            filters = filters.with_release_year(y);
        }
        if let Some(r) = &self.rating {
            filters = filters.with_rating(r.as_str());
        }
        if let Some(t) = &self.title {
            filters = filters.with_title(t.as_str());
        }
        filters
    }
}

fn print_json<T: Serialize>(value: &T, pretty: bool) -> Result<(), DashboardError> {
    let text = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
    .map_err(|e| DashboardError::Query(format!("cannot serialize output: {}", e)))?;
    println!("{}", text);
    Ok(())
}

fn run(args: &Args) -> Result<(), DashboardError> {
    let dashboard = DashboardContext::from_config(&args.config())?;

    if let Some(sql) = &args.query {
        return print_json(&dashboard.run_query(sql)?, args.pretty);
    }
    if args.options {
        return print_json(&dashboard.filter_options(), args.pretty);
    }

    print_json(&dashboard.snapshot(&args.filters()), args.pretty)
}

fn main() {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let args = Args::parse();

    if let Err(e) = run(&args) {
        log::error!("{}", e);
        // Configuration mistakes exit 2, store and data failures exit 1
        std::process::exit(if e.is_fatal_for_load() { 1 } else { 2 });
    }
}
