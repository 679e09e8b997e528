/// Table Implementation
///
/// A Table is a collection of typed columns with a schema. It is the uniform
/// in-memory shape every data source returns, whether the rows came from a
/// SQL store or a CSV export.
///
/// # Examples
///
/// ```
/// use catalog_dashboard::{ColumnType, ColumnValue, Table};
///
/// let table = Table::from_rows(
///     "titles",
///     vec!["title".to_string(), "release_year".to_string()],
///     vec![vec![
///         ColumnValue::String("Dick Johnson Is Dead".to_string()),
///         ColumnValue::Int64(2020),
///     ]],
/// )
/// .unwrap();
///
/// assert_eq!(table.len(), 1);
/// assert_eq!(table.schema().get_column_type("release_year"), Some(ColumnType::Int64));
/// assert_eq!(table.get_value(0, "release_year").unwrap().as_i64(), Some(2020));
/// ```

use crate::column::{Column, ColumnType, ColumnValue};

/// Schema definition with column names and types.
///
/// A schema defines the structure of a table, specifying the name, type,
/// and nullability of each column.
#[derive(Debug, Clone)]
pub struct Schema {
    columns: Vec<(String, ColumnType, bool)>, // (name, type, nullable)
}

impl Schema {
    /// Creates a new schema from (column_name, column_type, is_nullable) tuples.
    pub fn new(columns: Vec<(String, ColumnType, bool)>) -> Self {
        Schema { columns }
    }

    /// Returns a list of all column names.
    pub fn get_column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|(name, _, _)| name.as_str()).collect()
    }

    /// Returns the index of a column by name, or None if not found.
    pub fn get_column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|(n, _, _)| n == name)
    }

    pub fn get_column_type(&self, name: &str) -> Option<ColumnType> {
        self.columns.iter()
            .find(|(n, _, _)| n == name)
            .map(|(_, ty, _)| *ty)
    }
}

/// Root table owning its data.
pub struct Table {
    name: String,
    schema: Schema,
    columns: Vec<Column>,
    row_count: usize,
}

impl Table {
    pub fn new(name: String, schema: Schema) -> Self {
        let columns = schema
            .columns
            .iter()
            .map(|(col_name, col_type, nullable)| Column::new(col_name.clone(), *col_type, *nullable))
            .collect();

        Table {
            name,
            schema,
            columns,
            row_count: 0,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.schema.get_column_names()
    }

    pub fn len(&self) -> usize {
        self.row_count
    }

    pub fn is_empty(&self) -> bool {
        self.row_count == 0
    }

    pub fn get_value(&self, row: usize, column: &str) -> Result<&ColumnValue, String> {
        let col_idx = self.schema
            .get_column_index(column)
            .ok_or_else(|| format!("Column '{}' not found", column))?;

        self.columns[col_idx].get(row)
    }

    /// Get a value by column index. Used in loops where the column lookup is
    /// done once upfront.
    #[inline]
    pub fn get_value_by_index(&self, row: usize, col_idx: usize) -> Result<&ColumnValue, String> {
        self.columns.get(col_idx)
            .ok_or_else(|| format!("Column index {} out of range", col_idx))?
            .get(row)
    }

    /// Build a table from positional rows, inferring each column's type from
    /// all of its non-null values.
    ///
    /// - all integers → INT64
    /// - integers mixed with floats → FLOAT64
    /// - all booleans → BOOL
    /// - anything else (including all-null) → STRING, values rendered as text
    ///
    /// All columns are created as nullable.
    pub fn from_rows(
        name: &str,
        column_names: Vec<String>,
        rows: Vec<Vec<ColumnValue>>,
    ) -> Result<Table, String> {
        for (row_idx, row) in rows.iter().enumerate() {
            if row.len() != column_names.len() {
                return Err(format!(
                    "Row {}: expected {} values, got {}",
                    row_idx,
                    column_names.len(),
                    row.len()
                ));
            }
        }

        let types: Vec<ColumnType> = (0..column_names.len())
            .map(|i| unify_types(rows.iter().filter_map(|r| r[i].value_type())))
            .collect();

        let schema = Schema::new(
            column_names
                .iter()
                .zip(types.iter())
                .map(|(n, t)| (n.clone(), *t, true))
                .collect(),
        );
        let mut table = Table::new(name.to_string(), schema);

        for row in rows {
            for (i, value) in row.into_iter().enumerate() {
                let value = value
                    .coerce(types[i])
                    .ok_or_else(|| format!("Cannot store value in column '{}'", column_names[i]))?;
                table.columns[i].append(value)?;
            }
            table.row_count += 1;
        }

        Ok(table)
    }

    /// Create a table from a CSV string.
    ///
    /// The first line is the header row containing column names. Empty fields
    /// become NULL. Column types are inferred over the whole column.
    ///
    /// ```
    /// use catalog_dashboard::Table;
    ///
    /// let csv = "title,release_year\n\"Kota Factory\",2019\nBlood & Water,2021";
    /// let table = Table::from_csv("netflix", csv).unwrap();
    /// assert_eq!(table.len(), 2);
    /// assert_eq!(table.get_value(1, "release_year").unwrap().as_i64(), Some(2021));
    /// ```
    pub fn from_csv(name: &str, csv: &str) -> Result<Table, String> {
        let mut all_rows = parse_csv_rows(csv);

        if all_rows.is_empty() {
            return Err("CSV is empty".to_string());
        }

        let column_names: Vec<String> = all_rows
            .remove(0)
            .into_iter()
            .map(|h| h.trim().trim_start_matches('\u{feff}').to_string())
            .collect();

        if column_names.iter().all(|c| c.is_empty()) {
            return Err("CSV header is empty".to_string());
        }

        let rows: Vec<Vec<String>> = all_rows
            .into_iter()
            .filter(|row| !row.iter().all(|f| f.trim().is_empty()))
            .collect();

        for (row_idx, row) in rows.iter().enumerate() {
            if row.len() != column_names.len() {
                return Err(format!(
                    "Column count mismatch on data row {}: header has {}, row has {}",
                    row_idx + 1,
                    column_names.len(),
                    row.len()
                ));
            }
        }

        let types: Vec<ColumnType> = (0..column_names.len())
            .map(|i| unify_types(rows.iter().filter_map(|r| infer_type_from_csv_value(&r[i]))))
            .collect();

        let values = rows
            .iter()
            .map(|row| {
                row.iter()
                    .zip(types.iter())
                    .map(|(v, t)| parse_csv_value(v, *t))
                    .collect::<Result<Vec<_>, String>>()
            })
            .collect::<Result<Vec<_>, String>>()?;

        Table::from_rows(name, column_names, values)
    }

}

/// Pick a storage type able to hold every observed value type.
fn unify_types(observed: impl Iterator<Item = ColumnType>) -> ColumnType {
    let mut unified: Option<ColumnType> = None;
    for ty in observed {
        unified = Some(match (unified, ty) {
            (None, t) => t,
            (Some(a), b) if a == b => a,
            (Some(ColumnType::Int64), ColumnType::Float64)
            | (Some(ColumnType::Float64), ColumnType::Int64) => ColumnType::Float64,
            _ => return ColumnType::String,
        });
    }
    unified.unwrap_or(ColumnType::String)
}

/// Parse a CSV string into rows, handling quoted fields with embedded newlines
fn parse_csv_rows(csv: &str) -> Vec<Vec<String>> {
    let mut rows = Vec::new();
    let mut current_row = Vec::new();
    let mut current_field = String::new();
    let mut in_quotes = false;
    let mut chars = csv.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes => {
                // Doubled quote is an escaped quote
                if chars.peek() == Some(&'"') {
                    chars.next();
                    current_field.push('"');
                } else {
                    in_quotes = false;
                }
            }
            '"' => {
                in_quotes = true;
            }
            ',' if !in_quotes => {
                current_row.push(std::mem::take(&mut current_field));
            }
            '\n' if !in_quotes => {
                current_row.push(std::mem::take(&mut current_field));
                rows.push(std::mem::take(&mut current_row));
            }
            '\r' if !in_quotes => {
                // Skip \r, will be followed by \n
            }
            _ => {
                current_field.push(c);
            }
        }
    }

    if !current_field.is_empty() || !current_row.is_empty() {
        current_row.push(current_field);
        rows.push(current_row);
    }

    rows
}

/// Infer the type of a single CSV value; None for empty fields
fn infer_type_from_csv_value(value: &str) -> Option<ColumnType> {
    let trimmed = value.trim();

    if trimmed.is_empty() {
        return None;
    }

    if trimmed.eq_ignore_ascii_case("true") || trimmed.eq_ignore_ascii_case("false") {
        return Some(ColumnType::Bool);
    }

    if trimmed.parse::<i64>().is_ok() {
        return Some(ColumnType::Int64);
    }

    if trimmed.parse::<f64>().is_ok() {
        return Some(ColumnType::Float64);
    }

    Some(ColumnType::String)
}

/// Parse a CSV value into a ColumnValue based on the inferred column type
fn parse_csv_value(value: &str, col_type: ColumnType) -> Result<ColumnValue, String> {
    let trimmed = value.trim();

    if trimmed.is_empty() {
        return Ok(ColumnValue::Null);
    }

    match col_type {
        ColumnType::Int64 => trimmed
            .parse::<i64>()
            .map(ColumnValue::Int64)
            .map_err(|_| format!("Cannot parse '{}' as INT64", trimmed)),
        ColumnType::Float64 => trimmed
            .parse::<f64>()
            .map(ColumnValue::Float64)
            .map_err(|_| format!("Cannot parse '{}' as FLOAT64", trimmed)),
        ColumnType::Bool => Ok(ColumnValue::Bool(trimmed.eq_ignore_ascii_case("true"))),
        ColumnType::String => Ok(ColumnValue::String(trimmed.to_string())),
    }
}

impl std::fmt::Debug for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Table {{ name: '{}', columns: {}, rows: {} }}",
            self.name,
            self.columns.len(),
            self.row_count
        )
    }
}
