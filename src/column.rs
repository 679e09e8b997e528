/// Column Implementation
///
/// A Column is an array-like random-access data container indexed by integer.
/// Each Column has a type specifying the type of every value stored, and may
/// hold nulls when declared nullable.

use serde_json::Value as JsonValue;
use std::fmt::{self, Debug, Display};

/// Column data types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Int64,
    Float64,
    String,
    Bool,
}

/// Column value enum to support multiple types
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnValue {
    Int64(i64),
    Float64(f64),
    String(String),
    Bool(bool),
    Null,
}

impl ColumnValue {
    pub fn is_null(&self) -> bool {
        matches!(self, ColumnValue::Null)
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ColumnValue::Int64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ColumnValue::Float64(v) => Some(*v),
            ColumnValue::Int64(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_string(&self) -> Option<&str> {
        match self {
            ColumnValue::String(v) => Some(v),
            _ => None,
        }
    }

    /// The type this value would be stored as, or None for null.
    pub fn value_type(&self) -> Option<ColumnType> {
        match self {
            ColumnValue::Int64(_) => Some(ColumnType::Int64),
            ColumnValue::Float64(_) => Some(ColumnType::Float64),
            ColumnValue::String(_) => Some(ColumnType::String),
            ColumnValue::Bool(_) => Some(ColumnType::Bool),
            ColumnValue::Null => None,
        }
    }

    /// Convert to JSON. Non-finite floats have no JSON form and become null.
    pub fn to_json(&self) -> JsonValue {
        match self {
            ColumnValue::Int64(v) => JsonValue::Number((*v).into()),
            ColumnValue::Float64(v) => serde_json::Number::from_f64(*v)
                .map(JsonValue::Number)
                .unwrap_or(JsonValue::Null),
            ColumnValue::String(v) => JsonValue::String(v.clone()),
            ColumnValue::Bool(v) => JsonValue::Bool(*v),
            ColumnValue::Null => JsonValue::Null,
        }
    }

    /// Coerce a value into the given column type. Anything converts to String;
    /// integers widen to Float64. Returns None when no lossless conversion exists.
    pub(crate) fn coerce(self, target: ColumnType) -> Option<ColumnValue> {
        match (self, target) {
            (ColumnValue::Null, _) => Some(ColumnValue::Null),
            (ColumnValue::Int64(v), ColumnType::Float64) => Some(ColumnValue::Float64(v as f64)),
            (ColumnValue::String(s), ColumnType::String) => Some(ColumnValue::String(s)),
            (other, ColumnType::String) => Some(ColumnValue::String(other.to_string())),
            (v, t) if v.value_type() == Some(t) => Some(v),
            _ => None,
        }
    }
}

impl Display for ColumnValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnValue::Int64(v) => write!(f, "{}", v),
            ColumnValue::Float64(v) => write!(f, "{}", v),
            ColumnValue::String(v) => write!(f, "{}", v),
            ColumnValue::Bool(v) => write!(f, "{}", v),
            ColumnValue::Null => Ok(()),
        }
    }
}

/// A named, typed column of values.
/// Handles type checking and nullable values.
pub struct Column {
    name: String,
    column_type: ColumnType,
    nullable: bool,
    values: Vec<ColumnValue>,
}

impl Column {
    pub fn new(name: String, column_type: ColumnType, nullable: bool) -> Self {
        Column {
            name,
            column_type,
            nullable,
            values: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Validate value against the column's type and nullability
    fn validate_value(&self, value: &ColumnValue) -> Result<(), String> {
        if value.is_null() {
            if !self.nullable {
                return Err(format!("Column '{}' is not nullable", self.name));
            }
            return Ok(());
        }

        if value.value_type() != Some(self.column_type) {
            return Err(format!(
                "Type mismatch in column '{}': expected {:?}, got {:?}",
                self.name, self.column_type, value
            ));
        }
        Ok(())
    }

    pub fn get(&self, index: usize) -> Result<&ColumnValue, String> {
        self.values
            .get(index)
            .ok_or_else(|| format!("Index {} out of range [0, {})", index, self.len()))
    }

    pub fn append(&mut self, value: ColumnValue) -> Result<(), String> {
        self.validate_value(&value)?;
        self.values.push(value);
        Ok(())
    }
}

impl Debug for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Column {{ name: '{}', type: {:?}, nullable: {}, len: {} }}",
            self.name,
            self.column_type,
            self.nullable,
            self.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_basic() {
        let mut col = Column::new("test".to_string(), ColumnType::Int64, false);
        col.append(ColumnValue::Int64(10)).unwrap();
        col.append(ColumnValue::Int64(20)).unwrap();
        col.append(ColumnValue::Int64(30)).unwrap();

        assert_eq!(col.len(), 3);
        assert_eq!(col.get(0).unwrap().as_i64(), Some(10));
        assert_eq!(col.get(2).unwrap().as_i64(), Some(30));
        assert!(col.get(3).is_err());
    }

    #[test]
    fn test_column_nullable() {
        let mut col = Column::new("test".to_string(), ColumnType::String, true);
        col.append(ColumnValue::String("a".to_string())).unwrap();
        col.append(ColumnValue::Null).unwrap();

        assert!(col.get(1).unwrap().is_null());
        assert!(!col.get(0).unwrap().is_null());
        assert_eq!(col.get(0).unwrap().as_string(), Some("a"));
    }

    #[test]
    fn test_column_rejects_bad_values() {
        let mut col = Column::new("year".to_string(), ColumnType::Int64, false);
        assert!(col.append(ColumnValue::Null).is_err());
        assert!(col.append(ColumnValue::String("2020".to_string())).is_err());
        assert!(col.is_empty());
    }

    #[test]
    fn test_value_coercion() {
        assert_eq!(
            ColumnValue::Int64(3).coerce(ColumnType::Float64),
            Some(ColumnValue::Float64(3.0))
        );
        assert_eq!(
            ColumnValue::Int64(2020).coerce(ColumnType::String),
            Some(ColumnValue::String("2020".to_string()))
        );
        assert_eq!(ColumnValue::Float64(1.5).coerce(ColumnType::Int64), None);
        assert_eq!(ColumnValue::Null.coerce(ColumnType::Bool), Some(ColumnValue::Null));
    }

    #[test]
    fn test_value_to_json() {
        assert_eq!(ColumnValue::Int64(7).to_json(), serde_json::json!(7));
        assert_eq!(ColumnValue::Float64(f64::NAN).to_json(), JsonValue::Null);
        assert_eq!(ColumnValue::Null.to_json(), JsonValue::Null);
    }
}
