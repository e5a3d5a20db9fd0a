//! In-memory row-oriented dataset loaded from a CSV path.
//!
//! A `Dataset` lives for the duration of a single tool call: each tabular
//! tool loads it fresh, operates on it, and drops it. Column types are
//! inferred from content: a column is integer if every non-missing value
//! parses as `i64`, float if every non-missing value parses as `f64`, and
//! string otherwise. Empty fields are missing values.

use std::path::Path;

use serde_json::{Map, Number, Value};

use crate::domains::tools::error::ToolError;

/// A single cell value.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    /// Missing value (empty CSV field).
    Null,
    Int(i64),
    Float(f64),
    Str(String),
}

impl Cell {
    /// Whether this cell holds a value.
    pub fn is_present(&self) -> bool {
        !matches!(self, Cell::Null)
    }

    /// Numeric view of the cell, if it is numeric.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Int(v) => Some(*v as f64),
            Cell::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// Textual rendering used for group keys and substring matching.
    /// Missing cells have no rendering.
    pub fn display(&self) -> Option<String> {
        match self {
            Cell::Null => None,
            Cell::Int(v) => Some(v.to_string()),
            Cell::Float(v) => Some(v.to_string()),
            Cell::Str(v) => Some(v.clone()),
        }
    }

    /// JSON rendering. Non-finite floats serialize as null because they are
    /// not representable in JSON.
    pub fn to_json(&self) -> Value {
        match self {
            Cell::Null => Value::Null,
            Cell::Int(v) => Value::Number((*v).into()),
            Cell::Float(v) => float_json(*v),
            Cell::Str(v) => Value::String(v.clone()),
        }
    }
}

/// Render an `f64` as JSON, mapping non-finite values to null.
pub fn float_json(v: f64) -> Value {
    Number::from_f64(v).map(Value::Number).unwrap_or(Value::Null)
}

/// Inferred type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Integer,
    Float,
    Text,
}

impl ColumnType {
    /// Type name reported in `dtypes` listings.
    pub fn name(&self) -> &'static str {
        match self {
            ColumnType::Integer => "integer",
            ColumnType::Float => "float",
            ColumnType::Text => "string",
        }
    }

    /// Whether values of this type participate in numeric operations.
    pub fn is_numeric(&self) -> bool {
        matches!(self, ColumnType::Integer | ColumnType::Float)
    }
}

/// A named, typed column of cells.
#[derive(Debug, Clone)]
pub struct Column {
    pub name: String,
    pub ty: ColumnType,
    pub cells: Vec<Cell>,
}

impl Column {
    /// Non-missing numeric values, in row order.
    pub fn numeric_values(&self) -> Vec<f64> {
        self.cells.iter().filter_map(Cell::as_f64).collect()
    }
}

/// An ephemeral row-oriented table materialized from a CSV file.
#[derive(Debug, Clone)]
pub struct Dataset {
    columns: Vec<Column>,
    row_count: usize,
}

impl Dataset {
    /// Load a dataset from `path`, reading at most `limit` rows when given.
    ///
    /// Any read or parse fault (missing file, ragged rows, invalid UTF-8)
    /// becomes a load error.
    pub fn load(path: &Path, limit: Option<usize>) -> Result<Self, ToolError> {
        let mut reader = csv::Reader::from_path(path)
            .map_err(|e| ToolError::load(format!("{}: {}", path.display(), e)))?;

        let headers: Vec<String> = reader
            .headers()
            .map_err(|e| ToolError::load(format!("{}: {}", path.display(), e)))?
            .iter()
            .map(|h| h.to_string())
            .collect();

        let mut raw_columns: Vec<Vec<String>> = vec![Vec::new(); headers.len()];
        let mut row_count = 0;

        for record in reader.records() {
            if let Some(limit) = limit {
                if row_count >= limit {
                    break;
                }
            }
            let record = record?;
            if record.len() != headers.len() {
                return Err(ToolError::load(format!(
                    "row {} has {} fields, expected {}",
                    row_count + 1,
                    record.len(),
                    headers.len()
                )));
            }
            for (col, field) in raw_columns.iter_mut().zip(record.iter()) {
                col.push(field.to_string());
            }
            row_count += 1;
        }

        let columns = headers
            .into_iter()
            .zip(raw_columns)
            .map(|(name, raw)| build_column(name, raw))
            .collect();

        Ok(Self { columns, row_count })
    }

    /// Number of loaded rows.
    pub fn row_count(&self) -> usize {
        self.row_count
    }

    /// Column names, in file order.
    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    /// All columns, in file order.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Look up a column by name.
    pub fn column(&self, name: &str) -> Result<&Column, ToolError> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .ok_or_else(|| ToolError::UnknownColumn(name.to_string()))
    }

    /// Column name -> inferred type name mapping.
    pub fn dtypes(&self) -> Map<String, Value> {
        self.columns
            .iter()
            .map(|c| (c.name.clone(), Value::String(c.ty.name().to_string())))
            .collect()
    }

    /// The given rows rendered as record mappings (column name -> value).
    pub fn records(&self, rows: impl IntoIterator<Item = usize>) -> Vec<Value> {
        rows.into_iter()
            .map(|row| {
                let record: Map<String, Value> = self
                    .columns
                    .iter()
                    .map(|c| (c.name.clone(), c.cells[row].to_json()))
                    .collect();
                Value::Object(record)
            })
            .collect()
    }

    /// The first `n` rows as record mappings.
    pub fn head(&self, n: usize) -> Vec<Value> {
        self.records(0..self.row_count.min(n))
    }
}

/// Infer the column type from raw fields and parse the cells accordingly.
fn build_column(name: String, raw: Vec<String>) -> Column {
    let present: Vec<&str> = raw.iter().map(|s| s.trim()).filter(|s| !s.is_empty()).collect();

    let ty = if present.is_empty() {
        ColumnType::Text
    } else if present.iter().all(|s| s.parse::<i64>().is_ok()) {
        ColumnType::Integer
    } else if present.iter().all(|s| s.parse::<f64>().is_ok()) {
        ColumnType::Float
    } else {
        ColumnType::Text
    };

    let cells = raw
        .into_iter()
        .map(|field| {
            let trimmed = field.trim();
            if trimmed.is_empty() {
                return Cell::Null;
            }
            match ty {
                // Parses cannot fail here: the type was inferred from the
                // same fields.
                ColumnType::Integer => Cell::Int(trimmed.parse().unwrap_or_default()),
                ColumnType::Float => Cell::Float(trimmed.parse().unwrap_or_default()),
                ColumnType::Text => Cell::Str(field),
            }
        })
        .collect();

    Column { name, ty, cells }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    /// The reference dataset used across the tabular tool tests.
    pub const PEOPLE_CSV: &str = "\
name,age,city,salary
Alice,30,Berlin,52000
Bob,28,Berlin,48000.5
Carol,35,Paris,61000
Dave,41,London,
Eve,29,Paris,58000";

    /// Write a CSV fixture and return the directory guard plus file path.
    pub fn write_csv(contents: &str) -> (TempDir, std::path::PathBuf) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.csv");
        fs::write(&path, contents).unwrap();
        (dir, path)
    }

    #[test]
    fn test_load_infers_types() {
        let (_dir, path) = write_csv(PEOPLE_CSV);
        let ds = Dataset::load(&path, None).unwrap();

        assert_eq!(ds.row_count(), 5);
        assert_eq!(ds.column_names(), vec!["name", "age", "city", "salary"]);
        assert_eq!(ds.column("name").unwrap().ty, ColumnType::Text);
        assert_eq!(ds.column("age").unwrap().ty, ColumnType::Integer);
        // One fractional salary makes the whole column float.
        assert_eq!(ds.column("salary").unwrap().ty, ColumnType::Float);
    }

    #[test]
    fn test_load_respects_limit() {
        let (_dir, path) = write_csv(PEOPLE_CSV);
        let ds = Dataset::load(&path, Some(2)).unwrap();
        assert_eq!(ds.row_count(), 2);
    }

    #[test]
    fn test_empty_field_is_missing() {
        let (_dir, path) = write_csv(PEOPLE_CSV);
        let ds = Dataset::load(&path, None).unwrap();
        let salary = ds.column("salary").unwrap();
        assert_eq!(salary.cells[3], Cell::Null);
        assert_eq!(salary.numeric_values().len(), 4);
    }

    #[test]
    fn test_missing_file_is_load_error() {
        let err = Dataset::load(Path::new("/nonexistent/data.csv"), None).unwrap_err();
        assert!(matches!(err, ToolError::Load(_)));
    }

    #[test]
    fn test_ragged_row_is_load_error() {
        let (_dir, path) = write_csv("a,b\n1,2\n3");
        let err = Dataset::load(&path, None).unwrap_err();
        assert!(matches!(err, ToolError::Load(_)));
    }

    #[test]
    fn test_unknown_column() {
        let (_dir, path) = write_csv(PEOPLE_CSV);
        let ds = Dataset::load(&path, None).unwrap();
        let err = ds.column("height").unwrap_err();
        assert_eq!(err.to_string(), "Unknown column: height");
    }

    #[test]
    fn test_records_render_cells() {
        let (_dir, path) = write_csv(PEOPLE_CSV);
        let ds = Dataset::load(&path, None).unwrap();
        let head = ds.head(2);
        assert_eq!(head.len(), 2);
        assert_eq!(head[0]["name"], serde_json::json!("Alice"));
        assert_eq!(head[0]["age"], serde_json::json!(30));
        // Missing salary renders as null.
        let all = ds.head(5);
        assert_eq!(all[3]["salary"], serde_json::Value::Null);
    }
}
