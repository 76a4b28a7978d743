//! The common in-memory tabular model shared by every adapter.
//!
//! A [`Table`] is a named, ordered collection of typed [`Column`]s plus an
//! ordered sequence of [`Row`]s; each row is a positional array of
//! [`Value`]s aligned with the columns. The "no value" state is the
//! distinguished [`Value::Null`], distinct from an empty string or zero.

use crate::error::{Result, RowlinkError};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

/// Semantic column types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum DataType {
    #[default]
    Text,
    Integer,
    Float,
    Boolean,
    DateTime,
    Binary,
}

impl DataType {
    pub fn name(&self) -> &'static str {
        match self {
            DataType::Text => "text",
            DataType::Integer => "integer",
            DataType::Float => "float",
            DataType::Boolean => "boolean",
            DataType::DateTime => "datetime",
            DataType::Binary => "binary",
        }
    }
}

/// One typed cell value. Every type has a nullable variant through
/// [`Value::Null`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub enum Value {
    #[default]
    Null,
    Text(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    DateTime(NaiveDateTime),
    Binary(Vec<u8>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn data_type(&self) -> Option<DataType> {
        match self {
            Value::Null => None,
            Value::Text(_) => Some(DataType::Text),
            Value::Integer(_) => Some(DataType::Integer),
            Value::Float(_) => Some(DataType::Float),
            Value::Boolean(_) => Some(DataType::Boolean),
            Value::DateTime(_) => Some(DataType::DateTime),
            Value::Binary(_) => Some(DataType::Binary),
        }
    }

    /// External textual form used by the line-based formatters.
    /// `Null` renders as the empty string, date-times as ISO 8601,
    /// binary as lowercase hex.
    pub fn render(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Text(s) => s.clone(),
            Value::Integer(i) => i.to_string(),
            Value::Float(f) => f.to_string(),
            Value::Boolean(b) => b.to_string(),
            Value::DateTime(dt) => dt.format("%Y-%m-%dT%H:%M:%S").to_string(),
            Value::Binary(bytes) => {
                let mut out = String::with_capacity(bytes.len() * 2);
                for b in bytes {
                    let _ = write!(out, "{b:02x}");
                }
                out
            }
        }
    }

    /// Text content if this is a text cell.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Lenient integer view: integers pass through, floats truncate,
    /// parsable text parses, booleans map to 0/1.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            Value::Float(f) => Some(*f as i64),
            Value::Boolean(b) => Some(i64::from(*b)),
            Value::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Integer(i) => Some(*i as f64),
            Value::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            Value::Integer(i) => Some(*i != 0),
            Value::Text(s) => match s.trim().to_lowercase().as_str() {
                "true" | "1" => Some(true),
                "false" | "0" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }

    pub fn as_datetime(&self) -> Option<NaiveDateTime> {
        match self {
            Value::DateTime(dt) => Some(*dt),
            _ => None,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub data_type: DataType,
}

impl Column {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Column { name: name.into(), data_type }
    }

    pub fn text(name: impl Into<String>) -> Self {
        Column::new(name, DataType::Text)
    }
}

/// A positional array of cell values aligned with a table's columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Row(pub Vec<Value>);

impl Row {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.0.get(index)
    }

    pub fn set(&mut self, index: usize, value: Value) {
        if index < self.0.len() {
            self.0[index] = value;
        }
    }
}

impl From<Vec<Value>> for Row {
    fn from(values: Vec<Value>) -> Self {
        Row(values)
    }
}

/// The common tabular container.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Table {
    pub name: String,
    columns: Vec<Column>,
    rows: Vec<Row>,
}

impl Table {
    pub fn new(name: impl Into<String>) -> Self {
        Table { name: name.into(), columns: Vec::new(), rows: Vec::new() }
    }

    pub fn with_columns(name: impl Into<String>, columns: Vec<Column>) -> Self {
        Table { name: name.into(), columns, rows: Vec::new() }
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Adds a column if no column of that name exists yet.
    ///
    /// Column addition after rows exist is allowed but does not
    /// retroactively populate existing rows; callers must not rely on the
    /// alignment of older rows with the new column.
    pub fn add_column(&mut self, name: impl Into<String>, data_type: DataType) -> usize {
        let name = name.into();
        if let Some(idx) = self.column_index(&name) {
            return idx;
        }
        self.columns.push(Column::new(name, data_type));
        self.columns.len() - 1
    }

    /// A fresh row with every cell set to [`Value::Null`].
    pub fn new_row(&self) -> Row {
        Row(vec![Value::Null; self.columns.len()])
    }

    /// Appends a row; fails with [`RowlinkError::SchemaMismatch`] when the
    /// value count disagrees with the column count.
    pub fn add_row(&mut self, row: Row) -> Result<()> {
        if row.len() != self.columns.len() {
            return Err(RowlinkError::SchemaMismatch {
                table: self.name.clone(),
                expected: self.columns.len(),
                actual: row.len(),
            });
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn rows_mut(&mut self) -> &mut [Row] {
        &mut self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Schema-only copy: same name and columns, no rows.
    pub fn clone_schema(&self) -> Table {
        Table {
            name: self.name.clone(),
            columns: self.columns.clone(),
            rows: Vec::new(),
        }
    }

    /// Cell lookup by column name.
    pub fn value(&self, row_index: usize, column: &str) -> Option<&Value> {
        let col = self.column_index(column)?;
        self.rows.get(row_index)?.get(col)
    }

    /// Releases row storage, keeping the schema.
    pub fn clear(&mut self) {
        self.rows.clear();
    }
}

/// An ordered set of tables, used by the XML read path where one source can
/// materialize several tables per block.
#[derive(Debug, Clone, Default)]
pub struct DataSet {
    pub tables: Vec<Table>,
}

impl DataSet {
    pub fn new() -> Self {
        DataSet::default()
    }

    pub fn get_or_insert(&mut self, name: &str) -> &mut Table {
        if let Some(pos) = self.tables.iter().position(|t| t.name == name) {
            &mut self.tables[pos]
        } else {
            self.tables.push(Table::new(name));
            self.tables.last_mut().unwrap()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.tables.iter().all(|t| t.is_empty())
    }
}
