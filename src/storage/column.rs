//! Typed columnar values.
//!
//! A `Column` is a named, typed, ordered sequence of scalar values, one per
//! row. NULL is represented as `None` in the backing `Option` vectors, so
//! every value kind is null-capable. Columns are immutable once built:
//! `filter` and `take` produce new columns.

use std::fmt;

use crate::sql::types::Value;

/// Data types a column can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    Int64,
    Float64,
    Varchar,
    Boolean,
}

impl DataType {
    /// True for Int64 and Float64.
    pub fn is_numeric(self) -> bool {
        matches!(self, DataType::Int64 | DataType::Float64)
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::Int64 => write!(f, "INT64"),
            DataType::Float64 => write!(f, "FLOAT64"),
            DataType::Varchar => write!(f, "VARCHAR"),
            DataType::Boolean => write!(f, "BOOLEAN"),
        }
    }
}

/// The backing values of a column, one variant per data type.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    Int(Vec<Option<i64>>),
    Float(Vec<Option<f64>>),
    Str(Vec<Option<String>>),
    Bool(Vec<Option<bool>>),
}

/// A named, typed, ordered sequence of scalar values.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    name: String,
    data: ColumnData,
}

impl Column {
    /// Create a column from a name and backing data.
    pub fn new(name: impl Into<String>, data: ColumnData) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }

    /// Convenience constructor for an INT64 column.
    pub fn from_ints(name: impl Into<String>, values: Vec<Option<i64>>) -> Self {
        Self::new(name, ColumnData::Int(values))
    }

    /// Convenience constructor for a FLOAT64 column.
    pub fn from_floats(name: impl Into<String>, values: Vec<Option<f64>>) -> Self {
        Self::new(name, ColumnData::Float(values))
    }

    /// Convenience constructor for a VARCHAR column.
    pub fn from_strs(name: impl Into<String>, values: Vec<Option<String>>) -> Self {
        Self::new(name, ColumnData::Str(values))
    }

    /// Convenience constructor for a BOOLEAN column.
    pub fn from_bools(name: impl Into<String>, values: Vec<Option<bool>>) -> Self {
        Self::new(name, ColumnData::Bool(values))
    }

    /// Column name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Backing data.
    pub fn data(&self) -> &ColumnData {
        &self.data
    }

    /// Data type of this column.
    pub fn data_type(&self) -> DataType {
        match self.data {
            ColumnData::Int(_) => DataType::Int64,
            ColumnData::Float(_) => DataType::Float64,
            ColumnData::Str(_) => DataType::Varchar,
            ColumnData::Bool(_) => DataType::Boolean,
        }
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        match &self.data {
            ColumnData::Int(v) => v.len(),
            ColumnData::Float(v) => v.len(),
            ColumnData::Str(v) => v.len(),
            ColumnData::Bool(v) => v.len(),
        }
    }

    /// True if the column has no rows.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of NULL values in the column.
    pub fn null_count(&self) -> usize {
        match &self.data {
            ColumnData::Int(v) => v.iter().filter(|x| x.is_none()).count(),
            ColumnData::Float(v) => v.iter().filter(|x| x.is_none()).count(),
            ColumnData::Str(v) => v.iter().filter(|x| x.is_none()).count(),
            ColumnData::Bool(v) => v.iter().filter(|x| x.is_none()).count(),
        }
    }

    /// The value at `row`, with NULL mapped to `Value::Null`.
    ///
    /// # Panics
    /// Panics if `row >= len()`.
    pub fn value(&self, row: usize) -> Value {
        match &self.data {
            ColumnData::Int(v) => v[row].map_or(Value::Null, Value::Int),
            ColumnData::Float(v) => v[row].map_or(Value::Null, Value::Float),
            ColumnData::Str(v) => v[row].clone().map_or(Value::Null, Value::Str),
            ColumnData::Bool(v) => v[row].map_or(Value::Null, Value::Bool),
        }
    }

    /// All values of the column, in row order.
    pub fn values(&self) -> Vec<Value> {
        (0..self.len()).map(|row| self.value(row)).collect()
    }

    /// A copy of this column under a different name.
    pub fn with_name(&self, name: impl Into<String>) -> Column {
        Column {
            name: name.into(),
            data: self.data.clone(),
        }
    }

    /// Keep only the rows where `mask` is true.
    ///
    /// # Panics
    /// Panics if `mask.len() != len()`.
    pub fn filter(&self, mask: &[bool]) -> Column {
        assert_eq!(mask.len(), self.len(), "mask length must match row count");
        let data = match &self.data {
            ColumnData::Int(v) => ColumnData::Int(filter_vec(v, mask)),
            ColumnData::Float(v) => ColumnData::Float(filter_vec(v, mask)),
            ColumnData::Str(v) => ColumnData::Str(filter_vec(v, mask)),
            ColumnData::Bool(v) => ColumnData::Bool(filter_vec(v, mask)),
        };
        Column {
            name: self.name.clone(),
            data,
        }
    }

    /// A new column holding the values at `rows`, in the given order.
    ///
    /// # Panics
    /// Panics if any index in `rows` is out of bounds.
    pub fn take(&self, rows: &[usize]) -> Column {
        let data = match &self.data {
            ColumnData::Int(v) => ColumnData::Int(take_vec(v, rows)),
            ColumnData::Float(v) => ColumnData::Float(take_vec(v, rows)),
            ColumnData::Str(v) => ColumnData::Str(take_vec(v, rows)),
            ColumnData::Bool(v) => ColumnData::Bool(take_vec(v, rows)),
        };
        Column {
            name: self.name.clone(),
            data,
        }
    }
}

fn filter_vec<T: Clone>(values: &[Option<T>], mask: &[bool]) -> Vec<Option<T>> {
    values
        .iter()
        .zip(mask)
        .filter(|(_, &keep)| keep)
        .map(|(v, _)| v.clone())
        .collect()
}

fn take_vec<T: Clone>(values: &[Option<T>], rows: &[usize]) -> Vec<Option<T>> {
    rows.iter().map(|&r| values[r].clone()).collect()
}
