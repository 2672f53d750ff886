//! Immutable in-memory tables.
//!
//! A `Table` is an ordered set of named, equal-length columns. Insertion
//! order is the display/select order. Tables are immutable after
//! construction: filtering and projection produce new tables.

use crate::storage::column::Column;

/// An immutable set of named, equal-length columns.
#[derive(Debug, Clone)]
pub struct Table {
    name: String,
    columns: Vec<Column>,
}

impl Table {
    /// Create a table from a name and columns.
    ///
    /// # Panics
    /// Panics if two columns share a name or if column lengths differ.
    /// These are construction bugs, not runtime query errors.
    pub fn new(name: impl Into<String>, columns: Vec<Column>) -> Self {
        if let Some(first) = columns.first() {
            for col in &columns[1..] {
                assert_eq!(
                    col.len(),
                    first.len(),
                    "column '{}' has {} rows, expected {}",
                    col.name(),
                    col.len(),
                    first.len()
                );
            }
        }
        for (i, col) in columns.iter().enumerate() {
            assert!(
                !columns[..i].iter().any(|c| c.name() == col.name()),
                "duplicate column name '{}'",
                col.name()
            );
        }
        Self {
            name: name.into(),
            columns,
        }
    }

    /// Table name (empty for anonymous intermediate results).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The columns, in stored order.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Column names, in stored order.
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name()).collect()
    }

    /// Number of columns.
    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    /// Number of rows (0 for a table with no columns).
    pub fn row_count(&self) -> usize {
        self.columns.first().map_or(0, |c| c.len())
    }

    /// Look up a column by exact name.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name() == name)
    }

    /// Keep only the rows where `mask` is true, producing a new table.
    ///
    /// # Panics
    /// Panics if `mask.len() != row_count()`.
    pub fn filter(&self, mask: &[bool]) -> Table {
        Table {
            name: self.name.clone(),
            columns: self.columns.iter().map(|c| c.filter(mask)).collect(),
        }
    }

    /// A new table holding the rows at `rows`, in the given order.
    ///
    /// # Panics
    /// Panics if any index in `rows` is out of bounds.
    pub fn take(&self, rows: &[usize]) -> Table {
        Table {
            name: self.name.clone(),
            columns: self.columns.iter().map(|c| c.take(rows)).collect(),
        }
    }
}
