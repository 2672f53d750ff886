//! Query execution engine.
//!
//! Takes a parsed [`SelectStatement`](crate::sql::types::SelectStatement)
//! and a catalog of in-memory tables and produces a result table or column.
//! Every stage fails fast with the most specific [`ExecError`]; there is no
//! recovery or retry anywhere (queries are pure computations).

use std::fmt;

pub mod eval;
pub mod executor;
pub mod predicate;

pub use executor::{execute, QueryResult};

/// Errors raised during query execution.
#[derive(Debug, Clone, PartialEq)]
pub enum ExecError {
    /// The statement references a table absent from the catalog.
    UnknownTable(String),
    /// An expression references a column absent from the resolved table.
    UnknownColumn(String),
    /// An operator or aggregate was applied to operand kinds it cannot
    /// support.
    TypeMismatch(String),
    /// A select-list expression is neither grouped nor aggregated while
    /// grouping/aggregation is in effect, or an aggregate was misused.
    InvalidGroupBy(String),
    /// Two select items would produce the same output column name.
    DuplicateColumn(String),
}

impl fmt::Display for ExecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecError::UnknownTable(name) => write!(f, "unknown table: {}", name),
            ExecError::UnknownColumn(name) => write!(f, "unknown column: {}", name),
            ExecError::TypeMismatch(msg) => write!(f, "type mismatch: {}", msg),
            ExecError::InvalidGroupBy(msg) => write!(f, "invalid GROUP BY: {}", msg),
            ExecError::DuplicateColumn(name) => {
                write!(f, "duplicate output column '{}'; use an alias to disambiguate", name)
            }
        }
    }
}

impl std::error::Error for ExecError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exec_error_display() {
        let e = ExecError::UnknownTable("titanic".into());
        assert_eq!(e.to_string(), "unknown table: titanic");

        let e = ExecError::UnknownColumn("fare".into());
        assert_eq!(e.to_string(), "unknown column: fare");

        let e = ExecError::TypeMismatch("sum() requires a numeric column".into());
        assert!(e.to_string().starts_with("type mismatch:"));

        let e = ExecError::InvalidGroupBy("expression 'p_class' is neither a grouping column nor an aggregate".into());
        assert!(e.to_string().starts_with("invalid GROUP BY:"));

        let e = ExecError::DuplicateColumn("id".into());
        assert_eq!(
            e.to_string(),
            "duplicate output column 'id'; use an alias to disambiguate"
        );
    }
}
