//! SQL parsing for csv-query.
//!
//! Wraps `sqlparser-rs` to parse a single-table SELECT subset into a
//! [`types::SelectStatement`] for the execution engine.
//!
//! Supported SQL subset:
//! - SELECT: columns, `*`, literals, arithmetic (+ - * /), aliases,
//!   aggregates (count, sum, avg, min, max), count(*), DISTINCT
//! - FROM: single table name (maps to file name)
//! - WHERE: comparison predicates, compound (AND, OR, NOT)
//! - GROUP BY: column list

pub mod parser;
pub mod types;
