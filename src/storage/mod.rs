//! Storage subsystem: typed columnar values and immutable in-memory tables.

pub mod column;
pub mod table;
