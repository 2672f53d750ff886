//! Input subsystem: CSV loading and the directory-backed table catalog.

pub mod catalog;
pub mod csv;
