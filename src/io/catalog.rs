//! Table catalog built from a directory of CSV files.
//!
//! [`DataSource`] owns every loaded table and is the query entry point.
//! Loading is eager: each `*.csv` file in the directory becomes a table
//! named after its file stem, and any load failure aborts construction.
//! Once built, a source is immutable, so queries can run concurrently
//! from plain shared references.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use crate::engine::{self, ExecError, QueryResult};
use crate::io::csv::{self, LoadError};
use crate::sql::parser::{parse_select, ParseError};
use crate::storage::table::Table;

/// Errors surfaced by [`DataSource::query`].
#[derive(Debug)]
pub enum QueryError {
    /// The statement text could not be parsed or uses unsupported syntax.
    Parse(ParseError),
    /// The statement is valid but failed during execution.
    Exec(ExecError),
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryError::Parse(e) => write!(f, "{}", e),
            QueryError::Exec(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for QueryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            QueryError::Parse(e) => Some(e),
            QueryError::Exec(e) => Some(e),
        }
    }
}

impl From<ParseError> for QueryError {
    fn from(e: ParseError) -> Self {
        QueryError::Parse(e)
    }
}

impl From<ExecError> for QueryError {
    fn from(e: ExecError) -> Self {
        QueryError::Exec(e)
    }
}

/// An immutable collection of named in-memory tables.
#[derive(Debug, Clone)]
pub struct DataSource {
    tables: HashMap<String, Table>,
}

impl DataSource {
    /// Load every `*.csv` file directly under `dir` (non-recursive).
    ///
    /// The table name is the file stem (`titanic.csv` loads as `titanic`);
    /// the extension match is case-insensitive. Subdirectories and other
    /// files are ignored. An empty directory yields an empty source.
    pub fn from_dir<P: AsRef<Path>>(dir: P) -> Result<Self, LoadError> {
        let dir = dir.as_ref();
        let entries = std::fs::read_dir(dir).map_err(|source| LoadError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        let mut tables = HashMap::new();
        for entry in entries {
            let entry = entry.map_err(|source| LoadError::Io {
                path: dir.to_path_buf(),
                source,
            })?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let is_csv = path
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
            if !is_csv {
                continue;
            }
            let name = match path.file_stem().and_then(|s| s.to_str()) {
                Some(stem) => stem.to_string(),
                None => continue,
            };
            let table = csv::load_table(&path, &name)?;
            tables.insert(name, table);
        }
        Ok(Self { tables })
    }

    /// Build a source from already-constructed tables, keyed by table name.
    pub fn from_tables(tables: Vec<Table>) -> Self {
        Self {
            tables: tables
                .into_iter()
                .map(|t| (t.name().to_string(), t))
                .collect(),
        }
    }

    /// Look up a table by exact name.
    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.get(name)
    }

    /// All table names, sorted for stable iteration.
    pub fn table_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tables.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Number of loaded tables.
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Parse and execute one SELECT statement against this source.
    pub fn query(&self, sql: &str) -> Result<QueryResult, QueryError> {
        let stmt = parse_select(sql)?;
        Ok(engine::execute(&stmt, self)?)
    }
}
