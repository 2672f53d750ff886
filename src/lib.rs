//! In-memory SQL query engine over directories of CSV files.
//!
//! Point a [`DataSource`] at a directory and every `*.csv` file in it
//! becomes a queryable table named after its file stem. Queries are plain
//! SELECT statements: projection, aliases, arithmetic, WHERE, GROUP BY
//! with `count`/`sum`/`avg`/`min`/`max`, and DISTINCT.
//!
//! ```no_run
//! use csv_query::DataSource;
//!
//! let source = DataSource::from_dir("./data")?;
//! let result = source.query("SELECT city, count(*) FROM people GROUP BY city")?;
//! for name in result.column_names() {
//!     println!("{}", name);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! Everything is loaded eagerly and held in typed columnar form; a built
//! source is immutable and can be queried from many threads at once.

pub mod engine;
pub mod io;
pub mod sql;
pub mod storage;

pub use engine::{ExecError, QueryResult};
pub use io::catalog::{DataSource, QueryError};
pub use io::csv::LoadError;
pub use sql::parser::ParseError;
