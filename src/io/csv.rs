//! CSV file loader with per-column type inference.
//!
//! Reads a headered, comma-delimited UTF-8 file into a [`Table`]. Column
//! kinds are inferred from the data: INT64 if every non-empty value parses
//! as an integer, else FLOAT64 if every non-empty value parses as a number,
//! else VARCHAR. Empty fields are NULL in every kind.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use crate::storage::column::Column;
use crate::storage::table::Table;

/// Errors raised while loading a CSV file.
#[derive(Debug)]
pub enum LoadError {
    /// The file or directory could not be read.
    Io { path: PathBuf, source: io::Error },
    /// The file content is not valid CSV (ragged rows, bad encoding, ...).
    Malformed {
        path: PathBuf,
        /// 1-based line number of the offending record, 0 if unknown.
        line: u64,
        reason: String,
    },
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadError::Io { path, source } => {
                write!(f, "cannot read {}: {}", path.display(), source)
            }
            LoadError::Malformed { path, line, reason } => {
                write!(f, "malformed CSV {} (line {}): {}", path.display(), line, reason)
            }
        }
    }
}

impl std::error::Error for LoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LoadError::Io { source, .. } => Some(source),
            LoadError::Malformed { .. } => None,
        }
    }
}

/// Load a CSV file into a table named `name`.
///
/// The first row is the header; empty header names become `_col_N`
/// (0-indexed). Quoted fields (including embedded commas and newlines) are
/// handled by the `csv` reader. A record whose field count differs from the
/// header is a [`LoadError::Malformed`], except for trailing lines that are
/// entirely blank, which are skipped. In a one-column file an interior
/// blank line is a NULL row, not a skipped line.
pub fn load_table<P: AsRef<Path>>(path: P, name: &str) -> Result<Table, LoadError> {
    let path = path.as_ref();

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| convert_csv_error(path, e))?;

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| convert_csv_error(path, e))?
        .iter()
        .enumerate()
        .map(|(i, h)| {
            if h.is_empty() {
                format!("_col_{}", i)
            } else {
                h.to_string()
            }
        })
        .collect();

    // The csv reader silently drops fully blank lines. In a one-column
    // file a blank line is a NULL row, so watch for line-number gaps
    // between records and reinsert an empty record per skipped line.
    let single_column = headers.len() == 1;
    let mut next_line = reader.position().line();

    let mut records: Vec<csv::StringRecord> = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| convert_csv_error(path, e))?;

        if single_column {
            if let Some(pos) = record.position() {
                while next_line < pos.line() {
                    records.push(csv::StringRecord::from(vec![""]));
                    next_line += 1;
                }
                next_line = pos.line();
            }
            // Quoted fields can span lines; count embedded newlines so the
            // next gap check starts from the right line.
            let embedded: u64 = record
                .iter()
                .map(|f| f.matches('\n').count() as u64)
                .sum();
            next_line += 1 + embedded;
        }

        // Skip whitespace-only lines (common as trailing junk).
        if record.iter().all(|f| f.is_empty()) && record.len() != headers.len() {
            continue;
        }

        if record.len() != headers.len() {
            let line = record.position().map_or(0, |p| p.line());
            return Err(LoadError::Malformed {
                path: path.to_path_buf(),
                line,
                reason: format!(
                    "expected {} fields, got {}",
                    headers.len(),
                    record.len()
                ),
            });
        }
        records.push(record);
    }

    let columns = headers
        .iter()
        .enumerate()
        .map(|(i, header)| infer_column(header, &records, i))
        .collect();

    Ok(Table::new(name, columns))
}

/// Build one column from field `index` of every record, inferring its kind.
fn infer_column(name: &str, records: &[csv::StringRecord], index: usize) -> Column {
    let fields: Vec<&str> = records.iter().map(|r| &r[index]).collect();

    let all_ints = fields
        .iter()
        .all(|f| f.is_empty() || f.parse::<i64>().is_ok());
    if all_ints {
        let values = fields
            .iter()
            .map(|f| if f.is_empty() { None } else { f.parse().ok() })
            .collect();
        return Column::from_ints(name, values);
    }

    let all_floats = fields
        .iter()
        .all(|f| f.is_empty() || f.parse::<f64>().is_ok());
    if all_floats {
        let values = fields
            .iter()
            .map(|f| if f.is_empty() { None } else { f.parse().ok() })
            .collect();
        return Column::from_floats(name, values);
    }

    let values = fields
        .iter()
        .map(|f| {
            if f.is_empty() {
                None
            } else {
                Some(f.to_string())
            }
        })
        .collect();
    Column::from_strs(name, values)
}

fn convert_csv_error(path: &Path, e: csv::Error) -> LoadError {
    let path = path.to_path_buf();
    match e.into_kind() {
        csv::ErrorKind::Io(source) => LoadError::Io { path, source },
        csv::ErrorKind::Utf8 { pos, .. } => LoadError::Malformed {
            path,
            line: pos.map_or(0, |p| p.line()),
            reason: "invalid UTF-8".into(),
        },
        csv::ErrorKind::UnequalLengths { pos, expected_len, len } => LoadError::Malformed {
            path,
            line: pos.map_or(0, |p| p.line()),
            reason: format!("expected {} fields, got {}", expected_len, len),
        },
        other => LoadError::Malformed {
            path,
            line: 0,
            reason: format!("{:?}", other),
        },
    }
}
