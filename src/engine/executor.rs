//! SELECT execution pipeline.
//!
//! Stages run in a fixed order: resolve the table, apply the WHERE mask,
//! project (row-wise or grouped), deduplicate for DISTINCT, then shape the
//! output. Grouped projection partitions rows by their grouping-key tuple
//! in first-seen order and reduces each partition independently.

use std::collections::{HashMap, HashSet};

use crate::engine::eval::{self, column_from_values, into_column, EvalContext, Evaluated};
use crate::engine::{predicate, ExecError};
use crate::io::catalog::DataSource;
use crate::sql::types::{Expr, SelectItem, SelectStatement, Value};
use crate::storage::column::Column;
use crate::storage::table::Table;

/// The shaped output of a query.
///
/// A statement selecting exactly one non-`*` item yields a single named
/// column; everything else yields a table.
#[derive(Debug, Clone)]
pub enum QueryResult {
    Column(Column),
    Table(Table),
}

impl QueryResult {
    /// Number of result rows.
    pub fn row_count(&self) -> usize {
        match self {
            QueryResult::Column(c) => c.len(),
            QueryResult::Table(t) => t.row_count(),
        }
    }

    /// Output column names, in select order.
    pub fn column_names(&self) -> Vec<&str> {
        match self {
            QueryResult::Column(c) => vec![c.name()],
            QueryResult::Table(t) => t.column_names(),
        }
    }

    /// The single column, if this result is column-shaped.
    pub fn as_column(&self) -> Option<&Column> {
        match self {
            QueryResult::Column(c) => Some(c),
            QueryResult::Table(_) => None,
        }
    }

    /// The table, if this result is table-shaped.
    pub fn as_table(&self) -> Option<&Table> {
        match self {
            QueryResult::Column(_) => None,
            QueryResult::Table(t) => Some(t),
        }
    }
}

/// Execute a parsed SELECT against a catalog of loaded tables.
pub fn execute(stmt: &SelectStatement, source: &DataSource) -> Result<QueryResult, ExecError> {
    let table = source
        .table(&stmt.table)
        .ok_or_else(|| ExecError::UnknownTable(stmt.table.clone()))?;

    let filtered;
    let table = match &stmt.predicate {
        Some(pred) => {
            let mask = predicate::evaluate(pred, table)?;
            filtered = table.filter(&mask);
            &filtered
        }
        None => table,
    };

    // Shape is decided by the statement text, before '*' expansion.
    let single_column =
        stmt.items.len() == 1 && !matches!(stmt.items[0].expr, Expr::Wildcard);

    let items = expand_wildcard(&stmt.items, table);
    check_output_names(&items)?;

    let grouped =
        !stmt.group_by.is_empty() || items.iter().any(|i| i.expr.contains_aggregate());

    let mut result = if grouped {
        project_grouped(table, &items, &stmt.group_by)?
    } else {
        project_rows(table, &items)?
    };

    if stmt.distinct {
        result = distinct_rows(&result);
    }

    if single_column {
        Ok(QueryResult::Column(result.columns()[0].clone()))
    } else {
        Ok(QueryResult::Table(result))
    }
}

/// Replace each `*` item with one item per table column, in table order.
fn expand_wildcard(items: &[SelectItem], table: &Table) -> Vec<SelectItem> {
    let mut out = Vec::with_capacity(items.len());
    for item in items {
        if matches!(item.expr, Expr::Wildcard) {
            for col in table.columns() {
                out.push(SelectItem {
                    expr: Expr::Column(col.name().to_string()),
                    alias: None,
                });
            }
        } else {
            out.push(item.clone());
        }
    }
    out
}

/// Output names must be unique: result tables index columns by name.
fn check_output_names(items: &[SelectItem]) -> Result<(), ExecError> {
    let mut seen = HashSet::new();
    for item in items {
        let name = item.output_name();
        if !seen.insert(name.clone()) {
            return Err(ExecError::DuplicateColumn(name));
        }
    }
    Ok(())
}

/// Row-wise projection: evaluate every item over all rows, broadcasting
/// scalar items to the table's row count.
fn project_rows(table: &Table, items: &[SelectItem]) -> Result<Table, ExecError> {
    let ctx = EvalContext::all_rows();
    let len = table.row_count();
    let columns = items
        .iter()
        .map(|item| {
            let ev = eval::evaluate(&item.expr, table, &ctx)?;
            Ok(into_column(ev, &item.output_name(), len))
        })
        .collect::<Result<Vec<_>, ExecError>>()?;
    Ok(Table::new(table.name(), columns))
}

/// Grouped projection: one output row per distinct grouping-key tuple, in
/// first-seen order. With no GROUP BY, all rows form one implicit group.
fn project_grouped(
    table: &Table,
    items: &[SelectItem],
    group_by: &[String],
) -> Result<Table, ExecError> {
    for name in group_by {
        if table.column(name).is_none() {
            return Err(ExecError::UnknownColumn(name.clone()));
        }
    }

    // Every select item must be a grouping column, an aggregate-bearing
    // expression, or (with no GROUP BY) a bare literal.
    for item in items {
        let ok = match &item.expr {
            Expr::Column(name) => group_by.contains(name),
            Expr::Literal(_) => group_by.is_empty(),
            other => other.contains_aggregate(),
        };
        if !ok {
            return Err(ExecError::InvalidGroupBy(format!(
                "expression '{}' is neither a grouping column nor an aggregate",
                item.expr
            )));
        }
    }

    let groups = partition(table, group_by);

    let mut outputs: Vec<Vec<Value>> = vec![Vec::with_capacity(groups.len()); items.len()];
    for rows in &groups {
        let ctx = EvalContext::group(rows);
        for (slot, item) in outputs.iter_mut().zip(items) {
            let value = match eval::evaluate(&item.expr, table, &ctx)? {
                Evaluated::Scalar(v) => v,
                // A grouping column restricted to one group is constant;
                // its first value represents the group.
                Evaluated::Column(c) => {
                    if matches!(item.expr, Expr::Column(_)) {
                        c.value(0)
                    } else {
                        return Err(ExecError::InvalidGroupBy(format!(
                            "expression '{}' does not reduce to one value per group",
                            item.expr
                        )));
                    }
                }
            };
            slot.push(value);
        }
    }

    let columns = outputs
        .into_iter()
        .zip(items)
        .map(|(values, item)| column_from_values(&item.output_name(), values))
        .collect::<Result<Vec<_>, ExecError>>()?;
    Ok(Table::new(table.name(), columns))
}

/// Hashable stand-in for [`Value`]; floats key by bit pattern.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum KeyValue {
    Int(i64),
    Float(u64),
    Str(String),
    Bool(bool),
    Null,
}

impl From<Value> for KeyValue {
    fn from(v: Value) -> Self {
        match v {
            Value::Int(x) => KeyValue::Int(x),
            Value::Float(x) => KeyValue::Float(x.to_bits()),
            Value::Str(x) => KeyValue::Str(x),
            Value::Bool(x) => KeyValue::Bool(x),
            Value::Null => KeyValue::Null,
        }
    }
}

/// Partition row indices by grouping-key tuple, groups ordered by first
/// appearance. An empty key set yields one group holding every row.
fn partition(table: &Table, group_by: &[String]) -> Vec<Vec<usize>> {
    if group_by.is_empty() {
        return vec![(0..table.row_count()).collect()];
    }

    let key_cols: Vec<&Column> = group_by
        .iter()
        .map(|name| table.column(name).expect("grouping columns checked"))
        .collect();

    let mut index: HashMap<Vec<KeyValue>, usize> = HashMap::new();
    let mut groups: Vec<Vec<usize>> = Vec::new();
    for row in 0..table.row_count() {
        let key: Vec<KeyValue> = key_cols.iter().map(|c| c.value(row).into()).collect();
        let slot = *index.entry(key).or_insert_with(|| {
            groups.push(Vec::new());
            groups.len() - 1
        });
        groups[slot].push(row);
    }
    groups
}

/// Keep the first occurrence of each distinct row, preserving order.
fn distinct_rows(table: &Table) -> Table {
    let mut seen: HashSet<Vec<KeyValue>> = HashSet::new();
    let mut keep: Vec<usize> = Vec::new();
    for row in 0..table.row_count() {
        let key: Vec<KeyValue> = table
            .columns()
            .iter()
            .map(|c| c.value(row).into())
            .collect();
        if seen.insert(key) {
            keep.push(row);
        }
    }
    if keep.len() == table.row_count() {
        table.clone()
    } else {
        table.take(&keep)
    }
}
