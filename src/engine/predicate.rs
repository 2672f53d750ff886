//! WHERE-clause evaluation to a row mask.
//!
//! A predicate reduces to one `bool` per row. NULL operands use two-valued
//! logic: any comparison touching NULL is false, and a NULL boolean value
//! reads as false. There is no three-valued UNKNOWN anywhere downstream.

use crate::engine::eval::{self, EvalContext, Evaluated};
use crate::engine::ExecError;
use crate::sql::types::{CompareOp, Expr, LogicalOp, Value};
use crate::storage::column::{ColumnData, DataType};
use crate::storage::table::Table;

/// Evaluate `pred` against every row of `table`, producing a keep-mask of
/// length `table.row_count()`.
pub fn evaluate(pred: &Expr, table: &Table) -> Result<Vec<bool>, ExecError> {
    match pred {
        Expr::Compound { left, op, right } => {
            let l = evaluate(left, table)?;
            let r = evaluate(right, table)?;
            Ok(l.into_iter()
                .zip(r)
                .map(|(a, b)| match op {
                    LogicalOp::And => a && b,
                    LogicalOp::Or => a || b,
                })
                .collect())
        }

        Expr::Not(inner) => {
            let mask = evaluate(inner, table)?;
            Ok(mask.into_iter().map(|b| !b).collect())
        }

        Expr::Compare { left, op, right } => eval_compare(left, *op, right, table),

        Expr::Literal(Value::Bool(b)) => Ok(vec![*b; table.row_count()]),

        // A bare column is a predicate only when it is boolean; NULL reads
        // as false.
        Expr::Column(_) => {
            let ctx = EvalContext::all_rows();
            match eval::evaluate(pred, table, &ctx)? {
                Evaluated::Column(c) => match c.data() {
                    ColumnData::Bool(v) => Ok(v.iter().map(|b| b.unwrap_or(false)).collect()),
                    _ => Err(ExecError::TypeMismatch(format!(
                        "column '{}' is {}, not a boolean predicate",
                        c.name(),
                        c.data_type()
                    ))),
                },
                Evaluated::Scalar(_) => unreachable!("column reference evaluates to a column"),
            }
        }

        other => Err(ExecError::TypeMismatch(format!(
            "expression '{}' is not a boolean predicate",
            other
        ))),
    }
}

/// Comparison operand kinds for the compatibility check.
#[derive(Debug, Clone, Copy, PartialEq)]
enum OperandKind {
    Numeric,
    Str,
    Bool,
}

/// The kind of an operand, or `None` for a NULL scalar (which compares
/// false against anything without being a type error).
fn operand_kind(ev: &Evaluated) -> Option<OperandKind> {
    match ev {
        Evaluated::Column(c) => Some(match c.data_type() {
            DataType::Int64 | DataType::Float64 => OperandKind::Numeric,
            DataType::Varchar => OperandKind::Str,
            DataType::Boolean => OperandKind::Bool,
        }),
        Evaluated::Scalar(Value::Int(_)) | Evaluated::Scalar(Value::Float(_)) => {
            Some(OperandKind::Numeric)
        }
        Evaluated::Scalar(Value::Str(_)) => Some(OperandKind::Str),
        Evaluated::Scalar(Value::Bool(_)) => Some(OperandKind::Bool),
        Evaluated::Scalar(Value::Null) => None,
    }
}

fn eval_compare(
    left: &Expr,
    op: CompareOp,
    right: &Expr,
    table: &Table,
) -> Result<Vec<bool>, ExecError> {
    let ctx = EvalContext::all_rows();
    let l = eval::evaluate(left, table, &ctx)?;
    let r = eval::evaluate(right, table, &ctx)?;

    if let (Some(lk), Some(rk)) = (operand_kind(&l), operand_kind(&r)) {
        if lk != rk {
            return Err(ExecError::TypeMismatch(format!(
                "cannot compare '{}' to '{}'",
                left, right
            )));
        }
    }

    let len = table.row_count();
    Ok((0..len)
        .map(|i| compare_values(&value_at(&l, i), &value_at(&r, i), op))
        .collect())
}

fn value_at(ev: &Evaluated, row: usize) -> Value {
    match ev {
        Evaluated::Column(c) => c.value(row),
        Evaluated::Scalar(v) => v.clone(),
    }
}

/// Two-valued row comparison. NULL on either side is false, always.
fn compare_values(left: &Value, right: &Value, op: CompareOp) -> bool {
    let ord = match (left, right) {
        (Value::Null, _) | (_, Value::Null) => return false,
        (Value::Int(a), Value::Int(b)) => a.cmp(b),
        (Value::Int(a), Value::Float(b)) => match (*a as f64).partial_cmp(b) {
            Some(o) => o,
            None => return false,
        },
        (Value::Float(a), Value::Int(b)) => match a.partial_cmp(&(*b as f64)) {
            Some(o) => o,
            None => return false,
        },
        (Value::Float(a), Value::Float(b)) => match a.partial_cmp(b) {
            Some(o) => o,
            None => return false,
        },
        (Value::Str(a), Value::Str(b)) => a.cmp(b),
        (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
        // Cross-kind pairs are rejected before row iteration.
        _ => return false,
    };

    match op {
        CompareOp::Eq => ord.is_eq(),
        CompareOp::Ne => ord.is_ne(),
        CompareOp::Lt => ord.is_lt(),
        CompareOp::Le => ord.is_le(),
        CompareOp::Gt => ord.is_gt(),
        CompareOp::Ge => ord.is_ge(),
    }
}
