//! Scalar expression evaluation.
//!
//! Evaluates an expression against a table under an explicit
//! [`EvalContext`] carrying the visible row set and whether aggregate calls
//! are valid. Grouping state is always threaded through the context, never
//! held as ambient state, so evaluation is referentially transparent.

use crate::engine::ExecError;
use crate::sql::types::{AggFunc, ArithOp, Expr, Value};
use crate::storage::column::{Column, ColumnData};
use crate::storage::table::Table;

/// Result of evaluating an expression: a per-row column or a single value.
#[derive(Debug, Clone, PartialEq)]
pub enum Evaluated {
    Column(Column),
    Scalar(Value),
}

/// The rows an evaluation can see, plus whether aggregates are valid.
#[derive(Debug, Clone, Copy)]
pub struct EvalContext<'a> {
    /// Visible row indices into the table. `None` = every row.
    rows: Option<&'a [usize]>,
    /// Whether aggregate calls are valid in this context.
    aggregating: bool,
}

impl<'a> EvalContext<'a> {
    /// Plain row-wise evaluation over the whole table; aggregates invalid.
    pub fn all_rows() -> Self {
        Self {
            rows: None,
            aggregating: false,
        }
    }

    /// Implicit whole-table aggregation (no GROUP BY, aggregates present).
    pub fn aggregate_all() -> Self {
        Self {
            rows: None,
            aggregating: true,
        }
    }

    /// Aggregation over one group's rows.
    pub fn group(rows: &'a [usize]) -> Self {
        Self {
            rows: Some(rows),
            aggregating: true,
        }
    }

    fn row_count(&self, table: &Table) -> usize {
        self.rows.map_or(table.row_count(), |r| r.len())
    }

    fn restrict(&self, col: &Column) -> Column {
        match self.rows {
            Some(rows) => col.take(rows),
            None => col.clone(),
        }
    }

    /// The same row view with aggregates disallowed, for aggregate
    /// arguments.
    fn scalar_view(&self) -> EvalContext<'a> {
        EvalContext {
            rows: self.rows,
            aggregating: false,
        }
    }
}

/// Evaluate `expr` against `table` under `ctx`.
///
/// Column references resolve against the table (restricted to the context's
/// rows); literals stay scalar and are broadcast by callers when a column is
/// needed; arithmetic requires numeric operands; aggregate calls reduce the
/// context's rows to one scalar and are only valid when `ctx` allows them.
pub fn evaluate(expr: &Expr, table: &Table, ctx: &EvalContext) -> Result<Evaluated, ExecError> {
    match expr {
        Expr::Column(name) => table
            .column(name)
            .map(|c| Evaluated::Column(ctx.restrict(c)))
            .ok_or_else(|| ExecError::UnknownColumn(name.clone())),

        Expr::Literal(v) => Ok(Evaluated::Scalar(v.clone())),

        Expr::Arith { left, op, right } => {
            eval_arith(left, *op, right, table, ctx, &expr.to_string())
        }

        Expr::Aggregate { func, arg } => {
            if !ctx.aggregating {
                return Err(ExecError::InvalidGroupBy(format!(
                    "aggregate '{}' used outside an aggregation context",
                    expr
                )));
            }
            eval_aggregate(*func, arg, table, ctx).map(Evaluated::Scalar)
        }

        Expr::Wildcard => Err(ExecError::TypeMismatch(
            "'*' is only valid as a whole select item or inside count(*)".into(),
        )),

        Expr::Compare { .. } | Expr::Compound { .. } | Expr::Not(_) => {
            Err(ExecError::TypeMismatch(format!(
                "boolean expression '{}' is not valid in a select list",
                expr
            )))
        }
    }
}

/// Broadcast an evaluation result to a column of `len` rows named `name`.
pub fn into_column(ev: Evaluated, name: &str, len: usize) -> Column {
    match ev {
        Evaluated::Column(c) => c.with_name(name),
        Evaluated::Scalar(v) => {
            let data = match v {
                Value::Int(x) => ColumnData::Int(vec![Some(x); len]),
                Value::Float(x) => ColumnData::Float(vec![Some(x); len]),
                Value::Str(x) => ColumnData::Str(vec![Some(x); len]),
                Value::Bool(x) => ColumnData::Bool(vec![Some(x); len]),
                Value::Null => ColumnData::Float(vec![None; len]),
            };
            Column::new(name, data)
        }
    }
}

/// Assemble a column from per-row values of a single kind.
///
/// Int and Float mix by promoting to Float; any other mix of non-null kinds
/// is a type error. An all-NULL column defaults to FLOAT64.
pub fn column_from_values(name: &str, values: Vec<Value>) -> Result<Column, ExecError> {
    let mut has_int = false;
    let mut has_float = false;
    let mut has_str = false;
    let mut has_bool = false;
    for v in &values {
        match v {
            Value::Int(_) => has_int = true,
            Value::Float(_) => has_float = true,
            Value::Str(_) => has_str = true,
            Value::Bool(_) => has_bool = true,
            Value::Null => {}
        }
    }

    let numeric = has_int || has_float;
    if (has_str && (numeric || has_bool)) || (has_bool && numeric) {
        return Err(ExecError::TypeMismatch(format!(
            "mixed value kinds in column '{}'",
            name
        )));
    }

    let data = if has_float {
        ColumnData::Float(
            values
                .into_iter()
                .map(|v| match v {
                    Value::Int(x) => Some(x as f64),
                    Value::Float(x) => Some(x),
                    _ => None,
                })
                .collect(),
        )
    } else if has_int {
        ColumnData::Int(
            values
                .into_iter()
                .map(|v| match v {
                    Value::Int(x) => Some(x),
                    _ => None,
                })
                .collect(),
        )
    } else if has_str {
        ColumnData::Str(
            values
                .into_iter()
                .map(|v| match v {
                    Value::Str(x) => Some(x),
                    _ => None,
                })
                .collect(),
        )
    } else if has_bool {
        ColumnData::Bool(
            values
                .into_iter()
                .map(|v| match v {
                    Value::Bool(x) => Some(x),
                    _ => None,
                })
                .collect(),
        )
    } else {
        ColumnData::Float(vec![None; values.len()])
    };

    Ok(Column::new(name, data))
}

/// Numeric operand rows: NULL-capable i64 or f64 vectors.
enum Numeric {
    Int(Vec<Option<i64>>),
    Float(Vec<Option<f64>>),
}

impl Numeric {
    fn into_floats(self) -> Vec<Option<f64>> {
        match self {
            Numeric::Int(v) => v.into_iter().map(|x| x.map(|i| i as f64)).collect(),
            Numeric::Float(v) => v,
        }
    }
}

/// Coerce an evaluation result to `len` numeric rows.
fn numeric_operand(ev: Evaluated, len: usize, what: &str) -> Result<Numeric, ExecError> {
    match ev {
        Evaluated::Scalar(Value::Int(x)) => Ok(Numeric::Int(vec![Some(x); len])),
        Evaluated::Scalar(Value::Float(x)) => Ok(Numeric::Float(vec![Some(x); len])),
        Evaluated::Scalar(Value::Null) => Ok(Numeric::Float(vec![None; len])),
        Evaluated::Scalar(v) => Err(ExecError::TypeMismatch(format!(
            "{} requires numeric operands, got {}",
            what, v
        ))),
        Evaluated::Column(c) => match c.data() {
            ColumnData::Int(v) => Ok(Numeric::Int(v.clone())),
            ColumnData::Float(v) => Ok(Numeric::Float(v.clone())),
            _ => Err(ExecError::TypeMismatch(format!(
                "{} requires numeric operands, column '{}' is {}",
                what,
                c.name(),
                c.data_type()
            ))),
        },
    }
}

fn eval_arith(
    left: &Expr,
    op: ArithOp,
    right: &Expr,
    table: &Table,
    ctx: &EvalContext,
    name: &str,
) -> Result<Evaluated, ExecError> {
    let l = evaluate(left, table, ctx)?;
    let r = evaluate(right, table, ctx)?;
    let scalar = matches!(&l, Evaluated::Scalar(_)) && matches!(&r, Evaluated::Scalar(_));
    let len = if scalar { 1 } else { ctx.row_count(table) };

    let what = format!("operator '{}'", op);
    let ln = numeric_operand(l, len, &what)?;
    let rn = numeric_operand(r, len, &what)?;

    // Int op Int stays Int, except division, which is always floating-point
    // (IEEE inf/NaN on zero divisors, never trapped).
    let data = match (ln, rn, op) {
        (Numeric::Int(a), Numeric::Int(b), ArithOp::Add) => {
            ColumnData::Int(zip_int(a, b, |x, y| x + y))
        }
        (Numeric::Int(a), Numeric::Int(b), ArithOp::Sub) => {
            ColumnData::Int(zip_int(a, b, |x, y| x - y))
        }
        (Numeric::Int(a), Numeric::Int(b), ArithOp::Mul) => {
            ColumnData::Int(zip_int(a, b, |x, y| x * y))
        }
        (a, b, op) => {
            let fa = a.into_floats();
            let fb = b.into_floats();
            let f = match op {
                ArithOp::Add => |x: f64, y: f64| x + y,
                ArithOp::Sub => |x: f64, y: f64| x - y,
                ArithOp::Mul => |x: f64, y: f64| x * y,
                ArithOp::Div => |x: f64, y: f64| x / y,
            };
            ColumnData::Float(zip_float(fa, fb, f))
        }
    };

    let col = Column::new(name, data);
    if scalar {
        Ok(Evaluated::Scalar(col.value(0)))
    } else {
        Ok(Evaluated::Column(col))
    }
}

fn zip_int(
    a: Vec<Option<i64>>,
    b: Vec<Option<i64>>,
    f: impl Fn(i64, i64) -> i64,
) -> Vec<Option<i64>> {
    a.into_iter()
        .zip(b)
        .map(|(x, y)| match (x, y) {
            (Some(x), Some(y)) => Some(f(x, y)),
            _ => None,
        })
        .collect()
}

fn zip_float(
    a: Vec<Option<f64>>,
    b: Vec<Option<f64>>,
    f: impl Fn(f64, f64) -> f64,
) -> Vec<Option<f64>> {
    a.into_iter()
        .zip(b)
        .map(|(x, y)| match (x, y) {
            (Some(x), Some(y)) => Some(f(x, y)),
            _ => None,
        })
        .collect()
}

/// Reduce one aggregate call over the context's rows to a scalar.
fn eval_aggregate(
    func: AggFunc,
    arg: &Expr,
    table: &Table,
    ctx: &EvalContext,
) -> Result<Value, ExecError> {
    if arg.contains_aggregate() {
        return Err(ExecError::InvalidGroupBy(format!(
            "nested aggregate in '{}'",
            arg
        )));
    }

    // count(*) counts rows, including NULLs.
    if matches!(arg, Expr::Wildcard) {
        if func == AggFunc::Count {
            return Ok(Value::Int(ctx.row_count(table) as i64));
        }
        return Err(ExecError::TypeMismatch(format!(
            "{}(*) is not supported; '*' is only valid in count(*)",
            func
        )));
    }

    let inner = evaluate(arg, table, &ctx.scalar_view())?;

    // count(expr) counts non-NULL values of any kind.
    if func == AggFunc::Count {
        return match inner {
            Evaluated::Column(c) => Ok(Value::Int((c.len() - c.null_count()) as i64)),
            Evaluated::Scalar(Value::Null) => Ok(Value::Int(0)),
            Evaluated::Scalar(_) => Ok(Value::Int(ctx.row_count(table) as i64)),
        };
    }

    let len = ctx.row_count(table);
    let what = format!("{}()", func);
    match numeric_operand(inner, len, &what)? {
        Numeric::Int(v) => {
            let vals: Vec<i64> = v.into_iter().flatten().collect();
            Ok(match func {
                AggFunc::Sum => Value::Int(vals.iter().sum()),
                AggFunc::Avg => {
                    if vals.is_empty() {
                        Value::Null
                    } else {
                        Value::Float(vals.iter().sum::<i64>() as f64 / vals.len() as f64)
                    }
                }
                AggFunc::Min => vals.iter().min().map_or(Value::Null, |&m| Value::Int(m)),
                AggFunc::Max => vals.iter().max().map_or(Value::Null, |&m| Value::Int(m)),
                AggFunc::Count => unreachable!("count handled above"),
            })
        }
        Numeric::Float(v) => {
            let vals: Vec<f64> = v.into_iter().flatten().collect();
            Ok(match func {
                AggFunc::Sum => Value::Float(vals.iter().sum()),
                AggFunc::Avg => {
                    if vals.is_empty() {
                        Value::Null
                    } else {
                        Value::Float(vals.iter().sum::<f64>() / vals.len() as f64)
                    }
                }
                AggFunc::Min => vals
                    .iter()
                    .copied()
                    .fold(None, |acc: Option<f64>, x| {
                        Some(acc.map_or(x, |a| a.min(x)))
                    })
                    .map_or(Value::Null, Value::Float),
                AggFunc::Max => vals
                    .iter()
                    .copied()
                    .fold(None, |acc: Option<f64>, x| {
                        Some(acc.map_or(x, |a| a.max(x)))
                    })
                    .map_or(Value::Null, Value::Float),
                AggFunc::Count => unreachable!("count handled above"),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_table() -> Table {
        Table::new(
            "t",
            vec![
                Column::from_ints("a", vec![Some(1), Some(2), Some(3), Some(4)]),
                Column::from_ints("b", vec![Some(10), None, Some(30), Some(40)]),
                Column::from_floats("f", vec![Some(1.5), Some(2.5), None, Some(4.0)]),
                Column::from_strs(
                    "s",
                    vec![Some("x".into()), Some("y".into()), Some("x".into()), None],
                ),
            ],
        )
    }

    fn col(name: &str) -> Expr {
        Expr::Column(name.into())
    }

    fn arith(left: Expr, op: ArithOp, right: Expr) -> Expr {
        Expr::Arith {
            left: Box::new(left),
            op,
            right: Box::new(right),
        }
    }

    fn agg(func: AggFunc, arg: Expr) -> Expr {
        Expr::Aggregate {
            func,
            arg: Box::new(arg),
        }
    }

    #[test]
    fn test_column_reference() {
        let t = sample_table();
        let out = evaluate(&col("a"), &t, &EvalContext::all_rows()).unwrap();
        match out {
            Evaluated::Column(c) => {
                assert_eq!(c.name(), "a");
                assert_eq!(c.len(), 4);
            }
            other => panic!("expected Column, got: {:?}", other),
        }
    }

    #[test]
    fn test_unknown_column() {
        let t = sample_table();
        let err = evaluate(&col("missing"), &t, &EvalContext::all_rows()).unwrap_err();
        assert_eq!(err, ExecError::UnknownColumn("missing".into()));
    }

    #[test]
    fn test_literal_stays_scalar() {
        let t = sample_table();
        let out = evaluate(
            &Expr::Literal(Value::Int(7)),
            &t,
            &EvalContext::all_rows(),
        )
        .unwrap();
        assert_eq!(out, Evaluated::Scalar(Value::Int(7)));
    }

    #[test]
    fn test_arith_int_preserves_kind() {
        let t = sample_table();
        let expr = arith(col("a"), ArithOp::Add, col("b"));
        match evaluate(&expr, &t, &EvalContext::all_rows()).unwrap() {
            Evaluated::Column(c) => {
                assert_eq!(c.name(), "a + b");
                assert_eq!(
                    c.values(),
                    vec![Value::Int(11), Value::Null, Value::Int(33), Value::Int(44)]
                );
            }
            other => panic!("expected Column, got: {:?}", other),
        }
    }

    #[test]
    fn test_arith_mixed_promotes_to_float() {
        let t = sample_table();
        let expr = arith(col("a"), ArithOp::Mul, col("f"));
        match evaluate(&expr, &t, &EvalContext::all_rows()).unwrap() {
            Evaluated::Column(c) => {
                assert_eq!(
                    c.values(),
                    vec![
                        Value::Float(1.5),
                        Value::Float(5.0),
                        Value::Null,
                        Value::Float(16.0)
                    ]
                );
            }
            other => panic!("expected Column, got: {:?}", other),
        }
    }

    #[test]
    fn test_division_is_always_float() {
        let t = sample_table();
        let expr = arith(col("a"), ArithOp::Div, Expr::Literal(Value::Int(2)));
        match evaluate(&expr, &t, &EvalContext::all_rows()).unwrap() {
            Evaluated::Column(c) => {
                assert_eq!(c.value(0), Value::Float(0.5));
                assert_eq!(c.value(1), Value::Float(1.0));
            }
            other => panic!("expected Column, got: {:?}", other),
        }
    }

    #[test]
    fn test_division_by_zero_yields_infinity() {
        let t = sample_table();
        let expr = arith(col("a"), ArithOp::Div, Expr::Literal(Value::Int(0)));
        match evaluate(&expr, &t, &EvalContext::all_rows()).unwrap() {
            Evaluated::Column(c) => match c.value(0) {
                Value::Float(x) => assert!(x.is_infinite() && x > 0.0),
                other => panic!("expected Float, got: {:?}", other),
            },
            other => panic!("expected Column, got: {:?}", other),
        }
    }

    #[test]
    fn test_scalar_arith_stays_scalar() {
        let t = sample_table();
        let expr = arith(
            Expr::Literal(Value::Int(2)),
            ArithOp::Add,
            Expr::Literal(Value::Int(3)),
        );
        let out = evaluate(&expr, &t, &EvalContext::all_rows()).unwrap();
        assert_eq!(out, Evaluated::Scalar(Value::Int(5)));
    }

    #[test]
    fn test_arith_on_string_column_fails() {
        let t = sample_table();
        let expr = arith(col("s"), ArithOp::Add, Expr::Literal(Value::Int(1)));
        match evaluate(&expr, &t, &EvalContext::all_rows()).unwrap_err() {
            ExecError::TypeMismatch(msg) => assert!(msg.contains("'s'"), "got: {}", msg),
            other => panic!("expected TypeMismatch, got: {:?}", other),
        }
    }

    #[test]
    fn test_aggregate_outside_context_rejected() {
        let t = sample_table();
        let expr = agg(AggFunc::Sum, col("a"));
        match evaluate(&expr, &t, &EvalContext::all_rows()).unwrap_err() {
            ExecError::InvalidGroupBy(msg) => {
                assert!(msg.contains("sum(a)"), "got: {}", msg)
            }
            other => panic!("expected InvalidGroupBy, got: {:?}", other),
        }
    }

    #[test]
    fn test_count_star_counts_rows() {
        let t = sample_table();
        let expr = agg(AggFunc::Count, Expr::Wildcard);
        let out = evaluate(&expr, &t, &EvalContext::aggregate_all()).unwrap();
        assert_eq!(out, Evaluated::Scalar(Value::Int(4)));
    }

    #[test]
    fn test_count_column_skips_nulls() {
        let t = sample_table();
        let expr = agg(AggFunc::Count, col("b"));
        let out = evaluate(&expr, &t, &EvalContext::aggregate_all()).unwrap();
        assert_eq!(out, Evaluated::Scalar(Value::Int(3)));
    }

    #[test]
    fn test_sum_and_avg() {
        let t = sample_table();
        let out = evaluate(&agg(AggFunc::Sum, col("a")), &t, &EvalContext::aggregate_all()).unwrap();
        assert_eq!(out, Evaluated::Scalar(Value::Int(10)));

        let out = evaluate(&agg(AggFunc::Avg, col("a")), &t, &EvalContext::aggregate_all()).unwrap();
        assert_eq!(out, Evaluated::Scalar(Value::Float(2.5)));
    }

    #[test]
    fn test_sum_skips_nulls() {
        let t = sample_table();
        let out = evaluate(&agg(AggFunc::Sum, col("b")), &t, &EvalContext::aggregate_all()).unwrap();
        assert_eq!(out, Evaluated::Scalar(Value::Int(80)));
    }

    #[test]
    fn test_min_max() {
        let t = sample_table();
        let out = evaluate(&agg(AggFunc::Min, col("b")), &t, &EvalContext::aggregate_all()).unwrap();
        assert_eq!(out, Evaluated::Scalar(Value::Int(10)));

        let out = evaluate(&agg(AggFunc::Max, col("f")), &t, &EvalContext::aggregate_all()).unwrap();
        assert_eq!(out, Evaluated::Scalar(Value::Float(4.0)));
    }

    #[test]
    fn test_aggregate_over_group_rows_only() {
        let t = sample_table();
        let rows = vec![0, 2];
        let ctx = EvalContext::group(&rows);
        let out = evaluate(&agg(AggFunc::Sum, col("a")), &t, &ctx).unwrap();
        assert_eq!(out, Evaluated::Scalar(Value::Int(4)));

        let out = evaluate(&agg(AggFunc::Count, Expr::Wildcard), &t, &ctx).unwrap();
        assert_eq!(out, Evaluated::Scalar(Value::Int(2)));
    }

    #[test]
    fn test_sum_over_empty_is_typed_zero() {
        let t = sample_table();
        let rows: Vec<usize> = vec![];
        let ctx = EvalContext::group(&rows);
        let out = evaluate(&agg(AggFunc::Sum, col("a")), &t, &ctx).unwrap();
        assert_eq!(out, Evaluated::Scalar(Value::Int(0)));

        let out = evaluate(&agg(AggFunc::Avg, col("a")), &t, &ctx).unwrap();
        assert_eq!(out, Evaluated::Scalar(Value::Null));
    }

    #[test]
    fn test_sum_over_string_fails() {
        let t = sample_table();
        match evaluate(&agg(AggFunc::Sum, col("s")), &t, &EvalContext::aggregate_all()).unwrap_err()
        {
            ExecError::TypeMismatch(msg) => assert!(msg.contains("sum()"), "got: {}", msg),
            other => panic!("expected TypeMismatch, got: {:?}", other),
        }
    }

    #[test]
    fn test_nested_aggregate_rejected() {
        let t = sample_table();
        let expr = agg(AggFunc::Sum, agg(AggFunc::Count, Expr::Wildcard));
        match evaluate(&expr, &t, &EvalContext::aggregate_all()).unwrap_err() {
            ExecError::InvalidGroupBy(msg) => assert!(msg.contains("nested"), "got: {}", msg),
            other => panic!("expected InvalidGroupBy, got: {:?}", other),
        }
    }

    #[test]
    fn test_aggregate_of_arithmetic() {
        let t = sample_table();
        let expr = agg(AggFunc::Sum, arith(col("a"), ArithOp::Mul, col("a")));
        let out = evaluate(&expr, &t, &EvalContext::aggregate_all()).unwrap();
        assert_eq!(out, Evaluated::Scalar(Value::Int(30)));
    }

    #[test]
    fn test_sum_star_rejected() {
        let t = sample_table();
        let expr = agg(AggFunc::Sum, Expr::Wildcard);
        match evaluate(&expr, &t, &EvalContext::aggregate_all()).unwrap_err() {
            ExecError::TypeMismatch(msg) => assert!(msg.contains("count(*)"), "got: {}", msg),
            other => panic!("expected TypeMismatch, got: {:?}", other),
        }
    }

    #[test]
    fn test_into_column_broadcast() {
        let c = into_column(Evaluated::Scalar(Value::Int(1)), "const", 3);
        assert_eq!(
            c.values(),
            vec![Value::Int(1), Value::Int(1), Value::Int(1)]
        );
        assert_eq!(c.name(), "const");
    }

    #[test]
    fn test_column_from_values_promotion() {
        let c = column_from_values("m", vec![Value::Int(1), Value::Float(2.5), Value::Null])
            .unwrap();
        assert_eq!(
            c.values(),
            vec![Value::Float(1.0), Value::Float(2.5), Value::Null]
        );

        let err = column_from_values("m", vec![Value::Int(1), Value::Str("x".into())]);
        assert!(err.is_err());
    }
}
