//! SQL parser wrapping `sqlparser-rs` for the supported SELECT subset.
//!
//! Converts a SQL string into a [`SelectStatement`]. Only single-table
//! SELECT is supported -- see the module-level doc for `sql::mod.rs`.

use sqlparser::ast::{
    self as sp, Expr as SpExpr, FunctionArg, FunctionArgExpr, GroupByExpr,
    SelectItem as SpSelectItem, SetExpr, Statement, TableFactor,
};
use sqlparser::dialect::GenericDialect;
use sqlparser::parser::Parser;

use super::types::{
    AggFunc, ArithOp, CompareOp, Expr, LogicalOp, SelectItem, SelectStatement, Value,
};

/// Errors that can occur during SQL parsing.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseError {
    /// sqlparser returned an error.
    SqlParser(String),
    /// The SQL statement is not a SELECT query.
    NotASelect,
    /// Unsupported SQL feature.
    Unsupported(String),
    /// Missing FROM clause.
    MissingFrom,
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseError::SqlParser(msg) => write!(f, "SQL parse error: {}", msg),
            ParseError::NotASelect => write!(f, "only SELECT statements are supported"),
            ParseError::Unsupported(msg) => write!(f, "unsupported SQL: {}", msg),
            ParseError::MissingFrom => write!(f, "missing FROM clause"),
        }
    }
}

impl std::error::Error for ParseError {}

/// Parse a SQL query string into a SelectStatement.
///
/// Only SELECT statements are supported. The parser handles:
/// - Column references, wildcards, literals, and aliases (`AS`)
/// - Arithmetic expressions: + - * /
/// - Aggregate functions: count, sum, avg, min, max (including count(*))
/// - DISTINCT over the whole select list
/// - WHERE with comparison predicates and AND/OR/NOT compounds
/// - GROUP BY column list
///
/// ORDER BY, LIMIT, JOINs, subqueries, and set operations are rejected.
pub fn parse_select(sql: &str) -> Result<SelectStatement, ParseError> {
    let dialect = GenericDialect {};
    let statements =
        Parser::parse_sql(&dialect, sql).map_err(|e| ParseError::SqlParser(e.to_string()))?;

    if statements.len() != 1 {
        return Err(ParseError::Unsupported(format!(
            "expected exactly one statement, got {}",
            statements.len()
        )));
    }

    let statement = &statements[0];
    match statement {
        Statement::Query(query) => convert_query(query),
        _ => Err(ParseError::NotASelect),
    }
}

/// Convert a sqlparser Query to our SelectStatement.
fn convert_query(query: &sp::Query) -> Result<SelectStatement, ParseError> {
    if let Some(sp::OrderBy { exprs, .. }) = &query.order_by {
        if !exprs.is_empty() {
            return Err(ParseError::Unsupported("ORDER BY is not supported".into()));
        }
    }
    if query.limit.is_some() {
        return Err(ParseError::Unsupported("LIMIT is not supported".into()));
    }

    let select = match query.body.as_ref() {
        SetExpr::Select(select) => select.as_ref(),
        _ => {
            return Err(ParseError::Unsupported(
                "only simple SELECT queries are supported (no UNION, INTERSECT, etc.)".into(),
            ))
        }
    };

    if select.having.is_some() {
        return Err(ParseError::Unsupported("HAVING is not supported".into()));
    }

    let table = extract_table_name(select)?;

    let distinct = match &select.distinct {
        None => false,
        Some(sp::Distinct::Distinct) => true,
        Some(sp::Distinct::On(_)) => {
            return Err(ParseError::Unsupported("DISTINCT ON is not supported".into()))
        }
    };

    let predicate = match &select.selection {
        Some(selection) => Some(convert_expr(selection)?),
        None => None,
    };

    let items = convert_select_items(&select.projection)?;
    let group_by = convert_group_by(&select.group_by)?;

    Ok(SelectStatement {
        table,
        items,
        predicate,
        group_by,
        distinct,
    })
}

/// Extract the single table name from the FROM clause.
fn extract_table_name(select: &sp::Select) -> Result<String, ParseError> {
    if select.from.is_empty() {
        return Err(ParseError::MissingFrom);
    }
    if select.from.len() > 1 {
        return Err(ParseError::Unsupported(
            "multiple FROM tables (joins) not supported".into(),
        ));
    }

    let table_with_joins = &select.from[0];
    if !table_with_joins.joins.is_empty() {
        return Err(ParseError::Unsupported("JOINs not supported".into()));
    }

    match &table_with_joins.relation {
        TableFactor::Table { name, .. } => {
            // name is ObjectName which is a Vec<Ident>
            let parts: Vec<String> = name.0.iter().map(|ident| ident.value.clone()).collect();
            Ok(parts.join("."))
        }
        _ => Err(ParseError::Unsupported(
            "only simple table references are supported in FROM".into(),
        )),
    }
}

/// Convert SELECT items to our SelectItem type, carrying aliases through.
fn convert_select_items(items: &[SpSelectItem]) -> Result<Vec<SelectItem>, ParseError> {
    let mut out = Vec::new();

    for item in items {
        match item {
            SpSelectItem::UnnamedExpr(expr) => {
                out.push(SelectItem {
                    expr: convert_expr(expr)?,
                    alias: None,
                });
            }
            SpSelectItem::ExprWithAlias { expr, alias } => {
                out.push(SelectItem {
                    expr: convert_expr(expr)?,
                    alias: Some(alias.value.clone()),
                });
            }
            SpSelectItem::Wildcard(_) | SpSelectItem::QualifiedWildcard(_, _) => {
                out.push(SelectItem {
                    expr: Expr::Wildcard,
                    alias: None,
                });
            }
        }
    }

    Ok(out)
}

/// Convert the GROUP BY clause to a list of column names.
fn convert_group_by(group_by: &GroupByExpr) -> Result<Vec<String>, ParseError> {
    match group_by {
        GroupByExpr::All(_) => Err(ParseError::Unsupported("GROUP BY ALL not supported".into())),
        GroupByExpr::Expressions(exprs, _modifiers) => exprs
            .iter()
            .map(|e| match convert_expr(e)? {
                Expr::Column(name) => Ok(name),
                other => Err(ParseError::Unsupported(format!(
                    "GROUP BY supports plain column names only, got '{}'",
                    other
                ))),
            })
            .collect(),
    }
}

/// Convert a sqlparser expression to our Expr type.
fn convert_expr(expr: &SpExpr) -> Result<Expr, ParseError> {
    match expr {
        // Column reference: just an identifier
        SpExpr::Identifier(ident) => Ok(Expr::Column(ident.value.clone())),

        // Compound identifier (e.g., t.col)
        SpExpr::CompoundIdentifier(parts) => {
            // Use the last part as the column name
            let name = parts
                .last()
                .map(|i| i.value.clone())
                .ok_or_else(|| ParseError::Unsupported("empty compound identifier".into()))?;
            Ok(Expr::Column(name))
        }

        // Literal
        SpExpr::Value(val) => convert_value(val),

        // Unary minus (negative numbers)
        SpExpr::UnaryOp {
            op: sp::UnaryOperator::Minus,
            expr: inner,
        } => {
            let inner_val = convert_expr(inner)?;
            match inner_val {
                Expr::Literal(Value::Int(n)) => Ok(Expr::Literal(Value::Int(-n))),
                Expr::Literal(Value::Float(n)) => Ok(Expr::Literal(Value::Float(-n))),
                _ => Err(ParseError::Unsupported(
                    "unary minus only supported on numeric literals".into(),
                )),
            }
        }

        // NOT predicate
        SpExpr::UnaryOp {
            op: sp::UnaryOperator::Not,
            expr: inner,
        } => Ok(Expr::Not(Box::new(convert_expr(inner)?))),

        // Binary operator (arithmetic, comparison, or logical)
        SpExpr::BinaryOp { left, op, right } => {
            let l = Box::new(convert_expr(left)?);
            let r = Box::new(convert_expr(right)?);
            match op {
                sp::BinaryOperator::And => Ok(Expr::Compound {
                    left: l,
                    op: LogicalOp::And,
                    right: r,
                }),
                sp::BinaryOperator::Or => Ok(Expr::Compound {
                    left: l,
                    op: LogicalOp::Or,
                    right: r,
                }),
                sp::BinaryOperator::Plus => Ok(Expr::Arith {
                    left: l,
                    op: ArithOp::Add,
                    right: r,
                }),
                sp::BinaryOperator::Minus => Ok(Expr::Arith {
                    left: l,
                    op: ArithOp::Sub,
                    right: r,
                }),
                sp::BinaryOperator::Multiply => Ok(Expr::Arith {
                    left: l,
                    op: ArithOp::Mul,
                    right: r,
                }),
                sp::BinaryOperator::Divide => Ok(Expr::Arith {
                    left: l,
                    op: ArithOp::Div,
                    right: r,
                }),
                _ => Ok(Expr::Compare {
                    left: l,
                    op: convert_binop(op)?,
                    right: r,
                }),
            }
        }

        // Function call (aggregate)
        SpExpr::Function(func) => convert_function(func),

        // Nested expression in parentheses
        SpExpr::Nested(inner) => convert_expr(inner),

        _ => Err(ParseError::Unsupported(format!(
            "expression type not supported: {:?}",
            std::mem::discriminant(expr)
        ))),
    }
}

/// Convert a sqlparser Value to our Value type.
fn convert_value(val: &sp::Value) -> Result<Expr, ParseError> {
    match val {
        sp::Value::Number(s, _) => {
            // Try integer first, then float
            if let Ok(i) = s.parse::<i64>() {
                Ok(Expr::Literal(Value::Int(i)))
            } else if let Ok(f) = s.parse::<f64>() {
                Ok(Expr::Literal(Value::Float(f)))
            } else {
                Err(ParseError::Unsupported(format!("cannot parse number: {}", s)))
            }
        }
        sp::Value::SingleQuotedString(s) => Ok(Expr::Literal(Value::Str(s.clone()))),
        sp::Value::DoubleQuotedString(s) => Ok(Expr::Literal(Value::Str(s.clone()))),
        sp::Value::Null => Ok(Expr::Literal(Value::Null)),
        sp::Value::Boolean(b) => Ok(Expr::Literal(Value::Bool(*b))),
        _ => Err(ParseError::Unsupported(format!(
            "value type not supported: {:?}",
            val
        ))),
    }
}

/// Convert a sqlparser binary operator to our CompareOp.
fn convert_binop(op: &sp::BinaryOperator) -> Result<CompareOp, ParseError> {
    match op {
        sp::BinaryOperator::Eq => Ok(CompareOp::Eq),
        sp::BinaryOperator::NotEq => Ok(CompareOp::Ne),
        sp::BinaryOperator::Lt => Ok(CompareOp::Lt),
        sp::BinaryOperator::LtEq => Ok(CompareOp::Le),
        sp::BinaryOperator::Gt => Ok(CompareOp::Gt),
        sp::BinaryOperator::GtEq => Ok(CompareOp::Ge),
        _ => Err(ParseError::Unsupported(format!(
            "binary operator not supported: {:?}",
            op
        ))),
    }
}

/// Convert a sqlparser Function to our aggregate Expr.
fn convert_function(func: &sp::Function) -> Result<Expr, ParseError> {
    let name = func
        .name
        .0
        .iter()
        .map(|i| i.value.to_lowercase())
        .collect::<Vec<_>>()
        .join(".");

    let agg_func = match name.as_str() {
        "count" => AggFunc::Count,
        "sum" => AggFunc::Sum,
        "avg" => AggFunc::Avg,
        "min" => AggFunc::Min,
        "max" => AggFunc::Max,
        _ => {
            return Err(ParseError::Unsupported(format!(
                "function not supported: {}",
                name
            )))
        }
    };

    // Extract the argument
    let args = match &func.args {
        sp::FunctionArguments::None => vec![],
        sp::FunctionArguments::Subquery(_) => {
            return Err(ParseError::Unsupported(
                "subquery arguments not supported".into(),
            ));
        }
        sp::FunctionArguments::List(arg_list) => arg_list.args.clone(),
    };

    let arg_expr = if args.is_empty() {
        // COUNT() with no args -> treat as COUNT(*)
        Expr::Wildcard
    } else if args.len() == 1 {
        match &args[0] {
            FunctionArg::Unnamed(FunctionArgExpr::Wildcard) => Expr::Wildcard,
            FunctionArg::Unnamed(FunctionArgExpr::Expr(expr)) => convert_expr(expr)?,
            FunctionArg::Unnamed(FunctionArgExpr::QualifiedWildcard(_)) => Expr::Wildcard,
            FunctionArg::Named { arg, .. } => match arg {
                FunctionArgExpr::Wildcard => Expr::Wildcard,
                FunctionArgExpr::Expr(expr) => convert_expr(expr)?,
                FunctionArgExpr::QualifiedWildcard(_) => Expr::Wildcard,
            },
        }
    } else {
        return Err(ParseError::Unsupported(format!(
            "aggregate function with {} arguments not supported",
            args.len()
        )));
    };

    Ok(Expr::Aggregate {
        func: agg_func,
        arg: Box::new(arg_expr),
    })
}
