//! Core type definitions for the SQL engine.
//!
//! These types form the intermediate representation between the sqlparser AST
//! and the executor. They are independent of the parser library and of the
//! columnar storage layer.

use std::fmt;

/// Literal values in SQL expressions and cell values in query results.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Float(f64),
    Str(String),
    Bool(bool),
    Null,
}

impl Value {
    /// True for `Value::Null`.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{}", v),
            Value::Str(v) => write!(f, "'{}'", v),
            Value::Bool(v) => write!(f, "{}", v),
            Value::Null => write!(f, "NULL"),
        }
    }
}

/// Binary arithmetic operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl fmt::Display for ArithOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArithOp::Add => write!(f, "+"),
            ArithOp::Sub => write!(f, "-"),
            ArithOp::Mul => write!(f, "*"),
            ArithOp::Div => write!(f, "/"),
        }
    }
}

/// Comparison operators for WHERE predicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompareOp::Eq => write!(f, "="),
            CompareOp::Ne => write!(f, "!="),
            CompareOp::Lt => write!(f, "<"),
            CompareOp::Le => write!(f, "<="),
            CompareOp::Gt => write!(f, ">"),
            CompareOp::Ge => write!(f, ">="),
        }
    }
}

/// Aggregate functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AggFunc {
    Count,
    Sum,
    Avg,
    Min,
    Max,
}

impl fmt::Display for AggFunc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Lowercase: this rendering doubles as the default output-column name
        // for unaliased aggregates, e.g. "sum(fare)".
        match self {
            AggFunc::Count => write!(f, "count"),
            AggFunc::Sum => write!(f, "sum"),
            AggFunc::Avg => write!(f, "avg"),
            AggFunc::Min => write!(f, "min"),
            AggFunc::Max => write!(f, "max"),
        }
    }
}

/// Logical operator for compound predicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
}

/// SQL expression tree.
///
/// A closed variant set matched exhaustively by the evaluators: adding a new
/// expression kind is a compile-time-checked extension point.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Column reference by name.
    Column(String),
    /// Literal value.
    Literal(Value),
    /// Binary arithmetic: left op right.
    Arith {
        left: Box<Expr>,
        op: ArithOp,
        right: Box<Expr>,
    },
    /// Binary comparison: left op right.
    Compare {
        left: Box<Expr>,
        op: CompareOp,
        right: Box<Expr>,
    },
    /// Compound predicate: left AND/OR right.
    Compound {
        left: Box<Expr>,
        op: LogicalOp,
        right: Box<Expr>,
    },
    /// Negated predicate.
    Not(Box<Expr>),
    /// Aggregate function call.
    Aggregate {
        func: AggFunc,
        /// The argument expression. For COUNT(*), this is `Expr::Wildcard`.
        arg: Box<Expr>,
    },
    /// Wildcard (*) in SELECT or COUNT(*).
    Wildcard,
}

impl Expr {
    /// Check if this expression contains any aggregate function calls.
    pub fn contains_aggregate(&self) -> bool {
        match self {
            Expr::Aggregate { .. } => true,
            Expr::Arith { left, right, .. }
            | Expr::Compare { left, right, .. }
            | Expr::Compound { left, right, .. } => {
                left.contains_aggregate() || right.contains_aggregate()
            }
            Expr::Not(inner) => inner.contains_aggregate(),
            Expr::Column(_) | Expr::Literal(_) | Expr::Wildcard => false,
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Column(name) => write!(f, "{}", name),
            Expr::Literal(val) => write!(f, "{}", val),
            Expr::Arith { left, op, right } => write!(f, "{} {} {}", left, op, right),
            Expr::Compare { left, op, right } => write!(f, "{} {} {}", left, op, right),
            Expr::Compound { left, op, right } => {
                let op_str = match op {
                    LogicalOp::And => "AND",
                    LogicalOp::Or => "OR",
                };
                write!(f, "({} {} {})", left, op_str, right)
            }
            Expr::Not(inner) => write!(f, "NOT {}", inner),
            Expr::Aggregate { func, arg } => write!(f, "{}({})", func, arg),
            Expr::Wildcard => write!(f, "*"),
        }
    }
}

/// One entry in a SELECT list: an expression with an optional alias.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectItem {
    pub expr: Expr,
    pub alias: Option<String>,
}

impl SelectItem {
    /// The name the projected column takes in the result: the alias if
    /// present, else the source text of the expression.
    pub fn output_name(&self) -> String {
        match &self.alias {
            Some(alias) => alias.clone(),
            None => self.expr.to_string(),
        }
    }
}

/// A parsed single-table SELECT statement, ready for execution.
///
/// The parser guarantees syntactic well-formedness; semantic validity
/// (column existence, GROUP BY rules) is checked by the executor.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectStatement {
    /// Target table name.
    pub table: String,
    /// Ordered select list.
    pub items: Vec<SelectItem>,
    /// WHERE predicate, if any.
    pub predicate: Option<Expr>,
    /// GROUP BY column names, in statement order.
    pub group_by: Vec<String>,
    /// Whether the whole select list is DISTINCT.
    pub distinct: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_display() {
        assert_eq!(Value::Int(42).to_string(), "42");
        #[allow(clippy::approx_constant)]
        let pi_approx = 3.14;
        assert_eq!(Value::Float(pi_approx).to_string(), "3.14");
        assert_eq!(Value::Str("hello".into()).to_string(), "'hello'");
        assert_eq!(Value::Bool(true).to_string(), "true");
        assert_eq!(Value::Null.to_string(), "NULL");
    }

    #[test]
    fn test_compare_display() {
        let expr = Expr::Compare {
            left: Box::new(Expr::Column("amount".into())),
            op: CompareOp::Gt,
            right: Box::new(Expr::Literal(Value::Int(100))),
        };
        assert_eq!(expr.to_string(), "amount > 100");
    }

    #[test]
    fn test_arith_display() {
        let expr = Expr::Arith {
            left: Box::new(Expr::Column("passenger_id".into())),
            op: ArithOp::Add,
            right: Box::new(Expr::Column("survived".into())),
        };
        assert_eq!(expr.to_string(), "passenger_id + survived");
    }

    #[test]
    fn test_aggregate_display() {
        let expr = Expr::Aggregate {
            func: AggFunc::Count,
            arg: Box::new(Expr::Wildcard),
        };
        assert_eq!(expr.to_string(), "count(*)");

        let expr = Expr::Aggregate {
            func: AggFunc::Sum,
            arg: Box::new(Expr::Column("fare".into())),
        };
        assert_eq!(expr.to_string(), "sum(fare)");
    }

    #[test]
    fn test_compound_display() {
        let expr = Expr::Compound {
            left: Box::new(Expr::Compare {
                left: Box::new(Expr::Column("a".into())),
                op: CompareOp::Gt,
                right: Box::new(Expr::Literal(Value::Int(1))),
            }),
            op: LogicalOp::And,
            right: Box::new(Expr::Not(Box::new(Expr::Compare {
                left: Box::new(Expr::Column("b".into())),
                op: CompareOp::Eq,
                right: Box::new(Expr::Literal(Value::Str("x".into()))),
            }))),
        };
        assert_eq!(expr.to_string(), "(a > 1 AND NOT b = 'x')");
    }

    #[test]
    fn test_contains_aggregate() {
        let plain = Expr::Arith {
            left: Box::new(Expr::Column("a".into())),
            op: ArithOp::Add,
            right: Box::new(Expr::Literal(Value::Int(1))),
        };
        assert!(!plain.contains_aggregate());

        let nested = Expr::Arith {
            left: Box::new(Expr::Aggregate {
                func: AggFunc::Sum,
                arg: Box::new(Expr::Column("a".into())),
            }),
            op: ArithOp::Div,
            right: Box::new(Expr::Literal(Value::Int(2))),
        };
        assert!(nested.contains_aggregate());
    }

    #[test]
    fn test_output_name_alias_wins() {
        let item = SelectItem {
            expr: Expr::Column("passenger_id".into()),
            alias: Some("p1".into()),
        };
        assert_eq!(item.output_name(), "p1");
    }

    #[test]
    fn test_output_name_defaults_to_source_text() {
        let item = SelectItem {
            expr: Expr::Arith {
                left: Box::new(Expr::Column("passenger_id".into())),
                op: ArithOp::Add,
                right: Box::new(Expr::Column("survived".into())),
            },
            alias: None,
        };
        assert_eq!(item.output_name(), "passenger_id + survived");

        let item = SelectItem {
            expr: Expr::Column("fare".into()),
            alias: None,
        };
        assert_eq!(item.output_name(), "fare");
    }
}
