//! Abstract syntax tree for subset predicates

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// A subset predicate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SelectionExpr {
    /// Logical AND of two expressions
    And(Box<SelectionExpr>, Box<SelectionExpr>),

    /// Logical OR of two expressions
    Or(Box<SelectionExpr>, Box<SelectionExpr>),

    /// Logical NOT of an expression
    Not(Box<SelectionExpr>),

    /// Comparison between a field and a value
    Comparison(Comparison),

    /// Every point
    All,

    /// No points
    None,
}

impl SelectionExpr {
    /// Create an AND expression
    pub fn and(a: SelectionExpr, b: SelectionExpr) -> Self {
        Self::And(Box::new(a), Box::new(b))
    }

    /// Create an OR expression
    pub fn or(a: SelectionExpr, b: SelectionExpr) -> Self {
        Self::Or(Box::new(a), Box::new(b))
    }

    /// Create a NOT expression
    pub fn not(e: SelectionExpr) -> Self {
        Self::Not(Box::new(e))
    }

    /// Names of every field the predicate reads
    pub fn fields(&self) -> BTreeSet<String> {
        let mut out = BTreeSet::new();
        self.collect_fields(&mut out);
        out
    }

    fn collect_fields(&self, out: &mut BTreeSet<String>) {
        match self {
            Self::And(a, b) | Self::Or(a, b) => {
                a.collect_fields(out);
                b.collect_fields(out);
            }
            Self::Not(e) => e.collect_fields(out),
            Self::Comparison(c) => {
                for v in [&c.lhs, &c.rhs] {
                    if let Value::Field(name) = v {
                        out.insert(name.clone());
                    }
                }
            }
            Self::All | Self::None => {}
        }
    }
}

impl fmt::Display for SelectionExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::And(a, b) => write!(f, "({} && {})", a, b),
            Self::Or(a, b) => write!(f, "({} || {})", a, b),
            Self::Not(e) => write!(f, "!{}", e),
            Self::Comparison(c) => write!(f, "{} {} {}", c.lhs, c.op.as_str(), c.rhs),
            Self::All => f.write_str("all"),
            Self::None => f.write_str("none"),
        }
    }
}

/// A comparison expression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comparison {
    /// Left-hand side
    pub lhs: Value,
    /// Operator
    pub op: ComparisonOp,
    /// Right-hand side
    pub rhs: Value,
}

impl Comparison {
    /// Create a new comparison
    pub fn new(lhs: Value, op: ComparisonOp, rhs: Value) -> Self {
        Self { lhs, op, rhs }
    }

    /// Create a field > value comparison
    pub fn field_gt(field: &str, value: f64) -> Self {
        Self::new(
            Value::Field(field.to_string()),
            ComparisonOp::Gt,
            Value::Number(value),
        )
    }

    /// Create a field < value comparison
    pub fn field_lt(field: &str, value: f64) -> Self {
        Self::new(
            Value::Field(field.to_string()),
            ComparisonOp::Lt,
            Value::Number(value),
        )
    }
}

/// Comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComparisonOp {
    /// Less than (<)
    Lt,
    /// Less than or equal (<=)
    Le,
    /// Greater than (>)
    Gt,
    /// Greater than or equal (>=)
    Ge,
    /// Equal (==)
    Eq,
    /// Not equal (!=)
    Ne,
}

impl ComparisonOp {
    /// Evaluate the comparison for two f64 values
    pub fn evaluate(&self, lhs: f64, rhs: f64) -> bool {
        match self {
            ComparisonOp::Lt => lhs < rhs,
            ComparisonOp::Le => lhs <= rhs,
            ComparisonOp::Gt => lhs > rhs,
            ComparisonOp::Ge => lhs >= rhs,
            ComparisonOp::Eq => (lhs - rhs).abs() < 1e-10,
            ComparisonOp::Ne => (lhs - rhs).abs() >= 1e-10,
        }
    }

    /// Get the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            ComparisonOp::Lt => "<",
            ComparisonOp::Le => "<=",
            ComparisonOp::Gt => ">",
            ComparisonOp::Ge => ">=",
            ComparisonOp::Eq => "==",
            ComparisonOp::Ne => "!=",
        }
    }
}

/// A value in a comparison
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// A component reference
    Field(String),
    /// A numeric literal
    Number(f64),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Field(name) => f.write_str(name),
            Value::Number(n) => write!(f, "{}", n),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comparison_operators() {
        assert!(ComparisonOp::Lt.evaluate(1.0, 2.0));
        assert!(!ComparisonOp::Lt.evaluate(2.0, 1.0));
        assert!(ComparisonOp::Le.evaluate(1.0, 1.0));
        assert!(ComparisonOp::Gt.evaluate(2.0, 1.0));
        assert!(ComparisonOp::Eq.evaluate(1.0, 1.0));
        assert!(ComparisonOp::Ne.evaluate(1.0, 1.5));
    }

    #[test]
    fn test_fields_collects_both_sides() {
        let expr = SelectionExpr::or(
            SelectionExpr::Comparison(Comparison::field_gt("x", 1.0)),
            SelectionExpr::not(SelectionExpr::Comparison(Comparison::new(
                Value::Field("y".into()),
                ComparisonOp::Lt,
                Value::Field("z".into()),
            ))),
        );
        let fields: Vec<String> = expr.fields().into_iter().collect();
        assert_eq!(fields, vec!["x", "y", "z"]);
    }

    #[test]
    fn test_display() {
        let expr = SelectionExpr::and(
            SelectionExpr::Comparison(Comparison::field_gt("x", 0.0)),
            SelectionExpr::All,
        );
        assert_eq!(expr.to_string(), "(x > 0 && all)");
    }
}
