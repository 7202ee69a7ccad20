//! Custom column expressions
//!
//! A custom column derives a value per row from the row's statistics:
//!
//! ```text
//! expr   := term (('+' | '-') term)*
//! term   := factor (('*' | '/') factor)*
//! factor := '-' factor | '(' expr ')' | '{' name '}' | number
//! ```

use crate::eval::{EvalError, EvalResult};
use crate::parser::{ws, ParseError};
use nom::{
    branch::alt,
    bytes::complete::take_while1,
    character::complete::{char, one_of},
    combinator::map,
    multi::many0,
    number::complete::double,
    sequence::{delimited, pair, preceded},
    IResult,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Arithmetic operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl ArithOp {
    fn apply(self, lhs: f64, rhs: f64) -> f64 {
        match self {
            ArithOp::Add => lhs + rhs,
            ArithOp::Sub => lhs - rhs,
            ArithOp::Mul => lhs * rhs,
            ArithOp::Div => lhs / rhs,
        }
    }

    fn from_char(c: char) -> Self {
        match c {
            '+' => ArithOp::Add,
            '-' => ArithOp::Sub,
            '*' => ArithOp::Mul,
            _ => ArithOp::Div,
        }
    }
}

/// A parsed column expression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ColumnExpr {
    Number(f64),
    /// `{Name}` reference to another column of the same row
    Ref(String),
    Neg(Box<ColumnExpr>),
    Binary {
        op: ArithOp,
        lhs: Box<ColumnExpr>,
        rhs: Box<ColumnExpr>,
    },
}

impl ColumnExpr {
    /// Column names referenced by the expression
    pub fn references(&self) -> BTreeSet<String> {
        let mut out = BTreeSet::new();
        self.collect_refs(&mut out);
        out
    }

    fn collect_refs(&self, out: &mut BTreeSet<String>) {
        match self {
            ColumnExpr::Number(_) => {}
            ColumnExpr::Ref(name) => {
                out.insert(name.clone());
            }
            ColumnExpr::Neg(e) => e.collect_refs(out),
            ColumnExpr::Binary { lhs, rhs, .. } => {
                lhs.collect_refs(out);
                rhs.collect_refs(out);
            }
        }
    }

    /// Evaluate with `lookup` resolving `{Name}` references
    pub fn evaluate<F>(&self, lookup: &F) -> EvalResult<f64>
    where
        F: Fn(&str) -> Option<f64>,
    {
        match self {
            ColumnExpr::Number(n) => Ok(*n),
            ColumnExpr::Ref(name) => {
                lookup(name).ok_or_else(|| EvalError::FieldNotFound(name.clone()))
            }
            ColumnExpr::Neg(e) => Ok(-e.evaluate(lookup)?),
            ColumnExpr::Binary { op, lhs, rhs } => {
                Ok(op.apply(lhs.evaluate(lookup)?, rhs.evaluate(lookup)?))
            }
        }
    }
}

/// Parse a custom column expression
pub fn parse_column_expr(input: &str) -> Result<ColumnExpr, ParseError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(ParseError::Parse("Empty expression".to_string()));
    }

    match sum(input) {
        Ok(("", result)) => Ok(result),
        Ok((remaining, _)) => Err(ParseError::Parse(format!(
            "Unexpected characters at end: '{}'",
            remaining
        ))),
        Err(e) => Err(ParseError::Parse(format!("{:?}", e))),
    }
}

fn binary(op: char, lhs: ColumnExpr, rhs: ColumnExpr) -> ColumnExpr {
    ColumnExpr::Binary {
        op: ArithOp::from_char(op),
        lhs: Box::new(lhs),
        rhs: Box::new(rhs),
    }
}

fn sum(input: &str) -> IResult<&str, ColumnExpr> {
    let (input, first) = product(input)?;
    let (input, rest) = many0(pair(ws(one_of("+-")), product))(input)?;
    Ok((
        input,
        rest.into_iter()
            .fold(first, |acc, (op, rhs)| binary(op, acc, rhs)),
    ))
}

fn product(input: &str) -> IResult<&str, ColumnExpr> {
    let (input, first) = factor(input)?;
    let (input, rest) = many0(pair(ws(one_of("*/")), factor))(input)?;
    Ok((
        input,
        rest.into_iter()
            .fold(first, |acc, (op, rhs)| binary(op, acc, rhs)),
    ))
}

fn factor(input: &str) -> IResult<&str, ColumnExpr> {
    ws(alt((
        map(preceded(char('-'), factor), |e| ColumnExpr::Neg(Box::new(e))),
        delimited(char('('), sum, char(')')),
        map(
            delimited(char('{'), take_while1(|c| c != '}'), char('}')),
            |name: &str| ColumnExpr::Ref(name.trim().to_string()),
        ),
        map(double, ColumnExpr::Number),
    )))(input)
}
