//! Subset predicate parser using nom
//!
//! Grammar:
//! ```text
//! expr      := or_expr
//! or_expr   := and_expr ('||' and_expr)*
//! and_expr  := not_expr ('&&' not_expr)*
//! not_expr  := '!' not_expr | atom
//! atom      := '(' expr ')' | 'all' | 'none' | comparison
//! comparison:= value op value
//! op        := '<' | '<=' | '>' | '>=' | '==' | '!='
//! value     := field | quoted-field | number
//! ```

use crate::ast::*;
use nom::{
    branch::alt,
    bytes::complete::{tag, take_while, take_while1},
    character::complete::{char, multispace0, satisfy},
    combinator::{map, not, recognize, value},
    multi::many0,
    number::complete::double,
    sequence::{delimited, pair, preceded, terminated},
    IResult,
};
use thiserror::Error;

/// Parse errors
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ParseError {
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Parse a subset predicate from a string.
///
/// An empty string selects every point.
pub fn parse_selection(input: &str) -> Result<SelectionExpr, ParseError> {
    let input = input.trim();
    if input.is_empty() {
        return Ok(SelectionExpr::All);
    }

    match expr(input) {
        Ok(("", result)) => Ok(result),
        Ok((remaining, _)) => Err(ParseError::Parse(format!(
            "Unexpected characters at end: '{}'",
            remaining
        ))),
        Err(e) => Err(ParseError::Parse(format!("{:?}", e))),
    }
}

/// Parse whitespace
pub(crate) fn ws<'a, F, O>(inner: F) -> impl FnMut(&'a str) -> IResult<&'a str, O>
where
    F: FnMut(&'a str) -> IResult<&'a str, O>,
{
    delimited(multispace0, inner, multispace0)
}

fn expr(input: &str) -> IResult<&str, SelectionExpr> {
    or_expr(input)
}

fn or_expr(input: &str) -> IResult<&str, SelectionExpr> {
    let (input, first) = and_expr(input)?;
    let (input, rest) = many0(preceded(ws(tag("||")), and_expr))(input)?;

    let result = rest.into_iter().fold(first, SelectionExpr::or);
    Ok((input, result))
}

fn and_expr(input: &str) -> IResult<&str, SelectionExpr> {
    let (input, first) = not_expr(input)?;
    let (input, rest) = many0(preceded(ws(tag("&&")), not_expr))(input)?;

    let result = rest.into_iter().fold(first, SelectionExpr::and);
    Ok((input, result))
}

fn not_expr(input: &str) -> IResult<&str, SelectionExpr> {
    alt((
        map(preceded(ws(char('!')), not_expr), SelectionExpr::not),
        atom,
    ))(input)
}

fn atom(input: &str) -> IResult<&str, SelectionExpr> {
    ws(alt((
        value(SelectionExpr::All, keyword("all")),
        value(SelectionExpr::None, keyword("none")),
        delimited(char('('), expr, char(')')),
        map(comparison, SelectionExpr::Comparison),
    )))(input)
}

/// A keyword that is not the prefix of a longer identifier
fn keyword<'a>(word: &'static str) -> impl FnMut(&'a str) -> IResult<&'a str, &'a str> {
    terminated(tag(word), not(satisfy(is_ident_char)))
}

fn comparison(input: &str) -> IResult<&str, Comparison> {
    let (input, lhs) = parse_value(input)?;
    let (input, op) = ws(comparison_op)(input)?;
    let (input, rhs) = parse_value(input)?;
    Ok((input, Comparison::new(lhs, op, rhs)))
}

fn comparison_op(input: &str) -> IResult<&str, ComparisonOp> {
    alt((
        value(ComparisonOp::Le, tag("<=")),
        value(ComparisonOp::Ge, tag(">=")),
        value(ComparisonOp::Eq, tag("==")),
        value(ComparisonOp::Ne, tag("!=")),
        value(ComparisonOp::Lt, tag("<")),
        value(ComparisonOp::Gt, tag(">")),
    ))(input)
}

fn parse_value(input: &str) -> IResult<&str, Value> {
    ws(alt((
        // Identifiers first so names like `nan_count` are not read as numbers
        map(identifier, |s| Value::Field(s.to_string())),
        map(quoted, |s| Value::Field(s.to_string())),
        map(double, Value::Number),
    )))(input)
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Parse an identifier (starts with letter or underscore, followed by alphanumeric or underscore)
pub(crate) fn identifier(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        take_while1(|c: char| c.is_alphabetic() || c == '_'),
        take_while(is_ident_char),
    ))(input)
}

/// A quoted component label, for labels with spaces or punctuation
fn quoted(input: &str) -> IResult<&str, &str> {
    alt((
        delimited(char('"'), take_while1(|c| c != '"'), char('"')),
        delimited(char('\''), take_while1(|c| c != '\''), char('\'')),
    ))(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_comparison() {
        let result = parse_selection("x > 0").unwrap();
        match result {
            SelectionExpr::Comparison(c) => {
                assert!(matches!(c.lhs, Value::Field(ref f) if f == "x"));
                assert_eq!(c.op, ComparisonOp::Gt);
                assert_eq!(c.rhs, Value::Number(0.0));
            }
            _ => panic!("Expected comparison"),
        }
    }

    #[test]
    fn test_parse_and_binds_tighter_than_or() {
        let result = parse_selection("x > 0 || y < 10 && z > 1").unwrap();
        match result {
            SelectionExpr::Or(_, rhs) => assert!(matches!(*rhs, SelectionExpr::And(_, _))),
            other => panic!("Expected OR at the root, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_not_expression() {
        let result = parse_selection("!x > 0").unwrap();
        assert!(matches!(result, SelectionExpr::Not(_)));
        let result = parse_selection("!!(x > 0)").unwrap();
        assert!(matches!(result, SelectionExpr::Not(_)));
    }

    #[test]
    fn test_parse_parenthesized() {
        let result = parse_selection("(x > 0 || y < 10) && all").unwrap();
        assert!(matches!(result, SelectionExpr::And(_, _)));
    }

    #[test]
    fn test_parse_all_none() {
        assert!(matches!(parse_selection("all").unwrap(), SelectionExpr::All));
        assert!(matches!(parse_selection("none").unwrap(), SelectionExpr::None));
        assert!(matches!(parse_selection("").unwrap(), SelectionExpr::All));
    }

    #[test]
    fn test_keyword_prefix_is_a_field() {
        let result = parse_selection("allele > 2").unwrap();
        assert_eq!(result.fields().into_iter().collect::<Vec<_>>(), vec!["allele"]);
    }

    #[test]
    fn test_parse_quoted_field_and_scientific_number() {
        let result = parse_selection("'peak flux' >= 1.5e3").unwrap();
        match result {
            SelectionExpr::Comparison(c) => {
                assert_eq!(c.lhs, Value::Field("peak flux".into()));
                assert_eq!(c.rhs, Value::Number(1500.0));
            }
            _ => panic!("Expected comparison"),
        }
    }

    #[test]
    fn test_parse_trailing_garbage() {
        assert!(parse_selection("x > 0 )").is_err());
        assert!(parse_selection("x >").is_err());
    }
}
